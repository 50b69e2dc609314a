use std::path::PathBuf;

/// All event types emitted while generating static registry artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// Generation for a provider is starting.
    ProviderStarted {
        namespace: String,
        name: String,
        /// Number of download artifacts about to be written.
        downloads: usize,
    },
    /// A single artifact was persisted.
    ArtifactWritten {
        namespace: String,
        name: String,
        path: PathBuf,
        kind: ArtifactKind,
    },
    /// Two targets derived the same download path; the later one replaced the earlier.
    ArtifactOverwritten {
        namespace: String,
        name: String,
        path: PathBuf,
        version: String,
        os: String,
        arch: String,
    },
    /// All artifacts for a provider were written.
    ProviderComplete {
        namespace: String,
        name: String,
        artifacts: usize,
    },
    /// Generation for a provider failed.
    ProviderFailed {
        namespace: String,
        name: String,
        error: String,
    },
    /// Progress across a batch of providers.
    BatchProgress {
        completed: usize,
        total: usize,
        failed: usize,
    },
}

/// The protocol endpoint an artifact answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    VersionListing,
    VersionDownload,
}
