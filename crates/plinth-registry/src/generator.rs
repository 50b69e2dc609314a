//! Static response generation for one provider.
//!
//! [`ProviderGenerator`] maps a provider's [`MetadataRecord`] onto the two
//! registry endpoints a static host has to answer:
//!
//! ```text
//! <base>/v1/providers/<namespace>/<name>/versions
//! <base>/v1/providers/<namespace>/<name>/<version>/download/<os>/<arch>
//! ```
//!
//! Deriving the responses is pure; [`ProviderGenerator::generate`] then
//! hands each one to an [`ArtifactWriter`].

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use plinth_config::config::CollisionPolicy;
use plinth_events::{ArtifactKind, EventSinkHandle, NullSink, RegistryEvent};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info, trace, warn};

use crate::{
    error::{RegistryError, Result},
    metadata::{MetadataRecord, ProviderIdentity, Target, Version},
    response::{VersionDownload, VersionListing, VersionListingItem},
    signing::{NoSigningKeys, SigningKeyResolver},
    source::MetadataSource,
    writer::{ArtifactWriter, FileArtifactWriter},
};

/// Path of the version listing for a provider.
pub fn version_listing_path(base: &Path, namespace: &str, name: &str) -> PathBuf {
    provider_root(base, namespace, name).join("versions")
}

/// Path of the download response for one platform of one version.
pub fn version_download_path(
    base: &Path,
    namespace: &str,
    name: &str,
    version: &str,
    os: &str,
    arch: &str,
) -> PathBuf {
    provider_root(base, namespace, name)
        .join(version)
        .join("download")
        .join(os)
        .join(arch)
}

fn provider_root(base: &Path, namespace: &str, name: &str) -> PathBuf {
    base.join("v1").join("providers").join(namespace).join(name)
}

/// Download responses keyed by the path they are served from.
pub type VersionDownloads = BTreeMap<PathBuf, VersionDownload>;

/// A target whose download path was already taken by an earlier target.
struct Collision {
    path: PathBuf,
    version: String,
    os: String,
    arch: String,
}

/// Outcome of a successful [`ProviderGenerator::generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    /// Number of download artifacts written.
    pub downloads: usize,
    /// Path of the version listing, written last.
    pub listing_path: PathBuf,
}

/// Generates the static registry responses of a single provider.
pub struct ProviderGenerator<W = FileArtifactWriter> {
    identity: ProviderIdentity,
    metadata: MetadataRecord,
    destination: PathBuf,
    writer: W,
    signing_keys: Arc<dyn SigningKeyResolver>,
    events: EventSinkHandle,
    collision_policy: CollisionPolicy,
    parallel: bool,
}

impl ProviderGenerator {
    /// Loads `identity`'s metadata from `source` and prepares a generator that
    /// writes below `destination`.
    ///
    /// Nothing is written until [`generate`](Self::generate) is called.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MetadataUnavailable`] if the source cannot
    /// supply a well-formed record.
    pub fn new<S, P>(identity: ProviderIdentity, source: &S, destination: P) -> Result<Self>
    where
        S: MetadataSource + ?Sized,
        P: Into<PathBuf>,
    {
        let metadata = source.read_metadata(&identity).map_err(|err| {
            RegistryError::MetadataUnavailable {
                provider: identity.to_string(),
                source: Box::new(err),
            }
        })?;

        Ok(Self::from_record(identity, metadata, destination))
    }

    /// Creates a generator from an already loaded record.
    pub fn from_record<P: Into<PathBuf>>(
        identity: ProviderIdentity,
        metadata: MetadataRecord,
        destination: P,
    ) -> Self {
        Self {
            identity,
            metadata,
            destination: destination.into(),
            writer: FileArtifactWriter::default(),
            signing_keys: Arc::new(NoSigningKeys),
            events: Arc::new(NullSink),
            collision_policy: CollisionPolicy::default(),
            parallel: false,
        }
    }
}

impl<W: ArtifactWriter> ProviderGenerator<W> {
    /// Replaces the artifact writer.
    pub fn with_writer<T: ArtifactWriter>(self, writer: T) -> ProviderGenerator<T> {
        ProviderGenerator {
            identity: self.identity,
            metadata: self.metadata,
            destination: self.destination,
            writer,
            signing_keys: self.signing_keys,
            events: self.events,
            collision_policy: self.collision_policy,
            parallel: self.parallel,
        }
    }

    /// Sets the resolver supplying each version's signing keys.
    pub fn with_signing_keys(mut self, resolver: Arc<dyn SigningKeyResolver>) -> Self {
        self.signing_keys = resolver;
        self
    }

    /// Sets the sink receiving progress events.
    pub fn with_events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    /// Sets how targets sharing a download path are handled.
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Writes download artifacts on the rayon pool instead of one by one.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    pub fn metadata(&self) -> &MetadataRecord {
        &self.metadata
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn version_listing_path(&self) -> PathBuf {
        version_listing_path(
            &self.destination,
            &self.identity.namespace,
            &self.identity.name,
        )
    }

    pub fn version_download_path(&self, version: &Version, target: &Target) -> PathBuf {
        version_download_path(
            &self.destination,
            &self.identity.namespace,
            &self.identity.name,
            &version.version,
            &target.os,
            &target.arch,
        )
    }

    /// Builds the version listing, one entry per version in record order.
    pub fn version_listing(&self) -> VersionListing {
        VersionListing {
            versions: self
                .metadata
                .versions
                .iter()
                .map(VersionListingItem::from)
                .collect(),
        }
    }

    /// Builds one download response per (version, target) pair.
    ///
    /// When two targets derive the same path the collision policy decides:
    /// [`CollisionPolicy::Overwrite`] keeps the later target in record order,
    /// [`CollisionPolicy::Reject`] fails with [`RegistryError::DuplicateTarget`].
    /// Overwrites are only reported by [`generate`](Self::generate).
    pub fn version_downloads(&self) -> Result<VersionDownloads> {
        self.collect_downloads().map(|(downloads, _)| downloads)
    }

    fn collect_downloads(&self) -> Result<(VersionDownloads, Vec<Collision>)> {
        let mut downloads = VersionDownloads::new();
        let mut collisions = Vec::new();

        for version in &self.metadata.versions {
            let signing_keys = self.signing_keys.signing_keys(&self.identity, version);

            for target in &version.targets {
                let path = self.version_download_path(version, target);
                let download = VersionDownload::new(version, target, signing_keys.clone());

                if downloads.insert(path.clone(), download).is_none() {
                    continue;
                }

                if self.collision_policy == CollisionPolicy::Reject {
                    return Err(RegistryError::DuplicateTarget {
                        provider: self.identity.to_string(),
                        version: version.version.clone(),
                        os: target.os.clone(),
                        arch: target.arch.clone(),
                    });
                }
                collisions.push(Collision {
                    path,
                    version: version.version.clone(),
                    os: target.os.clone(),
                    arch: target.arch.clone(),
                });
            }
        }

        Ok((downloads, collisions))
    }

    fn report_collision(&self, collision: Collision) {
        warn!(
            provider = %self.identity,
            version = %collision.version,
            os = %collision.os,
            arch = %collision.arch,
            "duplicate target, keeping the later entry"
        );
        self.events.emit(RegistryEvent::ArtifactOverwritten {
            namespace: self.identity.namespace.clone(),
            name: self.identity.name.clone(),
            path: collision.path,
            version: collision.version,
            os: collision.os,
            arch: collision.arch,
        });
    }

    /// Writes every download artifact, then the version listing.
    ///
    /// The listing is only written once all download artifacts succeeded.
    /// The first failing download write aborts the run with
    /// [`RegistryError::WriteFailed`]; artifacts written before the failure
    /// stay on disk.
    pub fn generate(&self) -> Result<GenerateSummary> {
        info!(provider = %self.identity, "Generating");

        match self.write_artifacts() {
            Ok(summary) => {
                self.events.emit(RegistryEvent::ProviderComplete {
                    namespace: self.identity.namespace.clone(),
                    name: self.identity.name.clone(),
                    artifacts: summary.downloads + 1,
                });
                info!(provider = %self.identity, downloads = summary.downloads, "Generated");
                Ok(summary)
            }
            Err(err) => {
                self.events.emit(RegistryEvent::ProviderFailed {
                    namespace: self.identity.namespace.clone(),
                    name: self.identity.name.clone(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn write_artifacts(&self) -> Result<GenerateSummary> {
        let (downloads, collisions) = self.collect_downloads()?;
        for collision in collisions {
            self.report_collision(collision);
        }

        self.events.emit(RegistryEvent::ProviderStarted {
            namespace: self.identity.namespace.clone(),
            name: self.identity.name.clone(),
            downloads: downloads.len(),
        });
        debug!(
            provider = %self.identity,
            downloads = downloads.len(),
            parallel = self.parallel,
            "writing version download artifacts"
        );

        let write = |(path, download): (&PathBuf, &VersionDownload)| -> Result<()> {
            self.writer
                .write_json(path, download)
                .map_err(|err| RegistryError::WriteFailed {
                    path: path.clone(),
                    source: err,
                })?;
            self.written(path, ArtifactKind::VersionDownload);
            Ok(())
        };

        if self.parallel {
            downloads.par_iter().try_for_each(write)?;
        } else {
            downloads.iter().try_for_each(write)?;
        }

        let listing_path = self.version_listing_path();
        self.writer
            .write_json(&listing_path, &self.version_listing())?;
        self.written(&listing_path, ArtifactKind::VersionListing);

        Ok(GenerateSummary {
            downloads: downloads.len(),
            listing_path,
        })
    }

    fn written(&self, path: &Path, kind: ArtifactKind) {
        trace!(path = %path.display(), ?kind, "wrote artifact");
        self.events.emit(RegistryEvent::ArtifactWritten {
            namespace: self.identity.namespace.clone(),
            name: self.identity.name.clone(),
            path: path.to_path_buf(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use plinth_events::CollectorSink;
    use plinth_utils::error::{FileSystemError, FileSystemResult};
    use serde::Serialize;
    use tempfile::tempdir;

    use super::*;
    use crate::response::{GpgPublicKey, SigningKeys};
    use crate::signing::StaticSigningKeys;

    fn target(os: &str, arch: &str, filename: &str) -> Target {
        Target {
            os: os.to_string(),
            arch: arch.to_string(),
            filename: filename.to_string(),
            download_url: format!("https://x/{filename}"),
            shasum: format!("sha-{filename}"),
        }
    }

    fn version(version: &str, targets: Vec<Target>) -> Version {
        Version {
            version: version.to_string(),
            protocols: vec!["5.0".to_string()],
            shasums_url: format!("https://x/{version}/SHA256SUMS"),
            shasums_signature_url: format!("https://x/{version}/SHA256SUMS.sig"),
            targets,
        }
    }

    fn identity() -> ProviderIdentity {
        ProviderIdentity::new("acme", "widget").unwrap()
    }

    fn record() -> MetadataRecord {
        MetadataRecord {
            repository: None,
            versions: vec![
                version(
                    "2.0.0",
                    vec![
                        target("linux", "amd64", "w_2_linux_amd64.zip"),
                        target("darwin", "arm64", "w_2_darwin_arm64.zip"),
                    ],
                ),
                version("1.0.0", vec![target("linux", "amd64", "w_1_linux_amd64.zip")]),
            ],
        }
    }

    /// Fails every write after `allowed` successful ones.
    struct FailingWriter {
        allowed: usize,
        calls: AtomicUsize,
        inner: FileArtifactWriter,
    }

    impl FailingWriter {
        fn new(allowed: usize) -> Self {
            Self {
                allowed,
                calls: AtomicUsize::new(0),
                inner: FileArtifactWriter::default(),
            }
        }
    }

    impl ArtifactWriter for FailingWriter {
        fn write_json<T: Serialize + ?Sized>(
            &self,
            path: &Path,
            value: &T,
        ) -> FileSystemResult<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(FileSystemError::File {
                    path: path.to_path_buf(),
                    action: "write",
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.write_json(path, value)
        }
    }

    #[test]
    fn test_paths() {
        let base = Path::new("/out");
        assert_eq!(
            version_listing_path(base, "acme", "widget"),
            PathBuf::from("/out/v1/providers/acme/widget/versions")
        );
        assert_eq!(
            version_download_path(base, "acme", "widget", "1.0.0", "linux", "amd64"),
            PathBuf::from("/out/v1/providers/acme/widget/1.0.0/download/linux/amd64")
        );
    }

    #[test]
    fn test_version_listing_preserves_order() {
        let generator = ProviderGenerator::from_record(identity(), record(), "/out");
        let listing = generator.version_listing();

        let versions: Vec<_> = listing.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(versions, vec!["2.0.0", "1.0.0"]);

        let platforms: Vec<_> = listing.versions[0]
            .platforms
            .iter()
            .map(|p| format!("{}/{}", p.os, p.arch))
            .collect();
        assert_eq!(platforms, vec!["linux/amd64", "darwin/arm64"]);
        assert_eq!(listing.versions[1].protocols, vec!["5.0"]);
    }

    #[test]
    fn test_version_listing_empty_record() {
        let generator =
            ProviderGenerator::from_record(identity(), MetadataRecord::default(), "/out");
        assert!(generator.version_listing().versions.is_empty());
        assert!(generator.version_downloads().unwrap().is_empty());
    }

    #[test]
    fn test_version_downloads_complete() {
        let generator = ProviderGenerator::from_record(identity(), record(), "/out");
        let downloads = generator.version_downloads().unwrap();
        assert_eq!(downloads.len(), 3);

        for version in &generator.metadata().versions {
            for target in &version.targets {
                let download = &downloads[&generator.version_download_path(version, target)];
                assert_eq!(download.protocols, version.protocols);
                assert_eq!(download.os, target.os);
                assert_eq!(download.arch, target.arch);
                assert_eq!(download.filename, target.filename);
                assert_eq!(download.download_url, target.download_url);
                assert_eq!(download.shasums_url, version.shasums_url);
                assert_eq!(download.shasums_signature_url, version.shasums_signature_url);
                assert_eq!(download.shasum, target.shasum);
                assert!(download.signing_keys.is_empty());
            }
        }
    }

    #[test]
    fn test_collision_later_target_wins() {
        let mut record = record();
        record.versions[1]
            .targets
            .push(target("linux", "amd64", "w_1_linux_amd64_rebuild.zip"));

        let generator = ProviderGenerator::from_record(identity(), record, "/out");
        let downloads = generator.version_downloads().unwrap();

        assert_eq!(downloads.len(), 3);
        let path = version_download_path(
            Path::new("/out"),
            "acme",
            "widget",
            "1.0.0",
            "linux",
            "amd64",
        );
        assert_eq!(downloads[&path].filename, "w_1_linux_amd64_rebuild.zip");
    }

    #[test]
    fn test_collision_reported_once_by_generate() {
        let dir = tempdir().unwrap();
        let mut record = record();
        record.versions[1]
            .targets
            .push(target("linux", "amd64", "w_1_linux_amd64_rebuild.zip"));

        let sink = Arc::new(CollectorSink::default());
        let generator = ProviderGenerator::from_record(identity(), record, dir.path())
            .with_events(sink.clone());

        generator.version_downloads().unwrap();
        generator.version_downloads().unwrap();
        assert!(sink.is_empty());

        generator.generate().unwrap();
        let overwritten: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|event| matches!(event, RegistryEvent::ArtifactOverwritten { .. }))
            .collect();
        assert_eq!(overwritten.len(), 1);
        assert!(matches!(
            &overwritten[0],
            RegistryEvent::ArtifactOverwritten { version, os, arch, .. }
                if version == "1.0.0" && os == "linux" && arch == "amd64"
        ));
    }

    #[test]
    fn test_collision_rejected() {
        let mut record = record();
        record.versions[0]
            .targets
            .push(target("darwin", "arm64", "dup.zip"));

        let generator = ProviderGenerator::from_record(identity(), record, "/out")
            .with_collision_policy(CollisionPolicy::Reject);

        assert!(matches!(
            generator.version_downloads(),
            Err(RegistryError::DuplicateTarget { version, os, arch, .. })
                if version == "2.0.0" && os == "darwin" && arch == "arm64"
        ));
    }

    #[test]
    fn test_signing_keys_resolver_applied() {
        let keys = SigningKeys {
            gpg_public_keys: vec![GpgPublicKey {
                key_id: "51852D87348FFC4C".to_string(),
                ascii_armor: "armor".to_string(),
            }],
        };
        let generator = ProviderGenerator::from_record(identity(), record(), "/out")
            .with_signing_keys(Arc::new(StaticSigningKeys::new(keys.clone())));

        for download in generator.version_downloads().unwrap().values() {
            assert_eq!(download.signing_keys, keys);
        }
    }

    #[test]
    fn test_generate_writes_all_artifacts() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(CollectorSink::default());
        let generator = ProviderGenerator::from_record(identity(), record(), dir.path())
            .with_events(sink.clone());

        let summary = generator.generate().unwrap();
        assert_eq!(summary.downloads, 3);
        assert!(summary.listing_path.is_file());

        for path in generator.version_downloads().unwrap().keys() {
            assert!(path.is_file(), "{} missing", path.display());
        }

        let events = sink.events();
        assert!(matches!(
            events.first(),
            Some(RegistryEvent::ProviderStarted { downloads: 3, .. })
        ));
        assert!(matches!(
            events.last(),
            Some(RegistryEvent::ProviderComplete { artifacts: 4, .. })
        ));
        assert!(matches!(
            &events[events.len() - 2],
            RegistryEvent::ArtifactWritten {
                kind: ArtifactKind::VersionListing,
                ..
            }
        ));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();

        ProviderGenerator::from_record(identity(), record(), first.path())
            .generate()
            .unwrap();
        ProviderGenerator::from_record(identity(), record(), second.path())
            .with_parallel(true)
            .generate()
            .unwrap();

        let generator = ProviderGenerator::from_record(identity(), record(), "");
        let mut relative: Vec<PathBuf> = generator.version_downloads().unwrap().into_keys().collect();
        relative.push(generator.version_listing_path());

        for path in relative {
            let a = fs::read(first.path().join(&path)).unwrap();
            let b = fs::read(second.path().join(&path)).unwrap();
            assert_eq!(a, b, "{} differs", path.display());
        }
    }

    #[test]
    fn test_write_failure_skips_listing() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(CollectorSink::default());
        let generator = ProviderGenerator::from_record(identity(), record(), dir.path())
            .with_writer(FailingWriter::new(1))
            .with_events(sink.clone());

        let err = generator.generate().unwrap_err();
        assert!(matches!(err, RegistryError::WriteFailed { .. }));
        assert!(!generator.version_listing_path().exists());
        assert!(matches!(
            sink.events().last(),
            Some(RegistryEvent::ProviderFailed { .. })
        ));
    }

    #[test]
    fn test_parallel_write_failure_skips_listing() {
        let dir = tempdir().unwrap();
        let generator = ProviderGenerator::from_record(identity(), record(), dir.path())
            .with_writer(FailingWriter::new(0))
            .with_parallel(true);

        assert!(matches!(
            generator.generate(),
            Err(RegistryError::WriteFailed { .. })
        ));
        assert!(!generator.version_listing_path().exists());
    }

    #[test]
    fn test_listing_failure_is_not_wrapped() {
        let dir = tempdir().unwrap();
        let generator = ProviderGenerator::from_record(identity(), record(), dir.path())
            .with_writer(FailingWriter::new(3));

        assert!(matches!(
            generator.generate(),
            Err(RegistryError::FileSystem(FileSystemError::File { .. }))
        ));
    }
}
