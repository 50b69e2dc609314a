//! Error types for the registry crate.
//!
//! This module defines [`RegistryError`], the error type used throughout
//! the crate, along with helper traits for error context.

use std::path::PathBuf;

use miette::Diagnostic;
use plinth_utils::error::FileSystemError;
use thiserror::Error;

/// Errors that can occur while reading provider metadata or generating
/// registry artifacts.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(plinth_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(
        code(plinth_registry::json),
        help("The metadata file may be corrupted or in an invalid format")
    )]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid provider metadata: {0}")]
    #[diagnostic(
        code(plinth_registry::invalid_metadata),
        help("Fix the provider's metadata record and run the generator again")
    )]
    InvalidMetadata(String),

    #[error("Invalid provider identity `{0}`")]
    #[diagnostic(
        code(plinth_registry::invalid_identity),
        help("Providers are addressed as `namespace/name`")
    )]
    InvalidIdentity(String),

    #[error("Metadata unavailable for provider {provider}: {source}")]
    #[diagnostic(
        code(plinth_registry::metadata_unavailable),
        help("Check that the provider's metadata file exists and is well-formed")
    )]
    MetadataUnavailable {
        provider: String,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("Failed to write metadata version download file {}: {source}", path.display())]
    #[diagnostic(code(plinth_registry::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: FileSystemError,
    },

    #[error(transparent)]
    #[diagnostic(code(plinth_registry::fs))]
    FileSystem(#[from] FileSystemError),

    #[error("Duplicate target {os}/{arch} in version {version} of provider {provider}")]
    #[diagnostic(
        code(plinth_registry::duplicate_target),
        help("Remove the duplicate target from the metadata or use the `overwrite` collision policy")
    )]
    DuplicateTarget {
        provider: String,
        version: String,
        os: String,
        arch: String,
    },
}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::InvalidIdentity("acme".to_string());
        assert_eq!(err.to_string(), "Invalid provider identity `acme`");

        let err = RegistryError::DuplicateTarget {
            provider: "acme/widget".to_string(),
            version: "1.0.0".to_string(),
            os: "linux".to_string(),
            arch: "amd64".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate target linux/amd64 in version 1.0.0 of provider acme/widget"
        );
    }

    #[test]
    fn test_write_failed_keeps_cause() {
        let err = RegistryError::WriteFailed {
            path: PathBuf::from("/out/a"),
            source: FileSystemError::NotADirectory {
                path: PathBuf::from("/out"),
            },
        };
        assert_eq!(
            err.to_string(),
            "Failed to write metadata version download file /out/a: `/out` is not a directory"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_with_context() {
        let result: std::io::Result<()> = Err(std::io::Error::other("boom"));
        let err = result.with_context(|| "reading providers".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Error while reading providers: boom");
    }
}
