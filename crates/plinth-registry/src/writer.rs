//! Persistence of generated artifacts.

use std::path::Path;

use plinth_utils::{
    error::FileSystemResult,
    fs::{FileSystemProvider, StandardFileSystemProvider},
};
use serde::Serialize;

/// Durably persists a value as a JSON file.
///
/// Implementations must replace `path` atomically, so a crash never leaves
/// a truncated artifact behind, and must create missing parent directories.
pub trait ArtifactWriter: Send + Sync {
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> FileSystemResult<()>;
}

/// Writes artifacts to the local filesystem through a temporary sibling and
/// a rename.
#[derive(Debug, Default, Clone)]
pub struct FileArtifactWriter {
    fs: StandardFileSystemProvider,
}

impl ArtifactWriter for FileArtifactWriter {
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> FileSystemResult<()> {
        self.fs.write_json_atomic(path, value)
    }
}
