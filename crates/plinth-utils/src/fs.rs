use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::error::{FileSystemError, FileSystemResult};

/// Prefix of the temporary sibling files used for atomic writes.
pub const TEMP_FILE_PREFIX: &str = ".plinth-";

pub trait FileSystemProvider {
    /// Creates a directory structure if it doesn't exist.
    ///
    /// If the directory already exists, this function does nothing. If the path exists but
    /// is not a directory, this function returns an error.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Directory`] if the directory could not be created.
    /// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plinth_utils::error::FileSystemResult;
    /// use plinth_utils::fs::{FileSystemProvider, StandardFileSystemProvider};
    ///
    /// fn main() -> FileSystemResult<()> {
    ///     let fs = StandardFileSystemProvider;
    ///     fs.ensure_dir_exists("/tmp/plinth-doc/v1/providers")?;
    ///     Ok(())
    /// }
    /// ```
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()>;

    /// Serializes `value` as pretty-printed JSON and atomically places it at `path`.
    ///
    /// Missing parent directories are created. The JSON is written to a temporary file next
    /// to the destination, flushed to disk, and renamed over the destination, so a reader
    /// never observes a truncated file. Existing content at `path` is replaced.
    ///
    /// # Errors
    ///
    /// * [`FileSystemError::Json`] if `value` cannot be serialized.
    /// * [`FileSystemError::Directory`] / [`FileSystemError::NotADirectory`] if the parent
    ///   directory cannot be created.
    /// * [`FileSystemError::File`] if the temporary file cannot be written or renamed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use plinth_utils::error::FileSystemResult;
    /// use plinth_utils::fs::{FileSystemProvider, StandardFileSystemProvider};
    ///
    /// fn main() -> FileSystemResult<()> {
    ///     let fs = StandardFileSystemProvider;
    ///     fs.write_json_atomic("/tmp/plinth-doc/versions", &vec!["1.0.0"])?;
    ///     Ok(())
    /// }
    /// ```
    fn write_json_atomic<P, T>(&self, path: P, value: &T) -> FileSystemResult<()>
    where
        P: AsRef<Path>,
        T: Serialize + ?Sized;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFileSystemProvider;

impl FileSystemProvider for StandardFileSystemProvider {
    fn ensure_dir_exists<P: AsRef<Path>>(&self, path: P) -> FileSystemResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).map_err(|err| FileSystemError::Directory {
                path: path.to_path_buf(),
                action: "create",
                source: err,
            })?;
        } else if !path.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }

    fn write_json_atomic<P, T>(&self, path: P, value: &T) -> FileSystemResult<()>
    where
        P: AsRef<Path>,
        T: Serialize + ?Sized,
    {
        let path = path.as_ref();
        let parent = parent_dir(path);

        let bytes = serde_json::to_vec_pretty(value).map_err(|err| FileSystemError::Json {
            path: path.to_path_buf(),
            source: err,
        })?;

        self.ensure_dir_exists(&parent)?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&parent)
            .map_err(|err| FileSystemError::File {
                path: path.to_path_buf(),
                action: "create temporary",
                source: err,
            })?;

        let write_err = |err| FileSystemError::File {
            path: path.to_path_buf(),
            action: "write",
            source: err,
        };
        temp.write_all(&bytes).map_err(write_err)?;
        // Temp files are created 0600.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(write_err)?;
        }
        temp.as_file().sync_all().map_err(write_err)?;

        temp.persist(path).map_err(|err| FileSystemError::File {
            path: path.to_path_buf(),
            action: "persist",
            source: err.error,
        })?;

        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Creates a directory structure if it doesn't exist.
///
/// See [`FileSystemProvider::ensure_dir_exists`] for detailed documentation.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    StandardFileSystemProvider.ensure_dir_exists(path)
}

/// Atomically writes `value` as JSON to `path`.
///
/// See [`FileSystemProvider::write_json_atomic`] for detailed documentation.
pub fn write_json_atomic<P, T>(path: P, value: &T) -> FileSystemResult<()>
where
    P: AsRef<Path>,
    T: Serialize + ?Sized,
{
    StandardFileSystemProvider.write_json_atomic(path, value)
}
