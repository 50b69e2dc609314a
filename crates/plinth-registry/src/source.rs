//! Provider metadata sources.
//!
//! The filesystem source reads records from a directory tree shaped like
//! `<root>/<first letter of namespace>/<namespace>/<name>.json`.

use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::{
    error::{ErrorContext, Result},
    metadata::{MetadataRecord, ProviderIdentity},
};

/// Supplies provider metadata records.
pub trait MetadataSource: Send + Sync {
    /// Reads the full metadata record of `provider`.
    fn read_metadata(&self, provider: &ProviderIdentity) -> Result<MetadataRecord>;

    /// Lists every provider this source holds a record for.
    fn providers(&self) -> Result<Vec<ProviderIdentity>>;
}

/// Metadata source backed by JSON files on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileMetadataSource {
    root: PathBuf,
}

impl FileMetadataSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `provider`.
    pub fn metadata_path(&self, provider: &ProviderIdentity) -> PathBuf {
        let shard: String = provider
            .namespace
            .chars()
            .take(1)
            .flat_map(char::to_lowercase)
            .collect();

        self.root
            .join(shard)
            .join(&provider.namespace)
            .join(format!("{}.json", provider.name))
    }
}

impl MetadataSource for FileMetadataSource {
    fn read_metadata(&self, provider: &ProviderIdentity) -> Result<MetadataRecord> {
        let path = self.metadata_path(provider);
        debug!(provider = %provider, path = %path.display(), "reading provider metadata");

        let file = File::open(&path)
            .with_context(|| format!("opening metadata file {}", path.display()))?;
        let record: MetadataRecord = serde_json::from_reader(BufReader::new(file))?;
        record.validate()?;

        trace!(
            provider = %provider,
            versions = record.versions.len(),
            targets = record.target_count(),
            "loaded provider metadata"
        );

        Ok(record)
    }

    fn providers(&self) -> Result<Vec<ProviderIdentity>> {
        let mut providers = Vec::new();

        for shard in read_subdirs(&self.root)? {
            for namespace_dir in read_subdirs(&shard)? {
                let Some(namespace) = file_name(&namespace_dir) else {
                    continue;
                };

                let entries = fs::read_dir(&namespace_dir).with_context(|| {
                    format!("reading directory {}", namespace_dir.display())
                })?;
                for entry in entries {
                    let entry = entry.with_context(|| {
                        format!("reading directory entry in {}", namespace_dir.display())
                    })?;
                    let path = entry.path();
                    if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                        continue;
                    }
                    let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    match ProviderIdentity::new(&namespace, name) {
                        Ok(identity) => providers.push(identity),
                        Err(err) => debug!("skipping {}: {err}", path.display()),
                    }
                }
            }
        }

        providers.sort();
        Ok(providers)
    }
}

fn read_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("reading directory entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::error::RegistryError;

    fn record_json() -> serde_json::Value {
        json!({
            "versions": [{
                "version": "1.0.0",
                "protocols": ["5.0"],
                "shasums_url": "https://x/SHA256SUMS",
                "shasums_signature_url": "https://x/SHA256SUMS.sig",
                "targets": [{
                    "os": "linux",
                    "arch": "amd64",
                    "filename": "widget_1.0.0_linux_amd64.zip",
                    "download_url": "https://x/widget.zip",
                    "shasum": "abc123"
                }]
            }]
        })
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_metadata_path_shards_by_namespace() {
        let source = FileMetadataSource::new("/data/providers");
        let id = ProviderIdentity::new("Acme", "widget").unwrap();
        assert_eq!(
            source.metadata_path(&id),
            PathBuf::from("/data/providers/a/Acme/widget.json")
        );
    }

    #[test]
    fn test_read_metadata() {
        let dir = tempdir().unwrap();
        let source = FileMetadataSource::new(dir.path());
        let id = ProviderIdentity::new("acme", "widget").unwrap();
        write(&source.metadata_path(&id), &record_json().to_string());

        let record = source.read_metadata(&id).unwrap();
        assert_eq!(record.versions[0].version, "1.0.0");
        assert_eq!(record.versions[0].targets[0].arch, "amd64");
    }

    #[test]
    fn test_read_metadata_missing() {
        let dir = tempdir().unwrap();
        let source = FileMetadataSource::new(dir.path());
        let id = ProviderIdentity::new("acme", "absent").unwrap();

        assert!(matches!(
            source.read_metadata(&id),
            Err(RegistryError::IoError { .. })
        ));
    }

    #[test]
    fn test_read_metadata_malformed() {
        let dir = tempdir().unwrap();
        let source = FileMetadataSource::new(dir.path());
        let id = ProviderIdentity::new("acme", "widget").unwrap();
        write(&source.metadata_path(&id), "{ \"versions\": [ ");

        assert!(matches!(
            source.read_metadata(&id),
            Err(RegistryError::JsonError(_))
        ));
    }

    #[test]
    fn test_read_metadata_invalid_record() {
        let dir = tempdir().unwrap();
        let source = FileMetadataSource::new(dir.path());
        let id = ProviderIdentity::new("acme", "widget").unwrap();
        let mut record = record_json();
        record["versions"][0]["version"] = json!("not-a-version");
        write(&source.metadata_path(&id), &record.to_string());

        assert!(matches!(
            source.read_metadata(&id),
            Err(RegistryError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_providers_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(&root.join("z/zeta/alpha.json"), "{}");
        write(&root.join("a/acme/widget.json"), "{}");
        write(&root.join("a/acme/gadget.json"), "{}");
        write(&root.join("a/acme/README.md"), "docs");
        write(&root.join("a/acme/nested/deep.json"), "{}");

        let providers = FileMetadataSource::new(root).providers().unwrap();
        let names: Vec<String> = providers.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["acme/gadget", "acme/widget", "zeta/alpha"]);
    }

    #[test]
    fn test_providers_missing_root() {
        let dir = tempdir().unwrap();
        let source = FileMetadataSource::new(dir.path().join("absent"));
        assert!(source.providers().is_err());
    }
}
