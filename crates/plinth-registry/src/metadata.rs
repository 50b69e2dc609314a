//! Provider identity and the published-release metadata model.
//!
//! A [`MetadataRecord`] lists every released [`Version`] of one provider,
//! each with the protocol versions it speaks and one [`Target`] per
//! OS/architecture build. The generator never mutates a record; it only
//! derives protocol responses from it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RegistryError, Result};

/// Addressable provider in the registry namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderIdentity {
    pub namespace: String,
    pub name: String,
}

impl ProviderIdentity {
    /// Creates an identity, rejecting segments that are empty or would
    /// escape their directory once joined into an output path.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();

        if !is_path_segment(&namespace) || !is_path_segment(&name) {
            return Err(RegistryError::InvalidIdentity(format!("{namespace}/{name}")));
        }

        Ok(Self {
            namespace,
            name,
        })
    }
}

impl fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ProviderIdentity {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((namespace, name)) => {
                Self::new(namespace, name).map_err(|_| RegistryError::InvalidIdentity(s.into()))
            }
            None => Err(RegistryError::InvalidIdentity(s.to_string())),
        }
    }
}

/// All known published versions of a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetadataRecord {
    /// Source repository the releases were collected from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Versions in the order they were recorded. Clients may treat the
    /// first entry as the most relevant, so the order is preserved.
    pub versions: Vec<Version>,
}

/// One released version of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Version {
    pub version: String,
    pub protocols: Vec<String>,
    pub shasums_url: String,
    pub shasums_signature_url: String,
    pub targets: Vec<Target>,
}

/// One platform build of a [`Version`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Target {
    pub os: String,
    pub arch: String,
    pub filename: String,
    pub download_url: String,
    pub shasum: String,
}

impl MetadataRecord {
    /// Checks that the record can be turned into registry artifacts.
    ///
    /// Version strings must be semantic versions, URLs must parse, and every
    /// value that becomes part of an output path must be a single, safe path
    /// segment.
    pub fn validate(&self) -> Result<()> {
        for version in &self.versions {
            version.validate()?;
        }
        Ok(())
    }

    /// Total number of (version, target) pairs in the record.
    pub fn target_count(&self) -> usize {
        self.versions.iter().map(|v| v.targets.len()).sum()
    }
}

impl Version {
    fn validate(&self) -> Result<()> {
        semver::Version::parse(&self.version).map_err(|err| {
            RegistryError::InvalidMetadata(format!("version `{}`: {err}", self.version))
        })?;

        validate_url(&self.version, "shasums_url", &self.shasums_url)?;
        validate_url(
            &self.version,
            "shasums_signature_url",
            &self.shasums_signature_url,
        )?;

        for target in &self.targets {
            for (field, value) in [("os", &target.os), ("arch", &target.arch)] {
                if !is_path_segment(value) {
                    return Err(RegistryError::InvalidMetadata(format!(
                        "version {}: invalid target {field} `{value}`",
                        self.version
                    )));
                }
            }
            if target.filename.is_empty() || target.shasum.is_empty() {
                return Err(RegistryError::InvalidMetadata(format!(
                    "version {}: target {}/{} is missing its filename or shasum",
                    self.version, target.os, target.arch
                )));
            }
            validate_url(&self.version, "download_url", &target.download_url)?;
        }

        Ok(())
    }
}

fn validate_url(version: &str, field: &str, value: &str) -> Result<()> {
    Url::parse(value).map(|_| ()).map_err(|err| {
        RegistryError::InvalidMetadata(format!("version {version}: {field} `{value}`: {err}"))
    })
}

fn is_path_segment(value: &str) -> bool {
    !value.is_empty() && value != "." && value != ".." && !value.contains(['/', '\\'])
}
