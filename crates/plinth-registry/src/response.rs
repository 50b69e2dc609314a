//! Registry protocol response bodies.
//!
//! Field order in these structs is the field order in the generated JSON,
//! which keeps the output byte-stable across runs.

use serde::{Deserialize, Serialize};

use crate::metadata::{Target, Version};

/// Response for the "list available versions" endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionListing {
    pub versions: Vec<VersionListingItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionListingItem {
    pub version: String,
    pub protocols: Vec<String>,
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

/// Response for the "find a provider package" endpoint of one platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionDownload {
    pub protocols: Vec<String>,
    pub os: String,
    pub arch: String,
    pub filename: String,
    pub download_url: String,
    pub shasums_url: String,
    pub shasums_signature_url: String,
    pub shasum: String,
    pub signing_keys: SigningKeys,
}

/// Keys a client may use to verify the checksum signature.
///
/// An empty key set serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SigningKeys {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gpg_public_keys: Vec<GpgPublicKey>,
}

impl SigningKeys {
    pub fn is_empty(&self) -> bool {
        self.gpg_public_keys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GpgPublicKey {
    pub key_id: String,
    pub ascii_armor: String,
}

impl From<&Version> for VersionListingItem {
    fn from(version: &Version) -> Self {
        Self {
            version: version.version.clone(),
            protocols: version.protocols.clone(),
            platforms: version
                .targets
                .iter()
                .map(|target| {
                    Platform {
                        os: target.os.clone(),
                        arch: target.arch.clone(),
                    }
                })
                .collect(),
        }
    }
}

impl VersionDownload {
    pub fn new(version: &Version, target: &Target, signing_keys: SigningKeys) -> Self {
        Self {
            protocols: version.protocols.clone(),
            os: target.os.clone(),
            arch: target.arch.clone(),
            filename: target.filename.clone(),
            download_url: target.download_url.clone(),
            shasums_url: version.shasums_url.clone(),
            shasums_signature_url: version.shasums_signature_url.clone(),
            shasum: target.shasum.clone(),
            signing_keys,
        }
    }
}
