//! Signing key resolution for version download responses.

use crate::{
    metadata::{ProviderIdentity, Version},
    response::SigningKeys,
};

/// Supplies the keys that sign a version's checksum file.
pub trait SigningKeyResolver: Send + Sync {
    fn signing_keys(&self, provider: &ProviderIdentity, version: &Version) -> SigningKeys;
}

/// Resolver that publishes no keys.
///
/// Key retrieval is not wired up yet, so this is the generator's default and
/// every download response carries `"signing_keys": {}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSigningKeys;

impl SigningKeyResolver for NoSigningKeys {
    fn signing_keys(&self, _provider: &ProviderIdentity, _version: &Version) -> SigningKeys {
        SigningKeys::default()
    }
}

/// Resolver that publishes the same key set for every version.
#[derive(Debug, Clone)]
pub struct StaticSigningKeys {
    keys: SigningKeys,
}

impl StaticSigningKeys {
    pub fn new(keys: SigningKeys) -> Self {
        Self {
            keys,
        }
    }
}

impl SigningKeyResolver for StaticSigningKeys {
    fn signing_keys(&self, _provider: &ProviderIdentity, _version: &Version) -> SigningKeys {
        self.keys.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::GpgPublicKey;

    fn version() -> Version {
        Version {
            version: "1.0.0".to_string(),
            protocols: vec!["5.0".to_string()],
            shasums_url: "https://x/SUMS".to_string(),
            shasums_signature_url: "https://x/SUMS.sig".to_string(),
            targets: Vec::new(),
        }
    }

    #[test]
    fn test_no_signing_keys() {
        let id = ProviderIdentity::new("acme", "widget").unwrap();
        assert!(NoSigningKeys.signing_keys(&id, &version()).is_empty());
    }

    #[test]
    fn test_static_signing_keys() {
        let id = ProviderIdentity::new("acme", "widget").unwrap();
        let keys = SigningKeys {
            gpg_public_keys: vec![GpgPublicKey {
                key_id: "0123".to_string(),
                ascii_armor: "armor".to_string(),
            }],
        };
        let resolver = StaticSigningKeys::new(keys.clone());
        assert_eq!(resolver.signing_keys(&id, &version()), keys);
    }
}
