//! Static provider registry generation.
//!
//! Reads per-provider release metadata and writes the JSON documents a
//! provider registry serves, as plain files that any static web host can
//! publish:
//!
//! - [`metadata`]: provider identities and the release metadata model
//! - [`source`]: where metadata records are read from
//! - [`response`]: the registry protocol response bodies
//! - [`generator`]: response derivation and writing for one provider
//! - [`batch`]: generation across many providers
//!
//! # Example
//!
//! ```no_run
//! use plinth_registry::{FileMetadataSource, ProviderGenerator, ProviderIdentity};
//!
//! # fn main() -> plinth_registry::Result<()> {
//! let source = FileMetadataSource::new("./providers");
//! let identity: ProviderIdentity = "acme/widget".parse()?;
//!
//! let summary = ProviderGenerator::new(identity, &source, "./generated")?.generate()?;
//! println!("wrote {}", summary.listing_path.display());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod response;
pub mod signing;
pub mod source;
pub mod writer;

pub use batch::{generate_all, FailedInfo, GenerateOptions, GenerateReport, GeneratedInfo};
pub use error::{ErrorContext, RegistryError, Result};
pub use generator::{
    version_download_path, version_listing_path, GenerateSummary, ProviderGenerator,
    VersionDownloads,
};
pub use metadata::{MetadataRecord, ProviderIdentity, Target, Version};
pub use plinth_config::config::CollisionPolicy;
pub use response::{
    GpgPublicKey, Platform, SigningKeys, VersionDownload, VersionListing, VersionListingItem,
};
pub use signing::{NoSigningKeys, SigningKeyResolver, StaticSigningKeys};
pub use source::{FileMetadataSource, MetadataSource};
pub use writer::{ArtifactWriter, FileArtifactWriter};
