//! Generation across many providers.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use plinth_config::config::CollisionPolicy;
use plinth_events::{EventSinkHandle, NullSink, RegistryEvent};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{error, info};

use crate::{
    error::Result,
    generator::{GenerateSummary, ProviderGenerator},
    metadata::ProviderIdentity,
    signing::{NoSigningKeys, SigningKeyResolver},
    source::MetadataSource,
};

/// Settings shared by every provider of a batch.
#[derive(Clone)]
pub struct GenerateOptions {
    pub destination: PathBuf,
    /// Generate providers, and the artifacts within each, on the rayon pool.
    pub parallel: bool,
    pub collision_policy: CollisionPolicy,
    pub events: EventSinkHandle,
    pub signing_keys: Arc<dyn SigningKeyResolver>,
}

impl GenerateOptions {
    pub fn new<P: Into<PathBuf>>(destination: P) -> Self {
        Self {
            destination: destination.into(),
            parallel: false,
            collision_policy: CollisionPolicy::default(),
            events: Arc::new(NullSink),
            signing_keys: Arc::new(NoSigningKeys),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedInfo {
    pub identity: ProviderIdentity,
    pub downloads: usize,
    pub listing_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FailedInfo {
    pub identity: ProviderIdentity,
    pub error: String,
}

/// Per-provider outcome of [`generate_all`], in input order.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub generated: Vec<GeneratedInfo>,
    pub failed: Vec<FailedInfo>,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of artifacts written, listings included.
    pub fn artifacts(&self) -> usize {
        self.generated.iter().map(|info| info.downloads + 1).sum()
    }
}

/// Generates every provider in `providers`.
///
/// A failing provider does not stop the others; its error is recorded in
/// the report instead.
pub fn generate_all<S>(
    source: &S,
    providers: &[ProviderIdentity],
    options: &GenerateOptions,
) -> GenerateReport
where
    S: MetadataSource + ?Sized,
{
    let total = providers.len();
    let completed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let run = |identity: &ProviderIdentity| {
        let result = generate_one(source, identity, options);
        if let Err(err) = &result {
            error!(provider = %identity, "{err}");
            failed.fetch_add(1, Ordering::Relaxed);
        }

        options.events.emit(RegistryEvent::BatchProgress {
            completed: completed.fetch_add(1, Ordering::Relaxed) + 1,
            total,
            failed: failed.load(Ordering::Relaxed),
        });

        (identity.clone(), result)
    };

    let results: Vec<(ProviderIdentity, Result<GenerateSummary>)> = if options.parallel {
        providers.par_iter().map(run).collect()
    } else {
        providers.iter().map(run).collect()
    };

    let mut report = GenerateReport::default();
    for (identity, result) in results {
        match result {
            Ok(summary) => {
                report.generated.push(GeneratedInfo {
                    identity,
                    downloads: summary.downloads,
                    listing_path: summary.listing_path,
                })
            }
            Err(err) => {
                report.failed.push(FailedInfo {
                    identity,
                    error: err.to_string(),
                })
            }
        }
    }

    info!(
        generated = report.generated.len(),
        failed = report.failed.len(),
        "batch complete"
    );

    report
}

fn generate_one<S>(
    source: &S,
    identity: &ProviderIdentity,
    options: &GenerateOptions,
) -> Result<GenerateSummary>
where
    S: MetadataSource + ?Sized,
{
    ProviderGenerator::new(identity.clone(), source, &options.destination)?
        .with_signing_keys(options.signing_keys.clone())
        .with_events(options.events.clone())
        .with_collision_policy(options.collision_policy)
        .with_parallel(options.parallel)
        .generate()
}
