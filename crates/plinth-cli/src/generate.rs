use std::sync::Arc;

use nu_ansi_term::Color::{Cyan, Green, Red};
use plinth_config::config::{CollisionPolicy, Config};
use plinth_events::{ChannelSink, EventSinkHandle, NullSink};
use plinth_registry::{
    generate_all, FileMetadataSource, GenerateOptions, MetadataSource, ProviderIdentity,
};
use tracing::{debug, info};

use crate::{
    error::{CliError, CliResult},
    progress::spawn_event_handler,
    utils::{pluralize, progress_enabled, resolve_dir, Colored},
};

pub struct GenerateArgs {
    pub providers: Vec<String>,
    pub metadata_dir: Option<String>,
    pub destination: Option<String>,
    pub sequential: bool,
    pub reject_duplicates: bool,
}

pub fn generate(config: &Config, args: GenerateArgs) -> CliResult<()> {
    let metadata_dir = match args.metadata_dir {
        Some(dir) => resolve_dir(&dir)?,
        None => config.get_metadata_dir()?,
    };
    let destination = match args.destination {
        Some(dir) => resolve_dir(&dir)?,
        None => config.get_destination()?,
    };

    let source = FileMetadataSource::new(&metadata_dir);
    let providers = if args.providers.is_empty() {
        source.providers()?
    } else {
        args.providers
            .iter()
            .map(|provider| provider.parse::<ProviderIdentity>())
            .collect::<Result<Vec<_>, _>>()?
    };

    if providers.is_empty() {
        info!("No providers found in {}", metadata_dir.display());
        return Ok(());
    }

    let parallel = config.parallel() && !args.sequential;
    let collision_policy = if args.reject_duplicates {
        CollisionPolicy::Reject
    } else {
        config.collision_policy()
    };
    debug!(
        metadata_dir = %metadata_dir.display(),
        destination = %destination.display(),
        parallel,
        %collision_policy,
        "generating {} provider(s)",
        providers.len()
    );

    let (events, guard): (EventSinkHandle, _) = if progress_enabled() {
        let (sink, receiver) = ChannelSink::new();
        (Arc::new(sink), Some(spawn_event_handler(receiver, providers.len())))
    } else {
        (Arc::new(NullSink), None)
    };

    let options = GenerateOptions {
        parallel,
        collision_policy,
        events,
        ..GenerateOptions::new(&destination)
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(if parallel { config.parallel_limit() } else { 1 })
        .build()?;
    let report = pool.install(|| generate_all(&source, &providers, &options));

    drop(options);
    if let Some(guard) = guard {
        guard.finish();
    }

    info!(
        "{} {} ({}) into {}",
        Colored(Green, "Generated"),
        pluralize(report.generated.len(), "provider"),
        pluralize(report.artifacts(), "artifact"),
        Colored(Cyan, destination.display())
    );

    if report.is_success() {
        Ok(())
    } else {
        info!(
            "{}",
            Colored(Red, format!("{} failed", pluralize(report.failed.len(), "provider")))
        );
        Err(CliError::ProvidersFailed(report.failed.len()))
    }
}
