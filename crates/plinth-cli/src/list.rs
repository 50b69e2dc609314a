use nu_ansi_term::Color::{Blue, Cyan};
use plinth_config::config::Config;
use plinth_registry::{FileMetadataSource, MetadataSource};
use tracing::info;

use crate::{
    error::CliResult,
    utils::{pluralize, resolve_dir, Colored},
};

pub fn list_providers(config: &Config, metadata_dir: Option<String>) -> CliResult<()> {
    let metadata_dir = match metadata_dir {
        Some(dir) => resolve_dir(&dir)?,
        None => config.get_metadata_dir()?,
    };
    let source = FileMetadataSource::new(metadata_dir);
    let providers = source.providers()?;

    for provider in &providers {
        info!(
            "{}/{}",
            Colored(Blue, &provider.namespace),
            Colored(Cyan, &provider.name)
        );
    }

    info!(
        "{} in {}",
        pluralize(providers.len(), "provider"),
        source.root().display()
    );

    Ok(())
}
