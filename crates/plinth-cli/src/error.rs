use miette::Diagnostic;
use plinth_config::error::ConfigError;
use plinth_registry::RegistryError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to build worker pool: {0}")]
    #[diagnostic(code(plinth::thread_pool))]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0} provider(s) failed to generate")]
    #[diagnostic(
        code(plinth::providers_failed),
        help("Run with -v for details on each failure")
    )]
    ProvidersFailed(usize),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
