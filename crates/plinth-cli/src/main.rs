use clap::Parser;
use cli::{Args, Commands};
use error::CliResult;
use generate::{generate, GenerateArgs};
use list::list_providers;
use logging::setup_logging;
use plinth_config::config::{config_path, Config};
use tracing::debug;
use utils::{COLOR, PROGRESS};

mod cli;
mod error;
mod generate;
mod list;
mod logging;
mod progress;
mod utils;

fn handle_cli() -> CliResult<()> {
    let args = Args::parse();

    if args.no_color {
        if let Ok(mut color) = COLOR.write() {
            *color = false;
        }
    }
    if args.no_progress || args.quiet || args.json {
        if let Ok(mut progress) = PROGRESS.write() {
            *progress = false;
        }
    }

    setup_logging(&args);

    let path = config_path(args.config.as_deref())?;
    debug!("using config {}", path.display());

    let load_config = || Config::load(&path);

    match args.command {
        Commands::Generate {
            providers,
            metadata_dir,
            destination,
            sequential,
            reject_duplicates,
        } => {
            generate(
                &load_config()?,
                GenerateArgs {
                    providers,
                    metadata_dir,
                    destination,
                    sequential,
                    reject_duplicates,
                },
            )?;
        }
        Commands::List {
            metadata_dir,
        } => list_providers(&load_config()?, metadata_dir)?,
        Commands::Config => print!("{}", load_config()?.to_toml()?),
        Commands::DefConfig => print!("{}", Config::default_config().to_toml()?),
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
