use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable the progress display
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate static registry responses
    #[clap(name = "generate", visible_alias = "gen")]
    Generate {
        /// Providers to generate, as namespace/name (default: every provider found)
        #[arg(required = false)]
        providers: Vec<String>,

        /// Directory holding provider metadata records
        #[arg(required = false, short, long, value_hint = ValueHint::DirPath)]
        metadata_dir: Option<String>,

        /// Directory the registry tree is written into
        #[arg(required = false, short, long, value_hint = ValueHint::DirPath)]
        destination: Option<String>,

        /// Generate one provider and one artifact at a time
        #[arg(required = false, long)]
        sequential: bool,

        /// Fail a provider if two targets share an OS and architecture
        #[arg(required = false, long)]
        reject_duplicates: bool,
    },

    /// List providers with metadata records
    #[clap(name = "list", visible_alias = "ls")]
    List {
        /// Directory holding provider metadata records
        #[arg(required = false, short, long, value_hint = ValueHint::DirPath)]
        metadata_dir: Option<String>,
    },

    /// Print the effective configuration
    Config,

    /// Print the default configuration
    #[clap(name = "defconfig")]
    DefConfig,
}
