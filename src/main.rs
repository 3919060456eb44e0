use anyhow::Result;
use clap::Parser;
use nym::commands;
use std::path::PathBuf;

/// nym - Node.js version manager
///
/// Installs Node.js releases under a per-user root and switches between them by
/// repointing the `current` link.
///
/// Examples:
///   nym install 20.11.0   # Download and install v20.11.0
///   nym use 20.11.0       # Make v20.11.0 the active version
#[derive(Parser, Debug)]
#[command(author, version = env!("NYM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install root directory (defaults to ~/.nym; also via NYM_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "NYM_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub install_root: Option<PathBuf>,

    /// Distribution mirror (defaults to https://nodejs.org/dist; also via NYM_MIRROR)
    #[arg(long = "mirror", env = "NYM_MIRROR", value_name = "URL", global = true)]
    pub mirror: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download and install a Node.js version
    Install(VersionArgs),

    /// Switch the active version
    Use(VersionArgs),

    /// List installed versions
    List,

    /// Print the active version
    Current,

    /// List versions available for download
    LsRemote(LsRemoteArgs),

    /// Create the install root and add the active version to PATH
    Init,
}

#[derive(clap::Args, Debug)]
pub struct VersionArgs {
    /// Exact version, with or without a leading "v" (e.g. 20.11.0)
    #[arg(value_name = "VERSION")]
    pub version: String,
}

#[derive(clap::Args, Debug)]
pub struct LsRemoteArgs {
    /// Show only the newest N versions
    #[arg(long, short = 'n', value_name = "N")]
    pub limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = nym::runtime::RealRuntime;

    match cli.command {
        Commands::Install(args) => {
            commands::install(runtime, &args.version, cli.install_root, cli.mirror).await?
        }
        Commands::Use(args) => commands::use_version(runtime, &args.version, cli.install_root)?,
        Commands::List => commands::list(runtime, cli.install_root)?,
        Commands::Current => commands::current(runtime, cli.install_root)?,
        Commands::LsRemote(args) => {
            commands::ls_remote(runtime, args.limit, cli.install_root, cli.mirror).await?
        }
        Commands::Init => commands::init(runtime, cli.install_root)?,
    }
    Ok(())
}
