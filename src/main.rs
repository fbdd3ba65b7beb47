//! RSCM CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rscm")]
#[command(about = "Gameval mapping resolution for RSCM projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Host-persisted project state file (JSON)
    #[arg(long)]
    state: Option<PathBuf>,

    /// External settings file; overrides the state file's configured path
    #[arg(long)]
    settings_file: Option<PathBuf>,

    /// Mapping directory; may be repeated, overrides the state file's list
    #[arg(short = 'd', long = "dir")]
    dirs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all entries for a prefix, with their sources
    List { prefix: String },
    /// Resolve a prefix:key reference to navigation targets
    Resolve {
        reference: String,

        /// Print targets as JSON
        #[arg(long)]
        json: bool,
    },
    /// Complete a partial prefix:key reference
    Complete { reference: String },
    /// Decode a .dat file and print its tables
    Dump { file: PathBuf },
    /// Watch the mapping directories and reload on changes
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("rscm={}", log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = commands::load_settings(cli.state, cli.settings_file, cli.dirs)?;

    match cli.command {
        Commands::List { prefix } => commands::list(settings, &prefix),
        Commands::Resolve { reference, json } => commands::resolve(settings, &reference, json),
        Commands::Complete { reference } => commands::complete(settings, &reference),
        Commands::Dump { file } => commands::dump(&file),
        Commands::Watch => commands::watch(settings).await,
    }
}
