//! CLI for building and reviewing the reconciled document feed.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, review, run};

/// docfeed - Turn invoices, emails and form submissions into one reviewable feed
#[derive(Parser)]
#[command(name = "docfeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every input directory, reconcile and write the combined feed
    Run(run::RunArgs),

    /// Extract a single document
    Extract(extract::ExtractArgs),

    /// List feed records or change their review status
    Review(review::ReviewArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => run::run(args, config_path),
        Commands::Extract(args) => extract::run(args, config_path),
        Commands::Review(args) => review::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
