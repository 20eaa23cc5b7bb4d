//! Command line front end for decoding quantum chemistry program outputs.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, decode, encode, programs};

/// qccodec - Decode quantum chemistry program outputs and encode native inputs
#[derive(Parser)]
#[command(name = "qccodec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one calculation's stdout and output directory
    Decode(decode::DecodeArgs),

    /// Decode many calculation directories
    Batch(batch::BatchArgs),

    /// Write native input files for a calculation request
    Encode(encode::EncodeArgs),

    /// List supported programs
    Programs(programs::ProgramsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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

    match cli.command {
        Commands::Decode(args) => decode::run(args, cli.config.as_deref()).await,
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()).await,
        Commands::Encode(args) => encode::run(args, cli.config.as_deref()).await,
        Commands::Programs(args) => programs::run(args).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}
