//! Encode command - write native input files for a request.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use qccodec_core::encoders::{self, write_native};
use qccodec_core::{EncodeError, ProgramInput};

use super::load_config;

/// Arguments for the encode command.
#[derive(Args)]
pub struct EncodeArgs {
    /// Program to write input for (e.g. "terachem", "crest")
    pub program: String,

    /// Calculation request (JSON)
    pub request: PathBuf,

    /// Directory to write the input files into (printed if not specified)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub async fn run(args: EncodeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.request.exists() {
        anyhow::bail!("Request file not found: {}", args.request.display());
    }
    let request = ProgramInput::from_file(&args.request)?;

    let encoder = encoders::encoder(&args.program)
        .ok_or_else(|| EncodeError::UnsupportedProgram(args.program.clone()))?;
    let native = encoders::encode(&request, encoder.program(), &config.encode)?;

    match &args.output_dir {
        Some(dir) => {
            let written = write_native(&native, encoder.input_filename(), dir)?;
            info!("Wrote {} files to {}", written.len(), dir.display());
            for path in written {
                println!("{} Wrote {}", style("✓").green(), path.display());
            }
        }
        None => {
            println!("{}", style(format!("# {}", encoder.input_filename())).bold());
            print!("{}", native.input_file);
            if let (Some(geometry), Some(name)) = (&native.geometry_file, &native.geometry_filename) {
                println!();
                println!("{}", style(format!("# {}", name)).bold());
                print!("{}", geometry);
            }
        }
    }

    Ok(())
}
