//! Batch command - decode many calculation directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use qccodec_core::programs;
use qccodec_core::{CalcType, DecodeInput, Decoded, Decoder, ProgramInput, Results};

use super::decode::read_optional;
use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Program that produced the outputs
    pub program: String,

    /// Calc type of every calculation
    pub calc_type: CalcType,

    /// Glob pattern matching calculation directories
    pub pattern: String,

    /// Number of directories decoded concurrently
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Name of the stdout file inside each directory
    #[arg(long)]
    pub stdout_name: Option<String>,

    /// Name of the request file (JSON) inside each directory, read when present
    #[arg(long, default_value = "input.json")]
    pub request_name: String,

    /// Directory receiving one JSON result per calculation
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also write a summary CSV
    #[arg(long)]
    pub summary: bool,

    /// Continue on error
    #[arg(long)]
    pub continue_on_error: bool,
}

/// Outcome of decoding one directory.
struct DirResult {
    path: PathBuf,
    decoded: Option<Decoded>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let program = programs::resolve(&args.program)
        .ok_or_else(|| anyhow::anyhow!("Unsupported program: {}", args.program))?;
    let decoder = Decoder::builtin()?;

    let directories: Vec<PathBuf> = glob(&args.pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_dir())
        .collect();

    if directories.is_empty() {
        anyhow::bail!("No calculation directories found for pattern: {}", args.pattern);
    }

    println!(
        "{} Found {} calculation directories",
        style("ℹ").blue(),
        directories.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);
    let stdout_name = args.stdout_name.clone().unwrap_or(config.batch.stdout_name);
    let as_raw = config.decode.raw;

    let pb = ProgressBar::new(directories.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} directories")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(directories.len());
    for path in directories {
        let permit = semaphore.clone().acquire_owned().await?;
        let program_name = program.name();
        let calc_type = args.calc_type;
        let stdout_name = stdout_name.clone();
        let request_name = args.request_name.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let outcome = decode_directory(
                &decoder,
                program_name,
                calc_type,
                &path,
                &stdout_name,
                &request_name,
                as_raw,
            );
            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            match outcome {
                Ok(decoded) => DirResult {
                    path,
                    decoded: Some(decoded),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => DirResult {
                    path,
                    decoded: None,
                    error: Some(format!("{:#}", e)),
                    processing_time_ms,
                },
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await?;
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to decode {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to decode {}: {}", result.path.display(), error_msg);
                pb.abandon();
                anyhow::bail!("Decoding {} failed: {}", result.path.display(), error_msg);
            }
        }
        pb.inc(1);
        results.push(result);
    }

    pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.decoded.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(decoded) = &result.decoded {
                let output_path = output_dir.join(format!("{}.json", output_stem(&result.path)));
                let content = if config.output.pretty {
                    serde_json::to_string_pretty(decoded)?
                } else {
                    serde_json::to_string(decoded)?
                };
                fs::write(&output_path, content)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, args.calc_type, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Decoded {} directories in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed directories:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn decode_directory(
    decoder: &Decoder<'static>,
    program: &str,
    calc_type: CalcType,
    directory: &Path,
    stdout_name: &str,
    request_name: &str,
    as_raw: bool,
) -> anyhow::Result<Decoded> {
    let stdout_path = directory.join(stdout_name);
    let stdout = read_optional(&stdout_path)?;
    let request_path = directory.join(request_name);
    let request = if request_path.is_file() {
        Some(ProgramInput::from_file(&request_path)?)
    } else {
        None
    };

    let mut input = DecodeInput::new().directory(directory).raw(as_raw);
    if let Some(text) = stdout.as_deref() {
        input = input.stdout(text).stdout_path(&stdout_path);
    }
    if let Some(request) = request.as_ref() {
        input = input.request(request);
    }
    Ok(decoder.decode(program, calc_type, &input)?)
}

fn output_stem(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("calculation")
        .to_string()
}

/// Energy worth a summary column: the single point energy, the final
/// optimization energy, or the lowest conformer energy.
fn headline_energy(decoded: &Decoded) -> Option<f64> {
    match decoded.results()? {
        Results::SinglePoint(sp) => sp.energy,
        Results::Optimization(opt) => opt.final_energy(),
        Results::ConformerSearch(search) => search
            .conformer_energies
            .iter()
            .copied()
            .reduce(f64::min),
    }
}

fn program_version(decoded: &Decoded) -> Option<String> {
    let version = match decoded {
        Decoded::Raw(map) => map.get("extras")?.get("program_version")?.as_str()?.to_string(),
        Decoded::Results(Results::SinglePoint(sp)) => {
            sp.extras.get("program_version")?.as_str()?.to_string()
        }
        Decoded::Results(Results::Optimization(opt)) => {
            opt.trajectory.last()?.provenance.program_version.clone()?
        }
        Decoded::Results(Results::ConformerSearch(search)) => {
            search.extras.get("program_version")?.as_str()?.to_string()
        }
    };
    Some(version)
}

fn write_summary(path: &Path, calc_type: CalcType, results: &[DirResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "directory",
        "status",
        "calc_type",
        "energy",
        "program_version",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let directory = result.path.display().to_string();

        if let Some(decoded) = &result.decoded {
            wtr.write_record([
                directory.as_str(),
                "success",
                calc_type.as_str(),
                &headline_energy(decoded).map(|e| e.to_string()).unwrap_or_default(),
                &program_version(decoded).unwrap_or_default(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                directory.as_str(),
                "error",
                calc_type.as_str(),
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qccodec_core::SinglePointResults;
    use serde_json::json;

    #[test]
    fn test_headline_energy_single_point() {
        let decoded = Decoded::Results(Results::SinglePoint(SinglePointResults {
            energy: Some(-1.5),
            ..Default::default()
        }));
        assert_eq!(headline_energy(&decoded), Some(-1.5));
    }

    #[test]
    fn test_program_version_from_raw() {
        let map = match json!({"extras": {"program_version": "3.0.2"}}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(program_version(&Decoded::Raw(map)).as_deref(), Some("3.0.2"));
    }

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem(Path::new("runs/water")), "water");
    }
}
