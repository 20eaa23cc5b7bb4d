//! Decode command - decode a single calculation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use serde_json::Value;
use tracing::{debug, info};

use qccodec_core::programs::{self, Program};
use qccodec_core::{CalcType, DecodeInput, Decoded, Decoder, ProgramInput, Results};

use super::load_config;

/// Arguments for the decode command.
#[derive(Args)]
pub struct DecodeArgs {
    /// Program that produced the output (e.g. "terachem", "crest")
    pub program: String,

    /// Calc type, or "auto" to read it from stdout
    pub calc_type: String,

    /// Standard output file. A directory given here is used as the output directory
    pub stdout: Option<PathBuf>,

    /// Output directory
    pub directory: Option<PathBuf>,

    /// Calculation request (JSON) that produced the output
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print the collected data without building a typed result
    #[arg(long)]
    pub raw: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON
    Json,
    /// Human readable summary
    Text,
}

impl OutputFormat {
    /// Format named in the configuration file; unknown names fall back to JSON.
    pub fn from_config(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "text" | "txt" => OutputFormat::Text,
            _ => OutputFormat::Json,
        }
    }
}

pub async fn run(args: DecodeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let (stdout_path, directory) = split_paths(args.stdout, args.directory);
    if stdout_path.is_none() && directory.is_none() {
        anyhow::bail!("Provide a stdout file, an output directory, or both");
    }

    let stdout = match &stdout_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Stdout file not found: {}", path.display());
            }
            Some(fs::read_to_string(path)?)
        }
        None => None,
    };

    let request = match &args.input {
        Some(path) => Some(ProgramInput::from_file(path)?),
        None => None,
    };

    let program = programs::resolve(&args.program)
        .ok_or_else(|| anyhow::anyhow!("Unsupported program: {}", args.program))?;
    let calc_type = resolve_calc_type(&args.calc_type, program, stdout.as_deref())?;
    info!("Decoding {} output as '{}'", program.name(), calc_type);

    if let Some(message) = stdout.as_deref().and_then(|text| program.failure_message(text)) {
        eprintln!(
            "{} {} reported a failure:\n{}",
            style("⚠").yellow(),
            program.name(),
            message
        );
    }

    let mut input = DecodeInput::new().raw(args.raw || config.decode.raw);
    if let Some(text) = stdout.as_deref() {
        input = input.stdout(text);
    }
    if let Some(path) = stdout_path.as_deref() {
        input = input.stdout_path(path);
    }
    if let Some(dir) = directory.as_deref() {
        input = input.directory(dir);
    }
    if let Some(request) = request.as_ref() {
        input = input.request(request);
    }

    let decoded = Decoder::builtin()?.decode(program.name(), calc_type, &input)?;

    let format = args
        .format
        .unwrap_or_else(|| OutputFormat::from_config(&config.output.format));
    let output = format_decoded(&decoded, format, config.output.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total decode time: {:?}", start.elapsed());
    Ok(())
}

/// A lone directory passed in the stdout position is the output directory.
fn split_paths(
    stdout: Option<PathBuf>,
    directory: Option<PathBuf>,
) -> (Option<PathBuf>, Option<PathBuf>) {
    match (stdout, directory) {
        (Some(path), None) if path.is_dir() => (None, Some(path)),
        other => other,
    }
}

/// Parse a calc type name, detecting it from stdout for "auto".
pub fn resolve_calc_type(
    name: &str,
    program: &dyn Program,
    stdout: Option<&str>,
) -> anyhow::Result<CalcType> {
    if !name.eq_ignore_ascii_case("auto") {
        return Ok(name.parse()?);
    }
    let stdout = stdout
        .ok_or_else(|| anyhow::anyhow!("Calc type 'auto' needs a stdout file to read it from"))?;
    program.detect_calc_type(stdout).ok_or_else(|| {
        anyhow::anyhow!(
            "Could not detect the calc type from {} output; pass it explicitly",
            program.name()
        )
    })
}

/// Render a decode result in the requested format.
pub fn format_decoded(
    decoded: &Decoded,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(decoded)?),
        OutputFormat::Json => Ok(serde_json::to_string(decoded)?),
        OutputFormat::Text => Ok(format_text(decoded)),
    }
}

fn format_text(decoded: &Decoded) -> String {
    let mut output = String::new();

    match decoded {
        Decoded::Raw(map) => {
            for (key, value) in map {
                output.push_str(&format!("{}: {}\n", key, summarize(value)));
            }
        }
        Decoded::Results(Results::SinglePoint(sp)) => {
            if let Some(energy) = sp.energy {
                output.push_str(&format!("Energy: {:.10} Eh\n", energy));
            }
            if let Some(natoms) = sp.calcinfo_natoms {
                output.push_str(&format!("Atoms: {}\n", natoms));
            }
            if let Some(nmo) = sp.calcinfo_nmo {
                output.push_str(&format!("Molecular orbitals: {}\n", nmo));
            }
            if let Some(gradient) = &sp.gradient {
                output.push_str(&format!("Gradient: {} x 3\n", gradient.len()));
            }
            if let Some(hessian) = &sp.hessian {
                output.push_str(&format!(
                    "Hessian: {} x {}\n",
                    hessian.len(),
                    hessian.len()
                ));
            }
            if !sp.freqs_wavenumber.is_empty() {
                output.push_str(&format!(
                    "Frequencies: {}\n",
                    sp.freqs_wavenumber.len()
                ));
            }
            write_extras(&mut output, &sp.extras);
        }
        Decoded::Results(Results::Optimization(opt)) => {
            output.push_str(&format!("Steps: {}\n", opt.trajectory.len()));
            let energies = opt.energies();
            if let (Some(first), Some(last)) = (energies.first(), energies.last()) {
                output.push_str(&format!(
                    "Energy change: {:.10} Eh over {} steps\n",
                    last - first,
                    energies.len()
                ));
            }
            if let Some(energy) = opt.final_energy() {
                output.push_str(&format!("Final energy: {:.10} Eh\n", energy));
            }
            if let Some(structure) = opt.final_structure() {
                output.push_str(&format!(
                    "Final structure: {} atoms\n",
                    structure.symbols.len()
                ));
            }
            if let Some(last) = opt.trajectory.last() {
                output.push_str(&format!("Converged: {}\n", last.success));
                if let Some(version) = &last.provenance.program_version {
                    output.push_str(&format!("Program version: {}\n", version));
                }
            }
            write_extras(&mut output, &opt.extras);
        }
        Decoded::Results(Results::ConformerSearch(search)) => {
            output.push_str(&format!("Conformers: {}\n", search.conformers.len()));
            let lowest = search
                .conformer_energies
                .iter()
                .copied()
                .fold(None, |min: Option<f64>, e| Some(min.map_or(e, |m| m.min(e))));
            if let Some(energy) = lowest {
                output.push_str(&format!("Lowest energy: {:.10} Eh\n", energy));
            }
            output.push_str(&format!("Rotamers: {}\n", search.rotamers.len()));
            write_extras(&mut output, &search.extras);
        }
    }

    output.trim_end().to_string()
}

fn write_extras(output: &mut String, extras: &serde_json::Map<String, Value>) {
    for (key, value) in extras {
        output.push_str(&format!("{}: {}\n", key, summarize(value)));
    }
}

/// Scalars print as-is; arrays and objects print their size.
fn summarize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => format!("{{{} keys}}", map.len()),
        other => other.to_string(),
    }
}

/// Read a stdout file next to a calculation directory, if it exists.
pub fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
    if path.is_file() {
        Ok(Some(fs::read_to_string(path)?))
    } else {
        Ok(None)
    }
}
