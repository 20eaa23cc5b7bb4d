//! Programs command - list supported programs.

use clap::Args;
use console::style;
use serde_json::json;

use qccodec_core::{encoders, registry};

/// Arguments for the programs command.
#[derive(Args)]
pub struct ProgramsArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ProgramsArgs) -> anyhow::Result<()> {
    let registry = registry()?;

    let mut entries = Vec::new();
    for program in registry.supported_programs() {
        let file_kinds: Vec<String> = registry
            .supported_file_kinds(program)?
            .iter()
            .map(|kind| kind.to_string())
            .collect();
        let calc_types: Vec<&str> = registry
            .supported_calc_types(program)?
            .iter()
            .map(|ct| ct.as_str())
            .collect();
        let encodes: Vec<&str> = encoders::encoder(program)
            .map(|e| e.supported_calc_types().iter().map(|ct| ct.as_str()).collect())
            .unwrap_or_default();
        entries.push((program, file_kinds, calc_types, encodes));
    }

    if args.json {
        let value: Vec<_> = entries
            .iter()
            .map(|(program, file_kinds, calc_types, encodes)| {
                json!({
                    "program": program,
                    "file_kinds": file_kinds,
                    "decode_calc_types": calc_types,
                    "encode_calc_types": encodes,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for (program, file_kinds, calc_types, encodes) in &entries {
        println!("{}", style(program).bold());
        println!("  File kinds:  {}", file_kinds.join(", "));
        println!("  Decodes:     {}", calc_types.join(", "));
        if !encodes.is_empty() {
            println!("  Encodes:     {}", encodes.join(", "));
        }
    }

    Ok(())
}
