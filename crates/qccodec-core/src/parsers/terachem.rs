//! TeraChem stdout parsers.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use super::{chunk_xyz, parse_f64, parse_floats, parse_u64, re_search};
use crate::error::{ParseError, RegistryError};
use crate::models::{CalcType, Structure};
use crate::programs::Program;
use crate::registry::{FileKind, ParseResult, ParserRegistry, ParserSpec};

/// Program name.
pub const NAME: &str = "terachem";

const FAILURE_FALLBACK: &str =
    "Could not extract failure message from TeraChem stdout. Look at the last lines of stdout for clues.";

lazy_static! {
    static ref ENERGY: Regex = Regex::new(r"FINAL ENERGY: (-?\d+(?:\.\d+)?)").unwrap();

    static ref METHOD: Regex = Regex::new(r"Method: (\S+)").unwrap();

    static ref BASIS: Regex = Regex::new(r"Using basis set: (\S+)").unwrap();

    static ref VERSION: Regex = Regex::new(r"TeraChem (v\S*)").unwrap();

    static ref NATOMS: Regex = Regex::new(r"Total atoms:\s*(\d+)").unwrap();

    static ref NMO: Regex = Regex::new(r"Total orbitals:\s*(\d+)").unwrap();

    static ref CHARGE: Regex = Regex::new(r"Total charge:\s*(-?\d+)").unwrap();

    static ref SPIN_MULTIPLICITY: Regex = Regex::new(r"Spin multiplicity:\s*(\d+)").unwrap();

    static ref XYZ_PATH: Regex = Regex::new(r"XYZ coordinates (.+)").unwrap();

    // Floats between the dE/dX header and the closing dashed line
    static ref GRADIENT: Regex =
        Regex::new(r"dE/dX\s{12}dE/dY\s{12}dE/dZ\n([\d\.\-\s]+?)\n-{2,}").unwrap();

    static ref CALC_TYPES: [(CalcType, Regex); 3] = [
        (CalcType::Energy, Regex::new(r"SINGLE POINT ENERGY CALCULATIONS").unwrap()),
        (CalcType::Gradient, Regex::new(r"SINGLE POINT GRADIENT CALCULATIONS").unwrap()),
        (CalcType::Hessian, Regex::new(r" FREQUENCY ANALYSIS ").unwrap()),
    ];

    static ref FAILURES: [Regex; 2] = [
        Regex::new(r"DIE called at line number .*").unwrap(),
        Regex::new(r"CUDA error:.*").unwrap(),
    ];
}

/// TeraChem parser set. Everything is read from stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraChem;

impl Program for TeraChem {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register(&self, registry: &mut ParserRegistry) -> Result<(), RegistryError> {
        let specs = [
            ParserSpec::text(NAME, "energy", FileKind::Stdout, parse_energy).target("energy"),
            ParserSpec::text(NAME, "gradient", FileKind::Stdout, parse_gradient)
                .calc_types(&[CalcType::Gradient, CalcType::Hessian])
                .target("gradient"),
            ParserSpec::text(NAME, "hessian", FileKind::Stdout, parse_hessian)
                .calc_types(&[CalcType::Hessian])
                .target("hessian"),
            ParserSpec::text(NAME, "natoms", FileKind::Stdout, parse_natoms).target("calcinfo_natoms"),
            ParserSpec::text(NAME, "nmo", FileKind::Stdout, parse_nmo).target("calcinfo_nmo"),
            ParserSpec::text(NAME, "version", FileKind::Stdout, parse_version)
                .target(["extras", "program_version"]),
            ParserSpec::text(NAME, "method", FileKind::Stdout, parse_method)
                .target(["extras", "method"])
                .optional(),
            ParserSpec::text(NAME, "basis", FileKind::Stdout, parse_basis)
                .target(["extras", "basis"])
                .optional(),
        ];

        for spec in specs {
            registry.register(spec)?;
        }
        Ok(())
    }

    fn detect_calc_type(&self, stdout: &str) -> Option<CalcType> {
        calc_type(stdout).ok()
    }

    fn failure_message(&self, stdout: &str) -> Option<String> {
        (!calculation_succeeded(stdout)).then(|| failure_text(stdout))
    }

    fn input_structure(
        &self,
        stdout: &str,
        stdout_path: &Path,
    ) -> ParseResult<Option<Structure>> {
        input_structure(stdout, stdout_path).map(Some)
    }
}

fn parse_energy(text: &str) -> ParseResult<Value> {
    Ok(json!(parse_f64(&re_search(&ENERGY, text)?[1])?))
}

fn parse_method(text: &str) -> ParseResult<Value> {
    Ok(json!(&re_search(&METHOD, text)?[1]))
}

fn parse_basis(text: &str) -> ParseResult<Value> {
    Ok(json!(&re_search(&BASIS, text)?[1]))
}

/// Version string, e.g. `v1.9-2022.03-dev`.
pub fn version(text: &str) -> ParseResult<String> {
    Ok(re_search(&VERSION, text)?[1].to_string())
}

fn parse_version(text: &str) -> ParseResult<Value> {
    version(text).map(Value::String)
}

fn parse_natoms(text: &str) -> ParseResult<Value> {
    Ok(json!(parse_u64(&re_search(&NATOMS, text)?[1])?))
}

fn parse_nmo(text: &str) -> ParseResult<Value> {
    Ok(json!(parse_u64(&re_search(&NMO, text)?[1])?))
}

fn parse_gradient(text: &str) -> ParseResult<Value> {
    let values = parse_floats(&re_search(&GRADIENT, text)?[1])?;
    Ok(json!(chunk_xyz(&values)?))
}

/// Hessian rows, read one row index at a time.
///
/// TeraChem prints the matrix in column blocks, so row `n` is spread over
/// every line that starts with `n` followed by floats.
fn parse_hessian(text: &str) -> ParseResult<Value> {
    let mut hessian: Vec<Vec<f64>> = Vec::new();

    for count in 1.. {
        let row_regex = Regex::new(&format!(
            r"(?:\s+{}\s)((?:\s-?\d\.\d{{15}}e[+-]\d{{2}})+)",
            count
        ))
        .map_err(|e| ParseError::Malformed(e.to_string()))?;

        let mut row = Vec::new();
        for caps in row_regex.captures_iter(text) {
            row.extend(parse_floats(&caps[1])?);
        }
        if row.is_empty() {
            break;
        }
        hessian.push(row);
    }

    if hessian.is_empty() {
        return Err(ParseError::no_match(r"(?:\s+1\s)((?:\s-?\d\.\d{15}e[+-]\d{2})+)"));
    }
    if let Some((i, row)) = hessian.iter().enumerate().find(|(_, row)| row.len() != hessian.len()) {
        return Err(ParseError::Malformed(format!(
            "hessian should be square; recovered {} of {} floats for row {}",
            row.len(),
            hessian.len(),
            i
        )));
    }
    Ok(json!(hessian))
}

/// Calc type announced in stdout.
pub fn calc_type(text: &str) -> ParseResult<CalcType> {
    CALC_TYPES
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map(|(calc_type, _)| *calc_type)
        .ok_or_else(|| {
            let patterns: Vec<&str> = CALC_TYPES.iter().map(|(_, regex)| regex.as_str()).collect();
            ParseError::no_match(patterns.join("|"))
        })
}

/// Whether stdout shows no known failure message.
pub fn calculation_succeeded(text: &str) -> bool {
    !FAILURES.iter().any(|regex| regex.is_match(text))
}

/// First known failure message in stdout, or a generic hint.
pub fn failure_text(text: &str) -> String {
    FAILURES
        .iter()
        .find_map(|regex| regex.find(text))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| FAILURE_FALLBACK.to_string())
}

/// Path of the input xyz file, relative to the input file.
pub fn xyz_path(text: &str) -> ParseResult<PathBuf> {
    Ok(PathBuf::from(re_search(&XYZ_PATH, text)?[1].trim()))
}

/// Input structure named on the `XYZ coordinates` line, read next to the
/// stdout file, with charge and multiplicity taken from stdout.
pub fn input_structure(text: &str, stdout_path: &Path) -> ParseResult<Structure> {
    let directory = stdout_path.parent().unwrap_or_else(|| Path::new("."));
    let path = directory.join(xyz_path(text)?);
    let charge = total_charge(text)?;
    let multiplicity = spin_multiplicity(text)?;

    let xyz = std::fs::read_to_string(&path).map_err(|source| ParseError::Io { path, source })?;
    Ok(Structure::from_xyz(&xyz, charge, multiplicity)?)
}

pub fn total_charge(text: &str) -> ParseResult<i32> {
    let caps = re_search(&CHARGE, text)?;
    let value = &caps[1];
    value
        .parse()
        .map_err(|_| ParseError::Malformed(format!("'{}' is not a charge", value)))
}

pub fn spin_multiplicity(text: &str) -> ParseResult<u32> {
    let caps = re_search(&SPIN_MULTIPLICITY, text)?;
    let value = &caps[1];
    value
        .parse()
        .map_err(|_| ParseError::Malformed(format!("'{}' is not a multiplicity", value)))
}
