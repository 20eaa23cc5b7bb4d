//! CREST output parsers.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{chunk_xyz, parse_f64, parse_floats, re_find_all, re_search};
use crate::error::{ParseError, RegistryError};
use crate::models::{
    CalcType, ProgramInput, ProgramOutput, Provenance, SinglePointResults, Structure,
    ANGSTROM_TO_BOHR,
};
use crate::programs::Program;
use crate::registry::{DirectoryContext, FileKind, ParseResult, Parsed, ParserRegistry, ParserSpec};

/// Program name.
pub const NAME: &str = "crest";

/// Numerical Hessian written by `--numhess`.
pub const NUMHESS: &str = "numhess1";
/// Frequencies and normal modes in Gaussian 98 format.
pub const G98: &str = "g98.out";
/// Energy and gradient of a single point or of the final optimization step.
pub const ENGRAD: &str = "crest.engrad";
/// Optimization trajectory as multi-frame xyz.
pub const OPTLOG: &str = "crestopt.log";

const CONFORMERS_XYZ: &str = "crest_conformers.xyz";
const ROTAMERS_XYZ: &str = "crest_rotamers.xyz";

lazy_static! {
    static ref VERSION: Regex = Regex::new(r"Version (\d+\.\d+\.\d+),").unwrap();

    static ref ENERGY: Regex = Regex::new(r"# Energy \( Eh \)\n#*\n\s*([-\d.]+)").unwrap();

    static ref GRADIENT: Regex =
        Regex::new(r"# Gradient \( Eh/a0 \)\n#\s*\n((?:\s*[-\d.]+\n)+)").unwrap();

    static ref ENERGY_NUMHESS: Regex = Regex::new(r"Energy\s=\s*([-+]?\d+\.\d+)\s*Eh").unwrap();

    static ref NUMHESS_FLOAT: Regex = Regex::new(r"[-]?\d*\.\d+|\d+").unwrap();

    static ref G98_FREQUENCIES: Regex =
        Regex::new(r"Frequencies\s+--\s+(?P<floats>(?:-?\d+\.\d+\s*)+)").unwrap();

    static ref G98_BLOCK_START: Regex = Regex::new(r"Frequencies\s+--").unwrap();

    static ref G98_DISPLACEMENT: Regex = Regex::new(r"[-+]?\d*\.\d+").unwrap();
}

/// CREST parser set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crest;

impl Program for Crest {
    fn name(&self) -> &'static str {
        NAME
    }

    fn named_files(&self) -> &'static [&'static str] {
        &[NUMHESS, G98, ENGRAD, OPTLOG]
    }

    fn register(&self, registry: &mut ParserRegistry) -> Result<(), RegistryError> {
        let specs = [
            ParserSpec::text(NAME, "version", FileKind::Stdout, parse_version)
                .target(["extras", "program_version"]),
            ParserSpec::directory(NAME, "conformers", parse_conformers)
                .calc_types(&[CalcType::ConformerSearch]),
            ParserSpec::directory(NAME, "rotamers", parse_rotamers)
                .calc_types(&[CalcType::ConformerSearch]),
            ParserSpec::text(NAME, "energy", FileKind::Named(ENGRAD), parse_energy)
                .calc_types(&[CalcType::Energy, CalcType::Gradient])
                .target("energy"),
            ParserSpec::text(NAME, "gradient", FileKind::Named(ENGRAD), parse_gradient)
                .calc_types(&[CalcType::Energy, CalcType::Gradient])
                .target("gradient"),
            ParserSpec::text(NAME, "energy_numhess", FileKind::Stdout, parse_energy_numhess)
                .calc_types(&[CalcType::Hessian])
                .target("energy"),
            ParserSpec::text(NAME, "numhess1", FileKind::Named(NUMHESS), parse_numhess1)
                .calc_types(&[CalcType::Hessian])
                .target("hessian"),
            ParserSpec::text(NAME, "g98_freqs", FileKind::Named(G98), parse_g98_freqs)
                .calc_types(&[CalcType::Hessian])
                .target("freqs_wavenumber"),
            ParserSpec::text(NAME, "g98_normal_modes", FileKind::Named(G98), parse_g98_normal_modes)
                .calc_types(&[CalcType::Hessian])
                .target("normal_modes_cartesian"),
            ParserSpec::directory(NAME, "trajectory", parse_trajectory)
                .calc_types(&[CalcType::Optimization])
                .target("trajectory"),
        ];

        for spec in specs {
            registry.register(spec)?;
        }
        Ok(())
    }
}

/// Version string as printed by `crest --version`.
pub fn version(text: &str) -> ParseResult<String> {
    Ok(re_search(&VERSION, text)?[1].to_string())
}

fn parse_version(text: &str) -> ParseResult<Value> {
    version(text).map(Value::String)
}

fn parse_conformers(ctx: &DirectoryContext<'_>) -> ParseResult<Parsed> {
    read_structures(ctx, CONFORMERS_XYZ, "conformers", "conformer_energies")
}

fn parse_rotamers(ctx: &DirectoryContext<'_>) -> ParseResult<Parsed> {
    read_structures(ctx, ROTAMERS_XYZ, "rotamers", "rotamer_energies")
}

/// Read a multi-frame xyz of CREST structures. The energy is the only
/// token of each comment line.
fn read_structures(
    ctx: &DirectoryContext<'_>,
    filename: &str,
    structures_key: &str,
    energies_key: &str,
) -> ParseResult<Parsed> {
    let request = ctx.require_request()?;
    let mut structures = Structure::open_multi(
        ctx.directory.join(filename),
        request.structure.charge,
        request.structure.multiplicity,
    )?;

    let energies = structures
        .iter()
        .map(|s| comment_energy(s, 0))
        .collect::<ParseResult<Vec<f64>>>()?;

    // Conformers keep the input's identifiers unless topology checks were turned off
    if request.keywords.get("topo").and_then(Value::as_bool).unwrap_or(true) {
        for structure in &mut structures {
            structure.add_identifiers(&request.structure.identifiers);
        }
    }

    debug!("Read {} structures from {}", structures.len(), filename);
    let mut fields = Map::new();
    fields.insert(structures_key.to_string(), serde_json::to_value(structures)?);
    fields.insert(energies_key.to_string(), json!(energies));
    Ok(Parsed::Fields(fields))
}

fn comment_energy(structure: &Structure, token: usize) -> ParseResult<f64> {
    let comments = structure.xyz_comments();
    let value = comments.get(token).ok_or_else(|| {
        ParseError::Malformed(format!(
            "xyz comment '{}' has no energy token at position {}",
            comments.join(" "),
            token
        ))
    })?;
    parse_f64(value)
}

fn parse_energy(text: &str) -> ParseResult<Value> {
    Ok(json!(parse_f64(&re_search(&ENERGY, text)?[1])?))
}

/// Gradient from a `crest.engrad` file, one row per atom.
pub fn gradient(text: &str) -> ParseResult<Vec<Vec<f64>>> {
    let values = parse_floats(&re_search(&GRADIENT, text)?[1])?;
    chunk_xyz(&values)
}

fn parse_gradient(text: &str) -> ParseResult<Value> {
    Ok(json!(gradient(text)?))
}

fn parse_energy_numhess(text: &str) -> ParseResult<Value> {
    Ok(json!(parse_f64(&re_search(&ENERGY_NUMHESS, text)?[1])?))
}

fn parse_numhess1(text: &str) -> ParseResult<Value> {
    let numbers = NUMHESS_FLOAT
        .find_iter(text)
        .map(|m| parse_f64(m.as_str()))
        .collect::<ParseResult<Vec<f64>>>()?;
    if numbers.is_empty() {
        return Err(ParseError::no_match(NUMHESS_FLOAT.as_str()));
    }

    let n = numbers.len().isqrt();
    if n * n != numbers.len() {
        return Err(ParseError::Malformed(format!(
            "expected a square matrix, but found {} elements",
            numbers.len()
        )));
    }
    let hessian: Vec<Vec<f64>> = numbers.chunks(n).map(<[f64]>::to_vec).collect();
    Ok(json!(hessian))
}

fn parse_g98_freqs(text: &str) -> ParseResult<Value> {
    let freqs = re_find_all(&G98_FREQUENCIES, text)?
        .iter()
        .map(|caps| parse_floats(&caps["floats"]))
        .collect::<ParseResult<Vec<Vec<f64>>>>()?;
    Ok(json!(freqs.concat()))
}

/// Normal modes from g98 text, shaped (modes, atoms, 3) and converted to Bohr.
///
/// Each `Frequencies --` line opens a block of up to three modes. Atom rows
/// after the `Atom AN` header hold x, y, z for every mode of the block.
fn parse_g98_normal_modes(text: &str) -> ParseResult<Value> {
    let starts: Vec<usize> = G98_BLOCK_START.find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return Err(ParseError::no_match(G98_BLOCK_START.as_str()));
    }

    let mut normal_modes: Vec<Vec<Vec<f64>>> = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = &text[start..end];

        let n_freqs = block
            .lines()
            .next()
            .map(|line| line.split_whitespace().skip(2).count())
            .unwrap_or_default();
        if n_freqs == 0 {
            return Err(ParseError::Malformed(format!("no frequencies in g98 block {}", i)));
        }

        let (_, rows) = block
            .split_once("Atom AN")
            .ok_or_else(|| ParseError::Malformed(format!("g98 block {} has no 'Atom AN' header", i)))?;
        let displacements = G98_DISPLACEMENT
            .find_iter(rows)
            .map(|m| parse_f64(m.as_str()))
            .collect::<ParseResult<Vec<f64>>>()?;

        if displacements.len() % (3 * n_freqs) != 0 {
            return Err(ParseError::Malformed(format!(
                "g98 block {} has {} displacements, not a multiple of {}",
                i,
                displacements.len(),
                3 * n_freqs
            )));
        }
        let n_atoms = displacements.len() / (3 * n_freqs);
        let mut modes = vec![Vec::with_capacity(n_atoms); n_freqs];
        for atom in 0..n_atoms {
            for (j, mode) in modes.iter_mut().enumerate() {
                let index = atom * 3 * n_freqs + j * 3;
                let coords: Vec<f64> = displacements[index..index + 3]
                    .iter()
                    .map(|v| v * ANGSTROM_TO_BOHR)
                    .collect();
                mode.push(coords);
            }
        }
        normal_modes.extend(modes);
    }

    Ok(json!(normal_modes))
}

/// Optimization trajectory from `crestopt.log`.
///
/// CREST writes no per-step gradients, so each step carries a zero gradient.
/// The final step takes its gradient from `crest.engrad` when the
/// optimization finished, and is marked unsuccessful otherwise.
fn parse_trajectory(ctx: &DirectoryContext<'_>) -> ParseResult<Parsed> {
    let request = ctx.require_request()?;
    let program_version = version(ctx.require_stdout()?)?;

    let structures = read_trajectory(ctx.directory, request)?;
    let natoms = request.structure.natoms();

    let mut trajectory = structures
        .into_iter()
        .map(|structure| -> ParseResult<ProgramOutput> {
            let energy = comment_energy(&structure, 1)?;
            Ok(ProgramOutput {
                input_data: ProgramInput::new(CalcType::Gradient, structure, request.model.clone()),
                success: true,
                results: SinglePointResults {
                    energy: Some(energy),
                    gradient: Some(vec![vec![0.0; 3]; natoms]),
                    ..Default::default()
                },
                provenance: Provenance {
                    program: NAME.to_string(),
                    program_version: Some(program_version.clone()),
                },
            })
        })
        .collect::<ParseResult<Vec<_>>>()?;

    let engrad = ctx.directory.join(ENGRAD);
    if let Some(last) = trajectory.last_mut() {
        if engrad.is_file() {
            let text = std::fs::read_to_string(&engrad)
                .map_err(|source| ParseError::Io { path: engrad.clone(), source })?;
            last.results.gradient = Some(gradient(&text)?);
        } else {
            debug!("{} not found; marking final step as failed", ENGRAD);
            last.success = false;
        }
    }

    Ok(Parsed::Value(serde_json::to_value(trajectory)?))
}

fn read_trajectory(directory: &Path, request: &ProgramInput) -> ParseResult<Vec<Structure>> {
    let path = directory.join(OPTLOG);
    let text = std::fs::read_to_string(&path).map_err(|source| ParseError::Io { path, source })?;
    Ok(Structure::from_xyz_multi(
        &text,
        request.structure.charge,
        request.structure.multiplicity,
    )?)
}
