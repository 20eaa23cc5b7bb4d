//! Molecular structures and xyz text.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::XyzError;

/// Bohr radius in Angstrom.
pub const BOHR_TO_ANGSTROM: f64 = 0.52917721092;

/// Inverse of [`BOHR_TO_ANGSTROM`].
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / BOHR_TO_ANGSTROM;

/// Key under `extras` holding the whitespace separated tokens of an xyz comment line.
pub const XYZ_COMMENT_KEY: &str = "xyz_comments";

fn default_multiplicity() -> u32 {
    1
}

/// A molecular structure. Geometry is stored in Bohr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Element symbols, one per atom.
    pub symbols: Vec<String>,

    /// Cartesian coordinates in Bohr, one row per atom.
    pub geometry: Vec<[f64; 3]>,

    /// Total molecular charge.
    #[serde(default)]
    pub charge: i32,

    /// Spin multiplicity.
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,

    /// Chemical identifiers (SMILES, InChI, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub identifiers: Map<String, Value>,

    /// Additional data carried with the structure.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl Structure {
    /// Create a neutral singlet structure.
    pub fn new(symbols: Vec<String>, geometry: Vec<[f64; 3]>) -> Self {
        Self {
            symbols,
            geometry,
            charge: 0,
            multiplicity: 1,
            identifiers: Map::new(),
            extras: Map::new(),
        }
    }

    /// Set charge and multiplicity.
    pub fn with_charge_multiplicity(mut self, charge: i32, multiplicity: u32) -> Self {
        self.charge = charge;
        self.multiplicity = multiplicity;
        self
    }

    /// Number of atoms.
    pub fn natoms(&self) -> usize {
        self.symbols.len()
    }

    /// Read the first frame of xyz text.
    pub fn from_xyz(text: &str, charge: i32, multiplicity: u32) -> Result<Self, XyzError> {
        Self::from_xyz_multi(text, charge, multiplicity)?
            .into_iter()
            .next()
            .ok_or(XyzError::Empty)
    }

    /// Read every frame of multi-structure xyz text.
    ///
    /// Coordinates are read in Angstrom and stored in Bohr. The comment line
    /// is split on whitespace and kept under `extras.xyz_comments`.
    pub fn from_xyz_multi(
        text: &str,
        charge: i32,
        multiplicity: u32,
    ) -> Result<Vec<Self>, XyzError> {
        let mut lines = text.lines().enumerate().peekable();
        let mut structures = Vec::new();

        loop {
            // Skip blank lines between frames
            while lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}

            let Some((count_idx, count_line)) = lines.next() else {
                break;
            };
            let natoms: usize = count_line.trim().parse().map_err(|_| XyzError::AtomCount {
                line: count_idx + 1,
                value: count_line.trim().to_string(),
            })?;

            let comment = match lines.next() {
                Some((_, line)) => line,
                None => {
                    return Err(XyzError::Truncated {
                        expected: natoms,
                        found: 0,
                    })
                }
            };

            let mut symbols = Vec::with_capacity(natoms);
            let mut geometry = Vec::with_capacity(natoms);
            for found in 0..natoms {
                let (idx, line) = lines.next().ok_or(XyzError::Truncated {
                    expected: natoms,
                    found,
                })?;
                let (symbol, coords) = parse_atom_line(line).ok_or_else(|| XyzError::AtomLine {
                    line: idx + 1,
                    content: line.to_string(),
                })?;
                symbols.push(symbol);
                geometry.push(coords.map(|c| c * ANGSTROM_TO_BOHR));
            }

            let mut structure =
                Structure::new(symbols, geometry).with_charge_multiplicity(charge, multiplicity);
            let comments: Vec<Value> = comment
                .split_whitespace()
                .map(|token| Value::String(token.to_string()))
                .collect();
            structure
                .extras
                .insert(XYZ_COMMENT_KEY.to_string(), Value::Array(comments));
            structures.push(structure);
        }

        if structures.is_empty() {
            return Err(XyzError::Empty);
        }
        Ok(structures)
    }

    /// Read every frame of a multi-structure xyz file.
    pub fn open_multi(
        path: impl AsRef<Path>,
        charge: i32,
        multiplicity: u32,
    ) -> Result<Vec<Self>, XyzError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_xyz_multi(&text, charge, multiplicity)
    }

    /// Tokens of the xyz comment line this structure was read from.
    pub fn xyz_comments(&self) -> Vec<&str> {
        self.extras
            .get(XYZ_COMMENT_KEY)
            .and_then(Value::as_array)
            .map(|tokens| tokens.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Render as xyz text with coordinates in Angstrom.
    pub fn to_xyz(&self) -> String {
        let mut out = format!("{}\n{}\n", self.natoms(), self.xyz_comments().join(" "));
        for (symbol, coords) in self.symbols.iter().zip(&self.geometry) {
            let [x, y, z] = coords.map(|c| c * BOHR_TO_ANGSTROM);
            out.push_str(&format!("{:<2} {:>18.12} {:>18.12} {:>18.12}\n", symbol, x, y, z));
        }
        out
    }

    /// Merge identifiers into this structure. Existing keys are kept.
    pub fn add_identifiers(&mut self, identifiers: &Map<String, Value>) {
        for (key, value) in identifiers {
            self.identifiers
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

fn parse_atom_line(line: &str) -> Option<(String, [f64; 3])> {
    let mut parts = line.split_whitespace();
    let symbol = parts.next()?.to_string();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    Some((symbol, [x, y, z]))
}
