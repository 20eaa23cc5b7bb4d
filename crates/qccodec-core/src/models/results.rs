//! Typed result records produced by decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::calc::CalcType;
use super::input::ProgramInput;
use super::structure::Structure;
use crate::error::DecodeError;

/// Results of a single point (energy, gradient or Hessian) calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinglePointResults {
    /// Total energy in Hartree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,

    /// Nuclear gradient in Hartree/Bohr, one row of three per atom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Vec<Vec<f64>>>,

    /// Square Hessian matrix in Hartree/Bohr^2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hessian: Option<Vec<Vec<f64>>>,

    /// Harmonic frequencies in cm^-1.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub freqs_wavenumber: Vec<f64>,

    /// Normal mode displacements in Bohr, shaped (modes, atoms, 3).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub normal_modes_cartesian: Vec<Vec<Vec<f64>>>,

    /// Number of atoms reported by the program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calcinfo_natoms: Option<u64>,

    /// Number of molecular orbitals reported by the program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calcinfo_nmo: Option<u64>,

    /// Additional program specific data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl SinglePointResults {
    /// Check array shapes.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(gradient) = &self.gradient {
            if let Some(row) = gradient.iter().position(|r| r.len() != 3) {
                return Err(format!(
                    "gradient row {} has {} values, expected 3",
                    row,
                    gradient[row].len()
                ));
            }
        }

        if let Some(hessian) = &self.hessian {
            let n = hessian.len();
            if let Some(row) = hessian.iter().position(|r| r.len() != n) {
                return Err(format!(
                    "hessian must be square: row {} has {} values, expected {}",
                    row,
                    hessian[row].len(),
                    n
                ));
            }
            if let Some(gradient) = &self.gradient {
                if n != 3 * gradient.len() {
                    return Err(format!(
                        "hessian dimension {} does not match {} atoms in the gradient",
                        n,
                        gradient.len()
                    ));
                }
            }
        }

        for (i, mode) in self.normal_modes_cartesian.iter().enumerate() {
            if mode.iter().any(|atom| atom.len() != 3) {
                return Err(format!("normal mode {} has an atom without 3 coordinates", i));
            }
        }

        if !self.freqs_wavenumber.is_empty()
            && !self.normal_modes_cartesian.is_empty()
            && self.freqs_wavenumber.len() != self.normal_modes_cartesian.len()
        {
            return Err(format!(
                "{} frequencies but {} normal modes",
                self.freqs_wavenumber.len(),
                self.normal_modes_cartesian.len()
            ));
        }

        Ok(())
    }
}

/// Program identification attached to an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Program name.
    pub program: String,

    /// Program version, when it could be determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_version: Option<String>,
}

/// One calculation: its request, outcome and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOutput {
    pub input_data: ProgramInput,
    pub success: bool,
    pub results: SinglePointResults,
    pub provenance: Provenance,
}

/// Results of a geometry optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizationResults {
    /// Every gradient step, in order.
    pub trajectory: Vec<ProgramOutput>,

    /// Additional program specific data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl OptimizationResults {
    /// Check that the trajectory holds at least one valid step.
    pub fn validate(&self) -> Result<(), String> {
        if self.trajectory.is_empty() {
            return Err("optimization trajectory has no steps".to_string());
        }
        for (i, step) in self.trajectory.iter().enumerate() {
            step.results
                .validate()
                .map_err(|e| format!("trajectory step {}: {}", i, e))?;
        }
        Ok(())
    }

    /// Structure of the last step.
    pub fn final_structure(&self) -> Option<&Structure> {
        self.trajectory.last().map(|po| &po.input_data.structure)
    }

    /// Energy of the last step.
    pub fn final_energy(&self) -> Option<f64> {
        self.trajectory.last().and_then(|po| po.results.energy)
    }

    /// Energy of every step that reported one.
    pub fn energies(&self) -> Vec<f64> {
        self.trajectory
            .iter()
            .filter_map(|po| po.results.energy)
            .collect()
    }
}

/// Results of a conformer search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConformerSearchResults {
    #[serde(default)]
    pub conformers: Vec<Structure>,

    /// Energies in Hartree, parallel to `conformers`.
    #[serde(default)]
    pub conformer_energies: Vec<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotamers: Vec<Structure>,

    /// Energies in Hartree, parallel to `rotamers`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotamer_energies: Vec<f64>,

    /// Additional program specific data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl ConformerSearchResults {
    /// Check that structures and energies pair up.
    pub fn validate(&self) -> Result<(), String> {
        if self.conformers.len() != self.conformer_energies.len() {
            return Err(format!(
                "{} conformers but {} conformer energies",
                self.conformers.len(),
                self.conformer_energies.len()
            ));
        }
        if self.rotamers.len() != self.rotamer_energies.len() {
            return Err(format!(
                "{} rotamers but {} rotamer energies",
                self.rotamers.len(),
                self.rotamer_energies.len()
            ));
        }
        Ok(())
    }
}

/// A decoded result record, shaped by the calc type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Results {
    SinglePoint(SinglePointResults),
    Optimization(OptimizationResults),
    ConformerSearch(ConformerSearchResults),
}

impl Results {
    /// Build the record for `calc_type` from collected data.
    ///
    /// Unknown fields and shape violations are reported as
    /// [`DecodeError::Finalize`], never coerced.
    pub fn from_collected(
        calc_type: CalcType,
        data: Map<String, Value>,
    ) -> Result<Self, DecodeError> {
        let finalize = |reason: String| DecodeError::Finalize { calc_type, reason };
        let value = Value::Object(data);

        match calc_type {
            CalcType::Energy | CalcType::Gradient | CalcType::Hessian => {
                let results: SinglePointResults =
                    serde_json::from_value(value).map_err(|e| finalize(e.to_string()))?;
                results.validate().map_err(finalize)?;
                Ok(Results::SinglePoint(results))
            }
            CalcType::Optimization | CalcType::TransitionState => {
                let results: OptimizationResults =
                    serde_json::from_value(value).map_err(|e| finalize(e.to_string()))?;
                results.validate().map_err(finalize)?;
                Ok(Results::Optimization(results))
            }
            CalcType::ConformerSearch => {
                let results: ConformerSearchResults =
                    serde_json::from_value(value).map_err(|e| finalize(e.to_string()))?;
                results.validate().map_err(finalize)?;
                Ok(Results::ConformerSearch(results))
            }
        }
    }

    pub fn as_single_point(&self) -> Option<&SinglePointResults> {
        match self {
            Results::SinglePoint(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_optimization(&self) -> Option<&OptimizationResults> {
        match self {
            Results::Optimization(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_conformer_search(&self) -> Option<&ConformerSearchResults> {
        match self {
            Results::ConformerSearch(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_single_point_from_collected() {
        let data = map(json!({
            "energy": -76.386,
            "gradient": [[0.1, 0.2, 0.3], [0.0, 0.0, -0.1]],
            "extras": {"program_version": "v1.9"}
        }));
        let results = Results::from_collected(CalcType::Gradient, data).unwrap();
        let sp = results.as_single_point().unwrap();
        assert_eq!(sp.energy, Some(-76.386));
        assert_eq!(sp.gradient.as_ref().map(Vec::len), Some(2));
        assert_eq!(sp.extras["program_version"], "v1.9");
    }

    #[test]
    fn test_unknown_field_is_finalize_error() {
        let data = map(json!({"energy": 1.0, "not_a_field": 2}));
        let err = Results::from_collected(CalcType::Energy, data).unwrap_err();
        assert!(matches!(err, DecodeError::Finalize { calc_type: CalcType::Energy, .. }));
    }

    #[test]
    fn test_non_square_hessian_rejected() {
        let data = map(json!({"hessian": [[1.0, 2.0], [3.0]]}));
        let err = Results::from_collected(CalcType::Hessian, data).unwrap_err();
        assert!(err.to_string().contains("square"));
    }

    #[test]
    fn test_empty_trajectory_rejected() {
        let data = map(json!({"trajectory": []}));
        let err = Results::from_collected(CalcType::Optimization, data).unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }

    #[test]
    fn test_missing_trajectory_rejected() {
        let err = Results::from_collected(CalcType::TransitionState, Map::new()).unwrap_err();
        assert!(matches!(err, DecodeError::Finalize { .. }));
    }

    #[test]
    fn test_conformer_energy_count_mismatch() {
        let data = map(json!({
            "conformers": [{"symbols": ["H"], "geometry": [[0.0, 0.0, 0.0]]}],
            "conformer_energies": []
        }));
        let err = Results::from_collected(CalcType::ConformerSearch, data).unwrap_err();
        assert!(err.to_string().contains("1 conformers but 0"));
    }
}
