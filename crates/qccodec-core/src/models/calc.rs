//! Calculation type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of computation whose output is decoded or whose input is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcType {
    /// Single point energy.
    Energy,
    /// Single point energy and gradient.
    Gradient,
    /// Single point energy, gradient and Hessian.
    Hessian,
    /// Geometry optimization to a minimum.
    Optimization,
    /// Geometry optimization to a saddle point.
    TransitionState,
    /// Conformer search.
    ConformerSearch,
}

impl CalcType {
    /// Every calc type, in declaration order.
    pub const ALL: [CalcType; 6] = [
        CalcType::Energy,
        CalcType::Gradient,
        CalcType::Hessian,
        CalcType::Optimization,
        CalcType::TransitionState,
        CalcType::ConformerSearch,
    ];

    /// The snake_case name used on the command line and in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Gradient => "gradient",
            Self::Hessian => "hessian",
            Self::Optimization => "optimization",
            Self::TransitionState => "transition_state",
            Self::ConformerSearch => "conformer_search",
        }
    }
}

impl fmt::Display for CalcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a string that names no calc type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown calc type '{0}'; expected one of: energy, gradient, hessian, optimization, transition_state, conformer_search")]
pub struct ParseCalcTypeError(String);

impl FromStr for CalcType {
    type Err = ParseCalcTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        CalcType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == normalized)
            .ok_or_else(|| ParseCalcTypeError(s.to_string()))
    }
}

/// Format a set of calc types as a comma separated list.
pub(crate) fn join_calc_types(calc_types: &[CalcType]) -> String {
    calc_types
        .iter()
        .map(CalcType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
