//! Calculation requests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::calc::CalcType;
use super::structure::Structure;
use crate::error::Result;

/// Level of theory for a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Method name (e.g. "b3lyp", "gfn2").
    pub method: String,

    /// Basis set, when the method takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

impl Model {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            basis: None,
        }
    }

    pub fn with_basis(mut self, basis: impl Into<String>) -> Self {
        self.basis = Some(basis.into());
        self
    }
}

/// A structured calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramInput {
    /// Kind of calculation to run.
    pub calctype: CalcType,

    /// Input structure.
    pub structure: Structure,

    /// Level of theory.
    pub model: Model,

    /// Program specific keywords.
    #[serde(default)]
    pub keywords: Map<String, Value>,

    /// Additional data carried with the request.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl ProgramInput {
    pub fn new(calctype: CalcType, structure: Structure, model: Model) -> Self {
        Self {
            calctype,
            structure,
            model,
            keywords: Map::new(),
            extras: Map::new(),
        }
    }

    /// Set a keyword.
    pub fn with_keyword(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(key.into(), value.into());
        self
    }

    /// Load a request from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
