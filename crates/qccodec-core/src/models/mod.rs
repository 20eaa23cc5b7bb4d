//! Data models for calculation requests, results and native input files.

pub mod calc;
pub mod config;
pub mod input;
pub mod native;
pub mod results;
pub mod structure;

pub use calc::{CalcType, ParseCalcTypeError};
pub use input::{Model, ProgramInput};
pub use native::NativeInput;
pub use results::{
    ConformerSearchResults, OptimizationResults, ProgramOutput, Provenance, Results,
    SinglePointResults,
};
pub use structure::{Structure, ANGSTROM_TO_BOHR, BOHR_TO_ANGSTROM, XYZ_COMMENT_KEY};
