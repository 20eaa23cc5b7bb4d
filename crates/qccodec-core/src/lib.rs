//! Core library for quantum chemistry program I/O.
//!
//! This crate provides:
//! - A registry of output parsers keyed by program, file kind and calc type
//! - Classification of a calculation's stdout and output directory
//! - Decoding into validated single point, optimization and conformer search results
//! - Encoding of calculation requests into native input files (CREST, TeraChem)

pub mod collector;
pub mod decode;
pub mod encoders;
pub mod error;
pub mod files;
pub mod models;
pub mod parsers;
pub mod programs;
pub mod registry;

pub use collector::DataCollector;
pub use decode::{decode, DecodeInput, Decoded, Decoder, INPUT_STRUCTURE_KEY};
pub use encoders::{encode, Encoder};
pub use error::{
    CollectorError, DecodeError, EncodeError, ParseError, QcError, RegistryError, Result, XyzError,
};
pub use files::{ClassifiedFiles, FileContent};
pub use models::config::QcConfig;
pub use models::{
    CalcType, ConformerSearchResults, Model, NativeInput, OptimizationResults, ProgramInput,
    ProgramOutput, Provenance, Results, SinglePointResults, Structure,
};
pub use programs::Program;
pub use registry::{registry, FileKind, ParserRegistry, ParserSpec, Target};
