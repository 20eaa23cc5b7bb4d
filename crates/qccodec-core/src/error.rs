//! Error types for the qccodec-core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::CalcType;

/// Errors raised while loading or saving configuration and request files.
#[derive(Error, Debug)]
pub enum QcError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not hold the expected JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while registering or looking up parsers.
///
/// These are startup errors: a conflicting registration is a bug in a
/// program's parser table, never something the caller can recover from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two parsers of one program write the same target for a shared calc type.
    #[error(
        "duplicate parser target '{target}' and calc types [{calc_types}] registered for program '{program}'"
    )]
    Conflict {
        program: String,
        target: String,
        calc_types: String,
    },

    /// A parser that does not read the directory declared no target.
    #[error("parser '{parser}' for program '{program}' must have a target if it is not a directory parser")]
    MissingTarget { program: String, parser: String },

    /// A text parser was registered on the directory kind, or the reverse.
    #[error("parser '{parser}' for program '{program}' cannot read file kind '{kind}'")]
    KindMismatch {
        program: String,
        parser: String,
        kind: String,
    },

    /// The program has no registered parsers at all.
    #[error("no parsers registered for program '{0}'")]
    NoParsers(String),

    /// No parser is registered under this name.
    #[error("no parser registered for '{0}'")]
    UnknownParser(String),
}

/// Outcome of a single extraction function.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The expected pattern is absent from the content.
    #[error("could not locate match for regex: {pattern}")]
    NoMatch { pattern: String },

    /// The pattern matched but the content could not be interpreted.
    #[error("malformed content: {0}")]
    Malformed(String),

    /// A directory parser needs context the caller did not supply.
    #[error("missing context: {0}")]
    MissingContext(&'static str),

    /// A structure file inside the directory could not be read.
    #[error("xyz error: {0}")]
    Xyz(#[from] XyzError),

    /// A file inside the directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A parsed value could not be converted to JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    /// Build a [`ParseError::NoMatch`] for the given pattern.
    pub fn no_match(pattern: impl Into<String>) -> Self {
        Self::NoMatch {
            pattern: pattern.into(),
        }
    }

    /// Whether the error only signals an absent match.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch { .. })
    }
}

/// Errors raised by the write-once data collector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    /// The path was already written.
    #[error("target '{path}' already exists in the data collector; a target cannot be added twice")]
    Conflict { path: String },

    /// An intermediate segment already holds a non-table value.
    #[error("cannot nest under '{path}': it already holds a value that is not a table")]
    NotATable { path: String },

    /// A write was attempted with no path segments.
    #[error("target path must have at least one segment")]
    EmptyPath,
}

/// Errors raised while decoding program output.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// No program with this name is known.
    #[error("no parsers found for program '{0}'")]
    UnknownProgram(String),

    /// The output directory is missing or is not a directory.
    #[error("directory {} does not exist or is not a directory", .0.display())]
    InvalidDirectory(PathBuf),

    /// Neither stdout nor a directory was supplied.
    #[error("either stdout, directory, or both must be provided")]
    MissingInput,

    /// Registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A required parser found no match.
    #[error("required parser '{parser}' failed for target '{target}': {source}")]
    RequiredFieldMissing {
        parser: &'static str,
        target: String,
        #[source]
        source: ParseError,
    },

    /// A parser failed for a reason other than an absent match.
    #[error("parser '{parser}' failed: {source}")]
    Parser {
        parser: &'static str,
        #[source]
        source: ParseError,
    },

    /// Two parsers wrote the same result path.
    #[error(transparent)]
    Conflict(#[from] CollectorError),

    /// The collected data does not form a valid result record.
    #[error("collected data is not a valid {calc_type} result: {reason}")]
    Finalize { calc_type: CalcType, reason: String },

    /// An auxiliary file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while encoding a request into native input files.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// No encoder exists for this program.
    #[error("no encoder available for program '{0}'")]
    UnsupportedProgram(String),

    /// The program's encoder does not handle this calc type.
    #[error("calc type '{calc_type}' not supported by the {program} encoder")]
    UnsupportedCalcType {
        program: &'static str,
        calc_type: CalcType,
    },

    /// A keyword duplicates a value carried elsewhere on the request.
    #[error("keyword '{keyword}' should not be set as a keyword; it is set at '{location}'")]
    ReservedKeyword {
        keyword: String,
        location: &'static str,
    },

    /// The runtype keyword is incompatible with the calc type.
    #[error("unsupported runtype '{runtype}' for calc type '{calc_type}'; valid runtypes are: {valid}")]
    InvalidRuntype {
        runtype: String,
        calc_type: CalcType,
        valid: String,
    },

    /// A field the encoder needs is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A geometry body was given without a filename.
    #[error("geometry_filename must be set if geometry_file is provided")]
    MissingGeometryFilename,

    /// TOML serialization failed.
    #[error("failed to serialize TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Errors raised while reading xyz text.
#[derive(Error, Debug)]
pub enum XyzError {
    /// The text contains no frames.
    #[error("xyz text contains no structures")]
    Empty,

    /// The atom count line is not an integer.
    #[error("invalid atom count on line {line}: '{value}'")]
    AtomCount { line: usize, value: String },

    /// The frame ends before all atoms were read.
    #[error("expected {expected} atom lines, found {found}")]
    Truncated { expected: usize, found: usize },

    /// An atom line does not hold a symbol and three coordinates.
    #[error("invalid atom line {line}: '{content}'")]
    AtomLine { line: usize, content: String },

    /// The xyz file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for loading and saving files.
pub type Result<T> = std::result::Result<T, QcError>;
