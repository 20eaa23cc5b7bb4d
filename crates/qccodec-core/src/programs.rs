//! Supported programs.

use std::path::Path;

use crate::error::RegistryError;
use crate::files::ClassifiedFiles;
use crate::models::{CalcType, Structure};
use crate::parsers::crest::Crest;
use crate::parsers::terachem::TeraChem;
use crate::registry::{ParseResult, ParserRegistry};

/// A program whose output can be decoded.
pub trait Program: Send + Sync {
    /// Name used for lookup and in parser registrations.
    fn name(&self) -> &'static str;

    /// Files inside the output directory that parsers read, in lookup order.
    fn named_files(&self) -> &'static [&'static str] {
        &[]
    }

    /// Add this program's parsers to `registry`.
    fn register(&self, registry: &mut ParserRegistry) -> Result<(), RegistryError>;

    /// Classified artifacts of one calculation.
    fn iter_files<'a>(&self, stdout: Option<&'a str>, directory: Option<&'a Path>) -> ClassifiedFiles<'a> {
        ClassifiedFiles::new(stdout, directory, self.named_files())
    }

    /// Calc type announced in stdout, for programs that print one.
    fn detect_calc_type(&self, _stdout: &str) -> Option<CalcType> {
        None
    }

    /// Failure message found in stdout, if the program reported one.
    fn failure_message(&self, _stdout: &str) -> Option<String> {
        None
    }

    /// Input structure described by stdout, for decodes without a request.
    /// Files named in stdout are resolved next to `stdout_path`.
    fn input_structure(
        &self,
        _stdout: &str,
        _stdout_path: &Path,
    ) -> ParseResult<Option<Structure>> {
        Ok(None)
    }
}

static PROGRAMS: [&dyn Program; 2] = [&Crest, &TeraChem];

/// Every supported program.
pub fn all() -> &'static [&'static dyn Program] {
    &PROGRAMS
}

/// Look up a program by name (case-insensitive).
pub fn resolve(name: &str) -> Option<&'static dyn Program> {
    all()
        .iter()
        .copied()
        .find(|program| program.name().eq_ignore_ascii_case(name))
}
