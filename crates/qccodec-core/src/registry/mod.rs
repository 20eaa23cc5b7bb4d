//! Registry of parsers keyed by program.

mod spec;

pub use spec::{DirectoryContext, FileKind, ParseResult, Parsed, ParserFn, ParserSpec, Target};

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::error::RegistryError;
use crate::models::calc::join_calc_types;
use crate::models::CalcType;
use crate::programs;

lazy_static! {
    static ref REGISTRY: Result<ParserRegistry, RegistryError> = ParserRegistry::builtin();
}

/// The process-wide registry holding every built-in program's parsers.
///
/// Built once on first use and read-only afterwards. A registration
/// failure is returned to every caller.
pub fn registry() -> Result<&'static ParserRegistry, RegistryError> {
    REGISTRY.as_ref().map_err(Clone::clone)
}

/// Parsers for each program, in registration order.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    programs: Vec<&'static str>,
    parsers: HashMap<&'static str, Vec<ParserSpec>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in program.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for program in programs::all() {
            program.register(&mut registry)?;
        }
        Ok(registry)
    }

    /// Register a parser.
    ///
    /// Fails when a text parser has no target, when the parser shape does not
    /// fit its file kind, or when another parser of the program writes the
    /// same target for a shared calc type.
    pub fn register(&mut self, spec: ParserSpec) -> Result<(), RegistryError> {
        let kind_fits = match spec.parser {
            ParserFn::Directory(_) => spec.file_kind == FileKind::Directory,
            ParserFn::Text(_) => spec.file_kind != FileKind::Directory,
        };
        if !kind_fits {
            return Err(RegistryError::KindMismatch {
                program: spec.program.to_string(),
                parser: format!("{} ({} parser)", spec.name, spec.parser_shape()),
                kind: spec.file_kind.to_string(),
            });
        }

        let target = match &spec.target {
            Some(target) if target.is_empty() => None,
            other => other.as_ref(),
        };
        if target.is_none() && spec.file_kind != FileKind::Directory {
            return Err(RegistryError::MissingTarget {
                program: spec.program.to_string(),
                parser: spec.name.to_string(),
            });
        }

        let existing = self.parsers.get(spec.program).map(Vec::as_slice).unwrap_or_default();
        if let Some(target) = target {
            for registered in existing {
                if registered.target.as_ref() != Some(target) {
                    continue;
                }
                if let Some(shared) = spec.overlap(registered) {
                    return Err(RegistryError::Conflict {
                        program: spec.program.to_string(),
                        target: target.to_string(),
                        calc_types: join_calc_types(&shared),
                    });
                }
            }
        }

        debug!(
            "Registered parser '{}' for program '{}' on {}",
            spec.name, spec.program, spec.file_kind
        );
        if !self.programs.contains(&spec.program) {
            self.programs.push(spec.program);
        }
        self.parsers.entry(spec.program).or_default().push(spec);
        Ok(())
    }

    /// Parsers for `program`, optionally narrowed to a file kind and calc type.
    ///
    /// An empty result after filtering is not an error. A program with no
    /// parsers at all is.
    pub fn get_parsers(
        &self,
        program: &str,
        file_kind: Option<FileKind>,
        calc_type: Option<CalcType>,
    ) -> Result<Vec<&ParserSpec>, RegistryError> {
        let specs = self
            .parsers
            .get(program)
            .filter(|specs| !specs.is_empty())
            .ok_or_else(|| RegistryError::NoParsers(program.to_string()))?;

        Ok(specs
            .iter()
            .filter(|spec| file_kind.is_none_or(|kind| spec.file_kind == kind))
            .filter(|spec| calc_type.is_none_or(|ct| spec.applies_to(ct)))
            .collect())
    }

    /// Look up a parser by program and name.
    pub fn spec(&self, program: &str, name: &str) -> Result<&ParserSpec, RegistryError> {
        self.parsers
            .get(program)
            .and_then(|specs| specs.iter().find(|spec| spec.name == name))
            .ok_or_else(|| RegistryError::UnknownParser(format!("{}.{}", program, name)))
    }

    /// Programs with at least one parser, in registration order.
    pub fn supported_programs(&self) -> Vec<&'static str> {
        self.programs.clone()
    }

    /// Distinct file kinds read by `program`, in first-registration order.
    pub fn supported_file_kinds(&self, program: &str) -> Result<Vec<FileKind>, RegistryError> {
        let mut kinds = Vec::new();
        for spec in self.get_parsers(program, None, None)? {
            if !kinds.contains(&spec.file_kind) {
                kinds.push(spec.file_kind);
            }
        }
        Ok(kinds)
    }

    /// Calc types covered by at least one of `program`'s parsers.
    pub fn supported_calc_types(&self, program: &str) -> Result<Vec<CalcType>, RegistryError> {
        let specs = self.get_parsers(program, None, None)?;
        Ok(CalcType::ALL
            .iter()
            .copied()
            .filter(|ct| specs.iter().any(|spec| spec.applies_to(*ct)))
            .collect())
    }
}
