//! Parser descriptors.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::models::{CalcType, ProgramInput};

/// Result type for extraction functions.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Which artifact of a calculation a parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Text written to standard output.
    Stdout,
    /// The output directory itself.
    Directory,
    /// A program specific file inside the output directory.
    Named(&'static str),
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Stdout => "stdout",
            FileKind::Directory => "directory",
            FileKind::Named(name) => name,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a parsed value in the collected result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(Vec<String>);

impl Target {
    /// Build a target from path segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Target {
    fn from(segment: &str) -> Self {
        Self(vec![segment.to_string()])
    }
}

impl<const N: usize> From<[&str; N]> for Target {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Context handed to directory parsers.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryContext<'a> {
    /// Output directory of the calculation.
    pub directory: &'a Path,
    /// Standard output text, when supplied.
    pub stdout: Option<&'a str>,
    /// Request that produced the output, when supplied.
    pub request: Option<&'a ProgramInput>,
}

impl<'a> DirectoryContext<'a> {
    /// The request, or [`ParseError::MissingContext`].
    pub fn require_request(&self) -> ParseResult<&'a ProgramInput> {
        self.request.ok_or(ParseError::MissingContext("request (ProgramInput)"))
    }

    /// The stdout text, or [`ParseError::MissingContext`].
    pub fn require_stdout(&self) -> ParseResult<&'a str> {
        self.stdout.ok_or(ParseError::MissingContext("stdout"))
    }
}

/// Output of a directory parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// A single value written at the parser's target.
    Value(Value),
    /// Several related values, each written under its own key.
    Fields(Map<String, Value>),
}

/// An extraction function.
#[derive(Clone, Copy)]
pub enum ParserFn {
    /// Reads the text of a stdout or named file.
    Text(fn(&str) -> ParseResult<Value>),
    /// Reads the output directory with its context.
    Directory(fn(&DirectoryContext<'_>) -> ParseResult<Parsed>),
}

impl ParserFn {
    fn shape(&self) -> &'static str {
        match self {
            ParserFn::Text(_) => "text",
            ParserFn::Directory(_) => "directory",
        }
    }
}

impl fmt::Debug for ParserFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParserFn::{}", self.shape())
    }
}

/// Descriptor of one registered parser.
#[derive(Debug, Clone)]
pub struct ParserSpec {
    /// Parser name, unique per program.
    pub name: &'static str,
    pub program: &'static str,
    pub file_kind: FileKind,
    /// Calc types the parser applies to. Empty means all.
    pub calc_types: Vec<CalcType>,
    /// Whether a missing match aborts decoding.
    pub required: bool,
    /// Where the parsed value is written.
    pub target: Option<Target>,
    pub parser: ParserFn,
}

impl ParserSpec {
    /// A required text parser applying to every calc type.
    pub fn text(
        program: &'static str,
        name: &'static str,
        file_kind: FileKind,
        parser: fn(&str) -> ParseResult<Value>,
    ) -> Self {
        Self {
            name,
            program,
            file_kind,
            calc_types: Vec::new(),
            required: true,
            target: None,
            parser: ParserFn::Text(parser),
        }
    }

    /// A required directory parser applying to every calc type.
    pub fn directory(
        program: &'static str,
        name: &'static str,
        parser: fn(&DirectoryContext<'_>) -> ParseResult<Parsed>,
    ) -> Self {
        Self {
            name,
            program,
            file_kind: FileKind::Directory,
            calc_types: Vec::new(),
            required: true,
            target: None,
            parser: ParserFn::Directory(parser),
        }
    }

    /// Restrict the parser to some calc types.
    pub fn calc_types(mut self, calc_types: &[CalcType]) -> Self {
        self.calc_types = calc_types.to_vec();
        self
    }

    /// Set the output target.
    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Skip the parser silently when it finds no match.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Whether the parser runs for `calc_type`.
    pub fn applies_to(&self, calc_type: CalcType) -> bool {
        self.calc_types.is_empty() || self.calc_types.contains(&calc_type)
    }

    /// Calc types this parser shares with `other`, or `None` when disjoint.
    pub(crate) fn overlap(&self, other: &ParserSpec) -> Option<Vec<CalcType>> {
        let shared: Vec<CalcType> = match (self.calc_types.is_empty(), other.calc_types.is_empty()) {
            (true, true) => CalcType::ALL.to_vec(),
            (true, false) => other.calc_types.clone(),
            (false, true) => self.calc_types.clone(),
            (false, false) => self
                .calc_types
                .iter()
                .filter(|ct| other.calc_types.contains(ct))
                .copied()
                .collect(),
        };
        (!shared.is_empty()).then_some(shared)
    }

    pub(crate) fn parser_shape(&self) -> &'static str {
        self.parser.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &str) -> ParseResult<Value> {
        Ok(Value::Null)
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::from(["extras", "program_version"]).to_string(), "extras.program_version");
        assert_eq!(Target::from("energy").segments(), ["energy".to_string()]);
    }

    #[test]
    fn test_empty_calc_types_apply_to_all() {
        let spec = ParserSpec::text("p", "energy", FileKind::Stdout, noop);
        assert!(CalcType::ALL.iter().all(|ct| spec.applies_to(*ct)));
    }

    #[test]
    fn test_overlap() {
        let a = ParserSpec::text("p", "a", FileKind::Stdout, noop)
            .calc_types(&[CalcType::Energy, CalcType::Gradient]);
        let b = ParserSpec::text("p", "b", FileKind::Stdout, noop).calc_types(&[CalcType::Gradient]);
        let c = ParserSpec::text("p", "c", FileKind::Stdout, noop).calc_types(&[CalcType::Hessian]);
        let all = ParserSpec::text("p", "d", FileKind::Stdout, noop);

        assert_eq!(a.overlap(&b), Some(vec![CalcType::Gradient]));
        assert_eq!(a.overlap(&c), None);
        assert_eq!(all.overlap(&c), Some(vec![CalcType::Hessian]));
    }
}
