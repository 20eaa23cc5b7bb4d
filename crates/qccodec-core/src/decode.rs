//! Decoding of program output into structured results.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::collector::DataCollector;
use crate::error::{DecodeError, ParseError};
use crate::files::FileContent;
use crate::models::{CalcType, ProgramInput, Results};
use crate::programs::{self, Program};
use crate::registry::{self, DirectoryContext, ParserFn, ParserRegistry, ParserSpec, Parsed};

/// Key under `extras` holding the input structure rebuilt from stdout.
pub const INPUT_STRUCTURE_KEY: &str = "input_structure";

/// Artifacts of one calculation to decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeInput<'a> {
    /// Standard output text.
    pub stdout: Option<&'a str>,
    /// File the stdout text was read from. Files named in stdout are found next to it.
    pub stdout_path: Option<&'a Path>,
    /// Output directory.
    pub directory: Option<&'a Path>,
    /// Request that produced the output. Some directory parsers need it.
    pub request: Option<&'a ProgramInput>,
    /// Return the collected mapping instead of a validated result.
    pub as_raw: bool,
}

impl<'a> DecodeInput<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, stdout: &'a str) -> Self {
        self.stdout = Some(stdout);
        self
    }

    pub fn stdout_path(mut self, path: &'a Path) -> Self {
        self.stdout_path = Some(path);
        self
    }

    pub fn directory(mut self, directory: &'a Path) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn request(mut self, request: &'a ProgramInput) -> Self {
        self.request = Some(request);
        self
    }

    pub fn raw(mut self, as_raw: bool) -> Self {
        self.as_raw = as_raw;
        self
    }
}

/// Output of [`decode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Decoded {
    /// Validated result record.
    Results(Results),
    /// Collected mapping, unvalidated.
    Raw(Map<String, Value>),
}

impl Decoded {
    pub fn results(&self) -> Option<&Results> {
        match self {
            Decoded::Results(results) => Some(results),
            Decoded::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&Map<String, Value>> {
        match self {
            Decoded::Raw(raw) => Some(raw),
            Decoded::Results(_) => None,
        }
    }
}

/// Decode one calculation with the built-in programs.
pub fn decode(
    program: &str,
    calc_type: CalcType,
    input: &DecodeInput<'_>,
) -> Result<Decoded, DecodeError> {
    Decoder::builtin()?.decode(program, calc_type, input)
}

/// Runs registered parsers over a program's classified files.
#[derive(Clone, Copy)]
pub struct Decoder<'r> {
    registry: &'r ParserRegistry,
    programs: &'r [&'r dyn Program],
}

impl<'r> Decoder<'r> {
    pub fn new(registry: &'r ParserRegistry, programs: &'r [&'r dyn Program]) -> Self {
        Self { registry, programs }
    }

    fn resolve(&self, name: &str) -> Result<&'r dyn Program, DecodeError> {
        self.programs
            .iter()
            .copied()
            .find(|program| program.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| DecodeError::UnknownProgram(name.to_string()))
    }

    /// Decode into a validated result, or into the raw mapping when
    /// `input.as_raw` is set.
    pub fn decode(
        &self,
        program: &str,
        calc_type: CalcType,
        input: &DecodeInput<'_>,
    ) -> Result<Decoded, DecodeError> {
        let collector = self.collect(program, calc_type, input)?;
        if input.as_raw {
            return Ok(Decoded::Raw(collector.into_inner()));
        }
        collector.into_results(calc_type).map(Decoded::Results)
    }

    /// Run every applicable parser and collect the parsed values.
    ///
    /// Stops at the first required parser without a match, the first parser
    /// error, or the first value written twice.
    pub fn collect(
        &self,
        program: &str,
        calc_type: CalcType,
        input: &DecodeInput<'_>,
    ) -> Result<DataCollector, DecodeError> {
        info!("Starting decode for program '{}' with calc type '{}'", program, calc_type);
        if input.stdout.is_none() && input.directory.is_none() {
            return Err(DecodeError::MissingInput);
        }
        let program = self.resolve(program)?;
        let name = program.name();

        let mut collector = DataCollector::new();
        for file in program.iter_files(input.stdout, input.directory) {
            let (kind, content) = file?;
            debug!("Processing file kind '{}'", kind);

            let specs = self.registry.get_parsers(name, Some(kind), Some(calc_type))?;
            info!(
                "Found {} parser(s) for program '{}', file kind '{}', calc type '{}'",
                specs.len(),
                name,
                kind,
                calc_type
            );

            for spec in specs {
                debug!("Running parser '{}' for target '{}'", spec.name, display_target(spec));
                match run_parser(spec, &content, input) {
                    Ok(parsed) => {
                        info!("Parser '{}' succeeded", spec.name);
                        route(&mut collector, spec, parsed)?;
                    }
                    Err(e) if e.is_no_match() => {
                        if spec.required {
                            error!("Required parser '{}' failed: {}", spec.name, e);
                            return Err(DecodeError::RequiredFieldMissing {
                                parser: spec.name,
                                target: display_target(spec),
                                source: e,
                            });
                        }
                        info!("Parser '{}' did not find a match but is not required", spec.name);
                    }
                    Err(e) => {
                        error!("Parser '{}' failed: {}", spec.name, e);
                        return Err(DecodeError::Parser {
                            parser: spec.name,
                            source: e,
                        });
                    }
                }
            }
        }

        if input.request.is_none() {
            if let (Some(stdout), Some(path)) = (input.stdout, input.stdout_path) {
                if let Some(structure) = rebuild_input(program, stdout, path)? {
                    collector.add(&["extras", INPUT_STRUCTURE_KEY], structure)?;
                    debug!("Assigned input structure to 'extras.{}'", INPUT_STRUCTURE_KEY);
                }
            }
        }

        info!("Completed processing files for program '{}'", name);
        Ok(collector)
    }
}

impl Decoder<'static> {
    /// Decoder over the process-wide registry and the built-in programs.
    pub fn builtin() -> Result<Self, DecodeError> {
        Ok(Self::new(registry::registry()?, programs::all()))
    }
}

/// Input structure rebuilt from stdout when no request was supplied.
fn rebuild_input(
    program: &dyn Program,
    stdout: &str,
    path: &Path,
) -> Result<Option<Value>, DecodeError> {
    let parser_error = |source| DecodeError::Parser {
        parser: "input_structure",
        source,
    };
    match program.input_structure(stdout, path).map_err(parser_error)? {
        Some(structure) => serde_json::to_value(structure)
            .map(Some)
            .map_err(|e| parser_error(ParseError::Json(e))),
        None => Ok(None),
    }
}

fn run_parser(
    spec: &ParserSpec,
    content: &FileContent<'_>,
    input: &DecodeInput<'_>,
) -> Result<Parsed, ParseError> {
    match (spec.parser, content) {
        (ParserFn::Text(parse), FileContent::Text(text)) => parse(text).map(Parsed::Value),
        (ParserFn::Directory(parse), FileContent::Directory(directory)) => parse(&DirectoryContext {
            directory: *directory,
            stdout: input.stdout,
            request: input.request,
        }),
        _ => Err(ParseError::Malformed(format!(
            "parser '{}' cannot read file kind '{}'",
            spec.name, spec.file_kind
        ))),
    }
}

/// Write a parser's output into the collector.
///
/// A single value goes to the parser's target. Each entry of a mapping is
/// written on its own, nested under the target when one is set.
fn route(collector: &mut DataCollector, spec: &ParserSpec, parsed: Parsed) -> Result<(), DecodeError> {
    let prefix: &[String] = spec.target.as_ref().map(|t| t.segments()).unwrap_or_default();

    match parsed {
        Parsed::Value(value) => {
            if prefix.is_empty() {
                return Err(DecodeError::Parser {
                    parser: spec.name,
                    source: ParseError::Malformed(
                        "returned a single value but has no target".to_string(),
                    ),
                });
            }
            collector.add(prefix, value)?;
            debug!("Assigned value from '{}' to '{}'", spec.name, display_target(spec));
        }
        Parsed::Fields(fields) => {
            for (key, value) in fields {
                let mut path = prefix.to_vec();
                path.push(key);
                collector.add(&path, value)?;
                debug!("Assigned value from '{}' to '{}'", spec.name, path.join("."));
            }
        }
    }
    Ok(())
}

fn display_target(spec: &ParserSpec) -> String {
    spec.target
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(mapping)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectorError, RegistryError};
    use crate::models::{Model, Structure};
    use crate::registry::{FileKind, ParseResult};
    use lazy_static::lazy_static;
    use pretty_assertions::assert_eq;
    use regex::Regex;
    use serde_json::json;

    lazy_static! {
        static ref P_ENERGY: Regex = Regex::new(r"FINAL ENERGY: (-?\d+(?:\.\d+)?)").unwrap();
        static ref P_VERSION: Regex = Regex::new(r"P version (\S+)").unwrap();
    }

    fn p_energy(text: &str) -> ParseResult<Value> {
        let caps = crate::parsers::re_search(&P_ENERGY, text)?;
        Ok(json!(crate::parsers::parse_f64(&caps[1])?))
    }

    fn p_version(text: &str) -> ParseResult<Value> {
        Ok(json!(&crate::parsers::re_search(&P_VERSION, text)?[1]))
    }

    fn p_conformers(_: &DirectoryContext<'_>) -> ParseResult<Parsed> {
        let mut fields = Map::new();
        fields.insert(
            "conformers".into(),
            json!([{"symbols": ["H"], "geometry": [[0.0, 0.0, 0.0]]}]),
        );
        fields.insert("conformer_energies".into(), json!([-0.5]));
        Ok(Parsed::Fields(fields))
    }

    fn p_energies_again(_: &DirectoryContext<'_>) -> ParseResult<Parsed> {
        let mut fields = Map::new();
        fields.insert("conformer_energies".into(), json!([-0.6]));
        Ok(Parsed::Fields(fields))
    }

    fn p_broken(_: &str) -> ParseResult<Value> {
        Err(ParseError::Malformed("bad number".into()))
    }

    fn p_unreadable(context: &DirectoryContext<'_>) -> ParseResult<Parsed> {
        Err(ParseError::Io {
            path: context.directory.join("scratch"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }

    struct P;

    impl Program for P {
        fn name(&self) -> &'static str {
            "p"
        }

        fn register(&self, registry: &mut ParserRegistry) -> Result<(), RegistryError> {
            registry.register(
                ParserSpec::text("p", "energy", FileKind::Stdout, p_energy)
                    .calc_types(&[CalcType::Energy])
                    .target("energy"),
            )?;
            registry.register(
                ParserSpec::text("p", "version", FileKind::Stdout, p_version)
                    .target(["extras", "version"])
                    .optional(),
            )?;
            registry.register(
                ParserSpec::directory("p", "conformers", p_conformers)
                    .calc_types(&[CalcType::ConformerSearch]),
            )
        }
    }

    struct Empty;

    impl Program for Empty {
        fn name(&self) -> &'static str {
            "empty"
        }

        fn register(&self, _: &mut ParserRegistry) -> Result<(), RegistryError> {
            Ok(())
        }
    }

    fn p_registry() -> ParserRegistry {
        let mut registry = ParserRegistry::new();
        P.register(&mut registry).unwrap();
        registry
    }

    const PROGRAMS: [&dyn Program; 2] = [&P, &Empty];

    #[test]
    fn test_decode_energy() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let input = DecodeInput::new().stdout("FINAL ENERGY: -76.386 a.u");

        let decoded = decoder.decode("p", CalcType::Energy, &input).unwrap();
        let results = decoded.results().unwrap().as_single_point().unwrap();
        assert_eq!(results.energy, Some(-76.386));
    }

    #[test]
    fn test_optional_parser_without_match_is_skipped() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let input = DecodeInput::new().stdout("FINAL ENERGY: -76.386 a.u").raw(true);

        let decoded = decoder.decode("p", CalcType::Energy, &input).unwrap();
        let raw = decoded.raw().unwrap();
        assert_eq!(raw.get("energy"), Some(&json!(-76.386)));
        assert!(raw.get("extras").is_none());
    }

    #[test]
    fn test_optional_parser_with_match_is_nested() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let input = DecodeInput::new().stdout("P version 2.1\nFINAL ENERGY: -1.0\n");

        let collector = decoder.collect("p", CalcType::Energy, &input).unwrap();
        assert_eq!(collector.get(&["extras", "version"]), Some(&json!("2.1")));
    }

    #[test]
    fn test_required_parser_without_match_fails() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let input = DecodeInput::new().stdout("no energy here");

        let err = decoder.decode("p", CalcType::Energy, &input).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::RequiredFieldMissing { parser: "energy", ref target, .. } if target == "energy"
        ));
    }

    #[test]
    fn test_parser_error_is_fatal_even_when_optional() {
        let mut registry = ParserRegistry::new();
        registry
            .register(
                ParserSpec::text("p", "broken", FileKind::Stdout, p_broken)
                    .target("energy")
                    .optional(),
            )
            .unwrap();
        let decoder = Decoder::new(&registry, &PROGRAMS);

        let err = decoder
            .decode("p", CalcType::Energy, &DecodeInput::new().stdout("x"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Parser { parser: "broken", .. }));
    }

    #[test]
    fn test_directory_mapping_keys_are_written_separately() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let dir = tempfile::tempdir().unwrap();
        let input = DecodeInput::new().directory(dir.path()).raw(true);

        let decoded = decoder.decode("p", CalcType::ConformerSearch, &input).unwrap();
        let raw = decoded.raw().unwrap();
        assert_eq!(raw["conformer_energies"], json!([-0.5]));
        assert_eq!(raw["conformers"][0]["symbols"], json!(["H"]));

        let typed = decoder
            .decode("p", CalcType::ConformerSearch, &input.raw(false))
            .unwrap();
        let results = typed.results().unwrap().as_conformer_search().unwrap();
        assert_eq!(results.conformers.len(), 1);
    }

    #[test]
    fn test_overlapping_mapping_keys_conflict() {
        let mut registry = p_registry();
        registry
            .register(
                ParserSpec::directory("p", "energies_again", p_energies_again)
                    .calc_types(&[CalcType::ConformerSearch]),
            )
            .unwrap();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let dir = tempfile::tempdir().unwrap();

        let err = decoder
            .decode("p", CalcType::ConformerSearch, &DecodeInput::new().directory(dir.path()))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Conflict(CollectorError::Conflict { ref path }) if path == "conformer_energies"
        ));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let input = DecodeInput::new().stdout("P version 2.1\nFINAL ENERGY: -76.386 a.u");

        let first = decoder.decode("p", CalcType::Energy, &input).unwrap();
        let second = decoder.decode("p", CalcType::Energy, &input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_optional_directory_parser_error_is_fatal() {
        let mut registry = p_registry();
        registry
            .register(
                ParserSpec::directory("p", "scratch", p_unreadable)
                    .calc_types(&[CalcType::Energy])
                    .target("extras")
                    .optional(),
            )
            .unwrap();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let dir = tempfile::tempdir().unwrap();
        let input = DecodeInput::new()
            .stdout("FINAL ENERGY: -1.0")
            .directory(dir.path());

        let err = decoder.decode("p", CalcType::Energy, &input).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Parser { parser: "scratch", source: ParseError::Io { .. } }
        ));
    }

    #[test]
    fn test_decode_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("crestopt.log"),
            "2\n energy: -1.10\nH 0 0 0\nH 0 0 0.8\n2\n energy: -1.17\nH 0 0 0\nH 0 0 0.74\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("crest.engrad"),
            "# Energy ( Eh )\n#\n-1.17\n# Gradient ( Eh/a0 )\n#\n 0.0\n 0.0\n -0.01\n 0.0\n 0.0\n 0.01\n",
        )
        .unwrap();
        let structure = Structure::from_xyz("2\n\nH 0 0 0\nH 0 0 0.74\n", 0, 1).unwrap();
        let request = ProgramInput::new(CalcType::Optimization, structure, Model::new("gfn2"));
        let input = DecodeInput::new()
            .stdout("Version 3.0.2, x")
            .directory(dir.path())
            .request(&request);

        let first = decode("crest", CalcType::Optimization, &input).unwrap();
        let second = decode("crest", CalcType::Optimization, &input).unwrap();
        assert_eq!(first, second);

        let raw_first = decode("crest", CalcType::Optimization, &input.raw(true)).unwrap();
        let raw_second = decode("crest", CalcType::Optimization, &input.raw(true)).unwrap();
        assert_eq!(raw_first, raw_second);

        let results = first.results().unwrap().as_optimization().unwrap();
        assert_eq!(results.energies(), vec![-1.10, -1.17]);
        assert!(results.trajectory[1].success);
    }

    #[test]
    fn test_builtin_terachem_rebuilds_input_structure() {
        let dir = tempfile::tempdir().unwrap();
        let stdout_path = dir.path().join("tc.out");
        std::fs::write(dir.path().join("water.xyz"), "3\n\nO 0 0 0\nH 0 0.757 0.586\nH 0 -0.757 0.586\n")
            .unwrap();
        let stdout = crate::parsers::terachem::tests::GRADIENT_STDOUT;
        let input = DecodeInput::new().stdout(stdout).stdout_path(&stdout_path);

        let decoded = decode("terachem", CalcType::Energy, &input).unwrap();
        let results = decoded.results().unwrap().as_single_point().unwrap();
        let rebuilt: Structure =
            serde_json::from_value(results.extras[INPUT_STRUCTURE_KEY].clone()).unwrap();
        assert_eq!(rebuilt.natoms(), 3);
        assert_eq!(rebuilt.charge, 0);

        // A supplied request wins over stdout
        let request = ProgramInput::new(CalcType::Energy, rebuilt, Model::new("b3lyp"));
        let decoded = decode("terachem", CalcType::Energy, &input.request(&request)).unwrap();
        let results = decoded.results().unwrap().as_single_point().unwrap();
        assert!(!results.extras.contains_key(INPUT_STRUCTURE_KEY));
    }

    #[test]
    fn test_builtin_terachem_missing_xyz_fails() {
        let dir = tempfile::tempdir().unwrap();
        let stdout_path = dir.path().join("tc.out");
        let stdout = crate::parsers::terachem::tests::GRADIENT_STDOUT;
        let input = DecodeInput::new().stdout(stdout).stdout_path(&stdout_path);

        let err = decode("terachem", CalcType::Energy, &input).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Parser { parser: "input_structure", source: ParseError::Io { .. } }
        ));
    }

    #[test]
    fn test_missing_input() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let err = decoder.decode("p", CalcType::Energy, &DecodeInput::new()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingInput));
    }

    #[test]
    fn test_unknown_program() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let err = decoder
            .decode("orca", CalcType::Energy, &DecodeInput::new().stdout("x"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownProgram(ref name) if name == "orca"));
    }

    #[test]
    fn test_program_without_parsers() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let err = decoder
            .decode("empty", CalcType::Energy, &DecodeInput::new().stdout("x"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Registry(RegistryError::NoParsers(_))));
    }

    #[test]
    fn test_invalid_directory() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = decoder
            .decode("p", CalcType::Energy, &DecodeInput::new().directory(&missing))
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidDirectory(_)));
    }

    #[test]
    fn test_finalize_error_is_reported() {
        let registry = p_registry();
        let decoder = Decoder::new(&registry, &PROGRAMS);
        // The energy parser only applies to energy calcs, so nothing is collected
        let err = decoder
            .decode("p", CalcType::Optimization, &DecodeInput::new().stdout("FINAL ENERGY: 1.0"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Finalize { calc_type: CalcType::Optimization, .. }));
    }

    #[test]
    fn test_builtin_terachem_gradient() {
        let stdout = crate::parsers::terachem::tests::GRADIENT_STDOUT;
        let decoded = decode("terachem", CalcType::Gradient, &DecodeInput::new().stdout(stdout)).unwrap();
        let results = decoded.results().unwrap().as_single_point().unwrap();

        assert_eq!(results.energy, Some(-76.3861099088));
        assert_eq!(results.gradient.as_ref().map(Vec::len), Some(3));
        assert_eq!(results.calcinfo_natoms, Some(3));
        assert_eq!(results.calcinfo_nmo, Some(19));
        assert_eq!(results.extras["program_version"], "v1.9-2022.03-dev");
        assert_eq!(results.extras["method"], "B3LYP");
    }

    #[test]
    fn test_builtin_crest_energy_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("crest.engrad"),
            "# Energy ( Eh )\n#\n-5.07\n# Gradient ( Eh/a0 )\n#\n 0.1\n 0.2\n 0.3\n",
        )
        .unwrap();
        let input = DecodeInput::new()
            .stdout("   Version 3.0.2, Sat Aug 31\n")
            .directory(dir.path());

        let decoded = decode("crest", CalcType::Energy, &input).unwrap();
        let results = decoded.results().unwrap().as_single_point().unwrap();
        assert_eq!(results.energy, Some(-5.07));
        assert_eq!(results.gradient, Some(vec![vec![0.1, 0.2, 0.3]]));
        assert_eq!(results.extras["program_version"], "3.0.2");
    }

    #[test]
    fn test_builtin_crest_conformer_search() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("crest_conformers.xyz"),
            "1\n -0.50\nH 0 0 0\n1\n -0.49\nH 0 0 1\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("crest_rotamers.xyz"), "1\n -0.50 1.0\nH 0 0 0\n").unwrap();
        let structure = Structure::from_xyz("1\n\nH 0 0 0\n", 0, 2).unwrap();
        let request = ProgramInput::new(CalcType::ConformerSearch, structure, Model::new("gfn2"));
        let input = DecodeInput::new()
            .stdout("Version 3.0.2, x")
            .directory(dir.path())
            .request(&request);

        let decoded = decode("crest", CalcType::ConformerSearch, &input).unwrap();
        let results = decoded.results().unwrap().as_conformer_search().unwrap();
        assert_eq!(results.conformer_energies, vec![-0.50, -0.49]);
        assert_eq!(results.rotamer_energies, vec![-0.50]);
        assert_eq!(results.conformers[0].multiplicity, 2);
        assert_eq!(results.extras["program_version"], "3.0.2");
    }

    #[test]
    fn test_builtin_crest_conformer_search_needs_request() {
        let dir = tempfile::tempdir().unwrap();
        let input = DecodeInput::new().stdout("Version 3.0.2, x").directory(dir.path());
        let err = decode("crest", CalcType::ConformerSearch, &input).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Parser { source: ParseError::MissingContext(_), .. }
        ));
    }
}
