//! CREST `input.toml` encoder.

use toml::{Table, Value};

use super::Encoder;
use crate::error::EncodeError;
use crate::models::config::EncodeConfig;
use crate::models::{CalcType, NativeInput, ProgramInput};

/// Name of the structure file referenced by the input file.
pub const STRUCTURE_FILENAME: &str = "structure.xyz";

/// Keywords that duplicate values on the structure.
const RESERVED: [&str; 2] = ["charge", "uhf"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CrestEncoder;

impl Encoder for CrestEncoder {
    fn program(&self) -> &'static str {
        "crest"
    }

    fn supported_calc_types(&self) -> &'static [CalcType] {
        &[
            CalcType::ConformerSearch,
            CalcType::Optimization,
            CalcType::Energy,
            CalcType::Gradient,
            CalcType::Hessian,
        ]
    }

    fn input_filename(&self) -> &'static str {
        "input.toml"
    }

    fn encode(&self, request: &ProgramInput, config: &EncodeConfig) -> Result<NativeInput, EncodeError> {
        validate(request)?;
        let table = to_toml(request, config)?;
        NativeInput::new(
            toml::to_string(&table)?,
            Some(request.structure.to_xyz()),
            Some(STRUCTURE_FILENAME.to_string()),
        )
    }
}

/// Runtypes CREST accepts for a calc type. The first is the default.
pub fn valid_runtypes(calc_type: CalcType) -> &'static [&'static str] {
    match calc_type {
        CalcType::ConformerSearch => &["imtd-gc", "imtd-smtd", "entropy", "nci", "nci-mtd"],
        CalcType::Optimization => &["optimize", "ancopt"],
        CalcType::Energy | CalcType::Gradient => &["singlepoint"],
        CalcType::Hessian => &["numhess"],
        CalcType::TransitionState => &[],
    }
}

fn validate(request: &ProgramInput) -> Result<(), EncodeError> {
    if let Some(keyword) = RESERVED.iter().find(|k| request.keywords.contains_key(**k)) {
        return Err(EncodeError::ReservedKeyword {
            keyword: keyword.to_string(),
            location: "the structure",
        });
    }

    if let Some(runtype) = request.keywords.get("runtype") {
        let valid = valid_runtypes(request.calctype);
        let runtype = runtype.as_str().unwrap_or_default();
        if !valid.contains(&runtype) {
            return Err(EncodeError::InvalidRuntype {
                runtype: runtype.to_string(),
                calc_type: request.calctype,
                valid: valid.join(", "),
            });
        }
    }
    Ok(())
}

/// Build the CREST TOML table: keywords, then defaults, then one
/// `[[calculation.level]]` entry per level carrying the model and spin state.
fn to_toml(request: &ProgramInput, config: &EncodeConfig) -> Result<Table, EncodeError> {
    let mut table = match Value::try_from(&request.keywords)? {
        Value::Table(table) => table,
        _ => Table::new(),
    };

    table
        .entry("threads")
        .or_insert(Value::Integer(config.resolved_threads() as i64));
    table.insert("input".to_string(), Value::String(STRUCTURE_FILENAME.to_string()));

    if !table.contains_key("runtype") {
        let runtype = valid_runtypes(request.calctype).first().ok_or(EncodeError::UnsupportedCalcType {
            program: "crest",
            calc_type: request.calctype,
        })?;
        table.insert("runtype".to_string(), Value::String(runtype.to_string()));
    }

    let mut calculation = match table.remove("calculation") {
        Some(Value::Table(calculation)) => calculation,
        _ => Table::new(),
    };
    let mut levels = match calculation.remove("level") {
        Some(Value::Array(levels)) => levels,
        _ => Vec::new(),
    };
    if levels.is_empty() {
        levels.push(Value::Table(Table::new()));
    }
    for level in &mut levels {
        if let Value::Table(level) = level {
            level.insert("method".to_string(), Value::String(request.model.method.clone()));
            level.insert("charge".to_string(), Value::Integer(i64::from(request.structure.charge)));
            level.insert(
                "uhf".to_string(),
                Value::Integer(i64::from(request.structure.multiplicity) - 1),
            );
        }
    }
    calculation.insert("level".to_string(), Value::Array(levels));
    table.insert("calculation".to_string(), Value::Table(calculation));

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::tests::water;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config() -> EncodeConfig {
        EncodeConfig { threads: Some(8) }
    }

    fn encode(request: &ProgramInput) -> Result<NativeInput, EncodeError> {
        crate::encoders::encode(request, "crest", &config())
    }

    #[test]
    fn test_to_toml_defaults() {
        let mut request = water(CalcType::ConformerSearch);
        request.model.method = "gfn2".into();
        request.structure.charge = -1;
        request.structure.multiplicity = 2;

        let table = to_toml(&request, &config()).unwrap();
        assert_eq!(table["threads"], Value::Integer(8));
        assert_eq!(table["input"], Value::String("structure.xyz".into()));
        assert_eq!(table["runtype"], Value::String("imtd-gc".into()));

        let level = &table["calculation"]["level"][0];
        assert_eq!(level["method"], Value::String("gfn2".into()));
        assert_eq!(level["charge"], Value::Integer(-1));
        assert_eq!(level["uhf"], Value::Integer(1));
    }

    #[test]
    fn test_keywords_are_kept() {
        let request = water(CalcType::Optimization)
            .with_keyword("threads", 2)
            .with_keyword("runtype", "ancopt")
            .with_keyword(
                "calculation",
                json!({"level": [{"alpb": "water"}, {"gbsa": "acetone"}], "eprint": true}),
            );

        let table = to_toml(&request, &config()).unwrap();
        assert_eq!(table["threads"], Value::Integer(2));
        assert_eq!(table["runtype"], Value::String("ancopt".into()));
        assert_eq!(table["calculation"]["eprint"], Value::Boolean(true));

        let levels = table["calculation"]["level"].as_array().unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0]["alpb"], Value::String("water".into()));
        assert!(levels.iter().all(|level| level["method"] == Value::String("b3lyp".into())));
    }

    #[test]
    fn test_encode_writes_toml_and_structure() {
        let native = encode(&water(CalcType::Energy)).unwrap();
        let parsed: Table = toml::from_str(&native.input_file).unwrap();
        assert_eq!(parsed["runtype"], Value::String("singlepoint".into()));
        assert_eq!(native.geometry_filename.as_deref(), Some(STRUCTURE_FILENAME));
        assert!(native.geometry_file.unwrap().starts_with("3\n"));
    }

    #[test]
    fn test_reserved_keywords_rejected() {
        for keyword in RESERVED {
            let err = encode(&water(CalcType::Energy).with_keyword(keyword, 0)).unwrap_err();
            assert!(matches!(err, EncodeError::ReservedKeyword { keyword: ref k, .. } if k == keyword));
        }
    }

    #[test]
    fn test_invalid_runtype() {
        let err = encode(&water(CalcType::Hessian).with_keyword("runtype", "optimize")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported runtype 'optimize' for calc type 'hessian'; valid runtypes are: numhess"
        );
    }

    #[test]
    fn test_transition_state_unsupported() {
        let err = encode(&water(CalcType::TransitionState)).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedCalcType { program: "crest", .. }));
    }
}
