//! TeraChem `tc.in` encoder.

use serde_json::Value;

use super::Encoder;
use crate::error::EncodeError;
use crate::models::config::EncodeConfig;
use crate::models::{CalcType, NativeInput, ProgramInput};

/// Name of the geometry file referenced by `tc.in`.
pub const XYZ_FILENAME: &str = "geometry.xyz";

const PADDING: usize = 20;

/// Keywords carried elsewhere on the request, and where.
const RESERVED: [(&str, &str); 5] = [
    ("charge", ".structure.charge"),
    ("spinmult", ".structure.multiplicity"),
    ("run", ".calctype"),
    ("basis", ".model.basis"),
    ("method", ".model.method"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TeraChemEncoder;

impl Encoder for TeraChemEncoder {
    fn program(&self) -> &'static str {
        "terachem"
    }

    fn supported_calc_types(&self) -> &'static [CalcType] {
        &[
            CalcType::Energy,
            CalcType::Gradient,
            CalcType::Hessian,
            CalcType::Optimization,
            CalcType::TransitionState,
        ]
    }

    fn input_filename(&self) -> &'static str {
        "tc.in"
    }

    fn encode(&self, request: &ProgramInput, _config: &EncodeConfig) -> Result<NativeInput, EncodeError> {
        let run = match request.calctype {
            CalcType::Hessian => "frequencies",
            CalcType::Optimization => "minimize",
            CalcType::TransitionState => "ts",
            other => other.as_str(),
        };
        let basis = request
            .model
            .basis
            .as_deref()
            .ok_or(EncodeError::MissingField("model.basis"))?;

        let mut lines = vec![
            line("run", run),
            line("coordinates", XYZ_FILENAME),
            line("charge", request.structure.charge),
            line("spinmult", request.structure.multiplicity),
            line("method", &request.model.method),
            line("basis", basis),
        ];

        for (key, value) in &request.keywords {
            if let Some((keyword, location)) = RESERVED.iter().find(|(k, _)| k == key) {
                return Err(EncodeError::ReservedKeyword {
                    keyword: keyword.to_string(),
                    location: *location,
                });
            }
            lines.push(line(key, keyword_value(value)));
        }

        let mut input_file = lines.join("\n");
        input_file.push('\n');
        NativeInput::new(
            input_file,
            Some(request.structure.to_xyz()),
            Some(XYZ_FILENAME.to_string()),
        )
    }
}

fn line(key: &str, value: impl std::fmt::Display) -> String {
    format!("{:<width$} {}", key, value, width = PADDING)
}

/// Keyword values are written lower-case, so booleans read `true`/`false`.
fn keyword_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::tests::water;
    use pretty_assertions::assert_eq;

    fn encode(request: &ProgramInput) -> Result<NativeInput, EncodeError> {
        crate::encoders::encode(request, "terachem", &EncodeConfig::default())
    }

    #[test]
    fn test_encode_energy() {
        let request = water(CalcType::Energy)
            .with_keyword("purify", "no")
            .with_keyword("precision", "Mixed")
            .with_keyword("sphericalbasis", false);
        let native = encode(&request).unwrap();

        let expected = "\
run                  energy
coordinates          geometry.xyz
charge               0
spinmult             1
method               b3lyp
basis                6-31g
purify               no
precision            mixed
sphericalbasis       false
";
        assert_eq!(native.input_file, expected);
        assert_eq!(native.geometry_filename.as_deref(), Some(XYZ_FILENAME));
        assert!(native.geometry_file.unwrap().starts_with("3\n"));
    }

    #[test]
    fn test_run_mapping() {
        for (calc_type, run) in [
            (CalcType::Gradient, "gradient"),
            (CalcType::Hessian, "frequencies"),
            (CalcType::Optimization, "minimize"),
            (CalcType::TransitionState, "ts"),
        ] {
            let native = encode(&water(calc_type)).unwrap();
            assert_eq!(native.input_file.lines().next().unwrap(), line("run", run));
        }
    }

    #[test]
    fn test_reserved_keywords_rejected() {
        for (keyword, location) in RESERVED {
            let request = water(CalcType::Energy).with_keyword(keyword, 1);
            let err = encode(&request).unwrap_err();
            assert!(matches!(
                err,
                EncodeError::ReservedKeyword { keyword: ref k, location: l } if k == keyword && l == location
            ));
        }
    }

    #[test]
    fn test_missing_basis() {
        let mut request = water(CalcType::Energy);
        request.model.basis = None;
        assert!(matches!(encode(&request).unwrap_err(), EncodeError::MissingField("model.basis")));
    }
}
