//! Native program input files.

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// Native input file text for a program. Writing these files to disk should
/// produce a runnable calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeInput {
    /// Main input file.
    pub input_file: String,

    /// Geometry file referenced by the input file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_file: Option<String>,

    /// Name of the geometry file as referenced in the input file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_filename: Option<String>,
}

impl NativeInput {
    /// Create a native input. A geometry body requires a geometry filename.
    pub fn new(
        input_file: impl Into<String>,
        geometry_file: Option<String>,
        geometry_filename: Option<String>,
    ) -> Result<Self, EncodeError> {
        if geometry_file.is_some() && geometry_filename.is_none() {
            return Err(EncodeError::MissingGeometryFilename);
        }
        Ok(Self {
            input_file: input_file.into(),
            geometry_file,
            geometry_filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_requires_filename() {
        let err = NativeInput::new("run energy\n", Some("1\n\nH 0 0 0\n".into()), None).unwrap_err();
        assert!(matches!(err, EncodeError::MissingGeometryFilename));
    }

    #[test]
    fn test_geometry_with_filename() {
        let native = NativeInput::new(
            "run energy\n",
            Some("1\n\nH 0 0 0\n".into()),
            Some("geometry.xyz".into()),
        )
        .unwrap();
        assert_eq!(native.geometry_filename.as_deref(), Some("geometry.xyz"));
    }

    #[test]
    fn test_filename_without_geometry_is_allowed() {
        assert!(NativeInput::new("x", None, Some("geometry.xyz".into())).is_ok());
    }
}
