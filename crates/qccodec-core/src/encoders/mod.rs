//! Encoding of calculation requests into native program input files.

pub mod crest;
pub mod terachem;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::EncodeError;
use crate::models::config::EncodeConfig;
use crate::models::{CalcType, NativeInput, ProgramInput};

/// Writes native input files for one program.
pub trait Encoder: Send + Sync {
    /// Program name.
    fn program(&self) -> &'static str;

    /// Calc types this encoder can express.
    fn supported_calc_types(&self) -> &'static [CalcType];

    /// File name the main input file is written under.
    fn input_filename(&self) -> &'static str;

    /// Encode a request. Callers go through [`encode`], which checks the calc type first.
    fn encode(&self, request: &ProgramInput, config: &EncodeConfig) -> Result<NativeInput, EncodeError>;
}

static ENCODERS: [&dyn Encoder; 2] = [&crest::CrestEncoder, &terachem::TeraChemEncoder];

/// Encoder for `program` (case-insensitive).
pub fn encoder(program: &str) -> Option<&'static dyn Encoder> {
    ENCODERS
        .iter()
        .copied()
        .find(|encoder| encoder.program().eq_ignore_ascii_case(program))
}

/// Encode `request` into `program`'s native input files.
pub fn encode(
    request: &ProgramInput,
    program: &str,
    config: &EncodeConfig,
) -> Result<NativeInput, EncodeError> {
    let encoder = encoder(program).ok_or_else(|| EncodeError::UnsupportedProgram(program.to_string()))?;
    if !encoder.supported_calc_types().contains(&request.calctype) {
        return Err(EncodeError::UnsupportedCalcType {
            program: encoder.program(),
            calc_type: request.calctype,
        });
    }
    info!("Encoding {} input for program '{}'", request.calctype, encoder.program());
    encoder.encode(request, config)
}

/// Write native input files into `directory`. Returns the written paths.
pub fn write_native(
    native: &NativeInput,
    input_filename: &str,
    directory: &Path,
) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(directory)?;
    let mut written = Vec::new();

    let input_path = directory.join(input_filename);
    std::fs::write(&input_path, &native.input_file)?;
    written.push(input_path);

    if let (Some(geometry), Some(name)) = (&native.geometry_file, &native.geometry_filename) {
        let geometry_path = directory.join(name);
        std::fs::write(&geometry_path, geometry)?;
        written.push(geometry_path);
    }
    Ok(written)
}
