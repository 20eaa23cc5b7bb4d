//! Subcommands.

pub mod batch;
pub mod config;
pub mod decode;
pub mod encode;
pub mod programs;

use std::path::Path;

use qccodec_core::QcConfig;

/// Load configuration from `config_path`, else from the default location
/// when a file exists there, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<QcConfig> {
    if let Some(path) = config_path {
        return Ok(QcConfig::from_file(Path::new(path))?);
    }
    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(QcConfig::from_file(&default_path)?)
    } else {
        Ok(QcConfig::default())
    }
}
