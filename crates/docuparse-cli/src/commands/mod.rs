//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use docuparse_core::DocuparseConfig;

/// Load configuration from an explicit path, the default location, or
/// fall back to built-in defaults.
pub(crate) fn load_config(config_path: Option<&str>) -> anyhow::Result<DocuparseConfig> {
    match config_path {
        Some(path) => Ok(DocuparseConfig::from_file(std::path::Path::new(path))?),
        None => {
            let default = config::default_config_path();
            if default.exists() {
                Ok(DocuparseConfig::from_file(&default)?)
            } else {
                Ok(DocuparseConfig::default())
            }
        }
    }
}
