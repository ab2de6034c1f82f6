use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::validate_directory;
use crate::Result;

/// Process-level configuration parameters
///
/// # Defaults
/// Field-level defaults use helper functions prefixed with `default_`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Database storage root directory
    ///
    /// Default: `default_db_dir()` (/tmp/washday/db)
    #[serde(default = "default_db_dir")]
    pub db_root_dir: PathBuf,

    /// Log files output directory
    ///
    /// Default: `default_log_dir()` (./logs)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}
impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_root_dir: default_db_dir(),
            log_dir: default_log_dir(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        validate_directory(&self.db_root_dir, "db_root_dir")?;
        validate_directory(&self.log_dir, "log_dir")?;
        Ok(())
    }
}

fn default_db_dir() -> PathBuf {
    PathBuf::from("/tmp/washday/db")
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}
