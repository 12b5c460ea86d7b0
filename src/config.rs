//! Loader configuration.
//!
//! Defaults match the spreadsheets the tool was built for; a JSON file can
//! override any field.

use crate::error::{Result, ZoneLossError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_MAX_ROWS_TO_CHECK: usize = 10;

/// Cell texts that mean "no value" rather than a parse failure.
pub const DEFAULT_BLANK_TOKENS: &[&str] = &[
    "", " ", "#N/A", "N/A", "NA", "n/a", "NaN", "nan", "-nan", "NULL", "null", "<NA>",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// How many leading rows the header locator inspects.
    pub max_rows_to_check: usize,
    pub blank_tokens: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_rows_to_check: DEFAULT_MAX_ROWS_TO_CHECK,
            blank_tokens: DEFAULT_BLANK_TOKENS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LoaderConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: LoaderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("Loaded loader config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rows_to_check == 0 {
            return Err(ZoneLossError::Configuration {
                message: "max_rows_to_check must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// True when `text` (compared trimmed) is one of the blank tokens.
    pub fn is_blank(&self, text: &str) -> bool {
        let t = text.trim();
        self.blank_tokens.iter().any(|b| b.trim() == t)
    }
}
