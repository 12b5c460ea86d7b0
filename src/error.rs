//! Error types for zone loss analysis.
//!
//! Every failure an upload can hit is an explicit variant here so the
//! caller can turn it into a message instead of aborting.

use crate::types::{ColumnRole, ParsedTable};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZoneLossError {
    #[error("Unsupported file type: {name} (expected .csv, .xlsx, .xlsm or .xls)")]
    UnsupportedFormat { name: String },

    #[error("File could not be read: {reason}")]
    MalformedFile { reason: String },

    #[error("Missing columns: {}", describe_roles(.missing))]
    ColumnRoleMissing {
        missing: Vec<ColumnRole>,
        /// The table as parsed, kept so the labels can still be inspected.
        table: Box<ParsedTable>,
    },

    #[error("No processable records ({data_rows} data rows read, none usable)")]
    NoValidRecords { data_rows: usize },

    #[error("Risk parameter '{name}' must be between 1 and 5, got {value}")]
    InvalidRiskIndex { name: &'static str, value: u8 },

    #[error("Unknown pipe material: {0}")]
    UnknownMaterial(String),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ZoneLossError {
    pub fn malformed(reason: impl ToString) -> Self {
        ZoneLossError::MalformedFile {
            reason: reason.to_string(),
        }
    }
}

fn describe_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(|r| format!("{} (e.g. \"{}\")", r.canonical_name(), r.expected_label()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ZoneLossError>;
