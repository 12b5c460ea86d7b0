//! Zone loss analysis.
//!
//! Reads a spreadsheet of water-distribution zone metering records, works
//! out how much water each zone loses, and splits that loss into physical
//! (pipe leakage) and administrative (meter/billing) parts using four
//! infrastructure risk indices.
//!
//! Pipeline: `loader` finds the label row and re-parses the upload,
//! `columns` maps labels to roles, `sanitize` yields clean zone records,
//! and `reports` applies the loss split.

pub mod columns;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod risk;
pub mod sanitize;
pub mod types;
pub mod util;

pub use config::LoaderConfig;
pub use error::{Result, ZoneLossError};
pub use loader::{FileKind, HeaderLocation, Upload};
pub use pipeline::{ingest, ZoneDataset};
pub use reports::{apportion, LossReport};
pub use risk::{PipeMaterial, RiskParameters};
pub use types::{CellValue, ColumnRole, ColumnRoleMap, LossResult, ParsedTable, ZoneRecord};
