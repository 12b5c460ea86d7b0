//! One upload, one pass: header location, re-parse, column resolution and
//! sanitizing. The resulting dataset is then evaluated against any number
//! of risk parameter sets without re-reading the file.

use crate::columns::resolve_columns;
use crate::config::LoaderConfig;
use crate::error::{Result, ZoneLossError};
use crate::loader::{locate_header, parse_with_header, read_raw_table, HeaderLocation, Upload};
use crate::reports::{apportion, LossReport};
use crate::risk::RiskParameters;
use crate::sanitize::{sanitize_records, SanitizeReport};
use crate::types::{ColumnRoleMap, ParsedTable, ZoneRecord};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ZoneDataset {
    pub source: String,
    pub header: HeaderLocation,
    pub table: ParsedTable,
    pub roles: ColumnRoleMap,
    pub records: Vec<ZoneRecord>,
    pub report: SanitizeReport,
}

impl ZoneDataset {
    pub fn evaluate(&self, params: &RiskParameters) -> Result<LossReport> {
        apportion(&self.records, params).map_err(|e| match e {
            ZoneLossError::NoValidRecords { .. } => ZoneLossError::NoValidRecords {
                data_rows: self.report.data_rows,
            },
            other => other,
        })
    }
}

pub fn ingest(upload: &Upload, config: &LoaderConfig) -> Result<ZoneDataset> {
    let header = locate_header(upload, config);
    if header.matched {
        info!("Detected header row: row {}", header.index + 1);
    } else {
        info!("No header keywords in the first {} rows, using row 1", config.max_rows_to_check);
    }

    let raw = read_raw_table(upload, None, config)?;
    let table = parse_with_header(&raw, header.index);
    debug!("Available columns: {:?}", table.labels);

    let roles = resolve_columns(&table);
    let (records, report) = sanitize_records(&table, &roles, config)?;
    if records.is_empty() {
        return Err(ZoneLossError::NoValidRecords {
            data_rows: report.data_rows,
        });
    }
    info!("Loaded {} zone records from {}", records.len(), upload.name());

    Ok(ZoneDataset {
        source: upload.name().to_string(),
        header,
        table,
        roles,
        records,
        report,
    })
}
