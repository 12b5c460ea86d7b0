use crate::config::LoaderConfig;
use crate::error::{Result, ZoneLossError};
use crate::types::{ColumnRole, ColumnRoleMap, ParsedTable, ZoneRecord};
use crate::util::{coerce_numeric, contains_any, fold_label, is_missing};
use serde::Serialize;
use tracing::{debug, info};

/// Zone names containing any of these are subtotal/total rows.
pub const AGGREGATE_MARKERS: &[&str] = &["TOPLAM", "TOTAL", "GENEL"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SanitizeReport {
    pub data_rows: usize,
    pub missing_zone_name: usize,
    pub aggregate_rows: usize,
    pub non_numeric_volume: usize,
    pub kept: usize,
}

pub fn is_aggregate_name(name: &str) -> bool {
    contains_any(&fold_label(name), AGGREGATE_MARKERS)
}

/// Turn parsed rows into zone records.
///
/// Requires all three roles; an incomplete map is refused with
/// `ColumnRoleMissing` and the table is handed back inside the error.
/// Rows without a zone name, aggregate rows, and rows whose supplied or
/// billed value does not coerce are dropped. Source order is kept.
pub fn sanitize_records(
    table: &ParsedTable,
    roles: &ColumnRoleMap,
    config: &LoaderConfig,
) -> Result<(Vec<ZoneRecord>, SanitizeReport)> {
    let (Some(zone_col), Some(supplied_col), Some(billed_col)) = (
        roles.column(ColumnRole::ZoneName),
        roles.column(ColumnRole::SuppliedVolume),
        roles.column(ColumnRole::BilledVolume),
    ) else {
        return Err(ZoneLossError::ColumnRoleMissing {
            missing: roles.missing_roles(),
            table: Box::new(table.clone()),
        });
    };

    let mut report = SanitizeReport {
        data_rows: table.row_count(),
        ..SanitizeReport::default()
    };
    let mut records = Vec::new();

    for row in 0..table.row_count() {
        let zone_cell = table.cell(row, zone_col);
        if is_missing(zone_cell, config) {
            report.missing_zone_name += 1;
            continue;
        }
        let zone_name = zone_cell.to_string().trim().to_string();
        if is_aggregate_name(&zone_name) {
            debug!("Dropping aggregate row '{}'", zone_name);
            report.aggregate_rows += 1;
            continue;
        }
        let supplied = coerce_numeric(table.cell(row, supplied_col), config);
        let billed = coerce_numeric(table.cell(row, billed_col), config);
        let (Some(supplied_m3), Some(billed_m3)) = (supplied, billed) else {
            debug!("Dropping '{}': supplied/billed value is not numeric", zone_name);
            report.non_numeric_volume += 1;
            continue;
        };
        records.push(ZoneRecord {
            zone_name,
            supplied_m3,
            billed_m3,
        });
    }

    report.kept = records.len();
    info!(
        "Sanitized {} rows: kept {}, no name {}, aggregate {}, non-numeric {}",
        report.data_rows,
        report.kept,
        report.missing_zone_name,
        report.aggregate_rows,
        report.non_numeric_volume
    );
    Ok((records, report))
}
