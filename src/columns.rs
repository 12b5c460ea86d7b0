//! Column role resolution.
//!
//! Source spreadsheets name the same columns many ways ("KARNE NO VE ADI",
//! "Bölge Adı", "Zone"), so roles are assigned by keyword rather than by
//! exact label.

use crate::types::{ColumnRole, ColumnRoleMap, ParsedTable};
use crate::util::{contains_any, fold_label};
use tracing::{debug, info};

// Keywords are stored folded (see `fold_label`).
const ZONE_NAME_KEYWORDS: &[&str] = &["KARNE NO VE ADI", "KARNE", "ZONE", "BOLGE", "ADI"];
const SUPPLIED_KEYWORDS: &[&str] = &["VERILEN SU MIKTARI M3", "VERILEN", "GIREN", "GIRN", "SUPPLIED"];
const BILLED_KEYWORDS: &[&str] = &["TAHAKKUK M3", "TAHAKKUK", "OLCULEN", "BILLED"];

/// The role a label claims, testing groups in priority order: zone name,
/// then supplied volume, then billed volume. A label that mentions a billed
/// keyword is never a supplied-volume column.
pub fn classify_label(label: &str) -> Option<ColumnRole> {
    let folded = fold_label(label.trim());
    if contains_any(&folded, ZONE_NAME_KEYWORDS) {
        Some(ColumnRole::ZoneName)
    } else if contains_any(&folded, SUPPLIED_KEYWORDS) && !contains_any(&folded, BILLED_KEYWORDS) {
        Some(ColumnRole::SuppliedVolume)
    } else if contains_any(&folded, BILLED_KEYWORDS) {
        Some(ColumnRole::BilledVolume)
    } else {
        None
    }
}

/// Map columns to roles in label order. The first column claiming a role
/// keeps it; later claimants stay unmapped. The result may be partial.
pub fn resolve_columns(table: &ParsedTable) -> ColumnRoleMap {
    let mut map = ColumnRoleMap::default();
    for (col, label) in table.labels.iter().enumerate() {
        let Some(role) = classify_label(label) else {
            continue;
        };
        if !map.bind(role, col, label) {
            debug!("Column '{}' also matches {} which is already bound", label, role);
        }
    }
    info!(
        "Resolved columns: {}",
        map.bindings()
            .iter()
            .map(|b| format!("{} <- '{}'", b.role, b.label))
            .collect::<Vec<_>>()
            .join(", ")
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(labels: &[&str]) -> ParsedTable {
        ParsedTable {
            header_index: 0,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    #[test]
    fn resolves_canonical_labels() {
        let map = resolve_columns(&table(&[
            "SIRA",
            "KARNE NO VE ADI",
            "VERİLEN SU MİKTARI M3",
            "TAHAKKUK M3",
        ]));
        assert!(map.is_complete());
        assert_eq!(map.column(ColumnRole::ZoneName), Some(1));
        assert_eq!(map.column(ColumnRole::SuppliedVolume), Some(2));
        assert_eq!(map.column(ColumnRole::BilledVolume), Some(3));
    }

    #[test]
    fn resolves_alternative_spellings() {
        let map = resolve_columns(&table(&["Bölge", "Giren Su", "Ölçülen m3"]));
        assert!(map.is_complete());
        let map = resolve_columns(&table(&["Zone", "Supplied volume", "Billed volume"]));
        assert!(map.is_complete());
    }

    #[test]
    fn compound_billed_label_is_not_supplied() {
        assert_eq!(
            classify_label("VERİLEN TAHAKKUK M3"),
            Some(ColumnRole::BilledVolume)
        );
        assert_eq!(classify_label("VERİLEN SU"), Some(ColumnRole::SuppliedVolume));
    }

    #[test]
    fn zone_group_takes_priority() {
        // Mentions both the zone roster and a billed keyword.
        assert_eq!(classify_label("KARNE TAHAKKUK"), Some(ColumnRole::ZoneName));
        assert_eq!(classify_label("ACIKLAMA"), None);
    }

    #[test]
    fn first_claimant_keeps_the_role() {
        let map = resolve_columns(&table(&["ZONE", "BÖLGE ADI", "VERİLEN", "TAHAKKUK"]));
        assert_eq!(map.column(ColumnRole::ZoneName), Some(0));
        assert_eq!(map.bindings().len(), 3);
    }

    #[test]
    fn partial_map_lists_missing_roles() {
        let map = resolve_columns(&table(&["KARNE", "NOT"]));
        assert!(!map.is_complete());
        assert_eq!(
            map.missing_roles(),
            vec![ColumnRole::SuppliedVolume, ColumnRole::BilledVolume]
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let t = table(&["KARNE NO VE ADI", "VERİLEN SU MİKTARI M3", "TAHAKKUK M3", "ZONE"]);
        assert_eq!(resolve_columns(&t), resolve_columns(&t));
    }
}
