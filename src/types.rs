use serde::Serialize;
use std::fmt;
use tabled::Tabled;

/// A single cell as it came out of the uploaded file, before any role or
/// numeric interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // f64's Display already drops a trailing ".0" (1000.0 -> "1000").
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Rows exactly as read, no header assumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A raw table re-read with one of its rows promoted to column labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    /// 0-based row of the raw table the labels came from.
    pub header_index: usize,
    pub labels: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ParsedTable {
    /// Cell at `(row, col)`; ragged rows read as empty past their end.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The three columns a zone table must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnRole {
    ZoneName,
    SuppliedVolume,
    BilledVolume,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 3] = [
        ColumnRole::ZoneName,
        ColumnRole::SuppliedVolume,
        ColumnRole::BilledVolume,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            ColumnRole::ZoneName => "ZONE_NAME",
            ColumnRole::SuppliedVolume => "SUPPLIED_VOLUME_M3",
            ColumnRole::BilledVolume => "BILLED_VOLUME_M3",
        }
    }

    /// The label the source spreadsheets normally carry for this role.
    pub fn expected_label(&self) -> &'static str {
        match self {
            ColumnRole::ZoneName => "KARNE NO VE ADI",
            ColumnRole::SuppliedVolume => "VERİLEN SU MİKTARI M3",
            ColumnRole::BilledVolume => "TAHAKKUK M3",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleBinding {
    pub role: ColumnRole,
    pub column: usize,
    pub label: String,
}

/// Which parsed column plays which role. At most one column per role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRoleMap {
    bindings: Vec<RoleBinding>,
}

impl ColumnRoleMap {
    /// Binds `role` to `column` unless the role is already taken.
    /// Returns whether the binding was accepted.
    pub fn bind(&mut self, role: ColumnRole, column: usize, label: &str) -> bool {
        if self.get(role).is_some() {
            return false;
        }
        self.bindings.push(RoleBinding {
            role,
            column,
            label: label.to_string(),
        });
        true
    }

    pub fn get(&self, role: ColumnRole) -> Option<&RoleBinding> {
        self.bindings.iter().find(|b| b.role == role)
    }

    pub fn column(&self, role: ColumnRole) -> Option<usize> {
        self.get(role).map(|b| b.column)
    }

    pub fn bindings(&self) -> &[RoleBinding] {
        &self.bindings
    }

    pub fn missing_roles(&self) -> Vec<ColumnRole> {
        ColumnRole::ALL
            .into_iter()
            .filter(|r| self.get(*r).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_roles().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneRecord {
    pub zone_name: String,
    pub supplied_m3: f64,
    pub billed_m3: f64,
}

/// A zone record with its loss split applied. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossResult {
    pub zone_name: String,
    pub supplied_m3: f64,
    pub billed_m3: f64,
    pub total_loss_m3: f64,
    pub loss_ratio_pct: f64,
    pub physical_loss_m3: f64,
    pub administrative_loss_m3: f64,
    pub physical_share_pct: f64,
    pub administrative_share_pct: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ZoneLossRow {
    #[serde(rename = "Zone")]
    #[tabled(rename = "Zone")]
    pub zone_name: String,
    #[serde(rename = "SuppliedM3")]
    #[tabled(rename = "Supplied (m³)")]
    pub supplied_m3: String,
    #[serde(rename = "TotalLossM3")]
    #[tabled(rename = "Total Loss (m³)")]
    pub total_loss_m3: String,
    #[serde(rename = "TotalLossPct")]
    #[tabled(rename = "Total Loss (%)")]
    pub loss_ratio_pct: String,
    #[serde(rename = "PhysicalLossM3")]
    #[tabled(rename = "Physical Loss (m³)")]
    pub physical_loss_m3: String,
    #[serde(rename = "AdministrativeLossM3")]
    #[tabled(rename = "Administrative Loss (m³)")]
    pub administrative_loss_m3: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LossTotals {
    pub supplied_m3: f64,
    pub total_loss_m3: f64,
    pub physical_loss_m3: f64,
    pub administrative_loss_m3: f64,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub source: String,
    pub total_zones: usize,
    pub risk_score: u8,
    pub leak_fraction_pct: f64,
    pub administrative_pct: f64,
    pub total_supplied_m3: i64,
    pub total_loss_m3: i64,
    pub physical_loss_m3: i64,
    pub administrative_loss_m3: i64,
}
