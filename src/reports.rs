use crate::error::{Result, ZoneLossError};
use crate::risk::RiskParameters;
use crate::types::{LossResult, LossTotals, SummaryStats, ZoneLossRow, ZoneRecord};
use crate::util::{format_number, format_volume, round_to};
use tracing::info;

impl LossResult {
    /// Split one zone's loss with the run-wide `leak_fraction`.
    pub fn from_record(record: &ZoneRecord, leak_fraction: f64) -> Self {
        let total_loss_m3 = (record.supplied_m3 - record.billed_m3).max(0.0);
        let loss_ratio_pct = if record.supplied_m3 <= 0.0 {
            0.0
        } else {
            total_loss_m3 / record.supplied_m3 * 100.0
        };
        LossResult {
            zone_name: record.zone_name.clone(),
            supplied_m3: record.supplied_m3,
            billed_m3: record.billed_m3,
            total_loss_m3,
            loss_ratio_pct,
            physical_loss_m3: total_loss_m3 * leak_fraction,
            administrative_loss_m3: total_loss_m3 * (1.0 - leak_fraction),
            physical_share_pct: leak_fraction * 100.0,
            administrative_share_pct: (1.0 - leak_fraction) * 100.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LossReport {
    pub params: RiskParameters,
    pub leak_fraction: f64,
    pub results: Vec<LossResult>,
}

/// Apply the loss split to every record. An empty record set is refused
/// rather than producing zero-sized aggregates.
///
/// Records carry no trace of the rows they were sanitized from, so the
/// refusal reports `data_rows: 0`; `ZoneDataset::evaluate` fills in the
/// count it read.
pub fn apportion(records: &[ZoneRecord], params: &RiskParameters) -> Result<LossReport> {
    if records.is_empty() {
        return Err(ZoneLossError::NoValidRecords { data_rows: 0 });
    }
    let leak_fraction = params.leak_fraction();
    info!(
        "Apportioning {} zones: risk score {}, leak fraction {:.4}",
        records.len(),
        params.risk_score(),
        leak_fraction
    );
    let results = records
        .iter()
        .map(|r| LossResult::from_record(r, leak_fraction))
        .collect();
    Ok(LossReport {
        params: *params,
        leak_fraction,
        results,
    })
}

impl LossReport {
    pub fn risk_score(&self) -> u8 {
        self.params.risk_score()
    }

    /// Physical share as shown to the user, one decimal.
    pub fn leak_percent_display(&self) -> f64 {
        round_to(self.leak_fraction * 100.0, 1)
    }

    pub fn administrative_percent_display(&self) -> f64 {
        round_to(100.0 - self.leak_percent_display(), 1)
    }

    /// Column sums over the unrounded per-zone values.
    pub fn totals(&self) -> LossTotals {
        self.results.iter().fold(LossTotals::default(), |acc, r| LossTotals {
            supplied_m3: acc.supplied_m3 + r.supplied_m3,
            total_loss_m3: acc.total_loss_m3 + r.total_loss_m3,
            physical_loss_m3: acc.physical_loss_m3 + r.physical_loss_m3,
            administrative_loss_m3: acc.administrative_loss_m3 + r.administrative_loss_m3,
        })
    }

    pub fn display_rows(&self) -> Vec<ZoneLossRow> {
        self.results
            .iter()
            .map(|r| ZoneLossRow {
                zone_name: r.zone_name.clone(),
                supplied_m3: format_volume(r.supplied_m3),
                total_loss_m3: format_volume(r.total_loss_m3),
                loss_ratio_pct: format!("{}%", format_number(r.loss_ratio_pct, 2)),
                physical_loss_m3: format_volume(r.physical_loss_m3),
                administrative_loss_m3: format_volume(r.administrative_loss_m3),
            })
            .collect()
    }

    pub fn summary(&self, source: &str) -> SummaryStats {
        let totals = self.totals();
        SummaryStats {
            source: source.to_string(),
            total_zones: self.results.len(),
            risk_score: self.risk_score(),
            leak_fraction_pct: self.leak_percent_display(),
            administrative_pct: self.administrative_percent_display(),
            total_supplied_m3: totals.supplied_m3.round() as i64,
            total_loss_m3: totals.total_loss_m3.round() as i64,
            physical_loss_m3: totals.physical_loss_m3.round() as i64,
            administrative_loss_m3: totals.administrative_loss_m3.round() as i64,
        }
    }

    /// The two-line action plan: infrastructure share, then administrative share.
    pub fn action_plan(&self) -> Vec<String> {
        let totals = self.totals();
        vec![
            format!(
                "1. Infrastructure: {:.1}% of the {} m³ total loss, i.e. {} m³, is estimated to be pipe leakage.",
                self.leak_percent_display(),
                format_volume(totals.total_loss_m3),
                format_volume(totals.physical_loss_m3)
            ),
            format!(
                "2. Administration: the remaining {:.1}%, i.e. {} m³, comes from meter error and billing gaps.",
                self.administrative_percent_display(),
                format_volume(totals.administrative_loss_m3)
            ),
        ]
    }
}
