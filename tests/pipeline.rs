use rust_xlsxwriter::Workbook;
use zone_loss::output::{write_csv, write_json};
use zone_loss::{
    ingest, ColumnRole, LoaderConfig, RiskParameters, Upload, ZoneLossError,
};

const ZONE_FILE: &str = "\
2024 ZONE KAYIP KACAK RAPORU,,,
,,,
SIRA,KARNE NO VE ADI,VERİLEN SU MİKTARI M3,TAHAKKUK M3
1,Z1 Merkez,1000,800
2,Z2 Sahil,500,500
3,Z3 Sanayi,N/A,120
4,,300,100
,GENEL TOPLAM,1800,1420
";

fn upload(name: &str, text: &str) -> Upload {
    Upload::new(name, text.as_bytes().to_vec()).unwrap()
}

#[test]
fn finds_header_below_title_rows_and_cleans_records() {
    let dataset = ingest(&upload("zones.csv", ZONE_FILE), &LoaderConfig::default()).unwrap();

    assert_eq!(dataset.header.index, 2);
    assert!(dataset.header.matched);
    assert_eq!(dataset.roles.column(ColumnRole::ZoneName), Some(1));
    assert_eq!(dataset.roles.column(ColumnRole::SuppliedVolume), Some(2));
    assert_eq!(dataset.roles.column(ColumnRole::BilledVolume), Some(3));

    let names: Vec<&str> = dataset.records.iter().map(|r| r.zone_name.as_str()).collect();
    // Z3 has "N/A" supply, row 4 has no name, the last row is the grand total.
    assert_eq!(names, vec!["Z1 Merkez", "Z2 Sahil"]);
    assert_eq!(dataset.report.data_rows, 5);
    assert_eq!(dataset.report.aggregate_rows, 1);
    assert_eq!(dataset.report.non_numeric_volume, 1);
    assert_eq!(dataset.report.missing_zone_name, 1);
}

#[test]
fn lowest_and_highest_risk_end_to_end() {
    let dataset = ingest(&upload("zones.csv", ZONE_FILE), &LoaderConfig::default()).unwrap();

    let low = dataset.evaluate(&RiskParameters::new(1, 1, 1, 1).unwrap()).unwrap();
    assert_eq!(low.leak_fraction, 0.55);
    let rows = low.display_rows();
    assert_eq!(rows[0].total_loss_m3, "200");
    assert_eq!(rows[0].physical_loss_m3, "110");
    assert_eq!(rows[0].administrative_loss_m3, "90");
    assert_eq!(rows[1].total_loss_m3, "0");
    assert_eq!(rows[1].physical_loss_m3, "0");
    assert_eq!(rows[1].administrative_loss_m3, "0");
    assert_eq!(low.results[1].loss_ratio_pct, 0.0);

    // Same records, new parameters: only the split changes.
    let high = dataset.evaluate(&RiskParameters::new(5, 5, 5, 5).unwrap()).unwrap();
    assert_eq!(high.leak_fraction, 0.75);
    assert_eq!(high.display_rows()[0].physical_loss_m3, "150");
    assert_eq!(high.display_rows()[0].administrative_loss_m3, "50");
    assert_eq!(high.summary("zones.csv").total_loss_m3, 200);
}

/// A sheet whose table starts at B4, with three empty rows above the header
/// and an empty first column.
fn offset_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        let header = ["KARNE NO VE ADI", "VERİLEN SU MİKTARI M3", "TAHAKKUK M3"];
        for (col, label) in header.iter().enumerate() {
            sheet.write_string(3, col as u16 + 1, *label).unwrap();
        }
        sheet.write_string(4, 1, "Z1").unwrap();
        sheet.write_number(4, 2, 1000.0).unwrap();
        sheet.write_number(4, 3, 800.0).unwrap();
        sheet.write_number(5, 1, 101.0).unwrap();
        sheet.write_number(5, 2, 400.0).unwrap();
        sheet.write_number(5, 3, 350.0).unwrap();
        sheet.write_string(6, 1, "GENEL TOPLAM").unwrap();
        sheet.write_number(6, 2, 1400.0).unwrap();
        sheet.write_number(6, 3, 1150.0).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

#[test]
fn spreadsheet_header_keeps_sheet_row_index() {
    let dataset = ingest(
        &Upload::new("zones.xlsx", offset_workbook()).unwrap(),
        &LoaderConfig::default(),
    )
    .unwrap();

    assert!(dataset.header.matched);
    assert_eq!(dataset.header.index, 3);
    assert_eq!(dataset.table.labels[0], "Unnamed: 0");
    assert_eq!(dataset.table.labels[1], "KARNE NO VE ADI");
    assert_eq!(dataset.roles.column(ColumnRole::ZoneName), Some(1));
    assert_eq!(dataset.roles.column(ColumnRole::BilledVolume), Some(3));

    let records: Vec<(&str, f64, f64)> = dataset
        .records
        .iter()
        .map(|r| (r.zone_name.as_str(), r.supplied_m3, r.billed_m3))
        .collect();
    assert_eq!(records, vec![("Z1", 1000.0, 800.0), ("101", 400.0, 350.0)]);
    assert_eq!(dataset.report.data_rows, 3);
    assert_eq!(dataset.report.aggregate_rows, 1);

    let report = dataset.evaluate(&RiskParameters::default()).unwrap();
    assert_eq!(report.totals().total_loss_m3, 250.0);
}

#[test]
fn keyword_row_past_scan_window_falls_back_to_first_row() {
    let mut text = String::new();
    for _ in 0..10 {
        text.push_str(",,\n");
    }
    text.push_str("KARNE,VERİLEN,TAHAKKUK\nZ1,10,5\n");

    let narrow = LoaderConfig::default();
    match ingest(&upload("late.csv", &text), &narrow) {
        Err(ZoneLossError::ColumnRoleMissing { missing, table }) => {
            assert_eq!(missing.len(), 3);
            assert_eq!(table.header_index, 0);
            assert_eq!(table.row_count(), 11);
        }
        other => panic!("expected ColumnRoleMissing, got {:?}", other.map(|d| d.records)),
    }

    let wide = LoaderConfig {
        max_rows_to_check: 11,
        ..LoaderConfig::default()
    };
    let dataset = ingest(&upload("late.csv", &text), &wide).unwrap();
    assert_eq!(dataset.header.index, 10);
    assert_eq!(dataset.records.len(), 1);
}

#[test]
fn missing_roles_keep_the_parsed_table() {
    let text = "KARNE NO VE ADI,ACIKLAMA\nZ1,ok\n";
    let err = ingest(&upload("partial.csv", text), &LoaderConfig::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("SUPPLIED_VOLUME_M3"));
    assert!(message.contains("BILLED_VOLUME_M3"));
    let ZoneLossError::ColumnRoleMissing { table, .. } = err else {
        panic!("wrong error kind");
    };
    assert_eq!(table.labels, vec!["KARNE NO VE ADI", "ACIKLAMA"]);
}

#[test]
fn all_rows_unusable_is_reported() {
    let text = "ZONE,SUPPLIED,BILLED\nA,x,1\nB,2,-\nTOTAL,3,1\n";
    match ingest(&upload("bad.csv", text), &LoaderConfig::default()) {
        Err(ZoneLossError::NoValidRecords { data_rows }) => assert_eq!(data_rows, 3),
        other => panic!("expected NoValidRecords, got {:?}", other.map(|d| d.records)),
    }
}

#[test]
fn invalid_utf8_is_malformed() {
    let mut bytes = b"ZONE,SUPPLIED,BILLED\nZ1,".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe, 0xfd]);
    bytes.extend_from_slice(b",5\n");
    let upload = Upload::new("broken.csv", bytes).unwrap();
    assert!(matches!(
        ingest(&upload, &LoaderConfig::default()),
        Err(ZoneLossError::MalformedFile { .. })
    ));
}

#[test]
fn unknown_extension_is_rejected_at_the_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zones.txt");
    std::fs::write(&path, ZONE_FILE).unwrap();
    assert!(matches!(
        Upload::from_path(&path),
        Err(ZoneLossError::UnsupportedFormat { .. })
    ));
}

#[test]
fn upload_from_disk_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("zones.csv");
    std::fs::write(&input, ZONE_FILE).unwrap();

    let dataset = ingest(&Upload::from_path(&input).unwrap(), &LoaderConfig::default()).unwrap();
    let report = dataset.evaluate(&RiskParameters::default()).unwrap();

    let table_path = dir.path().join("zone_losses.csv");
    write_csv(&table_path, &report.display_rows()).unwrap();
    let summary_path = dir.path().join("summary.json");
    write_json(&summary_path, &report.summary(&dataset.source)).unwrap();

    let table = std::fs::read_to_string(&table_path).unwrap();
    assert_eq!(table.lines().count(), 3);
    assert!(table.contains("Z1 Merkez"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["source"], "zones.csv");
    assert_eq!(summary["total_zones"], 2);
    assert_eq!(summary["risk_score"], 19);
    assert_eq!(summary["total_loss_m3"], 200);
    let pct = summary["leak_fraction_pct"].as_f64().unwrap();
    let admin = summary["administrative_pct"].as_f64().unwrap();
    assert!((pct + admin - 100.0).abs() < 1e-9);
}
