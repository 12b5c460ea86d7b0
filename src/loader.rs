use crate::config::LoaderConfig;
use crate::error::{Result, ZoneLossError};
use crate::types::{CellValue, ParsedTable, RawTable};
use crate::util::{contains_any, fold_label, is_missing};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Tokens whose presence marks a row as the label row: zone roster/name,
/// supplied, billed/accrued, water quantity and the volume unit.
const HEADER_KEYWORDS: &[&str] = &[
    "KARNE",
    "VERILEN",
    "TAHAKKUK",
    "SU MIKTARI",
    "M3",
    "ZONE",
    "SUPPLIED",
    "BILLED",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    /// Branches on the file extension only; anything unknown is rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Some(FileKind::Csv)
        } else if [".xlsx", ".xlsm", ".xls"].iter().any(|ext| lower.ends_with(ext)) {
            Some(FileKind::Spreadsheet)
        } else {
            None
        }
    }
}

/// An uploaded file held in memory. Every read pass starts from a fresh
/// cursor at offset 0, so the header scan and the full parse never see
/// each other's position.
#[derive(Debug, Clone)]
pub struct Upload {
    name: String,
    kind: FileKind,
    bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let kind = FileKind::from_name(&name)
            .ok_or_else(|| ZoneLossError::UnsupportedFormat { name: name.clone() })?;
        Ok(Self { name, kind, bytes })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        // Reject by extension before touching the disk.
        FileKind::from_name(&name)
            .ok_or_else(|| ZoneLossError::UnsupportedFormat { name: name.clone() })?;
        let bytes = std::fs::read(path)?;
        Self::new(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn rewind(&self) -> Cursor<&[u8]> {
        Cursor::new(self.bytes.as_slice())
    }
}

/// Where the label row was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    pub index: usize,
    /// False when no keyword row was seen and row 0 is a fallback.
    pub matched: bool,
}

impl HeaderLocation {
    pub fn fallback() -> Self {
        Self {
            index: 0,
            matched: false,
        }
    }
}

/// Scan the first `max_rows_to_check` rows for a label row.
///
/// Rows with fewer than two non-missing cells are decorative and skipped.
/// The first remaining row whose text contains any header keyword wins;
/// if none does, row 0 is used.
pub fn find_header_row(rows: &[Vec<CellValue>], config: &LoaderConfig) -> HeaderLocation {
    for (i, row) in rows.iter().take(config.max_rows_to_check).enumerate() {
        let present: Vec<&CellValue> = row.iter().filter(|c| !is_missing(c, config)).collect();
        if present.len() < 2 {
            continue;
        }
        let joined = present
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        if contains_any(&fold_label(&joined), HEADER_KEYWORDS) {
            return HeaderLocation {
                index: i,
                matched: true,
            };
        }
    }
    HeaderLocation::fallback()
}

/// Header detection over an upload. Never fails: unreadable input falls
/// back to row 0 and the full parse reports the problem.
pub fn locate_header(upload: &Upload, config: &LoaderConfig) -> HeaderLocation {
    match read_raw_table(upload, Some(config.max_rows_to_check), config) {
        Ok(table) => find_header_row(&table.rows, config),
        Err(e) => {
            warn!("Header scan of {} failed, using row 1: {}", upload.name(), e);
            HeaderLocation::fallback()
        }
    }
}

/// Read the upload with no header assumed, optionally stopping after
/// `limit` rows. Cells matching a blank token come back as `Empty`.
pub fn read_raw_table(
    upload: &Upload,
    limit: Option<usize>,
    config: &LoaderConfig,
) -> Result<RawTable> {
    let limit = limit.unwrap_or(usize::MAX);
    let rows = match upload.kind() {
        FileKind::Csv => read_csv_rows(upload, limit, config)?,
        FileKind::Spreadsheet => read_spreadsheet_rows(upload, limit, config)?,
    };
    debug!("Read {} raw rows from {}", rows.len(), upload.name());
    Ok(RawTable { rows })
}

fn text_cell(raw: &str, config: &LoaderConfig) -> CellValue {
    if config.is_blank(raw) {
        CellValue::Empty
    } else {
        CellValue::Text(raw.to_string())
    }
}

fn read_csv_rows(upload: &Upload, limit: usize, config: &LoaderConfig) -> Result<Vec<Vec<CellValue>>> {
    let mut cursor = upload.rewind();
    if upload.bytes().starts_with(UTF8_BOM) {
        cursor.set_position(UTF8_BOM.len() as u64);
    }
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(cursor);

    let mut rows = Vec::new();
    for result in rdr.records() {
        if rows.len() >= limit {
            break;
        }
        let record = result.map_err(ZoneLossError::malformed)?;
        rows.push(record.iter().map(|f| text_cell(f, config)).collect());
    }
    Ok(rows)
}

fn spreadsheet_cell(data: &Data, config: &LoaderConfig) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => text_cell(s, config),
        other => CellValue::Text(other.to_string()),
    }
}

fn read_spreadsheet_rows(
    upload: &Upload,
    limit: usize,
    config: &LoaderConfig,
) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook =
        open_workbook_auto_from_rs(upload.rewind()).map_err(ZoneLossError::malformed)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ZoneLossError::malformed("workbook has no worksheets"))?
        .map_err(ZoneLossError::malformed)?;

    // calamine trims leading empty rows/columns; put them back so row
    // indices match what the user sees in the sheet.
    let Some((first_row, first_col)) = range.start() else {
        return Ok(Vec::new());
    };
    let mut rows: Vec<Vec<CellValue>> = (0..first_row as usize)
        .take(limit)
        .map(|_| Vec::new())
        .collect();
    for sheet_row in range.rows() {
        if rows.len() >= limit {
            break;
        }
        let mut row = vec![CellValue::Empty; first_col as usize];
        row.extend(sheet_row.iter().map(|d| spreadsheet_cell(d, config)));
        rows.push(row);
    }
    Ok(rows)
}

/// Promote row `header_index` of the raw table to column labels and keep
/// the rows below it as data. Labels are trimmed and embedded newlines
/// become spaces; empty labels are named `Unnamed: <col>`.
pub fn parse_with_header(raw: &RawTable, header_index: usize) -> ParsedTable {
    let Some(header_row) = raw.rows.get(header_index) else {
        return ParsedTable {
            header_index,
            ..ParsedTable::default()
        };
    };
    let rows: Vec<Vec<CellValue>> = raw.rows[header_index + 1..].to_vec();
    let width = rows
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(header_row.len()))
        .max()
        .unwrap_or(0);

    let labels = (0..width)
        .map(|col| {
            let label = header_row
                .get(col)
                .map(|c| c.to_string().trim().replace('\n', " "))
                .unwrap_or_default();
            if label.is_empty() {
                format!("Unnamed: {}", col)
            } else {
                label
            }
        })
        .collect();

    ParsedTable {
        header_index,
        labels,
        rows,
    }
}
