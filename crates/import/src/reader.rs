//! Reads ledger exports (spreadsheets and CSV) into a [`RawTable`].

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use monnaie_core::table::header_label;
use monnaie_core::{CellValue, RawTable};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Workbook has no worksheet")]
    NoWorksheet,
    #[error("Missing header row")]
    MissingHeader,
    #[error("Unsupported file extension: '{0}'")]
    UnsupportedExtension(String),
}

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
const CSV_DELIMITERS: &[u8] = b",;\t";

/// Reads the first worksheet of a workbook, or a CSV file, by extension.
pub fn read_table(path: &Path) -> Result<RawTable, ReadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        read_workbook(path)
    } else if ext == "csv" {
        let data = std::fs::read(path)?;
        read_csv(data.as_slice(), sniff_delimiter(&data))
    } else {
        Err(ReadError::UnsupportedExtension(ext))
    }
}

pub fn read_workbook(path: &Path) -> Result<RawTable, ReadError> {
    let mut workbook = open_workbook_auto(path)?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ReadError::NoWorksheet)?;
    let range = workbook.worksheet_range(&first_sheet)?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or(ReadError::MissingHeader)?
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_label(idx, &cell_from_data(cell)))
        .collect();

    let data = rows
        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>())
        .filter(|row| !is_empty_row(row))
        .collect();

    Ok(RawTable::new(header, data))
}

pub fn read_csv<R: Read>(data: R, delimiter: u8) -> Result<RawTable, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?
            .iter()
            .enumerate()
            .map(|(idx, field)| header_label(idx, &CellValue::text(field)))
            .collect(),
        None => return Err(ReadError::MissingHeader),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result?;
        let row: Vec<CellValue> = record.iter().map(CellValue::infer).collect();
        if !is_empty_row(&row) {
            rows.push(row);
        }
    }

    Ok(RawTable::new(header, rows))
}

/// Picks the delimiter that occurs most often in the first line; comma on a tie.
pub fn sniff_delimiter(data: &[u8]) -> u8 {
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or_default();
    CSV_DELIMITERS
        .iter()
        .copied()
        .max_by_key(|d| {
            let count = first_line.iter().filter(|b| *b == d).count();
            // Earlier delimiters win ties.
            (count, std::cmp::Reverse(CSV_DELIMITERS.iter().position(|x| x == d)))
        })
        .unwrap_or(b',')
}

pub fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::number(*n),
        Data::Int(n) => CellValue::Int(*n),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(_) => CellValue::Missing,
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::DateTime),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn is_empty_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_missing)
}
