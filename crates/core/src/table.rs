//! Tabular shapes that flow through the pipeline, and their JSON grid form.
//!
//! A grid is a JSON array whose first element is the header (array of column
//! names) and whose remaining elements are rows of cells in header order.

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::account::AccountKind;
use crate::cell::CellValue;

/// Canonical column names shared by every platform format.
pub mod columns {
    pub const DATE: &str = "Date";
    pub const AMOUNT: &str = "Montant";
    pub const SENDER: &str = "Expéditeur";
    pub const RECIPIENT: &str = "Destinataire";
    pub const SENDER_GROUP: &str = "Groupe Expéditeur";
    pub const RECIPIENT_GROUP: &str = "Groupe Destinataire";
    pub const SENDER_KIND: &str = "Type_Expéditeur";
    pub const RECIPIENT_KIND: &str = "Type_Destinataire";

    /// Fields every format must map.
    pub const REQUIRED: &[&str] = &[SENDER, RECIPIENT, AMOUNT];
}

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("Grid has no header row")]
    MissingHeader,
    #[error("Header cell {0} is not text")]
    NonTextHeader(usize),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Row {row}: invalid account kind '{value}'")]
    InvalidKind { row: usize, value: String },
}

/// A freshly read export: header row plus data rows, as the reader produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { header, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column name for a header cell; blank headers get a positional placeholder.
pub fn header_label(idx: usize, cell: &CellValue) -> String {
    if cell.is_blank() {
        format!("Unnamed: {idx}")
    } else {
        cell.to_string()
    }
}

/// Rows projected onto a format's canonical columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl NormalizedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Serialize for NormalizedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len() + 1))?;
        seq.serialize_element(&self.header)?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

/// A normalized row with both sides classified.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub cells: Vec<CellValue>,
    pub sender_kind: AccountKind,
    pub recipient_kind: AccountKind,
}

/// Standardized dataset: canonical columns plus the two account-type columns.
///
/// `header` holds only the canonical columns; the type columns are appended
/// when the table is written as a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedTable {
    pub header: Vec<String>,
    pub rows: Vec<EnrichedRow>,
}

impl EnrichedTable {
    pub fn new(header: Vec<String>, rows: Vec<EnrichedRow>) -> Self {
        Self { header, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header as written to a grid, type columns included.
    pub fn grid_header(&self) -> Vec<String> {
        let mut header = self.header.clone();
        header.push(columns::SENDER_KIND.to_string());
        header.push(columns::RECIPIENT_KIND.to_string());
        header
    }

    /// Keeps only the rows matching `keep`, header untouched.
    pub fn filtered<F>(&self, mut keep: F) -> EnrichedTable
    where
        F: FnMut(&EnrichedRow) -> bool,
    {
        EnrichedTable {
            header: self.header.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Rebuilds a table from its grid form. The type columns may sit anywhere
    /// in the header; every other column is kept in order.
    pub fn from_grid(mut grid: Vec<Vec<CellValue>>) -> Result<Self, GridError> {
        if grid.is_empty() {
            return Err(GridError::MissingHeader);
        }
        let rows = grid.split_off(1);
        let full_header = grid
            .remove(0)
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| match cell {
                CellValue::Text(s) => Ok(s),
                _ => Err(GridError::NonTextHeader(idx)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let find = |name: &str| {
            full_header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| GridError::MissingColumn(name.to_string()))
        };
        let sender_kind_idx = find(columns::SENDER_KIND)?;
        let recipient_kind_idx = find(columns::RECIPIENT_KIND)?;

        let header = full_header
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != sender_kind_idx && *idx != recipient_kind_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let width = full_header.len();
        let mut enriched = Vec::with_capacity(rows.len());
        for (row_no, mut row) in rows.into_iter().enumerate() {
            row.resize(width.max(row.len()), CellValue::Missing);
            let sender_kind = parse_kind(&row[sender_kind_idx], row_no + 1)?;
            let recipient_kind = parse_kind(&row[recipient_kind_idx], row_no + 1)?;
            let cells = row
                .into_iter()
                .take(width)
                .enumerate()
                .filter(|(idx, _)| *idx != sender_kind_idx && *idx != recipient_kind_idx)
                .map(|(_, cell)| cell)
                .collect();
            enriched.push(EnrichedRow {
                cells,
                sender_kind,
                recipient_kind,
            });
        }

        Ok(EnrichedTable {
            header,
            rows: enriched,
        })
    }
}

fn parse_kind(cell: &CellValue, row: usize) -> Result<AccountKind, GridError> {
    cell.as_text()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| GridError::InvalidKind {
            row,
            value: cell.to_string(),
        })
}

struct GridRow<'a>(&'a EnrichedRow);

impl Serialize for GridRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row = self.0;
        let mut seq = serializer.serialize_seq(Some(row.cells.len() + 2))?;
        for cell in &row.cells {
            seq.serialize_element(cell)?;
        }
        seq.serialize_element(row.sender_kind.symbol())?;
        seq.serialize_element(row.recipient_kind.symbol())?;
        seq.end()
    }
}

impl Serialize for EnrichedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len() + 1))?;
        seq.serialize_element(&self.grid_header())?;
        for row in &self.rows {
            seq.serialize_element(&GridRow(row))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for EnrichedTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let grid = Vec::<Vec<CellValue>>::deserialize(deserializer)?;
        EnrichedTable::from_grid(grid).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table() -> EnrichedTable {
        EnrichedTable::new(
            vec!["Date".into(), "Montant".into(), "Expéditeur".into(), "Destinataire".into()],
            vec![
                EnrichedRow {
                    cells: vec![
                        CellValue::text("2024-01-15"),
                        CellValue::Int(100),
                        CellValue::text("Boulangerie"),
                        CellValue::Missing,
                    ],
                    sender_kind: AccountKind::Professional,
                    recipient_kind: AccountKind::Vault,
                },
                EnrichedRow {
                    cells: vec![
                        CellValue::Missing,
                        CellValue::Number(2.5),
                        CellValue::text("Alice"),
                        CellValue::text("Boulangerie"),
                    ],
                    sender_kind: AccountKind::Individual,
                    recipient_kind: AccountKind::Professional,
                },
            ],
        )
    }

    // ── raw table ─────────────────────────────────────────────────────────────

    #[test]
    fn header_labels_name_blank_cells() {
        assert_eq!(header_label(1, &CellValue::Missing), "Unnamed: 1");
        assert_eq!(header_label(2, &CellValue::Int(3)), "3");
        let raw = RawTable::new(vec!["Sender".into(), "3".into()], vec![vec![CellValue::Int(1)]]);
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.column_index("3"), Some(1));
    }

    // ── enriched grid ─────────────────────────────────────────────────────────

    #[test]
    fn enriched_serializes_header_first_with_type_columns() {
        let json = serde_json::to_value(make_table()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                ["Date", "Montant", "Expéditeur", "Destinataire", "Type_Expéditeur", "Type_Destinataire"],
                ["2024-01-15", 100, "Boulangerie", null, "P", "C"],
                [null, 2.5, "Alice", "Boulangerie", "U", "P"]
            ])
        );
    }

    #[test]
    fn enriched_reads_back_what_it_wrote() {
        let table = make_table();
        let json = serde_json::to_string(&table).unwrap();
        let back: EnrichedTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn enriched_from_grid_pads_short_rows() {
        let grid: Vec<Vec<CellValue>> = serde_json::from_str(
            r#"[["Type_Expéditeur","Type_Destinataire","Montant","Expéditeur"],["P","U"]]"#,
        )
        .unwrap();
        let table = EnrichedTable::from_grid(grid).unwrap();
        assert_eq!(table.header, vec!["Montant", "Expéditeur"]);
        assert_eq!(table.rows[0].cells, vec![CellValue::Missing, CellValue::Missing]);
        assert_eq!(table.rows[0].recipient_kind, AccountKind::Individual);
    }

    #[test]
    fn enriched_from_grid_requires_type_columns() {
        let grid = vec![vec![CellValue::text("Montant")]];
        assert_eq!(
            EnrichedTable::from_grid(grid),
            Err(GridError::MissingColumn("Type_Expéditeur".into()))
        );
    }

    #[test]
    fn enriched_from_grid_rejects_unknown_kind() {
        let grid: Vec<Vec<CellValue>> = serde_json::from_str(
            r#"[["Type_Expéditeur","Type_Destinataire"],["P","Z"]]"#,
        )
        .unwrap();
        assert!(matches!(
            EnrichedTable::from_grid(grid),
            Err(GridError::InvalidKind { row: 1, .. })
        ));
    }

    #[test]
    fn enriched_from_grid_rejects_numeric_header() {
        let grid = vec![vec![CellValue::Int(1)]];
        assert_eq!(EnrichedTable::from_grid(grid), Err(GridError::NonTextHeader(0)));
    }

    #[test]
    fn filtered_keeps_header() {
        let table = make_table();
        let only_pro = table.filtered(|r| r.sender_kind == AccountKind::Professional);
        assert_eq!(only_pro.header, table.header);
        assert_eq!(only_pro.len(), 1);
    }

    #[test]
    fn normalized_serializes_as_grid() {
        let table = NormalizedTable {
            header: vec!["Montant".into()],
            rows: vec![vec![CellValue::Missing]],
        };
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"[["Montant"],[null]]"#);
    }
}
