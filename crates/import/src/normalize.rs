use monnaie_core::{CellValue, NormalizedTable, RawTable};

use crate::catalog::FormatDescriptor;

/// Projects raw rows onto the descriptor's canonical columns.
///
/// The output header is the canonical field list in mapping order. Each raw
/// column is looked up once; unmapped raw columns are dropped, and a field
/// whose column is absent (or past the end of a short row) becomes `Missing`.
pub fn normalize(raw: &RawTable, descriptor: &FormatDescriptor) -> NormalizedTable {
    let indices: Vec<Option<usize>> = descriptor
        .field_mapping
        .raw_columns()
        .map(|col| raw.column_index(col))
        .collect();

    let header = descriptor
        .field_mapping
        .canonical_fields()
        .map(str::to_string)
        .collect();

    let rows = raw
        .rows
        .iter()
        .map(|row| {
            indices
                .iter()
                .map(|idx| idx.and_then(|i| row.get(i)).cloned().unwrap_or(CellValue::Missing))
                .collect()
        })
        .collect();

    NormalizedTable { header, rows }
}
