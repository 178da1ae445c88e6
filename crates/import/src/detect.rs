use std::collections::HashSet;

use crate::catalog::FormatDescriptor;

/// Returns the first format whose expected raw columns all appear in `header`.
///
/// Matching is exact on column names and there is no scoring: the first full
/// match wins, so catalogs must not contain overlapping layouts.
pub fn detect<'a>(header: &[String], formats: &'a [FormatDescriptor]) -> Option<&'a FormatDescriptor> {
    let present: HashSet<&str> = header.iter().map(String::as_str).collect();

    formats.iter().find(|format| {
        let missing: Vec<&str> = format
            .field_mapping
            .raw_columns()
            .filter(|col| !present.contains(col))
            .collect();
        tracing::debug!(format = %format.name, ?missing, "detection attempt");
        missing.is_empty()
    })
}
