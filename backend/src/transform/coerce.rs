//! Numeric coercion and required-column row filtering.

use crate::api::logs::log_warning;
use crate::models::Table;

/// Filtered table plus how many rows were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub table: Table,
    pub dropped: usize,
}

/// Coerce `columns` to numbers, then drop every row missing any `required` column.
///
/// Unparseable values become missing rather than failing the request. Column
/// positions are indices into `table`'s header; the input table is untouched.
pub fn coerce_and_filter(table: &Table, columns: &[usize], required: &[usize]) -> FilterOutcome {
    debug_assert!(!required.is_empty());

    let mut coerced = table.empty_like();
    let mut dropped = 0;

    for row in table.rows() {
        let mut row = row.clone();
        for &col in columns {
            row[col] = row[col].coerce_numeric();
        }
        if required.iter().any(|&col| row[col].is_missing()) {
            dropped += 1;
        } else {
            coerced.push(row);
        }
    }

    if dropped > 0 {
        let names: Vec<&str> = required
            .iter()
            .map(|&col| table.headers()[col].as_str())
            .collect();
        log_warning(format!(
            "Dropped {} of {} rows missing one of [{}]",
            dropped,
            table.len(),
            names.join(", ")
        ));
    }

    FilterOutcome {
        table: coerced,
        dropped,
    }
}
