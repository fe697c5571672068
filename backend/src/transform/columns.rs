//! Column resolution.
//!
//! WHO exports are inconsistent about header case (`YEAR`, `Year`, `year`),
//! so panels ask for a logical name and get back whatever the file uses.

use std::collections::HashMap;

use crate::error::{ShapeError, ShapeResult};
use crate::models::Table;

/// Find the header whose upper-cased form equals the upper-cased logical name.
///
/// When several headers match, the first in header order wins.
pub fn resolve_column(headers: &[String], logical: &str) -> ShapeResult<String> {
    if logical.is_empty() {
        return Err(ShapeError::EmptyColumnName);
    }

    let target = logical.to_uppercase();
    headers
        .iter()
        .find(|h| h.to_uppercase() == target)
        .cloned()
        .ok_or_else(|| not_found(headers, logical))
}

/// Exact lookup for datasets whose columns are consumed verbatim.
pub fn require_column(table: &Table, name: &str) -> ShapeResult<usize> {
    if name.is_empty() {
        return Err(ShapeError::EmptyColumnName);
    }
    table
        .column_index(name)
        .ok_or_else(|| not_found(table.headers(), name))
}

/// Exact lookup of several columns at once, in the order given.
pub fn require_columns<const N: usize>(table: &Table, names: [&str; N]) -> ShapeResult<[usize; N]> {
    let mut out = [0; N];
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = require_column(table, name)?;
    }
    Ok(out)
}

fn not_found(headers: &[String], column: &str) -> ShapeError {
    ShapeError::ColumnNotFound {
        column: column.to_string(),
        available: headers.to_vec(),
    }
}

/// Logical name → actual header, for a whole set of logical names.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnResolution {
    resolved: HashMap<String, (String, usize)>,
}

impl ColumnResolution {
    /// Resolve every logical name, failing on the first that has no match.
    pub fn resolve(table: &Table, logical: &[&str]) -> ShapeResult<Self> {
        let mut resolved = HashMap::with_capacity(logical.len());
        for name in logical {
            let actual = resolve_column(table.headers(), name)?;
            // resolve_column only returns names present in the header
            let index = table.column_index(&actual).unwrap_or_default();
            resolved.insert(name.to_uppercase(), (actual, index));
        }
        Ok(Self { resolved })
    }

    /// Actual header for a logical name that was part of the resolution.
    pub fn name(&self, logical: &str) -> ShapeResult<&str> {
        self.entry(logical).map(|(name, _)| name.as_str())
    }

    /// Column position for a logical name that was part of the resolution.
    pub fn index(&self, logical: &str) -> ShapeResult<usize> {
        self.entry(logical).map(|(_, index)| *index)
    }

    fn entry(&self, logical: &str) -> ShapeResult<&(String, usize)> {
        self.resolved
            .get(&logical.to_uppercase())
            .ok_or_else(|| ShapeError::ColumnNotFound {
                column: logical.to_string(),
                available: self.resolved.values().map(|(n, _)| n.clone()).collect(),
            })
    }
}
