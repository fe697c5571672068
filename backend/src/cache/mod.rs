//! Dataset cache - memoize parsed CSV files by path
//!
//! Every panel request re-shapes its source table from scratch, but the file
//! itself is read and parsed only once. Cached tables are immutable and shared
//! as `Arc`, so shaping can never alter what the next request sees.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::api::logs::{log_info, log_success};
use crate::error::CsvResult;
use crate::models::Table;
use crate::parser::{parse_csv_file_auto, ParseResult};

/// A parsed dataset with its load metadata
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    pub info: CsvInfo,
}

/// CSV file information
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub path: String,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
    /// RFC 3339 load timestamp
    pub loaded_at: String,
}

impl LoadedTable {
    fn from_parse(path: &Path, parsed: ParseResult) -> Self {
        let info = CsvInfo {
            path: path.display().to_string(),
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            headers: parsed.table.headers().to_vec(),
            row_count: parsed.table.len(),
            loaded_at: chrono::Utc::now().to_rfc3339(),
        };
        Self {
            table: parsed.table,
            info,
        }
    }
}

/// Load cache keyed by source path
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<PathBuf, Arc<LoadedTable>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, parsing the file on first use.
    ///
    /// Failed loads are not cached.
    pub fn get_or_load(&self, path: &Path) -> CsvResult<Arc<LoadedTable>> {
        if let Some(hit) = self.get(path) {
            return Ok(hit);
        }

        log_info(format!("📖 Reading {}", path.display()));
        let parsed = parse_csv_file_auto(path)?;
        let loaded = Arc::new(LoadedTable::from_parse(path, parsed));
        log_success(format!(
            "Read {} rows ({}, delimiter '{}')",
            loaded.info.row_count,
            loaded.info.encoding,
            format_delimiter(loaded.info.delimiter)
        ));

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have loaded it meanwhile; keep the first
        let entry = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::clone(&loaded));
        Ok(Arc::clone(entry))
    }

    /// Cached table for `path`, without loading.
    pub fn get(&self, path: &Path) -> Option<Arc<LoadedTable>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(path).cloned()
    }

    /// Forget one path. Returns whether it was cached.
    pub fn invalidate(&self, path: &Path) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(path).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metadata of every cached dataset.
    pub fn list(&self) -> Vec<CsvInfo> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut infos: Vec<CsvInfo> = entries.values().map(|t| t.info.clone()).collect();
        infos.sort_by(|a, b| a.path.cmp(&b.path));
        infos
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
