//! Development-status classification and the matched comparison sample.
//!
//! ```text
//!  rows ──▶ label (Developed | Developing) ──▶ per-country mean
//!                                               │
//!          n = #Developed countries ◀───────────┘
//!          keep all Developed + the n Developing with the lowest mean
//! ```

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::CountryReference;
use crate::models::{Cell, DevelopmentStatus, Table};

/// Name of the column appended by [`Classifier::classify`].
pub const STATUS_COLUMN: &str = "development_status";

/// Mean value of one country across its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryMean {
    pub country: String,
    pub status: DevelopmentStatus,
    pub mean: f64,
    pub rows: usize,
}

/// Size-balanced Developed vs Developing subset.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSample {
    /// Selected rows in input order, with a `development_status` column
    pub table: Table,
    /// Developed countries, first-appearance order
    pub developed: Vec<String>,
    /// Selected Developing countries, lowest mean first
    pub developing: Vec<String>,
}

/// Five-number summary of one group, for box plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxSummary {
    pub status: DevelopmentStatus,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Labels countries against an injected reference set.
#[derive(Debug, Clone)]
pub struct Classifier {
    reference: CountryReference,
}

impl Classifier {
    pub fn new(reference: CountryReference) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &CountryReference {
        &self.reference
    }

    /// Label of a single country name. A missing name is Developing.
    pub fn label(&self, country: &Cell) -> DevelopmentStatus {
        match country {
            Cell::Text(name) => self.reference.status_of(name),
            other => self.reference.status_of(&other.to_string()),
        }
    }

    /// Append a `development_status` column; every row gets exactly one label.
    pub fn classify(&self, table: &Table, country_col: usize) -> Table {
        let labels = table
            .rows()
            .iter()
            .map(|row| Cell::text(self.label(&row[country_col]).as_str()))
            .collect();
        table.clone().with_column(STATUS_COLUMN, labels)
    }

    /// Mean of `value_col` per country, in first-appearance order.
    ///
    /// Rows without a numeric value do not count; a country with none is omitted.
    pub fn group_means(&self, table: &Table, country_col: usize, value_col: usize) -> Vec<CountryMean> {
        let mut order: Vec<String> = Vec::new();
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();

        for row in table.rows() {
            let Some(value) = row[value_col].as_f64() else {
                continue;
            };
            let country = row[country_col].to_string();
            let entry = sums.entry(country.clone()).or_insert_with(|| {
                order.push(country);
                (0.0, 0)
            });
            entry.0 += value;
            entry.1 += 1;
        }

        order
            .into_iter()
            .filter_map(|country| {
                let (sum, rows) = sums.get(&country).copied()?;
                Some(CountryMean {
                    status: self.reference.status_of(&country),
                    mean: sum / rows as f64,
                    rows,
                    country,
                })
            })
            .collect()
    }

    /// All Developed rows plus rows of the `n` lowest-mean Developing countries,
    /// where `n` is the number of distinct Developed countries.
    ///
    /// Developed countries are counted from the country column, so one with no
    /// numeric value still counts and keeps its rows. Developing countries
    /// without a mean cannot be selected. Ties on the mean keep
    /// first-appearance order. Deterministic.
    pub fn matched_sample(&self, table: &Table, country_col: usize, value_col: usize) -> MatchedSample {
        let means = self.group_means(table, country_col, value_col);

        let mut developed: Vec<String> = Vec::new();
        for row in table.rows() {
            let cell = &row[country_col];
            if cell.is_missing() || self.label(cell) != DevelopmentStatus::Developed {
                continue;
            }
            let name = cell.to_string();
            if !developed.contains(&name) {
                developed.push(name);
            }
        }

        let mut candidates: Vec<&CountryMean> = means
            .iter()
            .filter(|m| m.status == DevelopmentStatus::Developing)
            .collect();
        candidates.sort_by(|a, b| a.mean.total_cmp(&b.mean));

        let developing: Vec<String> = candidates
            .into_iter()
            .take(developed.len())
            .map(|m| m.country.clone())
            .collect();

        let keep: HashSet<&str> = developed
            .iter()
            .chain(developing.iter())
            .map(String::as_str)
            .collect();

        let selected = table.filter(|row| keep.contains(row[country_col].to_string().as_str()));

        MatchedSample {
            table: self.classify(&selected, country_col),
            developed,
            developing,
        }
    }
}

/// Five-number summary of `value_col` per label in `status_col`.
///
/// Quartiles use linear interpolation between closest ranks. Groups with no
/// values are omitted; Developed comes first.
pub fn box_summary(table: &Table, status_col: usize, value_col: usize) -> Vec<BoxSummary> {
    [DevelopmentStatus::Developed, DevelopmentStatus::Developing]
        .into_iter()
        .filter_map(|status| {
            let mut values: Vec<f64> = table
                .rows()
                .iter()
                .filter(|row| row[status_col].as_text() == Some(status.as_str()))
                .filter_map(|row| row[value_col].as_f64())
                .collect();
            if values.is_empty() {
                return None;
            }
            values.sort_by(f64::total_cmp);
            Some(BoxSummary {
                status,
                count: values.len(),
                min: values[0],
                q1: percentile(&values, 0.25),
                median: percentile(&values, 0.5),
                q3: percentile(&values, 0.75),
                max: values[values.len() - 1],
            })
        })
        .collect()
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = pos - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, f64)]) -> Table {
        Table::from_rows(
            vec!["country".into(), "value".into()],
            rows.iter()
                .map(|(c, v)| vec![Cell::text(*c), Cell::Number(*v)])
                .collect(),
        )
    }

    fn classifier(developed: &[&str]) -> Classifier {
        Classifier::new(CountryReference::new(developed.iter().copied()))
    }

    #[test]
    fn test_every_row_labelled() {
        let c = classifier(&["Japan"]);
        let labelled = c.classify(&table(&[("Japan", 1.0), ("Kenya", 2.0)]), 0);

        assert_eq!(labelled.headers().last().map(String::as_str), Some(STATUS_COLUMN));
        assert_eq!(labelled.rows()[0][2], Cell::text("Developed"));
        assert_eq!(labelled.rows()[1][2], Cell::text("Developing"));
    }

    #[test]
    fn test_group_means_first_appearance_order() {
        let c = classifier(&["Japan"]);
        let means = c.group_means(&table(&[("Kenya", 10.0), ("Japan", 2.0), ("Kenya", 20.0)]), 0, 1);

        assert_eq!(means.len(), 2);
        assert_eq!(means[0].country, "Kenya");
        assert_eq!(means[0].mean, 15.0);
        assert_eq!(means[0].rows, 2);
        assert_eq!(means[1].status, DevelopmentStatus::Developed);
    }

    #[test]
    fn test_matched_sample_takes_lowest_means() {
        let developed = ["D1", "D2", "D3", "D4", "D5"];
        let c = classifier(&developed);
        let mut rows: Vec<(&str, f64)> = developed.iter().map(|d| (*d, 1.0)).collect();
        rows.extend([
            ("P1", 40.0),
            ("P2", 5.0),
            ("P3", 30.0),
            ("P4", 10.0),
            ("P5", 20.0),
            ("P6", 50.0),
            ("P7", 1.0),
        ]);

        let sample = c.matched_sample(&table(&rows), 0, 1);

        assert_eq!(sample.developed.len(), 5);
        assert_eq!(sample.developing, vec!["P7", "P2", "P4", "P5", "P3"]);
        assert_eq!(sample.table.len(), 10);
    }

    #[test]
    fn test_matched_sample_tie_keeps_input_order() {
        let c = classifier(&["D1"]);
        let sample = c.matched_sample(&table(&[("P1", 3.0), ("D1", 9.0), ("P2", 3.0)]), 0, 1);
        assert_eq!(sample.developing, vec!["P1"]);
    }

    #[test]
    fn test_matched_sample_small_developing_population() {
        let c = classifier(&["D1", "D2", "D3"]);
        let sample = c.matched_sample(
            &table(&[("D1", 1.0), ("D2", 1.0), ("D3", 1.0), ("P1", 8.0)]),
            0,
            1,
        );
        assert_eq!(sample.developed.len(), 3);
        assert_eq!(sample.developing, vec!["P1"]);
    }

    #[test]
    fn test_matched_sample_keeps_input_row_order() {
        let c = classifier(&["D1"]);
        let sample = c.matched_sample(&table(&[("P1", 3.0), ("D1", 9.0), ("P1", 5.0)]), 0, 1);
        let order: Vec<String> = sample.table.rows().iter().map(|r| r[0].to_string()).collect();
        assert_eq!(order, vec!["P1", "D1", "P1"]);
    }

    #[test]
    fn test_developed_without_values_still_counts() {
        let c = classifier(&["D1", "D2"]);
        let mut input = table(&[("D1", 1.0), ("P1", 4.0), ("P2", 6.0), ("P3", 9.0)]);
        input.push(vec![Cell::text("D2"), Cell::Missing]);

        let sample = c.matched_sample(&input, 0, 1);

        assert_eq!(sample.developed, vec!["D1", "D2"]);
        assert_eq!(sample.developing, vec!["P1", "P2"]);
        assert_eq!(sample.table.len(), 4);
        assert!(sample.table.rows()[3][1].is_missing());
    }

    #[test]
    fn test_empty_input_gives_empty_sample() {
        let c = classifier(&["D1"]);
        let sample = c.matched_sample(&table(&[]), 0, 1);
        assert!(sample.table.is_empty());
        assert!(sample.developed.is_empty());
        assert!(sample.developing.is_empty());
    }

    #[test]
    fn test_box_summary() {
        let c = classifier(&["D1"]);
        let labelled = c.classify(
            &table(&[("D1", 1.0), ("D1", 2.0), ("D1", 3.0), ("D1", 4.0), ("P1", 7.0)]),
            0,
        );
        let summary = box_summary(&labelled, 2, 1);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].status, DevelopmentStatus::Developed);
        assert_eq!(summary[0].count, 4);
        assert_eq!(summary[0].min, 1.0);
        assert_eq!(summary[0].q1, 1.75);
        assert_eq!(summary[0].median, 2.5);
        assert_eq!(summary[0].q3, 3.25);
        assert_eq!(summary[0].max, 4.0);
        assert_eq!(summary[1].median, 7.0);
    }
}
