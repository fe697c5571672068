//! Top-K ranking with first-occurrence tie-breaking.
//!
//! Equal values are ranked in input order: the earlier row gets the better
//! rank. Implemented as an explicit stable sort on (value descending, index
//! ascending).

use std::cmp::Ordering;

use crate::models::{Cell, Table};

/// Name of the column appended to ranked output.
pub const RANK_COLUMN: &str = "rank";

/// Row positions ordered best-first. Rows without a numeric value are not ranked.
pub fn rank_order(table: &Table, value_col: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row[value_col].as_f64().map(|v| (i, v)))
        .collect();

    ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });

    ranked.into_iter().map(|(i, _)| i).collect()
}

/// The `k` rows with the largest values, best first, with a 1-based `rank` column.
///
/// Never returns more than `k` rows.
pub fn top_k(table: &Table, value_col: usize, k: usize) -> Table {
    let order: Vec<usize> = rank_order(table, value_col).into_iter().take(k).collect();
    let ranks = (1..=order.len()).map(|r| Cell::Number(r as f64)).collect();
    table.select(&order).with_column(RANK_COLUMN, ranks)
}

/// Top-K restricted to rows whose partition column equals `key`.
pub fn top_k_in_partition(
    table: &Table,
    partition_col: usize,
    key: f64,
    value_col: usize,
    k: usize,
) -> Table {
    let partition = table.filter(|row| row[partition_col].as_f64() == Some(key));
    top_k(&partition, value_col, k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, f64, f64)]) -> Table {
        Table::from_rows(
            vec!["country".into(), "year".into(), "value".into()],
            rows.iter()
                .map(|(c, y, v)| vec![Cell::text(*c), Cell::Number(*y), Cell::Number(*v)])
                .collect(),
        )
    }

    fn countries(table: &Table) -> Vec<String> {
        table.rows().iter().map(|r| r[0].to_string()).collect()
    }

    #[test]
    fn test_first_occurrence_wins_tie() {
        let t = table(&[("A", 2020.0, 50.0), ("B", 2020.0, 70.0), ("C", 2020.0, 70.0), ("D", 2020.0, 90.0)]);
        let top = top_k(&t, 2, 2);

        assert_eq!(countries(&top), vec!["D", "B"]);
        assert_eq!(top.rows()[0][3], Cell::Number(1.0));
        assert_eq!(top.rows()[1][3], Cell::Number(2.0));
    }

    #[test]
    fn test_never_more_than_k() {
        let t = table(&[("A", 2020.0, 70.0), ("B", 2020.0, 70.0), ("C", 2020.0, 70.0)]);
        assert_eq!(countries(&top_k(&t, 2, 2)), vec!["A", "B"]);
    }

    #[test]
    fn test_fewer_rows_than_k() {
        let t = table(&[("A", 2020.0, 1.0)]);
        assert_eq!(top_k(&t, 2, 10).len(), 1);
    }

    #[test]
    fn test_partition_before_ranking() {
        let t = table(&[
            ("A", 2019.0, 99.0),
            ("B", 2020.0, 60.0),
            ("C", 2020.0, 80.0),
            ("D", 2021.0, 95.0),
        ]);
        let top = top_k_in_partition(&t, 1, 2020.0, 2, 10);
        assert_eq!(countries(&top), vec!["C", "B"]);
    }

    #[test]
    fn test_missing_values_not_ranked() {
        let mut t = table(&[("A", 2020.0, 10.0)]);
        t.push(vec![Cell::text("B"), Cell::Number(2020.0), Cell::Missing]);
        assert_eq!(rank_order(&t, 2), vec![0]);
    }

    #[test]
    fn test_empty_partition() {
        let t = table(&[("A", 2020.0, 10.0)]);
        let top = top_k_in_partition(&t, 1, 1999.0, 2, 10);
        assert!(top.is_empty());
        assert_eq!(top.headers().last().map(String::as_str), Some(RANK_COLUMN));
    }
}
