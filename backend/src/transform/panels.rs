//! Per-panel shaping.
//!
//! Each function takes the cached source table and the user's filter choices
//! and returns the tables one dashboard panel renders. Panels are pure: the
//! source table is never modified and identical inputs give identical output.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::classify::{box_summary, BoxSummary, Classifier, CountryMean};
use super::coerce::coerce_and_filter;
use super::columns::{require_columns, ColumnResolution};
use super::rank::{top_k, top_k_in_partition, RANK_COLUMN};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{compare_numbers, Cell, Row, Table};
use crate::validation::validate_table;

/// Logical columns of the treatment-coverage dataset, resolved case-insensitively.
pub const COVERAGE_COLUMNS: [&str; 5] = ["YEAR", "COUNTRY", "VALUE", "VALUE_LO", "VALUE_HI"];

/// Columns of the incidence/mortality dataset, used verbatim.
pub const BURDEN_COLUMNS: [&str; 7] = ["region", "measure", "level", "year", "rate", "ci_low", "ci_high"];

/// Columns of the reduction-map dataset, used verbatim.
pub const REDUCTION_COLUMNS: [&str; 4] = ["country", "iso3", "year", "value"];

/// Columns of the RR-TB resistance dataset, used verbatim.
pub const RESISTANCE_COLUMNS: [&str; 3] = ["region", "year", "value"];

/// Columns of the HIV co-infection dataset, used verbatim.
pub const COINFECTION_COLUMNS: [&str; 3] = ["country", "year", "value"];

/// Output header of the regional comparison.
pub const COMPARISON_COLUMNS: [&str; 4] = ["region", "year", "rr_tb_share", "rate"];

/// Output header of the reduction map.
pub const REDUCTION_OUTPUT_COLUMNS: [&str; 5] = ["country", "iso3", "baseline", "target", "reduction_pct"];

/// A shaped panel ready for the charting layer.
pub trait Panel: Serialize {
    /// Panel identifier used in logs and responses.
    const NAME: &'static str;

    /// Nothing to draw: the caller shows a neutral empty state.
    fn is_empty(&self) -> bool;
}

/// Settings shared by every panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeOptions {
    /// Bars in a ranking when the request does not say
    pub default_top_n: usize,
    /// Skip the output contract check
    pub skip_validation: bool,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            default_top_n: 10,
            skip_validation: false,
        }
    }
}

impl ShapeOptions {
    fn check(&self, panel: &str, table: &Table, required: &[&str], nullable: &[&str]) -> PipelineResult<()> {
        if self.skip_validation {
            return Ok(());
        }
        validate_table(panel, table, required, nullable)?;
        Ok(())
    }
}

/// Inclusive year span of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

fn year_range(table: &Table, col: usize) -> Option<YearRange> {
    table.numeric_range(col).map(|(lo, hi)| YearRange {
        min: lo as i32,
        max: hi as i32,
    })
}

fn distinct_years(table: &Table, col: usize) -> Vec<i32> {
    table
        .rows()
        .iter()
        .filter_map(|r| r[col].as_f64())
        .map(|y| y as i32)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn is_year(cell: &Cell, year: i32) -> bool {
    cell.as_f64() == Some(f64::from(year))
}

fn text_eq(cell: &Cell, expected: &str) -> bool {
    !cell.is_missing() && cell.to_string() == expected
}

// =============================================================================
// Treatment coverage
// =============================================================================

/// Filters of the coverage tab.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoverageRequest {
    pub country: Option<String>,
    pub year: Option<i32>,
    pub top: Option<usize>,
}

/// Resolved header names of the coverage dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageColumns {
    pub year: String,
    pub country: String,
    pub value: String,
    pub value_lo: String,
    pub value_hi: String,
}

/// Country trend with uncertainty band plus the top-N ranking of one year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveragePanel {
    pub columns: CoverageColumns,
    pub countries: Vec<String>,
    pub selected_country: Option<String>,
    /// Selected country's rows, by year
    pub series: Table,
    pub year_range: Option<YearRange>,
    pub selected_year: Option<i32>,
    /// Top-N rows of the selected year, best first, with `rank`
    pub top: Table,
    /// Bar drawn in the highlight colour
    pub highlight: Option<String>,
    pub dropped_rows: usize,
}

impl Panel for CoveragePanel {
    const NAME: &'static str = "coverage";

    fn is_empty(&self) -> bool {
        self.series.is_empty() && self.top.is_empty()
    }
}

/// Shape the treatment-coverage tab.
pub fn coverage_panel(
    source: &Table,
    request: &CoverageRequest,
    options: &ShapeOptions,
) -> PipelineResult<CoveragePanel> {
    let top_n = request.top.unwrap_or(options.default_top_n);
    if top_n == 0 {
        return Err(PipelineError::InvalidRequest("top must be at least 1".into()));
    }

    let res = ColumnResolution::resolve(source, &COVERAGE_COLUMNS)?;
    let (year, country, value) = (res.index("YEAR")?, res.index("COUNTRY")?, res.index("VALUE")?);
    let (lo, hi) = (res.index("VALUE_LO")?, res.index("VALUE_HI")?);

    let outcome = coerce_and_filter(source, &[year, value, lo, hi], &[year, country, value]);
    let table = outcome.table;

    let countries = table.unique_values(country);
    let selected_country = request
        .country
        .clone()
        .or_else(|| countries.first().cloned());

    let series = match &selected_country {
        Some(name) => table
            .filter(|r| text_eq(&r[country], name))
            .sorted_by_number(year),
        None => table.empty_like(),
    };

    let year_range = year_range(&table, year);
    let selected_year = request.year.or(year_range.map(|r| r.max));
    let top = match selected_year {
        Some(y) => top_k_in_partition(&table, year, f64::from(y), value, top_n),
        None => top_k(&table.empty_like(), value, top_n),
    };

    let columns = CoverageColumns {
        year: res.name("YEAR")?.to_string(),
        country: res.name("COUNTRY")?.to_string(),
        value: res.name("VALUE")?.to_string(),
        value_lo: res.name("VALUE_LO")?.to_string(),
        value_hi: res.name("VALUE_HI")?.to_string(),
    };

    let numeric = [columns.year.as_str(), columns.value.as_str()];
    let bounds = [columns.value_lo.as_str(), columns.value_hi.as_str()];
    options.check(CoveragePanel::NAME, &series, &numeric, &bounds)?;
    options.check(CoveragePanel::NAME, &top, &[numeric[0], numeric[1], RANK_COLUMN], &bounds)?;

    Ok(CoveragePanel {
        columns,
        countries,
        highlight: selected_country.clone(),
        selected_country,
        series,
        year_range,
        selected_year,
        top,
        dropped_rows: outcome.dropped,
    })
}

/// Sorted countries with at least one usable coverage row, for the selector.
///
/// Only YEAR, COUNTRY and VALUE need to resolve; no panel is built.
pub fn coverage_countries(source: &Table) -> PipelineResult<Vec<String>> {
    let res = ColumnResolution::resolve(source, &COVERAGE_COLUMNS[..3])?;
    let (year, country, value) = (res.index("YEAR")?, res.index("COUNTRY")?, res.index("VALUE")?);

    let outcome = coerce_and_filter(source, &[year, value], &[year, country, value]);
    Ok(outcome.table.unique_values(country))
}

// =============================================================================
// Incidence / mortality
// =============================================================================

/// Filters of the burden tab. Unset region/measure fall back to the first available.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BurdenRequest {
    pub region: Option<String>,
    pub measure: Option<String>,
    pub level: Option<String>,
}

/// Rate trend with confidence band for one region and measure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurdenPanel {
    pub regions: Vec<String>,
    pub measures: Vec<String>,
    pub levels: Vec<String>,
    pub selected_region: Option<String>,
    pub selected_measure: Option<String>,
    pub selected_level: Option<String>,
    pub series: Table,
    pub dropped_rows: usize,
}

impl Panel for BurdenPanel {
    const NAME: &'static str = "burden";

    fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Shape the incidence/mortality tab.
pub fn burden_panel(source: &Table, request: &BurdenRequest, options: &ShapeOptions) -> PipelineResult<BurdenPanel> {
    let [region, measure, level, year, rate, ci_low, ci_high] = require_columns(source, BURDEN_COLUMNS)?;

    let outcome = coerce_and_filter(source, &[year, rate, ci_low, ci_high], &[region, measure, year, rate]);
    let table = outcome.table;

    let regions = table.unique_values(region);
    let measures = table.unique_values(measure);
    let levels = table.unique_values(level);

    let selected_region = request.region.clone().or_else(|| regions.first().cloned());
    let selected_measure = request.measure.clone().or_else(|| measures.first().cloned());
    let selected_level = request.level.clone();

    let series = match (&selected_region, &selected_measure) {
        (Some(r), Some(m)) => table
            .filter(|row| {
                text_eq(&row[region], r)
                    && text_eq(&row[measure], m)
                    && selected_level.as_ref().map_or(true, |l| text_eq(&row[level], l))
            })
            .sorted_by_number(year),
        _ => table.empty_like(),
    };

    options.check(BurdenPanel::NAME, &series, &["year", "rate"], &["ci_low", "ci_high"])?;

    Ok(BurdenPanel {
        regions,
        measures,
        levels,
        selected_region,
        selected_measure,
        selected_level,
        series,
        dropped_rows: outcome.dropped,
    })
}

// =============================================================================
// Reduction map
// =============================================================================

/// Years to compare. Defaults: earliest and latest year in the data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReductionRequest {
    pub baseline: Option<i32>,
    pub target: Option<i32>,
}

/// Per-country percentage reduction between two years, for the choropleth.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReductionPanel {
    pub years: Vec<i32>,
    pub baseline_year: Option<i32>,
    pub target_year: Option<i32>,
    /// `country, iso3, baseline, target, reduction_pct`
    pub map: Table,
    pub dropped_rows: usize,
}

impl Panel for ReductionPanel {
    const NAME: &'static str = "reduction";

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Shape the reduction choropleth.
///
/// `reduction_pct = (baseline - target) / baseline * 100`; missing when the
/// baseline is not positive. Countries lacking either year are left out.
pub fn reduction_panel(
    source: &Table,
    request: &ReductionRequest,
    options: &ShapeOptions,
) -> PipelineResult<ReductionPanel> {
    let [country, iso3, year, value] = require_columns(source, REDUCTION_COLUMNS)?;

    let outcome = coerce_and_filter(source, &[year, value], &[country, year, value]);
    let table = outcome.table;

    let years = distinct_years(&table, year);
    let baseline_year = request.baseline.or_else(|| years.first().copied());
    let target_year = request.target.or_else(|| years.last().copied());

    let headers: Vec<String> = REDUCTION_OUTPUT_COLUMNS.iter().map(|s| s.to_string()).collect();
    let mut map = Table::new(headers);

    if let (Some(base_y), Some(target_y)) = (baseline_year, target_year) {
        if base_y > target_y {
            return Err(PipelineError::InvalidRequest(format!(
                "baseline year {} is after target year {}",
                base_y, target_y
            )));
        }

        struct Pair {
            iso3: Cell,
            baseline: Option<f64>,
            target: Option<f64>,
        }

        let mut order: Vec<String> = Vec::new();
        let mut pairs: HashMap<String, Pair> = HashMap::new();

        for row in table.rows() {
            let name = row[country].to_string();
            let pair = pairs.entry(name.clone()).or_insert_with(|| {
                order.push(name);
                Pair {
                    iso3: row[iso3].clone(),
                    baseline: None,
                    target: None,
                }
            });
            let v = row[value].as_f64();
            if is_year(&row[year], base_y) && pair.baseline.is_none() {
                pair.baseline = v;
            }
            if is_year(&row[year], target_y) && pair.target.is_none() {
                pair.target = v;
            }
        }

        for name in order {
            let Some(pair) = pairs.remove(&name) else { continue };
            let (Some(b), Some(t)) = (pair.baseline, pair.target) else { continue };
            let pct = if b > 0.0 {
                Cell::number((b - t) / b * 100.0)
            } else {
                Cell::Missing
            };
            map.push(vec![Cell::Text(name), pair.iso3, Cell::Number(b), Cell::Number(t), pct]);
        }
    }

    options.check(ReductionPanel::NAME, &map, &["baseline", "target"], &["reduction_pct"])?;

    Ok(ReductionPanel {
        years,
        baseline_year,
        target_year,
        map,
        dropped_rows: outcome.dropped,
    })
}

// =============================================================================
// Drug resistance heatmap
// =============================================================================

/// Filters of the resistance heatmap.
///
/// `regions: None` shows every region; an empty list shows nothing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResistanceRequest {
    pub regions: Option<Vec<String>>,
    pub from: Option<i32>,
    pub to: Option<i32>,
}

/// Region × year grid of RR-TB share.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResistancePanel {
    pub available_regions: Vec<String>,
    pub year_range: Option<YearRange>,
    /// Row axis of the heatmap
    pub regions: Vec<String>,
    /// Column axis of the heatmap
    pub years: Vec<i32>,
    /// `region, year, value` sorted by region then year
    pub cells: Table,
    pub dropped_rows: usize,
}

impl Panel for ResistancePanel {
    const NAME: &'static str = "resistance";

    fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Shape the resistance heatmap.
pub fn resistance_panel(
    source: &Table,
    request: &ResistanceRequest,
    options: &ShapeOptions,
) -> PipelineResult<ResistancePanel> {
    let [region, year, value] = require_columns(source, RESISTANCE_COLUMNS)?;

    let outcome = coerce_and_filter(source, &[year, value], &[region, year, value]);
    let table = outcome.table;

    let available_regions = table.unique_values(region);
    let range = year_range(&table, year);
    let from = request.from.or(range.map(|r| r.min));
    let to = request.to.or(range.map(|r| r.max));

    let wanted: Option<HashSet<&str>> = request
        .regions
        .as_ref()
        .map(|list| list.iter().map(String::as_str).collect());

    let in_range = |cell: &Cell| match cell.as_f64() {
        Some(y) => from.map_or(true, |f| y >= f64::from(f)) && to.map_or(true, |t| y <= f64::from(t)),
        None => false,
    };

    let cells = table
        .filter(|row| {
            let keep_region = match &wanted {
                Some(set) => set.contains(row[region].to_string().as_str()),
                None => true,
            };
            keep_region && in_range(&row[year])
        })
        .sorted_by(|a: &Row, b: &Row| match a[region].to_string().cmp(&b[region].to_string()) {
            Ordering::Equal => compare_numbers(&a[year], &b[year]),
            other => other,
        });

    options.check(ResistancePanel::NAME, &cells, &["year", "value"], &[])?;

    Ok(ResistancePanel {
        available_regions,
        year_range: range,
        regions: cells.unique_values(region),
        years: distinct_years(&cells, year),
        cells,
        dropped_rows: outcome.dropped,
    })
}

// =============================================================================
// HIV co-infection
// =============================================================================

/// Filters of the co-infection tab. No year means every year.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoinfectionRequest {
    pub year: Option<i32>,
}

/// Developed vs Developing box plots over a matched sample.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinfectionPanel {
    pub years: Vec<i32>,
    pub selected_year: Option<i32>,
    /// Sampled rows with `development_status`
    pub sample: Table,
    pub developed: Vec<String>,
    pub developing: Vec<String>,
    /// Means of the sampled countries
    pub means: Vec<CountryMean>,
    pub boxes: Vec<BoxSummary>,
    pub dropped_rows: usize,
}

impl Panel for CoinfectionPanel {
    const NAME: &'static str = "coinfection";

    fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }
}

/// Shape the co-infection comparison.
pub fn coinfection_panel(
    source: &Table,
    request: &CoinfectionRequest,
    classifier: &Classifier,
    options: &ShapeOptions,
) -> PipelineResult<CoinfectionPanel> {
    let [country, year, value] = require_columns(source, COINFECTION_COLUMNS)?;

    let outcome = coerce_and_filter(source, &[year, value], &[country, value]);
    let years = distinct_years(&outcome.table, year);

    let table = match request.year {
        Some(y) => outcome.table.filter(|row| is_year(&row[year], y)),
        None => outcome.table,
    };

    let matched = classifier.matched_sample(&table, country, value);
    let status_col = matched.table.headers().len() - 1;

    let keep: HashSet<&str> = matched
        .developed
        .iter()
        .chain(matched.developing.iter())
        .map(String::as_str)
        .collect();
    let means = classifier
        .group_means(&matched.table, country, value)
        .into_iter()
        .filter(|m| keep.contains(m.country.as_str()))
        .collect();
    let boxes = box_summary(&matched.table, status_col, value);

    options.check(CoinfectionPanel::NAME, &matched.table, &["value"], &["year"])?;

    Ok(CoinfectionPanel {
        years,
        selected_year: request.year,
        developed: matched.developed,
        developing: matched.developing,
        sample: matched.table,
        means,
        boxes,
        dropped_rows: outcome.dropped,
    })
}

// =============================================================================
// Regional comparison
// =============================================================================

/// RR-TB share next to the burden rate, per region and year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPanel {
    pub measure: String,
    /// `region, year, rr_tb_share, rate`
    pub rows: Table,
}

impl Panel for ComparisonPanel {
    const NAME: &'static str = "comparison";

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Empty comparison table with the output header.
pub fn empty_comparison() -> Table {
    Table::new(COMPARISON_COLUMNS.iter().map(|s| s.to_string()).collect())
}

/// Inner join of resistance rows with burden rows of one `measure` on (region, year).
///
/// Output follows resistance row order. When the burden table has several
/// rows for the same key the first one is used.
pub fn regional_comparison(resistance: &Table, burden: &Table, measure: &str) -> PipelineResult<Table> {
    let [r_region, r_year, r_value] = require_columns(resistance, RESISTANCE_COLUMNS)?;
    let [b_region, b_measure, b_year, b_rate] = require_columns(burden, ["region", "measure", "year", "rate"])?;

    let resistance = coerce_and_filter(resistance, &[r_year, r_value], &[r_region, r_year, r_value]).table;
    let burden = coerce_and_filter(burden, &[b_year, b_rate], &[b_region, b_measure, b_year, b_rate]).table;

    let mut rates: HashMap<(String, i64), f64> = HashMap::new();
    for row in burden.rows().iter().filter(|r| text_eq(&r[b_measure], measure)) {
        if let (Some(y), Some(rate)) = (row[b_year].as_f64(), row[b_rate].as_f64()) {
            rates.entry((row[b_region].to_string(), y as i64)).or_insert(rate);
        }
    }

    let mut out = empty_comparison();
    for row in resistance.rows() {
        let (Some(y), Some(share)) = (row[r_year].as_f64(), row[r_value].as_f64()) else {
            continue;
        };
        let region = row[r_region].to_string();
        if let Some(&rate) = rates.get(&(region.clone(), y as i64)) {
            out.push(vec![Cell::Text(region), Cell::Number(y), Cell::Number(share), Cell::Number(rate)]);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CountryReference;
    use crate::error::ShapeError;
    use crate::parser::parse_str;

    fn coverage_csv() -> Table {
        parse_str(
            "Year,Country,Value,Value_Lo,Value_Hi\n\
             2019,Peru,70,60,80\n\
             2020,Peru,81,71,90\n\
             2020,Chad,N/A,40,60\n\
             2020,Kenya,75,70,80\n\
             2020,Brazil,75,65,85\n\
             2021,Kenya,77,72,82\n\
             2018,Peru,65,55,75\n",
            ',',
        )
        .unwrap()
    }

    fn names(table: &Table, col: usize) -> Vec<String> {
        table.rows().iter().map(|r| r[col].to_string()).collect()
    }

    #[test]
    fn test_coverage_defaults() {
        let panel = coverage_panel(&coverage_csv(), &CoverageRequest::default(), &ShapeOptions::default()).unwrap();

        assert_eq!(panel.columns.year, "Year");
        assert_eq!(panel.countries, vec!["Brazil", "Kenya", "Peru"]);
        assert_eq!(panel.selected_country.as_deref(), Some("Brazil"));
        assert_eq!(panel.year_range, Some(YearRange { min: 2018, max: 2021 }));
        assert_eq!(panel.selected_year, Some(2021));
        assert_eq!(panel.dropped_rows, 1);
        assert!(!panel.is_empty());
    }

    #[test]
    fn test_coverage_series_sorted_by_year() {
        let request = CoverageRequest {
            country: Some("Peru".into()),
            ..Default::default()
        };
        let panel = coverage_panel(&coverage_csv(), &request, &ShapeOptions::default()).unwrap();

        let years: Vec<f64> = panel.series.rows().iter().filter_map(|r| r[0].as_f64()).collect();
        assert_eq!(years, vec![2018.0, 2019.0, 2020.0]);
        assert_eq!(panel.highlight.as_deref(), Some("Peru"));
    }

    #[test]
    fn test_coverage_top_n_first_occurrence() {
        let request = CoverageRequest {
            year: Some(2020),
            top: Some(2),
            ..Default::default()
        };
        let panel = coverage_panel(&coverage_csv(), &request, &ShapeOptions::default()).unwrap();

        // Kenya and Brazil tie at 75; Kenya comes first in the file
        assert_eq!(names(&panel.top, 1), vec!["Peru", "Kenya"]);
        assert_eq!(panel.top.headers().last().map(String::as_str), Some(RANK_COLUMN));
    }

    #[test]
    fn test_coverage_missing_column() {
        let table = parse_str("Year,Country,Value,Value_Lo\n2020,Peru,1,1", ',').unwrap();
        let err = coverage_panel(&table, &CoverageRequest::default(), &ShapeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Shape(ShapeError::ColumnNotFound { ref column, .. }) if column == "VALUE_HI"
        ));
    }

    #[test]
    fn test_coverage_empty_after_filter() {
        let table = parse_str("YEAR,COUNTRY,VALUE,VALUE_LO,VALUE_HI\n2020,Peru,,1,2", ',').unwrap();
        let panel = coverage_panel(&table, &CoverageRequest::default(), &ShapeOptions::default()).unwrap();

        assert!(panel.is_empty());
        assert!(panel.countries.is_empty());
        assert_eq!(panel.year_range, None);
    }

    #[test]
    fn test_coverage_infinite_value_dropped() {
        let table = parse_str(
            "YEAR,COUNTRY,VALUE,VALUE_LO,VALUE_HI\n2020,Peru,81,71,90\n2020,Chad,inf,1,2\n2020,Fiji,-Infinity,1,2\n",
            ',',
        )
        .unwrap();
        let panel = coverage_panel(&table, &CoverageRequest::default(), &ShapeOptions::default()).unwrap();

        assert_eq!(panel.dropped_rows, 2);
        assert_eq!(panel.countries, vec!["Peru"]);
        assert_eq!(panel.top.len(), 1);
    }

    #[test]
    fn test_coverage_zero_top_rejected() {
        let request = CoverageRequest {
            top: Some(0),
            ..Default::default()
        };
        assert!(coverage_panel(&coverage_csv(), &request, &ShapeOptions::default()).is_err());
    }

    #[test]
    fn test_coverage_countries_matches_panel() {
        let source = coverage_csv();
        let panel = coverage_panel(&source, &CoverageRequest::default(), &ShapeOptions::default()).unwrap();
        assert_eq!(coverage_countries(&source).unwrap(), panel.countries);

        let no_bounds = parse_str("year,country,value\n2020,Peru,81\n2020,Chad,\n", ',').unwrap();
        assert_eq!(coverage_countries(&no_bounds).unwrap(), vec!["Peru"]);
    }

    #[test]
    fn test_coverage_is_idempotent() {
        let source = coverage_csv();
        let a = coverage_panel(&source, &CoverageRequest::default(), &ShapeOptions::default()).unwrap();
        let b = coverage_panel(&source, &CoverageRequest::default(), &ShapeOptions::default()).unwrap();
        assert_eq!(a.top, b.top);
        assert_eq!(source, coverage_csv());
    }

    fn burden_csv() -> Table {
        parse_str(
            "region,measure,level,year,rate,ci_low,ci_high\n\
             AFR,incidence,regional,2021,205,180,230\n\
             AFR,incidence,regional,2020,210,185,235\n\
             AFR,mortality,regional,2020,40,35,45\n\
             EUR,incidence,regional,2020,25,22,28\n\
             EUR,incidence,global,2020,x,22,28\n",
            ',',
        )
        .unwrap()
    }

    #[test]
    fn test_burden_series() {
        let panel = burden_panel(&burden_csv(), &BurdenRequest::default(), &ShapeOptions::default()).unwrap();

        assert_eq!(panel.regions, vec!["AFR", "EUR"]);
        assert_eq!(panel.measures, vec!["incidence", "mortality"]);
        assert_eq!(panel.selected_region.as_deref(), Some("AFR"));
        assert_eq!(panel.selected_measure.as_deref(), Some("incidence"));
        assert_eq!(panel.series.len(), 2);
        assert_eq!(panel.series.rows()[0][3], Cell::Number(2020.0));
        assert_eq!(panel.dropped_rows, 1);
    }

    #[test]
    fn test_burden_level_filter() {
        let request = BurdenRequest {
            region: Some("EUR".into()),
            measure: Some("incidence".into()),
            level: Some("global".into()),
        };
        let panel = burden_panel(&burden_csv(), &request, &ShapeOptions::default()).unwrap();
        assert!(panel.is_empty());
    }

    #[test]
    fn test_burden_columns_are_verbatim() {
        let table = parse_str("Region,measure,level,year,rate,ci_low,ci_high\nAFR,i,r,2020,1,1,1", ',').unwrap();
        assert!(burden_panel(&table, &BurdenRequest::default(), &ShapeOptions::default()).is_err());
    }

    fn reduction_csv() -> Table {
        parse_str(
            "country,iso3,year,value\n\
             Peru,PER,2015,100\n\
             Peru,PER,2023,80\n\
             Chad,TCD,2015,0\n\
             Chad,TCD,2023,10\n\
             Fiji,FJI,2023,50\n",
            ',',
        )
        .unwrap()
    }

    #[test]
    fn test_reduction_map() {
        let panel = reduction_panel(&reduction_csv(), &ReductionRequest::default(), &ShapeOptions::default()).unwrap();

        assert_eq!(panel.years, vec![2015, 2023]);
        assert_eq!(panel.map.len(), 2);
        assert_eq!(panel.map.rows()[0][0], Cell::text("Peru"));
        assert_eq!(panel.map.rows()[0][1], Cell::text("PER"));
        assert_eq!(panel.map.rows()[0][4], Cell::Number(20.0));
        // Zero baseline has no defined reduction
        assert!(panel.map.rows()[1][4].is_missing());
    }

    #[test]
    fn test_reduction_rejects_reversed_years() {
        let request = ReductionRequest {
            baseline: Some(2023),
            target: Some(2015),
        };
        let err = reduction_panel(&reduction_csv(), &request, &ShapeOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    fn resistance_csv() -> Table {
        parse_str(
            "region,year,value\n\
             EUR,2021,24\n\
             AFR,2021,2.5\n\
             AFR,2019,3.1\n\
             SEAR,2020,4\n",
            ',',
        )
        .unwrap()
    }

    #[test]
    fn test_resistance_sorted_cells() {
        let panel = resistance_panel(&resistance_csv(), &ResistanceRequest::default(), &ShapeOptions::default()).unwrap();

        assert_eq!(names(&panel.cells, 0), vec!["AFR", "AFR", "EUR", "SEAR"]);
        assert_eq!(panel.cells.rows()[0][1], Cell::Number(2019.0));
        assert_eq!(panel.years, vec![2019, 2020, 2021]);
    }

    #[test]
    fn test_resistance_filters() {
        let request = ResistanceRequest {
            regions: Some(vec!["AFR".into(), "SEAR".into()]),
            from: Some(2020),
            to: None,
        };
        let panel = resistance_panel(&resistance_csv(), &request, &ShapeOptions::default()).unwrap();
        assert_eq!(panel.regions, vec!["AFR", "SEAR"]);
        assert_eq!(panel.cells.len(), 2);
        assert_eq!(panel.available_regions.len(), 3);
    }

    #[test]
    fn test_resistance_no_regions_selected() {
        let request = ResistanceRequest {
            regions: Some(vec![]),
            ..Default::default()
        };
        let panel = resistance_panel(&resistance_csv(), &request, &ShapeOptions::default()).unwrap();
        assert!(panel.is_empty());
        assert!(panel.years.is_empty());
    }

    #[test]
    fn test_coinfection_matched_sample() {
        let table = parse_str(
            "country,year,value\n\
             Japan,2020,1\n\
             Spain,2020,3\n\
             Kenya,2020,40\n\
             Peru,2020,2\n\
             Chad,2020,10\n\
             Chad,2019,30\n",
            ',',
        )
        .unwrap();
        let classifier = Classifier::new(CountryReference::new(["Japan", "Spain"]));

        let all = coinfection_panel(&table, &CoinfectionRequest::default(), &classifier, &ShapeOptions::default()).unwrap();
        assert_eq!(all.developed, vec!["Japan", "Spain"]);
        // Chad averages 20 across both years, Kenya 40
        assert_eq!(all.developing, vec!["Peru", "Chad"]);
        assert_eq!(all.means.len(), 4);
        assert_eq!(all.boxes.len(), 2);

        let request = CoinfectionRequest { year: Some(2020) };
        let one_year = coinfection_panel(&table, &request, &classifier, &ShapeOptions::default()).unwrap();
        assert_eq!(one_year.developing, vec!["Peru", "Chad"]);
        assert_eq!(one_year.sample.len(), 4);
        assert_eq!(one_year.years, vec![2019, 2020]);
    }

    #[test]
    fn test_coinfection_empty() {
        let table = parse_str("country,year,value\nJapan,2020,", ',').unwrap();
        let classifier = Classifier::new(CountryReference::new(["Japan"]));
        let panel = coinfection_panel(&table, &CoinfectionRequest::default(), &classifier, &ShapeOptions::default()).unwrap();

        assert!(panel.is_empty());
        assert!(panel.boxes.is_empty());
    }

    #[test]
    fn test_regional_comparison_join() {
        let out = regional_comparison(&resistance_csv(), &burden_csv(), "incidence").unwrap();

        assert_eq!(out.headers(), &COMPARISON_COLUMNS);
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0][0], Cell::text("AFR"));
        assert_eq!(out.rows()[0][2], Cell::Number(2.5));
        assert_eq!(out.rows()[0][3], Cell::Number(205.0));
    }

    #[test]
    fn test_regional_comparison_missing_column_is_error() {
        let bad = parse_str("region,value\nAFR,1", ',').unwrap();
        assert!(regional_comparison(&bad, &burden_csv(), "incidence").is_err());
    }
}
