//! High-level pipeline API: load a dataset through the cache, shape one panel.
//!
//! # Example
//!
//! ```rust,ignore
//! use tbdash::config::DashboardConfig;
//! use tbdash::transform::{CoverageRequest, Dashboard};
//!
//! let dashboard = Dashboard::new(DashboardConfig::from_env()?);
//! let panel = dashboard.coverage(&CoverageRequest::default())?;
//! println!("{} bars", panel.top.len());
//! ```

use std::path::Path;
use std::sync::Arc;

use super::classify::Classifier;
use super::panels::{
    burden_panel, coinfection_panel, coverage_countries, coverage_panel, empty_comparison, reduction_panel,
    regional_comparison, resistance_panel, BurdenPanel, BurdenRequest, CoinfectionPanel, CoinfectionRequest, ComparisonPanel,
    CoveragePanel, CoverageRequest, Panel, ReductionPanel, ReductionRequest, ResistancePanel, ResistanceRequest,
    ShapeOptions,
};
use crate::api::logs::{log_error, log_info, log_success};
use crate::cache::{CsvInfo, DatasetCache, LoadedTable};
use crate::config::{CountryReference, DashboardConfig};
use crate::error::PipelineResult;
use crate::models::Table;

/// Every dataset the dashboard reads, plus the shared load cache.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    cache: DatasetCache,
    classifier: Classifier,
}

impl Dashboard {
    /// Dashboard over the WHO developed-country reference list.
    pub fn new(config: DashboardConfig) -> Self {
        Self::with_reference(config, CountryReference::who_developed())
    }

    pub fn with_reference(config: DashboardConfig, reference: CountryReference) -> Self {
        Self {
            config,
            cache: DatasetCache::new(),
            classifier: Classifier::new(reference),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    fn options(&self) -> ShapeOptions {
        ShapeOptions {
            default_top_n: self.config.top_n,
            skip_validation: self.config.skip_validation,
        }
    }

    fn load(&self, path: &Path) -> PipelineResult<Arc<LoadedTable>> {
        Ok(self.cache.get_or_load(path)?)
    }

    fn finish<P: Panel>(panel: P) -> P {
        if panel.is_empty() {
            log_info(format!("{}: nothing to draw for this selection", P::NAME));
        } else {
            log_success(format!("{} panel ready", P::NAME));
        }
        panel
    }

    /// Treatment-coverage trend and ranking.
    pub fn coverage(&self, request: &CoverageRequest) -> PipelineResult<CoveragePanel> {
        let loaded = self.load(&self.config.coverage_path())?;
        coverage_panel(&loaded.table, request, &self.options()).map(Self::finish)
    }

    /// Incidence/mortality trend.
    pub fn burden(&self, request: &BurdenRequest) -> PipelineResult<BurdenPanel> {
        let loaded = self.load(&self.config.burden_path())?;
        burden_panel(&loaded.table, request, &self.options()).map(Self::finish)
    }

    /// Reduction choropleth.
    pub fn reduction(&self, request: &ReductionRequest) -> PipelineResult<ReductionPanel> {
        let loaded = self.load(&self.config.reduction_path())?;
        reduction_panel(&loaded.table, request, &self.options()).map(Self::finish)
    }

    /// RR-TB heatmap.
    pub fn resistance(&self, request: &ResistanceRequest) -> PipelineResult<ResistancePanel> {
        let loaded = self.load(&self.config.resistance_path())?;
        resistance_panel(&loaded.table, request, &self.options()).map(Self::finish)
    }

    /// Developed vs Developing HIV co-infection comparison.
    pub fn coinfection(&self, request: &CoinfectionRequest) -> PipelineResult<CoinfectionPanel> {
        let loaded = self.load(&self.config.coinfection_path())?;
        coinfection_panel(&loaded.table, request, &self.classifier, &self.options()).map(Self::finish)
    }

    /// Resistance joined with the burden rate of the configured measure.
    ///
    /// Never fails: any load or shape error is logged and yields an empty table.
    pub fn comparison(&self) -> ComparisonPanel {
        let measure = self.config.comparison_measure.clone();
        let rows = match self.try_comparison(&measure) {
            Ok(rows) => rows,
            Err(e) => {
                log_error(format!("Regional comparison unavailable: {}", e));
                empty_comparison()
            }
        };
        Self::finish(ComparisonPanel { measure, rows })
    }

    fn try_comparison(&self, measure: &str) -> PipelineResult<Table> {
        let resistance = self.load(&self.config.resistance_path())?;
        let burden = self.load(&self.config.burden_path())?;
        regional_comparison(&resistance.table, &burden.table, measure)
    }

    /// Sorted country list of the coverage dataset, for the selector.
    pub fn countries(&self) -> PipelineResult<Vec<String>> {
        let loaded = self.load(&self.config.coverage_path())?;
        coverage_countries(&loaded.table)
    }

    /// Metadata of every dataset loaded so far.
    pub fn datasets(&self) -> Vec<CsvInfo> {
        self.cache.list()
    }

    /// Drop every cached dataset so the next request re-reads the files.
    pub fn reload(&self) {
        self.cache.clear();
        log_info("Dataset cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, PipelineError};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn dashboard(dir: &TempDir) -> Dashboard {
        let config = DashboardConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        Dashboard::with_reference(config, CountryReference::new(["Japan"]))
    }

    #[test]
    fn test_coverage_through_cache() {
        let dir = tempdir().unwrap();
        write(&dir, "visual3.csv", "year,country,value,value_lo,value_hi\n2020,Peru,81,71,90\n");
        let dash = dashboard(&dir);

        let panel = dash.coverage(&CoverageRequest::default()).unwrap();
        assert_eq!(panel.selected_country.as_deref(), Some("Peru"));
        assert_eq!(dash.cache().len(), 1);

        assert_eq!(dash.countries().unwrap(), vec!["Peru"]);
        assert_eq!(dash.cache().len(), 1);
    }

    #[test]
    fn test_countries_without_uncertainty_columns() {
        let dir = tempdir().unwrap();
        write(&dir, "visual3.csv", "YEAR,COUNTRY,VALUE\n2020,Peru,81\n2020,Chad,80\n2021,Peru,N/A\n");
        let dash = dashboard(&dir);

        assert_eq!(dash.countries().unwrap(), vec!["Chad", "Peru"]);
        assert!(dash.coverage(&CoverageRequest::default()).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let err = dashboard(&dir).burden(&BurdenRequest::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(CsvError::IoError { .. })));
    }

    #[test]
    fn test_comparison_falls_back_to_empty() {
        let dir = tempdir().unwrap();
        write(&dir, "visual4.csv", "region,year,value\nAFR,2020,3\n");
        let panel = dashboard(&dir).comparison();

        assert!(panel.is_empty());
        assert_eq!(panel.rows.headers().len(), 4);
        assert_eq!(panel.measure, "incidence");
    }

    #[test]
    fn test_comparison_joins() {
        let dir = tempdir().unwrap();
        write(&dir, "visual4.csv", "region,year,value\nAFR,2020,3\n");
        write(
            &dir,
            "visual1.csv",
            "region,measure,level,year,rate,ci_low,ci_high\nAFR,incidence,regional,2020,210,185,235\n",
        );
        let panel = dashboard(&dir).comparison();
        assert_eq!(panel.rows.len(), 1);
    }

    #[test]
    fn test_coinfection_uses_injected_reference() {
        let dir = tempdir().unwrap();
        write(&dir, "visual5.csv", "country,year,value\nJapan,2020,1\nKenya,2020,30\nPeru,2020,5\n");
        let panel = dashboard(&dir).coinfection(&CoinfectionRequest::default()).unwrap();

        assert_eq!(panel.developed, vec!["Japan"]);
        assert_eq!(panel.developing, vec!["Peru"]);
    }

    #[test]
    fn test_reload_clears_cache() {
        let dir = tempdir().unwrap();
        write(&dir, "visual4.csv", "region,year,value\nAFR,2020,3\n");
        let dash = dashboard(&dir);

        dash.resistance(&ResistanceRequest::default()).unwrap();
        assert_eq!(dash.datasets().len(), 1);
        dash.reload();
        assert!(dash.datasets().is_empty());
    }
}
