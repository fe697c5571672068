//! # tbdash - data backend for a global tuberculosis analytics dashboard
//!
//! Loads WHO tuberculosis CSV exports and shapes them into the tables each
//! dashboard panel charts: coverage trends and rankings, incidence and
//! mortality, reduction maps, drug resistance, and HIV co-infection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│    Cache    │────▶│   Panels    │──▶ JSON
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  (by path)  │     │  (shaping)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tbdash::{CoverageRequest, Dashboard, DashboardConfig};
//!
//! let dashboard = Dashboard::new(DashboardConfig::from_env()?);
//! let panel = dashboard.coverage(&CoverageRequest::default())?;
//! println!("Top {} for {:?}", panel.top.len(), panel.selected_year);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, tables, development status
//! - [`parser`] - CSV parsing with auto-detection
//! - [`config`] - Environment configuration and the country reference set
//! - [`cache`] - Parsed dataset cache
//! - [`transform`] - Column resolution, coercion, ranking, classification, panels
//! - [`validation`] - Output contract (JSON Schema)
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Configuration
pub mod config;

// Caching
pub mod cache;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, PipelineError, PipelineResult, ServerError, ShapeError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, DevelopmentStatus, Row, Table};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto, parse_str,
    ParseResult,
};

// =============================================================================
// Re-exports - Configuration and cache
// =============================================================================

pub use cache::{format_delimiter, CsvInfo, DatasetCache};
pub use config::{CountryReference, DashboardConfig, DEVELOPED_COUNTRIES};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    BurdenPanel, BurdenRequest, Classifier, CoinfectionPanel, CoinfectionRequest, ComparisonPanel, CoveragePanel,
    CoverageRequest, Dashboard, ReductionPanel, ReductionRequest, ResistancePanel, ResistanceRequest,
    ShapeOptions,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, PanelResponse, PanelStatus};

// Server
pub use api::server::start_server;
