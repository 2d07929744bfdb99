//! # Injurylens - aggregation engine for workplace injury dashboards
//!
//! Injurylens turns rows of an incident spreadsheet into the data behind a
//! dashboard: counts per injury type, the top injury per location or body
//! part, and an injury × body part heatmap, with location and year filters
//! and a drill-down on any group.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Parsed rows │────▶│ Normalizer  │────▶│   Filter    │────▶│  Aggregate  │
//! │   (JSON)    │     │ (Dataset)   │     │   (view)    │     │  + Sort     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                     ┌─────────────┐     ┌─────────────┐            │
//!                     │ Chart/Table │◀────│   Session   │◀───────────┘
//!                     │ (external)  │     │  (state)    │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use injurylens::{Session, VisualizationMode};
//!
//! let mut session = Session::default();
//! session.load_dataset(&rows)?;
//! let view = session.set_visualization_mode(VisualizationMode::InjuriesByLocation);
//! for row in view.chart.rows() {
//!     println!("{}: {:?} ({})", row.key, row.dominant, row.count);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per boundary
//! - [`models`] - Fields, values, records, datasets
//! - [`config`] - Column aliases and limits
//! - [`normalizer`] - Rows to records, serial dates
//! - [`filter`] - Location/year filters and lazy views
//! - [`aggregate`] - The single parametrized aggregator
//! - [`sort`] - Stable orderings of aggregated rows
//! - [`session`] - Selection state machine and dashboard view
//! - [`parser`] - Parser collaborator seam
//! - [`export`] - CSV table export
//! - [`logs`] - Log broadcaster

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Data pipeline
pub mod normalizer;
pub mod filter;
pub mod aggregate;
pub mod sort;

// State
pub mod session;

// Collaborators
pub mod parser;
pub mod export;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ExportError,
    MalformedDatasetError,
    ParseError,
    SessionError,
    SessionResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Dataset, Field, FieldValue, Record, UNKNOWN_LABEL};

// =============================================================================
// Re-exports - Config & Normalization
// =============================================================================

pub use config::{ColumnMapping, EngineConfig};
pub use normalizer::{normalize, serial_to_date, NormalizeReport, Normalized};

// =============================================================================
// Re-exports - Filter, Aggregate, Sort
// =============================================================================

pub use filter::{evaluate, filter_options, FilterOptions, FilterSet, FilteredView, Scope};
pub use aggregate::{
    aggregate,
    aggregate_snapshot,
    AggregatedRow,
    Aggregation,
    AggregationResult,
    AggregationSpec,
};
pub use sort::{sort_result, sort_rows, SortOrder};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{
    compute_view,
    Chart,
    ChartView,
    DashboardView,
    DrillDown,
    EmptyAggregationResult,
    LoadOutcome,
    LoadTicket,
    SelectionState,
    Session,
    VisualizationMode,
};

// =============================================================================
// Re-exports - Collaborators
// =============================================================================

pub use parser::{JsonRowParser, RowParser};
pub use export::rows_to_csv;
