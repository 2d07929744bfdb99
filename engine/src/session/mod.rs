//! Dashboard session: the selection state machine.
//!
//! A [`Session`] owns the current dataset and [`SelectionState`] and
//! recomputes the [`DashboardView`] after every transition. Transitions that
//! fail return an error and leave the session exactly as it was.
//!
//! Loading is split in two so that parsing can run elsewhere:
//!
//! ```text
//!   begin_load() ──► LoadTicket { generation }
//!                         │
//!        parser (async)   │
//!                         ▼
//!   complete_load(ticket, rows) ──► Applied      (ticket is current)
//!                               └─► Superseded   (a later load or reset won)
//! ```

pub mod mode;
pub mod state;
pub mod view;

pub use mode::{AxisLabels, VisualizationMode};
pub use state::SelectionState;
pub use view::{compute_view, Chart, ChartView, DashboardView, DrillDown, EmptyAggregationResult};

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{ParseResult, SessionError, SessionResult};
use crate::filter::{filter_options, FilterOptions, FilterSet};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::models::Dataset;
use crate::normalizer::{normalize, NormalizeReport};
use crate::parser::RowParser;
use crate::sort::SortOrder;

/// Handle for one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`Session::complete_load`] did with a parse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The dataset was replaced.
    Applied,
    /// A later load or reset was started; the result was dropped.
    Superseded,
}

/// One user's dashboard.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    config: EngineConfig,
    dataset: Arc<Dataset>,
    report: Option<NormalizeReport>,
    loaded_at: Option<DateTime<Utc>>,
    state: SelectionState,
    view: DashboardView,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let dataset = Arc::new(Dataset::empty());
        let state = SelectionState::default();
        let view = compute_view(&dataset, &state);
        Self {
            id: Uuid::new_v4(),
            config,
            dataset,
            report: None,
            loaded_at: None,
            state,
            view,
            generation: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Start a load. Any ticket issued earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        log_info(format!("[{}] Load #{} started", self.short_id(), self.generation));
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply a parse result for `ticket`.
    ///
    /// A stale ticket is discarded whatever its result. Otherwise a parse
    /// error or malformed rows are returned and the session keeps its
    /// previous dataset and state; valid rows replace the dataset and reset
    /// the selection.
    pub fn complete_load(&mut self, ticket: LoadTicket, parsed: ParseResult<Value>) -> SessionResult<LoadOutcome> {
        if ticket.generation != self.generation {
            log_warning(format!(
                "[{}] Discarding load #{} (superseded by #{})",
                self.short_id(),
                ticket.generation,
                self.generation
            ));
            return Ok(LoadOutcome::Superseded);
        }

        let rows = parsed.map_err(|e| {
            log_error(format!("[{}] Parse failed: {}", self.short_id(), e));
            SessionError::from(e)
        })?;
        self.apply_rows(&rows)?;
        Ok(LoadOutcome::Applied)
    }

    /// Replace the dataset with already-parsed rows.
    pub fn load_dataset(&mut self, rows: &Value) -> SessionResult<&DashboardView> {
        let ticket = self.begin_load();
        self.complete_load(ticket, Ok(rows.clone()))?;
        Ok(&self.view)
    }

    /// Parse `bytes` with `parser` and load the result.
    pub async fn load_with<P: RowParser>(&mut self, parser: &P, bytes: Vec<u8>) -> SessionResult<LoadOutcome> {
        let ticket = self.begin_load();
        let parsed = parser.parse(bytes).await;
        self.complete_load(ticket, parsed)
    }

    fn apply_rows(&mut self, rows: &Value) -> SessionResult<()> {
        let normalized = normalize(rows, &self.config.columns).map_err(|e| {
            log_error(format!("[{}] {}", self.short_id(), e));
            SessionError::from(e)
        })?;
        normalized.report.log();

        self.dataset = Arc::new(normalized.dataset);
        self.report = Some(normalized.report);
        self.loaded_at = Some(Utc::now());
        self.recompute(SelectionState::default());

        log_success(format!(
            "[{}] Loaded {} records",
            self.short_id(),
            self.dataset.len()
        ));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Selection transitions
    // -------------------------------------------------------------------------

    pub fn set_visualization_mode(&mut self, mode: VisualizationMode) -> &DashboardView {
        log_info(format!("[{}] Mode: {}", self.short_id(), mode));
        let next = self.state.with_mode(mode);
        self.recompute(next)
    }

    pub fn set_filters(&mut self, filters: FilterSet) -> &DashboardView {
        log_info(format!(
            "[{}] Filters: {} location(s), {} year(s)",
            self.short_id(),
            filters.locations.len(),
            filters.years.len()
        ));
        let next = self.state.with_filters(filters);
        self.recompute(next)
    }

    /// Reorder; a selected group stays selected.
    pub fn set_sort(&mut self, sort: SortOrder) -> &DashboardView {
        log_info(format!("[{}] Sort: {}", self.short_id(), sort));
        let next = self.state.with_sort(sort);
        self.recompute(next)
    }

    /// Open the detail panel for a group of the current chart.
    ///
    /// # Errors
    /// [`SessionError::UnknownGroup`] if the chart has no group `key`.
    pub fn select_item(&mut self, key: &str) -> SessionResult<&DashboardView> {
        if !self.view.chart.contains_key(key) {
            log_warning(format!("[{}] No group '{}' in {}", self.short_id(), key, self.state.mode));
            return Err(SessionError::UnknownGroup(key.to_string()));
        }
        log_info(format!("[{}] Selected '{}'", self.short_id(), key));
        let next = self.state.with_drill_down(key);
        Ok(self.recompute(next))
    }

    pub fn clear_selection(&mut self) -> &DashboardView {
        let next = self.state.without_drill_down();
        self.recompute(next)
    }

    /// Back to the initial state; the dataset is dropped and pending loads
    /// become stale.
    pub fn reset(&mut self) -> &DashboardView {
        self.generation += 1;
        self.dataset = Arc::new(Dataset::empty());
        self.report = None;
        self.loaded_at = None;
        log_info(format!("[{}] Reset", self.short_id()));
        self.recompute(SelectionState::default())
    }

    fn recompute(&mut self, next: SelectionState) -> &DashboardView {
        self.view = compute_view(&self.dataset, &next);
        // the view drops a selection that no longer resolves
        self.state = self.view.state.clone();
        &self.view
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    /// Snapshot of the current dataset, for aggregation off this thread.
    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset)
    }

    /// Defects found in the last successful load.
    pub fn report(&self) -> Option<&NormalizeReport> {
        self.report.as_ref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn filter_options(&self) -> FilterOptions {
        filter_options(&self.dataset)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
