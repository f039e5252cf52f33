use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::aggregate::{AggregateResult, aggregate_with};
use crate::data::filter::{ColumnSelection, FilterCriteria, FilteredView, filtered_indices};
use crate::data::model::{Attribute, Dataset};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One user's dashboard state, independent of rendering.
///
/// Sessions share the cached dataset read-only; everything else is owned.
/// Each mutating call recomputes the visible rows and the summaries.
pub struct Session {
    dataset: Arc<Dataset>,
    config: DashboardConfig,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Current column toggles.
    pub columns: ColumnSelection,

    /// Indices of records passing the current filters (cached).
    visible_indices: Vec<usize>,

    /// Summaries over the visible records (cached).
    aggregates: AggregateResult,
}

impl Session {
    /// Start with no filters and every column shown.
    pub fn new(dataset: Arc<Dataset>, config: DashboardConfig) -> Self {
        Self::with_selection(
            dataset,
            config,
            FilterCriteria::default(),
            ColumnSelection::default(),
        )
    }

    /// Start from existing selections, e.g. a request replayed headlessly.
    pub fn with_selection(
        dataset: Arc<Dataset>,
        config: DashboardConfig,
        criteria: FilterCriteria,
        columns: ColumnSelection,
    ) -> Self {
        let mut session = Self {
            dataset,
            config,
            criteria,
            columns,
            visible_indices: Vec::new(),
            aggregates: AggregateResult::default(),
        };
        session.refresh();
        session
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The projected rows for display.
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::new(&self.dataset, self.visible_indices.clone(), &self.columns)
    }

    pub fn aggregates(&self) -> &AggregateResult {
        &self.aggregates
    }

    /// Replace criteria and columns wholesale.
    pub fn apply(&mut self, criteria: FilterCriteria, columns: ColumnSelection) {
        self.criteria = criteria;
        self.columns = columns;
        self.refresh();
    }

    /// Recompute visible rows and summaries from the current selections.
    pub fn refresh(&mut self) {
        self.visible_indices = filtered_indices(&self.dataset, &self.criteria);
        let view = FilteredView::new(&self.dataset, self.visible_indices.clone(), &self.columns);
        self.aggregates = aggregate_with(&view, &self.config.aggregate);
    }

    /// Toggle a single value in an attribute's filter.
    pub fn toggle_filter_value(&mut self, attribute: Attribute, value: &str) {
        self.criteria.toggle(attribute, value);
        self.refresh();
    }

    /// Select every option of an attribute, blank cells included.
    ///
    /// Blank cells are not listed in [`Dataset::options`], so accepting every
    /// listed value would still hide them. Lifting the constraint keeps every row.
    pub fn select_all(&mut self, attribute: Attribute) {
        self.criteria.clear(attribute);
        self.refresh();
    }

    /// Deselect everything in an attribute, lifting its constraint.
    pub fn select_none(&mut self, attribute: Attribute) {
        self.criteria.clear(attribute);
        self.refresh();
    }

    pub fn toggle_subject(&mut self, subject: &str) {
        self.criteria.toggle_subject(subject);
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.criteria.clear_all();
        self.refresh();
    }

    /// Column toggles change only the projection.
    pub fn toggle_column(&mut self, attribute: Attribute) {
        self.columns.toggle(attribute);
    }

    pub fn set_show_subjects(&mut self, show: bool) {
        self.columns.show_subjects = show;
    }
}
