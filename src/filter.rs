use std::fmt;
use tracing::{debug, warn};

use crate::config::DashboardConfig;
use crate::filter_store::FilterStore;
use crate::logging::log_failure;
use crate::models::TicketQuery;
use crate::services::{Clock, KeyValueStore, SystemClock};

/// Wildcard value accepted by both filter dimensions.
pub const ALL: &str = "all";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Active,
    Winner,
    Loser,
}

impl TicketStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "active" => Some(TicketStatus::Active),
            "winner" => Some(TicketStatus::Winner),
            "loser" => Some(TicketStatus::Loser),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Winner => "winner",
            TicketStatus::Loser => "loser",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Active => "Active",
            TicketStatus::Winner => "Winner",
            TicketStatus::Loser => "Loser",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TicketStatus),
}

impl StatusFilter {
    /// Unknown control values fall back to the wildcard.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL {
            return StatusFilter::All;
        }
        match TicketStatus::parse(value) {
            Some(status) => StatusFilter::Only(status),
            None => {
                warn!(value, "unknown status filter, using wildcard");
                StatusFilter::All
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => ALL,
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    pub fn matches(&self, entry_status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => entry_status == status.as_str(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DrawFilter {
    #[default]
    All,
    Only(String),
}

impl DrawFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL {
            DrawFilter::All
        } else {
            DrawFilter::Only(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DrawFilter::All => ALL,
            DrawFilter::Only(draw) => draw,
        }
    }

    pub fn matches(&self, group_draw: &str) -> bool {
        match self {
            DrawFilter::All => true,
            DrawFilter::Only(draw) => group_draw == draw,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub status: StatusFilter,
    pub draw: DrawFilter,
}

impl FilterState {
    pub fn entry_visible(&self, group_draw: &str, entry_status: &str) -> bool {
        self.draw.matches(group_draw) && self.status.matches(entry_status)
    }

    /// Same filter expressed as the `/api/tickets` query.
    pub fn to_query(&self) -> TicketQuery {
        TicketQuery {
            status: self.status.as_str().to_string(),
            draw_id: self.draw.as_str().to_string(),
        }
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status={} draw={}", self.status.as_str(), self.draw.as_str())
    }
}

/// Snapshot of one rendered ticket entry, read from its DOM attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketEntry {
    pub ticket_id: String,
    pub status: String,
}

/// Snapshot of one rendered group of entries sharing a draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketGroup {
    pub draw_id: String,
    pub entries: Vec<TicketEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupOutcome {
    pub visible: bool,
    pub visible_entries: usize,
    /// `None` when the group was rejected by the draw filter and its entries
    /// were left as they were.
    pub entries: Vec<Option<bool>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub groups: Vec<GroupOutcome>,
    pub visible_total: usize,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        self.visible_total == 0
    }
}

/// Pure visibility pass over the rendered groups, in document order.
pub fn evaluate(state: &FilterState, groups: &[TicketGroup]) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    for group in groups {
        if !state.draw.matches(&group.draw_id) {
            outcome.groups.push(GroupOutcome {
                visible: false,
                visible_entries: 0,
                entries: vec![None; group.entries.len()],
            });
            continue;
        }
        let entries: Vec<Option<bool>> = group
            .entries
            .iter()
            .map(|entry| Some(state.status.matches(&entry.status)))
            .collect();
        let visible_entries = entries.iter().filter(|shown| **shown == Some(true)).count();
        outcome.visible_total += visible_entries;
        outcome.groups.push(GroupOutcome {
            visible: visible_entries > 0,
            visible_entries,
            entries,
        });
    }
    outcome
}

pub fn group_count_label(count: usize) -> String {
    format!("{count} tickets")
}

/// The rendered ticket list. Groups and entries are addressed by document order.
pub trait TicketPage {
    fn groups(&self) -> Vec<TicketGroup>;
    fn set_group_visible(&mut self, group: usize, visible: bool);
    fn set_entry_visible(&mut self, group: usize, entry: usize, visible: bool);
    fn set_group_count(&mut self, group: usize, label: &str);
    fn set_visible_count(&mut self, count: usize);
    /// Shows the "no tickets" placeholder and hides the list container, or the reverse.
    fn set_empty_state(&mut self, empty: bool);
    fn mark_status_control(&mut self, value: &str);
    fn mark_draw_control(&mut self, value: &str);

    fn render_outcome(&mut self, outcome: &FilterOutcome) {
        for (index, group) in outcome.groups.iter().enumerate() {
            for (entry, shown) in group.entries.iter().enumerate() {
                if let Some(shown) = shown {
                    self.set_entry_visible(index, entry, *shown);
                }
            }
            self.set_group_visible(index, group.visible);
            if group.visible {
                self.set_group_count(index, &group_count_label(group.visible_entries));
            }
        }
        self.set_visible_count(outcome.visible_total);
        self.set_empty_state(outcome.is_empty());
    }
}

/// Client-side ticket filter: status × draw, persisted between page loads.
pub struct TicketFilter<P, S, C = SystemClock> {
    state: FilterState,
    page: P,
    store: FilterStore<S, C>,
}

impl<P: TicketPage, S: KeyValueStore> TicketFilter<P, S, SystemClock> {
    pub fn new(page: P, store: S, config: &DashboardConfig) -> Self {
        Self::with_clock(page, store, SystemClock, config)
    }
}

impl<P: TicketPage, S: KeyValueStore, C: Clock> TicketFilter<P, S, C> {
    pub fn with_clock(page: P, store: S, clock: C, config: &DashboardConfig) -> Self {
        Self {
            state: FilterState::default(),
            page,
            store: FilterStore::new(store, clock, config),
        }
    }

    /// Restores persisted state and runs the first visibility pass.
    pub fn init(&mut self) -> FilterOutcome {
        self.restore();
        self.apply_filters()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn set_status_filter(&mut self, value: &str) -> FilterOutcome {
        self.state.status = StatusFilter::parse(value);
        self.page.mark_status_control(self.state.status.as_str());
        let outcome = self.apply_filters();
        self.save();
        outcome
    }

    pub fn set_draw_filter(&mut self, value: &str) -> FilterOutcome {
        self.state.draw = DrawFilter::parse(value);
        self.page.mark_draw_control(self.state.draw.as_str());
        let outcome = self.apply_filters();
        self.save();
        outcome
    }

    pub fn clear_filters(&mut self) -> FilterOutcome {
        self.state = FilterState::default();
        self.mark_controls();
        let outcome = self.apply_filters();
        self.save();
        outcome
    }

    /// Full recompute from the current state and the current page content.
    pub fn apply_filters(&mut self) -> FilterOutcome {
        let groups = self.page.groups();
        let outcome = evaluate(&self.state, &groups);
        self.page.render_outcome(&outcome);
        debug!(filter = %self.state, visible = outcome.visible_total, "filters applied");
        outcome
    }

    /// Persists the current state. Storage failures are logged, never returned.
    pub fn save(&self) {
        if let Err(err) = self.store.save(&self.state) {
            log_failure("save_filters", &err);
        }
    }

    /// Loads a fresh persisted state and marks the controls. Does not recompute
    /// visibility; returns whether a saved state was applied.
    pub fn restore(&mut self) -> bool {
        match self.store.load() {
            Ok(Some(state)) => {
                self.state = state;
                self.mark_controls();
                true
            }
            Ok(None) => false,
            Err(err) => {
                log_failure("restore_filters", &err);
                false
            }
        }
    }

    fn mark_controls(&mut self) {
        self.page.mark_status_control(self.state.status.as_str());
        self.page.mark_draw_control(self.state.draw.as_str());
    }
}
