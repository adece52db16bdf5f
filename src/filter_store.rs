use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DashboardConfig;
use crate::filter::{DrawFilter, FilterState, StatusFilter};
use crate::services::{Clock, DashboardError, KeyValueStore, ServiceResult};

/// On-disk shape under the filter storage key.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct PersistedFilters {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    draw: Option<String>,
    timestamp: i64,
}

pub struct FilterStore<S, C> {
    store: S,
    clock: C,
    key: String,
    freshness_ms: i64,
}

impl<S: KeyValueStore, C: Clock> FilterStore<S, C> {
    pub fn new(store: S, clock: C, config: &DashboardConfig) -> Self {
        Self {
            store,
            clock,
            key: config.filter_storage_key.clone(),
            freshness_ms: config.filter_freshness_ms,
        }
    }

    pub fn save(&self, state: &FilterState) -> ServiceResult<()> {
        let record = PersistedFilters {
            status: Some(state.status.as_str().to_string()),
            draw: Some(state.draw.as_str().to_string()),
            timestamp: self.clock.now_ms(),
        };
        let raw = serde_json::to_string(&record)
            .map_err(|err| DashboardError::Decode(err.to_string()))?;
        self.store.set_item(&self.key, &raw)
    }

    /// `Ok(None)` when nothing is stored or the record is past the freshness window.
    pub fn load(&self) -> ServiceResult<Option<FilterState>> {
        let Some(raw) = self.store.get_item(&self.key)? else {
            return Ok(None);
        };
        let record: PersistedFilters = serde_json::from_str(&raw)
            .map_err(|err| DashboardError::Decode(err.to_string()))?;
        match self.clock.now_ms().checked_sub(record.timestamp) {
            Some(age) if age < self.freshness_ms => {}
            age => {
                debug!(age_ms = ?age, "saved filters expired");
                return Ok(None);
            }
        }
        Ok(Some(FilterState {
            status: record
                .status
                .as_deref()
                .map(StatusFilter::parse)
                .unwrap_or_default(),
            draw: record
                .draw
                .as_deref()
                .map(DrawFilter::parse)
                .unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TicketStatus;
    use crate::services::memory::{InMemoryStore, ManualClock};

    fn store() -> (FilterStore<InMemoryStore, ManualClock>, InMemoryStore, ManualClock) {
        let backing = InMemoryStore::default();
        let clock = ManualClock::at(1_700_000_000_000);
        let store = FilterStore::new(backing.clone(), clock.clone(), &DashboardConfig::default());
        (store, backing, clock)
    }

    fn winners_of_draw_3() -> FilterState {
        FilterState {
            status: StatusFilter::Only(TicketStatus::Winner),
            draw: DrawFilter::parse("3"),
        }
    }

    #[test]
    fn save_then_load_within_window() {
        let (store, backing, clock) = store();
        store.save(&winners_of_draw_3()).unwrap();
        assert_eq!(
            backing.get_item("ticketFilters").unwrap().unwrap(),
            r#"{"status":"winner","draw":"3","timestamp":1700000000000}"#
        );
        clock.advance(3_599_999);
        assert_eq!(store.load().unwrap(), Some(winners_of_draw_3()));
    }

    #[test]
    fn expired_record_is_ignored() {
        let (store, _, clock) = store();
        store.save(&winners_of_draw_3()).unwrap();
        clock.advance(3_600_000);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn out_of_range_timestamp_is_ignored() {
        let (store, backing, _) = store();
        backing
            .set_item(
                "ticketFilters",
                r#"{"status":"winner","draw":"3","timestamp":-9223372036854775808}"#,
            )
            .unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn missing_fields_default_to_wildcard() {
        let (store, backing, _) = store();
        backing
            .set_item("ticketFilters", r#"{"timestamp":1700000000000,"status":null}"#)
            .unwrap();
        assert_eq!(store.load().unwrap(), Some(FilterState::default()));
    }

    #[test]
    fn malformed_record_is_a_decode_error() {
        let (store, backing, _) = store();
        backing.set_item("ticketFilters", r#"{"status":"winner"}"#).unwrap();
        assert!(matches!(store.load(), Err(DashboardError::Decode(_))));
        backing.set_item("ticketFilters", "not json").unwrap();
        assert!(matches!(store.load(), Err(DashboardError::Decode(_))));
    }

    #[test]
    fn storage_failure_propagates_to_caller() {
        let (store, backing, _) = store();
        backing.set_failing(true);
        assert!(matches!(store.save(&FilterState::default()), Err(DashboardError::Storage(_))));
        assert!(matches!(store.load(), Err(DashboardError::Storage(_))));
    }
}
