use std::cell::Cell;
use tracing::debug;

use crate::client::ApiClient;
use crate::filter::FilterState;
use crate::models::Ticket;
use crate::services::{Feedback, HttpTransport, ServiceResult};

/// Server-side ticket query that discards responses overtaken by a newer request.
#[derive(Debug, Default)]
pub struct TicketFeed {
    generation: Cell<u64>,
}

impl TicketFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request generation, invalidating all earlier ones.
    pub fn begin(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    /// `Ok(None)` when a later fetch started before this one finished.
    pub async fn fetch<T: HttpTransport, F: Feedback>(
        &self,
        api: &ApiClient<T, F>,
        state: &FilterState,
    ) -> ServiceResult<Option<Vec<Ticket>>> {
        let generation = self.begin();
        let tickets = api.get_tickets(Some(&state.to_query())).await?;
        if !self.is_current(generation) {
            debug!(generation, filter = %state, "dropping stale ticket response");
            return Ok(None);
        }
        Ok(Some(tickets))
    }
}
