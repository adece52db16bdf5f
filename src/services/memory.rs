//! In-process stand-ins for the browser seams, used by tests and local tooling.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::admin::{AdminView, StatCounter};
use crate::filter::{TicketGroup, TicketPage};
use crate::models::{Draw, Package};
use crate::notify::ToastKind;
use crate::services::{
    ApiRequest, ApiResponse, Clock, DashboardError, Feedback, HttpTransport, KeyValueStore,
    Method, ServiceResult,
};
use crate::templates::admin_template::TableRow;

fn locked<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct TransportState {
    routes: HashMap<(Method, String), ServiceResult<ApiResponse>>,
    requests: Vec<ApiRequest>,
}

/// Canned responses keyed by method and path (query included).
/// Unregistered routes answer 404 with a JSON error body.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<Mutex<TransportState>>,
}

impl InMemoryTransport {
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, ApiResponse::new(status, body.to_string()));
    }

    pub fn respond_raw(&self, method: Method, path: &str, response: ApiResponse) {
        locked(&self.state)
            .routes
            .insert((method, path.to_string()), Ok(response));
    }

    pub fn fail(&self, method: Method, path: &str, error: DashboardError) {
        locked(&self.state)
            .routes
            .insert((method, path.to_string()), Err(error));
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        locked(&self.state).requests.clone()
    }
}

#[async_trait(?Send)]
impl HttpTransport for InMemoryTransport {
    async fn send(&self, request: ApiRequest) -> ServiceResult<ApiResponse> {
        let mut state = locked(&self.state);
        let key = (request.method, request.path().to_string());
        state.requests.push(request);
        match state.routes.get(&key) {
            Some(outcome) => outcome.clone(),
            None => Ok(ApiResponse::new(404, json!({ "error": "not found" }).to_string())),
        }
    }
}

#[derive(Default)]
struct FeedbackLog {
    loading: Vec<bool>,
    toasts: Vec<(ToastKind, String)>,
}

#[derive(Clone, Default)]
pub struct RecordingFeedback {
    log: Arc<Mutex<FeedbackLog>>,
}

impl RecordingFeedback {
    pub fn loading_transitions(&self) -> Vec<bool> {
        locked(&self.log).loading.clone()
    }

    pub fn toasts(&self) -> Vec<(ToastKind, String)> {
        locked(&self.log).toasts.clone()
    }
}

impl Feedback for RecordingFeedback {
    fn set_loading(&self, visible: bool) {
        locked(&self.log).loading.push(visible);
    }

    fn notify(&self, kind: ToastKind, message: &str) {
        locked(&self.log).toasts.push((kind, message.to_string()));
    }
}

#[derive(Default)]
struct StoreState {
    items: HashMap<String, String>,
    failing: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// While set, every read and write fails with a storage error.
    pub fn set_failing(&self, failing: bool) {
        locked(&self.state).failing = failing;
    }
}

impl KeyValueStore for InMemoryStore {
    fn get_item(&self, key: &str) -> ServiceResult<Option<String>> {
        let state = locked(&self.state);
        if state.failing {
            return Err(DashboardError::Storage("store unavailable".into()));
        }
        Ok(state.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> ServiceResult<()> {
        let mut state = locked(&self.state);
        if state.failing {
            return Err(DashboardError::Storage("store unavailable".into()));
        }
        state.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<Mutex<i64>>,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(Mutex::new(now_ms)),
        }
    }

    pub fn advance(&self, ms: i64) {
        *locked(&self.now_ms) += ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        *locked(&self.now_ms)
    }
}

/// One rendered group with the display state the filter has written to it.
#[derive(Clone, Debug, PartialEq)]
pub struct PageGroup {
    pub group: TicketGroup,
    pub hidden: bool,
    pub entry_hidden: Vec<bool>,
    pub count_label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryTicketPage {
    pub groups: Vec<PageGroup>,
    pub visible_count: Option<usize>,
    pub empty_state: bool,
    pub status_marker: Option<String>,
    pub draw_marker: Option<String>,
}

impl InMemoryTicketPage {
    pub fn new(groups: Vec<TicketGroup>) -> Self {
        Self {
            groups: groups
                .into_iter()
                .map(|group| PageGroup {
                    entry_hidden: vec![false; group.entries.len()],
                    group,
                    hidden: false,
                    count_label: None,
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Ticket ids a user would see: entry shown inside a shown group.
    pub fn visible_ticket_ids(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|page_group| !page_group.hidden)
            .flat_map(|page_group| {
                page_group
                    .group
                    .entries
                    .iter()
                    .zip(&page_group.entry_hidden)
                    .filter(|(_, hidden)| !**hidden)
                    .map(|(entry, _)| entry.ticket_id.clone())
            })
            .collect()
    }
}

impl TicketPage for InMemoryTicketPage {
    fn groups(&self) -> Vec<TicketGroup> {
        self.groups.iter().map(|page_group| page_group.group.clone()).collect()
    }

    fn set_group_visible(&mut self, group: usize, visible: bool) {
        if let Some(page_group) = self.groups.get_mut(group) {
            page_group.hidden = !visible;
        }
    }

    fn set_entry_visible(&mut self, group: usize, entry: usize, visible: bool) {
        if let Some(hidden) = self
            .groups
            .get_mut(group)
            .and_then(|page_group| page_group.entry_hidden.get_mut(entry))
        {
            *hidden = !visible;
        }
    }

    fn set_group_count(&mut self, group: usize, label: &str) {
        if let Some(page_group) = self.groups.get_mut(group) {
            page_group.count_label = Some(label.to_string());
        }
    }

    fn set_visible_count(&mut self, count: usize) {
        self.visible_count = Some(count);
    }

    fn set_empty_state(&mut self, empty: bool) {
        self.empty_state = empty;
    }

    fn mark_status_control(&mut self, value: &str) {
        self.status_marker = Some(value.to_string());
    }

    fn mark_draw_control(&mut self, value: &str) {
        self.draw_marker = Some(value.to_string());
    }
}

/// Everything the admin panel has pushed to its view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdminViewLog {
    pub draw_rows: Option<Vec<TableRow>>,
    pub package_rows: Option<Vec<TableRow>>,
    pub ticket_rows: Option<Vec<TableRow>>,
    pub balance_label: Option<String>,
    pub stats: Vec<(StatCounter, i64)>,
    /// `Some(None)` for a blank create modal.
    pub draw_modal: Option<Option<Draw>>,
    pub package_modal: Option<Option<Package>>,
    pub draw_modal_closed: usize,
    pub package_modal_closed: usize,
    pub balance_input_cleared: usize,
    pub confirmations: Vec<String>,
}

struct AdminViewState {
    log: AdminViewLog,
    confirm_answer: bool,
    page_visible: bool,
}

#[derive(Clone)]
pub struct RecordingAdminView {
    state: Arc<Mutex<AdminViewState>>,
}

impl Default for RecordingAdminView {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(AdminViewState {
                log: AdminViewLog::default(),
                confirm_answer: true,
                page_visible: true,
            })),
        }
    }
}

impl RecordingAdminView {
    pub fn set_confirm_answer(&self, answer: bool) {
        locked(&self.state).confirm_answer = answer;
    }

    pub fn set_page_visible(&self, visible: bool) {
        locked(&self.state).page_visible = visible;
    }

    pub fn log(&self) -> AdminViewLog {
        locked(&self.state).log.clone()
    }
}

impl AdminView for RecordingAdminView {
    fn render_draws(&self, rows: &[TableRow]) {
        locked(&self.state).log.draw_rows = Some(rows.to_vec());
    }

    fn render_packages(&self, rows: &[TableRow]) {
        locked(&self.state).log.package_rows = Some(rows.to_vec());
    }

    fn render_tickets(&self, rows: &[TableRow]) {
        locked(&self.state).log.ticket_rows = Some(rows.to_vec());
    }

    fn show_balance(&self, label: &str) {
        locked(&self.state).log.balance_label = Some(label.to_string());
    }

    fn show_stat(&self, counter: StatCounter, value: i64) {
        locked(&self.state).log.stats.push((counter, value));
    }

    fn open_draw_modal(&self, draw: Option<&Draw>) {
        locked(&self.state).log.draw_modal = Some(draw.cloned());
    }

    fn open_package_modal(&self, package: Option<&Package>) {
        locked(&self.state).log.package_modal = Some(package.cloned());
    }

    fn close_draw_modal(&self) {
        locked(&self.state).log.draw_modal_closed += 1;
    }

    fn close_package_modal(&self) {
        locked(&self.state).log.package_modal_closed += 1;
    }

    fn clear_balance_input(&self) {
        locked(&self.state).log.balance_input_cleared += 1;
    }

    fn confirm(&self, message: &str) -> bool {
        let mut state = locked(&self.state);
        state.log.confirmations.push(message.to_string());
        state.confirm_answer
    }

    fn is_page_visible(&self) -> bool {
        locked(&self.state).page_visible
    }
}
