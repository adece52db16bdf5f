use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::logging::log_failure;
use crate::models::{format_amount, Balance, Draw, DrawId, FormPayload, Package, PackageId, Stats, Ticket};
use crate::services::{DashboardError, Feedback, HttpTransport, ServiceResult};
use crate::templates::admin_template::{draw_row, package_row, ticket_row, RowAction, TableRow};

/// Submitted form fields, name → value.
pub type FormFields = BTreeMap<String, String>;

pub const CONFIRM_CONDUCT: &str = "Conduct this draw? This action cannot be undone.";
pub const CONFIRM_DELETE_DRAW: &str = "Are you sure you want to delete this draw?";
pub const CONFIRM_DELETE_PACKAGE: &str = "Are you sure you want to delete this package?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatCounter {
    TotalTickets,
    WinningTickets,
    PendingTickets,
}

impl StatCounter {
    pub const ALL: [StatCounter; 3] = [
        StatCounter::TotalTickets,
        StatCounter::WinningTickets,
        StatCounter::PendingTickets,
    ];

    /// 1-based position of the counter's card on the dashboard.
    pub fn position(&self) -> usize {
        match self {
            StatCounter::TotalTickets => 1,
            StatCounter::WinningTickets => 2,
            StatCounter::PendingTickets => 3,
        }
    }

    fn read(&self, stats: &Stats) -> Option<i64> {
        match self {
            StatCounter::TotalTickets => stats.total_tickets,
            StatCounter::WinningTickets => stats.winning_tickets,
            StatCounter::PendingTickets => stats.pending_tickets,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceMode {
    Set,
    Add,
}

/// DOM side of the admin dashboard.
pub trait AdminView {
    /// Replaces the whole table body.
    fn render_draws(&self, rows: &[TableRow]);
    fn render_packages(&self, rows: &[TableRow]);
    fn render_tickets(&self, rows: &[TableRow]);
    fn show_balance(&self, label: &str);
    fn show_stat(&self, counter: StatCounter, value: i64);
    fn open_draw_modal(&self, draw: Option<&Draw>);
    fn open_package_modal(&self, package: Option<&Package>);
    fn close_draw_modal(&self);
    fn close_package_modal(&self);
    fn clear_balance_input(&self);
    fn confirm(&self, message: &str) -> bool;
    fn is_page_visible(&self) -> bool;
}

pub struct AdminPanel<T, F, V> {
    api: ApiClient<T, F>,
    view: V,
    draws: RefCell<Vec<Draw>>,
    packages: RefCell<Vec<Package>>,
}

pub fn balance_label(balance: f64) -> String {
    format!("{} COINS", format_amount(balance))
}

/// Splits the `id` field off a form. A blank id selects the create path.
pub fn split_form(mut fields: FormFields) -> ServiceResult<(Option<i64>, FormPayload)> {
    let id = match fields.remove("id") {
        Some(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| DashboardError::Validation(format!("invalid id: {raw}")))?,
        ),
        _ => None,
    };
    let payload = fields
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
    Ok((id, payload))
}

fn parse_amount(raw: &str, mode: BalanceMode) -> Option<f64> {
    let amount = raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())?;
    match mode {
        BalanceMode::Set if amount < 0.0 => None,
        BalanceMode::Add if amount <= 0.0 => None,
        _ => Some(amount),
    }
}

impl<T: HttpTransport, F: Feedback, V: AdminView> AdminPanel<T, F, V> {
    pub fn new(api: ApiClient<T, F>, view: V) -> Self {
        Self {
            api,
            view,
            draws: RefCell::new(Vec::new()),
            packages: RefCell::new(Vec::new()),
        }
    }

    pub fn api(&self) -> &ApiClient<T, F> {
        &self.api
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Fetches all five datasets concurrently; renders only if every one succeeded.
    pub async fn load_initial_data(&self) -> ServiceResult<()> {
        let loaded = futures::try_join!(
            self.api.get_draws(),
            self.api.get_packages(),
            self.api.get_tickets(None),
            self.api.get_balance(),
            self.api.get_stats(),
        );
        match loaded {
            Ok((draws, packages, tickets, balance, stats)) => {
                info!(
                    draws = draws.len(),
                    packages = packages.len(),
                    tickets = tickets.len(),
                    "initial admin data loaded"
                );
                self.show_draws(draws);
                self.show_packages(packages);
                self.show_tickets(&tickets);
                self.show_balance(&balance);
                self.show_stats(&stats);
                Ok(())
            }
            Err(err) => {
                log_failure("load_initial_data", &err);
                Err(err)
            }
        }
    }

    pub async fn handle_draw_submit(&self, fields: FormFields) -> ServiceResult<()> {
        let saved = match self.split(fields) {
            Ok((Some(id), payload)) => self.api.update_draw(DrawId(id), &payload).await.map(drop),
            Ok((None, payload)) => self.api.create_draw(&payload).await.map(drop),
            Err(err) => Err(err),
        };
        if let Err(err) = saved {
            log_failure("save_draw", &err);
            return Err(err);
        }
        self.view.close_draw_modal();
        self.refresh_draws_table().await;
        Ok(())
    }

    pub async fn handle_package_submit(&self, fields: FormFields) -> ServiceResult<()> {
        let saved = match self.split(fields) {
            Ok((Some(id), payload)) => {
                self.api.update_package(PackageId(id), &payload).await.map(drop)
            }
            Ok((None, payload)) => self.api.create_package(&payload).await.map(drop),
            Err(err) => Err(err),
        };
        if let Err(err) = saved {
            log_failure("save_package", &err);
            return Err(err);
        }
        self.view.close_package_modal();
        self.refresh_packages_table().await;
        Ok(())
    }

    fn split(&self, fields: FormFields) -> ServiceResult<(Option<i64>, FormPayload)> {
        split_form(fields).inspect_err(|err| self.api.feedback().show_error(&err.to_string()))
    }

    /// Handles a row button. Destructive actions are a no-op unless confirmed.
    pub async fn dispatch(&self, action: RowAction) -> ServiceResult<()> {
        let outcome = match action {
            RowAction::EditDraw(id) => {
                let draw = self.draws.borrow().iter().find(|d| d.id == id).cloned();
                if draw.is_none() {
                    warn!(draw_id = id.0, "edit requested for a draw that is not rendered");
                }
                self.view.open_draw_modal(draw.as_ref());
                Ok(())
            }
            RowAction::EditPackage(id) => {
                let package = self.packages.borrow().iter().find(|p| p.id == id).cloned();
                if package.is_none() {
                    warn!(package_id = id.0, "edit requested for a package that is not rendered");
                }
                self.view.open_package_modal(package.as_ref());
                Ok(())
            }
            RowAction::ConductDraw(id) => {
                if !self.view.confirm(CONFIRM_CONDUCT) {
                    return Ok(());
                }
                match self.api.conduct_draw(id).await {
                    Ok(_) => {
                        self.refresh_draws_table().await;
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            RowAction::DeleteDraw(id) => {
                if !self.view.confirm(CONFIRM_DELETE_DRAW) {
                    return Ok(());
                }
                match self.api.delete_draw(id).await {
                    Ok(()) => {
                        self.refresh_draws_table().await;
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            RowAction::DeletePackage(id) => {
                if !self.view.confirm(CONFIRM_DELETE_PACKAGE) {
                    return Ok(());
                }
                match self.api.delete_package(id).await {
                    Ok(()) => {
                        self.refresh_packages_table().await;
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
        };
        outcome.inspect_err(|err| log_failure(action.data_action(), err))
    }

    /// Validates the balance input, then sets or increments the balance.
    pub async fn submit_balance(&self, raw: &str, mode: BalanceMode) -> ServiceResult<()> {
        let Some(amount) = parse_amount(raw, mode) else {
            let message = match mode {
                BalanceMode::Set => "Enter a valid amount",
                BalanceMode::Add => "Enter a valid amount to add",
            };
            self.api.feedback().show_error(message);
            return Err(DashboardError::Validation(message.into()));
        };
        let updated = match mode {
            BalanceMode::Set => self.api.update_balance(amount).await,
            BalanceMode::Add => self.api.add_balance(amount).await,
        };
        match updated {
            Ok(balance) => {
                self.view.show_balance(&balance_label(balance));
                self.view.clear_balance_input();
                Ok(())
            }
            Err(err) => {
                log_failure("submit_balance", &err);
                Err(err)
            }
        }
    }

    pub async fn refresh_draws_table(&self) {
        match self.api.get_draws().await {
            Ok(draws) => self.show_draws(draws),
            Err(err) => log_failure("refresh_draws", &err),
        }
    }

    pub async fn refresh_packages_table(&self) {
        match self.api.get_packages().await {
            Ok(packages) => self.show_packages(packages),
            Err(err) => log_failure("refresh_packages", &err),
        }
    }

    /// One periodic tick: refreshes the counters while the page is visible.
    /// Returns whether the counters were updated.
    pub async fn refresh_stats(&self) -> bool {
        if !self.view.is_page_visible() {
            return false;
        }
        match self.api.get_stats().await {
            Ok(stats) => {
                self.show_stats(&stats);
                true
            }
            Err(err) => {
                log_failure("refresh_stats", &err);
                false
            }
        }
    }

    fn show_draws(&self, draws: Vec<Draw>) {
        let rows: Vec<TableRow> = draws.iter().map(draw_row).collect();
        self.view.render_draws(&rows);
        *self.draws.borrow_mut() = draws;
    }

    fn show_packages(&self, packages: Vec<Package>) {
        let rows: Vec<TableRow> = packages.iter().map(package_row).collect();
        self.view.render_packages(&rows);
        *self.packages.borrow_mut() = packages;
    }

    fn show_tickets(&self, tickets: &[Ticket]) {
        let rows: Vec<TableRow> = tickets.iter().map(ticket_row).collect();
        self.view.render_tickets(&rows);
    }

    fn show_balance(&self, balance: &Balance) {
        self.view.show_balance(&balance_label(balance.coins));
    }

    fn show_stats(&self, stats: &Stats) {
        for counter in StatCounter::ALL {
            if let Some(value) = counter.read(stats) {
                self.view.show_stat(counter, value);
            }
        }
    }
}
