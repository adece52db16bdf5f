//! Browser-side layer of the lottery admin dashboard: the JSON request client,
//! toast notifications, the admin panel controller and the ticket filter.
//!
//! Everything here is target independent. The DOM, `fetch` and `localStorage`
//! bindings live in the `frontend` crate and plug in through the traits in
//! [`services`], [`filter::TicketPage`] and [`admin::AdminView`].

pub mod admin;
pub mod client;
pub mod config;
pub mod deep_link;
pub mod filter;
pub mod filter_store;
pub mod logging;
pub mod models;
pub mod notify;
pub mod services;
pub mod templates;
pub mod ticket_feed;

pub use admin::{AdminPanel, AdminView, BalanceMode};
pub use client::ApiClient;
pub use config::DashboardConfig;
pub use filter::{TicketFilter, TicketPage};
pub use services::{DashboardError, ServiceResult};
