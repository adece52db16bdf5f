mod admin_view;
mod dom;
mod feedback;
mod storage;
mod ticket_page;
mod transport;

use std::cell::RefCell;
use std::rc::Rc;
use tracing::{error, info, warn};
use tracing_wasm::WASMLayerConfigBuilder;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, PromiseRejectionEvent};

use loto_dashboard::admin::AdminPanel;
use loto_dashboard::client::ApiClient;
use loto_dashboard::config::DashboardConfig;
use loto_dashboard::deep_link::DeepLink;
use loto_dashboard::filter::TicketFilter;
use loto_dashboard::logging::max_level;
use loto_dashboard::services::Feedback;

use admin_view::{bind_admin_page, DomAdminView};
use dom::{describe, document, listen, window};
use feedback::DomFeedback;
use storage::LocalStorageStore;
use ticket_page::{bind_controls, schedule_highlight, DomTicketPage};
use transport::FetchTransport;

fn main() {
    console_error_panic_hook::set_once();
    let config = load_config();
    tracing_wasm::set_as_global_default_with_config(
        WASMLayerConfigBuilder::new()
            .set_max_level(max_level(&config.log_level))
            .build(),
    );
    if let Err(err) = start(config) {
        error!(error = %describe(&err), "dashboard failed to start");
    }
}

/// Defaults, overridden by the JSON in `<body data-dashboard-config>`, resolved
/// against the page origin.
fn load_config() -> DashboardConfig {
    let raw = document()
        .ok()
        .and_then(|document| document.body())
        .and_then(|body| body.get_attribute("data-dashboard-config"))
        .unwrap_or_default();
    let config = DashboardConfig::from_overrides(&raw).unwrap_or_else(|err| {
        web_sys::console::warn_1(&format!("ignoring dashboard config: {err}").into());
        DashboardConfig::default()
    });
    if !config.base_url.is_empty() {
        return config;
    }
    let origin = window()
        .and_then(|window| window.location().origin())
        .unwrap_or_default();
    config.with_base_url(&origin)
}

fn start(config: DashboardConfig) -> Result<(), JsValue> {
    let document = document()?;
    let feedback = DomFeedback::install(document.clone(), &config)?;
    watch_unhandled_rejections(feedback.clone())?;

    if document.get_element_by_id("draws-table-body").is_some() {
        start_admin(&document, feedback.clone(), &config)?;
    }
    if document.query_selector(".filter-container")?.is_some() {
        start_ticket_page(&document, feedback, &config)?;
    }
    Ok(())
}

fn start_admin(document: &Document, feedback: DomFeedback, config: &DashboardConfig) -> Result<(), JsValue> {
    let api = ApiClient::new(FetchTransport, feedback, config);
    let panel = Rc::new(AdminPanel::new(api, DomAdminView::new(document.clone())));
    bind_admin_page(document, Rc::clone(&panel), config)?;
    spawn_local(async move {
        if panel.load_initial_data().await.is_ok() {
            info!("admin dashboard ready");
        }
    });
    Ok(())
}

fn start_ticket_page(document: &Document, feedback: DomFeedback, config: &DashboardConfig) -> Result<(), JsValue> {
    let mut filter = TicketFilter::new(DomTicketPage::new(document.clone()), LocalStorageStore, config);
    let outcome = filter.init();
    info!(filter = %filter.state(), visible = outcome.visible_total, "ticket filter ready");
    bind_controls(document, Rc::new(RefCell::new(filter)), feedback)?;

    let search = window()?.location().search().unwrap_or_default();
    schedule_highlight(document.clone(), &DeepLink::from_query(&search), config);
    Ok(())
}

fn watch_unhandled_rejections(feedback: DomFeedback) -> Result<(), JsValue> {
    let window = window()?;
    listen(&window, "unhandledrejection", move |event| {
        let reason = event
            .dyn_ref::<PromiseRejectionEvent>()
            .map(|event| describe(&event.reason()))
            .unwrap_or_default();
        warn!(%reason, "unhandled promise rejection");
        feedback.show_error("An unexpected error occurred");
    })
}
