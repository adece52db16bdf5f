use gloo_timers::callback::Interval;
use js_sys::Reflect;
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlFormElement, HtmlInputElement};

use loto_dashboard::admin::{AdminPanel, AdminView, BalanceMode, FormFields, StatCounter};
use loto_dashboard::config::DashboardConfig;
use loto_dashboard::models::{display_value, Draw, Package};
use loto_dashboard::templates::admin_template::{RowAction, TableRow};

use crate::dom::{closest_target, describe, listen, query_within, set_display, window};
use crate::feedback::DomFeedback;
use crate::transport::FetchTransport;

pub type Panel = AdminPanel<FetchTransport, DomFeedback, DomAdminView>;

const DRAWS_BODY: &str = "#draws-table-body";
const PACKAGES_BODY: &str = "#packages-table-body";
const TICKETS_BODY: &str = "#tickets-section tbody";
const DRAW_MODAL: &str = "draw-modal";
const PACKAGE_MODAL: &str = "package-modal";
const DRAW_FORM: &str = "draw-form";
const PACKAGE_FORM: &str = "package-form";
const BALANCE_INPUT: &str = "new-balance";

pub struct DomAdminView {
    document: Document,
}

impl DomAdminView {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn render_rows(&self, selector: &str, rows: &[TableRow]) {
        let Some(body) = self.document.query_selector(selector).ok().flatten() else {
            warn!(selector, "table body missing from page");
            return;
        };
        body.set_inner_html("");
        for row in rows {
            if let Err(err) = self.append_row(&body, row) {
                warn!(selector, error = %describe(&err), "failed to render row");
            }
        }
    }

    fn append_row(&self, body: &Element, row: &TableRow) -> Result<(), JsValue> {
        let tr = self.document.create_element("tr")?;
        if let Some((name, value)) = &row.data_attribute {
            tr.set_attribute(name, value)?;
        }
        tr.set_inner_html(&row.inner_html());
        body.append_child(&tr)?;
        Ok(())
    }

    fn set_modal(&self, id: &str, open: bool) {
        if let Some(modal) = self.document.get_element_by_id(id) {
            set_display(&modal, if open { "block" } else { "none" });
        }
    }

    /// Resets the form, then copies matching fields of `record` into its named inputs.
    fn fill_form(&self, form_id: &str, record: Option<Value>) {
        let Some(form) = self.document.get_element_by_id(form_id) else {
            warn!(form_id, "form missing from page");
            return;
        };
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
        for field in query_within(&form, "[name]") {
            let Some(name) = field.get_attribute("name") else {
                continue;
            };
            let value = match &record {
                Some(record) => match record.get(&name) {
                    Some(value) => display_value(value),
                    None => continue,
                },
                // hidden inputs survive reset()
                None if name == "id" => String::new(),
                None => continue,
            };
            Reflect::set(&field, &"value".into(), &value.as_str().into()).ok();
        }
    }

    fn stat_element(&self, counter: StatCounter) -> Option<Element> {
        let selector = format!(".stat-card:nth-child({}) .stat-number", counter.position());
        self.document.query_selector(&selector).ok().flatten()
    }
}

impl AdminView for DomAdminView {
    fn render_draws(&self, rows: &[TableRow]) {
        self.render_rows(DRAWS_BODY, rows);
    }

    fn render_packages(&self, rows: &[TableRow]) {
        self.render_rows(PACKAGES_BODY, rows);
    }

    fn render_tickets(&self, rows: &[TableRow]) {
        self.render_rows(TICKETS_BODY, rows);
    }

    fn show_balance(&self, label: &str) {
        if let Some(balance) = self.document.get_element_by_id("display-balance") {
            balance.set_text_content(Some(label));
        }
    }

    fn show_stat(&self, counter: StatCounter, value: i64) {
        if let Some(element) = self.stat_element(counter) {
            element.set_text_content(Some(&value.to_string()));
        }
    }

    fn open_draw_modal(&self, draw: Option<&Draw>) {
        self.fill_form(DRAW_FORM, draw.and_then(|draw| serde_json::to_value(draw).ok()));
        self.set_modal(DRAW_MODAL, true);
    }

    fn open_package_modal(&self, package: Option<&Package>) {
        self.fill_form(
            PACKAGE_FORM,
            package.and_then(|package| serde_json::to_value(package).ok()),
        );
        self.set_modal(PACKAGE_MODAL, true);
    }

    fn close_draw_modal(&self) {
        self.set_modal(DRAW_MODAL, false);
    }

    fn close_package_modal(&self) {
        self.set_modal(PACKAGE_MODAL, false);
    }

    fn clear_balance_input(&self) {
        if let Some(input) = self.balance_input() {
            input.set_value("");
        }
    }

    fn confirm(&self, message: &str) -> bool {
        window()
            .and_then(|window| window.confirm_with_message(message))
            .unwrap_or(false)
    }

    fn is_page_visible(&self) -> bool {
        !self.document.hidden()
    }
}

impl DomAdminView {
    fn balance_input(&self) -> Option<HtmlInputElement> {
        self.document
            .get_element_by_id(BALANCE_INPUT)?
            .dyn_into::<HtmlInputElement>()
            .ok()
    }
}

/// Named, enabled form controls as submitted by the browser. Unchecked boxes are skipped.
fn read_form(form: &Element) -> FormFields {
    let mut fields = FormFields::new();
    for control in query_within(form, "[name]") {
        let Some(name) = control.get_attribute("name") else {
            continue;
        };
        if control.has_attribute("disabled") {
            continue;
        }
        let kind = control.get_attribute("type").unwrap_or_default();
        if matches!(kind.as_str(), "checkbox" | "radio") {
            let checked = Reflect::get(&control, &"checked".into())
                .ok()
                .and_then(|checked| checked.as_bool())
                .unwrap_or(false);
            if !checked {
                continue;
            }
        }
        let value = Reflect::get(&control, &"value".into())
            .ok()
            .and_then(|value| value.as_string())
            .unwrap_or_default();
        fields.insert(name, value);
    }
    fields
}

/// Registers the admin page's listeners and the periodic stats refresh.
pub fn bind_admin_page(
    document: &Document,
    panel: Rc<Panel>,
    config: &DashboardConfig,
) -> Result<(), JsValue> {
    for (form_id, is_draw) in [(DRAW_FORM, true), (PACKAGE_FORM, false)] {
        let Some(form) = document.get_element_by_id(form_id) else {
            debug!(form_id, "form not on page");
            continue;
        };
        let panel = Rc::clone(&panel);
        let target = form.clone();
        listen(&form, "submit", move |event| {
            event.prevent_default();
            let fields = read_form(&target);
            let panel = Rc::clone(&panel);
            spawn_local(async move {
                let saved = if is_draw {
                    panel.handle_draw_submit(fields).await
                } else {
                    panel.handle_package_submit(fields).await
                };
                if saved.is_err() {
                    debug!(form_id, "form left open after failed save");
                }
            });
        })?;
    }

    for (selector, row_attribute) in [(DRAWS_BODY, "data-draw-id"), (PACKAGES_BODY, "data-package-id")] {
        let Some(body) = document.query_selector(selector)? else {
            continue;
        };
        let panel = Rc::clone(&panel);
        listen(&body, "click", move |event| {
            let Some(button) = closest_target(&event, "button[data-action]") else {
                return;
            };
            let action = button
                .closest("tr")
                .ok()
                .flatten()
                .and_then(|row| row.get_attribute(row_attribute))
                .zip(button.get_attribute("data-action"))
                .and_then(|(id, action)| RowAction::from_attributes(row_attribute, &id, &action));
            let Some(action) = action else {
                warn!(row_attribute, "unrecognised row button");
                return;
            };
            let panel = Rc::clone(&panel);
            spawn_local(async move {
                panel.dispatch(action).await.ok();
            });
        })?;
    }

    let open_buttons: [(&str, fn(&Panel)); 2] = [
        ("add-draw-btn", |panel| panel.view().open_draw_modal(None)),
        ("add-package-btn", |panel| panel.view().open_package_modal(None)),
    ];
    for (button_id, open) in open_buttons {
        if let Some(button) = document.get_element_by_id(button_id) {
            let panel = Rc::clone(&panel);
            listen(&button, "click", move |_| open(&panel))?;
        }
    }

    {
        let panel = Rc::clone(&panel);
        listen(document, "click", move |event| {
            if let Some(button) = closest_target(&event, "[data-close-modal]") {
                match button.get_attribute("data-close-modal").as_deref() {
                    Some(DRAW_MODAL) => panel.view().close_draw_modal(),
                    Some(PACKAGE_MODAL) => panel.view().close_package_modal(),
                    other => warn!(?other, "unknown modal"),
                }
            }
        })?;
    }

    for (button_id, mode) in [("update-balance-btn", BalanceMode::Set), ("add-balance-btn", BalanceMode::Add)] {
        let Some(button) = document.get_element_by_id(button_id) else {
            continue;
        };
        let panel = Rc::clone(&panel);
        listen(&button, "click", move |_| {
            let raw = panel
                .view()
                .balance_input()
                .map(|input| input.value())
                .unwrap_or_default();
            let panel = Rc::clone(&panel);
            spawn_local(async move {
                panel.submit_balance(&raw, mode).await.ok();
            });
        })?;
    }

    Interval::new(config.stats_refresh_ms, move || {
        let panel = Rc::clone(&panel);
        spawn_local(async move {
            panel.refresh_stats().await;
        });
    })
    .forget();
    Ok(())
}
