use gloo_timers::callback::Timeout;
use js_sys::{Function, Object, Promise, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, HtmlElement, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
};

use loto_dashboard::config::DashboardConfig;
use loto_dashboard::deep_link::{draw_ticket_url, share_url, ticket_selector, DeepLink};
use loto_dashboard::filter::{TicketEntry, TicketFilter, TicketGroup, TicketPage};
use loto_dashboard::models::DrawId;
use loto_dashboard::services::Feedback;

use crate::dom::{closest_target, describe, listen, query_all, query_within, set_display, window};
use crate::feedback::DomFeedback;
use crate::storage::LocalStorageStore;

pub type PageFilter = TicketFilter<DomTicketPage, LocalStorageStore>;

/// The server-rendered ticket list: `.ticket-group[data-draw-id]` blocks holding
/// `.ticket-item[data-ticket-id][data-status]` entries.
pub struct DomTicketPage {
    document: Document,
    groups: RefCell<Vec<Element>>,
}

impl DomTicketPage {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            groups: RefCell::new(Vec::new()),
        }
    }

    fn group(&self, index: usize) -> Option<Element> {
        self.groups.borrow().get(index).cloned()
    }

    fn mark(&self, selector: &str, attribute: &str, value: &str) {
        for control in query_all(&self.document, selector) {
            let selected = control.get_attribute(attribute).as_deref() == Some(value);
            control.class_list().toggle_with_force("active", selected).ok();
        }
    }
}

fn set_hidden(element: &Element, hidden: bool) {
    element.class_list().toggle_with_force("hidden", hidden).ok();
}

impl TicketPage for DomTicketPage {
    fn groups(&self) -> Vec<TicketGroup> {
        let elements = query_all(&self.document, ".ticket-group");
        let groups = elements
            .iter()
            .map(|group| TicketGroup {
                draw_id: group.get_attribute("data-draw-id").unwrap_or_default(),
                entries: query_within(group, ".ticket-item")
                    .iter()
                    .map(|entry| TicketEntry {
                        ticket_id: entry.get_attribute("data-ticket-id").unwrap_or_default(),
                        status: entry.get_attribute("data-status").unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect();
        *self.groups.borrow_mut() = elements;
        groups
    }

    fn set_group_visible(&mut self, group: usize, visible: bool) {
        if let Some(group) = self.group(group) {
            set_hidden(&group, !visible);
        }
    }

    fn set_entry_visible(&mut self, group: usize, entry: usize, visible: bool) {
        let entry = self
            .group(group)
            .and_then(|group| query_within(&group, ".ticket-item").into_iter().nth(entry));
        if let Some(entry) = entry {
            set_hidden(&entry, !visible);
        }
    }

    fn set_group_count(&mut self, group: usize, label: &str) {
        let counter = self
            .group(group)
            .and_then(|group| group.query_selector(".tickets-count").ok().flatten());
        if let Some(counter) = counter {
            counter.set_text_content(Some(label));
        }
    }

    fn set_visible_count(&mut self, count: usize) {
        if let Some(counter) = self.document.get_element_by_id("visible-tickets-count") {
            counter.set_text_content(Some(&count.to_string()));
        }
    }

    fn set_empty_state(&mut self, empty: bool) {
        if let Some(placeholder) = self.document.get_element_by_id("empty-state") {
            placeholder.class_list().toggle_with_force("show", empty).ok();
        }
        if let Some(container) = self.document.get_element_by_id("tickets-container") {
            set_display(&container, if empty { "none" } else { "flex" });
        }
    }

    fn mark_status_control(&mut self, value: &str) {
        self.mark(".filter-btn", "data-status", value);
    }

    fn mark_draw_control(&mut self, value: &str) {
        self.mark(".draw-filter-btn", "data-draw", value);
    }
}

/// Wires the filter controls and the share/open ticket links through one
/// delegated click listener.
pub fn bind_controls(
    document: &Document,
    filter: Rc<RefCell<PageFilter>>,
    feedback: DomFeedback,
) -> Result<(), JsValue> {
    listen(document, "click", move |event| {
        if let Some(button) = closest_target(&event, ".filter-btn[data-status]") {
            event.prevent_default();
            if let Some(status) = button.get_attribute("data-status") {
                filter.borrow_mut().set_status_filter(&status);
            }
        } else if let Some(button) = closest_target(&event, ".draw-filter-btn[data-draw]") {
            event.prevent_default();
            if let Some(draw) = button.get_attribute("data-draw") {
                filter.borrow_mut().set_draw_filter(&draw);
            }
        } else if closest_target(&event, "#clear-filters").is_some() {
            event.prevent_default();
            filter.borrow_mut().clear_filters();
        } else if let Some(link) = closest_target(&event, "[data-share-ticket][data-draw-id]") {
            event.prevent_default();
            if let Some((draw, ticket)) = ticket_reference(&link, "data-share-ticket") {
                share_ticket(feedback.clone(), draw, ticket);
            }
        } else if let Some(link) = closest_target(&event, "[data-open-ticket][data-draw-id]") {
            event.prevent_default();
            if let Some((draw, ticket)) = ticket_reference(&link, "data-open-ticket") {
                open_ticket(draw, ticket);
            }
        }
    })
}

fn ticket_reference(element: &Element, ticket_attribute: &str) -> Option<(DrawId, i64)> {
    let draw = element.get_attribute("data-draw-id")?.trim().parse().ok()?;
    let ticket = element.get_attribute(ticket_attribute)?.trim().parse().ok()?;
    Some((DrawId(draw), ticket))
}

fn open_ticket(draw: DrawId, ticket: i64) {
    let url = draw_ticket_url(draw, ticket);
    let navigated = window().and_then(|window| window.location().set_href(&url));
    if let Err(err) = navigated {
        warn!(%url, error = %describe(&err), "navigation failed");
    }
}

/// Native share sheet when the browser has one, clipboard otherwise.
fn share_ticket(feedback: DomFeedback, draw: DrawId, ticket: i64) {
    spawn_local(async move {
        let shared = try_share(draw, ticket).await;
        match shared {
            Ok(ShareOutcome::Shared) => info!(draw_id = draw.0, ticket, "ticket shared"),
            Ok(ShareOutcome::Copied) => feedback.show_info("Link copied to clipboard"),
            Err(err) => warn!(draw_id = draw.0, ticket, error = %describe(&err), "sharing failed"),
        }
    });
}

enum ShareOutcome {
    Shared,
    Copied,
}

async fn try_share(draw: DrawId, ticket: i64) -> Result<ShareOutcome, JsValue> {
    let window = window()?;
    let url = share_url(&window.location().origin()?, draw, ticket);
    let navigator: JsValue = window.navigator().into();

    if let Ok(share) = Reflect::get(&navigator, &"share".into())?.dyn_into::<Function>() {
        let data = Object::new();
        Reflect::set(&data, &"title".into(), &format!("Ticket #{ticket}").into())?;
        Reflect::set(&data, &"text".into(), &"My lottery ticket".into())?;
        Reflect::set(&data, &"url".into(), &url.as_str().into())?;
        let promise: Promise = share.call1(&navigator, &data)?.dyn_into()?;
        JsFuture::from(promise).await?;
        return Ok(ShareOutcome::Shared);
    }

    let clipboard = Reflect::get(&navigator, &"clipboard".into())?;
    let write_text: Function = Reflect::get(&clipboard, &"writeText".into())?.dyn_into()?;
    let promise: Promise = write_text.call1(&clipboard, &url.as_str().into())?.dyn_into()?;
    JsFuture::from(promise).await?;
    Ok(ShareOutcome::Copied)
}

/// Scrolls to and flashes the ticket named in the URL, after the page settled.
pub fn schedule_highlight(document: Document, link: &DeepLink, config: &DashboardConfig) {
    if link.opens_tickets_tab() {
        let tab = document.query_selector("[data-tab=\"tickets\"]").ok().flatten();
        if let Some(tab) = tab.and_then(|tab| tab.dyn_into::<HtmlElement>().ok()) {
            tab.click();
        }
    }
    let Some(ticket) = link.highlight_target().map(str::to_string) else {
        return;
    };
    let duration_ms = config.highlight_duration_ms;
    Timeout::new(config.highlight_delay_ms, move || {
        let target = document.query_selector(&ticket_selector(&ticket)).ok().flatten();
        let Some(target) = target else {
            warn!(%ticket, "deep-linked ticket not on page");
            return;
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        target.scroll_into_view_with_scroll_into_view_options(&options);
        target.class_list().add_1("highlighted").ok();
        Timeout::new(duration_ms, move || {
            target.class_list().remove_1("highlighted").ok();
        })
        .forget();
    })
    .forget();
}
