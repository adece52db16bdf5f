use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use loto_dashboard::config::DashboardConfig;
use loto_dashboard::notify::{NotificationCenter, ToastId, ToastKind};
use loto_dashboard::services::{Clock, Feedback, SystemClock};
use loto_dashboard::templates::toast_template::{
    toast_html, toast_style, KEYFRAMES, LOADER_HTML, LOADER_ID, LOADER_STYLE, LOADER_STYLE_ID,
};

use crate::dom::{closest_target, describe, listen, set_display};

struct ToastLayer {
    document: Document,
    center: RefCell<NotificationCenter>,
    elements: RefCell<Vec<(ToastId, Element)>>,
    duration_ms: u32,
    fade_ms: u32,
}

/// Loading overlay and toast stack rendered into the page.
#[derive(Clone)]
pub struct DomFeedback {
    layer: Rc<ToastLayer>,
}

impl DomFeedback {
    /// Injects the overlay and animation styles once and wires toast close buttons.
    pub fn install(document: Document, config: &DashboardConfig) -> Result<Self, JsValue> {
        if document.get_element_by_id(LOADER_STYLE_ID).is_none() {
            let style = document.create_element("style")?;
            style.set_id(LOADER_STYLE_ID);
            style.set_text_content(Some(KEYFRAMES));
            if let Some(head) = document.head() {
                head.append_child(&style)?;
            }
        }
        if document.get_element_by_id(LOADER_ID).is_none() {
            let loader = document.create_element("div")?;
            loader.set_id(LOADER_ID);
            loader.set_attribute("style", LOADER_STYLE)?;
            loader.set_inner_html(LOADER_HTML);
            if let Some(body) = document.body() {
                body.append_child(&loader)?;
            }
        }

        let feedback = Self {
            layer: Rc::new(ToastLayer {
                document: document.clone(),
                center: RefCell::new(NotificationCenter::new(config)),
                elements: RefCell::new(Vec::new()),
                duration_ms: u32::try_from(config.toast_duration_ms).unwrap_or(u32::MAX),
                fade_ms: u32::try_from(config.toast_fade_ms).unwrap_or(0),
            }),
        };

        let layer = Rc::clone(&feedback.layer);
        listen(&document, "click", move |event| {
            let Some(button) = closest_target(&event, "[data-toast-close]") else {
                return;
            };
            let id = button
                .get_attribute("data-toast-close")
                .and_then(|raw| raw.parse::<u64>().ok())
                .map(ToastId);
            if let Some(id) = id {
                if layer.center.borrow_mut().dismiss(id) {
                    layer.fade_out(id);
                }
            }
        })?;
        Ok(feedback)
    }
}

impl ToastLayer {
    fn attach(&self, id: ToastId) -> Result<(), JsValue> {
        let center = self.center.borrow();
        let Some((offset, toast)) = center.live().enumerate().find(|(_, toast)| toast.id == id)
        else {
            return Ok(());
        };
        let element = self.document.create_element("div")?;
        element.set_class_name(toast.kind.css_class());
        element.set_attribute("style", &toast_style(toast, offset))?;
        element.set_inner_html(&toast_html(toast));
        if let Some(body) = self.document.body() {
            body.append_child(&element)?;
        }
        self.elements.borrow_mut().push((id, element));
        Ok(())
    }

    /// Slides the toast out, then removes it and closes the gap.
    fn fade_out(self: &Rc<Self>, id: ToastId) {
        let element = self
            .elements
            .borrow()
            .iter()
            .find(|(toast_id, _)| *toast_id == id)
            .map(|(_, element)| element.clone());
        let Some(element) = element else {
            return;
        };
        if let Some(element) = element.dyn_ref::<HtmlElement>() {
            let animation = format!("slideOutRight {}ms ease-in", self.fade_ms);
            element.style().set_property("animation", &animation).ok();
        }
        let layer = Rc::clone(self);
        Timeout::new(self.fade_ms, move || layer.remove(id)).forget();
    }

    fn remove(&self, id: ToastId) {
        self.elements.borrow_mut().retain(|(toast_id, element)| {
            if *toast_id == id {
                element.remove();
                false
            } else {
                true
            }
        });
        self.restack();
    }

    fn restack(&self) {
        let center = self.center.borrow();
        let elements = self.elements.borrow();
        for (offset, toast) in center.live().enumerate() {
            let element = elements
                .iter()
                .find(|(toast_id, _)| *toast_id == toast.id)
                .and_then(|(_, element)| element.dyn_ref::<HtmlElement>());
            if let Some(element) = element {
                element
                    .style()
                    .set_property("top", &format!("{}px", 20 + offset * 70))
                    .ok();
            }
        }
    }
}

impl Feedback for DomFeedback {
    fn set_loading(&self, visible: bool) {
        match self.layer.document.get_element_by_id(LOADER_ID) {
            Some(loader) => set_display(&loader, if visible { "block" } else { "none" }),
            None => warn!("loading overlay missing from page"),
        }
    }

    fn notify(&self, kind: ToastKind, message: &str) {
        let pushed = self
            .layer
            .center
            .borrow_mut()
            .push(kind, message, SystemClock.now_ms());
        for evicted in pushed.evicted {
            self.layer.remove(evicted);
        }
        let id = pushed.toast.id;
        if let Err(err) = self.layer.attach(id) {
            warn!(error = %describe(&err), "failed to render toast");
        }

        let layer = Rc::clone(&self.layer);
        Timeout::new(self.layer.duration_ms, move || {
            let mut gone = {
                let mut center = layer.center.borrow_mut();
                let mut gone = center.expire(SystemClock.now_ms());
                if center.dismiss(id) {
                    gone.push(id);
                }
                gone
            };
            gone.sort();
            for id in gone {
                layer.fade_out(id);
            }
        })
        .forget();
    }
}
