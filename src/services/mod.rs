use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::notify::ToastKind;

pub mod memory;

pub type ServiceResult<T> = Result<T, DashboardError>;

/// Message used when a failed response carries no `error` field.
pub const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("{0}")]
    Validation(String),
}

impl DashboardError {
    /// Builds the HTTP-level failure from a parsed error body.
    pub fn from_body(status: u16, body: &Value) -> Self {
        DashboardError::Http {
            status,
            message: error_message(body),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            DashboardError::Network(_) => "network",
            DashboardError::Http { .. } => "http",
            DashboardError::Rejected(_) => "rejected",
            DashboardError::Decode(_) => "decode",
            DashboardError::Storage(_) => "storage",
            DashboardError::Validation(_) => "validation",
        }
    }
}

/// Server-supplied `error` string, or the fallback when absent or empty.
pub fn error_message(body: &Value) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(FALLBACK_ERROR_MESSAGE)
        .to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Caller-side options bag for [`crate::client::ApiClient::request`].
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::default()
        }
    }

    pub fn json(method: Method, body: &Value) -> Self {
        Self {
            method,
            headers: BTreeMap::new(),
            body: Some(body.to_string()),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Path and query of the request URL, without scheme and host.
    pub fn path(&self) -> &str {
        match self.url.find("://") {
            Some(scheme_end) => {
                let rest = &self.url[scheme_end + 3..];
                rest.find('/').map(|slash| &rest[slash..]).unwrap_or("/")
            }
            None => &self.url,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP primitive. Transport failures map to [`DashboardError::Network`].
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: ApiRequest) -> ServiceResult<ApiResponse>;
}

/// User-facing side effects of the request client: the blocking overlay and toasts.
pub trait Feedback {
    fn set_loading(&self, visible: bool);
    fn notify(&self, kind: ToastKind, message: &str);

    fn show_success(&self, message: &str) {
        self.notify(ToastKind::Success, message);
    }

    fn show_error(&self, message: &str) {
        self.notify(ToastKind::Error, message);
    }

    fn show_info(&self, message: &str) {
        self.notify(ToastKind::Info, message);
    }
}

/// Durable client-side key-value storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> ServiceResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> ServiceResult<()>;
}

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

impl<T: Feedback + ?Sized> Feedback for std::rc::Rc<T> {
    fn set_loading(&self, visible: bool) {
        (**self).set_loading(visible)
    }

    fn notify(&self, kind: ToastKind, message: &str) {
        (**self).notify(kind, message)
    }
}
