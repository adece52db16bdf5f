use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Flat key-value payload sent for draw and package create/update.
pub type FormPayload = Map<String, Value>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DrawId(pub i64);

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PackageId(pub i64);

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Draw {
    pub id: DrawId,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cost: Value,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub time_left: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tickets_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Package {
    pub id: PackageId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub currency: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub draw_id: DrawId,
    #[serde(default)]
    pub numbers: Vec<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub purchase_date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Balance {
    #[serde(default)]
    pub coins: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Stats {
    pub total_tickets: Option<i64>,
    pub winning_tickets: Option<i64>,
    pub pending_tickets: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ConductOutcome {
    #[serde(default)]
    pub winning_numbers: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BalanceUpdate {
    pub new_balance: f64,
    #[serde(default)]
    pub added_amount: Option<f64>,
}

/// `/api/tickets` answers either with an envelope or a bare array.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TicketListResponse {
    Envelope { tickets: Vec<Ticket> },
    Bare(Vec<Ticket>),
}

impl TicketListResponse {
    pub fn into_tickets(self) -> Vec<Ticket> {
        match self {
            TicketListResponse::Envelope { tickets } => tickets,
            TicketListResponse::Bare(tickets) => tickets,
        }
    }
}

/// Query for the server-side ticket filter, `?status=&draw_id=`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketQuery {
    pub status: String,
    pub draw_id: String,
}

impl TicketQuery {
    pub fn to_query_string(&self) -> String {
        format!(
            "status={}&draw_id={}",
            encode_component(&self.status),
            encode_component(&self.draw_id)
        )
    }
}

pub(crate) fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Renders a loosely typed JSON scalar the way the page prints it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => format_amount(float),
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

/// `1500.0` prints as `1500`, `12.5` as `12.5`.
pub fn format_amount(amount: f64) -> String {
    format!("{amount}")
}

/// Purchase date as `dd.mm.yyyy`; unparseable input is returned as-is.
pub fn format_purchase_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.format("%d.%m.%Y").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return parsed.format("%d.%m.%Y").to_string();
        }
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return parsed.format("%d.%m.%Y").to_string();
    }
    trimmed.to_string()
}
