use crate::models::DrawId;

/// Query-string parameters a ticket page understands on load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeepLink {
    pub tab: Option<String>,
    pub ticket: Option<String>,
}

impl DeepLink {
    /// Parses `location.search`, with or without the leading `?`.
    pub fn from_query(search: &str) -> Self {
        let mut link = DeepLink::default();
        for pair in search.trim_start_matches('?').split('&') {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value);
            if value.is_empty() {
                continue;
            }
            match decode_component(name).as_str() {
                "tab" => link.tab = Some(value),
                "ticket" => link.ticket = Some(value),
                _ => {}
            }
        }
        link
    }

    /// Ticket id to highlight once the page has rendered.
    pub fn highlight_target(&self) -> Option<&str> {
        self.ticket.as_deref()
    }

    pub fn opens_tickets_tab(&self) -> bool {
        self.tab.as_deref() == Some("tickets")
    }
}

pub fn draw_ticket_url(draw: DrawId, ticket: i64) -> String {
    format!("/draw/{draw}?tab=tickets&ticket={ticket}")
}

pub fn share_url(origin: &str, draw: DrawId, ticket: i64) -> String {
    format!("{}/draw/{draw}?ticket={ticket}", origin.trim_end_matches('/'))
}

/// Selector for the rendered ticket entry with the given id.
pub fn ticket_selector(ticket: &str) -> String {
    let escaped = ticket.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[data-ticket-id=\"{escaped}\"]")
}

fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'+' => out.push(b' '),
            b'%' => {
                match bytes
                    .get(index + 1..index + 3)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                {
                    Some(byte) => {
                        out.push(byte);
                        index += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            byte => out.push(byte),
        }
        index += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
