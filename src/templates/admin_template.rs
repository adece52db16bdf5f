use std::fmt::Write;

use crate::filter::TicketStatus;
use crate::models::{display_value, format_purchase_date, Draw, DrawId, Package, PackageId, Ticket};

/// Per-row button. Carries the typed id the click handler acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowAction {
    EditDraw(DrawId),
    ConductDraw(DrawId),
    DeleteDraw(DrawId),
    EditPackage(PackageId),
    DeletePackage(PackageId),
}

impl RowAction {
    /// Rebuilds the action behind a clicked button from its row's data attribute
    /// (`data-draw-id` / `data-package-id`), the id value and the button's `data-action`.
    pub fn from_attributes(row_attribute: &str, id: &str, action: &str) -> Option<Self> {
        let id = id.trim().parse::<i64>().ok()?;
        match (row_attribute, action) {
            ("data-draw-id", "edit") => Some(RowAction::EditDraw(DrawId(id))),
            ("data-draw-id", "conduct") => Some(RowAction::ConductDraw(DrawId(id))),
            ("data-draw-id", "delete") => Some(RowAction::DeleteDraw(DrawId(id))),
            ("data-package-id", "edit") => Some(RowAction::EditPackage(PackageId(id))),
            ("data-package-id", "delete") => Some(RowAction::DeletePackage(PackageId(id))),
            _ => None,
        }
    }

    pub fn data_action(&self) -> &'static str {
        match self {
            RowAction::EditDraw(_) | RowAction::EditPackage(_) => "edit",
            RowAction::ConductDraw(_) => "conduct",
            RowAction::DeleteDraw(_) | RowAction::DeletePackage(_) => "delete",
        }
    }

    fn button_class(&self) -> &'static str {
        match self {
            RowAction::EditDraw(_) | RowAction::EditPackage(_) => "btn-edit",
            RowAction::ConductDraw(_) => "btn-conduct",
            RowAction::DeleteDraw(_) | RowAction::DeletePackage(_) => "btn-delete",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RowAction::EditDraw(_) | RowAction::EditPackage(_) => "Edit",
            RowAction::ConductDraw(_) => "Conduct",
            RowAction::DeleteDraw(_) | RowAction::DeletePackage(_) => "Delete",
        }
    }
}

/// One `<tr>`: its data attribute, cell markup and action buttons in display order.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub data_attribute: Option<(&'static str, String)>,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

impl TableRow {
    /// Inner HTML of the row. Action buttons are emitted in `actions` order with a
    /// `data-action` attribute and no inline handlers.
    pub fn inner_html(&self) -> String {
        let mut html = String::new();
        for cell in &self.cells {
            write!(html, "<td>{cell}</td>").ok();
        }
        if !self.actions.is_empty() {
            html.push_str("<td class=\"actions\">");
            for action in &self.actions {
                write!(
                    html,
                    "<button type=\"button\" data-action=\"{}\" class=\"{}\">{}</button>",
                    action.data_action(),
                    action.button_class(),
                    action.label()
                )
                .ok();
            }
            html.push_str("</td>");
        }
        html
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn draw_row(draw: &Draw) -> TableRow {
    let category_class = if draw.category == "big" { "big" } else { "express" };
    let (status_class, status_text) = if draw.completed {
        ("completed", "Completed")
    } else {
        ("active", "Active")
    };
    let mut actions = vec![RowAction::EditDraw(draw.id)];
    if !draw.completed {
        actions.push(RowAction::ConductDraw(draw.id));
    }
    actions.push(RowAction::DeleteDraw(draw.id));

    TableRow {
        data_attribute: Some(("data-draw-id", draw.id.to_string())),
        cells: vec![
            draw.id.to_string(),
            format!(
                "<span class=\"category-badge {category_class}\">{}</span>",
                escape_html(&draw.category)
            ),
            escape_html(&draw.title),
            format!(
                "{} {}",
                escape_html(&display_value(&draw.cost)),
                escape_html(&draw.currency)
            ),
            escape_html(&draw.time_left),
            format!("<span class=\"status-badge {status_class}\">{status_text}</span>"),
            draw.tickets_count.unwrap_or(0).to_string(),
        ],
        actions,
    }
}

pub fn package_category_label(category: &str) -> &str {
    match category {
        "big" => "Big draws only",
        "express" => "Express draws only",
        "all" => "All draws",
        other => other,
    }
}

pub fn package_row(package: &Package) -> TableRow {
    TableRow {
        data_attribute: Some(("data-package-id", package.id.to_string())),
        cells: vec![
            package.id.to_string(),
            escape_html(&package.name),
            format!(
                "<span class=\"category-badge {}\">{}</span>",
                escape_html(&package.category),
                escape_html(package_category_label(&package.category))
            ),
            format!(
                "{} {}",
                escape_html(&display_value(&package.price)),
                escape_html(&package.currency)
            ),
        ],
        actions: vec![
            RowAction::EditPackage(package.id),
            RowAction::DeletePackage(package.id),
        ],
    }
}

pub fn ticket_row(ticket: &Ticket) -> TableRow {
    let status_class = if ticket.status == "winner" { "completed" } else { "active" };
    let status_text = TicketStatus::parse(&ticket.status)
        .map(|status| status.label().to_string())
        .unwrap_or_else(|| ticket.status.clone());
    let numbers = ticket
        .numbers
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    TableRow {
        data_attribute: None,
        cells: vec![
            ticket.id.to_string(),
            format!("Draw #{}", ticket.draw_id),
            numbers,
            format!(
                "<span class=\"status-badge {status_class}\">{}</span>",
                escape_html(&status_text)
            ),
            escape_html(&format_purchase_date(&ticket.purchase_date)),
        ],
        actions: Vec::new(),
    }
}
