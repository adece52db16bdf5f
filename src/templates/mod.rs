pub mod admin_template;
pub mod toast_template;
