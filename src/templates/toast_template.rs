use crate::notify::Toast;
use crate::templates::admin_template::escape_html;

pub const LOADER_ID: &str = "global-loader";
pub const LOADER_STYLE_ID: &str = "loader-styles";

pub const LOADER_STYLE: &str = "display: none; position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
background: rgba(0,0,0,0.3); z-index: 9999; backdrop-filter: blur(2px);";

pub const LOADER_HTML: &str = "<div style=\"position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); \
background: white; padding: 20px; border-radius: 10px; box-shadow: 0 10px 30px rgba(0,0,0,0.3);\">\
<div style=\"width: 40px; height: 40px; border: 4px solid #e2e8f0; border-top: 4px solid #667eea; \
border-radius: 50%; animation: spin 1s linear infinite; margin: 0 auto 10px;\"></div>\
<div style=\"text-align: center; color: #4a5568;\">Loading...</div></div>";

pub const KEYFRAMES: &str = "@keyframes spin { 0% { transform: rotate(0deg); } 100% { transform: rotate(360deg); } }\n\
@keyframes slideInRight { from { transform: translateX(100%); opacity: 0; } to { transform: translateX(0); opacity: 1; } }\n\
@keyframes slideOutRight { from { transform: translateX(0); opacity: 1; } to { transform: translateX(100%); opacity: 0; } }";

/// Inline style of a toast; `offset` stacks toasts below each other.
pub fn toast_style(toast: &Toast, offset: usize) -> String {
    format!(
        "position: fixed; top: {}px; right: 20px; background: {}; color: white; padding: 15px 20px; \
border-radius: 8px; box-shadow: 0 5px 15px rgba(0,0,0,0.2); z-index: 10000; max-width: 300px; \
animation: slideInRight 0.3s ease-out;",
        20 + offset * 70,
        toast.kind.background()
    )
}

pub fn toast_html(toast: &Toast) -> String {
    format!(
        "<div style=\"display: flex; justify-content: space-between; align-items: center;\">\
<span>{}</span><button type=\"button\" data-toast-close=\"{}\" \
style=\"background: none; border: none; color: white; font-size: 18px; cursor: pointer; margin-left: 10px;\">×</button></div>",
        escape_html(&toast.message),
        toast.id.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ToastId, ToastKind};

    #[test]
    fn toast_markup_escapes_message() {
        let toast = Toast {
            id: ToastId(4),
            kind: ToastKind::Error,
            message: "<script>".into(),
            expires_at_ms: 0,
        };
        let html = toast_html(&toast);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("data-toast-close=\"4\""));
        assert!(toast_style(&toast, 1).contains("#f56565"));
        assert!(toast_style(&toast, 1).contains("top: 90px"));
    }
}
