use crate::form::escape_html;

fn alert(inner: &str) -> String {
    format!(r#"<div class="alert alert-danger">{inner}</div>"#)
}

// `body` is server markup and goes in unescaped.
pub(crate) fn load_rejected(status: u16, status_text: &str, body: &str) -> String {
    let mut inner = format!(
        "Unable to load content: {status} {}",
        escape_html(status_text)
    );
    if !body.is_empty() {
        inner.push_str("<br>");
        inner.push_str(body);
    }
    alert(&inner)
}

pub(crate) fn load_unreachable(reason: &str) -> String {
    alert(&format!(
        "Error while loading the dialog content: {}",
        escape_html(reason)
    ))
}

pub(crate) fn submit_rejected() -> String {
    alert("An error occurred. Please try again.")
}

pub(crate) fn submit_unreachable(reason: &str) -> String {
    alert(&format!(
        "Network error or other problem: {}",
        escape_html(reason)
    ))
}

pub(crate) fn submit_unsuccessful(message: Option<&str>) -> String {
    alert(&escape_html(
        message.unwrap_or("The operation could not be completed."),
    ))
}

pub(crate) fn submit_unreadable() -> String {
    alert("The server returned an unreadable response.")
}
