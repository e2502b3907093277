use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const AJAX_HEADER_NAME: &str = "X-Requested-With";
pub const AJAX_HEADER_VALUE: &str = "XMLHttpRequest";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Absent counts as `false`.
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_json_content_type)
    }
}

pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains(JSON_CONTENT_TYPE)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReply {
    /// 2xx without a JSON content type, e.g. 204 after a delete.
    Accepted,
    Envelope(ResponseEnvelope),
    /// 2xx JSON body that is not a valid envelope.
    MalformedEnvelope(String),
    /// 400 carrying the form re-rendered with validation messages.
    ValidationErrors(String),
    Rejected { status: u16, status_text: String },
}

pub fn classify_submit_reply(reply: &HttpReply) -> SubmitReply {
    if reply.is_success() {
        if !reply.is_json() {
            return SubmitReply::Accepted;
        }
        return match serde_json::from_str::<ResponseEnvelope>(&reply.body) {
            Ok(envelope) => SubmitReply::Envelope(envelope),
            Err(err) => SubmitReply::MalformedEnvelope(err.to_string()),
        };
    }

    if reply.status == 400 {
        return SubmitReply::ValidationErrors(reply.body.clone());
    }

    SubmitReply::Rejected {
        status: reply.status,
        status_text: reply.status_text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, content_type: Option<&str>, body: &str) -> HttpReply {
        HttpReply {
            status,
            status_text: String::new(),
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn no_content_is_accepted() {
        assert_eq!(classify_submit_reply(&reply(204, None, "")), SubmitReply::Accepted);
        assert_eq!(
            classify_submit_reply(&reply(200, Some("text/html; charset=utf-8"), "<p>ok</p>")),
            SubmitReply::Accepted
        );
    }

    #[test]
    fn json_envelope_keeps_extra_fields() {
        let classified = classify_submit_reply(&reply(
            200,
            Some("application/json"),
            r#"{"success": true, "message": "Saved.", "id": 5}"#,
        ));
        let SubmitReply::Envelope(envelope) = classified else {
            panic!("expected envelope, got {classified:?}");
        };
        assert!(envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Saved."));
        assert_eq!(envelope.extra.get("id"), Some(&Value::from(5)));
    }

    #[test]
    fn json_without_success_flag_is_unsuccessful() {
        let classified =
            classify_submit_reply(&reply(200, Some("Application/JSON"), r#"{"ok": true}"#));
        let SubmitReply::Envelope(envelope) = classified else {
            panic!("expected envelope, got {classified:?}");
        };
        assert!(!envelope.success);
        assert_eq!(envelope.extra.get("ok"), Some(&Value::Bool(true)));

        let empty = classify_submit_reply(&reply(200, Some("application/json"), "{}"));
        assert!(matches!(empty, SubmitReply::Envelope(ResponseEnvelope { success: false, .. })));
    }

    #[test]
    fn unreadable_json_is_malformed() {
        for body in ["", "not json", "[1, 2]", r#"{"success": "yes"}"#] {
            let classified = classify_submit_reply(&reply(200, Some("application/json"), body));
            assert!(
                matches!(classified, SubmitReply::MalformedEnvelope(_)),
                "{body:?} gave {classified:?}"
            );
        }
    }

    #[test]
    fn bad_request_is_validation_even_when_json() {
        let classified = classify_submit_reply(&reply(400, Some("application/json"), "{}"));
        assert_eq!(classified, SubmitReply::ValidationErrors("{}".to_string()));
    }

    #[test]
    fn other_statuses_are_rejected() {
        let mut server_error = reply(500, Some("text/html"), "boom");
        server_error.status_text = "Internal Server Error".to_string();
        assert_eq!(
            classify_submit_reply(&server_error),
            SubmitReply::Rejected {
                status: 500,
                status_text: "Internal Server Error".to_string()
            }
        );
    }
}
