use std::{borrow::Cow, collections::HashMap, sync::LazyLock};

use regex::Regex;
use shared::domain::{FieldValue, FilePart, FormFields, LoadedForm};
use tracing::debug;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").expect("comment regex"));
static FORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<form\b((?:"[^"]*"|'[^']*'|[^'">])*)>(.*?)(?:</form\s*>|\z)"#)
        .expect("form regex")
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute regex")
});
static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?is)<input\b((?:"[^"]*"|'[^']*'|[^'">])*)>"#,
        r#"|<textarea\b((?:"[^"]*"|'[^']*'|[^'">])*)>(.*?)</textarea\s*>"#,
        r#"|<select\b((?:"[^"]*"|'[^']*'|[^'">])*)>(.*?)</select\s*>"#,
    ))
    .expect("control regex")
});
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<option\b((?:"[^"]*"|'[^']*'|[^'">])*)>([^<]*)"#).expect("option regex")
});
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex"));

const NON_SUCCESSFUL_INPUTS: &[&str] = &["submit", "reset", "button", "image"];

type Attributes = HashMap<String, String>;

/// Finds the first form in `html`, or `None` when the fragment has no form.
pub fn find_form(html: &str) -> Option<LoadedForm> {
    let html = strip_comments(html);
    let captures = FORM_RE.captures(&html)?;
    let attrs = parse_attributes(captures.get(1).map_or("", |m| m.as_str()));
    let inner = captures.get(2).map_or("", |m| m.as_str());

    let form = LoadedForm {
        action: non_blank(attrs.get("action")),
        method: non_blank(attrs.get("method")),
        fields: collect_fields(inner),
    };
    debug!(
        action = form.action.as_deref().unwrap_or(""),
        method = form.method.as_deref().unwrap_or(""),
        fields = form.fields.len(),
        "located form in fragment"
    );
    Some(form)
}

fn strip_comments(html: &str) -> Cow<'_, str> {
    COMMENT_RE.replace_all(html, "")
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn collect_fields(inner: &str) -> FormFields {
    let mut fields = FormFields::new();
    for control in CONTROL_RE.captures_iter(inner) {
        if let Some(input) = control.get(1) {
            collect_input(&parse_attributes(input.as_str()), &mut fields);
        } else if let Some(textarea) = control.get(2) {
            let attrs = parse_attributes(textarea.as_str());
            if let Some(name) = successful_name(&attrs) {
                let text = control.get(3).map_or("", |m| m.as_str());
                fields.append(name, decode_entities(strip_leading_newline(text)));
            }
        } else if let Some(select) = control.get(4) {
            let attrs = parse_attributes(select.as_str());
            if let Some(name) = successful_name(&attrs) {
                let body = control.get(5).map_or("", |m| m.as_str());
                for value in selected_options(body, attrs.contains_key("multiple")) {
                    fields.append(name.clone(), value);
                }
            }
        }
    }
    fields
}

fn collect_input(attrs: &Attributes, fields: &mut FormFields) {
    let Some(name) = successful_name(attrs) else {
        return;
    };
    let kind = attrs
        .get("type")
        .map(|t| t.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string());

    match kind.as_str() {
        t if NON_SUCCESSFUL_INPUTS.contains(&t) => {}
        "checkbox" | "radio" => {
            if attrs.contains_key("checked") {
                let value = attrs.get("value").cloned().unwrap_or_else(|| "on".to_string());
                fields.append(name, value);
            }
        }
        "file" => fields.append(name, FieldValue::File(FilePart::empty())),
        _ => {
            let value = attrs.get("value").cloned().unwrap_or_default();
            fields.append(name, value);
        }
    }
}

fn successful_name(attrs: &Attributes) -> Option<String> {
    if attrs.contains_key("disabled") {
        return None;
    }
    attrs
        .get("name")
        .filter(|name| !name.is_empty())
        .cloned()
}

fn selected_options(body: &str, multiple: bool) -> Vec<String> {
    let options: Vec<(Attributes, String)> = OPTION_RE
        .captures_iter(body)
        .map(|option| {
            let attrs = parse_attributes(option.get(1).map_or("", |m| m.as_str()));
            let label = decode_entities(option.get(2).map_or("", |m| m.as_str()).trim());
            (attrs, label)
        })
        .filter(|(attrs, _)| !attrs.contains_key("disabled"))
        .collect();

    let value_of = |(attrs, label): &(Attributes, String)| {
        attrs.get("value").cloned().unwrap_or_else(|| label.clone())
    };

    let selected: Vec<String> = options
        .iter()
        .filter(|(attrs, _)| attrs.contains_key("selected"))
        .map(value_of)
        .collect();

    if multiple {
        return selected;
    }
    match selected.into_iter().last() {
        Some(value) => vec![value],
        None => options.first().map(value_of).into_iter().collect(),
    }
}

fn parse_attributes(raw: &str) -> Attributes {
    let mut attrs = Attributes::new();
    for capture in ATTR_RE.captures_iter(raw) {
        let Some(name) = capture.get(1) else {
            continue;
        };
        let value = capture
            .get(2)
            .or_else(|| capture.get(3))
            .or_else(|| capture.get(4))
            .map_or("", |m| m.as_str());
        // First occurrence wins, as in HTML.
        attrs
            .entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| decode_entities(value));
    }
    attrs
}

fn strip_leading_newline(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

pub(crate) fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
