use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(BindingId);
id_newtype!(CycleId);

/// Field name Django uses for its anti-forgery token.
pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TriggerDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title to show; an empty title counts as missing.
    pub fn display_title<'a>(&'a self, default_title: &'a str) -> &'a str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => default_title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePart {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// The part a browser sends for a file input with nothing selected.
    pub fn empty() -> Self {
        Self {
            filename: String::new(),
            content_type: None,
            bytes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    File(FilePart),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::File(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered multi-map of form fields, duplicates allowed, like a browser's form data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields(Vec<(String, FieldValue)>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.push((name.into(), value.into()));
    }

    /// Replaces every value under `name` with `value`, keeping the position of the
    /// first occurrence. Unknown names are appended.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.0.iter().position(|(existing, _)| existing == name) {
            Some(first) => {
                self.0[first].1 = value;
                let mut index = 0;
                self.0.retain(|(existing, _)| {
                    let keep = index <= first || existing != name;
                    index += 1;
                    keep
                });
            }
            None => self.0.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.0
            .iter()
            .filter(move |(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.get_text(CSRF_FIELD_NAME)
    }

    /// Applies user edits on top of the fields parsed from the markup.
    pub fn apply(&mut self, edits: &FormFields) {
        for (name, value) in edits.iter() {
            self.set(name, value.clone());
        }
    }
}

impl<N, V> FromIterator<(N, V)> for FormFields
where
    N: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub fields: FormFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_collapses_duplicates_into_first_slot() {
        let mut fields: FormFields = [("tags", "a"), ("name", "x"), ("tags", "b")]
            .into_iter()
            .collect();
        fields.set("tags", "c");

        let collected: Vec<_> = fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.as_text().map(str::to_string)))
            .collect();
        assert_eq!(
            collected,
            vec![
                ("tags".to_string(), Some("c".to_string())),
                ("name".to_string(), Some("x".to_string())),
            ]
        );
    }

    #[test]
    fn empty_title_falls_back_to_default() {
        let trigger = TriggerDescriptor::new("/interns/5/edit/").with_title("");
        assert_eq!(trigger.display_title("CRUD operation"), "CRUD operation");
        let trigger = TriggerDescriptor::new("/interns/5/edit/");
        assert_eq!(trigger.display_title("CRUD operation"), "CRUD operation");
        let trigger = trigger.with_title("   ");
        assert_eq!(trigger.display_title("CRUD operation"), "   ");
        let trigger = trigger.with_title("Edit Intern");
        assert_eq!(trigger.display_title("CRUD operation"), "Edit Intern");
    }
}
