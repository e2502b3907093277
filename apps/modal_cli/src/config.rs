use std::{fs, path::Path};

use anyhow::Context;
use client_core::{ModalConfig, CLOSED_TITLE, DEFAULT_TITLE, LOADING_TEXT};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "modal_crud.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: Option<String>,
    pub default_title: String,
    pub closed_title: String,
    pub loading_text: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            default_title: DEFAULT_TITLE.into(),
            closed_title: CLOSED_TITLE.into(),
            loading_text: LOADING_TEXT.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    default_title: Option<String>,
    closed_title: Option<String>,
    loading_text: Option<String>,
}

impl Settings {
    pub fn modal_config(&self) -> anyhow::Result<ModalConfig> {
        let base_url = self
            .base_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid base url '{raw}'")))
            .transpose()?;
        Ok(ModalConfig {
            base_url,
            default_title: self.default_title.clone(),
            closed_title: self.closed_title.clone(),
            loading_text: self.loading_text.clone(),
        })
    }
}

/// An explicitly requested file must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                apply_file(&mut settings, &raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.base_url {
        settings.base_url = Some(v);
    }
    if let Some(v) = file_cfg.default_title {
        settings.default_title = v;
    }
    if let Some(v) = file_cfg.closed_title {
        settings.closed_title = v;
    }
    if let Some(v) = file_cfg.loading_text {
        settings.loading_text = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("MODAL_CRUD_BASE_URL") {
        settings.base_url = Some(v);
    }
    if let Some(v) = lookup("APP__BASE_URL") {
        settings.base_url = Some(v);
    }

    if let Some(v) = lookup("MODAL_CRUD_DEFAULT_TITLE") {
        settings.default_title = v;
    }
    if let Some(v) = lookup("APP__DEFAULT_TITLE") {
        settings.default_title = v;
    }

    if let Some(v) = lookup("MODAL_CRUD_CLOSED_TITLE") {
        settings.closed_title = v;
    }

    if let Some(v) = lookup("MODAL_CRUD_LOADING_TEXT") {
        settings.loading_text = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
