use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{ModalController, OpenOutcome, SubmitOutcome};
use shared::{
    domain::{FieldValue, FilePart, FormFields, TriggerDescriptor},
    error::FailureException,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::load_settings;
use terminal::{TerminalPage, TerminalSurface};

/// Opens a CRUD dialog fragment and optionally submits its form.
#[derive(Parser, Debug)]
struct Args {
    /// Fragment URL; relative URLs resolve against the configured base URL.
    #[arg(long)]
    url: String,
    #[arg(long)]
    title: Option<String>,
    /// Field override as NAME=VALUE; repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
    /// File field as NAME=PATH; repeatable.
    #[arg(long = "file", value_name = "NAME=PATH")]
    files: Vec<String>,
    /// Submit the loaded form after opening.
    #[arg(long)]
    submit: bool,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref())?;
    let edits = build_edits(&args.set, &args.files)?;

    let page = Arc::new(TerminalPage::default());
    let controller = ModalController::with_http(
        settings.modal_config()?,
        Arc::new(TerminalSurface),
        page.clone(),
    )?;

    let mut trigger = TriggerDescriptor::new(args.url);
    if let Some(title) = args.title {
        trigger = trigger.with_title(title);
    }

    let form = match controller.open(trigger).await {
        OpenOutcome::Ready { form } => form,
        OpenOutcome::Failed(failure) => return Err(FailureException::from(failure).into()),
        OpenOutcome::Superseded => bail!("dialog load was superseded"),
    };

    if !args.submit {
        return Ok(());
    }
    let binding = form.context("the loaded fragment contains no form to submit")?;

    let outcome = controller.submit(binding, &edits).await?;
    if let Some(failure) = outcome.failure() {
        return Err(FailureException::from(failure).into());
    }
    match outcome {
        SubmitOutcome::Completed { message } => {
            info!(
                message = message.as_deref().unwrap_or_default(),
                reloads = page.reloads(),
                "operation completed"
            );
            Ok(())
        }
        _ => bail!("dialog submission was superseded"),
    }
}

fn build_edits(sets: &[String], files: &[String]) -> Result<FormFields> {
    let mut edits = FormFields::new();
    for raw in sets {
        let (name, value) = split_assignment(raw)?;
        edits.set(name, value);
    }
    for raw in files {
        let (name, path) = split_assignment(raw)?;
        edits.set(name, FieldValue::File(read_file_part(Path::new(path))?));
    }
    Ok(edits)
}

fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("expected NAME=VALUE, got '{raw}'"),
    }
}

fn read_file_part(path: &Path) -> Result<FilePart> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read file '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(FilePart {
        filename,
        content_type,
        bytes,
    })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
