use std::sync::Arc;

use reqwest::Method;
use shared::{
    domain::{BindingId, CycleId, FormFields, LoadedForm, TriggerDescriptor},
    error::{Failure, FailureKind},
    protocol::{classify_submit_reply, HttpReply, SubmitReply},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

pub mod form;
mod notice;
pub mod surface;
pub mod transport;

pub use surface::{DialogSurface, PageHost};
pub use transport::{HttpTransport, ModalTransport, SubmitRequest, TransportError};

pub const DEFAULT_TITLE: &str = "CRUD operation";
pub const CLOSED_TITLE: &str = "...";
pub const LOADING_TEXT: &str = "Loading...";

#[derive(Debug, Clone)]
pub struct ModalConfig {
    /// Base for relative trigger URLs, usually the hosting page's origin.
    pub base_url: Option<Url>,
    pub default_title: String,
    pub closed_title: String,
    pub loading_text: String,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_title: DEFAULT_TITLE.to_string(),
            closed_title: CLOSED_TITLE.to_string(),
            loading_text: LOADING_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Loading,
    Ready { form: Option<BindingId> },
    Submitting,
    ErrorDisplayed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBinding {
    pub id: BindingId,
    pub form: LoadedForm,
    /// The trigger URL; used when the form declares no action.
    pub fallback_url: Url,
}

impl FormBinding {
    pub fn target(&self) -> Url {
        let Some(action) = self.form.action.as_deref() else {
            return self.fallback_url.clone();
        };
        match self.fallback_url.join(action) {
            Ok(url) => url,
            Err(err) => {
                warn!(action, %err, "unusable form action, submitting to trigger url");
                self.fallback_url.clone()
            }
        }
    }

    pub fn method(&self) -> Method {
        let Some(declared) = self.form.method.as_deref() else {
            return Method::POST;
        };
        match Method::from_bytes(declared.trim().to_ascii_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                warn!(method = declared, "unusable form method, submitting with POST");
                Method::POST
            }
        }
    }

    fn request(&self, edits: &FormFields) -> SubmitRequest {
        let mut fields = self.form.fields.clone();
        fields.apply(edits);
        SubmitRequest {
            method: self.method(),
            url: self.target(),
            fields,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModalSnapshot {
    pub phase: ModalPhase,
    pub cycle: CycleId,
    pub title: String,
    pub body: String,
    pub binding: Option<FormBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Ready { form: Option<BindingId> },
    Failed(Failure),
    /// A later open or a close arrived before the fetch resolved.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Dialog closed and the page reload requested.
    Completed { message: Option<String> },
    /// Validation errors re-rendered; `form` is the freshly bound form, if any.
    Invalid { form: Option<BindingId> },
    Failed(Failure),
    Superseded,
}

impl SubmitOutcome {
    /// The failure behind this outcome; a validation re-render counts as one.
    pub fn failure(&self) -> Option<Failure> {
        match self {
            Self::Invalid { .. } => Some(Failure::new(
                FailureKind::Validation,
                "the server rejected the submitted fields",
            )),
            Self::Failed(failure) => Some(failure.clone()),
            Self::Completed { .. } | Self::Superseded => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModalError {
    #[error("no form is bound in the dialog")]
    NoBoundForm,
    #[error("form binding {stale:?} is detached (live binding: {live:?})")]
    DetachedForm {
        stale: BindingId,
        live: Option<BindingId>,
    },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

struct ControllerState {
    phase: ModalPhase,
    cycle: u64,
    next_binding: u64,
    title: String,
    body: String,
    binding: Option<FormBinding>,
}

/// Drives the shared CRUD dialog: open, load, submit, re-render, close.
pub struct ModalController {
    config: ModalConfig,
    transport: Arc<dyn ModalTransport>,
    surface: Arc<dyn DialogSurface>,
    page: Arc<dyn PageHost>,
    inner: Mutex<ControllerState>,
}

impl ModalController {
    pub fn new(
        config: ModalConfig,
        transport: Arc<dyn ModalTransport>,
        surface: Arc<dyn DialogSurface>,
        page: Arc<dyn PageHost>,
    ) -> Arc<Self> {
        let title = config.closed_title.clone();
        let body = config.loading_text.clone();
        Arc::new(Self {
            config,
            transport,
            surface,
            page,
            inner: Mutex::new(ControllerState {
                phase: ModalPhase::Closed,
                cycle: 0,
                next_binding: 0,
                title,
                body,
                binding: None,
            }),
        })
    }

    pub fn with_http(
        config: ModalConfig,
        surface: Arc<dyn DialogSurface>,
        page: Arc<dyn PageHost>,
    ) -> Result<Arc<Self>, ModalError> {
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::new(config, transport, surface, page))
    }

    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    pub async fn phase(&self) -> ModalPhase {
        self.inner.lock().await.phase
    }

    pub async fn snapshot(&self) -> ModalSnapshot {
        let guard = self.inner.lock().await;
        ModalSnapshot {
            phase: guard.phase,
            cycle: CycleId(guard.cycle),
            title: guard.title.clone(),
            body: guard.body.clone(),
            binding: guard.binding.clone(),
        }
    }

    /// Starts a new cycle; results still in flight from earlier cycles are dropped.
    pub async fn open(&self, trigger: TriggerDescriptor) -> OpenOutcome {
        let title = trigger.display_title(&self.config.default_title).to_string();
        let cycle = {
            let mut guard = self.inner.lock().await;
            guard.cycle += 1;
            guard.binding = None;
            guard.phase = ModalPhase::Loading;
            self.write_title(&mut guard, title);
            let loading = self.config.loading_text.clone();
            self.write_body(&mut guard, loading);
            guard.cycle
        };
        info!(url = %trigger.url, cycle, "opening dialog");

        let url = match self.resolve_trigger_url(&trigger.url) {
            Ok(url) => url,
            Err(err) => {
                error!(url = %trigger.url, %err, "invalid dialog url");
                let mut guard = self.inner.lock().await;
                if guard.cycle != cycle {
                    return OpenOutcome::Superseded;
                }
                let message = format!("invalid url {}: {err}", trigger.url);
                return self.fail_load(&mut guard, notice::load_unreachable(&message), message);
            }
        };

        let result = self.transport.fetch(&url).await;

        let mut guard = self.inner.lock().await;
        if guard.cycle != cycle {
            debug!(%url, cycle, current = guard.cycle, "discarding superseded load");
            return OpenOutcome::Superseded;
        }

        match result {
            Ok(reply) if reply.is_success() => {
                let form = self.install_body(&mut guard, reply.body, url);
                OpenOutcome::Ready { form }
            }
            Ok(HttpReply {
                status,
                status_text,
                body,
                ..
            }) => {
                error!(%url, status, %status_text, "failed to load dialog content");
                let message = format!("{status} {status_text}");
                self.fail_load(
                    &mut guard,
                    notice::load_rejected(status, &status_text, &body),
                    message,
                )
            }
            Err(err) => {
                error!(%url, %err, "failed to load dialog content");
                let message = err.to_string();
                self.fail_load(&mut guard, notice::load_unreachable(&message), message)
            }
        }
    }

    pub async fn submit(
        &self,
        binding: BindingId,
        edits: &FormFields,
    ) -> Result<SubmitOutcome, ModalError> {
        let (cycle, request, fallback_url) = {
            let mut guard = self.inner.lock().await;
            if guard.phase == ModalPhase::Submitting {
                return Err(ModalError::SubmissionInFlight);
            }
            let live = guard.binding.as_ref().ok_or(ModalError::NoBoundForm)?;
            if live.id != binding {
                return Err(ModalError::DetachedForm {
                    stale: binding,
                    live: Some(live.id),
                });
            }
            let request = live.request(edits);
            let fallback_url = live.fallback_url.clone();
            guard.phase = ModalPhase::Submitting;
            (guard.cycle, request, fallback_url)
        };
        info!(
            url = %request.url,
            method = %request.method,
            binding = binding.0,
            "submitting dialog form"
        );

        let url = request.url.clone();
        let result = self.transport.submit(request).await;

        let mut guard = self.inner.lock().await;
        if guard.cycle != cycle {
            debug!(%url, cycle, current = guard.cycle, "discarding superseded submission");
            return Ok(SubmitOutcome::Superseded);
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                error!(%url, %err, "failed to submit dialog form");
                let message = err.to_string();
                return Ok(self.fail_submit(
                    &mut guard,
                    notice::submit_unreachable(&message),
                    Failure::new(FailureKind::Submission, message),
                ));
            }
        };

        let outcome = match classify_submit_reply(&reply) {
            SubmitReply::Accepted => self.complete(&mut guard, None),
            SubmitReply::Envelope(envelope) if envelope.success => {
                self.complete(&mut guard, envelope.message)
            }
            SubmitReply::Envelope(envelope) => {
                warn!(%url, message = ?envelope.message, extra = ?envelope.extra, "server reported an unsuccessful operation");
                let message = envelope
                    .message
                    .clone()
                    .unwrap_or_else(|| "operation not successful".to_string());
                self.fail_submit(
                    &mut guard,
                    notice::submit_unsuccessful(envelope.message.as_deref()),
                    Failure::new(FailureKind::Logical, message),
                )
            }
            SubmitReply::MalformedEnvelope(reason) => {
                error!(%url, %reason, "unreadable json reply to dialog form");
                self.fail_submit(
                    &mut guard,
                    notice::submit_unreadable(),
                    Failure::new(FailureKind::Submission, reason),
                )
            }
            SubmitReply::ValidationErrors(html) => {
                info!(%url, "dialog form rejected with validation errors");
                let form = self.install_body(&mut guard, html, fallback_url);
                SubmitOutcome::Invalid { form }
            }
            SubmitReply::Rejected {
                status,
                status_text,
            } => {
                error!(%url, status, %status_text, "failed to submit dialog form");
                self.fail_submit(
                    &mut guard,
                    notice::submit_rejected(),
                    Failure::new(FailureKind::Submission, format!("{status} {status_text}")),
                )
            }
        };
        Ok(outcome)
    }

    /// Handler for the dialog's close event; valid from any phase.
    pub async fn close(&self) {
        let mut guard = self.inner.lock().await;
        self.reset(&mut guard);
        debug!(cycle = guard.cycle, "dialog closed");
    }

    fn resolve_trigger_url(&self, raw: &str) -> Result<Url, url::ParseError> {
        match &self.config.base_url {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        }
    }

    fn install_body(
        &self,
        state: &mut ControllerState,
        html: String,
        fallback_url: Url,
    ) -> Option<BindingId> {
        state.binding = None;
        let form = form::find_form(&html);
        self.write_body(state, html);

        let id = form.map(|form| {
            state.next_binding += 1;
            let id = BindingId(state.next_binding);
            debug!(binding = id.0, url = %fallback_url, "bound dialog form");
            state.binding = Some(FormBinding {
                id,
                form,
                fallback_url,
            });
            id
        });
        state.phase = ModalPhase::Ready { form: id };
        id
    }

    fn complete(&self, state: &mut ControllerState, message: Option<String>) -> SubmitOutcome {
        if let Some(message) = message.as_deref() {
            info!(message, "dialog operation succeeded");
        }
        self.surface.hide();
        self.reset(state);
        self.page.reload();
        SubmitOutcome::Completed { message }
    }

    fn fail_load(&self, state: &mut ControllerState, html: String, message: String) -> OpenOutcome {
        self.show_error(state, html);
        OpenOutcome::Failed(Failure::new(FailureKind::Load, message))
    }

    fn fail_submit(
        &self,
        state: &mut ControllerState,
        html: String,
        failure: Failure,
    ) -> SubmitOutcome {
        self.show_error(state, html);
        SubmitOutcome::Failed(failure)
    }

    fn show_error(&self, state: &mut ControllerState, html: String) {
        state.binding = None;
        state.phase = ModalPhase::ErrorDisplayed;
        self.write_body(state, html);
    }

    fn reset(&self, state: &mut ControllerState) {
        state.cycle += 1;
        state.binding = None;
        state.phase = ModalPhase::Closed;
        self.write_title(state, self.config.closed_title.clone());
        self.write_body(state, self.config.loading_text.clone());
    }

    fn write_title(&self, state: &mut ControllerState, title: String) {
        self.surface.set_title(&title);
        state.title = title;
    }

    fn write_body(&self, state: &mut ControllerState, html: String) {
        self.surface.set_body(&html);
        state.body = html;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
