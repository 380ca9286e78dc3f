use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{CallSite, Field, FormFields, SubmissionStatus},
    error::FormError,
    protocol::RegistrationRequest,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod config;
pub mod validation;

pub use config::{load_settings, load_settings_from, Settings, SettingsError};

/// The remote half of a submission. The form only cares whether it succeeded.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, request: &RegistrationRequest) -> Result<()>;
}

/// Waits out a fixed latency and reports success without doing any I/O.
pub struct SimulatedRegistrar {
    latency: Duration,
}

impl SimulatedRegistrar {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.submit_latency())
    }
}

#[async_trait]
impl Registrar for SimulatedRegistrar {
    async fn register(&self, request: &RegistrationRequest) -> Result<()> {
        debug!(
            request_id = %request.request_id,
            latency_ms = self.latency.as_millis() as u64,
            "simulating registration round trip"
        );
        tokio::time::sleep(self.latency).await;
        Ok(())
    }
}

/// Everything a view needs to draw the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    pub visible: bool,
    pub fields: FormFields,
    pub status: SubmissionStatus,
    pub opened_from: Option<CallSite>,
}

impl FormSnapshot {
    pub fn error_message(&self) -> Option<String> {
        self.status.error_message()
    }

    pub fn is_editable(&self) -> bool {
        self.visible && self.status.is_idle()
    }

    pub fn submit_enabled(&self) -> bool {
        !self.status.is_submitting()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FormEvent {
    Opened { site: Option<CallSite> },
    Closed { fields_reset: bool },
    FieldChanged { field: Field },
    StatusChanged(SubmissionStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Hidden,
    NotIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Registered,
    Failed(FormError),
    /// The form was closed while the registrar was still working; the result was
    /// dropped.
    Abandoned,
    Rejected(RejectReason),
}

struct ControllerState {
    fields: FormFields,
    status: SubmissionStatus,
    visible: bool,
    opened_from: Option<CallSite>,
    // Bumped on every close. Completions and deferred resets carry the value they
    // started under and give up if it moved.
    generation: u64,
}

/// The single registration form of a page session.
pub struct RegistrationController {
    registrar: Arc<dyn Registrar>,
    success_close_delay: Duration,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<FormEvent>,
}

impl RegistrationController {
    pub fn new(settings: &Settings) -> Arc<Self> {
        Self::new_with_registrar(settings, Arc::new(SimulatedRegistrar::from_settings(settings)))
    }

    pub fn new_with_registrar(settings: &Settings, registrar: Arc<dyn Registrar>) -> Arc<Self> {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        Arc::new(Self {
            registrar,
            success_close_delay: settings.success_close_delay(),
            inner: Mutex::new(ControllerState {
                fields: FormFields::default(),
                status: SubmissionStatus::Idle,
                visible: false,
                opened_from: None,
                generation: 0,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    /// A handle for one page section that can open this form.
    pub fn launcher(self: &Arc<Self>, site: CallSite) -> FormLauncher {
        FormLauncher {
            controller: Arc::clone(self),
            site,
        }
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        let guard = self.inner.lock().await;
        FormSnapshot {
            visible: guard.visible,
            fields: guard.fields.clone(),
            status: guard.status.clone(),
            opened_from: guard.opened_from,
        }
    }

    /// Shows the form. Returns `false` when it was already showing.
    pub async fn open(&self) -> bool {
        self.open_inner(None).await
    }

    pub async fn open_from(&self, site: CallSite) -> bool {
        self.open_inner(Some(site)).await
    }

    async fn open_inner(&self, site: Option<CallSite>) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.visible {
            debug!(site = site.map(CallSite::name), "form already open");
            return false;
        }
        guard.visible = true;
        if site.is_some() {
            guard.opened_from = site;
        }
        info!(site = site.map(CallSite::name), "registration form opened");
        self.emit(FormEvent::Opened { site });
        true
    }

    /// Hides the form and forgets any status or error. Field values are kept.
    pub async fn close(&self) {
        let mut guard = self.inner.lock().await;
        self.close_locked(&mut guard, false);
    }

    fn close_locked(&self, state: &mut ControllerState, reset_fields: bool) {
        let was_visible = state.visible;
        let previous = std::mem::take(&mut state.status);

        state.visible = false;
        state.generation += 1;
        if reset_fields {
            state.fields = FormFields::default();
        }

        if previous.is_submitting() {
            warn!("form closed while a registration was in flight; its result will be dropped");
        }
        if previous != SubmissionStatus::Idle {
            self.emit(FormEvent::StatusChanged(SubmissionStatus::Idle));
        }
        if was_visible {
            info!(fields_reset = reset_fields, "registration form closed");
            self.emit(FormEvent::Closed {
                fields_reset: reset_fields,
            });
        }
    }

    pub async fn set_field(&self, field: Field, value: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        guard.fields.set(field, value);
        self.emit(FormEvent::FieldChanged { field });
    }

    pub async fn set_fields(&self, fields: FormFields) {
        let mut guard = self.inner.lock().await;
        guard.fields = fields;
        for field in Field::ALL {
            self.emit(FormEvent::FieldChanged { field });
        }
    }

    /// Leaves the error screen for the editable form. Only meaningful in the error
    /// state; returns `false` otherwise.
    pub async fn retry(&self) -> bool {
        let mut guard = self.inner.lock().await;
        if !matches!(guard.status, SubmissionStatus::Error(_)) {
            debug!(status = guard.status.name(), "retry ignored");
            return false;
        }
        guard.status = SubmissionStatus::Idle;
        self.emit(FormEvent::StatusChanged(SubmissionStatus::Idle));
        true
    }

    /// Registers the current field values, then validates them. On success the
    /// form closes itself and clears its fields once the grace period has passed.
    ///
    /// Dropping the returned future before it completes leaves the form in
    /// `Submitting`; only [`close`](Self::close) brings it back to `Idle`.
    pub async fn submit(self: &Arc<Self>) -> SubmitOutcome {
        let (request, generation) = {
            let mut guard = self.inner.lock().await;
            if !guard.visible {
                debug!("submit ignored: form is not open");
                return SubmitOutcome::Rejected(RejectReason::Hidden);
            }
            if !guard.status.is_idle() {
                debug!(status = guard.status.name(), "submit ignored");
                return SubmitOutcome::Rejected(RejectReason::NotIdle);
            }
            guard.status = SubmissionStatus::Submitting;
            self.emit(FormEvent::StatusChanged(SubmissionStatus::Submitting));
            (
                RegistrationRequest::from_fields(&guard.fields),
                guard.generation,
            )
        };

        info!(
            request_id = %request.request_id,
            domain = %request.full_domain(),
            tier = request.tier.map(|tier| tier.title()),
            "registration submitted"
        );

        let verdict = match self.run_registrar(&request).await {
            Ok(()) => validation::validate(&request.fields()),
            Err(err) => {
                warn!(request_id = %request.request_id, "registration failed: {err:#}");
                Err(FormError::UnexpectedFailure)
            }
        };

        let mut guard = self.inner.lock().await;
        if guard.generation != generation || !guard.status.is_submitting() {
            debug!(
                request_id = %request.request_id,
                "dropping registration result for a closed form"
            );
            return SubmitOutcome::Abandoned;
        }

        match verdict {
            Ok(()) => {
                guard.status = SubmissionStatus::Success;
                self.emit(FormEvent::StatusChanged(SubmissionStatus::Success));
                drop(guard);
                info!(request_id = %request.request_id, "registration succeeded");
                self.schedule_close_after_success(generation);
                SubmitOutcome::Registered
            }
            Err(err) => {
                guard.status = SubmissionStatus::Error(err);
                self.emit(FormEvent::StatusChanged(SubmissionStatus::Error(err)));
                info!(
                    request_id = %request.request_id,
                    error = ?err,
                    code = ?err.code(),
                    "registration rejected"
                );
                SubmitOutcome::Failed(err)
            }
        }
    }

    // Runs on its own task so a panicking registrar surfaces as a failure instead
    // of leaving the form stuck in `Submitting`.
    async fn run_registrar(&self, request: &RegistrationRequest) -> Result<()> {
        let registrar = Arc::clone(&self.registrar);
        let request = request.clone();
        tokio::spawn(async move { registrar.register(&request).await })
            .await
            .map_err(|err| anyhow!("registrar task failed: {err}"))?
    }

    fn schedule_close_after_success(self: &Arc<Self>, generation: u64) {
        let controller: Weak<Self> = Arc::downgrade(self);
        let delay = self.success_close_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(controller) = controller.upgrade() else {
                return;
            };
            controller.close_after_success(generation).await;
        });
    }

    async fn close_after_success(&self, generation: u64) {
        let mut guard = self.inner.lock().await;
        if guard.generation != generation || guard.status != SubmissionStatus::Success {
            debug!("auto-close skipped: form was closed in the meantime");
            return;
        }
        self.close_locked(&mut guard, true);
    }

    fn emit(&self, event: FormEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Open button of one page section, bound to the shared form.
#[derive(Clone)]
pub struct FormLauncher {
    controller: Arc<RegistrationController>,
    site: CallSite,
}

impl FormLauncher {
    pub fn site(&self) -> CallSite {
        self.site
    }

    pub async fn request_open(&self) -> bool {
        self.controller.open_from(self.site).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
