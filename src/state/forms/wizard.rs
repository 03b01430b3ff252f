//! Wizard state machine
//!
//! One controller per edit session. It owns the draft, walks the steps
//! through [`StepValidator`], and hands the final [`ChangeSet`] to the
//! registry API. A second submit while one is in flight is refused, and a
//! response for another session is ignored.

use super::changeset::{ChangeSet, ChangeSetBuilder, IntegrityViolation};
use super::draft::DraftStore;
use super::record::Record;
use super::schema::{EntityKind, FormContext, FormSchema, WireEncoding};
use super::validation::{StepValidator, ValidationResult};
use crate::api::{ApiError, RegistryApi};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// The stored snapshot an edit session diffs against
pub type OriginalRecord = Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Editing,
    Submitting,
    Done,
    /// Abandoned by the user; late responses are dropped
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitTarget {
    Create,
    Update(String),
}

/// Everything the REST collaborator needs for one request
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub session: Uuid,
    pub kind: EntityKind,
    pub encoding: WireEncoding,
    pub target: SubmitTarget,
    pub changes: ChangeSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; the host should refresh its list and close the wizard
    Done,
    /// Back on the last step with the server's message
    Retry { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("submit is only possible from step {last} (currently on {step})")]
    NotAtLastStep { step: usize, last: usize },
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("wizard session is closed")]
    Closed,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Integrity(#[from] IntegrityViolation),
}

#[derive(Debug)]
pub struct WizardController {
    session: Uuid,
    store: DraftStore,
    original: Option<OriginalRecord>,
    step: usize,
    phase: WizardPhase,
    message: Option<String>,
}

impl WizardController {
    /// New-record session with a default draft
    pub fn create(schema: Arc<FormSchema>, context: FormContext) -> Self {
        Self::with_store(DraftStore::init_empty(schema, context), None)
    }

    /// Edit session pre-filled from `record`
    pub fn edit(schema: Arc<FormSchema>, context: FormContext, record: OriginalRecord) -> Self {
        let store = DraftStore::init_from_record(schema, context, &record);
        Self::with_store(store, Some(record))
    }

    fn with_store(store: DraftStore, original: Option<OriginalRecord>) -> Self {
        let session = Uuid::new_v4();
        tracing::debug!(
            "Wizard {session} opened for {} ({})",
            store.schema().kind,
            if original.is_some() { "edit" } else { "create" }
        );
        Self {
            session,
            store,
            original,
            step: 1,
            phase: WizardPhase::Editing,
            message: None,
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Current step, 1-based
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn step_count(&self) -> usize {
        self.store.schema().step_count().max(1)
    }

    pub fn is_last_step(&self) -> bool {
        self.step >= self.step_count()
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn is_edit(&self) -> bool {
        self.original.is_some()
    }

    /// Message to show the user (validation failure or server error)
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    /// Mutable draft access; the draft is frozen outside `Editing`
    pub fn edit_draft(&mut self) -> Option<&mut DraftStore> {
        match self.phase {
            WizardPhase::Editing => Some(&mut self.store),
            _ => None,
        }
    }

    fn validate_current(&self) -> ValidationResult {
        StepValidator::new(self.store.schema()).validate(self.step, self.store.snapshot())
    }

    /// Validate the current step and advance on success
    pub fn next(&mut self) -> ValidationResult {
        if self.phase != WizardPhase::Editing || self.is_last_step() {
            return ValidationResult::blocked();
        }
        let result = self.validate_current();
        if result.ok {
            self.step += 1;
            self.message = None;
            tracing::debug!("Wizard {} moved to step {}", self.session, self.step);
        } else {
            self.message = result.message.clone();
        }
        result
    }

    /// Step back without validation; stays on step 1
    pub fn prev(&mut self) {
        if self.phase == WizardPhase::Editing && self.step > 1 {
            self.step -= 1;
            self.message = None;
        }
    }

    /// Freeze the draft and produce the request to send.
    ///
    /// The last step's rules run first, so a single-step form is still
    /// validated.
    pub fn begin_submit(&mut self) -> Result<Submission, WizardError> {
        match self.phase {
            WizardPhase::Editing => {}
            WizardPhase::Submitting => return Err(WizardError::AlreadySubmitting),
            WizardPhase::Done | WizardPhase::Closed => return Err(WizardError::Closed),
        }
        if !self.is_last_step() {
            return Err(WizardError::NotAtLastStep {
                step: self.step,
                last: self.step_count(),
            });
        }

        let result = self.validate_current();
        if !result.ok {
            let message = result.message.unwrap_or_default();
            self.message = Some(message.clone());
            return Err(WizardError::Invalid(message));
        }

        let schema = self.store.schema();
        let changes = ChangeSetBuilder::new(schema, self.original.as_ref())
            .build(self.store.snapshot())?;
        let submission = Submission {
            session: self.session,
            kind: schema.kind,
            encoding: schema.encoding,
            target: match &self.original {
                Some(record) => SubmitTarget::Update(record.id.clone()),
                None => SubmitTarget::Create,
            },
            changes,
        };

        self.phase = WizardPhase::Submitting;
        self.message = None;
        tracing::debug!("Wizard {} submitting", self.session);
        Ok(submission)
    }

    /// Apply the server's answer for `session`.
    ///
    /// Returns `None` when the answer belongs to another session or the
    /// wizard is no longer waiting for one.
    pub fn finish_submit(
        &mut self,
        session: Uuid,
        result: Result<(), ApiError>,
    ) -> Option<SubmitOutcome> {
        if session != self.session || self.phase != WizardPhase::Submitting {
            tracing::warn!("Ignoring stale submit response for session {session}");
            return None;
        }
        match result {
            Ok(()) => {
                self.phase = WizardPhase::Done;
                tracing::info!("Saved {} from wizard {}", self.store.schema().kind, self.session);
                Some(SubmitOutcome::Done)
            }
            Err(err) => {
                let message = err.user_message_or(self.store.schema().failure_message);
                tracing::warn!("Submit failed for wizard {}: {err}", self.session);
                self.phase = WizardPhase::Editing;
                self.step = self.step_count();
                self.message = Some(message.clone());
                Some(SubmitOutcome::Retry { message })
            }
        }
    }

    /// Abandon the session. An in-flight request is not cancelled.
    pub fn close(&mut self) {
        self.phase = WizardPhase::Closed;
    }

    /// Submit and wait for the answer in one go
    pub async fn submit(&mut self, api: &dyn RegistryApi) -> Result<SubmitOutcome, WizardError> {
        let submission = self.begin_submit()?;
        let result = api.submit(&submission).await;
        self.finish_submit(submission.session, result)
            .ok_or(WizardError::Closed)
    }
}
