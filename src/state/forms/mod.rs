//! Multi-step form draft engine
//!
//! Generic over the entity being edited: a host supplies a [`FormSchema`],
//! the engine keeps the draft, validates steps, tracks attachments and
//! computes the change set to submit.

mod attachment;
mod changeset;
mod draft;
mod field;
mod record;
mod schema;
mod validation;
mod wizard;

pub use attachment::{
    AttachmentEntry, AttachmentError, AttachmentSlot, DeletionMarker, LocalFile, RemoteRef,
    RemovedAttachment,
};
pub use changeset::{ChangeSetBuilder, WirePart};
pub use draft::{Draft, DraftError, DraftStore};
pub use field::{FieldKind, FieldSpec, FieldValue};
pub use record::Record;
pub use schema::{EntityKind, FormContext, FormSchema, ParcelSummary, WireEncoding};
pub use validation::{StepValidator, ValidationResult};
pub use wizard::{
    Submission, SubmitOutcome, SubmitTarget, WizardController, WizardError, WizardPhase,
};
