use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::notice::{FormNotices, Notice, Notifier};
use super::validation::FieldErrors;
use crate::store::{RemoteError, RemoteErrorKind, RemoteStore};

/// In-progress form input that can be edited one field at a time.
pub trait FormDraft: Clone + Default + Send + 'static {
    type Field: Copy + Ord + fmt::Debug + Send + Sync + 'static;
    type Edit: Send;

    /// Apply a single edit and report which field it touched.
    fn apply(&mut self, edit: Self::Edit) -> Self::Field;
}

/// Validation schema plus persistence target for one kind of form.
pub trait FormSchema: Send + 'static {
    type Draft: FormDraft;
    type Record: Serialize;

    const COLLECTION: &'static str;
    const NOTICES: FormNotices;

    fn validate(&self, draft: &Self::Draft) -> Result<Self::Record, FieldErrors<FieldOf<Self>>>;
}

pub type FieldOf<F> = <<F as FormSchema>::Draft as FormDraft>::Field;
pub type EditOf<F> = <<F as FormSchema>::Draft as FormDraft>::Edit;

/// Why a submission attempt ended in `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The store reported a uniqueness violation; resubmitting the same draft is blocked.
    DuplicateSubmission,
    /// Any other remote or unexpected failure; the draft is kept for a retry.
    TransientFailure,
}

impl RejectionReason {
    fn from_remote(error: &RemoteError) -> Self {
        match error.kind() {
            RemoteErrorKind::DuplicateKey => Self::DuplicateSubmission,
            RemoteErrorKind::Other => Self::TransientFailure,
        }
    }
}

/// Lifecycle of the controller's current submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Idle,
    Submitting,
    Accepted,
    Rejected(RejectionReason),
}

impl SubmissionOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionOutcome::Idle => "idle",
            SubmissionOutcome::Submitting => "submitting",
            SubmissionOutcome::Accepted => "accepted",
            SubmissionOutcome::Rejected(RejectionReason::DuplicateSubmission) => "duplicate",
            SubmissionOutcome::Rejected(RejectionReason::TransientFailure) => "failed",
        }
    }
}

/// What a call to [`SubmissionController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult<K: Ord> {
    Accepted,
    /// Validation failed; nothing was sent.
    Invalid(FieldErrors<K>),
    Rejected(RejectionReason),
    /// Trigger disabled while an attempt is in flight.
    InFlight,
    /// Requires `submit_another` first.
    AlreadyAccepted,
    /// Unedited draft already rejected as a duplicate.
    Blocked,
    /// The form was unmounted; any late result was dropped.
    Detached,
}

/// Read-only view of the form for rendering.
#[derive(Debug, Clone)]
pub struct FormSnapshot<D, K: Ord> {
    pub draft: D,
    pub field_errors: FieldErrors<K>,
    pub outcome: SubmissionOutcome,
    pub submit_enabled: bool,
}

struct FormState<F: FormSchema> {
    schema: F,
    draft: F::Draft,
    field_errors: FieldErrors<FieldOf<F>>,
    outcome: SubmissionOutcome,
    mounted: bool,
}

impl<F: FormSchema> FormState<F> {
    fn submit_enabled(&self) -> bool {
        self.mounted
            && !matches!(
                self.outcome,
                SubmissionOutcome::Submitting
                    | SubmissionOutcome::Accepted
                    | SubmissionOutcome::Rejected(RejectionReason::DuplicateSubmission)
            )
    }
}

/// Owns one mounted form: its draft, field errors and submission lifecycle.
///
/// At most one insert is in flight per controller. A second `submit` while
/// `Submitting` returns [`SubmitResult::InFlight`] without touching the store.
pub struct SubmissionController<F, S, N>
where
    F: FormSchema,
    S: RemoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    store: Arc<S>,
    notifier: Arc<N>,
    state: Mutex<FormState<F>>,
}

impl<F, S, N> SubmissionController<F, S, N>
where
    F: FormSchema,
    S: RemoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(schema: F, store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            store,
            notifier,
            state: Mutex::new(FormState {
                schema,
                draft: F::Draft::default(),
                field_errors: FieldErrors::new(),
                outcome: SubmissionOutcome::Idle,
                mounted: true,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> FormSnapshot<F::Draft, FieldOf<F>> {
        let state = self.lock();
        FormSnapshot {
            draft: state.draft.clone(),
            field_errors: state.field_errors.clone(),
            outcome: state.outcome,
            submit_enabled: state.submit_enabled(),
        }
    }

    pub fn outcome(&self) -> SubmissionOutcome {
        self.lock().outcome
    }

    pub fn submit_enabled(&self) -> bool {
        self.lock().submit_enabled()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Apply a user edit. Clears that field's error and leaves `Rejected`.
    /// Returns false when the form is closed (accepted or unmounted).
    pub fn edit(&self, edit: EditOf<F>) -> bool {
        let mut state = self.lock();
        if !state.mounted || state.outcome == SubmissionOutcome::Accepted {
            return false;
        }
        let field = state.draft.apply(edit);
        state.field_errors.remove(field);
        if matches!(state.outcome, SubmissionOutcome::Rejected(_)) {
            state.outcome = SubmissionOutcome::Idle;
        }
        true
    }

    /// Replace the whole draft at once, as when a full payload arrives.
    pub fn fill(&self, draft: F::Draft) -> bool {
        let mut state = self.lock();
        if !state.mounted || state.outcome == SubmissionOutcome::Accepted {
            return false;
        }
        state.draft = draft;
        state.field_errors.clear();
        if matches!(state.outcome, SubmissionOutcome::Rejected(_)) {
            state.outcome = SubmissionOutcome::Idle;
        }
        true
    }

    /// Explicit "submit another" after an accepted submission.
    pub fn submit_another(&self) -> bool {
        let mut state = self.lock();
        if !state.mounted || state.outcome != SubmissionOutcome::Accepted {
            return false;
        }
        state.outcome = SubmissionOutcome::Idle;
        true
    }

    /// Tear the form down. Results still in flight are ignored when they land.
    pub fn unmount(&self) {
        self.lock().mounted = false;
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Run `update` against the schema unless the form was unmounted.
    pub(crate) fn with_schema<R>(&self, update: impl FnOnce(&mut F) -> R) -> Option<R> {
        let mut state = self.lock();
        if !state.mounted {
            return None;
        }
        Some(update(&mut state.schema))
    }

    pub(crate) fn read_schema<R>(&self, read: impl FnOnce(&F) -> R) -> R {
        read(&self.lock().schema)
    }

    /// Validate, persist, and reflect the result in the form state.
    pub async fn submit(&self) -> SubmitResult<FieldOf<F>> {
        let payload = match self.begin_attempt() {
            Ok(payload) => payload,
            Err(result) => return result,
        };

        let attempt = AssertUnwindSafe(self.store.insert(F::COLLECTION, payload))
            .catch_unwind()
            .await;

        let resolution = match attempt {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => {
                warn!(
                    collection = F::COLLECTION,
                    kind = error.label(),
                    %error,
                    "submission rejected by store"
                );
                Err(RejectionReason::from_remote(&error))
            }
            Err(panic) => {
                error!(
                    collection = F::COLLECTION,
                    panic = panic_message(panic.as_ref()),
                    "submission attempt panicked"
                );
                Err(RejectionReason::TransientFailure)
            }
        };

        self.finish_attempt(resolution)
    }

    /// Refuse a draft whose raw input was malformed before it reached the schema.
    ///
    /// `malformed` messages win over schema messages for the same field. Nothing is sent.
    pub fn reject_input(&self, malformed: FieldErrors<FieldOf<F>>) -> SubmitResult<FieldOf<F>> {
        let mut state = self.lock();
        if !state.mounted {
            return SubmitResult::Detached;
        }
        match state.outcome {
            SubmissionOutcome::Submitting => return SubmitResult::InFlight,
            SubmissionOutcome::Accepted => return SubmitResult::AlreadyAccepted,
            SubmissionOutcome::Idle | SubmissionOutcome::Rejected(_) => {}
        }

        let mut errors = malformed;
        if let Err(found) = state.schema.validate(&state.draft) {
            for (field, message) in found.iter() {
                errors.insert(*field, message.clone());
            }
        }
        state.outcome = SubmissionOutcome::Idle;
        state.field_errors = errors.clone();
        drop(state);

        info!(
            collection = F::COLLECTION,
            fields = ?errors.fields(),
            "malformed input rejected"
        );
        self.notify(F::NOTICES.invalid);
        SubmitResult::Invalid(errors)
    }

    fn begin_attempt(&self) -> Result<Value, SubmitResult<FieldOf<F>>> {
        let mut state = self.lock();
        if !state.mounted {
            return Err(SubmitResult::Detached);
        }

        match state.outcome {
            SubmissionOutcome::Submitting => {
                debug!(collection = F::COLLECTION, "submit ignored while in flight");
                return Err(SubmitResult::InFlight);
            }
            SubmissionOutcome::Accepted => return Err(SubmitResult::AlreadyAccepted),
            SubmissionOutcome::Rejected(RejectionReason::DuplicateSubmission) => {
                return Err(SubmitResult::Blocked)
            }
            SubmissionOutcome::Idle | SubmissionOutcome::Rejected(_) => {}
        }

        let validated = state.schema.validate(&state.draft);
        match validated.map(|record| serde_json::to_value(&record)) {
            Ok(Ok(payload)) => {
                state.field_errors.clear();
                state.outcome = SubmissionOutcome::Submitting;
                Ok(payload)
            }
            Ok(Err(err)) => {
                state.outcome = SubmissionOutcome::Rejected(RejectionReason::TransientFailure);
                drop(state);
                error!(collection = F::COLLECTION, error = %err, "record failed to serialize");
                self.notify(F::NOTICES.failed);
                Err(SubmitResult::Rejected(RejectionReason::TransientFailure))
            }
            Err(errors) => {
                state.outcome = SubmissionOutcome::Idle;
                state.field_errors = errors.clone();
                drop(state);
                info!(
                    collection = F::COLLECTION,
                    fields = ?errors.fields(),
                    "draft failed validation"
                );
                self.notify(F::NOTICES.invalid);
                Err(SubmitResult::Invalid(errors))
            }
        }
    }

    fn finish_attempt(&self, resolution: Result<(), RejectionReason>) -> SubmitResult<FieldOf<F>> {
        let (notice, result) = {
            let mut state = self.lock();
            if !state.mounted {
                debug!(collection = F::COLLECTION, "late result ignored after unmount");
                return SubmitResult::Detached;
            }

            match resolution {
                Ok(()) => {
                    state.draft = F::Draft::default();
                    state.field_errors.clear();
                    state.outcome = SubmissionOutcome::Accepted;
                    (F::NOTICES.accepted, SubmitResult::Accepted)
                }
                Err(reason) => {
                    state.outcome = SubmissionOutcome::Rejected(reason);
                    let notice = match reason {
                        RejectionReason::DuplicateSubmission => F::NOTICES.duplicate,
                        RejectionReason::TransientFailure => F::NOTICES.failed,
                    };
                    (notice, SubmitResult::Rejected(reason))
                }
            }
        };

        if matches!(result, SubmitResult::Accepted) {
            info!(collection = F::COLLECTION, "submission accepted");
        }
        self.notify(notice);
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
