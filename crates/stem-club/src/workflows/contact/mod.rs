//! Contact message intake.

pub mod domain;
pub mod schema;

use std::sync::Arc;

pub use domain::{ContactField, ContactSubmission, ContactSubmissionDraft};
pub use schema::ContactSchema;

use super::intake::{Notifier, SubmissionController};
use crate::store::RemoteStore;

pub type ContactController<S, N> = SubmissionController<ContactSchema, S, N>;

/// Mount a contact form against `store`.
pub fn contact_form<S, N>(store: Arc<S>, notifier: Arc<N>) -> ContactController<S, N>
where
    S: RemoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    SubmissionController::new(ContactSchema, store, notifier)
}
