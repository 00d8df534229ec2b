//! Shared form-submission machinery: field validation, notices, and the
//! `Idle → Submitting → Accepted | Rejected` controller.

pub mod controller;
pub mod notice;
pub mod validation;

#[cfg(test)]
mod tests;

pub use controller::{
    EditOf, FieldOf, FormDraft, FormSchema, FormSnapshot, RejectionReason, SubmissionController,
    SubmissionOutcome, SubmitResult,
};
pub use notice::{FormNotices, Notice, NoticeBuffer, NoticeTone, Notifier};
pub use validation::FieldErrors;
