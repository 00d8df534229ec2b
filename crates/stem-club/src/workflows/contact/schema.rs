use super::domain::{ContactField, ContactSubmission, ContactSubmissionDraft};
use crate::workflows::intake::validation::{email, required};
use crate::workflows::intake::{FieldErrors, FormNotices, FormSchema, Notice};

pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const SUBJECT_REQUIRED: &str = "Subject is required";
pub const MESSAGE_REQUIRED: &str = "Message is required";

/// Every field required after trimming; email syntax-checked and lower-cased.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactSchema;

impl ContactSchema {
    pub fn check(
        draft: &ContactSubmissionDraft,
    ) -> Result<ContactSubmission, FieldErrors<ContactField>> {
        let mut errors = FieldErrors::new();

        let name = errors.check(ContactField::Name, required(&draft.name, NAME_REQUIRED));
        let address = errors.check(
            ContactField::Email,
            required(&draft.email, EMAIL_REQUIRED).and_then(|value| email(value, EMAIL_INVALID)),
        );
        let subject = errors.check(
            ContactField::Subject,
            required(&draft.subject, SUBJECT_REQUIRED),
        );
        let message = errors.check(
            ContactField::Message,
            required(&draft.message, MESSAGE_REQUIRED),
        );

        match (name, address, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) => Ok(ContactSubmission {
                name,
                email,
                subject,
                message,
            }),
            _ => Err(errors),
        }
    }
}

impl FormSchema for ContactSchema {
    type Draft = ContactSubmissionDraft;
    type Record = ContactSubmission;

    const COLLECTION: &'static str = "contact_submissions";
    const NOTICES: FormNotices = FormNotices {
        accepted: Notice::success("Message Sent!", "Thank you. We'll get back to you soon."),
        invalid: Notice::destructive(
            "Check your message",
            "Some fields need attention before we can send it.",
        ),
        duplicate: Notice::destructive(
            "Duplicate Submission",
            "You've already sent this message. Please wait for our response.",
        ),
        failed: Notice::destructive(
            "Submission Failed",
            "Error submitting message. Please try again.",
        ),
    };

    fn validate(
        &self,
        draft: &ContactSubmissionDraft,
    ) -> Result<ContactSubmission, FieldErrors<ContactField>> {
        Self::check(draft)
    }
}
