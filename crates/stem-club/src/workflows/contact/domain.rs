use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflows::intake::validation::text_member;
use crate::workflows::intake::{FieldErrors, FormDraft};

/// Raw contact form input as typed by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSubmissionDraft {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
}

impl ContactField {
    pub const fn label(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Subject => "subject",
            ContactField::Message => "message",
        }
    }
}

impl ContactSubmissionDraft {
    /// Read a request body leniently. Members of the wrong type are left empty and
    /// reported against their field.
    pub fn from_payload(payload: &Value) -> (Self, FieldErrors<ContactField>) {
        let mut errors = FieldErrors::new();
        let mut read = |field: ContactField| {
            errors
                .check(field, text_member(payload, field.label()))
                .unwrap_or_default()
        };
        let draft = Self {
            name: read(ContactField::Name),
            email: read(ContactField::Email),
            subject: read(ContactField::Subject),
            message: read(ContactField::Message),
        };
        (draft, errors)
    }
}

impl FormDraft for ContactSubmissionDraft {
    type Field = ContactField;
    type Edit = (ContactField, String);

    fn apply(&mut self, (field, value): Self::Edit) -> ContactField {
        let slot = match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Subject => &mut self.subject,
            ContactField::Message => &mut self.message,
        };
        *slot = value;
        field
    }
}

/// Normalized row written to `contact_submissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}
