use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::directory::SectorId;
use super::schema::SECTOR_UNKNOWN;
use crate::workflows::intake::validation::text_member;
use crate::workflows::intake::{FieldErrors, FormDraft};

/// Raw membership application input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MembershipApplicationDraft {
    pub full_name: String,
    pub email: String,
    pub school_class: String,
    /// Sectors in the order the applicant picked them; may contain repeats.
    pub sector_selection: Vec<SectorId>,
    pub reason_to_join: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MembershipField {
    FullName,
    Email,
    SchoolClass,
    SectorSelection,
    ReasonToJoin,
}

impl MembershipField {
    pub const fn label(self) -> &'static str {
        match self {
            MembershipField::FullName => "fullName",
            MembershipField::Email => "email",
            MembershipField::SchoolClass => "schoolClass",
            MembershipField::SectorSelection => "sectorSelection",
            MembershipField::ReasonToJoin => "reasonToJoin",
        }
    }
}

/// A single change made through the membership form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEdit {
    FullName(String),
    Email(String),
    SchoolClass(String),
    /// Multi-select click: adds the sector, or removes it when already picked.
    ToggleSector(SectorId),
    ReplaceSectors(Vec<SectorId>),
    ReasonToJoin(String),
}

impl MembershipApplicationDraft {
    /// Read a request body leniently. Members of the wrong type are left empty and
    /// reported against their field; a selection that is not a list of sector ids
    /// counts as an unknown sector.
    pub fn from_payload(payload: &Value) -> (Self, FieldErrors<MembershipField>) {
        let mut errors = FieldErrors::new();
        let mut read = |field: MembershipField| {
            errors
                .check(field, text_member(payload, field.label()))
                .unwrap_or_default()
        };
        let full_name = read(MembershipField::FullName);
        let email = read(MembershipField::Email);
        let school_class = read(MembershipField::SchoolClass);
        let reason_to_join = read(MembershipField::ReasonToJoin);

        let sector_selection = match payload.get(MembershipField::SectorSelection.label()) {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => Vec::<SectorId>::deserialize(raw).unwrap_or_else(|_| {
                errors.insert(MembershipField::SectorSelection, SECTOR_UNKNOWN);
                Vec::new()
            }),
        };

        let draft = Self {
            full_name,
            email,
            school_class,
            sector_selection,
            reason_to_join,
        };
        (draft, errors)
    }
}

impl FormDraft for MembershipApplicationDraft {
    type Field = MembershipField;
    type Edit = MembershipEdit;

    fn apply(&mut self, edit: MembershipEdit) -> MembershipField {
        match edit {
            MembershipEdit::FullName(value) => {
                self.full_name = value;
                MembershipField::FullName
            }
            MembershipEdit::Email(value) => {
                self.email = value;
                MembershipField::Email
            }
            MembershipEdit::SchoolClass(value) => {
                self.school_class = value;
                MembershipField::SchoolClass
            }
            MembershipEdit::ToggleSector(id) => {
                if self.sector_selection.contains(&id) {
                    self.sector_selection.retain(|picked| *picked != id);
                } else {
                    self.sector_selection.push(id);
                }
                MembershipField::SectorSelection
            }
            MembershipEdit::ReplaceSectors(ids) => {
                self.sector_selection = ids;
                MembershipField::SectorSelection
            }
            MembershipEdit::ReasonToJoin(value) => {
                self.reason_to_join = value;
                MembershipField::ReasonToJoin
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Pending,
}

/// Normalized row written to `members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipApplication {
    pub full_name: String,
    pub email: String,
    pub school_class: String,
    /// One or two sector references, in directory display order.
    pub sector_interest: Vec<SectorId>,
    pub reason_to_join: String,
    pub status: MemberStatus,
}
