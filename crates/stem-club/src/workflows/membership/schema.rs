use super::directory::{SectorDirectory, SectorId};
use super::domain::{
    MemberStatus, MembershipApplication, MembershipApplicationDraft, MembershipField,
};
use crate::workflows::intake::validation::{email, max_chars, min_chars, required, trimmed};
use crate::workflows::intake::{FieldErrors, FormNotices, FormSchema, Notice};

pub const MAX_SECTORS: usize = 2;

pub const FULL_NAME_TOO_SHORT: &str = "Full name must be at least 2 characters";
pub const FULL_NAME_TOO_LONG: &str = "Full name must be at most 100 characters";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const EMAIL_TOO_LONG: &str = "Email must be at most 255 characters";
pub const SCHOOL_CLASS_REQUIRED: &str = "School ID / class is required";
pub const SCHOOL_CLASS_TOO_LONG: &str = "School ID / class must be at most 50 characters";
pub const SECTOR_REQUIRED: &str = "Please select at least one sector";
pub const SECTOR_LIMIT: &str = "You can select at most 2 sectors";
pub const SECTOR_UNKNOWN: &str = "Please choose sectors from the list";
pub const REASON_TOO_SHORT: &str = "Tell us why you want to join in at least 20 characters";
pub const REASON_TOO_LONG: &str = "Reason to join must be at most 2000 characters";

/// Membership rules; sector references are checked against the loaded directory.
#[derive(Debug, Clone, Default)]
pub struct MembershipSchema {
    directory: SectorDirectory,
}

impl MembershipSchema {
    pub fn new(directory: SectorDirectory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &SectorDirectory {
        &self.directory
    }

    pub(crate) fn replace_directory(&mut self, directory: SectorDirectory) {
        self.directory = directory;
    }

    /// De-duplicate, bound to 1..=2, require directory membership, and order by display order.
    fn sector_selection(&self, selection: &[SectorId]) -> Result<Vec<SectorId>, String> {
        // Stops at the first entry past the limit, so `distinct` never exceeds MAX_SECTORS.
        let mut distinct: Vec<SectorId> = Vec::with_capacity(MAX_SECTORS);
        for id in selection {
            if distinct.contains(id) {
                continue;
            }
            if distinct.len() == MAX_SECTORS {
                return Err(SECTOR_LIMIT.to_string());
            }
            distinct.push(*id);
        }

        if distinct.is_empty() {
            return Err(SECTOR_REQUIRED.to_string());
        }

        let mut positioned = Vec::with_capacity(distinct.len());
        for id in distinct {
            let position = self
                .directory
                .position(id)
                .ok_or_else(|| SECTOR_UNKNOWN.to_string())?;
            positioned.push((position, id));
        }
        positioned.sort_by_key(|(position, _)| *position);
        Ok(positioned.into_iter().map(|(_, id)| id).collect())
    }

    pub fn check(
        &self,
        draft: &MembershipApplicationDraft,
    ) -> Result<MembershipApplication, FieldErrors<MembershipField>> {
        let mut errors = FieldErrors::new();

        let full_name = errors.check(
            MembershipField::FullName,
            min_chars(trimmed(&draft.full_name), 2, FULL_NAME_TOO_SHORT)
                .and_then(|value| max_chars(value, 100, FULL_NAME_TOO_LONG)),
        );
        let address = errors.check(
            MembershipField::Email,
            required(&draft.email, EMAIL_REQUIRED)
                .and_then(|value| email(value, EMAIL_INVALID))
                .and_then(|value| max_chars(value, 255, EMAIL_TOO_LONG)),
        );
        let school_class = errors.check(
            MembershipField::SchoolClass,
            required(&draft.school_class, SCHOOL_CLASS_REQUIRED)
                .and_then(|value| max_chars(value, 50, SCHOOL_CLASS_TOO_LONG)),
        );
        let sectors = errors.check(
            MembershipField::SectorSelection,
            self.sector_selection(&draft.sector_selection),
        );
        let reason = errors.check(
            MembershipField::ReasonToJoin,
            min_chars(trimmed(&draft.reason_to_join), 20, REASON_TOO_SHORT)
                .and_then(|value| max_chars(value, 2000, REASON_TOO_LONG)),
        );

        match (full_name, address, school_class, sectors, reason) {
            (
                Some(full_name),
                Some(email),
                Some(school_class),
                Some(sector_interest),
                Some(reason_to_join),
            ) => Ok(MembershipApplication {
                full_name,
                email,
                school_class,
                sector_interest,
                reason_to_join,
                status: MemberStatus::Pending,
            }),
            _ => Err(errors),
        }
    }
}

impl FormSchema for MembershipSchema {
    type Draft = MembershipApplicationDraft;
    type Record = MembershipApplication;

    const COLLECTION: &'static str = "members";
    const NOTICES: FormNotices = FormNotices {
        accepted: Notice::success(
            "Application Submitted!",
            "We'll review your application and get back to you soon.",
        ),
        invalid: Notice::destructive(
            "Check your application",
            "Some fields need attention before you can apply.",
        ),
        duplicate: Notice::destructive(
            "Application Already Received",
            "An application with this email is already on file. Our team will contact you, so please don't submit again.",
        ),
        failed: Notice::destructive(
            "Submission Failed",
            "Error submitting your application. Please try again.",
        ),
    };

    fn validate(
        &self,
        draft: &MembershipApplicationDraft,
    ) -> Result<MembershipApplication, FieldErrors<MembershipField>> {
        self.check(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::super::directory::Sector;
    use super::*;
    use uuid::Uuid;

    fn id(n: u128) -> SectorId {
        SectorId(Uuid::from_u128(n))
    }

    fn schema() -> MembershipSchema {
        MembershipSchema::new(SectorDirectory::new(vec![
            Sector {
                id: id(1),
                name: "Sustainability Sector".to_string(),
                display_order: 1,
            },
            Sector {
                id: id(2),
                name: "Technology Sector".to_string(),
                display_order: 2,
            },
            Sector {
                id: id(3),
                name: "Mathematics Sector".to_string(),
                display_order: 5,
            },
        ]))
    }

    fn draft() -> MembershipApplicationDraft {
        MembershipApplicationDraft {
            full_name: " Ada Nakato ".to_string(),
            email: " Ada@School.ac.ug ".to_string(),
            school_class: " S5B ".to_string(),
            sector_selection: vec![id(2)],
            reason_to_join: "I want to represent my school at robotics competitions.".to_string(),
        }
    }

    #[test]
    fn accepts_and_normalizes() {
        let record = schema().check(&draft()).expect("valid application");
        assert_eq!(record.full_name, "Ada Nakato");
        assert_eq!(record.email, "ada@school.ac.ug");
        assert_eq!(record.school_class, "S5B");
        assert_eq!(record.sector_interest, vec![id(2)]);
        assert_eq!(record.status, MemberStatus::Pending);
    }

    #[test]
    fn short_reason_mentions_twenty_characters() {
        let mut raw = draft();
        raw.reason_to_join = "Love STEM!".to_string();
        assert_eq!(raw.reason_to_join.chars().count(), 10);
        let errors = schema().check(&raw).expect_err("too short");
        assert_eq!(errors.fields(), vec![MembershipField::ReasonToJoin]);
        assert!(errors
            .get(MembershipField::ReasonToJoin)
            .is_some_and(|message| message.contains("20 characters")));
    }

    #[test]
    fn length_bounds_are_inclusive_after_trimming() {
        let schema = schema();
        let mut raw = draft();
        raw.full_name = "  Jo  ".to_string();
        raw.reason_to_join = format!("  {}  ", "r".repeat(20));
        raw.school_class = "c".repeat(50);
        assert!(schema.check(&raw).is_ok());

        raw.full_name = "n".repeat(100);
        raw.reason_to_join = "r".repeat(2000);
        assert!(schema.check(&raw).is_ok());

        raw.full_name = "n".repeat(101);
        raw.reason_to_join = "r".repeat(2001);
        raw.school_class = "c".repeat(51);
        let errors = schema.check(&raw).expect_err("upper bounds exceeded");
        assert_eq!(errors.get(MembershipField::FullName), Some(FULL_NAME_TOO_LONG));
        assert_eq!(errors.get(MembershipField::ReasonToJoin), Some(REASON_TOO_LONG));
        assert_eq!(
            errors.get(MembershipField::SchoolClass),
            Some(SCHOOL_CLASS_TOO_LONG)
        );

        raw = draft();
        raw.full_name = " J ".to_string();
        let errors = schema.check(&raw).expect_err("one character name");
        assert_eq!(errors.get(MembershipField::FullName), Some(FULL_NAME_TOO_SHORT));
    }

    #[test]
    fn email_limit_is_255_characters() {
        let schema = schema();
        let mut raw = draft();
        let domain = "@example.com";
        raw.email = format!("{}{}", "a".repeat(255 - domain.len()), domain);
        assert!(schema.check(&raw).is_ok());

        raw.email = format!("{}{}", "a".repeat(256 - domain.len()), domain);
        let errors = schema.check(&raw).expect_err("too long");
        assert_eq!(errors.get(MembershipField::Email), Some(EMAIL_TOO_LONG));
    }

    #[test]
    fn duplicate_sectors_count_once() {
        let mut raw = draft();
        raw.sector_selection = vec![id(2), id(2), id(2)];
        let record = schema().check(&raw).expect("one distinct sector");
        assert_eq!(record.sector_interest, vec![id(2)]);
    }

    #[test]
    fn more_than_two_distinct_sectors_rejected() {
        let mut raw = draft();
        raw.sector_selection = vec![id(1), id(2), id(3)];
        let errors = schema().check(&raw).expect_err("three sectors");
        assert_eq!(errors.get(MembershipField::SectorSelection), Some(SECTOR_LIMIT));
    }

    #[test]
    fn oversized_selection_stops_at_the_limit() {
        let mut raw = draft();
        raw.sector_selection = (1..=200_000).map(id).collect();
        let errors = schema().check(&raw).expect_err("too many sectors");
        assert_eq!(errors.get(MembershipField::SectorSelection), Some(SECTOR_LIMIT));

        raw.sector_selection = [id(3), id(1)].repeat(100_000);
        let record = schema().check(&raw).expect("two distinct sectors");
        assert_eq!(record.sector_interest, vec![id(1), id(3)]);
    }

    #[test]
    fn empty_selection_rejected() {
        let mut raw = draft();
        raw.sector_selection.clear();
        let errors = schema().check(&raw).expect_err("no sectors");
        assert_eq!(
            errors.get(MembershipField::SectorSelection),
            Some(SECTOR_REQUIRED)
        );
    }

    #[test]
    fn sectors_outside_directory_rejected() {
        let mut raw = draft();
        raw.sector_selection = vec![id(2), id(42)];
        let errors = schema().check(&raw).expect_err("unknown sector");
        assert_eq!(
            errors.get(MembershipField::SectorSelection),
            Some(SECTOR_UNKNOWN)
        );
    }

    #[test]
    fn accepted_sectors_follow_display_order() {
        let mut raw = draft();
        raw.sector_selection = vec![id(3), id(1)];
        let record = schema().check(&raw).expect("two sectors");
        assert_eq!(record.sector_interest, vec![id(1), id(3)]);
    }

    #[test]
    fn empty_directory_blocks_every_selection() {
        let schema = MembershipSchema::default();
        let mut raw = draft();
        raw.sector_selection.clear();
        let errors = schema.check(&raw).expect_err("nothing selectable");
        assert_eq!(errors.fields(), vec![MembershipField::SectorSelection]);
    }

    #[test]
    fn every_field_reports_its_own_error() {
        let errors = schema()
            .check(&MembershipApplicationDraft::default())
            .expect_err("blank draft");
        assert_eq!(
            errors.fields(),
            vec![
                MembershipField::FullName,
                MembershipField::Email,
                MembershipField::SchoolClass,
                MembershipField::SectorSelection,
                MembershipField::ReasonToJoin,
            ]
        );
        assert_eq!(errors.get(MembershipField::Email), Some(EMAIL_REQUIRED));
    }

    #[test]
    fn validation_is_idempotent() {
        let schema = schema();
        let mut raw = draft();
        raw.sector_selection = vec![id(1), id(1), id(3)];
        assert_eq!(schema.check(&raw), schema.check(&raw));
    }
}
