use std::sync::Arc;

use super::common::*;
use crate::workflows::contact::{contact_form, ContactField, ContactSchema};
use crate::workflows::intake::{
    FormSchema, NoticeBuffer, NoticeTone, RejectionReason, SubmissionOutcome, SubmitResult,
};

#[tokio::test]
async fn valid_contact_is_normalized_inserted_once_and_cleared() {
    let store = Arc::new(ScriptedStore::with_sectors());
    let notices = Arc::new(NoticeBuffer::default());
    let form = contact_form(store.clone(), notices.clone());
    form.fill(contact_draft());

    assert_eq!(form.submit().await, SubmitResult::Accepted);

    let inserts = store.inserts();
    assert_eq!(inserts.len(), 1);
    let (collection, record) = &inserts[0];
    assert_eq!(collection, "contact_submissions");
    assert_eq!(record["email"], "amara@example.com");
    assert_eq!(record["name"], "Amara O");

    let snapshot = form.snapshot();
    assert_eq!(snapshot.outcome, SubmissionOutcome::Accepted);
    assert_eq!(snapshot.draft, Default::default());
    assert!(!snapshot.submit_enabled);
    assert_eq!(
        notices.notices(),
        vec![ContactSchema::NOTICES.accepted],
        "success is surfaced once"
    );
}

#[tokio::test]
async fn invalid_contact_never_reaches_the_store() {
    let store = Arc::new(ScriptedStore::with_sectors());
    let notices = Arc::new(NoticeBuffer::default());
    let form = contact_form(store.clone(), notices.clone());
    let mut draft = contact_draft();
    draft.subject = "   ".to_string();
    form.fill(draft);

    match form.submit().await {
        SubmitResult::Invalid(errors) => {
            assert_eq!(errors.fields(), vec![ContactField::Subject]);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    assert_eq!(store.insert_count(), 0);
    let snapshot = form.snapshot();
    assert_eq!(snapshot.outcome, SubmissionOutcome::Idle);
    assert!(snapshot.field_errors.contains(ContactField::Subject));
    assert_eq!(notices.notices()[0].tone, NoticeTone::Destructive);
}

#[tokio::test]
async fn editing_a_field_clears_only_its_error() {
    let store = Arc::new(ScriptedStore::with_sectors());
    let form = contact_form(store.clone(), Arc::new(NoticeBuffer::default()));

    let SubmitResult::Invalid(errors) = form.submit().await else {
        panic!("blank draft must be invalid");
    };
    assert_eq!(errors.len(), 4);

    assert!(form.edit((ContactField::Name, "Amara".to_string())));
    let snapshot = form.snapshot();
    assert!(!snapshot.field_errors.contains(ContactField::Name));
    assert!(snapshot.field_errors.contains(ContactField::Email));
    assert_eq!(snapshot.field_errors.len(), 3);
    assert_eq!(store.insert_count(), 0);
}

#[tokio::test]
async fn transient_failure_keeps_draft_and_allows_retry() {
    let store = Arc::new(ScriptedStore::with_sectors().fail_next_insert(server_error()));
    let notices = Arc::new(NoticeBuffer::default());
    let form = contact_form(store.clone(), notices.clone());
    form.fill(contact_draft());

    assert_eq!(
        form.submit().await,
        SubmitResult::Rejected(RejectionReason::TransientFailure)
    );
    let snapshot = form.snapshot();
    assert_eq!(snapshot.draft, contact_draft(), "draft preserved for retry");
    assert!(snapshot.submit_enabled);
    assert_eq!(notices.notices(), vec![ContactSchema::NOTICES.failed]);

    assert_eq!(form.submit().await, SubmitResult::Accepted);
    assert_eq!(store.insert_count(), 2);
}

#[tokio::test]
async fn failure_notice_hides_technical_detail() {
    let store = Arc::new(ScriptedStore::with_sectors().fail_next_insert(server_error()));
    let notices = Arc::new(NoticeBuffer::default());
    let form = contact_form(store, notices.clone());
    form.fill(contact_draft());
    form.submit().await;

    for notice in notices.notices() {
        assert!(!notice.description.contains("XX000"));
        assert!(!notice.description.contains("relation"));
    }
}

#[tokio::test]
async fn panicking_store_is_contained_as_generic_failure() {
    let notices = Arc::new(NoticeBuffer::default());
    let form = contact_form(Arc::new(PanickingStore), notices.clone());
    form.fill(contact_draft());

    assert_eq!(
        form.submit().await,
        SubmitResult::Rejected(RejectionReason::TransientFailure)
    );
    assert_eq!(form.snapshot().draft, contact_draft());
    let shown = notices.notices();
    assert_eq!(shown, vec![ContactSchema::NOTICES.failed]);
    assert!(!shown[0].description.contains("secret-token"));
}

#[tokio::test]
async fn accepted_form_needs_submit_another() {
    let store = Arc::new(ScriptedStore::with_sectors());
    let form = contact_form(store.clone(), Arc::new(NoticeBuffer::default()));
    form.fill(contact_draft());
    assert_eq!(form.submit().await, SubmitResult::Accepted);

    assert_eq!(form.submit().await, SubmitResult::AlreadyAccepted);
    assert!(!form.edit((ContactField::Name, "Again".to_string())));
    assert_eq!(store.insert_count(), 1);

    assert!(form.submit_another());
    assert_eq!(form.outcome(), SubmissionOutcome::Idle);
    assert!(form.edit((ContactField::Name, "Again".to_string())));
    assert!(!form.submit_another(), "only valid from accepted");
}

#[tokio::test]
async fn second_submit_while_in_flight_is_ignored() {
    let store = Arc::new(GatedStore::default());
    let form = Arc::new(contact_form(store.clone(), Arc::new(NoticeBuffer::default())));
    form.fill(contact_draft());

    let first = tokio::spawn({
        let form = form.clone();
        async move { form.submit().await }
    });
    store.started.notified().await;

    assert_eq!(form.outcome(), SubmissionOutcome::Submitting);
    assert!(!form.submit_enabled());
    assert_eq!(form.submit().await, SubmitResult::InFlight);

    store.release.notify_one();
    assert_eq!(first.await.expect("task joins"), SubmitResult::Accepted);
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn late_result_after_unmount_is_dropped() {
    let store = Arc::new(GatedStore::default());
    let notices = Arc::new(NoticeBuffer::default());
    let form = Arc::new(contact_form(store.clone(), notices.clone()));
    form.fill(contact_draft());

    let pending = tokio::spawn({
        let form = form.clone();
        async move { form.submit().await }
    });
    store.started.notified().await;
    form.unmount();
    store.release.notify_one();

    assert_eq!(pending.await.expect("task joins"), SubmitResult::Detached);
    assert_eq!(form.outcome(), SubmissionOutcome::Submitting);
    assert!(notices.notices().is_empty());
    assert_eq!(form.submit().await, SubmitResult::Detached);
}
