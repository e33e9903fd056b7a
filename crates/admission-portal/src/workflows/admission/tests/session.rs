use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::common::*;

use crate::workflows::admission::domain::{
    ApplicationId, DraftId, FieldValue, MimeClass, Namespace, OfficeUseFields,
};
use crate::workflows::admission::drafts::{CheckpointOutcome, MemoryBackupStore};
use crate::workflows::admission::error::{
    ErrorKind, LoadError, NotFoundError, RetryAction, SequencerError, SubmissionError,
    ValidationError, WizardError,
};
use crate::workflows::admission::office_use::OfficeUseDesk;
use crate::workflows::admission::sequencer::{WizardState, REVIEW_STEP};
use crate::workflows::admission::session::{RestoredFrom, WizardSession};

fn session_for(api: Arc<TestApi>) -> (TestSession, Arc<MemoryBackupStore>) {
    let backup = Arc::new(MemoryBackupStore::new());
    (WizardSession::new(api, backup.clone()), backup)
}

fn advance_to_review(session: &mut TestSession) {
    while !session.is_review() {
        complete_current_step(session);
    }
}

#[tokio::test]
async fn applicant_walks_every_step_and_submits() {
    let service = intake_service();
    let (api, _) = client_for(service.clone(), APPLICANT);
    let (mut session, _) = session_for(api);

    for expected in 1..=REVIEW_STEP {
        complete_current_step(&mut session);
        assert_eq!(session.current_step().expect("active").index, expected);
    }
    assert!(session.is_review());
    assert!(session.form().is_none());
    assert!(session.document().missing().is_empty());

    let sections = session.review_summary();
    assert_eq!(sections.len(), Namespace::ALL.len());
    assert!(sections.iter().all(|section| section.complete));

    session.confirm_declaration(true).expect("declaration");
    let application_id = session.submit().await.expect("submitted");

    assert_eq!(
        session.state(),
        &WizardState::Submitted {
            application_id: application_id.clone()
        }
    );
    let record = service
        .get_application(&application_id)
        .expect("stored server-side");
    assert_eq!(record.owner, APPLICANT);
    assert_eq!(&record.data, session.document());
}

#[tokio::test]
async fn missing_required_field_blocks_next() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);

    session
        .set_field("studentName", "Asha Rao".into())
        .expect("known field");
    let err = session.next().expect_err("required fields missing");

    assert!(matches!(
        err,
        WizardError::Validation(ValidationError::MissingFields { .. })
    ));
    assert_eq!(session.current_step().expect("active").index, 0);
    assert!(session.document().is_empty());
    let notice = session.notice().expect("notice recorded");
    assert_eq!(notice.kind, ErrorKind::Validation);
    assert_eq!(notice.retry, None);
}

#[tokio::test]
async fn rejected_field_edits_and_moves_leave_a_notice() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);

    assert!(matches!(
        session.set_field("shoeSize", "9".into()),
        Err(WizardError::Validation(ValidationError::UnknownField { .. }))
    ));
    let notice = session.notice().expect("notice recorded");
    assert_eq!(notice.kind, ErrorKind::Validation);
    assert!(notice.message.contains("shoeSize"));

    assert!(session.back().is_err());
    assert_eq!(
        session.notice().map(|notice| notice.kind),
        Some(ErrorKind::Navigation)
    );

    complete_current_step(&mut session);
    assert!(session.notice().is_none());
}

#[tokio::test]
async fn back_restores_the_previous_answers_into_the_form() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);
    complete_current_step(&mut session);
    complete_current_step(&mut session);

    assert_eq!(session.back().expect("back"), 1);
    let form = session.form().expect("address form");
    assert_eq!(form.namespace(), Namespace::AddressDetails);
    assert_eq!(form.value("pincode"), Some(FieldValue::text("500084")));

    assert_eq!(session.back().expect("back"), 0);
    assert!(matches!(
        session.back(),
        Err(WizardError::Sequencer(SequencerError::OutOfRange { index: 0, .. }))
    ));
    assert_eq!(session.document().len(), 2);
}

#[tokio::test]
async fn submit_requires_accepted_declaration() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);
    advance_to_review(&mut session);

    assert!(matches!(
        session.confirm_declaration(false),
        Err(WizardError::Validation(ValidationError::DeclarationNotAccepted))
    ));
    assert!(matches!(
        session.submit().await,
        Err(WizardError::Validation(ValidationError::DeclarationNotAccepted))
    ));
    assert!(session.is_review());
}

#[tokio::test]
async fn failed_submission_keeps_document_for_retry() {
    let (api, offline) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);
    advance_to_review(&mut session);
    session.confirm_declaration(true).expect("declaration");
    let before = session.document().clone();

    offline.store(true, Ordering::SeqCst);
    let err = session.submit().await.expect_err("server unreachable");
    assert!(matches!(
        err,
        WizardError::Submission(SubmissionError::Transport(_))
    ));
    assert!(session.is_review());
    assert_eq!(session.document(), &before);
    assert_eq!(
        session.notice().and_then(|notice| notice.retry.clone()),
        Some(RetryAction::Submit)
    );

    offline.store(false, Ordering::SeqCst);
    session.submit().await.expect("retry succeeds");
    assert!(session.notice().is_none());
    assert!(matches!(session.state(), WizardState::Submitted { .. }));
}

#[tokio::test]
async fn submission_removes_draft_and_local_backup() {
    let service = intake_service();
    let (api, _) = client_for(service.clone(), APPLICANT);
    let (mut session, _) = session_for(api);
    complete_current_step(&mut session);
    assert!(matches!(
        session.save_draft().await.expect("checkpoint"),
        CheckpointOutcome::Remote(_)
    ));
    assert!(session.drafts().save_local_backup(session.document()));
    assert!(session.draft_id().is_some());

    advance_to_review(&mut session);
    session.confirm_declaration(true).expect("declaration");
    session.submit().await.expect("submitted");

    assert!(service.list_drafts(APPLICANT).expect("list").is_empty());
    assert!(session.drafts().get_local_backup().is_none());
    assert!(session.draft_id().is_none());
}

#[tokio::test]
async fn wizard_is_spent_after_submission() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);
    advance_to_review(&mut session);
    session.confirm_declaration(true).expect("declaration");
    let application_id = session.submit().await.expect("submitted");

    assert!(matches!(
        session.next(),
        Err(WizardError::Sequencer(SequencerError::AlreadySubmitted(ref id))) if *id == application_id
    ));
    assert!(matches!(
        session.save_draft().await,
        Err(WizardError::Sequencer(SequencerError::AlreadySubmitted(_)))
    ));
    assert!(session.restore(None).await.is_err());
}

#[tokio::test]
async fn offline_save_keeps_local_copy_and_explains_it() {
    let (api, offline) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);
    complete_current_step(&mut session);
    offline.store(true, Ordering::SeqCst);

    let outcome = session.save_draft().await.expect("fallback is not an error");
    assert!(matches!(
        outcome,
        CheckpointOutcome::LocalFallback {
            backed_up: true,
            ..
        }
    ));
    assert!(session.draft_id().is_none());
    let notice = session.notice().expect("notice recorded");
    assert_eq!(notice.kind, ErrorKind::Persistence);
    assert_eq!(notice.retry, Some(RetryAction::SaveDraft));
    assert!(notice.message.ends_with("A copy was kept on this device."));
    let backup = session.drafts().get_local_backup().expect("local copy");
    assert_eq!(&backup.data, session.document());
}

#[tokio::test]
async fn saved_draft_resumes_at_first_unfinished_step() {
    let service = intake_service();
    let (api, _) = client_for(service.clone(), APPLICANT);
    let (mut session, _) = session_for(api.clone());
    for _ in 0..4 {
        complete_current_step(&mut session);
    }
    session.save_draft().await.expect("checkpoint");
    let draft_id = session.draft_id().cloned().expect("draft id");
    let saved = session.document().clone();

    let (mut resumed, _) = session_for(api);
    let source = resumed.restore(None).await.expect("restore");

    assert_eq!(source, RestoredFrom::RemoteDraft(draft_id.clone()));
    assert_eq!(resumed.document(), &saved);
    assert_eq!(resumed.draft_id(), Some(&draft_id));
    let step = resumed.current_step().expect("active");
    assert_eq!(step.namespace, Some(Namespace::UploadedFiles));
    assert!(resumed.notice().is_none());

    resumed.back().expect("back");
    assert_eq!(
        resumed.form().and_then(|form| form.value("category")),
        Some(FieldValue::text("OC"))
    );
}

#[tokio::test]
async fn unreachable_server_restores_local_copy_with_load_retry() {
    let (api, offline) = client_for(intake_service(), APPLICANT);
    let (mut session, backup) = session_for(api.clone());
    complete_current_step(&mut session);
    assert!(session.drafts().save_local_backup(session.document()));

    let mut resumed = WizardSession::new(api, backup);
    offline.store(true, Ordering::SeqCst);
    let source = resumed
        .restore(Some(DraftId("draft-000001".to_string())))
        .await
        .expect("restore never fails before submission");

    assert_eq!(source, RestoredFrom::LocalBackup);
    assert_eq!(resumed.document(), session.document());
    assert_eq!(resumed.current_step().expect("active").index, 1);
    assert_eq!(
        resumed.notice().and_then(|notice| notice.retry.clone()),
        Some(RetryAction::LoadDraft)
    );
}

#[tokio::test]
async fn changing_degree_group_drops_specializations() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);
    while session.current_step().expect("active").namespace != Some(Namespace::Preferences) {
        complete_current_step(&mut session);
    }

    session
        .set_field("degreeGroup", "BSc".into())
        .expect("group");
    session
        .set_field(
            "bscSpecializations",
            FieldValue::List(vec!["MPC".to_string(), "BZC".to_string()]),
        )
        .expect("specializations");
    {
        let preferences = session.preferences_mut().expect("on preferences step");
        preferences
            .set_preference(1, "Nizam College")
            .expect("rank one");
        preferences
            .set_preference(2, "Government Degree College, Khairatabad")
            .expect("rank two");
        assert_eq!(preferences.specializations().len(), 2);
    }
    session
        .set_field("mediumOfInstruction", "Telugu".into())
        .expect("medium");

    session
        .set_field("degreeGroup", "BA".into())
        .expect("switch group");
    assert!(session
        .preferences_mut()
        .expect("still on preferences")
        .specializations()
        .is_empty());
    assert!(matches!(
        session.set_field("bscSpecializations", FieldValue::List(vec!["MPC".to_string()])),
        Err(WizardError::Validation(ValidationError::InvalidField { .. }))
    ));

    session.next().expect("valid without specializations");
    let preferences = session
        .document()
        .slice(Namespace::Preferences)
        .expect("merged");
    assert_eq!(preferences.text("degreeGroup"), Some("BA"));
    assert!(preferences.get("bscSpecializations").is_none());
    assert_eq!(
        preferences
            .get("collegePreferences")
            .and_then(FieldValue::as_list)
            .map(<[String]>::len),
        Some(5)
    );
}

#[tokio::test]
async fn selected_files_are_encoded_into_the_upload_step() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (mut session, _) = session_for(api);
    while session.current_step().expect("active").namespace != Some(Namespace::UploadedFiles) {
        complete_current_step(&mut session);
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let scan = dir.path().join("ssc-memo.jpg");
    std::fs::File::create(&scan)
        .and_then(|mut file| file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]))
        .expect("write scan");
    let empty = dir.path().join("inter-memo.pdf");
    std::fs::File::create(&empty).expect("create empty file");

    let asset = session
        .select_file("sscMemo", &scan)
        .await
        .expect("encodes")
        .expect("not superseded");
    assert_eq!(asset.mime_class, MimeClass::Image);
    assert!(asset.encoded_content.starts_with("data:image/jpeg;base64,"));

    let err = session
        .select_file("interMemo", &empty)
        .await
        .expect_err("empty file");
    assert_eq!(
        err.retry(),
        Some(RetryAction::ReselectFile {
            field: "interMemo".to_string()
        })
    );

    assert!(matches!(
        session.next(),
        Err(WizardError::Validation(ValidationError::MissingFields { .. }))
    ));
    assert_eq!(
        session.form().and_then(|form| form.value("sscMemo")),
        Some(FieldValue::File(asset))
    );
}

#[tokio::test]
async fn file_selection_outside_upload_steps_is_refused() {
    let (api, _) = client_for(intake_service(), APPLICANT);
    let (session, _) = session_for(api);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("photo.png");
    std::fs::write(&path, b"png-bytes").expect("write");

    assert!(matches!(
        session.select_file("studentPhoto", &path).await,
        Err(WizardError::Validation(ValidationError::NotAFileField { .. }))
    ));
}

#[tokio::test]
async fn office_desk_uses_returned_application_id() {
    let service = intake_service();
    let (api, _) = client_for(service.clone(), APPLICANT);
    let (mut session, _) = session_for(api);
    advance_to_review(&mut session);
    session.confirm_declaration(true).expect("declaration");
    let application_id = session.submit().await.expect("submitted");

    let (clerk_api, _) = client_for(service, "office-clerk");
    let desk = OfficeUseDesk::new(clerk_api);
    assert!(desk.load(&application_id).await.expect("load").is_empty());

    let fields = OfficeUseFields {
        admission_number: Some("ADM-2024-0113".to_string()),
        documents_verified: true,
        ..OfficeUseFields::default()
    };
    desk.save(&application_id, &fields).await.expect("save");

    let summary = desk.summary(&application_id).await.expect("summary");
    assert_eq!(summary.application_id, application_id);
    assert_eq!(summary.office_use_only, fields);
    assert_eq!(summary.student_name.as_deref(), Some("Asha Rao"));
    assert_eq!(&summary.data, session.document());

    let unknown = ApplicationId("app-999999".to_string());
    assert_eq!(
        desk.summary(&unknown).await,
        Err(LoadError::NotFound(NotFoundError::Application(unknown.clone())))
    );
}
