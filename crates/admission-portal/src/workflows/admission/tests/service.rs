use super::common::*;

use crate::workflows::admission::domain::{
    ApplicationDocument, ApplicationId, DraftId, DraftStatus, FieldMap, FieldValue,
    Namespace, OfficeUseFields, StepPayload,
};
use crate::workflows::admission::error::{NotFoundError, SubmissionError, ValidationError};
use crate::workflows::admission::intake::{ApplicationRecord, IntakeError};

#[test]
fn draft_ids_and_application_ids_do_not_overlap() {
    let service = intake_service();
    let draft = service
        .create_draft(APPLICANT, complete_document(), DraftStatus::Draft)
        .expect("draft created");
    let record = service
        .submit(APPLICANT, complete_document())
        .expect("complete document accepted");

    assert!(draft.draft_id.0.starts_with("draft-"));
    assert!(record.application_id.0.starts_with("app-"));
}

#[test]
fn update_keeps_identifier_and_replaces_content() {
    let service = intake_service();
    let created = service
        .create_draft(
            APPLICANT,
            partial_document(&[Namespace::StudentDetails]),
            DraftStatus::Draft,
        )
        .expect("draft created");

    let updated = service
        .update_draft(
            APPLICANT,
            &created.draft_id,
            partial_document(&[Namespace::StudentDetails, Namespace::AddressDetails]),
            DraftStatus::Draft,
        )
        .expect("owner can update");

    assert_eq!(updated.draft_id, created.draft_id);
    assert!(updated.updated_at >= created.updated_at);
    let drafts = service.list_drafts(APPLICANT).expect("list");
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].data.len(), 2);
}

#[test]
fn drafts_are_invisible_to_other_owners() {
    let service = intake_service();
    let created = service
        .create_draft(APPLICANT, ApplicationDocument::new(), DraftStatus::Draft)
        .expect("draft created");

    assert!(matches!(
        service.get_draft(OTHER_APPLICANT, &created.draft_id),
        Err(IntakeError::NotFound(NotFoundError::Draft(_)))
    ));
    assert!(matches!(
        service.update_draft(
            OTHER_APPLICANT,
            &created.draft_id,
            ApplicationDocument::new(),
            DraftStatus::Draft
        ),
        Err(IntakeError::NotFound(_))
    ));
    assert!(matches!(
        service.delete_draft(OTHER_APPLICANT, &created.draft_id),
        Err(IntakeError::NotFound(_))
    ));
    assert!(service
        .list_drafts(OTHER_APPLICANT)
        .expect("list")
        .is_empty());
    assert!(service.get_draft(APPLICANT, &created.draft_id).is_ok());
}

#[test]
fn deleting_twice_reports_not_found_the_second_time() {
    let service = intake_service();
    let created = service
        .create_draft(APPLICANT, ApplicationDocument::new(), DraftStatus::Draft)
        .expect("draft created");

    service
        .delete_draft(APPLICANT, &created.draft_id)
        .expect("first delete");
    assert!(matches!(
        service.delete_draft(APPLICANT, &created.draft_id),
        Err(IntakeError::NotFound(_))
    ));
    assert!(matches!(
        service.get_draft(APPLICANT, &DraftId("draft-999999".to_string())),
        Err(IntakeError::NotFound(_))
    ));
}

#[test]
fn incomplete_documents_are_rejected_at_submission() {
    let service = intake_service();
    let result = service.submit(
        APPLICANT,
        partial_document(&[Namespace::StudentDetails, Namespace::ContactDetails]),
    );

    match result {
        Err(IntakeError::Rejected(SubmissionError::Incomplete { missing })) => {
            assert_eq!(missing.first(), Some(&Namespace::AddressDetails));
            assert_eq!(missing.len(), 6);
        }
        other => panic!("expected incomplete rejection, got {other:?}"),
    }
}

#[test]
fn submitted_application_starts_with_empty_office_use_fields() {
    let service = intake_service();
    let record = service
        .submit(APPLICANT, complete_document())
        .expect("submitted");

    let summary = service
        .get_application(&record.application_id)
        .expect("fetch")
        .summary();
    assert!(summary.office_use_only.is_empty());
    assert_eq!(summary.student_name.as_deref(), Some("Asha Rao"));
    assert_eq!(summary.data, complete_document());
}

#[test]
fn office_use_save_replaces_wholesale_and_leaves_applicant_data() {
    let service = intake_service();
    let record = service
        .submit(APPLICANT, complete_document())
        .expect("submitted");

    let first = OfficeUseFields {
        admission_number: Some("ADM-2024-0113".to_string()),
        remarks: Some("Original TC pending".to_string()),
        ..OfficeUseFields::default()
    };
    service
        .save_office_use(&record.application_id, first)
        .expect("first save");

    let second = OfficeUseFields {
        fee_receipt_number: Some("FR-8812".to_string()),
        documents_verified: true,
        ..OfficeUseFields::default()
    };
    let saved = service
        .save_office_use(&record.application_id, second.clone())
        .expect("second save");

    assert_eq!(saved.office_use_only, second);
    assert!(saved.office_use_only.remarks.is_none());
    assert_eq!(saved.data, complete_document());
}

#[test]
fn office_use_for_unknown_application_is_not_found() {
    let service = intake_service();
    let result = service.save_office_use(
        &ApplicationId("app-424242".to_string()),
        OfficeUseFields::default(),
    );
    assert!(matches!(
        result,
        Err(IntakeError::NotFound(NotFoundError::Application(_)))
    ));
}

fn document_with(namespace: Namespace, edit: impl FnOnce(&mut FieldMap)) -> ApplicationDocument {
    let mut fields = payload(namespace).fields().clone();
    edit(&mut fields);
    let mut document = complete_document();
    document.merge(StepPayload::new(namespace, fields));
    document
}

fn rejected_field(result: Result<ApplicationRecord, IntakeError>) -> ValidationError {
    match result {
        Err(IntakeError::Rejected(SubmissionError::Invalid(error))) => error,
        other => panic!("expected a field rejection, got {other:?}"),
    }
}

#[test]
fn specializations_stored_under_another_group_are_rejected() {
    let service = intake_service();
    let document = document_with(Namespace::Preferences, |preferences| {
        preferences.insert(
            "bscSpecializations".to_string(),
            FieldValue::List(vec!["MPC".to_string()]),
        );
    });

    match rejected_field(service.submit(APPLICANT, document)) {
        ValidationError::InvalidField { field, .. } => assert_eq!(field, "bscSpecializations"),
        other => panic!("expected invalid specializations, got {other:?}"),
    }
}

#[test]
fn preference_list_longer_than_five_slots_is_rejected() {
    let service = intake_service();
    let document = document_with(Namespace::Preferences, |preferences| {
        preferences.insert(
            "collegePreferences".to_string(),
            FieldValue::List((1..=7).map(|n| format!("College {n}")).collect()),
        );
    });

    match rejected_field(service.submit(APPLICANT, document)) {
        ValidationError::InvalidField { field, .. } => assert_eq!(field, "collegePreferences"),
        other => panic!("expected invalid preferences, got {other:?}"),
    }
}

#[test]
fn unrecognised_fields_are_rejected_at_submission() {
    let service = intake_service();
    let document = document_with(Namespace::ContactDetails, |contact| {
        contact.insert("favouriteColour".to_string(), FieldValue::text("teal"));
    });

    assert!(matches!(
        rejected_field(service.submit(APPLICANT, document)),
        ValidationError::UnknownField { ref field, .. } if field == "favouriteColour"
    ));
}

#[test]
fn bsc_applications_keep_their_specializations() {
    let service = intake_service();
    let document = document_with(Namespace::Preferences, |preferences| {
        preferences.insert("degreeGroup".to_string(), FieldValue::text("BSc"));
        preferences.insert(
            "bscSpecializations".to_string(),
            FieldValue::List(vec!["MPCs".to_string()]),
        );
    });

    let record = service
        .submit(APPLICANT, document.clone())
        .expect("BSc document accepted");
    assert_eq!(record.data, document);
}
