use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use crate::workflows::admission::domain::{
    ApplicationDocument, FieldMap, FieldValue, Namespace, StepPayload,
};
use crate::workflows::admission::drafts::MemoryBackupStore;
use crate::workflows::admission::encoder::encode_bytes;
use crate::workflows::admission::intake::{
    admission_router, AdmissionIntakeService, InMemoryApplicationRepository,
    InMemoryDraftRepository,
};
use crate::workflows::admission::remote::{
    RemoteAdmissionApi, RemoteError, RouterTransport, Transport, WireRequest, WireResponse,
};
use crate::workflows::admission::session::WizardSession;

pub(super) const APPLICANT: &str = "applicant-asha";
pub(super) const OTHER_APPLICANT: &str = "applicant-ravi";

pub(super) type IntakeService =
    AdmissionIntakeService<InMemoryDraftRepository, InMemoryApplicationRepository>;
pub(super) type TestApi = RemoteAdmissionApi<SwitchableTransport>;
pub(super) type TestSession = WizardSession<TestApi, MemoryBackupStore>;

fn file(field: &str, content_type: &mime::Mime) -> FieldValue {
    encode_bytes(field, content_type, b"scanned-bytes")
        .expect("non-empty bytes encode")
        .into()
}

/// Valid answers for every field a step requires, plus a few optional ones.
pub(super) fn step_values(namespace: Namespace) -> Vec<(&'static str, FieldValue)> {
    match namespace {
        Namespace::StudentDetails => vec![
            ("studentName", "Asha Rao".into()),
            ("fatherName", "Venkat Rao".into()),
            ("motherName", "Lakshmi Rao".into()),
            ("dateOfBirth", "2006-04-12".into()),
            ("gender", "Female".into()),
            ("aadhaarNumber", "1234 5678 9012".into()),
            ("religion", "Hindu".into()),
        ],
        Namespace::AddressDetails => vec![
            ("houseNumber", "4-12".into()),
            ("village", "Kondapur".into()),
            ("mandal", "Serilingampally".into()),
            ("district", "Rangareddy".into()),
            ("state", "Telangana".into()),
            ("pincode", "500084".into()),
        ],
        Namespace::ContactDetails => vec![
            ("mobileNo", "9876543210".into()),
            ("email", "asha@example.com".into()),
        ],
        Namespace::OtherDetails => vec![("category", "OC".into())],
        Namespace::UploadedFiles => vec![
            ("sscMemo", file("sscMemo", &mime::APPLICATION_PDF)),
            ("interMemo", file("interMemo", &mime::APPLICATION_PDF)),
            (
                "transferCertificate",
                file("transferCertificate", &mime::IMAGE_JPEG),
            ),
        ],
        Namespace::AcademicDetails => vec![
            ("qualifyingExam", "Intermediate".into()),
            ("board", "TSBIE".into()),
            ("hallTicketNumber", "2423100456".into()),
            ("yearOfPassing", "2024".into()),
            ("percentage", "91.5".into()),
        ],
        Namespace::Preferences => vec![
            ("degreeGroup", "BCom".into()),
            (
                "collegePreferences",
                FieldValue::List(vec![
                    "Government Degree College, Khairatabad".to_string(),
                    "Nizam College".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]),
            ),
            ("mediumOfInstruction", "English".into()),
        ],
        Namespace::SignatureUpload => vec![
            ("studentPhoto", file("studentPhoto", &mime::IMAGE_JPEG)),
            ("studentSignature", file("studentSignature", &mime::IMAGE_PNG)),
        ],
    }
}

pub(super) fn payload(namespace: Namespace) -> StepPayload {
    let fields: FieldMap = step_values(namespace)
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    StepPayload::new(namespace, fields)
}

pub(super) fn partial_document(namespaces: &[Namespace]) -> ApplicationDocument {
    let mut document = ApplicationDocument::new();
    for namespace in namespaces {
        document.merge(payload(*namespace));
    }
    document
}

pub(super) fn complete_document() -> ApplicationDocument {
    partial_document(&Namespace::ALL)
}

pub(super) fn intake_service() -> Arc<IntakeService> {
    Arc::new(AdmissionIntakeService::new(
        Arc::new(InMemoryDraftRepository::default()),
        Arc::new(InMemoryApplicationRepository::default()),
    ))
}

pub(super) fn router_for(service: Arc<IntakeService>) -> Router {
    admission_router(service)
}

/// Routes into the in-process server until switched offline.
pub(super) struct SwitchableTransport {
    inner: RouterTransport,
    offline: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for SwitchableTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        self.inner.send(request).await
    }
}

/// Client bound to `service` as `principal`, plus the switch that takes it offline.
pub(super) fn client_for(
    service: Arc<IntakeService>,
    principal: &str,
) -> (Arc<TestApi>, Arc<AtomicBool>) {
    let offline = Arc::new(AtomicBool::new(false));
    let transport = SwitchableTransport {
        inner: RouterTransport::new(router_for(service)),
        offline: offline.clone(),
    };
    let api = RemoteAdmissionApi::new(transport).with_bearer(principal);
    (Arc::new(api), offline)
}

/// Fill every field of the current step and advance past it.
pub(super) fn complete_current_step(session: &mut TestSession) {
    let namespace = session
        .current_step()
        .expect("session is active")
        .namespace
        .expect("current step owns a namespace");
    for (field, value) in step_values(namespace) {
        session.set_field(field, value).expect("fixture field accepted");
    }
    session.next().expect("fixture step is valid");
}
