use crate::infra::in_memory_intake;
use admission_portal::config::{AppConfig, PortalConfig};
use admission_portal::error::AppError;
use admission_portal::telemetry;
use admission_portal::workflows::admission::encoder::encode_bytes;
use admission_portal::workflows::admission::intake::admission_router;
use admission_portal::workflows::admission::remote::Transport;
use admission_portal::workflows::admission::{
    BackupStore, CheckpointOutcome, FieldValue, FileBackupStore, Namespace, OfficeUseDesk,
    OfficeUseFields, RemoteAdmissionApi, RestoredFrom, RouterTransport, UreqTransport,
    WizardError, WizardSession,
};
use admission_portal::workflows::admission::error::EncodingError;
use clap::{Args, Subcommand};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Send requests to a running intake server instead of an in-process one.
    #[arg(long)]
    pub(crate) api_url: Option<String>,
    /// Bearer credential; falls back to ADMISSION_API_TOKEN, then a demo applicant.
    #[arg(long)]
    pub(crate) token: Option<String>,
    /// Stop after saving a draft midway instead of submitting.
    #[arg(long)]
    pub(crate) draft_only: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum BackupCommand {
    /// Print the local backup, if one exists
    Show,
    /// Discard the local backup
    Clear,
}

const DEMO_APPLICANT: &str = "demo-applicant";
const OFFICE_PRINCIPAL: &str = "admissions-office";

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let portal = config.portal;
    let token = args
        .token
        .clone()
        .or_else(|| portal.api_token.clone())
        .unwrap_or_else(|| DEMO_APPLICANT.to_string());
    let backup = Arc::new(FileBackupStore::new(portal.backup_dir.clone()));

    println!("Admission wizard demo");
    match args.api_url.as_deref() {
        Some(url) => {
            println!("- intake server: {url}");
            let transport = || UreqTransport::new(url, portal.api_timeout);
            walk_wizard(transport, &token, backup, &portal, args.draft_only).await
        }
        None => {
            println!("- intake server: in-process (memory only)");
            let intake = in_memory_intake();
            let transport = || RouterTransport::new(admission_router(intake.clone()));
            walk_wizard(transport, &token, backup, &portal, args.draft_only).await
        }
    }
}

async fn walk_wizard<T, F>(
    transport: F,
    token: &str,
    backup: Arc<FileBackupStore>,
    portal: &PortalConfig,
    draft_only: bool,
) -> Result<(), AppError>
where
    T: Transport + 'static,
    F: Fn() -> T,
{
    let api = Arc::new(RemoteAdmissionApi::new(transport()).with_bearer(token));
    let mut session =
        WizardSession::with_backup_key(api, backup, portal.backup_key.clone());

    match session.restore(None).await? {
        RestoredFrom::RemoteDraft(draft_id) => println!("- resumed draft {draft_id}"),
        RestoredFrom::LocalBackup => println!("- resumed from the local backup"),
        RestoredFrom::Fresh => println!("- starting a new application"),
    }
    if let Some(notice) = session.notice() {
        println!("  ! {}", notice.message);
    }

    while !session.is_review() {
        let Some(namespace) = session.current_step()?.namespace else {
            break;
        };
        for (field, value) in sample_answers(namespace).map_err(WizardError::from)? {
            session.set_field(field, value)?;
        }
        let index = session.next()?;
        println!("  step {index}: {} complete", namespace.label());

        if namespace == Namespace::OtherDetails {
            report_checkpoint(session.save_draft().await?);
            if draft_only {
                println!("Draft saved; rerun without --draft-only to resume and submit.");
                return Ok(());
            }
        }
    }

    println!("\nReview");
    for section in session.review_summary() {
        let marker = if section.complete { "x" } else { " " };
        println!("[{marker}] {}", section.title);
        for entry in &section.entries {
            println!("    {}: {}", entry.label, entry.value);
        }
    }

    session.confirm_declaration(true)?;
    let application_id = session.submit().await?;
    println!("\nSubmitted application {application_id}");

    let office_api = Arc::new(RemoteAdmissionApi::new(transport()).with_bearer(OFFICE_PRINCIPAL));
    let desk = OfficeUseDesk::new(office_api);
    let fields = OfficeUseFields {
        admission_number: Some(format!("ADM-{}", application_id.0.to_uppercase())),
        documents_verified: true,
        remarks: Some("Recorded from the command-line demo".to_string()),
        ..OfficeUseFields::default()
    };
    desk.save(&application_id, &fields)
        .await
        .map_err(WizardError::from)?;
    let summary = desk
        .summary(&application_id)
        .await
        .map_err(WizardError::from)?;
    println!(
        "Office use: admission number {} | documents verified: {}",
        summary
            .office_use_only
            .admission_number
            .as_deref()
            .unwrap_or("-"),
        if summary.office_use_only.documents_verified {
            "yes"
        } else {
            "no"
        }
    );
    Ok(())
}

fn report_checkpoint(outcome: CheckpointOutcome) {
    match outcome {
        CheckpointOutcome::Remote(draft_id) => println!("  draft saved as {draft_id}"),
        CheckpointOutcome::LocalFallback { error, backed_up } => {
            println!("  ! draft not saved remotely: {error}");
            if backed_up {
                println!("  a copy was kept on this device");
            }
        }
    }
}

fn sample_file(field: &str, content_type: &mime::Mime) -> Result<FieldValue, EncodingError> {
    // PNG signature bytes stand in for a scanned page.
    encode_bytes(field, content_type, b"\x89PNG\r\n\x1a\n").map(FieldValue::from)
}

fn sample_answers(namespace: Namespace) -> Result<Vec<(&'static str, FieldValue)>, EncodingError> {
    let answers = match namespace {
        Namespace::StudentDetails => vec![
            ("studentName", "Sample Applicant".into()),
            ("fatherName", "Sample Father".into()),
            ("motherName", "Sample Mother".into()),
            ("dateOfBirth", "2006-01-15".into()),
            ("gender", "Other".into()),
            ("aadhaarNumber", "0000 1111 2222".into()),
        ],
        Namespace::AddressDetails => vec![
            ("houseNumber", "1-1".into()),
            ("village", "Uppal".into()),
            ("mandal", "Uppal".into()),
            ("district", "Medchal".into()),
            ("state", "Telangana".into()),
            ("pincode", "500039".into()),
        ],
        Namespace::ContactDetails => vec![
            ("mobileNo", "9000000001".into()),
            ("email", "applicant@example.org".into()),
        ],
        Namespace::OtherDetails => vec![("category", "OC".into())],
        Namespace::UploadedFiles => vec![
            ("sscMemo", sample_file("sscMemo", &mime::IMAGE_PNG)?),
            ("interMemo", sample_file("interMemo", &mime::IMAGE_PNG)?),
            (
                "transferCertificate",
                sample_file("transferCertificate", &mime::IMAGE_PNG)?,
            ),
        ],
        Namespace::AcademicDetails => vec![
            ("qualifyingExam", "Intermediate".into()),
            ("board", "TSBIE".into()),
            ("hallTicketNumber", "2400000001".into()),
            ("yearOfPassing", "2024".into()),
            ("percentage", "78.4".into()),
        ],
        Namespace::Preferences => vec![
            ("degreeGroup", "BSc".into()),
            ("bscSpecializations", vec!["MPCs".to_string()].into()),
            (
                "collegePreferences",
                vec![
                    "Nizam College".to_string(),
                    "Government Degree College, Khairatabad".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]
                .into(),
            ),
            ("mediumOfInstruction", "English".into()),
            ("hostelRequired", false.into()),
        ],
        Namespace::SignatureUpload => vec![
            ("studentPhoto", sample_file("studentPhoto", &mime::IMAGE_PNG)?),
            (
                "studentSignature",
                sample_file("studentSignature", &mime::IMAGE_PNG)?,
            ),
        ],
    };
    Ok(answers)
}

pub(crate) fn run_backup(command: BackupCommand) -> Result<(), AppError> {
    let portal = AppConfig::load()?.portal;
    let store = FileBackupStore::new(portal.backup_dir);

    match command {
        BackupCommand::Show => match store.read(&portal.backup_key)? {
            Some(backup) => {
                println!("Local backup saved at {}", backup.saved_at);
                for namespace in backup.data.namespaces() {
                    println!("- {}", namespace.label());
                }
                let missing = backup.data.missing();
                if !missing.is_empty() {
                    println!("{} section(s) still to complete", missing.len());
                }
            }
            None => println!("No local backup under {}", store.dir().display()),
        },
        BackupCommand::Clear => {
            store.clear(&portal.backup_key)?;
            println!("Local backup cleared");
        }
    }
    Ok(())
}
