use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Topical key under which one step's answers are stored in the merged document.
///
/// Declaration order is step order, so ordered maps keyed by `Namespace` iterate in the
/// order the applicant fills the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Namespace {
    StudentDetails,
    AddressDetails,
    ContactDetails,
    OtherDetails,
    UploadedFiles,
    AcademicDetails,
    Preferences,
    SignatureUpload,
}

impl Namespace {
    pub const ALL: [Namespace; 8] = [
        Namespace::StudentDetails,
        Namespace::AddressDetails,
        Namespace::ContactDetails,
        Namespace::OtherDetails,
        Namespace::UploadedFiles,
        Namespace::AcademicDetails,
        Namespace::Preferences,
        Namespace::SignatureUpload,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Namespace::StudentDetails => "studentDetails",
            Namespace::AddressDetails => "addressDetails",
            Namespace::ContactDetails => "contactDetails",
            Namespace::OtherDetails => "otherDetails",
            Namespace::UploadedFiles => "uploadedFiles",
            Namespace::AcademicDetails => "academicDetails",
            Namespace::Preferences => "preferences",
            Namespace::SignatureUpload => "signatureUpload",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Namespace::StudentDetails => "Student Details",
            Namespace::AddressDetails => "Address Details",
            Namespace::ContactDetails => "Contact Details",
            Namespace::OtherDetails => "Other Details",
            Namespace::UploadedFiles => "Upload Documents",
            Namespace::AcademicDetails => "Academic Details",
            Namespace::Preferences => "Course Preferences",
            Namespace::SignatureUpload => "Photo & Signature",
        }
    }

    /// Zero-based wizard position of the step that owns this namespace.
    pub const fn step_index(self) -> usize {
        self as usize
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|namespace| namespace.key() == key)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Whether an encoded upload can be previewed visually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeClass {
    Image,
    Document,
}

/// A user-selected file embedded in the document as a self-describing data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAsset {
    pub field_name: String,
    pub mime_class: MimeClass,
    pub encoded_content: String,
}

impl FileAsset {
    /// Content type declared by the data URL prefix, e.g. `image/png`.
    pub fn content_type(&self) -> Option<&str> {
        let rest = self.encoded_content.strip_prefix("data:")?;
        let end = rest.find(|c: char| c == ';' || c == ',')?;
        Some(&rest[..end])
    }

    pub fn is_previewable(&self) -> bool {
        self.mime_class == MimeClass::Image
    }
}

/// A single answer captured by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
    File(FileAsset),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Blank values do not satisfy a required field.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Flag(value) => !value,
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::List(values) => values.iter().all(|value| value.trim().is_empty()),
            FieldValue::File(asset) => asset.encoded_content.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileAsset> {
        match self {
            FieldValue::File(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

impl From<FileAsset> for FieldValue {
    fn from(asset: FileAsset) -> Self {
        FieldValue::File(asset)
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

/// The partial document emitted by exactly one step. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPayload {
    namespace: Namespace,
    fields: FieldMap,
}

impl StepPayload {
    pub fn new(namespace: Namespace, fields: FieldMap) -> Self {
        Self { namespace, fields }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }
}

/// The accumulated application: at most one payload per namespace, iterated in step order.
///
/// Namespaces of steps that were never completed are absent; the wire form is a JSON object
/// keyed by namespace with no `null` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Namespace, FieldMap>",
    into = "BTreeMap<Namespace, FieldMap>"
)]
pub struct ApplicationDocument {
    entries: BTreeMap<Namespace, StepPayload>,
}

impl ApplicationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `payload` under its namespace, returning whatever it replaced.
    pub fn merge(&mut self, payload: StepPayload) -> Option<StepPayload> {
        self.entries.insert(payload.namespace, payload)
    }

    pub fn slice(&self, namespace: Namespace) -> Option<&StepPayload> {
        self.entries.get(&namespace)
    }

    pub fn contains(&self, namespace: Namespace) -> bool {
        self.entries.contains_key(&namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = Namespace> + '_ {
        self.entries.keys().copied()
    }

    pub fn payloads(&self) -> impl Iterator<Item = &StepPayload> {
        self.entries.values()
    }

    /// Namespaces that no step has written yet, in step order.
    pub fn missing(&self) -> Vec<Namespace> {
        Namespace::ALL
            .into_iter()
            .filter(|namespace| !self.contains(*namespace))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applicant name used in summaries and listings.
    pub fn student_name(&self) -> Option<&str> {
        self.slice(Namespace::StudentDetails)
            .and_then(|payload| payload.text("studentName"))
            .filter(|name| !name.trim().is_empty())
    }
}

impl From<BTreeMap<Namespace, FieldMap>> for ApplicationDocument {
    fn from(raw: BTreeMap<Namespace, FieldMap>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(namespace, fields)| (namespace, StepPayload::new(namespace, fields)))
            .collect();
        Self { entries }
    }
}

impl From<ApplicationDocument> for BTreeMap<Namespace, FieldMap> {
    fn from(document: ApplicationDocument) -> Self {
        document
            .entries
            .into_iter()
            .map(|(namespace, payload)| (namespace, payload.fields))
            .collect()
    }
}

/// Server-assigned identifier of a resumable draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DraftId(pub String);

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier generated when an application is submitted. Disjoint from [`DraftId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Draft,
}

/// A checkpointed, not-yet-submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<DraftId>,
    pub data: ApplicationDocument,
    #[serde(default)]
    pub status: DraftStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Draft {
    pub fn new(data: ApplicationDocument) -> Self {
        Self {
            draft_id: None,
            data,
            status: DraftStatus::Draft,
            updated_at: None,
        }
    }
}

/// Sub-document maintained by the admissions office after submission.
///
/// Never written by a wizard step; replaced wholesale on every save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficeUseFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admitted_course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<u32>,
    pub documents_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl OfficeUseFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Read model returned by the application summary endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub application_id: ApplicationId,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    pub data: ApplicationDocument,
    #[serde(default)]
    pub office_use_only: OfficeUseFields,
}
