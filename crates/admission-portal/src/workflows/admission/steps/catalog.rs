use super::super::domain::Namespace;
use super::super::encoder::AcceptList;
use super::preferences::PREFERENCE_FIELDS;
use super::{FieldKind, FieldSpec};

/// Declarative field set of one namespaced step.
#[derive(Debug)]
pub struct StepDefinition {
    pub namespace: Namespace,
    pub fields: &'static [FieldSpec],
}

impl StepDefinition {
    pub fn spec(&self, field: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == field)
    }
}

const GENDERS: &[&str] = &["Male", "Female", "Other"];
const CATEGORIES: &[&str] = &[
    "OC", "BC-A", "BC-B", "BC-C", "BC-D", "BC-E", "SC", "ST", "EWS",
];
const YES_NO: &[&str] = &["Yes", "No"];
const QUALIFYING_EXAMS: &[&str] = &["Intermediate", "Diploma", "CBSE XII", "Other"];

const STUDENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("studentName", "Name of the Student", FieldKind::Text),
    FieldSpec::required("fatherName", "Father's Name", FieldKind::Text),
    FieldSpec::required("motherName", "Mother's Name", FieldKind::Text),
    FieldSpec::required("dateOfBirth", "Date of Birth", FieldKind::Date),
    FieldSpec::required("gender", "Gender", FieldKind::Choice(GENDERS)),
    FieldSpec::required("aadhaarNumber", "Aadhaar Number", FieldKind::Aadhaar),
    FieldSpec::optional("nationality", "Nationality", FieldKind::Text),
    FieldSpec::optional("religion", "Religion", FieldKind::Text),
    FieldSpec::optional("motherTongue", "Mother Tongue", FieldKind::Text),
];

const ADDRESS_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("houseNumber", "House / Door No.", FieldKind::Text),
    FieldSpec::optional("street", "Street", FieldKind::Text),
    FieldSpec::required("village", "Village / Town", FieldKind::Text),
    FieldSpec::required("mandal", "Mandal", FieldKind::Text),
    FieldSpec::required("district", "District", FieldKind::Text),
    FieldSpec::required("state", "State", FieldKind::Text),
    FieldSpec::required("pincode", "PIN Code", FieldKind::Pincode),
];

const CONTACT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("mobileNo", "Mobile Number", FieldKind::Phone),
    FieldSpec::optional("alternateMobileNo", "Alternate Mobile Number", FieldKind::Phone),
    FieldSpec::required("email", "E-mail", FieldKind::Email),
    FieldSpec::optional("parentMobileNo", "Parent's Mobile Number", FieldKind::Phone),
];

const OTHER_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("category", "Category", FieldKind::Choice(CATEGORIES)),
    FieldSpec::optional("subCaste", "Sub-caste", FieldKind::Text),
    FieldSpec::optional("annualFamilyIncome", "Annual Family Income", FieldKind::Text),
    FieldSpec::optional(
        "physicallyChallenged",
        "Physically Challenged",
        FieldKind::Choice(YES_NO),
    ),
    FieldSpec::optional("sportsQuota", "Sports / NCC Quota", FieldKind::Choice(YES_NO)),
];

const UPLOAD_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "sscMemo",
        "SSC Marks Memo",
        FieldKind::File(AcceptList::ImagesOrPdf),
    ),
    FieldSpec::required(
        "interMemo",
        "Intermediate Marks Memo",
        FieldKind::File(AcceptList::ImagesOrPdf),
    ),
    FieldSpec::required(
        "transferCertificate",
        "Transfer Certificate",
        FieldKind::File(AcceptList::ImagesOrPdf),
    ),
    FieldSpec::optional(
        "casteCertificate",
        "Caste Certificate",
        FieldKind::File(AcceptList::Documents),
    ),
    FieldSpec::optional(
        "incomeCertificate",
        "Income Certificate",
        FieldKind::File(AcceptList::Documents),
    ),
];

const ACADEMIC_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "qualifyingExam",
        "Qualifying Examination",
        FieldKind::Choice(QUALIFYING_EXAMS),
    ),
    FieldSpec::required("board", "Board / University", FieldKind::Text),
    FieldSpec::required("hallTicketNumber", "Hall Ticket Number", FieldKind::Text),
    FieldSpec::required("yearOfPassing", "Year of Passing", FieldKind::Year),
    FieldSpec::required("percentage", "Percentage of Marks", FieldKind::Percentage),
    FieldSpec::optional("institutionName", "Institution Studied", FieldKind::Text),
];

const SIGNATURE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "studentPhoto",
        "Passport Size Photo",
        FieldKind::File(AcceptList::Images),
    ),
    FieldSpec::required(
        "studentSignature",
        "Student Signature",
        FieldKind::File(AcceptList::Images),
    ),
];

static STUDENT: StepDefinition = StepDefinition {
    namespace: Namespace::StudentDetails,
    fields: STUDENT_FIELDS,
};
static ADDRESS: StepDefinition = StepDefinition {
    namespace: Namespace::AddressDetails,
    fields: ADDRESS_FIELDS,
};
static CONTACT: StepDefinition = StepDefinition {
    namespace: Namespace::ContactDetails,
    fields: CONTACT_FIELDS,
};
static OTHER: StepDefinition = StepDefinition {
    namespace: Namespace::OtherDetails,
    fields: OTHER_FIELDS,
};
static UPLOADS: StepDefinition = StepDefinition {
    namespace: Namespace::UploadedFiles,
    fields: UPLOAD_FIELDS,
};
static ACADEMIC: StepDefinition = StepDefinition {
    namespace: Namespace::AcademicDetails,
    fields: ACADEMIC_FIELDS,
};
static PREFERENCES: StepDefinition = StepDefinition {
    namespace: Namespace::Preferences,
    fields: PREFERENCE_FIELDS,
};
static SIGNATURE: StepDefinition = StepDefinition {
    namespace: Namespace::SignatureUpload,
    fields: SIGNATURE_FIELDS,
};

pub fn definition(namespace: Namespace) -> &'static StepDefinition {
    match namespace {
        Namespace::StudentDetails => &STUDENT,
        Namespace::AddressDetails => &ADDRESS,
        Namespace::ContactDetails => &CONTACT,
        Namespace::OtherDetails => &OTHER,
        Namespace::UploadedFiles => &UPLOADS,
        Namespace::AcademicDetails => &ACADEMIC,
        Namespace::Preferences => &PREFERENCES,
        Namespace::SignatureUpload => &SIGNATURE,
    }
}

/// Every field a namespace can hold, including conditional ones.
pub fn field_specs(namespace: Namespace) -> &'static [FieldSpec] {
    definition(namespace).fields
}

pub fn field_label(namespace: Namespace, field: &str) -> Option<&'static str> {
    definition(namespace).spec(field).map(|spec| spec.label)
}
