//! The eight data-collection steps plus the read-only review step.
//!
//! Each step owns one namespace. It is loaded from the sequencer's snapshot of that
//! namespace, edited field by field, and emits a fresh [`StepPayload`] only once its
//! required fields are filled and well formed.

mod catalog;
mod form;
mod preferences;
mod review;
mod uploads;

use chrono::NaiveDate;

use super::domain::{ApplicationDocument, FieldValue, Namespace, StepPayload};
use super::encoder::AcceptList;
use super::error::{SubmissionError, ValidationError};

pub use catalog::{definition, field_label, field_specs, StepDefinition};
pub use form::FormStep;
pub use preferences::{
    PreferencesStep, BSC_GROUP, BSC_SPECIALIZATIONS, DEGREE_GROUPS, PREFERENCE_SLOTS,
};
pub use review::{ReviewConfirmation, ReviewEntry, ReviewSection, ReviewStep};
pub use uploads::UploadStep;

/// Input shape of a field, used both for rendering and for format checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Email,
    Phone,
    Pincode,
    Aadhaar,
    Year,
    Percentage,
    Choice(&'static [&'static str]),
    MultiChoice(&'static [&'static str]),
    /// Fixed number of positional slots.
    Ranked(usize),
    File(AcceptList),
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }

    /// Whether `value` has the variant this field stores.
    fn accepts_shape(&self, value: &FieldValue) -> bool {
        matches!(
            (self.kind, value),
            (FieldKind::MultiChoice(_) | FieldKind::Ranked(_), FieldValue::List(_))
                | (FieldKind::File(_), FieldValue::File(_))
                | (FieldKind::Flag, FieldValue::Flag(_))
                | (
                    FieldKind::Text
                        | FieldKind::Date
                        | FieldKind::Email
                        | FieldKind::Phone
                        | FieldKind::Pincode
                        | FieldKind::Aadhaar
                        | FieldKind::Year
                        | FieldKind::Percentage
                        | FieldKind::Choice(_),
                    FieldValue::Text(_)
                )
        )
    }
}

/// Capability set shared by every data-collection step.
pub trait StepForm: Send + Sync {
    fn namespace(&self) -> Namespace;

    fn title(&self) -> &'static str {
        self.namespace().label()
    }

    /// Fields currently shown, in display order. Conditional fields appear only when active.
    fn fields(&self) -> Vec<FieldSpec>;

    /// Replace the step's state with the sequencer's snapshot of its namespace.
    fn load(&mut self, snapshot: Option<&StepPayload>);

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError>;

    fn value(&self, field: &str) -> Option<FieldValue>;

    fn validate(&self) -> Result<(), ValidationError>;

    /// Validate and produce the payload handed to the sequencer's `advance`.
    fn emit(&self) -> Result<StepPayload, ValidationError>;
}

/// Fresh forms for every namespaced step, in wizard order.
pub fn step_forms() -> Vec<Box<dyn StepForm>> {
    Namespace::ALL.into_iter().map(form_for).collect()
}

pub fn form_for(namespace: Namespace) -> Box<dyn StepForm> {
    match namespace {
        Namespace::UploadedFiles | Namespace::SignatureUpload => {
            Box::new(UploadStep::new(catalog::definition(namespace)))
        }
        Namespace::Preferences => Box::new(PreferencesStep::new()),
        _ => Box::new(FormStep::new(catalog::definition(namespace))),
    }
}

/// Re-run every step's validation against a complete document.
pub fn validate_document(document: &ApplicationDocument) -> Result<(), SubmissionError> {
    let missing = document.missing();
    if !missing.is_empty() {
        return Err(SubmissionError::Incomplete { missing });
    }

    for payload in document.payloads() {
        check_payload(payload)?;
        let mut form = form_for(payload.namespace());
        form.load(Some(payload));
        form.validate()?;
    }

    Ok(())
}

/// Field checks against the payload exactly as stored. Loading into a form filters stale
/// and unknown entries, so the raw map is checked first.
fn check_payload(payload: &StepPayload) -> Result<(), ValidationError> {
    let namespace = payload.namespace();
    let specs = match namespace {
        Namespace::Preferences => preferences::payload_specs(payload)?,
        _ => catalog::field_specs(namespace).to_vec(),
    };
    let all = catalog::definition(namespace);
    if let Some(name) = payload
        .fields()
        .keys()
        .find(|name| all.spec(name).is_none())
    {
        return Err(unknown_field(namespace, name));
    }
    check_fields(namespace, &specs, |name| payload.get(name))
}

fn unknown_field(namespace: Namespace, field: &str) -> ValidationError {
    ValidationError::UnknownField {
        namespace,
        field: field.to_string(),
    }
}

fn invalid(namespace: Namespace, field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        namespace,
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn check_shape(
    namespace: Namespace,
    spec: &FieldSpec,
    value: &FieldValue,
) -> Result<(), ValidationError> {
    if spec.accepts_shape(value) {
        Ok(())
    } else {
        Err(invalid(namespace, spec.name, "has the wrong type"))
    }
}

/// Required-field check across all `specs`, then format checks on the filled ones.
fn check_fields<'a>(
    namespace: Namespace,
    specs: &[FieldSpec],
    lookup: impl Fn(&str) -> Option<&'a FieldValue>,
) -> Result<(), ValidationError> {
    let missing: Vec<String> = specs
        .iter()
        .filter(|spec| spec.required)
        .filter(|spec| lookup(spec.name).map_or(true, FieldValue::is_blank))
        .map(|spec| spec.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields {
            namespace,
            fields: missing,
        });
    }

    for spec in specs {
        let Some(value) = lookup(spec.name) else {
            continue;
        };
        check_shape(namespace, spec, value)?;
        if value.is_blank() {
            continue;
        }
        check_format(namespace, spec, value)?;
    }

    Ok(())
}

fn all_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn check_format(
    namespace: Namespace,
    spec: &FieldSpec,
    value: &FieldValue,
) -> Result<(), ValidationError> {
    let text = value.as_text().map(str::trim).unwrap_or_default();
    let problem = match spec.kind {
        FieldKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .err()
            .map(|_| "must be a date in YYYY-MM-DD form".to_string()),
        FieldKind::Email => {
            let valid = text
                .split_once('@')
                .map(|(local, domain)| {
                    !local.is_empty()
                        && domain.contains('.')
                        && !domain.starts_with('.')
                        && !domain.ends_with('.')
                        && !domain.contains('@')
                })
                .unwrap_or(false);
            (!valid).then(|| "must be a valid e-mail address".to_string())
        }
        FieldKind::Phone => {
            (!all_digits(text, 10)).then(|| "must be a 10 digit mobile number".to_string())
        }
        FieldKind::Pincode => (!all_digits(text, 6)).then(|| "must be a 6 digit PIN code".to_string()),
        FieldKind::Aadhaar => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            (!all_digits(&compact, 12)).then(|| "must be a 12 digit Aadhaar number".to_string())
        }
        FieldKind::Year => (!all_digits(text, 4)).then(|| "must be a 4 digit year".to_string()),
        FieldKind::Percentage => match text.parse::<f32>() {
            Ok(pct) if (0.0..=100.0).contains(&pct) => None,
            _ => Some("must be a percentage between 0 and 100".to_string()),
        },
        FieldKind::Choice(options) => (!options.contains(&text))
            .then(|| format!("must be one of: {}", options.join(", "))),
        FieldKind::MultiChoice(options) => value
            .as_list()
            .unwrap_or_default()
            .iter()
            .find(|entry| !options.contains(&entry.as_str()))
            .map(|entry| format!("contains unsupported option '{entry}'")),
        FieldKind::Ranked(slots) => {
            let entries = value.as_list().unwrap_or_default();
            (entries.len() != slots).then(|| format!("must have exactly {slots} entries"))
        }
        FieldKind::Text | FieldKind::File(_) | FieldKind::Flag => None,
    };

    match problem {
        Some(reason) => Err(invalid(namespace, spec.name, reason)),
        None => Ok(()),
    }
}
