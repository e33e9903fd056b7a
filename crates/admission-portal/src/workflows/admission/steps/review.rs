use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::domain::{ApplicationDocument, FieldValue, Namespace};
use super::super::error::ValidationError;
use super::catalog::field_specs;
use super::FieldKind;

/// Proof that the applicant accepted the declaration on the review step.
///
/// Only [`ReviewStep::confirm`] can create one, and submission requires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewConfirmation {
    confirmed_at: DateTime<Utc>,
}

impl ReviewConfirmation {
    pub fn confirmed_at(&self) -> DateTime<Utc> {
        self.confirmed_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSection {
    pub namespace: Namespace,
    pub title: &'static str,
    pub complete: bool,
    pub entries: Vec<ReviewEntry>,
}

/// Final, display-only step. Reads the merged document and never writes to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReviewStep;

impl ReviewStep {
    pub fn summary(&self, document: &ApplicationDocument) -> Vec<ReviewSection> {
        Namespace::ALL
            .into_iter()
            .map(|namespace| {
                let entries = document
                    .slice(namespace)
                    .map(|payload| {
                        field_specs(namespace)
                            .iter()
                            .filter_map(|spec| {
                                let value = payload.get(spec.name)?;
                                if value.is_blank() {
                                    return None;
                                }
                                Some(ReviewEntry {
                                    label: spec.label.to_string(),
                                    value: display_value(spec.kind, value),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                ReviewSection {
                    namespace,
                    title: namespace.label(),
                    complete: document.contains(namespace),
                    entries,
                }
            })
            .collect()
    }

    pub fn confirm(&self, declaration_accepted: bool) -> Result<ReviewConfirmation, ValidationError> {
        if !declaration_accepted {
            return Err(ValidationError::DeclarationNotAccepted);
        }
        Ok(ReviewConfirmation {
            confirmed_at: Utc::now(),
        })
    }
}

fn display_value(kind: FieldKind, value: &FieldValue) -> String {
    match (kind, value) {
        (FieldKind::Ranked(_), FieldValue::List(entries)) => entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(rank, entry)| format!("{}. {entry}", rank + 1))
            .collect::<Vec<_>>()
            .join("; "),
        (_, FieldValue::List(entries)) => entries.join(", "),
        (_, FieldValue::Flag(flag)) => (if *flag { "Yes" } else { "No" }).to_string(),
        (_, FieldValue::File(asset)) => format!(
            "{} attached",
            asset.content_type().unwrap_or("file")
        ),
        (_, FieldValue::Text(text)) => text.clone(),
    }
}
