use std::collections::BTreeSet;

use super::super::domain::{FieldMap, FieldValue, Namespace, StepPayload};
use super::super::error::ValidationError;
use super::{check_fields, check_shape, invalid, unknown_field, FieldKind, FieldSpec, StepForm};

pub const DEGREE_GROUPS: &[&str] = &["BA", "BCom", "BSc", "BBA", "BCA"];
pub const BSC_GROUP: &str = "BSc";
pub const BSC_SPECIALIZATIONS: &[&str] = &["MPC", "MPCs", "MSCs", "MECs", "BZC", "MBZC"];
const MEDIUMS: &[&str] = &["English", "Telugu"];

/// Number of ranked college preferences. The list never holds fewer or more entries.
pub const PREFERENCE_SLOTS: usize = 5;

pub(super) const PREFERENCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("degreeGroup", "Degree Group", FieldKind::Choice(DEGREE_GROUPS)),
    FieldSpec::required(
        "bscSpecializations",
        "BSc Specializations",
        FieldKind::MultiChoice(BSC_SPECIALIZATIONS),
    ),
    FieldSpec::required(
        "collegePreferences",
        "College Preferences",
        FieldKind::Ranked(PREFERENCE_SLOTS),
    ),
    FieldSpec::required(
        "mediumOfInstruction",
        "Medium of Instruction",
        FieldKind::Choice(MEDIUMS),
    ),
    FieldSpec::optional("hostelRequired", "Hostel Required", FieldKind::Flag),
];

const SPECIALIZATIONS_FIELD: &str = "bscSpecializations";

/// Course preferences. Specializations are only shown, kept, and emitted for the BSc group.
#[derive(Debug, Clone)]
pub struct PreferencesStep {
    degree_group: String,
    bsc_specializations: Vec<String>,
    college_preferences: [String; PREFERENCE_SLOTS],
    medium: String,
    hostel_required: bool,
}

impl Default for PreferencesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferencesStep {
    pub fn new() -> Self {
        Self {
            degree_group: String::new(),
            bsc_specializations: Vec::new(),
            college_preferences: Default::default(),
            medium: String::new(),
            hostel_required: false,
        }
    }

    fn is_bsc(&self) -> bool {
        self.degree_group == BSC_GROUP
    }

    fn spec(field: &str) -> Option<&'static FieldSpec> {
        PREFERENCE_FIELDS.iter().find(|spec| spec.name == field)
    }

    /// Set the college ranked at `rank` (1-based).
    pub fn set_preference(&mut self, rank: usize, college: &str) -> Result<(), ValidationError> {
        if !(1..=PREFERENCE_SLOTS).contains(&rank) {
            return Err(invalid(
                Namespace::Preferences,
                "collegePreferences",
                format!("rank must be between 1 and {PREFERENCE_SLOTS}"),
            ));
        }
        self.college_preferences[rank - 1] = college.trim().to_string();
        Ok(())
    }

    pub fn preferences(&self) -> &[String; PREFERENCE_SLOTS] {
        &self.college_preferences
    }

    pub fn specializations(&self) -> &[String] {
        &self.bsc_specializations
    }

    fn set_degree_group(&mut self, group: String) {
        if group != BSC_GROUP && !self.bsc_specializations.is_empty() {
            tracing::debug!(group = %group, "clearing BSc specializations after group change");
            self.bsc_specializations.clear();
        }
        self.degree_group = group;
    }

    fn fill_slots(&mut self, entries: &[String]) -> Result<(), ValidationError> {
        if entries.len() > PREFERENCE_SLOTS {
            return Err(invalid(
                Namespace::Preferences,
                "collegePreferences",
                format!("allows at most {PREFERENCE_SLOTS} colleges"),
            ));
        }
        self.college_preferences = Default::default();
        for (slot, entry) in self.college_preferences.iter_mut().zip(entries) {
            *slot = entry.trim().to_string();
        }
        Ok(())
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(
            "degreeGroup".to_string(),
            FieldValue::text(self.degree_group.clone()),
        );
        if self.is_bsc() {
            fields.insert(
                SPECIALIZATIONS_FIELD.to_string(),
                FieldValue::List(self.bsc_specializations.clone()),
            );
        }
        fields.insert(
            "collegePreferences".to_string(),
            FieldValue::List(self.college_preferences.to_vec()),
        );
        fields.insert(
            "mediumOfInstruction".to_string(),
            FieldValue::text(self.medium.clone()),
        );
        fields.insert(
            "hostelRequired".to_string(),
            FieldValue::Flag(self.hostel_required),
        );
        fields
    }

    fn check_duplicates(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for college in self.college_preferences.iter().filter(|c| !c.is_empty()) {
            if !seen.insert(college.to_ascii_lowercase()) {
                return Err(invalid(
                    Namespace::Preferences,
                    "collegePreferences",
                    format!("lists '{college}' more than once"),
                ));
            }
        }
        Ok(())
    }
}

/// Fields that apply to a stored preferences payload. Specializations stored under a
/// group other than BSc are an error rather than something to drop.
pub(super) fn payload_specs(payload: &StepPayload) -> Result<Vec<FieldSpec>, ValidationError> {
    let is_bsc = payload.text("degreeGroup") == Some(BSC_GROUP);
    if !is_bsc && payload.get(SPECIALIZATIONS_FIELD).is_some() {
        return Err(invalid(
            Namespace::Preferences,
            SPECIALIZATIONS_FIELD,
            "is only available for the BSc group",
        ));
    }
    Ok(PREFERENCE_FIELDS
        .iter()
        .filter(|spec| spec.name != SPECIALIZATIONS_FIELD || is_bsc)
        .copied()
        .collect())
}

impl StepForm for PreferencesStep {
    fn namespace(&self) -> Namespace {
        Namespace::Preferences
    }

    fn fields(&self) -> Vec<FieldSpec> {
        PREFERENCE_FIELDS
            .iter()
            .filter(|spec| spec.name != SPECIALIZATIONS_FIELD || self.is_bsc())
            .copied()
            .collect()
    }

    fn load(&mut self, snapshot: Option<&StepPayload>) {
        *self = Self::new();
        let Some(payload) = snapshot else {
            return;
        };

        if let Some(group) = payload.text("degreeGroup") {
            self.degree_group = group.to_string();
        }
        if self.is_bsc() {
            if let Some(list) = payload.get(SPECIALIZATIONS_FIELD).and_then(FieldValue::as_list) {
                self.bsc_specializations = list.to_vec();
            }
        }
        if let Some(list) = payload
            .get("collegePreferences")
            .and_then(FieldValue::as_list)
        {
            if let Err(error) = self.fill_slots(list) {
                tracing::debug!(%error, "ignoring stored college preferences");
            }
        }
        if let Some(medium) = payload.text("mediumOfInstruction") {
            self.medium = medium.to_string();
        }
        self.hostel_required = payload
            .get("hostelRequired")
            .and_then(FieldValue::as_flag)
            .unwrap_or(false);
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        let spec = Self::spec(field).ok_or_else(|| unknown_field(self.namespace(), field))?;
        check_shape(self.namespace(), spec, &value)?;

        match (field, value) {
            ("degreeGroup", FieldValue::Text(group)) => self.set_degree_group(group),
            (SPECIALIZATIONS_FIELD, FieldValue::List(list)) => {
                if !self.is_bsc() {
                    return Err(invalid(
                        self.namespace(),
                        field,
                        "is only available for the BSc group",
                    ));
                }
                self.bsc_specializations = list;
            }
            ("collegePreferences", FieldValue::List(list)) => self.fill_slots(&list)?,
            ("mediumOfInstruction", FieldValue::Text(medium)) => self.medium = medium,
            ("hostelRequired", FieldValue::Flag(flag)) => self.hostel_required = flag,
            _ => return Err(unknown_field(self.namespace(), field)),
        }
        Ok(())
    }

    fn value(&self, field: &str) -> Option<FieldValue> {
        self.to_fields().remove(field)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let fields = self.to_fields();
        let visible = self.fields();
        check_fields(self.namespace(), &visible, |name| fields.get(name))?;
        self.check_duplicates()
    }

    fn emit(&self) -> Result<StepPayload, ValidationError> {
        self.validate()?;
        Ok(StepPayload::new(self.namespace(), self.to_fields()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_step(group: &str) -> PreferencesStep {
        let mut step = PreferencesStep::new();
        step.set("degreeGroup", group.into()).expect("group");
        step.set("mediumOfInstruction", "English".into())
            .expect("medium");
        step.set_preference(1, "Government Degree College, Khairatabad")
            .expect("rank 1");
        step
    }

    #[test]
    fn preference_list_always_has_five_slots() {
        let mut step = PreferencesStep::new();
        assert_eq!(step.preferences().len(), PREFERENCE_SLOTS);

        step.set(
            "collegePreferences",
            FieldValue::List(vec!["A".to_string(), "B".to_string()]),
        )
        .expect("list accepted");
        let emitted = step.value("collegePreferences").expect("always present");
        assert_eq!(
            emitted.as_list().map(<[String]>::len),
            Some(PREFERENCE_SLOTS)
        );
        assert_eq!(step.preferences()[2], "");
    }

    #[test]
    fn more_colleges_than_slots_is_rejected() {
        let mut step = filled_step("BA");
        let six: Vec<String> = (1..=6).map(|n| format!("College {n}")).collect();

        match step.set("collegePreferences", FieldValue::List(six)) {
            Err(ValidationError::InvalidField { field, .. }) => {
                assert_eq!(field, "collegePreferences")
            }
            other => panic!("expected invalid preferences, got {other:?}"),
        }
        assert_eq!(
            step.preferences()[0],
            "Government Degree College, Khairatabad"
        );
    }

    #[test]
    fn rank_outside_slots_is_rejected() {
        let mut step = PreferencesStep::new();
        assert!(step.set_preference(0, "A").is_err());
        assert!(step.set_preference(6, "A").is_err());
        assert!(step.set_preference(5, "A").is_ok());
    }

    #[test]
    fn specializations_only_visible_for_bsc() {
        let step = filled_step("BCom");
        assert!(step
            .fields()
            .iter()
            .all(|spec| spec.name != "bscSpecializations"));

        let step = filled_step("BSc");
        assert!(step
            .fields()
            .iter()
            .any(|spec| spec.name == "bscSpecializations"));
    }

    #[test]
    fn bsc_requires_at_least_one_specialization() {
        let step = filled_step("BSc");
        match step.emit() {
            Err(ValidationError::MissingFields { fields, .. }) => {
                assert_eq!(fields, vec!["bscSpecializations".to_string()])
            }
            other => panic!("expected missing specializations, got {other:?}"),
        }
    }

    #[test]
    fn switching_away_from_bsc_drops_specializations() {
        let mut step = filled_step("BSc");
        step.set(
            "bscSpecializations",
            FieldValue::List(vec!["MPC".to_string(), "BZC".to_string()]),
        )
        .expect("BSc accepts specializations");

        step.set("degreeGroup", "BCom".into()).expect("group change");

        assert!(step.specializations().is_empty());
        let payload = step.emit().expect("BCom payload is valid");
        assert!(payload.get("bscSpecializations").is_none());
        assert_eq!(payload.text("degreeGroup"), Some("BCom"));
    }

    #[test]
    fn specializations_refused_outside_bsc() {
        let mut step = filled_step("BA");
        assert!(matches!(
            step.set(
                "bscSpecializations",
                FieldValue::List(vec!["MPC".to_string()])
            ),
            Err(ValidationError::InvalidField { .. })
        ));
    }

    #[test]
    fn duplicate_colleges_are_rejected() {
        let mut step = filled_step("BA");
        step.set_preference(2, "government degree college, khairatabad")
            .expect("rank 2");
        assert!(matches!(
            step.validate(),
            Err(ValidationError::InvalidField { .. })
        ));
    }

    #[test]
    fn stale_bsc_data_in_snapshot_is_not_reloaded_for_other_groups() {
        let mut fields = FieldMap::new();
        fields.insert("degreeGroup".to_string(), "BCom".into());
        fields.insert(
            "bscSpecializations".to_string(),
            FieldValue::List(vec!["MPC".to_string()]),
        );
        let mut step = PreferencesStep::new();
        step.load(Some(&StepPayload::new(Namespace::Preferences, fields)));
        assert!(step.specializations().is_empty());
    }
}
