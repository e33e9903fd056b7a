use super::super::domain::{FieldMap, FieldValue, Namespace, StepPayload};
use super::super::error::ValidationError;
use super::catalog::StepDefinition;
use super::{check_fields, check_shape, unknown_field, FieldSpec, StepForm};

/// Plain declarative step: every field is always shown and stored as entered.
#[derive(Debug)]
pub struct FormStep {
    definition: &'static StepDefinition,
    values: FieldMap,
}

impl FormStep {
    pub fn new(definition: &'static StepDefinition) -> Self {
        Self {
            definition,
            values: FieldMap::new(),
        }
    }
}

impl StepForm for FormStep {
    fn namespace(&self) -> Namespace {
        self.definition.namespace
    }

    fn fields(&self) -> Vec<FieldSpec> {
        self.definition.fields.to_vec()
    }

    fn load(&mut self, snapshot: Option<&StepPayload>) {
        self.values = snapshot
            .map(|payload| {
                payload
                    .fields()
                    .iter()
                    .filter(|(name, _)| self.definition.spec(name).is_some())
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        let spec = self
            .definition
            .spec(field)
            .ok_or_else(|| unknown_field(self.namespace(), field))?;
        check_shape(self.namespace(), spec, &value)?;
        self.values.insert(field.to_string(), value);
        Ok(())
    }

    fn value(&self, field: &str) -> Option<FieldValue> {
        self.values.get(field).cloned()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_fields(self.namespace(), self.definition.fields, |name| {
            self.values.get(name)
        })
    }

    fn emit(&self) -> Result<StepPayload, ValidationError> {
        self.validate()?;
        Ok(StepPayload::new(self.namespace(), self.values.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::catalog::definition;
    use super::*;

    fn contact_step() -> FormStep {
        FormStep::new(definition(Namespace::ContactDetails))
    }

    #[test]
    fn emit_refuses_missing_required_fields() {
        let mut step = contact_step();
        step.set("mobileNo", "9876543210".into()).expect("known field");

        match step.emit() {
            Err(ValidationError::MissingFields { namespace, fields }) => {
                assert_eq!(namespace, Namespace::ContactDetails);
                assert_eq!(fields, vec!["email".to_string()]);
            }
            other => panic!("expected missing email, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_only_values_count_as_missing() {
        let mut step = contact_step();
        step.set("mobileNo", "9876543210".into()).expect("known field");
        step.set("email", "   ".into()).expect("known field");

        assert!(matches!(
            step.validate(),
            Err(ValidationError::MissingFields { .. })
        ));
    }

    #[test]
    fn malformed_values_are_rejected_after_required_check() {
        let mut step = contact_step();
        step.set("mobileNo", "98765".into()).expect("known field");
        step.set("email", "asha@example.com".into()).expect("known field");

        match step.validate() {
            Err(ValidationError::InvalidField { field, .. }) => assert_eq!(field, "mobileNo"),
            other => panic!("expected invalid mobile number, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_and_wrong_shapes_are_refused() {
        let mut step = contact_step();
        assert!(matches!(
            step.set("favouriteColour", "blue".into()),
            Err(ValidationError::UnknownField { .. })
        ));
        assert!(matches!(
            step.set("email", FieldValue::Flag(true)),
            Err(ValidationError::InvalidField { .. })
        ));
    }

    #[test]
    fn load_replaces_previous_state() {
        let mut step = contact_step();
        step.set("alternateMobileNo", "9000000000".into())
            .expect("known field");

        let mut fields = FieldMap::new();
        fields.insert("mobileNo".to_string(), "9876543210".into());
        fields.insert("email".to_string(), "asha@example.com".into());
        step.load(Some(&StepPayload::new(Namespace::ContactDetails, fields)));

        assert!(step.value("alternateMobileNo").is_none());
        let payload = step.emit().expect("loaded payload is valid");
        assert_eq!(payload.text("email"), Some("asha@example.com"));
    }
}
