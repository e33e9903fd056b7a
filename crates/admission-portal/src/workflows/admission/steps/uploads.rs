use std::path::Path;

use super::super::domain::{FieldMap, FieldValue, FileAsset, Namespace, StepPayload};
use super::super::encoder::{AssetSlots, SlotOutcome};
use super::super::error::ValidationError;
use super::catalog::StepDefinition;
use super::{check_fields, check_shape, invalid, unknown_field, FieldKind, FieldSpec, StepForm};

/// Step whose fields are all file selections (document uploads, photo and signature).
#[derive(Debug)]
pub struct UploadStep {
    definition: &'static StepDefinition,
    slots: AssetSlots,
}

impl UploadStep {
    pub fn new(definition: &'static StepDefinition) -> Self {
        Self {
            definition,
            slots: AssetSlots::new(),
        }
    }

    fn file_spec(&self, field: &str) -> Result<&'static FieldSpec, ValidationError> {
        let spec = self
            .definition
            .spec(field)
            .ok_or_else(|| unknown_field(self.namespace(), field))?;
        match spec.kind {
            FieldKind::File(_) => Ok(spec),
            _ => Err(invalid(self.namespace(), field, "is not a file field")),
        }
    }

    /// Encode the file at `path` into `field`. Selections for different fields may run
    /// concurrently; a newer selection for the same field supersedes an older one.
    pub async fn select_file(
        &self,
        field: &str,
        path: &Path,
    ) -> Result<SlotOutcome, ValidationError> {
        self.file_spec(field)?;
        Ok(self.slots.select_file(field, path).await)
    }

    pub fn attach(&self, asset: FileAsset) -> Result<(), ValidationError> {
        self.file_spec(&asset.field_name)?;
        self.slots.put(asset);
        Ok(())
    }

    pub fn remove(&self, field: &str) -> Result<(), ValidationError> {
        self.file_spec(field)?;
        self.slots.remove(field);
        Ok(())
    }

    /// Image assets that can be shown inline; documents are listed by type only.
    pub fn previews(&self) -> Vec<FileAsset> {
        self.slots
            .snapshot()
            .into_values()
            .filter(FileAsset::is_previewable)
            .collect()
    }

    fn values(&self) -> FieldMap {
        self.slots
            .snapshot()
            .into_iter()
            .map(|(name, asset)| (name, FieldValue::File(asset)))
            .collect()
    }
}

impl StepForm for UploadStep {
    fn namespace(&self) -> Namespace {
        self.definition.namespace
    }

    fn fields(&self) -> Vec<FieldSpec> {
        self.definition.fields.to_vec()
    }

    fn load(&mut self, snapshot: Option<&StepPayload>) {
        self.slots = AssetSlots::new();
        let Some(payload) = snapshot else {
            return;
        };
        for (name, value) in payload.fields() {
            if let (Ok(_), Some(asset)) = (self.file_spec(name), value.as_file()) {
                let mut asset = asset.clone();
                asset.field_name = name.clone();
                self.slots.put(asset);
            }
        }
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        let spec = self.file_spec(field)?;
        check_shape(self.namespace(), spec, &value)?;
        if let FieldValue::File(mut asset) = value {
            asset.field_name = field.to_string();
            self.slots.put(asset);
        }
        Ok(())
    }

    fn value(&self, field: &str) -> Option<FieldValue> {
        self.slots.get(field).map(FieldValue::File)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let values = self.values();
        check_fields(self.namespace(), self.definition.fields, |name| {
            values.get(name)
        })
    }

    fn emit(&self) -> Result<StepPayload, ValidationError> {
        let values = self.values();
        check_fields(self.namespace(), self.definition.fields, |name| {
            values.get(name)
        })?;
        Ok(StepPayload::new(self.namespace(), values))
    }
}
