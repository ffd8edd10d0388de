//! Developer-field registry: the two-level `(developer_data_index,
//! field_number)` mapping built from global messages 207
//! (`developer_data_id`) and 206 (`field_description`), grounded in
//! `fittie/fitfile/field_description.py` and the registration logic in
//! `fittie/fitfile/fitfile.py`.

use std::collections::HashMap;

use crate::field::{DecodedField, Value};

pub const MESG_NUM_DEVELOPER_DATA_ID: u16 = 207;
pub const MESG_NUM_FIELD_DESCRIPTION: u16 = 206;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescription {
    pub developer_data_index: u8,
    pub field_definition_number: u8,
    pub fit_base_type_id: u8,
    pub field_name: String,
    pub units: Option<String>,
    pub native_mesg_num: Option<u16>,
    pub native_field_num: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeveloperDataEntry {
    pub application_id: Vec<u8>,
    pub developer_data_index: u8,
    pub application_version: Option<u32>,
    pub fields: HashMap<u8, FieldDescription>,
}

#[derive(Debug, Clone, Default)]
pub struct DeveloperRegistry {
    entries: HashMap<u8, DeveloperDataEntry>,
}

impl DeveloperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_developer_data_id(&mut self, application_id: Vec<u8>, developer_data_index: u8, application_version: Option<u32>) {
        let existing_fields = self
            .entries
            .get(&developer_data_index)
            .map(|e| e.fields.clone())
            .unwrap_or_default();
        self.entries.insert(
            developer_data_index,
            DeveloperDataEntry {
                application_id,
                developer_data_index,
                application_version,
                fields: existing_fields,
            },
        );
    }

    pub fn register_field_description(&mut self, description: FieldDescription) {
        self.entries
            .entry(description.developer_data_index)
            .or_insert_with(|| DeveloperDataEntry {
                developer_data_index: description.developer_data_index,
                ..Default::default()
            })
            .fields
            .insert(description.field_definition_number, description);
    }

    pub fn field_description(&self, developer_data_index: u8, field_definition_number: u8) -> Option<&FieldDescription> {
        self.entries
            .get(&developer_data_index)?
            .fields
            .get(&field_definition_number)
    }

    /// Consumes the registry, returning its final `developer_data_index ->
    /// entry` snapshot for attaching to a decoded file.
    pub fn into_entries(self) -> HashMap<u8, DeveloperDataEntry> {
        self.entries
    }
}

fn field_as_u8(fields: &HashMap<String, DecodedField>, name: &str) -> Option<u8> {
    match fields.get(name)? {
        DecodedField::Scalar(Some(Value::Unsigned(n))) => Some(*n as u8),
        DecodedField::Scalar(Some(Value::Signed(n))) => Some(*n as u8),
        _ => None,
    }
}

fn field_as_u16(fields: &HashMap<String, DecodedField>, name: &str) -> Option<u16> {
    match fields.get(name)? {
        DecodedField::Scalar(Some(Value::Unsigned(n))) => Some(*n as u16),
        DecodedField::Scalar(Some(Value::Signed(n))) => Some(*n as u16),
        _ => None,
    }
}

fn field_as_u32(fields: &HashMap<String, DecodedField>, name: &str) -> Option<u32> {
    match fields.get(name)? {
        DecodedField::Scalar(Some(Value::Unsigned(n))) => Some(*n as u32),
        DecodedField::Scalar(Some(Value::Signed(n))) => Some(*n as u32),
        _ => None,
    }
}

fn field_as_text(fields: &HashMap<String, DecodedField>, name: &str) -> Option<String> {
    match fields.get(name)? {
        DecodedField::Scalar(Some(Value::Text(s))) => Some(s.clone()),
        _ => None,
    }
}

fn field_as_bytes(fields: &HashMap<String, DecodedField>, name: &str) -> Vec<u8> {
    match fields.get(name) {
        Some(DecodedField::Array(values)) => values
            .iter()
            .map(|v| match v {
                Some(Value::Unsigned(n)) => *n as u8,
                Some(Value::Signed(n)) => *n as u8,
                _ => 0,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Builds a `developer_data_id` registration entry from a decoded data
/// message's fields, returning `None` if the mandatory
/// `developer_data_index` field is missing.
pub fn developer_data_id_from_fields(fields: &HashMap<String, DecodedField>) -> Option<(Vec<u8>, u8, Option<u32>)> {
    let developer_data_index = field_as_u8(fields, "developer_data_index")?;
    let application_id = field_as_bytes(fields, "application_id");
    let application_version = field_as_u32(fields, "application_version");
    Some((application_id, developer_data_index, application_version))
}

/// Builds a `field_description` registration entry from a decoded data
/// message's fields, returning `None` if a mandatory field is missing.
pub fn field_description_from_fields(fields: &HashMap<String, DecodedField>) -> Option<FieldDescription> {
    Some(FieldDescription {
        developer_data_index: field_as_u8(fields, "developer_data_index")?,
        field_definition_number: field_as_u8(fields, "field_definition_number")?,
        fit_base_type_id: field_as_u8(fields, "fit_base_type_id")?,
        field_name: field_as_text(fields, "field_name")?,
        units: field_as_text(fields, "units"),
        native_mesg_num: field_as_u16(fields, "native_mesg_num"),
        native_field_num: field_as_u8(fields, "native_field_num"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_looks_up_field_description() {
        let mut registry = DeveloperRegistry::new();
        registry.register_developer_data_id(vec![1, 2, 3], 0, Some(42));
        registry.register_field_description(FieldDescription {
            developer_data_index: 0,
            field_definition_number: 5,
            fit_base_type_id: 2,
            field_name: "custom_power".to_string(),
            units: Some("watts".to_string()),
            native_mesg_num: None,
            native_field_num: None,
        });

        let found = registry.field_description(0, 5).unwrap();
        assert_eq!(found.field_name, "custom_power");
    }

    #[test]
    fn missing_registration_is_a_lookup_miss() {
        let registry = DeveloperRegistry::new();
        assert!(registry.field_description(0, 5).is_none());
    }
}
