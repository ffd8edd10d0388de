//! Data record decoding: per-field raw reads, scale/offset application,
//! subfield aliasing and developer-field resolution. Grounded in
//! `fittie/fitfile/data_message.py::decode_data_message`,
//! `add_subfields_to_fields` and `apply_scale_and_offset`.

use std::collections::HashMap;
use std::io::Read;

use crate::base_type::base_type_info;
use crate::definition::DefinitionMessage;
use crate::developer::DeveloperRegistry;
use crate::error::DecodeError;
use crate::field::{read_raw_field, DecodedField, Value};
use crate::profile::{self, MessageProfile};
use crate::stream::ByteStream;

#[derive(Debug, Clone, PartialEq)]
pub struct DataMessage {
    pub global_message_number: u16,
    pub name: Option<&'static str>,
    pub fields: HashMap<String, DecodedField>,
}

/// Either a single scale factor applied to every array element, or one scale
/// per element (the shape a components-aware decoder would need). Only the
/// scalar variant is ever produced by this crate's profile tables today, but
/// the list variant and its length-mismatch fallback are kept so the
/// function matches the original's documented behavior exactly.
#[derive(Debug, Clone)]
pub enum ScaleSpec {
    Scalar(f32),
    List(Vec<f32>),
}

pub fn apply_scale_and_offset(value: DecodedField, scale: Option<&ScaleSpec>, offset: Option<i16>) -> DecodedField {
    if scale.is_none() && offset.is_none() {
        return value;
    }
    // Default scale = 1, default offset = 0: an offset with no accompanying
    // scale still applies against an implicit unit scale.
    let default_scale = ScaleSpec::Scalar(1.0);
    let scale = scale.unwrap_or(&default_scale);
    let offset = offset.unwrap_or(0) as f64;

    match value {
        DecodedField::Scalar(None) => DecodedField::Scalar(None),
        DecodedField::Scalar(Some(v)) => {
            let factor = match scale {
                ScaleSpec::Scalar(s) => Some(*s),
                ScaleSpec::List(list) => list.first().copied(),
            };
            DecodedField::Scalar(scale_one(Some(v), factor, offset))
        }
        DecodedField::Array(values) => match scale {
            ScaleSpec::Scalar(s) => DecodedField::Array(
                values.into_iter().map(|v| scale_one(v, Some(*s), offset)).collect(),
            ),
            ScaleSpec::List(list) => {
                if list.len() != values.len() {
                    // Permissive fallback: a components-level scale list
                    // whose length doesn't match the value list is left
                    // unscaled rather than treated as an error.
                    DecodedField::Array(values)
                } else {
                    DecodedField::Array(
                        values
                            .into_iter()
                            .zip(list.iter())
                            .map(|(v, s)| scale_one(v, Some(*s), offset))
                            .collect(),
                    )
                }
            }
        },
    }
}

fn scale_one(value: Option<Value>, factor: Option<f32>, offset: f64) -> Option<Value> {
    let value = value?;
    let factor = match factor {
        Some(f) if f != 0.0 => f,
        _ => return Some(value),
    };
    match numeric(&value) {
        Some(n) => Some(Value::Float(n / factor as f64 - offset)),
        None => Some(value),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Signed(n) => Some(*n as f64),
        Value::Unsigned(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        Value::Text(_) => None,
    }
}

fn decoded_field_numeric(field: &DecodedField) -> Option<f64> {
    match field {
        DecodedField::Scalar(Some(v)) => numeric(v),
        _ => None,
    }
}

/// Aliases an already-decoded primary field's value under an alternate
/// subfield name as soon as any single trigger reference in the message
/// matches its expected value. Runs after every primary field has been
/// decoded and scaled, matching the original's single post-pass.
fn apply_subfields(fields: &mut HashMap<String, DecodedField>, message_profile: &MessageProfile) {
    let mut additions: Vec<(String, DecodedField)> = Vec::new();

    for field_profile in message_profile.fields.values() {
        if field_profile.subfields.is_empty() {
            continue;
        }
        let Some(primary_value) = fields.get(field_profile.field_name) else {
            continue;
        };

        for sub in &field_profile.subfields {
            let matched = sub.refs.iter().any(|r| {
                fields
                    .get(r.field_name)
                    .and_then(decoded_field_numeric)
                    .map(|n| n == r.value_number as f64)
                    .unwrap_or(false)
            });
            if matched {
                additions.push((sub.field_name.to_string(), primary_value.clone()));
            }
        }
    }

    for (name, value) in additions {
        fields.insert(name, value);
    }
}

pub fn decode_data_message<R: Read>(
    stream: &mut ByteStream<R>,
    definition: &DefinitionMessage,
    developer_data: &DeveloperRegistry,
) -> Result<DataMessage, DecodeError> {
    let message_profile = profile::message_profile(definition.global_message_number);
    if message_profile.is_none() {
        tracing::warn!(
            global_message_number = definition.global_message_number,
            "no profile entry for global message number, fields will be named unknown_<N>"
        );
    }
    let mut fields: HashMap<String, DecodedField> = HashMap::new();

    for field_def in &definition.field_definitions {
        let raw = stream.read(field_def.field_size as usize)?;
        let decoded = read_raw_field(&raw, &field_def.base_type, definition.architecture);

        let field_profile = message_profile.and_then(|p| p.fields.get(&field_def.field_definition_number));
        let name = field_profile
            .map(|f| f.field_name.to_string())
            .unwrap_or_else(|| format!("unknown_{}", field_def.field_definition_number));
        let scale = field_profile.and_then(|f| f.scale).map(ScaleSpec::Scalar);
        let offset = field_profile.and_then(|f| f.offset);

        fields.insert(name, apply_scale_and_offset(decoded, scale.as_ref(), offset));
    }

    if let Some(p) = message_profile {
        apply_subfields(&mut fields, p);
    }

    for dev_field_def in &definition.developer_field_definitions {
        let offset = stream.tell();
        let raw = stream.read(dev_field_def.field_size as usize)?;
        let description = developer_data
            .field_description(dev_field_def.developer_data_index, dev_field_def.field_number)
            .ok_or(DecodeError::MissingFieldDescription {
                offset,
                developer_data_index: dev_field_def.developer_data_index,
                field_definition_number: dev_field_def.field_number,
            })?;
        let base_type = base_type_info(description.fit_base_type_id, offset)?;
        let decoded = read_raw_field(&raw, &base_type, definition.architecture);
        fields.insert(description.field_name.clone(), decoded);
    }

    tracing::debug!(
        global_message_number = definition.global_message_number,
        fields = fields.len(),
        "decoded data message"
    );

    Ok(DataMessage {
        global_message_number: definition.global_message_number,
        name: message_profile.map(|p| p.name),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_scale_and_offset_applied() {
        let value = DecodedField::Scalar(Some(Value::Unsigned(600)));
        let scaled = apply_scale_and_offset(value, Some(&ScaleSpec::Scalar(5.0)), Some(500));
        assert_eq!(scaled, DecodedField::Scalar(Some(Value::Float(600.0 / 5.0 - 500.0))));
    }

    #[test]
    fn offset_applies_with_no_scale_present() {
        let value = DecodedField::Scalar(Some(Value::Unsigned(600)));
        let scaled = apply_scale_and_offset(value, None, Some(500));
        assert_eq!(scaled, DecodedField::Scalar(Some(Value::Float(600.0 - 500.0))));
    }

    #[test]
    fn no_scale_and_no_offset_leaves_value_untouched() {
        let value = DecodedField::Scalar(Some(Value::Unsigned(600)));
        let scaled = apply_scale_and_offset(value.clone(), None, None);
        assert_eq!(scaled, value);
    }

    #[test]
    fn none_value_stays_none_through_scaling() {
        let value = DecodedField::Scalar(None);
        let scaled = apply_scale_and_offset(value, Some(&ScaleSpec::Scalar(5.0)), Some(500));
        assert_eq!(scaled, DecodedField::Scalar(None));
    }

    #[test]
    fn array_scale_length_mismatch_falls_back_unscaled() {
        let value = DecodedField::Array(vec![Some(Value::Unsigned(10)), Some(Value::Unsigned(20))]);
        let scaled = apply_scale_and_offset(value.clone(), Some(&ScaleSpec::List(vec![2.0])), None);
        assert_eq!(scaled, value);
    }

    #[test]
    fn array_scalar_scale_broadcasts_over_elements() {
        let value = DecodedField::Array(vec![Some(Value::Unsigned(10)), Some(Value::Unsigned(20))]);
        let scaled = apply_scale_and_offset(value, Some(&ScaleSpec::Scalar(2.0)), None);
        assert_eq!(
            scaled,
            DecodedField::Array(vec![Some(Value::Float(5.0)), Some(Value::Float(10.0))])
        );
    }

    #[test]
    fn subfield_aliased_when_trigger_field_matches() {
        use crate::profile::{FieldProfile, FieldRef, SubField};

        let mut message_profile = MessageProfile {
            name: "file_id",
            group: Some("file"),
            fields: HashMap::new(),
        };
        message_profile.fields.insert(
            1,
            FieldProfile {
                field_name: "manufacturer",
                field_type: "manufacturer",
                scale: None,
                offset: None,
                units: None,
                subfields: Vec::new(),
                has_components: false,
            },
        );
        message_profile.fields.insert(
            2,
            FieldProfile {
                field_name: "product",
                field_type: "uint16",
                scale: None,
                offset: None,
                units: None,
                subfields: vec![SubField {
                    field_name: "garmin_product",
                    field_type: "uint16",
                    refs: vec![FieldRef {
                        field_name: "manufacturer",
                        value_number: 15,
                    }],
                }],
                has_components: false,
            },
        );

        let mut fields = HashMap::new();
        fields.insert("manufacturer".to_string(), DecodedField::Scalar(Some(Value::Unsigned(15))));
        fields.insert("product".to_string(), DecodedField::Scalar(Some(Value::Unsigned(2067))));

        apply_subfields(&mut fields, &message_profile);

        assert_eq!(fields.get("garmin_product"), Some(&DecodedField::Scalar(Some(Value::Unsigned(2067)))));
    }

    #[test]
    fn subfield_aliased_when_any_single_ref_matches() {
        use crate::profile::{FieldProfile, FieldRef, SubField};

        let mut message_profile = MessageProfile {
            name: "event",
            group: Some("event"),
            fields: HashMap::new(),
        };
        message_profile.fields.insert(
            0,
            FieldProfile {
                field_name: "event",
                field_type: "event",
                scale: None,
                offset: None,
                units: None,
                subfields: Vec::new(),
                has_components: false,
            },
        );
        message_profile.fields.insert(
            3,
            FieldProfile {
                field_name: "data",
                field_type: "uint32",
                scale: None,
                offset: None,
                units: None,
                subfields: vec![SubField {
                    field_name: "gear_change_data",
                    field_type: "uint32",
                    refs: vec![
                        FieldRef {
                            field_name: "event",
                            value_number: 42,
                        },
                        FieldRef {
                            field_name: "event",
                            value_number: 99,
                        },
                    ],
                }],
                has_components: false,
            },
        );

        let mut fields = HashMap::new();
        // Matches the second ref (99) but not the first (42); the subfield
        // must still be aliased since any single ref is enough.
        fields.insert("event".to_string(), DecodedField::Scalar(Some(Value::Unsigned(99))));
        fields.insert("data".to_string(), DecodedField::Scalar(Some(Value::Unsigned(7))));

        apply_subfields(&mut fields, &message_profile);

        assert_eq!(fields.get("gear_change_data"), Some(&DecodedField::Scalar(Some(Value::Unsigned(7)))));
    }
}
