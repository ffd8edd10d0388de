//! Reads the hand-maintained FIT profile CSV tables and turns them into Rust
//! source text. This stands in for the vendor's Profile.xlsx -> code step:
//! the real tables are out of scope for this crate, so `fit_definitions/`
//! carries a small, representative subset instead.

use std::collections::HashMap;

use convert_case::{Case, Casing};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed row in {table}: {detail}")]
    MalformedRow { table: &'static str, detail: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitTypeValue {
    pub value_name: String,
    pub value: u32,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitType {
    pub type_name: String,
    pub base_type: String,
    pub values: Vec<FitTypeValue>,
}

impl FitType {
    fn value_number(&self, value_name: &str) -> Option<u32> {
        self.values
            .iter()
            .find(|v| v.value_name == value_name)
            .map(|v| v.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitMessageArrayType {
    NotArray,
    FixedSizeArray(usize),
    VariableSizeArray,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitRefField {
    pub field_name: String,
    pub value_number: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitMessageField {
    pub definition_number: u8,
    pub name: String,
    pub field_type: String,
    pub array: FitMessageArrayType,
    pub components: Vec<String>,
    pub scale: Option<f32>,
    pub offset: Option<i16>,
    pub units: Option<String>,
    pub comment: Option<String>,
    pub subfields: Vec<FitSubField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitSubField {
    pub name: String,
    pub field_type: String,
    pub array: FitMessageArrayType,
    pub refs: Vec<FitRefField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitMessage {
    pub name: String,
    pub group: Option<String>,
    pub comment: Option<String>,
    pub fields: Vec<FitMessageField>,
}

const MESSAGE_NAME_IDX: usize = 0;
const FIELD_DEF_NUMBER_IDX: usize = 1;
const FIELD_NAME_IDX: usize = 2;
const FIELD_TYPE_IDX: usize = 3;
const ARRAY_IDX: usize = 4;
const COMPONENTS_IDX: usize = 5;
const SCALE_IDX: usize = 6;
const OFFSET_IDX: usize = 7;
const UNITS_IDX: usize = 8;
#[allow(dead_code)]
const BITS_IDX: usize = 9;
#[allow(dead_code)]
const ACCUMULATE_IDX: usize = 10;
const REF_FIELD_NAME_IDX: usize = 11;
const REF_FIELD_VALUE_IDX: usize = 12;
const COMMENT_IDX: usize = 13;
#[allow(dead_code)]
const PRODUCTS_IDX: usize = 14;
const GROUP_IDX: usize = 15;
const EXPECTED_COLUMNS: usize = 16;

/// Reads the message/field table. Rows whose message-name column is filled
/// start a new message; rows whose field-def-number column is empty and
/// field-name column is filled are subfields of the field most recently
/// pushed onto the current message.
pub fn read_messages(content: &str) -> Result<Vec<FitMessage>, CodegenError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut fit_messages: Vec<FitMessage> = Vec::new();
    let mut curr_message: Option<FitMessage> = None;

    for result in rdr.records() {
        let rec = result?;
        let rec: Vec<&str> = rec.iter().collect();
        if rec.len() < EXPECTED_COLUMNS {
            continue;
        }

        if !rec[MESSAGE_NAME_IDX].is_empty() {
            if let Some(msg) = curr_message.take() {
                fit_messages.push(msg);
            }
            curr_message = Some(FitMessage {
                name: rec[MESSAGE_NAME_IDX].to_string(),
                group: non_empty(rec[GROUP_IDX]),
                comment: non_empty(rec[COMMENT_IDX]),
                fields: Vec::new(),
            });
            continue;
        }

        let message = curr_message.as_mut().ok_or_else(|| CodegenError::MalformedRow {
            table: "profile_messages.csv",
            detail: "field row before any message row".to_string(),
        })?;

        let array = parse_fit_message_array(rec[ARRAY_IDX]);
        let components = parse_comma_delimited(rec[COMPONENTS_IDX]);
        let field_name = rec[FIELD_NAME_IDX].to_string();
        let field_type = rec[FIELD_TYPE_IDX].to_string();

        if rec[FIELD_DEF_NUMBER_IDX].is_empty() {
            // subfield of the previously declared field
            let refs = parse_refs(rec[REF_FIELD_NAME_IDX], rec[REF_FIELD_VALUE_IDX])?;
            let parent = message.fields.last_mut().ok_or_else(|| CodegenError::MalformedRow {
                table: "profile_messages.csv",
                detail: format!("subfield {field_name} with no preceding primary field"),
            })?;
            parent.subfields.push(FitSubField {
                name: field_name,
                field_type,
                array,
                refs,
            });
            continue;
        }

        let definition_number: u8 = rec[FIELD_DEF_NUMBER_IDX]
            .parse()
            .map_err(|_| CodegenError::MalformedRow {
                table: "profile_messages.csv",
                detail: format!("bad field definition number {:?}", rec[FIELD_DEF_NUMBER_IDX]),
            })?;

        let scale = non_empty(rec[SCALE_IDX]).map(|s| {
            s.parse::<f32>()
                .unwrap_or_else(|_| panic!("could not parse scale {s}"))
        });
        let offset = non_empty(rec[OFFSET_IDX]).map(|s| {
            s.parse::<i16>()
                .unwrap_or_else(|_| panic!("could not parse offset {s}"))
        });

        message.fields.push(FitMessageField {
            definition_number,
            name: field_name,
            field_type,
            array,
            components,
            scale,
            offset,
            units: non_empty(rec[UNITS_IDX]),
            comment: non_empty(rec[COMMENT_IDX]),
            subfields: Vec::new(),
        });
    }

    if let Some(msg) = curr_message.take() {
        fit_messages.push(msg);
    }

    Ok(fit_messages)
}

fn parse_refs(names: &str, values: &str) -> Result<Vec<FitRefField>, CodegenError> {
    let names = parse_comma_delimited(names);
    let values = parse_comma_delimited(values);

    if names.len() != values.len() {
        return Err(CodegenError::MalformedRow {
            table: "profile_messages.csv",
            detail: format!(
                "ref field name/value count mismatch: {:?} vs {:?}",
                names, values
            ),
        });
    }

    names
        .into_iter()
        .zip(values)
        .map(|(field_name, value)| {
            value
                .parse::<u32>()
                .map(|value_number| FitRefField {
                    field_name,
                    value_number,
                })
                .map_err(|_| CodegenError::MalformedRow {
                    table: "profile_messages.csv",
                    detail: format!("ref field value is not numeric: {value:?}"),
                })
        })
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn parse_comma_delimited(input: &str) -> Vec<String> {
    if input.is_empty() {
        Vec::new()
    } else {
        input.split(',').map(|s| s.trim().to_string()).collect()
    }
}

fn parse_fit_message_array(array_def: &str) -> FitMessageArrayType {
    match array_def.trim() {
        s if s.is_empty() => FitMessageArrayType::NotArray,
        s if s.eq_ignore_ascii_case("[N]") => FitMessageArrayType::VariableSizeArray,
        s if s.starts_with('[') && s.ends_with(']') => {
            let trimmed = &s[1..s.len() - 1];
            FitMessageArrayType::FixedSizeArray(
                trimmed
                    .parse::<usize>()
                    .unwrap_or_else(|_| panic!("could not parse array size from {s}")),
            )
        }
        weird => panic!("unrecognised fit message array value: {weird}"),
    }
}

const TYPE_NAME_IDX: usize = 0;
const BASE_TYPE_IDX: usize = 1;
const VALUE_NAME_IDX: usize = 2;
const VALUE_IDX: usize = 3;
const TYPE_COMMENT_IDX: usize = 4;

pub fn read_profile_types(content: &str) -> Result<Vec<FitType>, CodegenError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut fit_types: Vec<FitType> = Vec::new();
    let mut curr_type: Option<FitType> = None;

    for result in rdr.records() {
        let rec = result?;
        if rec.len() <= TYPE_COMMENT_IDX {
            continue;
        }

        if !rec[TYPE_NAME_IDX].is_empty() {
            if let Some(t) = curr_type.take() {
                fit_types.push(t);
            }
            curr_type = Some(FitType {
                type_name: rec[TYPE_NAME_IDX].to_string(),
                base_type: rec[BASE_TYPE_IDX].to_string(),
                values: Vec::new(),
            });
            continue;
        }

        let t = curr_type.as_mut().ok_or_else(|| CodegenError::MalformedRow {
            table: "profile_types.csv",
            detail: "value row before any type row".to_string(),
        })?;

        let value_str = rec[VALUE_IDX].trim();
        let value = if value_str.to_lowercase().starts_with("0x") {
            u32::from_str_radix(value_str.trim_start_matches("0x").trim_start_matches("0X"), 16)
                .map_err(|_| CodegenError::MalformedRow {
                    table: "profile_types.csv",
                    detail: format!("bad hex value {value_str:?}"),
                })?
        } else {
            value_str.parse::<u32>().map_err(|_| CodegenError::MalformedRow {
                table: "profile_types.csv",
                detail: format!("bad value {value_str:?}"),
            })?
        };

        t.values.push(FitTypeValue {
            value_name: rec[VALUE_NAME_IDX].to_string(),
            value,
            comment: rec[TYPE_COMMENT_IDX].to_string(),
        });
    }

    if let Some(t) = curr_type.take() {
        fit_types.push(t);
    }

    Ok(fit_types)
}

/// Renders a plain Rust `enum` for a descriptive FIT type (e.g. `file`,
/// `manufacturer`). These are metadata only: the decoder never resolves an
/// enum-typed field's raw integer against them, it just records the type
/// name on the field profile, exactly as the field stays a raw scalar in a
/// DataMessage.
pub fn generate_enum_type_as_string(t: &FitType) -> String {
    if t.base_type != "enum" {
        return String::new();
    }

    let mut s = String::new();
    s.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n");
    s.push_str(&format!("pub enum {} {{\n", t.type_name.to_case(Case::UpperCamel)));
    for val in &t.values {
        s.push_str(&format!(
            "    {} = {},\n",
            val.value_name.to_case(Case::UpperCamel),
            val.value
        ));
    }
    s.push_str("}\n\n");
    s
}

/// Renders `pub fn build_messages() -> HashMap<u16, MessageProfile>`, the
/// decoder's compiled profile-lookup table. `MessageProfile`, `FieldProfile`
/// and `SubField` are expected to already be in scope where this text is
/// `include!`d (see `fit_decoder::profile`).
pub fn generate_messages_source(messages: &[FitMessage], types: &[FitType]) -> String {
    let mesg_num = types
        .iter()
        .find(|t| t.type_name == "mesg_num")
        .expect("profile_types.csv must define a mesg_num type");

    let mut by_number: HashMap<u32, &FitMessage> = HashMap::new();
    for message in messages {
        let number = mesg_num.value_number(&message.name).unwrap_or_else(|| {
            panic!(
                "message {:?} has no matching mesg_num entry in profile_types.csv",
                message.name
            )
        });
        by_number.insert(number, message);
    }

    let mut numbers: Vec<&u32> = by_number.keys().collect();
    numbers.sort();

    let mut s = String::new();
    s.push_str("pub fn build_messages() -> ::std::collections::HashMap<u16, MessageProfile> {\n");
    s.push_str("    let mut out = ::std::collections::HashMap::new();\n");

    for number in numbers {
        let message = by_number[number];
        s.push_str(&format!("    out.insert({number}u16, MessageProfile {{\n"));
        s.push_str(&format!("        name: {:?},\n", message.name));
        s.push_str(&format!("        group: {},\n", opt_str(&message.group)));
        s.push_str("        fields: [\n");
        for field in &message.fields {
            s.push_str("            (");
            s.push_str(&format!("{}u8, ", field.definition_number));
            s.push_str(&render_field_profile(field));
            s.push_str("),\n");
        }
        s.push_str("        ].into_iter().collect(),\n");
        s.push_str("    });\n");
    }

    s.push_str("    out\n");
    s.push_str("}\n");
    s
}

fn render_field_profile(field: &FitMessageField) -> String {
    let mut s = String::new();
    s.push_str("FieldProfile {\n");
    s.push_str(&format!("                field_name: {:?},\n", field.name));
    s.push_str(&format!("                field_type: {:?},\n", field.field_type));
    s.push_str(&format!("                scale: {},\n", opt_f32(field.scale)));
    s.push_str(&format!("                offset: {},\n", opt_i16(field.offset)));
    s.push_str(&format!("                units: {},\n", opt_str(&field.units)));
    s.push_str("                subfields: vec![\n");
    for sub in &field.subfields {
        s.push_str("                    SubField {\n");
        s.push_str(&format!("                        field_name: {:?},\n", sub.name));
        s.push_str(&format!("                        field_type: {:?},\n", sub.field_type));
        s.push_str("                        refs: vec![\n");
        for r in &sub.refs {
            s.push_str(&format!(
                "                            FieldRef {{ field_name: {:?}, value_number: {} }},\n",
                r.field_name, r.value_number
            ));
        }
        s.push_str("                        ],\n");
        s.push_str("                    },\n");
    }
    s.push_str("                ],\n");
    s.push_str(&format!(
        "                has_components: {},\n",
        !field.components.is_empty()
    ));
    s.push_str("            }");
    s
}

fn opt_f32(v: Option<f32>) -> String {
    match v {
        Some(v) => format!("Some({v}f32)"),
        None => "None".to_string(),
    }
}

fn opt_i16(v: Option<i16>) -> String {
    match v {
        Some(v) => format!("Some({v}i16)"),
        None => "None".to_string(),
    }
}

fn opt_str(v: &Option<String>) -> String {
    match v {
        Some(v) => format!("Some({v:?})"),
        None => "None".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES_CSV: &str = "Type Name,Base Type,Value Name,Value,Comment\nmesg_num,uint16,,,\n,,file_id,0,\nfile,enum,,,\n,,activity,4,\n";

    const MESSAGES_CSV: &str = "Message Name,Field Def Number,Field Name,Field Type,Array,Components,Scale,Offset,Units,Bits,Accumulate,Ref Field Name,Ref Field Value,Comment,Products,Group\nfile_id,,,,,,,,,,,,,,,file\n,0,type,file,,,,,,,,,,,,\n,1,manufacturer,manufacturer,,,,,,,,,,,,\n,2,product,uint16,,,,,,,,,,,,\n,,garmin_product,uint16,,,,,,,,manufacturer,15,,,\n";

    #[test]
    fn parses_profile_types() {
        let types = read_profile_types(TYPES_CSV).unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].type_name, "mesg_num");
        assert_eq!(types[0].values[0].value_name, "file_id");
        assert_eq!(types[0].values[0].value, 0);
    }

    #[test]
    fn parses_messages_with_subfields() {
        let messages = read_messages(MESSAGES_CSV).unwrap();
        assert_eq!(messages.len(), 1);
        let file_id = &messages[0];
        assert_eq!(file_id.name, "file_id");
        assert_eq!(file_id.group.as_deref(), Some("file"));
        assert_eq!(file_id.fields.len(), 3);
        let product = &file_id.fields[2];
        assert_eq!(product.name, "product");
        assert_eq!(product.subfields.len(), 1);
        assert_eq!(product.subfields[0].name, "garmin_product");
        assert_eq!(product.subfields[0].refs[0].field_name, "manufacturer");
        assert_eq!(product.subfields[0].refs[0].value_number, 15);
    }

    #[test]
    fn generates_message_source_with_resolved_global_number() {
        let types = read_profile_types(TYPES_CSV).unwrap();
        let messages = read_messages(MESSAGES_CSV).unwrap();
        let src = generate_messages_source(&messages, &types);
        assert!(src.contains("out.insert(0u16"));
        assert!(src.contains("\"file_id\""));
        assert!(src.contains("group: Some(\"file\")"));
        assert!(src.contains("garmin_product"));
    }
}
