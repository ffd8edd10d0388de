//! Definition record decoding. Grounded in the teacher's
//! `fit_records.rs::parse_definition_record`, converted from its `panic!`
//! on a bad size modulus to a returned error, and from
//! `fittie/fitfile/definition_message.py::decode_definition_message` /
//! `field_definitions.py::decode_field_definition`.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::base_type::{base_type_info, BaseTypeInfo, Endianness};
use crate::error::DecodeError;
use crate::record_header::NormalDefinitionHeader;
use crate::stream::ByteStream;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub field_definition_number: u8,
    pub field_size: u8,
    pub base_type: BaseTypeInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeveloperFieldDefinition {
    pub field_number: u8,
    pub field_size: u8,
    pub developer_data_index: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionMessage {
    pub header: NormalDefinitionHeader,
    pub architecture: Endianness,
    pub global_message_number: u16,
    pub field_definitions: Vec<FieldDefinition>,
    pub developer_field_definitions: Vec<DeveloperFieldDefinition>,
}

impl DefinitionMessage {
    pub fn data_record_size(&self) -> usize {
        let fields: usize = self
            .field_definitions
            .iter()
            .map(|f| f.field_size as usize)
            .sum();
        let dev: usize = self
            .developer_field_definitions
            .iter()
            .map(|f| f.field_size as usize)
            .sum();
        fields + dev
    }
}

pub fn parse_definition_message<R: Read>(
    stream: &mut ByteStream<R>,
    header: NormalDefinitionHeader,
) -> Result<DefinitionMessage, DecodeError> {
    let reserved_offset = stream.tell();
    let reserved = stream.read(1)?[0];
    if reserved != 0 {
        return Err(DecodeError::InvalidDefinition {
            offset: reserved_offset,
            reason: "reserved byte is non-zero".to_string(),
        });
    }

    let arch_byte = stream.read(1)?[0];
    let architecture = if arch_byte > 0 {
        Endianness::Big
    } else {
        Endianness::Little
    };

    let global_bytes = stream.read(2)?;
    let global_message_number = match architecture {
        Endianness::Little => LittleEndian::read_u16(&global_bytes),
        Endianness::Big => BigEndian::read_u16(&global_bytes),
    };

    let number_of_fields = stream.read(1)?[0];
    let mut field_definitions = Vec::with_capacity(number_of_fields as usize);
    for _ in 0..number_of_fields {
        let field_offset = stream.tell();
        let triple = stream.read(3)?;
        let field_definition_number = triple[0];
        let size = triple[1];
        let base_type = base_type_info(triple[2], field_offset)?;
        if field_definition_number == 255 {
            return Err(DecodeError::InvalidDefinition {
                offset: field_offset,
                reason: "field definition number 255 is reserved and invalid".to_string(),
            });
        }
        if base_type.size != 0 && size % base_type.size != 0 {
            return Err(DecodeError::InvalidDefinition {
                offset: field_offset,
                reason: format!(
                    "field size {} is not a multiple of base type {} size {}",
                    size, base_type.type_name, base_type.size
                ),
            });
        }
        field_definitions.push(FieldDefinition {
            field_definition_number,
            field_size: size,
            base_type,
        });
    }

    let mut developer_field_definitions = Vec::new();
    if header.contains_developer_fields {
        let number_of_developer_fields = stream.read(1)?[0];
        for _ in 0..number_of_developer_fields {
            let triple = stream.read(3)?;
            developer_field_definitions.push(DeveloperFieldDefinition {
                field_number: triple[0],
                field_size: triple[1],
                developer_data_index: triple[2],
            });
        }
    }

    tracing::debug!(
        global_message_number,
        fields = field_definitions.len(),
        developer_fields = developer_field_definitions.len(),
        "decoded definition message"
    );

    Ok(DefinitionMessage {
        header,
        architecture,
        global_message_number,
        field_definitions,
        developer_field_definitions,
    })
}
