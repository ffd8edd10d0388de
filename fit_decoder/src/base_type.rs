//! The 17 FIT base types: byte width, endian sensitivity and invalid-value
//! sentinel for each. Kept from the teacher's `num_enum`-backed `BaseType`
//! enum; sentinels cross-checked against
//! `fittie/fitfile/profile/base_types.py::BASE_TYPES`.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

#[derive(Debug, Eq, Clone, Copy, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BaseType {
    Enum = 0x00,
    Sint8 = 0x01,
    Uint8 = 0x02,
    Sint16 = 0x83,
    Uint16 = 0x84,
    Sint32 = 0x85,
    Uint32 = 0x86,
    String = 0x07,
    Float32 = 0x88,
    Float64 = 0x89,
    Uint8z = 0x0A,
    Uint16z = 0x8B,
    Uint32z = 0x8C,
    Byte = 0x0D,
    Sint64 = 0x8E,
    Uint64 = 0x8F,
    Uint64z = 0x90,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseTypeInfo {
    pub base_type: BaseType,
    pub endian_ability: bool,
    pub type_name: &'static str,
    pub size: u8,
    pub invalid_value: u64,
}

pub fn base_type_info(number: u8, offset: u64) -> Result<BaseTypeInfo, DecodeError> {
    let base_type =
        BaseType::try_from(number).map_err(|_| DecodeError::UnknownBaseType { offset, base_type: number })?;

    Ok(match base_type {
        BaseType::Enum => BaseTypeInfo {
            base_type,
            endian_ability: false,
            type_name: "enum",
            invalid_value: 0xFF,
            size: 1,
        },
        BaseType::Sint8 => BaseTypeInfo {
            base_type,
            endian_ability: false,
            type_name: "sint8",
            invalid_value: 0x7F,
            size: 1,
        },
        BaseType::Uint8 => BaseTypeInfo {
            base_type,
            endian_ability: false,
            type_name: "uint8",
            invalid_value: 0xFF,
            size: 1,
        },
        BaseType::Sint16 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "sint16",
            invalid_value: 0x7FFF,
            size: 2,
        },
        BaseType::Uint16 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "uint16",
            invalid_value: 0xFFFF,
            size: 2,
        },
        BaseType::Sint32 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "sint32",
            invalid_value: 0x7FFFFFFF,
            size: 4,
        },
        BaseType::Uint32 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "uint32",
            invalid_value: 0xFFFFFFFF,
            size: 4,
        },
        BaseType::String => BaseTypeInfo {
            base_type,
            endian_ability: false,
            type_name: "string",
            invalid_value: 0x00,
            size: 1,
        },
        BaseType::Float32 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "float32",
            invalid_value: 0xFFFFFFFF,
            size: 4,
        },
        BaseType::Float64 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "float64",
            invalid_value: 0xFFFFFFFFFFFFFFFF,
            size: 8,
        },
        BaseType::Uint8z => BaseTypeInfo {
            base_type,
            endian_ability: false,
            type_name: "uint8z",
            invalid_value: 0x00,
            size: 1,
        },
        BaseType::Uint16z => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "uint16z",
            invalid_value: 0x0000,
            size: 2,
        },
        BaseType::Uint32z => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "uint32z",
            invalid_value: 0x00000000,
            size: 4,
        },
        BaseType::Byte => BaseTypeInfo {
            base_type,
            endian_ability: false,
            type_name: "byte",
            invalid_value: 0xFF,
            size: 1,
        },
        BaseType::Sint64 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "sint64",
            invalid_value: 0x7FFFFFFFFFFFFFFF,
            size: 8,
        },
        BaseType::Uint64 => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "uint64",
            invalid_value: 0xFFFFFFFFFFFFFFFF,
            size: 8,
        },
        BaseType::Uint64z => BaseTypeInfo {
            base_type,
            endian_ability: true,
            type_name: "uint64z",
            invalid_value: 0x0000000000000000,
            size: 8,
        },
    })
}
