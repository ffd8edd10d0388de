//! Raw field-value decoding: turns a byte slice plus a base type into typed,
//! invalid-sentinel-aware values. Grounded in
//! `fittie/fitfile/field_definitions.py::_retrieve_value`.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::base_type::{BaseType, BaseTypeInfo, Endianness};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedField {
    Scalar(Option<Value>),
    Array(Vec<Option<Value>>),
}

/// Reads every element packed into `data` according to `info`'s width.
/// A single-element read collapses to `Scalar`; more than one collapses to
/// `Array`, each slot independently `None` when it equals the base type's
/// invalid-value sentinel.
pub fn read_raw_field(data: &[u8], info: &BaseTypeInfo, architecture: Endianness) -> DecodedField {
    if matches!(info.base_type, BaseType::String) {
        let text_bytes = data.split(|&b| b == 0).next().unwrap_or(&[]);
        if text_bytes.is_empty() {
            return DecodedField::Scalar(None);
        }
        return DecodedField::Scalar(Some(Value::Text(
            String::from_utf8_lossy(text_bytes).into_owned(),
        )));
    }

    let size = info.size as usize;
    if size == 0 || data.len() < size {
        return DecodedField::Scalar(None);
    }

    let count = data.len() / size;
    if count <= 1 {
        return DecodedField::Scalar(read_one(&data[..size], info, architecture));
    }

    let values = data
        .chunks(size)
        .take(count)
        .map(|chunk| read_one(chunk, info, architecture))
        .collect();
    DecodedField::Array(values)
}

fn read_one(chunk: &[u8], info: &BaseTypeInfo, architecture: Endianness) -> Option<Value> {
    match info.base_type {
        BaseType::Enum | BaseType::Uint8 | BaseType::Uint8z | BaseType::Byte => {
            let v = chunk[0] as u64;
            not_invalid(v, info.invalid_value, Value::Unsigned(v))
        }
        BaseType::Sint8 => {
            let v = chunk[0] as i8 as i64;
            not_invalid(v as u64 & 0xFF, info.invalid_value, Value::Signed(v))
        }
        BaseType::Uint16 | BaseType::Uint16z => {
            let v = read_u16(chunk, architecture) as u64;
            not_invalid(v, info.invalid_value, Value::Unsigned(v))
        }
        BaseType::Sint16 => {
            let raw = read_u16(chunk, architecture);
            not_invalid(raw as u64, info.invalid_value, Value::Signed(raw as i16 as i64))
        }
        BaseType::Uint32 | BaseType::Uint32z => {
            let v = read_u32(chunk, architecture) as u64;
            not_invalid(v, info.invalid_value, Value::Unsigned(v))
        }
        BaseType::Sint32 => {
            let raw = read_u32(chunk, architecture);
            not_invalid(raw as u64, info.invalid_value, Value::Signed(raw as i32 as i64))
        }
        BaseType::Uint64 | BaseType::Uint64z => {
            let v = read_u64(chunk, architecture);
            not_invalid(v, info.invalid_value, Value::Unsigned(v))
        }
        BaseType::Sint64 => {
            let raw = read_u64(chunk, architecture);
            not_invalid(raw, info.invalid_value, Value::Signed(raw as i64))
        }
        BaseType::Float32 => {
            let bits = read_u32(chunk, architecture);
            not_invalid(bits as u64, info.invalid_value, Value::Float(f32::from_bits(bits) as f64))
        }
        BaseType::Float64 => {
            let bits = read_u64(chunk, architecture);
            not_invalid(bits, info.invalid_value, Value::Float(f64::from_bits(bits)))
        }
        BaseType::String => unreachable!("string handled by caller"),
    }
}

fn not_invalid(raw: u64, invalid: u64, value: Value) -> Option<Value> {
    if raw == invalid {
        None
    } else {
        Some(value)
    }
}

fn read_u16(chunk: &[u8], architecture: Endianness) -> u16 {
    match architecture {
        Endianness::Little => LittleEndian::read_u16(chunk),
        Endianness::Big => BigEndian::read_u16(chunk),
    }
}

fn read_u32(chunk: &[u8], architecture: Endianness) -> u32 {
    match architecture {
        Endianness::Little => LittleEndian::read_u32(chunk),
        Endianness::Big => BigEndian::read_u32(chunk),
    }
}

fn read_u64(chunk: &[u8], architecture: Endianness) -> u64 {
    match architecture {
        Endianness::Little => LittleEndian::read_u64(chunk),
        Endianness::Big => BigEndian::read_u64(chunk),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_type::base_type_info;

    #[test]
    fn decodes_scalar_uint16() {
        let info = base_type_info(BaseType::Uint16.into(), 0).unwrap();
        let decoded = read_raw_field(&[0x64, 0x00], &info, Endianness::Little);
        assert_eq!(decoded, DecodedField::Scalar(Some(Value::Unsigned(100))));
    }

    #[test]
    fn invalid_sentinel_becomes_none() {
        let info = base_type_info(BaseType::Uint16.into(), 0).unwrap();
        let decoded = read_raw_field(&[0xFF, 0xFF], &info, Endianness::Little);
        assert_eq!(decoded, DecodedField::Scalar(None));
    }

    #[test]
    fn decodes_array_of_uint8() {
        let info = base_type_info(BaseType::Uint8.into(), 0).unwrap();
        let decoded = read_raw_field(&[1, 2, 0xFF, 4], &info, Endianness::Little);
        assert_eq!(
            decoded,
            DecodedField::Array(vec![
                Some(Value::Unsigned(1)),
                Some(Value::Unsigned(2)),
                None,
                Some(Value::Unsigned(4)),
            ])
        );
    }

    #[test]
    fn decodes_null_terminated_string() {
        let info = base_type_info(BaseType::String.into(), 0).unwrap();
        let decoded = read_raw_field(b"abc\0\0\0", &info, Endianness::Little);
        assert_eq!(decoded, DecodedField::Scalar(Some(Value::Text("abc".to_string()))));
    }

    #[test]
    fn empty_string_is_none() {
        let info = base_type_info(BaseType::String.into(), 0).unwrap();
        let decoded = read_raw_field(b"\0\0", &info, Endianness::Little);
        assert_eq!(decoded, DecodedField::Scalar(None));
    }
}
