use thiserror::Error;

/// A decode failure, always anchored to the byte offset at which it was
/// detected, mirroring `DecodeException`'s `f"{detail} at position {position}"`
/// from the implementation this crate replaces.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{reason} at offset {offset}")]
    InvalidHeader { offset: u64, reason: &'static str },

    #[error("header crc mismatch: expected {expected:#06x}, got {actual:#06x} at offset {offset}")]
    HeaderCrcMismatch {
        offset: u64,
        expected: u16,
        actual: u16,
    },

    #[error("{reason} at offset {offset}")]
    InvalidRecordHeader { offset: u64, reason: &'static str },

    #[error("{reason} at offset {offset}")]
    InvalidDefinition { offset: u64, reason: String },

    #[error("missing definition for local message type {local_message_type} at offset {offset}")]
    MissingDefinition { offset: u64, local_message_type: u8 },

    #[error("unknown base type {base_type:#04x} at offset {offset}")]
    UnknownBaseType { offset: u64, base_type: u8 },

    #[error("missing field description for developer field {developer_data_index}/{field_definition_number} at offset {offset}")]
    MissingFieldDescription {
        offset: u64,
        developer_data_index: u8,
        field_definition_number: u8,
    },

    #[error("missing developer data id {developer_data_index} at offset {offset}")]
    MissingDeveloperDataId { offset: u64, developer_data_index: u8 },

    #[error("unexpected end of data at offset {offset}: needed {needed} more bytes")]
    UnexpectedEof { offset: u64, needed: usize },

    #[error("file crc mismatch: expected {expected:#06x}, got {actual:#06x} at offset {offset}")]
    FileCrcMismatch {
        offset: u64,
        expected: u16,
        actual: u16,
    },

    #[error("io error at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}
