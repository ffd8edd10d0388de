//! Decodes Garmin FIT binary files: header, definition/data records,
//! developer fields, and scaled field values. Profile-generation from the
//! vendor's Profile spreadsheet and the components sub-protocol are out of
//! scope; see `README`/design notes for what's covered.

pub mod base_type;
pub mod crc;
pub mod data_message;
pub mod decode;
pub mod definition;
pub mod developer;
pub mod error;
pub mod field;
pub mod profile;
pub mod record_header;
pub mod stream;
pub mod timestamp;

pub use data_message::DataMessage;
pub use decode::{decode, decode_file_type, DecodeOptions, DecodedFile, FileHeader};
pub use definition::DefinitionMessage;
pub use developer::DeveloperDataEntry;
pub use error::DecodeError;
