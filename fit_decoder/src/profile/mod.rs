//! Compiled FIT profile tables. The actual data (`MESSAGES`) is generated at
//! build time by `fit_profile_codegen` from `fit_definitions/*.csv` — this
//! module only defines the shapes that generated code populates and the
//! lookup used by the rest of the decoder. Unknown global message numbers
//! are a normal lookup miss here, not an error: the caller falls back to a
//! synthetic `unknown_<N>` message/field naming scheme.

use std::collections::HashMap;

use lazy_static::lazy_static;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub field_name: &'static str,
    pub value_number: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubField {
    pub field_name: &'static str,
    pub field_type: &'static str,
    pub refs: Vec<FieldRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldProfile {
    pub field_name: &'static str,
    pub field_type: &'static str,
    pub scale: Option<f32>,
    pub offset: Option<i16>,
    pub units: Option<&'static str>,
    pub subfields: Vec<SubField>,
    pub has_components: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageProfile {
    pub name: &'static str,
    pub group: Option<&'static str>,
    pub fields: HashMap<u8, FieldProfile>,
}

include!(concat!(env!("OUT_DIR"), "/profile_data.rs"));

lazy_static! {
    pub static ref MESSAGES: HashMap<u16, MessageProfile> = build_messages();
}

/// A non-fatal lookup: an unrecognised global message number is expected for
/// any message type outside this crate's hand-authored profile subset.
pub fn message_profile(global_message_number: u16) -> Option<&'static MessageProfile> {
    MESSAGES.get(&global_message_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_message_profile_is_present() {
        let profile = message_profile(0).expect("file_id should be in the generated table");
        assert_eq!(profile.name, "file_id");
        assert_eq!(profile.group, Some("file"));
        let product = profile.fields.get(&2).expect("product field");
        assert_eq!(product.subfields.len(), 1);
        assert_eq!(product.subfields[0].field_name, "garmin_product");
    }

    #[test]
    fn unknown_message_number_is_a_lookup_miss() {
        assert!(message_profile(0xFFFF).is_none());
    }
}
