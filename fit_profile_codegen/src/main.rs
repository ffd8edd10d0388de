//! Debug helper: dumps the generated profile source to stdout without
//! needing a full `fit_decoder` build. Handy when editing the CSV tables.

use std::fs;

use fit_profile_codegen::{generate_enum_type_as_string, generate_messages_source, read_messages, read_profile_types};

fn main() {
    let types_content = fs::read_to_string("../fit_definitions/profile_types.csv")
        .expect("could not read profile_types.csv");
    let messages_content = fs::read_to_string("../fit_definitions/profile_messages.csv")
        .expect("could not read profile_messages.csv");

    let types = read_profile_types(&types_content).expect("could not parse profile_types.csv");
    let messages = read_messages(&messages_content).expect("could not parse profile_messages.csv");

    for t in &types {
        print!("{}", generate_enum_type_as_string(t));
    }

    println!("{}", generate_messages_source(&messages, &types));
}
