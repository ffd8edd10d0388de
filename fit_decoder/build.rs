use std::env;
use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::Write;

use fit_profile_codegen::{generate_enum_type_as_string, generate_messages_source, read_messages, read_profile_types};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=../fit_definitions/profile_messages.csv");
    println!("cargo:rerun-if-changed=../fit_definitions/profile_types.csv");

    let out_dir = env::var("OUT_DIR").unwrap();

    let types_content = fs::read_to_string("../fit_definitions/profile_types.csv")?;
    let messages_content = fs::read_to_string("../fit_definitions/profile_messages.csv")?;

    let types = read_profile_types(&types_content)?;
    let messages = read_messages(&messages_content)?;

    let mut codegen_str = String::new();
    for t in &types {
        codegen_str.push_str(&generate_enum_type_as_string(t));
    }
    codegen_str.push_str(&generate_messages_source(&messages, &types));

    let dest = format!("{}/profile_data.rs", out_dir);
    let mut f = File::create(&dest)?;
    f.write_all(codegen_str.as_bytes())?;
    f.sync_all()?;
    Ok(())
}
