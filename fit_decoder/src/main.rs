use std::env;
use std::fs::File;

use fit_decoder::{decode, DecodeOptions};

fn main() {
    let input_path = env::args().nth(1).expect("usage: fit_decoder <path-to.fit>");
    let input_file = File::open(&input_path).unwrap();

    let files = decode(input_file, DecodeOptions::default()).unwrap();
    println!("decoded {} file(s) from {}", files.len(), input_path);
    for (i, file) in files.iter().enumerate() {
        let total_messages: usize = file.messages.values().map(Vec::len).sum();
        println!(
            "file {}: protocol {}, profile {}, {} messages across {} kinds",
            i,
            file.header.protocol_version,
            file.header.profile_version,
            total_messages,
            file.messages.len()
        );
        for (name, messages) in &file.messages {
            for message in messages {
                println!("  {} ({} fields)", name, message.fields.len());
            }
        }
    }
}
