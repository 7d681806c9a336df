//! `jitc shard`: print the shard directory for a module CRC.

use jitc_cache::shard_dir;
use jitc_common::Crc32;

use crate::settings::load_settings;
use crate::{GlobalArgs, ShardArgs};

/// Runs the `jitc shard` command. Prints the path whether or not it exists.
pub fn run(args: &ShardArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let crc = parse_crc(&args.crc)?;
    let settings = load_settings(global)?;
    println!("{}", shard_dir(&settings.root, crc).display());
    Ok(0)
}

/// Parses a CRC written as hexadecimal, with or without a `0x` prefix.
fn parse_crc(s: &str) -> Result<Crc32, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > 8 {
        return Err(format!("invalid CRC '{s}': expected up to 8 hex digits"));
    }
    u32::from_str_radix(digits, 16)
        .map(Crc32::from_raw)
        .map_err(|e| format!("invalid CRC '{s}': {e}"))
}
