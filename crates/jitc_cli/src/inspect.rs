//! `jitc inspect`: decode a header file and check it against its object.

use std::path::Path;

use jitc_cache::{shard, CacheFileHeader, CACHE_MAGIC};
use jitc_common::{Crc32, PlatformKey};

use crate::settings::load_settings;
use crate::{GlobalArgs, InspectArgs, ReportFormat};

/// State of the object file next to a header.
#[derive(Debug, PartialEq, Eq)]
enum ObjectStatus {
    Ok,
    Missing,
    Corrupt { actual: Crc32, size: u64 },
}

impl ObjectStatus {
    fn check(header_path: &Path, header: &CacheFileHeader) -> Self {
        match std::fs::read(shard::object_path(header_path)) {
            Err(_) => ObjectStatus::Missing,
            Ok(object) => {
                let actual = Crc32::from_bytes(&object);
                let size = object.len() as u64;
                if actual == header.object_crc() && size == header.object_size {
                    ObjectStatus::Ok
                } else {
                    ObjectStatus::Corrupt { actual, size }
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            ObjectStatus::Ok => "ok".to_string(),
            ObjectStatus::Missing => "missing".to_string(),
            ObjectStatus::Corrupt { actual, size } => {
                format!("corrupt (crc {actual}, {size} bytes)")
            }
        }
    }
}

/// Runs the `jitc inspect` command.
///
/// Returns exit code 0 if the entry is usable by this build, 1 otherwise.
pub fn run(args: &InspectArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let raw = std::fs::read(&args.header)
        .map_err(|e| format!("cannot read {}: {e}", args.header.display()))?;
    let header = CacheFileHeader::decode(&raw)?;
    let platform = load_settings(global)?.platform_key;
    let object = ObjectStatus::check(&args.header, &header);

    let magic_ok = header.magic == CACHE_MAGIC;
    let platform_ok = header.platform_key() == platform;

    match args.format {
        ReportFormat::Text => print_text(&header, &object, magic_ok, platform, platform_ok),
        ReportFormat::Json => {
            let value = to_json(&header, &object, magic_ok, platform, platform_ok);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(if magic_ok && platform_ok && object == ObjectStatus::Ok {
        0
    } else {
        1
    })
}

fn verdict(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "mismatch"
    }
}

fn opt_level_name(header: &CacheFileHeader) -> String {
    header
        .opt_level()
        .map(|level| level.to_string())
        .unwrap_or_else(|| format!("invalid ({})", header.opt_level))
}

fn print_text(
    header: &CacheFileHeader,
    object: &ObjectStatus,
    magic_ok: bool,
    platform: PlatformKey,
    platform_ok: bool,
) {
    println!("     magic  {:016x} ({})", header.magic, verdict(magic_ok));
    println!(
        "  platform  {} ({}, this build is {platform})",
        header.platform_key(),
        verdict(platform_ok)
    );
    println!("    module  {}", header.module_id_lossy());
    println!("       cpu  {}", header.cpu_lossy());
    println!(" opt level  {}", opt_level_name(header));
    println!("source crc  {}", header.source_crc());
    println!("object crc  {}", header.object_crc());
    println!("      size  {} bytes", header.object_size);
    println!("    object  {}", object.describe());
}

fn to_json(
    header: &CacheFileHeader,
    object: &ObjectStatus,
    magic_ok: bool,
    platform: PlatformKey,
    platform_ok: bool,
) -> serde_json::Value {
    serde_json::json!({
        "magic": format!("{:016x}", header.magic),
        "magic_ok": magic_ok,
        "platform_key": header.platform_key().to_string(),
        "platform_ok": platform_ok,
        "current_platform_key": platform.to_string(),
        "module_id": header.module_id_lossy(),
        "cpu": header.cpu_lossy(),
        "opt_level": opt_level_name(header),
        "source_crc": header.source_crc().to_string(),
        "object_crc": header.object_crc().to_string(),
        "object_size": header.object_size,
        "object": object.describe(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitc_cache::{JitCache, SerializedModule};
    use jitc_config::CacheSettings;
    use std::path::PathBuf;

    fn stored_entry(root: &Path) -> PathBuf {
        let mut cache = JitCache::new(CacheSettings::new(root));
        cache
            .lookup(&SerializedModule::new("JM_fetch", b"ir".as_slice()))
            .unwrap();
        cache.store(b"object").unwrap();
        shard::shard_dir(root, Crc32::from_bytes(b"ir")).join("JM_fetch")
    }

    #[test]
    fn valid_entry_inspects_clean() {
        let dir = tempfile::tempdir().unwrap();
        let header = stored_entry(dir.path());
        let global = crate::test_global(dir.path());
        for format in [ReportFormat::Text, ReportFormat::Json] {
            let args = InspectArgs {
                header: header.clone(),
                format,
            };
            assert_eq!(run(&args, &global).unwrap(), 0);
        }
    }

    #[test]
    fn damaged_object_fails() {
        let dir = tempfile::tempdir().unwrap();
        let header = stored_entry(dir.path());
        std::fs::write(shard::object_path(&header), b"objec!").unwrap();
        let args = InspectArgs {
            header,
            format: ReportFormat::Text,
        };
        assert_eq!(run(&args, &crate::test_global(dir.path())).unwrap(), 1);
    }

    #[test]
    fn object_status_detects_missing() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = stored_entry(dir.path());
        let header = CacheFileHeader::decode(&std::fs::read(&header_path).unwrap()).unwrap();
        assert_eq!(ObjectStatus::check(&header_path, &header), ObjectStatus::Ok);
        std::fs::remove_file(shard::object_path(&header_path)).unwrap();
        assert_eq!(
            ObjectStatus::check(&header_path, &header),
            ObjectStatus::Missing
        );
    }

    #[test]
    fn json_report_fields() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = stored_entry(dir.path());
        let header = CacheFileHeader::decode(&std::fs::read(&header_path).unwrap()).unwrap();
        let value = to_json(
            &header,
            &ObjectStatus::Ok,
            true,
            PlatformKey::current(),
            true,
        );
        assert_eq!(value["module_id"], "JM_fetch");
        assert_eq!(value["cpu"], "generic");
        assert_eq!(value["opt_level"], "default");
        assert_eq!(value["object_size"], 6);
        assert_eq!(value["object"], "ok");
    }

    #[test]
    fn short_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("JM_short");
        std::fs::write(&path, b"tiny").unwrap();
        let args = InspectArgs {
            header: path,
            format: ReportFormat::Text,
        };
        assert!(run(&args, &crate::test_global(dir.path())).is_err());
    }
}
