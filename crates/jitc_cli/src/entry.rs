//! `jitc get` and `jitc put`: run a lookup or a store for one module.
//!
//! The module file's bytes are taken as its canonical serialization, so the
//! key matches what a JIT would compute for the same module.

use std::path::Path;
use std::sync::Arc;

use jitc_cache::{JitCache, Lookup, ModuleSerializer, SerializedModule};
use jitc_diagnostics::DiagnosticSink;

use crate::settings::{apply_target, load_settings};
use crate::{render_diagnostics, GetArgs, GlobalArgs, PutArgs, ReportFormat};

/// Reads a serialized module, naming it `id` or the file's stem.
fn read_module(path: &Path, id: Option<&str>) -> Result<SerializedModule, Box<dyn std::error::Error>> {
    let id = match id {
        Some(id) => id.to_string(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| format!("cannot derive a module id from {}", path.display()))?,
    };
    let bytes = std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    Ok(SerializedModule::new(id, bytes))
}

/// Names the entry the last lookup resolved, or just the module id when the
/// cache skipped it.
fn entry_name(cache: &JitCache, module: &SerializedModule) -> String {
    match cache.pending_key() {
        Some(key) => key.to_string(),
        None => module.module_id().to_string(),
    }
}

/// Runs the `jitc get` command.
///
/// Returns exit code 0 on a hit and 1 on a miss.
pub fn get(args: &GetArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut settings = load_settings(global)?;
    apply_target(&mut settings, &args.target)?;
    let module = read_module(&args.module, args.id.as_deref())?;

    let sink = Arc::new(DiagnosticSink::new());
    let mut cache = JitCache::new(settings).with_sink(Arc::clone(&sink));
    let result = cache.lookup(&module)?;
    let entry = entry_name(&cache, &module);
    render_diagnostics(&sink.take_all(), ReportFormat::Text, global);

    match result {
        Lookup::Hit(object) => {
            if let Some(out) = &args.out {
                std::fs::write(out, &object)
                    .map_err(|e| format!("cannot write {}: {e}", out.display()))?;
            }
            if !global.quiet {
                eprintln!("       Hit {entry} ({} bytes)", object.len());
            }
            Ok(0)
        }
        Lookup::Miss(reason) => {
            if !global.quiet {
                eprintln!("      Miss {entry}: {reason}");
            }
            Ok(1)
        }
    }
}

/// Runs the `jitc put` command.
///
/// Returns exit code 0 once the entry is written, 1 if the cache declined
/// the module (disabled or not cacheable).
pub fn put(args: &PutArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut settings = load_settings(global)?;
    apply_target(&mut settings, &args.target)?;
    let module = read_module(&args.module, args.id.as_deref())?;
    let object = std::fs::read(&args.object)
        .map_err(|e| format!("cannot read {}: {e}", args.object.display()))?;

    let sink = Arc::new(DiagnosticSink::new());
    let mut cache = JitCache::new(settings).with_sink(Arc::clone(&sink));
    let result = cache.lookup(&module)?;
    let entry = entry_name(&cache, &module);

    if let Some(reason) = result.miss_reason() {
        if !reason.is_storable() {
            if !global.quiet {
                eprintln!("   Skipped {entry}: {reason}");
            }
            return Ok(1);
        }
    }

    let stored = cache.store(&object);
    render_diagnostics(&sink.take_all(), ReportFormat::Text, global);
    stored?;

    if !global.quiet {
        eprintln!("    Stored {entry} ({} bytes)", object.len());
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TargetArgs;
    use jitc_common::OptLevel;
    use std::path::PathBuf;

    fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let module = dir.join("JM_fetch.ir");
        let object = dir.join("fetch.o");
        std::fs::write(&module, b"define void @fetch()").unwrap();
        std::fs::write(&object, b"\x7fELF object").unwrap();
        (module, object)
    }

    fn get_args(module: &Path, out: Option<PathBuf>) -> GetArgs {
        GetArgs {
            module: module.to_path_buf(),
            id: None,
            out,
            target: TargetArgs::default(),
        }
    }

    #[test]
    fn module_id_defaults_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let (module, _) = write_inputs(dir.path());
        let m = read_module(&module, None).unwrap();
        assert_eq!(jitc_cache::ModuleSerializer::module_id(&m), "JM_fetch");
        let m = read_module(&module, Some("JM_other")).unwrap();
        assert_eq!(jitc_cache::ModuleSerializer::module_id(&m), "JM_other");
    }

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache_root = dir.path().join("cache");
        let global = crate::test_global(&cache_root);
        let (module, object) = write_inputs(dir.path());

        assert_eq!(get(&get_args(&module, None), &global).unwrap(), 1);

        let put_args = PutArgs {
            module: module.clone(),
            object,
            id: None,
            target: TargetArgs::default(),
        };
        assert_eq!(put(&put_args, &global).unwrap(), 0);

        let out = dir.path().join("out.o");
        assert_eq!(get(&get_args(&module, Some(out.clone())), &global).unwrap(), 0);
        assert_eq!(std::fs::read(out).unwrap(), b"\x7fELF object");
    }

    #[test]
    fn get_with_other_opt_level_misses() {
        let dir = tempfile::tempdir().unwrap();
        let global = crate::test_global(&dir.path().join("cache"));
        let (module, object) = write_inputs(dir.path());
        let put_args = PutArgs {
            module: module.clone(),
            object,
            id: None,
            target: TargetArgs::default(),
        };
        put(&put_args, &global).unwrap();

        let mut args = get_args(&module, None);
        args.target.opt = Some(OptLevel::None);
        assert_eq!(get(&args, &global).unwrap(), 1);
    }

    #[test]
    fn put_of_uncacheable_id_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let cache_root = dir.path().join("cache");
        let global = crate::test_global(&cache_root);
        let (module, object) = write_inputs(dir.path());
        let put_args = PutArgs {
            module,
            object,
            id: Some("..".to_string()),
            target: TargetArgs::default(),
        };
        assert_eq!(put(&put_args, &global).unwrap(), 1);
        assert!(!cache_root.exists());
    }

    #[test]
    fn entry_name_follows_the_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let settings = jitc_config::CacheSettings::new(dir.path());
        let mut cache = JitCache::new(settings);
        let module = SerializedModule::new("JM_fetch", b"ir".as_slice());

        cache.lookup(&module).unwrap();
        let expected = cache.key_for(&module).unwrap().to_string();
        assert_eq!(entry_name(&cache, &module), expected);

        let skipped = SerializedModule::new("..", b"ir".as_slice());
        cache.lookup(&skipped).unwrap();
        assert_eq!(entry_name(&cache, &skipped), "..");
    }

    #[test]
    fn blank_cpu_flag_fails_get_and_put() {
        let dir = tempfile::tempdir().unwrap();
        let cache_root = dir.path().join("cache");
        let global = crate::test_global(&cache_root);
        let (module, object) = write_inputs(dir.path());

        let mut args = get_args(&module, None);
        args.target.cpu = Some(" ".to_string());
        assert!(get(&args, &global).is_err());

        let put_args = PutArgs {
            module,
            object,
            id: None,
            target: TargetArgs {
                cpu: Some(String::new()),
                opt: None,
            },
        };
        assert!(put(&put_args, &global).is_err());
        assert!(!cache_root.exists());
    }

    #[test]
    fn missing_module_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let global = crate::test_global(dir.path());
        let args = get_args(&dir.path().join("absent.ir"), None);
        assert!(get(&args, &global).is_err());
    }
}
