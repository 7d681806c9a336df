//! `jitc audit`: classify every entry under the cache root.

use jitc_cache::AuditReport;
use jitc_diagnostics::DiagnosticSink;

use crate::settings::load_settings;
use crate::{render_diagnostics, AuditArgs, GlobalArgs, ReportFormat};

/// Runs the `jitc audit` command.
///
/// Never modifies the cache. Returns exit code 0 if no corrupt or unreadable
/// entries were found, 1 otherwise.
pub fn run(args: &AuditArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("  Auditing {}", settings.root.display());
    }

    let sink = DiagnosticSink::new();
    let report = jitc_cache::audit(&settings.root, settings.platform_key, Some(&sink))?;

    match args.format {
        ReportFormat::Text => {
            render_diagnostics(&sink.take_all(), ReportFormat::Text, global);
            if !global.quiet {
                eprintln!("{}", summary(&report));
            }
        }
        ReportFormat::Json => {
            render_diagnostics(&sink.take_all(), ReportFormat::Json, global);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}

fn summary(report: &AuditReport) -> String {
    format!(
        "    Result: {} entries, {} valid ({} bytes), {} foreign, {} corrupt, {} unreadable",
        report.entries(),
        report.valid,
        report.valid_bytes,
        report.foreign.len(),
        report.corrupt.len(),
        report.unreadable.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitc_cache::{JitCache, SerializedModule};
    use jitc_config::CacheSettings;

    #[test]
    fn empty_root_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let global = crate::test_global(&dir.path().join("absent"));
        let args = AuditArgs {
            format: ReportFormat::Text,
        };
        assert_eq!(run(&args, &global).unwrap(), 0);
    }

    #[test]
    fn unreadable_header_fails_audit() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = JitCache::new(CacheSettings::new(dir.path()));
        cache
            .lookup(&SerializedModule::new("JM_a", b"ir".as_slice()))
            .unwrap();
        cache.store(b"obj").unwrap();

        let shard = dir.path().join("7").join("7").join("7").join("7");
        std::fs::create_dir_all(&shard).unwrap();
        std::fs::write(shard.join("JM_bad"), b"garbage").unwrap();

        let global = crate::test_global(dir.path());
        for format in [ReportFormat::Text, ReportFormat::Json] {
            assert_eq!(run(&AuditArgs { format }, &global).unwrap(), 1);
        }
    }

    #[test]
    fn summary_line() {
        let report = AuditReport {
            valid: 2,
            valid_bytes: 40,
            ..AuditReport::default()
        };
        assert_eq!(
            summary(&report),
            "    Result: 2 entries, 2 valid (40 bytes), 0 foreign, 0 corrupt, 0 unreadable"
        );
    }
}
