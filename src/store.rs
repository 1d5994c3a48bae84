//! File persistence: per-scheme records, the consolidated aggregate, and the
//! discovered-URLs dump. Write failures are fatal to the run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

const SCHEME_FILE_PREFIX: &str = "scheme-";
const AGGREGATE_FILE: &str = "all_schemes.json";

pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))
}

/// Write one payload to `scheme-{slug}.json`, pretty-printed with non-ASCII
/// preserved literally. Re-runs overwrite in place.
pub fn write_scheme(dir: &Path, slug: &str, payload: &Value) -> Result<PathBuf> {
    let path = dir.join(format!("{SCHEME_FILE_PREFIX}{slug}.json"));
    let json = serde_json::to_string_pretty(payload)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Overwrite the aggregate file with the full result sequence. This is a
/// derived view, rebuildable from the per-item files; it is rewritten whole
/// every run, never appended to.
pub fn write_aggregate(dir: &Path, payloads: &[Value]) -> Result<PathBuf> {
    let path = dir.join(AGGREGATE_FILE);
    let json = serde_json::to_string_pretty(payloads)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        "Consolidated {} records into {}",
        payloads.len(),
        path.display()
    );
    Ok(path)
}

/// Dump raw URLs one per line (diagnostic side file).
pub fn write_url_list(path: &Path, urls: &[String]) -> Result<()> {
    let mut out = String::new();
    for url in urls {
        out.push_str(url);
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} URLs to {}", urls.len(), path.display());
    Ok(())
}

/// Read-only snapshot of the output directory.
pub struct OutputStats {
    pub scheme_files: usize,
    /// Element count of the aggregate array, if the file exists.
    pub aggregate_records: Option<usize>,
}

pub fn collect_stats(dir: &Path) -> Result<OutputStats> {
    let mut scheme_files = 0;
    if dir.is_dir() {
        for entry in
            fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
        {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(SCHEME_FILE_PREFIX) && name.ends_with(".json") {
                scheme_files += 1;
            }
        }
    }

    let aggregate_path = dir.join(AGGREGATE_FILE);
    let aggregate_records = if aggregate_path.is_file() {
        let content = fs::read_to_string(&aggregate_path)
            .with_context(|| format!("Failed to read {}", aggregate_path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("{} is not valid JSON", aggregate_path.display()))?;
        value.as_array().map(|a| a.len())
    } else {
        None
    };

    Ok(OutputStats {
        scheme_files,
        aggregate_records,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scheme_files_are_pretty_and_unicode_preserving() {
        let dir = tempfile::tempdir().unwrap();
        let payload = json!({"name": "प्रधानमंत्री मुद्रा योजना", "_id": "123"});

        let path = write_scheme(dir.path(), "pmmy", &payload).unwrap();
        assert_eq!(path.file_name().unwrap(), "scheme-pmmy.json");

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("प्रधानमंत्री मुद्रा योजना"));
        assert!(written.contains("\n  \"_id\""));
        assert!(!written.contains("\\u"));
    }

    #[test]
    fn aggregate_is_fully_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let first = vec![json!({"_id": "1"}), json!({"_id": "2"})];
        let second = vec![json!({"_id": "3"})];

        write_aggregate(dir.path(), &first).unwrap();
        let path = write_aggregate(dir.path(), &second).unwrap();

        let parsed: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, json!([{"_id": "3"}]));
    }

    #[test]
    fn empty_aggregate_is_an_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_aggregate(dir.path(), &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn stats_count_scheme_files_and_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        write_scheme(dir.path(), "a", &json!({})).unwrap();
        write_scheme(dir.path(), "b", &json!({})).unwrap();
        write_aggregate(dir.path(), &[json!({})]).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let stats = collect_stats(dir.path()).unwrap();
        assert_eq!(stats.scheme_files, 2);
        assert_eq!(stats.aggregate_records, Some(1));
    }

    #[test]
    fn stats_on_missing_dir_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let stats = collect_stats(&dir.path().join("nope")).unwrap();
        assert_eq!(stats.scheme_files, 0);
        assert_eq!(stats.aggregate_records, None);
    }
}
