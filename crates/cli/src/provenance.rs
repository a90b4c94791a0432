//! Provenance sidecars for generated edge tables.
//!
//! `edges.csv` gets `edges.provenance.json` beside it, recording which code
//! and which parameters produced the table and what the run did.

use anyhow::{Context, Result};
use roadgen::GenStats;
use serde::Serialize;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Serialize)]
struct Callsite {
    file: &'static str,
    line: u32,
}

#[derive(Debug, Serialize)]
struct Sidecar<'a, P: Serialize> {
    code_rev: String,
    version: &'static str,
    callsite: Callsite,
    params: &'a P,
    stats: &'a GenStats,
    outputs: [String; 1],
}

/// Write the sidecar for `table` and return its path.
#[track_caller]
pub fn record<P: Serialize>(table: &Path, params: &P, stats: &GenStats) -> Result<PathBuf> {
    let caller = Location::caller();
    let doc = Sidecar {
        code_rev: code_rev(),
        version: roadgen::VERSION,
        callsite: Callsite {
            file: caller.file(),
            line: caller.line(),
        },
        params,
        stats,
        outputs: [table.display().to_string()],
    };
    let path = sidecar_path(table);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let body = serde_json::to_vec_pretty(&doc)?;
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn sidecar_path(table: &Path) -> PathBuf {
    table.with_extension("provenance.json")
}

/// Commit of the running code: `GIT_COMMIT` (build time, then run time),
/// else `git rev-parse HEAD`, else `"unknown"`.
pub fn code_rev() -> String {
    let pinned = option_env!("GIT_COMMIT")
        .map(str::to_owned)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|rev| !rev.is_empty());
    pinned
        .or_else(head_rev)
        .unwrap_or_else(|| "unknown".to_owned())
}

fn head_rev() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?;
    Some(rev.trim().to_owned()).filter(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_the_table() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/run/edges.parquet")),
            Path::new("/tmp/run/edges.provenance.json")
        );
        assert_eq!(
            sidecar_path(Path::new("edges.csv")),
            Path::new("edges.provenance.json")
        );
    }

    #[test]
    fn record_writes_params_and_stats() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("nested").join("edges.csv");
        let stats = GenStats {
            seeded: true,
            highways: 5,
            streets: 12,
            ..GenStats::default()
        };
        let path = record(&table, &json!({ "seed": 3 }), &stats).unwrap();
        assert_eq!(path, dir.path().join("nested").join("edges.provenance.json"));

        let doc: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(doc["outputs"][0], table.display().to_string());
        assert_eq!(doc["params"]["seed"], 3);
        assert_eq!(doc["stats"]["highways"], 5);
        assert_eq!(doc["stats"]["streets"], 12);
        assert_eq!(doc["version"], roadgen::VERSION);
        assert!(doc["callsite"]["file"].as_str().unwrap().ends_with("provenance.rs"));
    }

    #[test]
    fn code_rev_is_never_empty() {
        assert!(!code_rev().is_empty());
    }
}
