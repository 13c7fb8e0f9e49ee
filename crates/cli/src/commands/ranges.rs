use std::path::Path;

use anyhow::{Context, Result};

use sweep_core::db::RangeDb;

/// List all function ranges recorded in a range database.
pub fn ranges_command(db: &str, json: bool) -> Result<()> {
    let db = RangeDb::open(Path::new(db))
        .with_context(|| format!("Failed to open range database: {db}"))?;
    let ranges = db.list_ranges().context("Failed to list ranges")?;

    if json {
        let serialized = serde_json::to_string_pretty(&ranges)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Function ranges:");
    if ranges.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for range in ranges {
        let origin = if range.heuristic { "heuristic" } else { "manual" };
        println!("- 0x{:X}-0x{:X} [{}]", range.start, range.end, origin);
    }

    Ok(())
}

/// List analysis runs recorded in a range database.
pub fn runs_command(db: &str, binary: Option<String>, json: bool) -> Result<()> {
    let db = RangeDb::open(Path::new(db))
        .with_context(|| format!("Failed to open range database: {db}"))?;
    let runs = db.list_runs(binary.as_deref()).context("Failed to list runs")?;

    if json {
        let serialized = serde_json::to_string_pretty(&runs)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Analysis runs:");
    if runs.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for run in runs {
        let hash_display = run.binary_hash.as_deref().unwrap_or("(none)");
        println!(
            "- {} region 0x{:X}+0x{:X}: {}/{} resolved (hash: {}, started: {})",
            run.binary, run.base, run.size, run.resolved, run.candidates, hash_display,
            run.started_at
        );
    }

    Ok(())
}
