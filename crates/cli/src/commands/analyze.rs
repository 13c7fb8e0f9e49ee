use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;

use sweep_core::analysis::Analysis;
use sweep_core::db::{AnalysisRunRecord, RangeDb};
use sweep_core::decode::CapstoneDecoder;
use sweep_core::image::{FileImage, RegionSpec};
use sweep_core::model::FunctionRange;

use crate::{infer_binary_name, parse_u64, sha256_file};

/// Report for one analyzed region, also used for JSON output.
#[derive(Debug, Serialize)]
pub struct RegionReport {
    pub base: u64,
    pub size: u64,
    pub candidates: usize,
    pub ranges: Vec<FunctionRange>,
    pub unresolved: Vec<u64>,
}

fn load_region_specs(
    image: &FileImage,
    regions: Option<&str>,
    base: Option<&str>,
    file_offset: Option<&str>,
    size: Option<&str>,
) -> Result<Vec<RegionSpec>> {
    if let Some(regions_path) = regions {
        let text = fs::read_to_string(regions_path)
            .with_context(|| format!("Failed to read regions file: {regions_path}"))?;
        let specs: Vec<RegionSpec> = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse regions file: {regions_path}"))?;
        if specs.is_empty() {
            return Err(anyhow!("Regions file lists no regions: {regions_path}"));
        }
        return Ok(specs);
    }

    if base.is_some() || size.is_some() || file_offset.is_some() {
        let base = parse_u64(base.ok_or_else(|| anyhow!("--base is required with --size"))?)?;
        let size = parse_u64(size.ok_or_else(|| anyhow!("--size is required with --base"))?)?;
        let file_offset = file_offset.map(parse_u64).transpose()?.unwrap_or(0);
        return Ok(vec![RegionSpec { base, file_offset, size }]);
    }

    // No explicit region: take the executable section when the file parses
    // as an object, otherwise sweep the whole file mapped at zero.
    Ok(vec![image.text_region().unwrap_or(RegionSpec {
        base: 0,
        file_offset: 0,
        size: image.bytes().len() as u64,
    })])
}

/// Discover function boundaries in one or more regions of a binary file.
#[allow(clippy::too_many_arguments)]
pub fn analyze_command(
    path: &str,
    base: Option<String>,
    file_offset: Option<String>,
    size: Option<String>,
    arch: &str,
    regions: Option<String>,
    db: Option<String>,
    name: Option<String>,
    skip_hash: bool,
    json: bool,
) -> Result<()> {
    let input_path = Path::new(path);
    let bytes = fs::read(input_path)
        .with_context(|| format!("Failed to read binary: {}", input_path.display()))?;
    let image = FileImage::new(bytes);

    let specs = load_region_specs(
        &image,
        regions.as_deref(),
        base.as_deref(),
        file_offset.as_deref(),
        size.as_deref(),
    )?;

    let decoder = CapstoneDecoder::new(arch).map_err(|e| anyhow!(e))?;
    let binary_name = name.unwrap_or_else(|| infer_binary_name(input_path));
    let binary_hash = if skip_hash { None } else { Some(sha256_file(input_path)?) };

    let mut range_db = match &db {
        Some(db_path) => Some(
            RangeDb::open(Path::new(db_path))
                .with_context(|| format!("Failed to open range database: {db_path}"))?,
        ),
        None => None,
    };

    let mut reports = Vec::new();
    for region_spec in specs {
        let started_at = Utc::now().to_rfc3339();
        let started = Instant::now();

        let window = image.window(region_spec);
        let analysis = Analysis::snapshot(&window, region_spec.base, region_spec.size)
            .context("Failed to snapshot region")?;
        let set = analysis.analyze(&decoder);

        log::info!(
            "region {:#x}..{:#x}: {} candidates, {} resolved in {:?}",
            region_spec.base,
            region_spec.base + region_spec.size,
            set.len(),
            set.resolved().count(),
            started.elapsed()
        );

        if let Some(registry) = range_db.as_mut() {
            analysis
                .export_boundaries(&set, registry)
                .context("Failed to export boundaries to the range database")?;
            let record = AnalysisRunRecord {
                binary: binary_name.clone(),
                binary_hash: binary_hash.clone(),
                base: region_spec.base,
                size: region_spec.size,
                candidates: set.len() as u64,
                resolved: set.resolved().count() as u64,
                started_at,
                finished_at: Utc::now().to_rfc3339(),
            };
            registry.insert_run(&record).context("Failed to record analysis run")?;
        }

        reports.push(RegionReport {
            base: region_spec.base,
            size: region_spec.size,
            candidates: set.len(),
            ranges: set
                .resolved()
                .map(|c| FunctionRange {
                    start: c.start,
                    // `resolved()` only yields candidates with a known end.
                    end: c.end.unwrap_or(c.start),
                    heuristic: true,
                })
                .collect(),
            unresolved: set.iter().filter(|c| !c.resolved()).map(|c| c.start).collect(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in reports {
        println!(
            "Region 0x{:X}-0x{:X} ({} candidates):",
            report.base,
            report.base + report.size,
            report.candidates
        );
        if report.ranges.is_empty() {
            println!("  (no resolved functions)");
        }
        for range in &report.ranges {
            println!("  function 0x{:X}-0x{:X} [heuristic]", range.start, range.end);
        }
        for start in &report.unresolved {
            println!("  candidate 0x{start:X} (end unresolved)");
        }
    }

    Ok(())
}
