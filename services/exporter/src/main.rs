//! Exporter - Turns the TEP contract workbooks into relational tables
//!
//! Responsibilities:
//! - Load the timeline, contract evolution and cost breakdown workbooks
//! - Infer their layouts and normalize them into the tb_m_* / tb_t_* schema
//! - Cleanse and check referential integrity
//! - Emit CSV files, a MySQL script, SVG charts and a run summary
//!
//! A workbook that cannot be loaded aborts the run. Everything else that
//! looks wrong in a layout becomes a warning in the summary.

mod charts;
mod csv_out;
mod sql;
mod summary;

use anyhow::{Context, Result};
use clap::Parser;
use extractor::sources::{CBS_FILE, EVOLUTION_FILE, TIMELINE_FILE};
use extractor::{
    check_integrity, cleanse, extract, normalize, Diagnostics, Layouts, SourceFiles,
};
use std::path::PathBuf;
use summary::RunSummary;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "exporter", about = "Extracts the TEP contract workbooks into relational tables")]
struct Args {
    /// Directory holding the three source workbooks
    #[arg(long, env = "RAW_DATA_DIR", default_value = "raw_data")]
    raw_data_dir: PathBuf,

    /// Directory receiving CSV files, the SQL script, charts and the summary
    #[arg(long, env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Timeline workbook file name inside the raw data directory
    #[arg(long, env = "TIMELINE_FILE", default_value = TIMELINE_FILE)]
    timeline_file: String,

    /// Contract evolution workbook file name
    #[arg(long, env = "EVOLUTION_FILE", default_value = EVOLUTION_FILE)]
    evolution_file: String,

    /// Cost breakdown structure workbook file name
    #[arg(long, env = "CBS_FILE", default_value = CBS_FILE)]
    cbs_file: String,

    /// Rows per INSERT statement
    #[arg(long, env = "SQL_BATCH_SIZE", default_value_t = sql::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Skip chart rendering
    #[arg(long, default_value = "false")]
    no_charts: bool,

    /// Sheet row used for a timeline section without an anchor, e.g. FGRS=17
    #[arg(long = "fallback-row", value_parser = parse_fallback_row)]
    fallback_rows: Vec<(String, usize)>,

    /// Dry run - extract and validate without writing files
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

impl Args {
    fn source_files(&self) -> SourceFiles {
        SourceFiles {
            timeline: self.raw_data_dir.join(&self.timeline_file),
            evolution: self.raw_data_dir.join(&self.evolution_file),
            cbs: self.raw_data_dir.join(&self.cbs_file),
        }
    }

    fn layouts(&self) -> Layouts {
        let mut layouts = Layouts::default();
        for (section, row) in &self.fallback_rows {
            layouts.timeline = layouts.timeline.with_fallback_row(section, *row);
        }
        layouts
    }
}

/// Parse `SECTION=ROW` with a 1-based row.
fn parse_fallback_row(s: &str) -> Result<(String, usize), String> {
    let (section, row) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SECTION=ROW, got '{}'", s))?;
    let section = section.trim();
    if section.is_empty() {
        return Err(format!("missing section name in '{}'", s));
    }
    let row: usize = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row number in '{}'", s))?;
    if row == 0 {
        return Err("rows are 1-based".to_string());
    }
    Ok((section.to_uppercase(), row))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let files = args.source_files();
    let generated_at = chrono::Local::now().naive_local();

    println!("=== TEP Contract Data Exporter ===");
    println!("Raw data: {}", args.raw_data_dir.display());
    println!("Output: {}", args.output_dir.display());
    println!("Mode: {}", if args.dry_run { "dry-run" } else { "live" });

    let mut diagnostics = Diagnostics::new();
    let extraction = extract(&files, &args.layouts(), &mut diagnostics)
        .context("Failed to load source workbooks")?;

    let mut normalized = normalize(&extraction);
    let cleanse_report = cleanse(&mut normalized.tables);
    let integrity = check_integrity(&normalized.tables, &mut diagnostics);

    let mut run_summary = RunSummary::new(
        generated_at,
        &normalized,
        &diagnostics,
        cleanse_report,
        integrity,
    )
    .directories(&args.raw_data_dir, &args.output_dir)
    .dry_run(args.dry_run);

    if args.dry_run {
        print!("{}", run_summary.render());
        println!("\nDry run - no files written");
        return Ok(());
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let mut written = csv_out::write_tables(&args.output_dir, &normalized.tables)?;
    written.extend(csv_out::write_tables(&args.output_dir, &normalized.raw)?);
    info!(files = written.len(), "wrote csv files");

    let script_path = args.output_dir.join(sql::SCRIPT_FILE);
    let script = sql::render_script(&normalized.tables, args.batch_size, generated_at);
    std::fs::write(&script_path, &script)
        .with_context(|| format!("Failed to write {}", script_path.display()))?;
    info!(path = %script_path.display(), bytes = script.len(), "wrote sql script");
    written.push(script_path);

    if args.no_charts {
        println!("Charts skipped (--no-charts)");
    } else {
        let renderer = charts::ChartRenderer::new();
        written.extend(charts::render_all(&normalized.tables, &args.output_dir, &renderer)?);
    }

    let summary_path = args.output_dir.join(summary::SUMMARY_FILE);
    written.push(summary_path.clone());
    run_summary.files = written;
    run_summary.write_json(&summary_path)?;

    print!("{}", run_summary.render());
    println!("\nDone: {} files in {}", run_summary.files.len(), args.output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fallback_row() {
        assert_eq!(parse_fallback_row("fgrs=17"), Ok(("FGRS".to_string(), 17)));
        assert_eq!(parse_fallback_row(" POB = 40 "), Ok(("POB".to_string(), 40)));
        assert!(parse_fallback_row("FGRS").is_err());
        assert!(parse_fallback_row("=4").is_err());
        assert!(parse_fallback_row("FGRS=0").is_err());
        assert!(parse_fallback_row("FGRS=x").is_err());
    }

    #[test]
    fn test_args_build_paths_and_layouts() {
        let args = Args::parse_from([
            "exporter",
            "--raw-data-dir",
            "in",
            "--fallback-row",
            "LOGI=30",
            "--no-charts",
        ]);
        let files = args.source_files();
        assert_eq!(files.timeline, PathBuf::from("in").join(TIMELINE_FILE));
        assert!(args.no_charts);
        assert_eq!(args.batch_size, sql::DEFAULT_BATCH_SIZE);
        assert_eq!(args.layouts().timeline.fallback_rows.get("LOGI"), Some(&30));
    }
}
