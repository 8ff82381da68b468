//! Batch command - process a queue of receipt PDFs sequentially.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use crate::pipeline::{DocumentOutcome, Pipeline};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Stop at the first failed document instead of continuing
    #[arg(long)]
    fail_fast: bool,

    /// Skip the archival upload
    #[arg(long)]
    no_upload: bool,

    /// Also write a summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Result of processing a single file.
struct BatchResult {
    path: PathBuf,
    outcome: DocumentOutcome,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            ext.eq_ignore_ascii_case("pdf")
        })
        .collect();

    // An empty selection means the user picked nothing; that is a valid
    // outcome, not an error.
    if files.is_empty() {
        println!(
            "{} No documents selected for pattern: {}",
            style("ℹ").blue(),
            args.input
        );
        return Ok(());
    }

    println!(
        "{} Found {} documents to process",
        style("ℹ").blue(),
        files.len()
    );

    let config = super::load_config(config_path)?;
    let pipeline = Pipeline::from_config(config, !args.no_upload)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Sequential by design: each document runs to completion before the
    // next begins, and the ledger guard applies per document.
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let outcome = pipeline.process_document(&path).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        let failed = outcome.is_failure();
        if let DocumentOutcome::Failed { stage, message } = &outcome {
            error!("{}: {} failed: {}", path.display(), stage, message);
        }
        results.push(BatchResult {
            path,
            outcome,
            processing_time_ms,
        });

        overall_pb.inc(1);
        if failed && args.fail_fast {
            break;
        }
    }

    overall_pb.finish_with_message("Complete");

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    let archived = results
        .iter()
        .filter(|r| matches!(r.outcome, DocumentOutcome::Archived { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.outcome, DocumentOutcome::NotABill))
        .count();
    let failed: Vec<_> = results.iter().filter(|r| r.outcome.is_failure()).collect();

    println!();
    println!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} archived, {} skipped, {} failed",
        style(archived).green(),
        style(skipped).blue(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed documents (re-run individually):").red());
        for result in &failed {
            if let DocumentOutcome::Failed { stage, message } = &result.outcome {
                println!("  - {}: [{}] {}", result.path.display(), stage, message);
            }
        }
    }

    Ok(())
}

fn write_summary(path: &PathBuf, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "store",
        "category",
        "date",
        "total",
        "valid",
        "archive_task_id",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = result.processing_time_ms.to_string();

        match &result.outcome {
            DocumentOutcome::Archived {
                bill,
                verdict,
                task_id,
            } => {
                wtr.write_record([
                    filename,
                    "archived",
                    &bill.store,
                    &bill.category,
                    &bill.date.map(|d| d.to_string()).unwrap_or_default(),
                    &bill.total.map(|t| t.to_string()).unwrap_or_default(),
                    &verdict
                        .as_ref()
                        .map(|v| v.is_valid.to_string())
                        .unwrap_or_default(),
                    task_id.as_deref().unwrap_or(""),
                    &time,
                    "",
                ])?;
            }
            DocumentOutcome::NotABill => {
                wtr.write_record([filename, "skipped", "", "", "", "", "", "", &time, ""])?;
            }
            DocumentOutcome::Failed { stage, message } => {
                wtr.write_record([
                    filename,
                    "failed",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &time,
                    &format!("[{}] {}", stage, message),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
