//! Process command - run one receipt through the full pipeline.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde_json::json;

use docuparse_core::{BillRecord, ValidationVerdict};

use crate::pipeline::{DocumentOutcome, Pipeline};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input receipt PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file for the decoded bill (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Skip the archival upload
    #[arg(long)]
    no_upload: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    let config = super::load_config(config_path)?;
    let pipeline = Pipeline::from_config(config, !args.no_upload)?;

    match pipeline.process_document(&args.input).await {
        DocumentOutcome::Archived {
            bill,
            verdict,
            task_id,
        } => {
            let output = match args.format {
                OutputFormat::Json => serde_json::to_string_pretty(&json!({
                    "bill": bill,
                    "verdict": verdict,
                    "archive_task_id": task_id,
                }))?,
                OutputFormat::Text => format_bill_text(&bill, verdict.as_ref(), task_id.as_deref()),
            };

            if let Some(output_path) = &args.output {
                fs::write(output_path, &output)?;
                println!(
                    "{} Output written to {}",
                    style("✓").green(),
                    output_path.display()
                );
            } else {
                println!("{}", output);
            }
            Ok(())
        }
        DocumentOutcome::NotABill => {
            println!(
                "{} {} is not a receipt, skipped",
                style("ℹ").blue(),
                args.input.display()
            );
            Ok(())
        }
        DocumentOutcome::Failed { stage, message } => {
            anyhow::bail!("{} failed for {}: {}", stage, args.input.display(), message)
        }
    }
}

fn format_bill_text(
    bill: &BillRecord,
    verdict: Option<&ValidationVerdict>,
    task_id: Option<&str>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Store:    {}\n", bill.store));
    output.push_str(&format!("Category: {}\n", bill.category));
    if let Some(date) = bill.date {
        output.push_str(&format!("Date:     {}\n", date));
    }
    output.push('\n');

    output.push_str("Items:\n");
    for item in &bill.items {
        match item.price {
            Some(price) => output.push_str(&format!("  {:<40} {:>8}\n", item.name, price)),
            None => output.push_str(&format!("  {:<40} {:>8}\n", item.name, "?")),
        }
    }
    output.push('\n');

    if let Some(total) = bill.total {
        output.push_str(&format!("Total:    {}\n", total));
    }

    match verdict {
        Some(v) => output.push_str(&format!(
            "{} (sum {}, declared {}, difference {})\n",
            v.message, v.calculated_sum, v.declared_total, v.difference
        )),
        None => output.push_str("Validation not possible (missing items or total)\n"),
    }

    if let Some(task_id) = task_id {
        output.push_str(&format!("\nArchived as task {}\n", task_id));
    }

    output
}
