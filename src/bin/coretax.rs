//! CLI front-end for the Coretax extractor.
//!
//! A thin shim over the library crate: resolves the company from the store,
//! runs the batch, exports, and prints the run summary. All business rules
//! live in the library.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use coretax_extractor::{
    batch, db::default_db_path, excel, CompanyStore, PdfTextExtractor,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coretax", version, about = "Coretax Bukti Potong PDF extractor")]
struct Cli {
    /// Company store database path (defaults to CORETAX_DB_PATH or the
    /// platform data directory).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract Bukti Potong fields from PDFs and export them to Excel.
    Extract {
        /// Company name as registered in the store.
        #[arg(long)]
        company: String,

        /// Directory the Excel file is written into.
        #[arg(long)]
        output_dir: PathBuf,

        /// Print the run summary as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// PDF files to process, in order.
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,
    },
    /// Manage the company store.
    Companies {
        #[command(subcommand)]
        action: CompanyAction,
    },
    /// Show the most recent audit log entries.
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum CompanyAction {
    /// List registered companies.
    List,
    /// Register a company (requires the admin password).
    Add {
        name: String,
        npwp: String,
        #[arg(long)]
        admin_password: String,
    },
    /// Remove a company (requires the admin password).
    Remove {
        name: String,
        #[arg(long)]
        admin_password: String,
    },
}

/// Prints a percentage line after each processed file.
struct ConsoleProgress;

impl batch::BatchProgress for ConsoleProgress {
    fn on_batch_start(&mut self, total_files: usize) {
        println!("Starting PDF extraction... ({} files)", total_files);
    }

    fn on_file_done(&mut self, processed: usize, total_files: usize, percent: f64) {
        println!("Processing... {:.1}% ({}/{})", percent, processed, total_files);
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    let store = CompanyStore::new(db_path).context("could not open company store")?;

    match cli.command {
        Command::Extract {
            company,
            output_dir,
            json,
            pdfs,
        } => run_extract(&store, &company, &output_dir, json, pdfs),
        Command::Companies { action } => run_companies(&store, action),
        Command::Audit { limit } => {
            for (action, details, timestamp) in store.get_audit_log(limit)? {
                println!("{}  {}  {}", timestamp, action, details);
            }
            Ok(())
        }
    }
}

fn run_extract(
    store: &CompanyStore,
    company_name: &str,
    output_dir: &PathBuf,
    json: bool,
    pdfs: Vec<PathBuf>,
) -> Result<()> {
    let company = store
        .get_company_by_name(company_name)?
        .with_context(|| format!("company '{}' is not registered; see `coretax companies list`", company_name))?;

    let source = PdfTextExtractor;
    let result = batch::run_batch(&pdfs, &company, &source, &mut ConsoleProgress);
    let summary = batch::summarize(&result, pdfs.len());
    batch::log_summary(&summary, &result);

    if result.records.is_empty() {
        if summary.skipped == pdfs.len() {
            bail!(
                "none of the {} PDF files match the NPWP of {} ({})",
                pdfs.len(),
                company.name,
                company.npwp
            );
        }
        bail!("no data extracted from any of the {} PDF files", pdfs.len());
    }

    let output_file = excel::export_records_to_excel(&result.records, output_dir, &company)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "summary": summary,
                "output_file": output_file,
                "failed": result.failed,
                "skipped": result.skipped,
            })
        );
        return Ok(());
    }

    println!();
    println!("EXTRACTION SUMMARY");
    println!("Company: {}", company.name);
    println!("Total Files Processed: {}", summary.total);
    println!("Successfully Extracted: {}", summary.success);
    if summary.incomplete > 0 {
        println!("Incomplete Extraction: {}", summary.incomplete);
    }
    if summary.failed > 0 {
        println!("Failed: {}", summary.failed);
    }
    if summary.skipped > 0 {
        println!("Skipped (NPWP Mismatch): {}", summary.skipped);
    }
    println!("Results saved to: {}", output_file.display());

    if !result.failed.is_empty() {
        println!();
        println!("FAILED/INCOMPLETE FILES:");
        for (i, failed) in result.failed.iter().take(10).enumerate() {
            println!("{}. {}: {}", i + 1, failed.filename, failed.error);
        }
        if result.failed.len() > 10 {
            println!("... and {} more files.", result.failed.len() - 10);
        }
    }
    Ok(())
}

fn run_companies(store: &CompanyStore, action: CompanyAction) -> Result<()> {
    match action {
        CompanyAction::List => {
            for company in store.get_all_companies()? {
                println!("{}  (NPWP: {})", company.name, company.npwp);
            }
            Ok(())
        }
        CompanyAction::Add {
            name,
            npwp,
            admin_password,
        } => {
            require_admin(store, &admin_password)?;
            store.add_company(&name, &npwp)?;
            println!("Added {}", name);
            Ok(())
        }
        CompanyAction::Remove {
            name,
            admin_password,
        } => {
            require_admin(store, &admin_password)?;
            store.delete_company(&name)?;
            println!("Removed {}", name);
            Ok(())
        }
    }
}

fn require_admin(store: &CompanyStore, password: &str) -> Result<()> {
    if !store.verify_admin_password(password)? {
        bail!("incorrect admin password");
    }
    Ok(())
}
