use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use docsearch_core::persist::{self, DataPaths};
use docsearch_core::{BuildReport, DocId};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Prepare and validate a docsearch data directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stem every index term and write stemming_dictionary.txt
    Stem {
        /// Data directory holding inverted_index.txt
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
    /// Load every resource and report what was found
    Check {
        /// Data directory to validate
        #[arg(long, default_value = "./data")]
        data_dir: String,
        /// Fail when records were skipped or documents are missing
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stem { data_dir } => build_dictionary(&data_dir),
        Commands::Check { data_dir, strict } => check(&data_dir, strict),
    }
}

/// Refresh the stemming dictionary so later runs start with every index term
/// already normalized.
fn build_dictionary(data_dir: &str) -> Result<()> {
    let paths = DataPaths::new(data_dir);
    let cache = persist::load_stemming_dictionary(&paths.stemming_dictionary())?;
    let before = cache.len();
    let built = persist::load_index(&paths.inverted_index(), true, &cache)?;
    persist::save_stemming_dictionary(&paths.stemming_dictionary(), &cache)?;
    tracing::info!(
        terms = built.index.num_terms(),
        added = cache.len() - before,
        total = cache.len(),
        "stemming dictionary refreshed"
    );
    Ok(())
}

#[derive(Serialize)]
struct Summary {
    terms: usize,
    entries: usize,
    report: BuildReport,
    stopwords: usize,
    stemming_dictionary: usize,
    documents: usize,
    missing_documents: Vec<DocId>,
}

fn check(data_dir: &str, strict: bool) -> Result<()> {
    let paths = DataPaths::new(data_dir);
    let stoplist = persist::load_stoplist(&paths.stoplist())?;
    let cache = persist::load_stemming_dictionary(&paths.stemming_dictionary())?;
    let documents = persist::load_document_table(&paths.document_id_map(), &paths.root)?;
    let built = persist::load_index(&paths.inverted_index(), false, &cache)?;

    let missing_documents: Vec<DocId> = documents
        .iter()
        .filter(|(_, path)| !path.is_file())
        .map(|(id, path)| {
            tracing::warn!(doc_id = id, path = %path.display(), "document file missing");
            id
        })
        .collect();

    let summary = Summary {
        terms: built.index.num_terms(),
        entries: built.entries.len(),
        report: built.report,
        stopwords: stoplist.len(),
        stemming_dictionary: cache.len(),
        documents: documents.len(),
        missing_documents,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if strict && (summary.report.skipped > 0 || !summary.missing_documents.is_empty()) {
        bail!(
            "{} records skipped, {} documents missing",
            summary.report.skipped,
            summary.missing_documents.len()
        );
    }
    Ok(())
}
