use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsearch_core::persist::{self, DataPaths};
use docsearch_core::{DocId, EngineConfig, Payload, QueryResult, Request, SearchEngine, DEFAULT_SNIPPET_RADIUS};
use serde_json::Value;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "Query a precomputed positional inverted index", long_about = None)]
struct Cli {
    /// Data directory holding inverted_index.txt and its companions
    #[arg(long, default_value = "./data", global = true)]
    data_dir: String,
    /// Normalize index and query terms with the Porter stemmer
    #[arg(long, default_value_t = false, global = true)]
    stem: bool,
    /// Tokens shown on each side of a snippet's anchor
    #[arg(long, default_value_t = DEFAULT_SNIPPET_RADIUS, global = true)]
    snippet_size: usize,
    /// Also write the results as a JSON array to this file
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Documents containing an exact word
    Word { word: String },
    /// Terms recorded for a document, with frequencies
    Doc { doc_id: DocId },
    /// Documents containing every word of a free-text query
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Raw index entries for a word
    PrintWord { word: String },
    /// Raw index entries for a document
    PrintDoc { doc_id: DocId },
    /// Run every -SEARCH=/-PRINT_INDEX= line of a query file
    Batch {
        #[arg(long)]
        query_file: PathBuf,
    },
    /// Interactive prompt
    Repl,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    let paths = DataPaths::new(&cli.data_dir);
    let config = EngineConfig { stemming: cli.stem, snippet_radius: cli.snippet_size };
    let engine = persist::load_engine(&paths, config)
        .with_context(|| format!("loading data directory {}", cli.data_dir))?;

    let interactive = matches!(cli.command, Commands::Repl);
    let results = match cli.command {
        Commands::Word { word } => vec![engine.run(&Request::Word(word))],
        Commands::Doc { doc_id } => vec![engine.run(&Request::Document(doc_id))],
        Commands::Query { text } => vec![engine.run(&Request::Query(text.join(" ")))],
        Commands::PrintWord { word } => vec![engine.run(&Request::PrintWord(word))],
        Commands::PrintDoc { doc_id } => vec![engine.run(&Request::PrintDocument(doc_id))],
        Commands::Batch { query_file } => {
            let lines = persist::read_queries(&query_file)?;
            tracing::info!(lines = lines.len(), file = %query_file.display(), "running query file");
            engine.run_batch(&lines)
        }
        Commands::Repl => repl(&engine)?,
    };

    let rendered: Vec<Value> = results.iter().map(|r| r.to_json(engine.documents())).collect();
    if !interactive {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for value in &rendered {
            writeln!(out, "{value}")?;
        }
    }
    if let Some(path) = &cli.output {
        fs::write(path, serde_json::to_string_pretty(&rendered)?)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(results = rendered.len(), path = %path.display(), "wrote results");
    }

    if config.stemming {
        persist::save_stemming_dictionary(&paths.stemming_dictionary(), engine.cache())?;
    }
    Ok(())
}

/// Read requests from stdin until `exit` or end of input, printing each
/// result as it comes. Returns everything answered, for `--output`.
fn repl(engine: &SearchEngine) -> Result<Vec<QueryResult>> {
    println!("Enter your query text (type 'exit' to quit).");
    println!("Examples:");
    println!("  machine learning retrieval");
    println!("  doc 12          (lookup by document id)");
    println!("  word banana     (lookup exact word entry)");
    println!("  -SEARCH=QUERY neural networks");
    println!();

    let mut answered = Vec::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            println!("Exiting...");
            break;
        }
        match Request::parse_interactive(line) {
            Ok(request) => {
                let result = engine.run(&request);
                display(engine, &result);
                answered.push(result);
            }
            Err(err) => println!("Invalid query: {err}"),
        }
    }
    Ok(answered)
}

fn display(engine: &SearchEngine, result: &QueryResult) {
    println!("{}", result.label);
    match result.payload() {
        None => println!("No results found."),
        Some(Payload::Snippets(hits)) => {
            for hit in hits {
                let name = engine.documents().name(hit.doc_id).unwrap_or_else(|| "(unknown)".to_string());
                println!("Document ID: {}  |  {}", hit.doc_id, name);
                match &hit.snippet {
                    Some(text) if !text.is_empty() => println!("Snippet: {text}"),
                    _ => println!("Unable to generate snippet."),
                }
            }
        }
        Some(Payload::Frequencies { terms, .. }) => {
            for t in terms {
                println!("{}: {}", t.term, t.frequency);
            }
        }
        Some(Payload::Positions { rows, .. }) => {
            for row in rows {
                println!("{}: {:?}", row.term, row.positions);
            }
        }
    }
}
