use anyhow::Result;
use clap::Parser;
use docsearch_core::persist::{self, DataPaths};
use docsearch_core::{EngineConfig, DEFAULT_SNIPPET_RADIUS};
use server::{load_state, router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Data directory path
    #[arg(long, default_value = "./data")]
    data_dir: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 3003)]
    port: u16,
    /// Normalize index and query terms with the Porter stemmer
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Tokens shown on each side of a snippet's anchor
    #[arg(long, default_value_t = DEFAULT_SNIPPET_RADIUS)]
    snippet_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = EngineConfig { stemming: args.stem, snippet_radius: args.snippet_size };
    let state = load_state(&args.data_dir, config)?;
    let app = router(state.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    if config.stemming {
        let paths = DataPaths::new(&args.data_dir);
        persist::save_stemming_dictionary(&paths.stemming_dictionary(), state.cache())?;
    }
    tracing::info!("server stopped");
    Ok(())
}
