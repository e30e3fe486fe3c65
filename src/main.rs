use anyhow::{Context, Result};
use clap::Parser;
use linesearch::config::Config;
use linesearch::loader::LineLoader;
use linesearch::search::QueryEngine;
use linesearch::server;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "linesearch")]
#[command(about = "Index a line-delimited corpus and serve search over HTTP")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Corpus file, one record per line
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Index directory
    #[arg(long)]
    index: Option<PathBuf>,

    /// Documents per committed batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Maximum edit distance for fuzzy matching (0-2, 0 disables)
    #[arg(long)]
    fuzzy_distance: Option<u8>,

    /// Hits per response when a request gives no size
    #[arg(long)]
    page_size: Option<usize>,

    /// HTTP port
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Directory served at /
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(corpus) = self.corpus {
            config.corpus_path = corpus;
        }
        if let Some(index) = self.index {
            config.index_path = index;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(distance) = self.fuzzy_distance {
            config.fuzzy_distance = distance;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = Some(page_size);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(static_dir) = self.static_dir {
            config.static_dir = static_dir;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Cli::parse().into_config()?;

    tracing::info!("Starting linesearch");
    tracing::info!("  Corpus: {:?}", config.corpus_path);
    tracing::info!("  Index: {:?}", config.index_path);
    tracing::info!(
        "  Batch size: {}, fuzzy distance: {}",
        config.batch_size,
        config.fuzzy_distance
    );

    // Load before serving; a failed load never reaches the listener
    let loader = LineLoader::new(&config);
    let corpus = config.corpus_path.clone();
    let report = tokio::task::spawn_blocking(move || loader.load(&corpus))
        .await
        .context("Load task panicked")?
        .context("Failed to load corpus")?;

    if report.skipped {
        tracing::info!("Using existing index");
    }

    let engine = Arc::new(QueryEngine::new(&config));
    server::serve(&config, engine).await
}
