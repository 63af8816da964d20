use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use arxrag_core::Config;
use arxrag_core::prompt::basic_rag_prompt;
use arxrag_crawler::Crawler;
use arxrag_gateway::GatewayServer;
use arxrag_memory::{
    CategoryDataset, DocumentLoader, Embedder, IngestionPipeline, OllamaEmbedder, QdrantOps,
    Retriever, SplitterConfig, TextSplitter, VectorStore,
};
use clap::{Parser, Subcommand};
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "arxrag")]
#[command(about = "arXiv category crawler and retrieval sandbox", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML config (falls back to ARXRAG_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover categories, write manifests and download every PDF
    Crawl {
        /// Only crawl these category labels (comma separated)
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Output directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Load the crawled dataset, chunk, embed and upsert into Qdrant
    Ingest {
        /// Dataset directory written by `crawl`
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Drop the collection before writing
        #[arg(long)]
        recreate: bool,
    },

    /// Similarity search over the ingested collection
    Search {
        query: String,

        #[arg(short, long, default_value = "5")]
        limit: u64,

        /// Restrict results to one category
        #[arg(short, long)]
        category: Option<String>,

        /// Print the RAG prompt built from the hits instead of the hits
        #[arg(long)]
        prompt: bool,
    },

    /// Run the HTTP test endpoint until ctrl-c
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);
    let mut config = Config::load(&config_path)?;

    match cli.command {
        Commands::Crawl {
            categories,
            data_dir,
        } => {
            if !categories.is_empty() {
                config.crawler.categories = categories;
            }
            if let Some(dir) = data_dir {
                config.crawler.data_dir = dir;
            }
            config.validate()?;
            run_crawl(config).await
        }
        Commands::Ingest { data_dir, recreate } => {
            if let Some(dir) = data_dir {
                config.crawler.data_dir = dir;
            }
            config.ingest.recreate |= recreate;
            config.validate()?;
            run_ingest(&config).await
        }
        Commands::Search {
            query,
            limit,
            category,
            prompt,
        } => {
            config.validate()?;
            run_search(&config, &query, limit, category.as_deref(), prompt).await
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.gateway.port = port;
            }
            config.validate()?;
            run_serve(&config).await
        }
    }
}

fn resolve_config_path(cli: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli {
        return path;
    }
    if let Ok(path) = std::env::var("ARXRAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_crawl(config: Config) -> anyhow::Result<()> {
    let crawler =
        Crawler::from_config(config.crawler).context("failed to build the crawl HTTP client")?;
    let report = crawler.run().await.context("crawl aborted")?;

    let failed = report.failed_categories();
    if !failed.is_empty() {
        tracing::warn!(categories = ?failed, "some categories failed");
    }
    println!(
        "{} articles, {} downloaded, {} failed downloads, {} failed categories",
        report.total_articles(),
        report.total_downloaded(),
        report.total_failed_downloads(),
        failed.len()
    );
    Ok(())
}

fn embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder = OllamaEmbedder::new(&config.embedding.url, config.embedding.model.clone())
        .context("invalid embedding endpoint")?;
    Ok(Arc::new(embedder))
}

fn vector_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    let store = QdrantOps::new(&config.store.url)
        .map_err(|e| anyhow::anyhow!("failed to create Qdrant client: {e}"))?
        .with_search_ef(config.store.search_ef);
    Ok(Arc::new(store))
}

#[cfg(feature = "pdf")]
fn document_loader() -> anyhow::Result<Box<dyn DocumentLoader>> {
    Ok(Box::new(arxrag_memory::PdfLoader::default()))
}

#[cfg(not(feature = "pdf"))]
fn document_loader() -> anyhow::Result<Box<dyn DocumentLoader>> {
    bail!("ingest needs PDF support; rebuild with `--features pdf`")
}

async fn run_ingest(config: &Config) -> anyhow::Result<()> {
    let loader = document_loader()?;
    let data_dir = &config.crawler.data_dir;
    let dataset = CategoryDataset::load(data_dir, loader.as_ref())
        .await
        .with_context(|| format!("failed to load dataset from {}", data_dir.display()))?;
    if dataset.documents.is_empty() {
        bail!("no documents found under {}", data_dir.display());
    }

    let splitter = TextSplitter::new(SplitterConfig::from(&config.ingest));
    let pipeline = IngestionPipeline::new(
        vector_store(config)?,
        embedder(config)?,
        config.store.collection.clone(),
    )
    .with_hnsw(config.store.hnsw_m, config.store.hnsw_ef_construct)
    .with_batch_size(config.ingest.batch_size)
    .with_recreate(config.ingest.recreate);

    let report = pipeline
        .ingest_documents(&splitter, &dataset.documents)
        .await
        .context("ingestion failed")?;
    println!(
        "{} documents, {} chunks in {} batches into '{}'",
        dataset.summary.documents, report.chunks, report.batches, config.store.collection
    );
    Ok(())
}

async fn run_search(
    config: &Config,
    query: &str,
    limit: u64,
    category: Option<&str>,
    prompt: bool,
) -> anyhow::Result<()> {
    let retriever = Retriever::new(
        vector_store(config)?,
        embedder(config)?,
        config.store.collection.clone(),
    );
    let hits = retriever
        .search(query, limit, category)
        .await
        .context("search failed")?;

    if prompt {
        let documents: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
        let messages = basic_rag_prompt(query, &documents);
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("no results");
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} ({}) {}",
            rank + 1,
            hit.score,
            hit.title.as_deref().unwrap_or("untitled"),
            hit.category.as_deref().unwrap_or("-"),
            hit.link.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn run_serve(config: &Config) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::from_config(&config.gateway, embedder(config)?, shutdown_rx)
        .serve()
        .await
        .context("gateway failed")
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use serial_test::serial;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_search_with_filter() {
        let cli = Cli::try_parse_from([
            "arxrag", "search", "graph networks", "-l", "3", "-c", "cs", "--prompt",
        ])
        .unwrap();
        let Commands::Search {
            query,
            limit,
            category,
            prompt,
        } = cli.command
        else {
            panic!("expected search");
        };
        assert_eq!(query, "graph networks");
        assert_eq!(limit, 3);
        assert_eq!(category.as_deref(), Some("cs"));
        assert!(prompt);
    }

    #[test]
    fn parse_crawl_categories() {
        let cli = Cli::try_parse_from(["arxrag", "crawl", "--categories", "cs,math"]).unwrap();
        let Commands::Crawl { categories, .. } = cli.command else {
            panic!("expected crawl");
        };
        assert_eq!(categories, vec!["cs", "math"]);
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["arxrag", "serve", "--config", "/etc/arxrag.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/arxrag.toml")));
    }

    #[test]
    #[serial]
    fn config_path_precedence() {
        unsafe { std::env::remove_var("ARXRAG_CONFIG") };
        assert_eq!(
            resolve_config_path(None),
            PathBuf::from("config/default.toml")
        );

        unsafe { std::env::set_var("ARXRAG_CONFIG", "/tmp/env.toml") };
        assert_eq!(resolve_config_path(None), PathBuf::from("/tmp/env.toml"));
        assert_eq!(
            resolve_config_path(Some(PathBuf::from("cli.toml"))),
            PathBuf::from("cli.toml")
        );
        unsafe { std::env::remove_var("ARXRAG_CONFIG") };
    }

    #[test]
    fn shipped_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let text = std::fs::read_to_string(path).unwrap();
        let config: Config = toml::from_str(&text).unwrap();
        config.validate().unwrap();
    }
}
