use serde::{Deserialize, Serialize};

pub use arxrag_crawler::CrawlerConfig;
pub use arxrag_gateway::GatewayConfig;
pub use arxrag_memory::{EmbeddingConfig, IngestConfig, StoreConfig};

/// Every section is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}
