//! HTTP test endpoint: health, an embedding sanity probe and embed-on-demand.

mod config;
mod error;
mod handlers;
mod router;
mod server;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::GatewayServer;
