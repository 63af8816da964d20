//! Configuration loading and prompt templates shared by the arxrag binary.

pub mod config;
pub mod prompt;

pub use config::Config;
pub use prompt::{PromptMessage, Role, basic_rag_prompt};
