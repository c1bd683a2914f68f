use std::path::PathBuf;

use advisor_common::catalog::Catalog;
use advisor_common::openai::OpenAiClientConfig;

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON catalog to serve instead of the bundled one.
    pub catalog_path: Option<PathBuf>,
    /// Serve MCP over TCP on this address instead of stdio.
    pub tcp_listen_addr: Option<String>,
    pub llm: OpenAiClientConfig,
}

impl Config {
    /// Optional:
    /// - `ADVISOR_CATALOG_PATH`: JSON array of products (must exist when set)
    /// - `MCP_TCP_LISTEN_ADDR`: e.g. "127.0.0.1:7400"
    /// - `ADVISOR_LLM_*`: see [`OpenAiClientConfig::from_env`]
    pub fn from_env() -> Result<Self, AppError> {
        let catalog_path = std::env::var("ADVISOR_CATALOG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        if let Some(path) = &catalog_path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "catalog file not found: {}",
                    path.display()
                )));
            }
        }

        let llm = OpenAiClientConfig::from_env();
        if llm.base_url.is_empty() {
            return Err(AppError::Config(
                "ADVISOR_LLM_BASE_URL must not be empty".to_string(),
            ));
        }

        Ok(Self {
            catalog_path,
            tcp_listen_addr: std::env::var("MCP_TCP_LISTEN_ADDR").ok(),
            llm,
        })
    }

    pub fn load_catalog(&self) -> Result<Catalog, AppError> {
        let catalog = match &self.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin()?,
        };
        if catalog.is_empty() {
            return Err(AppError::Config("catalog has no products".to_string()));
        }
        Ok(catalog)
    }
}
