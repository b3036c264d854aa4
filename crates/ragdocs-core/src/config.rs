//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `OPENAI_API_KEY` + `RAG_*` env vars (later layers win). Provides helpers
//! to expand `~` and `${VAR}` and to resolve relative paths against a known
//! base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::data_processor::ChunkingConfig;
use crate::error::{Error, Result};

pub const DEFAULT_EMBED_MODEL: &str = "all-MiniLM-L6-v2";

/// Every tunable of the pipeline, flattened so that `RAG_<KEY>` maps onto a
/// field directly (`RAG_INDEX_PATH` -> `index_path`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSettings {
    /// LanceDB directory holding the vector table.
    pub index_path: PathBuf,
    /// JSON file holding chunk texts and provenance, id-aligned with the index.
    pub meta_path: PathBuf,
    pub embed_model: String,
    /// Root under which `<embed_model>/` model directories live.
    pub models_dir: PathBuf,
    pub fake_embeddings: bool,
    pub device: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub chunk_size: usize,
    pub overlap: usize,
    pub default_top_k: usize,
    /// Row count from which an IVF-PQ index is trained instead of flat search.
    pub ann_min_rows: usize,
    pub host: String,
    pub port: u16,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("data/lancedb"),
            meta_path: PathBuf::from("data/metadata.json"),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            models_dir: PathBuf::from("models"),
            fake_embeddings: false,
            device: "cpu".to_string(),
            openai_api_key: None,
            openai_base_url: None,
            llm_model: "gpt-4o-mini".to_string(),
            llm_max_tokens: 256,
            chunk_size: 150,
            overlap: 30,
            default_top_k: 4,
            ann_min_rows: 10_000,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl RagSettings {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig { chunk_size: self.chunk_size, overlap: self.overlap }
    }

    /// The generation credential, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking().validate()?;
        if self.default_top_k == 0 {
            return Err(Error::InvalidConfig("default_top_k must be positive".into()));
        }
        if self.embed_model.trim().is_empty() {
            return Err(Error::InvalidConfig("embed_model must not be empty".into()));
        }
        Ok(())
    }

    fn expand_paths(mut self) -> Self {
        self.index_path = expand_path(self.index_path.to_string_lossy());
        self.meta_path = expand_path(self.meta_path.to_string_lossy());
        self.models_dir = expand_path(self.models_dir.to_string_lossy());
        self
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(RagSettings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::raw().only(&["OPENAI_API_KEY"]))
            .merge(Env::prefixed("RAG_"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract the typed settings with paths expanded.
    pub fn settings(&self) -> anyhow::Result<RagSettings> {
        let settings: RagSettings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        Ok(settings.expand_paths())
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        settings.validate()?;
        if matches!(env, "prod" | "production") && settings.fake_embeddings {
            anyhow::bail!("fake_embeddings must not be enabled in production");
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
