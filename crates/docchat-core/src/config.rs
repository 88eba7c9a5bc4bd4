//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + an optional
//! explicit file + `APP_*` env vars (`__` separates nested keys, so
//! `APP_RETRIEVAL__TOP_K=8` sets `retrieval.top_k`). The API credential is
//! read separately through [`Credentials::from_env`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], with `extra` merged after the env-specific file.
    pub fn load_with(extra: Option<&Path>) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        if let Some(path) = extra {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the typed settings.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be at least 1".into()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be at least 1".into()));
        }
        if self.index.dir.trim().is_empty() {
            return Err(Error::InvalidConfig("index.dir must not be empty".into()));
        }
        Ok(())
    }

    /// Index location with `~`/`$VAR` expanded, relative to the working directory.
    pub fn index_location(&self) -> PathBuf {
        let base = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        resolve_with_base(&base, &self.index.dir)
    }
}

/// Chunk size and overlap are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chunk_size: usize,
    pub overlap: usize,
    /// Coarsest first; `""` splits between characters.
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 10_000,
            overlap: 200,
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.max_chunk_size must be at least 1".into()));
        }
        if self.overlap >= self.max_chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_chunk_size ({})",
                self.overlap, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { dir: "docchat_index".to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Gemini,
    Hash,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub batch_size: usize,
    /// Output size of the `hash` provider; remote models report their own.
    pub dimension: usize,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Gemini,
            model: "models/embedding-001".to_string(),
            batch_size: 100,
            dimension: 768,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-pro".to_string(),
            temperature: 0.3,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Secret material supplied out-of-band.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
}

impl Credentials {
    /// Absence is fatal at startup, never a per-request error.
    pub fn from_env() -> Result<Self> {
        match env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self { api_key: key }),
            _ => Err(Error::MissingCredential(API_KEY_VAR.to_string())),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("api_key", &"<redacted>").finish()
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
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_application() {
        let s = Settings::default();
        assert_eq!(s.chunking.max_chunk_size, 10_000);
        assert_eq!(s.chunking.overlap, 200);
        assert_eq!(s.chunking.separators, vec!["\n\n", "\n", " ", ""]);
        assert_eq!(s.retrieval.top_k, 4);
        assert_eq!(s.embedding.model, "models/embedding-001");
        assert_eq!(s.generation.model, "gemini-pro");
        assert!((s.generation.temperature - 0.3).abs() < f32::EPSILON);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut s = Settings::default();
        s.chunking.overlap = s.chunking.max_chunk_size;
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
        s.chunking.max_chunk_size = 0;
        s.chunking.overlap = 0;
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut s = Settings::default();
        s.retrieval.top_k = 0;
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn settings_merge_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [chunking]
                max_chunk_size = 500
                overlap = 50

                [embedding]
                provider = "hash"
                "#,
            )?;
            jail.set_env("APP_RETRIEVAL__TOP_K", "7");
            jail.set_env("APP_INDEX__DIR", "idx");

            let cfg = Config::load().map_err(|e| e.to_string())?;
            let s = cfg.settings().map_err(|e| e.to_string())?;
            assert_eq!(s.chunking.max_chunk_size, 500);
            assert_eq!(s.chunking.overlap, 50);
            assert_eq!(s.chunking.separators.len(), 4, "unset keys keep defaults");
            assert_eq!(s.embedding.provider, EmbeddingProviderKind::Hash);
            assert_eq!(s.retrieval.top_k, 7);
            assert!(s.index_location().ends_with("idx"));
            assert_eq!(cfg.get::<usize>("retrieval.top_k").map_err(|e| e.to_string())?, 7);
            Ok(())
        });
    }

    #[test]
    fn invalid_file_values_surface_as_invalid_config() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[chunking]\nmax_chunk_size = 10\noverlap = 20\n")?;
            let cfg = Config::load().map_err(|e| e.to_string())?;
            assert!(matches!(cfg.settings(), Err(Error::InvalidConfig(_))));
            Ok(())
        });
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        assert!(Config::load_with(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let base = Path::new("/base");
        assert_eq!(resolve_with_base(base, "/abs/idx"), PathBuf::from("/abs/idx"));
        assert_eq!(resolve_with_base(base, "rel/idx"), PathBuf::from("/base/rel/idx"));
    }
}
