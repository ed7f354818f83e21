//! Configuration management for pdfchat.
//!
//! Settings are layered, later sources winning:
//! - built-in defaults
//! - the YAML config file (`.pdfchat/config.yaml` in the workspace)
//! - environment variables
//! - command-line flags (`with_overrides`)
//!
//! All durable state (vector index, saved uploads, upload log) lives under
//! the workspace's `.pdfchat/` directory unless configured otherwise.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".pdfchat";

/// Embedding providers `create_provider` knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Language model providers `create_client` knows how to build.
pub const KNOWN_LLM_PROVIDERS: [&str; 1] = ["ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .pdfchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub index: IndexConfig,
    pub upload: UploadConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
}

/// Chunk sizing, in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// How many chunks a question retrieves and how many become citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub citation_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            citation_limit: 3,
        }
    }
}

/// Where the vector index lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexConfig {
    /// Index directory; relative paths resolve against the workspace.
    /// Defaults to `.pdfchat/index`.
    pub location: Option<PathBuf>,

    /// Name of the table holding the chunks.
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            location: None,
            collection: "documents".to_string(),
        }
    }
}

/// Upload storage and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadConfig {
    /// Directory saved PDFs are copied into. Defaults to `.pdfchat/uploads`.
    pub dir: Option<PathBuf>,

    /// Largest accepted upload, in bytes.
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Embedding backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier; the provider's default when unset
    pub model: Option<String>,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Base URL for HTTP providers
    pub endpoint: Option<String>,

    /// Maximum texts per embedding call
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: None,
            dimensions: 384,
            endpoint: None,
            batch_size: 64,
        }
    }
}

/// Language model used by `ask --llm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,

    /// Base URL of the provider's API
    pub endpoint: Option<String>,

    pub temperature: Option<f32>,

    /// Cap on generated tokens
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            temperature: Some(0.7),
            max_tokens: Some(512),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    chunking: Option<ChunkingConfig>,
    retrieval: Option<RetrievalConfig>,
    index: Option<IndexConfig>,
    upload: Option<UploadConfig>,
    embedding: Option<EmbeddingConfig>,
    llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            index: IndexConfig::default(),
            upload: UploadConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `PDFCHAT_WORKSPACE`: workspace path
    /// - `PDFCHAT_CONFIG`: config file path
    /// - `PDFCHAT_INDEX_DIR`: vector index directory
    /// - `CHUNK_SIZE`, `CHUNK_OVERLAP`: chunk sizing
    /// - `PDFCHAT_EMBEDDING_PROVIDER`, `PDFCHAT_EMBEDDING_MODEL`: embedding backend
    /// - `OLLAMA_URL`: embedding and LLM endpoint
    /// - `PDFCHAT_LLM_MODEL`: model used by `ask --llm`
    /// - `RUST_LOG`: log level
    /// - `NO_COLOR`: disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], but with workspace and config file given
    /// explicitly (command-line flags) so the right YAML file is read.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::load_from(workspace, config_file, &lookup)
    }

    fn load_from(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(ws) = workspace.or_else(|| env("PDFCHAT_WORKSPACE").map(PathBuf::from)) {
            config.workspace = ws;
        }
        config.config_file = config_file.or_else(|| env("PDFCHAT_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.state_dir().join("config.yaml"));

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env(env)?;
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&mut self, contents: &str) -> Result<(), serde_yaml::Error> {
        let file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            self.workspace = PathBuf::from(path);
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        if let Some(chunking) = file.chunking {
            self.chunking = chunking;
        }
        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }
        if let Some(index) = file.index {
            self.index = index;
        }
        if let Some(upload) = file.upload {
            self.upload = upload;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(llm) = file.llm {
            self.llm = llm;
        }

        Ok(())
    }

    fn apply_env(&mut self, env: &dyn Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(size) = env("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_env_number("CHUNK_SIZE", &size)?;
        }
        if let Some(overlap) = env("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_env_number("CHUNK_OVERLAP", &overlap)?;
        }
        if let Some(dir) = env("PDFCHAT_INDEX_DIR") {
            self.index.location = Some(PathBuf::from(dir));
        }
        if let Some(provider) = env("PDFCHAT_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = env("PDFCHAT_EMBEDDING_MODEL") {
            self.embedding.model = Some(model);
        }
        if let Some(url) = env("OLLAMA_URL") {
            self.embedding.endpoint = Some(url.clone());
            self.llm.endpoint = Some(url);
        }
        if let Some(model) = env("PDFCHAT_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(level) = env("RUST_LOG") {
            self.log_level = Some(level);
        }
        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }
        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over the config file and environment.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Path to the `.pdfchat` directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the `.pdfchat` directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Directory holding the vector index.
    pub fn index_dir(&self) -> PathBuf {
        self.resolve(self.index.location.as_deref(), "index")
    }

    /// Directory saved uploads are written to.
    pub fn uploads_dir(&self) -> PathBuf {
        self.resolve(self.upload.dir.as_deref(), "uploads")
    }

    /// Append-only log of ingested documents.
    pub fn upload_log_path(&self) -> PathBuf {
        self.state_dir().join("uploads.jsonl")
    }

    fn resolve(&self, configured: Option<&Path>, default_leaf: &str) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.workspace.join(path),
            None => self.state_dir().join(default_leaf),
        }
    }

    /// Check that the settings are usable together.
    pub fn validate(&self) -> AppResult<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than 0".to_string()));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be greater than 0".to_string()));
        }

        if self.index.collection.trim().is_empty() {
            return Err(AppError::Config("index collection name is empty".to_string()));
        }

        if self.upload.max_file_size == 0 {
            return Err(AppError::Config("maxFileSize must be greater than 0".to_string()));
        }

        let provider = self.embedding.provider.as_str();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(AppError::Config("embedding dimensions must be greater than 0".to_string()));
        }

        let provider = self.llm.provider.as_str();
        if !KNOWN_LLM_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("llm model is empty".to_string()));
        }

        Ok(())
    }
}

fn parse_env_number(key: &str, value: &str) -> AppResult<usize> {
    value.trim().parse().map_err(|_| {
        AppError::Config(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}
