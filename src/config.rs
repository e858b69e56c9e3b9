use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::association::RelationRef;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monarch: MonarchConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub vocabulary: Vocabulary,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub secondary: SecondaryConfig,
}

/// Monarch association API client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonarchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Page size for discovery fetches
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Page size for the final closed-neighbourhood fetch
    #[serde(default = "default_closed_rows")]
    pub closed_rows: usize,
    #[serde(default = "default_attempts")]
    pub attempts: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum number of ids queried concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Response cache entries; 0 disables the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for MonarchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            rows: default_rows(),
            closed_rows: default_closed_rows(),
            attempts: default_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl MonarchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://api.monarchinitiative.org/api".to_string()
}

fn default_rows() -> usize {
    2000
}

fn default_closed_rows() -> usize {
    1000
}

fn default_attempts() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

fn default_cache_capacity() -> usize {
    4096
}

/// Seeds and depth of the discovery run
#[derive(Debug, Clone, Deserialize)]
pub struct TraversalConfig {
    #[serde(default = "default_seeds")]
    pub seeds: Vec<String>,
    #[serde(default = "default_depth")]
    pub depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            seeds: default_seeds(),
            depth: default_depth(),
        }
    }
}

fn default_seeds() -> Vec<String> {
    vec!["MONDO:0010679".to_string(), "HGNC:2928".to_string()]
}

fn default_depth() -> usize {
    2
}

/// Semantic-group names and relation descriptors shared by traversal,
/// restructuring and the secondary joins.
///
/// Built once and handed to each component; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub gene: String,
    pub disease: String,
    pub phenotype: String,
    pub drug: String,
    pub taxon: String,
    pub publication: String,
    /// Relation ids meaning "in orthology relationship with"
    pub orthology_relations: Vec<String>,
    /// Relation of synthesized gene -> taxon edges
    pub found_in: RelationRef,
    pub drug_treats: RelationRef,
    pub drug_targets: RelationRef,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            gene: "gene".to_string(),
            disease: "disease".to_string(),
            phenotype: "phenotype".to_string(),
            drug: "drug".to_string(),
            taxon: "taxon".to_string(),
            publication: "publication".to_string(),
            orthology_relations: vec!["RO:HOM0000017".to_string(), "RO:HOM0000020".to_string()],
            found_in: RelationRef::new("CustomRO:FI", Some("found in"), None),
            drug_treats: RelationRef::new("CustomRO:DC", Some("is substance that treats"), None),
            drug_targets: RelationRef::new("CustomRO:TTD", Some("targets"), None),
        }
    }
}

impl Vocabulary {
    /// Groups whose associations never enter a fetch result.
    pub fn excluded_groups(&self) -> Vec<String> {
        vec![self.publication.clone()]
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_folder")]
    pub folder: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: default_output_folder(),
        }
    }
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("output")
}

/// Secondary tabular sources; a missing path disables that join
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecondaryConfig {
    pub drug_disease: Option<PathBuf>,
    pub phenotype_matches: Option<PathBuf>,
    pub drug_targets: Option<PathBuf>,
    /// Tab-separated `from`/`to` table mapping target accessions to graph ids
    pub target_id_map: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in BIOKG_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory (defaults are used when absent)
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config = match std::env::var("BIOKG_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new("config.toml");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    log::info!("No config.toml found, using defaults");
                    Config::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file without validating it
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Invalid TOML configuration")?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.monarch.rows == 0 || self.monarch.closed_rows == 0 {
            anyhow::bail!("monarch.rows and monarch.closed_rows must be greater than 0");
        }

        if self.monarch.attempts == 0 {
            anyhow::bail!("monarch.attempts must be at least 1");
        }

        if self.monarch.concurrency == 0 {
            anyhow::bail!("monarch.concurrency must be greater than 0");
        }

        if self.traversal.seeds.is_empty() {
            anyhow::bail!("traversal.seeds must contain at least one identifier");
        }

        if self.traversal.depth > 5 {
            anyhow::bail!(
                "traversal.depth must be at most 5 (got {}); each level multiplies API calls",
                self.traversal.depth
            );
        }

        if self.vocabulary.orthology_relations.is_empty() {
            anyhow::bail!("vocabulary.orthology_relations must not be empty");
        }

        Ok(())
    }

    /// Get output folder
    pub fn output_folder(&self) -> &Path {
        &self.output.folder
    }
}
