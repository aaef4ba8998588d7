//! Cache configuration management with precedence and validation
use crate::errors::{Error, RecoveryHint, Result, SerializationOp};
use crate::eviction::EvictionStrategy;
use crate::warming::WarmingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MIB: u64 = 1024 * 1024;

/// Memory tier limits and strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTierConfig {
    /// Maximum number of resident entries
    pub max_entries: usize,
    /// Maximum summed `size_bytes` of resident entries
    pub max_bytes: u64,
    pub strategy: EvictionStrategy,
}

impl Default for MemoryTierConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_bytes: 500 * MIB,
            strategy: EvictionStrategy::Lru,
        }
    }
}

/// Disk tier location, budget and compression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskTierConfig {
    /// Directory holding the index and payload files
    pub directory: PathBuf,
    /// Maximum summed payload bytes
    pub max_bytes: u64,
    pub compression_enabled: bool,
    /// zstd level (1-22)
    pub compression_level: i32,
}

impl Default for DiskTierConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("cache"),
            max_bytes: 5000 * MIB,
            compression_enabled: true,
            compression_level: crate::storage::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl DiskTierConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }
}

/// Complete configuration for a [`crate::CacheOrchestrator`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub memory: MemoryTierConfig,
    /// `None` runs memory-only
    pub disk: Option<DiskTierConfig>,
    pub warming: WarmingConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory: MemoryTierConfig::default(),
            disk: Some(DiskTierConfig::default()),
            warming: WarmingConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Reject settings that would make a tier or the warmer unusable
    pub fn validate(&self) -> Result<()> {
        if self.warming.interval_secs == 0 {
            return Err(Error::Configuration {
                message: "warming interval must be at least one second".to_string(),
                recovery_hint: RecoveryHint::UseDefault {
                    value: WarmingConfig::default().interval_secs.to_string(),
                },
            });
        }

        if self.warming.top_n_candidates == 0 {
            return Err(Error::Configuration {
                message: "warming top_n_candidates must be positive".to_string(),
                recovery_hint: RecoveryHint::UseDefault {
                    value: WarmingConfig::default().top_n_candidates.to_string(),
                },
            });
        }

        if let Some(disk) = &self.disk {
            if !(1..=22).contains(&disk.compression_level) {
                return Err(Error::Configuration {
                    message: format!(
                        "compression level {} is outside 1..=22",
                        disk.compression_level
                    ),
                    recovery_hint: RecoveryHint::UseDefault {
                        value: crate::storage::DEFAULT_COMPRESSION_LEVEL.to_string(),
                    },
                });
            }
        }

        Ok(())
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
}

/// Builder for creating cache configurations
#[derive(Debug, Clone, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_max_entries(mut self, max_entries: usize) -> Self {
        self.config.memory.max_entries = max_entries;
        self
    }

    pub fn with_memory_max_bytes(mut self, max_bytes: u64) -> Self {
        self.config.memory.max_bytes = max_bytes;
        self
    }

    pub fn with_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.config.memory.strategy = strategy;
        self
    }

    /// Enable the disk tier rooted at `directory`
    pub fn with_disk_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        let disk = self.config.disk.get_or_insert_with(DiskTierConfig::default);
        disk.directory = directory.into();
        self
    }

    pub fn with_disk_max_bytes(mut self, max_bytes: u64) -> Self {
        let disk = self.config.disk.get_or_insert_with(DiskTierConfig::default);
        disk.max_bytes = max_bytes;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        let disk = self.config.disk.get_or_insert_with(DiskTierConfig::default);
        disk.compression_enabled = enabled;
        self
    }

    /// Run without a disk tier
    pub fn without_disk(mut self) -> Self {
        self.config.disk = None;
        self
    }

    pub fn with_warming(mut self, warming: WarmingConfig) -> Self {
        self.config.warming = warming;
        self
    }

    pub fn with_warming_enabled(mut self, enabled: bool) -> Self {
        self.config.warming.enabled = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<CacheConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration loader that handles precedence: defaults, file, environment
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Load configuration with full precedence handling
    pub fn load(config_file: Option<&Path>) -> Result<(CacheConfig, ConfigSource)> {
        let mut config = CacheConfig::default();
        let mut source = ConfigSource::Default;

        if let Some(path) = config_file {
            config = Self::load_from_file(path)?;
            source = ConfigSource::ConfigFile(path.to_path_buf());
        }

        if Self::apply_env(&mut config, |name| std::env::var(name).ok())? {
            source = ConfigSource::EnvironmentVariable("TIERCACHE_*".to_string());
        }

        config.validate()?;
        Ok((config, source))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<CacheConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            operation: "read config file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: path.to_path_buf(),
            },
        })?;

        serde_json::from_str(&content).map_err(|e| Error::Serialization {
            key: path.display().to_string(),
            operation: SerializationOp::Decode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check config file syntax".to_string(),
            },
        })
    }

    /// Override fields from `TIERCACHE_*` variables; returns whether any applied
    pub(crate) fn apply_env(
        config: &mut CacheConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<bool> {
        let mut applied = false;

        if let Some(v) = lookup("TIERCACHE_MEMORY_MAX_ENTRIES") {
            config.memory.max_entries = parse_env("TIERCACHE_MEMORY_MAX_ENTRIES", &v)?;
            applied = true;
        }

        if let Some(v) = lookup("TIERCACHE_MEMORY_MAX_BYTES") {
            config.memory.max_bytes = parse_env("TIERCACHE_MEMORY_MAX_BYTES", &v)?;
            applied = true;
        }

        if let Some(v) = lookup("TIERCACHE_STRATEGY") {
            config.memory.strategy = v.parse()?;
            applied = true;
        }

        if let Some(v) = lookup("TIERCACHE_DISK_DIR") {
            config
                .disk
                .get_or_insert_with(DiskTierConfig::default)
                .directory = PathBuf::from(v);
            applied = true;
        }

        if let Some(v) = lookup("TIERCACHE_DISK_MAX_BYTES") {
            config
                .disk
                .get_or_insert_with(DiskTierConfig::default)
                .max_bytes = parse_env("TIERCACHE_DISK_MAX_BYTES", &v)?;
            applied = true;
        }

        if let Some(v) = lookup("TIERCACHE_COMPRESSION") {
            if let Some(disk) = config.disk.as_mut() {
                disk.compression_enabled = v.to_lowercase() == "true";
            }
            applied = true;
        }

        if let Some(v) = lookup("TIERCACHE_WARMING_ENABLED") {
            config.warming.enabled = v.to_lowercase() == "true";
            applied = true;
        }

        if let Some(v) = lookup("TIERCACHE_WARMING_INTERVAL_SECS") {
            config.warming.interval_secs = parse_env("TIERCACHE_WARMING_INTERVAL_SECS", &v)?;
            applied = true;
        }

        Ok(applied)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::Configuration {
        message: format!("{name} has invalid value '{value}'"),
        recovery_hint: RecoveryHint::Manual {
            instructions: format!("Unset {name} or give it a numeric value"),
        },
    })
}
