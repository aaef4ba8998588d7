use clap::Subcommand;
use eyre::{eyre, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tiercache::{
    CacheConfig, CacheConfigLoader, CacheOrchestrator, DiskTierConfig, Metadata,
    OrchestratorStats,
};

#[derive(Subcommand)]
pub enum Commands {
    /// Run a sample workload and print the resulting statistics
    Demo {
        /// Number of entries to write and read back
        #[arg(long, default_value = "100")]
        entries: usize,
    },
    /// Show cache statistics
    Stats {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear all cache entries
    Clear,
    /// Print the value stored under a key
    Get { key: String },
    /// Store a value under a key
    Put {
        key: String,
        value: String,
        /// Expire the entry after this many seconds
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Drop dangling index rows and orphaned payload files
    Reconcile,
}

/// Defaults, then the optional file, then `TIERCACHE_*`, then `--dir`
pub fn load_config(file: Option<&Path>, dir: Option<PathBuf>) -> Result<CacheConfig> {
    let (mut config, source) = CacheConfigLoader::load(file).wrap_err("loading cache configuration")?;
    tracing::debug!(?source, "configuration loaded");

    if let Some(dir) = dir {
        match config.disk.as_mut() {
            Some(disk) => disk.directory = dir,
            None => config.disk = Some(DiskTierConfig::new(dir)),
        }
    }
    Ok(config)
}

impl Commands {
    pub fn execute(self, config: CacheConfig) -> Result<()> {
        let cache: CacheOrchestrator<String> =
            CacheOrchestrator::new(config).wrap_err("opening cache")?;

        match self {
            Commands::Demo { entries } => run_demo(&cache, entries),
            Commands::Stats { json } => {
                let stats = cache.stats();
                if json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    print_report(&stats);
                }
                Ok(())
            }
            Commands::Clear => {
                cache.clear();
                tracing::info!("✓ Cache cleared successfully");
                Ok(())
            }
            Commands::Get { key } => match cache.get(&key) {
                Some(value) => {
                    println!("{value}");
                    Ok(())
                }
                None => Err(eyre!("no entry for key '{key}'")),
            },
            Commands::Put {
                key,
                value,
                ttl_secs,
            } => {
                let ttl = ttl_secs.map(Duration::from_secs);
                let outcome = cache.put_detailed(&key, value, ttl, Metadata::new());
                if !outcome.any() {
                    return Err(eyre!("no tier accepted key '{key}'"));
                }
                tracing::info!(memory = outcome.memory, disk = outcome.disk, "✓ Stored '{key}'");
                Ok(())
            }
            Commands::Reconcile => {
                let report = cache.reconcile()?;
                tracing::info!(
                    "✓ Removed {} orphaned files and {} dangling records",
                    report.orphan_files_removed,
                    report.dangling_records_removed
                );
                Ok(())
            }
        }
    }
}

fn run_demo(cache: &CacheOrchestrator<String>, entries: usize) -> Result<()> {
    cache.start_warming();
    tracing::info!(entries, "Testing cache performance");

    let ttl = Some(Duration::from_secs(3600));
    for i in 0..entries {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "demo".to_string());
        cache.put(&format!("test_key_{i}"), format!("test_value_{i}").repeat(100), ttl, metadata);
    }

    let hits = (0..entries)
        .filter(|i| cache.get(&format!("test_key_{i}")).is_some())
        .count();

    print_report(&cache.stats());
    cache.stop_warming();

    if hits != entries {
        return Err(eyre!("only {hits} of {entries} entries were read back"));
    }
    Ok(())
}

fn print_report(stats: &OrchestratorStats) {
    let overall = &stats.overall;
    println!("Total requests:    {}", overall.total_requests);
    println!("Overall hit rate:  {:.2}%", overall.hit_rate * 100.0);
    println!("Memory hit rate:   {:.2}%", overall.memory_hit_rate * 100.0);
    println!("Disk hit rate:     {:.2}%", overall.disk_hit_rate * 100.0);
    println!("Avg lookup time:   {:.2}µs", overall.avg_latency_us);

    println!("\nMemory tier:");
    println!("  Entries:   {}", stats.memory.entry_count);
    println!("  Size:      {:.1} KB", stats.memory.size_bytes as f64 / 1024.0);
    println!("  Hit rate:  {:.2}%", stats.memory.hit_rate * 100.0);
    println!("  Evictions: {}", stats.memory.evictions);

    match &stats.disk {
        Some(disk) => {
            println!("\nDisk tier:");
            println!("  Entries:   {}", disk.entry_count);
            println!("  Size:      {:.1} KB", disk.size_bytes as f64 / 1024.0);
            println!("  Hit rate:  {:.2}%", disk.hit_rate * 100.0);
            println!("  Errors:    {}", disk.errors);
        }
        None => println!("\nDisk tier: disabled"),
    }

    println!("\nCache warming:");
    println!("  Active:            {}", stats.warming.active);
    println!("  Patterns tracked:  {}", stats.warming.patterns_tracked);
    println!("  Candidates:        {}", stats.warming.warming_candidates);
    println!("  Warmed:            {}", stats.warming.total_warmed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_flag_overrides_configured_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(None, Some(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(config.disk.unwrap().directory, temp_dir.path());
    }

    #[test]
    fn test_put_then_get_across_invocations() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(None, Some(temp_dir.path().to_path_buf())).unwrap();

        Commands::Put {
            key: "greeting".to_string(),
            value: "hello".to_string(),
            ttl_secs: None,
        }
        .execute(config.clone())
        .unwrap();

        let cache: CacheOrchestrator<String> = CacheOrchestrator::new(config.clone()).unwrap();
        assert_eq!(cache.get("greeting"), Some("hello".to_string()));
        drop(cache);

        assert!(Commands::Get {
            key: "missing".to_string()
        }
        .execute(config)
        .is_err());
    }

    #[test]
    fn test_demo_reads_back_every_entry() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(None, Some(temp_dir.path().to_path_buf())).unwrap();
        Commands::Demo { entries: 20 }.execute(config).unwrap();
    }
}
