//! Run configuration
//!
//! Built once at startup from environment variables (after `.env.local` has
//! been loaded by the binary) and handed to the job. Unset or blank
//! variables fall back to the defaults below.

use reality_core::{Platform, RealityError, RealityResult};
use reality_embedding::EmbeddingConfig;
use reality_kalshi::{KalshiConfig, RetryPolicy};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the dataset file
pub const DEFAULT_OUTPUT_PATH: &str = "output/markets.json";

/// Everything a run needs
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Dataset file, read for diffing and rewritten on success
    pub output_path: PathBuf,
    /// Tag stored in every record
    pub source: Platform,
    pub kalshi: KalshiConfig,
    pub embedding: EmbeddingConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            source: Platform::Kalshi,
            kalshi: KalshiConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Load from the process environment
    pub fn from_env() -> RealityResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names
    pub fn from_lookup<F>(lookup: F) -> RealityResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = var("REALITY_OUTPUT_PATH") {
            config.output_path = PathBuf::from(path);
        }

        if let Some(base_url) = var("KALSHI_API_BASE") {
            config.kalshi.base_url = base_url;
        }
        if let Some(raw) = var("KALSHI_PAGE_LIMIT") {
            config.kalshi.page_limit = parse_u32(&raw, "KALSHI_PAGE_LIMIT")?;
        }
        if let Some(raw) = var("KALSHI_TIMEOUT_SECS") {
            config.kalshi.request_timeout = parse_secs(&raw, "KALSHI_TIMEOUT_SECS")?;
        }

        let mut retry = RetryPolicy::default();
        if let Some(raw) = var("KALSHI_MAX_RETRIES") {
            retry.max_retries = parse_u32(&raw, "KALSHI_MAX_RETRIES")?;
        }
        if let Some(raw) = var("KALSHI_BASE_DELAY_SECS") {
            retry.base_delay = parse_secs(&raw, "KALSHI_BASE_DELAY_SECS")?;
        }
        config.kalshi.retry = retry;

        config.embedding.api_key = var("OPENAI_API_KEY");
        if let Some(model) = var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Some(raw) = var("EMBEDDING_DIMENSIONS") {
            config.embedding.dimensions = Some(parse_u32(&raw, "EMBEDDING_DIMENSIONS")?);
        }
        if let Some(raw) = var("EMBEDDING_BATCH_SIZE") {
            config.embedding.batch_size = parse_u32(&raw, "EMBEDDING_BATCH_SIZE")? as usize;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the settings, collecting every problem into one error
    pub fn validate(&self) -> RealityResult<()> {
        let mut issues: Vec<String> = Vec::new();

        if self.output_path.as_os_str().is_empty() {
            issues.push("output path must not be empty".into());
        }
        if let Err(e) = self.kalshi.validate() {
            issues.push(e.to_string());
        }
        if self.embedding.batch_size == 0 {
            issues.push("EMBEDDING_BATCH_SIZE must be > 0".into());
        }
        if self.embedding.dimensions == Some(0) {
            issues.push("EMBEDDING_DIMENSIONS must be > 0".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(RealityError::config(issues.join("; ")))
        }
    }
}

fn parse_u32(raw: &str, env_name: &str) -> RealityResult<u32> {
    raw.parse::<u32>()
        .map_err(|_| RealityError::config(format!("{env_name} must be an integer >= 0")))
}

fn parse_secs(raw: &str, env_name: &str) -> RealityResult<Duration> {
    let parsed = raw
        .parse::<f64>()
        .map_err(|_| RealityError::config(format!("{env_name} must be a number of seconds")))?;
    Duration::try_from_secs_f64(parsed)
        .map_err(|_| RealityError::config(format!("{env_name} must be a finite number >= 0")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.output_path, PathBuf::from("output/markets.json"));
        assert_eq!(config.kalshi.page_limit, 200);
        assert_eq!(config.kalshi.retry.max_retries, 3);
        assert_eq!(config.kalshi.retry.base_delay, Duration::from_secs(2));
        assert_eq!(config.kalshi.request_timeout, Duration::from_secs(30));
        assert_eq!(config.embedding.api_key, None);
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("REALITY_OUTPUT_PATH", "/tmp/data/markets.json"),
            ("KALSHI_API_BASE", "https://demo-api.kalshi.co/trade-api/v2"),
            ("KALSHI_PAGE_LIMIT", "50"),
            ("KALSHI_MAX_RETRIES", "5"),
            ("KALSHI_BASE_DELAY_SECS", "0.5"),
            ("KALSHI_TIMEOUT_SECS", "10"),
            ("OPENAI_API_KEY", "sk-test"),
            ("EMBEDDING_MODEL", "text-embedding-3-large"),
            ("EMBEDDING_DIMENSIONS", "384"),
            ("EMBEDDING_BATCH_SIZE", "100"),
        ]))
        .unwrap();

        assert_eq!(config.output_path, PathBuf::from("/tmp/data/markets.json"));
        assert_eq!(config.kalshi.base_url, "https://demo-api.kalshi.co/trade-api/v2");
        assert_eq!(config.kalshi.page_limit, 50);
        assert_eq!(config.kalshi.retry, RetryPolicy::new(5, Duration::from_millis(500)));
        assert_eq!(config.kalshi.request_timeout, Duration::from_secs(10));
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.embedding.dimensions, Some(384));
        assert_eq!(config.embedding.batch_size, 100);
    }

    #[test]
    fn test_blank_values_ignored() {
        let config =
            SyncConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  "), ("KALSHI_PAGE_LIMIT", "")]))
                .unwrap();
        assert_eq!(config.embedding.api_key, None);
        assert_eq!(config.kalshi.page_limit, 200);
    }

    #[test]
    fn test_invalid_values() {
        assert!(SyncConfig::from_lookup(lookup(&[("KALSHI_PAGE_LIMIT", "many")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("KALSHI_PAGE_LIMIT", "0")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("KALSHI_BASE_DELAY_SECS", "-1")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("KALSHI_API_BASE", "ftp://x")])).is_err());
        assert!(SyncConfig::from_lookup(lookup(&[("EMBEDDING_DIMENSIONS", "0")])).is_err());
    }
}
