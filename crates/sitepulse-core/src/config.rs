use std::time::Duration;

/// Default lifetime of a cached daily-aggregate range.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// GA4 property synced by `POST /api/analytics/sync`. Doubles as the site id.
    pub ga4_property_id: Option<String>,
    /// Service-account key, either the raw JSON document or its base64 encoding.
    pub ga4_service_account_key: Option<String>,
    pub ga4_api_base: String,
    pub cache_mode: CacheMode,
    pub cache_ttl_seconds: u64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheMode {
    /// In-process TTL cache.
    Memory,
    /// No cache; every read goes to the aggregate store.
    None,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source. Blank values count as unset
    /// for the optional GA4 settings.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let non_empty = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Ok(Self {
            port: var("SITEPULSE_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: var("SITEPULSE_DATA_DIR").unwrap_or_else(|| "./data".to_string()),
            duckdb_memory_limit: var("SITEPULSE_DUCKDB_MEMORY")
                .unwrap_or_else(|| "1GB".to_string()),
            ga4_property_id: non_empty("GA4_PROPERTY_ID"),
            ga4_service_account_key: non_empty("GA4_SERVICE_ACCOUNT_KEY"),
            ga4_api_base: var("GA4_API_BASE")
                .unwrap_or_else(|| "https://analyticsdata.googleapis.com".to_string()),
            cache_mode: match var("SITEPULSE_CACHE").as_deref().map(str::trim) {
                Some("none") | Some("off") => CacheMode::None,
                _ => CacheMode::Memory,
            },
            cache_ttl_seconds: var("SITEPULSE_CACHE_TTL_SECONDS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_CACHE_TTL_SECONDS),
            cors_origins: var("SITEPULSE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let cfg = from_pairs(&[]).expect("config");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.data_dir, "./data");
        assert_eq!(cfg.cache_mode, CacheMode::Memory);
        assert_eq!(cfg.cache_ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
        assert!(cfg.ga4_property_id.is_none());
        assert!(cfg.cors_origins.is_empty());
    }

    #[test]
    fn test_blank_ga4_values_count_as_unset() {
        let cfg = from_pairs(&[
            ("GA4_PROPERTY_ID", "   "),
            ("GA4_SERVICE_ACCOUNT_KEY", ""),
        ])
        .expect("config");
        assert!(cfg.ga4_property_id.is_none());
        assert!(cfg.ga4_service_account_key.is_none());

        let cfg = from_pairs(&[("GA4_PROPERTY_ID", " 123456 ")]).expect("config");
        assert_eq!(cfg.ga4_property_id.as_deref(), Some("123456"));
    }

    #[test]
    fn test_cache_can_be_disabled_and_ttl_overridden() {
        let cfg = from_pairs(&[
            ("SITEPULSE_CACHE", "none"),
            ("SITEPULSE_CACHE_TTL_SECONDS", "60"),
        ])
        .expect("config");
        assert_eq!(cfg.cache_mode, CacheMode::None);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(60));

        let cfg = from_pairs(&[("SITEPULSE_CACHE_TTL_SECONDS", "soon")]).expect("config");
        assert_eq!(cfg.cache_ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
    }

    #[test]
    fn test_cors_origins_are_trimmed_and_split() {
        let cfg = from_pairs(&[(
            "SITEPULSE_CORS_ORIGINS",
            "https://a.example, https://b.example,,",
        )])
        .expect("config");
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(from_pairs(&[("SITEPULSE_PORT", "http")]).is_err());
    }

    // The only test in this crate that touches the process environment.
    #[test]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("GA4_PROPERTY_ID", "");
        std::env::set_var("SITEPULSE_CACHE", "none");
        let cfg = Config::from_env().expect("config");
        std::env::remove_var("GA4_PROPERTY_ID");
        std::env::remove_var("SITEPULSE_CACHE");

        assert!(cfg.ga4_property_id.is_none());
        assert_eq!(cfg.cache_mode, CacheMode::None);
    }
}
