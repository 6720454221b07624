use crate::prelude::*;
use std::time::Duration;

/// HIRA drug price criteria detail search (XML)
pub const DEFAULT_DETAIL_URL: &str =
    "https://apis.data.go.kr/B551182/dgamtCrtrInfoService1.2/getDgamtList";

/// odcloud bulk drug ingredient dataset (JSON)
pub const DEFAULT_BULK_URL: &str =
    "https://api.odcloud.kr/api/15118958/v1/uddi:6753c7f1-65ed-4bbe-9e98-cd6b7b156a92";

/// Remote API configuration, assembled from environment variables and
/// global CLI options
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub service_key: String,
    pub bulk_service_key: String,
    pub detail_url: String,
    pub bulk_url: String,
    pub timeout: Duration,
    pub insecure: bool,
}

impl ApiConfig {
    /// Load configuration from the process environment and the global options
    pub fn resolve(global: &crate::Global) -> Result<Self> {
        Self::from_vars(
            |name| std::env::var(name).ok(),
            global.service_key.clone(),
            global.timeout,
            global.insecure,
        )
    }

    /// Build the configuration from a variable lookup.
    ///
    /// Uses DRUGFINDER_SERVICE_KEY unless a key is passed explicitly
    /// Uses DRUGFINDER_BULK_SERVICE_KEY if set, otherwise falls back to the main key
    /// Uses DRUGFINDER_DETAIL_URL and DRUGFINDER_BULK_URL with default fallbacks
    pub fn from_vars(
        var: impl Fn(&str) -> Option<String>,
        service_key: Option<String>,
        timeout_secs: u64,
        insecure: bool,
    ) -> Result<Self> {
        let service_key = service_key
            .or_else(|| var("DRUGFINDER_SERVICE_KEY"))
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                eyre!("No service key: pass --service-key or set DRUGFINDER_SERVICE_KEY")
            })?;

        let bulk_service_key = var("DRUGFINDER_BULK_SERVICE_KEY")
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| service_key.clone());

        Ok(Self {
            service_key,
            bulk_service_key,
            detail_url: var("DRUGFINDER_DETAIL_URL")
                .unwrap_or_else(|| DEFAULT_DETAIL_URL.to_string()),
            bulk_url: var("DRUGFINDER_BULK_URL").unwrap_or_else(|| DEFAULT_BULK_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            insecure,
        })
    }

    /// Create the HTTP client shared by both data sources
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.insecure)
            .user_agent(concat!("drugfinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_from_vars_defaults() {
        let config =
            ApiConfig::from_vars(lookup(&[("DRUGFINDER_SERVICE_KEY", "abc")]), None, 30, false)
                .unwrap();

        assert_eq!(config.service_key, "abc");
        assert_eq!(config.bulk_service_key, "abc");
        assert_eq!(config.detail_url, DEFAULT_DETAIL_URL);
        assert_eq!(config.bulk_url, DEFAULT_BULK_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.insecure);
    }

    #[test]
    fn test_from_vars_explicit_key_wins() {
        let config = ApiConfig::from_vars(
            lookup(&[("DRUGFINDER_SERVICE_KEY", "from-env")]),
            Some("from-cli".to_string()),
            30,
            false,
        )
        .unwrap();

        assert_eq!(config.service_key, "from-cli");
    }

    #[test]
    fn test_from_vars_bulk_key_and_urls() {
        let config = ApiConfig::from_vars(
            lookup(&[
                ("DRUGFINDER_SERVICE_KEY", "detail-key"),
                ("DRUGFINDER_BULK_SERVICE_KEY", "bulk-key"),
                ("DRUGFINDER_DETAIL_URL", "http://localhost:1/detail"),
                ("DRUGFINDER_BULK_URL", "http://localhost:1/bulk"),
            ]),
            None,
            5,
            true,
        )
        .unwrap();

        assert_eq!(config.bulk_service_key, "bulk-key");
        assert_eq!(config.detail_url, "http://localhost:1/detail");
        assert_eq!(config.bulk_url, "http://localhost:1/bulk");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.insecure);
    }

    #[test]
    fn test_from_vars_missing_key() {
        let result = ApiConfig::from_vars(lookup(&[]), None, 30, false);
        assert!(result.is_err());

        let empty = ApiConfig::from_vars(lookup(&[]), Some(String::new()), 30, false);
        assert!(empty.is_err());
    }
}
