use std::env;
use std::time::Duration;

use crate::error::ServiceError;

/// Service configuration shared by every execution
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the ACCE instance (required)
    pub base_url: String,

    /// API key used when a request does not carry its own
    pub api_key: Option<String>,

    /// Number of result polls before giving up (default: 20)
    pub max_poll_attempts: u32,

    /// Delay between result polls (default: 20 seconds)
    pub poll_delay: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            max_poll_attempts: 20,
            poll_delay: Duration::from_secs(20),
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            base_url: lookup("ACCE_BASE_URL").unwrap_or(default.base_url),

            api_key: lookup("ACCE_API_KEY").filter(|k| !k.trim().is_empty()),

            max_poll_attempts: lookup("ACCE_MAX_POLL_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_poll_attempts),

            poll_delay: lookup("ACCE_POLL_DELAY")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.poll_delay),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_polling(mut self, max_poll_attempts: u32, poll_delay: Duration) -> Self {
        self.max_poll_attempts = max_poll_attempts;
        self.poll_delay = poll_delay;
        self
    }

    /// Checks the base URL and returns it without a trailing slash
    pub fn validated_base_url(&self) -> Result<String, ServiceError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ServiceError::Configuration(
                "base_url was not set.".to_string(),
            ));
        }

        let parsed = url::Url::parse(trimmed).map_err(|e| {
            ServiceError::Configuration(format!("base_url '{}' is not a valid URL: {}", trimmed, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ServiceError::Configuration(format!(
                "base_url '{}' must use http or https",
                trimmed
            )));
        }

        Ok(trimmed.to_string())
    }

    /// Picks the request key over the configured default
    pub fn resolve_api_key(&self, request_key: Option<&str>) -> Result<String, ServiceError> {
        request_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.as_deref().filter(|k| !k.trim().is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::Configuration("No api_key with request or as default".to_string())
            })
    }

    /// Upper bound on time spent polling
    pub fn max_poll_wait(&self) -> Duration {
        self.poll_delay * self.max_poll_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_poll_attempts, 20);
        assert_eq!(config.poll_delay, Duration::from_secs(20));
        assert!(config.api_key.is_none());
        assert_eq!(config.max_poll_wait(), Duration::from_secs(400));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ACCE_BASE_URL", "https://acce.example.com/"),
            ("ACCE_API_KEY", "secret"),
            ("ACCE_MAX_POLL_ATTEMPTS", "5"),
            ("ACCE_POLL_DELAY", "3"),
        ]);
        let config = ServiceConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.max_poll_attempts, 5);
        assert_eq!(config.poll_delay, Duration::from_secs(3));
        assert_eq!(
            config.validated_base_url().unwrap(),
            "https://acce.example.com"
        );
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = ServiceConfig::from_lookup(|k| match k {
            "ACCE_MAX_POLL_ATTEMPTS" => Some("many".to_string()),
            "ACCE_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.max_poll_attempts, 20);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_base_url_required() {
        let err = ServiceConfig::default().validated_base_url().unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));

        let err = ServiceConfig::new("ftp://acce").validated_base_url().unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }

    #[test]
    fn test_resolve_api_key() {
        let config = ServiceConfig::new("https://acce").with_api_key("default");
        assert_eq!(config.resolve_api_key(Some("mine")).unwrap(), "mine");
        assert_eq!(config.resolve_api_key(Some("")).unwrap(), "default");
        assert_eq!(config.resolve_api_key(None).unwrap(), "default");

        let bare = ServiceConfig::new("https://acce");
        assert!(matches!(
            bare.resolve_api_key(None),
            Err(ServiceError::Configuration(_))
        ));
    }
}
