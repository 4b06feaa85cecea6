use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the PPOB backend, e.g. `https://api.example.com`.
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding the persisted session cookie file.
    pub data_dir: String,
    /// How many records one history page requests.
    pub history_page_size: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            history_page_size: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let base_url = std::env::var("API_BASE_URL").unwrap_or_default();

        let timeout_seconds = std::env::var("HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let history_page_size = std::env::var("HISTORY_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let config = Config {
            api: ApiConfig {
                base_url,
                timeout_seconds,
            },
            session: SessionConfig {
                data_dir,
                history_page_size,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "API_BASE_URL is not configured".to_string(),
            ));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "API_BASE_URL must be an http(s) URL, got: {}",
                self.api.base_url
            )));
        }
        if self.session.history_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "HISTORY_PAGE_SIZE cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_missing_base_url() {
        let config = Config {
            api: ApiConfig {
                base_url: String::new(),
                timeout_seconds: 10,
            },
            session: SessionConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = Config {
            api: ApiConfig {
                base_url: "ftp://api.example.com".to_string(),
                timeout_seconds: 10,
            },
            session: SessionConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_https() {
        let config = Config {
            api: ApiConfig {
                base_url: "https://api.example.com".to_string(),
                timeout_seconds: 10,
            },
            session: SessionConfig::default(),
        };
        assert!(config.validate().is_ok());
    }
}
