use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://api.ebay.com/ws/api.dll";
pub const CREDENTIAL_SECTION: &str = "eBayAPI";
pub const TOKEN_KEY: &str = "IAF_TOKEN";

/// Overrides the token from the config file
pub const TOKEN_ENV: &str = "EBAY_IAF_TOKEN";
/// Points the client at another endpoint, e.g. the sandbox
pub const ENDPOINT_ENV: &str = "EBAY_API_ENDPOINT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Config is missing the [{0}] section")]
    MissingSection(String),

    #[error("Config section [{section}] has no {key} entry")]
    MissingKey { section: String, key: String },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything the HTTP client needs to talk to the Trading API
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub endpoint: String,
    pub token: String,
    pub site_id: u32,
    pub compatibility_level: u32,
    pub timeout: Duration,
}

impl ApiSettings {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: token.into(),
            site_id: 0,
            compatibility_level: 967,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Attempts per page and the first backoff wait; the wait doubles per failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    pub entries_per_page: u32,
    pub retry: RetryPolicy,
    /// Detail requests in flight at once
    pub concurrency: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            entries_per_page: 200,
            retry: RetryPolicy::default(),
            concurrency: 8,
        }
    }
}

impl RetrievalSettings {
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        self.concurrency = concurrency;
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub retrieval: RetrievalSettings,
}

impl AppConfig {
    /// Build the config from the credential file, letting the environment override it.
    /// Call `dotenvy::dotenv()` first if a `.env` file should count.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let token = match env_var(TOKEN_ENV) {
            Some(token) => {
                debug!("Using token from {}", TOKEN_ENV);
                token
            }
            None => token_from_file(path)?,
        };

        let mut api = ApiSettings::new(token);
        if let Some(endpoint) = env_var(ENDPOINT_ENV) {
            debug!(endpoint = %endpoint, "Using endpoint from {}", ENDPOINT_ENV);
            api.endpoint = endpoint;
        }

        Ok(Self {
            api,
            retrieval: RetrievalSettings::default(),
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn token_from_file(path: &Path) -> Result<String, ConfigError> {
    let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    token_from_ini(&ini)
}

pub fn token_from_ini(ini: &Ini) -> Result<String, ConfigError> {
    let section = ini
        .section(Some(CREDENTIAL_SECTION))
        .ok_or_else(|| ConfigError::MissingSection(CREDENTIAL_SECTION.to_string()))?;

    section
        .get(TOKEN_KEY)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingKey {
            section: CREDENTIAL_SECTION.to_string(),
            key: TOKEN_KEY.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_token_from_named_section() {
        let ini = Ini::load_from_str("[eBayAPI]\nIAF_TOKEN = v1.abc-123\n").unwrap();
        assert_eq!(token_from_ini(&ini).unwrap(), "v1.abc-123");
    }

    #[test]
    fn missing_section_is_reported() {
        let ini = Ini::load_from_str("[other]\nIAF_TOKEN = x\n").unwrap();
        let err = token_from_ini(&ini).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(ref s) if s == "eBayAPI"));
        assert_eq!(err.to_string(), "Config is missing the [eBayAPI] section");
    }

    #[test]
    fn missing_or_blank_key_is_reported() {
        let ini = Ini::load_from_str("[eBayAPI]\nAPP_ID = x\n").unwrap();
        assert!(matches!(token_from_ini(&ini), Err(ConfigError::MissingKey { .. })));

        let ini = Ini::load_from_str("[eBayAPI]\nIAF_TOKEN =\n").unwrap();
        assert!(matches!(token_from_ini(&ini), Err(ConfigError::MissingKey { .. })));
    }

    #[test]
    fn reads_token_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[eBayAPI]").unwrap();
        writeln!(file, "IAF_TOKEN=file-token").unwrap();
        assert_eq!(token_from_file(file.path()).unwrap(), "file-token");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = token_from_file(Path::new("/definitely/not/here/config.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(RetrievalSettings::default().with_concurrency(0).is_err());
        assert_eq!(
            RetrievalSettings::default().with_concurrency(3).unwrap().concurrency,
            3
        );
    }
}
