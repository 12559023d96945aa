use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Ortoplan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3333";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 120;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "ortoplan=info,ortoplan_lib=info,tower_http=warn"
}

/// Get the application data directory
/// ~/Ortoplan/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Default database location inside the data directory
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("database").join("ortoplan.db")
}

/// Runtime configuration, read once at startup.
///
/// Provider API keys live here and only here: clients never send or
/// receive them.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub ai_timeout_secs: u64,
}

impl AppConfig {
    /// Build configuration from `ORTOPLAN_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (env in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = non_empty("ORTOPLAN_BIND_ADDR")
            .and_then(|v| match v.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!(value = %v, error = %e, "Ignoring invalid ORTOPLAN_BIND_ADDR");
                    None
                }
            })
            .unwrap_or_else(default_bind_addr);

        let ai_timeout_secs = non_empty("ORTOPLAN_AI_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_AI_TIMEOUT_SECS);

        Self {
            bind_addr,
            database_path: non_empty("ORTOPLAN_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            openai_api_key: non_empty("ORTOPLAN_OPENAI_API_KEY"),
            openai_base_url: non_empty("ORTOPLAN_OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            gemini_api_key: non_empty("ORTOPLAN_GEMINI_API_KEY"),
            gemini_base_url: non_empty("ORTOPLAN_GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            ai_timeout_secs,
        }
    }

    /// Configuration for tests: given database path, no provider keys.
    pub fn for_database(database_path: PathBuf) -> Self {
        Self {
            database_path,
            ..Self::from_lookup(|_| None)
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3333)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Ortoplan"));
    }

    #[test]
    fn database_path_under_app_data() {
        let path = default_database_path();
        assert!(path.starts_with(app_data_dir()));
        assert!(path.ends_with("database/ortoplan.db"));
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.ai_timeout_secs, DEFAULT_AI_TIMEOUT_SECS);
        assert!(config.openai_api_key.is_none());
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ORTOPLAN_BIND_ADDR", "0.0.0.0:8080"),
            ("ORTOPLAN_OPENAI_API_KEY", "sk-test"),
            ("ORTOPLAN_AI_TIMEOUT_SECS", "30"),
            ("ORTOPLAN_DATABASE_PATH", "/tmp/x.db"),
        ]));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai_timeout_secs, 30);
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("ORTOPLAN_GEMINI_API_KEY", "   ")]));
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn invalid_bind_addr_falls_back() {
        let config = AppConfig::from_lookup(lookup_from(&[("ORTOPLAN_BIND_ADDR", "not-an-addr")]));
        assert_eq!(config.bind_addr, default_bind_addr());
    }
}
