//! Configuration management for ytprod using the prefer crate.
//!
//! Precedence, lowest to highest: built-in defaults, the `ytprod` config
//! file discovered by prefer, environment variables (including a `.env` file
//! loaded by the binary), command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::summarizer::SummarizerConfig;

/// Default storage bucket used by the smoke tests.
pub const DEFAULT_BUCKET: &str = "ytprod";

/// Default API port.
pub const DEFAULT_BACKEND_PORT: u16 = 8000;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Supabase project URL (`SUPABASE_URL`).
    pub supabase_url: Option<String>,
    /// Supabase API key (`SUPABASE_KEY` or `SUPABASE_ANON_KEY`).
    pub supabase_key: Option<String>,
    /// Storage bucket name (`SUPABASE_BUCKET`).
    pub storage_bucket: String,
    /// Database password. Documented for tooling, not used by this crate.
    pub db_password: Option<String>,
    /// Deployment environment name.
    pub environment: String,
    /// API bind host.
    pub backend_host: String,
    /// API bind port.
    pub backend_port: u16,
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Local SQLite store filename (relative to `data_dir`) or absolute path.
    pub database: PathBuf,
    /// Scratch root for per-job worker files.
    pub work_dir: PathBuf,
    /// HTTP request timeout in seconds.
    pub request_timeout: u64,
    /// Summarizer backend settings.
    pub summarizer: SummarizerConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("ytprod");

        Self {
            supabase_url: None,
            supabase_key: None,
            storage_bucket: DEFAULT_BUCKET.to_string(),
            db_password: None,
            environment: "development".to_string(),
            backend_host: "0.0.0.0".to_string(),
            backend_port: DEFAULT_BACKEND_PORT,
            data_dir,
            database: PathBuf::from("ytprod.db"),
            work_dir: std::env::temp_dir().join("ytprod"),
            request_timeout: 30,
            summarizer: SummarizerConfig::default(),
        }
    }
}

impl Settings {
    /// Full path to the local store.
    pub fn database_path(&self) -> PathBuf {
        if self.database.is_absolute() {
            self.database.clone()
        } else {
            self.data_dir.join(&self.database)
        }
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Whether both the Supabase URL and key are present.
    pub fn supabase_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_key.is_some()
    }

    /// Apply environment variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment variables through a lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("SUPABASE_URL") {
            self.supabase_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(key) = get("SUPABASE_KEY").or_else(|| get("SUPABASE_ANON_KEY")) {
            self.supabase_key = Some(key);
        }
        if let Some(bucket) = get("SUPABASE_BUCKET") {
            self.storage_bucket = bucket;
        }
        if let Some(password) = get("SUPABASE_DB_PASSWORD") {
            self.db_password = Some(password);
        }
        if let Some(env) = get("APP_ENV").or_else(|| get("NODE_ENV")) {
            self.environment = env;
        }
        if let Some(host) = get("BACKEND_HOST") {
            self.backend_host = host;
        }
        if let Some(port) = get("BACKEND_PORT") {
            match port.parse() {
                Ok(port) => self.backend_port = port,
                Err(_) => tracing::warn!("Ignoring invalid BACKEND_PORT: {}", port),
            }
        }
        if let Some(dir) = get("YTPROD_WORK_DIR") {
            self.work_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(db) = get("YTPROD_DATABASE") {
            self.database = PathBuf::from(shellexpand::tilde(&db).as_ref());
        }
        if let Some(key) = get("HF_API_KEY") {
            self.summarizer.api_key = Some(key);
        }
        if let Some(flag) = get("USE_LOCAL_MODELS") {
            self.summarizer.use_local_models = flag.eq_ignore_ascii_case("true");
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target directory for data.
    #[serde(default)]
    pub target: Option<String>,
    /// Local store filename or path.
    #[serde(default)]
    pub database: Option<String>,
    /// Worker scratch directory.
    #[serde(default)]
    pub work_dir: Option<String>,
    /// Supabase project URL.
    #[serde(default)]
    pub supabase_url: Option<String>,
    /// Storage bucket name.
    #[serde(default)]
    pub bucket: Option<String>,
    /// API bind host.
    #[serde(default)]
    pub host: Option<String>,
    /// API bind port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Summarizer configuration.
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers ytprod config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("ytprod").await {
            Ok(pref_config) => {
                let target: Option<String> = pref_config.get("target").ok();
                let database: Option<String> = pref_config.get("database").ok();
                let work_dir: Option<String> = pref_config.get("work_dir").ok();
                let supabase_url: Option<String> = pref_config.get("supabase_url").ok();
                let bucket: Option<String> = pref_config.get("bucket").ok();
                let host: Option<String> = pref_config.get("host").ok();
                let port: Option<u16> = pref_config.get("port").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let summarizer: SummarizerConfig =
                    pref_config.get("summarizer").unwrap_or_default();

                Config {
                    target,
                    database,
                    work_dir,
                    supabase_url,
                    bucket,
                    host,
                    port,
                    request_timeout,
                    summarizer,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref target) = self.target {
            let path = shellexpand::tilde(target);
            settings.data_dir = PathBuf::from(path.as_ref());
        }
        if let Some(ref database) = self.database {
            settings.database = PathBuf::from(shellexpand::tilde(database).as_ref());
        }
        if let Some(ref work_dir) = self.work_dir {
            settings.work_dir = PathBuf::from(shellexpand::tilde(work_dir).as_ref());
        }
        if let Some(ref url) = self.supabase_url {
            settings.supabase_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(ref bucket) = self.bucket {
            settings.storage_bucket = bucket.clone();
        }
        if let Some(ref host) = self.host {
            settings.backend_host = host.clone();
        }
        if let Some(port) = self.port {
            settings.backend_port = port;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        settings.summarizer = self.summarizer.clone();
    }
}

/// Load settings: defaults, then config file, then environment.
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings.apply_env();
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.storage_bucket, DEFAULT_BUCKET);
        assert_eq!(settings.backend_port, 8000);
        assert_eq!(settings.environment, "development");
        assert!(!settings.supabase_configured());
        assert!(settings.database_path().ends_with("ytprod.db"));
    }

    #[test]
    fn test_env_overlay() {
        let mut settings = Settings::default();
        settings.apply_env_with(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_BUCKET", "videos"),
            ("NODE_ENV", "production"),
            ("BACKEND_PORT", "9001"),
            ("HF_API_KEY", "hf_123"),
            ("USE_LOCAL_MODELS", "TRUE"),
        ]));

        assert_eq!(settings.supabase_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(settings.supabase_key.as_deref(), Some("anon"));
        assert_eq!(settings.storage_bucket, "videos");
        assert_eq!(settings.environment, "production");
        assert_eq!(settings.backend_port, 9001);
        assert_eq!(settings.summarizer.api_key.as_deref(), Some("hf_123"));
        assert!(settings.summarizer.use_local_models);
        assert!(settings.supabase_configured());
    }

    #[test]
    fn test_env_precedence_and_blank_values() {
        let mut settings = Settings::default();
        settings.apply_env_with(lookup(&[
            ("SUPABASE_KEY", "service"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("APP_ENV", "staging"),
            ("NODE_ENV", "production"),
            ("SUPABASE_BUCKET", "  "),
            ("BACKEND_PORT", "not-a-port"),
        ]));

        assert_eq!(settings.supabase_key.as_deref(), Some("service"));
        assert_eq!(settings.environment, "staging");
        assert_eq!(settings.storage_bucket, DEFAULT_BUCKET);
        assert_eq!(settings.backend_port, DEFAULT_BACKEND_PORT);
    }

    #[test]
    fn test_config_applies_to_settings() {
        let config = Config {
            target: Some("/srv/ytprod".to_string()),
            bucket: Some("media".to_string()),
            port: Some(8080),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.data_dir, PathBuf::from("/srv/ytprod"));
        assert_eq!(settings.database_path(), PathBuf::from("/srv/ytprod/ytprod.db"));
        assert_eq!(settings.storage_bucket, "media");
        assert_eq!(settings.backend_port, 8080);
    }

    #[test]
    fn test_absolute_database_path_wins() {
        let mut settings = Settings::default();
        settings.apply_env_with(lookup(&[("YTPROD_DATABASE", "/tmp/other.db")]));
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/other.db"));
    }
}
