use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{MapImageError, Result};
use crate::generator::PartialFailurePolicy;
use crate::request::DEFAULT_ENDPOINT;

pub const KEY_ID_ENV: &str = "NAVER_CLIENT_ID";
pub const KEY_SECRET_ENV: &str = "NAVER_CLIENT_SECRET";

/// Names used by the web frontend's `.env`, still honored for existing deployments.
pub const LEGACY_KEY_ID_ENV: &str = "NEXT_PUBLIC_NAVER_CLIENT_ID";
pub const LEGACY_KEY_SECRET_ENV: &str = "NEXT_PUBLIC_NAVER_CLIENT";

#[derive(Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Credentials {
    pub key_id: String,
    pub key_secret: String,
}

impl Credentials {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MapImageError::Config(format!(
                "static map credentials missing; set {} and {}",
                KEY_ID_ENV, KEY_SECRET_ENV
            )))
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &if self.key_secret.is_empty() { "" } else { "***" })
            .finish()
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub thread_count: Option<usize>,
    pub courses_path: PathBuf,
    pub recommendations_path: PathBuf,
    pub output_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub endpoint: String,
    pub request_timeout_secs: Option<u64>,
    pub concurrency: usize,
    pub partial_failure: PartialFailurePolicy,
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            thread_count: None,
            courses_path: PathBuf::from("data/courses.json"),
            recommendations_path: PathBuf::from("data/recommendations.json"),
            output_dir: PathBuf::from("public/images/courses"),
            cors_origins: vec!["http://localhost:3000".to_string()],
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
            concurrency: 1,
            partial_failure: PartialFailurePolicy::default(),
            credentials: Credentials::default(),
        }
    }
}

impl Config {
    /// Reads `coursemap.toml` (or the example file), then applies
    /// credential overrides from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = if Path::new("coursemap.toml").exists() {
            Self::from_file("coursemap.toml")?
        } else if Path::new("coursemap.example.toml").exists() {
            Self::from_file("coursemap.example.toml")?
        } else {
            info!("no coursemap.toml found, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.concurrency == 0 {
            return Err(anyhow::anyhow!("concurrency must be at least 1"));
        }
        Ok(config)
    }

    /// Non-empty values from `lookup` replace the configured credentials.
    /// The current variable names win over the legacy ones.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first_set = |names: [&str; 2]| {
            names
                .into_iter()
                .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
        };
        if let Some(id) = first_set([KEY_ID_ENV, LEGACY_KEY_ID_ENV]) {
            self.credentials.key_id = id;
        }
        if let Some(secret) = first_set([KEY_SECRET_ENV, LEGACY_KEY_SECRET_ENV]) {
            self.credentials.key_secret = secret;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.request_timeout_secs, None);
        assert_eq!(config.partial_failure, PartialFailurePolicy::Keep);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.recommendations_path, PathBuf::from("data/recommendations.json"));
        assert!(!config.credentials.is_valid());
    }

    #[test]
    fn parses_all_fields() {
        let config = Config::from_toml_str(
            r#"
            listen_addr = "127.0.0.1:9000"
            thread_count = 2
            courses_path = "fixtures/courses.json"
            output_dir = "out"
            endpoint = "http://localhost:1234/raster"
            request_timeout_secs = 15
            concurrency = 4
            partial_failure = "remove"

            [credentials]
            key_id = "id"
            key_secret = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.thread_count, Some(2));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.request_timeout_secs, Some(15));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.partial_failure, PartialFailurePolicy::Remove);
        assert_eq!(config.credentials, Credentials::new("id", "secret"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(Config::from_toml_str("concurrency = 0").is_err());
    }

    #[test]
    fn env_overrides_credentials() {
        let env: HashMap<&str, String> = [
            (KEY_ID_ENV, "env-id".to_string()),
            (KEY_SECRET_ENV, String::new()),
        ]
        .into_iter()
        .collect();

        let mut config = Config::from_toml_str(
            "[credentials]\nkey_id = \"file-id\"\nkey_secret = \"file-secret\"",
        )
        .unwrap();
        config.apply_overrides(|k| env.get(k).cloned());

        assert_eq!(config.credentials.key_id, "env-id");
        assert_eq!(config.credentials.key_secret, "file-secret");
    }

    #[test]
    fn frontend_variable_names_are_accepted() {
        let env: HashMap<&str, String> = [
            (LEGACY_KEY_ID_ENV, "legacy-id".to_string()),
            (LEGACY_KEY_SECRET_ENV, "legacy-secret".to_string()),
            (KEY_SECRET_ENV, "new-secret".to_string()),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).cloned());

        assert_eq!(config.credentials, Credentials::new("legacy-id", "new-secret"));
        assert!(config.credentials.is_valid());
    }

    #[test]
    fn credentials_need_both_values() {
        assert!(Credentials::new("a", "b").validate().is_ok());
        assert!(matches!(
            Credentials::new("a", "").validate(),
            Err(MapImageError::Config(_))
        ));
        assert!(!Credentials::new("", "b").is_valid());
    }

    #[test]
    fn debug_hides_secret() {
        let s = format!("{:?}", Credentials::new("id", "hunter2"));
        assert!(!s.contains("hunter2"));
    }
}
