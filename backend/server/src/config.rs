use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{Result, anyhow};
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub meili_url: Option<String>,
    pub meili_key: Option<String>,
    pub admin_password: String,
    pub site_url: String,
    pub posts_per_page: usize,
    pub tools_per_page: usize,
    pub cors_origin: Option<String>,
    pub ads: AdsConfig,
}

/// Ad network publisher id and the slot id for each placement position.
#[derive(Default)]
pub struct AdsConfig {
    pub client: Option<String>,
    pub header_slot: Option<String>,
    pub sidebar_slot: Option<String>,
    pub in_content_slot: Option<String>,
    pub footer_slot: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let admin_password = read_secret("ADMIN_PASSWORD")
            .ok_or_else(|| anyhow!("ADMIN_PASSWORD must be provided as a secret or variable"))?;

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            redis_url: try_load("REDIS_URL", "redis://localhost:6379")?,
            meili_url: optional("MEILI_URL"),
            meili_key: read_secret("MEILI_ADMIN_KEY"),
            admin_password,
            site_url: try_load::<String>("SITE_URL", "http://localhost:5173")?
                .trim_end_matches('/')
                .to_string(),
            posts_per_page: try_load("POSTS_PER_PAGE", "9")?,
            tools_per_page: try_load("TOOLS_PER_PAGE", "12")?,
            cors_origin: optional("CORS_ORIGIN"),
            ads: AdsConfig {
                client: optional("ADS_CLIENT"),
                header_slot: optional("ADS_SLOT_HEADER"),
                sidebar_slot: optional("ADS_SLOT_SIDEBAR"),
                in_content_slot: optional("ADS_SLOT_IN_CONTENT"),
                footer_slot: optional("ADS_SLOT_FOOTER"),
            },
        })
    }
}

impl Default for Config {
    /// Local defaults. The admin password is empty, which locks every admin route.
    fn default() -> Self {
        Self {
            port: 1111,
            redis_url: "memory://".to_string(),
            meili_url: None,
            meili_key: None,
            admin_password: String::new(),
            site_url: "http://localhost:5173".to_string(),
            posts_per_page: 9,
            tools_per_page: 12,
            cors_origin: None,
            ads: AdsConfig::default(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn optional(key: &str) -> Option<String> {
    let value = var(key);

    if value.is_none() {
        info!("{key} not set, feature disabled");
    }

    value
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

const SECRETS_DIR: &str = "/run/secrets";

/// Docker secret first, then the plain environment variable.
fn read_secret(secret_name: &str) -> Option<String> {
    read_secret_in(SECRETS_DIR, secret_name)
}

fn read_secret_in(dir: &str, secret_name: &str) -> Option<String> {
    let path = format!("{dir}/{secret_name}");

    match read_to_string(&path) {
        Ok(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Ok(_) => {
            warn!("{secret_name} secret file is empty, trying environment");
            var(secret_name)
        }
        Err(e) => {
            warn!("Failed to read {secret_name} from file: {e}, trying environment");
            var(secret_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_default() {
        let port: u16 = try_load("CMS_TEST_UNSET_PORT", "1111").unwrap();
        assert_eq!(port, 1111);
    }

    #[test]
    fn test_try_load_rejects_garbage_default() {
        assert!(try_load::<u16>("CMS_TEST_UNSET_PORT", "not-a-port").is_err());
    }

    #[test]
    fn test_secret_file_wins() {
        let dir = std::env::temp_dir().join(format!("secrets-file-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("CMS_TEST_SECRET"), " hunter2\n").unwrap();

        let secret = read_secret_in(dir.to_str().unwrap(), "CMS_TEST_SECRET");
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_empty_secret_file_falls_back_to_env() {
        let dir = std::env::temp_dir().join(format!("secrets-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        // PATH is always set, so it stands in for a secret passed as a variable.
        std::fs::write(dir.join("PATH"), "  \n").unwrap();

        let secret = read_secret_in(dir.to_str().unwrap(), "PATH");
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(secret, var("PATH"));
        assert!(secret.is_some());
    }

    #[test]
    fn test_default_config_locks_admin() {
        let config = Config::default();
        assert!(config.admin_password.is_empty());
        assert!(config.redis_url.starts_with("memory://"));
    }
}
