use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{anyhow, Context, Result};

/// Default DNS-over-HTTPS JSON endpoint
pub const DEFAULT_RESOLVER: &str = "https://dns.google/resolve";

/// Environment variable that overrides `user.id`
pub const USER_ENV: &str = "MXSIFT_USER";

/// Settings read from `~/.mxsift/rc`
///
/// The rc file holds `key=value` lines; blank lines and `#` comments are
/// skipped. Recognised keys:
///
/// - `data.location` - database path, relative paths resolve against the rc
///   file's directory
/// - `user.id` - the current user
/// - `dns.resolver` - DNS-over-HTTPS JSON endpoint
/// - `dns.timeout` - per-lookup timeout in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_location: PathBuf,
    pub user_id: Option<String>,
    pub resolver: String,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Ok(home.join(".mxsift"))
    }

    /// Path of the rc file
    pub fn rc_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("rc"))
    }

    /// Defaults rooted at the given config directory
    pub fn defaults(config_dir: &Path) -> Self {
        Self {
            data_location: config_dir.join("lists.db"),
            user_id: None,
            resolver: DEFAULT_RESOLVER.to_string(),
            timeout: None,
        }
    }

    /// Load the rc file if it exists, otherwise use defaults
    pub fn load() -> Result<Self> {
        let rc_path = Self::rc_path()?;
        let config_dir = rc_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut config = if rc_path.exists() {
            let content = std::fs::read_to_string(&rc_path)
                .with_context(|| format!("Failed to read config file: {}", rc_path.display()))?;
            Self::parse(&content, &config_dir)?
        } else {
            Self::defaults(&config_dir)
        };

        if let Ok(user) = std::env::var(USER_ENV) {
            let user = user.trim();
            if !user.is_empty() {
                config.user_id = Some(user.to_string());
            }
        }

        Ok(config)
    }

    /// Parse rc content; `base_dir` anchors relative `data.location` values
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config = Self::defaults(base_dir);

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::debug!("Ignoring rc line without '=': {}", line);
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path
                    };
                }
                "user.id" => {
                    config.user_id = if value.is_empty() { None } else { Some(value.to_string()) };
                }
                "dns.resolver" => {
                    if value.is_empty() {
                        anyhow::bail!("Invalid config value for dns.resolver: must not be empty");
                    }
                    config.resolver = value.to_string();
                }
                "dns.timeout" => {
                    let secs: u64 = value.parse().map_err(|_| {
                        anyhow!("Invalid config value for dns.timeout: '{}'. Expected whole seconds.", value)
                    })?;
                    config.timeout = if secs == 0 { None } else { Some(Duration::from_secs(secs)) };
                }
                other => log::debug!("Ignoring unknown config key: {}", other),
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("", Path::new("/home/me/.mxsift")).unwrap();
        assert_eq!(config.data_location, PathBuf::from("/home/me/.mxsift/lists.db"));
        assert_eq!(config.user_id, None);
        assert_eq!(config.resolver, DEFAULT_RESOLVER);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_parse_all_keys() {
        let content = "# local settings\n\
                       data.location=./custom.db\n\
                       user.id = alice\n\
                       dns.resolver=http://127.0.0.1:8053/resolve\n\
                       dns.timeout=5\n\
                       color=never\n";
        let config = Config::parse(content, Path::new("/cfg")).unwrap();
        assert_eq!(config.data_location, PathBuf::from("/cfg/./custom.db"));
        assert_eq!(config.user_id.as_deref(), Some("alice"));
        assert_eq!(config.resolver, "http://127.0.0.1:8053/resolve");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_absolute_data_location() {
        let config = Config::parse("data.location=/var/lib/lists.db", Path::new("/cfg")).unwrap();
        assert_eq!(config.data_location, PathBuf::from("/var/lib/lists.db"));
    }

    #[test]
    fn test_bad_timeout_is_error() {
        let err = Config::parse("dns.timeout=soon", Path::new("/cfg")).unwrap_err();
        assert!(err.to_string().contains("dns.timeout"));
    }
}
