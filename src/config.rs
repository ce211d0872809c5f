use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    DEFAULT_GRAPH_API_BASE, DEFAULT_GRAPH_API_VERSION, DEFAULT_POSTS_DIR, DEFAULT_REPLY_MESSAGE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// The resource whose feed is synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A page; replies can use a page access token.
    Page(String),
    /// A group; always uses the configured token as-is.
    Group(String),
}

impl Target {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Page(id) | Self::Group(id) => id,
        }
    }

    #[must_use]
    pub fn page_id(&self) -> Option<&str> {
        match self {
            Self::Page(id) => Some(id),
            Self::Group(_) => None,
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Built once at startup and never mutated afterwards. A token upgrade produces a new
/// value through [`Config::with_access_token`].
#[derive(Clone)]
pub struct Config {
    // Credentials and target
    pub access_token: String,
    pub target: Target,

    // Graph API
    pub graph_api_base: String,
    pub graph_api_version: String,
    pub http_timeout: Duration,

    // Storage
    pub posts_dir: PathBuf,
    pub summary_path: Option<PathBuf>,

    // Replies
    pub reply_enabled: bool,
    pub reply_message: String,
    pub reply_delay: Duration,

    // Pacing
    pub comment_page_delay: Duration,
    pub feed_page_delay: Duration,

    // Token bootstrap
    pub require_page_token: bool,
    pub check_permissions: bool,

    // Scheduling
    pub sync_interval: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let target = match (optional_env("PAGE_ID"), optional_env("GROUP_ID")) {
            (Some(page), _) => Target::Page(page),
            (None, Some(group)) => Target::Group(group),
            (None, None) => return Err(ConfigError::MissingEnvVar("PAGE_ID".to_string())),
        };

        Ok(Self {
            access_token: required_env("ACCESS_TOKEN")?,
            target,

            graph_api_base: env_or_default("GRAPH_API_BASE", DEFAULT_GRAPH_API_BASE),
            graph_api_version: env_or_default("GRAPH_API_VERSION", DEFAULT_GRAPH_API_VERSION),
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),

            posts_dir: PathBuf::from(env_or_default("POSTS_DIR", DEFAULT_POSTS_DIR)),
            summary_path: optional_env("SUMMARY_PATH").map(PathBuf::from),

            reply_enabled: parse_env_bool("REPLY_ENABLED", true)?,
            reply_message: env_or_default("REPLY_MESSAGE", DEFAULT_REPLY_MESSAGE),
            reply_delay: Duration::from_secs(parse_env_u64("REPLY_DELAY_SECS", 2)?),

            comment_page_delay: Duration::from_secs(parse_env_u64("COMMENT_PAGE_DELAY_SECS", 1)?),
            feed_page_delay: Duration::from_secs(parse_env_u64("FEED_PAGE_DELAY_SECS", 2)?),

            require_page_token: parse_env_bool("REQUIRE_PAGE_TOKEN", false)?,
            check_permissions: parse_env_bool("CHECK_PERMISSIONS", true)?,

            sync_interval: parse_optional_env_u64("SYNC_INTERVAL_SECS")?
                .map(Duration::from_secs),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "ACCESS_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.target.id().trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "PAGE_ID".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if url::Url::parse(&self.graph_api_base).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "GRAPH_API_BASE".to_string(),
                message: format!("not a valid URL: '{}'", self.graph_api_base),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.reply_enabled && self.reply_message.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "REPLY_MESSAGE".to_string(),
                message: "cannot be empty when replies are enabled".to_string(),
            });
        }
        if self.sync_interval.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::InvalidValue {
                name: "SYNC_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Return a copy of this configuration using a different access token.
    #[must_use]
    pub fn with_access_token(&self, access_token: String) -> Self {
        Self {
            access_token,
            ..self.clone()
        }
    }

    /// Configuration with no delays, pointed at `graph_api_base`, for tests.
    #[doc(hidden)]
    #[must_use]
    pub fn for_testing(graph_api_base: &str, posts_dir: PathBuf) -> Self {
        Self {
            access_token: "test-token".to_string(),
            target: Target::Page("111".to_string()),
            graph_api_base: graph_api_base.to_string(),
            graph_api_version: DEFAULT_GRAPH_API_VERSION.to_string(),
            http_timeout: Duration::from_secs(5),
            posts_dir,
            summary_path: None,
            reply_enabled: true,
            reply_message: DEFAULT_REPLY_MESSAGE.to_string(),
            reply_delay: Duration::ZERO,
            comment_page_delay: Duration::ZERO,
            feed_page_delay: Duration::ZERO,
            require_page_token: false,
            check_permissions: false,
            sync_interval: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &redact_secret(&self.access_token))
            .field("target", &self.target)
            .field("graph_api_base", &self.graph_api_base)
            .field("graph_api_version", &self.graph_api_version)
            .field("http_timeout", &self.http_timeout)
            .field("posts_dir", &self.posts_dir)
            .field("summary_path", &self.summary_path)
            .field("reply_enabled", &self.reply_enabled)
            .field("reply_message", &self.reply_message)
            .field("reply_delay", &self.reply_delay)
            .field("comment_page_delay", &self.comment_page_delay)
            .field("feed_page_delay", &self.feed_page_delay)
            .field("require_page_token", &self.require_page_token)
            .field("check_permissions", &self.check_permissions)
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

/// Show at most the first four characters of a secret.
#[must_use]
pub fn redact_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "***".to_string()
    } else {
        format!("{prefix}***")
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    optional_env(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    Ok(parse_optional_env_u64(name)?.unwrap_or(default))
}

fn parse_optional_env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => {
            val.parse()
                .map(Some)
                .map_err(|e| ConfigError::ParseInt {
                    name: name.to_string(),
                    source: e,
                })
        }
        _ => Ok(None),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => parse_bool(name, &val),
        _ => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ParseBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "ON").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(!parse_bool("X", "No").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_parse_bool_default() {
        assert!(parse_env_bool("PAGE_REPLY_SYNC_NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("PAGE_REPLY_SYNC_NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_redact_secret() {
        assert_eq!(redact_secret("short"), "***");
        assert_eq!(redact_secret("EAABsecretvalue"), "EAAB***");
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let mut config = Config::for_testing("http://localhost", PathBuf::from("posts"));
        config.access_token = "EAABverysecrettoken".to_string();
        let debug = format!("{config:?}");
        assert!(!debug.contains("verysecrettoken"));
        assert!(debug.contains("EAAB***"));
    }

    #[test]
    fn test_validate_rejects_empty_reply_message() {
        let mut config = Config::for_testing("http://localhost", PathBuf::from("posts"));
        config.reply_message = "  ".to_string();
        assert!(config.validate().is_err());

        config.reply_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = Config::for_testing("not a url", PathBuf::from("posts"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { name, .. }) if name == "GRAPH_API_BASE"
        ));
    }

    #[test]
    fn test_with_access_token_keeps_other_fields() {
        let config = Config::for_testing("http://localhost", PathBuf::from("posts"));
        let upgraded = config.with_access_token("page-token".to_string());
        assert_eq!(upgraded.access_token, "page-token");
        assert_eq!(upgraded.target, config.target);
        assert_eq!(upgraded.posts_dir, config.posts_dir);
    }

    #[test]
    fn test_target_ids() {
        assert_eq!(Target::Page("1".into()).page_id(), Some("1"));
        assert_eq!(Target::Group("2".into()).page_id(), None);
        assert_eq!(Target::Group("2".into()).id(), "2");
    }
}
