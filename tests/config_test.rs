//! Integration tests for loading configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use page_reply_sync::config::{Config, ConfigError, Target};
use serial_test::serial;

const VARS: &[&str] = &[
    "ACCESS_TOKEN",
    "PAGE_ID",
    "GROUP_ID",
    "GRAPH_API_BASE",
    "GRAPH_API_VERSION",
    "HTTP_TIMEOUT_SECS",
    "POSTS_DIR",
    "SUMMARY_PATH",
    "REPLY_ENABLED",
    "REPLY_MESSAGE",
    "REPLY_DELAY_SECS",
    "COMMENT_PAGE_DELAY_SECS",
    "FEED_PAGE_DELAY_SECS",
    "REQUIRE_PAGE_TOKEN",
    "CHECK_PERMISSIONS",
    "SYNC_INTERVAL_SECS",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();
    std::env::set_var("ACCESS_TOKEN", "EAABtoken");
    std::env::set_var("PAGE_ID", "111");

    let config = Config::from_env().expect("Failed to load config");
    config.validate().expect("Config should be valid");

    assert_eq!(config.target, Target::Page("111".to_string()));
    assert_eq!(config.graph_api_base, "https://graph.facebook.com");
    assert_eq!(config.graph_api_version, "v19.0");
    assert_eq!(config.posts_dir, PathBuf::from("posts"));
    assert!(config.reply_enabled);
    assert_eq!(config.reply_message, "Thank for comment");
    assert_eq!(config.reply_delay, Duration::from_secs(2));
    assert_eq!(config.comment_page_delay, Duration::from_secs(1));
    assert_eq!(config.feed_page_delay, Duration::from_secs(2));
    assert_eq!(config.http_timeout, Duration::from_secs(30));
    assert!(!config.require_page_token);
    assert!(config.check_permissions);
    assert!(config.sync_interval.is_none());
    assert!(config.summary_path.is_none());

    clear_env();
}

#[test]
#[serial]
fn test_missing_token_is_an_error() {
    clear_env();
    std::env::set_var("PAGE_ID", "111");

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == "ACCESS_TOKEN"));

    clear_env();
}

#[test]
#[serial]
fn test_missing_target_is_an_error() {
    clear_env();
    std::env::set_var("ACCESS_TOKEN", "EAABtoken");

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref name) if name == "PAGE_ID"));

    clear_env();
}

#[test]
#[serial]
fn test_group_target_and_page_precedence() {
    clear_env();
    std::env::set_var("ACCESS_TOKEN", "EAABtoken");
    std::env::set_var("GROUP_ID", "555");

    let config = Config::from_env().unwrap();
    assert_eq!(config.target, Target::Group("555".to_string()));

    std::env::set_var("PAGE_ID", "111");
    let config = Config::from_env().unwrap();
    assert_eq!(config.target, Target::Page("111".to_string()));

    clear_env();
}

#[test]
#[serial]
fn test_overrides() {
    clear_env();
    std::env::set_var("ACCESS_TOKEN", "EAABtoken");
    std::env::set_var("PAGE_ID", "111");
    std::env::set_var("REPLY_ENABLED", "false");
    std::env::set_var("REPLY_DELAY_SECS", "5");
    std::env::set_var("SYNC_INTERVAL_SECS", "900");
    std::env::set_var("POSTS_DIR", "/var/lib/sync/posts");
    std::env::set_var("SUMMARY_PATH", "/var/lib/sync/summary.json");

    let config = Config::from_env().unwrap();
    assert!(!config.reply_enabled);
    assert_eq!(config.reply_delay, Duration::from_secs(5));
    assert_eq!(config.sync_interval, Some(Duration::from_secs(900)));
    assert_eq!(config.posts_dir, PathBuf::from("/var/lib/sync/posts"));
    assert_eq!(
        config.summary_path,
        Some(PathBuf::from("/var/lib/sync/summary.json"))
    );

    clear_env();
}

#[test]
#[serial]
fn test_invalid_numbers_and_booleans() {
    clear_env();
    std::env::set_var("ACCESS_TOKEN", "EAABtoken");
    std::env::set_var("PAGE_ID", "111");

    std::env::set_var("REPLY_DELAY_SECS", "two");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseInt { .. })
    ));
    std::env::remove_var("REPLY_DELAY_SECS");

    std::env::set_var("REPLY_ENABLED", "sometimes");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseBool { .. })
    ));
    std::env::remove_var("REPLY_ENABLED");

    std::env::set_var("SYNC_INTERVAL_SECS", "0");
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    clear_env();
}
