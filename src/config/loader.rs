//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{GuardConfig, SecurityConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid admin id '{value}' in ${var}")]
    AdminList { var: String, value: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GuardConfig, ConfigError> {
    let config: GuardConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Admin ids from the config file merged with the environment variable it names.
///
/// The variable is read once here; a missing or empty variable contributes nothing.
pub fn load_admin_ids(config: &SecurityConfig) -> Result<Vec<i64>, ConfigError> {
    let mut ids = config.admin_ids.clone();
    if let Ok(raw) = std::env::var(&config.admin_ids_env) {
        ids.extend(parse_admin_ids(&config.admin_ids_env, &raw)?);
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Parse a comma-separated list of numeric ids. Blank segments are skipped.
pub fn parse_admin_ids(var: &str, raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(ConfigError::AdminList {
                var: var.to_string(),
                value: s.to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids("ADMIN_USER_IDS", " 12, 34 ,,56").unwrap();
        assert_eq!(ids, vec![12, 34, 56]);
    }

    #[test]
    fn test_parse_admin_ids_rejects_garbage() {
        let err = parse_admin_ids("ADMIN_USER_IDS", "12,abc").unwrap_err();
        assert!(err.to_string().contains("abc"));
        assert!(parse_admin_ids("ADMIN_USER_IDS", "-5").is_err());
    }

    #[test]
    fn test_load_admin_ids_merges_env() {
        let config = SecurityConfig {
            admin_ids: vec![5, 1],
            admin_ids_env: "BOT_GUARD_TEST_ADMIN_IDS".into(),
        };
        std::env::set_var("BOT_GUARD_TEST_ADMIN_IDS", "3,5");
        let ids = load_admin_ids(&config).unwrap();
        std::env::remove_var("BOT_GUARD_TEST_ADMIN_IDS");

        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_parse_config_surfaces_validation() {
        let err = parse_config("[dedup]\nmax_age_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("max_age_ms"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = parse_config(include_str!("../../demos/guard.toml")).unwrap();
        let defaults = GuardConfig::default();
        assert_eq!(config.rate_limits.export, defaults.rate_limits.export);
        assert_eq!(config.dedup.max_age_ms, defaults.dedup.max_age_ms);
        assert_eq!(config.security.admin_ids_env, "ADMIN_USER_IDS");
    }
}
