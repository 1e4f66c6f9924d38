//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
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
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load a configuration from a TOML file without validating it.
///
/// Validation is deferred so command-line overrides can be applied first.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Validate a fully assembled configuration.
pub fn finalize_config(config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, UpstreamTls};

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [cors]
            allowed_origin = "https://app.example.com"
            allow_credentials = true

            [upstream]
            tls = "verify"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cors.allowed_origin, "https://app.example.com");
        assert!(config.cors.allow_credentials);
        assert_eq!(config.cors.allowed_methods, ProxyConfig::default().cors.allowed_methods);
        assert_eq!(config.upstream.tls, UpstreamTls::Verify);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.bind_address, "localhost:4242");
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = parse_config("[upstream]\ntls = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn finalize_reports_validation_errors() {
        let mut config = ProxyConfig::default();
        config.cors.allowed_methods.clear();

        let err = finalize_config(config).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: cors.allowed_methods must not be empty");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/cors-proxy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
