//! Configuration validation.
//!
//! Serde handles syntax; this checks the values make sense together.
//! All problems are reported, not just the first.

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("listener.bind_address '{0}' is not in host:port form")]
    MalformedBindAddress(String),

    #[error("cors.allowed_methods must not be empty")]
    EmptyMethods,

    #[error("listener.tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bind = config.listener.bind_address.trim();
    if bind.is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    } else {
        match bind.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => {}
            _ => errors.push(ValidationError::MalformedBindAddress(bind.to_string())),
        }
    }

    if config.cors.allowed_methods.trim().is_empty() {
        errors.push(ValidationError::EmptyMethods);
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "localhost".into();
        config.cors.allowed_methods = "  ".into();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MalformedBindAddress("localhost".into()),
                ValidationError::EmptyMethods,
                ValidationError::ZeroTimeout("request_secs"),
            ]
        );
    }

    #[test]
    fn tls_paths_must_be_set() {
        let mut config = ProxyConfig::default();
        config.listener.tls = Some(TlsConfig {
            cert_path: "cert.pem".into(),
            key_path: String::new(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyTlsPath("key_path")]);
    }

    #[test]
    fn ipv6_bind_address_accepted() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "[::1]:4242".into();
        assert!(validate_config(&config).is_ok());
    }
}
