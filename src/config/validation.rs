use super::models::Config;
use axum::http::HeaderName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("limits.max_upload_bytes must be positive")]
    ZeroUploadLimit,

    #[error("server.api_prefix '{0}' must start with '/' and must not end with '/'")]
    InvalidApiPrefix(String),

    #[error("cors.allowed_headers contains invalid header name '{0}'")]
    InvalidCorsHeader(String),
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_limits(config)?;
    validate_prefix(config)?;
    validate_cors(config)?;
    Ok(())
}

fn validate_limits(config: &Config) -> Result<(), ValidationError> {
    if config.limits.max_upload_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroUploadLimit);
    }
    Ok(())
}

fn validate_prefix(config: &Config) -> Result<(), ValidationError> {
    let prefix = &config.server.api_prefix;
    if prefix.is_empty() {
        return Ok(());
    }

    if !prefix.starts_with('/') || prefix.ends_with('/') {
        return Err(ValidationError::InvalidApiPrefix(prefix.clone()));
    }
    Ok(())
}

fn validate_cors(config: &Config) -> Result<(), ValidationError> {
    for header in &config.cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            return Err(ValidationError::InvalidCorsHeader(header.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let mut config = Config::default();
        config.limits.max_upload_bytes = ByteSize(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroUploadLimit)
        ));
    }

    #[test]
    fn test_api_prefix_rules() {
        let mut config = Config::default();

        for ok in ["", "/api", "/v1/images"] {
            config.server.api_prefix = ok.to_string();
            assert!(validate(&config).is_ok(), "prefix {ok:?}");
        }

        for bad in ["api", "/api/", "/"] {
            config.server.api_prefix = bad.to_string();
            assert!(
                matches!(validate(&config), Err(ValidationError::InvalidApiPrefix(_))),
                "prefix {bad:?}"
            );
        }
    }

    #[test]
    fn test_invalid_cors_header_rejected() {
        let mut config = Config::default();
        config.cors.allowed_headers.push("Bad Header".to_string());
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidCorsHeader(h)) if h == "Bad Header"
        ));
    }
}
