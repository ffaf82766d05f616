//! Input validation utilities.
//!
//! Configuration values end up embedded in outbound URLs (the symptom checker query, the
//! Send API endpoint, the account-linking target). These checks run once at startup.

use url::Url;

use crate::{ConfigError, ConfigResult};

/// Validates that a configured base URL is usable as an HTTP(S) prefix.
///
/// - Rejects empty or whitespace-only strings and anything [`Url::parse`] refuses
/// - Requires an `http` or `https` scheme with a non-empty host
/// - Rejects query strings and fragments
///
/// Trailing slashes are stripped from the returned value so callers can append paths.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming `var` if the value is unusable.
pub fn validate_base_url(var: &'static str, value: &str) -> ConfigResult<String> {
    let value = value.trim();
    let invalid = |reason: String| ConfigError::Invalid { var, reason };

    if value.is_empty() {
        return Err(invalid("URL cannot be empty".into()));
    }

    let parsed = Url::parse(value).map_err(|e| invalid(format!("Invalid URL format: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(invalid(format!(
                "URL scheme must be http or https, got {scheme}"
            )))
        }
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL has no host".into()));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid(
            "URL must not contain a query string or a fragment".into(),
        ));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_owned())
}

/// Validates a secret or token: non-empty once trimmed.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming `var` if the value is blank.
pub fn validate_secret(var: &'static str, value: &str) -> ConfigResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Invalid {
            var,
            reason: "value cannot be empty".into(),
        });
    }
    Ok(value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash() {
        let url = validate_base_url("SERVER_URL", " https://bot.example.com/ ").unwrap();
        assert_eq!(url, "https://bot.example.com");
    }

    #[test]
    fn rejects_missing_scheme_and_query() {
        assert!(validate_base_url("SERVER_URL", "bot.example.com").is_err());
        assert!(validate_base_url("SERVER_URL", "https://bot.example.com?x=1").is_err());
        assert!(validate_base_url("SERVER_URL", "   ").is_err());
        assert!(validate_base_url("SERVER_URL", "https://bot.example.com/#top").is_err());
        assert!(validate_base_url("SERVER_URL", "ftp://bot.example.com").is_err());
        assert!(validate_base_url("SERVER_URL", "http://").is_err());
        assert!(validate_base_url("SERVER_URL", "https:///").is_err());
        assert!(validate_base_url("SERVER_URL", "http://:99999").is_err());
    }

    #[test]
    fn keeps_path_and_port() {
        let url = validate_base_url("DIAGNOSIS_SEARCH_URL", "http://localhost:8080/search.asp/")
            .unwrap();
        assert_eq!(url, "http://localhost:8080/search.asp");
    }

    #[test]
    fn secret_must_not_be_blank() {
        assert!(validate_secret("MESSENGER_APP_SECRET", " ").is_err());
        assert_eq!(validate_secret("MESSENGER_APP_SECRET", " s3cret ").unwrap(), "s3cret");
    }
}
