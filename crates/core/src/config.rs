//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads environment variables; credentials
//! for the platform and the symptom checker flow in through [`BotConfig`] and [`LookupConfig`].

use crate::constants::{
    DEFAULT_DATE_OF_BIRTH, DEFAULT_DIAGNOSIS_SEARCH_URL, DEFAULT_GRAPH_API_URL,
    DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_REGION_ID, DEFAULT_SPECIALTIES,
    DEFAULT_SYMPTOM_CHECKER_URL, DEFAULT_SYSTEM_ID,
};
use crate::validation::{validate_base_url, validate_secret};
use crate::{ConfigError, ConfigResult};
use std::time::Duration;

/// Gender parameter sent with diagnosis queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parses `m`, `f`, `male` or `female` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Some(Self::Male),
            "f" | "female" => Some(Self::Female),
            _ => None,
        }
    }

    /// Returns the single-letter value the symptom checker expects.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Male => "m",
            Self::Female => "f",
        }
    }
}

/// Settings for the symptom checker integration.
#[derive(Clone, Debug)]
pub struct LookupConfig {
    /// Diagnosis endpoint, without query string.
    pub endpoint: String,
    pub user_id: String,
    pub password: String,
    pub region_id: u32,
    pub system_id: u32,
    pub specialties: u32,
    /// Date-of-birth parameter sent with every query.
    pub date_of_birth: String,
    pub gender: Gender,
    /// Upper bound on a single lookup, including reading the body.
    pub timeout: Duration,
    /// Host used to build per-diagnosis "more info" links.
    pub detail_search_url: String,
}

impl LookupConfig {
    /// Creates a lookup configuration with provider defaults for everything but the endpoint
    /// and credentials.
    pub fn new(
        endpoint: impl Into<String>,
        user_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_id: user_id.into(),
            password: password.into(),
            region_id: DEFAULT_REGION_ID,
            system_id: DEFAULT_SYSTEM_ID,
            specialties: DEFAULT_SPECIALTIES,
            date_of_birth: DEFAULT_DATE_OF_BIRTH.into(),
            gender: Gender::Male,
            timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
            detail_search_url: DEFAULT_DIAGNOSIS_SEARCH_URL.into(),
        }
    }

    /// Resolve only the symptom checker settings from a key/value source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the credentials are unset and
    /// [`ConfigError::Invalid`] for values that fail to parse or validate.
    pub fn from_lookup<F>(get: &F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut lookup = LookupConfig::new(
            optional(get, "SYMPTOM_CHECKER_URL", DEFAULT_SYMPTOM_CHECKER_URL),
            required(get, "SYMPTOM_CHECKER_USER_ID")?,
            required(get, "SYMPTOM_CHECKER_PASSWORD")?,
        );
        lookup.region_id = u32_from_env_value(
            "SYMPTOM_CHECKER_REGION",
            get("SYMPTOM_CHECKER_REGION"),
            DEFAULT_REGION_ID,
        )?;
        lookup.system_id = u32_from_env_value(
            "SYMPTOM_CHECKER_SYSTEM_ID",
            get("SYMPTOM_CHECKER_SYSTEM_ID"),
            DEFAULT_SYSTEM_ID,
        )?;
        lookup.specialties = u32_from_env_value(
            "SYMPTOM_CHECKER_SPECIALTIES",
            get("SYMPTOM_CHECKER_SPECIALTIES"),
            DEFAULT_SPECIALTIES,
        )?;
        lookup.date_of_birth = optional(get, "SYMPTOM_CHECKER_DOB", DEFAULT_DATE_OF_BIRTH);
        lookup.gender = gender_from_env_value(get("SYMPTOM_CHECKER_SEX"))?;
        lookup.timeout = lookup_timeout_from_env_value(get("SYMPTOM_CHECKER_TIMEOUT_SECS"))?;
        lookup.detail_search_url =
            optional(get, "DIAGNOSIS_SEARCH_URL", DEFAULT_DIAGNOSIS_SEARCH_URL);

        lookup.validated()
    }

    fn validated(self) -> ConfigResult<Self> {
        Ok(Self {
            endpoint: validate_base_url("SYMPTOM_CHECKER_URL", &self.endpoint)?,
            detail_search_url: validate_base_url(
                "DIAGNOSIS_SEARCH_URL",
                &self.detail_search_url,
            )?,
            user_id: validate_secret("SYMPTOM_CHECKER_USER_ID", &self.user_id)?,
            password: validate_secret("SYMPTOM_CHECKER_PASSWORD", &self.password)?,
            ..self
        })
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct BotConfig {
    app_secret: String,
    validation_token: String,
    page_access_token: String,
    server_url: String,
    graph_api_url: String,
    lookup: LookupConfig,
}

impl BotConfig {
    /// Create a new `BotConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a secret is blank or a URL is unusable.
    pub fn new(
        app_secret: String,
        validation_token: String,
        page_access_token: String,
        server_url: String,
        graph_api_url: String,
        lookup: LookupConfig,
    ) -> ConfigResult<Self> {
        let lookup = lookup.validated()?;

        Ok(Self {
            app_secret: validate_secret("MESSENGER_APP_SECRET", &app_secret)?,
            validation_token: validate_secret("MESSENGER_VALIDATION_TOKEN", &validation_token)?,
            page_access_token: validate_secret(
                "MESSENGER_PAGE_ACCESS_TOKEN",
                &page_access_token,
            )?,
            server_url: validate_base_url("SERVER_URL", &server_url)?,
            graph_api_url: validate_base_url("MESSENGER_GRAPH_API_URL", &graph_api_url)?,
            lookup,
        })
    }

    /// Resolve configuration from a key/value source such as the process environment.
    ///
    /// `get` is called with each variable name; `None` means unset. Typical use:
    /// `BotConfig::from_lookup(|key| std::env::var(key).ok())`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for unset required variables and
    /// [`ConfigError::Invalid`] for values that fail to parse or validate.
    pub fn from_lookup<F>(get: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = LookupConfig::from_lookup(&get)?;

        Self::new(
            required(&get, "MESSENGER_APP_SECRET")?,
            required(&get, "MESSENGER_VALIDATION_TOKEN")?,
            required(&get, "MESSENGER_PAGE_ACCESS_TOKEN")?,
            required(&get, "SERVER_URL")?,
            optional(&get, "MESSENGER_GRAPH_API_URL", DEFAULT_GRAPH_API_URL),
            lookup,
        )
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    pub fn validation_token(&self) -> &str {
        &self.validation_token
    }

    pub fn page_access_token(&self) -> &str {
        &self.page_access_token
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn graph_api_url(&self) -> &str {
        &self.graph_api_url
    }

    pub fn lookup(&self) -> &LookupConfig {
        &self.lookup
    }
}

fn required<F>(get: &F, var: &'static str) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn optional<F>(get: &F, var: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get(var)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Parse an optional unsigned setting, falling back to `default` when unset or blank.
pub fn u32_from_env_value(
    var: &'static str,
    value: Option<String>,
    default: u32,
) -> ConfigResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(default),
        Some(v) => v.parse::<u32>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

/// Parse the lookup timeout in whole seconds. Zero is rejected.
pub fn lookup_timeout_from_env_value(value: Option<String>) -> ConfigResult<Duration> {
    let secs = u32_from_env_value(
        "SYMPTOM_CHECKER_TIMEOUT_SECS",
        value,
        DEFAULT_LOOKUP_TIMEOUT_SECS as u32,
    )?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var: "SYMPTOM_CHECKER_TIMEOUT_SECS",
            reason: "timeout must be at least one second".into(),
        });
    }
    Ok(Duration::from_secs(u64::from(secs)))
}

/// Parse the gender parameter; unset means [`Gender::Male`].
pub fn gender_from_env_value(value: Option<String>) -> ConfigResult<Gender> {
    match value.filter(|v| !v.trim().is_empty()) {
        None => Ok(Gender::Male),
        Some(v) => Gender::parse(&v).ok_or_else(|| ConfigError::Invalid {
            var: "SYMPTOM_CHECKER_SEX",
            reason: format!("expected m or f, got {v:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn required_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MESSENGER_APP_SECRET", "secret"),
            ("MESSENGER_VALIDATION_TOKEN", "verify-me"),
            ("MESSENGER_PAGE_ACCESS_TOKEN", "page-token"),
            ("SERVER_URL", "https://bot.example.com/"),
            ("SYMPTOM_CHECKER_USER_ID", "user"),
            ("SYMPTOM_CHECKER_PASSWORD", "pass"),
        ]
    }

    #[test]
    fn resolves_defaults() {
        let vars = env(&required_vars());
        let cfg = BotConfig::from_lookup(|k| vars.get(k).cloned()).expect("config");

        assert_eq!(cfg.server_url(), "https://bot.example.com");
        assert_eq!(cfg.graph_api_url(), DEFAULT_GRAPH_API_URL);
        assert_eq!(cfg.lookup().endpoint, DEFAULT_SYMPTOM_CHECKER_URL);
        assert_eq!(cfg.lookup().region_id, 1);
        assert_eq!(cfg.lookup().system_id, 2138);
        assert_eq!(cfg.lookup().gender, Gender::Male);
        assert_eq!(cfg.lookup().timeout, Duration::from_secs(5));
    }

    #[test]
    fn reports_missing_required_variable() {
        let mut pairs = required_vars();
        pairs.retain(|(k, _)| *k != "SYMPTOM_CHECKER_PASSWORD");
        let vars = env(&pairs);

        let err = BotConfig::from_lookup(|k| vars.get(k).cloned()).expect_err("should fail");
        assert!(matches!(err, ConfigError::Missing("SYMPTOM_CHECKER_PASSWORD")));
    }

    #[test]
    fn overrides_lookup_settings() {
        let mut pairs = required_vars();
        pairs.extend([
            ("SYMPTOM_CHECKER_REGION", "4"),
            ("SYMPTOM_CHECKER_SEX", "F"),
            ("SYMPTOM_CHECKER_TIMEOUT_SECS", "2"),
            ("SYMPTOM_CHECKER_DOB", "1980-02-03"),
        ]);
        let vars = env(&pairs);
        let cfg = BotConfig::from_lookup(|k| vars.get(k).cloned()).expect("config");

        assert_eq!(cfg.lookup().region_id, 4);
        assert_eq!(cfg.lookup().gender, Gender::Female);
        assert_eq!(cfg.lookup().timeout, Duration::from_secs(2));
        assert_eq!(cfg.lookup().date_of_birth, "1980-02-03");
    }

    #[test]
    fn lookup_settings_resolve_without_messenger_secrets() {
        let vars = env(&[
            ("SYMPTOM_CHECKER_USER_ID", "user"),
            ("SYMPTOM_CHECKER_PASSWORD", "pass"),
            ("SYMPTOM_CHECKER_URL", "https://checker.example.com/diagnosis/"),
        ]);
        let lookup = LookupConfig::from_lookup(&|k: &str| vars.get(k).cloned()).expect("config");

        assert_eq!(lookup.endpoint, "https://checker.example.com/diagnosis");
        assert_eq!(lookup.detail_search_url, DEFAULT_DIAGNOSIS_SEARCH_URL);
    }

    #[test]
    fn rejects_invalid_numbers_and_zero_timeout() {
        let err = u32_from_env_value("SYMPTOM_CHECKER_REGION", Some("north".into()), 1)
            .expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid { var: "SYMPTOM_CHECKER_REGION", .. }));

        assert!(lookup_timeout_from_env_value(Some("0".into())).is_err());
        assert!(gender_from_env_value(Some("x".into())).is_err());
    }
}
