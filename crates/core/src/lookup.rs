//! Diagnosis lookup client.
//!
//! Builds the symptom checker query URL from a [`DiagnosisQuery`] and the configured
//! credentials, fetches it through an injected [`HttpFetch`] capability and returns the raw
//! response document. Every call is awaited by the turn that issued it and bounded by
//! [`LookupConfig::timeout`]; nothing about a lookup outlives the call.

use crate::config::{Gender, LookupConfig};
use crate::{HttpError, LookupError};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::sync::Arc;

/// Characters left unescaped when encoding a complete URL (the `encodeURI` set).
const URI_RESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// Characters left unescaped when encoding a single query value (the `encodeURIComponent` set).
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a fully composed URL, keeping URL delimiters intact.
pub fn encode_uri(url: &str) -> String {
    utf8_percent_encode(url, URI_RESERVED).to_string()
}

/// Percent-encode a single query value.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// HTTP GET capability used for the symptom checker.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Fetch `url` and return the response body. Non-2xx statuses are errors.
    async fn get(&self, url: &str) -> Result<String, HttpError>;
}

/// [`HttpFetch`] backed by a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct ReqwestFetcher {
    http: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<String, HttpError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
            });
        }

        resp.text()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))
    }
}

/// One symptom checker query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosisQuery {
    /// Comma-separated symptoms with no empty items and no padding around commas.
    pub symptom_text: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub region_id: u32,
}

impl DiagnosisQuery {
    /// Build a query from free text, taking demographic parameters from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidQuery`] if no symptoms remain after normalisation.
    pub fn from_text(text: &str, config: &LookupConfig) -> Result<Self, LookupError> {
        let symptom_text = normalize_symptoms(text);
        if symptom_text.is_empty() {
            return Err(LookupError::InvalidQuery(
                "no symptoms found in query text".into(),
            ));
        }

        Ok(Self {
            symptom_text,
            date_of_birth: config.date_of_birth.clone(),
            gender: config.gender,
            region_id: config.region_id,
        })
    }
}

/// Collapse runs of commas and whitespace into single commas and trim the ends.
///
/// `"headache,  ,back pain"` becomes `"headache,back pain"`.
pub fn normalize_symptoms(text: &str) -> String {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Client for the symptom checker diagnosis endpoint.
#[derive(Clone)]
pub struct DiagnosisLookupClient {
    config: LookupConfig,
    fetcher: Arc<dyn HttpFetch>,
}

impl DiagnosisLookupClient {
    pub fn new(config: LookupConfig, fetcher: Arc<dyn HttpFetch>) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// The encoded request URL for `query`.
    pub fn query_url(&self, query: &DiagnosisQuery) -> String {
        self.compose_url(query, &self.config.password)
    }

    /// Fetch the raw diagnosis document for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Http`] for transport failures and non-2xx statuses, and
    /// [`LookupError::Timeout`] if no complete answer arrives within the configured timeout.
    pub async fn lookup(&self, query: &DiagnosisQuery) -> Result<String, LookupError> {
        let url = self.query_url(query);
        tracing::debug!("symptom checker query: {}", self.compose_url(query, "***"));

        let timeout = self.config.timeout;
        let body = tokio::time::timeout(timeout, self.fetcher.get(&url))
            .await
            .map_err(|_| LookupError::Timeout(timeout))??;

        tracing::debug!("symptom checker answered with {} bytes", body.len());
        Ok(body)
    }

    fn compose_url(&self, query: &DiagnosisQuery, password: &str) -> String {
        let cfg = &self.config;
        let raw = format!(
            "{endpoint}?flag=sortbyRW_advanced&search_type=diagnosis&system_id={system_id}\
             &region={region}&logic=&pre_diagnoses_id=&n_return=&query[use_synonym]=1\
             &specialties={specialties}&web_service=true&id={user_id}&password={password}\
             &dob={dob}&sex={sex}&querytext={text}",
            endpoint = cfg.endpoint,
            system_id = cfg.system_id,
            region = query.region_id,
            specialties = cfg.specialties,
            user_id = cfg.user_id,
            dob = query.date_of_birth,
            sex = query.gender.as_param(),
            text = query.symptom_text,
        );
        encode_uri(&raw)
    }
}
