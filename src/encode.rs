use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::credentials::Credentials;
use crate::domain::ExperimentId;
use crate::error::AnnexError;
use crate::metadata::type_tags;

pub const EXPERIMENT_TYPE: &str = "Experiment";

pub trait EncodeClient {
    fn fetch_experiment(&self, id: &ExperimentId) -> Result<Value, AnnexError>;
    fn download_url(&self, href: &str) -> String;
}

#[derive(Clone)]
pub struct EncodeHttpClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl EncodeHttpClient {
    pub fn new(host: &str, credentials: Option<Credentials>) -> Result<Self, AnnexError> {
        Self::with_base_url(&format!("https://{host}"), credentials)
    }

    /// Talks to `base_url` (scheme and authority, no trailing slash) instead
    /// of `https://{host}`.
    pub fn with_base_url(
        base_url: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, AnnexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("encode-annex/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| AnnexError::EncodeHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| AnnexError::EncodeHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn get_json(&self, url: &str) -> Result<Value, AnnexError> {
        let mut request = self.client.get(url).query(&[("format", "json")]);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.login, Some(&credentials.password));
        }
        debug!(url, authenticated = self.credentials.is_some(), "GET");
        let response = request
            .send()
            .map_err(|err| AnnexError::EncodeHttp(err.to_string()))?;
        if response.status() != StatusCode::OK {
            return Err(AnnexError::EncodeStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        response
            .json::<Value>()
            .map_err(|err| AnnexError::EncodeHttp(err.to_string()))
    }
}

impl EncodeClient for EncodeHttpClient {
    fn fetch_experiment(&self, id: &ExperimentId) -> Result<Value, AnnexError> {
        let url = experiment_url(&self.base_url, id);
        let object = self.get_json(&url)?;
        ensure_experiment(id, &object)?;
        Ok(object)
    }

    fn download_url(&self, href: &str) -> String {
        download_url(&self.base_url, href)
    }
}

pub fn experiment_url(base_url: &str, id: &ExperimentId) -> String {
    format!("{base_url}/experiments/{}", id.as_str())
}

pub fn download_url(base_url: &str, href: &str) -> String {
    format!("{base_url}{href}")
}

pub fn ensure_experiment(id: &ExperimentId, object: &Value) -> Result<(), AnnexError> {
    let Some(map) = object.as_object() else {
        return Err(AnnexError::NotAnExperiment {
            id: id.to_string(),
            types: "<not an object>".to_string(),
        });
    };
    if type_tags(map).any(|tag| tag == EXPERIMENT_TYPE) {
        return Ok(());
    }
    Err(AnnexError::NotAnExperiment {
        id: id.to_string(),
        types: type_tags(map).collect::<Vec<_>>().join(","),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_urls() {
        let id: ExperimentId = "ENCSR000AKA".parse().unwrap();
        assert_eq!(
            experiment_url("https://www.encodeproject.org", &id),
            "https://www.encodeproject.org/experiments/ENCSR000AKA"
        );
        assert_eq!(
            download_url("https://example.org", "/files/ENCFF000ABC/@@download/ENCFF000ABC.bam"),
            "https://example.org/files/ENCFF000ABC/@@download/ENCFF000ABC.bam"
        );
    }

    #[test]
    fn experiment_type_check() {
        let id: ExperimentId = "ENCSR000AKA".parse().unwrap();
        assert!(ensure_experiment(&id, &json!({"@type": ["Experiment", "Dataset", "Item"]})).is_ok());
        assert_matches!(
            ensure_experiment(&id, &json!({"@type": ["File", "Item"]})),
            Err(AnnexError::NotAnExperiment { .. })
        );
        assert_matches!(
            ensure_experiment(&id, &json!({"status": "released"})),
            Err(AnnexError::NotAnExperiment { .. })
        );
    }
}
