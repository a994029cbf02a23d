//! Blocking HTTP client for the SciCat REST API.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::resolve::parse_catalog_url;
use super::CatalogGateway;
use crate::error::IngestError;
use crate::model::io_json::{datablocks_from_slice, record_from_slice};
use crate::model::{DatasetId, DatasetRecord, OrigDatablock};

/// Default global timeout for a single catalog request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configures and authenticates a [`ScicatClient`].
#[derive(Clone, Debug)]
pub struct ScicatClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl ScicatClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a client that authenticates with an existing access token.
    pub fn with_token(self, token: impl Into<String>) -> Result<ScicatClient, IngestError> {
        Ok(ScicatClient {
            base_url: parse_catalog_url(&self.base_url)?,
            token: token.into(),
            agent: build_agent(self.timeout),
        })
    }

    /// Logs in with username and password and builds a client with the returned token.
    pub fn login(self, username: &str, password: &str) -> Result<ScicatClient, IngestError> {
        let base_url = parse_catalog_url(&self.base_url)?;
        let agent = build_agent(self.timeout);

        let endpoint = "Users/login";
        let url = endpoint_url(&base_url, &["Users", "login"], None)?;
        let body = serde_json::json!({"username": username, "password": password});
        tracing::debug!(endpoint, user = username, "logging in to catalog");

        let mut response = agent
            .post(url.as_str())
            .send_json(&body)
            .map_err(|source| comm_error(endpoint, source))?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|source| comm_error(endpoint, source))?;

        let value: Value =
            serde_json::from_str(&text).map_err(|source| IngestError::CatalogParse {
                endpoint: endpoint.to_string(),
                source,
            })?;
        let token = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| IngestError::CatalogComm {
                endpoint: endpoint.to_string(),
                message: "login response does not contain a token".to_string(),
            })?;

        Ok(ScicatClient {
            base_url,
            token: token.to_string(),
            agent,
        })
    }
}

/// Authenticated SciCat client.
#[derive(Clone)]
pub struct ScicatClient {
    base_url: Url,
    token: String,
    agent: ureq::Agent,
}

impl fmt::Debug for ScicatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScicatClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ScicatClient {
    /// Starts configuring a client for the API at `base_url` (e.g. `http://localhost:3000/api/v3`).
    pub fn builder(base_url: impl Into<String>) -> ScicatClientBuilder {
        ScicatClientBuilder {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn get_text(&self, segments: &[&str]) -> Result<String, IngestError> {
        let endpoint = segments.join("/");
        let url = endpoint_url(&self.base_url, segments, Some(&self.token))?;
        tracing::debug!(endpoint = %endpoint, "GET");

        let mut response = self
            .agent
            .get(url.as_str())
            .header("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|source| comm_error(&endpoint, source))?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|source| comm_error(&endpoint, source))
    }

    fn post_text<T: Serialize>(&self, segments: &[&str], body: &T) -> Result<String, IngestError> {
        let endpoint = segments.join("/");
        let url = endpoint_url(&self.base_url, segments, Some(&self.token))?;
        tracing::debug!(endpoint = %endpoint, "POST");

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", &format!("Bearer {}", self.token))
            .send_json(body)
            .map_err(|source| comm_error(&endpoint, source))?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|source| comm_error(&endpoint, source))
    }
}

impl CatalogGateway for ScicatClient {
    fn create_record(&self, record: &DatasetRecord) -> Result<DatasetId, IngestError> {
        let text = self.post_text(&["Datasets"], record)?;
        extract_pid("Datasets", &text)
    }

    fn get_record(&self, id: &DatasetId) -> Result<DatasetRecord, IngestError> {
        let text = self.get_text(&["Datasets", id.as_str()])?;
        record_from_slice(text.as_bytes()).map_err(|source| IngestError::CatalogParse {
            endpoint: format!("Datasets/{id}"),
            source,
        })
    }

    fn get_manifests(&self, id: &DatasetId) -> Result<Vec<OrigDatablock>, IngestError> {
        let text = self.get_text(&["Datasets", id.as_str(), "origdatablocks"])?;
        datablocks_from_slice(text.as_bytes()).map_err(|source| IngestError::CatalogParse {
            endpoint: format!("Datasets/{id}/origdatablocks"),
            source,
        })
    }

    fn create_manifest(&self, manifest: &OrigDatablock) -> Result<(), IngestError> {
        self.post_text(&["OrigDatablocks"], manifest)?;
        Ok(())
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    config.into()
}

/// Appends path segments (percent-encoded, so pids containing `/` stay one
/// segment) and the optional access token.
fn endpoint_url(base: &Url, segments: &[&str], token: Option<&str>) -> Result<Url, IngestError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| IngestError::InvalidCatalogUrl {
            input: base.to_string(),
            message: "URL cannot be used as a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);

    if let Some(token) = token {
        url.query_pairs_mut().append_pair("access_token", token);
    }
    Ok(url)
}

fn comm_error(endpoint: &str, source: ureq::Error) -> IngestError {
    IngestError::CatalogComm {
        endpoint: endpoint.to_string(),
        message: source.to_string(),
    }
}

fn extract_pid(endpoint: &str, text: &str) -> Result<DatasetId, IngestError> {
    let value: Value = serde_json::from_str(text).map_err(|source| IngestError::CatalogParse {
        endpoint: endpoint.to_string(),
        source,
    })?;
    value
        .get("pid")
        .and_then(Value::as_str)
        .map(DatasetId::from)
        .ok_or_else(|| IngestError::CatalogComm {
            endpoint: endpoint.to_string(),
            message: "response does not contain a dataset pid".to_string(),
        })
}
