//! HTTP session against the Vault API
//!
//! The session executes a templated GET below `<address>/v1/` and decodes the
//! Vault JSON envelope of a 200 response. Every other status is returned to the
//! caller as a response entity without a body; only transport failures are errors.

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Result, VaultConfigError};

/// Vault JSON response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultResponse {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub auth: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub lease_id: Option<String>,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub wrap_info: Option<Map<String, Value>>,
}

/// Outcome of a single exchange with Vault
#[derive(Debug, Clone)]
pub struct VaultResponseEntity {
    pub status: StatusCode,
    pub uri: String,
    /// Decoded envelope, present only for 200 responses
    pub body: Option<VaultResponse>,
    pub message: String,
}

/// Capability to execute a templated GET against Vault
#[async_trait::async_trait]
pub trait VaultSession: Send + Sync {
    async fn exchange(
        &self,
        path_template: &str,
        variables: &HashMap<String, String>,
    ) -> Result<VaultResponseEntity>;
}

#[derive(Deserialize)]
struct VaultErrors {
    #[serde(default)]
    errors: Vec<String>,
}

/// reqwest-backed Vault session
#[derive(Clone)]
pub struct HttpVaultSession {
    client: Client,
    address: String,
    token: Option<String>,
}

impl HttpVaultSession {
    /// Create a new session for the Vault server at `address`
    pub fn new(address: String, token: Option<String>) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            address,
            token,
        })
    }

    /// Build the request URL for an already expanded Vault path
    pub(crate) fn build_url(&self, path: &str) -> Result<Url> {
        let base = format!("{}/v1/", self.address.trim_end_matches('/'));
        let mut url = Url::parse(&base)
            .map_err(|e| VaultConfigError::InvalidUrl(format!("{}: {}", self.address, e)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| VaultConfigError::InvalidUrl(self.address.clone()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }

        Ok(url)
    }
}

#[async_trait::async_trait]
impl VaultSession for HttpVaultSession {
    async fn exchange(
        &self,
        path_template: &str,
        variables: &HashMap<String, String>,
    ) -> Result<VaultResponseEntity> {
        let path = expand_template(path_template, variables)?;
        let url = self.build_url(&path)?;
        debug!("Reading config from: {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(ref token) = self.token {
            request = request.header("X-Vault-Token", token);
        }

        let response = request.send().await?;
        let status = response.status();
        let uri = url.to_string();

        if status == StatusCode::OK {
            let body: VaultResponse = response.json().await?;
            return Ok(VaultResponseEntity {
                status,
                uri,
                body: Some(body),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let text = response.text().await.unwrap_or_default();
        Ok(VaultResponseEntity {
            status,
            uri,
            body: None,
            message: error_message(status, &text),
        })
    }
}

/// Extract the Vault `errors` array from an error body, falling back to the
/// status reason phrase
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<VaultErrors>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join(", "),
        _ => status.canonical_reason().unwrap_or_default().to_string(),
    }
}

/// Substitute `{name}` placeholders in a path template
pub fn expand_template(template: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            VaultConfigError::Template(format!("unclosed placeholder in '{}'", template))
        })?;
        let name = &after[..end];
        let value = variables.get(name).ok_or_else(|| {
            VaultConfigError::Template(format!("no value for variable '{}' in '{}'", name, template))
        })?;
        expanded.push_str(value);
        rest = &after[end + 1..];
    }

    if rest.contains('}') {
        return Err(VaultConfigError::Template(format!(
            "unmatched '}}' in '{}'",
            template
        )));
    }
    expanded.push_str(rest);

    Ok(expanded)
}
