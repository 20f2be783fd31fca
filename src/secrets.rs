use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::vault::VaultResponse;

/// Flattened secret properties read from Vault, with the lease metadata of the
/// response they came from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Secrets {
    data: BTreeMap<String, String>,
    auth: Option<Map<String, Value>>,
    metadata: Option<Map<String, Value>>,
    lease_duration: u64,
    lease_id: Option<String>,
    renewable: bool,
    request_id: Option<String>,
    warnings: Option<Vec<String>>,
    wrap_info: Option<Map<String, Value>>,
}

impl Secrets {
    /// Bundle `data` with the envelope metadata of `response`
    pub fn from_response(response: &VaultResponse, data: BTreeMap<String, String>) -> Self {
        Self {
            data,
            auth: response.auth.clone(),
            metadata: response.metadata.clone(),
            lease_duration: response.lease_duration,
            lease_id: response.lease_id.clone(),
            renewable: response.renewable,
            request_id: response.request_id.clone(),
            warnings: response.warnings.clone(),
            wrap_info: response.wrap_info.clone(),
        }
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    pub fn into_data(self) -> BTreeMap<String, String> {
        self.data
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn auth(&self) -> Option<&Map<String, Value>> {
        self.auth.as_ref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    /// Lease duration in seconds
    pub fn lease_duration(&self) -> u64 {
        self.lease_duration
    }

    pub fn lease_id(&self) -> Option<&str> {
        self.lease_id.as_deref()
    }

    pub fn is_renewable(&self) -> bool {
        self.renewable
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn warnings(&self) -> Option<&[String]> {
        self.warnings.as_deref()
    }

    pub fn wrap_info(&self) -> Option<&Map<String, Value>> {
        self.wrap_info.as_ref()
    }
}
