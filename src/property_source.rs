//! Property sources assembled from the generic secret backend
//!
//! For an application `orders` with profile `cloud`, the locator reads (in
//! ascending precedence) `secret/application`, `secret/application/cloud`,
//! `secret/orders` and `secret/orders/cloud`.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::backends::{GenericSecretBackendMetadata, SecretBackendMetadata};
use crate::config::GenericBackendProperties;
use crate::error::Result;
use crate::template::VaultConfigOperations;

/// Properties read from a single Vault path
#[derive(Debug, Clone, PartialEq)]
pub struct VaultPropertySource {
    name: String,
    properties: BTreeMap<String, String>,
}

impl VaultPropertySource {
    pub fn new(name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Ordered set of property sources, later sources taking precedence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositePropertySource {
    sources: Vec<VaultPropertySource>,
}

impl CompositePropertySource {
    pub fn push(&mut self, source: VaultPropertySource) {
        self.sources.push(source);
    }

    /// Sources in ascending precedence
    pub fn sources(&self) -> &[VaultPropertySource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Look up `key` in the highest-precedence source that defines it
    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.sources
            .iter()
            .rev()
            .find_map(|source| source.get_property(key))
    }

    /// All properties with higher-precedence sources overriding lower ones
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for source in &self.sources {
            merged.extend(
                source
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
        }
        merged
    }
}

/// Contexts to read for the given profiles, in ascending precedence
pub fn generic_contexts(properties: &GenericBackendProperties, profiles: &[String]) -> Vec<String> {
    let mut contexts: Vec<String> = Vec::new();

    for base in [&properties.default_context, &properties.application_name] {
        if base.is_empty() {
            continue;
        }
        let mut candidates = vec![base.clone()];
        candidates.extend(
            profiles
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| format!("{}{}{}", base, properties.profile_separator, p)),
        );

        for candidate in candidates {
            if !contexts.contains(&candidate) {
                contexts.push(candidate);
            }
        }
    }

    contexts
}

/// Locates Vault property sources for an application
pub struct PropertySourceLocator<'a> {
    operations: &'a dyn VaultConfigOperations,
    properties: &'a GenericBackendProperties,
}

impl<'a> PropertySourceLocator<'a> {
    pub fn new(
        operations: &'a dyn VaultConfigOperations,
        properties: &'a GenericBackendProperties,
    ) -> Self {
        Self {
            operations,
            properties,
        }
    }

    /// Read every context for `profiles`, skipping paths that yield no secrets
    pub async fn locate(&self, profiles: &[String]) -> Result<CompositePropertySource> {
        let mut composite = CompositePropertySource::default();

        if !self.properties.enabled {
            debug!("Generic backend disabled, no property sources located");
            return Ok(composite);
        }

        for context in generic_contexts(self.properties, profiles) {
            let backend = GenericSecretBackendMetadata::new(&self.properties.backend, context);

            if let Some(secrets) = self.operations.read(&backend).await? {
                info!(
                    "Located property source {} with {} properties",
                    backend.name(),
                    secrets.data().len()
                );
                composite.push(VaultPropertySource::new(backend.name(), secrets.into_data()));
            }
        }

        Ok(composite)
    }
}
