use std::collections::HashMap;
use std::fmt;

use super::transformer::PropertyTransformer;

/// Trait for references to a secret backend path in Vault
pub trait SecretBackendMetadata: Send + Sync {
    /// Name of the property source backed by this reference
    fn name(&self) -> String;

    /// Variables substituted into the `{backend}/{key}` path template
    fn variables(&self) -> HashMap<String, String>;

    /// Transformer applied to the flattened properties, if any
    fn property_transformer(&self) -> Option<&dyn PropertyTransformer> {
        None
    }
}

/// Reference to a key below a generic (KV) backend mount, e.g. `secret/myapp`
pub struct GenericSecretBackendMetadata {
    backend: String,
    key: String,
    transformer: Option<Box<dyn PropertyTransformer>>,
}

impl GenericSecretBackendMetadata {
    pub fn new(backend: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            key: key.into(),
            transformer: None,
        }
    }

    /// Attach a transformer applied to properties read through this reference
    pub fn with_transformer<T>(mut self, transformer: T) -> Self
    where
        T: PropertyTransformer + 'static,
    {
        self.transformer = Some(Box::new(transformer));
        self
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl SecretBackendMetadata for GenericSecretBackendMetadata {
    fn name(&self) -> String {
        format!("{}/{}", self.backend, self.key)
    }

    fn variables(&self) -> HashMap<String, String> {
        let mut variables = HashMap::new();
        variables.insert("backend".to_string(), self.backend.clone());
        variables.insert("key".to_string(), self.key.clone());
        variables
    }

    fn property_transformer(&self) -> Option<&dyn PropertyTransformer> {
        self.transformer.as_deref()
    }
}

impl fmt::Debug for GenericSecretBackendMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericSecretBackendMetadata")
            .field("backend", &self.backend)
            .field("key", &self.key)
            .field("transformer", &self.transformer.is_some())
            .finish()
    }
}
