//! Vault Configuration Library
//!
//! A library for reading application configuration from HashiCorp Vault as flattened properties.

pub mod backends;
pub mod config;
pub mod error;
pub mod flatten;
pub mod property_source;
pub mod secrets;
pub mod template;
pub mod vault;

pub use backends::{
    GenericSecretBackendMetadata, PropertyNameTransformer, PropertyTransformer, SecretBackendMetadata,
};
pub use config::{Config, VaultProperties};
pub use error::VaultConfigError;
pub use property_source::{CompositePropertySource, PropertySourceLocator};
pub use secrets::Secrets;
pub use template::{VaultConfigOperations, VaultConfigTemplate};
pub use vault::{HttpVaultSession, VaultSession};
