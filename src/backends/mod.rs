//! Secret backend references
//!
//! A backend reference tells the config template which Vault path to read and
//! how to post-process the flattened properties.

mod secret_backend;
mod transformer;

pub use secret_backend::{GenericSecretBackendMetadata, SecretBackendMetadata};
pub use transformer::{PropertyNameTransformer, PropertyTransformer};
