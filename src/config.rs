use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub vault: VaultProperties,
}

/// Connection and lookup settings for Vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultProperties {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Fail on non-404 error responses instead of logging a warning
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default)]
    pub generic: GenericBackendProperties,
}

/// Settings of the generic (KV) secret backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericBackendProperties {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_context")]
    pub application_name: String,
    #[serde(default = "default_context")]
    pub default_context: String,
    #[serde(default = "default_profile_separator")]
    pub profile_separator: String,
}

fn default_address() -> String {
    "http://127.0.0.1:8200".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_backend() -> String {
    "secret".to_string()
}

fn default_context() -> String {
    "application".to_string()
}

fn default_profile_separator() -> String {
    "/".to_string()
}

impl Default for VaultProperties {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: None,
            fail_fast: false,
            generic: GenericBackendProperties::default(),
        }
    }
}

impl Default for GenericBackendProperties {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: default_backend(),
            application_name: default_context(),
            default_context: default_context(),
            profile_separator: default_profile_separator(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GenericBackendProperties::default();

        let fail_fast = match lookup("VAULT_FAIL_FAST") {
            Some(value) => value
                .parse::<bool>()
                .with_context(|| format!("Invalid VAULT_FAIL_FAST value: {}", value))?,
            None => false,
        };

        let generic = GenericBackendProperties {
            enabled: defaults.enabled,
            backend: lookup("VAULT_GENERIC_BACKEND").unwrap_or(defaults.backend),
            application_name: lookup("VAULT_APPLICATION_NAME")
                .unwrap_or(defaults.application_name),
            default_context: lookup("VAULT_DEFAULT_CONTEXT").unwrap_or(defaults.default_context),
            profile_separator: lookup("VAULT_PROFILE_SEPARATOR")
                .unwrap_or(defaults.profile_separator),
        };

        let vault = VaultProperties {
            address: lookup("VAULT_ADDR").context("VAULT_ADDR environment variable not set")?,
            token: lookup("VAULT_TOKEN"),
            fail_fast,
            generic,
        };

        Ok(Self { vault })
    }

    /// Create a sample configuration file
    pub fn create_sample<P: AsRef<Path>>(path: P) -> Result<()> {
        let sample = Self {
            vault: VaultProperties {
                token: Some("your-vault-token-here".to_string()),
                ..VaultProperties::default()
            },
        };

        let toml_string =
            toml::to_string_pretty(&sample).context("Failed to serialize sample config")?;
        fs::write(path.as_ref(), toml_string)
            .with_context(|| format!("Failed to write sample config to {:?}", path.as_ref()))?;

        Ok(())
    }
}
