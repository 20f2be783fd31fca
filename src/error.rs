use thiserror::Error;

/// Errors raised while reading configuration from Vault
#[derive(Error, Debug)]
pub enum VaultConfigError {
    /// Non-success, non-404 response while fail-fast is enabled
    #[error(
        "Could not locate PropertySource and the fail fast property is set, failing Status {status} {message}"
    )]
    FailFast { status: u16, message: String },

    /// The request never produced an HTTP response, or the body was not a Vault envelope
    #[error("Vault transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid Vault URL: {0}")]
    InvalidUrl(String),

    /// Path template could not be expanded with the given variables
    #[error("Invalid path template: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, VaultConfigError>;

impl VaultConfigError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FailFast { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
