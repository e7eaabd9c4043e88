use thiserror::Error;

/// Which ledger endpoint a call was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEndpointKind {
    ProductItem,
    Commissioning,
}

impl std::fmt::Display for LedgerEndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEndpointKind::ProductItem => write!(f, "product item passport"),
            LedgerEndpointKind::Commissioning => write!(f, "commissioning passport"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{endpoint} endpoint not configured")]
    Unconfigured { endpoint: LedgerEndpointKind },

    #[error("{message}")]
    TlsMaterial { message: String },

    #[error("Invalid ledger URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Ledger transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Ledger response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("ledger request failed with status {status}: {body}")]
    Remote { status: u16, body: String },
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Local fault: {message}")]
    LocalFault { message: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Backend request failed: {0}")]
    BackendError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

impl ProxyError {
    /// True for the one error class a hook may report to the proxy.
    pub fn is_local_fault(&self) -> bool {
        matches!(self, ProxyError::LocalFault { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
