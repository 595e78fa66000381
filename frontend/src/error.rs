use thiserror::Error;

/// Problems with the page-supplied `#site-config` block.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Reveal threshold must be within 0.0..=1.0, got {0}")]
    InvalidThreshold(f64),

    #[error("Config value `{0}` must not be empty")]
    Empty(&'static str),
}

/// The request never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to build request: {0}")]
    Build(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Why a contact form submission ended in the error state.
///
/// Both variants map to the same message on the page; the distinction only
/// shows up in the console log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Server rejected the submission with status {status}")]
    ServerRejection { status: u16 },

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{field}` is required")]
    Required { field: String },

    #[error("`{field}` is not a valid email address")]
    InvalidEmail { field: String },
}
