use thiserror::Error;

/// ModelSpec problems, fatal at setup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("model spec has no data key field")]
    NoDataKey,

    #[error("model spec has more than one data key field: {0:?}")]
    MultipleDataKeys(Vec<String>),

    #[error("field `{0}` is not part of the model spec")]
    UnknownField(String),

    #[error("field `{0}` needs select items for its kind")]
    MissingSelectItems(String),

    #[error("invalid client config: {0}")]
    InvalidConfig(String),
}

/// Network or decoding failure while talking to the remote service.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("{method} {path} failed with status {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },

    #[error("Invalid http header value : {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Decoding error: {0}")]
    Decode(String),
}

/// Wire value does not fit the kind its FieldSpec declares.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field `{field}`: expected {expected}, got {got}")]
pub struct ValidationError {
    pub field: String,
    pub expected: &'static str,
    pub got: String,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}
