/// Shared error type used across all wave crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("invalid input: {0}")]
    Input(String),

    #[error("parse: {0}")]
    Parse(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable error class reported to the workflow executor as `errorType`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "InputError",
            Self::Provider { .. } | Self::Http(_) => "UpstreamCallError",
            Self::Parse(_) | Self::Json(_) => "ParseError",
            Self::Timeout(_) => "TimeoutError",
            Self::NotFound(_) => "NotFoundError",
            Self::Config(_) | Self::Auth(_) => "ConfigError",
            Self::Io(_) | Self::Other(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
