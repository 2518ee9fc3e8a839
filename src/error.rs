use serde::Serialize;

/// Crate-wide error type. Every fallible function returns `Result<T, AppError>`.
/// Serializes as `{ error, kind }` so a page or a log sink gets a structured message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Request failed: {0}")]
    Http(String),

    #[error("Grading server is offline: {0}")]
    ServerOffline(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable tag, also used as the `kind` field when serialized.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Http(_) => "http",
            AppError::ServerOffline(_) => "server_offline",
            AppError::WebSocket(_) => "websocket",
            AppError::ConnectionLost(_) => "connection_lost",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Timeout(_) => "timeout",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Serde(_) => "serde",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else {
            AppError::Http(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::WebSocket(e.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// We serialize as `{ error: "...", kind: "..." }`.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("error", &self.to_string())?;
        s.serialize_field("kind", self.kind())?;
        s.end()
    }
}
