use daily_puzzle_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record '{key}' is unreadable: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Game(#[from] CoreError),
    #[error("no puzzle is open")]
    NoActiveGame,
    #[error("session expired, log in again")]
    Unauthorized,
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("encryption error: {0}")]
    Crypto(String),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// Worth trying again later (connectivity or server trouble)
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        let server = |status| ClientError::Server {
            status,
            message: String::new(),
        };
        assert!(server(503).is_transient());
        assert!(server(429).is_transient());
        assert!(!server(400).is_transient());
        assert!(!ClientError::Unauthorized.is_transient());
    }
}
