/// error types shared by the cache, backend and config layers
///
use thiserror::Error;

/// failures from a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// network or timeout class failure; another attempt may succeed
    #[error("transient backend failure: {0}")]
    Transient(String),

    /// the backend answered with a body that cannot be used
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// only transport failures are worth another attempt
    pub fn is_retriable(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cache file is not a json object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable() {
        assert!(BackendError::Transient("connection refused".to_string()).is_retriable());
        assert!(!BackendError::Malformed("expected value".to_string()).is_retriable());
    }

    #[test]
    fn display() {
        let err = BackendError::Transient("timed out".to_string());
        assert_eq!(err.to_string(), "transient backend failure: timed out");
    }
}
