//! Error taxonomy for fetching and building snapshots

use thiserror::Error;

/// Failure of a fetch or a snapshot build.
///
/// `Clone` so one in-flight refresh can hand the same outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexerError {
    /// Endpoint unreachable, timed out, or answered with a non-success status
    #[error("network error: {0}")]
    Network(String),
    /// Endpoint answered but the JSON-RPC envelope reported an error or was malformed
    #[error("rpc protocol error: {0}")]
    Protocol(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("no snapshot has been built yet")]
    CacheMiss,
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            IndexerError::Protocol(e.to_string())
        } else {
            IndexerError::Network(e.to_string())
        }
    }
}
