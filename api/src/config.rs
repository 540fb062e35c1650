//! API configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the HTTP API server.
///
/// # Example
///
/// ```rust
/// use cadenza_api::ApiConfig;
///
/// let config = ApiConfig {
///     bind: "127.0.0.1:9000".parse().unwrap(),
///     save_root: "runs".into(),
///     max_upload_bytes: 5 * 1024 * 1024,
/// };
/// assert_eq!(config.bind.port(), 9000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    ///
    /// Default: `0.0.0.0:8000`
    pub bind: SocketAddr,

    /// Root under which per-request save directories are allocated.
    ///
    /// Default: `data/saves`
    pub save_root: PathBuf,

    /// Maximum accepted request body, in bytes.
    ///
    /// Default: 20 MiB
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            save_root: PathBuf::from("data/saves"),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}
