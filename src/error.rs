//! Crate error type

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the tunnel handshake, credential acquisition, and
/// the connection lifecycle
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying stream error at any handshake stage or after connect
    #[error("socket transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The proxy did not accept bearer-token authentication in the method
    /// negotiation reply
    #[error("auth method not accepted")]
    AuthMethodRejected,

    /// The proxy rejected the presented credential
    #[error("authentication failed")]
    ProxyAuthenticationFailed,

    /// The proxy refused to open the tunnel to the target host
    #[error("connect command failed")]
    ProxyConnectFailed,

    /// Token endpoint call failed or returned no usable token
    #[error("credential acquisition failed: {0}")]
    CredentialAcquisition(String),

    /// The driver connection ended before completing its own handshake
    #[error("the connection ended without ever completing the connection")]
    ConnectionAborted,

    /// Resource creation failed with a driver-level connection error
    #[error("connection fault: {0}")]
    ConnectionFault(String),

    /// Invalid stage transition
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state description
        expected: String,
        /// Actual state description
        actual: String,
    },

    /// Protocol violation
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify a post-connect error as expected transport churn or a real
    /// fault.
    ///
    /// Churn (an I/O-level stream error) marks the resource as errored so
    /// validation recycles it quietly; every other class is emitted upward as
    /// a fault. This is the explicit criterion for the "replace, don't alarm"
    /// path.
    pub fn is_transport_churn(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
