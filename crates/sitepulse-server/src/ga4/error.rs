//! Error types for the GA4 client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Ga4Error {
    /// Failed to build the HTTP client (TLS or proxy misconfiguration)
    #[error("failed to initialize GA4 client: {0}")]
    Init(String),

    /// Service-account key missing fields, not JSON, or not a usable RSA key
    #[error("invalid GA4 service account credentials: {0}")]
    Credentials(String),

    #[error("GA4 HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// OAuth token endpoint rejected the assertion or returned garbage
    #[error("GA4 token exchange failed: {0}")]
    Token(String),

    /// Data API answered with a non-success status
    #[error("GA4 API returned {status}: {body}")]
    Api { status: u16, body: String },
}
