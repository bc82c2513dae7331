use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use super::error::Ga4Error;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a Google service-account key file that the client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: Option<String>,
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse a key from an env value holding either the JSON document itself
    /// or its base64 encoding.
    pub fn parse(raw: &str) -> Result<Self, Ga4Error> {
        let trimmed = raw.trim();
        let json = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            // `base64` wraps its output at 76 columns by default.
            let compact: String = trimmed
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|_| Ga4Error::Credentials("neither JSON nor base64".to_string()))?;
            String::from_utf8(bytes)
                .map_err(|_| Ga4Error::Credentials("decoded key is not UTF-8".to_string()))?
        };

        let key: Self = serde_json::from_str(&json)
            .map_err(|e| Ga4Error::Credentials(format!("malformed key JSON: {e}")))?;

        if let Some(kind) = key.key_type.as_deref() {
            if kind != "service_account" {
                return Err(Ga4Error::Credentials(format!(
                    "expected a service_account key, got {kind:?}"
                )));
            }
        }
        if key.client_email.trim().is_empty() {
            return Err(Ga4Error::Credentials("client_email is empty".to_string()));
        }
        if !key.private_key.contains("PRIVATE KEY") {
            return Err(Ga4Error::Credentials(
                "private_key is not a PEM block".to_string(),
            ));
        }
        Ok(key)
    }
}
