// Shared-secret authorization gate

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::config::ConfigError;

/// Compares the `Authorization` header against the secret configured at startup.
///
/// The comparison is a plain byte-for-byte equality (not constant-time) and the header
/// value is used verbatim: no `Bearer` prefix, no trimming, case-sensitive.
#[derive(Clone)]
pub struct ApiKeyGate {
    secret: Arc<str>,
}

impl ApiKeyGate {
    /// Refuses an empty secret: an empty-vs-empty match would let a blank header through.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            secret: Arc::from(secret),
        })
    }

    /// Header values are bytes on the wire; a UTF-8 secret matches its own encoding.
    pub fn authorize(&self, presented: Option<&[u8]>) -> bool {
        presented.is_some_and(|p| p == self.secret.as_bytes())
    }
}

/// Middleware: rejects with an empty 401 before the handler (and any collection) runs.
pub async fn require_api_key(
    State(gate): State<ApiKeyGate>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request.headers().get(AUTHORIZATION).map(|v| v.as_bytes());
    if !gate.authorize(presented) {
        tracing::debug!(uri = %request.uri(), "unauthorized request");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}
