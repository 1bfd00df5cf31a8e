use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};

use crate::error::AppError;

/// The single shared secret every protected route checks against
#[derive(Clone)]
pub struct ApiKey(Arc<SecretString>);

impl ApiKey {
    pub fn new(secret: SecretString) -> Self {
        Self(Arc::new(secret))
    }

    /// Check a raw `Authorization` value, with or without the `Bearer ` prefix
    pub fn verify(&self, authorization: Option<&str>) -> Result<(), AppError> {
        let Some(value) = authorization.filter(|v| !v.is_empty()) else {
            tracing::warn!("No API key provided");
            return Err(AppError::Unauthorized("API key is missing"));
        };

        let token = value.strip_prefix("Bearer ").unwrap_or(value);
        let expected = self.0.expose_secret();

        if expected.is_empty() || !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            tracing::warn!("Invalid API key provided");
            return Err(AppError::Unauthorized("Invalid API key"));
        }

        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reject the request before any handler runs unless it carries the API key
pub async fn require_api_key(
    State(api_key): State<ApiKey>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    api_key.verify(authorization)?;

    Ok(next.run(request).await)
}
