use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Cookie carrying the session token set by the user service.
pub const AUTH_COOKIE: &str = "bmg_jwt";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: usize,
}

/// Key material for verifying session tokens (HS256).
pub struct AuthConfig {
    decoding_key: DecodingKey,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default()).map(|data| data.claims)
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

fn cookie_token(req: &Request) -> Option<String> {
    req.headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "errorMessage": "Unauthorized" })),
    )
        .into_response()
}

/// Verifies the session token and exposes the caller's id to handlers as
/// `Extension<String>`.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&req).or_else(|| cookie_token(&req)) {
        Some(token) => token,
        None => {
            debug!("Rejecting {} {}: no token", req.method(), req.uri());
            return unauthorized();
        }
    };

    match auth.verify(&token) {
        Ok(claims) => {
            debug!("Authenticated user {}", claims.user_id);
            req.extensions_mut().insert(claims.user_id);
            next.run(req).await
        }
        Err(e) => {
            warn!("Rejecting {} {}: invalid token: {}", req.method(), req.uri(), e);
            unauthorized()
        }
    }
}

#[cfg(any(test, feature = "test_utils"))]
pub const TEST_JWT_SECRET: &str = "bmg-test-secret";

/// Signs a token for `user_id` with [`TEST_JWT_SECRET`].
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_token(user_id: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        user_id: user_id.to_string(),
        role: None,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("test token must encode")
}

/// Builds an authenticated JSON request for router tests.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_request(
    method: &str,
    uri: &str,
    user_id: &str,
    body: Option<serde_json::Value>,
) -> Request {
    let builder = http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", create_test_token(user_id)));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .expect("test request must build"),
        None => builder
            .body(axum::body::Body::empty())
            .expect("test request must build"),
    }
}
