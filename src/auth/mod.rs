use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::state::AppState;

/// Authenticated principal extracted from the bearer token. Token issuance
/// belongs to the external identity provider; this module only validates
/// inbound credentials and answers "who is calling, if anyone".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: Uuid::nil(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        !self.user_id.is_nil()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub email: Option<String>,
}

/// Validates the bearer token and stashes the principal (or the anonymous
/// placeholder) in request extensions for the extractor to pick up.
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user = match extract_and_validate_user(&request, &state.config.auth.jwt_secret) {
        Ok(user) => user,
        Err(e) => {
            log::debug!("request not authenticated: {e}");
            AuthenticatedUser::anonymous()
        }
    };
    request.extensions_mut().insert(user);
    next.run(request).await
}

fn extract_and_validate_user(
    request: &Request<Body>,
    jwt_secret: &str,
) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let claims = validate_jwt(token, jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))?;

    let mut user = AuthenticatedUser::new(user_id);
    if let Some(email) = claims.email {
        user = user.with_email(email);
    }
    Ok(user)
}

fn validate_jwt(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["sub", "exp"]);

    decode::<TokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
}

#[derive(Debug)]
enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken(String),
    TokenExpired,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(f, "missing authorization token"),
            Self::InvalidFormat => write!(f, "invalid authorization format"),
            Self::InvalidToken(msg) => write!(f, "invalid token: {msg}"),
            Self::TokenExpired => write!(f, "token expired"),
        }
    }
}

/// Rejects with 401 unless the middleware resolved a real principal.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .filter(|user| user.is_authenticated())
            .cloned()
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized" })),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(sub: &str, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            sub: sub.to_string(),
            exp: now + 3600,
            iat: now,
            email: Some("student@example.com".to_string()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_jwt_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = token_for(&user_id.to_string(), "test-secret");
        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email.as_deref(), Some("student@example.com"));
    }

    #[test]
    fn test_validate_jwt_rejects_wrong_secret() {
        let token = token_for(&Uuid::new_v4().to_string(), "test-secret");
        assert!(validate_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn test_anonymous_is_not_authenticated() {
        assert!(!AuthenticatedUser::anonymous().is_authenticated());
        assert!(AuthenticatedUser::new(Uuid::new_v4()).is_authenticated());
    }
}
