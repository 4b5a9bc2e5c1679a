// Authentication middleware for protected routes

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::{Identity, Role},
    token::TokenService,
};

/// Validate the bearer token in `headers` and check it against `required_roles`
///
/// An empty `required_roles` admits any authenticated identity.
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
    required_roles: &[Role],
) -> Result<Identity, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = bearer_token(auth_header).ok_or(AuthError::MalformedHeader)?;
    let claims = tokens.parse_access_token(token)?;

    if !required_roles.is_empty() && !required_roles.contains(&claims.role) {
        return Err(AuthError::Forbidden {
            required: required_roles.to_vec(),
            actual: claims.role,
        });
    }

    Ok(Identity {
        user_id: claims.user_id,
        role: claims.role,
    })
}

/// Split `<scheme> <token>`; the scheme must be `bearer` in any case
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Per-route authentication gate, used with `axum::middleware::from_fn_with_state`
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    required_roles: Arc<[Role]>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, required_roles: &[Role]) -> Self {
        Self {
            tokens,
            required_roles: required_roles.into(),
        }
    }

    /// Any authenticated user
    pub fn any(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, &[])
    }

    pub fn admin(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, &[Role::Admin])
    }
}

/// Reject the request unless it carries a valid token with an allowed role;
/// on success the `Identity` is stored in the request extensions
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let identity = authenticate(request.headers(), &gate.tokens, &gate.required_roles)
        .map_err(|e| {
            warn!("Rejected request to {}: {}", endpoint, e);
            e
        })?;

    debug!(
        "Authorization successful: user_id={}, role={}, endpoint={}",
        identity.user_id, identity.role, endpoint
    );
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::AccessClaims;
    use crate::config::Config;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use proptest::prelude::*;

    fn test_token_service() -> TokenService {
        TokenService::from_config(&Config::default())
    }

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn bearer(token: &str) -> HeaderMap {
        headers_with_auth(&format!("Bearer {}", token))
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let service = test_token_service();
        let token = service.issue_access_token(42, Role::User).unwrap();

        let identity = authenticate(&bearer(&token), &service, &[]).unwrap();
        assert_eq!(identity, Identity { user_id: 42, role: Role::User });
    }

    #[test]
    fn test_missing_header() {
        let service = test_token_service();
        let result = authenticate(&HeaderMap::new(), &service, &[]);
        assert_eq!(result.unwrap_err(), AuthError::MissingToken);
    }

    #[test]
    fn test_malformed_headers() {
        let service = test_token_service();
        let token = service.issue_access_token(1, Role::User).unwrap();

        for value in [
            "".to_string(),
            "Bearer".to_string(),
            "Bearer ".to_string(),
            token.clone(),
            format!("Basic {}", token),
            format!("Token {}", token),
            format!("Bearer {} extra", token),
            "Basic dXNlcjpwYXNz".to_string(),
        ] {
            let result = authenticate(&headers_with_auth(&value), &service, &[]);
            assert_eq!(result.unwrap_err(), AuthError::MalformedHeader, "header {:?}", value);
        }
    }

    #[test]
    fn test_non_utf8_header_is_malformed() {
        let service = test_token_service();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap());
        assert_eq!(authenticate(&headers, &service, &[]).unwrap_err(), AuthError::MalformedHeader);
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let service = test_token_service();
        let token = service.issue_access_token(9, Role::Admin).unwrap();
        for scheme in ["bearer", "BEARER", "BeArEr"] {
            let headers = headers_with_auth(&format!("{} {}", scheme, token));
            assert!(authenticate(&headers, &service, &[]).is_ok());
        }
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = test_token_service();
        let now = Utc::now().timestamp();
        let claims = AccessClaims { user_id: 1, role: Role::Admin, iat: now - 1000, exp: now - 500 };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(Config::default().jwt_secret.as_bytes()),
        )
        .unwrap();

        let result = authenticate(&bearer(&token), &service, &[Role::Admin]);
        assert_eq!(result.unwrap_err(), AuthError::ExpiredToken);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let service = test_token_service();
        for token in ["invalid_token", "not.a.valid.jwt", "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature"] {
            assert_eq!(
                authenticate(&bearer(token), &service, &[]).unwrap_err(),
                AuthError::InvalidToken
            );
        }
    }

    #[test]
    fn test_role_requirements() {
        let service = test_token_service();
        let user_token = service.issue_access_token(1, Role::User).unwrap();
        let admin_token = service.issue_access_token(2, Role::Admin).unwrap();

        assert!(authenticate(&bearer(&admin_token), &service, &[Role::Admin]).is_ok());
        assert!(authenticate(&bearer(&user_token), &service, &[Role::User]).is_ok());
        assert!(authenticate(&bearer(&user_token), &service, &[Role::Admin, Role::User]).is_ok());

        match authenticate(&bearer(&user_token), &service, &[Role::Admin]).unwrap_err() {
            AuthError::Forbidden { required, actual } => {
                assert_eq!(required, vec![Role::Admin]);
                assert_eq!(actual, Role::User);
            }
            other => panic!("Expected Forbidden, got {:?}", other),
        }

        assert!(matches!(
            authenticate(&bearer(&admin_token), &service, &[Role::User]),
            Err(AuthError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_identity_extractor_reads_extensions() {
        let request = axum::http::Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        assert_eq!(
            Identity::from_request_parts(&mut parts, &()).await.unwrap_err(),
            AuthError::MissingToken
        );

        let identity = Identity { user_id: 3, role: Role::User };
        parts.extensions.insert(identity);
        assert_eq!(Identity::from_request_parts(&mut parts, &()).await.unwrap(), identity);
    }

    proptest! {
        #[test]
        fn prop_valid_tokens_accepted(user_id in 1i32..1_000_000, admin in any::<bool>()) {
            let service = test_token_service();
            let role = if admin { Role::Admin } else { Role::User };
            let token = service.issue_access_token(user_id, role)?;

            let identity = authenticate(&bearer(&token), &service, &[role])?;
            prop_assert_eq!(identity, Identity { user_id, role });
        }

        #[test]
        fn prop_random_bearer_values_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_token_service();
            let result = authenticate(&bearer(&malformed), &service, &[]);
            prop_assert_eq!(result.unwrap_err(), AuthError::InvalidToken);
        }
    }
}
