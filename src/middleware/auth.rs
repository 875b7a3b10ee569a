use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::auth::{Claims, JwtKeys};
use crate::error::ApiError;

/// Authenticated identity for the lifetime of one request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Request-scoped context; `principal` is `None` for anonymous requests
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self { principal: Some(principal) }
    }

    /// Resolve the context from request headers. Missing or invalid tokens
    /// yield an anonymous context.
    pub fn from_headers(headers: &HeaderMap, keys: &JwtKeys) -> Self {
        let Some(token) = extract_token(headers) else {
            return Self::anonymous();
        };

        match keys.verify(&token) {
            Ok(claims) => Self::authenticated(claims.into()),
            Err(e) => {
                tracing::debug!("ignoring unverifiable token: {}", e);
                Self::anonymous()
            }
        }
    }

    pub fn require_logged_in(&self) -> Result<&Principal, ApiError> {
        self.principal.as_ref().ok_or_else(unauthorized)
    }

    pub fn require_admin(&self) -> Result<&Principal, ApiError> {
        match &self.principal {
            Some(principal) if principal.is_admin => Ok(principal),
            _ => Err(unauthorized()),
        }
    }

    pub fn require_admin_or_self(&self, username: Option<&str>) -> Result<(), ApiError> {
        let empty = Principal::default();
        let principal = self.principal.as_ref().unwrap_or(&empty);

        let is_self = self.principal.is_some() && username == Some(principal.username.as_str());
        if principal.is_admin || is_self {
            Ok(())
        } else {
            Err(unauthorized())
        }
    }
}

fn unauthorized() -> ApiError {
    ApiError::unauthorized("Unauthorized")
}

/// Pull the raw token from the Authorization header, tolerating a missing
/// `Bearer` prefix
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn context_of(request: &Request) -> RequestContext {
    request.extensions().get::<RequestContext>().cloned().unwrap_or_default()
}

/// Attach a `RequestContext` to every request. Never rejects.
pub async fn authenticate_jwt(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::from_headers(request.headers(), &state.keys);
    request.extensions_mut().insert(context);
    next.run(request).await
}

pub async fn ensure_logged_in(request: Request, next: Next) -> Result<Response, ApiError> {
    context_of(&request).require_logged_in()?;
    Ok(next.run(request).await)
}

pub async fn ensure_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    if let Err(e) = context_of(&request).require_admin() {
        tracing::debug!("admin required for {} {}", request.method(), request.uri().path());
        return Err(e);
    }
    Ok(next.run(request).await)
}

/// Admin, or the user named by the `:username` path segment
pub async fn ensure_admin_or_correct_user(
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let target = params.get("username").map(String::as_str);
    context_of(&request).require_admin_or_self(target)?;
    Ok(next.run(request).await)
}
