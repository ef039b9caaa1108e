use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".into(),
        }
    }

    /// Identity for a bearer token, named by its first eight characters.
    pub fn token(token: &str) -> Self {
        let short: String = token.chars().take(8).collect();
        Self {
            name: format!("bearer:{short}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Extract credentials from an `Authorization: Bearer <token>` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or(Self::Anonymous, |t| Self::Bearer(t.to_string()))
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// Accepts exactly the configured bearer tokens.
#[derive(Clone, Debug, Default)]
pub struct TokenListAuth {
    tokens: HashSet<String>,
}

impl TokenListAuth {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AuthProvider for TokenListAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Bearer(token) if self.tokens.contains(token) => Ok(Identity::token(token)),
            Credentials::Bearer(_) => Err(ServerError::Unauthorized("unknown token".into())),
            Credentials::Anonymous => Err(ServerError::Unauthorized("missing bearer token".into())),
        }
    }
}

pub struct AllowAllAuth;

#[async_trait]
impl AuthProvider for AllowAllAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Bearer(token) => Ok(Identity::token(token)),
            Credentials::Anonymous => Ok(Identity::anonymous()),
        }
    }
}

/// Middleware rejecting requests the provider does not authenticate.
///
/// The resolved [`Identity`] is stored in the request extensions.
pub async fn require_auth(
    State(auth): State<Arc<dyn AuthProvider>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let credentials = Credentials::from_headers(request.headers());
    let identity = auth.authenticate(&credentials).await?;
    tracing::debug!(identity = %identity.name, "request authenticated");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
