use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ipam_core::IpamError;
use ipam_store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Ipam(#[from] IpamError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ipam(e) => e.code(),
            Self::Store(_) => "store_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ipam(e) => match e {
                IpamError::MissingParent { .. } | IpamError::NotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                IpamError::InvalidKey { .. }
                | IpamError::MalformedCidr { .. }
                | IpamError::MalformedAddress { .. }
                | IpamError::MaskTooNarrow { .. }
                | IpamError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
                IpamError::DuplicateKey { .. }
                | IpamError::OverlappingBlock { .. }
                | IpamError::DuplicateAddress { .. }
                | IpamError::NotEmpty { .. } => StatusCode::CONFLICT,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
