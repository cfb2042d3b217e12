use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use service::auth::AuthError;
use thiserror::Error;
use tracing::{error, warn};

/// Rejection returned by the auth endpoints: a status plus the message as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRejection {
    pub status: StatusCode,
    pub message: String,
}

impl AuthRejection {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: message.into() }
    }
}

fn log_internal(e: &AuthError) {
    if e.is_internal() {
        error!(code = e.code(), error = %e, "auth backend failure");
    } else {
        warn!(code = e.code(), error = %e, "auth request rejected");
    }
}

/// Login and registration map every backend failure to 400 with its message.
impl From<AuthError> for AuthRejection {
    fn from(e: AuthError) -> Self {
        log_internal(&e);
        Self::bad_request(e.to_string())
    }
}

impl From<JsonRejection> for AuthRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_auth_error_is_a_bad_request() {
        for e in [
            AuthError::Unauthorized,
            AuthError::Conflict,
            AuthError::Validation("full name required".into()),
            AuthError::Repository("pool timed out".into()),
        ] {
            let msg = e.to_string();
            let r = AuthRejection::from(e);
            assert_eq!(r.status, StatusCode::BAD_REQUEST);
            assert_eq!(r.message, msg);
        }
    }
}
