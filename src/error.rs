//! Error handling for the API.
//!
//! In development, feel free to add a variant to the GigoError enum
//! to better format errors. This is always better than forcing it
//! into a `Validation` error or a generic `Mail` error.

use async_graphql::ErrorExtensions;
use axum::http::header::ToStrError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// The error enum for all error handling across the API.
///
/// See each variant for its corresponding status code.
#[derive(Debug, thiserror::Error)]
pub enum GigoError {
    /// \[404\] The referenced record does not exist.
    #[error("resource not found")]
    NotFound(String),
    /// \[400\] The submitted input was malformed.
    #[error("invalid input")]
    Validation(String),
    /// \[400\] A timestamp could not be parsed.
    #[error("invalid timestamp")]
    Parse(String),
    /// \[400\] The timezone identifier is not in the timezone database.
    #[error("unknown timezone")]
    UnknownTimezone(String),
    /// \[401\] The endpoint requires a logged-in member.
    #[error("login required")]
    Unauthorized,
    /// \[401\] The session token header was not valid text.
    #[error("invalid token header")]
    InvalidTokenHeader(#[from] ToStrError),
    /// \[403\] The current member may not perform this action.
    #[error("access forbidden")]
    Forbidden(String),
    /// \[500\] An error occured while interacting with the database.
    #[error("database error")]
    Database(#[from] sqlx::Error),
    /// \[500\] A page or email failed to render.
    #[error("template error")]
    Template(#[from] askama::Error),
    /// \[500\] An email could not be handed to the mail service.
    #[error("mail error")]
    Mail(String),
    /// \[500\] The background task queue has shut down.
    #[error("task queue unavailable")]
    QueueClosed,
    /// \[500\] The server was put together wrong.
    #[error("internal error")]
    Internal(String),
}

/// The return type for all fallible operations.
pub type GigoResult<T> = Result<T, GigoError>;

impl GigoError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GigoError::NotFound(_) => StatusCode::NOT_FOUND,
            GigoError::Validation(_) | GigoError::Parse(_) | GigoError::UnknownTimezone(_) => {
                StatusCode::BAD_REQUEST
            }
            GigoError::Unauthorized | GigoError::InvalidTokenHeader(_) => StatusCode::UNAUTHORIZED,
            GigoError::Forbidden(_) => StatusCode::FORBIDDEN,
            GigoError::Database(_)
            | GigoError::Template(_)
            | GigoError::Mail(_)
            | GigoError::QueueClosed
            | GigoError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The details of the error, without the status code and message.
    pub fn details(&self) -> Value {
        match self {
            GigoError::NotFound(what) => json!({ "resource": what }),
            GigoError::Validation(reason) | GigoError::Parse(reason) => json!({ "reason": reason }),
            GigoError::UnknownTimezone(timezone) => json!({ "timezone": timezone }),
            GigoError::Unauthorized => json!({}),
            GigoError::InvalidTokenHeader(error) => json!({ "error": error.to_string() }),
            GigoError::Forbidden(reason) => json!({ "reason": reason }),
            GigoError::Database(error) => json!({ "error": error.to_string() }),
            GigoError::Template(error) => json!({ "error": error.to_string() }),
            GigoError::Mail(error) => json!({ "error": error }),
            GigoError::QueueClosed => json!({}),
            GigoError::Internal(reason) => json!({ "reason": reason }),
        }
    }

    pub fn as_json(&self) -> (StatusCode, Value) {
        let status = self.status();
        let mut body = self.details();
        body["statusCode"] = json!(status.as_u16());
        body["message"] = json!(self.to_string());

        (status, body)
    }
}

impl IntoResponse for GigoError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let (status, body) = self.as_json();
        (status, Json(body)).into_response()
    }
}

impl ErrorExtensions for GigoError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, extensions| {
            extensions.set("statusCode", i32::from(self.status().as_u16()));
            if let Ok(details) = async_graphql::Value::from_json(self.details()) {
                extensions.set("details", details);
            }
        })
    }
}
