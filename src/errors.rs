use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::JsonResponse;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("not found")]
    NotFound,
    #[error("{kind} {id} does not exist")]
    InvalidReference { kind: &'static str, id: i64 },
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),
}

impl RequestError {
    pub fn invalid_reference(kind: &'static str, id: i64) -> Self {
        Self::InvalidReference { kind, id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::NotFound => StatusCode::NOT_FOUND,
            RequestError::InvalidReference { .. } | RequestError::MalformedInput(_) => {
                StatusCode::BAD_REQUEST
            }
            RequestError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(serde::Serialize)]
pub struct RequestErrorJsonWrapper {
    errors: RequestErrorJson,
}

#[derive(serde::Serialize)]
pub struct RequestErrorJson {
    body: Vec<String>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            errors: RequestErrorJson {
                body: vec![error.to_string()],
            },
        }
    }

    fn server_error() -> JsonResponse<RequestErrorJsonWrapper> {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RequestErrorJsonWrapper::new("Internal Server Error")),
        )
    }
}

// Client errors carry no body; only server failures get the JSON envelope.
impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match self {
            RequestError::NotFound => status.into_response(),
            RequestError::InvalidReference { kind, id } => {
                tracing::warn!(kind, id, "rejecting request with dangling reference");
                status.into_response()
            }
            RequestError::MalformedInput(message) => {
                tracing::warn!(%message, "rejecting malformed request");
                status.into_response()
            }
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                RequestErrorJsonWrapper::server_error().into_response()
            }
        }
    }
}
