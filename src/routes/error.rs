//! HTTP error bodies and the JSON body extractor.
//!
//! Every failure leaves as `{code, message, errors?}`. Store failures are
//! logged here with the action that failed; the response only names the
//! action.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::error::{E_STORE, E_VALIDATION, ErrorCode};
use crate::gateway::GatewayError;
use crate::models::EntityKind;
use crate::models::input::{FieldError, ValidationError};
use crate::services::chat::ChatError;
use crate::services::transfer::TransferError;

const VALIDATION_MESSAGE: &str = "Validation failed";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    #[must_use]
    pub fn validation(err: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody { code: E_VALIDATION, message: VALIDATION_MESSAGE.to_owned(), errors: err.errors },
        }
    }

    fn not_found(err: &impl ErrorCode) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody { code: err.error_code(), message: err.to_string(), errors: Vec::new() },
        }
    }

    fn store(action: &'static str, kind: EntityKind, cause: &dyn std::fmt::Display) -> Self {
        error!(action, kind = kind.as_str(), error = %cause, "store operation failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody { code: E_STORE, message: format!("failed to {action} {kind}"), errors: Vec::new() },
        }
    }

    /// Map a gateway failure for `action` on `kind`, e.g.
    /// `.map_err(ApiError::on("create", EntityKind::Project))`.
    pub fn on(action: &'static str, kind: EntityKind) -> impl Fn(GatewayError) -> Self {
        move |err| match err {
            GatewayError::Validation(v) => Self::validation(v),
            GatewayError::NotFound { .. } => Self::not_found(&err),
            GatewayError::Store(ref source) => Self::store(action, kind, source),
        }
    }

    /// Map a transfer failure for `action` on the project.
    pub fn transfer(action: &'static str) -> impl Fn(TransferError) -> Self {
        move |err| match err {
            TransferError::Gateway(err) => Self::on(action, EntityKind::Project)(err),
            TransferError::Encode(ref source) => Self::store(action, EntityKind::Project, source),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self::not_found(&err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// `Json<T>` whose rejection is a validation error on field `body`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(ValidationError::single("body", rejection.body_text()))),
        }
    }
}

/// `Path<T>` whose rejection is a validation error on field `path`.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(ValidationError::single("path", rejection.body_text()))),
        }
    }
}

/// `Query<T>` whose rejection is a validation error on field `query`.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(ValidationError::single("query", rejection.body_text()))),
        }
    }
}
