use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use database::ServiceError;
use log::error;
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors returned by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(Cow<'static, str>),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorData {
    pub error: &'static str,
    pub error_description: Cow<'static, str>,
}

impl ApiError {
    pub fn unauthorized(message: &'static str) -> Self {
        Self::Unauthorized(Cow::Borrowed(message))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation_error",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn error_data(&self) -> ErrorData {
        let error_description = match self {
            // never leak internals to the client
            Self::Internal(_) => Cow::Borrowed("Internal server error"),
            other => Cow::Owned(other.to_string()),
        };

        ErrorData {
            error: self.kind(),
            error_description,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Request failed: {detail}");
        }

        let mut response = (self.status_code(), Json(self.error_data())).into_response();
        if matches!(self, Self::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                Self::unauthorized("Incorrect email or password")
            }
            ServiceError::Forbidden(message) => Self::Forbidden(message),
            ServiceError::NotFound(entity) => Self::NotFound(capitalize(&format!("{entity} not found"))),
            ServiceError::Conflict(message) => Self::Conflict(message),
            ServiceError::Validation(message) => Self::Validation(message),
            err @ (ServiceError::PasswordHash(_)
            | ServiceError::Database(_)
            | ServiceError::Io(_)) => Self::Internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Internal(format!("token encoding failed: {err}"))
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::forbidden("nope"), StatusCode::FORBIDDEN),
            (ServiceError::NotFound("class"), StatusCode::NOT_FOUND),
            (ServiceError::conflict("full"), StatusCode::CONFLICT),
            (ServiceError::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (
                ServiceError::Database(DbErr::Custom("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ApiError::from(ServiceError::Database(DbErr::Custom(
            "relation \"users\" does not exist".to_string(),
        )));

        let data = err.error_data();
        assert_eq!(data.error, "internal_error");
        assert_eq!(data.error_description, "Internal server error");
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::from(ServiceError::NotFound("class"));
        assert_eq!(err.error_data().error_description, "Class not found");
    }

    #[test]
    fn test_unauthorized_sets_challenge() {
        let response = ApiError::unauthorized("Not authenticated").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
