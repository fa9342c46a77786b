//! Error taxonomy shared by every case, evidence and account operation.
//!
//! Validation, authorization, lookup and referential failures carry a
//! message meant for the client. Store failures are logged and reduced to a
//! generic message before they leave the process.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// Malformed or missing payload fields.
    #[error("{0}")]
    Validation(String),
    /// No session, or the session has expired.
    #[error("{0}")]
    Unauthorized(String),
    /// Signed in, but the role or assignment does not allow the action.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// A referenced user id does not exist or has the wrong role.
    #[error("{0}")]
    Referential(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CaseError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".to_owned())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn referential<T: Into<String>>(msg: T) -> Self {
        Self::Referential(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        Self::Internal(msg.into())
    }

    /// Message safe to hand to the client.
    pub fn public_message(&self) -> String {
        match self {
            CaseError::Database(_) | CaseError::Internal(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for CaseError {
    fn from(e: validator::ValidationErrors) -> Self {
        CaseError::Validation(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for CaseError {
    fn status_code(&self) -> StatusCode {
        match self {
            CaseError::Validation(_) => StatusCode::BAD_REQUEST,
            CaseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            CaseError::NotFound(_) => StatusCode::NOT_FOUND,
            CaseError::Referential(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CaseError::Conflict(_) => StatusCode::CONFLICT,
            CaseError::Database(_) | CaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            CaseError::Database(e) => log::error!("database error: {}", e),
            CaseError::Internal(e) => log::error!("internal error: {}", e),
            other => log::debug!("request rejected: {}", other),
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.public_message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_do_not_leak() {
        let err = CaseError::from(DbErr::Custom("relation \"crimes\" does not exist".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = CaseError::referential("Accused user 42 not found");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.public_message(), "Accused user 42 not found");
        assert_eq!(
            CaseError::unauthorized().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
