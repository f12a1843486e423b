use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::services::{ServiceError, ServiceResult};

pub mod api;

/// JSON body returned with every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// HTTP status a service error is reported with.
pub fn error_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Validation(_) | ServiceError::Form(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: ServiceError) -> HttpResponse {
    let status = error_status(&err);
    // Internal details stay in the log.
    let error = match err {
        ServiceError::Internal(_) => "internal server error".to_string(),
        other => other.to_string(),
    };
    HttpResponse::build(status).json(ErrorBody { error })
}

/// Render a service result as JSON with `status` on success.
pub fn respond<T: Serialize>(result: ServiceResult<T>, status: StatusCode) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::build(status).json(body),
        Err(err) => error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(error_status(&ServiceError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            error_status(&ServiceError::Validation("terminal".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(&ServiceError::Form("quantity".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(&ServiceError::Conflict("stale".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&ServiceError::Internal("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = error_response(ServiceError::Internal("disk I/O error".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
