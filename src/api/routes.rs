// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{SocialError, SocialResult};
use crate::metrics;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response with message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub fn status_for(err: &SocialError) -> StatusCode {
    match err {
        SocialError::Unauthenticated => StatusCode::UNAUTHORIZED,
        SocialError::Authorization(_) => StatusCode::FORBIDDEN,
        SocialError::NotFound(_) => StatusCode::NOT_FOUND,
        SocialError::Validation(_) => StatusCode::BAD_REQUEST,
        SocialError::Conflict(_) => StatusCode::CONFLICT,
        SocialError::Persistence(_) | SocialError::UnresolvedIdentity(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Error body for a failed operation. Storage details stay in the logs.
pub fn error_response(operation: &str, err: SocialError) -> Response {
    let status = status_for(&err);
    let message = if err.is_client_error() {
        debug!("{} rejected: {}", operation, err);
        err.to_string()
    } else {
        error!("{} failed: {}", operation, err);
        format!("{} failed", operation)
    };
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

/// Record the outcome of `operation` and turn it into a JSON response
pub fn respond<T: Serialize>(operation: &str, result: SocialResult<T>) -> Response {
    respond_with(StatusCode::OK, operation, result)
}

pub fn respond_with<T: Serialize>(
    status: StatusCode,
    operation: &str,
    result: SocialResult<T>,
) -> Response {
    metrics::record(operation, &result);
    match result {
        Ok(data) => (status, Json(ApiResponse::success(data))).into_response(),
        Err(err) => error_response(operation, err),
    }
}

/// Treat a missing record as `NotFound(what)`
pub fn found<T>(result: SocialResult<Option<T>>, what: &str) -> SocialResult<T> {
    result.and_then(|value| value.ok_or_else(|| SocialError::NotFound(what.to_string())))
}

pub const DEFAULT_LIMIT: usize = 20;

/// Pagination parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<usize>,
}

impl PaginationParams {
    /// Requested page length, clamped to `1..=max`
    pub fn limit(&self, max: usize) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, max.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PaginationParams::default().limit(100), DEFAULT_LIMIT);
        assert_eq!(PaginationParams { limit: Some(0) }.limit(100), 1);
        assert_eq!(PaginationParams { limit: Some(500) }.limit(100), 100);
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(status_for(&SocialError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&SocialError::Authorization("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&SocialError::NotFound("post".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&SocialError::UnresolvedIdentity("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn found_maps_none() {
        assert_eq!(found(Ok(Some(1)), "post"), Ok(1));
        assert_eq!(
            found::<i32>(Ok(None), "post"),
            Err(SocialError::NotFound("post".to_string()))
        );
    }
}
