// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Errors produced by service operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SocialError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("not allowed: {0}")]
    Authorization(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    /// A uniqueness constraint rejected the write
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Persistence(String),

    /// A valid session whose local user record could not be found or created
    #[error("session user could not be resolved: {0}")]
    UnresolvedIdentity(String),
}

pub type SocialResult<T> = Result<T, SocialError>;

impl SocialError {
    /// Short, stable label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SocialError::Unauthenticated => "unauthenticated",
            SocialError::Authorization(_) => "forbidden",
            SocialError::NotFound(_) => "not_found",
            SocialError::Validation(_) => "invalid",
            SocialError::Conflict(_) => "conflict",
            SocialError::Persistence(_) => "persistence",
            SocialError::UnresolvedIdentity(_) => "unresolved_identity",
        }
    }

    /// Whether the failure was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            SocialError::Persistence(_) | SocialError::UnresolvedIdentity(_)
        )
    }
}

impl From<DieselError> for SocialError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => SocialError::NotFound("record".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                SocialError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                SocialError::Validation(info.message().to_string())
            }
            other => SocialError::Persistence(other.to_string()),
        }
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for SocialError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        SocialError::Persistence(format!("Failed to get database connection: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: SocialError = DieselError::NotFound.into();
        assert_eq!(err.kind(), "not_found");
        assert!(err.is_client_error());
    }

    #[test]
    fn rollback_maps_to_persistence() {
        let err: SocialError = DieselError::RollbackTransaction.into();
        assert!(matches!(err, SocialError::Persistence(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn unauthenticated_message_matches_client_contract() {
        assert_eq!(SocialError::Unauthenticated.to_string(), "Unauthorized");
    }
}
