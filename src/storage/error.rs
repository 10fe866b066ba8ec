use thiserror::Error;

use crate::domain::RouteId;

/// Errors returned by storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{entity} not found: id={id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Duplicate route name: {0}")]
    DuplicateRoute(String),

    #[error("Unknown route: id={0}")]
    UnknownRoute(RouteId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub fn route_not_found(id: RouteId) -> Self {
        StorageError::NotFound {
            entity: "route",
            id: id.0,
        }
    }

    pub fn city_not_found(id: i64) -> Self {
        StorageError::NotFound { entity: "city", id }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
