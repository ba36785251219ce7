use thiserror::Error;

/// Errors raised while parsing a list query string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid pageNumber: {0:?}")]
    InvalidPageNumber(String),

    #[error("invalid pageSize: {0:?}")]
    InvalidPageSize(String),

    #[error("invalid sortDescending: {0:?}")]
    InvalidSortDirection(String),

    #[error("invalid filter entry: {0:?} (expected key:value)")]
    InvalidFilter(String),

    #[error("searchBy/searchTerm cannot be combined with filters")]
    MixedCriteria,
}
