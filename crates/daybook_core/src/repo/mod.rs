//! Collection persistence layer over the key-value store.
//!
//! # Responsibility
//! - Define repository-level error semantics on top of raw storage errors.
//! - Provide the generic collection mechanism the entity services share.
//!
//! # Invariants
//! - Read paths degrade to empty results (logged); a read failure must
//!   never crash a UI caller.
//! - Write failures and missing mutation targets always propagate.

use crate::model::mood::MoodValidationError;
use crate::model::RecordId;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod collection;

pub use collection::Collection;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy for entity collections.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying storage failure (write path; reads degrade instead).
    Store(StoreError),
    /// Mutation target absent (or tombstoned).
    NotFound(RecordId),
    /// Entity required-field check failed before any write.
    Validation(MoodValidationError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<MoodValidationError> for RepoError {
    fn from(value: MoodValidationError) -> Self {
        Self::Validation(value)
    }
}
