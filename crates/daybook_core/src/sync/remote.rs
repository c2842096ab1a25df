//! Remote API collaborator seam.
//!
//! The transport lives outside this core; the queue only needs a post
//! operation it can hand a JSON body to. Hosts inject their HTTP client
//! behind this trait, tests inject fakes.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteResult<T> = Result<T, RemoteApiError>;

/// Failure reported by the remote collaborator (non-2xx, transport loss).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteApiError {
    pub detail: String,
}

impl RemoteApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl Display for RemoteApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "remote call failed: {}", self.detail)
    }
}

impl Error for RemoteApiError {}

/// Server endpoint used by the sync queue.
///
/// Implementations resolve on any 2xx response and error otherwise.
pub trait RemoteApi {
    fn post(&self, path: &str, body: &Value) -> RemoteResult<Value>;
}
