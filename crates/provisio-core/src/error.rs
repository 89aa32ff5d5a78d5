//! Core error types

use crate::classify::{ClassifiableError, ServiceError};
use thiserror::Error;

/// Errors crossing the resource operator boundary
#[derive(Error, Debug)]
pub enum CoreError {
    /// The provider answered with a non-success status
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// The provider could not be reached at all
    #[error("Transport error: {0}")]
    Transport(String),

    /// An error with an extra layer of explanation
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CoreError>,
    },

    /// An error from a foreign SDK or collaborator crate
    #[error("{0}")]
    External(Box<dyn ClassifiableError>),

    #[error("failed to parse properties: {0}")]
    InvalidProperties(#[source] serde_json::Error),

    #[error("failed to read existing resource: {0}")]
    ReadBeforePatch(#[source] Box<CoreError>),

    #[error("failed to decode patch document: {0}")]
    InvalidPatchDocument(#[source] serde_json::Error),

    #[error("failed to apply patch: {0}")]
    PatchApplication(#[source] json_patch::PatchError),

    #[error("failed to parse merged properties: {0}")]
    InvalidMergedProperties(#[source] serde_json::Error),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("no operator registered for resource type: {0}")]
    OperatorNotFound(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Wrap this error in a context layer
    pub fn context(self, context: impl Into<String>) -> Self {
        CoreError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Wrap a foreign error so the classifier can walk into it
    pub fn external(err: impl ClassifiableError + 'static) -> Self {
        CoreError::External(Box::new(err))
    }

    /// Returns true if the caller gave up on the operation (cancel or deadline),
    /// looking through context layers
    pub fn is_cancellation(&self) -> bool {
        match self {
            CoreError::Cancelled | CoreError::DeadlineExceeded => true,
            CoreError::Context { source, .. } => source.is_cancellation(),
            _ => false,
        }
    }
}

impl ClassifiableError for CoreError {
    fn service_error(&self) -> Option<&ServiceError> {
        match self {
            CoreError::Service(err) => Some(err),
            _ => None,
        }
    }

    fn next_cause(&self) -> Option<&dyn ClassifiableError> {
        match self {
            CoreError::Context { source, .. } => Some(source.as_ref()),
            CoreError::ReadBeforePatch(source) => Some(source.as_ref()),
            CoreError::External(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

/// Adds context layers to results, in the spirit of `anyhow::Context`
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display_nests_messages() {
        let err = CoreError::Transport("connection reset".to_string())
            .context("failed to create VCN");
        assert_eq!(
            err.to_string(),
            "failed to create VCN: Transport error: connection reset"
        );
    }

    #[test]
    fn test_cancellation_seen_through_context() {
        let err = CoreError::Cancelled.context("failed to get work request wr-1");
        assert!(err.is_cancellation());
        assert!(!CoreError::Transport("boom".into()).is_cancellation());
    }

    #[test]
    fn test_result_ext_adds_layer() {
        let res: Result<()> = Err(CoreError::ResourceNotFound("ocid1.vcn".into()));
        let err = res.with_context(|| format!("failed to read {}", "VCN")).unwrap_err();
        assert!(matches!(err, CoreError::Context { .. }));
        assert!(err.next_cause().is_some());
    }
}
