//! Provider error classification
//!
//! Walks an error's cause chain looking for the first layer that carries a
//! provider service error, and maps it onto the closed
//! [`OperationErrorCode`] taxonomy the orchestrator acts on.

use crate::operation::OperationErrorCode;
use serde::{Deserialize, Serialize};

/// Upper bound on how many cause layers are inspected
pub const MAX_CAUSE_DEPTH: usize = 32;

/// Provider code that hides a 404 behind an authorization failure
pub const CODE_NOT_AUTHORIZED_OR_NOT_FOUND: &str = "NotAuthorizedOrNotFound";

/// Provider code for explicit throttling
pub const CODE_TOO_MANY_REQUESTS: &str = "TooManyRequests";

/// A failure reported by the provider service itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// HTTP status of the response
    pub status: u16,

    /// Provider-specific symbolic code (e.g. "NotAuthorizedOrNotFound")
    pub code: String,

    /// Human-readable message from the provider
    pub message: String,

    /// Request identifier echoed by the provider, if any
    pub opc_request_id: Option<String>,
}

impl ServiceError {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            opc_request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.opc_request_id = Some(request_id.into());
        self
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Service error: {} (status {}): {}",
            self.code, self.status, self.message
        )?;
        if let Some(id) = &self.opc_request_id {
            write!(f, " [opc-request-id: {}]", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

/// An error that can expose a provider service failure and its cause
///
/// Any SDK error type can implement this to become classifiable without the
/// classifier knowing about it.
pub trait ClassifiableError: std::error::Error + Send + Sync {
    /// The provider failure carried by this layer, if any
    fn service_error(&self) -> Option<&ServiceError>;

    /// The next layer of the chain
    fn next_cause(&self) -> Option<&dyn ClassifiableError> {
        None
    }
}

impl ClassifiableError for ServiceError {
    fn service_error(&self) -> Option<&ServiceError> {
        Some(self)
    }
}

/// Find the first layer of the chain that carries a service error
pub fn find_service_error(err: &dyn ClassifiableError) -> Option<&ServiceError> {
    // Layers are compared as fat pointers: a wrapper and its first field
    // share an address but not a vtable.
    let mut visited: Vec<&dyn ClassifiableError> = Vec::new();
    let mut current = Some(err);

    while let Some(layer) = current {
        let seen = visited.iter().any(|prev| std::ptr::eq(*prev, layer));
        if seen || visited.len() >= MAX_CAUSE_DEPTH {
            tracing::debug!(depth = visited.len(), "stopped walking error chain");
            return None;
        }
        visited.push(layer);

        if let Some(service_err) = layer.service_error() {
            return Some(service_err);
        }
        current = layer.next_cause();
    }

    None
}

/// Map a service error to the taxonomy, status first then provider code
pub fn classify_service_error(err: &ServiceError) -> Option<OperationErrorCode> {
    match err.status {
        404 => return Some(OperationErrorCode::NotFound),
        409 => return Some(OperationErrorCode::ResourceConflict),
        429 => return Some(OperationErrorCode::Throttling),
        500 | 502 | 503 => return Some(OperationErrorCode::ServiceInternalError),
        504 => return Some(OperationErrorCode::ServiceTimeout),
        _ => {}
    }

    match err.code.as_str() {
        CODE_NOT_AUTHORIZED_OR_NOT_FOUND => Some(OperationErrorCode::NotFound),
        CODE_TOO_MANY_REQUESTS => Some(OperationErrorCode::Throttling),
        _ => None,
    }
}

/// Classify an arbitrary error
///
/// Returns the matched code and `true`, or `(NotSet, false)` when no layer is
/// a classifiable provider failure (including when there is no error at all).
pub fn classify(err: Option<&dyn ClassifiableError>) -> (OperationErrorCode, bool) {
    err.and_then(find_service_error)
        .and_then(classify_service_error)
        .map(|code| (code, true))
        .unwrap_or((OperationErrorCode::NotSet, false))
}
