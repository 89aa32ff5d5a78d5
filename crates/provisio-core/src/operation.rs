//! Operation results and requests exchanged with the orchestrator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The write or check an orchestrator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
    CheckStatus,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::CheckStatus => write!(f, "check-status"),
        }
    }
}

/// Tri-state outcome of a write or status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationStatus {
    Success,
    Failure,
    InProgress,
}

impl OperationStatus {
    /// Returns true once the operation can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::InProgress)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Success => write!(f, "success"),
            OperationStatus::Failure => write!(f, "failure"),
            OperationStatus::InProgress => write!(f, "in-progress"),
        }
    }
}

/// Closed error taxonomy the orchestrator makes policy decisions on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationErrorCode {
    /// Could not classify; treat the underlying error as fatal
    #[default]
    NotSet,
    NotFound,
    ResourceConflict,
    Throttling,
    ServiceInternalError,
    ServiceTimeout,
}

impl OperationErrorCode {
    pub fn is_set(&self) -> bool {
        !matches!(self, OperationErrorCode::NotSet)
    }

    pub fn is_not_set(&self) -> bool {
        !self.is_set()
    }
}

impl std::fmt::Display for OperationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationErrorCode::NotSet => write!(f, ""),
            OperationErrorCode::NotFound => write!(f, "NotFound"),
            OperationErrorCode::ResourceConflict => write!(f, "ResourceConflict"),
            OperationErrorCode::Throttling => write!(f, "Throttling"),
            OperationErrorCode::ServiceInternalError => write!(f, "ServiceInternalError"),
            OperationErrorCode::ServiceTimeout => write!(f, "ServiceTimeout"),
        }
    }
}

/// Result of a create, update, delete or status call
///
/// Built fresh per call and never mutated once handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProgressResult {
    pub operation: Operation,

    pub operation_status: OperationStatus,

    /// Provider-assigned identifier, empty until known
    #[serde(rename = "NativeID", default)]
    pub native_id: String,

    /// Handle to poll while the operation is in progress
    #[serde(rename = "RequestID", default)]
    pub request_id: String,

    #[serde(default, skip_serializing_if = "OperationErrorCode::is_not_set")]
    pub error_code: OperationErrorCode,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status_message: String,

    /// Serialized JSON property set, as far as it is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_properties: Option<String>,
}

impl ProgressResult {
    fn new(operation: Operation, operation_status: OperationStatus) -> Self {
        Self {
            operation,
            operation_status,
            native_id: String::new(),
            request_id: String::new(),
            error_code: OperationErrorCode::NotSet,
            status_message: String::new(),
            resource_properties: None,
        }
    }

    /// An operation still running on the provider side
    pub fn in_progress(operation: Operation, request_id: impl Into<String>) -> Self {
        Self::new(operation, OperationStatus::InProgress).with_request_id(request_id)
    }

    /// A completed operation
    pub fn success(operation: Operation, native_id: impl Into<String>) -> Self {
        Self::new(operation, OperationStatus::Success).with_native_id(native_id)
    }

    /// A failed operation
    pub fn failure(
        operation: Operation,
        error_code: OperationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        let mut result = Self::new(operation, OperationStatus::Failure);
        result.error_code = error_code;
        result.status_message = message.into();
        result
    }

    pub fn with_native_id(mut self, native_id: impl Into<String>) -> Self {
        self.native_id = native_id.into();
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.resource_properties = Some(properties.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.operation_status == OperationStatus::Success
    }
}

/// Result of reading one resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReadResult {
    pub resource_type: String,

    /// Serialized JSON property set, empty when not found
    #[serde(default)]
    pub properties: String,

    #[serde(default, skip_serializing_if = "OperationErrorCode::is_not_set")]
    pub error_code: OperationErrorCode,
}

impl ReadResult {
    pub fn found(resource_type: impl Into<String>, properties: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: properties.into(),
            error_code: OperationErrorCode::NotSet,
        }
    }

    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: String::new(),
            error_code: OperationErrorCode::NotFound,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_code == OperationErrorCode::NotFound
    }
}

/// Result of listing resources of one type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResult {
    #[serde(rename = "NativeIDs")]
    pub native_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ListResult {
    pub fn new(native_ids: Vec<String>) -> Self {
        Self {
            native_ids,
            next_page_token: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Request to create a resource from its desired properties
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRequest {
    pub resource_type: String,

    /// Orchestrator-side label of the resource
    #[serde(default)]
    pub label: String,

    /// Serialized JSON desired properties
    pub properties: String,

    #[serde(default)]
    pub target_config: serde_json::Value,
}

/// Request to update a resource, either by full state or by patch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateRequest {
    pub resource_type: String,

    #[serde(rename = "NativeID")]
    pub native_id: String,

    /// Serialized JSON desired properties, used when there is no patch
    #[serde(default)]
    pub desired_properties: String,

    /// RFC 6902 patch (array) or RFC 7396 merge patch (object)
    #[serde(default)]
    pub patch_document: Option<String>,

    #[serde(default)]
    pub target_config: serde_json::Value,
}

impl UpdateRequest {
    /// Returns the patch document when one was actually supplied
    pub fn patch(&self) -> Option<&str> {
        self.patch_document
            .as_deref()
            .filter(|doc| !doc.trim().is_empty())
    }

    /// Read request for the same resource and target
    pub fn read_request(&self) -> ReadRequest {
        ReadRequest {
            resource_type: self.resource_type.clone(),
            native_id: self.native_id.clone(),
            target_config: self.target_config.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRequest {
    pub resource_type: String,

    #[serde(rename = "NativeID")]
    pub native_id: String,

    #[serde(default)]
    pub target_config: serde_json::Value,
}

impl DeleteRequest {
    pub fn read_request(&self) -> ReadRequest {
        ReadRequest {
            resource_type: self.resource_type.clone(),
            native_id: self.native_id.clone(),
            target_config: self.target_config.clone(),
        }
    }
}

/// Request to poll a previously returned request handle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusRequest {
    pub resource_type: String,

    #[serde(rename = "RequestID")]
    pub request_id: String,

    #[serde(rename = "NativeID", default)]
    pub native_id: String,

    #[serde(default)]
    pub target_config: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReadRequest {
    pub resource_type: String,

    #[serde(rename = "NativeID")]
    pub native_id: String,

    #[serde(default)]
    pub target_config: serde_json::Value,
}

/// Request to list resources, filtered e.g. by a parent container id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRequest {
    pub resource_type: String,

    #[serde(default)]
    pub additional_properties: BTreeMap<String, String>,

    #[serde(default)]
    pub page_token: Option<String>,

    #[serde(default)]
    pub target_config: serde_json::Value,
}

impl ListRequest {
    /// Get a required filter property
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.additional_properties
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
