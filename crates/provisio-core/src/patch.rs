//! Partial-update resolution
//!
//! An update either carries the full desired state or a patch document
//! relative to the provider's current state. A JSON array is applied as an
//! RFC 6902 JSON Patch; a JSON object is applied as an RFC 7396 merge patch.

use crate::error::{CoreError, Result};
use crate::operation::{ReadRequest, ReadResult, UpdateRequest};
use serde_json::{Map, Value};
use std::future::Future;

/// Resolve the property set an update should converge to
///
/// `read` fetches the authoritative current state and is only called when a
/// patch document is present. The request itself is never modified.
pub async fn apply_patch_document<F, Fut>(
    request: &UpdateRequest,
    read: F,
) -> Result<Map<String, Value>>
where
    F: FnOnce(ReadRequest) -> Fut,
    Fut: Future<Output = Result<ReadResult>>,
{
    let Some(document) = request.patch() else {
        return serde_json::from_str(&request.desired_properties)
            .map_err(CoreError::InvalidProperties);
    };

    let current = read(request.read_request())
        .await
        .map_err(|e| CoreError::ReadBeforePatch(Box::new(e)))?;
    if current.is_not_found() {
        return Err(CoreError::ReadBeforePatch(Box::new(
            CoreError::ResourceNotFound(request.native_id.clone()),
        )));
    }

    let mut doc: Value = serde_json::from_str(&current.properties)
        .map_err(|e| CoreError::ReadBeforePatch(Box::new(CoreError::InvalidProperties(e))))?;

    let patch: Value = serde_json::from_str(document).map_err(CoreError::InvalidPatchDocument)?;
    match patch {
        Value::Array(_) => {
            let operations: json_patch::Patch =
                serde_json::from_value(patch).map_err(CoreError::InvalidPatchDocument)?;
            json_patch::patch(&mut doc, &operations.0).map_err(CoreError::PatchApplication)?;
        }
        Value::Object(_) => json_patch::merge(&mut doc, &patch),
        _ => {
            return Err(CoreError::InvalidPatchDocument(serde::de::Error::custom(
                "patch document must be a JSON array or object",
            )));
        }
    }

    tracing::debug!(
        resource_type = %request.resource_type,
        native_id = %request.native_id,
        "applied patch document"
    );

    serde_json::from_value(doc).map_err(CoreError::InvalidMergedProperties)
}
