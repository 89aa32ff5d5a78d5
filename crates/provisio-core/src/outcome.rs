//! Turning write errors into terminal results
//!
//! A classified provider failure becomes a structured `Failure` result the
//! orchestrator can act on. Anything else is handed back unchanged so it
//! surfaces as a hard error.

use crate::classify::{classify, find_service_error};
use crate::error::{CoreError, Result};
use crate::operation::{Operation, ProgressResult};

pub fn handle_create_error(err: CoreError, resource_type: &str) -> Result<ProgressResult> {
    failure_result(err, Operation::Create, resource_type, "created", None)
}

pub fn handle_update_error(
    err: CoreError,
    resource_type: &str,
    native_id: &str,
) -> Result<ProgressResult> {
    failure_result(err, Operation::Update, resource_type, "updated", Some(native_id))
}

pub fn handle_delete_error(
    err: CoreError,
    resource_type: &str,
    native_id: &str,
) -> Result<ProgressResult> {
    failure_result(err, Operation::Delete, resource_type, "deleted", Some(native_id))
}

fn failure_result(
    err: CoreError,
    operation: Operation,
    resource_type: &str,
    verb: &str,
    native_id: Option<&str>,
) -> Result<ProgressResult> {
    let (code, classified) = classify(Some(&err));
    if !classified {
        return Err(err);
    }

    let message = match find_service_error(&err) {
        Some(service_err) if !service_err.message.is_empty() => {
            format!("{} cannot be {}: {}", resource_type, verb, service_err.message)
        }
        _ => err.to_string(),
    };

    tracing::info!(
        resource_type,
        operation = %operation,
        error_code = %code,
        "provider rejected write"
    );

    let mut result = ProgressResult::failure(operation, code, message);
    if let Some(native_id) = native_id {
        result.native_id = native_id.to_string();
    }
    Ok(result)
}
