//! Long-running operation (work request) polling
//!
//! Asynchronous provider writes hand back a work request id. The orchestrator
//! keeps that id as the result's `request_id` and calls `status` with it
//! until the work request reaches a terminal state. Polling only reads; it
//! never schedules anything in the background.

use crate::context::OperationContext;
use crate::error::{Result, ResultExt};
use crate::operation::{Operation, OperationErrorCode, ProgressResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider-reported lifecycle state of a work request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkRequestStatus {
    Accepted,
    InProgress,
    Failed,
    Succeeded,
    Canceling,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// What a work request did to one of the resources it touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Created,
    Updated,
    Deleted,
    Related,
    InProgress,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequestResource {
    pub action_type: ActionType,

    #[serde(default)]
    pub entity_type: String,

    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub entity_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequest {
    pub id: String,

    #[serde(default)]
    pub operation_type: Option<String>,

    pub status: WorkRequestStatus,

    #[serde(default)]
    pub compartment_id: Option<String>,

    #[serde(default)]
    pub resources: Vec<WorkRequestResource>,

    #[serde(default)]
    pub percent_complete: Option<f32>,

    #[serde(default)]
    pub time_accepted: Option<DateTime<Utc>>,

    #[serde(default)]
    pub time_started: Option<DateTime<Utc>>,

    #[serde(default)]
    pub time_finished: Option<DateTime<Utc>>,
}

impl WorkRequest {
    /// Identifier of the first resource the work request reports for `action`
    pub fn resource_id(&self, action: ActionType) -> Option<&str> {
        self.resources
            .iter()
            .filter(|r| r.action_type == action)
            .find_map(|r| r.identifier.as_deref())
    }

    /// Identifier of the resource this work request produced
    ///
    /// Deletes report no created or updated entry, so related entries are
    /// accepted last.
    pub fn produced_resource_id(&self) -> Option<&str> {
        [ActionType::Created, ActionType::Updated, ActionType::Related]
            .into_iter()
            .find_map(|action| self.resource_id(action))
    }
}

/// One error entry recorded against a failed work request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequestError {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Provider endpoint answering work request queries
#[async_trait]
pub trait WorkRequestSource: Send + Sync {
    async fn get_work_request(&self, ctx: &OperationContext, id: &str) -> Result<WorkRequest>;

    async fn list_work_request_errors(
        &self,
        ctx: &OperationContext,
        id: &str,
        compartment_id: &str,
    ) -> Result<Vec<WorkRequestError>>;
}

/// Maps provider work request state onto operation results
pub struct WorkRequestPoller<S> {
    source: S,
}

impl<S: WorkRequestSource> WorkRequestPoller<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Query the work request behind `handle` once
    ///
    /// A failure to query the work request itself is a hard error; a failure
    /// the work request reports is a `Failure` result.
    pub async fn poll_status(
        &self,
        ctx: &OperationContext,
        handle: &str,
        operation: Operation,
    ) -> Result<ProgressResult> {
        let work_request = ctx
            .run(self.source.get_work_request(ctx, handle))
            .await
            .with_context(|| format!("failed to get work request {}", handle))?;

        tracing::debug!(
            work_request_id = handle,
            status = ?work_request.status,
            percent_complete = ?work_request.percent_complete,
            "polled work request"
        );

        let result = match work_request.status {
            WorkRequestStatus::Succeeded => ProgressResult::success(
                operation,
                work_request.produced_resource_id().unwrap_or_default(),
            ),
            WorkRequestStatus::Failed => {
                let message = self.failure_message(ctx, handle, &work_request).await?;
                ProgressResult::failure(operation, OperationErrorCode::NotSet, message)
            }
            WorkRequestStatus::Canceled => ProgressResult::failure(
                operation,
                OperationErrorCode::NotSet,
                "Operation was canceled",
            ),
            WorkRequestStatus::Accepted
            | WorkRequestStatus::InProgress
            | WorkRequestStatus::Canceling
            | WorkRequestStatus::Unknown => ProgressResult::in_progress(operation, handle),
        };

        Ok(result)
    }

    /// Best-effort description of why a work request failed
    ///
    /// Only cancellation propagates; any other problem fetching the details
    /// degrades to a generic message.
    async fn failure_message(
        &self,
        ctx: &OperationContext,
        handle: &str,
        work_request: &WorkRequest,
    ) -> Result<String> {
        let Some(compartment_id) = work_request.compartment_id.as_deref() else {
            return Ok("Work request failed (no compartment ID to retrieve errors)".to_string());
        };

        let entries = match ctx
            .run(
                self.source
                    .list_work_request_errors(ctx, handle, compartment_id),
            )
            .await
        {
            Ok(entries) => entries,
            Err(e) if e.is_cancellation() => return Err(e),
            Err(e) => {
                tracing::warn!(work_request_id = handle, error = %e, "could not list work request errors");
                return Ok(format!(
                    "Work request failed (could not retrieve error details: {})",
                    e
                ));
            }
        };

        if entries.is_empty() {
            return Ok("Work request failed (no error details available)".to_string());
        }

        let messages: Vec<&str> = entries
            .iter()
            .filter_map(|entry| entry.message.as_deref())
            .collect();
        if messages.is_empty() {
            return Ok("Work request failed (no error messages)".to_string());
        }

        Ok(messages.join("; "))
    }
}

/// Result for a write the provider accepted as a work request
pub fn in_progress(operation: Operation, work_request_id: impl Into<String>) -> ProgressResult {
    ProgressResult::in_progress(operation, work_request_id)
}
