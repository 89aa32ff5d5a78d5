//! Resource operator trait definition

use crate::context::OperationContext;
use crate::error::Result;
use crate::operation::{
    CreateRequest, DeleteRequest, ListRequest, ListResult, ProgressResult, ReadRequest,
    ReadResult, StatusRequest, UpdateRequest,
};
use async_trait::async_trait;

/// Resource operator abstraction trait
///
/// One implementation exists per provider resource type. Implementations do
/// the property transcoding and the provider call; the reconciliation
/// protocol around them (consistency reads, polling, error classification)
/// lives in this crate and never depends on a concrete resource type.
#[async_trait]
pub trait ResourceOperator: Send + Sync {
    /// Create a resource from its desired properties
    async fn create(&self, ctx: &OperationContext, request: &CreateRequest)
    -> Result<ProgressResult>;

    /// Update an existing resource, from full desired state or a patch
    async fn update(&self, ctx: &OperationContext, request: &UpdateRequest)
    -> Result<ProgressResult>;

    /// Delete a resource; deleting an absent resource succeeds
    async fn delete(&self, ctx: &OperationContext, request: &DeleteRequest)
    -> Result<ProgressResult>;

    /// Poll a request handle previously returned by a write
    async fn status(&self, ctx: &OperationContext, request: &StatusRequest)
    -> Result<ProgressResult>;

    /// Read the current properties of a resource
    async fn read(&self, ctx: &OperationContext, request: &ReadRequest) -> Result<ReadResult>;

    /// List native identifiers of resources of this type
    async fn list(&self, ctx: &OperationContext, request: &ListRequest) -> Result<ListResult>;
}
