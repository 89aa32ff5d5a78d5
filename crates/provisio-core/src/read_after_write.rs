//! Read-after-write consistency decorator
//!
//! Provider write responses often omit defaulted or server-computed fields.
//! [`ReadAfterWrite`] re-reads a resource after a synchronous create or update
//! succeeds and replaces the returned properties with the authoritative view.
//! The extra read can only improve the result: if it fails, the write's own
//! properties are kept and nothing is surfaced to the caller.

use crate::context::OperationContext;
use crate::error::Result;
use crate::operation::{
    CreateRequest, DeleteRequest, ListRequest, ListResult, ProgressResult, ReadRequest,
    ReadResult, StatusRequest, UpdateRequest,
};
use crate::operator::ResourceOperator;
use async_trait::async_trait;
use serde_json::Value;

pub struct ReadAfterWrite {
    inner: Box<dyn ResourceOperator>,
}

impl ReadAfterWrite {
    pub fn new(inner: Box<dyn ResourceOperator>) -> Self {
        Self { inner }
    }

    async fn refresh(
        &self,
        ctx: &OperationContext,
        resource_type: &str,
        target_config: &Value,
        mut result: ProgressResult,
    ) -> ProgressResult {
        if !result.is_success() || result.native_id.is_empty() {
            return result;
        }

        let request = ReadRequest {
            resource_type: resource_type.to_string(),
            native_id: result.native_id.clone(),
            target_config: target_config.clone(),
        };

        match self.inner.read(ctx, &request).await {
            Ok(read) if read.error_code.is_not_set() => {
                result.resource_properties = Some(read.properties);
            }
            Ok(read) => {
                tracing::debug!(
                    resource_type,
                    native_id = %result.native_id,
                    error_code = %read.error_code,
                    "read after write reported an error code, keeping write properties"
                );
            }
            Err(e) => {
                tracing::debug!(
                    resource_type,
                    native_id = %result.native_id,
                    error = %e,
                    "read after write failed, keeping write properties"
                );
            }
        }

        result
    }
}

#[async_trait]
impl ResourceOperator for ReadAfterWrite {
    async fn create(
        &self,
        ctx: &OperationContext,
        request: &CreateRequest,
    ) -> Result<ProgressResult> {
        let result = self.inner.create(ctx, request).await?;
        Ok(self
            .refresh(ctx, &request.resource_type, &request.target_config, result)
            .await)
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        request: &UpdateRequest,
    ) -> Result<ProgressResult> {
        let result = self.inner.update(ctx, request).await?;
        Ok(self
            .refresh(ctx, &request.resource_type, &request.target_config, result)
            .await)
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        request: &DeleteRequest,
    ) -> Result<ProgressResult> {
        self.inner.delete(ctx, request).await
    }

    async fn status(
        &self,
        ctx: &OperationContext,
        request: &StatusRequest,
    ) -> Result<ProgressResult> {
        self.inner.status(ctx, request).await
    }

    async fn read(&self, ctx: &OperationContext, request: &ReadRequest) -> Result<ReadResult> {
        self.inner.read(ctx, request).await
    }

    async fn list(&self, ctx: &OperationContext, request: &ListRequest) -> Result<ListResult> {
        self.inner.list(ctx, request).await
    }
}
