//! Work request queries against a service family's REST API

use crate::service::ServiceClient;
use async_trait::async_trait;
use provisio_core::poller::{WorkRequest, WorkRequestError, WorkRequestSource};
use provisio_core::{OperationContext, Result};
use std::sync::Arc;

/// Work request endpoints of one service family
pub struct ServiceWorkRequests {
    client: Arc<ServiceClient>,
}

impl ServiceWorkRequests {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkRequestSource for ServiceWorkRequests {
    async fn get_work_request(&self, ctx: &OperationContext, id: &str) -> Result<WorkRequest> {
        let response = self
            .client
            .get(ctx, &["workRequests", id], &[])
            .await?;
        Ok(response.body)
    }

    async fn list_work_request_errors(
        &self,
        ctx: &OperationContext,
        id: &str,
        compartment_id: &str,
    ) -> Result<Vec<WorkRequestError>> {
        let response = self
            .client
            .get(
                ctx,
                &["workRequests", id, "errors"],
                &[("compartmentId", compartment_id)],
            )
            .await?;
        Ok(response.body)
    }
}
