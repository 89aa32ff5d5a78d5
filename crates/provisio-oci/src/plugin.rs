//! Plugin entry point
//!
//! Every call resolves the request's target into a client bundle, looks up
//! the operator for the resource type and dispatches to it. Provider failures
//! on writes are turned into `Failure` results; everything else is returned as
//! a hard error.

use crate::client::Clients;
use crate::config::TargetConfig;
use crate::resources::default_registry;
use provisio_core::{
    CreateRequest, DeleteRequest, ListRequest, ListResult, OperationContext, OperatorRegistry,
    ProgressResult, ReadRequest, ReadResult, ResourceOperator, Result, StatusRequest,
    UpdateRequest, handle_create_error, handle_delete_error, handle_update_error,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

pub const PLUGIN_NAME: &str = "oci";

/// Resource type prefix shared by every operator of this plugin
pub const NAMESPACE: &str = "OCI";

/// Requests per second the orchestrator may issue across the namespace
pub const MAX_REQUESTS_PER_SECOND: u32 = 2;

/// What a rate limit is counted against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitScope {
    /// One budget shared by every resource type of the namespace
    Namespace,
}

/// Throttling the orchestrator applies to calls into this plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub scope: RateLimitScope,
    pub max_requests_per_second: u32,
}

pub struct Plugin {
    registry: Arc<OperatorRegistry<Clients>>,
    clients: Mutex<HashMap<TargetConfig, Arc<Clients>>>,
}

impl Default for Plugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin {
    /// Plugin with every operator of this crate registered
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    pub fn with_registry(registry: OperatorRegistry<Clients>) -> Self {
        Self {
            registry: Arc::new(registry),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        PLUGIN_NAME
    }

    pub fn namespace(&self) -> &str {
        NAMESPACE
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            scope: RateLimitScope::Namespace,
            max_requests_per_second: MAX_REQUESTS_PER_SECOND,
        }
    }

    pub fn supported_resources(&self) -> BTreeSet<String> {
        self.registry.list_registered()
    }

    /// Client bundle for a target, shared by every call with the same target
    fn clients_for(&self, target_config: &serde_json::Value) -> Result<Arc<Clients>> {
        let target = TargetConfig::from_target_config(target_config);

        let mut cache = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(clients) = cache.get(&target) {
            return Ok(Arc::clone(clients));
        }

        let clients = Arc::new(Clients::from_target(&target)?);
        tracing::debug!(
            region = %clients.configuration_provider().region,
            "built clients for target"
        );
        cache.insert(target, Arc::clone(&clients));
        Ok(clients)
    }

    fn operator(
        &self,
        resource_type: &str,
        target_config: &serde_json::Value,
    ) -> Result<Arc<dyn ResourceOperator>> {
        let clients = self.clients_for(target_config)?;
        self.registry.get(resource_type, clients)
    }

    pub async fn create(
        &self,
        ctx: &OperationContext,
        request: &CreateRequest,
    ) -> Result<ProgressResult> {
        let operator = self.operator(&request.resource_type, &request.target_config)?;
        match operator.create(ctx, request).await {
            Ok(result) => Ok(result),
            Err(e) => handle_create_error(e, &request.resource_type),
        }
    }

    pub async fn update(
        &self,
        ctx: &OperationContext,
        request: &UpdateRequest,
    ) -> Result<ProgressResult> {
        let operator = self.operator(&request.resource_type, &request.target_config)?;
        match operator.update(ctx, request).await {
            Ok(result) => Ok(result),
            Err(e) => handle_update_error(e, &request.resource_type, &request.native_id),
        }
    }

    pub async fn delete(
        &self,
        ctx: &OperationContext,
        request: &DeleteRequest,
    ) -> Result<ProgressResult> {
        let operator = self.operator(&request.resource_type, &request.target_config)?;
        match operator.delete(ctx, request).await {
            Ok(result) => Ok(result),
            Err(e) => handle_delete_error(e, &request.resource_type, &request.native_id),
        }
    }

    pub async fn status(
        &self,
        ctx: &OperationContext,
        request: &StatusRequest,
    ) -> Result<ProgressResult> {
        let operator = self.operator(&request.resource_type, &request.target_config)?;
        operator.status(ctx, request).await
    }

    pub async fn read(&self, ctx: &OperationContext, request: &ReadRequest) -> Result<ReadResult> {
        let operator = self.operator(&request.resource_type, &request.target_config)?;
        operator.read(ctx, request).await
    }

    /// Listing an unsupported resource type yields nothing rather than an error
    pub async fn list(&self, ctx: &OperationContext, request: &ListRequest) -> Result<ListResult> {
        if !self.registry.contains(&request.resource_type) {
            tracing::debug!(
                resource_type = %request.resource_type,
                "no operator registered, listing nothing"
            );
            return Ok(ListResult::empty());
        }

        let operator = self.operator(&request.resource_type, &request.target_config)?;
        operator.list(ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{cluster, vcn};
    use provisio_core::CoreError;
    use serde_json::json;
    use serial_test::serial;
    use tokio_test::{assert_err, assert_ok};

    fn target() -> serde_json::Value {
        json!({"Region": "us-ashburn-1", "Endpoint": "http://127.0.0.1:1"})
    }

    #[test]
    fn test_supported_resources() {
        let plugin = Plugin::new();
        let supported = plugin.supported_resources();
        assert!(supported.contains(vcn::RESOURCE_TYPE));
        assert!(supported.contains(cluster::RESOURCE_TYPE));
        assert!(supported.iter().all(|t| t.starts_with(plugin.namespace())));
    }

    #[test]
    fn test_rate_limit_is_per_namespace() {
        let limit = Plugin::new().rate_limit();
        assert_eq!(limit.scope, RateLimitScope::Namespace);
        assert_eq!(limit.max_requests_per_second, 2);
    }

    #[test]
    #[serial]
    fn test_clients_cached_per_target() {
        let plugin = Plugin::new();
        let a = plugin.clients_for(&target()).unwrap();
        let b = plugin.clients_for(&target()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let other = json!({"Region": "eu-frankfurt-1", "Endpoint": "http://127.0.0.1:1"});
        let c = plugin.clients_for(&other).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_unknown_type_lists_nothing() {
        let plugin = Plugin::new();
        let request = ListRequest {
            resource_type: "OCI::Unknown::Thing".to_string(),
            target_config: target(),
            ..Default::default()
        };
        let result = assert_ok!(plugin.list(&OperationContext::new(), &request).await);
        assert!(result.native_ids.is_empty());
        assert!(result.next_page_token.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_unknown_type_read_is_error() {
        let plugin = Plugin::new();
        let request = ReadRequest {
            resource_type: "OCI::Unknown::Thing".to_string(),
            native_id: "ocid1.thing".to_string(),
            target_config: target(),
        };
        let err = assert_err!(plugin.read(&OperationContext::new(), &request).await);
        assert!(matches!(err, CoreError::OperatorNotFound(t) if t == "OCI::Unknown::Thing"));
    }

    #[tokio::test]
    #[serial]
    async fn test_invalid_create_properties_is_hard_error() {
        let plugin = Plugin::new();
        let request = CreateRequest {
            resource_type: vcn::RESOURCE_TYPE.to_string(),
            properties: "not json".to_string(),
            target_config: target(),
            ..Default::default()
        };
        let err = assert_err!(plugin.create(&OperationContext::new(), &request).await);
        assert!(matches!(err, CoreError::InvalidProperties(_)));
    }
}
