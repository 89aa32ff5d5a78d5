//! Resource type to operator factory mapping

use crate::error::{CoreError, Result};
use crate::operator::ResourceOperator;
use crate::read_after_write::ReadAfterWrite;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Builds an operator for one resource type from a provider client bundle
pub type OperatorFactory<C> = Arc<dyn Fn(Arc<C>) -> Box<dyn ResourceOperator> + Send + Sync>;

/// Registry of resource operators, generic over the client bundle `C`
///
/// Built once during start-up and then shared read-only (typically behind an
/// `Arc`). Every operator handed out is wrapped in [`ReadAfterWrite`].
pub struct OperatorRegistry<C> {
    factories: HashMap<String, OperatorFactory<C>>,
}

impl<C> Default for OperatorRegistry<C> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<C> OperatorRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; a later registration for the same type wins
    pub fn register<F>(&mut self, resource_type: impl Into<String>, factory: F)
    where
        F: Fn(Arc<C>) -> Box<dyn ResourceOperator> + Send + Sync + 'static,
    {
        let resource_type = resource_type.into();
        if self
            .factories
            .insert(resource_type.clone(), Arc::new(factory))
            .is_some()
        {
            tracing::debug!(resource_type = %resource_type, "replaced operator registration");
        }
    }

    /// Build the decorated operator for a resource type
    pub fn get(&self, resource_type: &str, clients: Arc<C>) -> Result<Arc<dyn ResourceOperator>> {
        let factory = self
            .factories
            .get(resource_type)
            .ok_or_else(|| CoreError::OperatorNotFound(resource_type.to_string()))?;

        Ok(Arc::new(ReadAfterWrite::new(factory(clients))))
    }

    /// The raw, undecorated factory for a resource type
    pub fn factory(&self, resource_type: &str) -> Option<OperatorFactory<C>> {
        self.factories.get(resource_type).cloned()
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.factories.contains_key(resource_type)
    }

    /// All registered resource types, sorted
    pub fn list_registered(&self) -> BTreeSet<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OperationContext;
    use crate::operation::*;
    use async_trait::async_trait;

    struct Named {
        name: &'static str,
        reads: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl ResourceOperator for Named {
        async fn create(&self, _: &OperationContext, _: &CreateRequest) -> Result<ProgressResult> {
            Ok(ProgressResult::success(Operation::Create, self.name))
        }

        async fn update(&self, _: &OperationContext, _: &UpdateRequest) -> Result<ProgressResult> {
            Ok(ProgressResult::success(Operation::Update, self.name))
        }

        async fn delete(&self, _: &OperationContext, _: &DeleteRequest) -> Result<ProgressResult> {
            Ok(ProgressResult::success(Operation::Delete, self.name))
        }

        async fn status(&self, _: &OperationContext, _: &StatusRequest) -> Result<ProgressResult> {
            Ok(ProgressResult::success(Operation::CheckStatus, self.name))
        }

        async fn read(&self, _: &OperationContext, req: &ReadRequest) -> Result<ReadResult> {
            self.reads
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(ReadResult::found(&req.resource_type, r#"{"Size":50}"#))
        }

        async fn list(&self, _: &OperationContext, _: &ListRequest) -> Result<ListResult> {
            Ok(ListResult::new(vec![self.name.to_string()]))
        }
    }

    struct Clients;

    fn registry() -> (OperatorRegistry<Clients>, Arc<std::sync::atomic::AtomicUsize>) {
        let reads = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut registry = OperatorRegistry::new();
        let counter = reads.clone();
        registry.register("OCI::Core::VCN", move |_clients: Arc<Clients>| {
            Box::new(Named {
                name: "vcn",
                reads: counter.clone(),
            }) as Box<dyn ResourceOperator>
        });
        (registry, reads)
    }

    #[tokio::test]
    async fn test_get_wraps_in_read_after_write() {
        let (registry, reads) = registry();
        let operator = registry.get("OCI::Core::VCN", Arc::new(Clients)).unwrap();

        let result = operator
            .create(&OperationContext::new(), &CreateRequest::default())
            .await
            .unwrap();

        assert_eq!(result.resource_properties.as_deref(), Some(r#"{"Size":50}"#));
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_type() {
        let (registry, _) = registry();
        let err = registry.get("OCI::Core::Nope", Arc::new(Clients)).err().unwrap();
        assert_eq!(
            err.to_string(),
            "no operator registered for resource type: OCI::Core::Nope"
        );
        assert!(registry.factory("OCI::Core::Nope").is_none());
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let (mut registry, reads) = registry();
        let counter = reads.clone();
        registry.register("OCI::Core::VCN", move |_clients: Arc<Clients>| {
            Box::new(Named {
                name: "vcn-v2",
                reads: counter.clone(),
            }) as Box<dyn ResourceOperator>
        });

        assert_eq!(registry.len(), 1);
        let factory = registry.factory("OCI::Core::VCN").unwrap();
        let raw = factory(Arc::new(Clients));
        let listed = raw
            .list(&OperationContext::new(), &ListRequest::default())
            .await
            .unwrap();
        assert_eq!(listed.native_ids, vec!["vcn-v2"]);
        // The raw factory output is not decorated.
        raw.create(&OperationContext::new(), &CreateRequest::default())
            .await
            .unwrap();
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_list_registered_sorted() {
        let (mut registry, reads) = registry();
        let counter = reads.clone();
        registry.register("OCI::ContainerEngine::Cluster", move |_clients: Arc<Clients>| {
            Box::new(Named {
                name: "cluster",
                reads: counter.clone(),
            }) as Box<dyn ResourceOperator>
        });

        let types: Vec<String> = registry.list_registered().into_iter().collect();
        assert_eq!(types, vec!["OCI::ContainerEngine::Cluster", "OCI::Core::VCN"]);
        assert!(registry.contains("OCI::Core::VCN"));
    }
}
