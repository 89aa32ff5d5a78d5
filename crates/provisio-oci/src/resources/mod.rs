//! Resource operators

pub mod cluster;
pub mod vcn;

pub use cluster::ClusterOperator;
pub use vcn::VcnOperator;

use crate::client::Clients;
use provisio_core::{
    CoreError, OperationErrorCode, OperatorRegistry, ResourceOperator, Result, classify,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Register every operator this crate provides
pub fn register_all(registry: &mut OperatorRegistry<Clients>) {
    registry.register(vcn::RESOURCE_TYPE, |clients: Arc<Clients>| {
        Box::new(VcnOperator::new(clients)) as Box<dyn ResourceOperator>
    });
    registry.register(cluster::RESOURCE_TYPE, |clients: Arc<Clients>| {
        Box::new(ClusterOperator::new(clients)) as Box<dyn ResourceOperator>
    });
}

/// Registry populated with every operator of this crate
pub fn default_registry() -> OperatorRegistry<Clients> {
    let mut registry = OperatorRegistry::new();
    register_all(&mut registry);
    registry
}

/// Returns true if the provider reported the resource as absent
pub(crate) fn is_not_found(err: &CoreError) -> bool {
    classify(Some(err)).0 == OperationErrorCode::NotFound
}

pub(crate) fn parse_properties(raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(raw).map_err(CoreError::InvalidProperties)
}

pub(crate) fn to_properties<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
