//! `OCI::ContainerEngine::Cluster`
//!
//! Cluster writes are accepted as work requests. Every write returns an
//! in-progress result carrying the work request id, and `status` resolves it
//! through the work request poller.

use super::{is_not_found, parse_properties, to_properties};
use crate::client::Clients;
use crate::properties::Properties;
use crate::work_request::ServiceWorkRequests;
use async_trait::async_trait;
use provisio_core::poller::{WorkRequestPoller, in_progress};
use provisio_core::{
    CoreError, CreateRequest, DeleteRequest, ListRequest, ListResult, Operation, OperationContext,
    ProgressResult, ReadRequest, ReadResult, ResourceOperator, Result, ResultExt, StatusRequest,
    UpdateRequest, apply_patch_document,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const RESOURCE_TYPE: &str = "OCI::ContainerEngine::Cluster";

pub struct ClusterOperator {
    clients: Arc<Clients>,
}

impl ClusterOperator {
    pub fn new(clients: Arc<Clients>) -> Self {
        Self { clients }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_public_ip_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nsg_ids: Option<Vec<String>>,
}

impl EndpointConfig {
    /// Nested keys are accepted in camelCase or PascalCase
    fn from_properties(p: Properties<'_>) -> Self {
        Self {
            subnet_id: p.string("subnetId").or_else(|| p.string("SubnetId")),
            is_public_ip_enabled: p
                .bool("isPublicIpEnabled")
                .or_else(|| p.bool("IsPublicIpEnabled")),
            nsg_ids: p.strings("nsgIds").or_else(|| p.strings("NsgIds")),
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct KubernetesNetworkConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pods_cidr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    services_cidr: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddOnOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    is_kubernetes_dashboard_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_tiller_enabled: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdmissionControllerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    is_pod_security_policy_enabled: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterCreateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    service_lb_subnet_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kubernetes_network_config: Option<KubernetesNetworkConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    add_ons: Option<AddOnOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admission_controller_options: Option<AdmissionControllerOptions>,
}

impl ClusterCreateOptions {
    fn from_properties(p: Properties<'_>) -> Self {
        Self {
            service_lb_subnet_ids: p.strings("serviceLbSubnetIds"),
            kubernetes_network_config: p.object("kubernetesNetworkConfig").map(|n| {
                KubernetesNetworkConfig {
                    pods_cidr: n.string("podsCidr"),
                    services_cidr: n.string("servicesCidr"),
                }
            }),
            add_ons: p.object("addOns").map(|a| AddOnOptions {
                is_kubernetes_dashboard_enabled: a.bool("isKubernetesDashboardEnabled"),
                is_tiller_enabled: a.bool("isTillerEnabled"),
            }),
            admission_controller_options: p.object("admissionControllerOptions").map(|a| {
                AdmissionControllerOptions {
                    is_pod_security_policy_enabled: a.bool("isPodSecurityPolicyEnabled"),
                }
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateClusterDetails {
    compartment_id: String,
    vcn_id: String,
    kubernetes_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    cluster_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint_config: Option<EndpointConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ClusterCreateOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateClusterOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    admission_controller_options: Option<AdmissionControllerOptions>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateClusterDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kubernetes_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<UpdateClusterOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

/// Cluster as returned by the API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cluster {
    id: String,
    compartment_id: String,
    vcn_id: String,
    kubernetes_version: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    cluster_type: Option<String>,
    #[serde(default)]
    lifecycle_state: Option<String>,
    #[serde(default)]
    endpoints: Option<ClusterEndpoints>,
    #[serde(default)]
    endpoint_config: Option<Map<String, Value>>,
    #[serde(default)]
    options: Option<Map<String, Value>>,
    #[serde(default)]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterEndpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kubernetes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_endpoint: Option<String>,
}

impl ClusterEndpoints {
    fn is_empty(&self) -> bool {
        self.kubernetes.is_none() && self.public_endpoint.is_none() && self.private_endpoint.is_none()
    }
}

/// Cluster in the orchestrator's property shape
///
/// `EndpointConfig` and `Options` keep the API's camelCase nested keys, and
/// create and update read the same keys this shape emits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ClusterProperties {
    compartment_id: String,
    id: String,
    vcn_id: String,
    kubernetes_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lifecycle_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoints: Option<EndpointsProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint_config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EndpointsProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    kubernetes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_endpoint: Option<String>,
}

impl From<Cluster> for ClusterProperties {
    fn from(cluster: Cluster) -> Self {
        Self {
            compartment_id: cluster.compartment_id,
            id: cluster.id,
            vcn_id: cluster.vcn_id,
            kubernetes_version: cluster.kubernetes_version,
            name: cluster.name,
            r#type: cluster.cluster_type.filter(|t| !t.is_empty()),
            lifecycle_state: cluster.lifecycle_state.filter(|s| !s.is_empty()),
            endpoints: cluster
                .endpoints
                .filter(|e| !e.is_empty())
                .map(|e| EndpointsProperties {
                    kubernetes: e.kubernetes,
                    public_endpoint: e.public_endpoint,
                    private_endpoint: e.private_endpoint,
                }),
            endpoint_config: cluster.endpoint_config.filter(|m| !m.is_empty()),
            options: cluster.options.filter(|m| !m.is_empty()),
            freeform_tags: cluster.freeform_tags,
            defined_tags: cluster.defined_tags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClusterSummary {
    id: String,
    #[serde(rename = "lifecycleState", default)]
    lifecycle_state: Option<String>,
}

#[async_trait]
impl ResourceOperator for ClusterOperator {
    async fn create(
        &self,
        ctx: &OperationContext,
        request: &CreateRequest,
    ) -> Result<ProgressResult> {
        let props = parse_properties(&request.properties)?;
        let p = Properties::new(&props);

        let details = CreateClusterDetails {
            compartment_id: p.require_string("CompartmentId")?,
            vcn_id: p.require_string("VcnId")?,
            kubernetes_version: p.require_string("KubernetesVersion")?,
            name: p.string("Name"),
            cluster_type: p.string("Type").or_else(|| p.string("ClusterType")),
            endpoint_config: p.object("EndpointConfig").map(EndpointConfig::from_properties),
            options: p.object("Options").map(ClusterCreateOptions::from_properties),
            freeform_tags: p.tags("FreeformTags"),
            defined_tags: p.defined_tags("DefinedTags"),
        };

        let response = self
            .clients
            .container_engine()
            .post::<_, IgnoredAny>(ctx, &["clusters"], &details)
            .await
            .context("failed to create Cluster")?;

        let work_request_id = response.work_request_id()?;
        tracing::info!(%work_request_id, label = %request.label, "cluster creation accepted");
        Ok(in_progress(Operation::Create, work_request_id))
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        request: &UpdateRequest,
    ) -> Result<ProgressResult> {
        let props =
            apply_patch_document(request, |req| async move { self.read(ctx, &req).await })
                .await?;
        let p = Properties::new(&props);

        let details = UpdateClusterDetails {
            name: p.string("Name"),
            kubernetes_version: p.string("KubernetesVersion"),
            options: p.object("Options").map(|o| UpdateClusterOptions {
                admission_controller_options: o
                    .object("admissionControllerOptions")
                    .or_else(|| o.object("AdmissionControllerOptions"))
                    .map(|a| AdmissionControllerOptions {
                        is_pod_security_policy_enabled: a
                            .bool("isPodSecurityPolicyEnabled")
                            .or_else(|| a.bool("IsPodSecurityPolicyEnabled")),
                    }),
            }),
            freeform_tags: p.tags("FreeformTags"),
            defined_tags: p.defined_tags("DefinedTags"),
        };

        let response = self
            .clients
            .container_engine()
            .put::<_, IgnoredAny>(
                ctx,
                &["clusters", request.native_id.as_str()],
                &details,
            )
            .await
            .context("failed to update Cluster")?;

        let work_request_id = response.work_request_id()?;
        tracing::info!(cluster_id = %request.native_id, %work_request_id, "cluster update accepted");
        Ok(in_progress(Operation::Update, work_request_id))
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        request: &DeleteRequest,
    ) -> Result<ProgressResult> {
        let existing = self
            .read(ctx, &request.read_request())
            .await
            .context("failed to read Cluster before delete")?;
        if existing.is_not_found() {
            tracing::debug!(cluster_id = %request.native_id, "cluster already absent");
            return Ok(ProgressResult::success(
                Operation::Delete,
                &request.native_id,
            ));
        }

        let response = self
            .clients
            .container_engine()
            .delete(ctx, &["clusters", request.native_id.as_str()])
            .await
            .context("failed to delete Cluster")?;

        let work_request_id = response.work_request_id()?;
        tracing::info!(cluster_id = %request.native_id, %work_request_id, "cluster deletion accepted");
        Ok(in_progress(Operation::Delete, work_request_id))
    }

    async fn status(
        &self,
        ctx: &OperationContext,
        request: &StatusRequest,
    ) -> Result<ProgressResult> {
        let poller =
            WorkRequestPoller::new(ServiceWorkRequests::new(self.clients.container_engine()));
        poller
            .poll_status(ctx, &request.request_id, Operation::CheckStatus)
            .await
    }

    async fn read(&self, ctx: &OperationContext, request: &ReadRequest) -> Result<ReadResult> {
        let response = match self
            .clients
            .container_engine()
            .get::<Cluster>(ctx, &["clusters", request.native_id.as_str()], &[])
            .await
        {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Ok(ReadResult::not_found(RESOURCE_TYPE)),
            Err(e) => return Err(e.context("failed to read Cluster")),
        };

        Ok(ReadResult::found(
            RESOURCE_TYPE,
            to_properties(&ClusterProperties::from(response.body))?,
        ))
    }

    async fn list(&self, ctx: &OperationContext, request: &ListRequest) -> Result<ListResult> {
        let compartment_id = request.filter("CompartmentId").ok_or_else(|| {
            CoreError::InvalidRequest("CompartmentId is required for listing Clusters".to_string())
        })?;

        let mut query = vec![("compartmentId", compartment_id)];
        if let Some(page) = request.page_token.as_deref() {
            query.push(("page", page));
        }

        let response = self
            .clients
            .container_engine()
            .get::<Vec<ClusterSummary>>(ctx, &["clusters"], &query)
            .await
            .context("failed to list Clusters")?;

        // Deleted clusters linger in listings for a while.
        let native_ids = response
            .body
            .into_iter()
            .filter(|c| c.lifecycle_state.as_deref() != Some("DELETED"))
            .map(|c| c.id)
            .collect();

        Ok(ListResult {
            native_ids,
            next_page_token: response.opc_next_page,
        })
    }
}
