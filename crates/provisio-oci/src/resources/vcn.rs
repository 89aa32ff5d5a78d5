//! `OCI::Core::VCN`
//!
//! Virtual cloud network writes complete synchronously, so every write
//! returns a terminal result and status checks have nothing to poll.

use super::{is_not_found, parse_properties, to_properties};
use crate::client::Clients;
use crate::properties::Properties;
use async_trait::async_trait;
use provisio_core::{
    CoreError, CreateRequest, DeleteRequest, ListRequest, ListResult, Operation, OperationContext,
    ProgressResult, ReadRequest, ReadResult, ResourceOperator, Result, ResultExt, StatusRequest,
    UpdateRequest, apply_patch_document,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const RESOURCE_TYPE: &str = "OCI::Core::VCN";

pub struct VcnOperator {
    clients: Arc<Clients>,
}

impl VcnOperator {
    pub fn new(clients: Arc<Clients>) -> Self {
        Self { clients }
    }
}

/// VCN as returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vcn {
    id: String,
    compartment_id: String,
    #[serde(default)]
    cidr_block: Option<String>,
    #[serde(default)]
    cidr_blocks: Option<Vec<String>>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    dns_label: Option<String>,
    #[serde(default)]
    default_dhcp_options_id: Option<String>,
    #[serde(default)]
    default_route_table_id: Option<String>,
    #[serde(default)]
    default_security_list_id: Option<String>,
    #[serde(default)]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

/// VCN in the orchestrator's property shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct VcnProperties {
    compartment_id: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidr_blocks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_dhcp_options_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_route_table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_security_list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

impl From<Vcn> for VcnProperties {
    fn from(vcn: Vcn) -> Self {
        Self {
            compartment_id: vcn.compartment_id,
            id: vcn.id,
            cidr_block: vcn.cidr_block,
            cidr_blocks: vcn.cidr_blocks,
            display_name: vcn.display_name,
            dns_label: vcn.dns_label,
            default_dhcp_options_id: vcn.default_dhcp_options_id,
            default_route_table_id: vcn.default_route_table_id,
            default_security_list_id: vcn.default_security_list_id,
            freeform_tags: vcn.freeform_tags,
            defined_tags: vcn.defined_tags,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateVcnDetails {
    compartment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidr_blocks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_ipv6_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateVcnDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    freeform_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defined_tags: Option<BTreeMap<String, Map<String, Value>>>,
}

#[derive(Debug, Deserialize)]
struct VcnSummary {
    id: String,
}

#[async_trait]
impl ResourceOperator for VcnOperator {
    async fn create(
        &self,
        ctx: &OperationContext,
        request: &CreateRequest,
    ) -> Result<ProgressResult> {
        let props = parse_properties(&request.properties)?;
        let p = Properties::new(&props);

        let details = CreateVcnDetails {
            compartment_id: p.require_string("CompartmentId")?,
            cidr_block: p.string("CidrBlock"),
            cidr_blocks: p.strings("CidrBlocks"),
            display_name: p.string("DisplayName"),
            dns_label: p.string("DnsLabel"),
            is_ipv6_enabled: p.bool("IsIpv6Enabled"),
            freeform_tags: p.tags("FreeformTags"),
            defined_tags: p.defined_tags("DefinedTags"),
        };

        let response = self
            .clients
            .virtual_network()
            .post::<_, Vcn>(ctx, &["vcns"], &details)
            .await
            .context("failed to create VCN")?;

        let vcn = response.body;
        tracing::info!(vcn_id = %vcn.id, label = %request.label, "created VCN");

        let native_id = vcn.id.clone();
        Ok(ProgressResult::success(Operation::Create, native_id)
            .with_properties(to_properties(&VcnProperties::from(vcn))?))
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

        let details = UpdateVcnDetails {
            display_name: p.string("DisplayName"),
            freeform_tags: p.tags("FreeformTags"),
            defined_tags: p.defined_tags("DefinedTags"),
        };

        let response = self
            .clients
            .virtual_network()
            .put::<_, Vcn>(ctx, &["vcns", request.native_id.as_str()], &details)
            .await
            .context("failed to update VCN")?;

        let vcn = response.body;
        tracing::info!(vcn_id = %vcn.id, "updated VCN");

        let native_id = vcn.id.clone();
        Ok(ProgressResult::success(Operation::Update, native_id)
            .with_properties(to_properties(&VcnProperties::from(vcn))?))
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        request: &DeleteRequest,
    ) -> Result<ProgressResult> {
        let existing = self
            .read(ctx, &request.read_request())
            .await
            .context("failed to read VCN before delete")?;
        if existing.is_not_found() {
            tracing::debug!(vcn_id = %request.native_id, "VCN already absent");
            return Ok(ProgressResult::success(
                Operation::Delete,
                &request.native_id,
            ));
        }

        self.clients
            .virtual_network()
            .delete(ctx, &["vcns", request.native_id.as_str()])
            .await
            .context("failed to delete VCN")?;

        tracing::info!(vcn_id = %request.native_id, "deleted VCN");
        Ok(ProgressResult::success(
            Operation::Delete,
            &request.native_id,
        ))
    }

    async fn status(
        &self,
        _ctx: &OperationContext,
        request: &StatusRequest,
    ) -> Result<ProgressResult> {
        Ok(ProgressResult::success(Operation::CheckStatus, &request.native_id)
            .with_request_id(&request.request_id))
    }

    async fn read(&self, ctx: &OperationContext, request: &ReadRequest) -> Result<ReadResult> {
        let response = match self
            .clients
            .virtual_network()
            .get::<Vcn>(ctx, &["vcns", request.native_id.as_str()], &[])
            .await
        {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Ok(ReadResult::not_found(RESOURCE_TYPE)),
            Err(e) => return Err(e.context("failed to read VCN")),
        };

        Ok(ReadResult::found(
            RESOURCE_TYPE,
            to_properties(&VcnProperties::from(response.body))?,
        ))
    }

    async fn list(&self, ctx: &OperationContext, request: &ListRequest) -> Result<ListResult> {
        let compartment_id = request.filter("CompartmentId").ok_or_else(|| {
            CoreError::InvalidRequest(
                "CompartmentId is required for listing VCNs".to_string(),
            )
        })?;

        let mut query = vec![("compartmentId", compartment_id)];
        if let Some(page) = request.page_token.as_deref() {
            query.push(("page", page));
        }

        let response = self
            .clients
            .virtual_network()
            .get::<Vec<VcnSummary>>(ctx, &["vcns"], &query)
            .await
            .context("failed to list VCNs")?;

        Ok(ListResult {
            native_ids: response.body.into_iter().map(|v| v.id).collect(),
            next_page_token: response.opc_next_page,
        })
    }
}
