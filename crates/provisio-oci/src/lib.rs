//! Oracle Cloud Infrastructure operators for Provisio
//!
//! This crate implements [`ResourceOperator`](provisio_core::ResourceOperator)
//! for OCI resource types and exposes them through a [`Plugin`] that the
//! orchestrator drives.
//!
//! # Supported resources
//!
//! - `OCI::Core::VCN`: synchronous, writes return terminal results
//! - `OCI::ContainerEngine::Cluster`: writes return a work request handle
//!   that `status` polls
//!
//! # Configuration
//!
//! Each request carries a target config (`Region`, `Profile`,
//! `ConfigFilePath`, `Endpoint`). Missing values fall back to the
//! `OCI_CLI_*` environment variables and the `~/.oci/config` profile.
//!
//! # Example
//!
//! ```ignore
//! use provisio_core::{OperationContext, ReadRequest};
//! use provisio_oci::Plugin;
//!
//! let plugin = Plugin::new();
//! let ctx = OperationContext::with_timeout(std::time::Duration::from_secs(30));
//!
//! let result = plugin
//!     .read(&ctx, &ReadRequest {
//!         resource_type: "OCI::Core::VCN".into(),
//!         native_id: "ocid1.vcn.oc1..example".into(),
//!         target_config: serde_json::json!({"Region": "us-ashburn-1"}),
//!     })
//!     .await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod plugin;
pub mod properties;
pub mod resources;
pub mod service;
pub mod work_request;

pub use auth::{AnonymousSigner, BearerTokenSigner, RequestSigner};
pub use client::{Clients, ServiceFamily};
pub use config::{ConfigurationProvider, TargetConfig};
pub use error::{OciError, Result};
pub use plugin::{Plugin, RateLimitConfig, RateLimitScope};
pub use resources::{ClusterOperator, VcnOperator, default_registry, register_all};
pub use service::{ApiResponse, ServiceClient};
pub use work_request::ServiceWorkRequests;
