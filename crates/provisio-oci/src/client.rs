//! Lazily-built service clients for one target

use crate::auth::{RequestSigner, signer_for};
use crate::config::{ConfigurationProvider, TargetConfig};
use crate::error::{OciError, Result};
use crate::service::ServiceClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const USER_AGENT: &str = concat!("provisio-oci/", env!("CARGO_PKG_VERSION"));

/// OCI service families with their own API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceFamily {
    VirtualNetwork,
    ContainerEngine,
}

impl ServiceFamily {
    fn host_prefix(&self) -> &'static str {
        match self {
            ServiceFamily::VirtualNetwork => "iaas",
            ServiceFamily::ContainerEngine => "containerengine",
        }
    }

    /// API version path appended to the host
    fn base_path(&self) -> &'static str {
        match self {
            ServiceFamily::VirtualNetwork => "/20160918",
            ServiceFamily::ContainerEngine => "/20180222",
        }
    }

    /// Base URL in `region`, or under `endpoint` when overridden
    pub fn base_url(&self, region: &str, endpoint: Option<&str>) -> String {
        match endpoint {
            Some(endpoint) => format!("{}{}", endpoint.trim_end_matches('/'), self.base_path()),
            None => format!(
                "https://{}.{}.oraclecloud.com{}",
                self.host_prefix(),
                region,
                self.base_path()
            ),
        }
    }
}

impl std::fmt::Display for ServiceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceFamily::VirtualNetwork => write!(f, "VirtualNetwork"),
            ServiceFamily::ContainerEngine => write!(f, "ContainerEngine"),
        }
    }
}

/// Client bundle handed to resource operators
///
/// Each family's client is built on first use under a lock and shared
/// afterwards, so concurrent first calls never create duplicates.
#[derive(Debug)]
pub struct Clients {
    provider: ConfigurationProvider,
    http: reqwest::Client,
    signer: Arc<dyn RequestSigner>,
    clients: Mutex<HashMap<ServiceFamily, Arc<ServiceClient>>>,
}

impl Clients {
    pub fn new(provider: ConfigurationProvider) -> Result<Self> {
        let signer = signer_for(&provider)?;
        Self::with_signer(provider, signer)
    }

    pub fn with_signer(
        provider: ConfigurationProvider,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self> {
        if let Some(endpoint) = provider.endpoint() {
            reqwest::Url::parse(endpoint)
                .map_err(|_| OciError::InvalidEndpoint(endpoint.to_string()))?;
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(OciError::HttpClient)?;

        Ok(Self {
            provider,
            http,
            signer,
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve a target configuration into a client bundle
    pub fn from_target(target: &TargetConfig) -> Result<Self> {
        Self::new(target.to_configuration_provider()?)
    }

    /// The cached client for `family`, built on first use
    pub fn client(&self, family: ServiceFamily) -> Arc<ServiceClient> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        clients
            .entry(family)
            .or_insert_with(|| {
                let base_url = family.base_url(&self.provider.region, self.provider.endpoint());
                tracing::debug!(%family, %base_url, "creating service client");
                Arc::new(ServiceClient::new(
                    family,
                    base_url,
                    self.http.clone(),
                    self.signer.clone(),
                ))
            })
            .clone()
    }

    pub fn virtual_network(&self) -> Arc<ServiceClient> {
        self.client(ServiceFamily::VirtualNetwork)
    }

    pub fn container_engine(&self) -> Arc<ServiceClient> {
        self.client(ServiceFamily::ContainerEngine)
    }

    pub fn configuration_provider(&self) -> &ConfigurationProvider {
        &self.provider
    }
}
