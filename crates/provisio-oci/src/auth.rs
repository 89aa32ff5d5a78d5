//! Request signing

use crate::config::ConfigurationProvider;
use crate::error::{OciError, Result};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use std::sync::Arc;

/// Adds authentication to an outgoing request
pub trait RequestSigner: Send + Sync + std::fmt::Debug {
    fn sign(&self, request: &mut reqwest::Request) -> Result<()>;
}

/// Session token authentication (`security_token_file` profiles)
#[derive(Debug, Clone)]
pub struct BearerTokenSigner {
    token: String,
}

impl BearerTokenSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl RequestSigner for BearerTokenSigner {
    fn sign(&self, request: &mut reqwest::Request) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| OciError::MissingCredentials("invalid session token".to_string()))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Leaves requests untouched; only used against an explicit endpoint override
#[derive(Debug, Clone, Default)]
pub struct AnonymousSigner;

impl RequestSigner for AnonymousSigner {
    fn sign(&self, _request: &mut reqwest::Request) -> Result<()> {
        Ok(())
    }
}

/// Pick the signer matching the credentials a profile provides
pub fn signer_for(provider: &ConfigurationProvider) -> Result<Arc<dyn RequestSigner>> {
    if let Some(token) = provider.security_token() {
        return Ok(Arc::new(BearerTokenSigner::new(token)));
    }
    if provider.endpoint().is_some() {
        tracing::debug!(profile = %provider.profile, "no credentials, sending unsigned requests to endpoint override");
        return Ok(Arc::new(AnonymousSigner));
    }
    Err(OciError::MissingCredentials(provider.profile.clone()))
}
