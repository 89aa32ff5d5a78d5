//! OCI REST API client
//!
//! Thin JSON client for one service family. Every call runs through the
//! caller's [`OperationContext`], non-2xx answers are decoded into
//! [`ServiceError`]s so the classifier can map them, and the `opc-*` response
//! headers are handed back alongside the body.

use crate::auth::RequestSigner;
use crate::client::ServiceFamily;
use provisio_core::{CoreError, OperationContext, Result, ResultExt, ServiceError};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const OPC_REQUEST_ID: &str = "opc-request-id";
pub const OPC_WORK_REQUEST_ID: &str = "opc-work-request-id";
pub const OPC_NEXT_PAGE: &str = "opc-next-page";

/// Decoded response plus the headers operators care about
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub body: T,
    pub status: u16,
    pub opc_request_id: Option<String>,
    pub opc_work_request_id: Option<String>,
    pub opc_next_page: Option<String>,
    pub etag: Option<String>,
}

impl<T> ApiResponse<T> {
    /// The work request handle of an asynchronous write
    pub fn work_request_id(&self) -> Result<&str> {
        self.opc_work_request_id.as_deref().ok_or_else(|| {
            CoreError::InvalidRequest(format!(
                "response (status {}) carries no {} header",
                self.status, OPC_WORK_REQUEST_ID
            ))
        })
    }
}

/// Client for one OCI service family
#[derive(Debug)]
pub struct ServiceClient {
    family: ServiceFamily,
    base_url: String,
    http: reqwest::Client,
    signer: Arc<dyn RequestSigner>,
}

impl ServiceClient {
    pub fn new(
        family: ServiceFamily,
        base_url: impl Into<String>,
        http: reqwest::Client,
        signer: Arc<dyn RequestSigner>,
    ) -> Self {
        Self {
            family,
            base_url: base_url.into(),
            http,
            signer,
        }
    }

    pub fn family(&self) -> ServiceFamily {
        self.family
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let invalid =
            |reason: String| CoreError::InvalidRequest(format!("{}: {}", self.base_url, reason));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &OperationContext,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<T>> {
        let mut url = self.url(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        let builder = self.http.get(url);
        self.execute(ctx, builder).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &OperationContext,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let builder = self.http.post(self.url(segments)?).json(body);
        self.execute(ctx, builder).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &OperationContext,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let builder = self.http.put(self.url(segments)?).json(body);
        self.execute(ctx, builder).await
    }

    /// Any response body is discarded
    pub async fn delete(
        &self,
        ctx: &OperationContext,
        segments: &[&str],
    ) -> Result<ApiResponse<IgnoredAny>> {
        let builder = self.http.delete(self.url(segments)?);
        self.execute(ctx, builder).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &OperationContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        let mut request = builder
            .build()
            .map_err(|e| CoreError::InvalidRequest(e.to_string()))?;
        self.signer.sign(&mut request)?;

        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(family = %self.family, %method, %url, "sending request");

        ctx.run(async {
            let response = self
                .http
                .execute(request)
                .await
                .map_err(|e| CoreError::Transport(e.to_string()))?;

            let status = response.status();
            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from)
            };
            let opc_request_id = header(OPC_REQUEST_ID);
            let opc_work_request_id = header(OPC_WORK_REQUEST_ID);
            let opc_next_page = header(OPC_NEXT_PAGE);
            let etag = header(reqwest::header::ETAG.as_str());

            let bytes = response
                .bytes()
                .await
                .map_err(|e| CoreError::Transport(e.to_string()))?;

            if !status.is_success() {
                let err = decode_service_error(status, &bytes, opc_request_id);
                tracing::debug!(family = %self.family, %method, %url, error = %err, "request rejected");
                return Err(err.into());
            }

            let body = if bytes.is_empty() {
                serde_json::from_slice(b"null")
            } else {
                serde_json::from_slice(&bytes)
            }
            .map_err(CoreError::from)
            .with_context(|| format!("failed to decode {} {} response", method, url))?;

            Ok(ApiResponse {
                body,
                status: status.as_u16(),
                opc_request_id,
                opc_work_request_id,
                opc_next_page,
                etag,
            })
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn decode_service_error(
    status: reqwest::StatusCode,
    body: &[u8],
    opc_request_id: Option<String>,
) -> ServiceError {
    let (code, message) = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => (parsed.code, parsed.message),
        Err(_) => (
            String::new(),
            String::from_utf8_lossy(body).trim().to_string(),
        ),
    };

    let code = if code.is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        code
    };

    ServiceError {
        status: status.as_u16(),
        code,
        message,
        opc_request_id,
    }
}
