//! OCI provider error types

use provisio_core::{ClassifiableError, CoreError, ServiceError};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration and credential failures
///
/// These never carry a provider service error, so they always surface as hard
/// errors rather than classified results.
#[derive(Error, Debug)]
pub enum OciError {
    #[error("OCI config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("profile [{profile}] not found in {path}")]
    ProfileNotFound { profile: String, path: PathBuf },

    #[error("no region configured (set Region in the target or region in profile [{0}])")]
    MissingRegion(String),

    #[error("malformed OCI config file {path}: {source}")]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: ::config::ConfigError,
    },

    #[error("home directory could not be determined")]
    HomeDirNotFound,

    #[error("no credentials available for profile [{0}]")]
    MissingCredentials(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OciError>;

impl ClassifiableError for OciError {
    fn service_error(&self) -> Option<&ServiceError> {
        None
    }
}

impl From<OciError> for CoreError {
    fn from(err: OciError) -> Self {
        CoreError::external(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provisio_core::{OperationErrorCode, classify};

    #[test]
    fn test_config_errors_never_classify() {
        let err: CoreError = OciError::MissingRegion("DEFAULT".into()).into();
        assert_eq!(classify(Some(&err)), (OperationErrorCode::NotSet, false));
        assert!(err.to_string().contains("no region configured"));
    }
}
