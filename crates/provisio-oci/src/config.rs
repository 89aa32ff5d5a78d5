//! Target configuration and profile resolution

use crate::error::{OciError, Result};
use ::config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Environment variable overriding the config file location
pub const CONFIG_FILE_ENV: &str = "OCI_CLI_CONFIG_FILE";

/// Environment variable selecting the profile when the target names none
pub const PROFILE_ENV: &str = "OCI_CLI_PROFILE";

/// Environment variable supplying the region when neither target nor profile do
pub const REGION_ENV: &str = "OCI_CLI_REGION";

/// Per-target settings supplied by the orchestrator
///
/// Parsed leniently: unknown fields are ignored and a payload that does not
/// match the shape yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TargetConfig {
    pub region: Option<String>,

    pub profile: Option<String>,

    pub config_file_path: Option<PathBuf>,

    /// Base URL used for every service family instead of the regional one
    pub endpoint: Option<String>,
}

impl TargetConfig {
    pub fn from_target_config(value: &serde_json::Value) -> Self {
        if value.is_null() {
            return Self::default();
        }

        let mut config: Self = serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "ignoring malformed target config");
            Self::default()
        });

        // Empty strings mean "not set".
        config.region = config.region.filter(|s| !s.is_empty());
        config.profile = config.profile.filter(|s| !s.is_empty());
        config.endpoint = config.endpoint.filter(|s| !s.is_empty());
        config.config_file_path = config
            .config_file_path
            .filter(|p| !p.as_os_str().is_empty());
        config
    }

    /// Resolve credentials and region for this target
    pub fn to_configuration_provider(&self) -> Result<ConfigurationProvider> {
        let explicit_path = self.config_file_path.clone().or_else(|| {
            std::env::var(CONFIG_FILE_ENV)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        });
        let explicit_profile = self.profile.clone().or_else(|| {
            std::env::var(PROFILE_ENV).ok().filter(|s| !s.is_empty())
        });
        let profile = explicit_profile
            .clone()
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let path = match explicit_path.clone() {
            Some(path) => path,
            None => default_config_path()?,
        };

        let entries = if path.exists() {
            let config_file = ConfigFile::load(&path)?;
            config_file.profile(&profile).ok_or_else(|| OciError::ProfileNotFound {
                profile: profile.clone(),
                path: path.clone(),
            })?
        } else if explicit_path.is_some() {
            return Err(OciError::ConfigFileNotFound(path));
        } else if explicit_profile.is_some() {
            return Err(OciError::ProfileNotFound { profile, path });
        } else {
            // Nothing configured anywhere: rely on the target and environment.
            tracing::debug!(path = %path.display(), "no OCI config file, using target settings only");
            HashMap::new()
        };

        let region = self
            .region
            .clone()
            .or_else(|| entries.get("region").cloned())
            .or_else(|| std::env::var(REGION_ENV).ok().filter(|s| !s.is_empty()))
            .ok_or_else(|| OciError::MissingRegion(profile.clone()))?;

        let security_token = match entries.get("security_token_file") {
            Some(file) => Some(
                std::fs::read_to_string(expand_home(file)?)?
                    .trim()
                    .to_string(),
            ),
            None => None,
        };

        Ok(ConfigurationProvider {
            profile,
            region,
            tenancy: entries.get("tenancy").cloned(),
            user: entries.get("user").cloned(),
            fingerprint: entries.get("fingerprint").cloned(),
            key_file: entries
                .get("key_file")
                .map(|f| expand_home(f))
                .transpose()?,
            security_token,
            endpoint: self.endpoint.clone(),
        })
    }
}

/// Resolved identity, region and endpoint for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationProvider {
    pub profile: String,
    pub region: String,
    pub tenancy: Option<String>,
    pub user: Option<String>,
    pub fingerprint: Option<String>,
    pub key_file: Option<PathBuf>,
    security_token: Option<String>,
    endpoint: Option<String>,
}

impl ConfigurationProvider {
    /// A provider for a fixed region, with no credentials
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            region: region.into(),
            tenancy: None,
            user: None,
            fingerprint: None,
            key_file: None,
            security_token: None,
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn security_token(&self) -> Option<&str> {
        self.security_token.as_deref()
    }
}

/// `~/.oci/config`
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(OciError::HomeDirNotFound)?;
    Ok(home.join(".oci").join("config"))
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => Ok(dirs::home_dir().ok_or(OciError::HomeDirNotFound)?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

/// INI-style OCI config file, keyed by section name
#[derive(Debug, Default)]
struct ConfigFile {
    sections: HashMap<String, HashMap<String, String>>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self> {
        let source = File::new(&path.to_string_lossy(), FileFormat::Ini);
        let sections: HashMap<String, HashMap<String, String>> = Config::builder()
            .add_source(source)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|source| OciError::MalformedConfig {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { sections })
    }

    /// Section names are matched without regard to case
    fn section(&self, name: &str) -> Option<&HashMap<String, String>> {
        self.sections.get(name).or_else(|| {
            self.sections
                .iter()
                .find(|(section, _)| section.eq_ignore_ascii_case(name))
                .map(|(_, entries)| entries)
        })
    }

    /// Entries of a profile, inheriting missing keys from DEFAULT
    fn profile(&self, name: &str) -> Option<HashMap<String, String>> {
        let own = self.section(name)?;
        let mut merged = self.section(DEFAULT_PROFILE).cloned().unwrap_or_default();
        merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(merged)
    }
}
