//! Typed provider configuration

use crate::api::{AuthMethod, RetryConfig};
use serde::Deserialize;
use tfplug::codec;
use tfplug::schema::Schema;
use tfplug::types::DynamicValue;

pub const DEFAULT_REGION: &str = "us-south";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("either ibmcloud_api_key or iam_token must be set (or IC_API_KEY / IC_IAM_TOKEN)")]
    MissingCredentials,

    #[error("only one of ibmcloud_api_key and iam_token can be set")]
    ConflictingCredentials,

    #[error("invalid provider configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    PublicAndPrivate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    pub ibmcloud_api_key: Option<String>,
    pub iam_token: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    pub ibmcloud_timeout: Option<u64>,
    pub max_retries: Option<u32>,
    pub endpoint: Option<String>,
    pub iam_endpoint: Option<String>,
}

impl ProviderConfig {
    /// Expands the provider block; env defaults are already applied
    pub fn from_config(schema: &Schema, config: &DynamicValue) -> Result<Self, ConfigError> {
        codec::expand(&schema.block, config).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let api_key = self.ibmcloud_api_key.as_deref().filter(|k| !k.is_empty());
        let token = self.iam_token.as_deref().filter(|t| !t.is_empty());
        match (api_key, token) {
            (None, None) => Err(ConfigError::MissingCredentials),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingCredentials),
            _ => Ok(()),
        }
    }

    pub fn region(&self) -> &str {
        self.region
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REGION)
    }

    /// Regional VPC endpoint unless overridden
    pub fn vpc_endpoint(&self) -> String {
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            return endpoint.to_string();
        }
        match self.visibility {
            Visibility::Public => format!("https://{}.iaas.cloud.ibm.com/v1", self.region()),
            Visibility::Private | Visibility::PublicAndPrivate => {
                format!("https://{}.private.iaas.cloud.ibm.com/v1", self.region())
            }
        }
    }

    pub fn auth_method(&self) -> Result<AuthMethod, ConfigError> {
        self.validate()?;
        match (&self.ibmcloud_api_key, &self.iam_token) {
            (Some(api_key), _) if !api_key.is_empty() => Ok(AuthMethod::ApiKey {
                api_key: api_key.clone(),
                iam_endpoint: self.iam_endpoint.clone().filter(|e| !e.is_empty()),
            }),
            (_, Some(token)) => Ok(AuthMethod::Token(token.clone())),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        let defaults = RetryConfig::default();
        RetryConfig {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            timeout_seconds: self.ibmcloud_timeout.unwrap_or(defaults.timeout_seconds),
            ..defaults
        }
    }
}
