pub mod api;
pub mod config;
pub mod data_sources;
pub mod flex;
pub mod logging;
pub mod provider_data;
pub mod resources;

pub use provider_data::IbmProviderData;

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::defaults::EnvDefault;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory, StopProviderRequest, StopProviderResponse,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, ServerCapabilities};
use tfplug::validator::{NumberRangeValidator, OneOfValidator};

use config::{ConfigError, ProviderConfig};

pub struct IbmProvider {
    provider_data: Option<IbmProviderData>,
}

impl Default for IbmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IbmProvider {
    pub fn new() -> Self {
        logging::init();
        Self {
            provider_data: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider_data.is_some()
    }
}

pub fn provider_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("The IBM Cloud provider, VPC infrastructure services")
        .attribute(
            AttributeBuilder::new("ibmcloud_api_key", AttributeType::String)
                .description("The IBM Cloud API key used to obtain IAM tokens")
                .optional()
                .sensitive()
                .conflicts_with(&["iam_token"])
                .default(EnvDefault::string(&["IC_API_KEY", "IBMCLOUD_API_KEY"], None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("iam_token", AttributeType::String)
                .description("A pre-issued IAM access token")
                .optional()
                .sensitive()
                .default(EnvDefault::string(&["IC_IAM_TOKEN", "IBMCLOUD_IAM_TOKEN"], None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("region", AttributeType::String)
                .description("The IBM Cloud region")
                .optional()
                .default(EnvDefault::string(
                    &["IC_REGION", "IBMCLOUD_REGION", "BM_REGION", "BLUEMIX_REGION"],
                    Some(config::DEFAULT_REGION),
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("visibility", AttributeType::String)
                .description("Which endpoints to use: public, private or public-and-private")
                .optional()
                .validator(OneOfValidator::create(&["public", "private", "public-and-private"]))
                .default(EnvDefault::string(
                    &["IC_VISIBILITY", "IBMCLOUD_VISIBILITY"],
                    Some("public"),
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ibmcloud_timeout", AttributeType::Number)
                .description("Timeout in seconds for each API request")
                .optional()
                .validator(NumberRangeValidator::between(1.0, 3600.0))
                .default(EnvDefault::number(&["IC_TIMEOUT", "IBMCLOUD_TIMEOUT"], Some(60.0)))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("max_retries", AttributeType::Number)
                .description("Maximum number of retries for transient API failures")
                .optional()
                .validator(NumberRangeValidator::between(0.0, 100.0))
                .default(EnvDefault::number(&["MAX_RETRIES"], Some(10.0)))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("endpoint", AttributeType::String)
                .description("Override for the VPC API endpoint")
                .optional()
                .default(EnvDefault::string(&["IBMCLOUD_IS_NG_API_ENDPOINT"], None))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("iam_endpoint", AttributeType::String)
                .description("Override for the IAM token endpoint")
                .optional()
                .default(EnvDefault::string(&["IBMCLOUD_IAM_API_ENDPOINT"], None))
                .build(),
        )
        .build()
}

#[async_trait]
impl Provider for IbmProvider {
    fn type_name(&self) -> &str {
        "ibm"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            server_capabilities: ServerCapabilities::default(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        let mut diagnostics = vec![];
        // env fallbacks are applied later, only explicit values can be checked
        if let Some(endpoint) = request.config.get_optional_string(&AttributePath::new("endpoint")) {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid endpoint",
                        format!("endpoint {} must be an http(s) URL", endpoint),
                    )
                    .with_attribute(AttributePath::new("endpoint")),
                );
            }
        }
        ValidateProviderConfigResponse { diagnostics }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let config = match ProviderConfig::from_config(&provider_schema(), &request.config) {
            Ok(config) => config,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Invalid provider configuration", e.to_string()));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        let auth = match config.auth_method() {
            Ok(auth) => auth,
            Err(e) => {
                let summary = match e {
                    ConfigError::ConflictingCredentials => "Conflicting IBM Cloud credentials",
                    _ => "Missing IBM Cloud credentials",
                };
                diagnostics.push(Diagnostic::error(summary, e.to_string()));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        let endpoint = config.vpc_endpoint();
        tracing::debug!(
            "Configuring IBM Cloud provider for region {} at {}",
            config.region(),
            endpoint
        );

        match api::Client::with_config(&endpoint, auth, config.retry_config()) {
            Ok(client) => {
                let data = IbmProviderData::new(client, config.region());
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(data) as Arc<dyn Any + Send + Sync>),
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    format!("{} (discriminator: {})", e, flex::INITIALIZE_CLIENT),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            "ibm_is_subnet".to_string(),
            Box::new(|| {
                Box::new(resources::SubnetResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        resources.insert(
            "ibm_is_subnet_reserved_ip".to_string(),
            Box::new(|| {
                Box::new(resources::SubnetReservedIpResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        resources.insert(
            "ibm_is_virtual_network_interface".to_string(),
            Box::new(|| {
                Box::new(resources::VirtualNetworkInterfaceResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        resources.insert(
            "ibm_is_vpn_gateway".to_string(),
            Box::new(|| {
                Box::new(resources::VpnGatewayResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        resources.insert(
            "ibm_is_dedicated_host_group".to_string(),
            Box::new(|| {
                Box::new(resources::DedicatedHostGroupResource::new())
                    as Box<dyn ResourceWithConfigure>
            }),
        );
        resources.insert(
            "ibm_is_dedicated_host".to_string(),
            Box::new(|| {
                Box::new(resources::DedicatedHostResource::new()) as Box<dyn ResourceWithConfigure>
            }),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            "ibm_is_vpc".to_string(),
            Box::new(|| {
                Box::new(data_sources::VpcDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_subnet".to_string(),
            Box::new(|| {
                Box::new(data_sources::SubnetDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_subnets".to_string(),
            Box::new(|| {
                Box::new(data_sources::SubnetsDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_lb".to_string(),
            Box::new(|| {
                Box::new(data_sources::LoadBalancerDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_dedicated_host".to_string(),
            Box::new(|| {
                Box::new(data_sources::DedicatedHostDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_dedicated_hosts".to_string(),
            Box::new(|| {
                Box::new(data_sources::DedicatedHostsDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_bare_metal_server".to_string(),
            Box::new(|| {
                Box::new(data_sources::BareMetalServerDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_bare_metal_servers".to_string(),
            Box::new(|| {
                Box::new(data_sources::BareMetalServersDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_vpn_gateway".to_string(),
            Box::new(|| {
                Box::new(data_sources::VpnGatewayDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            "ibm_is_cluster_network".to_string(),
            Box::new(|| {
                Box::new(data_sources::ClusterNetworkDataSource::new())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources
    }
}
