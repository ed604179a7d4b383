//! Cluster network data source implementation

use async_trait::async_trait;
use std::sync::OnceLock;
use tfplug::codec;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, DynamicValue};

use crate::api::cluster_networks::ClusterNetwork;
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_cluster_network";

fn cluster_network_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Looks up a cluster network by identifier or name")
            .attribute(
                AttributeBuilder::new("cluster_network", AttributeType::String)
                    .description("The unique identifier of the cluster network")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the cluster network")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(flex::computed("crn", AttributeType::String, "The CRN"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("created_at", AttributeType::String, "The creation date and time"))
            .attribute(flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .block(
                NestedBlockBuilder::computed_list("lifecycle_reasons")
                    .description("The reasons for the current lifecycle state")
                    .attribute(flex::computed("code", AttributeType::String, "A reason code"))
                    .attribute(flex::computed("message", AttributeType::String, "An explanation of the reason"))
                    .attribute(flex::computed("more_info", AttributeType::String, "Link to documentation"))
                    .build(),
            )
            .block(
                NestedBlockBuilder::computed_list("subnet_prefixes")
                    .description("The IP address ranges available for subnets")
                    .attribute(flex::computed(
                        "allocation_policy",
                        AttributeType::String,
                        "The allocation policy for this prefix",
                    ))
                    .attribute(flex::computed("cidr", AttributeType::String, "The CIDR block"))
                    .build(),
            )
            .block(flex::reference_block("profile", "The cluster network profile"))
            .block(flex::resource_group_block())
            .block(flex::reference_block("vpc", "The VPC the cluster network belongs to"))
            .block(flex::zone_block("zone"))
            .build()
    })
}

#[derive(Default)]
pub struct ClusterNetworkDataSource {
    provider_data: Option<IbmProviderData>,
}

impl ClusterNetworkDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, ctx: &Context, config: &DynamicValue) -> Result<ClusterNetwork, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;

        if let Some(id) = config.get_optional_string(&AttributePath::new("cluster_network")) {
            return flex::call(ctx, client.cluster_networks().get(&id))
                .await
                .map_err(|e| TfError::api(&name, Operation::Read, "GetClusterNetwork", &e));
        }
        let network_name = config
            .get_optional_string(&AttributePath::new("name"))
            .ok_or_else(|| TfError::new(&name, Operation::Read, "One of cluster_network or name is required"))?;
        flex::call(ctx, client.cluster_networks().find_by_name(&network_name))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListClusterNetworks", &e))
    }

    async fn read_network(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let network = self.lookup(ctx, config).await?;
        let name = flex::data_source_name(TYPE_NAME);
        let mut state = codec::flatten(&cluster_network_schema().block, &network)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "state", e))?;
        flex::copy_inputs(&mut state, config, &["cluster_network"], &name, Operation::Read)?;
        Ok(state)
    }
}

#[async_trait]
impl DataSource for ClusterNetworkDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: cluster_network_schema().clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: flex::exactly_one_of(&request.config, &["cluster_network", "name"]),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match self.read_network(&ctx, &request.config).await {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(e) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![e.diagnostic()],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for ClusterNetworkDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match flex::provider_data(request.provider_data, &flex::data_source_name(TYPE_NAME)) {
            Ok(data) => {
                self.provider_data = data;
                ConfigureDataSourceResponse { diagnostics: vec![] }
            }
            Err(e) => ConfigureDataSourceResponse {
                diagnostics: vec![e.diagnostic()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cluster_networks::{ClusterNetworkLifecycleReason, ClusterNetworkSubnetPrefix};
    use tfplug::types::Dynamic;

    #[test]
    fn prefixes_and_reasons() {
        let network = ClusterNetwork {
            id: "0717-cn".to_string(),
            name: Some("gpu-fabric".to_string()),
            lifecycle_state: Some("stable".to_string()),
            lifecycle_reasons: vec![ClusterNetworkLifecycleReason {
                code: Some("resource_suspended_by_provider".to_string()),
                ..Default::default()
            }],
            subnet_prefixes: vec![ClusterNetworkSubnetPrefix {
                allocation_policy: Some("auto".to_string()),
                cidr: Some("10.1.0.0/16".to_string()),
            }],
            ..Default::default()
        };
        let state = codec::flatten(&cluster_network_schema().block, &network).unwrap();
        let prefixes = state.get_list(&AttributePath::new("subnet_prefixes")).unwrap();
        assert_eq!(prefixes[0].get("cidr").as_str(), Some("10.1.0.0/16"));
        let reasons = state.get_list(&AttributePath::new("lifecycle_reasons")).unwrap();
        assert_eq!(reasons[0].get("message"), &Dynamic::Null);
        assert_eq!(state.get(&AttributePath::new("vpc")), Some(&Dynamic::List(vec![])));
        assert_eq!(state.get(&AttributePath::new("cluster_network")), Some(&Dynamic::Null));
    }
}
