//! VPN gateway data source implementation

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
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, DynamicValue};

use crate::api::vpn_gateways::VpnGateway;
use crate::flex::{self, Operation, TfError};
use crate::resources::resource_vpn_gateway::{members_block, VpnGatewayState};
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_vpn_gateway";

fn vpn_gateway_data_source_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Looks up a VPN gateway by identifier or name")
            .attribute(
                AttributeBuilder::new("vpn_gateway", AttributeType::String)
                    .description("The unique identifier of the VPN gateway")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpn_gateway_name", AttributeType::String)
                    .description("The name of the VPN gateway")
                    .optional()
                    .build(),
            )
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(flex::computed("name", AttributeType::String, "The name of the VPN gateway"))
            .attribute(flex::computed("subnet", AttributeType::String, "The subnet of the gateway"))
            .attribute(flex::computed("mode", AttributeType::String, "Route mode or policy mode"))
            .attribute(flex::computed("local_asn", AttributeType::Number, "The local autonomous system number"))
            .attribute(flex::computed("resource_group", AttributeType::String, "The resource group"))
            .attribute(flex::computed("crn", AttributeType::String, "The CRN"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("status", AttributeType::String, "The status of the gateway"))
            .attribute(flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"))
            .attribute(flex::computed("health_state", AttributeType::String, "The health of the gateway"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .attribute(flex::computed("created_at", AttributeType::String, "The creation date and time"))
            .block(members_block())
            .block(flex::reference_block("vpc", "The VPC this gateway serves"))
            .block(flex::reference_block("connections", "The connections of the gateway"))
            .build()
    })
}

#[derive(serde::Serialize)]
struct VpnGatewayDataSourceState {
    #[serde(flatten)]
    gateway: VpnGatewayState,
    connections: Vec<crate::api::common::ResourceReference>,
}

#[derive(Default)]
pub struct VpnGatewayDataSource {
    provider_data: Option<IbmProviderData>,
}

impl VpnGatewayDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, ctx: &Context, config: &DynamicValue) -> Result<VpnGateway, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;

        if let Some(id) = config.get_optional_string(&AttributePath::new("vpn_gateway")) {
            return flex::call(ctx, client.vpn_gateways().get(&id))
                .await
                .map_err(|e| TfError::api(&name, Operation::Read, "GetVPNGateway", &e));
        }
        let gateway_name = config
            .get_optional_string(&AttributePath::new("vpn_gateway_name"))
            .ok_or_else(|| {
                TfError::new(&name, Operation::Read, "One of vpn_gateway or vpn_gateway_name is required")
            })?;
        flex::call(ctx, client.vpn_gateways().find_by_name(&gateway_name))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListVPNGateways", &e))
    }

    async fn read_gateway(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let gateway = self.lookup(ctx, config).await?;
        let name = flex::data_source_name(TYPE_NAME);
        let model = VpnGatewayDataSourceState {
            gateway: VpnGatewayState::from(&gateway),
            connections: gateway.connections.clone(),
        };
        let mut state = codec::flatten(&vpn_gateway_data_source_schema().block, &model)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "state", e))?;
        flex::copy_inputs(
            &mut state,
            config,
            &["vpn_gateway", "vpn_gateway_name"],
            &name,
            Operation::Read,
        )?;
        Ok(state)
    }
}

#[async_trait]
impl DataSource for VpnGatewayDataSource {
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
            schema: vpn_gateway_data_source_schema().clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: flex::exactly_one_of(&request.config, &["vpn_gateway", "vpn_gateway_name"]),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match self.read_gateway(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for VpnGatewayDataSource {
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
    use crate::api::common::ResourceReference;
    use tfplug::types::Dynamic;

    #[test]
    fn connections_and_inputs_share_one_state() {
        let gateway = VpnGateway {
            id: "0717-vpn".to_string(),
            name: Some("edge".to_string()),
            connections: vec![ResourceReference {
                id: Some("conn-1".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let model = VpnGatewayDataSourceState {
            gateway: VpnGatewayState::from(&gateway),
            connections: gateway.connections.clone(),
        };
        let state = codec::flatten(&vpn_gateway_data_source_schema().block, &model).unwrap();
        let Dynamic::Map(map) = &state.value else {
            panic!("expected an object");
        };
        let block = &vpn_gateway_data_source_schema().block;
        assert_eq!(map.len(), block.attributes.len() + block.block_types.len());

        let connections = state.get_list(&AttributePath::new("connections")).unwrap();
        assert_eq!(connections[0].get("id").as_str(), Some("conn-1"));
        assert_eq!(state.get(&AttributePath::new("vpn_gateway")), Some(&Dynamic::Null));
        assert_eq!(state.get(&AttributePath::new("members")), Some(&Dynamic::List(vec![])));
    }

    #[tokio::test]
    async fn validate_needs_id_or_name() {
        let response = VpnGatewayDataSource::new()
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: TYPE_NAME.to_string(),
                    config: DynamicValue::null(),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
    }
}
