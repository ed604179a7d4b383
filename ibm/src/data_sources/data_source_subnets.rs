//! Subnets data source implementation

use async_trait::async_trait;
use serde::Serialize;
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

use crate::api::subnets::ListSubnetsOptions;
use crate::flex::{self, Operation, TfError};
use crate::resources::resource_subnet::SubnetState;
use crate::IbmProviderData;

use super::data_source_subnet::subnet_attributes;

const TYPE_NAME: &str = "ibm_is_subnets";

#[derive(Debug, Serialize)]
struct SubnetsState {
    id: String,
    vpc: Option<String>,
    vpc_name: Option<String>,
    zone: Option<String>,
    resource_group: Option<String>,
    routing_table: Option<String>,
    subnets: Vec<SubnetState>,
}

fn subnets_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let mut subnets = NestedBlockBuilder::computed_list("subnets")
            .description("The subnets, in the order the API returned them")
            .attribute(flex::computed("name", AttributeType::String, "The name of the subnet"))
            .attribute(flex::computed("vpc", AttributeType::String, "The VPC the subnet resides in"));
        for attribute in subnet_attributes() {
            subnets = subnets.attribute(attribute);
        }

        SchemaBuilder::new()
            .version(0)
            .description("Lists the subnets of the region")
            .attribute(flex::computed("id", AttributeType::String, "The time of the read"))
            .attribute(
                AttributeBuilder::new("vpc", AttributeType::String)
                    .description("Only subnets of this VPC")
                    .optional()
                    .conflicts_with(&["vpc_name"])
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc_name", AttributeType::String)
                    .description("Only subnets of the VPC with this name")
                    .optional()
                    .conflicts_with(&["vpc"])
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("zone", AttributeType::String)
                    .description("Only subnets in this zone")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group", AttributeType::String)
                    .description("Only subnets in this resource group")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("routing_table", AttributeType::String)
                    .description("Only subnets attached to this routing table")
                    .optional()
                    .build(),
            )
            .block(subnets.build())
            .build()
    })
}

#[derive(Default)]
pub struct SubnetsDataSource {
    provider_data: Option<IbmProviderData>,
}

impl SubnetsDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_subnets(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;

        let vpc_name = config.get_optional_string(&AttributePath::new("vpc_name"));
        let vpc_id = match (config.get_optional_string(&AttributePath::new("vpc")), &vpc_name) {
            (Some(id), _) => Some(id),
            (None, Some(vpc_name)) => Some(
                flex::call(ctx, client.vpcs().resolve_id(vpc_name))
                    .await
                    .map_err(|e| TfError::api(&name, Operation::Read, "ListVPCs", &e))?,
            ),
            (None, None) => None,
        };

        let options = ListSubnetsOptions {
            vpc_id,
            zone_name: config.get_optional_string(&AttributePath::new("zone")),
            resource_group_id: config.get_optional_string(&AttributePath::new("resource_group")),
            routing_table_id: config.get_optional_string(&AttributePath::new("routing_table")),
        };
        let subnets = flex::call(ctx, client.subnets().list(&options))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListSubnets", &e))?;
        tracing::debug!("Listed {} subnets", subnets.len());

        let state = SubnetsState {
            id: chrono::Utc::now().to_rfc3339(),
            vpc: options.vpc_id.clone(),
            vpc_name,
            zone: options.zone_name.clone(),
            resource_group: options.resource_group_id.clone(),
            routing_table: options.routing_table_id.clone(),
            subnets: subnets.iter().map(SubnetState::from).collect(),
        };
        codec::flatten(&subnets_schema().block, &state)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "subnets", e))
    }
}

#[async_trait]
impl DataSource for SubnetsDataSource {
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
            schema: subnets_schema().clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match self.read_subnets(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for SubnetsDataSource {
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
