//! Bare metal servers data source implementation

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

use crate::api::bare_metal_servers::{BareMetalServer, ListBareMetalServersOptions};
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

use super::data_source_bare_metal_server::{server_attributes, server_blocks};

const TYPE_NAME: &str = "ibm_is_bare_metal_servers";

#[derive(Debug, Serialize)]
struct BareMetalServersState {
    id: String,
    resource_group: Option<String>,
    vpc: Option<String>,
    vpc_name: Option<String>,
    servers: Vec<BareMetalServer>,
}

fn bare_metal_servers_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let mut servers = NestedBlockBuilder::computed_list("servers")
            .description("The bare metal servers, in the order the API returned them")
            .attribute(flex::computed("name", AttributeType::String, "The name of the server"));
        for attribute in server_attributes() {
            servers = servers.attribute(attribute);
        }
        for block in server_blocks() {
            servers = servers.block(block);
        }

        SchemaBuilder::new()
            .version(0)
            .description("Lists the bare metal servers of the region")
            .attribute(flex::computed("id", AttributeType::String, "The time of the read"))
            .attribute(
                AttributeBuilder::new("resource_group", AttributeType::String)
                    .description("Only servers in this resource group")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc", AttributeType::String)
                    .description("Only servers in the VPC with this identifier")
                    .optional()
                    .conflicts_with(&["vpc_name"])
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc_name", AttributeType::String)
                    .description("Only servers in the VPC with this name")
                    .optional()
                    .conflicts_with(&["vpc"])
                    .build(),
            )
            .block(servers.build())
            .build()
    })
}

#[derive(Default)]
pub struct BareMetalServersDataSource {
    provider_data: Option<IbmProviderData>,
}

impl BareMetalServersDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_servers(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;

        let options = ListBareMetalServersOptions {
            resource_group_id: config.get_optional_string(&AttributePath::new("resource_group")),
            vpc_id: config.get_optional_string(&AttributePath::new("vpc")),
            vpc_name: config.get_optional_string(&AttributePath::new("vpc_name")),
        };
        let servers = flex::call(ctx, client.bare_metal_servers().list(&options))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListBareMetalServers", &e))?;
        tracing::debug!("Listed {} bare metal servers", servers.len());

        let state = BareMetalServersState {
            id: chrono::Utc::now().to_rfc3339(),
            resource_group: options.resource_group_id,
            vpc: options.vpc_id,
            vpc_name: options.vpc_name,
            servers,
        };
        codec::flatten(&bare_metal_servers_schema().block, &state)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "servers", e))
    }
}

#[async_trait]
impl DataSource for BareMetalServersDataSource {
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
            schema: bare_metal_servers_schema().clone(),
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
        match self.read_servers(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for BareMetalServersDataSource {
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
