//! Bare metal server data source implementation

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
use tfplug::schema::{
    Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, Schema,
    SchemaBuilder,
};
use tfplug::types::{AttributePath, DynamicValue};

use crate::api::bare_metal_servers::BareMetalServer;
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_bare_metal_server";

/// Read-only attributes of a bare metal server, shared with `ibm_is_bare_metal_servers`
pub(crate) fn server_attributes() -> Vec<Attribute> {
    vec![
        flex::computed("id", AttributeType::String, "The unique identifier"),
        flex::computed("crn", AttributeType::String, "The CRN"),
        flex::computed("href", AttributeType::String, "The URL"),
        flex::computed("bandwidth", AttributeType::Number, "The total bandwidth in Mbps"),
        flex::computed("created_at", AttributeType::String, "The creation date and time"),
        flex::computed("enable_secure_boot", AttributeType::Bool, "Whether secure boot is enabled"),
        flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"),
        flex::computed("memory", AttributeType::Number, "The amount of memory in GiB"),
        flex::computed("resource_type", AttributeType::String, "The resource type"),
        flex::computed("status", AttributeType::String, "The status of the server"),
    ]
}

pub(crate) fn server_blocks() -> Vec<NestedBlock> {
    vec![
        NestedBlockBuilder::computed_list("cpu")
            .description("The server CPU configuration")
            .attribute(flex::computed("architecture", AttributeType::String, "The CPU architecture"))
            .attribute(flex::computed("core_count", AttributeType::Number, "The total number of cores"))
            .attribute(flex::computed("socket_count", AttributeType::Number, "The total number of sockets"))
            .attribute(flex::computed(
                "threads_per_core",
                AttributeType::Number,
                "The number of hardware threads per core",
            ))
            .build(),
        NestedBlockBuilder::computed_list("disks")
            .description("The disks of the server")
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("name", AttributeType::String, "The name"))
            .attribute(flex::computed("interface_type", AttributeType::String, "The disk interface"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .attribute(flex::computed("size", AttributeType::Number, "The size of the disk in GB"))
            .build(),
        NestedBlockBuilder::computed_list("primary_network_interface")
            .description("The primary network interface")
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("name", AttributeType::String, "The name"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .block(flex::reserved_ip_block("primary_ip", "The primary IP of the interface"))
            .block(flex::reference_block("subnet", "The subnet of the interface"))
            .build(),
        flex::reference_block("profile", "The server profile"),
        flex::resource_group_block(),
        flex::reference_block("vpc", "The VPC the server resides in"),
        flex::zone_block("zone"),
    ]
}

fn bare_metal_server_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Looks up a bare metal server by identifier or name")
            .attribute(
                AttributeBuilder::new("identifier", AttributeType::String)
                    .description("The unique identifier of the server")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the server")
                    .optional()
                    .computed()
                    .build(),
            );
        for attribute in server_attributes() {
            builder = builder.attribute(attribute);
        }
        for block in server_blocks() {
            builder = builder.block(block);
        }
        builder.build()
    })
}

#[derive(Default)]
pub struct BareMetalServerDataSource {
    provider_data: Option<IbmProviderData>,
}

impl BareMetalServerDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, ctx: &Context, config: &DynamicValue) -> Result<BareMetalServer, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;

        if let Some(id) = config.get_optional_string(&AttributePath::new("identifier")) {
            return flex::call(ctx, client.bare_metal_servers().get(&id))
                .await
                .map_err(|e| TfError::api(&name, Operation::Read, "GetBareMetalServer", &e));
        }
        let server_name = config
            .get_optional_string(&AttributePath::new("name"))
            .ok_or_else(|| TfError::new(&name, Operation::Read, "One of identifier or name is required"))?;
        flex::call(ctx, client.bare_metal_servers().find_by_name(&server_name))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListBareMetalServers", &e))
    }

    async fn read_server(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let server = self.lookup(ctx, config).await?;
        let name = flex::data_source_name(TYPE_NAME);
        let mut state = codec::flatten(&bare_metal_server_schema().block, &server)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "state", e))?;
        flex::copy_inputs(&mut state, config, &["identifier"], &name, Operation::Read)?;
        Ok(state)
    }
}

#[async_trait]
impl DataSource for BareMetalServerDataSource {
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
            schema: bare_metal_server_schema().clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: flex::exactly_one_of(&request.config, &["identifier", "name"]),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match self.read_server(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for BareMetalServerDataSource {
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
