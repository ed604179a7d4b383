//! VPC data source implementation

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

use crate::api::vpcs::Vpc;
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_vpc";

pub(crate) fn vpc_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Looks up a VPC by identifier or name")
            .attribute(
                AttributeBuilder::new("identifier", AttributeType::String)
                    .description("The unique identifier of the VPC")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the VPC")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(flex::computed("crn", AttributeType::String, "The CRN"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed(
                "classic_access",
                AttributeType::Bool,
                "Whether the VPC is connected to classic infrastructure",
            ))
            .attribute(flex::computed("created_at", AttributeType::String, "The creation date and time"))
            .attribute(flex::computed("health_state", AttributeType::String, "The health of the VPC"))
            .attribute(flex::computed("status", AttributeType::String, "The status of the VPC"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .block(flex::reference_block("default_network_acl", "The default network ACL"))
            .block(flex::reference_block("default_routing_table", "The default routing table"))
            .block(flex::reference_block("default_security_group", "The default security group"))
            .block(flex::resource_group_block())
            .block(
                NestedBlockBuilder::computed_list("cse_source_ips")
                    .description("The cloud service endpoint source IPs, one per zone")
                    .block(flex::ip_block("ip", "The source IP address"))
                    .block(flex::zone_block("zone"))
                    .build(),
            )
            .build()
    })
}

#[derive(Default)]
pub struct VpcDataSource {
    provider_data: Option<IbmProviderData>,
}

impl VpcDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, ctx: &Context, config: &DynamicValue) -> Result<Vpc, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;

        if let Some(id) = config.get_optional_string(&AttributePath::new("identifier")) {
            return flex::call(ctx, client.vpcs().get(&id))
                .await
                .map_err(|e| TfError::api(&name, Operation::Read, "GetVPC", &e));
        }
        let vpc_name = config
            .get_optional_string(&AttributePath::new("name"))
            .ok_or_else(|| TfError::new(&name, Operation::Read, "One of identifier or name is required"))?;
        flex::call(ctx, client.vpcs().find_by_name(&vpc_name))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListVPCs", &e))
    }

    async fn read_vpc(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let vpc = self.lookup(ctx, config).await?;
        let name = flex::data_source_name(TYPE_NAME);
        let mut state = codec::flatten(&vpc_schema().block, &vpc)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "state", e))?;
        flex::copy_inputs(&mut state, config, &["identifier"], &name, Operation::Read)?;
        Ok(state)
    }
}

#[async_trait]
impl DataSource for VpcDataSource {
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
            schema: vpc_schema().clone(),
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
        tracing::debug!("Reading VPC data source");
        match self.read_vpc(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for VpcDataSource {
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
