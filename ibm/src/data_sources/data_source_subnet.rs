//! Subnet data source implementation

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
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, DynamicValue};

use crate::api::subnets::{ListSubnetsOptions, Subnet};
use crate::flex::{self, Operation, TfError};
use crate::resources::resource_subnet::SubnetState;
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_subnet";

/// Read-only subnet attributes shared with `ibm_is_subnets`
pub(crate) fn subnet_attributes() -> Vec<Attribute> {
    vec![
        flex::computed("id", AttributeType::String, "The unique identifier of the subnet"),
        flex::computed("vpc_name", AttributeType::String, "The name of the VPC"),
        flex::computed("zone", AttributeType::String, "The zone this subnet resides in"),
        flex::computed("ipv4_cidr_block", AttributeType::String, "The IPv4 range of the subnet"),
        flex::computed(
            "total_ipv4_address_count",
            AttributeType::Number,
            "The total number of IPv4 addresses in this subnet",
        ),
        flex::computed(
            "available_ipv4_address_count",
            AttributeType::Number,
            "The number of IPv4 addresses in this subnet that are not in use",
        ),
        flex::computed("ip_version", AttributeType::String, "The IP version(s) supported"),
        flex::computed("network_acl", AttributeType::String, "The network ACL for this subnet"),
        flex::computed("public_gateway", AttributeType::String, "The attached public gateway"),
        flex::computed("routing_table", AttributeType::String, "The routing table for this subnet"),
        flex::computed("resource_group", AttributeType::String, "The resource group"),
        flex::computed("crn", AttributeType::String, "The CRN for this subnet"),
        flex::computed("href", AttributeType::String, "The URL for this subnet"),
        flex::computed("status", AttributeType::String, "The status of the subnet"),
        flex::computed("resource_type", AttributeType::String, "The resource type"),
        flex::computed("created_at", AttributeType::String, "The creation date and time"),
    ]
}

fn subnet_data_source_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Looks up a subnet by identifier or name")
            .attribute(
                AttributeBuilder::new("identifier", AttributeType::String)
                    .description("The unique identifier of the subnet")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the subnet")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc", AttributeType::String)
                    .description("Restricts a lookup by name to one VPC")
                    .optional()
                    .computed()
                    .build(),
            );
        for attribute in subnet_attributes() {
            builder = builder.attribute(attribute);
        }
        builder.build()
    })
}

#[derive(Default)]
pub struct SubnetDataSource {
    provider_data: Option<IbmProviderData>,
}

impl SubnetDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, ctx: &Context, config: &DynamicValue) -> Result<Subnet, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;

        if let Some(id) = config.get_optional_string(&AttributePath::new("identifier")) {
            return flex::call(ctx, client.subnets().get(&id))
                .await
                .map_err(|e| TfError::api(&name, Operation::Read, "GetSubnet", &e));
        }
        let subnet_name = config
            .get_optional_string(&AttributePath::new("name"))
            .ok_or_else(|| TfError::new(&name, Operation::Read, "One of identifier or name is required"))?;
        let options = ListSubnetsOptions {
            vpc_id: config.get_optional_string(&AttributePath::new("vpc")),
            ..Default::default()
        };
        flex::call(ctx, client.subnets().find_by_name(&subnet_name, &options))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListSubnets", &e))
    }

    async fn read_subnet(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let subnet = self.lookup(ctx, config).await?;
        let name = flex::data_source_name(TYPE_NAME);
        let mut state = codec::flatten(&subnet_data_source_schema().block, &SubnetState::from(&subnet))
            .map_err(|e| TfError::set_field(&name, Operation::Read, "state", e))?;
        flex::copy_inputs(&mut state, config, &["identifier"], &name, Operation::Read)?;
        Ok(state)
    }
}

#[async_trait]
impl DataSource for SubnetDataSource {
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
            schema: subnet_data_source_schema().clone(),
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
        match self.read_subnet(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for SubnetDataSource {
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
    fn schema_declares_every_state_field() {
        let subnet = Subnet {
            id: "0717-subnet".to_string(),
            name: Some("web".to_string()),
            vpc: Some(ResourceReference {
                id: Some("vpc-1".to_string()),
                name: Some("main".to_string()),
                ..Default::default()
            }),
            total_ipv4_address_count: Some(256),
            ..Default::default()
        };
        let state = codec::flatten(&subnet_data_source_schema().block, &SubnetState::from(&subnet)).unwrap();
        let Dynamic::Map(map) = &state.value else {
            panic!("expected an object");
        };
        assert_eq!(map.len(), subnet_data_source_schema().block.attributes.len());
        assert_eq!(state.get_string(&AttributePath::new("vpc")).unwrap(), "vpc-1");
        assert_eq!(state.get_string(&AttributePath::new("vpc_name")).unwrap(), "main");
        assert_eq!(state.get(&AttributePath::new("identifier")), Some(&Dynamic::Null));
    }

    #[tokio::test]
    async fn validate_rejects_both_lookups() {
        let response = SubnetDataSource::new()
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: TYPE_NAME.to_string(),
                    config: DynamicValue::object([
                        ("identifier", Dynamic::from("0717-subnet")),
                        ("name", Dynamic::from("web")),
                    ]),
                },
            )
            .await;
        assert_eq!(response.diagnostics.len(), 1);
    }
}
