//! Dedicated host data source implementation

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

use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_dedicated_host";

fn vcpu_block(name: &str, description: &str) -> NestedBlock {
    NestedBlockBuilder::computed_list(name)
        .description(description)
        .attribute(flex::computed("architecture", AttributeType::String, "The VCPU architecture"))
        .attribute(flex::computed("count", AttributeType::Number, "The number of VCPUs"))
        .attribute(flex::computed("manufacturer", AttributeType::String, "The VCPU manufacturer"))
        .build()
}

/// Read-only attributes of a dedicated host, shared with `ibm_is_dedicated_hosts`
pub(crate) fn host_attributes() -> Vec<Attribute> {
    vec![
        flex::computed("id", AttributeType::String, "The unique identifier of the dedicated host"),
        flex::computed("crn", AttributeType::String, "The CRN"),
        flex::computed("href", AttributeType::String, "The URL"),
        flex::computed("available_memory", AttributeType::Number, "The amount of memory in GiB available"),
        flex::computed("created_at", AttributeType::String, "The creation date and time"),
        flex::computed(
            "instance_placement_enabled",
            AttributeType::Bool,
            "Whether instances can be placed on this host",
        ),
        flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"),
        flex::computed("memory", AttributeType::Number, "The total amount of memory in GiB"),
        flex::computed("provisionable", AttributeType::Bool, "Whether the host can have instances provisioned"),
        flex::computed("resource_type", AttributeType::String, "The resource type"),
        flex::computed("socket_count", AttributeType::Number, "The total number of sockets"),
        flex::computed("state", AttributeType::String, "The administrative state"),
    ]
}

pub(crate) fn host_blocks() -> Vec<NestedBlock> {
    vec![
        vcpu_block("available_vcpu", "The available VCPU for the dedicated host"),
        vcpu_block("vcpu", "The total VCPU of the dedicated host"),
        NestedBlockBuilder::computed_list("disks")
            .description("The local disks of the dedicated host")
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("name", AttributeType::String, "The name"))
            .attribute(flex::computed("available", AttributeType::Number, "The remaining space in GB"))
            .attribute(flex::computed("interface_type", AttributeType::String, "The disk interface"))
            .attribute(flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"))
            .attribute(flex::computed("provisionable", AttributeType::Bool, "Whether the disk is provisionable"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .attribute(flex::computed("size", AttributeType::Number, "The size of the disk in GB"))
            .attribute(flex::computed(
                "supported_instance_interface_types",
                AttributeType::List(Box::new(AttributeType::String)),
                "The instance disk interfaces supported",
            ))
            .build(),
        flex::reference_block("group", "The dedicated host group the host is in"),
        flex::reference_block("instances", "The instances placed on the host"),
        flex::reference_block("profile", "The profile of the dedicated host"),
        flex::reference_block("supported_instance_profiles", "The instance profiles usable on the host"),
        flex::resource_group_block(),
        flex::zone_block("zone"),
    ]
}

fn dedicated_host_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Looks up a dedicated host by name within a host group")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the dedicated host")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("host_group", AttributeType::String)
                    .description("The dedicated host group to search")
                    .required()
                    .build(),
            );
        for attribute in host_attributes() {
            builder = builder.attribute(attribute);
        }
        for block in host_blocks() {
            builder = builder.block(block);
        }
        builder.build()
    })
}

#[derive(Default)]
pub struct DedicatedHostDataSource {
    provider_data: Option<IbmProviderData>,
}

impl DedicatedHostDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_host(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;
        let host_name = config
            .get_string(&AttributePath::new("name"))
            .map_err(|e| TfError::new(&name, Operation::Read, format!("Invalid name: {}", e)))?;
        let group = config
            .get_string(&AttributePath::new("host_group"))
            .map_err(|e| TfError::new(&name, Operation::Read, format!("Invalid host_group: {}", e)))?;

        let host = flex::call(ctx, client.dedicated_hosts().find_by_name(&host_name, Some(&group)))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListDedicatedHosts", &e))?;
        let mut state = codec::flatten(&dedicated_host_schema().block, &host)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "state", e))?;
        flex::set_string(&mut state, "host_group", group, &name, Operation::Read)?;
        Ok(state)
    }
}

#[async_trait]
impl DataSource for DedicatedHostDataSource {
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
            schema: dedicated_host_schema().clone(),
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
        match self.read_host(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for DedicatedHostDataSource {
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
    use crate::api::common::{ResourceReference, ZoneReference};
    use crate::api::dedicated_hosts::{DedicatedHost, DedicatedHostDisk, Vcpu};
    use tfplug::types::Dynamic;

    #[test]
    fn host_flattens_vcpu_and_disks() {
        let host = DedicatedHost {
            id: "0717-dh".to_string(),
            name: Some("host-1".to_string()),
            available_memory: Some(128),
            available_vcpu: Some(Vcpu {
                architecture: Some("amd64".to_string()),
                count: Some(80),
                manufacturer: Some("intel".to_string()),
            }),
            disks: vec![DedicatedHostDisk {
                id: Some("disk-1".to_string()),
                size: Some(800),
                supported_instance_interface_types: vec!["virtio_blk".to_string()],
                ..Default::default()
            }],
            group: Some(ResourceReference {
                id: Some("dhg-1".to_string()),
                ..Default::default()
            }),
            zone: Some(ZoneReference {
                name: "us-south-1".to_string(),
                href: None,
            }),
            ..Default::default()
        };

        let state = codec::flatten(&dedicated_host_schema().block, &host).unwrap();
        let Dynamic::Map(map) = &state.value else {
            panic!("expected an object");
        };
        let block = &dedicated_host_schema().block;
        assert_eq!(map.len(), block.attributes.len() + block.block_types.len());

        let vcpu = state.get_list(&AttributePath::new("available_vcpu")).unwrap();
        assert_eq!(vcpu[0].get("count").as_number(), Some(80.0));
        let disks = state.get_list(&AttributePath::new("disks")).unwrap();
        assert_eq!(
            disks[0].get("supported_instance_interface_types"),
            &Dynamic::List(vec![Dynamic::from("virtio_blk")])
        );
        let zone = state.get_list(&AttributePath::new("zone")).unwrap();
        assert_eq!(zone[0].get("name").as_str(), Some("us-south-1"));
        assert_eq!(state.get(&AttributePath::new("vcpu")), Some(&Dynamic::List(vec![])));
    }

    #[tokio::test]
    async fn read_requires_configuration() {
        let response = DedicatedHostDataSource::new()
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: TYPE_NAME.to_string(),
                    config: DynamicValue::null(),
                },
            )
            .await;
        assert!(response.state.is_null());
        assert!(response.diagnostics[0].detail.contains("initialize-client"));
    }
}
