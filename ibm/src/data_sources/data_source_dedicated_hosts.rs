//! Dedicated hosts data source implementation

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

use crate::api::dedicated_hosts::DedicatedHost;
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

use super::data_source_dedicated_host::{host_attributes, host_blocks};

const TYPE_NAME: &str = "ibm_is_dedicated_hosts";

#[derive(Debug, Serialize)]
struct DedicatedHostsState {
    id: String,
    host_group: Option<String>,
    total_count: usize,
    dedicated_hosts: Vec<DedicatedHost>,
}

fn dedicated_hosts_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let mut hosts = NestedBlockBuilder::computed_list("dedicated_hosts")
            .description("The dedicated hosts, in the order the API returned them")
            .attribute(flex::computed("name", AttributeType::String, "The name of the dedicated host"));
        for attribute in host_attributes() {
            hosts = hosts.attribute(attribute);
        }
        for block in host_blocks() {
            hosts = hosts.block(block);
        }

        SchemaBuilder::new()
            .version(0)
            .description("Lists dedicated hosts, optionally within one host group")
            .attribute(flex::computed("id", AttributeType::String, "The time of the read"))
            .attribute(
                AttributeBuilder::new("host_group", AttributeType::String)
                    .description("Only hosts of this dedicated host group")
                    .optional()
                    .build(),
            )
            .attribute(flex::computed("total_count", AttributeType::Number, "The number of hosts found"))
            .block(hosts.build())
            .build()
    })
}

#[derive(Default)]
pub struct DedicatedHostsDataSource {
    provider_data: Option<IbmProviderData>,
}

impl DedicatedHostsDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_hosts(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;
        let group = config.get_optional_string(&AttributePath::new("host_group"));

        let hosts = flex::call(ctx, client.dedicated_hosts().list(group.as_deref()))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListDedicatedHosts", &e))?;
        tracing::debug!("Listed {} dedicated hosts", hosts.len());

        let state = DedicatedHostsState {
            id: chrono::Utc::now().to_rfc3339(),
            host_group: group,
            total_count: hosts.len(),
            dedicated_hosts: hosts,
        };
        codec::flatten(&dedicated_hosts_schema().block, &state)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "dedicated_hosts", e))
    }
}

#[async_trait]
impl DataSource for DedicatedHostsDataSource {
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
            schema: dedicated_hosts_schema().clone(),
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
        match self.read_hosts(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for DedicatedHostsDataSource {
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
    use tfplug::types::Dynamic;

    #[test]
    fn hosts_and_count() {
        let state = DedicatedHostsState {
            id: "now".to_string(),
            host_group: Some("dhg-1".to_string()),
            total_count: 2,
            dedicated_hosts: vec![
                DedicatedHost {
                    id: "dh-1".to_string(),
                    name: Some("one".to_string()),
                    ..Default::default()
                },
                DedicatedHost {
                    id: "dh-2".to_string(),
                    ..Default::default()
                },
            ],
        };
        let value = codec::flatten(&dedicated_hosts_schema().block, &state).unwrap();
        assert_eq!(value.get_number(&AttributePath::new("total_count")).unwrap(), 2.0);
        let hosts = value.get_list(&AttributePath::new("dedicated_hosts")).unwrap();
        assert_eq!(hosts[0].get("name").as_str(), Some("one"));
        assert_eq!(hosts[1].get("name"), &Dynamic::Null);
        assert_eq!(hosts[1].get("disks"), &Dynamic::List(vec![]));
        assert_eq!(hosts[1].get("zone"), &Dynamic::List(vec![]));
    }
}
