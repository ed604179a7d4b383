//! Load balancer data source implementation

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

use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_lb";

fn lb_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Looks up a load balancer by name")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the load balancer")
                    .required()
                    .build(),
            )
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(flex::computed("crn", AttributeType::String, "The CRN"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("access_mode", AttributeType::String, "The access mode"))
            .attribute(flex::computed("availability", AttributeType::String, "The availability of the load balancer"))
            .attribute(flex::computed("created_at", AttributeType::String, "The creation date and time"))
            .attribute(flex::computed("hostname", AttributeType::String, "The fully qualified domain name"))
            .attribute(flex::computed(
                "instance_groups_supported",
                AttributeType::Bool,
                "Whether instance groups can be attached",
            ))
            .attribute(flex::computed("is_public", AttributeType::Bool, "Whether the load balancer is public"))
            .attribute(flex::computed(
                "is_private_path",
                AttributeType::Bool,
                "Whether the load balancer is a private path load balancer",
            ))
            .attribute(flex::computed("operating_status", AttributeType::String, "The operating status"))
            .attribute(flex::computed("provisioning_status", AttributeType::String, "The provisioning status"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .attribute(flex::computed("route_mode", AttributeType::Bool, "Whether route mode is enabled"))
            .attribute(flex::computed(
                "security_groups_supported",
                AttributeType::Bool,
                "Whether security groups can be attached",
            ))
            .attribute(flex::computed(
                "source_ip_session_persistence_supported",
                AttributeType::Bool,
                "Whether source IP session persistence is supported",
            ))
            .attribute(flex::computed("udp_supported", AttributeType::Bool, "Whether UDP is supported"))
            .block(
                NestedBlockBuilder::computed_list("dns")
                    .description("The DNS configuration")
                    .block(flex::reference_block("instance", "The DNS instance"))
                    .block(flex::reference_block("zone", "The DNS zone"))
                    .build(),
            )
            .block(
                NestedBlockBuilder::computed_list("profile")
                    .description("The profile of the load balancer")
                    .attribute(flex::computed("family", AttributeType::String, "The product family"))
                    .attribute(flex::computed("href", AttributeType::String, "The URL for this profile"))
                    .attribute(flex::computed("name", AttributeType::String, "The name for this profile"))
                    .build(),
            )
            .block(flex::reference_block("listeners", "The listeners of the load balancer"))
            .block(flex::reference_block("pools", "The pools of the load balancer"))
            .block(flex::reserved_ip_block("private_ips", "The private IP addresses"))
            .block(flex::ip_block("public_ips", "The public IP addresses"))
            .block(flex::reference_block("security_groups", "The attached security groups"))
            .block(flex::reference_block("subnets", "The subnets the load balancer serves"))
            .block(flex::resource_group_block())
            .build()
    })
}

#[derive(Default)]
pub struct LoadBalancerDataSource {
    provider_data: Option<IbmProviderData>,
}

impl LoadBalancerDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_lb(&self, ctx: &Context, config: &DynamicValue) -> Result<DynamicValue, TfError> {
        let name = flex::data_source_name(TYPE_NAME);
        let client = flex::client(&self.provider_data, &name, Operation::Read)?;
        let lb_name = config
            .get_string(&AttributePath::new("name"))
            .map_err(|e| TfError::new(&name, Operation::Read, format!("Invalid name: {}", e)))?;

        let lb = flex::call(ctx, client.load_balancers().find_by_name(&lb_name))
            .await
            .map_err(|e| TfError::api(&name, Operation::Read, "ListLoadBalancers", &e))?;
        codec::flatten(&lb_schema().block, &lb)
            .map_err(|e| TfError::set_field(&name, Operation::Read, "state", e))
    }
}

#[async_trait]
impl DataSource for LoadBalancerDataSource {
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
            schema: lb_schema().clone(),
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
        match self.read_lb(&ctx, &request.config).await {
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
impl DataSourceWithConfigure for LoadBalancerDataSource {
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
    use crate::api::common::{IpAddress, ReservedIpReference, ResourceReference};
    use crate::api::load_balancers::{LoadBalancer, LoadBalancerDns, LoadBalancerProfileReference};
    use tfplug::types::Dynamic;

    fn reference(id: &str) -> ResourceReference {
        ResourceReference {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn references_flatten_to_lists() {
        let lb = LoadBalancer {
            id: "r006-lb".to_string(),
            name: Some("front".to_string()),
            is_public: Some(true),
            dns: Some(LoadBalancerDns {
                instance: Some(reference("dns-1")),
                zone: Some(reference("zone-1")),
            }),
            profile: Some(LoadBalancerProfileReference {
                family: Some("application".to_string()),
                href: None,
                name: Some("dynamic".to_string()),
            }),
            listeners: vec![reference("l-1"), reference("l-2")],
            private_ips: vec![ReservedIpReference {
                address: Some("10.0.0.4".to_string()),
                ..Default::default()
            }],
            public_ips: vec![IpAddress {
                address: "169.1.1.1".to_string(),
            }],
            subnets: vec![reference("subnet-1")],
            ..Default::default()
        };

        let state = codec::flatten(&lb_schema().block, &lb).unwrap();
        let Dynamic::Map(map) = &state.value else {
            panic!("expected an object");
        };
        let block = &lb_schema().block;
        assert_eq!(map.len(), block.attributes.len() + block.block_types.len());

        let dns = state.get_list(&AttributePath::new("dns")).unwrap();
        assert_eq!(dns[0].get("instance").as_list().unwrap()[0].get("id").as_str(), Some("dns-1"));
        assert_eq!(state.get_list(&AttributePath::new("listeners")).unwrap().len(), 2);
        let public = state.get_list(&AttributePath::new("public_ips")).unwrap();
        assert_eq!(public[0].get("address").as_str(), Some("169.1.1.1"));
        let profile = state.get_list(&AttributePath::new("profile")).unwrap();
        assert_eq!(profile[0].get("family").as_str(), Some("application"));
        assert!(state.get_bool(&AttributePath::new("is_public")).unwrap());
    }

    #[test]
    fn missing_dns_and_pools_are_empty() {
        let lb = LoadBalancer {
            id: "r006-lb".to_string(),
            ..Default::default()
        };
        let state = codec::flatten(&lb_schema().block, &lb).unwrap();
        assert_eq!(state.get(&AttributePath::new("dns")), Some(&Dynamic::List(vec![])));
        assert_eq!(state.get(&AttributePath::new("pools")), Some(&Dynamic::List(vec![])));
        assert_eq!(state.get(&AttributePath::new("hostname")), Some(&Dynamic::Null));
    }
}
