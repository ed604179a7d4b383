//! VPN gateway resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tfplug::codec;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import::import_state_passthrough_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, DynamicValue};
use tfplug::validator::{NumberRangeValidator, OneOfValidator, StringPatternValidator};

use crate::api::common::{IdentityById, ResourceReference};
use crate::api::vpn_gateways::{VpnGateway, VpnGatewayMember, VpnGatewayPatch, VpnGatewayPrototype};
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

use super::resource_subnet::NAME_PATTERN;

const TYPE_NAME: &str = "ibm_is_vpn_gateway";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VpnGatewayArgs {
    pub name: String,
    pub subnet: String,
    pub mode: Option<String>,
    pub local_asn: Option<i64>,
    pub resource_group: Option<String>,
}

impl VpnGatewayArgs {
    pub fn prototype(&self) -> VpnGatewayPrototype {
        VpnGatewayPrototype {
            name: self.name.clone(),
            subnet: IdentityById::new(&self.subnet),
            mode: self.mode.clone(),
            local_asn: self.local_asn,
            resource_group: self.resource_group.as_deref().map(IdentityById::new),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VpnGatewayMemberState {
    pub address: Option<String>,
    pub private_address: Option<String>,
    pub role: Option<String>,
    pub health_state: Option<String>,
    pub lifecycle_state: Option<String>,
}

impl From<&VpnGatewayMember> for VpnGatewayMemberState {
    fn from(member: &VpnGatewayMember) -> Self {
        Self {
            address: member.public_ip.as_ref().map(|ip| ip.address.clone()),
            private_address: member.private_ip.as_ref().and_then(|ip| ip.address.clone()),
            role: member.role.clone(),
            health_state: member.health_state.clone(),
            lifecycle_state: member.lifecycle_state.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VpnGatewayState {
    pub id: String,
    pub name: Option<String>,
    pub subnet: Option<String>,
    pub mode: Option<String>,
    pub local_asn: Option<i64>,
    pub resource_group: Option<String>,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub status: Option<String>,
    pub lifecycle_state: Option<String>,
    pub health_state: Option<String>,
    pub resource_type: Option<String>,
    pub created_at: Option<String>,
    pub members: Vec<VpnGatewayMemberState>,
    pub vpc: Option<ResourceReference>,
}

impl From<&VpnGateway> for VpnGatewayState {
    fn from(gateway: &VpnGateway) -> Self {
        Self {
            id: gateway.id.clone(),
            name: gateway.name.clone(),
            subnet: flex::reference_id(&gateway.subnet),
            mode: gateway.mode.clone(),
            local_asn: gateway.local_asn,
            resource_group: gateway.resource_group.as_ref().map(|rg| rg.id.clone()),
            crn: gateway.crn.clone(),
            href: gateway.href.clone(),
            status: gateway.status.clone(),
            lifecycle_state: gateway.lifecycle_state.clone(),
            health_state: gateway.health_state.clone(),
            resource_type: gateway.resource_type.clone(),
            created_at: gateway.created_at.clone(),
            members: gateway.members.iter().map(VpnGatewayMemberState::from).collect(),
            vpc: gateway.vpc.clone(),
        }
    }
}

pub(crate) fn members_block() -> NestedBlock {
    NestedBlockBuilder::computed_list("members")
        .description("Collection of VPN gateway members")
        .attribute(flex::computed("address", AttributeType::String, "The public IP address of the member"))
        .attribute(flex::computed(
            "private_address",
            AttributeType::String,
            "The private IP address of the member",
        ))
        .attribute(flex::computed("role", AttributeType::String, "The high availability role"))
        .attribute(flex::computed("health_state", AttributeType::String, "The health of the member"))
        .attribute(flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"))
        .build()
}

fn vpn_gateway_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a VPN gateway")
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name for this VPN gateway")
                    .required()
                    .validator(StringPatternValidator::create(
                        NAME_PATTERN,
                        "lowercase letters, digits and hyphens, starting with a letter",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("subnet", AttributeType::String)
                    .description("The subnet the gateway is attached to")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("mode", AttributeType::String)
                    .description("Route mode or policy mode VPN gateway")
                    .optional()
                    .force_new()
                    .validator(OneOfValidator::create(&["route", "policy"]))
                    .default(StaticDefault::string("route"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("local_asn", AttributeType::Number)
                    .description("The local autonomous system number")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator::between(1.0, 4_294_967_295.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group", AttributeType::String)
                    .description("The resource group for this gateway")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(flex::computed("crn", AttributeType::String, "The CRN"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("status", AttributeType::String, "The status of the gateway"))
            .attribute(flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"))
            .attribute(flex::computed("health_state", AttributeType::String, "The health of the gateway"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .attribute(flex::computed("created_at", AttributeType::String, "The creation date and time"))
            .block(members_block())
            .block(flex::reference_block("vpc", "The VPC this gateway serves"))
            .build()
    })
}

#[derive(Default)]
pub struct VpnGatewayResource {
    provider_data: Option<IbmProviderData>,
}

impl VpnGatewayResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(gateway: &VpnGateway, operation: Operation) -> Result<DynamicValue, TfError> {
        codec::flatten(&vpn_gateway_schema().block, &VpnGatewayState::from(gateway))
            .map_err(|e| TfError::set_field(TYPE_NAME, operation, "state", e))
    }

    fn id_of(state: &DynamicValue, operation: Operation) -> Result<String, TfError> {
        state.get_string(&AttributePath::new("id")).map_err(|e| {
            TfError::new(TYPE_NAME, operation, format!("Missing VPN gateway id in state: {}", e))
        })
    }

    async fn create_gateway(&self, ctx: &Context, planned: &DynamicValue) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Create)?;
        let args: VpnGatewayArgs = codec::expand(&vpn_gateway_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Create, e.to_string()))?;

        let gateway = flex::call(ctx, client.vpn_gateways().create(&args.prototype()))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Create, "CreateVPNGateway", &e))?;
        tracing::info!("Created VPN gateway {}", gateway.id);

        Self::state_of(&gateway, Operation::Create)
    }

    async fn update_gateway(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Update)?;
        let id = Self::id_of(prior, Operation::Update)?;
        let args: VpnGatewayArgs = codec::expand(&vpn_gateway_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Update, e.to_string()))?;

        let mut patch = VpnGatewayPatch::default();
        if prior.get_optional_string(&AttributePath::new("name")).as_deref() != Some(args.name.as_str()) {
            patch.name = Some(args.name.clone());
        }
        let prior_asn = prior
            .get_number(&AttributePath::new("local_asn"))
            .ok()
            .map(|n| n as i64);
        if args.local_asn.is_some() && args.local_asn != prior_asn {
            patch.local_asn = args.local_asn;
        }

        let gateway = if patch.name.is_some() || patch.local_asn.is_some() {
            flex::call(ctx, client.vpn_gateways().update(&id, &patch))
                .await
                .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "UpdateVPNGateway", &e))?
        } else {
            flex::call(ctx, client.vpn_gateways().get(&id))
                .await
                .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "GetVPNGateway", &e))?
        };
        Self::state_of(&gateway, Operation::Update)
    }

    async fn delete_gateway(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Delete)?;
        let id = Self::id_of(prior, Operation::Delete)?;

        match flex::call(ctx, client.vpn_gateways().delete(&id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!("VPN gateway {} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(TfError::api(TYPE_NAME, Operation::Delete, "DeleteVPNGateway", &e)),
        }
    }
}

#[async_trait]
impl Resource for VpnGatewayResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: vpn_gateway_schema().clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        match self.create_gateway(&ctx, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.diagnostic()],
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let result: Result<Option<DynamicValue>, TfError> = async {
            let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Read)?;
            let id = Self::id_of(&request.current_state, Operation::Read)?;
            match flex::call(&ctx, client.vpn_gateways().get(&id)).await {
                Ok(gateway) => Self::state_of(&gateway, Operation::Read).map(Some),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("VPN gateway {} not found, removing from state", id);
                    Ok(None)
                }
                Err(e) => Err(TfError::api(TYPE_NAME, Operation::Read, "GetVPNGateway", &e)),
            }
        }
        .await;

        match result {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.diagnostic()],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self
            .update_gateway(&ctx, &request.prior_state, &request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![e.diagnostic()],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let diagnostics = match self.delete_gateway(&ctx, &request.prior_state).await {
            Ok(()) => vec![],
            Err(e) => vec![e.diagnostic()],
        };
        DeleteResourceResponse { diagnostics }
    }

    fn as_importable(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for VpnGatewayResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        match flex::provider_data(request.provider_data, TYPE_NAME) {
            Ok(data) => {
                self.provider_data = data;
                ConfigureResourceResponse { diagnostics: vec![] }
            }
            Err(e) => ConfigureResourceResponse {
                diagnostics: vec![e.diagnostic()],
            },
        }
    }
}

#[async_trait]
impl ResourceWithImportState for VpnGatewayResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::{IpAddress, ReservedIpReference};
    use tfplug::types::Dynamic;

    #[test]
    fn members_flatten_in_order() {
        let gateway = VpnGateway {
            id: "0717-vpn".to_string(),
            name: Some("edge".to_string()),
            mode: Some("route".to_string()),
            local_asn: Some(64520),
            members: vec![
                VpnGatewayMember {
                    role: Some("active".to_string()),
                    public_ip: Some(IpAddress {
                        address: "169.21.50.5".to_string(),
                    }),
                    private_ip: Some(ReservedIpReference {
                        address: Some("10.0.1.5".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                VpnGatewayMember {
                    role: Some("standby".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let state = codec::flatten(&vpn_gateway_schema().block, &VpnGatewayState::from(&gateway)).unwrap();
        let members = state.get_list(&AttributePath::new("members")).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].get("address").as_str(), Some("169.21.50.5"));
        assert_eq!(members[0].get("private_address").as_str(), Some("10.0.1.5"));
        assert_eq!(members[1].get("role").as_str(), Some("standby"));
        assert_eq!(members[1].get("address"), &Dynamic::Null);
        assert_eq!(state.get_number(&AttributePath::new("local_asn")).unwrap(), 64520.0);
        assert_eq!(state.get(&AttributePath::new("vpc")), Some(&Dynamic::List(vec![])));
    }

    #[test]
    fn required_only_config() {
        let config = DynamicValue::object([
            ("name", Dynamic::from("edge")),
            ("subnet", Dynamic::from("0717-subnet")),
        ]);
        let args: VpnGatewayArgs = codec::expand(&vpn_gateway_schema().block, &config).unwrap();
        assert_eq!(
            args,
            VpnGatewayArgs {
                name: "edge".to_string(),
                subnet: "0717-subnet".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn mode_defaults_to_route() {
        let mut planned = DynamicValue::object([
            ("name", Dynamic::from("edge")),
            ("subnet", Dynamic::from("0717-subnet")),
        ]);
        vpn_gateway_schema().apply_defaults(&mut planned);
        assert_eq!(planned.get_string(&AttributePath::new("mode")).unwrap(), "route");

        let config = DynamicValue::object([
            ("name", Dynamic::from("edge")),
            ("subnet", Dynamic::from("0717-subnet")),
            ("mode", Dynamic::from("bgp")),
        ]);
        assert_eq!(vpn_gateway_schema().validate_config(&config).len(), 1);
    }
}
