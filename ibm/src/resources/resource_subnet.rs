//! Subnet resource implementation

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
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{OneOfValidator, StringLengthValidator, StringPatternValidator};

use crate::api::common::{IdentityById, IdentityByName};
use crate::api::subnets::{Subnet, SubnetPatch, SubnetPrototype};
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

const TYPE_NAME: &str = "ibm_is_subnet";

pub(crate) const NAME_PATTERN: &str = "^([a-z]|[a-z][-a-z0-9]*[a-z0-9])$";

/// Arguments of `ibm_is_subnet`, expanded from the planned state
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubnetArgs {
    pub name: String,
    pub vpc: String,
    pub zone: String,
    pub ipv4_cidr_block: Option<String>,
    pub total_ipv4_address_count: Option<i64>,
    pub ip_version: Option<String>,
    pub network_acl: Option<String>,
    pub public_gateway: Option<String>,
    pub routing_table: Option<String>,
    pub resource_group: Option<String>,
}

impl SubnetArgs {
    pub fn prototype(&self) -> SubnetPrototype {
        SubnetPrototype {
            name: self.name.clone(),
            vpc: IdentityById::new(&self.vpc),
            zone: IdentityByName::new(&self.zone),
            ipv4_cidr_block: self.ipv4_cidr_block.clone(),
            total_ipv4_address_count: self.total_ipv4_address_count,
            ip_version: self.ip_version.clone(),
            network_acl: self.network_acl.as_deref().map(IdentityById::new),
            public_gateway: self.public_gateway.as_deref().map(IdentityById::new),
            routing_table: self.routing_table.as_deref().map(IdentityById::new),
            resource_group: self.resource_group.as_deref().map(IdentityById::new),
        }
    }
}

/// Flat state of a subnet, references reduced to their ids
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubnetState {
    pub id: String,
    pub name: Option<String>,
    pub vpc: Option<String>,
    pub vpc_name: Option<String>,
    pub zone: Option<String>,
    pub ipv4_cidr_block: Option<String>,
    pub total_ipv4_address_count: Option<i64>,
    pub available_ipv4_address_count: Option<i64>,
    pub ip_version: Option<String>,
    pub network_acl: Option<String>,
    pub public_gateway: Option<String>,
    pub routing_table: Option<String>,
    pub resource_group: Option<String>,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub status: Option<String>,
    pub resource_type: Option<String>,
    pub created_at: Option<String>,
}

impl From<&Subnet> for SubnetState {
    fn from(subnet: &Subnet) -> Self {
        Self {
            id: subnet.id.clone(),
            name: subnet.name.clone(),
            vpc: flex::reference_id(&subnet.vpc),
            vpc_name: subnet.vpc.as_ref().and_then(|v| v.name.clone()),
            zone: subnet.zone.as_ref().map(|z| z.name.clone()),
            ipv4_cidr_block: subnet.ipv4_cidr_block.clone(),
            total_ipv4_address_count: subnet.total_ipv4_address_count,
            available_ipv4_address_count: subnet.available_ipv4_address_count,
            ip_version: subnet.ip_version.clone(),
            network_acl: flex::reference_id(&subnet.network_acl),
            public_gateway: flex::reference_id(&subnet.public_gateway),
            routing_table: flex::reference_id(&subnet.routing_table),
            resource_group: subnet.resource_group.as_ref().map(|rg| rg.id.clone()),
            crn: subnet.crn.clone(),
            href: subnet.href.clone(),
            status: subnet.status.clone(),
            resource_type: subnet.resource_type.clone(),
            created_at: subnet.created_at.clone(),
        }
    }
}

pub fn subnet_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a VPC subnet")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The unique identifier of the subnet")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name for this subnet, unique within the VPC")
                    .required()
                    .validator(StringLengthValidator::between(1, 63))
                    .validator(StringPatternValidator::create(
                        NAME_PATTERN,
                        "lowercase letters, digits and hyphens, starting with a letter",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc", AttributeType::String)
                    .description("The VPC the subnet resides in")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vpc_name", AttributeType::String)
                    .description("The name of the VPC")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("zone", AttributeType::String)
                    .description("The zone this subnet resides in")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ipv4_cidr_block", AttributeType::String)
                    .description("The IPv4 range of the subnet")
                    .optional()
                    .computed()
                    .force_new()
                    .conflicts_with(&["total_ipv4_address_count"])
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("total_ipv4_address_count", AttributeType::Number)
                    .description("The total number of IPv4 addresses in this subnet")
                    .optional()
                    .computed()
                    .force_new()
                    .conflicts_with(&["ipv4_cidr_block"])
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("available_ipv4_address_count", AttributeType::Number)
                    .description("The number of IPv4 addresses in this subnet that are not in use")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ip_version", AttributeType::String)
                    .description("The IP version(s) supported by this subnet")
                    .optional()
                    .force_new()
                    .validator(OneOfValidator::create(&["ipv4"]))
                    .default(StaticDefault::string("ipv4"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("network_acl", AttributeType::String)
                    .description("The network ACL for this subnet")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("public_gateway", AttributeType::String)
                    .description("The public gateway to use for internet-bound traffic")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("routing_table", AttributeType::String)
                    .description("The routing table for this subnet")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group", AttributeType::String)
                    .description("The resource group for this subnet")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("crn", AttributeType::String)
                    .description("The CRN for this subnet")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("href", AttributeType::String)
                    .description("The URL for this subnet")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("The status of the subnet")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_type", AttributeType::String)
                    .description("The resource type")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_at", AttributeType::String)
                    .description("The date and time that the subnet was created")
                    .computed()
                    .build(),
            )
            .build()
    })
}

#[derive(Default)]
pub struct SubnetResource {
    provider_data: Option<IbmProviderData>,
}

impl SubnetResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(subnet: &Subnet, operation: Operation) -> Result<DynamicValue, TfError> {
        codec::flatten(&subnet_schema().block, &SubnetState::from(subnet))
            .map_err(|e| TfError::set_field(TYPE_NAME, operation, "state", e))
    }

    fn id_of(state: &DynamicValue, operation: Operation) -> Result<String, TfError> {
        state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| TfError::new(TYPE_NAME, operation, format!("Missing subnet id in state: {}", e)))
    }

    async fn create_subnet(&self, ctx: &Context, planned: &DynamicValue) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Create)?;
        let args: SubnetArgs = codec::expand(&subnet_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Create, e.to_string()))?;

        let subnet = flex::call(ctx, client.subnets().create(&args.prototype()))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Create, "CreateSubnet", &e))?;
        tracing::info!("Created subnet {}", subnet.id);

        Self::state_of(&subnet, Operation::Create)
    }

    async fn update_subnet(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Update)?;
        let id = Self::id_of(prior, Operation::Update)?;
        let args: SubnetArgs = codec::expand(&subnet_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Update, e.to_string()))?;
        let prior_value = |field: &str| prior.get_optional_string(&AttributePath::new(field));

        let mut patch = SubnetPatch::default();
        let mut changed = false;
        if prior_value("name").as_deref() != Some(args.name.as_str()) {
            patch.name = Some(args.name.clone());
            changed = true;
        }
        if let Some(acl) = &args.network_acl {
            if prior_value("network_acl").as_ref() != Some(acl) {
                patch.network_acl = Some(IdentityById::new(acl));
                changed = true;
            }
        }
        if let Some(table) = &args.routing_table {
            if prior_value("routing_table").as_ref() != Some(table) {
                patch.routing_table = Some(IdentityById::new(table));
                changed = true;
            }
        }
        if changed {
            flex::call(ctx, client.subnets().update(&id, &patch))
                .await
                .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "UpdateSubnet", &e))?;
        }

        let prior_gateway = prior_value("public_gateway");
        if prior_gateway != args.public_gateway {
            match &args.public_gateway {
                Some(gateway) => {
                    flex::call(ctx, client.subnets().set_public_gateway(&id, gateway))
                        .await
                        .map_err(|e| {
                            TfError::api(TYPE_NAME, Operation::Update, "SetSubnetPublicGateway", &e)
                        })?;
                }
                None => {
                    flex::call(ctx, client.subnets().unset_public_gateway(&id))
                        .await
                        .map_err(|e| {
                            TfError::api(TYPE_NAME, Operation::Update, "UnsetSubnetPublicGateway", &e)
                        })?;
                }
            }
        }

        let subnet = flex::call(ctx, client.subnets().get(&id))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "GetSubnet", &e))?;
        Self::state_of(&subnet, Operation::Update)
    }

    async fn delete_subnet(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Delete)?;
        let id = Self::id_of(prior, Operation::Delete)?;

        if prior
            .get_optional_string(&AttributePath::new("public_gateway"))
            .is_some()
        {
            match flex::call(ctx, client.subnets().unset_public_gateway(&id)).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    return Err(TfError::api(TYPE_NAME, Operation::Delete, "UnsetSubnetPublicGateway", &e))
                }
            }
        }

        match flex::call(ctx, client.subnets().delete(&id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Subnet {} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(TfError::api(TYPE_NAME, Operation::Delete, "DeleteSubnet", &e)),
        }
    }
}

#[async_trait]
impl Resource for SubnetResource {
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
            schema: subnet_schema().clone(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        let cidr = request.config.get(&AttributePath::new("ipv4_cidr_block"));
        let count = request.config.get(&AttributePath::new("total_ipv4_address_count"));
        let unknown = cidr.is_some_and(Dynamic::is_unknown) || count.is_some_and(Dynamic::is_unknown);
        let set = |v: Option<&Dynamic>| v.is_some_and(Dynamic::is_known_value);
        if !unknown && !set(cidr) && !set(count) {
            diagnostics.push(Diagnostic::error(
                "Missing subnet size",
                "Exactly one of ipv4_cidr_block and total_ipv4_address_count must be set",
            ));
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        match self.create_subnet(&ctx, &request.planned_state).await {
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
        let client = match flex::client(&self.provider_data, TYPE_NAME, Operation::Read) {
            Ok(client) => client,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![e.diagnostic()],
                }
            }
        };
        let id = match Self::id_of(&request.current_state, Operation::Read) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![e.diagnostic()],
                }
            }
        };

        match flex::call(&ctx, client.subnets().get(&id)).await {
            Ok(subnet) => match Self::state_of(&subnet, Operation::Read) {
                Ok(state) => ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics: vec![],
                },
                Err(e) => ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![e.diagnostic()],
                },
            },
            Err(e) if e.is_not_found() => ReadResourceResponse {
                new_state: None,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![TfError::api(TYPE_NAME, Operation::Read, "GetSubnet", &e).diagnostic()],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self
            .update_subnet(&ctx, &request.prior_state, &request.planned_state)
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
        let diagnostics = match self.delete_subnet(&ctx, &request.prior_state).await {
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
impl ResourceWithConfigure for SubnetResource {
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
impl ResourceWithImportState for SubnetResource {
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
