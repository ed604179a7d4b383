//! Subnet reserved IP resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tfplug::codec;
use tfplug::context::Context;
use tfplug::import::split_import_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::StringPatternValidator;

use crate::api::common::IdentityById;
use crate::api::subnets::{ReservedIp, ReservedIpPatch, ReservedIpPrototype};
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

use super::resource_subnet::NAME_PATTERN;

const TYPE_NAME: &str = "ibm_is_subnet_reserved_ip";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReservedIpArgs {
    pub subnet: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub auto_delete: Option<bool>,
    pub target: Option<String>,
}

impl ReservedIpArgs {
    pub fn prototype(&self) -> ReservedIpPrototype {
        ReservedIpPrototype {
            name: self.name.clone(),
            address: self.address.clone(),
            auto_delete: self.auto_delete,
            target: self.target.as_deref().map(IdentityById::new),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReservedIpState {
    pub id: String,
    pub subnet: String,
    pub reserved_ip: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub auto_delete: Option<bool>,
    pub target: Option<String>,
    pub target_crn: Option<String>,
    pub lifecycle_state: Option<String>,
    pub owner: Option<String>,
    pub resource_type: Option<String>,
    pub href: Option<String>,
    pub created_at: Option<String>,
}

impl ReservedIpState {
    pub fn new(subnet_id: &str, ip: &ReservedIp) -> Self {
        Self {
            id: format!("{}/{}", subnet_id, ip.id),
            subnet: subnet_id.to_string(),
            reserved_ip: ip.id.clone(),
            name: ip.name.clone(),
            address: ip.address.clone(),
            auto_delete: ip.auto_delete,
            target: flex::reference_id(&ip.target),
            target_crn: ip.target.as_ref().and_then(|t| t.crn.clone()),
            lifecycle_state: ip.lifecycle_state.clone(),
            owner: ip.owner.clone(),
            resource_type: ip.resource_type.clone(),
            href: ip.href.clone(),
            created_at: ip.created_at.clone(),
        }
    }
}

fn reserved_ip_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Reserves an IP address in a subnet")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Composite identifier in the form subnet/reserved_ip")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("subnet", AttributeType::String)
                    .description("The subnet the IP is reserved in")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("reserved_ip", AttributeType::String)
                    .description("The unique identifier of the reserved IP")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name for this reserved IP")
                    .optional()
                    .computed()
                    .validator(StringPatternValidator::create(
                        NAME_PATTERN,
                        "lowercase letters, digits and hyphens, starting with a letter",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("address", AttributeType::String)
                    .description("The IP address to reserve, picked by the subnet when omitted")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auto_delete", AttributeType::Bool)
                    .description("Release the IP when its target is deleted")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("target", AttributeType::String)
                    .description("The target to bind the reserved IP to")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(flex::computed("target_crn", AttributeType::String, "The CRN of the target"))
            .attribute(flex::computed(
                "lifecycle_state",
                AttributeType::String,
                "The lifecycle state of the reserved IP",
            ))
            .attribute(flex::computed("owner", AttributeType::String, "The owner of the reserved IP"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .attribute(flex::computed("href", AttributeType::String, "The URL for this reserved IP"))
            .attribute(flex::computed(
                "created_at",
                AttributeType::String,
                "The date and time that the reserved IP was created",
            ))
            .build()
    })
}

/// Splits `subnet/reserved_ip`
fn parse_id(id: &str) -> Option<(String, String)> {
    split_import_id(id, 2).map(|parts| (parts[0].to_string(), parts[1].to_string()))
}

#[derive(Default)]
pub struct SubnetReservedIpResource {
    provider_data: Option<IbmProviderData>,
}

impl SubnetReservedIpResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(subnet_id: &str, ip: &ReservedIp, operation: Operation) -> Result<DynamicValue, TfError> {
        codec::flatten(&reserved_ip_schema().block, &ReservedIpState::new(subnet_id, ip))
            .map_err(|e| TfError::set_field(TYPE_NAME, operation, "state", e))
    }

    fn ids_of(state: &DynamicValue, operation: Operation) -> Result<(String, String), TfError> {
        let id = state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| TfError::new(TYPE_NAME, operation, format!("Missing id in state: {}", e)))?;
        parse_id(&id).ok_or_else(|| {
            TfError::new(
                TYPE_NAME,
                operation,
                format!("Unexpected id {:?}, expected subnet/reserved_ip", id),
            )
        })
    }

    async fn create_reserved_ip(&self, ctx: &Context, planned: &DynamicValue) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Create)?;
        let args: ReservedIpArgs = codec::expand(&reserved_ip_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Create, e.to_string()))?;

        let ip = flex::call(ctx, client.subnets().create_reserved_ip(&args.subnet, &args.prototype()))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Create, "CreateSubnetReservedIP", &e))?;
        tracing::info!("Reserved IP {} in subnet {}", ip.id, args.subnet);

        Self::state_of(&args.subnet, &ip, Operation::Create)
    }

    async fn update_reserved_ip(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Update)?;
        let (subnet_id, id) = Self::ids_of(prior, Operation::Update)?;
        let args: ReservedIpArgs = codec::expand(&reserved_ip_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Update, e.to_string()))?;

        let mut patch = ReservedIpPatch::default();
        if args.name.is_some() && args.name != prior.get_optional_string(&AttributePath::new("name")) {
            patch.name = args.name.clone();
        }
        let prior_auto_delete = prior.get_bool(&AttributePath::new("auto_delete")).ok();
        if args.auto_delete.is_some() && args.auto_delete != prior_auto_delete {
            patch.auto_delete = args.auto_delete;
        }

        let ip = if patch.name.is_some() || patch.auto_delete.is_some() {
            flex::call(ctx, client.subnets().update_reserved_ip(&subnet_id, &id, &patch))
                .await
                .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "UpdateSubnetReservedIP", &e))?
        } else {
            flex::call(ctx, client.subnets().get_reserved_ip(&subnet_id, &id))
                .await
                .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "GetSubnetReservedIP", &e))?
        };
        Self::state_of(&subnet_id, &ip, Operation::Update)
    }

    async fn delete_reserved_ip(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Delete)?;
        let (subnet_id, id) = Self::ids_of(prior, Operation::Delete)?;

        match flex::call(ctx, client.subnets().delete_reserved_ip(&subnet_id, &id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Reserved IP {} in subnet {} was already deleted", id, subnet_id);
                Ok(())
            }
            Err(e) => Err(TfError::api(TYPE_NAME, Operation::Delete, "DeleteSubnetReservedIP", &e)),
        }
    }
}

#[async_trait]
impl Resource for SubnetReservedIpResource {
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
            schema: reserved_ip_schema().clone(),
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
        match self.create_reserved_ip(&ctx, &request.planned_state).await {
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
        let (subnet_id, id) = match Self::ids_of(&request.current_state, Operation::Read) {
            Ok(ids) => ids,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![e.diagnostic()],
                }
            }
        };

        match flex::call(&ctx, client.subnets().get_reserved_ip(&subnet_id, &id)).await {
            Ok(ip) => match Self::state_of(&subnet_id, &ip, Operation::Read) {
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
                diagnostics: vec![
                    TfError::api(TYPE_NAME, Operation::Read, "GetSubnetReservedIP", &e).diagnostic(),
                ],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self
            .update_reserved_ip(&ctx, &request.prior_state, &request.planned_state)
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
        let diagnostics = match self.delete_reserved_ip(&ctx, &request.prior_state).await {
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
impl ResourceWithConfigure for SubnetReservedIpResource {
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
impl ResourceWithImportState for SubnetReservedIpResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };

        let Some((subnet_id, _)) = parse_id(&request.id) else {
            response.diagnostics.push(
                Diagnostic::error(
                    "Invalid import ID",
                    format!(
                        "Expected an ID of the form <subnet>/<reserved_ip>, got {:?}",
                        request.id
                    ),
                )
                .with_attribute(AttributePath::new("id")),
            );
            return response;
        };

        let mut state = DynamicValue::null();
        let result = state
            .set_string(&AttributePath::new("id"), request.id.clone())
            .and_then(|_| state.set_string(&AttributePath::new("subnet"), subnet_id));
        match result {
            Ok(()) => response.imported_resources.push(ImportedResource {
                type_name: request.type_name,
                state,
            }),
            Err(e) => response.diagnostics.push(
                TfError::set_field(TYPE_NAME, Operation::Import, "id", e).diagnostic(),
            ),
        }
        response
    }
}
