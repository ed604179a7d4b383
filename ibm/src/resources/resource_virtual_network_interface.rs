//! Virtual network interface resource implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tfplug::codec;
use tfplug::context::Context;
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
use tfplug::types::{AttributePath, DynamicValue};
use tfplug::validator::{OneOfValidator, StringPatternValidator};

use crate::api::common::{IdentityById, ReservedIpReference, ResourceReference};
use crate::api::virtual_network_interfaces::{
    VirtualNetworkInterface, VirtualNetworkInterfacePatch, VirtualNetworkInterfacePrototype,
};
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

use super::resource_subnet::NAME_PATTERN;

const TYPE_NAME: &str = "ibm_is_virtual_network_interface";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VirtualNetworkInterfaceArgs {
    pub name: Option<String>,
    pub subnet: Option<String>,
    pub allow_ip_spoofing: Option<bool>,
    pub auto_delete: Option<bool>,
    pub enable_infrastructure_nat: Option<bool>,
    pub protocol_state_filtering_mode: Option<String>,
    pub resource_group: Option<String>,
}

impl VirtualNetworkInterfaceArgs {
    pub fn prototype(&self) -> VirtualNetworkInterfacePrototype {
        VirtualNetworkInterfacePrototype {
            name: self.name.clone(),
            subnet: self.subnet.as_deref().map(IdentityById::new),
            allow_ip_spoofing: self.allow_ip_spoofing,
            auto_delete: self.auto_delete,
            enable_infrastructure_nat: self.enable_infrastructure_nat,
            protocol_state_filtering_mode: self.protocol_state_filtering_mode.clone(),
            resource_group: self.resource_group.as_deref().map(IdentityById::new),
        }
    }

    /// Fields that differ from the interface as it exists now
    pub fn patch(&self, current: &VirtualNetworkInterface) -> VirtualNetworkInterfacePatch {
        fn changed<T: Clone + PartialEq>(wanted: &Option<T>, current: &Option<T>) -> Option<T> {
            wanted.as_ref().filter(|w| Some(*w) != current.as_ref()).cloned()
        }
        VirtualNetworkInterfacePatch {
            name: changed(&self.name, &current.name),
            allow_ip_spoofing: changed(&self.allow_ip_spoofing, &current.allow_ip_spoofing),
            auto_delete: changed(&self.auto_delete, &current.auto_delete),
            enable_infrastructure_nat: changed(
                &self.enable_infrastructure_nat,
                &current.enable_infrastructure_nat,
            ),
            protocol_state_filtering_mode: changed(
                &self.protocol_state_filtering_mode,
                &current.protocol_state_filtering_mode,
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VirtualNetworkInterfaceState {
    pub id: String,
    pub name: Option<String>,
    pub subnet: Option<String>,
    pub allow_ip_spoofing: Option<bool>,
    pub auto_delete: Option<bool>,
    pub enable_infrastructure_nat: Option<bool>,
    pub protocol_state_filtering_mode: Option<String>,
    pub resource_group: Option<String>,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub lifecycle_state: Option<String>,
    pub mac_address: Option<String>,
    pub resource_type: Option<String>,
    pub created_at: Option<String>,
    pub zone: Option<String>,
    pub primary_ip: Option<ReservedIpReference>,
    pub vpc: Option<ResourceReference>,
}

impl From<&VirtualNetworkInterface> for VirtualNetworkInterfaceState {
    fn from(vni: &VirtualNetworkInterface) -> Self {
        Self {
            id: vni.id.clone(),
            name: vni.name.clone(),
            subnet: flex::reference_id(&vni.subnet),
            allow_ip_spoofing: vni.allow_ip_spoofing,
            auto_delete: vni.auto_delete,
            enable_infrastructure_nat: vni.enable_infrastructure_nat,
            protocol_state_filtering_mode: vni.protocol_state_filtering_mode.clone(),
            resource_group: vni.resource_group.as_ref().map(|rg| rg.id.clone()),
            crn: vni.crn.clone(),
            href: vni.href.clone(),
            lifecycle_state: vni.lifecycle_state.clone(),
            mac_address: vni.mac_address.clone(),
            resource_type: vni.resource_type.clone(),
            created_at: vni.created_at.clone(),
            zone: vni.zone.as_ref().map(|z| z.name.clone()),
            primary_ip: vni.primary_ip.clone(),
            vpc: vni.vpc.clone(),
        }
    }
}

fn optional(name: &str, attr_type: AttributeType, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, attr_type)
        .description(description)
        .optional()
        .computed()
        .build()
}

fn virtual_network_interface_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a virtual network interface")
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name for this virtual network interface")
                    .optional()
                    .computed()
                    .validator(StringPatternValidator::create(
                        NAME_PATTERN,
                        "lowercase letters, digits and hyphens, starting with a letter",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("subnet", AttributeType::String)
                    .description("The associated subnet")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(optional(
                "allow_ip_spoofing",
                AttributeType::Bool,
                "Allow source IP spoofing on this interface",
            ))
            .attribute(optional(
                "auto_delete",
                AttributeType::Bool,
                "Delete the interface when its target is deleted",
            ))
            .attribute(optional(
                "enable_infrastructure_nat",
                AttributeType::Bool,
                "Perform NAT in the VPC infrastructure",
            ))
            .attribute(
                AttributeBuilder::new("protocol_state_filtering_mode", AttributeType::String)
                    .description("The protocol state filtering mode")
                    .optional()
                    .computed()
                    .validator(OneOfValidator::create(&["auto", "enabled", "disabled"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group", AttributeType::String)
                    .description("The resource group for this interface")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(flex::computed("crn", AttributeType::String, "The CRN"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("lifecycle_state", AttributeType::String, "The lifecycle state"))
            .attribute(flex::computed("mac_address", AttributeType::String, "The MAC address"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .attribute(flex::computed("created_at", AttributeType::String, "The creation date and time"))
            .attribute(flex::computed("zone", AttributeType::String, "The zone name"))
            .block(flex::reserved_ip_block("primary_ip", "The primary IP address"))
            .block(flex::reference_block("vpc", "The VPC the interface resides in"))
            .build()
    })
}

#[derive(Default)]
pub struct VirtualNetworkInterfaceResource {
    provider_data: Option<IbmProviderData>,
}

impl VirtualNetworkInterfaceResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(vni: &VirtualNetworkInterface, operation: Operation) -> Result<DynamicValue, TfError> {
        codec::flatten(
            &virtual_network_interface_schema().block,
            &VirtualNetworkInterfaceState::from(vni),
        )
        .map_err(|e| TfError::set_field(TYPE_NAME, operation, "state", e))
    }

    fn id_of(state: &DynamicValue, operation: Operation) -> Result<String, TfError> {
        state.get_string(&AttributePath::new("id")).map_err(|e| {
            TfError::new(TYPE_NAME, operation, format!("Missing interface id in state: {}", e))
        })
    }

    async fn create_interface(&self, ctx: &Context, planned: &DynamicValue) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Create)?;
        let args: VirtualNetworkInterfaceArgs =
            codec::expand(&virtual_network_interface_schema().block, planned)
                .map_err(|e| TfError::new(TYPE_NAME, Operation::Create, e.to_string()))?;

        let vni = flex::call(ctx, client.virtual_network_interfaces().create(&args.prototype()))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Create, "CreateVirtualNetworkInterface", &e))?;
        tracing::info!("Created virtual network interface {}", vni.id);

        Self::state_of(&vni, Operation::Create)
    }

    async fn update_interface(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Update)?;
        let id = Self::id_of(prior, Operation::Update)?;
        let args: VirtualNetworkInterfaceArgs =
            codec::expand(&virtual_network_interface_schema().block, planned)
                .map_err(|e| TfError::new(TYPE_NAME, Operation::Update, e.to_string()))?;

        let current = flex::call(ctx, client.virtual_network_interfaces().get(&id))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "GetVirtualNetworkInterface", &e))?;
        let patch = args.patch(&current);
        if patch.is_empty() {
            return Self::state_of(&current, Operation::Update);
        }

        let vni = flex::call(ctx, client.virtual_network_interfaces().update(&id, &patch))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "UpdateVirtualNetworkInterface", &e))?;
        Self::state_of(&vni, Operation::Update)
    }

    async fn delete_interface(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Delete)?;
        let id = Self::id_of(prior, Operation::Delete)?;

        match flex::call(ctx, client.virtual_network_interfaces().delete(&id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Virtual network interface {} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(TfError::api(TYPE_NAME, Operation::Delete, "DeleteVirtualNetworkInterface", &e)),
        }
    }
}

#[async_trait]
impl Resource for VirtualNetworkInterfaceResource {
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
            schema: virtual_network_interface_schema().clone(),
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
        match self.create_interface(&ctx, &request.planned_state).await {
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
            match flex::call(&ctx, client.virtual_network_interfaces().get(&id)).await {
                Ok(vni) => Self::state_of(&vni, Operation::Read).map(Some),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Virtual network interface {} not found, removing from state", id);
                    Ok(None)
                }
                Err(e) => Err(TfError::api(TYPE_NAME, Operation::Read, "GetVirtualNetworkInterface", &e)),
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
            .update_interface(&ctx, &request.prior_state, &request.planned_state)
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
        let diagnostics = match self.delete_interface(&ctx, &request.prior_state).await {
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
impl ResourceWithConfigure for VirtualNetworkInterfaceResource {
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
impl ResourceWithImportState for VirtualNetworkInterfaceResource {
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
