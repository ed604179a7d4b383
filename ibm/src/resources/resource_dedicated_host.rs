//! Dedicated host resource implementation

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
use tfplug::types::{AttributePath, DynamicValue};
use tfplug::validator::StringPatternValidator;

use crate::api::common::{IdentityById, IdentityByName, ResourceReference};
use crate::api::dedicated_hosts::{
    DedicatedHost, DedicatedHostDisk, DedicatedHostPatch, DedicatedHostPrototype, Vcpu,
};
use crate::data_sources::data_source_dedicated_host::{host_attributes, host_blocks};
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

use super::resource_subnet::NAME_PATTERN;

const TYPE_NAME: &str = "ibm_is_dedicated_host";

/// Computed blocks of a host that the resource also exposes
const STATE_BLOCKS: [&str; 5] = [
    "available_vcpu",
    "vcpu",
    "disks",
    "instances",
    "supported_instance_profiles",
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DedicatedHostArgs {
    pub profile: String,
    pub host_group: String,
    pub name: Option<String>,
    pub instance_placement_enabled: Option<bool>,
    pub resource_group: Option<String>,
}

impl DedicatedHostArgs {
    pub fn prototype(&self) -> DedicatedHostPrototype {
        DedicatedHostPrototype {
            profile: IdentityByName::new(&self.profile),
            group: IdentityById::new(&self.host_group),
            name: self.name.clone(),
            instance_placement_enabled: self.instance_placement_enabled,
            resource_group: self.resource_group.as_deref().map(IdentityById::new),
        }
    }

    /// Only the fields that differ from the host as it is now
    pub fn patch(&self, current: &DedicatedHost) -> DedicatedHostPatch {
        DedicatedHostPatch {
            name: self.name.clone().filter(|name| Some(name) != current.name.as_ref()),
            instance_placement_enabled: self
                .instance_placement_enabled
                .filter(|enabled| Some(*enabled) != current.instance_placement_enabled),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DedicatedHostState {
    pub id: String,
    pub name: Option<String>,
    pub profile: Option<String>,
    pub host_group: Option<String>,
    pub instance_placement_enabled: Option<bool>,
    pub resource_group: Option<String>,
    pub zone: Option<String>,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub available_memory: Option<i64>,
    pub created_at: Option<String>,
    pub lifecycle_state: Option<String>,
    pub memory: Option<i64>,
    pub provisionable: Option<bool>,
    pub resource_type: Option<String>,
    pub socket_count: Option<i64>,
    pub state: Option<String>,
    pub available_vcpu: Option<Vcpu>,
    pub vcpu: Option<Vcpu>,
    pub disks: Vec<DedicatedHostDisk>,
    pub instances: Vec<ResourceReference>,
    pub supported_instance_profiles: Vec<ResourceReference>,
}

impl From<&DedicatedHost> for DedicatedHostState {
    fn from(host: &DedicatedHost) -> Self {
        Self {
            id: host.id.clone(),
            name: host.name.clone(),
            profile: host.profile.as_ref().and_then(|p| p.name.clone()),
            host_group: flex::reference_id(&host.group),
            instance_placement_enabled: host.instance_placement_enabled,
            resource_group: host.resource_group.as_ref().map(|rg| rg.id.clone()),
            zone: host.zone.as_ref().map(|z| z.name.clone()),
            crn: host.crn.clone(),
            href: host.href.clone(),
            available_memory: host.available_memory,
            created_at: host.created_at.clone(),
            lifecycle_state: host.lifecycle_state.clone(),
            memory: host.memory,
            provisionable: host.provisionable,
            resource_type: host.resource_type.clone(),
            socket_count: host.socket_count,
            state: host.state.clone(),
            available_vcpu: host.available_vcpu.clone(),
            vcpu: host.vcpu.clone(),
            disks: host.disks.clone(),
            instances: host.instances.clone(),
            supported_instance_profiles: host.supported_instance_profiles.clone(),
        }
    }
}

fn dedicated_host_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a dedicated host in a dedicated host group")
            .attribute(
                AttributeBuilder::new("profile", AttributeType::String)
                    .description("The name of the dedicated host profile")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("host_group", AttributeType::String)
                    .description("The dedicated host group the host is placed in")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The unique user-defined name for this dedicated host")
                    .optional()
                    .computed()
                    .validator(StringPatternValidator::create(
                        NAME_PATTERN,
                        "lowercase letters, digits and hyphens, starting with a letter",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_placement_enabled", AttributeType::Bool)
                    .description("Whether instances can be placed on this dedicated host")
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group", AttributeType::String)
                    .description("The resource group for this dedicated host")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(flex::computed("zone", AttributeType::String, "The zone the host resides in"));

        for attribute in host_attributes()
            .into_iter()
            .filter(|a| a.name != "instance_placement_enabled")
        {
            builder = builder.attribute(attribute);
        }
        for block in host_blocks()
            .into_iter()
            .filter(|b| STATE_BLOCKS.contains(&b.type_name.as_str()))
        {
            builder = builder.block(block);
        }
        builder.build()
    })
}

#[derive(Default)]
pub struct DedicatedHostResource {
    provider_data: Option<IbmProviderData>,
}

impl DedicatedHostResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(host: &DedicatedHost, operation: Operation) -> Result<DynamicValue, TfError> {
        codec::flatten(&dedicated_host_schema().block, &DedicatedHostState::from(host))
            .map_err(|e| TfError::set_field(TYPE_NAME, operation, "state", e))
    }

    fn id_of(state: &DynamicValue, operation: Operation) -> Result<String, TfError> {
        state.get_string(&AttributePath::new("id")).map_err(|e| {
            TfError::new(TYPE_NAME, operation, format!("Missing dedicated host id in state: {}", e))
        })
    }

    async fn create_host(&self, ctx: &Context, planned: &DynamicValue) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Create)?;
        let args: DedicatedHostArgs = codec::expand(&dedicated_host_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Create, e.to_string()))?;

        let host = flex::call(ctx, client.dedicated_hosts().create(&args.prototype()))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Create, "CreateDedicatedHost", &e))?;
        tracing::info!("Created dedicated host {} in group {}", host.id, args.host_group);

        Self::state_of(&host, Operation::Create)
    }

    async fn update_host(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Update)?;
        let id = Self::id_of(prior, Operation::Update)?;
        let args: DedicatedHostArgs = codec::expand(&dedicated_host_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Update, e.to_string()))?;

        let current = flex::call(ctx, client.dedicated_hosts().get(&id))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "GetDedicatedHost", &e))?;
        let patch = args.patch(&current);
        if patch.is_empty() {
            return Self::state_of(&current, Operation::Update);
        }

        let host = flex::call(ctx, client.dedicated_hosts().update(&id, &patch))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "UpdateDedicatedHost", &e))?;
        Self::state_of(&host, Operation::Update)
    }

    /// Placement is switched off before the host is deleted
    async fn delete_host(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Delete)?;
        let id = Self::id_of(prior, Operation::Delete)?;

        let disable = DedicatedHostPatch {
            name: None,
            instance_placement_enabled: Some(false),
        };
        let result = match flex::call(ctx, client.dedicated_hosts().update(&id, &disable)).await {
            Ok(_) => flex::call(ctx, client.dedicated_hosts().delete(&id))
                .await
                .map_err(|e| ("DeleteDedicatedHost", e)),
            Err(e) => Err(("UpdateDedicatedHost", e)),
        };

        match result {
            Ok(()) => Ok(()),
            Err((_, e)) if e.is_not_found() => {
                tracing::warn!("Dedicated host {} was already deleted", id);
                Ok(())
            }
            Err((api_operation, e)) => Err(TfError::api(TYPE_NAME, Operation::Delete, api_operation, &e)),
        }
    }
}

#[async_trait]
impl Resource for DedicatedHostResource {
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
            schema: dedicated_host_schema().clone(),
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
        match self.create_host(&ctx, &request.planned_state).await {
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
            match flex::call(&ctx, client.dedicated_hosts().get(&id)).await {
                Ok(host) => Self::state_of(&host, Operation::Read).map(Some),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Dedicated host {} not found, removing from state", id);
                    Ok(None)
                }
                Err(e) => Err(TfError::api(TYPE_NAME, Operation::Read, "GetDedicatedHost", &e)),
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
            .update_host(&ctx, &request.prior_state, &request.planned_state)
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
        let diagnostics = match self.delete_host(&ctx, &request.prior_state).await {
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
impl ResourceWithConfigure for DedicatedHostResource {
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
impl ResourceWithImportState for DedicatedHostResource {
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
    use crate::api::common::ZoneReference;
    use tfplug::types::Dynamic;

    #[test]
    fn flatten_reduces_references_to_ids() {
        let host = DedicatedHost {
            id: "0717-dh".to_string(),
            name: Some("host-a".to_string()),
            group: Some(ResourceReference {
                id: Some("dhg-1".to_string()),
                ..Default::default()
            }),
            profile: Some(ResourceReference {
                name: Some("mx2-host-152x1216".to_string()),
                ..Default::default()
            }),
            instance_placement_enabled: Some(true),
            vcpu: Some(Vcpu {
                count: Some(152),
                ..Default::default()
            }),
            zone: Some(ZoneReference {
                name: "us-south-1".to_string(),
                href: None,
            }),
            ..Default::default()
        };
        let state = DedicatedHostResource::state_of(&host, Operation::Read).unwrap();

        let Dynamic::Map(map) = &state.value else {
            panic!("expected an object");
        };
        let block = &dedicated_host_schema().block;
        assert_eq!(map.len(), block.attributes.len() + block.block_types.len());
        assert_eq!(state.get_string(&AttributePath::new("host_group")).unwrap(), "dhg-1");
        assert_eq!(state.get_string(&AttributePath::new("profile")).unwrap(), "mx2-host-152x1216");
        assert_eq!(state.get_string(&AttributePath::new("zone")).unwrap(), "us-south-1");
        let vcpu = state.get_list(&AttributePath::new("vcpu")).unwrap();
        assert_eq!(vcpu[0].get("count").as_number(), Some(152.0));
        assert_eq!(state.get(&AttributePath::new("disks")), Some(&Dynamic::List(vec![])));
    }

    #[test]
    fn schema_definition_is_valid() {
        assert!(dedicated_host_schema().validate_definition(TYPE_NAME).is_ok());
        let block = &dedicated_host_schema().block;
        assert!(block.attribute("profile").unwrap().force_new);
        assert!(block.attribute("host_group").unwrap().force_new);
        assert!(!block.attribute("name").unwrap().force_new);
    }

    #[test]
    fn required_only_prototype() {
        let config = DynamicValue::object([
            ("profile", Dynamic::from("mx2-host-152x1216")),
            ("host_group", Dynamic::from("dhg-1")),
            ("name", Dynamic::Unknown),
        ]);
        let args: DedicatedHostArgs = codec::expand(&dedicated_host_schema().block, &config).unwrap();
        let json = serde_json::to_value(args.prototype()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "profile": {"name": "mx2-host-152x1216"},
                "group": {"id": "dhg-1"}
            })
        );
    }

    #[test]
    fn patch_carries_only_changes() {
        let current = DedicatedHost {
            id: "0717-dh".to_string(),
            name: Some("host-a".to_string()),
            instance_placement_enabled: Some(true),
            ..Default::default()
        };
        let args = DedicatedHostArgs {
            profile: "mx2-host-152x1216".to_string(),
            host_group: "dhg-1".to_string(),
            name: Some("host-a".to_string()),
            instance_placement_enabled: Some(false),
            resource_group: None,
        };
        assert_eq!(
            args.patch(&current),
            DedicatedHostPatch {
                name: None,
                instance_placement_enabled: Some(false),
            }
        );

        let unchanged = DedicatedHostArgs {
            instance_placement_enabled: Some(true),
            ..args
        };
        assert!(unchanged.patch(&current).is_empty());
    }
}
