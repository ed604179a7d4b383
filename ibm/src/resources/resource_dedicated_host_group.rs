//! Dedicated host group resource implementation

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

use crate::api::common::{IdentityById, IdentityByName, ResourceReference};
use crate::api::dedicated_hosts::{
    DedicatedHostGroup, DedicatedHostGroupPatch, DedicatedHostGroupPrototype,
};
use crate::flex::{self, Operation, TfError};
use crate::IbmProviderData;

use super::resource_subnet::NAME_PATTERN;

const TYPE_NAME: &str = "ibm_is_dedicated_host_group";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DedicatedHostGroupArgs {
    pub class: String,
    pub family: String,
    pub zone: String,
    pub name: Option<String>,
    pub resource_group: Option<String>,
}

impl DedicatedHostGroupArgs {
    pub fn prototype(&self) -> DedicatedHostGroupPrototype {
        DedicatedHostGroupPrototype {
            class: self.class.clone(),
            family: self.family.clone(),
            zone: IdentityByName::new(&self.zone),
            name: self.name.clone(),
            resource_group: self.resource_group.as_deref().map(IdentityById::new),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DedicatedHostGroupState {
    pub id: String,
    pub name: Option<String>,
    pub class: Option<String>,
    pub family: Option<String>,
    pub zone: Option<String>,
    pub resource_group: Option<String>,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub created_at: Option<String>,
    pub resource_type: Option<String>,
    pub dedicated_hosts: Vec<ResourceReference>,
    pub supported_instance_profiles: Vec<ResourceReference>,
}

impl From<&DedicatedHostGroup> for DedicatedHostGroupState {
    fn from(group: &DedicatedHostGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            class: group.class.clone(),
            family: group.family.clone(),
            zone: group.zone.as_ref().map(|z| z.name.clone()),
            resource_group: group.resource_group.as_ref().map(|rg| rg.id.clone()),
            crn: group.crn.clone(),
            href: group.href.clone(),
            created_at: group.created_at.clone(),
            resource_type: group.resource_type.clone(),
            dedicated_hosts: group.dedicated_hosts.clone(),
            supported_instance_profiles: group.supported_instance_profiles.clone(),
        }
    }
}

fn dedicated_host_group_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a dedicated host group")
            .attribute(flex::computed("id", AttributeType::String, "The unique identifier"))
            .attribute(
                AttributeBuilder::new("class", AttributeType::String)
                    .description("The dedicated host profile class for hosts in this group")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("family", AttributeType::String)
                    .description("The dedicated host profile family for hosts in this group")
                    .required()
                    .force_new()
                    .validator(OneOfValidator::create(&["balanced", "memory", "compute"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("zone", AttributeType::String)
                    .description("The zone this dedicated host group resides in")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The unique user-defined name for this dedicated host group")
                    .optional()
                    .computed()
                    .validator(StringPatternValidator::create(
                        NAME_PATTERN,
                        "lowercase letters, digits and hyphens, starting with a letter",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group", AttributeType::String)
                    .description("The resource group for this dedicated host group")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(flex::computed("crn", AttributeType::String, "The CRN"))
            .attribute(flex::computed("href", AttributeType::String, "The URL"))
            .attribute(flex::computed("created_at", AttributeType::String, "The creation date and time"))
            .attribute(flex::computed("resource_type", AttributeType::String, "The resource type"))
            .block(flex::reference_block("dedicated_hosts", "The dedicated hosts in this group"))
            .block(flex::reference_block(
                "supported_instance_profiles",
                "The instance profiles usable by instances placed on this group",
            ))
            .build()
    })
}

#[derive(Default)]
pub struct DedicatedHostGroupResource {
    provider_data: Option<IbmProviderData>,
}

impl DedicatedHostGroupResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(group: &DedicatedHostGroup, operation: Operation) -> Result<DynamicValue, TfError> {
        codec::flatten(
            &dedicated_host_group_schema().block,
            &DedicatedHostGroupState::from(group),
        )
        .map_err(|e| TfError::set_field(TYPE_NAME, operation, "state", e))
    }

    fn id_of(state: &DynamicValue, operation: Operation) -> Result<String, TfError> {
        state.get_string(&AttributePath::new("id")).map_err(|e| {
            TfError::new(TYPE_NAME, operation, format!("Missing group id in state: {}", e))
        })
    }

    async fn create_group(&self, ctx: &Context, planned: &DynamicValue) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Create)?;
        let args: DedicatedHostGroupArgs = codec::expand(&dedicated_host_group_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Create, e.to_string()))?;

        let group = flex::call(ctx, client.dedicated_hosts().create_group(&args.prototype()))
            .await
            .map_err(|e| TfError::api(TYPE_NAME, Operation::Create, "CreateDedicatedHostGroup", &e))?;
        tracing::info!("Created dedicated host group {}", group.id);

        Self::state_of(&group, Operation::Create)
    }

    async fn update_group(
        &self,
        ctx: &Context,
        prior: &DynamicValue,
        planned: &DynamicValue,
    ) -> Result<DynamicValue, TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Update)?;
        let id = Self::id_of(prior, Operation::Update)?;
        let args: DedicatedHostGroupArgs = codec::expand(&dedicated_host_group_schema().block, planned)
            .map_err(|e| TfError::new(TYPE_NAME, Operation::Update, e.to_string()))?;

        let group = match args.name {
            Some(name) if prior.get_optional_string(&AttributePath::new("name")).as_ref() != Some(&name) => {
                let patch = DedicatedHostGroupPatch { name: Some(name) };
                flex::call(ctx, client.dedicated_hosts().update_group(&id, &patch))
                    .await
                    .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "UpdateDedicatedHostGroup", &e))?
            }
            _ => flex::call(ctx, client.dedicated_hosts().get_group(&id))
                .await
                .map_err(|e| TfError::api(TYPE_NAME, Operation::Update, "GetDedicatedHostGroup", &e))?,
        };
        Self::state_of(&group, Operation::Update)
    }

    async fn delete_group(&self, ctx: &Context, prior: &DynamicValue) -> Result<(), TfError> {
        let client = flex::client(&self.provider_data, TYPE_NAME, Operation::Delete)?;
        let id = Self::id_of(prior, Operation::Delete)?;

        match flex::call(ctx, client.dedicated_hosts().delete_group(&id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Dedicated host group {} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(TfError::api(TYPE_NAME, Operation::Delete, "DeleteDedicatedHostGroup", &e)),
        }
    }
}

#[async_trait]
impl Resource for DedicatedHostGroupResource {
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
            schema: dedicated_host_group_schema().clone(),
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
        match self.create_group(&ctx, &request.planned_state).await {
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
            match flex::call(&ctx, client.dedicated_hosts().get_group(&id)).await {
                Ok(group) => Self::state_of(&group, Operation::Read).map(Some),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Dedicated host group {} not found, removing from state", id);
                    Ok(None)
                }
                Err(e) => Err(TfError::api(TYPE_NAME, Operation::Read, "GetDedicatedHostGroup", &e)),
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
            .update_group(&ctx, &request.prior_state, &request.planned_state)
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
        let diagnostics = match self.delete_group(&ctx, &request.prior_state).await {
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
impl ResourceWithConfigure for DedicatedHostGroupResource {
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
impl ResourceWithImportState for DedicatedHostGroupResource {
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
    fn host_references_keep_order() {
        let group = DedicatedHostGroup {
            id: "0717-dhg".to_string(),
            name: Some("hosts".to_string()),
            class: Some("mx2".to_string()),
            family: Some("balanced".to_string()),
            zone: Some(ZoneReference {
                name: "us-south-1".to_string(),
                href: None,
            }),
            dedicated_hosts: vec![
                ResourceReference {
                    id: Some("dh-1".to_string()),
                    ..Default::default()
                },
                ResourceReference {
                    id: Some("dh-2".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let state = codec::flatten(
            &dedicated_host_group_schema().block,
            &DedicatedHostGroupState::from(&group),
        )
        .unwrap();
        let hosts = state.get_list(&AttributePath::new("dedicated_hosts")).unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].get("id").as_str(), Some("dh-1"));
        assert_eq!(hosts[1].get("id").as_str(), Some("dh-2"));
        assert_eq!(
            state.get(&AttributePath::new("supported_instance_profiles")),
            Some(&Dynamic::List(vec![]))
        );
        assert_eq!(state.get_string(&AttributePath::new("zone")).unwrap(), "us-south-1");
    }

    #[test]
    fn required_only_leaves_name_unset() {
        let config = DynamicValue::object([
            ("class", Dynamic::from("mx2")),
            ("family", Dynamic::from("balanced")),
            ("zone", Dynamic::from("us-south-1")),
            ("name", Dynamic::Unknown),
        ]);
        let args: DedicatedHostGroupArgs =
            codec::expand(&dedicated_host_group_schema().block, &config).unwrap();
        let prototype = args.prototype();
        assert!(prototype.name.is_none());
        assert!(prototype.resource_group.is_none());
        assert_eq!(prototype.zone.name, "us-south-1");
    }

    #[test]
    fn family_is_restricted() {
        let config = DynamicValue::object([
            ("class", Dynamic::from("mx2")),
            ("family", Dynamic::from("gpu")),
            ("zone", Dynamic::from("us-south-1")),
        ]);
        let diagnostics = dedicated_host_group_schema().validate_config(&config);
        assert_eq!(diagnostics.len(), 1);
    }
}
