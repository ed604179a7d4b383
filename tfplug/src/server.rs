//! In-process provider server
//!
//! `ProviderServer` sits where the plugin transport would: it receives decoded
//! values for every lifecycle call, applies the framework behaviour (schema
//! validation, defaults, computed unknowns, replacement planning) and
//! dispatches to freshly created resource and data source instances.
//! Schemas are validated once, when the server is built.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ReadDataSourceResponse, ValidateDataSourceConfigRequest,
};
use crate::error::{Result, TfplugError};
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderSchemaRequest,
    ResourceFactory, StopProviderRequest, ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, ResourceSchemaRequest, ResourceWithConfigure, UpdateResourceRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::Schema;
use crate::types::{has_errors, AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::Instrument;

/// All schemas served by a provider
#[derive(Debug, Clone)]
pub struct ProviderSchemas {
    pub provider: Schema,
    pub resources: HashMap<String, Schema>,
    pub data_sources: HashMap<String, Schema>,
}

pub struct PlanResourceChangeRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub proposed_new_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct PlanResourceChangeResponse {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ApplyResourceChangeRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
}

pub struct ApplyResourceChangeResponse {
    /// Null after a delete
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProviderServer<P: Provider> {
    provider: RwLock<P>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
    schemas: ProviderSchemas,
    provider_data: RwLock<Option<Arc<dyn Any + Send + Sync>>>,
}

impl<P: Provider> ProviderServer<P> {
    /// Collects and validates every schema the provider declares
    pub async fn new(provider: P) -> Result<Self> {
        let ctx = Context::new();
        let provider_schema = provider
            .schema(ctx.clone(), ProviderSchemaRequest)
            .await
            .schema;
        provider_schema.validate_definition(provider.type_name())?;

        let resources = provider.resources();
        let mut resource_schemas = HashMap::new();
        for (name, factory) in &resources {
            let resource = factory();
            if resource.type_name() != name {
                return Err(TfplugError::invalid_schema(
                    name.clone(),
                    format!("factory produced resource {}", resource.type_name()),
                ));
            }
            let response = resource.schema(ctx.clone(), ResourceSchemaRequest).await;
            if has_errors(&response.diagnostics) {
                return Err(TfplugError::invalid_schema(name.clone(), summarize(&response.diagnostics)));
            }
            response.schema.validate_definition(name)?;
            resource_schemas.insert(name.clone(), response.schema);
        }

        let data_sources = provider.data_sources();
        let mut data_source_schemas = HashMap::new();
        for (name, factory) in &data_sources {
            let data_source = factory();
            if data_source.type_name() != name {
                return Err(TfplugError::invalid_schema(
                    name.clone(),
                    format!("factory produced data source {}", data_source.type_name()),
                ));
            }
            let response = data_source.schema(ctx.clone(), DataSourceSchemaRequest).await;
            if has_errors(&response.diagnostics) {
                return Err(TfplugError::invalid_schema(name.clone(), summarize(&response.diagnostics)));
            }
            response.schema.validate_definition(name)?;
            data_source_schemas.insert(name.clone(), response.schema);
        }

        tracing::debug!(
            "registered {} resources and {} data sources",
            resource_schemas.len(),
            data_source_schemas.len()
        );

        Ok(Self {
            provider: RwLock::new(provider),
            resources,
            data_sources,
            schemas: ProviderSchemas {
                provider: provider_schema,
                resources: resource_schemas,
                data_sources: data_source_schemas,
            },
            provider_data: RwLock::new(None),
        })
    }

    pub fn get_provider_schema(&self) -> &ProviderSchemas {
        &self.schemas
    }

    pub async fn validate_provider_config(&self, config: DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = self.schemas.provider.validate_config(&config);
        if has_errors(&diagnostics) {
            return diagnostics;
        }
        let provider = self.provider.read().await;
        let response = provider
            .validate(Context::new(), ValidateProviderConfigRequest { config })
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    /// Applies provider defaults, then stores the data handed to resources
    pub async fn configure_provider(
        &self,
        terraform_version: &str,
        mut config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let ctx = Context::new();
        let span = tracing::info_span!("configure_provider", request_id = %ctx.request_id());
        async move {
            self.schemas.provider.apply_defaults(&mut config);
            let mut diagnostics = self.schemas.provider.validate_config(&config);
            if has_errors(&diagnostics) {
                return diagnostics;
            }

            let mut provider = self.provider.write().await;
            let response = provider
                .configure(
                    ctx,
                    ConfigureProviderRequest {
                        terraform_version: terraform_version.to_string(),
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            if !has_errors(&diagnostics) {
                *self.provider_data.write().await = response.provider_data;
            }
            diagnostics
        }
        .instrument(span)
        .await
    }

    pub async fn validate_resource_config(
        &self,
        type_name: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let (Some(factory), Some(schema)) = (
            self.resources.get(type_name),
            self.schemas.resources.get(type_name),
        ) else {
            return vec![unknown_type("resource", type_name)];
        };
        let mut diagnostics = schema.validate_config(&config);
        if has_errors(&diagnostics) {
            return diagnostics;
        }
        let response = factory()
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    pub async fn validate_data_resource_config(
        &self,
        type_name: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let (Some(factory), Some(schema)) = (
            self.data_sources.get(type_name),
            self.schemas.data_sources.get(type_name),
        ) else {
            return vec![unknown_type("data source", type_name)];
        };
        let mut diagnostics = schema.validate_config(&config);
        if has_errors(&diagnostics) {
            return diagnostics;
        }
        let response = factory()
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    /// Computes the planned state: defaults, computed unknowns and replacement
    pub async fn plan_resource_change(
        &self,
        request: PlanResourceChangeRequest,
    ) -> PlanResourceChangeResponse {
        let Some(schema) = self.schemas.resources.get(&request.type_name) else {
            return PlanResourceChangeResponse {
                planned_state: request.proposed_new_state,
                requires_replace: vec![],
                diagnostics: vec![unknown_type("resource", &request.type_name)],
            };
        };

        // destroy
        if request.proposed_new_state.is_null() {
            return PlanResourceChangeResponse {
                planned_state: DynamicValue::null(),
                requires_replace: vec![],
                diagnostics: vec![],
            };
        }

        let mut planned_state = request.proposed_new_state;
        schema.apply_defaults(&mut planned_state);

        let requires_replace = schema.requires_replace(&request.prior_state, &planned_state);
        if !requires_replace.is_empty() {
            // computed values of the replaced object are never carried over
            if let Dynamic::Map(planned_map) = &mut planned_state.value {
                for attr in schema.block.attributes.iter().filter(|a| a.computed) {
                    if request.config.value.get(&attr.name).is_null() {
                        planned_map.insert(attr.name.clone(), Dynamic::Null);
                    }
                }
            }
        }
        if request.prior_state.is_null() || !requires_replace.is_empty() {
            schema.mark_computed_unknown(&request.config, &mut planned_state);
        }

        tracing::debug!(
            "planned {} with {} replacement triggers",
            request.type_name,
            requires_replace.len()
        );

        PlanResourceChangeResponse {
            planned_state,
            requires_replace,
            diagnostics: vec![],
        }
    }

    /// Dispatches to create, update or delete from the prior/planned null-ness
    pub async fn apply_resource_change(
        &self,
        request: ApplyResourceChangeRequest,
    ) -> ApplyResourceChangeResponse {
        let ctx = Context::new();
        let operation = match (request.prior_state.is_null(), request.planned_state.is_null()) {
            (true, false) => "create",
            (false, true) => "delete",
            (false, false) => "update",
            (true, true) => {
                return ApplyResourceChangeResponse {
                    new_state: DynamicValue::null(),
                    diagnostics: vec![],
                }
            }
        };
        let span = tracing::info_span!(
            "apply_resource_change",
            resource = %request.type_name,
            operation,
            request_id = %ctx.request_id()
        );

        async move {
            let resource = match self.configured_resource(&ctx, &request.type_name).await {
                Ok(resource) => resource,
                Err(diagnostics) => {
                    return ApplyResourceChangeResponse {
                        new_state: request.prior_state,
                        diagnostics,
                    }
                }
            };

            match operation {
                "create" => {
                    let response = resource
                        .create(
                            ctx,
                            CreateResourceRequest {
                                type_name: request.type_name,
                                planned_state: request.planned_state,
                                config: request.config,
                            },
                        )
                        .await;
                    check_applied_state(response.new_state, response.diagnostics)
                }
                "delete" => {
                    let response = resource
                        .delete(
                            ctx,
                            DeleteResourceRequest {
                                type_name: request.type_name,
                                prior_state: request.prior_state.clone(),
                            },
                        )
                        .await;
                    let new_state = if has_errors(&response.diagnostics) {
                        request.prior_state
                    } else {
                        DynamicValue::null()
                    };
                    ApplyResourceChangeResponse {
                        new_state,
                        diagnostics: response.diagnostics,
                    }
                }
                _ => {
                    let response = resource
                        .update(
                            ctx,
                            UpdateResourceRequest {
                                type_name: request.type_name,
                                prior_state: request.prior_state,
                                planned_state: request.planned_state,
                                config: request.config,
                            },
                        )
                        .await;
                    check_applied_state(response.new_state, response.diagnostics)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Refreshes state; `new_state` is None when the remote object is gone
    pub async fn read_resource(
        &self,
        type_name: &str,
        current_state: DynamicValue,
    ) -> ReadResourceResponse {
        let ctx = Context::new();
        let span = tracing::info_span!(
            "read_resource",
            resource = %type_name,
            request_id = %ctx.request_id()
        );
        async move {
            let resource = match self.configured_resource(&ctx, type_name).await {
                Ok(resource) => resource,
                Err(diagnostics) => {
                    return ReadResourceResponse {
                        new_state: Some(current_state),
                        diagnostics,
                    }
                }
            };
            let response = resource
                .read(
                    ctx,
                    ReadResourceRequest {
                        type_name: type_name.to_string(),
                        current_state,
                    },
                )
                .await;
            if response.new_state.is_none() && !has_errors(&response.diagnostics) {
                tracing::warn!("{} no longer exists, removing from state", type_name);
            }
            response
        }
        .instrument(span)
        .await
    }

    pub async fn import_resource_state(&self, type_name: &str, id: &str) -> ImportResourceStateResponse {
        let ctx = Context::new();
        let span = tracing::info_span!(
            "import_resource_state",
            resource = %type_name,
            request_id = %ctx.request_id()
        );
        async move {
            let resource = match self.configured_resource(&ctx, type_name).await {
                Ok(resource) => resource,
                Err(diagnostics) => {
                    return ImportResourceStateResponse {
                        imported_resources: vec![],
                        diagnostics,
                    }
                }
            };
            match resource.as_importable() {
                Some(importable) => {
                    importable
                        .import_state(
                            ctx,
                            ImportResourceStateRequest {
                                type_name: type_name.to_string(),
                                id: id.to_string(),
                            },
                        )
                        .await
                }
                None => ImportResourceStateResponse {
                    imported_resources: vec![],
                    diagnostics: vec![Diagnostic::error(
                        "Resource Import Not Implemented",
                        format!("{} does not support import", type_name),
                    )],
                },
            }
        }
        .instrument(span)
        .await
    }

    pub async fn read_data_source(&self, type_name: &str, config: DynamicValue) -> ReadDataSourceResponse {
        let ctx = Context::new();
        let span = tracing::info_span!(
            "read_data_source",
            data_source = %type_name,
            request_id = %ctx.request_id()
        );
        async move {
            let data_source = match self.configured_data_source(&ctx, type_name).await {
                Ok(data_source) => data_source,
                Err(diagnostics) => {
                    return ReadDataSourceResponse {
                        state: DynamicValue::null(),
                        diagnostics,
                    }
                }
            };
            data_source
                .read(
                    ctx,
                    ReadDataSourceRequest {
                        type_name: type_name.to_string(),
                        config,
                    },
                )
                .await
        }
        .instrument(span)
        .await
    }

    pub async fn stop_provider(&self) -> Option<String> {
        let provider = self.provider.read().await;
        provider.stop(Context::new(), StopProviderRequest).await.error
    }

    async fn configured_resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> std::result::Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self
            .resources
            .get(type_name)
            .ok_or_else(|| vec![unknown_type("resource", type_name)])?;
        let mut resource = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx.clone(), ConfigureResourceRequest { provider_data })
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn configured_data_source(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> std::result::Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self
            .data_sources
            .get(type_name)
            .ok_or_else(|| vec![unknown_type("data source", type_name)])?;
        let mut data_source = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }
}

fn check_applied_state(
    new_state: DynamicValue,
    mut diagnostics: Vec<Diagnostic>,
) -> ApplyResourceChangeResponse {
    if !has_errors(&diagnostics) && new_state.value.contains_unknown() {
        diagnostics.push(Diagnostic::error(
            "Provider returned invalid result object after apply",
            "After the apply operation, the provider still indicated an unknown value",
        ));
    }
    ApplyResourceChangeResponse {
        new_state,
        diagnostics,
    }
}

fn unknown_type(kind: &str, type_name: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Unknown {} type", kind),
        format!("The provider does not support {} {}", kind, type_name),
    )
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{}: {}", d.summary, d.detail))
        .collect::<Vec<_>>()
        .join("; ")
}
