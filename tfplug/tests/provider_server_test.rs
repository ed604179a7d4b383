#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tfplug::data_source::*;
use tfplug::defaults::StaticDefault;
use tfplug::provider::*;
use tfplug::resource::*;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::server::{ApplyResourceChangeRequest, PlanResourceChangeRequest, ProviderServer};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue, ServerCapabilities};
use tfplug::{Context, TfplugError};

struct Backend {
    created: AtomicUsize,
    gone: bool,
}

struct WidgetProvider {
    backend: Option<Arc<Backend>>,
    gone: bool,
}

#[async_trait]
impl Provider for WidgetProvider {
    fn type_name(&self) -> &str {
        "widget"
    }

    async fn metadata(&self, _ctx: Context, _request: ProviderMetadataRequest) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "widget".to_string(),
            server_capabilities: ServerCapabilities::default(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("region", AttributeType::String)
                        .optional()
                        .default(StaticDefault::string("us-south"))
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn validate(&self, _ctx: Context, _request: ValidateProviderConfigRequest) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse { diagnostics: vec![] }
    }

    async fn configure(&mut self, _ctx: Context, request: ConfigureProviderRequest) -> ConfigureProviderResponse {
        let region = request.config.get_string(&AttributePath::new("region")).unwrap();
        assert_eq!(region, "us-south");
        let backend = Arc::new(Backend {
            created: AtomicUsize::new(0),
            gone: self.gone,
        });
        self.backend = Some(backend.clone());
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(backend as Arc<dyn Any + Send + Sync>),
        }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            "widget_thing".to_string(),
            Box::new(|| Box::new(Thing { backend: None }) as Box<dyn ResourceWithConfigure>),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            "widget_lookup".to_string(),
            Box::new(|| Box::new(Lookup) as Box<dyn DataSourceWithConfigure>),
        );
        data_sources
    }
}

fn thing_schema() -> Schema {
    SchemaBuilder::new()
        .attribute(AttributeBuilder::new("id", AttributeType::String).computed().build())
        .attribute(AttributeBuilder::new("name", AttributeType::String).required().build())
        .attribute(
            AttributeBuilder::new("zone", AttributeType::String)
                .required()
                .force_new()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ip_version", AttributeType::String)
                .optional()
                .default(StaticDefault::string("ipv4"))
                .build(),
        )
        .attribute(AttributeBuilder::new("status", AttributeType::String).computed().build())
        .build()
}

struct Thing {
    backend: Option<Arc<Backend>>,
}

#[async_trait]
impl Resource for Thing {
    fn type_name(&self) -> &str {
        "widget_thing"
    }

    async fn metadata(&self, _ctx: Context, _request: ResourceMetadataRequest) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: "widget_thing".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: thing_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(&self, _ctx: Context, request: ValidateResourceConfigRequest) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];
        if request.config.get_optional_string(&AttributePath::new("name")).as_deref() == Some("forbidden") {
            diagnostics.push(Diagnostic::error("Invalid name", "forbidden is reserved"));
        }
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let backend = self.backend.as_ref().unwrap();
        let n = backend.created.fetch_add(1, Ordering::SeqCst);
        let mut state = request.planned_state;
        state.set_string(&AttributePath::new("id"), format!("thing-{}", n)).unwrap();
        state.set_string(&AttributePath::new("status"), "available".to_string()).unwrap();
        CreateResourceResponse {
            new_state: state,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let gone = self.backend.as_ref().unwrap().gone;
        ReadResourceResponse {
            new_state: if gone { None } else { Some(request.current_state) },
            diagnostics: vec![],
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        // leaves unknowns in place to exercise the apply check
        UpdateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse { diagnostics: vec![] }
    }
}

#[async_trait]
impl ResourceWithConfigure for Thing {
    async fn configure(&mut self, _ctx: Context, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match request.provider_data.and_then(|d| d.downcast::<Backend>().ok()) {
            Some(backend) => self.backend = Some(backend),
            None => diagnostics.push(Diagnostic::error("No provider data", "provider is not configured")),
        }
        ConfigureResourceResponse { diagnostics }
    }
}

struct Lookup;

#[async_trait]
impl DataSource for Lookup {
    fn type_name(&self) -> &str {
        "widget_lookup"
    }

    async fn metadata(&self, _ctx: Context, _request: DataSourceMetadataRequest) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: "widget_lookup".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: DataSourceSchemaRequest) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(AttributeBuilder::new("name", AttributeType::String).required().build())
                .attribute(AttributeBuilder::new("id", AttributeType::String).computed().build())
                .build(),
            diagnostics: vec![],
        }
    }

    async fn validate(&self, _ctx: Context, _request: ValidateDataSourceConfigRequest) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse { diagnostics: vec![] }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let name = request.config.get_string(&AttributePath::new("name")).unwrap();
        ReadDataSourceResponse {
            state: DynamicValue::object([
                ("name", Dynamic::from(name.as_str())),
                ("id", Dynamic::from(format!("id-{}", name))),
            ]),
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for Lookup {
    async fn configure(&mut self, _ctx: Context, _request: ConfigureDataSourceRequest) -> ConfigureDataSourceResponse {
        ConfigureDataSourceResponse { diagnostics: vec![] }
    }
}

async fn configured_server(gone: bool) -> ProviderServer<WidgetProvider> {
    let server = ProviderServer::new(WidgetProvider { backend: None, gone }).await.unwrap();
    let diags = server.configure_provider("1.9.0", DynamicValue::null()).await;
    assert!(diags.is_empty(), "{:?}", diags);
    server
}

fn thing_config(name: &str, zone: &str) -> DynamicValue {
    DynamicValue::object([
        ("name", Dynamic::from(name)),
        ("zone", Dynamic::from(zone)),
    ])
}

#[tokio::test]
async fn schemas_are_collected_on_startup() {
    let server = configured_server(false).await;
    let schemas = server.get_provider_schema();
    assert!(schemas.resources.contains_key("widget_thing"));
    assert!(schemas.data_sources.contains_key("widget_lookup"));
    assert!(schemas.provider.block.attribute("region").is_some());
}

#[tokio::test]
async fn invalid_schema_is_rejected_at_startup() {
    struct BadProvider;

    #[async_trait]
    impl Provider for BadProvider {
        fn type_name(&self) -> &str {
            "bad"
        }
        async fn metadata(&self, _ctx: Context, _r: ProviderMetadataRequest) -> ProviderMetadataResponse {
            ProviderMetadataResponse {
                type_name: "bad".to_string(),
                server_capabilities: ServerCapabilities::default(),
            }
        }
        async fn schema(&self, _ctx: Context, _r: ProviderSchemaRequest) -> ProviderSchemaResponse {
            ProviderSchemaResponse {
                schema: SchemaBuilder::new()
                    .attribute(
                        AttributeBuilder::new("token", AttributeType::String)
                            .required()
                            .computed()
                            .build(),
                    )
                    .build(),
                diagnostics: vec![],
            }
        }
        async fn validate(&self, _ctx: Context, _r: ValidateProviderConfigRequest) -> ValidateProviderConfigResponse {
            ValidateProviderConfigResponse { diagnostics: vec![] }
        }
        async fn configure(&mut self, _ctx: Context, _r: ConfigureProviderRequest) -> ConfigureProviderResponse {
            ConfigureProviderResponse {
                diagnostics: vec![],
                provider_data: None,
            }
        }
        async fn stop(&self, _ctx: Context, _r: StopProviderRequest) -> StopProviderResponse {
            StopProviderResponse { error: None }
        }
        fn resources(&self) -> HashMap<String, ResourceFactory> {
            HashMap::new()
        }
        fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
            HashMap::new()
        }
    }

    let result = ProviderServer::new(BadProvider).await;
    assert!(matches!(result, Err(TfplugError::InvalidSchema { .. })));
}

#[tokio::test]
async fn validate_runs_schema_then_resource_checks() {
    let server = configured_server(false).await;

    let missing = server
        .validate_resource_config("widget_thing", DynamicValue::object([("name", Dynamic::from("a"))]))
        .await;
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].summary, "Missing required argument");

    let reserved = server
        .validate_resource_config("widget_thing", thing_config("forbidden", "us-south-1"))
        .await;
    assert_eq!(reserved[0].summary, "Invalid name");

    let unknown = server.validate_resource_config("widget_other", DynamicValue::null()).await;
    assert_eq!(unknown[0].summary, "Unknown resource type");
}

#[tokio::test]
async fn plan_create_applies_defaults_and_marks_computed_unknown() {
    let server = configured_server(false).await;
    let config = thing_config("a", "us-south-1");

    let plan = server
        .plan_resource_change(PlanResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: DynamicValue::null(),
            proposed_new_state: config.clone(),
            config,
        })
        .await;

    assert!(plan.diagnostics.is_empty());
    let planned = &plan.planned_state;
    assert_eq!(planned.get_string(&AttributePath::new("ip_version")).unwrap(), "ipv4");
    assert_eq!(planned.get(&AttributePath::new("id")), Some(&Dynamic::Unknown));
    assert_eq!(planned.get(&AttributePath::new("status")), Some(&Dynamic::Unknown));
}

#[tokio::test]
async fn plan_update_flags_force_new_attributes() {
    let server = configured_server(false).await;
    let mut prior = thing_config("a", "us-south-1");
    prior.set_string(&AttributePath::new("id"), "thing-0".to_string()).unwrap();
    prior.set_string(&AttributePath::new("status"), "available".to_string()).unwrap();
    prior.set_string(&AttributePath::new("ip_version"), "ipv4".to_string()).unwrap();

    let mut proposed = prior.clone();
    proposed.set_string(&AttributePath::new("name"), "b".to_string()).unwrap();
    let rename = server
        .plan_resource_change(PlanResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: prior.clone(),
            proposed_new_state: proposed,
            config: thing_config("b", "us-south-1"),
        })
        .await;
    assert!(rename.requires_replace.is_empty());
    assert_eq!(rename.planned_state.get_string(&AttributePath::new("id")).unwrap(), "thing-0");

    let mut proposed = prior.clone();
    proposed.set_string(&AttributePath::new("zone"), "us-south-2".to_string()).unwrap();
    let move_zone = server
        .plan_resource_change(PlanResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: prior,
            proposed_new_state: proposed,
            config: thing_config("a", "us-south-2"),
        })
        .await;
    assert_eq!(move_zone.requires_replace, vec![AttributePath::new("zone")]);
    assert_eq!(move_zone.planned_state.get(&AttributePath::new("id")), Some(&Dynamic::Unknown));
}

#[tokio::test]
async fn plan_destroy_yields_null() {
    let server = configured_server(false).await;
    let plan = server
        .plan_resource_change(PlanResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: thing_config("a", "us-south-1"),
            proposed_new_state: DynamicValue::null(),
            config: DynamicValue::null(),
        })
        .await;
    assert!(plan.planned_state.is_null());
}

#[tokio::test]
async fn apply_dispatches_on_prior_and_planned_state() {
    let server = configured_server(false).await;
    let config = thing_config("a", "us-south-1");
    let plan = server
        .plan_resource_change(PlanResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: DynamicValue::null(),
            proposed_new_state: config.clone(),
            config: config.clone(),
        })
        .await;

    let created = server
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: DynamicValue::null(),
            planned_state: plan.planned_state.clone(),
            config: config.clone(),
        })
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    assert_eq!(created.new_state.get_string(&AttributePath::new("id")).unwrap(), "thing-0");

    let deleted = server
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: created.new_state,
            planned_state: DynamicValue::null(),
            config: DynamicValue::null(),
        })
        .await;
    assert!(deleted.diagnostics.is_empty());
    assert!(deleted.new_state.is_null());
}

#[tokio::test]
async fn apply_rejects_state_with_unknowns() {
    let server = configured_server(false).await;
    let prior = thing_config("a", "us-south-1");
    let mut planned = prior.clone();
    planned.mark_unknown(&AttributePath::new("status")).unwrap();

    let response = server
        .apply_resource_change(ApplyResourceChangeRequest {
            type_name: "widget_thing".to_string(),
            prior_state: prior,
            planned_state: planned,
            config: thing_config("a", "us-south-1"),
        })
        .await;
    assert_eq!(
        response.diagnostics[0].summary,
        "Provider returned invalid result object after apply"
    );
}

#[tokio::test]
async fn read_of_missing_object_clears_state() {
    let server = configured_server(true).await;
    let response = server
        .read_resource("widget_thing", thing_config("a", "us-south-1"))
        .await;
    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn import_without_support_reports_diagnostic() {
    let server = configured_server(false).await;
    let response = server.import_resource_state("widget_thing", "thing-0").await;
    assert!(response.imported_resources.is_empty());
    assert_eq!(response.diagnostics[0].summary, "Resource Import Not Implemented");
}

#[tokio::test]
async fn data_source_read_and_stop() {
    let server = configured_server(false).await;
    let response = server
        .read_data_source("widget_lookup", DynamicValue::object([("name", Dynamic::from("x"))]))
        .await;
    assert_eq!(response.state.get_string(&AttributePath::new("id")).unwrap(), "id-x");
    assert!(server.stop_provider().await.is_none());
}

#[tokio::test]
async fn operations_before_configure_fail_in_resource_configure() {
    let server = ProviderServer::new(WidgetProvider { backend: None, gone: false })
        .await
        .unwrap();
    let response = server.read_resource("widget_thing", thing_config("a", "b")).await;
    assert_eq!(response.diagnostics[0].summary, "No provider data");
}
