//! Glue shared by every resource and data source
//!
//! `TfError` ties a failure to the Terraform type and lifecycle operation
//! it happened in, and renders it as a diagnostic. The schema helpers build
//! the read-only reference blocks that most VPC objects carry.

use crate::api::{ApiError, Client};
use crate::provider_data::IbmProviderData;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

pub const INITIALIZE_CLIENT: &str = "initialize-client";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Configure,
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Configure => "configure",
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TfError {
    pub resource: String,
    pub operation: Operation,
    pub discriminator: Option<String>,
    pub message: String,
}

impl TfError {
    pub fn new(resource: &str, operation: Operation, message: impl Into<String>) -> Self {
        Self {
            resource: resource.to_string(),
            operation,
            discriminator: None,
            message: message.into(),
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    /// A failed remote call, named after the API operation (`GetSubnet`)
    pub fn api(resource: &str, operation: Operation, api_operation: &str, err: &ApiError) -> Self {
        Self::new(resource, operation, format!("{} failed: {}", api_operation, err))
    }

    /// State could not be written; the discriminator names the field
    pub fn set_field(resource: &str, operation: Operation, field: &str, err: impl fmt::Display) -> Self {
        Self::new(resource, operation, format!("Error setting {}: {}", field, err))
            .with_discriminator(format!("set-{}", field))
    }

    pub fn diagnostic(&self) -> Diagnostic {
        let detail = match &self.discriminator {
            Some(discriminator) => format!(
                "{}\n\nResource: {}, operation: {}, discriminator: {}",
                self.message, self.resource, self.operation, discriminator
            ),
            None => format!(
                "{}\n\nResource: {}, operation: {}",
                self.message, self.resource, self.operation
            ),
        };
        Diagnostic::error(
            format!("Error during {} of {}", self.operation, self.resource),
            detail,
        )
    }
}

/// Name used in diagnostics raised by a data source
pub fn data_source_name(type_name: &str) -> String {
    format!("(Data) {}", type_name)
}

/// Races an API call against cancellation of the operation context
pub async fn call<T, F>(ctx: &Context, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match ctx.run(fut).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Cancelled),
    }
}

/// Extracts the provider data handed to configure
///
/// Absent data is not an error: Terraform may validate before the provider
/// is configured. Operations then fail through `client`.
pub fn provider_data(
    data: Option<Arc<dyn Any + Send + Sync>>,
    resource: &str,
) -> Result<Option<IbmProviderData>, TfError> {
    let Some(data) = data else {
        return Ok(None);
    };
    match data.downcast_ref::<IbmProviderData>() {
        Some(provider_data) => Ok(Some(provider_data.clone())),
        None => Err(TfError::new(
            resource,
            Operation::Configure,
            "Unexpected provider data, expected the IBM Cloud provider client",
        )
        .with_discriminator(INITIALIZE_CLIENT)),
    }
}

pub fn client<'a>(
    data: &'a Option<IbmProviderData>,
    resource: &str,
    operation: Operation,
) -> Result<&'a Client, TfError> {
    data.as_ref()
        .map(|d| d.client.as_ref())
        .ok_or_else(|| {
            TfError::new(
                resource,
                operation,
                "The provider has not been configured, no API client is available",
            )
            .with_discriminator(INITIALIZE_CLIENT)
        })
}

pub fn set_string(
    state: &mut DynamicValue,
    field: &str,
    value: String,
    resource: &str,
    operation: Operation,
) -> Result<(), TfError> {
    state
        .set_string(&AttributePath::new(field), value)
        .map_err(|e| TfError::set_field(resource, operation, field, e))
}

/// Carries lookup arguments from config into the flattened state
pub fn copy_inputs(
    state: &mut DynamicValue,
    config: &DynamicValue,
    fields: &[&str],
    resource: &str,
    operation: Operation,
) -> Result<(), TfError> {
    for field in fields {
        if let Some(value) = config.get_optional_string(&AttributePath::new(field)) {
            set_string(state, field, value, resource, operation)?;
        }
    }
    Ok(())
}

/// Lookup arguments where exactly one must be given
///
/// Unknown values skip the check; it runs again once they are known.
pub fn exactly_one_of(config: &DynamicValue, fields: &[&str]) -> Vec<Diagnostic> {
    let values: Vec<Option<&Dynamic>> = fields
        .iter()
        .map(|f| config.get(&AttributePath::new(f)))
        .collect();
    if values.iter().any(|v| v.is_some_and(Dynamic::is_unknown)) {
        return vec![];
    }
    let set = values
        .iter()
        .filter(|v| v.is_some_and(Dynamic::is_known_value))
        .count();
    if set == 1 {
        return vec![];
    }
    vec![Diagnostic::error(
        "Invalid lookup arguments",
        format!("Exactly one of {} must be set, found {}", fields.join(", "), set),
    )]
}

pub fn computed(name: &str, attr_type: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, attr_type)
        .description(description)
        .computed()
        .build()
}

/// Read-only reference to another VPC object
pub fn reference_block(name: &str, description: &str) -> NestedBlock {
    NestedBlockBuilder::computed_list(name)
        .description(description)
        .attribute(computed("id", AttributeType::String, "The unique identifier"))
        .attribute(computed("crn", AttributeType::String, "The CRN"))
        .attribute(computed("href", AttributeType::String, "The URL"))
        .attribute(computed("name", AttributeType::String, "The name"))
        .attribute(computed("resource_type", AttributeType::String, "The resource type"))
        .block(deleted_block())
        .build()
}

/// Reference to a reserved IP such as a primary IP
pub fn reserved_ip_block(name: &str, description: &str) -> NestedBlock {
    NestedBlockBuilder::computed_list(name)
        .description(description)
        .attribute(computed("address", AttributeType::String, "The IP address"))
        .attribute(computed("id", AttributeType::String, "The reserved IP identifier"))
        .attribute(computed("href", AttributeType::String, "The URL for this reserved IP"))
        .attribute(computed("name", AttributeType::String, "The name for this reserved IP"))
        .attribute(computed("resource_type", AttributeType::String, "The resource type"))
        .block(deleted_block())
        .build()
}

pub fn zone_block(name: &str) -> NestedBlock {
    NestedBlockBuilder::computed_list(name)
        .description("The zone")
        .attribute(computed("name", AttributeType::String, "The globally unique name for this zone"))
        .attribute(computed("href", AttributeType::String, "The URL for this zone"))
        .build()
}

pub fn resource_group_block() -> NestedBlock {
    NestedBlockBuilder::computed_list("resource_group")
        .description("The resource group")
        .attribute(computed("id", AttributeType::String, "The unique identifier for this resource group"))
        .attribute(computed("href", AttributeType::String, "The URL for this resource group"))
        .attribute(computed("name", AttributeType::String, "The name for this resource group"))
        .build()
}

pub fn ip_block(name: &str, description: &str) -> NestedBlock {
    NestedBlockBuilder::computed_list(name)
        .description(description)
        .attribute(computed("address", AttributeType::String, "The IP address"))
        .build()
}

fn deleted_block() -> NestedBlock {
    NestedBlockBuilder::computed_list("deleted")
        .description("Present when the referenced resource has been deleted")
        .attribute(computed("more_info", AttributeType::String, "Link to documentation about deleted resources"))
        .build()
}

/// Id of a reference, as stored in flat resource state
pub(crate) fn reference_id(reference: &Option<crate::api::common::ResourceReference>) -> Option<String> {
    reference.as_ref().and_then(|r| r.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn diagnostic_names_resource_and_operation() {
        let err = TfError::api(
            "ibm_is_subnet",
            Operation::Read,
            "GetSubnet",
            &ApiError::Api {
                status: 500,
                code: "internal_error".to_string(),
                message: "boom".to_string(),
                trace: None,
            },
        );
        let diag = err.diagnostic();
        assert_eq!(diag.summary, "Error during read of ibm_is_subnet");
        assert!(diag.detail.starts_with("GetSubnet failed:"));
        assert!(diag.detail.contains("boom"));
    }

    #[test]
    fn set_field_discriminator() {
        let err = TfError::set_field(&data_source_name("ibm_is_vpc"), Operation::Read, "name", "bad path");
        assert_eq!(err.discriminator.as_deref(), Some("set-name"));
        assert_eq!(err.resource, "(Data) ibm_is_vpc");
        assert!(err.diagnostic().detail.contains("discriminator: set-name"));
    }

    #[test]
    fn missing_client_is_initialize_client() {
        let err = client(&None, "ibm_is_subnet", Operation::Create).unwrap_err();
        assert_eq!(err.discriminator.as_deref(), Some(INITIALIZE_CLIENT));
    }

    #[test]
    fn provider_data_of_wrong_type_is_rejected() {
        assert!(provider_data(None, "ibm_is_subnet").unwrap().is_none());

        let wrong: Arc<dyn Any + Send + Sync> = Arc::new(42_u32);
        let err = provider_data(Some(wrong), "ibm_is_subnet").err().unwrap();
        assert_eq!(err.operation, Operation::Configure);
        assert_eq!(err.discriminator.as_deref(), Some(INITIALIZE_CLIENT));
    }

    #[test]
    fn lookup_needs_exactly_one_argument() {
        let fields = ["identifier", "name"];
        assert_eq!(exactly_one_of(&DynamicValue::null(), &fields).len(), 1);

        let by_name = DynamicValue::object([("name", Dynamic::from("main"))]);
        assert!(exactly_one_of(&by_name, &fields).is_empty());

        let both = DynamicValue::object([
            ("identifier", Dynamic::from("r006-1")),
            ("name", Dynamic::from("main")),
        ]);
        assert!(exactly_one_of(&both, &fields)[0].detail.contains("found 2"));

        let pending = DynamicValue::object([("identifier", Dynamic::Unknown)]);
        assert!(exactly_one_of(&pending, &fields).is_empty());
    }

    #[test]
    fn inputs_are_copied_when_set() {
        let mut state = DynamicValue::object([("id", Dynamic::from("r006-1"))]);
        let config = DynamicValue::object([("name", Dynamic::from("main"))]);
        copy_inputs(&mut state, &config, &["identifier", "name"], "ibm_is_vpc", Operation::Read).unwrap();
        assert_eq!(state.get_string(&AttributePath::new("name")).unwrap(), "main");
        assert!(state.get(&AttributePath::new("identifier")).is_none());
    }

    #[tokio::test]
    async fn cancelled_call_maps_to_api_error() {
        let ctx = Context::new();
        ctx.cancel();
        let result: Result<(), ApiError> = call(&ctx, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }
}
