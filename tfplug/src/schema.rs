//! Schema types and builders for tfplug
//!
//! A schema is a typed description of every attribute and nested block a
//! provider, resource or data source accepts. Schemas are checked once when
//! the provider server is built (`Schema::validate_definition`) and then drive
//! config validation, defaults, replacement planning and the `codec`
//! flatten/expand conversions.

use crate::error::{Result, TfplugError};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    /// Checks that a value has this type; null and unknown always conform
    pub fn conforms(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Number, Dynamic::Number(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::List(elem), Dynamic::List(items))
            | (AttributeType::Set(elem), Dynamic::List(items)) => {
                items.iter().all(|item| elem.conforms(item))
            }
            (AttributeType::Map(elem), Dynamic::Map(entries)) => {
                entries.values().all(|v| elem.conforms(v))
            }
            (AttributeType::Object(fields), Dynamic::Map(entries)) => {
                entries.iter().all(|(k, v)| match fields.get(k) {
                    Some(field_type) => field_type.conforms(v),
                    None => false,
                })
            }
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttributeType::String => "string".to_string(),
            AttributeType::Number => "number".to_string(),
            AttributeType::Bool => "bool".to_string(),
            AttributeType::List(elem) => format!("list({})", elem.describe()),
            AttributeType::Set(elem) => format!("set({})", elem.describe()),
            AttributeType::Map(elem) => format!("map({})", elem.describe()),
            AttributeType::Object(_) => "object".to_string(),
        }
    }
}

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    /// Registration-time checks; an invalid schema is a programming error
    pub fn validate_definition(&self, owner: &str) -> Result<()> {
        self.block
            .validate_definition(&AttributePath::root())
            .map_err(|message| TfplugError::invalid_schema(owner, message))
    }

    /// Checks a configuration against the declared attributes
    pub fn validate_config(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.block
            .validate_config(&config.value, &AttributePath::root(), &mut diagnostics);
        diagnostics
    }

    /// Fills absent optional attributes that declare a default
    pub fn apply_defaults(&self, value: &mut DynamicValue) {
        if value.is_null() {
            value.value = Dynamic::Map(HashMap::new());
        }
        self.block.apply_defaults(&mut value.value);
    }

    /// Top level force_new attributes whose planned value differs from prior
    pub fn requires_replace(&self, prior: &DynamicValue, planned: &DynamicValue) -> Vec<AttributePath> {
        if prior.is_null() || planned.is_null() {
            return Vec::new();
        }
        self.block
            .attributes
            .iter()
            .filter(|attr| attr.force_new)
            .filter(|attr| prior.value.get(&attr.name) != planned.value.get(&attr.name))
            .map(|attr| AttributePath::new(&attr.name))
            .collect()
    }

    /// Computed values absent from config become unknown in the plan
    pub fn mark_computed_unknown(&self, config: &DynamicValue, planned: &mut DynamicValue) {
        let Dynamic::Map(planned_map) = &mut planned.value else {
            return;
        };
        for attr in self.block.attributes.iter().filter(|a| a.computed) {
            if config.value.get(&attr.name).is_null()
                && planned_map.get(&attr.name).map_or(true, Dynamic::is_null)
            {
                planned_map.insert(attr.name.clone(), Dynamic::Unknown);
            }
        }
        for nested in self.block.block_types.iter().filter(|b| b.computed) {
            planned_map.insert(nested.type_name.clone(), Dynamic::Unknown);
        }
    }
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub deprecated: bool,
}

impl Block {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    fn validate_definition(&self, path: &AttributePath) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();
        let names = self
            .attributes
            .iter()
            .map(|a| a.name.as_str())
            .chain(self.block_types.iter().map(|b| b.type_name.as_str()));
        for name in names {
            if !is_valid_name(name) {
                return Err(format!("{} is not a valid attribute name", qualify(path, name)));
            }
            if !seen.insert(name) {
                return Err(format!("{} is declared more than once", qualify(path, name)));
            }
        }

        for attr in &self.attributes {
            let at = qualify(path, &attr.name);
            if !attr.required && !attr.optional && !attr.computed {
                return Err(format!("{} must be required, optional or computed", at));
            }
            if attr.required && (attr.optional || attr.computed) {
                return Err(format!("{} cannot be required together with optional or computed", at));
            }
            if attr.required && attr.default.is_some() {
                return Err(format!("{} is required and cannot declare a default", at));
            }
            let configurable = attr.required || attr.optional;
            if !configurable && (attr.default.is_some() || !attr.validators.is_empty()) {
                return Err(format!("{} is computed only and cannot declare defaults or validators", at));
            }
            if !configurable && attr.force_new {
                return Err(format!("{} is computed only and cannot force replacement", at));
            }
            for other in &attr.conflicts_with {
                if other == &attr.name || self.attribute(other).is_none() {
                    return Err(format!("{} conflicts with unknown attribute {}", at, other));
                }
                if attr.required {
                    return Err(format!("{} is required and cannot conflict with {}", at, other));
                }
            }
        }

        for nested in &self.block_types {
            let at = qualify(path, &nested.type_name);
            if nested.max_items > 0 && nested.min_items > nested.max_items {
                return Err(format!("{} has min_items greater than max_items", at));
            }
            if nested.nesting == NestingMode::Single && nested.max_items > 1 {
                return Err(format!("{} is a single block but allows more than one item", at));
            }
            nested
                .block
                .validate_definition(&path.clone().attribute(&nested.type_name))?;
        }

        Ok(())
    }

    fn validate_config(&self, value: &Dynamic, path: &AttributePath, diags: &mut Vec<Diagnostic>) {
        let empty = HashMap::new();
        let map = match value {
            Dynamic::Unknown => return,
            Dynamic::Null => &empty,
            Dynamic::Map(m) => m,
            other => {
                diags.push(
                    Diagnostic::error(
                        "Invalid configuration block",
                        format!("Expected an object, got {}", other.type_name()),
                    )
                    .with_attribute(path.clone()),
                );
                return;
            }
        };

        for attr in &self.attributes {
            let attr_path = path.clone().attribute(&attr.name);
            let attr_value = map.get(&attr.name).unwrap_or(&Dynamic::Null);

            if attr.required && attr_value.is_null() {
                diags.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{}\" is required, but no definition was found.", attr_path),
                    )
                    .with_attribute(attr_path),
                );
                continue;
            }

            if !attr_value.is_known_value() {
                continue;
            }

            if attr.computed && !attr.optional {
                diags.push(
                    Diagnostic::error(
                        "Value for unconfigurable attribute",
                        format!("Can't configure a value for \"{}\": its value will be decided automatically.", attr_path),
                    )
                    .with_attribute(attr_path),
                );
                continue;
            }

            if !attr.r#type.conforms(attr_value) {
                diags.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!(
                            "Inappropriate value for attribute \"{}\": {} required, got {}.",
                            attr_path,
                            attr.r#type.describe(),
                            attr_value.type_name()
                        ),
                    )
                    .with_attribute(attr_path),
                );
                continue;
            }

            for other in &attr.conflicts_with {
                if map.get(other).is_some_and(Dynamic::is_known_value) {
                    diags.push(
                        Diagnostic::error(
                            "Conflicting configuration arguments",
                            format!("\"{}\": conflicts with {}", attr_path, other),
                        )
                        .with_attribute(attr_path.clone()),
                    );
                }
            }

            for validator in &attr.validators {
                let response = validator.validate(ValidatorRequest {
                    config_value: DynamicValue::new(attr_value.clone()),
                    path: attr_path.clone(),
                });
                diags.extend(response.diagnostics);
            }
        }

        for nested in self.block_types.iter().filter(|b| !b.computed) {
            let block_path = path.clone().attribute(&nested.type_name);
            let items: Vec<&Dynamic> = match map.get(&nested.type_name).unwrap_or(&Dynamic::Null) {
                Dynamic::Null => Vec::new(),
                Dynamic::Unknown => continue,
                Dynamic::List(items) => items.iter().collect(),
                single @ Dynamic::Map(_) if nested.nesting == NestingMode::Single => vec![single],
                other => {
                    diags.push(
                        Diagnostic::error(
                            "Invalid configuration block",
                            format!("Expected a list of blocks, got {}", other.type_name()),
                        )
                        .with_attribute(block_path),
                    );
                    continue;
                }
            };

            let count = items.len() as i64;
            if count < nested.min_items {
                diags.push(
                    Diagnostic::error(
                        "Insufficient blocks",
                        format!("At least {} \"{}\" blocks are required.", nested.min_items, nested.type_name),
                    )
                    .with_attribute(block_path.clone()),
                );
            }
            if nested.max_items > 0 && count > nested.max_items {
                diags.push(
                    Diagnostic::error(
                        "Too many blocks",
                        format!("No more than {} \"{}\" blocks are allowed.", nested.max_items, nested.type_name),
                    )
                    .with_attribute(block_path.clone()),
                );
            }
            for (idx, item) in items.into_iter().enumerate() {
                nested
                    .block
                    .validate_config(item, &block_path.clone().index(idx as i64), diags);
            }
        }

        for key in map.keys() {
            if self.attribute(key).is_none() && self.nested_block(key).is_none() {
                diags.push(
                    Diagnostic::error(
                        "Unsupported argument",
                        format!("An argument named \"{}\" is not expected here.", key),
                    )
                    .with_attribute(path.clone().attribute(key)),
                );
            }
        }
    }

    fn apply_defaults(&self, value: &mut Dynamic) {
        let Dynamic::Map(map) = value else {
            return;
        };
        for attr in &self.attributes {
            let Some(default) = &attr.default else {
                continue;
            };
            if map.get(&attr.name).map_or(true, Dynamic::is_null) {
                let response = default.default_value(DefaultRequest {
                    path: AttributePath::new(&attr.name),
                });
                if !response.value.is_null() {
                    map.insert(attr.name.clone(), response.value.value);
                }
            }
        }
        for nested in &self.block_types {
            if let Some(Dynamic::List(items)) = map.get_mut(&nested.type_name) {
                for item in items.iter_mut() {
                    nested.block.apply_defaults(item);
                }
            }
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn qualify(path: &AttributePath, name: &str) -> String {
    if path.steps.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing the value destroys and recreates the remote object
    pub force_new: bool,
    pub deprecated: bool,
    pub conflicts_with: Vec<String>,
    pub validators: Vec<Arc<dyn Validator>>,
    pub default: Option<Arc<dyn Default>>,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("force_new", &self.force_new)
            .field("conflicts_with", &self.conflicts_with)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field("default", &self.default.as_ref().map(|d| d.description()))
            .finish()
    }
}

/// NestedBlock represents a nested configuration block
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
    /// Output only, never read from configuration
    pub computed: bool,
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Single,
    List,
    Set,
}

/// Validator performs validation on attribute values during planning
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: DynamicValue,
    pub path: AttributePath,
}

pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Default provides default values for optional attributes
/// Called when attribute is not set in configuration
pub trait Default: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: DynamicValue,
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                force_new: false,
                deprecated: false,
                conflicts_with: Vec::new(),
                validators: Vec::new(),
                default: None,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    /// Any change to this attribute replaces the resource
    pub fn force_new(mut self) -> Self {
        self.attribute.force_new = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn conflicts_with(mut self, names: &[&str]) -> Self {
        self.attribute
            .conflicts_with
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(Arc::from(validator));
        self
    }

    pub fn default(mut self, default: Box<dyn Default>) -> Self {
        self.attribute.default = Some(Arc::from(default));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// Builder for nested blocks. `max_items(1)` models a single reference object
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str, nesting: NestingMode) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: empty_block(),
                nesting,
                min_items: 0,
                max_items: 0,
                computed: false,
            },
        }
    }

    /// Output only list block
    pub fn computed_list(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::List).computed()
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.nested.block.block_types.push(block);
        self
    }

    pub fn min_items(mut self, min: i64) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    pub fn computed(mut self) -> Self {
        self.nested.computed = true;
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

fn empty_block() -> Block {
    Block {
        version: 0,
        attributes: Vec::new(),
        block_types: Vec::new(),
        description: String::new(),
        deprecated: false,
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: empty_block(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;

    fn subnet_like_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("zone", AttributeType::String)
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ipv4_cidr_block", AttributeType::String)
                    .optional()
                    .computed()
                    .force_new()
                    .conflicts_with(&["total_ipv4_address_count"])
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("total_ipv4_address_count", AttributeType::Number)
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ip_version", AttributeType::String)
                    .optional()
                    .default(StaticDefault::string("ipv4"))
                    .build(),
            )
            .block(
                NestedBlockBuilder::computed_list("vpc")
                    .max_items(1)
                    .attribute(
                        AttributeBuilder::new("id", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the resource")
            .required()
            .build();

        assert_eq!(attr.name, "name");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.description, "The name of the resource");
    }

    #[test]
    fn valid_schema_passes_definition_checks() {
        assert!(subnet_like_schema().validate_definition("ibm_is_subnet").is_ok());
    }

    #[test]
    fn definition_rejects_duplicate_names() {
        let schema = SchemaBuilder::new()
            .attribute(AttributeBuilder::new("name", AttributeType::String).required().build())
            .attribute(AttributeBuilder::new("name", AttributeType::String).optional().build())
            .build();

        let err = schema.validate_definition("dup").unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn definition_rejects_required_computed() {
        let schema = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .computed()
                    .build(),
            )
            .build();

        assert!(schema.validate_definition("bad").is_err());
    }

    #[test]
    fn definition_rejects_attribute_without_mode() {
        let schema = SchemaBuilder::new()
            .attribute(AttributeBuilder::new("name", AttributeType::String).build())
            .build();

        assert!(schema.validate_definition("bad").is_err());
    }

    #[test]
    fn definition_rejects_invalid_names_and_dangling_conflicts() {
        let bad_name = SchemaBuilder::new()
            .attribute(AttributeBuilder::new("Name", AttributeType::String).optional().build())
            .build();
        assert!(bad_name.validate_definition("bad").is_err());

        let dangling = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("a", AttributeType::String)
                    .optional()
                    .conflicts_with(&["b"])
                    .build(),
            )
            .build();
        assert!(dangling.validate_definition("bad").is_err());
    }

    #[test]
    fn config_validation_reports_missing_and_conflicts() {
        let schema = subnet_like_schema();
        let config = DynamicValue::object([
            ("ipv4_cidr_block", Dynamic::from("10.240.0.0/24")),
            ("total_ipv4_address_count", Dynamic::Number(256.0)),
            ("zone", Dynamic::from("us-south-1")),
        ]);

        let diags = schema.validate_config(&config);
        assert!(diags.iter().any(|d| d.summary == "Missing required argument"));
        assert!(diags
            .iter()
            .any(|d| d.summary == "Conflicting configuration arguments"));
    }

    #[test]
    fn config_validation_rejects_wrong_types_and_unknown_keys() {
        let schema = subnet_like_schema();
        let config = DynamicValue::object([
            ("name", Dynamic::Number(1.0)),
            ("zone", Dynamic::from("us-south-1")),
            ("bogus", Dynamic::from("x")),
        ]);

        let diags = schema.validate_config(&config);
        assert!(diags
            .iter()
            .any(|d| d.summary == "Incorrect attribute value type"));
        assert!(diags.iter().any(|d| d.summary == "Unsupported argument"));
    }

    #[test]
    fn unknown_values_count_as_present() {
        let schema = subnet_like_schema();
        let config = DynamicValue::object([
            ("name", Dynamic::Unknown),
            ("zone", Dynamic::from("us-south-1")),
        ]);

        assert!(schema.validate_config(&config).is_empty());
    }

    #[test]
    fn defaults_fill_absent_values_only() {
        let schema = subnet_like_schema();
        let mut value = DynamicValue::object([("name", Dynamic::from("a"))]);
        schema.apply_defaults(&mut value);
        assert_eq!(value.value.get("ip_version"), &Dynamic::from("ipv4"));

        let mut explicit = DynamicValue::object([("ip_version", Dynamic::from("ipv6"))]);
        schema.apply_defaults(&mut explicit);
        assert_eq!(explicit.value.get("ip_version"), &Dynamic::from("ipv6"));
    }

    #[test]
    fn requires_replace_only_for_changed_force_new() {
        let schema = subnet_like_schema();
        let prior = DynamicValue::object([
            ("name", Dynamic::from("a")),
            ("zone", Dynamic::from("us-south-1")),
        ]);
        let renamed = DynamicValue::object([
            ("name", Dynamic::from("b")),
            ("zone", Dynamic::from("us-south-1")),
        ]);
        let moved = DynamicValue::object([
            ("name", Dynamic::from("a")),
            ("zone", Dynamic::from("us-south-2")),
        ]);

        assert!(schema.requires_replace(&prior, &renamed).is_empty());
        assert_eq!(
            schema.requires_replace(&prior, &moved),
            vec![AttributePath::new("zone")]
        );
        assert!(schema.requires_replace(&DynamicValue::null(), &moved).is_empty());
    }

    #[test]
    fn computed_values_become_unknown() {
        let schema = subnet_like_schema();
        let config = DynamicValue::object([
            ("name", Dynamic::from("a")),
            ("zone", Dynamic::from("us-south-1")),
            ("ipv4_cidr_block", Dynamic::from("10.0.0.0/24")),
        ]);
        let mut planned = config.clone();

        schema.mark_computed_unknown(&config, &mut planned);

        assert!(planned.value.get("id").is_unknown());
        assert!(planned.value.get("total_ipv4_address_count").is_unknown());
        assert!(planned.value.get("vpc").is_unknown());
        assert_eq!(
            planned.value.get("ipv4_cidr_block"),
            &Dynamic::from("10.0.0.0/24")
        );
    }
}
