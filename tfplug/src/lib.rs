//! tfplug - Terraform Plugin Framework for Rust
//!
//! Typed schemas, lifecycle traits and an in-process server that applies the
//! framework behaviour (validation, defaults, planning) around provider code.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod codec;
pub mod defaults;
pub mod import;
pub mod validator;

pub mod server;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::{import_state_passthrough_id, split_import_id};
pub use provider::{Provider, ProviderMetadataRequest, ProviderMetadataResponse};
pub use resource::{Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
pub use server::{ProviderSchemas, ProviderServer};
pub use types::{Diagnostic, Dynamic, DynamicValue};
