//! Default value providers for attributes
//!
//! Defaults are evaluated during planning and provider configuration when an
//! optional attribute is absent or null in configuration.
//!
//! ```no_run
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//! use tfplug::defaults::{EnvDefault, StaticDefault};
//!
//! let ip_version = AttributeBuilder::new("ip_version", AttributeType::String)
//!     .optional()
//!     .default(StaticDefault::string("ipv4"))
//!     .build();
//!
//! let region = AttributeBuilder::new("region", AttributeType::String)
//!     .optional()
//!     .default(EnvDefault::string(&["IC_REGION", "IBMCLOUD_REGION"], Some("us-south")))
//!     .build();
//! ```

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::{Dynamic, DynamicValue};
use std::env;

/// StaticDefault provides a static default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.value.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    String,
    Number,
}

/// EnvDefault reads the first non-empty variable out of a list
pub struct EnvDefault {
    env_vars: Vec<String>,
    kind: EnvKind,
    fallback: Dynamic,
}

impl EnvDefault {
    pub fn string(env_vars: &[&str], fallback: Option<&str>) -> Box<dyn Default> {
        Box::new(Self {
            env_vars: env_vars.iter().map(|v| v.to_string()).collect(),
            kind: EnvKind::String,
            fallback: fallback.map_or(Dynamic::Null, Dynamic::from),
        })
    }

    /// Variables that do not parse as a number are skipped
    pub fn number(env_vars: &[&str], fallback: Option<f64>) -> Box<dyn Default> {
        Box::new(Self {
            env_vars: env_vars.iter().map(|v| v.to_string()).collect(),
            kind: EnvKind::Number,
            fallback: fallback.map_or(Dynamic::Null, Dynamic::Number),
        })
    }

    fn lookup(&self) -> Option<Dynamic> {
        self.env_vars.iter().find_map(|var| {
            let raw = env::var(var).ok().filter(|v| !v.is_empty())?;
            match self.kind {
                EnvKind::String => Some(Dynamic::String(raw)),
                EnvKind::Number => match raw.trim().parse::<f64>() {
                    Ok(n) => Some(Dynamic::Number(n)),
                    Err(_) => {
                        tracing::warn!("ignoring non-numeric value of {}", var);
                        None
                    }
                },
            }
        })
    }
}

impl Default for EnvDefault {
    fn description(&self) -> String {
        format!(
            "default from environment variables {} (fallback: {:?})",
            self.env_vars.join(", "),
            self.fallback
        )
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.lookup().unwrap_or_else(|| self.fallback.clone())),
        }
    }
}
