//! Schema driven conversion between typed models and Terraform values
//!
//! `flatten` turns any `Serialize` model into a state value holding exactly
//! the keys declared by a schema block. `expand` goes the other way, turning
//! configuration into a `Deserialize` options struct while dropping null and
//! unknown values so that absent arguments stay `None`.

use crate::error::{Result, TfplugError};
use crate::schema::{AttributeType, Block, NestingMode};
use crate::types::{AttributePath, Dynamic, DynamicValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Converts a typed model into a state value shaped by `block`
///
/// Every declared attribute gets a key: absent scalars become null and absent
/// nested blocks an empty list. A single nested object becomes a list of one,
/// which is how `max_items = 1` blocks are stored. Undeclared fields are
/// dropped.
pub fn flatten<T: Serialize>(block: &Block, model: &T) -> Result<DynamicValue> {
    let json = serde_json::to_value(model)
        .map_err(|e| TfplugError::EncodingError(format!("failed to serialize model: {}", e)))?;
    Ok(DynamicValue::new(flatten_block(
        block,
        &json,
        &AttributePath::root(),
    )?))
}

/// Converts configuration into a typed options struct
pub fn expand<T: DeserializeOwned>(block: &Block, config: &DynamicValue) -> Result<T> {
    let json = expand_block(block, &config.value)?;
    serde_json::from_value(json)
        .map_err(|e| TfplugError::DecodingError(format!("failed to expand configuration: {}", e)))
}

fn flatten_block(block: &Block, json: &Value, path: &AttributePath) -> Result<Dynamic> {
    let empty = Map::new();
    let object = match json {
        Value::Null => &empty,
        Value::Object(obj) => obj,
        other => return Err(shape_error(path, "object", other)),
    };

    let mut out = HashMap::with_capacity(block.attributes.len() + block.block_types.len());

    for attr in &block.attributes {
        let attr_path = path.clone().attribute(&attr.name);
        let raw = object.get(&attr.name).unwrap_or(&Value::Null);
        out.insert(attr.name.clone(), flatten_value(&attr.r#type, raw, &attr_path)?);
    }

    for nested in &block.block_types {
        let block_path = path.clone().attribute(&nested.type_name);
        let raw = object.get(&nested.type_name).unwrap_or(&Value::Null);
        let value = match (nested.nesting, raw) {
            (NestingMode::Single, Value::Null) => Dynamic::Null,
            (NestingMode::Single, single) => flatten_block(&nested.block, single, &block_path)?,
            (_, Value::Null) => Dynamic::List(Vec::new()),
            (_, single @ Value::Object(_)) => Dynamic::List(vec![flatten_block(
                &nested.block,
                single,
                &block_path.clone().index(0),
            )?]),
            (_, Value::Array(items)) => Dynamic::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        flatten_block(&nested.block, item, &block_path.clone().index(idx as i64))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            (_, other) => return Err(shape_error(&block_path, "list of objects", other)),
        };
        out.insert(nested.type_name.clone(), value);
    }

    Ok(Dynamic::Map(out))
}

fn flatten_value(attr_type: &AttributeType, raw: &Value, path: &AttributePath) -> Result<Dynamic> {
    match (attr_type, raw) {
        (_, Value::Null) => Ok(Dynamic::Null),
        (AttributeType::String, Value::String(s)) => Ok(Dynamic::String(s.clone())),
        (AttributeType::Number, Value::Number(n)) => n
            .as_f64()
            .map(Dynamic::Number)
            .ok_or_else(|| shape_error(path, "number", raw)),
        (AttributeType::Bool, Value::Bool(b)) => Ok(Dynamic::Bool(*b)),
        (AttributeType::List(elem), Value::Array(items))
        | (AttributeType::Set(elem), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| flatten_value(elem, item, &path.clone().index(idx as i64)))
            .collect::<Result<Vec<_>>>()
            .map(Dynamic::List),
        (AttributeType::Map(elem), Value::Object(obj)) => obj
            .iter()
            .map(|(k, v)| Ok((k.clone(), flatten_value(elem, v, &path.clone().key(k))?)))
            .collect::<Result<HashMap<_, _>>>()
            .map(Dynamic::Map),
        (AttributeType::Object(fields), Value::Object(obj)) => fields
            .iter()
            .map(|(k, field_type)| {
                let v = obj.get(k).unwrap_or(&Value::Null);
                Ok((k.clone(), flatten_value(field_type, v, &path.clone().attribute(k))?))
            })
            .collect::<Result<HashMap<_, _>>>()
            .map(Dynamic::Map),
        (expected, other) => Err(shape_error(path, &expected.describe(), other)),
    }
}

fn shape_error(path: &AttributePath, expected: &str, got: &Value) -> TfplugError {
    let actual = match got {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    };
    TfplugError::InvalidState(format!(
        "attribute {}: expected {}, got {}",
        if path.steps.is_empty() {
            "<root>".to_string()
        } else {
            path.to_string()
        },
        expected,
        actual
    ))
}

fn expand_block(block: &Block, value: &Dynamic) -> Result<Value> {
    let empty = HashMap::new();
    let map = match value {
        Dynamic::Null | Dynamic::Unknown => &empty,
        Dynamic::Map(m) => m,
        other => {
            return Err(TfplugError::TypeMismatch {
                expected: "object".to_string(),
                actual: other.type_name().to_string(),
            })
        }
    };

    let mut out = Map::new();

    for attr in &block.attributes {
        match map.get(&attr.name) {
            Some(v) if v.is_known_value() => {
                out.insert(attr.name.clone(), expand_value(v)?);
            }
            _ => {}
        }
    }

    for nested in &block.block_types {
        let Some(raw) = map.get(&nested.type_name) else {
            continue;
        };
        let expanded = match raw {
            Dynamic::Null | Dynamic::Unknown => continue,
            Dynamic::Map(_) => expand_block(&nested.block, raw)?,
            Dynamic::List(items) if nested.nesting == NestingMode::Single || nested.max_items == 1 => {
                match items.first() {
                    Some(item) => expand_block(&nested.block, item)?,
                    None => continue,
                }
            }
            Dynamic::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| expand_block(&nested.block, item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            other => {
                return Err(TfplugError::TypeMismatch {
                    expected: "list of objects".to_string(),
                    actual: other.type_name().to_string(),
                })
            }
        };
        out.insert(nested.type_name.clone(), expanded);
    }

    Ok(Value::Object(out))
}

fn expand_value(value: &Dynamic) -> Result<Value> {
    Ok(match value {
        Dynamic::Null | Dynamic::Unknown => Value::Null,
        Dynamic::Bool(b) => Value::Bool(*b),
        Dynamic::Number(n) => number_to_json(*n)?,
        Dynamic::String(s) => Value::String(s.clone()),
        Dynamic::List(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_unknown())
                .map(expand_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        Dynamic::Map(entries) => Value::Object(
            entries
                .iter()
                .filter(|(_, v)| v.is_known_value())
                .map(|(k, v)| Ok((k.clone(), expand_value(v)?)))
                .collect::<Result<Map<_, _>>>()?,
        ),
    })
}

/// Integral numbers become JSON integers so integer fields deserialize
fn number_to_json(n: f64) -> Result<Value> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        return Ok(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| TfplugError::EncodingError(format!("{} is not a finite number", n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeBuilder, NestedBlockBuilder, SchemaBuilder};
    use serde::Deserialize;

    #[derive(Serialize)]
    struct Zone {
        name: String,
        href: String,
    }

    #[derive(Serialize)]
    struct Gateway {
        id: String,
        name: Option<String>,
        mode: String,
        local_asn: Option<i64>,
        zone: Option<Zone>,
        members: Vec<Zone>,
        private_field: String,
    }

    fn gateway_block() -> Block {
        let zone = || {
            NestedBlockBuilder::computed_list("zone")
                .max_items(1)
                .attribute(AttributeBuilder::new("name", AttributeType::String).computed().build())
                .attribute(AttributeBuilder::new("href", AttributeType::String).computed().build())
        };
        SchemaBuilder::new()
            .attribute(AttributeBuilder::new("id", AttributeType::String).computed().build())
            .attribute(AttributeBuilder::new("name", AttributeType::String).optional().build())
            .attribute(AttributeBuilder::new("mode", AttributeType::String).required().build())
            .attribute(AttributeBuilder::new("local_asn", AttributeType::Number).optional().build())
            .block(zone().build())
            .block(
                NestedBlockBuilder::computed_list("members")
                    .attribute(AttributeBuilder::new("name", AttributeType::String).computed().build())
                    .build(),
            )
            .build()
            .block
    }

    #[test]
    fn flatten_emits_declared_keys_only() {
        let model = Gateway {
            id: "r006-1".to_string(),
            name: Some("gw".to_string()),
            mode: "route".to_string(),
            local_asn: Some(64520),
            zone: Some(Zone {
                name: "us-south-1".to_string(),
                href: "https://zones/us-south-1".to_string(),
            }),
            members: vec![Zone {
                name: "m1".to_string(),
                href: "h".to_string(),
            }],
            private_field: "dropped".to_string(),
        };

        let state = flatten(&gateway_block(), &model).unwrap();
        let map = state.value.as_map().unwrap();

        assert_eq!(map.len(), 6);
        assert!(!map.contains_key("private_field"));
        assert_eq!(map["local_asn"], Dynamic::Number(64520.0));
        assert_eq!(
            state
                .get_string(&AttributePath::new("zone").index(0).attribute("name"))
                .unwrap(),
            "us-south-1"
        );
        // members entries only carry declared keys
        assert_eq!(
            map["members"],
            Dynamic::List(vec![Dynamic::Map(HashMap::from([(
                "name".to_string(),
                Dynamic::from("m1")
            )]))])
        );
    }

    #[test]
    fn flatten_handles_absent_optionals() {
        let model = Gateway {
            id: "r006-1".to_string(),
            name: None,
            mode: "policy".to_string(),
            local_asn: None,
            zone: None,
            members: vec![],
            private_field: String::new(),
        };

        let state = flatten(&gateway_block(), &model).unwrap();
        assert_eq!(state.value.get("name"), &Dynamic::Null);
        assert_eq!(state.value.get("zone"), &Dynamic::List(vec![]));
        assert_eq!(state.value.get("members"), &Dynamic::List(vec![]));
    }

    #[test]
    fn flatten_rejects_shape_mismatch() {
        #[derive(Serialize)]
        struct Wrong {
            mode: i64,
        }
        let err = flatten(&gateway_block(), &Wrong { mode: 3 }).unwrap_err();
        assert!(matches!(err, TfplugError::InvalidState(msg) if msg.contains("mode")));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct GatewayArgs {
        mode: String,
        name: Option<String>,
        local_asn: Option<i64>,
    }

    #[test]
    fn expand_drops_null_and_unknown() {
        let config = DynamicValue::object([
            ("mode", Dynamic::from("route")),
            ("name", Dynamic::Null),
            ("local_asn", Dynamic::Unknown),
            ("id", Dynamic::Unknown),
        ]);

        let args: GatewayArgs = expand(&gateway_block(), &config).unwrap();
        assert_eq!(
            args,
            GatewayArgs {
                mode: "route".to_string(),
                name: None,
                local_asn: None,
            }
        );
    }

    #[test]
    fn expand_emits_integers_for_whole_numbers() {
        let config = DynamicValue::object([
            ("mode", Dynamic::from("route")),
            ("local_asn", Dynamic::Number(64520.0)),
        ]);

        let args: GatewayArgs = expand(&gateway_block(), &config).unwrap();
        assert_eq!(args.local_asn, Some(64520));
    }

    #[test]
    fn expand_unwraps_single_item_blocks() {
        #[derive(Deserialize)]
        struct WithZone {
            zone: Option<HashMap<String, String>>,
        }
        let block = gateway_block();
        let config = DynamicValue::object([(
            "zone",
            Dynamic::List(vec![Dynamic::Map(HashMap::from([(
                "name".to_string(),
                Dynamic::from("us-south-2"),
            )]))]),
        )]);

        let args: WithZone = expand(&block, &config).unwrap();
        assert_eq!(args.zone.unwrap()["name"], "us-south-2");

        let empty = DynamicValue::object([("zone", Dynamic::List(vec![]))]);
        let args: WithZone = expand(&block, &empty).unwrap();
        assert!(args.zone.is_none());
    }
}
