//! Common types and utilities for the IBM Cloud VPC API

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use url::Url;

/// Error envelope returned by every VPC endpoint
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
    pub trace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorItem {
    pub code: String,
    pub message: String,
    pub more_info: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Joins the parameters without a leading separator
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-encodes an identifier for use as one URL path segment
pub fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

/// `first` / `next` links of a paginated collection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    /// Extracts the opaque `start` cursor from the link
    pub fn start(&self) -> Option<String> {
        start_from_href(&self.href)
    }
}

pub fn start_from_href(href: &str) -> Option<String> {
    let url = Url::parse(href)
        .or_else(|_| Url::parse("https://localhost/").and_then(|base| base.join(href)))
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "start")
        .map(|(_, value)| value.into_owned())
        .filter(|start| !start.is_empty())
}

/// Present on references to resources that have since been deleted
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Deleted {
    pub more_info: Option<String>,
}

/// Shape shared by most VPC resource references
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResourceReference {
    pub id: Option<String>,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub deleted: Option<Deleted>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ZoneReference {
    pub name: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResourceGroupReference {
    pub id: String,
    pub href: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReservedIpReference {
    pub address: Option<String>,
    pub id: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub deleted: Option<Deleted>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IpAddress {
    pub address: String,
}

/// `{ "id": ... }` identity used in request bodies
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdentityById {
    pub id: String,
}

impl IdentityById {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// `{ "name": ... }` identity used for zones and profiles
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdentityByName {
    pub name: String,
}

impl IdentityByName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_encode_values() {
        let query = ApiQueryParams::new()
            .add("version", "2024-11-12")
            .add("limit", 50)
            .add_optional("vpc.id", Some("r006-1 2"))
            .add_optional("zone.name", None::<String>)
            .to_query_string();

        assert_eq!(query, "version=2024-11-12&limit=50&vpc.id=r006-1%202");
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(segment("0717-subnet"), "0717-subnet");
        assert_eq!(segment("a/b"), "a%2Fb");
        assert_eq!(segment("x?start=1"), "x%3Fstart%3D1");
    }

    #[test]
    fn start_cursor_from_next_link() {
        let link = Link {
            href: "https://us-south.iaas.cloud.ibm.com/v1/subnets?limit=50&start=9d5a91a3e2cbd233b5a5b33436855ed1".to_string(),
        };
        assert_eq!(link.start().as_deref(), Some("9d5a91a3e2cbd233b5a5b33436855ed1"));

        assert_eq!(start_from_href("/v1/vpcs?start=abc&limit=10").as_deref(), Some("abc"));
        assert_eq!(start_from_href("https://host/v1/vpcs?limit=10"), None);
        assert_eq!(start_from_href("https://host/v1/vpcs?start="), None);
    }

    #[test]
    fn error_envelope_parses() {
        let body = r#"{"errors":[{"code":"not_found","message":"Subnet not found","more_info":"https://cloud.ibm.com/docs"}],"trace":"abc-123"}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.errors[0].code, "not_found");
        assert_eq!(parsed.trace.as_deref(), Some("abc-123"));
    }
}
