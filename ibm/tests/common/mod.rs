#![allow(dead_code)]

use ibm::IbmProvider;
use tfplug::server::ProviderServer;
use tfplug::types::{Dynamic, DynamicValue};

pub const JSON: &str = "application/json";

/// Provider pointed at a mock VPC endpoint, authenticated with a static token
pub async fn configured_server(endpoint: &str) -> ProviderServer<IbmProvider> {
    configure(DynamicValue::object([
        ("iam_token", Dynamic::from("test-token")),
        ("endpoint", Dynamic::from(endpoint)),
        ("max_retries", Dynamic::from(0.0)),
    ]))
    .await
}

/// Provider that exchanges an API key at a mock IAM endpoint
pub async fn api_key_server(endpoint: &str) -> ProviderServer<IbmProvider> {
    configure(DynamicValue::object([
        ("ibmcloud_api_key", Dynamic::from("test-api-key")),
        ("iam_endpoint", Dynamic::from(endpoint)),
        ("endpoint", Dynamic::from(endpoint)),
        ("max_retries", Dynamic::from(0.0)),
    ]))
    .await
}

async fn configure(config: DynamicValue) -> ProviderServer<IbmProvider> {
    let server = ProviderServer::new(IbmProvider::new()).await.unwrap();
    let diagnostics = server.configure_provider("1.9.0", config).await;
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    server
}

pub fn vpc_json(id: &str, name: &str) -> String {
    format!(
        r#"{{"id":"{id}","name":"{name}","crn":"crn:v1:vpc:{id}","status":"available","resource_type":"vpc"}}"#
    )
}

/// One page of `/vpcs`; `next` is the start cursor of the following page
pub fn vpc_page(base: &str, vpcs: &[(&str, &str)], next: Option<&str>) -> String {
    let items: Vec<String> = vpcs.iter().map(|(id, name)| vpc_json(id, name)).collect();
    let next = next
        .map(|start| format!(r#","next":{{"href":"{base}/vpcs?limit=50&start={start}"}}"#))
        .unwrap_or_default();
    format!(r#"{{"limit":50,"vpcs":[{}]{}}}"#, items.join(","), next)
}

pub fn subnet_json(id: &str, name: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "name": "{name}",
            "crn": "crn:v1:subnet:{id}",
            "href": "https://us-south.iaas.cloud.ibm.com/v1/subnets/{id}",
            "vpc": {{"id": "vpc-1", "name": "main"}},
            "zone": {{"name": "us-south-1"}},
            "ipv4_cidr_block": "10.240.0.0/24",
            "total_ipv4_address_count": 256,
            "available_ipv4_address_count": 251,
            "ip_version": "ipv4",
            "network_acl": {{"id": "acl-1", "name": "default-acl"}},
            "resource_group": {{"id": "rg-1", "name": "default"}},
            "resource_type": "subnet",
            "status": "available",
            "created_at": "2024-11-12T09:00:00Z"
        }}"#
    )
}
