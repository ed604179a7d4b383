#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

mod common;

use common::{api_key_server, configured_server, subnet_json, JSON};
use mockito::{Matcher, Server};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

#[tokio::test]
async fn subnets_listing_passes_filters_and_keeps_order() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/subnets")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("vpc.id".into(), "vpc-1".into()),
            Matcher::UrlEncoded("zone.name".into(), "us-south-1".into()),
        ]))
        .with_header("content-type", JSON)
        .with_body(format!(
            r#"{{"subnets":[{},{}]}}"#,
            subnet_json("sub-b", "backend"),
            subnet_json("sub-a", "app")
        ))
        .expect(1)
        .create_async()
        .await;

    let provider = configured_server(&server.url()).await;
    let response = provider
        .read_data_source(
            "ibm_is_subnets",
            DynamicValue::object([
                ("vpc", Dynamic::from("vpc-1")),
                ("zone", Dynamic::from("us-south-1")),
            ]),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let subnets = response.state.get_list(&AttributePath::new("subnets")).unwrap();
    assert_eq!(subnets.len(), 2);
    assert_eq!(subnets[0].get("id").as_str(), Some("sub-b"));
    assert_eq!(subnets[1].get("name").as_str(), Some("app"));
    assert_eq!(subnets[1].get("vpc").as_str(), Some("vpc-1"));
    assert_eq!(response.state.get_string(&AttributePath::new("vpc")).unwrap(), "vpc-1");
    assert!(response.state.get_optional_string(&AttributePath::new("id")).is_some());
    list.assert_async().await;
}

#[tokio::test]
async fn subnets_vpc_name_resolves_to_id_filter() {
    let mut server = Server::new_async().await;
    let base = server.url();
    let vpcs = server
        .mock("GET", "/vpcs")
        .match_query(Matcher::Any)
        .with_header("content-type", JSON)
        .with_body(common::vpc_page(&base, &[("vpc-0", "other"), ("vpc-1", "main")], None))
        .expect(1)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/subnets")
        .match_query(Matcher::UrlEncoded("vpc.id".into(), "vpc-1".into()))
        .with_header("content-type", JSON)
        .with_body(format!(r#"{{"subnets":[{}]}}"#, subnet_json("sub-a", "app")))
        .expect(1)
        .create_async()
        .await;

    let provider = configured_server(&base).await;
    let response = provider
        .read_data_source(
            "ibm_is_subnets",
            DynamicValue::object([("vpc_name", Dynamic::from("main"))]),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.state.get_string(&AttributePath::new("vpc")).unwrap(), "vpc-1");
    assert_eq!(response.state.get_string(&AttributePath::new("vpc_name")).unwrap(), "main");
    assert_eq!(response.state.get_list(&AttributePath::new("subnets")).unwrap().len(), 1);
    vpcs.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn subnets_unknown_vpc_name_is_not_found() {
    let mut server = Server::new_async().await;
    let base = server.url();
    server
        .mock("GET", "/vpcs")
        .match_query(Matcher::Any)
        .with_header("content-type", JSON)
        .with_body(common::vpc_page(&base, &[("vpc-0", "other")], None))
        .create_async()
        .await;
    let list = server
        .mock("GET", "/subnets")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let provider = configured_server(&base).await;
    let response = provider
        .read_data_source(
            "ibm_is_subnets",
            DynamicValue::object([("vpc_name", Dynamic::from("main"))]),
        )
        .await;

    assert!(response.state.is_null());
    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].detail.contains("no VPC found with name main"));
    list.assert_async().await;
}

#[tokio::test]
async fn subnet_by_name_is_scoped_to_vpc() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/subnets")
        .match_query(Matcher::UrlEncoded("vpc.id".into(), "vpc-1".into()))
        .with_header("content-type", JSON)
        .with_body(format!(r#"{{"subnets":[{}]}}"#, subnet_json("sub-a", "app")))
        .expect(1)
        .create_async()
        .await;

    let provider = configured_server(&server.url()).await;
    let response = provider
        .read_data_source(
            "ibm_is_subnet",
            DynamicValue::object([
                ("name", Dynamic::from("app")),
                ("vpc", Dynamic::from("vpc-1")),
            ]),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.state.get_string(&AttributePath::new("id")).unwrap(), "sub-a");
    assert_eq!(response.state.get_string(&AttributePath::new("ipv4_cidr_block")).unwrap(), "10.240.0.0/24");
    list.assert_async().await;
}

#[tokio::test]
async fn load_balancer_not_found_reports_list_operation() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/load_balancers")
        .match_query(Matcher::Any)
        .with_header("content-type", JSON)
        .with_body(r#"{"load_balancers":[{"id":"lb-1","name":"other"}]}"#)
        .create_async()
        .await;

    let provider = configured_server(&server.url()).await;
    let response = provider
        .read_data_source(
            "ibm_is_lb",
            DynamicValue::object([("name", Dynamic::from("public-lb"))]),
        )
        .await;

    assert!(response.state.is_null());
    assert_eq!(response.diagnostics[0].summary, "Error during read of (Data) ibm_is_lb");
    assert!(response.diagnostics[0].detail.contains("ListLoadBalancers failed"));
}

#[tokio::test]
async fn dedicated_host_lookup_keeps_group_filter() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/dedicated_hosts")
        .match_query(Matcher::UrlEncoded("dedicated_host_group.id".into(), "dhg-1".into()))
        .with_header("content-type", JSON)
        .with_body(
            r#"{"dedicated_hosts":[{
                "id": "dh-1",
                "name": "host-a",
                "memory": 768,
                "vcpu": {"architecture": "amd64", "count": 96, "manufacturer": "intel"},
                "group": {"id": "dhg-1", "name": "group-a"},
                "zone": {"name": "us-south-1"}
            }]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let provider = configured_server(&server.url()).await;
    let response = provider
        .read_data_source(
            "ibm_is_dedicated_host",
            DynamicValue::object([
                ("name", Dynamic::from("host-a")),
                ("host_group", Dynamic::from("dhg-1")),
            ]),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.state.get_string(&AttributePath::new("id")).unwrap(), "dh-1");
    assert_eq!(response.state.get_string(&AttributePath::new("host_group")).unwrap(), "dhg-1");
    let vcpu = response.state.get_list(&AttributePath::new("vcpu")).unwrap();
    assert_eq!(vcpu[0].get("count").as_number(), Some(96.0));
    list.assert_async().await;
}

#[tokio::test]
async fn iam_token_is_fetched_once_and_reused() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/identity/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "urn:ibm:params:oauth:grant-type:apikey".into()),
            Matcher::UrlEncoded("apikey".into(), "test-api-key".into()),
        ]))
        .with_header("content-type", JSON)
        .with_body(r#"{"access_token":"iam-token-1","token_type":"Bearer","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;
    let vpc = server
        .mock("GET", "/vpcs/r006-a")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer iam-token-1")
        .with_header("content-type", JSON)
        .with_body(common::vpc_json("r006-a", "alpha"))
        .expect(2)
        .create_async()
        .await;

    let provider = api_key_server(&server.url()).await;
    let config = DynamicValue::object([("identifier", Dynamic::from("r006-a"))]);
    for _ in 0..2 {
        let response = provider.read_data_source("ibm_is_vpc", config.clone()).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    }

    token.assert_async().await;
    vpc.assert_async().await;
}

#[tokio::test]
async fn unauthorized_response_discards_cached_token() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/identity/token")
        .with_header("content-type", JSON)
        .with_body(r#"{"access_token":"iam-token-1","expires_in":3600}"#)
        .expect(2)
        .create_async()
        .await;
    let rejected = server
        .mock("GET", "/vpcs/r006-a")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_header("content-type", JSON)
        .with_body(r#"{"errors":[{"code":"not_authorized","message":"Token expired"}]}"#)
        .expect(2)
        .create_async()
        .await;

    let provider = api_key_server(&server.url()).await;
    let config = DynamicValue::object([("identifier", Dynamic::from("r006-a"))]);
    for _ in 0..2 {
        let response = provider.read_data_source("ibm_is_vpc", config.clone()).await;
        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].detail.contains("Authentication failed"));
    }

    token.assert_async().await;
    rejected.assert_async().await;
}

#[tokio::test]
async fn iam_rejection_surfaces_as_auth_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/identity/token")
        .with_status(400)
        .with_header("content-type", JSON)
        .with_body(r#"{"errorCode":"BXNIM0415E","errorMessage":"Provided API key could not be found"}"#)
        .create_async()
        .await;

    let provider = api_key_server(&server.url()).await;
    let response = provider
        .read_data_source(
            "ibm_is_vpc",
            DynamicValue::object([("identifier", Dynamic::from("r006-a"))]),
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].detail.contains("BXNIM0415E"));
}

#[tokio::test]
async fn bare_metal_servers_follow_pages_with_vpc_filter() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/bare_metal_servers")
        .match_query(Matcher::Regex("limit=50&vpc.id=vpc-1$".into()))
        .with_header("content-type", JSON)
        .with_body(format!(
            r#"{{"bare_metal_servers":[{{"id":"bms-1","name":"metal-a","cpu":{{"core_count":48}}}}],
                "next":{{"href":"{}/bare_metal_servers?limit=50&start=tok2&vpc.id=vpc-1"}}}}"#,
            server.url()
        ))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/bare_metal_servers")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("vpc.id".into(), "vpc-1".into()),
            Matcher::UrlEncoded("start".into(), "tok2".into()),
        ]))
        .with_header("content-type", JSON)
        .with_body(r#"{"bare_metal_servers":[{"id":"bms-2","name":"metal-b"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let provider = configured_server(&server.url()).await;
    let response = provider
        .read_data_source(
            "ibm_is_bare_metal_servers",
            DynamicValue::object([("vpc", Dynamic::from("vpc-1"))]),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.state.get_string(&AttributePath::new("vpc")).unwrap(), "vpc-1");
    let servers = response.state.get_list(&AttributePath::new("servers")).unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].get("name").as_str(), Some("metal-a"));
    assert_eq!(servers[0].get("cpu").as_list().unwrap()[0].get("core_count").as_number(), Some(48.0));
    assert_eq!(servers[1].get("id").as_str(), Some("bms-2"));
    first.assert_async().await;
    second.assert_async().await;
}
