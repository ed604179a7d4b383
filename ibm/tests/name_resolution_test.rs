#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

mod common;

use common::{configured_server, vpc_page, JSON};
use mockito::{Matcher, Server};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

fn by_name(name: &str) -> DynamicValue {
    DynamicValue::object([("name", Dynamic::from(name))])
}

/// First page carries no cursor, so its query ends with the limit
fn first_page() -> Matcher {
    Matcher::Regex("limit=50$".into())
}

fn page(start: &str) -> Matcher {
    Matcher::UrlEncoded("start".into(), start.into())
}

#[tokio::test]
async fn name_on_third_page_takes_three_fetches() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let page1 = server
        .mock("GET", "/vpcs")
        .match_query(first_page())
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-a", "alpha"), ("r006-b", "beta")], Some("page2")))
        .expect(1)
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/vpcs")
        .match_query(page("page2"))
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-c", "gamma")], Some("page3")))
        .expect(1)
        .create_async()
        .await;
    let page3 = server
        .mock("GET", "/vpcs")
        .match_query(page("page3"))
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-d", "delta"), ("r006-target", "target")], None))
        .expect(1)
        .create_async()
        .await;

    let provider = configured_server(&base).await;
    let response = provider.read_data_source("ibm_is_vpc", by_name("target")).await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.state.get_string(&AttributePath::new("id")).unwrap(), "r006-target");
    assert_eq!(response.state.get_string(&AttributePath::new("name")).unwrap(), "target");
    page1.assert_async().await;
    page2.assert_async().await;
    page3.assert_async().await;
}

#[tokio::test]
async fn missing_name_follows_chain_then_reports_not_found() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let page1 = server
        .mock("GET", "/vpcs")
        .match_query(first_page())
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-a", "alpha")], Some("page2")))
        .expect(1)
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/vpcs")
        .match_query(page("page2"))
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-b", "beta")], None))
        .expect(1)
        .create_async()
        .await;

    let provider = configured_server(&base).await;
    let response = provider.read_data_source("ibm_is_vpc", by_name("web")).await;

    assert!(response.state.is_null());
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Error during read of (Data) ibm_is_vpc");
    assert!(response.diagnostics[0].detail.contains("no VPC found with name web"));
    page1.assert_async().await;
    page2.assert_async().await;
}

#[tokio::test]
async fn duplicate_names_resolve_to_first_in_server_order() {
    let mut server = Server::new_async().await;
    let base = server.url();

    server
        .mock("GET", "/vpcs")
        .match_query(first_page())
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-first", "shared")], Some("page2")))
        .create_async()
        .await;
    server
        .mock("GET", "/vpcs")
        .match_query(page("page2"))
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-second", "shared")], None))
        .create_async()
        .await;

    let provider = configured_server(&base).await;
    let response = provider.read_data_source("ibm_is_vpc", by_name("shared")).await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.state.get_string(&AttributePath::new("id")).unwrap(), "r006-first");
}

#[tokio::test]
async fn failed_page_aborts_the_lookup() {
    let mut server = Server::new_async().await;
    let base = server.url();

    server
        .mock("GET", "/vpcs")
        .match_query(first_page())
        .with_header("content-type", JSON)
        .with_body(vpc_page(&base, &[("r006-a", "alpha")], Some("page2")))
        .create_async()
        .await;
    let broken = server
        .mock("GET", "/vpcs")
        .match_query(page("page2"))
        .with_status(500)
        .with_header("content-type", JSON)
        .with_body(r#"{"errors":[{"code":"internal_error","message":"Internal error"}],"trace":"t-1"}"#)
        .expect(1)
        .create_async()
        .await;
    let never = server
        .mock("GET", "/vpcs")
        .match_query(page("page3"))
        .expect(0)
        .create_async()
        .await;

    let provider = configured_server(&base).await;
    let response = provider.read_data_source("ibm_is_vpc", by_name("alpha")).await;

    assert!(response.state.is_null());
    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].detail.contains("ListVPCs failed"));
    assert!(response.diagnostics[0].detail.contains("internal_error"));
    broken.assert_async().await;
    never.assert_async().await;
}

#[tokio::test]
async fn lookup_by_identifier_skips_the_listing() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let get = server
        .mock("GET", "/vpcs/r006-a")
        .match_query(Matcher::Any)
        .with_header("content-type", JSON)
        .with_body(common::vpc_json("r006-a", "alpha"))
        .expect(1)
        .create_async()
        .await;
    let list = server
        .mock("GET", "/vpcs")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let provider = configured_server(&base).await;
    let response = provider
        .read_data_source(
            "ibm_is_vpc",
            DynamicValue::object([("identifier", Dynamic::from("r006-a"))]),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.state.get_string(&AttributePath::new("identifier")).unwrap(), "r006-a");
    assert_eq!(response.state.get_string(&AttributePath::new("name")).unwrap(), "alpha");
    get.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn lookup_arguments_are_mutually_exclusive() {
    let server = Server::new_async().await;
    let provider = configured_server(&server.url()).await;

    let both = provider
        .validate_data_resource_config(
            "ibm_is_vpc",
            DynamicValue::object([
                ("identifier", Dynamic::from("r006-a")),
                ("name", Dynamic::from("alpha")),
            ]),
        )
        .await;
    assert_eq!(both.len(), 1);
    assert_eq!(both[0].summary, "Invalid lookup arguments");

    let one = provider
        .validate_data_resource_config("ibm_is_vpc", by_name("alpha"))
        .await;
    assert!(one.is_empty(), "{:?}", one);
}
