//! `/bare_metal_servers`

use super::common::{
    segment, ApiQueryParams, Link, ReservedIpReference, ResourceGroupReference, ResourceReference,
    ZoneReference,
};
use super::error::ApiError;
use super::pagination::{self, Named, Page, DEFAULT_PAGE_LIMIT};
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BareMetalServerCpu {
    pub architecture: Option<String>,
    pub core_count: Option<i64>,
    pub socket_count: Option<i64>,
    pub threads_per_core: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BareMetalServerDisk {
    pub id: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub interface_type: Option<String>,
    pub resource_type: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NetworkInterfaceReference {
    pub id: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub primary_ip: Option<ReservedIpReference>,
    pub resource_type: Option<String>,
    pub subnet: Option<ResourceReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BareMetalServer {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub bandwidth: Option<i64>,
    pub cpu: Option<BareMetalServerCpu>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub disks: Vec<BareMetalServerDisk>,
    pub enable_secure_boot: Option<bool>,
    pub lifecycle_state: Option<String>,
    pub memory: Option<i64>,
    pub primary_network_interface: Option<NetworkInterfaceReference>,
    pub profile: Option<ResourceReference>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    pub vpc: Option<ResourceReference>,
    pub zone: Option<ZoneReference>,
}

impl Named for BareMetalServer {
    const KIND: &'static str = "bare metal server";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct BareMetalServerCollection {
    #[serde(default)]
    bare_metal_servers: Vec<BareMetalServer>,
    next: Option<Link>,
}

/// Server-side filters of `GET /bare_metal_servers`
#[derive(Debug, Clone, Default)]
pub struct ListBareMetalServersOptions {
    pub resource_group_id: Option<String>,
    pub vpc_id: Option<String>,
    pub vpc_name: Option<String>,
}

impl ListBareMetalServersOptions {
    fn to_query_params(&self, start: Option<String>) -> ApiQueryParams {
        ApiQueryParams::new()
            .add("limit", DEFAULT_PAGE_LIMIT)
            .add_optional("start", start)
            .add_optional("resource_group.id", self.resource_group_id.as_ref())
            .add_optional("vpc.id", self.vpc_id.as_ref())
            .add_optional("vpc.name", self.vpc_name.as_ref())
    }
}

pub struct BareMetalServersApi<'a> {
    client: &'a Client,
}

impl<'a> BareMetalServersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_page(
        &self,
        options: &ListBareMetalServersOptions,
        start: Option<String>,
    ) -> Result<Page<BareMetalServer>, ApiError> {
        let collection: BareMetalServerCollection = self
            .client
            .get("/bare_metal_servers", &options.to_query_params(start))
            .await?;
        Ok(Page::new(collection.bare_metal_servers, collection.next.as_ref()))
    }

    pub async fn list(
        &self,
        options: &ListBareMetalServersOptions,
    ) -> Result<Vec<BareMetalServer>, ApiError> {
        pagination::collect_all(|start| self.list_page(options, start)).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<BareMetalServer, ApiError> {
        let options = ListBareMetalServersOptions::default();
        pagination::find_by_name(name, |start| self.list_page(&options, start)).await
    }

    pub async fn get(&self, id: &str) -> Result<BareMetalServer, ApiError> {
        self.client
            .get(&format!("/bare_metal_servers/{}", segment(id)), &ApiQueryParams::new())
            .await
    }
}
