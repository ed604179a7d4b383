//! `/vpcs`

use super::common::{segment, ApiQueryParams, Link, ResourceGroupReference, ResourceReference};
use super::error::ApiError;
use super::pagination::{self, Named, Page, DEFAULT_PAGE_LIMIT};
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Vpc {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub classic_access: Option<bool>,
    pub created_at: Option<String>,
    pub default_network_acl: Option<ResourceReference>,
    pub default_routing_table: Option<ResourceReference>,
    pub default_security_group: Option<ResourceReference>,
    pub health_state: Option<String>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub cse_source_ips: Vec<VpcCseSourceIp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VpcCseSourceIp {
    pub ip: Option<super::common::IpAddress>,
    pub zone: Option<super::common::ZoneReference>,
}

impl Named for Vpc {
    const KIND: &'static str = "VPC";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct VpcCollection {
    #[serde(default)]
    vpcs: Vec<Vpc>,
    next: Option<Link>,
}

pub struct VpcsApi<'a> {
    client: &'a Client,
}

impl<'a> VpcsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /vpcs, one page
    pub async fn list_page(
        &self,
        resource_group_id: Option<&str>,
        start: Option<String>,
    ) -> Result<Page<Vpc>, ApiError> {
        let params = ApiQueryParams::new()
            .add("limit", DEFAULT_PAGE_LIMIT)
            .add_optional("start", start)
            .add_optional("resource_group.id", resource_group_id);
        let collection: VpcCollection = self.client.get("/vpcs", &params).await?;
        Ok(Page::new(collection.vpcs, collection.next.as_ref()))
    }

    pub async fn list(&self) -> Result<Vec<Vpc>, ApiError> {
        pagination::collect_all(|start| self.list_page(None, start)).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Vpc, ApiError> {
        pagination::find_by_name(name, |start| self.list_page(None, start)).await
    }

    pub async fn resolve_id(&self, name: &str) -> Result<String, ApiError> {
        pagination::resolve_by_name(name, |start| self.list_page(None, start)).await
    }

    /// GET /vpcs/{id}
    pub async fn get(&self, id: &str) -> Result<Vpc, ApiError> {
        self.client
            .get(&format!("/vpcs/{}", segment(id)), &ApiQueryParams::new())
            .await
    }
}
