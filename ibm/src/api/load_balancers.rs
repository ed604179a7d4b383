//! `/load_balancers`

use super::common::{
    segment, ApiQueryParams, IpAddress, Link, ReservedIpReference, ResourceGroupReference,
    ResourceReference,
};
use super::error::ApiError;
use super::pagination::{self, Named, Page, DEFAULT_PAGE_LIMIT};
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoadBalancer {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub access_mode: Option<String>,
    pub availability: Option<String>,
    pub created_at: Option<String>,
    pub dns: Option<LoadBalancerDns>,
    pub hostname: Option<String>,
    pub instance_groups_supported: Option<bool>,
    pub is_public: Option<bool>,
    pub is_private_path: Option<bool>,
    #[serde(default)]
    pub listeners: Vec<ResourceReference>,
    pub operating_status: Option<String>,
    #[serde(default)]
    pub pools: Vec<ResourceReference>,
    #[serde(default)]
    pub private_ips: Vec<ReservedIpReference>,
    pub profile: Option<LoadBalancerProfileReference>,
    pub provisioning_status: Option<String>,
    #[serde(default)]
    pub public_ips: Vec<IpAddress>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    pub route_mode: Option<bool>,
    #[serde(default)]
    pub security_groups: Vec<ResourceReference>,
    pub security_groups_supported: Option<bool>,
    pub source_ip_session_persistence_supported: Option<bool>,
    #[serde(default)]
    pub subnets: Vec<ResourceReference>,
    pub udp_supported: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoadBalancerDns {
    pub instance: Option<ResourceReference>,
    pub zone: Option<ResourceReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoadBalancerProfileReference {
    pub family: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
}

impl Named for LoadBalancer {
    const KIND: &'static str = "load balancer";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct LoadBalancerCollection {
    #[serde(default)]
    load_balancers: Vec<LoadBalancer>,
    next: Option<Link>,
}

pub struct LoadBalancersApi<'a> {
    client: &'a Client,
}

impl<'a> LoadBalancersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /load_balancers, one page
    pub async fn list_page(&self, start: Option<String>) -> Result<Page<LoadBalancer>, ApiError> {
        let params = ApiQueryParams::new()
            .add("limit", DEFAULT_PAGE_LIMIT)
            .add_optional("start", start);
        let collection: LoadBalancerCollection = self.client.get("/load_balancers", &params).await?;
        Ok(Page::new(collection.load_balancers, collection.next.as_ref()))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<LoadBalancer, ApiError> {
        pagination::find_by_name(name, |start| self.list_page(start)).await
    }

    /// GET /load_balancers/{id}
    pub async fn get(&self, id: &str) -> Result<LoadBalancer, ApiError> {
        self.client
            .get(&format!("/load_balancers/{}", segment(id)), &ApiQueryParams::new())
            .await
    }
}
