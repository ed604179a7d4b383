//! `/cluster_networks`

use super::common::{
    segment, ApiQueryParams, Link, ResourceGroupReference, ResourceReference, ZoneReference,
};
use super::error::ApiError;
use super::pagination::{self, Named, Page, DEFAULT_PAGE_LIMIT};
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClusterNetworkSubnetPrefix {
    pub allocation_policy: Option<String>,
    pub cidr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClusterNetworkLifecycleReason {
    pub code: Option<String>,
    pub message: Option<String>,
    pub more_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClusterNetwork {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub lifecycle_reasons: Vec<ClusterNetworkLifecycleReason>,
    pub lifecycle_state: Option<String>,
    pub profile: Option<ResourceReference>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    #[serde(default)]
    pub subnet_prefixes: Vec<ClusterNetworkSubnetPrefix>,
    pub vpc: Option<ResourceReference>,
    pub zone: Option<ZoneReference>,
}

impl Named for ClusterNetwork {
    const KIND: &'static str = "cluster network";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct ClusterNetworkCollection {
    #[serde(default)]
    cluster_networks: Vec<ClusterNetwork>,
    next: Option<Link>,
}

pub struct ClusterNetworksApi<'a> {
    client: &'a Client,
}

impl<'a> ClusterNetworksApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_page(&self, start: Option<String>) -> Result<Page<ClusterNetwork>, ApiError> {
        let params = ApiQueryParams::new()
            .add("limit", DEFAULT_PAGE_LIMIT)
            .add_optional("start", start);
        let collection: ClusterNetworkCollection =
            self.client.get("/cluster_networks", &params).await?;
        Ok(Page::new(collection.cluster_networks, collection.next.as_ref()))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<ClusterNetwork, ApiError> {
        pagination::find_by_name(name, |start| self.list_page(start)).await
    }

    pub async fn get(&self, id: &str) -> Result<ClusterNetwork, ApiError> {
        self.client
            .get(&format!("/cluster_networks/{}", segment(id)), &ApiQueryParams::new())
            .await
    }
}
