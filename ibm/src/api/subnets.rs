//! Subnets and their reserved IPs
//!
//! `/subnets` and `/subnets/{id}/reserved_ips`

use super::common::{
    segment, ApiQueryParams, IdentityById, IdentityByName, Link, ResourceGroupReference,
    ResourceReference, ZoneReference,
};
use super::error::ApiError;
use super::pagination::{self, Named, Page, DEFAULT_PAGE_LIMIT};
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Subnet {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub available_ipv4_address_count: Option<i64>,
    pub created_at: Option<String>,
    pub ip_version: Option<String>,
    pub ipv4_cidr_block: Option<String>,
    pub network_acl: Option<ResourceReference>,
    pub public_gateway: Option<ResourceReference>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    pub routing_table: Option<ResourceReference>,
    pub status: Option<String>,
    pub total_ipv4_address_count: Option<i64>,
    pub vpc: Option<ResourceReference>,
    pub zone: Option<ZoneReference>,
}

impl Named for Subnet {
    const KIND: &'static str = "subnet";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct SubnetCollection {
    #[serde(default)]
    subnets: Vec<Subnet>,
    next: Option<Link>,
}

/// Filters accepted by GET /subnets
#[derive(Debug, Clone, Default)]
pub struct ListSubnetsOptions {
    pub vpc_id: Option<String>,
    pub zone_name: Option<String>,
    pub resource_group_id: Option<String>,
    pub routing_table_id: Option<String>,
}

impl ListSubnetsOptions {
    fn to_query_params(&self, start: Option<String>) -> ApiQueryParams {
        ApiQueryParams::new()
            .add("limit", DEFAULT_PAGE_LIMIT)
            .add_optional("start", start)
            .add_optional("vpc.id", self.vpc_id.as_ref())
            .add_optional("zone.name", self.zone_name.as_ref())
            .add_optional("resource_group.id", self.resource_group_id.as_ref())
            .add_optional("routing_table.id", self.routing_table_id.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubnetPrototype {
    pub name: String,
    pub vpc: IdentityById,
    pub zone: IdentityByName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ipv4_address_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_acl: Option<IdentityById>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_gateway: Option<IdentityById>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_table: Option<IdentityById>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<IdentityById>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubnetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_acl: Option<IdentityById>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_table: Option<IdentityById>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReservedIp {
    pub id: String,
    pub address: Option<String>,
    pub auto_delete: Option<bool>,
    pub created_at: Option<String>,
    pub href: Option<String>,
    pub lifecycle_state: Option<String>,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub resource_type: Option<String>,
    pub target: Option<ResourceReference>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReservedIpPrototype {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<IdentityById>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReservedIpPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
}

/// Subnets API
pub struct SubnetsApi<'a> {
    client: &'a Client,
}

impl<'a> SubnetsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /subnets, one page
    pub async fn list_page(
        &self,
        options: &ListSubnetsOptions,
        start: Option<String>,
    ) -> Result<Page<Subnet>, ApiError> {
        let collection: SubnetCollection = self
            .client
            .get("/subnets", &options.to_query_params(start))
            .await?;
        Ok(Page::new(collection.subnets, collection.next.as_ref()))
    }

    pub async fn list(&self, options: &ListSubnetsOptions) -> Result<Vec<Subnet>, ApiError> {
        pagination::collect_all(|start| self.list_page(options, start)).await
    }

    pub async fn find_by_name(
        &self,
        name: &str,
        options: &ListSubnetsOptions,
    ) -> Result<Subnet, ApiError> {
        pagination::find_by_name(name, |start| self.list_page(options, start)).await
    }

    /// GET /subnets/{id}
    pub async fn get(&self, id: &str) -> Result<Subnet, ApiError> {
        self.client
            .get(&format!("/subnets/{}", segment(id)), &ApiQueryParams::new())
            .await
    }

    /// POST /subnets
    pub async fn create(&self, prototype: &SubnetPrototype) -> Result<Subnet, ApiError> {
        self.client.post("/subnets", prototype).await
    }

    /// PATCH /subnets/{id}
    pub async fn update(&self, id: &str, patch: &SubnetPatch) -> Result<Subnet, ApiError> {
        self.client.patch(&format!("/subnets/{}", segment(id)), patch).await
    }

    /// DELETE /subnets/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/subnets/{}", segment(id))).await
    }

    /// PUT /subnets/{id}/public_gateway
    pub async fn set_public_gateway(
        &self,
        id: &str,
        public_gateway_id: &str,
    ) -> Result<ResourceReference, ApiError> {
        self.client
            .put(
                &format!("/subnets/{}/public_gateway", segment(id)),
                &IdentityById::new(public_gateway_id),
            )
            .await
    }

    /// DELETE /subnets/{id}/public_gateway
    pub async fn unset_public_gateway(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/subnets/{}/public_gateway", segment(id)))
            .await
    }

    pub async fn get_reserved_ip(&self, subnet_id: &str, id: &str) -> Result<ReservedIp, ApiError> {
        self.client
            .get(
                &format!("/subnets/{}/reserved_ips/{}", segment(subnet_id), segment(id)),
                &ApiQueryParams::new(),
            )
            .await
    }

    pub async fn create_reserved_ip(
        &self,
        subnet_id: &str,
        prototype: &ReservedIpPrototype,
    ) -> Result<ReservedIp, ApiError> {
        self.client
            .post(&format!("/subnets/{}/reserved_ips", segment(subnet_id)), prototype)
            .await
    }

    pub async fn update_reserved_ip(
        &self,
        subnet_id: &str,
        id: &str,
        patch: &ReservedIpPatch,
    ) -> Result<ReservedIp, ApiError> {
        self.client
            .patch(&format!("/subnets/{}/reserved_ips/{}", segment(subnet_id), segment(id)), patch)
            .await
    }

    pub async fn delete_reserved_ip(&self, subnet_id: &str, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/subnets/{}/reserved_ips/{}", segment(subnet_id), segment(id)))
            .await
    }
}
