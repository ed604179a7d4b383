//! `/vpn_gateways`

use super::common::{
    segment, ApiQueryParams, IdentityById, IpAddress, Link, ReservedIpReference,
    ResourceGroupReference, ResourceReference,
};
use super::error::ApiError;
use super::pagination::{self, Named, Page, DEFAULT_PAGE_LIMIT};
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VpnGatewayMember {
    pub health_state: Option<String>,
    pub lifecycle_state: Option<String>,
    pub private_ip: Option<ReservedIpReference>,
    pub public_ip: Option<IpAddress>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VpnGateway {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub connections: Vec<ResourceReference>,
    pub created_at: Option<String>,
    pub health_state: Option<String>,
    pub lifecycle_state: Option<String>,
    pub local_asn: Option<i64>,
    #[serde(default)]
    pub members: Vec<VpnGatewayMember>,
    pub mode: Option<String>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    pub subnet: Option<ResourceReference>,
    pub vpc: Option<ResourceReference>,
}

impl Named for VpnGateway {
    const KIND: &'static str = "VPN gateway";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct VpnGatewayCollection {
    #[serde(default)]
    vpn_gateways: Vec<VpnGateway>,
    next: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VpnGatewayPrototype {
    pub name: String,
    pub subnet: IdentityById,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_asn: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<IdentityById>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VpnGatewayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_asn: Option<i64>,
}

pub struct VpnGatewaysApi<'a> {
    client: &'a Client,
}

impl<'a> VpnGatewaysApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_page(&self, start: Option<String>) -> Result<Page<VpnGateway>, ApiError> {
        let params = ApiQueryParams::new()
            .add("limit", DEFAULT_PAGE_LIMIT)
            .add_optional("start", start);
        let collection: VpnGatewayCollection = self.client.get("/vpn_gateways", &params).await?;
        Ok(Page::new(collection.vpn_gateways, collection.next.as_ref()))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<VpnGateway, ApiError> {
        pagination::find_by_name(name, |start| self.list_page(start)).await
    }

    pub async fn get(&self, id: &str) -> Result<VpnGateway, ApiError> {
        self.client
            .get(&format!("/vpn_gateways/{}", segment(id)), &ApiQueryParams::new())
            .await
    }

    pub async fn create(&self, prototype: &VpnGatewayPrototype) -> Result<VpnGateway, ApiError> {
        self.client.post("/vpn_gateways", prototype).await
    }

    pub async fn update(&self, id: &str, patch: &VpnGatewayPatch) -> Result<VpnGateway, ApiError> {
        self.client
            .patch(&format!("/vpn_gateways/{}", segment(id)), patch)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/vpn_gateways/{}", segment(id))).await
    }
}
