//! `/virtual_network_interfaces`

use super::common::{
    segment, ApiQueryParams, IdentityById, ReservedIpReference, ResourceGroupReference,
    ResourceReference, ZoneReference,
};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VirtualNetworkInterface {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub allow_ip_spoofing: Option<bool>,
    pub auto_delete: Option<bool>,
    pub created_at: Option<String>,
    pub enable_infrastructure_nat: Option<bool>,
    pub lifecycle_state: Option<String>,
    pub mac_address: Option<String>,
    pub primary_ip: Option<ReservedIpReference>,
    pub protocol_state_filtering_mode: Option<String>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    #[serde(default)]
    pub security_groups: Vec<ResourceReference>,
    pub subnet: Option<ResourceReference>,
    pub target: Option<ResourceReference>,
    pub vpc: Option<ResourceReference>,
    pub zone: Option<ZoneReference>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VirtualNetworkInterfacePrototype {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<IdentityById>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ip_spoofing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_infrastructure_nat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_state_filtering_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<IdentityById>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VirtualNetworkInterfacePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ip_spoofing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_infrastructure_nat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_state_filtering_mode: Option<String>,
}

impl VirtualNetworkInterfacePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.allow_ip_spoofing.is_none()
            && self.auto_delete.is_none()
            && self.enable_infrastructure_nat.is_none()
            && self.protocol_state_filtering_mode.is_none()
    }
}

pub struct VirtualNetworkInterfacesApi<'a> {
    client: &'a Client,
}

impl<'a> VirtualNetworkInterfacesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &str) -> Result<VirtualNetworkInterface, ApiError> {
        self.client
            .get(
                &format!("/virtual_network_interfaces/{}", segment(id)),
                &ApiQueryParams::new(),
            )
            .await
    }

    pub async fn create(
        &self,
        prototype: &VirtualNetworkInterfacePrototype,
    ) -> Result<VirtualNetworkInterface, ApiError> {
        self.client
            .post("/virtual_network_interfaces", prototype)
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        patch: &VirtualNetworkInterfacePatch,
    ) -> Result<VirtualNetworkInterface, ApiError> {
        self.client
            .patch(&format!("/virtual_network_interfaces/{}", segment(id)), patch)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/virtual_network_interfaces/{}", segment(id)))
            .await
    }
}
