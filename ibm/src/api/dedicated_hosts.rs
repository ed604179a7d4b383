//! Dedicated hosts and dedicated host groups
//!
//! `/dedicated_hosts` and `/dedicated_host/groups`

use super::common::{
    segment, ApiQueryParams, IdentityById, IdentityByName, Link, ResourceGroupReference,
    ResourceReference, ZoneReference,
};
use super::error::ApiError;
use super::pagination::{self, Named, Page, DEFAULT_PAGE_LIMIT};
use super::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Vcpu {
    pub architecture: Option<String>,
    pub count: Option<i64>,
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DedicatedHostDisk {
    pub id: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub available: Option<i64>,
    pub interface_type: Option<String>,
    pub lifecycle_state: Option<String>,
    pub provisionable: Option<bool>,
    pub resource_type: Option<String>,
    pub size: Option<i64>,
    #[serde(default)]
    pub supported_instance_interface_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DedicatedHost {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub available_memory: Option<i64>,
    pub available_vcpu: Option<Vcpu>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub disks: Vec<DedicatedHostDisk>,
    pub group: Option<ResourceReference>,
    pub instance_placement_enabled: Option<bool>,
    #[serde(default)]
    pub instances: Vec<ResourceReference>,
    pub lifecycle_state: Option<String>,
    pub memory: Option<i64>,
    pub profile: Option<ResourceReference>,
    pub provisionable: Option<bool>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    pub socket_count: Option<i64>,
    pub state: Option<String>,
    #[serde(default)]
    pub supported_instance_profiles: Vec<ResourceReference>,
    pub vcpu: Option<Vcpu>,
    pub zone: Option<ZoneReference>,
}

impl Named for DedicatedHost {
    const KIND: &'static str = "dedicated host";

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct DedicatedHostCollection {
    #[serde(default)]
    dedicated_hosts: Vec<DedicatedHost>,
    next: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DedicatedHostPrototype {
    pub profile: IdentityByName,
    pub group: IdentityById,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_placement_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<IdentityById>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DedicatedHostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_placement_enabled: Option<bool>,
}

impl DedicatedHostPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.instance_placement_enabled.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DedicatedHostGroup {
    pub id: String,
    pub crn: Option<String>,
    pub href: Option<String>,
    pub name: Option<String>,
    pub class: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub dedicated_hosts: Vec<ResourceReference>,
    pub family: Option<String>,
    pub resource_group: Option<ResourceGroupReference>,
    pub resource_type: Option<String>,
    #[serde(default)]
    pub supported_instance_profiles: Vec<ResourceReference>,
    pub zone: Option<ZoneReference>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DedicatedHostGroupPrototype {
    pub class: String,
    pub family: String,
    pub zone: IdentityByName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<IdentityById>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DedicatedHostGroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub struct DedicatedHostsApi<'a> {
    client: &'a Client,
}

impl<'a> DedicatedHostsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /dedicated_hosts, one page, optionally within one group
    pub async fn list_page(
        &self,
        group_id: Option<&str>,
        start: Option<String>,
    ) -> Result<Page<DedicatedHost>, ApiError> {
        let params = ApiQueryParams::new()
            .add("limit", DEFAULT_PAGE_LIMIT)
            .add_optional("start", start)
            .add_optional("dedicated_host_group.id", group_id);
        let collection: DedicatedHostCollection =
            self.client.get("/dedicated_hosts", &params).await?;
        Ok(Page::new(collection.dedicated_hosts, collection.next.as_ref()))
    }

    pub async fn list(&self, group_id: Option<&str>) -> Result<Vec<DedicatedHost>, ApiError> {
        pagination::collect_all(|start| self.list_page(group_id, start)).await
    }

    pub async fn find_by_name(
        &self,
        name: &str,
        group_id: Option<&str>,
    ) -> Result<DedicatedHost, ApiError> {
        pagination::find_by_name(name, |start| self.list_page(group_id, start)).await
    }

    /// GET /dedicated_hosts/{id}
    pub async fn get(&self, id: &str) -> Result<DedicatedHost, ApiError> {
        self.client
            .get(&format!("/dedicated_hosts/{}", segment(id)), &ApiQueryParams::new())
            .await
    }

    /// POST /dedicated_hosts
    pub async fn create(&self, prototype: &DedicatedHostPrototype) -> Result<DedicatedHost, ApiError> {
        self.client.post("/dedicated_hosts", prototype).await
    }

    /// PATCH /dedicated_hosts/{id}
    pub async fn update(&self, id: &str, patch: &DedicatedHostPatch) -> Result<DedicatedHost, ApiError> {
        self.client
            .patch(&format!("/dedicated_hosts/{}", segment(id)), patch)
            .await
    }

    /// DELETE /dedicated_hosts/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/dedicated_hosts/{}", segment(id)))
            .await
    }

    /// GET /dedicated_host/groups/{id}
    pub async fn get_group(&self, id: &str) -> Result<DedicatedHostGroup, ApiError> {
        self.client
            .get(&format!("/dedicated_host/groups/{}", segment(id)), &ApiQueryParams::new())
            .await
    }

    /// POST /dedicated_host/groups
    pub async fn create_group(
        &self,
        prototype: &DedicatedHostGroupPrototype,
    ) -> Result<DedicatedHostGroup, ApiError> {
        self.client.post("/dedicated_host/groups", prototype).await
    }

    pub async fn update_group(
        &self,
        id: &str,
        patch: &DedicatedHostGroupPatch,
    ) -> Result<DedicatedHostGroup, ApiError> {
        self.client
            .patch(&format!("/dedicated_host/groups/{}", segment(id)), patch)
            .await
    }

    pub async fn delete_group(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/dedicated_host/groups/{}", segment(id)))
            .await
    }
}
