//! Provider data structure passed to resources and data sources

use crate::api::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct IbmProviderData {
    pub client: Arc<Client>,
    pub region: String,
}

impl IbmProviderData {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            region: region.into(),
        }
    }
}
