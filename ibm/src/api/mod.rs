//! IBM Cloud VPC REST API client
//!
//! `Client` owns authentication, retries and the HTTP connection settings. Each
//! collection gets a borrowed sub-API (`client.subnets()`, `client.vpcs()`, ...)
//! exposing typed list/get/create/update/delete calls.

pub mod auth;
pub mod bare_metal_servers;
pub mod client;
pub mod cluster_networks;
pub mod common;
pub mod dedicated_hosts;
pub mod error;
pub mod load_balancers;
pub mod pagination;
pub mod subnets;
pub mod virtual_network_interfaces;
pub mod vpcs;
pub mod vpn_gateways;

pub use auth::AuthMethod;
pub use client::{Client, RetryConfig};
pub use error::ApiError;
pub use pagination::{Named, Page};
