//! Read-only VPC lookups

pub mod data_source_bare_metal_server;
pub mod data_source_bare_metal_servers;
pub mod data_source_cluster_network;
pub mod data_source_dedicated_host;
pub mod data_source_dedicated_hosts;
pub mod data_source_lb;
pub mod data_source_subnet;
pub mod data_source_subnets;
pub mod data_source_vpc;
pub mod data_source_vpn_gateway;

pub use data_source_bare_metal_server::BareMetalServerDataSource;
pub use data_source_bare_metal_servers::BareMetalServersDataSource;
pub use data_source_cluster_network::ClusterNetworkDataSource;
pub use data_source_dedicated_host::DedicatedHostDataSource;
pub use data_source_dedicated_hosts::DedicatedHostsDataSource;
pub use data_source_lb::LoadBalancerDataSource;
pub use data_source_subnet::SubnetDataSource;
pub use data_source_subnets::SubnetsDataSource;
pub use data_source_vpc::VpcDataSource;
pub use data_source_vpn_gateway::VpnGatewayDataSource;
