//! Managed VPC resources

pub mod resource_dedicated_host;
pub mod resource_dedicated_host_group;
pub mod resource_subnet;
pub mod resource_subnet_reserved_ip;
pub mod resource_virtual_network_interface;
pub mod resource_vpn_gateway;

pub use resource_dedicated_host::DedicatedHostResource;
pub use resource_dedicated_host_group::DedicatedHostGroupResource;
pub use resource_subnet::SubnetResource;
pub use resource_subnet_reserved_ip::SubnetReservedIpResource;
pub use resource_virtual_network_interface::VirtualNetworkInterfaceResource;
pub use resource_vpn_gateway::VpnGatewayResource;
