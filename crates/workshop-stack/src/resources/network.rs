//! Network layer: resource group, virtual network, subnet and NICs

use super::Reference;
use serde::Serialize;

/// Resource group that scopes every other resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetwork {
    pub resource_group_name: Reference,
    pub address_space: AddressSpace,
}

/// Subnet, addressed under its virtual network
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub resource_group_name: Reference,
    pub virtual_network_name: Reference,
    /// CIDR block, e.g. `10.0.1.0/24`
    pub address_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum IpAllocationMethod {
    Dynamic,
    Static,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfiguration {
    pub name: String,
    pub subnet_id: Reference,
    pub private_ip_allocation_method: IpAllocationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub resource_group_name: Reference,
    pub ip_configurations: Vec<IpConfiguration>,
}

impl NetworkInterface {
    /// Subnet the primary IP configuration is placed in
    pub fn primary_subnet(&self) -> Option<&Reference> {
        self.ip_configurations.first().map(|c| &c.subnet_id)
    }
}
