//! Typed resource descriptors
//!
//! Each descriptor mirrors the shape the provider's control plane expects.
//! Field names serialize in camelCase and enum values are emitted verbatim
//! (`Empty`, `Attach`, `Daily`, `Days`, `PRIMARY`, ...).
//!
//! Cross-resource values are [`Reference`]s rather than strings, so the
//! dependency graph can be read straight off the descriptors and nothing is
//! resolved until the referenced resource exists.

pub mod backup;
pub mod command;
pub mod compute;
pub mod network;
mod reference;
mod secret;

pub use backup::{
    BackupInstance, BackupManagementType, BackupPolicy, DataStoreType, DatasourceInfo,
    DatasourceType, DurationType, PolicyRule, ProtectedItemType, RecoveryVault, RetentionDuration,
    RetentionPolicy, ScheduleFrequency, SchedulePolicy, StorageRedundancy, VaultSku,
};
pub use command::{ConnectionArgs, RemoteCommand};
pub use compute::{
    CreationData, DataDisk, DiskCreateOption, HardwareProfile, ImageReference, ManagedDisk,
    ManagedDiskParameters, NetworkInterfaceReference, NetworkProfile, OsProfile, StorageProfile,
    VirtualMachine, VmSize,
};
pub use network::{
    AddressSpace, IpAllocationMethod, IpConfiguration, NetworkInterface, ResourceGroup, Subnet,
    VirtualNetwork,
};
pub use reference::{Property, Reference};
pub use secret::Secret;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use workshop_common::ResourceKind;

/// Provider-specific properties of a declared resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceSpec {
    ResourceGroup(ResourceGroup),
    VirtualNetwork(VirtualNetwork),
    Subnet(Subnet),
    NetworkInterface(NetworkInterface),
    ManagedDisk(ManagedDisk),
    VirtualMachine(VirtualMachine),
    RemoteCommand(RemoteCommand),
    RecoveryVault(RecoveryVault),
    BackupPolicy(BackupPolicy),
    BackupInstance(BackupInstance),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::ResourceGroup(_) => ResourceKind::ResourceGroup,
            ResourceSpec::VirtualNetwork(_) => ResourceKind::VirtualNetwork,
            ResourceSpec::Subnet(_) => ResourceKind::Subnet,
            ResourceSpec::NetworkInterface(_) => ResourceKind::NetworkInterface,
            ResourceSpec::ManagedDisk(_) => ResourceKind::ManagedDisk,
            ResourceSpec::VirtualMachine(_) => ResourceKind::VirtualMachine,
            ResourceSpec::RemoteCommand(_) => ResourceKind::RemoteCommand,
            ResourceSpec::RecoveryVault(_) => ResourceKind::RecoveryVault,
            ResourceSpec::BackupPolicy(_) => ResourceKind::BackupPolicy,
            ResourceSpec::BackupInstance(_) => ResourceKind::BackupInstance,
        }
    }

    /// All references held by this spec, in field order
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            ResourceSpec::ResourceGroup(_) => Vec::new(),
            ResourceSpec::VirtualNetwork(v) => vec![&v.resource_group_name],
            ResourceSpec::Subnet(s) => vec![&s.resource_group_name, &s.virtual_network_name],
            ResourceSpec::NetworkInterface(n) => {
                let mut refs = vec![&n.resource_group_name];
                refs.extend(n.ip_configurations.iter().map(|c| &c.subnet_id));
                refs
            }
            ResourceSpec::ManagedDisk(d) => vec![&d.resource_group_name],
            ResourceSpec::VirtualMachine(vm) => {
                let mut refs = vec![&vm.resource_group_name];
                refs.extend(vm.network_profile.network_interfaces.iter().map(|n| &n.id));
                refs.extend(
                    vm.storage_profile
                        .data_disks
                        .iter()
                        .map(|d| &d.managed_disk.id),
                );
                refs
            }
            ResourceSpec::RemoteCommand(c) => vec![&c.connection.host],
            ResourceSpec::RecoveryVault(v) => vec![&v.resource_group_name],
            ResourceSpec::BackupPolicy(p) => vec![&p.resource_group_name, &p.vault_name],
            ResourceSpec::BackupInstance(b) => vec![
                &b.resource_group_name,
                &b.vault_name,
                &b.policy_id,
                &b.datasource_info.resource_id,
            ],
        }
    }

    /// Reference to the containing resource group's name
    pub fn resource_group(&self) -> Option<&Reference> {
        match self {
            ResourceSpec::ResourceGroup(_) | ResourceSpec::RemoteCommand(_) => None,
            ResourceSpec::VirtualNetwork(v) => Some(&v.resource_group_name),
            ResourceSpec::Subnet(s) => Some(&s.resource_group_name),
            ResourceSpec::NetworkInterface(n) => Some(&n.resource_group_name),
            ResourceSpec::ManagedDisk(d) => Some(&d.resource_group_name),
            ResourceSpec::VirtualMachine(vm) => Some(&vm.resource_group_name),
            ResourceSpec::RecoveryVault(v) => Some(&v.resource_group_name),
            ResourceSpec::BackupPolicy(p) => Some(&p.resource_group_name),
            ResourceSpec::BackupInstance(b) => Some(&b.resource_group_name),
        }
    }

    /// Logical name of the resource this one is addressed under, if any
    pub fn parent(&self) -> Option<&str> {
        match self {
            ResourceSpec::Subnet(s) => Some(s.virtual_network_name.target()),
            ResourceSpec::BackupPolicy(p) => Some(p.vault_name.target()),
            ResourceSpec::BackupInstance(b) => Some(b.vault_name.target()),
            _ => None,
        }
    }
}

/// A declared resource: logical name, tags and typed properties
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    name: String,
    tags: BTreeMap<String, String>,
    spec: ResourceSpec,
    /// Ordering edges that are not carried by any reference
    depends_on: BTreeSet<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, spec: impl Into<ResourceSpec>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            spec: spec.into(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Add an ordering edge to a resource that is not otherwise referenced
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.insert(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Every resource that must exist before this one: reference targets
    /// plus explicit edges
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.spec
            .references()
            .into_iter()
            .map(|r| r.target().to_string())
            .chain(self.depends_on.iter().cloned())
            .collect()
    }

    /// Reference to one of this resource's outputs
    pub fn output(&self, property: Property) -> Reference {
        Reference::new(&self.name, property)
    }

    pub fn id(&self) -> Reference {
        self.output(Property::Id)
    }

    pub fn physical_name(&self) -> Reference {
        self.output(Property::Name)
    }
}

macro_rules! impl_into_spec {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for ResourceSpec {
                fn from(value: $ty) -> Self {
                    ResourceSpec::$ty(value)
                }
            }
        )*
    };
}

impl_into_spec!(
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    NetworkInterface,
    ManagedDisk,
    VirtualMachine,
    RemoteCommand,
    RecoveryVault,
    BackupPolicy,
    BackupInstance,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn rg() -> Resource {
        Resource::new(
            "rg",
            ResourceGroup {
                location: "eastus".to_string(),
            },
        )
    }

    #[test]
    fn test_dependencies_from_references() {
        let group = rg();
        let vnet = Resource::new(
            "vnet",
            VirtualNetwork {
                resource_group_name: group.physical_name(),
                address_space: AddressSpace {
                    address_prefixes: vec!["10.0.0.0/16".to_string()],
                },
            },
        );

        assert!(group.dependencies().is_empty());
        assert_eq!(vnet.dependencies(), BTreeSet::from(["rg".to_string()]));
        assert_eq!(vnet.kind(), ResourceKind::VirtualNetwork);
    }

    #[test]
    fn test_explicit_edges_are_merged() {
        let group = rg().depends_on("elsewhere");
        assert_eq!(
            group.dependencies(),
            BTreeSet::from(["elsewhere".to_string()])
        );
    }

    #[test]
    fn test_child_parent() {
        let subnet = Subnet {
            resource_group_name: Reference::new("rg", Property::Name),
            virtual_network_name: Reference::new("vnet", Property::Name),
            address_prefix: "10.0.1.0/24".to_string(),
        };
        assert_eq!(ResourceSpec::from(subnet).parent(), Some("vnet"));
    }
}
