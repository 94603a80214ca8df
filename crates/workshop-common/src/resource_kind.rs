//! Azure resource kinds and ordering
//!
//! Provides a consistent ordering between kinds. The dependency graph is the
//! source of truth for what must exist first; the priority here only breaks
//! ties between resources that are ready at the same time, so that every
//! plan comes out in the same order.

/// Types of resources declared by the workshop stack
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResourceKind {
    /// Container for every other resource
    ResourceGroup,
    /// Address space for the subnet
    VirtualNetwork,
    /// Subnet inside the virtual network
    Subnet,
    /// NIC with a dynamically allocated private IP
    NetworkInterface,
    /// Managed data disk
    ManagedDisk,
    /// Virtual machine (depends on its NIC, and on its disk when attached)
    VirtualMachine,
    /// Remote shell command run against a VM after it boots
    RemoteCommand,
    /// Recovery services vault
    RecoveryVault,
    /// Backup policy inside the vault
    BackupPolicy,
    /// Backup instance binding one disk to the policy
    BackupInstance,
}

impl ResourceKind {
    /// Get create priority (lower number = created first among ready resources)
    ///
    /// - 0: Resource group
    /// - 1-3: Network layer
    /// - 4: Managed disks (independent of compute)
    /// - 5: Virtual machines
    /// - 6: Remote commands (need a booted VM)
    /// - 7-9: Backup layer
    pub fn create_priority(self) -> u8 {
        match self {
            ResourceKind::ResourceGroup => 0,
            ResourceKind::VirtualNetwork => 1,
            ResourceKind::Subnet => 2,
            ResourceKind::NetworkInterface => 3,
            ResourceKind::ManagedDisk => 4,
            ResourceKind::VirtualMachine => 5,
            ResourceKind::RemoteCommand => 6,
            ResourceKind::RecoveryVault => 7,
            ResourceKind::BackupPolicy => 8,
            ResourceKind::BackupInstance => 9,
        }
    }

    /// ARM resource type, or `None` for resources that live outside Azure
    pub fn azure_type(self) -> Option<&'static str> {
        match self {
            ResourceKind::ResourceGroup => Some("Microsoft.Resources/resourceGroups"),
            ResourceKind::VirtualNetwork => Some("Microsoft.Network/virtualNetworks"),
            ResourceKind::Subnet => Some("Microsoft.Network/virtualNetworks/subnets"),
            ResourceKind::NetworkInterface => Some("Microsoft.Network/networkInterfaces"),
            ResourceKind::ManagedDisk => Some("Microsoft.Compute/disks"),
            ResourceKind::VirtualMachine => Some("Microsoft.Compute/virtualMachines"),
            ResourceKind::RemoteCommand => None,
            ResourceKind::RecoveryVault => Some("Microsoft.RecoveryServices/vaults"),
            ResourceKind::BackupPolicy => {
                Some("Microsoft.DataProtection/backupVaults/backupPolicies")
            }
            ResourceKind::BackupInstance => {
                Some("Microsoft.DataProtection/backupVaults/backupInstances")
            }
        }
    }

    /// Last path segment used when building a resource ID under its parent
    /// (e.g. `virtualMachines` in `.../Microsoft.Compute/virtualMachines/vm1`)
    pub fn id_segment(self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resourceGroups",
            ResourceKind::VirtualNetwork => "Microsoft.Network/virtualNetworks",
            ResourceKind::Subnet => "subnets",
            ResourceKind::NetworkInterface => "Microsoft.Network/networkInterfaces",
            ResourceKind::ManagedDisk => "Microsoft.Compute/disks",
            ResourceKind::VirtualMachine => "Microsoft.Compute/virtualMachines",
            ResourceKind::RemoteCommand => "commands",
            ResourceKind::RecoveryVault => "Microsoft.RecoveryServices/vaults",
            ResourceKind::BackupPolicy => "backupPolicies",
            ResourceKind::BackupInstance => "backupInstances",
        }
    }

    /// Whether the resource is addressed relative to a parent resource
    /// rather than directly under the resource group
    pub fn is_child(self) -> bool {
        matches!(
            self,
            ResourceKind::Subnet | ResourceKind::BackupPolicy | ResourceKind::BackupInstance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_network_before_compute() {
        assert!(
            ResourceKind::NetworkInterface.create_priority()
                < ResourceKind::VirtualMachine.create_priority(),
            "NICs must be created before the VMs that use them"
        );
    }

    #[test]
    fn test_disks_before_backup_instances() {
        assert!(
            ResourceKind::ManagedDisk.create_priority()
                < ResourceKind::BackupInstance.create_priority()
        );
    }

    #[test]
    fn test_priorities_are_distinct() {
        let mut seen: Vec<u8> = ResourceKind::iter().map(|k| k.create_priority()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), ResourceKind::iter().count());
    }

    #[test]
    fn test_kebab_case_names() {
        assert_eq!(ResourceKind::ManagedDisk.to_string(), "managed-disk");
        assert_eq!(
            ResourceKind::from_str("backup-instance").unwrap(),
            ResourceKind::BackupInstance
        );
    }

    #[test]
    fn test_serde_matches_display() {
        for kind in ResourceKind::iter() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_only_remote_command_lacks_azure_type() {
        for kind in ResourceKind::iter() {
            assert_eq!(
                kind.azure_type().is_none(),
                kind == ResourceKind::RemoteCommand,
                "{kind}"
            );
        }
    }
}
