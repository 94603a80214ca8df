//! The workshop topology
//!
//! [`Stack::declare`] builds every resource descriptor from a
//! [`StackConfig`]. The disk attachment list is computed before the VMs are
//! constructed, so no descriptor is amended after it is built.

use crate::config::StackConfig;
use crate::resources::{
    AddressSpace, BackupInstance, BackupManagementType, BackupPolicy, ConnectionArgs,
    CreationData, DataDisk, DataStoreType, DatasourceInfo, DatasourceType, DiskCreateOption,
    HardwareProfile, ImageReference, IpAllocationMethod, IpConfiguration, ManagedDisk,
    NetworkInterface, NetworkInterfaceReference, NetworkProfile, OsProfile, PolicyRule, Property,
    ProtectedItemType, RecoveryVault, Reference, RemoteCommand, Resource, ResourceGroup,
    StorageProfile, StorageRedundancy, Subnet, VaultSku, VirtualMachine, VirtualNetwork, VmSize,
};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use workshop_common::tags::standard_tags;

/// Logical resource names
pub mod names {
    pub const RESOURCE_GROUP: &str = "workshop_rg";
    pub const VNET: &str = "vnet";
    pub const SUBNET: &str = "subnet";
    pub const NIC1: &str = "nic1";
    pub const NIC2: &str = "nic2";
    pub const VM1: &str = "vm1";
    pub const VM2: &str = "vm2";
    pub const INSTALL_NGINX_VM1: &str = "installNginxVm1";
    pub const INSTALL_NGINX_VM2: &str = "installNginxVm2";
    pub const MANAGED_DISK1: &str = "managedDisk1";
    pub const MANAGED_DISK2: &str = "managedDisk2";
    pub const BACKUP_VAULT: &str = "backupVault";
    pub const BACKUP_POLICY: &str = "backupPolicy";
    pub const DISK_PROTECTION1: &str = "diskProtection1";
    pub const DISK_PROTECTION2: &str = "diskProtection2";
}

/// Address space of the virtual network
pub const VNET_ADDRESS_PREFIX: &str = "10.0.0.0/16";

/// Subnet the NICs are placed in
pub const SUBNET_ADDRESS_PREFIX: &str = "10.0.1.0/24";

/// Command run on each VM after it boots
pub const INSTALL_NGINX_COMMAND: &str = "sudo apt update && sudo apt install -y nginx";

/// LUN used for the optional data disk
pub const DATA_DISK_LUN: u32 = 0;

/// Backup schedule: once a day at midnight, kept for 30 days
pub const BACKUP_RULE_NAME: &str = "DailyBackup";
pub const BACKUP_RUN_TIME: &str = "00:00:00";
pub const BACKUP_RETENTION_DAYS: u32 = 30;

/// An exported stack output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub key: &'static str,
    pub value: Reference,
}

/// The full set of declared resources plus the outputs to export
#[derive(Debug, Clone)]
pub struct Stack {
    deployment_id: String,
    resources: Vec<Resource>,
    outputs: Vec<OutputSpec>,
}

/// One VM with everything that hangs off it
struct VmDecl<'a> {
    vm: &'a str,
    nic: &'a str,
    ip_config: &'a str,
    install: &'a str,
    disk: &'a str,
    protection: &'a str,
}

const VMS: [VmDecl<'static>; 2] = [
    VmDecl {
        vm: names::VM1,
        nic: names::NIC1,
        ip_config: "ipconfig1",
        install: names::INSTALL_NGINX_VM1,
        disk: names::MANAGED_DISK1,
        protection: names::DISK_PROTECTION1,
    },
    VmDecl {
        vm: names::VM2,
        nic: names::NIC2,
        ip_config: "ipconfig2",
        install: names::INSTALL_NGINX_VM2,
        disk: names::MANAGED_DISK2,
        protection: names::DISK_PROTECTION2,
    },
];

impl Stack {
    /// Declare the topology with a fresh deployment ID
    pub fn declare(config: &StackConfig) -> Self {
        Self::declare_with_id(config, uuid::Uuid::new_v4().to_string())
    }

    /// Declare the topology for a known deployment ID
    pub fn declare_with_id(config: &StackConfig, deployment_id: impl Into<String>) -> Self {
        let deployment_id = deployment_id.into();
        let tags = standard_tags(&deployment_id, Utc::now());
        let creds = &config.credentials;
        let mut resources = Vec::new();

        // Network
        let rg = Resource::new(
            names::RESOURCE_GROUP,
            ResourceGroup {
                location: config.azure.location.clone(),
            },
        );
        let rg_name = rg.physical_name();

        let vnet = Resource::new(
            names::VNET,
            VirtualNetwork {
                resource_group_name: rg_name.clone(),
                address_space: AddressSpace {
                    address_prefixes: vec![VNET_ADDRESS_PREFIX.to_string()],
                },
            },
        );
        let subnet = Resource::new(
            names::SUBNET,
            Subnet {
                resource_group_name: rg_name.clone(),
                virtual_network_name: vnet.physical_name(),
                address_prefix: SUBNET_ADDRESS_PREFIX.to_string(),
            },
        );
        let subnet_id = subnet.id();
        resources.extend([rg, vnet, subnet]);

        // Storage
        for decl in &VMS {
            resources.push(Resource::new(
                decl.disk,
                ManagedDisk {
                    resource_group_name: rg_name.clone(),
                    disk_size_gb: config.disk_size_gb(),
                    creation_data: CreationData {
                        create_option: DiskCreateOption::Empty,
                    },
                },
            ));
        }

        // Compute + provisioning
        for decl in &VMS {
            let nic = Resource::new(
                decl.nic,
                NetworkInterface {
                    resource_group_name: rg_name.clone(),
                    ip_configurations: vec![IpConfiguration {
                        name: decl.ip_config.to_string(),
                        subnet_id: subnet_id.clone(),
                        private_ip_allocation_method: IpAllocationMethod::Dynamic,
                    }],
                },
            );

            let data_disks = data_disks_for(config.attach_disks(), decl.disk);
            debug!(vm = decl.vm, data_disks = data_disks.len(), "Declaring VM");

            let vm = Resource::new(
                decl.vm,
                VirtualMachine {
                    resource_group_name: rg_name.clone(),
                    network_profile: NetworkProfile {
                        network_interfaces: vec![NetworkInterfaceReference { id: nic.id() }],
                    },
                    hardware_profile: HardwareProfile {
                        vm_size: VmSize::StandardDs1V2,
                    },
                    os_profile: OsProfile {
                        computer_name: decl.vm.to_string(),
                        admin_username: creds.admin_username.clone(),
                        admin_password: creds.admin_password.clone(),
                    },
                    storage_profile: StorageProfile {
                        image_reference: ImageReference::ubuntu_18_04(),
                        data_disks,
                    },
                },
            );

            let install = Resource::new(
                decl.install,
                RemoteCommand {
                    connection: ConnectionArgs {
                        host: nic.output(Property::PrivateIpAddress),
                        user: creds.admin_username.clone(),
                        password: creds.admin_password.clone(),
                    },
                    create: INSTALL_NGINX_COMMAND.to_string(),
                },
            )
            .depends_on(decl.vm);

            resources.extend([nic, vm, install]);
        }

        // Backup
        let vault = Resource::new(
            names::BACKUP_VAULT,
            RecoveryVault {
                resource_group_name: rg_name.clone(),
                sku: VaultSku::Standard,
                backup_storage_redundancy: StorageRedundancy::LocallyRedundant,
            },
        );
        let policy = Resource::new(
            names::BACKUP_POLICY,
            BackupPolicy {
                resource_group_name: rg_name.clone(),
                vault_name: vault.physical_name(),
                policy_rule_list: vec![PolicyRule::daily(
                    BACKUP_RULE_NAME,
                    BACKUP_RUN_TIME,
                    BACKUP_RETENTION_DAYS,
                )],
            },
        );
        for decl in &VMS {
            resources.push(Resource::new(
                decl.protection,
                BackupInstance {
                    resource_group_name: rg_name.clone(),
                    vault_name: vault.physical_name(),
                    source_data_store: DataStoreType::Primary,
                    policy_id: policy.id(),
                    protected_item_type: ProtectedItemType::AzureDisks,
                    backup_management_type: BackupManagementType::AzureWorkload,
                    datasource_info: DatasourceInfo {
                        resource_id: Reference::new(decl.disk, Property::Id),
                        datasource_type: DatasourceType::AzureDisk,
                    },
                },
            ));
        }
        resources.extend([vault, policy]);

        let resources = resources
            .into_iter()
            .map(|r| r.with_tags(tags.clone()))
            .collect();

        let outputs = vec![
            OutputSpec {
                key: "vm1_name",
                value: Reference::new(names::VM1, Property::Name),
            },
            OutputSpec {
                key: "vm2_name",
                value: Reference::new(names::VM2, Property::Name),
            },
            OutputSpec {
                key: "managedDisk1_id",
                value: Reference::new(names::MANAGED_DISK1, Property::Id),
            },
            OutputSpec {
                key: "managedDisk2_id",
                value: Reference::new(names::MANAGED_DISK2, Property::Id),
            },
        ];

        Self {
            deployment_id,
            resources,
            outputs,
        }
    }

    /// Build a stack from an arbitrary set of resources
    pub fn from_resources(
        deployment_id: impl Into<String>,
        resources: Vec<Resource>,
        outputs: Vec<OutputSpec>,
    ) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            resources,
            outputs,
        }
    }

    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name() == name)
    }

    /// Declaration warnings (provider-incompatible property combinations)
    pub fn lint(&self) -> BTreeMap<String, Vec<String>> {
        self.resources
            .iter()
            .filter_map(|r| match r.spec() {
                crate::resources::ResourceSpec::BackupInstance(b) => {
                    let warnings = b.lint();
                    (!warnings.is_empty()).then(|| (r.name().to_string(), warnings))
                }
                _ => None,
            })
            .collect()
    }

    /// Log every lint warning
    pub fn log_lint_warnings(&self) {
        for (resource, warnings) in self.lint() {
            for warning in warnings {
                warn!(resource = %resource, "{warning}");
            }
        }
    }
}

/// Data disks for one VM: the paired managed disk at LUN 0 when attaching,
/// nothing otherwise
fn data_disks_for(attach: bool, disk: &str) -> Vec<DataDisk> {
    if attach {
        vec![DataDisk::attach(
            DATA_DISK_LUN,
            Reference::new(disk, Property::Id),
        )]
    } else {
        Vec::new()
    }
}
