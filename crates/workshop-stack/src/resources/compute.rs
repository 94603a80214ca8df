//! Compute and storage: VMs, managed disks and data disk attachments

use super::{Reference, Secret};
use serde::Serialize;

/// VM hardware size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum VmSize {
    #[serde(rename = "Standard_DS1_v2")]
    #[strum(serialize = "Standard_DS1_v2")]
    StandardDs1V2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: VmSize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceReference {
    pub id: Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub network_interfaces: Vec<NetworkInterfaceReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    pub computer_name: String,
    pub admin_username: String,
    pub admin_password: Secret,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl ImageReference {
    /// Canonical Ubuntu Server 18.04 LTS, latest build
    pub fn ubuntu_18_04() -> Self {
        Self {
            publisher: "Canonical".to_string(),
            offer: "UbuntuServer".to_string(),
            sku: "18.04-LTS".to_string(),
            version: "latest".to_string(),
        }
    }
}

/// How a disk comes into existence (`createOption`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum DiskCreateOption {
    /// Blank disk
    Empty,
    /// Existing managed disk attached to a VM
    Attach,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParameters {
    pub id: Reference,
}

/// A managed disk attached to a VM at a LUN
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub lun: u32,
    pub create_option: DiskCreateOption,
    pub managed_disk: ManagedDiskParameters,
}

impl DataDisk {
    /// Attach an existing managed disk at `lun`
    pub fn attach(lun: u32, disk_id: Reference) -> Self {
        Self {
            lun,
            create_option: DiskCreateOption::Attach,
            managed_disk: ManagedDiskParameters { id: disk_id },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    pub image_reference: ImageReference,
    pub data_disks: Vec<DataDisk>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    pub resource_group_name: Reference,
    pub network_profile: NetworkProfile,
    pub hardware_profile: HardwareProfile,
    pub os_profile: OsProfile,
    pub storage_profile: StorageProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationData {
    pub create_option: DiskCreateOption,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDisk {
    pub resource_group_name: Reference,
    pub disk_size_gb: u32,
    pub creation_data: CreationData,
}
