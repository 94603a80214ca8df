//! Backup layer: recovery vault, backup policy and disk backup instances

use super::Reference;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum VaultSku {
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum StorageRedundancy {
    LocallyRedundant,
    GeoRedundant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryVault {
    pub resource_group_name: Reference,
    pub sku: VaultSku,
    pub backup_storage_redundancy: StorageRedundancy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum ScheduleFrequency {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePolicy {
    pub schedule_frequency: ScheduleFrequency,
    /// Times of day in `HH:MM:SS`
    pub schedule_run_times: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum DurationType {
    Days,
    Weeks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionDuration {
    pub count: u32,
    pub duration_type: DurationType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    pub daily_retention: RetentionDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub name: String,
    pub schedule_policy: SchedulePolicy,
    pub retention_policy: RetentionPolicy,
}

impl PolicyRule {
    /// One backup a day at `run_time`, kept for `days` days
    pub fn daily(name: impl Into<String>, run_time: impl Into<String>, days: u32) -> Self {
        Self {
            name: name.into(),
            schedule_policy: SchedulePolicy {
                schedule_frequency: ScheduleFrequency::Daily,
                schedule_run_times: vec![run_time.into()],
            },
            retention_policy: RetentionPolicy {
                daily_retention: RetentionDuration {
                    count: days,
                    duration_type: DurationType::Days,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPolicy {
    pub resource_group_name: Reference,
    pub vault_name: Reference,
    pub policy_rule_list: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum DataStoreType {
    #[serde(rename = "PRIMARY")]
    #[strum(serialize = "PRIMARY")]
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum ProtectedItemType {
    AzureDisks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum BackupManagementType {
    AzureIaasVM,
    AzureWorkload,
    AzureStorage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum DatasourceType {
    AzureDisk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceInfo {
    pub resource_id: Reference,
    pub datasource_type: DatasourceType,
}

/// Binds one managed disk to the backup policy under the vault
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInstance {
    pub resource_group_name: Reference,
    pub vault_name: Reference,
    pub source_data_store: DataStoreType,
    pub policy_id: Reference,
    pub protected_item_type: ProtectedItemType,
    pub backup_management_type: BackupManagementType,
    pub datasource_info: DatasourceInfo,
}

impl BackupInstance {
    /// Report field combinations the provider is known to reject.
    ///
    /// Disk datasources are not managed by the workload backup engine, so
    /// `AzureWorkload` paired with `AzureDisks` is flagged.
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.protected_item_type == ProtectedItemType::AzureDisks
            && self.backup_management_type == BackupManagementType::AzureWorkload
        {
            warnings.push(format!(
                "backupManagementType {} does not manage {} datasources",
                self.backup_management_type, self.protected_item_type
            ));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Property;

    fn instance(management: BackupManagementType) -> BackupInstance {
        BackupInstance {
            resource_group_name: Reference::new("rg", Property::Name),
            vault_name: Reference::new("vault", Property::Name),
            source_data_store: DataStoreType::Primary,
            policy_id: Reference::new("policy", Property::Id),
            protected_item_type: ProtectedItemType::AzureDisks,
            backup_management_type: management,
            datasource_info: DatasourceInfo {
                resource_id: Reference::new("disk", Property::Id),
                datasource_type: DatasourceType::AzureDisk,
            },
        }
    }

    #[test]
    fn test_daily_rule() {
        let rule = PolicyRule::daily("DailyBackup", "00:00:00", 30);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["schedulePolicy"]["scheduleFrequency"], "Daily");
        assert_eq!(json["schedulePolicy"]["scheduleRunTimes"][0], "00:00:00");
        assert_eq!(json["retentionPolicy"]["dailyRetention"]["count"], 30);
        assert_eq!(
            json["retentionPolicy"]["dailyRetention"]["durationType"],
            "Days"
        );
    }

    #[test]
    fn test_instance_wire_values() {
        let json = serde_json::to_value(instance(BackupManagementType::AzureWorkload)).unwrap();
        assert_eq!(json["sourceDataStore"], "PRIMARY");
        assert_eq!(json["protectedItemType"], "AzureDisks");
        assert_eq!(json["backupManagementType"], "AzureWorkload");
        assert_eq!(json["datasourceInfo"]["datasourceType"], "AzureDisk");
        assert_eq!(json["datasourceInfo"]["resourceId"], "${disk.id}");
    }

    #[test]
    fn test_lint_flags_workload_disk_pairing() {
        assert_eq!(instance(BackupManagementType::AzureWorkload).lint().len(), 1);
        assert!(instance(BackupManagementType::AzureIaasVM).lint().is_empty());
    }
}
