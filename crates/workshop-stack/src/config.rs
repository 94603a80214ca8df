//! Configuration types for the stack
//!
//! Values come from three places, later ones winning:
//! 1. built-in defaults ([`workshop_common::defaults`])
//! 2. the JSON stack config file (`diskSize`, `attachDisks`, ...)
//! 3. command-line flags
//!
//! Credentials come from the `ADMIN_USERNAME` / `ADMIN_PASSWORD`
//! environment variables.

use crate::error::ConfigError;
use crate::resources::Secret;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use workshop_common::defaults::{
    DEFAULT_ADMIN_USERNAME, DEFAULT_DISK_SIZE_GB, DEFAULT_LOCATION, DEFAULT_SUBSCRIPTION_ID,
    PLACEHOLDER_ADMIN_PASSWORD, default_disk_size_gb, default_location, default_subscription_id,
};

/// Environment variable holding the VM admin username
pub const ENV_ADMIN_USERNAME: &str = "ADMIN_USERNAME";

/// Environment variable holding the VM admin password
pub const ENV_ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";

/// What to do when no admin password is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordPolicy {
    /// Refuse to continue
    #[default]
    RequireExplicit,
    /// Fall back to [`PLACEHOLDER_ADMIN_PASSWORD`]
    AllowPlaceholder,
}

/// VM admin credentials
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub admin_username: String,
    pub admin_password: Secret,
}

impl Credentials {
    /// Resolve credentials from optional inputs.
    ///
    /// A missing or empty username falls back to `azureuser`. A missing or
    /// empty password is an error unless `policy` allows the placeholder.
    pub fn resolve(
        username: Option<String>,
        password: Option<String>,
        policy: PasswordPolicy,
    ) -> Result<Self, ConfigError> {
        let admin_username = username
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());

        let admin_password = match (password, policy) {
            (Some(p), _) if !p.is_empty() => p,
            (_, PasswordPolicy::AllowPlaceholder) => PLACEHOLDER_ADMIN_PASSWORD.to_string(),
            (_, PasswordPolicy::RequireExplicit) => return Err(ConfigError::MissingPassword),
        };

        Ok(Self {
            admin_username,
            admin_password: Secret::new(admin_password),
        })
    }

    /// Resolve credentials from `ADMIN_USERNAME` / `ADMIN_PASSWORD`
    pub fn from_env(policy: PasswordPolicy) -> Result<Self, ConfigError> {
        Self::resolve(
            std::env::var(ENV_ADMIN_USERNAME).ok(),
            std::env::var(ENV_ADMIN_PASSWORD).ok(),
            policy,
        )
    }
}

/// Contents of the JSON stack config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackSettings {
    /// Managed disk size in GB
    pub disk_size: Option<u32>,
    /// Attach each managed disk to its VM
    pub attach_disks: Option<bool>,
    pub location: Option<String>,
    pub subscription_id: Option<String>,
}

impl StackSettings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from `path`, treating a missing file as empty settings
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Default config file location (`<config dir>/workshop-stack/stack.json`)
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "workshop-stack").map(|dirs| dirs.config_dir().join("stack.json"))
    }
}

/// Managed disk settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub disk_size_gb: u32,
    pub attach_disks: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            disk_size_gb: default_disk_size_gb(),
            attach_disks: false,
        }
    }
}

/// Azure placement settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    pub location: String,
    /// Only used to shape simulated resource IDs
    pub subscription_id: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            subscription_id: default_subscription_id(),
        }
    }
}

/// Command-line overrides, applied on top of the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub disk_size: Option<u32>,
    pub attach_disks: Option<bool>,
    pub location: Option<String>,
}

/// Full configuration for declaring the stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    pub credentials: Credentials,
    pub storage: StorageConfig,
    pub azure: AzureConfig,
}

impl StackConfig {
    /// Config with default storage and placement
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            storage: StorageConfig::default(),
            azure: AzureConfig::default(),
        }
    }

    /// Merge file settings and CLI overrides on top of the defaults
    pub fn from_parts(
        credentials: Credentials,
        settings: StackSettings,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            credentials,
            storage: StorageConfig {
                disk_size_gb: overrides
                    .disk_size
                    .or(settings.disk_size)
                    .unwrap_or(DEFAULT_DISK_SIZE_GB),
                attach_disks: overrides
                    .attach_disks
                    .or(settings.attach_disks)
                    .unwrap_or(false),
            },
            azure: AzureConfig {
                location: overrides
                    .location
                    .or(settings.location)
                    .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
                subscription_id: settings
                    .subscription_id
                    .unwrap_or_else(|| DEFAULT_SUBSCRIPTION_ID.to_string()),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.disk_size_gb == 0 {
            return Err(ConfigError::InvalidDiskSize(0));
        }
        if self.azure.location.is_empty() {
            return Err(ConfigError::EmptyLocation);
        }
        Ok(())
    }

    pub fn disk_size_gb(&self) -> u32 {
        self.storage.disk_size_gb
    }

    pub fn attach_disks(&self) -> bool {
        self.storage.attach_disks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn creds() -> Credentials {
        Credentials::resolve(None, Some("s3cret!".to_string()), PasswordPolicy::RequireExplicit)
            .unwrap()
    }

    #[test]
    fn test_missing_password_fails_fast() {
        let err = Credentials::resolve(None, None, PasswordPolicy::RequireExplicit).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPassword));

        let err = Credentials::resolve(None, Some(String::new()), PasswordPolicy::RequireExplicit)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingPassword));
    }

    #[test]
    fn test_placeholder_defaults_verbatim() {
        let c = Credentials::resolve(None, None, PasswordPolicy::AllowPlaceholder).unwrap();
        assert_eq!(c.admin_username, "azureuser");
        assert_eq!(c.admin_password.expose(), "P@ssw0rd1234");
    }

    #[test]
    fn test_explicit_credentials_win() {
        let c = Credentials::resolve(
            Some("ops".to_string()),
            Some("hunter2".to_string()),
            PasswordPolicy::AllowPlaceholder,
        )
        .unwrap();
        assert_eq!(c.admin_username, "ops");
        assert_eq!(c.admin_password.expose(), "hunter2");
    }

    #[test]
    fn test_empty_username_falls_back_to_default() {
        let creds = Credentials::resolve(
            Some(String::new()),
            Some("pw".to_string()),
            PasswordPolicy::RequireExplicit,
        )
        .unwrap();
        assert_eq!(creds.admin_username, "azureuser");
    }

    #[test]
    fn test_defaults() {
        let config =
            StackConfig::from_parts(creds(), StackSettings::default(), Overrides::default())
                .unwrap();
        assert_eq!(config.disk_size_gb(), 100);
        assert!(!config.attach_disks());
        assert_eq!(config.azure.location, "eastus");
    }

    #[test]
    fn test_load_settings() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "diskSize": 250, "attachDisks": true }}"#).unwrap();

        let settings = StackSettings::load(file.path()).unwrap();
        assert_eq!(settings.disk_size, Some(250));
        assert_eq!(settings.attach_disks, Some(true));

        let config = StackConfig::from_parts(creds(), settings, Overrides::default()).unwrap();
        assert_eq!(config.disk_size_gb(), 250);
        assert!(config.attach_disks());
    }

    #[test]
    fn test_overrides_beat_file() {
        let settings = StackSettings {
            disk_size: Some(250),
            attach_disks: Some(true),
            ..Default::default()
        };
        let overrides = Overrides {
            disk_size: Some(64),
            attach_disks: Some(false),
            location: Some("westeurope".to_string()),
        };
        let config = StackConfig::from_parts(creds(), settings, overrides).unwrap();
        assert_eq!(config.disk_size_gb(), 64);
        assert!(!config.attach_disks());
        assert_eq!(config.azure.location, "westeurope");
    }

    #[test]
    fn test_zero_disk_size_rejected() {
        let overrides = Overrides {
            disk_size: Some(0),
            ..Default::default()
        };
        let err = StackConfig::from_parts(creds(), StackSettings::default(), overrides)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDiskSize(0)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "diskSise": 250 }}"#).unwrap();
        assert!(matches!(
            StackSettings::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StackSettings::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, StackSettings::default());
    }
}
