//! Default configuration values
//!
//! These constants keep the CLI, the config file loader and the stack
//! declaration in agreement.

/// Admin username used when `ADMIN_USERNAME` is unset
pub const DEFAULT_ADMIN_USERNAME: &str = "azureuser";

/// Legacy placeholder password, only used with `--allow-default-password`
pub const PLACEHOLDER_ADMIN_PASSWORD: &str = "P@ssw0rd1234";

/// Default managed disk size in GB
pub const DEFAULT_DISK_SIZE_GB: u32 = 100;

/// Default Azure location
pub const DEFAULT_LOCATION: &str = "eastus";

/// Subscription used to shape simulated resource IDs
pub const DEFAULT_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Default timeout for the remote provisioning command in seconds (10 minutes)
pub const DEFAULT_PROVISION_TIMEOUT: u64 = 600;

/// Default SSH connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 30;

// Serde default functions for struct field defaults

/// Returns the default disk size
pub fn default_disk_size_gb() -> u32 {
    DEFAULT_DISK_SIZE_GB
}

/// Returns the default location
pub fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

/// Returns the default subscription ID
pub fn default_subscription_id() -> String {
    DEFAULT_SUBSCRIPTION_ID.to_string()
}
