//! Remote provisioning command run against a VM

use super::{Reference, Secret};
use serde::Serialize;

/// Where and as whom to run a remote command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionArgs {
    /// Private IP of the VM's network interface
    pub host: Reference,
    pub user: String,
    pub password: Secret,
}

/// Shell command executed once over SSH when the resource is created
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommand {
    pub connection: ConnectionArgs,
    pub create: String,
}
