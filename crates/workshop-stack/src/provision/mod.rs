//! Remote provisioning transport
//!
//! The deployment driver hands each remote command to a
//! [`CommandTransport`]. Two transports ship with the crate:
//!
//! - [`SshTransport`]: runs the command over `ssh` (password auth through
//!   `sshpass`), streaming output into tracing
//! - [`DryRunTransport`]: records what would run and reports success
//!
//! A non-zero exit fails the step. Nothing is retried.

mod ssh;

pub use ssh::{CommandConfig, SshTransport};

use crate::error::{DeployError, TransportError};
use crate::resources::{ResourceSpec, Secret};
use crate::stack::Stack;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Resolved connection details for one host
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub host: String,
    pub user: String,
    pub password: Secret,
}

/// Output captured from a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Executes a shell command on a remote host
pub trait CommandTransport: Send + Sync {
    fn run(
        &self,
        connection: &Connection,
        command: &str,
    ) -> impl Future<Output = Result<CommandOutput, TransportError>> + Send;
}

/// A command the dry-run transport was asked to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub host: String,
    pub user: String,
    pub command: String,
}

/// Transport that records commands instead of running them
#[derive(Debug, Default)]
pub struct DryRunTransport {
    recorded: Mutex<Vec<RecordedCommand>>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands seen so far, in call order
    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandTransport for DryRunTransport {
    async fn run(
        &self,
        connection: &Connection,
        command: &str,
    ) -> Result<CommandOutput, TransportError> {
        info!(
            host = %connection.host,
            user = %connection.user,
            command,
            "Would run remote command"
        );
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCommand {
                host: connection.host.clone(),
                user: connection.user.clone(),
                command: command.to_string(),
            });
        Ok(CommandOutput::default())
    }
}

/// Run every remote command in `stack` against operator-supplied hosts.
///
/// `hosts` maps a VM name to the address to connect to. Each command runs
/// against the VM it depends on, in plan order, one at a time. The first
/// failure stops the run.
pub async fn run_on_hosts<T: CommandTransport>(
    stack: &Stack,
    hosts: &BTreeMap<String, String>,
    transport: &T,
) -> Result<Vec<(String, CommandOutput)>, DeployError> {
    let plan = crate::graph::DependencyGraph::build(stack.resources())?.plan()?;
    let mut results = Vec::new();

    for step in &plan.steps {
        let Some(resource) = stack.get(&step.name) else {
            continue;
        };
        let ResourceSpec::RemoteCommand(command) = resource.spec() else {
            continue;
        };

        let machine = step
            .depends_on
            .iter()
            .find(|dep| {
                stack
                    .get(dep)
                    .is_some_and(|r| r.kind() == workshop_common::ResourceKind::VirtualMachine)
            })
            .cloned()
            .unwrap_or_default();
        let host = hosts.get(&machine).ok_or_else(|| DeployError::MissingHost {
            resource: step.name.clone(),
            machine: machine.clone(),
        })?;

        let connection = Connection {
            host: host.clone(),
            user: command.connection.user.clone(),
            password: command.connection.password.clone(),
        };
        info!(resource = %step.name, machine = %machine, host = %host, "Provisioning");
        let output = transport
            .run(&connection, &command.create)
            .await
            .map_err(|source| DeployError::Transport {
                resource: step.name.clone(),
                source,
            })?;
        results.push((step.name.clone(), output));
    }

    Ok(results)
}
