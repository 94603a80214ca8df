//! Error types for configuration, planning and deployment
//!
//! Each layer has its own enum; [`DeployError`] wraps the lower layers so a
//! failed deployment carries the original cause unmodified.

use crate::resources::Reference;
use std::path::PathBuf;
use thiserror::Error;
use workshop_common::ResourceKind;

/// Stack configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `ADMIN_PASSWORD` unset and the placeholder was not allowed
    #[error(
        "ADMIN_PASSWORD is not set (pass --allow-default-password to use the legacy placeholder)"
    )]
    MissingPassword,

    /// diskSize is zero
    #[error("diskSize must be at least 1 GB, got {0}")]
    InvalidDiskSize(u32),

    /// location is empty
    #[error("location cannot be empty")]
    EmptyLocation,

    /// Failed to parse the stack config file
    #[error("Failed to parse stack config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to read the stack config file
    #[error("Failed to read stack config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Dependency graph errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("resource '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("resource '{resource}' depends on undeclared resource '{dependency}'")]
    UnknownDependency {
        resource: String,
        dependency: String,
    },

    #[error("dependency cycle between: {}", remaining.join(", "))]
    Cycle { remaining: Vec<String> },
}

/// Errors reported by a resource provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    /// The declaration was refused (invalid property combination, quota, ...)
    #[error("{kind} '{name}' rejected: {message}")]
    Rejected {
        kind: ResourceKind,
        name: String,
        message: String,
    },
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

/// Errors from the remote command transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for command on {host}: {source}")]
    Wait {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command on {host} exited with {}", describe_exit(*code))]
    NonZeroExit { host: String, code: Option<i32> },

    #[error("Command on {host} timed out after {timeout_secs}s")]
    Timeout { host: String, timeout_secs: u64 },
}

fn describe_exit(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

/// Deployment errors; the first failure halts the deployment
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("'{resource}' references {reference}, which has no live value")]
    UnresolvedReference {
        resource: String,
        reference: Reference,
    },

    #[error("Failed to create '{resource}'")]
    Provider {
        resource: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to delete '{resource}'")]
    Delete {
        resource: String,
        #[source]
        source: ProviderError,
    },

    #[error("No host given for '{machine}', needed by '{resource}'")]
    MissingHost { resource: String, machine: String },

    #[error("Failed to render properties of '{resource}'")]
    Render {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Provisioning step '{resource}' failed")]
    Transport {
        resource: String,
        #[source]
        source: TransportError,
    },
}
