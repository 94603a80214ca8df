//! workshop-stack - Azure workshop topology as typed declarations
//!
//! Declares a resource group, network, two VMs with their NICs, two managed
//! disks (optionally attached), a recovery vault with a daily backup policy
//! and one backup instance per disk. The dependency graph between them is
//! explicit and turned into a deterministic plan.
//!
//! ## Modules
//!
//! - [`config`]: credentials, stack config file and CLI overrides
//! - [`resources`]: typed resource descriptors
//! - [`stack`]: the topology itself
//! - [`graph`]: dependency graph and create/destroy plans
//! - [`deploy`]: provider seam, simulated provider and the plan walker
//! - [`provision`]: remote command transports
//! - [`export`]: desired-state document for an external engine

pub mod config;
pub mod deploy;
pub mod error;
pub mod export;
pub mod graph;
pub mod provision;
pub mod render;
pub mod resources;
pub mod stack;

pub use error::{ConfigError, DeployError, PlanError, ProviderError, TransportError};
pub use stack::Stack;
