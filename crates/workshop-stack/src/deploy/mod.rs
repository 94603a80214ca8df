//! Deployment driver and the provider seam
//!
//! This module walks a [`Plan`](crate::graph::Plan) against a [`Provider`]
//! and a [`CommandTransport`](crate::provision::CommandTransport):
//!
//! - [`state`]: live resources and reference resolution
//! - [`provider`]: the trait a resource engine implements
//! - [`simulated`]: in-memory provider with provider-shaped identities
//! - [`progress`]: progress reporting
//! - [`outputs`]: exported stack outputs

mod deployment;
pub mod outputs;
pub mod progress;
pub mod provider;
pub mod simulated;
pub mod state;

pub use deployment::{Deployment, DeploymentResult};
pub use outputs::Outputs;
pub use progress::{ApplyProgressReporter, LogReporter};
pub use provider::Provider;
pub use simulated::SimulatedProvider;
pub use state::{LiveResource, LiveState, ResolvedInputs};
