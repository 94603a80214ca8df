//! Plan walking
//!
//! Resources are created one at a time in plan order. Each step resolves its
//! references against what already exists, so a resource can never be
//! created ahead of something it points at. The first failure stops the
//! walk and is returned as-is.

use super::outputs::Outputs;
use super::progress::ApplyProgressReporter;
use super::provider::Provider;
use super::state::{LiveResource, LiveState};
use crate::error::{DeployError, PlanError};
use crate::graph::{DependencyGraph, Plan};
use crate::provision::{CommandTransport, Connection};
use crate::resources::{Property, Resource, ResourceSpec};
use crate::stack::Stack;
use tracing::{info, instrument, warn};
use workshop_common::ResourceKind;

/// Result of a successful apply
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub live: LiveState,
    pub outputs: Outputs,
}

/// A stack paired with its create plan
#[derive(Debug)]
pub struct Deployment<'a> {
    stack: &'a Stack,
    plan: Plan,
    /// Resources in plan order
    ordered: Vec<&'a Resource>,
}

impl<'a> Deployment<'a> {
    /// Build the dependency graph and plan for `stack`
    pub fn new(stack: &'a Stack) -> Result<Self, PlanError> {
        let plan = DependencyGraph::build(stack.resources())?.plan()?;
        let ordered = plan
            .steps
            .iter()
            .filter_map(|step| stack.get(&step.name))
            .collect();
        Ok(Self {
            stack,
            plan,
            ordered,
        })
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn stack(&self) -> &Stack {
        self.stack
    }

    /// Create every resource in plan order and collect the outputs
    #[instrument(
        skip_all,
        fields(deployment_id = %self.stack.deployment_id(), steps = self.plan.len())
    )]
    pub async fn apply<P, T, R>(
        &self,
        provider: &mut P,
        transport: &T,
        reporter: &R,
    ) -> Result<DeploymentResult, DeployError>
    where
        P: Provider,
        T: CommandTransport,
        R: ApplyProgressReporter,
    {
        let mut live = LiveState::default();
        let total = self.ordered.len();

        for (index, (step, resource)) in self.plan.steps.iter().zip(&self.ordered).enumerate() {
            reporter.report_step(index, total, step);

            match self.apply_one(resource, &live, provider, transport).await {
                Ok(created) => {
                    reporter.report_created(&created);
                    live.insert(created);
                }
                Err(e) => {
                    reporter.report_failed(resource.name(), &e);
                    return Err(e);
                }
            }
        }

        let outputs = Outputs::collect(self.stack.outputs(), &live)?;
        info!(resources = live.len(), outputs = outputs.len(), "Deployment complete");
        Ok(DeploymentResult { live, outputs })
    }

    async fn apply_one<P, T>(
        &self,
        resource: &Resource,
        live: &LiveState,
        provider: &mut P,
        transport: &T,
    ) -> Result<LiveResource, DeployError>
    where
        P: Provider,
        T: CommandTransport,
    {
        let inputs = live.resolve_inputs(resource)?;

        let ResourceSpec::RemoteCommand(command) = resource.spec() else {
            return provider
                .create(resource, &inputs)
                .await
                .map_err(|source| DeployError::Provider {
                    resource: resource.name().to_string(),
                    source,
                });
        };

        // Reference resolved above
        let host = inputs.get(&command.connection.host).unwrap_or_default();
        let connection = Connection {
            host: host.to_string(),
            user: command.connection.user.clone(),
            password: command.connection.password.clone(),
        };
        transport
            .run(&connection, &command.create)
            .await
            .map_err(|source| DeployError::Transport {
                resource: resource.name().to_string(),
                source,
            })?;

        let properties = inputs
            .render(resource.spec())
            .map_err(|source| DeployError::Render {
                resource: resource.name().to_string(),
                source,
            })?;
        Ok(LiveResource::new(resource.name(), ResourceKind::RemoteCommand)
            .with_output(Property::Id, format!("{}@{host}", resource.name()))
            .with_output(Property::Name, resource.name())
            .with_properties(properties))
    }

    /// Delete every resource in reverse plan order.
    ///
    /// Remote commands have nothing to delete and are skipped. Resources the
    /// provider no longer knows about are skipped with a warning. Returns the
    /// names that were deleted.
    #[instrument(skip_all, fields(deployment_id = %self.stack.deployment_id()))]
    pub async fn destroy<P, R>(
        &self,
        provider: &mut P,
        reporter: &R,
    ) -> Result<Vec<String>, DeployError>
    where
        P: Provider,
        R: ApplyProgressReporter,
    {
        let plan = self.plan.reversed();
        let total = plan.len();
        let mut deleted = Vec::new();

        for (index, step) in plan.steps.iter().enumerate() {
            if step.kind == ResourceKind::RemoteCommand {
                continue;
            }
            reporter.report_step(index, total, step);

            match provider.delete(&step.name, step.kind).await {
                Ok(()) => {
                    reporter.report_deleted(&step.name, step.kind);
                    deleted.push(step.name.clone());
                }
                Err(e) if e.is_not_found() => {
                    warn!(name = %step.name, kind = %step.kind, "Already gone, skipping");
                }
                Err(source) => {
                    let err = DeployError::Delete {
                        resource: step.name.clone(),
                        source,
                    };
                    reporter.report_failed(&step.name, &err);
                    return Err(err);
                }
            }
        }

        Ok(deleted)
    }
}
