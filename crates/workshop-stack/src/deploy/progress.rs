//! Progress reporting for deployments
//!
//! The driver reports through a trait so the same walk can feed plain logs
//! or a test recorder.

use super::state::LiveResource;
use crate::graph::PlanStep;
use tracing::{error, info};
use workshop_common::ResourceKind;

/// Trait for reporting deployment progress
pub trait ApplyProgressReporter: Send + Sync {
    /// A step is about to run (`index` is zero-based)
    fn report_step(&self, index: usize, total: usize, step: &PlanStep);

    /// A resource was created
    fn report_created(&self, live: &LiveResource);

    /// A resource was deleted
    fn report_deleted(&self, name: &str, kind: ResourceKind);

    /// A step failed; the deployment stops after this
    fn report_failed(&self, name: &str, error: &(dyn std::error::Error + 'static));
}

/// Progress reporter that writes to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ApplyProgressReporter for LogReporter {
    fn report_step(&self, index: usize, total: usize, step: &PlanStep) {
        info!(
            step = index + 1,
            total,
            name = %step.name,
            kind = %step.kind,
            wave = step.wave,
            "Applying"
        );
    }

    fn report_created(&self, live: &LiveResource) {
        info!(
            name = %live.name,
            kind = %live.kind,
            id = live.id().unwrap_or("-"),
            "Created"
        );
    }

    fn report_deleted(&self, name: &str, kind: ResourceKind) {
        info!(name, kind = %kind, "Deleted");
    }

    fn report_failed(&self, name: &str, error: &(dyn std::error::Error + 'static)) {
        error!(name, error = %error, "Step failed");
    }
}
