//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Mutex;
use workshop_common::ResourceKind;
use workshop_stack::Stack;
use workshop_stack::config::{Credentials, Overrides, PasswordPolicy, StackConfig, StackSettings};
use workshop_stack::deploy::{ApplyProgressReporter, LiveResource};
use workshop_stack::error::TransportError;
use workshop_stack::graph::PlanStep;
use workshop_stack::provision::{CommandOutput, CommandTransport, Connection};

pub const TEST_DEPLOYMENT_ID: &str = "0badc0de-0000-4000-8000-000000000000";
pub const TEST_SUBSCRIPTION_ID: &str = "11111111-2222-3333-4444-555555555555";

pub fn credentials() -> Credentials {
    Credentials::resolve(
        Some("workshop".to_string()),
        Some("Correct-Horse-9".to_string()),
        PasswordPolicy::RequireExplicit,
    )
    .unwrap()
}

/// Stack built from a JSON settings document
pub fn stack_from_settings(json: &str) -> Stack {
    let settings: StackSettings = serde_json::from_str(json).unwrap();
    let config = StackConfig::from_parts(credentials(), settings, Overrides::default()).unwrap();
    Stack::declare_with_id(&config, TEST_DEPLOYMENT_ID)
}

/// Reporter that records every event, in order
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("created ").map(str::to_string))
            .collect()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ApplyProgressReporter for RecordingReporter {
    fn report_step(&self, _index: usize, _total: usize, step: &PlanStep) {
        self.push(format!("step {}", step.name));
    }

    fn report_created(&self, live: &LiveResource) {
        self.push(format!("created {}", live.name));
    }

    fn report_deleted(&self, name: &str, _kind: ResourceKind) {
        self.push(format!("deleted {name}"));
    }

    fn report_failed(&self, name: &str, _error: &(dyn std::error::Error + 'static)) {
        self.push(format!("failed {name}"));
    }
}

/// Transport whose every command exits non-zero
#[derive(Debug, Default)]
pub struct FailingTransport {
    pub calls: Mutex<Vec<String>>,
}

impl CommandTransport for FailingTransport {
    async fn run(
        &self,
        connection: &Connection,
        _command: &str,
    ) -> Result<CommandOutput, TransportError> {
        self.calls.lock().unwrap().push(connection.host.clone());
        Err(TransportError::NonZeroExit {
            host: connection.host.clone(),
            code: Some(100),
        })
    }
}
