//! Exported stack outputs

use super::state::LiveState;
use crate::error::DeployError;
use crate::stack::OutputSpec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Output values keyed by export name (`vm1_name`, `managedDisk1_id`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Outputs(BTreeMap<String, String>);

impl Outputs {
    /// Read every output from live state
    pub fn collect(specs: &[OutputSpec], live: &LiveState) -> Result<Self, DeployError> {
        specs
            .iter()
            .map(|spec| {
                live.resolve(&spec.value)
                    .map(|v| (spec.key.to_string(), v.to_string()))
                    .ok_or_else(|| DeployError::UnresolvedReference {
                        resource: spec.key.to_string(),
                        reference: spec.value.clone(),
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
