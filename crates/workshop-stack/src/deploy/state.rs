//! Live state and reference resolution

use crate::error::DeployError;
use crate::resources::{Property, Reference, Resource, ResourceSpec};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use workshop_common::ResourceKind;

/// A created resource as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveResource {
    pub name: String,
    pub kind: ResourceKind,
    /// Output properties other resources can reference
    pub outputs: BTreeMap<Property, String>,
    /// Declared properties with every reference resolved
    pub properties: Value,
}

impl LiveResource {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            outputs: BTreeMap::new(),
            properties: Value::Null,
        }
    }

    pub fn with_output(mut self, property: Property, value: impl Into<String>) -> Self {
        self.outputs.insert(property, value.into());
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn output(&self, property: Property) -> Option<&str> {
        self.outputs.get(&property).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.output(Property::Id)
    }

    pub fn physical_name(&self) -> Option<&str> {
        self.output(Property::Name)
    }
}

/// Values of every reference a resource holds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedInputs {
    values: BTreeMap<Reference, String>,
}

impl ResolvedInputs {
    pub fn get(&self, reference: &Reference) -> Option<&str> {
        self.values.get(reference).map(String::as_str)
    }

    pub fn insert(&mut self, reference: Reference, value: impl Into<String>) {
        self.values.insert(reference, value.into());
    }

    /// Serialize `spec` with every reference expression replaced by its value
    pub fn render(&self, spec: &ResourceSpec) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(spec)?;
        self.substitute(&mut value);
        Ok(value)
    }

    fn substitute(&self, value: &mut Value) {
        match value {
            Value::String(s) => {
                if let Some(resolved) = s
                    .parse::<Reference>()
                    .ok()
                    .and_then(|r| self.values.get(&r))
                {
                    *s = resolved.clone();
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|v| self.substitute(v)),
            Value::Object(map) => map.values_mut().for_each(|v| self.substitute(v)),
            _ => {}
        }
    }
}

/// Everything created so far, keyed by logical name
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LiveState {
    resources: BTreeMap<String, LiveResource>,
}

impl LiveState {
    pub fn insert(&mut self, live: LiveResource) {
        self.resources.insert(live.name.clone(), live);
    }

    pub fn remove(&mut self, name: &str) -> Option<LiveResource> {
        self.resources.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&LiveResource> {
        self.resources.get(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveResource> {
        self.resources.values()
    }

    pub fn resolve(&self, reference: &Reference) -> Option<&str> {
        self.get(reference.target())?.output(reference.property())
    }

    /// Resolve every reference `resource` holds; any missing value is an error
    pub fn resolve_inputs(&self, resource: &Resource) -> Result<ResolvedInputs, DeployError> {
        let mut inputs = ResolvedInputs::default();
        for reference in resource.spec().references() {
            let value =
                self.resolve(reference)
                    .ok_or_else(|| DeployError::UnresolvedReference {
                        resource: resource.name().to_string(),
                        reference: reference.clone(),
                    })?;
            inputs.insert(reference.clone(), value);
        }
        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{AddressSpace, VirtualNetwork};

    fn vnet() -> Resource {
        Resource::new(
            "vnet",
            VirtualNetwork {
                resource_group_name: Reference::new("rg", Property::Name),
                address_space: AddressSpace {
                    address_prefixes: vec!["10.0.0.0/16".to_string()],
                },
            },
        )
    }

    #[test]
    fn test_resolve_and_render() {
        let mut state = LiveState::default();
        state.insert(
            LiveResource::new("rg", ResourceKind::ResourceGroup)
                .with_output(Property::Name, "rg1234abcd")
                .with_output(Property::Id, "/subscriptions/x/resourceGroups/rg1234abcd"),
        );

        let vnet = vnet();
        let inputs = state.resolve_inputs(&vnet).unwrap();
        let rendered = inputs.render(vnet.spec()).unwrap();

        assert_eq!(rendered["resourceGroupName"], "rg1234abcd");
        assert_eq!(rendered["addressSpace"]["addressPrefixes"][0], "10.0.0.0/16");
    }

    #[test]
    fn test_unresolved_reference() {
        let err = LiveState::default().resolve_inputs(&vnet()).unwrap_err();
        match err {
            DeployError::UnresolvedReference {
                resource,
                reference,
            } => {
                assert_eq!(resource, "vnet");
                assert_eq!(reference.to_string(), "${rg.name}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_property_is_unresolved() {
        let mut state = LiveState::default();
        state.insert(LiveResource::new("rg", ResourceKind::ResourceGroup));
        assert!(state.resolve(&Reference::new("rg", Property::Name)).is_none());
    }
}
