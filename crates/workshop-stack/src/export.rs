//! Desired-state document for an external engine
//!
//! The document lists every resource in create order with its explicit
//! `dependsOn` set and its properties, references left as `${name.property}`
//! expressions. Secrets are redacted.

use crate::error::PlanError;
use crate::graph::DependencyGraph;
use crate::resources::{Reference, ResourceSpec};
use crate::stack::Stack;
use serde::Serialize;
use std::collections::BTreeMap;
use workshop_common::ResourceKind;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntry<'a> {
    pub name: &'a str,
    pub kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_type: Option<&'static str>,
    pub depends_on: Vec<String>,
    pub tags: &'a BTreeMap<String, String>,
    pub properties: &'a ResourceSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub deployment_id: &'a str,
    pub resources: Vec<ExportEntry<'a>>,
    pub outputs: BTreeMap<&'static str, &'a Reference>,
}

impl<'a> ExportDocument<'a> {
    pub fn build(stack: &'a Stack) -> Result<Self, PlanError> {
        let plan = DependencyGraph::build(stack.resources())?.plan()?;
        let resources = plan
            .steps
            .into_iter()
            .filter_map(|step| {
                let resource = stack.get(&step.name)?;
                Some(ExportEntry {
                    name: resource.name(),
                    kind: step.kind,
                    azure_type: step.kind.azure_type(),
                    depends_on: step.depends_on,
                    tags: resource.tags(),
                    properties: resource.spec(),
                })
            })
            .collect();

        Ok(Self {
            deployment_id: stack.deployment_id(),
            resources,
            outputs: stack.outputs().iter().map(|o| (o.key, &o.value)).collect(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, PasswordPolicy, StackConfig};
    use crate::stack::names;

    fn stack(attach: bool) -> Stack {
        let creds = Credentials::resolve(
            Some("ops".to_string()),
            Some("very-secret".to_string()),
            PasswordPolicy::RequireExplicit,
        )
        .unwrap();
        let mut config = StackConfig::new(creds);
        config.storage.attach_disks = attach;
        Stack::declare_with_id(&config, "export-test")
    }

    #[test]
    fn test_document_shape() {
        let stack = stack(true);
        let doc = ExportDocument::build(&stack).unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert_eq!(json["deploymentId"], "export-test");
        assert_eq!(json["resources"][0]["name"], names::RESOURCE_GROUP);
        assert_eq!(
            json["resources"][0]["azureType"],
            "Microsoft.Resources/resourceGroups"
        );
        assert_eq!(json["outputs"]["managedDisk1_id"], "${managedDisk1.id}");

        let vm1 = json["resources"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["name"] == names::VM1)
            .unwrap();
        assert_eq!(vm1["kind"], "virtual-machine");
        assert!(
            vm1["dependsOn"]
                .as_array()
                .unwrap()
                .contains(&serde_json::json!(names::MANAGED_DISK1))
        );
        assert_eq!(
            vm1["properties"]["storageProfile"]["dataDisks"][0]["managedDisk"]["id"],
            "${managedDisk1.id}"
        );
    }

    #[test]
    fn test_secrets_redacted() {
        let stack = stack(false);
        let json = ExportDocument::build(&stack).unwrap().to_json().unwrap();
        assert!(!json.contains("very-secret"));
        assert!(json.contains("[secret]"));
    }

    #[test]
    fn test_remote_command_has_no_azure_type() {
        let stack = stack(false);
        let doc = ExportDocument::build(&stack).unwrap();
        let install = doc
            .resources
            .iter()
            .find(|r| r.name == names::INSTALL_NGINX_VM1)
            .unwrap();
        assert!(install.azure_type.is_none());
    }
}
