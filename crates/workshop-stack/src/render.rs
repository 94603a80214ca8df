//! Table rendering for the CLI

use crate::deploy::{LiveState, Outputs};
use crate::graph::Plan;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

/// One row per plan step
pub fn plan_table(plan: &Plan) -> Table {
    let mut t = table(&["#", "Action", "Wave", "Kind", "Name", "Depends on"]);
    for (i, step) in plan.steps.iter().enumerate() {
        t.add_row(vec![
            Cell::new(i + 1),
            Cell::new(plan.action),
            Cell::new(step.wave),
            Cell::new(step.kind),
            Cell::new(&step.name),
            Cell::new(step.depends_on.join(", ")),
        ]);
    }
    t
}

/// One row per live resource, in name order
pub fn live_table(live: &LiveState) -> Table {
    let mut t = table(&["Kind", "Name", "Physical name", "ID"]);
    for resource in live.iter() {
        t.add_row(vec![
            Cell::new(resource.kind),
            Cell::new(&resource.name),
            Cell::new(resource.physical_name().unwrap_or("-")),
            Cell::new(resource.id().unwrap_or("-")),
        ]);
    }
    t
}

pub fn outputs_table(outputs: &Outputs) -> Table {
    let mut t = table(&["Output", "Value"]);
    for (key, value) in outputs.iter() {
        t.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{PlanAction, PlanStep};
    use workshop_common::ResourceKind;

    #[test]
    fn test_plan_table_rows() {
        let plan = Plan {
            action: PlanAction::Create,
            steps: vec![PlanStep {
                name: "workshop_rg".to_string(),
                kind: ResourceKind::ResourceGroup,
                wave: 0,
                depends_on: Vec::new(),
            }],
        };
        let rendered = plan_table(&plan).to_string();
        assert!(rendered.contains("workshop_rg"));
        assert!(rendered.contains("resource-group"));
        assert!(rendered.contains("create"));
    }
}
