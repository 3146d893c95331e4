use std::collections::BTreeMap;

use clap::Parser;
use serde_json::{Value, json};
use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeRepository,
    domain::{DepartmentNode, stats},
};

use super::{
    Session,
    terminal::{self, Colorize},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show the organisation tree with headcounts")]
pub struct Tree {
    /// Output format (tree, json)
    #[arg(long, value_name = "FORMAT", default_value = "tree")]
    output: OutputFormat,

    /// Stop after this many levels (1 = divisions only)
    #[arg(long, value_name = "N")]
    depth: Option<usize>,

    /// Hide department ids
    #[arg(long)]
    no_ids: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Tree,
    Json,
}

impl Tree {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let tree = session.workspace.tree();
        let employees = session.workspace.employees();

        if tree.is_empty() {
            println!("No departments yet.");
            return Ok(());
        }

        let counts = stats::employee_counts(tree, employees);
        let depth = self.depth.unwrap_or(usize::MAX).max(1);

        match self.output {
            OutputFormat::Tree => {
                for division in tree.divisions() {
                    self.print_node(division, &counts, "", None, depth);
                }
                let unassigned = session.workspace.directory().unassigned().count();
                if unassigned > 0 {
                    println!("\n{}", format!("{unassigned} unassigned employee(s)").warning());
                }
            }
            OutputFormat::Json => {
                let divisions: Vec<Value> = tree
                    .divisions()
                    .iter()
                    .map(|division| node_json(division, &counts, depth))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&divisions)?);
            }
        }

        Ok(())
    }

    /// `last` is `None` for divisions, which print flush left.
    fn print_node(
        &self,
        node: &DepartmentNode,
        counts: &BTreeMap<DepartmentId, usize>,
        prefix: &str,
        last: Option<bool>,
        depth: usize,
    ) {
        let (branch, child_prefix) = match last {
            None => (String::new(), String::new()),
            Some(true) => (format!("{prefix}└── "), format!("{prefix}    ")),
            Some(false) => (format!("{prefix}├── "), format!("{prefix}│   ")),
        };

        let name = if last.is_none() {
            node.name.info()
        } else {
            node.name.clone()
        };
        let id = if self.no_ids || terminal::is_narrow() {
            String::new()
        } else {
            format!(" ({})", node.id).dim()
        };
        let count = counts.get(&node.id).copied().unwrap_or_default();
        println!("{branch}{name}{id}  {}", format!("{count}").dim());

        if depth <= 1 {
            return;
        }
        let children = &node.children;
        for (i, child) in children.iter().enumerate() {
            self.print_node(child, counts, &child_prefix, Some(i + 1 == children.len()), depth - 1);
        }
    }
}

fn node_json(node: &DepartmentNode, counts: &BTreeMap<DepartmentId, usize>, depth: usize) -> Value {
    let mut value = json!({
        "id": node.id.as_str(),
        "name": node.name,
        "level": node.level.as_str(),
        "employees": counts.get(&node.id).copied().unwrap_or_default(),
    });
    if depth > 1 && !node.children.is_empty() {
        value["children"] = node
            .children
            .iter()
            .map(|child| node_json(child, counts, depth - 1))
            .collect();
    }
    value
}

#[cfg(test)]
mod tests {
    use vdt_admin::{Dataset, domain::OrgTree};

    use super::*;

    fn sample() -> (OrgTree, BTreeMap<DepartmentId, usize>) {
        let parts = Dataset::sample().into_parts().unwrap();
        let counts = stats::employee_counts(&parts.tree, parts.directory.list());
        (parts.tree, counts)
    }

    #[test]
    fn json_nests_children_with_counts() {
        let (tree, counts) = sample();
        let dev = node_json(&tree.divisions()[0], &counts, usize::MAX);

        assert_eq!(dev["id"], "dev");
        assert_eq!(dev["employees"], 12);
        assert_eq!(dev["children"][0]["children"][0]["id"], "fe-ui");
        assert_eq!(dev["children"][0]["children"][0]["level"], "part");
    }

    #[test]
    fn json_respects_depth() {
        let (tree, counts) = sample();
        let dev = node_json(&tree.divisions()[0], &counts, 1);
        assert!(dev.get("children").is_none());
    }
}
