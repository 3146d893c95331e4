use clap::Parser;
use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeRepository,
    domain::{DepartmentNode, DepartmentStats, InheritSource, Policy, PolicyField, Status, stats::child_stats},
};

use super::{
    Session,
    terminal::{self, Colorize},
};

#[derive(Debug, Parser)]
#[command(about = "Display detailed information about a department")]
pub struct Show {
    /// The department id (see `vdt tree`)
    #[clap(value_parser = super::parse_department)]
    department: DepartmentId,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self, session), fields(department = %self.department))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let workspace = &session.workspace;
        let Some(node) = workspace.tree().find_node(&self.department) else {
            anyhow::bail!("Department {} not found", self.department);
        };

        let stats = workspace.department_stats(&self.department)?;
        let (policy, source) = workspace.effective_policy(&self.department)?;

        match self.output {
            OutputFormat::Pretty => self.output_pretty(session, node, &stats, &policy, &source),
            OutputFormat::Json => self.output_json(session, node, &stats, &policy, &source)?,
        }

        Ok(())
    }

    fn output_pretty(
        &self,
        session: &Session,
        node: &DepartmentNode,
        stats: &DepartmentStats,
        policy: &Policy,
        source: &InheritSource,
    ) {
        let tree = session.workspace.tree();
        let threshold = session.config.risk_threshold();

        println!("# {}", node.name);
        if let Some(path) = tree.path(&self.department) {
            println!("{}\n", path.dim());
        }

        println!("{}", "Department".dim());
        println!("  Id:        {}", node.id);
        println!("  Level:     {}", node.level);
        if let Some(division) = tree.division_of(&self.department).filter(|d| d.id != node.id) {
            println!("  Division:  {}", division.name);
        }

        let children = child_stats(node, session.workspace.employees());
        if !children.is_empty() {
            println!("\n{}", "Children".dim());
            print_breakdown(&children, threshold);
        }

        println!("\n{}", "Employees".dim());
        println!("  Total:       {}", stats.total);
        println!("  Reporting:   {}", stats.active);
        println!(
            "  Compliance:  {}",
            terminal::compliance(u8::try_from(stats.avg_compliance).unwrap_or(100), threshold)
        );
        println!("  Avg VDT:     {:.1}h", stats.avg_vdt);
        let breakdown: Vec<String> = Status::ALL
            .into_iter()
            .map(|status| format!("{status} {}", stats.status_breakdown.get(status)))
            .collect();
        println!("  By status:   {}", breakdown.join(", "));
        if stats.warning_count > 0 {
            println!(
                "  {}",
                format!("{} employee(s) in warning", stats.warning_count).warning()
            );
        }

        println!("\n{} {}", "Rest policy".dim(), describe_source(session, source).dim());
        for field in PolicyField::ALL {
            println!("  {:<15} {}", field.as_str(), policy.display_field(field));
        }
    }

    fn output_json(
        &self,
        session: &Session,
        node: &DepartmentNode,
        stats: &DepartmentStats,
        policy: &Policy,
        source: &InheritSource,
    ) -> anyhow::Result<()> {
        use serde_json::json;

        let tree = session.workspace.tree();
        let children = breakdown_json(&child_stats(node, session.workspace.employees()));

        let output = json!({
            "id": node.id.as_str(),
            "name": node.name,
            "level": node.level.as_str(),
            "path": tree.path(&self.department),
            "parent": node.parent_id.as_ref().map(DepartmentId::as_str),
            "children": children,
            "stats": stats,
            "policy": policy,
            "policy_source": source,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

/// Prints one row per department with its subtree statistics.
pub(super) fn print_breakdown(rows: &[(&DepartmentNode, DepartmentStats)], threshold: u8) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|(node, stats)| {
            vec![
                node.name.clone(),
                node.id.to_string(),
                stats.total.to_string(),
                format!("{}%", stats.avg_compliance),
                format!("{:.1}h", stats.avg_vdt),
                stats.warning_count.to_string(),
            ]
        })
        .collect();

    terminal::print_table(
        &["NAME", "ID", "STAFF", "COMPL", "AVG VDT", "WARNING"],
        &cells,
        |row, col, cell| {
            let stats = &rows[row].1;
            match col {
                1 => cell.dim(),
                3 if stats.active > 0 => terminal::paint_compliance(
                    u8::try_from(stats.avg_compliance).unwrap_or(100),
                    threshold,
                    cell,
                ),
                5 if stats.warning_count > 0 => cell.warning(),
                _ => cell.to_string(),
            }
        },
    );
}

pub(super) fn breakdown_json(rows: &[(&DepartmentNode, DepartmentStats)]) -> Vec<serde_json::Value> {
    rows.iter()
        .map(|(node, stats)| {
            serde_json::json!({
                "id": node.id.as_str(),
                "name": node.name,
                "level": node.level.as_str(),
                "stats": stats,
            })
        })
        .collect()
}

pub(super) fn describe_source(session: &Session, source: &InheritSource) -> String {
    match source {
        InheritSource::Own => "(own override)".to_string(),
        InheritSource::Company => "(company default)".to_string(),
        InheritSource::Ancestor(id) => {
            let name = session
                .workspace
                .tree()
                .find_node(id)
                .map_or_else(|| id.to_string(), |node| node.name.clone());
            format!("(inherited from {name})")
        }
    }
}
