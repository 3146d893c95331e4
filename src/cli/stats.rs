use std::process;

use clap::Parser;
use serde_json::json;
use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeRepository,
    domain::{
        DashboardSummary, DepartmentNode, DepartmentStats, Employee, OrgTree, Status,
        stats::{child_stats, dashboard_summary, division_stats, risk_employees},
    },
};

use super::{
    Session,
    show::{breakdown_json, print_breakdown},
    terminal::{self, Colorize},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show the compliance dashboard and employees at risk")]
pub struct Stats {
    /// Drill into one department and everything below it
    #[arg(long, value_parser = super::parse_department)]
    department: Option<DepartmentId>,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Show at most this many employees at risk
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Exit with status 2 when anyone is below the risk threshold
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Everything the dashboard shows, scoped to the whole company or one
/// department's subtree.
struct StatsView<'a> {
    scope: Option<&'a DepartmentNode>,
    summary: DashboardSummary,
    at_risk: Vec<&'a Employee>,
    risk_total: usize,
    breakdown: Vec<(&'a DepartmentNode, DepartmentStats)>,
}

impl Stats {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        if session.workspace.employees().is_empty() {
            println!("No employees yet.");
            return Ok(());
        }

        let threshold = session.config.risk_threshold();
        let view = self.collect(session)?;

        match self.output {
            OutputFormat::Table => Self::output_table(&view, threshold, session.workspace.tree()),
            OutputFormat::Json => Self::output_json(&view, threshold)?,
        }

        if self.check && view.risk_total > 0 {
            process::exit(2);
        }

        Ok(())
    }

    fn collect<'a>(&self, session: &'a Session) -> anyhow::Result<StatsView<'a>> {
        let workspace = &session.workspace;
        let employees = workspace.employees();
        let threshold = session.config.risk_threshold();

        let (scope, members, breakdown) = match &self.department {
            None => (
                None,
                employees.iter().collect::<Vec<_>>(),
                division_stats(workspace.tree(), employees),
            ),
            Some(id) => {
                let node = workspace.tree().node(id)?;
                let ids = node.descendant_id_set();
                let members: Vec<&Employee> = employees
                    .iter()
                    .filter(|e| e.department_id.as_ref().is_some_and(|d| ids.contains(d)))
                    .collect();
                (Some(node), members, child_stats(node, employees))
            }
        };
        tracing::debug!(
            scope = scope.map(|node| node.id.as_str()),
            members = members.len(),
            "Collected dashboard"
        );

        let summary = dashboard_summary(members.iter().copied(), threshold);
        let mut at_risk = risk_employees(members, threshold);
        let risk_total = at_risk.len();
        if let Some(limit) = self.limit {
            at_risk.truncate(limit);
        }

        Ok(StatsView {
            scope,
            summary,
            at_risk,
            risk_total,
            breakdown,
        })
    }

    fn output_table(view: &StatsView, threshold: u8, tree: &OrgTree) {
        let summary = &view.summary;
        let compliance = u8::try_from(summary.avg_compliance).unwrap_or(100);

        match view.scope {
            Some(node) => println!(
                "{}",
                format!("Dashboard: {}", tree.path(&node.id).unwrap_or_else(|| node.name.clone())).dim()
            ),
            None => println!("{}", "Dashboard".dim()),
        }
        println!("  Monitored:       {}", summary.monitored);
        println!("  Avg VDT:         {:.1}h", summary.avg_vdt);
        println!("  Avg compliance:  {}", terminal::compliance(compliance, threshold));
        let risk = format!("{}", summary.risk_count);
        println!(
            "  At risk (<{threshold}%): {}",
            if summary.risk_count > 0 { risk.danger() } else { risk.success() }
        );

        println!("\n{}", "By status".dim());
        for status in Status::ALL {
            println!("  {:<10} {}", status.as_str(), summary.by_status.get(status));
        }

        if !view.breakdown.is_empty() {
            let heading = if view.scope.is_some() { "By department" } else { "By division" };
            println!("\n{}", heading.dim());
            print_breakdown(&view.breakdown, threshold);
        }

        if view.at_risk.is_empty() {
            println!("\n{}", "Nobody is below the risk threshold.".success());
            return;
        }

        println!("\n{}", "Employees at risk".dim());
        let rows: Vec<Vec<String>> = view
            .at_risk
            .iter()
            .map(|e| {
                vec![
                    e.name.clone(),
                    e.department_id
                        .as_ref()
                        .and_then(|id| tree.path(id))
                        .unwrap_or_else(|| "(unassigned)".to_string()),
                    format!("{}%", e.compliance),
                    format!("{:.1}h", e.avg_vdt),
                ]
            })
            .collect();
        terminal::print_table(&["NAME", "DEPARTMENT", "COMPL", "AVG VDT"], &rows, |row, col, cell| {
            if col == 2 {
                cell.danger()
            } else if col == 0 && view.at_risk[row].status == Status::Warning {
                cell.warning()
            } else {
                cell.to_string()
            }
        });

        if view.risk_total > view.at_risk.len() {
            println!(
                "{}",
                format!("... and {} more", view.risk_total - view.at_risk.len()).dim()
            );
        }
    }

    fn output_json(view: &StatsView, threshold: u8) -> anyhow::Result<()> {
        let at_risk: Vec<_> = view
            .at_risk
            .iter()
            .map(|e| {
                json!({
                    "id": e.id.as_str(),
                    "name": e.name,
                    "department": e.department_id.as_ref().map(DepartmentId::as_str),
                    "status": e.status,
                    "compliance": e.compliance,
                    "avg_vdt": e.avg_vdt,
                })
            })
            .collect();

        let output = json!({
            "department": view.scope.map(|node| node.id.as_str()),
            "risk_threshold": threshold,
            "summary": view.summary,
            "breakdown": breakdown_json(&view.breakdown),
            "at_risk": at_risk,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
