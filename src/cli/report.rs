use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeRepository,
    domain::{DivisionReportRow, Level, stats::division_report},
};

use super::{
    Session,
    terminal::{self, Colorize},
};

/// Command arguments for `vdt report`.
#[derive(Debug, Parser, Default)]
#[command(about = "Per-division compliance report")]
pub struct Report {
    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and the footer for scripting.
    #[arg(long)]
    quiet: bool,

    /// Only report these divisions (repeatable; default: all).
    #[arg(long = "division", value_name = "ID", value_parser = super::parse_department)]
    divisions: Vec<DepartmentId>,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    generated_at: DateTime<Utc>,
    risk_threshold: u8,
    divisions: &'a [DivisionReportRow],
}

impl Report {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let threshold = session.config.risk_threshold();
        let rows = self.rows(session)?;
        let generated_at = Utc::now();
        tracing::debug!(divisions = rows.len(), "Built division report");

        if rows.is_empty() {
            println!("No divisions yet.");
            return Ok(());
        }

        match self.output {
            OutputFormat::Table => self.render_table(&rows, threshold, generated_at),
            OutputFormat::Json => {
                let document = ReportDocument {
                    generated_at,
                    risk_threshold: threshold,
                    divisions: &rows,
                };
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
            OutputFormat::Csv => print!("{}", render_csv(&rows, self.quiet)),
        }

        Ok(())
    }

    fn rows(&self, session: &Session) -> anyhow::Result<Vec<DivisionReportRow>> {
        let tree = session.workspace.tree();
        for id in &self.divisions {
            match tree.level_of(id) {
                Some(Level::Division) => {}
                Some(level) => anyhow::bail!("{id} is a {level}, not a division"),
                None => anyhow::bail!("Division {id} not found"),
            }
        }

        let mut rows = division_report(tree, session.workspace.employees(), session.config.risk_threshold());
        if !self.divisions.is_empty() {
            rows.retain(|row| self.divisions.contains(&row.id));
        }
        Ok(rows)
    }

    fn render_table(&self, rows: &[DivisionReportRow], threshold: u8, generated_at: DateTime<Utc>) {
        if !self.quiet {
            println!(
                "{}\n",
                format!("Division report, generated {}", generated_at.format("%Y-%m-%d %H:%M UTC")).dim()
            );
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                vec![
                    row.name.clone(),
                    row.total.to_string(),
                    row.monitored.to_string(),
                    format!("{}%", row.avg_compliance),
                    format!("{:.1}h", row.avg_vdt),
                    row.risk_count.to_string(),
                ]
            })
            .collect();

        terminal::print_table(
            &["DIVISION", "STAFF", "MONITORED", "COMPL", "AVG VDT", "AT RISK"],
            &cells,
            |row_idx, col_idx, cell| {
                let row = &rows[row_idx];
                match col_idx {
                    3 => terminal::paint_compliance(
                        u8::try_from(row.avg_compliance).unwrap_or(100),
                        threshold,
                        cell,
                    ),
                    5 if row.risk_count > 0 => cell.danger(),
                    _ => cell.to_string(),
                }
            },
        );

        if !self.quiet {
            let total: usize = rows.iter().map(|row| row.total).sum();
            let at_risk: usize = rows.iter().map(|row| row.risk_count).sum();
            println!(
                "\n{}",
                format!(
                    "{} division(s), {total} employee(s), {at_risk} below {threshold}% compliance",
                    rows.len()
                )
                .dim()
            );
        }
    }
}

fn render_csv(rows: &[DivisionReportRow], quiet: bool) -> String {
    let mut out = String::new();
    if !quiet {
        out.push_str("id,name,total,monitored,avg_compliance,avg_vdt,risk_count\n");
    }
    for row in rows {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{},{},{:.1},{}",
            csv_escape(row.id.as_str()),
            csv_escape(&row.name),
            row.total,
            row.monitored,
            row.avg_compliance,
            row.avg_vdt,
            row.risk_count
        );
    }
    out
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}
