use clap::Parser;
use serde_json::json;
use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeRepository,
    domain::{
        Employee, EmployeeFilter, OrgTree, SortDirection, SortKey, Status, StatusCounts,
        query::{filter_employees, filtered_tab_counts, paginate, sort_employees},
    },
};

use super::{
    Session,
    terminal::{self, Colorize},
};

/// Command arguments for `vdt employees`.
#[derive(Debug, Parser)]
#[command(about = "List employees with filters, sorting and paging")]
pub struct Employees {
    /// Filter by status (comma-separated: active, warning, offline, pending)
    #[arg(long, value_delimiter = ',', value_name = "STATUS")]
    status: Vec<Status>,

    /// Only employees in this department or below it
    #[arg(long, value_parser = super::parse_department, value_name = "ID")]
    department: Option<DepartmentId>,

    /// Only employees without a department
    #[arg(long, conflicts_with = "department")]
    unassigned: bool,

    /// Case-insensitive substring match against name, email and department
    #[arg(long, conflicts_with = "regex")]
    contains: Option<String>,

    /// Regular expression match against name, email and department
    #[arg(long)]
    regex: Option<String>,

    /// Sort column (name, email, position, department, status, compliance,
    /// avg-vdt, today-vdt, last-active)
    #[arg(long, default_value = "name", value_name = "COLUMN")]
    sort: SortKey,

    /// Sort largest first
    #[arg(long)]
    desc: bool,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Rows per page (defaults to the configured page size)
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Employees {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let tree = session.workspace.tree();
        let employees = session.workspace.employees();

        let filter = self.filter(tree)?;
        let direction = if self.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };

        let matching = filter_employees(employees, &filter, tree);
        let sorted = sort_employees(matching, self.sort, direction, tree);
        let page_size = self.page_size.unwrap_or_else(|| session.config.page_size());
        let page = paginate(&sorted, self.page, page_size);
        tracing::debug!(
            matched = page.total_items,
            page = page.number,
            pages = page.total_pages,
            "Listing employees"
        );

        match self.output {
            OutputFormat::Table => {
                let counts = filtered_tab_counts(employees, &filter, tree);
                print_tabs(&counts, &self.status);

                if page.items.is_empty() {
                    println!("No employees match.");
                    return Ok(());
                }

                let narrow = terminal::is_narrow();
                let threshold = session.config.risk_threshold();
                let rows: Vec<Vec<String>> = page.items.iter().map(|e| row(e, tree, narrow)).collect();
                let headers: &[&str] = if narrow {
                    &["NAME", "STATUS", "COMPL"]
                } else {
                    &["NAME", "EMAIL", "DEPARTMENT", "STATUS", "COMPL", "AVG VDT", "TODAY", "LAST ACTIVE"]
                };
                let status_col = if narrow { 1 } else { 3 };
                let compliance_col = status_col + 1;

                terminal::print_table(headers, &rows, |row_idx, col_idx, cell| {
                    let employee = page.items[row_idx];
                    if col_idx == status_col {
                        paint_status(employee.status, cell)
                    } else if col_idx == compliance_col && employee.has_activity_data() {
                        terminal::paint_compliance(employee.compliance, threshold, cell)
                    } else {
                        cell.to_string()
                    }
                });

                println!(
                    "\n{}",
                    format!(
                        "Showing {}-{} of {} (page {}/{})",
                        page.first_item(),
                        page.last_item(),
                        page.total_items,
                        page.number,
                        page.total_pages
                    )
                    .dim()
                );
            }
            OutputFormat::Json => {
                let items: Vec<_> = page
                    .items
                    .iter()
                    .map(|e| {
                        json!({
                            "id": e.id.as_str(),
                            "name": e.name,
                            "email": e.email,
                            "position": e.position,
                            "department": e.department_id.as_ref().map(DepartmentId::as_str),
                            "department_path": e.department_id.as_ref().and_then(|id| tree.path(id)),
                            "status": e.status,
                            "compliance": e.compliance,
                            "avg_vdt": e.avg_vdt,
                            "today_vdt": e.today_vdt,
                            "last_active": e.last_active,
                        })
                    })
                    .collect();
                let output = json!({
                    "page": page.number,
                    "total_pages": page.total_pages,
                    "total": page.total_items,
                    "employees": items,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }

        Ok(())
    }

    fn filter(&self, tree: &OrgTree) -> anyhow::Result<EmployeeFilter> {
        let mut filter = EmployeeFilter::new().with_statuses(self.status.iter().copied());
        if let Some(department) = &self.department {
            filter = filter.with_department(tree, department)?;
        }
        if self.unassigned {
            filter = filter.unassigned_only();
        }
        if let Some(text) = &self.contains {
            filter = filter.with_text(text);
        }
        if let Some(pattern) = &self.regex {
            filter = filter.with_regex(pattern)?;
        }
        Ok(filter)
    }
}

fn print_tabs(counts: &StatusCounts, selected: &[Status]) {
    let mut tabs = vec![tab("All", counts.all, selected.is_empty())];
    tabs.extend(
        Status::ALL
            .into_iter()
            .map(|status| tab(status.as_str(), counts.get(status), selected.contains(&status))),
    );
    println!("{}\n", tabs.join("  "));
}

fn tab(label: &str, count: usize, selected: bool) -> String {
    let text = format!("{label} ({count})");
    if selected { text.info() } else { text.dim() }
}

fn row(employee: &Employee, tree: &OrgTree, narrow: bool) -> Vec<String> {
    let compliance = if employee.has_activity_data() {
        format!("{}%", employee.compliance)
    } else {
        "-".to_string()
    };

    if narrow {
        return vec![employee.name.clone(), employee.status.to_string(), compliance];
    }

    let department = employee
        .department_id
        .as_ref()
        .and_then(|id| tree.path(id))
        .unwrap_or_else(|| "(unassigned)".to_string());
    let avg_vdt = if employee.has_activity_data() {
        format!("{:.1}h", employee.avg_vdt)
    } else {
        "-".to_string()
    };

    vec![
        employee.name.clone(),
        employee.email.clone(),
        department,
        employee.status.to_string(),
        compliance,
        avg_vdt,
        employee.today_vdt.clone(),
        employee.last_active.clone(),
    ]
}

fn paint_status(status: Status, cell: &str) -> String {
    match status {
        Status::Active => cell.success(),
        Status::Warning => cell.warning(),
        Status::Offline => cell.dim(),
        Status::Pending => cell.info(),
    }
}
