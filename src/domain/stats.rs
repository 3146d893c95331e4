//! Statistics derived from the tree and the employee directory.
//!
//! Everything here is a pure function of its inputs. Averages only include
//! employees with activity data (see [`Employee::has_activity_data`]) and are
//! zero, never NaN, when nobody qualifies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{
    department::{DepartmentId, DepartmentNode},
    employee::{Employee, Status, in_departments},
    tree::OrgTree,
};

/// Per-status headcounts, as shown on filter tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Every employee counted.
    pub all: usize,
    /// [`Status::Active`]
    pub active: usize,
    /// [`Status::Warning`]
    pub warning: usize,
    /// [`Status::Offline`]
    pub offline: usize,
    /// [`Status::Pending`]
    pub pending: usize,
}

impl StatusCounts {
    /// The count for one status.
    #[must_use]
    pub const fn get(&self, status: Status) -> usize {
        match status {
            Status::Active => self.active,
            Status::Warning => self.warning,
            Status::Offline => self.offline,
            Status::Pending => self.pending,
        }
    }
}

/// Counts employees by status.
pub fn tab_counts<'a>(employees: impl IntoIterator<Item = &'a Employee>) -> StatusCounts {
    employees
        .into_iter()
        .fold(StatusCounts::default(), |mut counts, employee| {
            counts.all += 1;
            match employee.status {
                Status::Active => counts.active += 1,
                Status::Warning => counts.warning += 1,
                Status::Offline => counts.offline += 1,
                Status::Pending => counts.pending += 1,
            }
            counts
        })
}

/// Average compliance (whole percent) and VDT hours (one decimal) over
/// employees with activity data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Averages {
    /// Mean compliance, rounded to the nearest integer.
    pub compliance: u32,
    /// Mean daily VDT hours, rounded to one decimal place.
    pub vdt: f64,
    /// Number of employees the averages were taken over.
    pub sample: usize,
}

/// Averages over the employees that have activity data.
pub fn averages<'a>(employees: impl IntoIterator<Item = &'a Employee>) -> Averages {
    let (sample, compliance, vdt) = employees
        .into_iter()
        .filter(|e| e.has_activity_data())
        .fold((0_usize, 0_u32, 0.0_f64), |(n, c, v), e| {
            (n + 1, c + u32::from(e.compliance), v + e.avg_vdt)
        });

    if sample == 0 {
        return Averages::default();
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mean_compliance = (f64::from(compliance) / sample as f64).round() as u32;
    #[allow(clippy::cast_precision_loss)]
    let mean_vdt = round_tenths(vdt / sample as f64);

    Averages {
        compliance: mean_compliance,
        vdt: mean_vdt,
        sample,
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Headline numbers for one department and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentStats {
    /// Employees in the subtree.
    pub total: usize,
    /// Employees in the subtree with activity data.
    pub active: usize,
    /// Employees in the subtree with [`Status::Warning`].
    pub warning_count: usize,
    /// Mean compliance over employees with activity data.
    pub avg_compliance: u32,
    /// Mean daily VDT hours over employees with activity data.
    pub avg_vdt: f64,
    /// Headcount by status.
    pub status_breakdown: StatusCounts,
}

/// Statistics for `node` and all of its descendants.
#[must_use]
pub fn department_stats(node: &DepartmentNode, employees: &[Employee]) -> DepartmentStats {
    let ids = node.descendant_id_set();
    let members: Vec<&Employee> = in_departments(employees, &ids).collect();
    let by_status = tab_counts(members.iter().copied());
    let averages = averages(members.iter().copied());

    DepartmentStats {
        total: members.len(),
        active: averages.sample,
        warning_count: by_status.warning,
        avg_compliance: averages.compliance,
        avg_vdt: averages.vdt,
        status_breakdown: by_status,
    }
}

/// Company-wide headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Employees currently monitored (active or warning).
    pub monitored: usize,
    /// Mean daily VDT hours of monitored employees with activity data.
    pub avg_vdt: f64,
    /// Mean compliance of monitored employees with activity data.
    pub avg_compliance: u32,
    /// Monitored employees below the risk threshold.
    pub risk_count: usize,
    /// Headcount by status across the whole directory.
    pub by_status: StatusCounts,
}

/// Computes the dashboard summary over `employees`, which may be the whole
/// directory or one department's subtree.
#[must_use]
pub fn dashboard_summary<'a>(employees: impl IntoIterator<Item = &'a Employee>, risk_threshold: u8) -> DashboardSummary {
    let employees: Vec<&Employee> = employees.into_iter().collect();
    let monitored: Vec<&Employee> = employees.iter().copied().filter(|e| e.status.is_monitored()).collect();
    let averages = averages(monitored.iter().copied());

    DashboardSummary {
        monitored: monitored.len(),
        avg_vdt: averages.vdt,
        avg_compliance: averages.compliance,
        risk_count: monitored.iter().filter(|e| e.is_at_risk(risk_threshold)).count(),
        by_status: tab_counts(employees),
    }
}

/// Employees reporting activity with compliance below the threshold, lowest
/// compliance first.
#[must_use]
pub fn risk_employees<'a>(employees: impl IntoIterator<Item = &'a Employee>, risk_threshold: u8) -> Vec<&'a Employee> {
    let mut at_risk: Vec<&Employee> = employees
        .into_iter()
        .filter(|e| e.is_at_risk(risk_threshold))
        .collect();
    at_risk.sort_by_key(|e| e.compliance);
    at_risk
}

/// Statistics for each direct child of `node`, in tree order.
#[must_use]
pub fn child_stats<'a>(node: &'a DepartmentNode, employees: &[Employee]) -> Vec<(&'a DepartmentNode, DepartmentStats)> {
    node.children
        .iter()
        .map(|child| (child, department_stats(child, employees)))
        .collect()
}

/// Statistics for every division, in tree order.
#[must_use]
pub fn division_stats<'a>(tree: &'a OrgTree, employees: &[Employee]) -> Vec<(&'a DepartmentNode, DepartmentStats)> {
    tree.divisions()
        .iter()
        .map(|division| (division, department_stats(division, employees)))
        .collect()
}

/// One row of the per-division compliance report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisionReportRow {
    /// Division id.
    pub id: DepartmentId,
    /// Division name.
    pub name: String,
    /// Employees in the division, excluding pending invitations.
    pub total: usize,
    /// Employees currently monitored.
    pub monitored: usize,
    /// Mean compliance over employees with activity data.
    pub avg_compliance: u32,
    /// Mean daily VDT hours over employees with activity data.
    pub avg_vdt: f64,
    /// Employees below the risk threshold.
    pub risk_count: usize,
}

/// Builds the per-division report.
#[must_use]
pub fn division_report(tree: &OrgTree, employees: &[Employee], risk_threshold: u8) -> Vec<DivisionReportRow> {
    tree.divisions()
        .iter()
        .map(|division| {
            let ids = division.descendant_id_set();
            let members: Vec<&Employee> = in_departments(employees, &ids)
                .filter(|e| e.status != Status::Pending)
                .collect();
            let averages = averages(members.iter().copied());

            DivisionReportRow {
                id: division.id.clone(),
                name: division.name.clone(),
                total: members.len(),
                monitored: members.iter().filter(|e| e.status.is_monitored()).count(),
                avg_compliance: averages.compliance,
                avg_vdt: averages.vdt,
                risk_count: members.iter().filter(|e| e.is_at_risk(risk_threshold)).count(),
            }
        })
        .collect()
}

/// Subtree headcount for every department.
#[must_use]
pub fn employee_counts(tree: &OrgTree, employees: &[Employee]) -> BTreeMap<DepartmentId, usize> {
    tree.iter()
        .map(|node| {
            let ids = node.descendant_id_set();
            (node.id.clone(), in_departments(employees, &ids).count())
        })
        .collect()
}
