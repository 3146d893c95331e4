//! Employee records and the in-memory directory that holds them.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::department::{DepartmentId, InvalidIdError};

/// A validated, non-empty employee identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmployeeId(String);

impl EmployeeId {
    /// Creates a new `EmployeeId`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIdError`] if the string is empty or contains
    /// whitespace. Department ids follow the same rule.
    pub fn new(s: String) -> Result<Self, InvalidIdError> {
        // Reuse the department validation so both id kinds agree.
        DepartmentId::new(s).map(|id| Self(id.into()))
    }

    /// Generates a fresh identifier of the form `emp-{uuid}`.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("emp-{}", Uuid::new_v4().simple()))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmployeeId {
    type Error = InvalidIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EmployeeId {
    type Error = InvalidIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<EmployeeId> for String {
    fn from(id: EmployeeId) -> Self {
        id.0
    }
}

impl FromStr for EmployeeId {
    type Err = InvalidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monitoring status of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Agent installed and reporting, no outstanding issues.
    Active,
    /// Reporting, but breaking rest or usage guidelines.
    Warning,
    /// Not reporting (leave, uninstalled agent, ...).
    Offline,
    /// Invited, no activity data yet.
    Pending,
}

impl Status {
    /// All statuses in tab order.
    pub const ALL: [Self; 4] = [Self::Active, Self::Warning, Self::Offline, Self::Pending];

    /// Lowercase name used in serialized data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Warning => "warning",
            Self::Offline => "offline",
            Self::Pending => "pending",
        }
    }

    /// Whether the employee is currently being monitored.
    #[must_use]
    pub const fn is_monitored(self) -> bool {
        matches!(self, Self::Active | Self::Warning)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = InvalidStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidStatusError(s.to_string()))
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown status '{0}': expected active, warning, offline or pending")]
pub struct InvalidStatusError(String);

fn placeholder() -> String {
    "-".to_string()
}

/// An employee tracked by the monitoring agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier.
    pub id: EmployeeId,
    /// Full name.
    pub name: String,
    /// Work email address.
    pub email: String,
    /// Job title.
    #[serde(default)]
    pub position: String,
    /// Department the employee belongs to; `None` means unassigned.
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    /// Monitoring status.
    pub status: Status,
    /// Percentage (0-100) of required rest breaks taken.
    ///
    /// 0 means no activity data yet.
    #[serde(default)]
    pub compliance: u8,
    /// Average display-terminal hours per day.
    ///
    /// 0 means no activity data yet.
    #[serde(default)]
    pub avg_vdt: f64,
    /// Display-terminal time today, as reported by the agent.
    #[serde(default = "placeholder")]
    pub today_vdt: String,
    /// When the agent last reported, as displayed.
    #[serde(default = "placeholder")]
    pub last_active: String,
    /// Mobile phone number.
    #[serde(default)]
    pub phone: String,
    /// Desk extension.
    #[serde(default)]
    pub extension: String,
    /// Free-form administrator note.
    #[serde(default)]
    pub memo: String,
}

impl Employee {
    /// Whether the agent has reported any usage for this employee.
    ///
    /// Pending and offline rows carry zero placeholders for both metrics and
    /// must not drag averages down.
    #[must_use]
    pub fn has_activity_data(&self) -> bool {
        self.compliance > 0 || self.avg_vdt > 0.0
    }

    /// Whether the employee is reporting and below the compliance threshold.
    #[must_use]
    pub fn is_at_risk(&self, threshold: u8) -> bool {
        self.has_activity_data() && self.compliance < threshold
    }

    /// Checks that the activity metrics are in range.
    ///
    /// # Errors
    ///
    /// Returns [`EmployeeError::ComplianceOutOfRange`] if compliance exceeds
    /// 100, or [`EmployeeError::HoursOutOfRange`] if the average hours are
    /// not a finite value between 0 and 24.
    pub fn validate(&self) -> Result<(), EmployeeError> {
        check_compliance(self.compliance)?;
        check_hours(self.avg_vdt)
    }
}

const fn check_compliance(compliance: u8) -> Result<(), EmployeeError> {
    if compliance > 100 {
        return Err(EmployeeError::ComplianceOutOfRange(compliance));
    }
    Ok(())
}

// NaN fails the range check.
fn check_hours(hours: f64) -> Result<(), EmployeeError> {
    if !(0.0..=24.0).contains(&hours) {
        return Err(EmployeeError::HoursOutOfRange(hours));
    }
    Ok(())
}

/// Input for inviting a new employee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEmployee {
    /// Full name.
    pub name: String,
    /// Work email address.
    pub email: String,
    /// Job title.
    pub position: String,
    /// Initial department, if any.
    pub department_id: Option<DepartmentId>,
    /// Mobile phone number.
    pub phone: String,
    /// Desk extension.
    pub extension: String,
    /// Administrator note.
    pub memo: String,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeePatch {
    /// New name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New job title.
    pub position: Option<String>,
    /// New department; `Some(None)` unassigns.
    pub department_id: Option<Option<DepartmentId>>,
    /// New status.
    pub status: Option<Status>,
    /// New compliance percentage.
    pub compliance: Option<u8>,
    /// New average VDT hours.
    pub avg_vdt: Option<f64>,
    /// New phone number.
    pub phone: Option<String>,
    /// New extension.
    pub extension: Option<String>,
    /// New memo.
    pub memo: Option<String>,
}

impl EmployeePatch {
    fn validate(&self) -> Result<(), EmployeeError> {
        if let Some(compliance) = self.compliance {
            check_compliance(compliance)?;
        }
        if let Some(hours) = self.avg_vdt {
            check_hours(hours)?;
        }
        Ok(())
    }

    fn apply(self, employee: &mut Employee) {
        let Self {
            name,
            email,
            position,
            department_id,
            status,
            compliance,
            avg_vdt,
            phone,
            extension,
            memo,
        } = self;

        if let Some(name) = name {
            employee.name = name;
        }
        if let Some(email) = email {
            employee.email = email;
        }
        if let Some(position) = position {
            employee.position = position;
        }
        if let Some(department_id) = department_id {
            employee.department_id = department_id;
        }
        if let Some(status) = status {
            employee.status = status;
        }
        if let Some(compliance) = compliance {
            employee.compliance = compliance;
        }
        if let Some(avg_vdt) = avg_vdt {
            employee.avg_vdt = avg_vdt;
        }
        if let Some(phone) = phone {
            employee.phone = phone;
        }
        if let Some(extension) = extension {
            employee.extension = extension;
        }
        if let Some(memo) = memo {
            employee.memo = memo;
        }
    }
}

/// Errors raised by directory operations.
#[derive(Debug, Error, PartialEq)]
pub enum EmployeeError {
    /// No employee with this id.
    #[error("employee {0} not found")]
    NotFound(EmployeeId),
    /// An employee with this id already exists.
    #[error("employee id {0} is already in use")]
    DuplicateId(EmployeeId),
    /// Compliance must be a percentage.
    #[error("compliance {0} is out of range (0-100)")]
    ComplianceOutOfRange(u8),
    /// Daily hours must fit in a day.
    #[error("average VDT {0}h is out of range (0-24)")]
    HoursOutOfRange(f64),
}

/// Ordered collection of employees.
///
/// Insertion order is display order. Lookups are linear scans; the directory
/// is sized for a single company's staff list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeDirectory {
    employees: Vec<Employee>,
}

impl EmployeeDirectory {
    /// Builds a directory from existing records.
    ///
    /// # Errors
    ///
    /// Returns [`EmployeeError::DuplicateId`] if two records share an id, or
    /// a range error if a record's metrics are out of bounds.
    pub fn from_employees(employees: Vec<Employee>) -> Result<Self, EmployeeError> {
        let mut seen = HashSet::with_capacity(employees.len());
        for employee in &employees {
            if !seen.insert(&employee.id) {
                return Err(EmployeeError::DuplicateId(employee.id.clone()));
            }
            employee.validate()?;
        }
        Ok(Self { employees })
    }

    /// All employees in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Employee] {
        &self.employees
    }

    /// Consumes the directory, returning its records.
    #[must_use]
    pub fn into_employees(self) -> Vec<Employee> {
        self.employees
    }

    /// Number of employees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Finds an employee by id.
    #[must_use]
    pub fn get(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| &e.id == id)
    }

    /// Invites a new employee. They start `pending` with no activity data.
    pub fn create(&mut self, data: NewEmployee) -> &Employee {
        let NewEmployee {
            name,
            email,
            position,
            department_id,
            phone,
            extension,
            memo,
        } = data;

        self.employees.push(Employee {
            id: EmployeeId::generate(),
            name,
            email,
            position,
            department_id,
            status: Status::Pending,
            compliance: 0,
            avg_vdt: 0.0,
            today_vdt: placeholder(),
            last_active: placeholder(),
            phone,
            extension,
            memo,
        });
        &self.employees[self.employees.len() - 1]
    }

    /// Merges the patch into the employee's record.
    ///
    /// Department existence is not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`EmployeeError::NotFound`] for unknown ids, or a range error
    /// if a metric is out of bounds.
    pub fn update(&mut self, id: &EmployeeId, patch: EmployeePatch) -> Result<&Employee, EmployeeError> {
        patch.validate()?;
        let employee = self.get_mut(id)?;
        patch.apply(employee);
        Ok(employee)
    }

    /// Replaces the administrator memo.
    ///
    /// # Errors
    ///
    /// Returns [`EmployeeError::NotFound`] for unknown ids.
    pub fn update_memo(&mut self, id: &EmployeeId, memo: impl Into<String>) -> Result<&Employee, EmployeeError> {
        let employee = self.get_mut(id)?;
        employee.memo = memo.into();
        Ok(employee)
    }

    /// Removes an employee, returning the removed record.
    ///
    /// # Errors
    ///
    /// Returns [`EmployeeError::NotFound`] for unknown ids.
    pub fn remove(&mut self, id: &EmployeeId) -> Result<Employee, EmployeeError> {
        let position = self
            .employees
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| EmployeeError::NotFound(id.clone()))?;
        Ok(self.employees.remove(position))
    }

    /// Assigns, transfers or unassigns an employee.
    ///
    /// # Errors
    ///
    /// Returns [`EmployeeError::NotFound`] for unknown ids.
    pub fn set_department(
        &mut self,
        id: &EmployeeId,
        department: Option<DepartmentId>,
    ) -> Result<&Employee, EmployeeError> {
        let employee = self.get_mut(id)?;
        employee.department_id = department;
        Ok(employee)
    }

    /// Assigns several employees to the same department.
    ///
    /// Either every id is known and all are assigned, or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`EmployeeError::NotFound`] for the first unknown id.
    pub fn assign_many(&mut self, ids: &[EmployeeId], department: &DepartmentId) -> Result<(), EmployeeError> {
        if let Some(missing) = ids.iter().find(|id| self.get(id).is_none()) {
            return Err(EmployeeError::NotFound(missing.clone()));
        }
        for id in ids {
            self.set_department(id, Some(department.clone()))?;
        }
        Ok(())
    }

    /// Clears the department of every employee assigned to one of `ids`.
    ///
    /// Returns the ids of the employees that were unassigned.
    pub fn unassign_departments(&mut self, ids: &HashSet<DepartmentId>) -> Vec<EmployeeId> {
        self.employees
            .iter_mut()
            .filter(|e| e.department_id.as_ref().is_some_and(|d| ids.contains(d)))
            .map(|e| {
                e.department_id = None;
                e.id.clone()
            })
            .collect()
    }

    /// Employees assigned to any department in `ids`, in directory order.
    pub fn by_department_set<'a>(
        &'a self,
        ids: &'a HashSet<DepartmentId>,
    ) -> impl Iterator<Item = &'a Employee> + 'a {
        in_departments(&self.employees, ids)
    }

    /// Employees without a department.
    pub fn unassigned(&self) -> impl Iterator<Item = &Employee> {
        self.employees.iter().filter(|e| e.department_id.is_none())
    }
}

impl EmployeeDirectory {
    fn get_mut(&mut self, id: &EmployeeId) -> Result<&mut Employee, EmployeeError> {
        self.employees
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| EmployeeError::NotFound(id.clone()))
    }
}

/// Filters `employees` down to those assigned to a department in `ids`.
pub fn in_departments<'a>(
    employees: &'a [Employee],
    ids: &'a HashSet<DepartmentId>,
) -> impl Iterator<Item = &'a Employee> + 'a {
    employees
        .iter()
        .filter(move |e| e.department_id.as_ref().is_some_and(|d| ids.contains(d)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn employee(id: &str, department: Option<&str>, status: Status, compliance: u8, avg_vdt: f64) -> Employee {
        Employee {
            id: EmployeeId::try_from(id).unwrap(),
            name: id.to_string(),
            email: format!("{id}@company.com"),
            position: String::new(),
            department_id: department.map(|d| DepartmentId::try_from(d).unwrap()),
            status,
            compliance,
            avg_vdt,
            today_vdt: placeholder(),
            last_active: placeholder(),
            phone: String::new(),
            extension: String::new(),
            memo: String::new(),
        }
    }

    fn dept(s: &str) -> DepartmentId {
        DepartmentId::try_from(s).unwrap()
    }

    fn emp_id(s: &str) -> EmployeeId {
        EmployeeId::try_from(s).unwrap()
    }

    fn directory() -> EmployeeDirectory {
        EmployeeDirectory::from_employees(vec![
            employee("emp-1", Some("fe-ui"), Status::Active, 85, 6.2),
            employee("emp-2", Some("fe-ux"), Status::Warning, 45, 8.7),
            employee("emp-3", None, Status::Pending, 0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn create_starts_pending_without_activity() {
        let mut dir = directory();
        let created = dir
            .create(NewEmployee {
                name: "New Hire".to_string(),
                email: "new@company.com".to_string(),
                ..NewEmployee::default()
            })
            .clone();

        assert_eq!(created.status, Status::Pending);
        assert_eq!(created.compliance, 0);
        assert!(created.avg_vdt.abs() < f64::EPSILON);
        assert!(!created.has_activity_data());
        assert!(created.id.as_str().starts_with("emp-"));
        assert_eq!(dir.list().last().unwrap().id, created.id);
        assert_eq!(dir.len(), 4);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut dir = directory();
        let updated = dir
            .update(
                &emp_id("emp-1"),
                EmployeePatch {
                    position: Some("Lead".to_string()),
                    compliance: Some(90),
                    ..EmployeePatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.position, "Lead");
        assert_eq!(updated.compliance, 90);
        assert_eq!(updated.email, "emp-1@company.com");
        assert_eq!(updated.department_id, Some(dept("fe-ui")));
    }

    #[test]
    fn update_rejects_out_of_range_compliance() {
        let mut dir = directory();
        let err = dir
            .update(
                &emp_id("emp-1"),
                EmployeePatch {
                    compliance: Some(101),
                    ..EmployeePatch::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, EmployeeError::ComplianceOutOfRange(101));
        assert_eq!(dir.get(&emp_id("emp-1")).unwrap().compliance, 85);
    }

    #[test]
    fn missing_ids_are_reported() {
        let mut dir = directory();
        let missing = emp_id("emp-99");
        assert_eq!(
            dir.update_memo(&missing, "hi").unwrap_err(),
            EmployeeError::NotFound(missing.clone())
        );
        assert_eq!(dir.remove(&missing).unwrap_err(), EmployeeError::NotFound(missing));
    }

    #[test]
    fn set_department_covers_assign_transfer_unassign() {
        let mut dir = directory();
        let id = emp_id("emp-3");

        dir.set_department(&id, Some(dept("qa"))).unwrap();
        assert_eq!(dir.get(&id).unwrap().department_id, Some(dept("qa")));

        dir.set_department(&id, Some(dept("be-api"))).unwrap();
        assert_eq!(dir.get(&id).unwrap().department_id, Some(dept("be-api")));

        dir.set_department(&id, None).unwrap();
        assert_eq!(dir.unassigned().count(), 1);
    }

    #[test]
    fn assign_many_is_all_or_nothing() {
        let mut dir = directory();
        let err = dir
            .assign_many(&[emp_id("emp-1"), emp_id("ghost")], &dept("qa"))
            .unwrap_err();
        assert_eq!(err, EmployeeError::NotFound(emp_id("ghost")));
        assert_eq!(dir.get(&emp_id("emp-1")).unwrap().department_id, Some(dept("fe-ui")));

        dir.assign_many(&[emp_id("emp-1"), emp_id("emp-3")], &dept("qa"))
            .unwrap();
        let ids: HashSet<_> = [dept("qa")].into_iter().collect();
        assert_eq!(dir.by_department_set(&ids).count(), 2);
    }

    #[test]
    fn unassign_departments_clears_matching_rows() {
        let mut dir = directory();
        let ids: HashSet<_> = [dept("fe-ui"), dept("fe-ux")].into_iter().collect();

        let cleared = dir.unassign_departments(&ids);

        assert_eq!(cleared, [emp_id("emp-1"), emp_id("emp-2")]);
        assert_eq!(dir.unassigned().count(), 3);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = EmployeeDirectory::from_employees(vec![
            employee("emp-1", None, Status::Active, 80, 5.0),
            employee("emp-1", None, Status::Active, 80, 5.0),
        ])
        .unwrap_err();
        assert_eq!(err, EmployeeError::DuplicateId(emp_id("emp-1")));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("WARNING".parse::<Status>().unwrap(), Status::Warning);
        assert!("asleep".parse::<Status>().is_err());
    }

    #[test]
    fn risk_requires_activity_data() {
        let pending = employee("p", None, Status::Pending, 0, 0.0);
        let struggling = employee("s", None, Status::Warning, 38, 9.3);
        assert!(!pending.is_at_risk(60));
        assert!(struggling.is_at_risk(60));
        assert!(!struggling.is_at_risk(30));
    }
}
