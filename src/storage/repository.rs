//! Repository traits for departments, employees and policies.
//!
//! The traits are the seam a persistent backend would implement. The only
//! implementation today is the in-memory [`Workspace`](super::Workspace).

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::domain::{
    DepartmentId, Employee, EmployeeError, EmployeeId, EmployeePatch, NewDepartment, NewEmployee, OrgTree, Policy,
    PolicyError, PolicyOverride, TreeError,
};

/// Repository error types
#[derive(Debug, Error)]
pub enum Error {
    /// A structural tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// An employee operation failed.
    #[error(transparent)]
    Employee(#[from] EmployeeError),

    /// A policy operation failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, Error>;

/// What a department removal took with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removal {
    /// Ids of the removed department and all of its descendants.
    pub removed_ids: HashSet<DepartmentId>,
    /// Number of descendants removed along with the department.
    pub descendant_count: usize,
    /// Employees who lost their department.
    pub unassigned: Vec<EmployeeId>,
    /// Number of policy overrides dropped.
    pub overrides_dropped: usize,
}

/// Department CRUD.
pub trait DepartmentRepository {
    /// The current organisation tree.
    fn tree(&self) -> &OrgTree;

    /// Creates a department, returning its generated id.
    ///
    /// # Errors
    ///
    /// Fails if the parent is missing or the level does not fit under it.
    fn create_department(&mut self, data: NewDepartment) -> RepoResult<DepartmentId>;

    /// Renames a department.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    fn rename_department(&mut self, id: &DepartmentId, name: &str) -> RepoResult<()>;

    /// Removes a department and its descendants.
    ///
    /// Employees of removed departments become unassigned and their policy
    /// overrides are dropped.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    fn remove_department(&mut self, id: &DepartmentId) -> RepoResult<Removal>;

    /// Moves a department under a new parent.
    ///
    /// # Errors
    ///
    /// Fails if either department is missing, the move would create a cycle,
    /// or the new parent is at the wrong level.
    fn move_department(&mut self, id: &DepartmentId, new_parent: &DepartmentId) -> RepoResult<()>;
}

/// Employee CRUD.
pub trait EmployeeRepository {
    /// All employees in display order.
    fn employees(&self) -> &[Employee];

    /// A single employee.
    ///
    /// # Errors
    ///
    /// Fails if the employee does not exist.
    fn employee(&self, id: &EmployeeId) -> RepoResult<&Employee> {
        self.employees()
            .iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| EmployeeError::NotFound(id.clone()).into())
    }

    /// Invites an employee, returning their generated id.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    fn create_employee(&mut self, data: NewEmployee) -> RepoResult<EmployeeId>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Fails if the employee or a newly given department does not exist, or
    /// a metric is out of range.
    fn update_employee(&mut self, id: &EmployeeId, patch: EmployeePatch) -> RepoResult<()>;

    /// Removes an employee.
    ///
    /// # Errors
    ///
    /// Fails if the employee does not exist.
    fn remove_employee(&mut self, id: &EmployeeId) -> RepoResult<Employee>;

    /// Replaces an employee's administrator memo.
    ///
    /// # Errors
    ///
    /// Fails if the employee does not exist.
    fn update_memo(&mut self, id: &EmployeeId, memo: &str) -> RepoResult<()>;

    /// Assigns, transfers or unassigns one employee; `None` unassigns.
    ///
    /// # Errors
    ///
    /// Fails if the employee or the department does not exist.
    fn set_department(&mut self, id: &EmployeeId, department: Option<&DepartmentId>) -> RepoResult<()>;

    /// Assigns several employees to one department, all or nothing.
    ///
    /// # Errors
    ///
    /// Fails if the department or any employee does not exist.
    fn assign_employees(&mut self, ids: &[EmployeeId], department: &DepartmentId) -> RepoResult<()>;
}

/// Company policy and department overrides.
pub trait PolicyRepository {
    /// The company-wide policy.
    fn company_policy(&self) -> &Policy;

    /// Replaces the company-wide policy.
    fn update_company_policy(&mut self, policy: Policy);

    /// Every stored override, enabled or not.
    fn overrides(&self) -> &BTreeMap<DepartmentId, PolicyOverride>;

    /// Stores the override for one department.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    fn update_override(&mut self, id: &DepartmentId, policy_override: PolicyOverride) -> RepoResult<()>;
}
