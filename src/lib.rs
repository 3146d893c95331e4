//! Administration core for VDT rest-compliance monitoring.
//!
//! Departments form a three-level tree (division, team, part). Employees are
//! assigned to departments, and each department follows a rest policy that is
//! either its own override or inherited from above.

pub mod domain;
pub use domain::{Config, DepartmentId, Employee, EmployeeId, OrgTree, Policy, PolicyBook};

/// In-memory repositories and dataset loading.
pub mod storage;
pub use storage::{Dataset, DepartmentRepository, EmployeeRepository, PolicyRepository, Workspace};
