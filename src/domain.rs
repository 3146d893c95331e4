//! Domain models for the organisation, its employees and their rest policies.
//!
//! This module contains the department tree, the employee directory, policy
//! inheritance, the statistics derived from them, and configuration.

/// Department identifiers, levels and tree nodes.
pub mod department;
pub use department::{DepartmentId, DepartmentNode, Level, NewDepartment};

/// The organisation tree and its structural operations.
pub mod tree;
pub use tree::{OrgTree, RemovedSubtree, TreeError};

/// Employees and the employee directory.
pub mod employee;
pub use employee::{Employee, EmployeeDirectory, EmployeeError, EmployeeId, EmployeePatch, NewEmployee, Status};

/// Rest policies, overrides and inheritance.
pub mod policy;
pub use policy::{AlertMode, InheritSource, Inheritance, Policy, PolicyBook, PolicyError, PolicyField, PolicyOverride};

/// Statistics over departments and employees.
pub mod stats;
pub use stats::{DashboardSummary, DepartmentStats, DivisionReportRow, StatusCounts};

/// Filtering, sorting and paging of employee listings.
pub mod query;
pub use query::{EmployeeFilter, Page, QueryError, SortDirection, SortKey};

mod config;
pub use config::Config;
