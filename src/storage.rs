/// Serializable snapshots and the built-in sample data.
pub mod dataset;
/// Repository traits and their error type.
pub mod repository;
mod workspace;

pub use dataset::{Dataset, DatasetError};
pub use repository::{DepartmentRepository, EmployeeRepository, Error, PolicyRepository, Removal, RepoResult};
pub use workspace::{DeleteImpact, Workspace};
