//! Serializable snapshot of everything the administration tool manages.

use std::{collections::BTreeMap, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::{
    DepartmentId, DepartmentNode, Employee, EmployeeDirectory, EmployeeError, EmployeeId, OrgTree, Policy,
    PolicyOverride, TreeError,
};

const SAMPLE: &str = include_str!("sample.yaml");

/// The organisation tree, the employee list and the policy settings, as
/// stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Divisions with their nested teams and parts.
    #[serde(default)]
    pub departments: Vec<DepartmentNode>,
    /// Employees in display order.
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// Company-wide policy; falls back to the configured or built-in default
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_policy: Option<Policy>,
    /// Department overrides keyed by department id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<DepartmentId, PolicyOverride>,
}

impl Dataset {
    /// The built-in demo organisation: five divisions and 25 employees.
    #[must_use]
    pub fn sample() -> Self {
        serde_yaml::from_str(SAMPLE).expect("this must never fail")
    }

    /// Reads a dataset from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if the file cannot be read and
    /// [`DatasetError::Yaml`] if it is not a valid dataset.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path)?;
        let dataset = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded dataset from {}", path.display());
        Ok(dataset)
    }

    /// Writes the dataset to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), DatasetError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the snapshot and splits it into its live parts.
    ///
    /// # Errors
    ///
    /// Fails if the tree is malformed, an employee id repeats, or an employee
    /// or override refers to a department that does not exist.
    pub fn into_parts(self) -> Result<Parts, DatasetError> {
        let tree = OrgTree::from_divisions(self.departments)?;

        let dangling = self.employees.iter().find_map(|e| {
            e.department_id
                .as_ref()
                .filter(|d| !tree.contains(d))
                .map(|d| (e.id.clone(), d.clone()))
        });
        if let Some((employee, department)) = dangling {
            return Err(DatasetError::UnknownDepartment { employee, department });
        }

        if let Some(id) = self.overrides.keys().find(|id| !tree.contains(id)) {
            return Err(DatasetError::OrphanOverride(id.clone()));
        }

        let directory = EmployeeDirectory::from_employees(self.employees)?;

        Ok(Parts {
            tree,
            directory,
            company_policy: self.company_policy,
            overrides: self.overrides,
        })
    }
}

/// A validated [`Dataset`].
#[derive(Debug)]
pub struct Parts {
    /// The organisation tree.
    pub tree: OrgTree,
    /// The employee directory.
    pub directory: EmployeeDirectory,
    /// Company policy stored with the data, if any.
    pub company_policy: Option<Policy>,
    /// Department overrides.
    pub overrides: BTreeMap<DepartmentId, PolicyOverride>,
}

/// Errors loading or validating a [`Dataset`].
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The file could not be read or written.
    #[error("failed to access dataset file: {0}")]
    Io(#[from] io::Error),

    /// The file is not a valid dataset.
    #[error("failed to parse dataset: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The department tree is malformed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The employee list is malformed.
    #[error(transparent)]
    Employee(#[from] EmployeeError),

    /// An employee is assigned to a department that does not exist.
    #[error("employee {employee} is assigned to unknown department {department}")]
    UnknownDepartment {
        /// The employee.
        employee: EmployeeId,
        /// The missing department.
        department: DepartmentId,
    },

    /// A policy override names a department that does not exist.
    #[error("policy override for unknown department {0}")]
    OrphanOverride(DepartmentId),
}
