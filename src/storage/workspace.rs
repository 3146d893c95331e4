//! In-memory implementation of the repositories.
//!
//! A [`Workspace`] owns the tree, the employee directory and the policy book,
//! and keeps them consistent: removing departments unassigns their employees
//! and drops their overrides in the same call.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::{
    domain::{
        Config, DepartmentId, Employee, EmployeeDirectory, EmployeeId, EmployeePatch, InheritSource, NewDepartment,
        NewEmployee, OrgTree, Policy, PolicyBook, PolicyField, PolicyOverride, TreeError,
        stats::{self, DepartmentStats},
    },
    storage::{
        dataset::{Dataset, DatasetError},
        repository::{DepartmentRepository, EmployeeRepository, PolicyRepository, Removal, RepoResult},
    },
};

/// The live organisation, employee directory and policy settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    tree: OrgTree,
    directory: EmployeeDirectory,
    policies: PolicyBook,
}

/// What removing a department would affect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteImpact {
    /// Name of the department.
    pub name: String,
    /// Number of descendants that would go with it.
    pub descendant_count: usize,
    /// Employees who would lose their department.
    pub employees: Vec<EmployeeId>,
    /// Number of policy overrides that would be dropped.
    pub overrides: usize,
}

impl Workspace {
    /// Builds a workspace from a dataset.
    ///
    /// The dataset's company policy wins over the configured one.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset fails validation.
    pub fn from_dataset(dataset: Dataset, config: &Config) -> Result<Self, DatasetError> {
        let parts = dataset.into_parts()?;
        let company = parts
            .company_policy
            .unwrap_or_else(|| config.company_policy());
        let policies = PolicyBook::new(company)
            .with_inheritance(config.inheritance)
            .with_overrides(parts.overrides);

        tracing::debug!(
            departments = parts.tree.len(),
            employees = parts.directory.len(),
            overrides = policies.override_count(),
            "workspace ready"
        );

        Ok(Self {
            tree: parts.tree,
            directory: parts.directory,
            policies,
        })
    }

    /// Snapshots the workspace for saving.
    #[must_use]
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            departments: self.tree.divisions().to_vec(),
            employees: self.directory.list().to_vec(),
            company_policy: Some(self.policies.company().clone()),
            overrides: self.policies.overrides().clone(),
        }
    }

    /// The employee directory.
    #[must_use]
    pub const fn directory(&self) -> &EmployeeDirectory {
        &self.directory
    }

    /// The policy book.
    #[must_use]
    pub const fn policies(&self) -> &PolicyBook {
        &self.policies
    }

    /// Statistics for a department and its descendants.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    pub fn department_stats(&self, id: &DepartmentId) -> RepoResult<DepartmentStats> {
        let node = self.tree.node(id)?;
        Ok(stats::department_stats(node, self.directory.list()))
    }

    /// Previews a removal without performing it.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    pub fn delete_impact(&self, id: &DepartmentId) -> RepoResult<DeleteImpact> {
        let node = self.tree.node(id)?;
        let ids = node.descendant_id_set();

        Ok(DeleteImpact {
            name: node.name.clone(),
            descendant_count: node.count_descendants(),
            employees: self
                .directory
                .by_department_set(&ids)
                .map(|e| e.id.clone())
                .collect(),
            overrides: self
                .policies
                .overrides()
                .keys()
                .filter(|key| ids.contains(*key))
                .count(),
        })
    }

    /// The policy in force for a department and where it comes from.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    pub fn effective_policy(&self, id: &DepartmentId) -> RepoResult<(Policy, InheritSource)> {
        self.tree.node(id)?;
        Ok((
            self.policies.effective_policy(&self.tree, id),
            self.policies.inherit_source(&self.tree, id),
        ))
    }

    /// The policy a department would follow without its own override.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    pub fn parent_policy(&self, id: &DepartmentId) -> RepoResult<Policy> {
        self.tree.node(id)?;
        Ok(self.tree.parent_of(id).map_or_else(
            || self.policies.company().clone(),
            |parent| self.policies.effective_policy(&self.tree, parent),
        ))
    }

    /// Flips a department's override on or off, returning the new state.
    ///
    /// A first-time override starts as a copy of the parent policy.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_override(&mut self, id: &DepartmentId) -> RepoResult<bool> {
        let parent = self.parent_policy(id)?;
        Ok(self.policies.toggle_override(id, &parent))
    }

    /// Discards a department's edits and re-copies the parent policy.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn reset_override(&mut self, id: &DepartmentId) -> RepoResult<()> {
        let parent = self.parent_policy(id)?;
        self.policies.reset_override(id, &parent);
        Ok(())
    }

    /// Edits one field of a department's override.
    ///
    /// # Errors
    ///
    /// Fails if the department does not exist, has no override, or the value
    /// does not parse.
    #[instrument(level = "debug", skip(self))]
    pub fn update_override_field(&mut self, id: &DepartmentId, field: PolicyField, value: &str) -> RepoResult<()> {
        self.tree.node(id)?;
        self.policies.update_override_field(id, field, value)?;
        Ok(())
    }

    /// Edits one field of the company policy.
    ///
    /// # Errors
    ///
    /// Fails if the value does not parse.
    pub fn update_company_field(&mut self, field: PolicyField, value: &str) -> RepoResult<()> {
        let mut policy = self.policies.company().clone();
        policy.set_field(field, value)?;
        self.policies.set_company(policy);
        Ok(())
    }

    /// Restores the built-in company policy.
    pub fn reset_company_policy(&mut self) {
        self.policies.reset_company();
    }

    fn ensure_department(&self, id: Option<&DepartmentId>) -> RepoResult<()> {
        match id {
            Some(id) if !self.tree.contains(id) => Err(TreeError::NotFound(id.clone()).into()),
            _ => Ok(()),
        }
    }
}

impl DepartmentRepository for Workspace {
    fn tree(&self) -> &OrgTree {
        &self.tree
    }

    #[instrument(level = "debug", skip(self, data), fields(name = %data.name, level = %data.level))]
    fn create_department(&mut self, data: NewDepartment) -> RepoResult<DepartmentId> {
        let node = data.into_node();
        let id = node.id.clone();
        self.tree = match node.parent_id.clone() {
            Some(parent) => self.tree.add_child(&parent, node)?,
            None => self.tree.add_division(node)?,
        };
        tracing::info!(department = %id, "created department");
        Ok(id)
    }

    #[instrument(level = "debug", skip(self))]
    fn rename_department(&mut self, id: &DepartmentId, name: &str) -> RepoResult<()> {
        self.tree = self.tree.rename_node(id, name)?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn remove_department(&mut self, id: &DepartmentId) -> RepoResult<Removal> {
        let (tree, removed) = self.tree.remove_subtree(id)?;
        self.tree = tree;

        let unassigned = self.directory.unassign_departments(&removed.removed_ids);
        let overrides_dropped = self.policies.remove_overrides(&removed.removed_ids);

        tracing::info!(
            department = %id,
            descendants = removed.descendant_count,
            unassigned = unassigned.len(),
            overrides_dropped,
            "removed department"
        );

        Ok(Removal {
            removed_ids: removed.removed_ids,
            descendant_count: removed.descendant_count,
            unassigned,
            overrides_dropped,
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn move_department(&mut self, id: &DepartmentId, new_parent: &DepartmentId) -> RepoResult<()> {
        self.tree = self.tree.move_node(id, new_parent)?;
        tracing::info!(department = %id, parent = %new_parent, "moved department");
        Ok(())
    }
}

impl EmployeeRepository for Workspace {
    fn employees(&self) -> &[Employee] {
        self.directory.list()
    }

    #[instrument(level = "debug", skip(self, data), fields(email = %data.email))]
    fn create_employee(&mut self, data: NewEmployee) -> RepoResult<EmployeeId> {
        self.ensure_department(data.department_id.as_ref())?;
        let id = self.directory.create(data).id.clone();
        tracing::info!(employee = %id, "invited employee");
        Ok(id)
    }

    #[instrument(level = "debug", skip(self, patch))]
    fn update_employee(&mut self, id: &EmployeeId, patch: EmployeePatch) -> RepoResult<()> {
        if let Some(department) = &patch.department_id {
            self.ensure_department(department.as_ref())?;
        }
        self.directory.update(id, patch)?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn remove_employee(&mut self, id: &EmployeeId) -> RepoResult<Employee> {
        Ok(self.directory.remove(id)?)
    }

    fn update_memo(&mut self, id: &EmployeeId, memo: &str) -> RepoResult<()> {
        self.directory.update_memo(id, memo)?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn set_department(&mut self, id: &EmployeeId, department: Option<&DepartmentId>) -> RepoResult<()> {
        self.ensure_department(department)?;
        self.directory.set_department(id, department.cloned())?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
    fn assign_employees(&mut self, ids: &[EmployeeId], department: &DepartmentId) -> RepoResult<()> {
        self.ensure_department(Some(department))?;
        self.directory.assign_many(ids, department)?;
        Ok(())
    }
}

impl PolicyRepository for Workspace {
    fn company_policy(&self) -> &Policy {
        self.policies.company()
    }

    fn update_company_policy(&mut self, policy: Policy) {
        self.policies.set_company(policy);
    }

    fn overrides(&self) -> &BTreeMap<DepartmentId, PolicyOverride> {
        self.policies.overrides()
    }

    fn update_override(&mut self, id: &DepartmentId, policy_override: PolicyOverride) -> RepoResult<()> {
        self.tree.node(id)?;
        self.policies.set_override(id.clone(), policy_override);
        Ok(())
    }
}
