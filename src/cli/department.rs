use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeRepository,
    domain::{Level, NewDepartment},
};

use super::{Session, confirm, parse_department, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// Display name of the new department
    name: String,

    /// Parent department; omit to create a division
    #[clap(long, value_parser = parse_department)]
    parent: Option<DepartmentId>,
}

impl Add {
    #[instrument(level = "debug", skip(session))]
    pub fn run(self, mut session: Session) -> anyhow::Result<()> {
        let level = match &self.parent {
            None => Level::Division,
            Some(parent) => {
                let Some(level) = session.workspace.tree().level_of(parent) else {
                    anyhow::bail!("Department {parent} not found");
                };
                let Some(child) = level.child_level() else {
                    anyhow::bail!("{parent} is a {level} and cannot have children");
                };
                child
            }
        };

        let id = session.workspace.create_department(NewDepartment {
            name: self.name.clone(),
            level,
            parent_id: self.parent,
        })?;
        session.save()?;

        println!("{}", format!("Added {level} {} ({id})", self.name).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Rename {
    /// The department to rename
    #[clap(value_parser = parse_department)]
    department: DepartmentId,

    /// The new display name
    name: String,
}

impl Rename {
    #[instrument(level = "debug", skip(session))]
    pub fn run(self, mut session: Session) -> anyhow::Result<()> {
        let Some(old) = session
            .workspace
            .tree()
            .find_node(&self.department)
            .map(|node| node.name.clone())
        else {
            anyhow::bail!("Department {} not found", self.department);
        };

        session.workspace.rename_department(&self.department, &self.name)?;
        session.save()?;

        println!("{}", format!("Renamed {old} → {}", self.name).success());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// The department to delete, with everything below it
    #[clap(value_parser = parse_department)]
    department: DepartmentId,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(level = "debug", skip(session))]
    pub fn run(self, mut session: Session) -> anyhow::Result<()> {
        let impact = session.workspace.delete_impact(&self.department)?;
        let path = session
            .workspace
            .tree()
            .path(&self.department)
            .unwrap_or_else(|| impact.name.clone());

        println!("Deleting {path}");
        if impact.descendant_count > 0 {
            println!(
                "  {}",
                format!("{} department(s) below it will also be deleted", impact.descendant_count).warning()
            );
        }
        if !impact.employees.is_empty() {
            println!(
                "\n{} ({}):",
                "Employees who will become unassigned".dim(),
                impact.employees.len()
            );
            for id in &impact.employees {
                if let Ok(employee) = session.workspace.employee(id) {
                    println!("  • {} <{}>", employee.name, employee.email);
                }
            }
        }
        if impact.overrides > 0 {
            println!(
                "\n{}",
                format!("{} policy override(s) will be dropped", impact.overrides).dim()
            );
        }
        println!();

        confirm(self.yes)?;

        let removal = session.workspace.remove_department(&self.department)?;
        session.save()?;

        println!(
            "{}",
            format!("Deleted {} department(s)", removal.removed_ids.len()).success()
        );
        if !removal.unassigned.is_empty() {
            println!(
                "{}",
                format!("   {} employee(s) are now unassigned", removal.unassigned.len()).dim()
            );
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Move {
    /// The department to move
    #[clap(value_parser = parse_department)]
    department: DepartmentId,

    /// The new parent; omit to list valid targets
    #[clap(value_parser = parse_department)]
    parent: Option<DepartmentId>,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Move {
    #[instrument(level = "debug", skip(session))]
    pub fn run(self, mut session: Session) -> anyhow::Result<()> {
        let tree = session.workspace.tree();
        let targets = tree.valid_move_targets(&self.department)?;

        let Some(parent) = &self.parent else {
            if targets.is_empty() {
                println!("{} cannot be moved", self.department);
            } else {
                println!("Valid targets for {}:", self.department);
                for target in targets {
                    let path = tree.path(&target.id).unwrap_or_else(|| target.name.clone());
                    println!("  • {path} ({})", target.id.as_str().dim());
                }
            }
            return Ok(());
        };

        if !targets.iter().any(|target| &target.id == parent) {
            anyhow::bail!(
                "{} cannot be moved under {parent}; run `vdt move {}` to list valid targets",
                self.department,
                self.department
            );
        }

        let from = tree.path(&self.department).unwrap_or_default();
        let to = tree.path(parent).unwrap_or_else(|| parent.to_string());
        let headcount = session.workspace.department_stats(&self.department)?.total;

        println!("Moving {from} → {to}");
        if headcount > 0 {
            println!("  {}", format!("{headcount} employee(s) move with it").dim());
        }
        println!();

        confirm(self.yes)?;

        session.workspace.move_department(&self.department, parent)?;
        session.save()?;

        let now = session
            .workspace
            .tree()
            .path(&self.department)
            .unwrap_or_default();
        println!("{}", format!("Moved to {now}").success());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use tempfile::{TempDir, tempdir};
    use test_case::test_case;
    use vdt_admin::{Dataset, Workspace};

    use super::*;

    fn id(s: &str) -> DepartmentId {
        s.parse().unwrap()
    }

    fn sample_file() -> (TempDir, PathBuf) {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("org.yaml");
        Dataset::sample().save(&path).unwrap();
        (tmp, path)
    }

    fn open(path: &Path) -> Session {
        Session::open(Some(path.to_path_buf()), vdt_admin::Config::default()).unwrap()
    }

    fn reload(path: &Path) -> Workspace {
        Workspace::from_dataset(Dataset::load(path).unwrap(), &vdt_admin::Config::default()).unwrap()
    }

    #[test]
    fn delete_persists_and_unassigns_employees() {
        let (_tmp, path) = sample_file();

        Delete::try_parse_from(["delete", "backend", "--yes"])
            .unwrap()
            .run(open(&path))
            .unwrap();

        let workspace = reload(&path);
        assert!(!workspace.tree().contains(&id("backend")));
        assert!(!workspace.tree().contains(&id("be-api")));
        assert_eq!(workspace.directory().unassigned().count(), 4);
    }

    #[test]
    fn delete_unknown_department_fails() {
        let (_tmp, path) = sample_file();
        let result = Delete::try_parse_from(["delete", "nowhere", "--yes"])
            .unwrap()
            .run(open(&path));
        assert!(result.is_err());
    }

    #[test]
    fn move_persists() {
        let (_tmp, path) = sample_file();

        Move::try_parse_from(["move", "qa", "support", "--yes"])
            .unwrap()
            .run(open(&path))
            .unwrap();

        let workspace = reload(&path);
        assert_eq!(workspace.tree().parent_of(&id("qa")), Some(&id("support")));
    }

    #[test]
    fn move_under_wrong_level_fails() {
        let (_tmp, path) = sample_file();

        let result = Move::try_parse_from(["move", "qa", "frontend", "--yes"])
            .unwrap()
            .run(open(&path));

        assert!(result.is_err());
        assert_eq!(reload(&path).tree().parent_of(&id("qa")), Some(&id("dev")));
    }

    #[test_case("frontend"; "wrong level")]
    #[test_case("dev"; "current parent")]
    #[test_case("nowhere"; "unknown parent")]
    fn invalid_move_is_rejected_before_confirmation(parent: &str) {
        let (_tmp, path) = sample_file();

        let err = Move::try_parse_from(["move", "qa", parent])
            .unwrap()
            .run(open(&path))
            .unwrap_err();

        assert!(err.to_string().contains("cannot be moved under"));
        assert_eq!(reload(&path).tree().parent_of(&id("qa")), Some(&id("dev")));
    }

    #[test]
    fn move_without_parent_only_lists_targets() {
        let (_tmp, path) = sample_file();

        Move::try_parse_from(["move", "qa"])
            .unwrap()
            .run(open(&path))
            .unwrap();

        assert_eq!(reload(&path).tree().parent_of(&id("qa")), Some(&id("dev")));
    }

    #[test]
    fn add_derives_level_from_parent() {
        let (_tmp, path) = sample_file();

        Add::try_parse_from(["add", "Design", "--parent", "frontend"])
            .unwrap()
            .run(open(&path))
            .unwrap();

        let workspace = reload(&path);
        let frontend = workspace.tree().node(&id("frontend")).unwrap();
        let design = frontend.children.last().unwrap();
        assert_eq!(design.name, "Design");
        assert_eq!(design.level, Level::Part);
    }

    #[test]
    fn add_under_part_fails() {
        let (_tmp, path) = sample_file();
        let result = Add::try_parse_from(["add", "Pixels", "--parent", "fe-ui"])
            .unwrap()
            .run(open(&path));
        assert!(result.is_err());
    }

    #[test]
    fn rename_persists() {
        let (_tmp, path) = sample_file();

        Rename::try_parse_from(["rename", "qa", "Quality"])
            .unwrap()
            .run(open(&path))
            .unwrap();

        assert_eq!(reload(&path).tree().node(&id("qa")).unwrap().name, "Quality");
    }
}
