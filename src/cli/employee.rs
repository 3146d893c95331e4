use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeId, EmployeeRepository,
    domain::{EmployeePatch, NewEmployee, Status},
};

use super::{Session, parse_department, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: EmployeeCommand,
}

#[derive(Debug, clap::Parser)]
enum EmployeeCommand {
    /// Invite a new employee (starts as pending)
    Invite {
        /// Full name
        name: String,

        /// Work email address
        email: String,

        /// Job title
        #[arg(long, default_value = "")]
        position: String,

        /// Department to assign straight away
        #[arg(long, value_parser = parse_department)]
        department: Option<DepartmentId>,
    },

    /// Edit an employee's details
    Edit {
        /// The employee to edit
        employee: EmployeeId,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New email address
        #[arg(long)]
        email: Option<String>,

        /// New job title
        #[arg(long)]
        position: Option<String>,

        /// New monitoring status
        #[arg(long)]
        status: Option<Status>,

        /// New mobile number
        #[arg(long)]
        phone: Option<String>,

        /// New desk extension
        #[arg(long)]
        extension: Option<String>,
    },

    /// Assign or transfer employees to a department
    Assign {
        /// Target department
        #[arg(value_parser = parse_department)]
        department: DepartmentId,

        /// Employees to move
        #[arg(required = true)]
        employees: Vec<EmployeeId>,
    },

    /// Remove employees from their department
    Unassign {
        /// Employees to unassign
        #[arg(required = true)]
        employees: Vec<EmployeeId>,
    },

    /// Replace an employee's administrator note
    Memo {
        /// The employee
        employee: EmployeeId,

        /// The new note; empty clears it
        #[arg(default_value = "")]
        text: String,
    },

    /// Delete an employee record
    Remove {
        /// The employee to delete
        employee: EmployeeId,

        /// Skip confirmation prompts
        #[arg(long, short)]
        yes: bool,
    },
}

impl Command {
    #[instrument(level = "debug", skip(session))]
    pub fn run(self, mut session: Session) -> anyhow::Result<()> {
        let workspace = &mut session.workspace;

        match self.command {
            EmployeeCommand::Invite {
                name,
                email,
                position,
                department,
            } => {
                let id = workspace.create_employee(NewEmployee {
                    name: name.clone(),
                    email,
                    position,
                    department_id: department,
                    ..NewEmployee::default()
                })?;
                println!("{}", format!("Invited {name} ({id})").success());
            }
            EmployeeCommand::Edit {
                employee,
                name,
                email,
                position,
                status,
                phone,
                extension,
            } => {
                let patch = EmployeePatch {
                    name,
                    email,
                    position,
                    status,
                    phone,
                    extension,
                    ..EmployeePatch::default()
                };
                if patch == EmployeePatch::default() {
                    anyhow::bail!("Nothing to change; pass at least one field");
                }
                workspace.update_employee(&employee, patch)?;
                println!("{}", format!("Updated {employee}").success());
            }
            EmployeeCommand::Assign {
                department,
                employees,
            } => {
                let target = workspace.tree().node(&department)?;
                if !target.is_leaf() {
                    println!(
                        "{}",
                        format!("{} has sub-departments; employees usually sit in a leaf", target.name).warning()
                    );
                }
                let path = workspace.tree().path(&department).unwrap_or_default();
                workspace.assign_employees(&employees, &department)?;
                println!(
                    "{}",
                    format!("Assigned {} employee(s) to {path}", employees.len()).success()
                );
            }
            EmployeeCommand::Unassign { employees } => {
                for id in &employees {
                    workspace.employee(id)?;
                }
                for id in &employees {
                    workspace.set_department(id, None)?;
                }
                println!("{}", format!("Unassigned {} employee(s)", employees.len()).success());
            }
            EmployeeCommand::Memo { employee, text } => {
                workspace.update_memo(&employee, &text)?;
                let done = if text.is_empty() { "Cleared" } else { "Updated" };
                println!("{}", format!("{done} memo for {employee}").success());
            }
            EmployeeCommand::Remove { employee, yes } => {
                let record = workspace.employee(&employee)?;
                println!("Deleting {} <{}>", record.name, record.email);
                super::confirm(yes)?;
                let removed = workspace.remove_employee(&employee)?;
                println!("{}", format!("Deleted {}", removed.name).success());
            }
        }

        session.save()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use tempfile::{TempDir, tempdir};
    use vdt_admin::{Dataset, Employee};

    use super::*;

    fn sample_file() -> (TempDir, PathBuf) {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("org.yaml");
        Dataset::sample().save(&path).unwrap();
        (tmp, path)
    }

    fn run(path: &Path, args: &[&str]) -> anyhow::Result<()> {
        let command = Command::try_parse_from(std::iter::once("employee").chain(args.iter().copied()))?;
        command.run(Session::open(Some(path.to_path_buf()), vdt_admin::Config::default())?)
    }

    fn saved(path: &Path, id: &str) -> Employee {
        Dataset::load(path)
            .unwrap()
            .employees
            .into_iter()
            .find(|e| e.id.as_str() == id)
            .unwrap()
    }

    #[test]
    fn invite_adds_pending_employee() {
        let (_tmp, path) = sample_file();

        run(&path, &["invite", "Nari Han", "nari@company.com", "--department", "qa"]).unwrap();

        let employees = Dataset::load(&path).unwrap().employees;
        let invited = employees.last().unwrap();
        assert_eq!(employees.len(), 26);
        assert_eq!(invited.status, Status::Pending);
        assert_eq!(invited.department_id.as_ref().map(DepartmentId::as_str), Some("qa"));
    }

    #[test]
    fn invite_into_unknown_department_fails() {
        let (_tmp, path) = sample_file();
        assert!(run(&path, &["invite", "Nari Han", "nari@company.com", "--department", "nowhere"]).is_err());
    }

    #[test]
    fn assign_moves_every_employee() {
        let (_tmp, path) = sample_file();

        run(&path, &["assign", "hr", "emp-1", "emp-2"]).unwrap();

        assert_eq!(saved(&path, "emp-1").department_id.unwrap().as_str(), "hr");
        assert_eq!(saved(&path, "emp-2").department_id.unwrap().as_str(), "hr");
    }

    #[test]
    fn unassign_clears_department() {
        let (_tmp, path) = sample_file();
        run(&path, &["unassign", "emp-3"]).unwrap();
        assert!(saved(&path, "emp-3").department_id.is_none());
    }

    #[test]
    fn edit_without_fields_is_rejected() {
        let (_tmp, path) = sample_file();
        assert!(run(&path, &["edit", "emp-1"]).is_err());
    }

    #[test]
    fn edit_updates_status() {
        let (_tmp, path) = sample_file();
        run(&path, &["edit", "emp-1", "--status", "offline"]).unwrap();
        assert_eq!(saved(&path, "emp-1").status, Status::Offline);
    }

    #[test]
    fn memo_is_saved() {
        let (_tmp, path) = sample_file();
        run(&path, &["memo", "emp-4", "On leave until May"]).unwrap();
        assert_eq!(saved(&path, "emp-4").memo, "On leave until May");
    }

    #[test]
    fn remove_with_yes_deletes_record() {
        let (_tmp, path) = sample_file();
        run(&path, &["remove", "emp-25", "--yes"]).unwrap();
        assert_eq!(Dataset::load(&path).unwrap().employees.len(), 24);
    }
}
