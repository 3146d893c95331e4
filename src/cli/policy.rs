use clap::Parser;
use serde_json::json;
use tracing::instrument;
use vdt_admin::{
    DepartmentId, DepartmentRepository, EmployeeRepository, PolicyRepository, Workspace,
    domain::{
        self, PolicyField,
        policy::{differing_fields, field_differs},
        stats::employee_counts,
    },
};

use super::{
    Session,
    show::describe_source,
    terminal::{self, Colorize},
};

/// Command arguments for `vdt policy`.
#[derive(Debug, Parser)]
#[command(about = "Inspect or edit rest policies")]
pub struct Policy {
    /// Department to inspect; omit to work on the company policy
    #[clap(value_parser = super::parse_department)]
    department: Option<DepartmentId>,

    /// Field to change, as KEY=VALUE (repeatable). Previews unless --apply
    /// is given.
    #[arg(long = "set", value_parser = parse_assignment, value_name = "KEY=VALUE")]
    set: Vec<(PolicyField, String)>,

    /// Write the --set changes back to the dataset
    #[arg(long, requires = "set")]
    apply: bool,

    /// Enable or disable the department's override
    #[arg(long, requires = "department", conflicts_with_all = ["set", "reset"])]
    toggle: bool,

    /// Discard edits: re-copy the parent policy into the department's
    /// override, or restore the built-in company policy
    #[arg(long, conflicts_with = "set")]
    reset: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Parse a `KEY=VALUE` policy assignment.
fn parse_assignment(s: &str) -> Result<(PolicyField, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let field = key.trim().parse::<PolicyField>().map_err(|e| e.to_string())?;
    Ok((field, value.trim().to_string()))
}

impl Policy {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, mut session: Session) -> anyhow::Result<()> {
        if let Some(department) = &self.department {
            if session.workspace.tree().find_node(department).is_none() {
                anyhow::bail!("Department {department} not found");
            }
        }

        if let (true, Some(department)) = (self.toggle, &self.department) {
            let enabled = session.workspace.toggle_override(department)?;
            let state = if enabled { "enabled".success() } else { "disabled".dim() };
            println!("Override for {department} {state}");
            session.save()?;
            return self.output_current(&session);
        }

        if self.reset {
            match &self.department {
                Some(department) => {
                    session.workspace.reset_override(department)?;
                    println!("{}", format!("Override for {department} reset to the parent policy").success());
                }
                None => {
                    session.workspace.reset_company_policy();
                    println!("{}", "Company policy reset to the built-in defaults".success());
                }
            }
            session.save()?;
            return self.output_current(&session);
        }

        if !self.set.is_empty() {
            let mut preview = session.workspace.clone();
            apply_edits(&mut preview, self.department.as_ref(), &self.set)?;
            self.output_preview(&session, &preview)?;

            if self.apply {
                session.workspace = preview;
                session.save()?;
                println!("\n{}", "Policy updated".success());
            } else if matches!(self.output, OutputFormat::Pretty) {
                println!("\n{}", "Preview only; pass --apply to save".dim());
            }
            return Ok(());
        }

        self.output_current(&session)
    }

    fn output_current(&self, session: &Session) -> anyhow::Result<()> {
        match (&self.department, self.output) {
            (Some(department), OutputFormat::Pretty) => output_department(session, department)?,
            (Some(department), OutputFormat::Json) => {
                let (policy, source) = session.workspace.effective_policy(department)?;
                let stored = session.workspace.policies().override_for(department);
                let output = json!({
                    "department": department.as_str(),
                    "policy": policy,
                    "source": source,
                    "override": stored.map(|o| json!({ "enabled": o.enabled })),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            (None, OutputFormat::Pretty) => output_company(session),
            (None, OutputFormat::Json) => {
                let output = json!({
                    "company": session.workspace.company_policy(),
                    "overrides": session.workspace.overrides(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }

    fn output_preview(&self, session: &Session, preview: &Workspace) -> anyhow::Result<()> {
        let (base, after) = match &self.department {
            Some(department) => (
                session.workspace.parent_policy(department)?,
                preview.effective_policy(department)?.0,
            ),
            None => (domain::Policy::default(), preview.company_policy().clone()),
        };
        let before = match &self.department {
            Some(department) => session.workspace.effective_policy(department)?.0,
            None => session.workspace.company_policy().clone(),
        };

        match self.output {
            OutputFormat::Json => {
                let changed: Vec<_> = differing_fields(&after, &before)
                    .into_iter()
                    .map(PolicyField::as_str)
                    .collect();
                let output = json!({
                    "department": self.department.as_ref().map(DepartmentId::as_str),
                    "before": before,
                    "after": after,
                    "changed": changed,
                    "applied": self.apply,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Pretty => {
                let target = self
                    .department
                    .as_ref()
                    .and_then(|id| session.workspace.tree().path(id))
                    .unwrap_or_else(|| "Company policy".to_string());
                println!("# {target}\n");

                let base_label = if self.department.is_some() { "PARENT" } else { "DEFAULT" };
                let rows: Vec<Vec<String>> = PolicyField::ALL
                    .into_iter()
                    .map(|field| {
                        vec![
                            field.as_str().to_string(),
                            base.display_field(field),
                            before.display_field(field),
                            after.display_field(field),
                        ]
                    })
                    .collect();
                terminal::print_table(&["FIELD", base_label, "CURRENT", "NEW"], &rows, |row, col, cell| {
                    let field = PolicyField::ALL[row];
                    match col {
                        3 if field_differs(&after, &before, field) => cell.warning(),
                        3 if field_differs(&after, &base, field) => cell.info(),
                        _ => cell.to_string(),
                    }
                });
            }
        }
        Ok(())
    }
}

/// Applies field assignments to a department's override, creating or
/// re-enabling it first, or to the company policy when no department is
/// given.
fn apply_edits(
    workspace: &mut Workspace,
    department: Option<&DepartmentId>,
    edits: &[(PolicyField, String)],
) -> anyhow::Result<()> {
    match department {
        Some(department) => {
            if !workspace.policies().has_override(department) {
                workspace.toggle_override(department)?;
            }
            for (field, value) in edits {
                workspace.update_override_field(department, *field, value)?;
            }
        }
        None => {
            for (field, value) in edits {
                workspace.update_company_field(*field, value)?;
            }
        }
    }
    Ok(())
}

fn output_department(session: &Session, department: &DepartmentId) -> anyhow::Result<()> {
    let workspace = &session.workspace;
    let (policy, source) = workspace.effective_policy(department)?;
    let parent = workspace.parent_policy(department)?;
    let stored = workspace.policies().override_for(department);

    if let Some(path) = workspace.tree().path(department) {
        println!("# {path}");
    }
    println!("{}\n", describe_source(session, &source).dim());

    match stored {
        Some(o) if o.enabled => println!("Override: {}", "enabled".success()),
        Some(_) => println!("Override: {}", "disabled (values kept)".dim()),
        None => println!("Override: {}", "none".dim()),
    }
    println!();

    for field in PolicyField::ALL {
        let value = policy.display_field(field);
        let value = if field_differs(&policy, &parent, field) {
            format!("{value} *").warning()
        } else {
            value
        };
        println!("  {:<15} {value}", field.as_str());
    }
    if !differing_fields(&policy, &parent).is_empty() {
        println!("\n{}", "* differs from the parent policy".dim());
    }
    Ok(())
}

fn output_company(session: &Session) {
    let workspace = &session.workspace;
    let company = workspace.company_policy();

    println!("# Company policy\n");
    for field in PolicyField::ALL {
        println!("  {:<15} {}", field.as_str(), company.display_field(field));
    }

    let overrides = workspace.overrides();
    if overrides.is_empty() {
        println!("\n{}", "No department overrides.".dim());
        return;
    }

    let counts = employee_counts(workspace.tree(), workspace.employees());
    println!(
        "\n{} ({} enabled)\n",
        "Department overrides".dim(),
        workspace.policies().override_count()
    );
    let rows: Vec<Vec<String>> = overrides
        .iter()
        .map(|(id, stored)| {
            let name = workspace
                .tree()
                .path(id)
                .unwrap_or_else(|| id.to_string());
            let changed: Vec<&str> = differing_fields(&stored.policy, company)
                .into_iter()
                .map(PolicyField::as_str)
                .collect();
            let state = if stored.enabled { "on" } else { "off" };
            vec![
                name,
                state.to_string(),
                counts.get(id).copied().unwrap_or_default().to_string(),
                if changed.is_empty() {
                    "-".to_string()
                } else {
                    changed.join(", ")
                },
            ]
        })
        .collect();
    terminal::print_table(&["DEPARTMENT", "STATE", "STAFF", "CHANGED"], &rows, |_, col, cell| {
        if col == 1 && cell.trim() == "on" {
            cell.success()
        } else if col == 1 {
            cell.dim()
        } else {
            cell.to_string()
        }
    });
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use test_case::test_case;
    use vdt_admin::{Dataset, domain::InheritSource};

    use super::*;

    fn id(s: &str) -> DepartmentId {
        s.parse().unwrap()
    }

    fn sample() -> Workspace {
        Workspace::from_dataset(Dataset::sample(), &vdt_admin::Config::default()).unwrap()
    }

    #[test_case("work_time=60", PolicyField::WorkTime, "60"; "snake case")]
    #[test_case("alert-mode = strict", PolicyField::AlertMode, "strict"; "kebab case with spaces")]
    fn parses_assignments(input: &str, field: PolicyField, value: &str) {
        assert_eq!(parse_assignment(input).unwrap(), (field, value.to_string()));
    }

    #[test_case("work_time"; "missing value")]
    #[test_case("lunch=true"; "unknown field")]
    fn rejects_bad_assignments(input: &str) {
        assert!(parse_assignment(input).is_err());
    }

    #[test]
    fn editing_a_division_forks_an_override_its_teams_inherit() {
        let mut workspace = sample();
        apply_edits(&mut workspace, Some(&id("dev")), &[(PolicyField::WorkTime, "60".to_string())]).unwrap();

        let (policy, source) = workspace.effective_policy(&id("frontend")).unwrap();
        assert_eq!(policy.work_time, 60);
        assert_eq!(source, InheritSource::Ancestor(id("dev")));
        assert_eq!(workspace.effective_policy(&id("sales")).unwrap().0.work_time, 50);
    }

    #[test]
    fn editing_without_department_changes_company_policy() {
        let mut workspace = sample();
        apply_edits(&mut workspace, None, &[(PolicyField::BreakTime, "15".to_string())]).unwrap();

        assert_eq!(workspace.company_policy().break_time, 15);
        assert!(workspace.overrides().is_empty());
    }

    #[test]
    fn invalid_value_is_rejected() {
        let mut workspace = sample();
        let result = apply_edits(&mut workspace, None, &[(PolicyField::WorkStart, "25:00".to_string())]);

        assert!(result.is_err());
        assert_eq!(workspace.company_policy(), &vdt_admin::Policy::default());
    }

    #[test]
    fn apply_writes_override_to_dataset() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("org.yaml");
        Dataset::sample().save(&path).unwrap();

        let command = Policy::try_parse_from(["policy", "dev", "--set", "work_time=60", "--apply"]).unwrap();
        command
            .run(Session::open(Some(path.clone()), vdt_admin::Config::default()).unwrap())
            .unwrap();

        let saved = Dataset::load(&path).unwrap();
        let stored = &saved.overrides[&id("dev")];
        assert!(stored.enabled);
        assert_eq!(stored.policy.work_time, 60);
    }

    #[test]
    fn preview_does_not_write() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("org.yaml");
        Dataset::sample().save(&path).unwrap();

        let command = Policy::try_parse_from(["policy", "dev", "--set", "work_time=60"]).unwrap();
        command
            .run(Session::open(Some(path.clone()), vdt_admin::Config::default()).unwrap())
            .unwrap();

        assert!(Dataset::load(&path).unwrap().overrides.is_empty());
    }

    #[test]
    fn toggle_requires_department() {
        assert!(Policy::try_parse_from(["policy", "--toggle"]).is_err());
    }

    #[test]
    fn toggle_twice_keeps_disabled_values() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("org.yaml");
        Dataset::sample().save(&path).unwrap();
        let open = || Session::open(Some(path.clone()), vdt_admin::Config::default()).unwrap();

        Policy::try_parse_from(["policy", "qa", "--toggle"]).unwrap().run(open()).unwrap();
        Policy::try_parse_from(["policy", "qa", "--toggle"]).unwrap().run(open()).unwrap();

        let saved = Dataset::load(&path).unwrap();
        assert!(!saved.overrides[&id("qa")].enabled);
    }
}
