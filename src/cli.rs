use std::path::{Path, PathBuf};

mod department;
mod employee;
mod employees;
mod policy;
mod report;
mod show;
mod stats;
mod terminal;
mod tree;

use anyhow::Context;
use clap::ArgAction;
use dialoguer::Confirm;
use department::{Add, Delete, Move, Rename};
use employees::Employees;
use policy::Policy;
use report::Report;
use show::Show;
use stats::Stats;
use tracing::instrument;
use tree::Tree;
use vdt_admin::{Dataset, DepartmentId, Workspace, domain::Inheritance};

/// Config file picked up from the working directory when `--config` is not
/// given.
const DEFAULT_CONFIG: &str = "vdt.toml";

/// Parse a department id from a string.
fn parse_department(s: &str) -> Result<DepartmentId, String> {
    s.trim().parse().map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML dataset to operate on (defaults to the built-in sample
    /// organisation, which is never written back)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Configuration file (defaults to ./vdt.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config_path = self
            .config
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

        self.command
            .unwrap_or_else(|| Command::Tree(Tree::default()))
            .run(self.data, &config_path)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show the organisation tree with headcounts (default)
    Tree(Tree),

    /// Show a department's path, statistics and effective policy
    Show(Show),

    /// List employees with filters, sorting and paging
    Employees(Employees),

    /// Invite, edit, assign or remove employees
    Employee(employee::Command),

    /// Show the compliance dashboard and employees at risk
    Stats(Stats),

    /// Per-division compliance report
    Report(Report),

    /// Inspect or edit rest policies
    Policy(Policy),

    /// Add a division, or a team or part under an existing department
    Add(Add),

    /// Rename a department
    Rename(Rename),

    /// Delete a department and everything below it
    ///
    /// Employees of deleted departments become unassigned.
    Delete(Delete),

    /// Move a department under a new parent
    Move(Move),

    /// Show or modify configuration settings
    Config(Config),
}

impl Command {
    fn run(self, data: Option<PathBuf>, config_path: &Path) -> anyhow::Result<()> {
        let open = || Session::open(data, load_config(config_path));

        match self {
            Self::Tree(command) => command.run(&open()?)?,
            Self::Show(command) => command.run(&open()?)?,
            Self::Employees(command) => command.run(&open()?)?,
            Self::Stats(command) => command.run(&open()?)?,
            Self::Report(command) => command.run(&open()?)?,
            Self::Employee(command) => command.run(open()?)?,
            Self::Policy(command) => command.run(open()?)?,
            Self::Add(command) => command.run(open()?)?,
            Self::Rename(command) => command.run(open()?)?,
            Self::Delete(command) => command.run(open()?)?,
            Self::Move(command) => command.run(open()?)?,
            Self::Config(command) => command.run(config_path, load_config(config_path))?,
        }
        Ok(())
    }
}

/// A loaded dataset plus the settings that shape how it is presented.
#[derive(Debug)]
pub struct Session {
    config: vdt_admin::Config,
    workspace: Workspace,
    data: Option<PathBuf>,
}

impl Session {
    fn open(data: Option<PathBuf>, config: vdt_admin::Config) -> anyhow::Result<Self> {
        let dataset = match &data {
            Some(path) => Dataset::load(path).with_context(|| format!("failed to load {}", path.display()))?,
            None => {
                tracing::debug!("No dataset given, using the sample organisation");
                Dataset::sample()
            }
        };
        let workspace = Workspace::from_dataset(dataset, &config)?;

        Ok(Self {
            config,
            workspace,
            data,
        })
    }

    /// Writes the workspace back to the dataset file, if there is one.
    fn save(&self) -> anyhow::Result<()> {
        use terminal::Colorize;

        match &self.data {
            Some(path) => {
                self.workspace
                    .to_dataset()
                    .save(path)
                    .with_context(|| format!("failed to save {}", path.display()))?;
                tracing::info!("Saved dataset to {}", path.display());
            }
            None => {
                eprintln!(
                    "{}",
                    "Changes apply to the built-in sample only; pass --data FILE to keep them".dim()
                );
            }
        }
        Ok(())
    }
}

/// Asks before a destructive change; exits with 130 when declined.
fn confirm(skip: bool) -> anyhow::Result<()> {
    if skip {
        return Ok(());
    }
    let proceed = Confirm::new()
        .with_prompt("Proceed?")
        .default(false)
        .interact()?;
    if !proceed {
        println!("Cancelled");
        std::process::exit(130);
    }
    Ok(())
}

fn load_config(path: &Path) -> vdt_admin::Config {
    vdt_admin::Config::load(path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        vdt_admin::Config::default()
    })
}

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, clap::Parser)]
enum ConfigCommand {
    /// Show current configuration (default)
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,

        /// Value to set
        value: String,
    },
}

impl Config {
    #[instrument(skip(config))]
    fn run(self, path: &Path, mut config: vdt_admin::Config) -> anyhow::Result<()> {
        use terminal::Colorize;

        match self.command.unwrap_or(ConfigCommand::Show) {
            ConfigCommand::Show => {
                let source = if path.exists() {
                    path.display().to_string()
                } else {
                    "defaults".to_string()
                };
                println!("Configuration ({}):", source.dim());
                println!("  risk_threshold: {}", config.risk_threshold());
                println!("  page_size: {}", config.page_size());
                println!(
                    "  inheritance: {} ({})",
                    inheritance_name(config.inheritance),
                    match config.inheritance {
                        Inheritance::AncestorWalk => "nearest enabled override above".dim(),
                        Inheritance::Shallow => "own or division override only".dim(),
                    }
                );
                println!(
                    "  company_policy: {}",
                    if config.company_policy.is_some() {
                        "custom".to_string()
                    } else {
                        "built-in".dim()
                    }
                );
            }
            ConfigCommand::Set { key, value } => {
                match key.as_str() {
                    "risk_threshold" => {
                        let threshold = value
                            .parse::<u8>()
                            .ok()
                            .filter(|threshold| *threshold <= 100)
                            .ok_or_else(|| anyhow::anyhow!("Value must be a percentage (0-100)"))?;
                        config.set_risk_threshold(threshold);
                    }
                    "page_size" => {
                        let size = value
                            .parse::<usize>()
                            .ok()
                            .filter(|size| *size > 0)
                            .ok_or_else(|| anyhow::anyhow!("Value must be a positive number"))?;
                        config.set_page_size(size);
                    }
                    "inheritance" => {
                        config.inheritance = match value.as_str() {
                            "ancestor-walk" => Inheritance::AncestorWalk,
                            "shallow" => Inheritance::Shallow,
                            _ => anyhow::bail!("Value must be 'ancestor-walk' or 'shallow'"),
                        };
                    }
                    _ => {
                        return Err(anyhow::anyhow!(
                            "Unknown configuration key: '{key}'\nSupported keys: risk_threshold, page_size, \
                             inheritance",
                        ));
                    }
                }

                config.save(path).map_err(|e| anyhow::anyhow!("{e}"))?;
                println!("{}", format!("Updated {key} in {}", path.display()).success());
            }
        }

        Ok(())
    }
}

const fn inheritance_name(inheritance: Inheritance) -> &'static str {
    match inheritance {
        Inheritance::AncestorWalk => "ancestor-walk",
        Inheritance::Shallow => "shallow",
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use test_case::test_case;
    use vdt_admin::DepartmentRepository;

    use super::*;

    #[test]
    fn session_without_data_uses_sample() {
        let session = Session::open(None, vdt_admin::Config::default()).unwrap();
        assert_eq!(session.workspace.tree().divisions().len(), 5);
        assert!(session.save().is_ok());
    }

    #[test]
    fn config_set_writes_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("vdt.toml");
        let config = Config {
            command: Some(ConfigCommand::Set {
                key: "risk_threshold".to_string(),
                value: "70".to_string(),
            }),
        };

        config.run(&path, vdt_admin::Config::default()).unwrap();

        assert_eq!(load_config(&path).risk_threshold(), 70);
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let tmp = tempdir().unwrap();
        let config = Config {
            command: Some(ConfigCommand::Set {
                key: "colour".to_string(),
                value: "blue".to_string(),
            }),
        };

        assert!(config.run(&tmp.path().join("vdt.toml"), vdt_admin::Config::default()).is_err());
    }

    #[test_case("risk_threshold", "150"; "threshold above 100")]
    #[test_case("risk_threshold", "-5"; "negative threshold")]
    #[test_case("page_size", "0"; "zero page size")]
    #[test_case("inheritance", "deep"; "unknown inheritance mode")]
    fn config_set_rejects_out_of_range_values(key: &str, value: &str) {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("vdt.toml");
        let config = Config {
            command: Some(ConfigCommand::Set {
                key: key.to_string(),
                value: value.to_string(),
            }),
        };

        assert!(config.run(&path, vdt_admin::Config::default()).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let tmp = tempdir().unwrap();
        let config = load_config(&tmp.path().join("absent.toml"));
        assert_eq!(config, vdt_admin::Config::default());
    }
}
