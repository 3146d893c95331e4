use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::policy::{Inheritance, Policy};

/// Configuration for the administration tool.
///
/// Stored as TOML. Every field is optional in the file; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Compliance percentage below which a reporting employee counts as at
    /// risk.
    risk_threshold: u8,

    /// Number of rows per page in employee listings.
    page_size: usize,

    /// How departments without their own override find the policy in force.
    ///
    /// `ancestor-walk` (default) takes the nearest enabled override on the
    /// way up to the division. `shallow` only looks at the department itself
    /// and its division.
    pub inheritance: Inheritance,

    /// Replaces the built-in company-wide policy when set.
    pub company_policy: Option<Policy>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            risk_threshold: default_risk_threshold(),
            page_size: default_page_size(),
            inheritance: Inheritance::default(),
            company_policy: None,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Compliance percentage below which a reporting employee is at risk.
    #[must_use]
    pub const fn risk_threshold(&self) -> u8 {
        self.risk_threshold
    }

    /// Sets the risk threshold, capped at 100.
    pub fn set_risk_threshold(&mut self, threshold: u8) {
        self.risk_threshold = threshold.min(100);
    }

    /// Rows per page in employee listings. Never zero.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Sets the page size; zero is raised to one.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// The company-wide policy in force: the configured one, or the built-in
    /// default.
    #[must_use]
    pub fn company_policy(&self) -> Policy {
        self.company_policy.clone().unwrap_or_default()
    }
}

const fn default_risk_threshold() -> u8 {
    60
}

const fn default_page_size() -> usize {
    8
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_risk_threshold")]
        risk_threshold: u8,

        #[serde(default = "default_page_size")]
        page_size: usize,

        #[serde(default)]
        inheritance: Inheritance,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        company_policy: Option<Policy>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                risk_threshold,
                page_size,
                inheritance,
                company_policy,
            } => Self {
                risk_threshold: risk_threshold.min(100),
                page_size: page_size.max(1),
                inheritance,
                company_policy,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            risk_threshold: config.risk_threshold,
            page_size: config.page_size,
            inheritance: config.inheritance,
            company_policy: config.company_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::policy::AlertMode;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nrisk_threshold = 70\npage_size = 20\ninheritance = \"shallow\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.risk_threshold(), 70);
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.inheritance, Inheritance::Shallow);
        assert_eq!(config.company_policy(), Policy::default());
    }

    #[test]
    fn company_policy_table_overrides_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\n\n[company_policy]\nwork_time = 45\nalert_mode = \"strict\"\n",
        )
        .unwrap();

        let policy = Config::load(file.path()).unwrap().company_policy();

        assert_eq!(policy.work_time, 45);
        assert_eq!(policy.alert_mode, AlertMode::Strict);
        assert_eq!(policy.break_time, Policy::default().break_time);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\npage_size = \"eight\"\n").unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config: Config = toml::from_str("_version = \"1\"\nrisk_threshold = 250\npage_size = 0\n").unwrap();
        assert_eq!(config.risk_threshold(), 100);
        assert_eq!(config.page_size(), 1);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vdt.toml");
        let mut config = Config::default();
        config.set_risk_threshold(55);
        config.inheritance = Inheritance::Shallow;

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }
}
