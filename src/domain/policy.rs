//! Rest policies and their per-department overrides.
//!
//! A company-wide [`Policy`] applies everywhere unless a department carries an
//! enabled [`PolicyOverride`]. The [`PolicyBook`] resolves the policy in force
//! for any department by walking up the organisation tree and taking the
//! first enabled override it meets.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{department::DepartmentId, tree::OrgTree};

/// How strongly the agent nudges people to take their break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// Small dismissible reminder.
    Soft,
    /// Escalating reminders with a limited number of snoozes.
    #[default]
    Standard,
    /// Screen overlay that enforces the break.
    Strict,
}

impl AlertMode {
    /// Lowercase name used in serialized data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Soft => "soft",
            Self::Standard => "standard",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for AlertMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "soft" => Ok(Self::Soft),
            "standard" => Ok(Self::Standard),
            "strict" => Ok(Self::Strict),
            _ => Err(PolicyError::InvalidValue {
                field: PolicyField::AlertMode,
                value: s.to_string(),
            }),
        }
    }
}

/// A complete rest policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Minutes of continuous screen work before a break is due.
    pub work_time: u32,
    /// Length of the break in minutes.
    pub break_time: u32,
    /// How many times a break reminder may be snoozed.
    pub snooze_limit: u32,
    /// Reminder style.
    pub alert_mode: AlertMode,
    /// Start of the working day, `HH:MM`.
    pub work_start: String,
    /// End of the working day, `HH:MM`.
    pub work_end: String,
    /// Whether the lunch hour is excluded from work time.
    pub lunch_exclude: bool,
    /// Working days, Monday first.
    pub work_days: [bool; 7],
    /// Minutes before a break that the first reminder fires.
    pub pre_alert_min: u32,
    /// Minutes after a missed break that the follow-up fires.
    pub post_alert_min: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            work_time: 50,
            break_time: 10,
            snooze_limit: 2,
            alert_mode: AlertMode::Standard,
            work_start: "09:00".to_string(),
            work_end: "18:00".to_string(),
            lunch_exclude: true,
            work_days: [true, true, true, true, true, false, false],
            pre_alert_min: 5,
            post_alert_min: 5,
        }
    }
}

/// Names of the individual policy fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyField {
    /// [`Policy::work_time`]
    WorkTime,
    /// [`Policy::break_time`]
    BreakTime,
    /// [`Policy::snooze_limit`]
    SnoozeLimit,
    /// [`Policy::alert_mode`]
    AlertMode,
    /// [`Policy::work_start`]
    WorkStart,
    /// [`Policy::work_end`]
    WorkEnd,
    /// [`Policy::lunch_exclude`]
    LunchExclude,
    /// [`Policy::work_days`]
    WorkDays,
    /// [`Policy::pre_alert_min`]
    PreAlertMin,
    /// [`Policy::post_alert_min`]
    PostAlertMin,
}

impl PolicyField {
    /// All fields in form order.
    pub const ALL: [Self; 10] = [
        Self::WorkTime,
        Self::BreakTime,
        Self::SnoozeLimit,
        Self::AlertMode,
        Self::WorkStart,
        Self::WorkEnd,
        Self::LunchExclude,
        Self::WorkDays,
        Self::PreAlertMin,
        Self::PostAlertMin,
    ];

    /// The snake-case field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorkTime => "work_time",
            Self::BreakTime => "break_time",
            Self::SnoozeLimit => "snooze_limit",
            Self::AlertMode => "alert_mode",
            Self::WorkStart => "work_start",
            Self::WorkEnd => "work_end",
            Self::LunchExclude => "lunch_exclude",
            Self::WorkDays => "work_days",
            Self::PreAlertMin => "pre_alert_min",
            Self::PostAlertMin => "post_alert_min",
        }
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyField {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalised)
            .ok_or_else(|| PolicyError::UnknownField(s.to_string()))
    }
}

/// Errors raised while editing policies.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// No policy field with this name.
    #[error("unknown policy field '{0}'")]
    UnknownField(String),
    /// The value could not be parsed for the field.
    #[error("invalid value '{value}' for {field}")]
    InvalidValue {
        /// Field being set.
        field: PolicyField,
        /// The rejected input.
        value: String,
    },
    /// The department has no override to edit.
    #[error("department {0} has no policy override")]
    NoOverride(DepartmentId),
}

impl Policy {
    /// Renders a single field for display.
    #[must_use]
    pub fn display_field(&self, field: PolicyField) -> String {
        match field {
            PolicyField::WorkTime => self.work_time.to_string(),
            PolicyField::BreakTime => self.break_time.to_string(),
            PolicyField::SnoozeLimit => self.snooze_limit.to_string(),
            PolicyField::AlertMode => self.alert_mode.to_string(),
            PolicyField::WorkStart => self.work_start.clone(),
            PolicyField::WorkEnd => self.work_end.clone(),
            PolicyField::LunchExclude => self.lunch_exclude.to_string(),
            PolicyField::WorkDays => format_work_days(&self.work_days),
            PolicyField::PreAlertMin => self.pre_alert_min.to_string(),
            PolicyField::PostAlertMin => self.post_alert_min.to_string(),
        }
    }

    /// Parses `value` and stores it in `field`.
    ///
    /// Work days are written as seven `0`/`1` characters, Monday first
    /// (`1111100`). Times must be `HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidValue`] if the value does not parse for
    /// the field.
    pub fn set_field(&mut self, field: PolicyField, value: &str) -> Result<(), PolicyError> {
        let invalid = || PolicyError::InvalidValue {
            field,
            value: value.to_string(),
        };
        let minutes = || value.trim().parse::<u32>().map_err(|_| invalid());

        match field {
            PolicyField::WorkTime => self.work_time = minutes()?,
            PolicyField::BreakTime => self.break_time = minutes()?,
            PolicyField::SnoozeLimit => self.snooze_limit = minutes()?,
            PolicyField::PreAlertMin => self.pre_alert_min = minutes()?,
            PolicyField::PostAlertMin => self.post_alert_min = minutes()?,
            PolicyField::AlertMode => self.alert_mode = value.trim().parse()?,
            PolicyField::WorkStart => self.work_start = parse_time(value).ok_or_else(invalid)?,
            PolicyField::WorkEnd => self.work_end = parse_time(value).ok_or_else(invalid)?,
            PolicyField::LunchExclude => {
                self.lunch_exclude = value.trim().parse().map_err(|_| invalid())?;
            }
            PolicyField::WorkDays => self.work_days = parse_work_days(value).ok_or_else(invalid)?,
        }
        Ok(())
    }
}

fn parse_time(value: &str) -> Option<String> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u8 = hours.parse().ok()?;
    let minutes: u8 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then(|| format!("{hours:02}:{minutes:02}"))
}

fn parse_work_days(value: &str) -> Option<[bool; 7]> {
    let value = value.trim();
    if value.len() != 7 {
        return None;
    }
    let mut days = [false; 7];
    for (day, c) in days.iter_mut().zip(value.chars()) {
        *day = match c {
            '1' => true,
            '0' => false,
            _ => return None,
        };
    }
    Some(days)
}

fn format_work_days(days: &[bool; 7]) -> String {
    const LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    LABELS
        .iter()
        .zip(days)
        .filter(|(_, on)| **on)
        .map(|(label, _)| *label)
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether `field` differs between an override and the policy it was forked
/// from.
#[must_use]
pub fn field_differs(override_policy: &Policy, base: &Policy, field: PolicyField) -> bool {
    match field {
        PolicyField::WorkTime => override_policy.work_time != base.work_time,
        PolicyField::BreakTime => override_policy.break_time != base.break_time,
        PolicyField::SnoozeLimit => override_policy.snooze_limit != base.snooze_limit,
        PolicyField::AlertMode => override_policy.alert_mode != base.alert_mode,
        PolicyField::WorkStart => override_policy.work_start != base.work_start,
        PolicyField::WorkEnd => override_policy.work_end != base.work_end,
        PolicyField::LunchExclude => override_policy.lunch_exclude != base.lunch_exclude,
        PolicyField::WorkDays => override_policy.work_days != base.work_days,
        PolicyField::PreAlertMin => override_policy.pre_alert_min != base.pre_alert_min,
        PolicyField::PostAlertMin => override_policy.post_alert_min != base.post_alert_min,
    }
}

/// All fields that differ between an override and its base, in form order.
#[must_use]
pub fn differing_fields(override_policy: &Policy, base: &Policy) -> Vec<PolicyField> {
    PolicyField::ALL
        .into_iter()
        .filter(|field| field_differs(override_policy, base, *field))
        .collect()
}

/// A department-level policy override.
///
/// Disabling an override keeps its values so that re-enabling it restores
/// the last edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    /// Whether the override is in force.
    pub enabled: bool,
    /// The overriding values.
    #[serde(flatten)]
    pub policy: Policy,
}

/// How far up the tree overrides are inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Inheritance {
    /// Walk every ancestor up to the division.
    #[default]
    AncestorWalk,
    /// Only the node itself and its division.
    Shallow,
}

/// Where an effective policy came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "department", rename_all = "snake_case")]
pub enum InheritSource {
    /// The department's own override.
    Own,
    /// An ancestor's override.
    Ancestor(DepartmentId),
    /// The company default.
    Company,
}

/// The company policy and all department overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyBook {
    company: Policy,
    overrides: BTreeMap<DepartmentId, PolicyOverride>,
    inheritance: Inheritance,
}

impl PolicyBook {
    /// Creates a book with the given company policy and no overrides.
    #[must_use]
    pub fn new(company: Policy) -> Self {
        Self {
            company,
            ..Self::default()
        }
    }

    /// Sets how overrides are inherited.
    #[must_use]
    pub fn with_inheritance(mut self, inheritance: Inheritance) -> Self {
        self.inheritance = inheritance;
        self
    }

    /// Adds existing overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: BTreeMap<DepartmentId, PolicyOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    /// The company-wide policy.
    #[must_use]
    pub const fn company(&self) -> &Policy {
        &self.company
    }

    /// Replaces the company-wide policy.
    pub fn set_company(&mut self, policy: Policy) {
        self.company = policy;
    }

    /// Restores the built-in default company policy.
    pub fn reset_company(&mut self) {
        self.company = Policy::default();
    }

    /// All overrides, enabled or not.
    #[must_use]
    pub const fn overrides(&self) -> &BTreeMap<DepartmentId, PolicyOverride> {
        &self.overrides
    }

    /// The override stored for a department, enabled or not.
    #[must_use]
    pub fn override_for(&self, id: &DepartmentId) -> Option<&PolicyOverride> {
        self.overrides.get(id)
    }

    /// Whether the department has an enabled override.
    #[must_use]
    pub fn has_override(&self, id: &DepartmentId) -> bool {
        self.enabled_override(id).is_some()
    }

    /// Number of departments with an enabled override.
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.values().filter(|o| o.enabled).count()
    }

    /// The policy in force for a department, using the configured
    /// inheritance.
    #[must_use]
    pub fn effective_policy(&self, tree: &OrgTree, id: &DepartmentId) -> Policy {
        self.effective(tree, id).0
    }

    /// Where the effective policy for a department comes from.
    #[must_use]
    pub fn inherit_source(&self, tree: &OrgTree, id: &DepartmentId) -> InheritSource {
        self.effective(tree, id).1
    }

    /// The two-level rule: the node's own override, else the given division's
    /// override, else the company policy.
    #[must_use]
    pub fn effective_policy_shallow(&self, id: &DepartmentId, division: Option<&DepartmentId>) -> Policy {
        std::iter::once(id)
            .chain(division)
            .find_map(|candidate| self.enabled_override(candidate))
            .map_or_else(|| self.company.clone(), |o| o.policy.clone())
    }

    /// Enables or disables a department's override, returning the new state.
    ///
    /// Disabling keeps the values. Enabling restores stored values if there
    /// are any, otherwise forks `parent_policy`.
    pub fn toggle_override(&mut self, id: &DepartmentId, parent_policy: &Policy) -> bool {
        match self.overrides.get_mut(id) {
            Some(existing) => {
                existing.enabled = !existing.enabled;
                debug!(department = %id, enabled = existing.enabled, "toggled policy override");
                existing.enabled
            }
            None => {
                self.reset_override(id, parent_policy);
                true
            }
        }
    }

    /// Re-forks the override from `parent_policy` and enables it.
    pub fn reset_override(&mut self, id: &DepartmentId, parent_policy: &Policy) {
        debug!(department = %id, "forked policy override");
        self.overrides.insert(
            id.clone(),
            PolicyOverride {
                enabled: true,
                policy: parent_policy.clone(),
            },
        );
    }

    /// Stores an override as given.
    pub fn set_override(&mut self, id: DepartmentId, policy_override: PolicyOverride) {
        self.overrides.insert(id, policy_override);
    }

    /// Edits one field of an existing override.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NoOverride`] if the department has never had
    /// an override, or [`PolicyError::InvalidValue`] if the value does not
    /// parse.
    pub fn update_override_field(&mut self, id: &DepartmentId, field: PolicyField, value: &str) -> Result<(), PolicyError> {
        let existing = self
            .overrides
            .get_mut(id)
            .ok_or_else(|| PolicyError::NoOverride(id.clone()))?;
        existing.policy.set_field(field, value)
    }

    /// Drops the overrides of departments that no longer exist.
    ///
    /// Returns the number of overrides removed.
    pub fn remove_overrides<'a>(&mut self, ids: impl IntoIterator<Item = &'a DepartmentId>) -> usize {
        ids.into_iter()
            .filter(|id| self.overrides.remove(*id).is_some())
            .count()
    }
}

impl PolicyBook {
    fn enabled_override(&self, id: &DepartmentId) -> Option<&PolicyOverride> {
        self.overrides.get(id).filter(|o| o.enabled)
    }

    fn effective(&self, tree: &OrgTree, id: &DepartmentId) -> (Policy, InheritSource) {
        if let Some(own) = self.enabled_override(id) {
            return (own.policy.clone(), InheritSource::Own);
        }

        let inherited = match self.inheritance {
            Inheritance::AncestorWalk => tree.ancestors(id).into_iter().find_map(|ancestor| {
                self.enabled_override(&ancestor.id)
                    .map(|found| (&ancestor.id, found))
            }),
            Inheritance::Shallow => tree
                .division_of(id)
                .filter(|division| &division.id != id)
                .and_then(|division| {
                    self.enabled_override(&division.id)
                        .map(|found| (&division.id, found))
                }),
        };

        match inherited {
            Some((source, found)) => (found.policy.clone(), InheritSource::Ancestor(source.clone())),
            None => (self.company.clone(), InheritSource::Company),
        }
    }
}
