use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A validated, non-empty department identifier.
///
/// Identifiers from seeded data are short slugs such as `dev` or `fe-ui`;
/// freshly created departments get `{level}-{uuid}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepartmentId(NonEmptyString);

impl DepartmentId {
    /// Creates a new `DepartmentId` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIdError`] if the string is empty or contains
    /// whitespace.
    pub fn new(s: String) -> Result<Self, InvalidIdError> {
        if s.chars().any(char::is_whitespace) {
            return Err(InvalidIdError(s));
        }
        NonEmptyString::new(s).map(Self).map_err(InvalidIdError)
    }

    /// Generates a fresh identifier for a department of the given level.
    #[must_use]
    pub fn generate(level: Level) -> Self {
        let id = format!("{level}-{}", Uuid::new_v4().simple());
        Self::new(id).expect("generated ids are never empty")
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for DepartmentId {
    type Error = InvalidIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DepartmentId {
    type Error = InvalidIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<DepartmentId> for String {
    fn from(id: DepartmentId) -> Self {
        id.as_str().to_owned()
    }
}

impl Hash for DepartmentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl FromStr for DepartmentId {
    type Err = InvalidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an identifier is empty or contains whitespace.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid identifier '{0}': must be non-empty and contain no whitespace")]
pub struct InvalidIdError(String);

/// The tier of a department in the fixed three-level hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Top-level organisational unit. Never has a parent.
    Division,
    /// Sits under a division.
    Team,
    /// Sits under a team. Never has children.
    Part,
}

impl Level {
    /// All levels, top first.
    pub const ALL: [Self; 3] = [Self::Division, Self::Team, Self::Part];

    /// The level a child of this level must have, if children are allowed.
    #[must_use]
    pub const fn child_level(self) -> Option<Self> {
        match self {
            Self::Division => Some(Self::Team),
            Self::Team => Some(Self::Part),
            Self::Part => None,
        }
    }

    /// The level the parent of this level must have, if it has one.
    #[must_use]
    pub const fn parent_level(self) -> Option<Self> {
        match self {
            Self::Division => None,
            Self::Team => Some(Self::Division),
            Self::Part => Some(Self::Team),
        }
    }

    /// Lowercase name used in identifiers and serialized data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Division => "division",
            Self::Team => "team",
            Self::Part => "part",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "division" => Ok(Self::Division),
            "team" => Ok(Self::Team),
            "part" => Ok(Self::Part),
            _ => Err(InvalidLevelError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown level name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown department level '{0}': expected division, team or part")]
pub struct InvalidLevelError(String);

/// A node in the organisation tree.
///
/// Children are owned and kept in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentNode {
    /// Unique identifier.
    pub id: DepartmentId,
    /// Display name.
    pub name: String,
    /// Tier in the hierarchy.
    pub level: Level,
    /// Owning node, `None` for divisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DepartmentId>,
    /// Owned children in display order.
    #[serde(default)]
    pub children: Vec<DepartmentNode>,
}

impl DepartmentNode {
    /// Creates a childless node with no parent set.
    #[must_use]
    pub fn new(id: DepartmentId, name: impl Into<String>, level: Level) -> Self {
        Self {
            id,
            name: name.into(),
            level,
            parent_id: None,
            children: Vec::new(),
        }
    }

    /// Adds a child, returning `self` for chained construction.
    #[must_use]
    pub fn with_child(mut self, mut child: Self) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(child);
        self
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order traversal of this node and all of its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Ids of this node and all of its descendants, in pre-order.
    #[must_use]
    pub fn descendant_ids(&self) -> Vec<DepartmentId> {
        self.iter().map(|node| node.id.clone()).collect()
    }

    /// Ids of this node and all of its descendants as a set.
    #[must_use]
    pub fn descendant_id_set(&self) -> HashSet<DepartmentId> {
        self.iter().map(|node| node.id.clone()).collect()
    }

    /// Number of descendants, excluding this node.
    #[must_use]
    pub fn count_descendants(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.count_descendants())
            .sum()
    }
}

/// Input for creating a department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    /// Display name.
    pub name: String,
    /// Tier of the new department.
    pub level: Level,
    /// Parent to attach to. Must be `None` for divisions.
    pub parent_id: Option<DepartmentId>,
}

impl NewDepartment {
    /// Builds the node with a freshly generated id.
    #[must_use]
    pub fn into_node(self) -> DepartmentNode {
        let mut node = DepartmentNode::new(DepartmentId::generate(self.level), self.name, self.level);
        node.parent_id = self.parent_id;
        node
    }
}
