//! In-memory organisation tree
//!
//! The [`OrgTree`] is a forest of divisions, each owning its teams and parts.
//! It knows nothing about employees or policies; those reference departments
//! by [`DepartmentId`] only.
//!
//! Every mutator leaves the receiver untouched and returns a new snapshot, so
//! callers can detect changes by comparing snapshots and can preview a
//! mutation before committing it.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::instrument;

use crate::domain::department::{DepartmentId, DepartmentNode, Level};

/// Location of a node inside the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    level: Level,
    parent: Option<DepartmentId>,
    /// Child positions from the division list down to the node.
    position: Vec<usize>,
}

/// Id lookup for the forest.
///
/// Owned by the tree and rebuilt from scratch whenever a new snapshot is
/// produced. There is no shared cache to invalidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TreeIndex {
    entries: HashMap<DepartmentId, IndexEntry>,
}

impl TreeIndex {
    /// Builds the index, normalising `parent_id` fields to the structural
    /// parent and checking the hierarchy invariants on the way down.
    fn build(divisions: &mut [DepartmentNode]) -> Result<Self, TreeError> {
        let mut index = Self::default();
        for (i, division) in divisions.iter_mut().enumerate() {
            if division.level != Level::Division {
                return Err(TreeError::InvalidHierarchy {
                    id: division.id.clone(),
                    level: division.level,
                    parent: None,
                });
            }
            index.visit(division, None, vec![i])?;
        }
        Ok(index)
    }

    fn visit(
        &mut self,
        node: &mut DepartmentNode,
        parent: Option<(&DepartmentId, Level)>,
        position: Vec<usize>,
    ) -> Result<(), TreeError> {
        node.parent_id = parent.map(|(id, _)| id.clone());

        let entry = IndexEntry {
            level: node.level,
            parent: node.parent_id.clone(),
            position: position.clone(),
        };
        if self.entries.insert(node.id.clone(), entry).is_some() {
            return Err(TreeError::DuplicateId(node.id.clone()));
        }

        let id = node.id.clone();
        let level = node.level;
        for (i, child) in node.children.iter_mut().enumerate() {
            if level.child_level() != Some(child.level) {
                return Err(TreeError::InvalidHierarchy {
                    id: child.id.clone(),
                    level: child.level,
                    parent: Some(level),
                });
            }
            let mut child_position = position.clone();
            child_position.push(i);
            self.visit(child, Some((&id, level)), child_position)?;
        }
        Ok(())
    }
}

/// The organisation tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgTree {
    divisions: Vec<DepartmentNode>,
    index: TreeIndex,
}

/// Errors raised by structural tree operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The department could not be found.
    #[error("department {0} not found")]
    NotFound(DepartmentId),
    /// A node would be placed under a parent of the wrong tier.
    #[error("{id}: a {level} cannot be placed under {}", describe_parent(.parent))]
    InvalidHierarchy {
        /// The node being placed.
        id: DepartmentId,
        /// Its level.
        level: Level,
        /// Level of the would-be parent, `None` for the top of the forest.
        parent: Option<Level>,
    },
    /// The new parent is the node itself or one of its descendants.
    #[error("moving {id} under {new_parent} would create a cycle")]
    CyclicMove {
        /// The node being moved.
        id: DepartmentId,
        /// The requested parent.
        new_parent: DepartmentId,
    },
    /// Another department already uses this id.
    #[error("department id {0} is already in use")]
    DuplicateId(DepartmentId),
    /// The node already sits under the requested parent.
    #[error("{id} is already a child of {parent}")]
    AlreadyChild {
        /// The node being moved.
        id: DepartmentId,
        /// Its current parent.
        parent: DepartmentId,
    },
}

fn describe_parent(parent: &Option<Level>) -> String {
    parent.map_or_else(|| "the top level".to_string(), |level| format!("a {level}"))
}

/// What a subtree removal took out of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedSubtree {
    /// Ids of the removed node and all of its descendants.
    pub removed_ids: HashSet<DepartmentId>,
    /// Number of descendants removed along with the node.
    pub descendant_count: usize,
}

impl OrgTree {
    /// Builds a tree from a list of divisions.
    ///
    /// `parent_id` fields are overwritten with the structural parent.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidHierarchy`] if any node sits at the wrong
    /// tier, or [`TreeError::DuplicateId`] if an id is used twice.
    pub fn from_divisions(mut divisions: Vec<DepartmentNode>) -> Result<Self, TreeError> {
        let index = TreeIndex::build(&mut divisions)?;
        Ok(Self { divisions, index })
    }

    /// The top-level divisions in display order.
    #[must_use]
    pub fn divisions(&self) -> &[DepartmentNode] {
        &self.divisions
    }

    /// Consumes the tree, returning its divisions.
    #[must_use]
    pub fn into_divisions(self) -> Vec<DepartmentNode> {
        self.divisions
    }

    /// Total number of departments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.entries.len()
    }

    /// Whether the tree has no departments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }

    /// Whether a department with this id exists.
    #[must_use]
    pub fn contains(&self, id: &DepartmentId) -> bool {
        self.index.entries.contains_key(id)
    }

    /// Pre-order traversal of the whole forest.
    pub fn iter(&self) -> impl Iterator<Item = &DepartmentNode> {
        self.divisions.iter().flat_map(|division| division.iter())
    }

    /// Finds a department by id.
    #[must_use]
    pub fn find_node(&self, id: &DepartmentId) -> Option<&DepartmentNode> {
        let entry = self.index.entries.get(id)?;
        Some(self.node_at(&entry.position))
    }

    /// Like [`Self::find_node`], but missing ids are an error.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if the id does not exist.
    pub fn node(&self, id: &DepartmentId) -> Result<&DepartmentNode, TreeError> {
        self.find_node(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    /// The parent id of a department, `None` for divisions and unknown ids.
    #[must_use]
    pub fn parent_of(&self, id: &DepartmentId) -> Option<&DepartmentId> {
        self.index.entries.get(id)?.parent.as_ref()
    }

    /// The level of a department, if it exists.
    #[must_use]
    pub fn level_of(&self, id: &DepartmentId) -> Option<Level> {
        self.index.entries.get(id).map(|entry| entry.level)
    }

    /// Ancestors of a department, nearest first. Empty for divisions.
    #[must_use]
    pub fn ancestors(&self, id: &DepartmentId) -> Vec<&DepartmentNode> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent_id) = current {
            let Some(parent) = self.find_node(parent_id) else {
                break;
            };
            ancestors.push(parent);
            current = self.parent_of(parent_id);
        }
        ancestors
    }

    /// The division a department belongs to (itself, for a division).
    #[must_use]
    pub fn division_of(&self, id: &DepartmentId) -> Option<&DepartmentNode> {
        let entry = self.index.entries.get(id)?;
        let first = *entry.position.first()?;
        self.divisions.get(first)
    }

    /// Breadcrumb from the division down to the department, e.g.
    /// `Development > Frontend > UI`.
    #[must_use]
    pub fn path(&self, id: &DepartmentId) -> Option<String> {
        let node = self.find_node(id)?;
        let mut names: Vec<&str> = self
            .ancestors(id)
            .into_iter()
            .map(|ancestor| ancestor.name.as_str())
            .collect();
        names.reverse();
        names.push(&node.name);
        Some(names.join(" > "))
    }

    /// All departments of the given level, in pre-order.
    #[must_use]
    pub fn collect_nodes_by_level(&self, level: Level) -> Vec<&DepartmentNode> {
        self.iter().filter(|node| node.level == level).collect()
    }

    /// Departments without children, in pre-order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&DepartmentNode> {
        self.iter().filter(|node| node.is_leaf()).collect()
    }

    /// Leaf departments an employee can be transferred to, excluding the
    /// department they are currently in.
    #[must_use]
    pub fn transfer_targets(&self, current: Option<&DepartmentId>) -> Vec<&DepartmentNode> {
        self.iter()
            .filter(|node| node.is_leaf() && Some(&node.id) != current)
            .collect()
    }

    /// Parents the department could be moved under: every node of the
    /// required parent level except the current parent. Divisions cannot be
    /// moved, so the list is empty for them.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if the id does not exist.
    pub fn valid_move_targets(&self, id: &DepartmentId) -> Result<Vec<&DepartmentNode>, TreeError> {
        let node = self.node(id)?;
        let Some(required) = node.level.parent_level() else {
            return Ok(Vec::new());
        };
        let current = self.parent_of(id);
        Ok(self
            .collect_nodes_by_level(required)
            .into_iter()
            .filter(|candidate| Some(&candidate.id) != current)
            .collect())
    }

    /// Returns a new tree with the division appended to the forest.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidHierarchy`] if the node is not a division,
    /// or [`TreeError::DuplicateId`] if its id (or a descendant's) is taken.
    #[instrument(level = "debug", skip(self, division), fields(id = %division.id))]
    pub fn add_division(&self, division: DepartmentNode) -> Result<Self, TreeError> {
        if division.level != Level::Division {
            return Err(TreeError::InvalidHierarchy {
                id: division.id,
                level: division.level,
                parent: None,
            });
        }
        let mut divisions = self.divisions.clone();
        divisions.push(division);
        Self::from_divisions(divisions)
    }

    /// Returns a new tree with `child` appended to the children of
    /// `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if the parent does not exist,
    /// [`TreeError::InvalidHierarchy`] if the child is not exactly one tier
    /// below the parent, or [`TreeError::DuplicateId`] if the id is taken.
    #[instrument(level = "debug", skip(self, child), fields(id = %child.id))]
    pub fn add_child(&self, parent_id: &DepartmentId, child: DepartmentNode) -> Result<Self, TreeError> {
        let parent = self.node(parent_id)?;
        if parent.level.child_level() != Some(child.level) {
            return Err(TreeError::InvalidHierarchy {
                id: child.id,
                level: child.level,
                parent: Some(parent.level),
            });
        }
        if self.contains(&child.id) {
            return Err(TreeError::DuplicateId(child.id));
        }

        let position = self.position_of(parent_id)?;
        let mut divisions = self.divisions.clone();
        node_at_mut(&mut divisions, &position).children.push(child);
        Self::from_divisions(divisions)
    }

    /// Returns a new tree with the department renamed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if the id does not exist.
    pub fn rename_node(&self, id: &DepartmentId, name: impl Into<String>) -> Result<Self, TreeError> {
        let position = self.position_of(id)?;
        let mut tree = self.clone();
        node_at_mut(&mut tree.divisions, &position).name = name.into();
        Ok(tree)
    }

    /// Returns a new tree without the department and its descendants.
    ///
    /// The store never blocks a removal; callers that want to warn about
    /// descendants should check [`DepartmentNode::count_descendants`] first.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if the id does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&self, id: &DepartmentId) -> Result<(Self, RemovedSubtree), TreeError> {
        let position = self.position_of(id)?;
        let mut divisions = self.divisions.clone();
        let removed = detach(&mut divisions, &position);

        let summary = RemovedSubtree {
            removed_ids: removed.descendant_id_set(),
            descendant_count: removed.count_descendants(),
        };
        Ok((Self::from_divisions(divisions)?, summary))
    }

    /// Returns a new tree with the department detached from its parent and
    /// appended to the children of `new_parent`.
    ///
    /// # Errors
    ///
    /// - [`TreeError::NotFound`] if either id does not exist
    /// - [`TreeError::CyclicMove`] if `new_parent` is the node or one of its
    ///   descendants
    /// - [`TreeError::InvalidHierarchy`] if the node is a division or the new
    ///   parent is not exactly one tier above it
    /// - [`TreeError::AlreadyChild`] if the node already sits under
    ///   `new_parent`
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&self, id: &DepartmentId, new_parent: &DepartmentId) -> Result<Self, TreeError> {
        let node = self.node(id)?;
        let target = self.node(new_parent)?;

        if node.descendant_id_set().contains(new_parent) {
            return Err(TreeError::CyclicMove {
                id: id.clone(),
                new_parent: new_parent.clone(),
            });
        }
        if node.level.parent_level() != Some(target.level) {
            return Err(TreeError::InvalidHierarchy {
                id: id.clone(),
                level: node.level,
                parent: Some(target.level),
            });
        }
        if self.parent_of(id) == Some(new_parent) {
            return Err(TreeError::AlreadyChild {
                id: id.clone(),
                parent: new_parent.clone(),
            });
        }

        let mut divisions = self.divisions.clone();
        let moved = detach(&mut divisions, &self.position_of(id)?);

        // Positions shift once the node is detached, so resolve the target
        // against the intermediate forest.
        let intermediate = Self::from_divisions(divisions)?;
        let target_position = intermediate.position_of(new_parent)?;
        let mut divisions = intermediate.divisions;
        node_at_mut(&mut divisions, &target_position).children.push(moved);
        Self::from_divisions(divisions)
    }
}

impl OrgTree {
    fn position_of(&self, id: &DepartmentId) -> Result<Vec<usize>, TreeError> {
        self.index
            .entries
            .get(id)
            .map(|entry| entry.position.clone())
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    fn node_at(&self, position: &[usize]) -> &DepartmentNode {
        let (first, rest) = position
            .split_first()
            .expect("index positions are never empty");
        rest.iter()
            .fold(&self.divisions[*first], |node, &i| &node.children[i])
    }
}

fn node_at_mut<'a>(divisions: &'a mut [DepartmentNode], position: &[usize]) -> &'a mut DepartmentNode {
    let (first, rest) = position
        .split_first()
        .expect("index positions are never empty");
    rest.iter()
        .fold(&mut divisions[*first], |node, &i| &mut node.children[i])
}

fn detach(divisions: &mut Vec<DepartmentNode>, position: &[usize]) -> DepartmentNode {
    match position.split_last() {
        Some((&last, [])) => divisions.remove(last),
        Some((&last, parent)) => node_at_mut(divisions, parent).children.remove(last),
        None => unreachable!("index positions are never empty"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use test_case::test_case;

    use super::*;

    pub(crate) fn id(s: &str) -> DepartmentId {
        DepartmentId::try_from(s).unwrap()
    }

    fn node(s: &str, level: Level) -> DepartmentNode {
        DepartmentNode::new(id(s), s.to_uppercase(), level)
    }

    /// A two-division tree:
    ///
    /// ```text
    /// dev
    /// ├── frontend
    /// │   ├── fe-ui
    /// │   └── fe-ux
    /// ├── backend
    /// │   └── be-api
    /// └── qa
    /// sales
    /// └── sales1
    /// ```
    pub(crate) fn sample_tree() -> OrgTree {
        OrgTree::from_divisions(vec![
            node("dev", Level::Division)
                .with_child(
                    node("frontend", Level::Team)
                        .with_child(node("fe-ui", Level::Part))
                        .with_child(node("fe-ux", Level::Part)),
                )
                .with_child(node("backend", Level::Team).with_child(node("be-api", Level::Part)))
                .with_child(node("qa", Level::Team)),
            node("sales", Level::Division).with_child(node("sales1", Level::Team)),
        ])
        .unwrap()
    }

    fn flat_tree() -> OrgTree {
        OrgTree::from_divisions(vec![
            node("a", Level::Division),
            node("b", Level::Division),
            node("c", Level::Division),
        ])
        .unwrap()
    }

    fn wide_tree() -> OrgTree {
        let mut division = node("wide", Level::Division);
        for t in 0..4 {
            let mut team = node(&format!("t{t}"), Level::Team);
            for p in 0..3 {
                team = team.with_child(node(&format!("t{t}-p{p}"), Level::Part));
            }
            division = division.with_child(team);
        }
        OrgTree::from_divisions(vec![division]).unwrap()
    }

    fn ids(nodes: &[&DepartmentNode]) -> Vec<String> {
        nodes.iter().map(|n| n.id.to_string()).collect()
    }

    #[test_case(sample_tree(); "sample")]
    #[test_case(flat_tree(); "flat")]
    #[test_case(wide_tree(); "wide")]
    fn descendant_ids_contain_each_node_exactly_once(tree: OrgTree) {
        for node in tree.iter() {
            let ids = node.descendant_ids();
            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(ids.len(), unique.len(), "duplicates under {}", node.id);
            assert_eq!(ids.iter().filter(|i| **i == node.id).count(), 1);
            assert_eq!(ids.len(), node.count_descendants() + 1);
            for descendant in node.iter() {
                assert!(unique.contains(&descendant.id));
            }
        }
    }

    #[test]
    fn find_node_locates_nested_departments() {
        let tree = sample_tree();
        assert_eq!(tree.find_node(&id("be-api")).unwrap().name, "BE-API");
        assert!(tree.find_node(&id("missing")).is_none());
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn parent_ids_are_normalised_to_structure() {
        let mut team = node("frontend", Level::Team);
        team.parent_id = Some(id("bogus"));
        let tree = OrgTree::from_divisions(vec![node("dev", Level::Division).with_child(team)]).unwrap();

        let frontend = tree.find_node(&id("frontend")).unwrap();
        assert_eq!(frontend.parent_id, Some(id("dev")));
    }

    #[test]
    fn rejects_part_at_top_level() {
        let err = OrgTree::from_divisions(vec![node("p", Level::Part)]).unwrap_err();
        assert!(matches!(err, TreeError::InvalidHierarchy { parent: None, .. }));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = OrgTree::from_divisions(vec![
            node("dev", Level::Division),
            node("dev", Level::Division),
        ])
        .unwrap_err();
        assert_eq!(err, TreeError::DuplicateId(id("dev")));
    }

    #[test]
    fn collects_nodes_by_level_in_pre_order() {
        let tree = sample_tree();
        assert_eq!(
            ids(&tree.collect_nodes_by_level(Level::Team)),
            ["frontend", "backend", "qa", "sales1"]
        );
        assert_eq!(ids(&tree.collect_nodes_by_level(Level::Division)), ["dev", "sales"]);
    }

    #[test]
    fn path_joins_ancestor_names() {
        let tree = sample_tree();
        assert_eq!(tree.path(&id("fe-ux")).unwrap(), "DEV > FRONTEND > FE-UX");
        assert_eq!(tree.path(&id("sales")).unwrap(), "SALES");
        assert_eq!(tree.division_of(&id("be-api")).unwrap().id, id("dev"));
    }

    #[test]
    fn transfer_targets_are_leaves_except_current() {
        let tree = sample_tree();
        let targets = tree.transfer_targets(Some(&id("fe-ui")));
        assert_eq!(ids(&targets), ["fe-ux", "be-api", "qa", "sales1"]);
    }

    #[test]
    fn add_child_returns_new_snapshot() {
        let tree = sample_tree();
        let updated = tree
            .add_child(&id("qa"), node("qa-auto", Level::Part))
            .unwrap();

        assert!(tree.find_node(&id("qa-auto")).is_none());
        assert_ne!(tree, updated);
        let added = updated.find_node(&id("qa-auto")).unwrap();
        assert_eq!(added.parent_id, Some(id("qa")));
        assert_eq!(updated.len(), tree.len() + 1);
    }

    #[test]
    fn add_child_rejects_wrong_tier() {
        let tree = sample_tree();
        let err = tree
            .add_child(&id("dev"), node("x", Level::Part))
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidHierarchy {
                id: id("x"),
                level: Level::Part,
                parent: Some(Level::Division),
            }
        );
    }

    #[test]
    fn add_child_rejects_children_of_parts() {
        let tree = sample_tree();
        let err = tree
            .add_child(&id("fe-ui"), node("x", Level::Part))
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidHierarchy { .. }));
    }

    #[test]
    fn add_division_appends_to_forest() {
        let tree = sample_tree().add_division(node("cs", Level::Division)).unwrap();
        assert_eq!(tree.divisions().last().unwrap().id, id("cs"));
    }

    #[test]
    fn rename_keeps_structure() {
        let tree = sample_tree();
        let renamed = tree.rename_node(&id("backend"), "Platform").unwrap();
        assert_eq!(renamed.find_node(&id("backend")).unwrap().name, "Platform");
        assert_eq!(renamed.find_node(&id("backend")).unwrap().children.len(), 1);
        assert_eq!(tree.find_node(&id("backend")).unwrap().name, "BACKEND");
    }

    #[test_case("frontend", 2; "team with parts")]
    #[test_case("dev", 6; "division")]
    #[test_case("fe-ui", 0; "leaf")]
    fn remove_subtree_drops_all_descendants(target: &str, descendants: usize) {
        let tree = sample_tree();
        let target = id(target);
        let expected = tree.find_node(&target).unwrap().descendant_id_set();

        let (updated, removed) = tree.remove_subtree(&target).unwrap();

        assert_eq!(removed.removed_ids, expected);
        assert_eq!(removed.descendant_count, descendants);
        assert_eq!(updated.len(), tree.len() - expected.len());
        for gone in &expected {
            assert!(updated.find_node(gone).is_none());
        }
    }

    #[test]
    fn remove_missing_is_not_found() {
        let err = sample_tree().remove_subtree(&id("nope")).unwrap_err();
        assert_eq!(err, TreeError::NotFound(id("nope")));
    }

    #[test]
    fn move_reattaches_under_new_parent() {
        let tree = sample_tree();
        let moved = tree.move_node(&id("fe-ux"), &id("backend")).unwrap();

        assert_eq!(moved.len(), tree.len());
        assert_eq!(moved.parent_of(&id("fe-ux")), Some(&id("backend")));
        let backend = moved.find_node(&id("backend")).unwrap();
        assert_eq!(backend.children.last().unwrap().id, id("fe-ux"));
        assert_eq!(moved.find_node(&id("frontend")).unwrap().children.len(), 1);
    }

    #[test]
    fn move_team_across_divisions_keeps_parts() {
        let tree = sample_tree();
        let moved = tree.move_node(&id("frontend"), &id("sales")).unwrap();

        assert_eq!(moved.len(), tree.len());
        assert_eq!(moved.division_of(&id("fe-ui")).unwrap().id, id("sales"));
        assert_eq!(moved.path(&id("fe-ui")).unwrap(), "SALES > FRONTEND > FE-UI");
    }

    #[test]
    fn every_valid_move_preserves_node_count() {
        let tree = sample_tree();
        for node in tree.iter() {
            for target in tree.valid_move_targets(&node.id).unwrap() {
                let moved = tree.move_node(&node.id, &target.id).unwrap();
                assert_eq!(moved.len(), tree.len());
                let all: HashSet<_> = moved.iter().map(|n| n.id.clone()).collect();
                assert_eq!(all.len(), tree.len());
            }
        }
    }

    #[test_case("frontend", "frontend"; "onto itself")]
    #[test_case("frontend", "fe-ui"; "under own descendant")]
    #[test_case("dev", "be-api"; "division under descendant")]
    fn move_rejects_cycles(node: &str, target: &str) {
        let err = sample_tree().move_node(&id(node), &id(target)).unwrap_err();
        assert!(matches!(err, TreeError::CyclicMove { .. }), "{err:?}");
    }

    #[test]
    fn move_rejects_divisions() {
        let err = sample_tree().move_node(&id("sales"), &id("dev")).unwrap_err();
        assert!(matches!(err, TreeError::InvalidHierarchy { level: Level::Division, .. }));
    }

    #[test]
    fn move_rejects_wrong_tier_parent() {
        let err = sample_tree().move_node(&id("fe-ui"), &id("dev")).unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidHierarchy {
                id: id("fe-ui"),
                level: Level::Part,
                parent: Some(Level::Division),
            }
        );
    }

    #[test]
    fn move_to_current_parent_is_rejected() {
        let err = sample_tree().move_node(&id("fe-ui"), &id("frontend")).unwrap_err();
        assert_eq!(
            err,
            TreeError::AlreadyChild {
                id: id("fe-ui"),
                parent: id("frontend"),
            }
        );
    }

    #[test]
    fn valid_move_targets_exclude_current_parent() {
        let tree = sample_tree();
        assert_eq!(
            ids(&tree.valid_move_targets(&id("fe-ui")).unwrap()),
            ["backend", "qa", "sales1"]
        );
        assert_eq!(ids(&tree.valid_move_targets(&id("qa")).unwrap()), ["sales"]);
        assert!(tree.valid_move_targets(&id("dev")).unwrap().is_empty());
    }
}
