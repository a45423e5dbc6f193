//! A set of parsed units keyed by their identifier

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::parser::{parse, ParseError};
use crate::syntax::SourceTree;

/// Errors raised while assembling a project set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Duplicate unit: {0}")]
    DuplicateUnit(UnitId),

    #[error("Failed to parse {unit}: {source}")]
    Parse {
        unit: UnitId,
        #[source]
        source: ParseError,
    },
}

/// Identifier of a unit, usually its path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UnitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mapping from unit identifier to syntax tree, in insertion order
///
/// A project set is a value: rewrites produce a new set and never mutate
/// the trees held by an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSet {
    units: IndexMap<UnitId, SourceTree>,
}

impl ProjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from units, rejecting duplicate identifiers
    pub fn try_from_units<I>(units: I) -> Result<Self, ProjectError>
    where
        I: IntoIterator<Item = (UnitId, SourceTree)>,
    {
        let mut set = Self::new();
        for (id, tree) in units {
            if set.units.contains_key(&id) {
                return Err(ProjectError::DuplicateUnit(id));
            }
            set.units.insert(id, tree);
        }
        Ok(set)
    }

    /// Parse every `(id, source)` pair into a set
    pub fn parse_units<I, K, S>(sources: I) -> Result<Self, ProjectError>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<UnitId>,
        S: AsRef<str>,
    {
        let mut units = Vec::new();
        for (id, source) in sources {
            let unit = id.into();
            let tree = parse(source.as_ref()).map_err(|source| ProjectError::Parse {
                unit: unit.clone(),
                source,
            })?;
            units.push((unit, tree));
        }
        Self::try_from_units(units)
    }

    /// Insert or replace a unit's tree, keeping its position if present
    pub fn insert(&mut self, id: impl Into<UnitId>, tree: SourceTree) -> Option<SourceTree> {
        self.units.insert(id.into(), tree)
    }

    pub fn get(&self, id: &UnitId) -> Option<&SourceTree> {
        self.units.get(id)
    }

    pub fn contains(&self, id: &UnitId) -> bool {
        self.units.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &UnitId> {
        self.units.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &SourceTree)> {
        self.units.iter()
    }

    /// Find the unit whose current tree generation produced `handle`
    pub fn unit_of(&self, handle: crate::syntax::NodeHandle) -> Option<&UnitId> {
        self.units
            .iter()
            .find(|(_, tree)| tree.owns(handle))
            .map(|(id, _)| id)
    }
}

impl FromIterator<(UnitId, SourceTree)> for ProjectSet {
    /// Later entries replace earlier ones with the same identifier
    fn from_iter<I: IntoIterator<Item = (UnitId, SourceTree)>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ProjectSet {
    type Item = (&'a UnitId, &'a SourceTree);
    type IntoIter = indexmap::map::Iter<'a, UnitId, SourceTree>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units_keeps_insertion_order() {
        let project =
            ProjectSet::parse_units([("b.cs", "class B {}"), ("a.cs", "class A {}")]).unwrap();
        let keys: Vec<&str> = project.keys().map(UnitId::as_str).collect();
        assert_eq!(keys, vec!["b.cs", "a.cs"]);
        assert_eq!(project.len(), 2);
    }

    #[test]
    fn test_duplicate_unit_is_rejected() {
        let err = ProjectSet::parse_units([("a.cs", "class A {}"), ("a.cs", "class B {}")])
            .unwrap_err();
        assert_eq!(err, ProjectError::DuplicateUnit(UnitId::from("a.cs")));
    }

    #[test]
    fn test_parse_error_names_unit() {
        let err = ProjectSet::parse_units([("broken.cs", "class A {")]).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse broken.cs"));
    }

    #[test]
    fn test_unit_of_handle() {
        let project =
            ProjectSet::parse_units([("a.cs", "class A {}"), ("b.cs", "class B {}")]).unwrap();
        let b = project.get(&UnitId::from("b.cs")).unwrap();
        let handle = b.handle(crate::syntax::NodeId(1));
        assert_eq!(project.unit_of(handle), Some(&UnitId::from("b.cs")));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut project =
            ProjectSet::parse_units([("a.cs", "class A {}"), ("b.cs", "class B {}")]).unwrap();
        let replaced = parse("class A2 {}").unwrap();
        assert!(project.insert("a.cs", replaced).is_some());
        let keys: Vec<&str> = project.keys().map(UnitId::as_str).collect();
        assert_eq!(keys, vec!["a.cs", "b.cs"]);
        assert_eq!(project.get(&UnitId::from("a.cs")).unwrap().text(), "class A2 {}");
    }
}
