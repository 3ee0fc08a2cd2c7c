//! The configured action tree.
//!
//! Leaves are shell commands; groups are named sub-menus. The tree is
//! validated once, while the configuration is deserialized: duplicate names,
//! empty groups, empty commands and values that are neither strings nor maps
//! are rejected with an error naming the offending entry. Entries keep the
//! order they have in the config file.
//!
//! ```
//! use stackctl_core::actions::{ActionNode, ActionTree};
//!
//! let tree: ActionTree = serde_json::from_str(
//!     r#"{ "hello": "echo hello", "db": { "migrate": "make migrate" } }"#,
//! ).unwrap();
//! assert_eq!(tree.names().collect::<Vec<_>>(), ["hello", "db"]);
//! assert!(matches!(tree.get("db"), Some(ActionNode::Group(_))));
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operator::MenuOption;
use crate::text::kebab_case_to_title_case;

/// Description shown next to group entries.
pub const GROUP_HINT: &str = "Select for more options";

/// A named entry of the action tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionNode {
    /// A literal shell command.
    Leaf(String),
    /// A sub-menu.
    Group(ActionTree),
}

impl ActionNode {
    /// The menu entry for this node under `name`.
    pub fn menu_option(&self, name: &str) -> MenuOption {
        let option = MenuOption::new(kebab_case_to_title_case(name));
        match self {
            Self::Leaf(command) => option.with_description(command.as_str()),
            Self::Group(_) => option.with_description(GROUP_HINT),
        }
    }
}

/// Ordered, uniquely named children of a group (or the root of the tree).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTree {
    entries: Vec<(String, ActionNode)>,
}

/// Errors from building a tree programmatically.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// Two siblings share a name.
    #[error("duplicate entry '{0}'")]
    Duplicate(String),
    /// An entry has an empty name.
    #[error("entry names must not be empty")]
    EmptyName,
    /// A path through the tree names an entry that does not exist.
    #[error("no entry named '{0}'")]
    NotFound(String),
    /// A path continues below a leaf.
    #[error("'{0}' is a command, not a group")]
    NotAGroup(String),
}

impl ActionTree {
    /// Build a tree from entries, rejecting duplicate or empty names.
    pub fn from_entries(entries: Vec<(String, ActionNode)>) -> Result<Self, TreeError> {
        let mut seen = HashSet::new();
        for (name, _) in &entries {
            if name.trim().is_empty() {
                return Err(TreeError::EmptyName);
            }
            if !seen.insert(name.as_str()) {
                return Err(TreeError::Duplicate(name.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Direct children in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Names of the direct children in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Look up a direct child.
    pub fn get(&self, name: &str) -> Option<&ActionNode> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    /// The child at `index` (menu position).
    pub fn entry(&self, index: usize) -> Option<(&str, &ActionNode)> {
        self.entries.get(index).map(|(name, node)| (name.as_str(), node))
    }

    /// One menu entry per child.
    pub fn menu_options(&self) -> Vec<MenuOption> {
        self.iter().map(|(name, node)| node.menu_option(name)).collect()
    }

    /// Follow `path` (a list of names) down the tree.
    pub fn walk<S: AsRef<str>>(&self, path: &[S]) -> Result<Option<&ActionNode>, TreeError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(None);
        };
        let first = first.as_ref();
        let mut node = self
            .get(first)
            .ok_or_else(|| TreeError::NotFound(first.to_string()))?;
        let mut current = first;
        for name in rest {
            let name = name.as_ref();
            node = match node {
                ActionNode::Group(tree) => tree
                    .get(name)
                    .ok_or_else(|| TreeError::NotFound(name.to_string()))?,
                ActionNode::Leaf(_) => return Err(TreeError::NotAGroup(current.to_string())),
            };
            current = name;
        }
        Ok(Some(node))
    }
}

impl Serialize for ActionNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(command) => serializer.serialize_str(command),
            Self::Group(tree) => tree.serialize(serializer),
        }
    }
}

impl Serialize for ActionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

/// Read map entries in document order, validating names.
fn collect_entries<'de, A: MapAccess<'de>>(mut map: A) -> Result<Vec<(String, ActionNode)>, A::Error> {
    let mut entries: Vec<(String, ActionNode)> = Vec::new();
    while let Some(name) = map.next_key::<String>()? {
        if name.trim().is_empty() {
            return Err(de::Error::custom("entry names must not be empty"));
        }
        if entries.iter().any(|(n, _)| *n == name) {
            return Err(de::Error::custom(format_args!("duplicate entry '{name}'")));
        }
        let node = map
            .next_value::<ActionNode>()
            .map_err(|e| <A::Error as de::Error>::custom(format_args!("{name}: {e}")))?;
        entries.push((name, node));
    }
    Ok(entries)
}

struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = ActionTree;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of named commands")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        Ok(ActionTree {
            entries: collect_entries(map)?,
        })
    }
}

impl<'de> Deserialize<'de> for ActionTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TreeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = ActionNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a shell command string or a group of named commands")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.trim().is_empty() {
            return Err(E::custom("command must not be empty"));
        }
        Ok(ActionNode::Leaf(v.to_string()))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        let entries = collect_entries(map)?;
        if entries.is_empty() {
            return Err(de::Error::custom("a group must contain at least one entry"));
        }
        Ok(ActionNode::Group(ActionTree { entries }))
    }
}

impl<'de> Deserialize<'de> for ActionNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ActionTree, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn preserves_document_order() {
        let tree = parse(r#"{"zeta": "z", "alpha": "a", "mid": {"b": "b", "a": "a"}}"#).unwrap();
        assert_eq!(tree.names().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
        let Some(ActionNode::Group(mid)) = tree.get("mid") else {
            panic!("mid should be a group");
        };
        assert_eq!(mid.names().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn rejects_non_string_leaf_with_entry_name() {
        let err = parse(r#"{"db": {"port": 5432}}"#).unwrap_err().to_string();
        assert!(err.contains("db: port: invalid type"), "{err}");
    }

    #[test]
    fn rejects_duplicate_siblings() {
        let err = parse(r#"{"a": "x", "a": "y"}"#).unwrap_err().to_string();
        assert!(err.contains("duplicate entry 'a'"), "{err}");
    }

    #[test]
    fn allows_same_name_in_different_groups() {
        let tree = parse(r#"{"api": {"logs": "a"}, "db": {"logs": "b"}}"#).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn rejects_empty_group_and_empty_command() {
        assert!(parse(r#"{"tools": {}}"#).is_err());
        assert!(parse(r#"{"noop": "  "}"#).is_err());
    }

    #[test]
    fn rejects_arrays() {
        assert!(parse(r#"{"steps": ["a", "b"]}"#).is_err());
        assert!(parse(r#"["a"]"#).is_err());
    }

    #[test]
    fn empty_root_is_allowed() {
        assert!(parse("{}").unwrap().is_empty());
    }

    #[test]
    fn menu_options_title_case_and_describe() {
        let tree = parse(r#"{"run-tests": "cargo test", "db-tools": {"reset": "make reset"}}"#).unwrap();
        let options = tree.menu_options();
        assert_eq!(options[0].label, "Run Tests");
        assert_eq!(options[0].description.as_deref(), Some("cargo test"));
        assert_eq!(options[1].label, "Db Tools");
        assert_eq!(options[1].description.as_deref(), Some(GROUP_HINT));
    }

    #[test]
    fn walk_follows_names() {
        let tree = parse(r#"{"db": {"migrate": {"up": "make up"}}}"#).unwrap();
        assert_eq!(
            tree.walk(&["db", "migrate", "up"]).unwrap(),
            Some(&ActionNode::Leaf("make up".into()))
        );
        assert_eq!(tree.walk::<&str>(&[]).unwrap(), None);
        assert_eq!(
            tree.walk(&["db", "seed"]).unwrap_err(),
            TreeError::NotFound("seed".into())
        );
        assert_eq!(
            tree.walk(&["db", "migrate", "up", "now"]).unwrap_err(),
            TreeError::NotAGroup("up".into())
        );
    }

    #[test]
    fn from_entries_validates_names() {
        let leaf = || ActionNode::Leaf("true".into());
        assert_eq!(
            ActionTree::from_entries(vec![("a".into(), leaf()), ("a".into(), leaf())]),
            Err(TreeError::Duplicate("a".into()))
        );
        assert_eq!(
            ActionTree::from_entries(vec![(" ".into(), leaf())]),
            Err(TreeError::EmptyName)
        );
    }

    #[test]
    fn serializes_in_order() {
        let tree = parse(r#"{"b": "2", "a": {"c": "3"}}"#).unwrap();
        assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"b":"2","a":{"c":"3"}}"#);
    }
}
