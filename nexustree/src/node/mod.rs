// The document tree: groups, datasets, links, and their attributes

use crate::error::{NexusError, Result};
use crate::path::{child_path, validate_name};
use crate::value::{Elements, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod resolve;

pub use resolve::{canonical_names, resolve, resolve_mut, NodeMut, NodeRef, MAX_LINK_HOPS};

/// Attribute name holding the class of a group in NeXus files.
pub const NX_CLASS_ATTR: &str = "NX_class";

/// Attribute name holding the units of a field.
pub const UNITS_ATTR: &str = "units";

/// A node of the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Group(GroupNode),
    Dataset(DatasetNode),
    Link(LinkNode),
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Group(_) => "group",
            Node::Dataset(_) => "dataset",
            Node::Link(_) => "link",
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupNode> {
        match self {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&DatasetNode> {
        match self {
            Node::Dataset(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dataset_mut(&mut self) -> Option<&mut DatasetNode> {
        match self {
            Node::Dataset(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&LinkNode> {
        match self {
            Node::Link(l) => Some(l),
            _ => None,
        }
    }

    /// Attributes of a group or dataset. Links carry none.
    pub fn attributes(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Node::Group(g) => Some(&g.attributes),
            Node::Dataset(d) => Some(&d.attributes),
            Node::Link(_) => None,
        }
    }
}

impl From<GroupNode> for Node {
    fn from(group: GroupNode) -> Self {
        Node::Group(group)
    }
}

impl From<DatasetNode> for Node {
    fn from(dataset: DatasetNode) -> Self {
        Node::Dataset(dataset)
    }
}

impl From<LinkNode> for Node {
    fn from(link: LinkNode) -> Self {
        Node::Link(link)
    }
}

/// A container node of a given NeXus class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    #[serde(rename = "class")]
    nx_class: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, Node>,
}

impl GroupNode {
    pub fn new(nx_class: &str) -> Self {
        GroupNode {
            nx_class: nx_class.to_string(),
            attributes: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn nx_class(&self) -> &str {
        &self.nx_class
    }

    pub fn set_nx_class(&mut self, nx_class: &str) {
        self.nx_class = nx_class.to_string();
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set a group attribute. `NX_class` sets the group class instead.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        validate_name(name)?;
        let value = value.into();
        if name == NX_CLASS_ATTR {
            self.nx_class = match value.elements() {
                Elements::String(s) if s.len() == 1 && !s[0].trim().is_empty() => {
                    s[0].trim().to_string()
                }
                _ => {
                    return Err(NexusError::mismatch(
                        "a non-empty string for NX_class",
                        format!("{} '{value}'", value.type_name()),
                    ))
                }
            };
            return Ok(());
        }
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn children(&self) -> &BTreeMap<String, Node> {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Insert a child, returning the node it replaced.
    pub fn insert(&mut self, name: &str, node: impl Into<Node>) -> Result<Option<Node>> {
        validate_name(name)?;
        let node = node.into();
        log::debug!("Insert {} '{}' into {}", node.kind(), name, self.nx_class);
        Ok(self.children.insert(name.to_string(), node))
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.children.remove(name)
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetNode> {
        self.children.get(name).and_then(Node::as_dataset)
    }

    pub fn dataset_mut(&mut self, name: &str) -> Option<&mut DatasetNode> {
        self.children.get_mut(name).and_then(Node::as_dataset_mut)
    }

    pub fn group(&self, name: &str) -> Option<&GroupNode> {
        self.children.get(name).and_then(Node::as_group)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut GroupNode> {
        self.children.get_mut(name).and_then(Node::as_group_mut)
    }

    pub fn link(&self, name: &str) -> Option<&LinkNode> {
        self.children.get(name).and_then(Node::as_link)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &GroupNode)> {
        self.children
            .iter()
            .filter_map(|(name, node)| node.as_group().map(|g| (name.as_str(), g)))
    }

    pub fn datasets(&self) -> impl Iterator<Item = (&str, &DatasetNode)> {
        self.children
            .iter()
            .filter_map(|(name, node)| node.as_dataset().map(|d| (name.as_str(), d)))
    }

    /// Child groups whose class is `nx_class`, by name.
    pub fn groups_of_class<'a>(
        &'a self,
        nx_class: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a GroupNode)> + 'a {
        self.groups().filter(move |(_, g)| g.nx_class == nx_class)
    }

    pub fn groups_of_class_mut<'a>(
        &'a mut self,
        nx_class: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a mut GroupNode)> + 'a {
        self.children.iter_mut().filter_map(move |(name, node)| match node {
            Node::Group(g) if g.nx_class == nx_class => Some((name.as_str(), g)),
            _ => None,
        })
    }

    pub fn group_count(&self) -> usize {
        self.groups().count()
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets().count()
    }

    /// Every descendant in depth-first pre-order, as `(path, node)`. The
    /// group itself is `/` and is not listed.
    pub fn walk(&self) -> Vec<(String, &Node)> {
        let mut out = Vec::new();
        walk_into(self, "/", &mut out);
        out
    }

    /// Check what deserialization cannot: child and attribute names, group
    /// classes and link targets, over the whole subtree.
    pub fn check_tree(&self) -> Result<()> {
        check_group(self, "/")
    }
}

fn check_attribute_names(attributes: &BTreeMap<String, Value>, path: &str) -> Result<()> {
    for name in attributes.keys() {
        validate_name(name).map_err(|e| at_path(path, e))?;
    }
    Ok(())
}

fn at_path(path: &str, err: NexusError) -> NexusError {
    match err {
        NexusError::InvalidName { name, reason } => NexusError::InvalidName {
            name,
            reason: format!("{reason} (under {path})"),
        },
        other => other,
    }
}

fn check_group(group: &GroupNode, path: &str) -> Result<()> {
    if group.nx_class.trim().is_empty() {
        return Err(NexusError::Schema(format!("{path}: group has an empty class")));
    }
    check_attribute_names(&group.attributes, path)?;

    for (name, node) in &group.children {
        validate_name(name).map_err(|e| at_path(path, e))?;
        let child = child_path(path, name);
        match node {
            Node::Group(g) => check_group(g, &child)?,
            Node::Dataset(d) => check_attribute_names(&d.attributes, &child)?,
            Node::Link(link) => {
                LinkNode::new(&link.target).map_err(|e| match e {
                    NexusError::Link(msg) => NexusError::Link(format!("{child}: {msg}")),
                    other => other,
                })?;
            }
        }
    }
    Ok(())
}

fn walk_into<'a>(group: &'a GroupNode, prefix: &str, out: &mut Vec<(String, &'a Node)>) {
    for (name, node) in &group.children {
        let path = child_path(prefix, name);
        out.push((path.clone(), node));
        if let Node::Group(child) = node {
            walk_into(child, &path, out);
        }
    }
}

/// A typed leaf node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetNode {
    value: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,
}

impl DatasetNode {
    pub fn new(value: impl Into<Value>) -> Self {
        DatasetNode {
            value: value.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        validate_name(name)?;
        self.attributes.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// The `units` attribute as a string, if present and a single element.
    pub fn units(&self) -> Option<String> {
        self.attributes
            .get(UNITS_ATTR)
            .and_then(|v| v.as_string().ok())
    }

    pub fn set_units(&mut self, units: &str) {
        self.attributes
            .insert(UNITS_ATTR.to_string(), Value::from(units));
    }

    /// Builder form of [`DatasetNode::set_units`].
    pub fn with_units(mut self, units: &str) -> Self {
        self.set_units(units);
        self
    }
}

/// A reference to another node by absolute path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkNode {
    target: String,
}

impl LinkNode {
    pub fn new(target: &str) -> Result<Self> {
        if !target.starts_with('/') {
            return Err(NexusError::Link(format!(
                "link target '{target}' must be an absolute path"
            )));
        }
        Ok(LinkNode {
            target: target.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> GroupNode {
        let mut entry = GroupNode::new("NXentry");
        entry.insert("title", DatasetNode::new("scan 12")).unwrap();

        let mut data = GroupNode::new("NXdata");
        data.insert("counts", DatasetNode::new(vec![1i64, 5, 3]))
            .unwrap();
        entry.insert("data", data).unwrap();
        entry.insert("monitor_1", GroupNode::new("NXmonitor")).unwrap();
        entry.insert("monitor_2", GroupNode::new("NXmonitor")).unwrap();

        let mut root = GroupNode::new("NXroot");
        root.insert("entry", entry).unwrap();
        root
    }

    #[test]
    fn test_typed_child_lookup() {
        let root = sample_tree();
        let entry = root.group("entry").unwrap();
        assert!(entry.dataset("title").is_some());
        assert!(entry.group("title").is_none());
        assert!(entry.dataset("data").is_none());
        assert_eq!(entry.group_count(), 3);
        assert_eq!(entry.dataset_count(), 1);
    }

    #[test]
    fn test_groups_of_class() {
        let root = sample_tree();
        let entry = root.group("entry").unwrap();
        let monitors: Vec<&str> = entry
            .groups_of_class("NXmonitor")
            .map(|(name, _)| name)
            .collect();
        assert_eq!(monitors, vec!["monitor_1", "monitor_2"]);
    }

    #[test]
    fn test_insert_rejects_bad_names() {
        let mut group = GroupNode::new("NXentry");
        assert!(group.insert("a/b", DatasetNode::new(1i64)).is_err());
        assert!(group.insert("", DatasetNode::new(1i64)).is_err());
        assert!(group.is_empty());
    }

    #[test]
    fn test_insert_replaces() {
        let mut group = GroupNode::new("NXentry");
        assert!(group.insert("x", DatasetNode::new(1i64)).unwrap().is_none());
        let old = group.insert("x", DatasetNode::new(2i64)).unwrap();
        assert_eq!(old.unwrap().as_dataset().unwrap().value(), &Value::from(1i64));
    }

    #[test]
    fn test_nx_class_attribute_sets_class() {
        let mut group = GroupNode::new("NXcollection");
        group.set_attribute(NX_CLASS_ATTR, "NXnote").unwrap();
        assert_eq!(group.nx_class(), "NXnote");
        assert!(group.attribute(NX_CLASS_ATTR).is_none());
    }

    #[test]
    fn test_nx_class_attribute_needs_non_empty_string() {
        let mut group = GroupNode::new("NXcollection");
        let err = group.set_attribute(NX_CLASS_ATTR, 5i64).unwrap_err();
        assert!(matches!(err, NexusError::TypeMismatch { .. }));
        assert!(group.set_attribute(NX_CLASS_ATTR, "  ").is_err());
        assert!(group
            .set_attribute(NX_CLASS_ATTR, vec!["NXnote", "NXlog"])
            .is_err());
        assert_eq!(group.nx_class(), "NXcollection");
    }

    #[test]
    fn test_check_tree_accepts_valid_tree() {
        let mut root = sample_tree();
        root.insert("shortcut", LinkNode::new("/entry/data").unwrap())
            .unwrap();
        root.check_tree().unwrap();
    }

    #[test]
    fn test_check_tree_rejects_loaded_bad_names() {
        let yaml = r#"
class: NXroot
children:
  "a/b":
    kind: dataset
    value:
      int: [1]
"#;
        let root: GroupNode = serde_yaml::from_str(yaml).unwrap();
        let err = root.check_tree().unwrap_err();
        assert!(matches!(err, NexusError::InvalidName { ref name, .. } if name == "a/b"));

        let nested = r#"
class: NXroot
children:
  entry:
    kind: group
    class: NXentry
    children:
      "..":
        kind: group
        class: NXdata
"#;
        let root: GroupNode = serde_yaml::from_str(nested).unwrap();
        assert!(matches!(root.check_tree(), Err(NexusError::InvalidName { .. })));
    }

    #[test]
    fn test_check_tree_rejects_bad_attributes_and_links() {
        let yaml = r#"
class: NXroot
children:
  entry:
    kind: group
    class: NXentry
    children:
      title:
        kind: dataset
        value:
          string: [scan]
        attributes:
          "x@y":
            string: [bad]
"#;
        let root: GroupNode = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(root.check_tree(), Err(NexusError::InvalidName { .. })));

        let link = r#"
class: NXroot
children:
  data:
    kind: link
    target: entry/data
"#;
        let root: GroupNode = serde_yaml::from_str(link).unwrap();
        let err = root.check_tree().unwrap_err();
        assert!(matches!(err, NexusError::Link(ref msg) if msg.starts_with("/data:")));

        let classless = "class: ''\n";
        let root: GroupNode = serde_yaml::from_str(classless).unwrap();
        assert!(matches!(root.check_tree(), Err(NexusError::Schema(_))));
    }

    #[test]
    fn test_walk_order() {
        let root = sample_tree();
        let paths: Vec<String> = root.walk().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![
                "/entry",
                "/entry/data",
                "/entry/data/counts",
                "/entry/monitor_1",
                "/entry/monitor_2",
                "/entry/title",
            ]
        );
    }

    #[test]
    fn test_units() {
        let ds = DatasetNode::new(300.0).with_units("K");
        assert_eq!(ds.units().as_deref(), Some("K"));
    }

    #[test]
    fn test_link_requires_absolute_target() {
        assert!(LinkNode::new("entry/data").is_err());
        assert_eq!(LinkNode::new("/entry/data").unwrap().target(), "/entry/data");
    }

    #[test]
    fn test_yaml_layout() {
        let mut group = GroupNode::new("NXsample");
        group
            .insert("temperature", DatasetNode::new(21.5).with_units("degC"))
            .unwrap();
        let yaml = serde_yaml::to_string(&group).unwrap();
        let back: GroupNode = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, group);
        assert!(yaml.contains("class: NXsample"));
        assert!(yaml.contains("kind: dataset"));
    }
}
