// NeXus documents on disk

use crate::classes::{NxData, NxEntry, NxRoot};
use crate::error::{NexusError, Result};
use crate::node::{resolve, resolve_mut, GroupNode, Node, NodeMut, NodeRef};
use crate::object::{BaseClass, NxObject};
use crate::path::NodePath;
use crate::schema::SchemaDefinition;
use crate::validation::{validate_tree, ValidationOptions, ValidationResult};
use crate::value::Value;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version of the on-disk document layout.
pub const FORMAT_VERSION: u32 = 1;

/// NeXus format version written to new files.
pub const NEXUS_VERSION: &str = "v2024.02";

/// File name suffixes picked up by [`NexusFile::discover`].
pub const EXTENSIONS: [&str; 3] = ["nxs.yaml", "nxs.yml", "nxs.json"];

/// Serialization used on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl Format {
    /// `.json` is JSON, everything else is YAML.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    format_version: u32,
    root: &'a GroupNode,
}

#[derive(Deserialize)]
struct Document {
    format_version: u32,
    root: GroupNode,
}

/// A NeXus tree with an `NXroot` group at the top, optionally tied to a path.
#[derive(Debug, Clone)]
pub struct NexusFile {
    root: GroupNode,
    path: Option<PathBuf>,
}

impl NexusFile {
    /// An empty file with the standard root attributes set.
    pub fn new(file_name: &str) -> Result<Self> {
        let mut root = NxRoot::new();
        root.set_file_name_attr(file_name.to_string())?;
        root.set_file_time_attr(now())?;
        root.set_creator_attr(format!("nexustree {}", env!("CARGO_PKG_VERSION")))?;
        root.set_nexus_version_attr(NEXUS_VERSION.to_string())?;
        Ok(NexusFile {
            root: root.into_inner(),
            path: None,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut file = Self::from_str(&content, Format::from_path(path))?;
        file.path = Some(path.to_path_buf());
        log::debug!("Opened {}", path.display());
        Ok(file)
    }

    pub fn from_str(content: &str, format: Format) -> Result<Self> {
        let doc: Document = match format {
            Format::Yaml => serde_yaml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        };

        if doc.format_version != FORMAT_VERSION {
            return Err(NexusError::Schema(format!(
                "Unsupported format_version {} (expected {FORMAT_VERSION})",
                doc.format_version
            )));
        }
        doc.root.check_tree()?;
        if doc.root.nx_class() != NxRoot::NX_CLASS {
            log::warn!("Root group has class '{}', expected NXroot", doc.root.nx_class());
        }

        Ok(NexusFile {
            root: doc.root,
            path: None,
        })
    }

    pub fn to_string(&self, format: Format) -> Result<String> {
        let doc = DocumentRef {
            format_version: FORMAT_VERSION,
            root: &self.root,
        };
        Ok(match format {
            Format::Yaml => serde_yaml::to_string(&doc)?,
            Format::Json => serde_json::to_string_pretty(&doc)?,
        })
    }

    /// Write back to the path the file was opened from or last saved to.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| NexusError::Other("File has no path yet, use save_as".into()))?;
        self.write_to(&path)
    }

    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.write_to(&path)?;
        self.path = Some(path);
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<()> {
        self.root.set_attribute("file_update_time", now())?;
        let content = self.to_string(Format::from_path(path))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path)?;

        log::debug!("Saved {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn root(&self) -> NxRoot<&GroupNode> {
        NxRoot::wrap(&self.root)
    }

    pub fn root_mut(&mut self) -> NxRoot<&mut GroupNode> {
        NxRoot::wrap(&mut self.root)
    }

    pub fn root_node(&self) -> &GroupNode {
        &self.root
    }

    /// The `NXentry` groups under the root, by name.
    pub fn entries(&self) -> BTreeMap<&str, NxEntry<&GroupNode>> {
        self.root.get_children()
    }

    pub fn resolve(&self, path: &str) -> Result<NodeRef<'_>> {
        resolve(&self.root, &NodePath::parse(path)?)
    }

    pub fn resolve_mut(&mut self, path: &str) -> Result<NodeMut<'_>> {
        resolve_mut(&mut self.root, &NodePath::parse(path)?)
    }

    /// Look up `node@attr`.
    pub fn resolve_attribute(&self, path: &str) -> Result<&Value> {
        let parsed = NodePath::parse(path)?;
        let attr = parsed
            .attribute()
            .ok_or_else(|| NexusError::Other(format!("'{path}' does not name an attribute")))?;

        let found = match resolve(&self.root, &parsed)? {
            NodeRef::Group(group) => group.attribute(attr),
            NodeRef::Dataset(dataset) => dataset.attribute(attr),
        };
        found.ok_or_else(|| NexusError::NotFound(path.to_string()))
    }

    /// Whether a child is stored under the last name of `path`, links
    /// included whether or not they resolve. Errors reaching the parent group
    /// are returned.
    pub fn contains_at(&self, path: &str) -> Result<bool> {
        let parsed = NodePath::parse(path)?;
        if parsed.is_root() {
            return Ok(true);
        }
        let (parent, name) = split_parent(&parsed, path)?;
        match resolve(&self.root, &parent)? {
            NodeRef::Group(group) => Ok(group.contains(&name)),
            NodeRef::Dataset(_) => Ok(false),
        }
    }

    /// Store `node` at `path`. The parent group must exist.
    pub fn insert_at(&mut self, path: &str, node: impl Into<Node>) -> Result<Option<Node>> {
        let parsed = NodePath::parse(path)?;
        let (parent, name) = split_parent(&parsed, path)?;
        let node = node.into();
        log::debug!("Inserting {} at {}", node.kind(), path);

        match resolve_mut(&mut self.root, &parent)? {
            NodeMut::Group(group) => group.insert(&name, node),
            NodeMut::Dataset(_) => Err(NexusError::NameConflict {
                name: parent.render(),
                reason: "a dataset cannot hold children".into(),
            }),
        }
    }

    /// Remove the node at `path`. A link at the last segment is removed
    /// itself, not its target.
    pub fn remove_at(&mut self, path: &str) -> Result<Node> {
        let parsed = NodePath::parse(path)?;
        let (parent, name) = split_parent(&parsed, path)?;

        let removed = match resolve_mut(&mut self.root, &parent)? {
            NodeMut::Group(group) => group.remove(&name),
            NodeMut::Dataset(_) => None,
        };
        log::debug!("Removed {}", path);
        removed.ok_or_else(|| NexusError::NotFound(path.to_string()))
    }

    /// Path of the default plottable data: the root `default` attribute names
    /// the entry, the entry `default` names the `NXdata`. Falls back to the
    /// first entry and its first `NXdata`.
    pub fn default_data_path(&self) -> Option<String> {
        let entry_name = self.default_child("/", NxEntry::NX_CLASS)?;
        let entry_path = format!("/{entry_name}");
        let data_name = self.default_child(&entry_path, NxData::NX_CLASS)?;
        Some(format!("{entry_path}/{data_name}"))
    }

    fn default_child(&self, path: &str, nx_class: &str) -> Option<String> {
        let group = self.resolve(path).ok()?.as_group()?;

        let named = group
            .get_attr_string(None, "default")
            .ok()
            .flatten()
            .filter(|name| {
                let child = crate::path::child_path(path, name);
                self.resolve(&child)
                    .ok()
                    .and_then(|n| n.as_group())
                    .map_or(false, |g| g.nx_class() == nx_class)
            });

        named.or_else(|| {
            group
                .groups_of_class(nx_class)
                .next()
                .map(|(name, _)| name.to_string())
        })
    }

    pub fn validate(&self, schema: &SchemaDefinition, options: &ValidationOptions) -> ValidationResult {
        validate_tree(schema, &self.root, options)
    }

    /// NeXus documents under `dir`, recursively, sorted by path.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut files = Vec::new();

        for ext in EXTENSIONS {
            let pattern = format!(
                "{}/**/*.{ext}",
                glob::Pattern::escape(&dir.to_string_lossy())
            );
            let matches = glob::glob(&pattern)
                .map_err(|e| NexusError::Other(format!("Glob error: {e}")))?;
            for entry in matches {
                match entry {
                    Ok(path) => files.push(path),
                    Err(e) => log::warn!("Skipping unreadable path: {e}"),
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

fn split_parent(parsed: &NodePath, raw: &str) -> Result<(NodePath, String)> {
    match (parsed.parent(), parsed.last()) {
        (Some(parent), Some(last)) => Ok((parent, last.name.clone())),
        _ => Err(NexusError::Other(format!("'{raw}' has no parent group"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{NxDetector, NxInstrument, NxSample};
    use crate::node::{DatasetNode, LinkNode};
    use crate::object::NxObjectMut;
    use tempfile::TempDir;

    fn sample_file() -> NexusFile {
        let mut file = NexusFile::new("scan.nxs.yaml").unwrap();

        let mut detector = NxDetector::new();
        detector.set_data(vec![3i64, 5, 8]).unwrap();
        detector.set_distance_scalar(2.5).unwrap();
        detector.set_units("distance", "m").unwrap();
        let mut instrument = NxInstrument::new();
        instrument.set_detector(detector).unwrap();

        let mut data = NxData::new();
        data.add_link("counts", "/entry/instrument/detector/data").unwrap();
        data.set_signal_attr("counts".to_string()).unwrap();

        let mut entry = NxEntry::new();
        entry.set_title("Test scan").unwrap();
        entry.set_instrument(instrument).unwrap();
        entry.set_data(data).unwrap();
        entry.set_sample(NxSample::new()).unwrap();

        file.root_mut().set_entry(entry).unwrap();
        file
    }

    #[test]
    fn test_new_sets_root_attributes() {
        let file = NexusFile::new("run42.nxs.yaml").unwrap();
        let root = file.root();
        assert_eq!(root.file_name_attr().unwrap().as_deref(), Some("run42.nxs.yaml"));
        assert!(root.file_time_attr().unwrap().is_some());
        assert!(root.creator_attr().unwrap().unwrap().starts_with("nexustree "));
        assert_eq!(root.nx_class(), "NXroot");
    }

    #[test]
    fn test_save_and_open_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scan.nxs.yaml");

        let mut file = sample_file();
        file.save_as(&path).unwrap();
        assert_eq!(file.path(), Some(path.as_path()));

        let reopened = NexusFile::open(&path).unwrap();
        assert_eq!(reopened.root_node(), file.root_node());
        assert!(reopened.resolve_attribute("/@file_update_time").is_ok());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("format_version: 1"));
    }

    #[test]
    fn test_save_and_open_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scan.nxs.json");

        let mut file = sample_file();
        file.save_as(&path).unwrap();
        let reopened = NexusFile::open(&path).unwrap();
        assert_eq!(reopened.root_node(), file.root_node());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["root"]["class"], "NXroot");
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut file = NexusFile::new("x.nxs.yaml").unwrap();
        assert!(file.save().is_err());
    }

    #[test]
    fn test_unsupported_format_version() {
        let err = NexusFile::from_str("format_version: 7\nroot:\n  class: NXroot\n", Format::Yaml)
            .unwrap_err();
        assert!(matches!(err, NexusError::Schema(_)));
    }

    #[test]
    fn test_resolve_through_link() {
        let file = sample_file();
        let counts = file.resolve("/entry/data/counts").unwrap();
        assert_eq!(
            counts.as_dataset().unwrap().value().to_i64_vec().unwrap(),
            vec![3, 5, 8]
        );
        let units = file
            .resolve_attribute("/entry/instrument/detector/distance@units")
            .unwrap();
        assert_eq!(units.as_string().unwrap(), "m");
        assert!(file.resolve_attribute("/entry/title").is_err());
    }

    #[test]
    fn test_insert_and_remove_at() {
        let mut file = sample_file();
        file.insert_at("/entry/sample/temperature", DatasetNode::new(4.2).with_units("K"))
            .unwrap();
        assert!(file.resolve("/entry/sample/temperature").is_ok());

        let err = file
            .insert_at("/entry/missing/x", DatasetNode::new(1i64))
            .unwrap_err();
        assert!(matches!(err, NexusError::NotFound(_)));

        // Removing a link leaves its target alone
        file.remove_at("/entry/data/counts").unwrap();
        assert!(file.resolve("/entry/instrument/detector/data").is_ok());
        assert!(file.remove_at("/entry/data/counts").is_err());
        assert!(file.remove_at("/").is_err());
    }

    #[test]
    fn test_insert_under_linked_group() {
        let mut file = sample_file();
        file.insert_at("/entry/det", LinkNode::new("/entry/instrument/detector").unwrap())
            .unwrap();
        file.insert_at("/entry/det/gain", DatasetNode::new(2.0)).unwrap();
        assert!(file.resolve("/entry/instrument/detector/gain").is_ok());
    }

    #[test]
    fn test_contains_at_sees_links() {
        let mut file = sample_file();
        file.insert_at("/entry/dangling", LinkNode::new("/entry/nowhere").unwrap())
            .unwrap();
        assert!(file.contains_at("/entry/dangling").unwrap());
        assert!(file.contains_at("/entry/data/counts").unwrap());
        assert!(file.contains_at("/").unwrap());
        assert!(!file.contains_at("/entry/missing").unwrap());
        assert!(matches!(
            file.contains_at("/nothing/here"),
            Err(NexusError::NotFound(_))
        ));
    }

    #[test]
    fn test_default_data_path() {
        let mut file = sample_file();
        assert_eq!(file.default_data_path().as_deref(), Some("/entry/data"));

        {
            let mut root = file.root_mut();
            let mut entry = root.entry_mut().unwrap();
            entry.put_child("plot", NxData::new()).unwrap();
            entry.set_default_attr("plot".to_string()).unwrap();
        }
        assert_eq!(file.default_data_path().as_deref(), Some("/entry/plot"));

        // A default naming a missing group falls back to the first entry
        file.root_mut()
            .set_default_attr("nothing".to_string())
            .unwrap();
        assert_eq!(file.default_data_path().as_deref(), Some("/entry/plot"));
    }

    #[test]
    fn test_entries() {
        let mut file = sample_file();
        file.root_mut().set_entry_named("entry2", NxEntry::new()).unwrap();
        let names: Vec<&str> = file.entries().keys().copied().collect();
        assert_eq!(names, vec!["entry", "entry2"]);
    }

    #[test]
    fn test_validate_sample_file() {
        let file = sample_file();
        let result = file.validate(&SchemaDefinition::base_classes(), &ValidationOptions::default());
        assert!(result.is_ok(), "Errors: {:?}", result.errors);
    }

    #[test]
    fn test_discover() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("run1")).unwrap();
        sample_file().save_as(tmp.path().join("b.nxs.yaml")).unwrap();
        sample_file().save_as(tmp.path().join("run1/a.nxs.json")).unwrap();
        std::fs::write(tmp.path().join("notes.yaml"), "x: 1").unwrap();

        let found = NexusFile::discover(tmp.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["b.nxs.yaml", "run1/a.nxs.json"]);
    }

    #[test]
    fn test_discover_dir_with_glob_characters() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("run[1]");
        std::fs::create_dir_all(&dir).unwrap();
        sample_file().save_as(dir.join("a.nxs.yaml")).unwrap();

        let found = NexusFile::discover(&dir).unwrap();
        assert_eq!(found, vec![dir.join("a.nxs.yaml")]);
    }

    #[test]
    fn test_load_rejects_names_the_tree_forbids() {
        let bad_name = r#"
format_version: 1
root:
  class: NXroot
  children:
    "a/b":
      kind: dataset
      value:
        int: [1]
"#;
        let err = NexusFile::from_str(bad_name, Format::Yaml).unwrap_err();
        assert!(matches!(err, NexusError::InvalidName { .. }));

        let relative_link = r#"{
  "format_version": 1,
  "root": {
    "class": "NXroot",
    "children": { "data": { "kind": "link", "target": "entry/data" } }
  }
}"#;
        let err = NexusFile::from_str(relative_link, Format::Json).unwrap_err();
        assert!(matches!(err, NexusError::Link(_)));
    }

    #[test]
    fn test_load_rejects_overflowing_shape() {
        let doc = r#"
format_version: 1
root:
  class: NXroot
  children:
    big:
      kind: dataset
      value:
        shape: [4294967296, 4294967296]
        int: []
"#;
        assert!(NexusFile::from_str(doc, Format::Yaml).is_err());
    }
}
