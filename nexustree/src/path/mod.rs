// Node paths - parsing, rendering, name rules

use crate::error::{NexusError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Characters with a meaning in path syntax, never allowed inside a name.
const RESERVED: [char; 3] = ['/', '@', ':'];

/// Hard naming rules enforced on every insert.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty".to_string())
    } else if name == "." || name == ".." {
        Some("'.' and '..' are reserved".to_string())
    } else {
        name.chars()
            .find(|c| RESERVED.contains(c))
            .map(|c| format!("contains reserved character '{c}'"))
    };

    match reason {
        Some(reason) => Err(NexusError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// The NeXus recommended naming pattern. Other names are legal but discouraged.
pub fn is_recommended_name(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]([a-zA-Z0-9_.]*[a-zA-Z0-9_])?$").ok())
        .as_ref()
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// One step of a path: a child name with an optional class filter (`entry:NXentry`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub nx_class: Option<String>,
}

impl PathSegment {
    pub fn new(name: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(PathSegment {
            name: name.to_string(),
            nx_class: None,
        })
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw.split_once(':') {
            Some((name, class)) => {
                validate_name(name)?;
                validate_name(class).map_err(|_| NexusError::InvalidName {
                    name: raw.to_string(),
                    reason: "class filter after ':' is not a valid class name".into(),
                })?;
                Ok(PathSegment {
                    name: name.to_string(),
                    nx_class: Some(class.to_string()),
                })
            }
            None => PathSegment::new(raw),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nx_class {
            Some(class) => write!(f, "{}:{}", self.name, class),
            None => f.write_str(&self.name),
        }
    }
}

/// A parsed node path such as `/entry:NXentry/data/signal@units`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    absolute: bool,
    segments: Vec<PathSegment>,
    attribute: Option<String>,
}

impl NodePath {
    pub fn root() -> Self {
        NodePath {
            absolute: true,
            segments: Vec::new(),
            attribute: None,
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let (node_part, attribute) = match input.split_once('@') {
            Some((node, attr)) => {
                validate_name(attr)?;
                (node, Some(attr.to_string()))
            }
            None => (input, None),
        };

        let absolute = node_part.starts_with('/');
        let segments = node_part
            .split('/')
            .filter(|s| !s.is_empty())
            .map(PathSegment::parse)
            .collect::<Result<Vec<_>>>()?;

        Ok(NodePath {
            absolute,
            segments,
            attribute,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.absolute {
            out.push('/');
        }
        let joined: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        out.push_str(&joined.join("/"));
        if let Some(attr) = &self.attribute {
            out.push('@');
            out.push_str(attr);
        }
        out
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// The root group itself (`/`).
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The containing group's path, with any attribute dropped.
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(NodePath {
            absolute: self.absolute,
            segments: self.segments[..self.segments.len() - 1].to_vec(),
            attribute: None,
        })
    }

    pub fn join(&self, name: &str) -> Result<NodePath> {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::parse(name)?);
        Ok(NodePath {
            absolute: self.absolute,
            segments,
            attribute: None,
        })
    }

    pub fn without_attribute(&self) -> NodePath {
        NodePath {
            absolute: self.absolute,
            segments: self.segments.clone(),
            attribute: None,
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for NodePath {
    type Err = NexusError;

    fn from_str(s: &str) -> Result<Self> {
        NodePath::parse(s)
    }
}

/// Join an absolute parent path string and a child name.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("temperature").is_ok());
        assert!(validate_name("data.1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("x@y").is_err());
        assert!(validate_name("entry:NXentry").is_err());
    }

    #[test]
    fn test_recommended_names() {
        assert!(is_recommended_name("sample_x"));
        assert!(is_recommended_name("a.b"));
        assert!(is_recommended_name("_"));
        assert!(!is_recommended_name("two words"));
        assert!(!is_recommended_name("trailing."));
        assert!(!is_recommended_name("Temp(K)"));
    }

    #[test]
    fn test_parse_absolute_path() {
        let path = NodePath::parse("/entry/instrument/detector/data").unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.segments().len(), 4);
        assert_eq!(path.last().unwrap().name, "data");
        assert_eq!(path.attribute(), None);
    }

    #[test]
    fn test_parse_class_filter_and_attribute() {
        let path = NodePath::parse("/entry:NXentry/data:NXdata/counts@units").unwrap();
        assert_eq!(path.segments()[0].nx_class.as_deref(), Some("NXentry"));
        assert_eq!(path.segments()[2].nx_class, None);
        assert_eq!(path.attribute(), Some("units"));
        assert_eq!(path.render(), "/entry:NXentry/data:NXdata/counts@units");
    }

    #[test]
    fn test_root_attribute() {
        let path = NodePath::parse("/@default").unwrap();
        assert!(path.is_root());
        assert_eq!(path.attribute(), Some("default"));
    }

    #[test]
    fn test_relative_path_and_parent() {
        let path: NodePath = "sample/temperature".parse().unwrap();
        assert!(!path.is_absolute());
        assert_eq!(path.parent().unwrap().render(), "sample");
        assert_eq!(NodePath::root().parent(), None);
    }

    #[test]
    fn test_join() {
        let path = NodePath::parse("/entry").unwrap().join("sample").unwrap();
        assert_eq!(path.render(), "/entry/sample");
        assert!(NodePath::root().join("bad/name").is_err());
    }

    #[test]
    fn test_rejects_bad_segments() {
        assert!(NodePath::parse("/entry/../x").is_err());
        assert!(NodePath::parse("/entry:").is_err());
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("/", "entry"), "/entry");
        assert_eq!(child_path("/entry", "data"), "/entry/data");
    }
}
