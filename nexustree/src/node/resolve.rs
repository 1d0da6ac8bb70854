// Path lookup from the root group, following links

use super::{DatasetNode, GroupNode, Node};
use crate::error::{NexusError, Result};
use crate::path::{NodePath, PathSegment};

/// Links followed while resolving one path before it is reported as a cycle.
pub const MAX_LINK_HOPS: usize = 32;

/// A resolved node. Links never appear here, they are followed.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Group(&'a GroupNode),
    Dataset(&'a DatasetNode),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            NodeRef::Group(_) => "group",
            NodeRef::Dataset(_) => "dataset",
        }
    }

    pub fn as_group(&self) -> Option<&'a GroupNode> {
        match *self {
            NodeRef::Group(g) => Some(g),
            NodeRef::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&'a DatasetNode> {
        match *self {
            NodeRef::Dataset(d) => Some(d),
            NodeRef::Group(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum NodeMut<'a> {
    Group(&'a mut GroupNode),
    Dataset(&'a mut DatasetNode),
}

fn not_found(names: &[String], name: &str) -> NexusError {
    let mut path = String::new();
    for n in names {
        path.push('/');
        path.push_str(n);
    }
    path.push('/');
    path.push_str(name);
    NexusError::NotFound(path)
}

/// Walk link-free child names from `root`.
fn lookup<'a>(root: &'a GroupNode, names: &[String]) -> Result<NodeRef<'a>> {
    let mut current = NodeRef::Group(root);
    for (depth, name) in names.iter().enumerate() {
        let group = current
            .as_group()
            .ok_or_else(|| not_found(&names[..depth], name))?;
        current = match group.child(name) {
            Some(Node::Group(g)) => NodeRef::Group(g),
            Some(Node::Dataset(d)) => NodeRef::Dataset(d),
            Some(Node::Link(_)) | None => return Err(not_found(&names[..depth], name)),
        };
    }
    Ok(current)
}

fn lookup_mut<'a>(root: &'a mut GroupNode, names: &[String]) -> Result<NodeMut<'a>> {
    let Some((last, parents)) = names.split_last() else {
        return Ok(NodeMut::Group(root));
    };
    let mut current = root;
    for (depth, name) in parents.iter().enumerate() {
        current = current
            .group_mut(name)
            .ok_or_else(|| not_found(&names[..depth], name))?;
    }
    match current.child_mut(last) {
        Some(Node::Group(g)) => Ok(NodeMut::Group(g)),
        Some(Node::Dataset(d)) => Ok(NodeMut::Dataset(d)),
        Some(Node::Link(_)) | None => Err(not_found(parents, last)),
    }
}

fn physical_names(
    root: &GroupNode,
    segments: &[PathSegment],
    hops: &mut usize,
) -> Result<Vec<String>> {
    let mut resolved: Vec<String> = Vec::new();

    for segment in segments {
        let parent = lookup(root, &resolved)?;
        let group = parent
            .as_group()
            .ok_or_else(|| not_found(&resolved, &segment.name))?;

        match group.child(&segment.name) {
            None => return Err(not_found(&resolved, &segment.name)),
            Some(Node::Link(link)) => {
                *hops += 1;
                if *hops > MAX_LINK_HOPS {
                    return Err(NexusError::Link(format!(
                        "more than {MAX_LINK_HOPS} links followed at '{}', cycle suspected",
                        link.target()
                    )));
                }
                let target = NodePath::parse(link.target())?;
                resolved = physical_names(root, target.segments(), hops)?;
            }
            Some(_) => resolved.push(segment.name.clone()),
        }

        if let Some(class) = &segment.nx_class {
            match lookup(root, &resolved)? {
                NodeRef::Group(g) if g.nx_class() == class => {}
                _ => return Err(NexusError::NotFound(format!("{segment} (class filter)"))),
            }
        }
    }

    Ok(resolved)
}

/// The link-free location of `path`, as child names from the root.
pub fn canonical_names(root: &GroupNode, path: &NodePath) -> Result<Vec<String>> {
    let mut hops = 0;
    physical_names(root, path.segments(), &mut hops)
}

/// Resolve `path` against `root`. Relative paths are taken from the root.
/// Any attribute part of the path is ignored.
pub fn resolve<'a>(root: &'a GroupNode, path: &NodePath) -> Result<NodeRef<'a>> {
    let names = canonical_names(root, path)?;
    lookup(root, &names)
}

pub fn resolve_mut<'a>(root: &'a mut GroupNode, path: &NodePath) -> Result<NodeMut<'a>> {
    let names = canonical_names(root, path)?;
    lookup_mut(root, &names)
}
