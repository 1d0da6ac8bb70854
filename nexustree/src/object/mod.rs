// Name-keyed accessors shared by every group wrapper

use crate::error::{NexusError, Result};
use crate::node::{DatasetNode, GroupNode, LinkNode, Node, UNITS_ATTR};
use crate::value::{NxBoolean, NxChar, NxDateTime, NxFloat, NxInt, NxType, Value};
use chrono::{DateTime, FixedOffset};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Ties a typed wrapper to its NeXus class. `G` is the storage the wrapper
/// holds: an owned [`GroupNode`] or a shared or exclusive borrow of one.
pub trait BaseClass<G>: Sized {
    const NX_CLASS: &'static str;

    fn wrap(group: G) -> Self;

    fn into_inner(self) -> G;

    /// Wrap `group` only if its class matches.
    fn try_wrap(group: G) -> Result<Self>
    where
        G: Borrow<GroupNode>,
    {
        let found = <G as Borrow<GroupNode>>::borrow(&group).nx_class();
        if found != Self::NX_CLASS {
            return Err(NexusError::mismatch(Self::NX_CLASS, found));
        }
        Ok(Self::wrap(group))
    }
}

fn conflict(name: &str, existing: &Node, wanted: &str) -> NexusError {
    NexusError::NameConflict {
        name: name.to_string(),
        reason: format!("a {} already has this name, cannot store a {wanted}", existing.kind()),
    }
}

/// Read access to a group by child name.
pub trait NxObject {
    fn node(&self) -> &GroupNode;

    fn nx_class(&self) -> &str {
        self.node().nx_class()
    }

    fn get_dataset(&self, name: &str) -> Option<&DatasetNode> {
        self.node().dataset(name)
    }

    fn get_value(&self, name: &str) -> Option<&Value> {
        self.get_dataset(name).map(DatasetNode::value)
    }

    /// `Ok(None)` when the field is absent, an error when it cannot be coerced.
    fn get_scalar<T: NxType>(&self, name: &str) -> Result<Option<T::Native>> {
        self.get_value(name).map(T::extract).transpose()
    }

    fn get_string(&self, name: &str) -> Result<Option<String>> {
        self.get_scalar::<NxChar>(name)
    }

    fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        self.get_scalar::<NxBoolean>(name)
    }

    fn get_i64(&self, name: &str) -> Result<Option<i64>> {
        self.get_scalar::<NxInt>(name)
    }

    fn get_f64(&self, name: &str) -> Result<Option<f64>> {
        self.get_scalar::<NxFloat>(name)
    }

    fn get_datetime(&self, name: &str) -> Result<Option<DateTime<FixedOffset>>> {
        self.get_scalar::<NxDateTime>(name)
    }

    /// Attribute `attr` of the field `dataset`, or of the group itself when
    /// `dataset` is `None`.
    fn get_attr(&self, dataset: Option<&str>, attr: &str) -> Option<&Value> {
        match dataset {
            None => self.node().attribute(attr),
            Some(name) => self.get_dataset(name)?.attribute(attr),
        }
    }

    fn get_attr_scalar<T: NxType>(
        &self,
        dataset: Option<&str>,
        attr: &str,
    ) -> Result<Option<T::Native>> {
        self.get_attr(dataset, attr).map(T::extract).transpose()
    }

    fn get_attr_string(&self, dataset: Option<&str>, attr: &str) -> Result<Option<String>> {
        self.get_attr_scalar::<NxChar>(dataset, attr)
    }

    fn get_units(&self, field: &str) -> Option<String> {
        self.get_dataset(field)?.units()
    }

    fn get_group(&self, name: &str) -> Option<&GroupNode> {
        self.node().group(name)
    }

    /// The child group `name`, if present and of class `T::NX_CLASS`.
    fn get_child<'a, T: BaseClass<&'a GroupNode>>(&'a self, name: &str) -> Option<T> {
        let group = self.node().group(name)?;
        if group.nx_class() != T::NX_CLASS {
            log::debug!(
                "Child '{}' is {}, not {}",
                name,
                group.nx_class(),
                T::NX_CLASS
            );
            return None;
        }
        Some(T::wrap(group))
    }

    /// Every child group of class `T::NX_CLASS`, keyed by name.
    fn get_children<'a, T: BaseClass<&'a GroupNode>>(&'a self) -> BTreeMap<&'a str, T> {
        self.node()
            .groups_of_class(T::NX_CLASS)
            .map(|(name, group)| (name, T::wrap(group)))
            .collect()
    }

    fn count_children_of_class(&self, nx_class: &str) -> usize {
        self.node().groups_of_class(nx_class).count()
    }
}

/// Write access to a group by child name.
pub trait NxObjectMut: NxObject {
    fn node_mut(&mut self) -> &mut GroupNode;

    /// Create the field, or replace its value and keep its attributes.
    fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut DatasetNode> {
        let group = self.node_mut();
        let value = value.into();
        match group.child_mut(name) {
            Some(Node::Dataset(dataset)) => dataset.set_value(value),
            Some(other) => return Err(conflict(name, other, "dataset")),
            None => {
                group.insert(name, DatasetNode::new(value))?;
            }
        }
        group
            .dataset_mut(name)
            .ok_or_else(|| NexusError::NotFound(name.to_string()))
    }

    fn set_scalar<T: NxType>(&mut self, name: &str, native: T::Native) -> Result<&mut DatasetNode> {
        self.set_value(name, T::into_value(native))
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<&mut DatasetNode> {
        self.set_value(name, value)
    }

    fn set_bool(&mut self, name: &str, value: bool) -> Result<&mut DatasetNode> {
        self.set_value(name, value)
    }

    fn set_i64(&mut self, name: &str, value: i64) -> Result<&mut DatasetNode> {
        self.set_value(name, value)
    }

    fn set_f64(&mut self, name: &str, value: f64) -> Result<&mut DatasetNode> {
        self.set_value(name, value)
    }

    fn set_datetime(
        &mut self,
        name: &str,
        value: DateTime<FixedOffset>,
    ) -> Result<&mut DatasetNode> {
        self.set_scalar::<NxDateTime>(name, value)
    }

    /// Set attribute `attr` on the field `dataset`, or on the group when
    /// `dataset` is `None`. The field must already exist.
    fn set_attr(&mut self, dataset: Option<&str>, attr: &str, value: impl Into<Value>) -> Result<()> {
        let group = self.node_mut();
        match dataset {
            None => group.set_attribute(attr, value),
            Some(name) => group
                .dataset_mut(name)
                .ok_or_else(|| NexusError::NotFound(name.to_string()))?
                .set_attribute(attr, value),
        }
    }

    fn set_units(&mut self, field: &str, units: &str) -> Result<()> {
        self.set_attr(Some(field), UNITS_ATTR, units)
    }

    fn get_child_mut<'a, T: BaseClass<&'a mut GroupNode>>(&'a mut self, name: &str) -> Option<T> {
        let group = self.node_mut().group_mut(name)?;
        if group.nx_class() != T::NX_CLASS {
            return None;
        }
        Some(T::wrap(group))
    }

    /// Store `child` under `name`, replacing a group of the same name.
    fn put_child<T: BaseClass<GroupNode>>(&mut self, name: &str, child: T) -> Result<()> {
        let group = self.node_mut();
        if let Some(existing) = group.child(name) {
            if existing.as_group().is_none() {
                return Err(conflict(name, existing, "group"));
            }
        }
        group.insert(name, child.into_inner())?;
        Ok(())
    }

    fn set_children<T, I>(&mut self, children: I) -> Result<()>
    where
        T: BaseClass<GroupNode>,
        I: IntoIterator<Item = (String, T)>,
    {
        for (name, child) in children {
            self.put_child(&name, child)?;
        }
        Ok(())
    }

    fn remove_child(&mut self, name: &str) -> Option<Node> {
        self.node_mut().remove(name)
    }

    fn add_link(&mut self, name: &str, target: &str) -> Result<()> {
        let link = LinkNode::new(target)?;
        self.node_mut().insert(name, link)?;
        Ok(())
    }
}

impl NxObject for GroupNode {
    fn node(&self) -> &GroupNode {
        self
    }
}

impl NxObjectMut for GroupNode {
    fn node_mut(&mut self) -> &mut GroupNode {
        self
    }
}
