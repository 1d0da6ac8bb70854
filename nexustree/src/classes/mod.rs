// Typed wrappers for the NeXus base classes

#[macro_use]
mod macros;
mod base_classes;

pub use base_classes::*;

use crate::node::{DatasetNode, GroupNode};
use crate::object::NxObject;
use crate::schema::ClassDefinition;
use std::borrow::Borrow;

/// Definitions of every shipped base class, keyed by NeXus class name.
pub fn base_class_definitions() -> Vec<(String, ClassDefinition)> {
    vec![
        (NxRoot::NX_CLASS.to_string(), NxRoot::class_definition()),
        (NxEntry::NX_CLASS.to_string(), NxEntry::class_definition()),
        (NxInstrument::NX_CLASS.to_string(), NxInstrument::class_definition()),
        (NxSource::NX_CLASS.to_string(), NxSource::class_definition()),
        (NxMonochromator::NX_CLASS.to_string(), NxMonochromator::class_definition()),
        (NxDetector::NX_CLASS.to_string(), NxDetector::class_definition()),
        (NxSample::NX_CLASS.to_string(), NxSample::class_definition()),
        (NxBeam::NX_CLASS.to_string(), NxBeam::class_definition()),
        (NxData::NX_CLASS.to_string(), NxData::class_definition()),
        (NxMonitor::NX_CLASS.to_string(), NxMonitor::class_definition()),
        (NxUser::NX_CLASS.to_string(), NxUser::class_definition()),
        (NxNote::NX_CLASS.to_string(), NxNote::class_definition()),
        (NxPositioner::NX_CLASS.to_string(), NxPositioner::class_definition()),
        (NxProcess::NX_CLASS.to_string(), NxProcess::class_definition()),
        (NxTransformations::NX_CLASS.to_string(), NxTransformations::class_definition()),
        (NxCollection::NX_CLASS.to_string(), NxCollection::class_definition()),
    ]
}

impl<G: Borrow<GroupNode>> NxData<G> {
    /// Name of the plottable signal field. Falls back to the older convention
    /// of a field carrying `signal=1`.
    pub fn signal_name(&self) -> Option<String> {
        if let Ok(Some(name)) = self.signal_attr() {
            return Some(name);
        }
        self.node()
            .datasets()
            .find(|(_, dataset)| {
                dataset
                    .attribute("signal")
                    .and_then(|v| v.as_i64().ok())
                    .map_or(false, |n| n == 1)
            })
            .map(|(name, _)| name.to_string())
    }

    pub fn signal_dataset(&self) -> Option<&DatasetNode> {
        let name = self.signal_name()?;
        self.get_dataset(&name)
    }

    /// Axis fields named by the `axes` attribute, in order. `.` placeholders
    /// and names without a dataset are skipped.
    pub fn axis_datasets(&self) -> Vec<(String, &DatasetNode)> {
        let Some(axes) = self.get_attr(None, "axes") else {
            return Vec::new();
        };

        axes.to_string_vec()
            .iter()
            .flat_map(|entry| entry.split([':', ',']))
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != ".")
            .filter_map(|name| Some((name.to_string(), self.get_dataset(name)?)))
            .collect()
    }
}
