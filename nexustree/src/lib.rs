pub mod value;
pub mod path;
pub mod node;
pub mod schema;
pub mod object;
pub mod classes;
pub mod validation;
pub mod file;
pub mod error;

pub use error::{NexusError, Result};
pub use value::{Elements, NxType, Value};
pub use node::{DatasetNode, GroupNode, LinkNode, Node};
pub use object::{BaseClass, NxObject, NxObjectMut};
pub use schema::SchemaDefinition;
pub use validation::{ValidationOptions, ValidationResult};
pub use file::{Format, NexusFile};

#[doc(hidden)]
pub use paste;
