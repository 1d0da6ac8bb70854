use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Class definitions keyed by NeXus class name (`NXentry`, `NXsample`, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub classes: HashMap<String, ClassDefinition>,
}

impl SchemaDefinition {
    /// The registry of every base class shipped with the crate.
    pub fn base_classes() -> Self {
        let classes = crate::classes::base_class_definitions()
            .into_iter()
            .collect();
        SchemaDefinition { classes }
    }

    pub fn get_class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(name)
    }

    /// Add the classes of `other`, replacing same-named definitions.
    pub fn merge(&mut self, other: SchemaDefinition) {
        for (name, class) in other.classes {
            if self.classes.insert(name.clone(), class).is_some() {
                log::debug!("Class definition '{name}' overridden");
            }
        }
    }

    /// Class names in sorted order.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn default_true() -> bool {
    true
}

/// Definition of one group class: its fields, group attributes, and child groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDefinition>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDefinition>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupDefinition>,
    #[serde(default = "default_true")]
    pub additional_properties: bool,
    #[serde(default)]
    pub strict: bool,
}

impl Default for ClassDefinition {
    fn default() -> Self {
        ClassDefinition {
            doc: None,
            fields: BTreeMap::new(),
            attributes: BTreeMap::new(),
            groups: BTreeMap::new(),
            additional_properties: true,
            strict: false,
        }
    }
}

impl ClassDefinition {
    /// Whether a child group of `nx_class` is declared under any name.
    pub fn permits_group_class(&self, nx_class: &str) -> bool {
        self.groups.values().any(|g| g.nx_class == nx_class)
    }

    /// The declaration covering a child group: by exact name first, then by class.
    pub fn group_for(&self, name: &str, nx_class: &str) -> Option<&GroupDefinition> {
        match self.groups.get(name) {
            Some(def) if def.nx_class == nx_class => Some(def),
            _ => self.groups.values().find(|g| g.nx_class == nx_class),
        }
    }
}

/// Definition of a single field (dataset) in a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        FieldDefinition {
            field_type,
            required: false,
            units: None,
            enum_values: None,
        }
    }

    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Definition of an attribute on a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    #[serde(rename = "type")]
    pub attr_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl AttributeDefinition {
    pub fn new(attr_type: FieldType) -> Self {
        AttributeDefinition {
            attr_type,
            required: false,
            enum_values: None,
        }
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }
}

/// Definition of a child group slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDefinition {
    #[serde(rename = "type")]
    pub nx_class: String,
    #[serde(default)]
    pub required: bool,
}

impl GroupDefinition {
    pub fn new(nx_class: &str) -> Self {
        GroupDefinition {
            nx_class: nx_class.to_string(),
            required: false,
        }
    }
}

/// NXDL primitive type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "NX_CHAR")]
    NxChar,
    #[serde(rename = "NX_FLOAT")]
    NxFloat,
    #[serde(rename = "NX_INT")]
    NxInt,
    #[serde(rename = "NX_POSINT")]
    NxPosint,
    #[serde(rename = "NX_NUMBER")]
    NxNumber,
    #[serde(rename = "NX_BOOLEAN")]
    NxBoolean,
    #[serde(rename = "NX_DATE_TIME")]
    NxDateTime,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::NxChar => "NX_CHAR",
            FieldType::NxFloat => "NX_FLOAT",
            FieldType::NxInt => "NX_INT",
            FieldType::NxPosint => "NX_POSINT",
            FieldType::NxNumber => "NX_NUMBER",
            FieldType::NxBoolean => "NX_BOOLEAN",
            FieldType::NxDateTime => "NX_DATE_TIME",
        };
        f.write_str(name)
    }
}
