use super::types::SchemaDefinition;
use crate::error::{NexusError, Result};
use std::path::Path;

/// Parse a class definition YAML file into a SchemaDefinition
pub fn parse_schema(path: &Path) -> Result<SchemaDefinition> {
    let content = std::fs::read_to_string(path)?;
    parse_schema_str(&content)
}

/// Parse a class definition YAML string into a SchemaDefinition
pub fn parse_schema_str(content: &str) -> Result<SchemaDefinition> {
    let schema: SchemaDefinition = serde_yaml::from_str(content)?;
    schema.check()?;
    log::debug!("Parsed schema with {} class definitions", schema.classes.len());
    Ok(schema)
}

impl SchemaDefinition {
    /// Reject definitions that name a child group without a class.
    fn check(&self) -> Result<()> {
        for (class_name, class) in &self.classes {
            for (group_name, group) in &class.groups {
                if group.nx_class.trim().is_empty() {
                    return Err(NexusError::Schema(format!(
                        "Group '{group_name}' in class '{class_name}' has an empty type"
                    )));
                }
            }
        }
        Ok(())
    }
}
