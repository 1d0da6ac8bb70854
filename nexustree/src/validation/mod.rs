use crate::error::{NexusError, Result};
use crate::node::{resolve, GroupNode, Node, NodeRef};
use crate::path::{child_path, is_recommended_name, NodePath};
use crate::schema::{ClassDefinition, FieldType, SchemaDefinition};
use crate::value::{Elements, Value};

/// Validation settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Report every issue as an error, whatever the class definition says.
    pub strict: bool,
}

/// Result of validating a tree
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validate every group under `root` against the class definitions in `schema`.
/// An issue is an error when the class is strict or `options.strict` is set,
/// and a warning otherwise. Broken links are always errors.
pub fn validate_tree(
    schema: &SchemaDefinition,
    root: &GroupNode,
    options: &ValidationOptions,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_group(schema, root, "/", root, options, &mut result);
    for (path, node) in root.walk() {
        match node {
            Node::Group(group) => validate_group(schema, root, &path, group, options, &mut result),
            Node::Link(link) => check_link(root, &path, link.target(), &mut result),
            Node::Dataset(_) => {}
        }
    }

    log::debug!(
        "Validated tree: {} errors, {} warnings",
        result.errors.len(),
        result.warnings.len()
    );
    result
}

/// Naming-rule warnings for the children of `group` and for the attributes of
/// the group and of its datasets.
fn check_names(path: &str, group: &GroupNode, result: &mut ValidationResult) {
    let mut warn = |at: String| {
        result
            .warnings
            .push(format!("{at}: name does not follow the NeXus naming rules"));
    };

    for name in group.attributes().keys() {
        if !is_recommended_name(name) {
            warn(format!("{path}@{name}"));
        }
    }
    for (name, node) in group.children() {
        let at = child_path(path, name);
        if let Node::Dataset(dataset) = node {
            for attr in dataset.attributes().keys() {
                if !is_recommended_name(attr) {
                    warn(format!("{at}@{attr}"));
                }
            }
        }
        if !is_recommended_name(name) {
            warn(at);
        }
    }
}

fn validate_group(
    schema: &SchemaDefinition,
    root: &GroupNode,
    path: &str,
    group: &GroupNode,
    options: &ValidationOptions,
    result: &mut ValidationResult,
) {
    check_names(path, group, result);

    let Some(class) = schema.get_class(group.nx_class()) else {
        add_issue(
            result,
            options.strict,
            format!("{path}: unknown class '{}'", group.nx_class()),
        );
        return;
    };
    let strict = class.strict || options.strict;

    check_required(root, path, group, class, strict, result);

    for (name, attr_def) in &class.attributes {
        if let Some(value) = group.attribute(name) {
            let at = format!("{path}@{name}");
            check_value(&at, value, attr_def.attr_type, attr_def.enum_values.as_deref(), strict, result);
        }
    }

    for (name, node) in group.children() {
        let at = child_path(path, name);
        match node {
            Node::Dataset(dataset) => match class.fields.get(name) {
                Some(field_def) => {
                    check_value(
                        &at,
                        dataset.value(),
                        field_def.field_type,
                        field_def.enum_values.as_deref(),
                        strict,
                        result,
                    );
                    if field_def.units.is_some() && dataset.units().is_none() {
                        result.warnings.push(format!(
                            "{at}: no units given, expected {}",
                            field_def.units.as_deref().unwrap_or_default()
                        ));
                    }
                }
                None if !class.additional_properties => add_issue(
                    result,
                    strict,
                    format!("{at}: field is not declared in {}", group.nx_class()),
                ),
                None => {}
            },
            Node::Group(child) => {
                if !class.additional_properties && class.group_for(name, child.nx_class()).is_none() {
                    add_issue(
                        result,
                        strict,
                        format!(
                            "{at}: {} group is not allowed in {}",
                            child.nx_class(),
                            group.nx_class()
                        ),
                    );
                }
            }
            Node::Link(_) => {
                let declared = class.fields.contains_key(name) || class.groups.contains_key(name);
                if !class.additional_properties && !declared {
                    add_issue(
                        result,
                        strict,
                        format!("{at}: link is not declared in {}", group.nx_class()),
                    );
                }
            }
        }
    }
}

fn check_required(
    root: &GroupNode,
    path: &str,
    group: &GroupNode,
    class: &ClassDefinition,
    strict: bool,
    result: &mut ValidationResult,
) {
    for (name, field_def) in &class.fields {
        if field_def.required && resolve_child(root, path, group, name).and_then(|n| n.as_dataset()).is_none() {
            add_issue(result, strict, format!("{path}: required field '{name}' is missing"));
        }
    }

    for (name, group_def) in &class.groups {
        if !group_def.required {
            continue;
        }
        let by_class = group.groups_of_class(&group_def.nx_class).next().is_some();
        let by_link = resolve_child(root, path, group, name)
            .and_then(|n| n.as_group())
            .map_or(false, |g| g.nx_class() == group_def.nx_class);
        if !by_class && !by_link {
            add_issue(
                result,
                strict,
                format!(
                    "{path}: required {} group '{name}' is missing",
                    group_def.nx_class
                ),
            );
        }
    }

    for (name, attr_def) in &class.attributes {
        if attr_def.required && group.attribute(name).is_none() {
            add_issue(result, strict, format!("{path}: required attribute '{name}' is missing"));
        }
    }
}

/// A direct child, with a link in its place followed.
fn resolve_child<'a>(
    root: &'a GroupNode,
    path: &str,
    group: &'a GroupNode,
    name: &str,
) -> Option<NodeRef<'a>> {
    match group.child(name)? {
        Node::Group(g) => Some(NodeRef::Group(g)),
        Node::Dataset(d) => Some(NodeRef::Dataset(d)),
        Node::Link(_) => {
            let at = NodePath::parse(&child_path(path, name)).ok()?;
            resolve(root, &at).ok()
        }
    }
}

fn check_value(
    at: &str,
    value: &Value,
    field_type: FieldType,
    enum_values: Option<&[String]>,
    strict: bool,
    result: &mut ValidationResult,
) {
    if !field_type.accepts(value) {
        add_issue(
            result,
            strict,
            format!("{at}: expected {field_type}, found {}", describe(value)),
        );
        return;
    }

    if let Some(allowed) = enum_values {
        for element in value.elements().iter() {
            let text = element.to_string();
            if !allowed.contains(&text) {
                add_issue(
                    result,
                    strict,
                    format!("{at}: value '{text}' is not in enum: {allowed:?}"),
                );
            }
        }
    }
}

fn check_link(root: &GroupNode, path: &str, target: &str, result: &mut ValidationResult) {
    let outcome = NodePath::parse(target).and_then(|p| resolve(root, &p));
    match outcome {
        Ok(_) => {}
        Err(NexusError::Link(reason)) => {
            result.errors.push(format!("{path}: link to '{target}' is cyclic ({reason})"))
        }
        Err(_) => result
            .errors
            .push(format!("{path}: link target '{target}' does not exist")),
    }
}

fn add_issue(result: &mut ValidationResult, strict: bool, message: String) {
    if strict {
        result.errors.push(message);
    } else {
        result.warnings.push(message);
    }
}

fn describe(value: &Value) -> String {
    let kind = match value.elements() {
        Elements::Bool(_) => "boolean",
        Elements::Int(_) => "integer",
        Elements::Float(_) => "float",
        Elements::String(_) => "string",
    };
    if value.is_scalar() {
        format!("{kind} '{value}'")
    } else {
        format!("{kind} array {:?}", value.shape())
    }
}

/// Validate and fail on errors. Returns the warnings otherwise.
pub fn validate_and_report(
    schema: &SchemaDefinition,
    root: &GroupNode,
    options: &ValidationOptions,
) -> Result<Vec<String>> {
    let result = validate_tree(schema, root, options);

    if !result.is_ok() {
        return Err(NexusError::Validation(format!(
            "Tree validation failed:\n  - {}",
            result.errors.join("\n  - ")
        )));
    }

    Ok(result.warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{NxData, NxEntry, NxRoot, NxSample, NxSource};
    use crate::node::LinkNode;
    use crate::object::{BaseClass, NxObjectMut};
    use crate::schema::parse_schema_str;

    fn scan_schema() -> SchemaDefinition {
        let mut schema = SchemaDefinition::base_classes();
        schema.merge(
            parse_schema_str(
                r#"
classes:
  NXentry:
    strict: true
    fields:
      title: { type: NX_CHAR, required: true }
      definition: { type: NX_CHAR, required: true, enum: [NXscan] }
      start_time: { type: NX_DATE_TIME }
    groups:
      data: { type: NXdata, required: true }
      sample: { type: NXsample }
    additional_properties: false
"#,
            )
            .unwrap(),
        );
        schema
    }

    fn valid_root() -> GroupNode {
        let mut entry = NxEntry::new();
        entry.set_title("Powder scan").unwrap();
        entry.set_definition("NXscan").unwrap();
        entry.set_start_time("2024-01-10T08:00:00Z").unwrap();
        entry.set_data(NxData::new()).unwrap();
        let mut root = NxRoot::new();
        root.set_entry(entry).unwrap();
        root.into_inner()
    }

    #[test]
    fn test_valid_tree() {
        let result = validate_tree(&scan_schema(), &valid_root(), &ValidationOptions::default());
        assert!(result.is_ok(), "Errors: {:?}", result.errors);
        assert!(!result.has_warnings(), "Warnings: {:?}", result.warnings);
    }

    #[test]
    fn test_missing_required_field_and_group() {
        let mut root = valid_root();
        let entry = root.group_mut("entry").unwrap();
        entry.remove("title");
        entry.remove("data");

        let result = validate_tree(&scan_schema(), &root, &ValidationOptions::default());
        assert!(result.errors.iter().any(|e| e == "/entry: required field 'title' is missing"));
        assert!(result.errors.iter().any(|e| e.contains("required NXdata group 'data'")));
    }

    #[test]
    fn test_required_group_found_under_other_name() {
        let mut root = valid_root();
        let entry = root.group_mut("entry").unwrap();
        let data = entry.remove("data").unwrap();
        entry.insert("plot", data).unwrap();

        let result = validate_tree(&scan_schema(), &root, &ValidationOptions::default());
        assert!(result.is_ok(), "Errors: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_enum_value() {
        let mut root = valid_root();
        root.group_mut("entry")
            .unwrap()
            .set_string("definition", "NXtomo")
            .unwrap();

        let result = validate_tree(&scan_schema(), &root, &ValidationOptions::default());
        assert!(result.errors.iter().any(|e| e.contains("NXtomo")));
    }

    #[test]
    fn test_type_mismatch() {
        let mut root = valid_root();
        root.group_mut("entry")
            .unwrap()
            .set_i64("title", 42)
            .unwrap();

        let result = validate_tree(&scan_schema(), &root, &ValidationOptions::default());
        assert!(result
            .errors
            .iter()
            .any(|e| e == "/entry/title: expected NX_CHAR, found integer '42'"));
    }

    #[test]
    fn test_bad_datetime() {
        let mut root = valid_root();
        root.group_mut("entry")
            .unwrap()
            .set_string("start_time", "last tuesday")
            .unwrap();

        let result = validate_tree(&scan_schema(), &root, &ValidationOptions::default());
        assert!(result.errors.iter().any(|e| e.contains("NX_DATE_TIME")));
    }

    #[test]
    fn test_additional_properties_rejected() {
        let mut root = valid_root();
        let entry = root.group_mut("entry").unwrap();
        entry.set_f64("extra", 1.0).unwrap();
        entry.put_child("source", NxSource::new()).unwrap();
        entry.put_child("sample", NxSample::new()).unwrap();

        let result = validate_tree(&scan_schema(), &root, &ValidationOptions::default());
        assert!(result.errors.iter().any(|e| e.contains("/entry/extra")));
        assert!(result.errors.iter().any(|e| e.contains("NXsource group is not allowed")));
        assert!(!result.errors.iter().any(|e| e.contains("/entry/sample")));
    }

    #[test]
    fn test_non_strict_issues_are_warnings() {
        let mut sample = NxSample::new();
        sample.set_temperature("hot").unwrap();
        let mut root = GroupNode::new("NXroot");
        root.put_child("sample", sample).unwrap();

        let schema = SchemaDefinition::base_classes();
        let result = validate_tree(&schema, &root, &ValidationOptions::default());
        assert!(result.is_ok());
        assert!(result.warnings.iter().any(|w| w.contains("/sample/temperature: expected NX_FLOAT")));

        let result = validate_tree(&schema, &root, &ValidationOptions { strict: true });
        assert!(!result.is_ok());
    }

    #[test]
    fn test_missing_units_warns() {
        let mut sample = NxSample::new();
        sample.set_temperature_scalar(300.0).unwrap();
        let mut root = GroupNode::new("NXroot");
        root.put_child("sample", sample).unwrap();

        let result = validate_tree(&SchemaDefinition::base_classes(), &root, &ValidationOptions::default());
        assert!(result
            .warnings
            .iter()
            .any(|w| w == "/sample/temperature: no units given, expected NX_TEMPERATURE"));
    }

    #[test]
    fn test_unknown_class_and_bad_names() {
        let mut root = GroupNode::new("NXroot");
        root.insert("odd group", GroupNode::new("NXmystery")).unwrap();

        let result = validate_tree(&SchemaDefinition::base_classes(), &root, &ValidationOptions::default());
        assert!(result.is_ok());
        assert!(result.warnings.iter().any(|w| w.contains("unknown class 'NXmystery'")));
        assert!(result.warnings.iter().any(|w| w.contains("/odd group: name")));
    }

    #[test]
    fn test_unknown_class_is_error_when_strict() {
        let mut root = GroupNode::new("NXroot");
        root.insert("thing", GroupNode::new("NXmystery")).unwrap();

        let result = validate_tree(
            &SchemaDefinition::base_classes(),
            &root,
            &ValidationOptions { strict: true },
        );
        assert_eq!(result.errors, vec!["/thing: unknown class 'NXmystery'".to_string()]);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_attribute_names_follow_naming_rules() {
        let mut root = valid_root();
        root.set_attribute("odd attr", "x").unwrap();
        {
            let entry = root.group_mut("entry").unwrap();
            entry
                .dataset_mut("title")
                .unwrap()
                .set_attribute("my-note", "x")
                .unwrap();
        }

        let result = validate_tree(&scan_schema(), &root, &ValidationOptions::default());
        assert!(result.is_ok(), "Errors: {:?}", result.errors);
        assert!(result
            .warnings
            .contains(&"/@odd attr: name does not follow the NeXus naming rules".to_string()));
        assert!(result
            .warnings
            .contains(&"/entry/title@my-note: name does not follow the NeXus naming rules".to_string()));
    }

    #[test]
    fn test_broken_links_are_errors() {
        let mut root = valid_root();
        root.insert("dangling", LinkNode::new("/entry/nowhere").unwrap()).unwrap();
        root.insert("loop_a", LinkNode::new("/loop_b").unwrap()).unwrap();
        root.insert("loop_b", LinkNode::new("/loop_a").unwrap()).unwrap();

        let result = validate_tree(&SchemaDefinition::base_classes(), &root, &ValidationOptions::default());
        assert!(result.errors.iter().any(|e| e.contains("/dangling: link target")));
        assert!(result.errors.iter().any(|e| e.contains("/loop_a: link to '/loop_b' is cyclic")));
    }

    #[test]
    fn test_validate_and_report() {
        let schema = scan_schema();
        let warnings = validate_and_report(&schema, &valid_root(), &ValidationOptions::default()).unwrap();
        assert!(warnings.is_empty());

        let mut root = valid_root();
        root.group_mut("entry").unwrap().remove("title");
        let err = validate_and_report(&schema, &root, &ValidationOptions::default()).unwrap_err();
        assert!(err.to_string().contains("required field 'title'"));
    }
}
