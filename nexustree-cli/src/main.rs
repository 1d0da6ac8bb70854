use clap::{Parser, Subcommand, ValueEnum};
use nexustree::classes::NxEntry;
use nexustree::node::{NodeMut, NodeRef};
use nexustree::schema::parse_schema;
use nexustree::{
    DatasetNode, Elements, GroupNode, LinkNode, NexusFile, Node, SchemaDefinition,
    ValidationOptions, Value,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;

/// nxtree: inspect and edit NeXus documents from the command line
#[derive(Parser)]
#[command(name = "nxtree", version, about)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "yaml", global = true)]
    format: OutputFormat,

    /// Application definitions to merge over the built-in base classes
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new file with one NXentry
    New {
        /// File to create (.nxs.yaml or .nxs.json)
        file: PathBuf,
        /// Name of the entry group
        #[arg(long, default_value = "entry")]
        entry: String,
        /// Entry title
        #[arg(long)]
        title: Option<String>,
    },

    /// Print the group hierarchy
    Tree {
        file: PathBuf,
    },

    /// Print a node, or an attribute with path@attr
    Get {
        file: PathBuf,
        path: String,
    },

    /// Set a dataset or attribute. The value is read as JSON, falling back to a string
    Set {
        file: PathBuf,
        path: String,
        value: String,
        /// Units attribute for the dataset
        #[arg(long)]
        units: Option<String>,
    },

    /// Create a group
    Mkgroup {
        file: PathBuf,
        path: String,
        /// NeXus class, e.g. NXsample
        nx_class: String,
    },

    /// Create a link to another node
    Link {
        file: PathBuf,
        path: String,
        /// Absolute path of the linked node
        target: String,
    },

    /// Remove a node
    Rm {
        file: PathBuf,
        path: String,
    },

    /// Check files against the class definitions
    Validate {
        /// Files, or directories searched for *.nxs.yaml, *.nxs.yml and *.nxs.json
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Report every issue as an error
        #[arg(long)]
        strict: bool,
    },

    /// List class definitions, or show one
    Classes {
        name: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::New { file, entry, title } => {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let mut nexus = NexusFile::new(&file_name)?;

            let mut group = NxEntry::new();
            if let Some(title) = title {
                group.set_title(title)?;
            }
            let mut root = nexus.root_mut();
            root.set_entry_named(&entry, group)?;
            root.set_default_attr(entry.clone())?;

            nexus.save_as(&file)?;
            print_output(
                &serde_json::json!({ "ok": true, "file": file.display().to_string(), "entry": entry }),
                &cli.format,
            )?;
        }

        Command::Tree { file } => {
            let nexus = NexusFile::open(&file)?;
            let root = nexus.root_node();
            println!("/ {}", root.nx_class());
            print_tree(root, 1);
        }

        Command::Get { file, path } => {
            let nexus = NexusFile::open(&file)?;
            if path.contains('@') {
                print_output(nexus.resolve_attribute(&path)?, &cli.format)?;
            } else {
                match nexus.resolve(&path)? {
                    NodeRef::Group(group) => print_output(group, &cli.format)?,
                    NodeRef::Dataset(dataset) => print_output(dataset, &cli.format)?,
                }
            }
        }

        Command::Set {
            file,
            path,
            value,
            units,
        } => {
            let mut nexus = NexusFile::open(&file)?;
            let value = parse_value(&value);
            set_at(&mut nexus, &path, value, units.as_deref())?;
            nexus.save()?;
            print_output(&serde_json::json!({ "ok": true, "path": path }), &cli.format)?;
        }

        Command::Mkgroup {
            file,
            path,
            nx_class,
        } => {
            let mut nexus = NexusFile::open(&file)?;
            make_group(&mut nexus, &path, &nx_class)?;
            nexus.save()?;
            print_output(
                &serde_json::json!({ "ok": true, "path": path, "class": nx_class }),
                &cli.format,
            )?;
        }

        Command::Link { file, path, target } => {
            let mut nexus = NexusFile::open(&file)?;
            if nexus.resolve(&target).is_err() {
                log::warn!("Link target '{target}' does not resolve yet");
            }
            nexus.insert_at(&path, LinkNode::new(&target)?)?;
            nexus.save()?;
            print_output(
                &serde_json::json!({ "ok": true, "path": path, "target": target }),
                &cli.format,
            )?;
        }

        Command::Rm { file, path } => {
            let mut nexus = NexusFile::open(&file)?;
            let removed = nexus.remove_at(&path)?;
            nexus.save()?;
            print_output(
                &serde_json::json!({ "ok": true, "deleted": path, "kind": removed.kind() }),
                &cli.format,
            )?;
        }

        Command::Validate { paths, strict } => {
            let schema = load_schema(cli.schema.as_deref())?;
            let options = ValidationOptions { strict };

            let mut report = serde_json::Map::new();
            let mut failed = 0;
            for file in collect_files(&paths)? {
                let nexus = NexusFile::open(&file)?;
                let result = nexus.validate(&schema, &options);
                if !result.is_ok() {
                    failed += 1;
                }
                report.insert(
                    file.display().to_string(),
                    serde_json::json!({
                        "ok": result.is_ok(),
                        "errors": result.errors,
                        "warnings": result.warnings,
                    }),
                );
            }

            print_output(&serde_json::Value::Object(report), &cli.format)?;
            if failed > 0 {
                return Err(format!("{failed} file(s) failed validation").into());
            }
        }

        Command::Classes { name } => {
            let schema = load_schema(cli.schema.as_deref())?;
            match name {
                Some(name) => {
                    let class = schema
                        .get_class(&name)
                        .ok_or_else(|| format!("Unknown class '{name}'"))?;
                    print_output(class, &cli.format)?;
                }
                None => print_output(&schema.class_names(), &cli.format)?,
            }
        }
    }

    Ok(())
}

fn print_output<T: Serialize + ?Sized>(
    value: &T,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

fn print_tree(group: &GroupNode, depth: usize) {
    let indent = "  ".repeat(depth);
    for (name, node) in group.children() {
        match node {
            Node::Group(child) => {
                println!("{indent}{name}:{}", child.nx_class());
                print_tree(child, depth + 1);
            }
            Node::Dataset(dataset) => {
                let value = dataset.value();
                let units = dataset
                    .units()
                    .map(|u| format!(" {u}"))
                    .unwrap_or_default();
                if value.is_scalar() {
                    println!("{indent}{name} = {value}{units}");
                } else {
                    println!(
                        "{indent}{name} {} {:?}{units}",
                        value.type_name(),
                        value.shape()
                    );
                }
            }
            Node::Link(link) => println!("{indent}{name} -> {}", link.target()),
        }
    }
}

fn set_at(
    nexus: &mut NexusFile,
    path: &str,
    value: Value,
    units: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some((node_path, attr)) = path.split_once('@') {
        let node_path = if node_path.is_empty() { "/" } else { node_path };
        match nexus.resolve_mut(node_path)? {
            NodeMut::Group(group) => group.set_attribute(attr, value)?,
            NodeMut::Dataset(dataset) => dataset.set_attribute(attr, value)?,
        }
        return Ok(());
    }

    if !nexus.contains_at(path)? {
        let mut dataset = DatasetNode::new(value);
        if let Some(units) = units {
            dataset.set_units(units);
        }
        nexus.insert_at(path, dataset)?;
        return Ok(());
    }

    // An existing link must resolve to a dataset, it is never replaced
    match nexus.resolve_mut(path)? {
        NodeMut::Dataset(dataset) => {
            dataset.set_value(value);
            if let Some(units) = units {
                dataset.set_units(units);
            }
        }
        NodeMut::Group(_) => return Err(format!("'{path}' is a group").into()),
    }
    Ok(())
}

fn make_group(
    nexus: &mut NexusFile,
    path: &str,
    nx_class: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if nexus.contains_at(path)? {
        return Err(format!("'{path}' already exists").into());
    }
    nexus.insert_at(path, GroupNode::new(nx_class))?;
    Ok(())
}

/// Read a command-line value as JSON. Nested arrays become n-dimensional
/// values. Anything else is kept as a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|json| json_to_value(&json))
        .unwrap_or_else(|| Value::from(raw))
}

fn json_to_value(json: &serde_json::Value) -> Option<Value> {
    let mut shape = Vec::new();
    let mut current = json;
    while let serde_json::Value::Array(items) = current {
        shape.push(items.len());
        current = items.first()?;
    }

    let mut leaves = Vec::new();
    collect_leaves(json, shape.len(), &mut leaves)?;

    let elements = if leaves.iter().all(|v| v.is_boolean()) {
        Elements::Bool(leaves.iter().filter_map(|v| v.as_bool()).collect())
    } else if leaves.iter().all(|v| v.is_i64()) {
        Elements::Int(leaves.iter().filter_map(|v| v.as_i64()).collect())
    } else if leaves.iter().all(|v| v.is_number()) {
        Elements::Float(leaves.iter().filter_map(|v| v.as_f64()).collect())
    } else if leaves.iter().all(|v| v.is_string()) {
        Elements::String(
            leaves
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    } else {
        return None;
    };

    Value::new(shape, elements).ok()
}

/// Flatten in row-major order. Fails on ragged arrays and objects.
fn collect_leaves<'a>(
    json: &'a serde_json::Value,
    depth: usize,
    out: &mut Vec<&'a serde_json::Value>,
) -> Option<()> {
    match json {
        serde_json::Value::Array(items) if depth > 0 => {
            for item in items {
                collect_leaves(item, depth - 1, out)?;
            }
            Some(())
        }
        serde_json::Value::Array(_) | serde_json::Value::Object(_) | serde_json::Value::Null => {
            None
        }
        leaf if depth == 0 => {
            out.push(leaf);
            Some(())
        }
        _ => None,
    }
}

fn load_schema(extra: Option<&Path>) -> Result<SchemaDefinition, Box<dyn std::error::Error>> {
    let mut schema = SchemaDefinition::base_classes();
    if let Some(path) = extra {
        schema.merge(parse_schema(path)?);
    }
    Ok(schema)
}

fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(NexusFile::discover(path)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexustree::classes::NxRoot;
    use nexustree::{BaseClass, NexusError};

    #[test]
    fn test_parse_scalar_values() {
        assert_eq!(parse_value("42").as_i64().unwrap(), 42);
        assert_eq!(parse_value("2.5").as_f64().unwrap(), 2.5);
        assert!(parse_value("true").as_bool().unwrap());
        assert_eq!(parse_value("hello world").as_string().unwrap(), "hello world");
        assert_eq!(parse_value("\"quoted\"").as_string().unwrap(), "quoted");
    }

    #[test]
    fn test_parse_arrays() {
        let value = parse_value("[[1, 2, 3], [4, 5, 6]]");
        assert_eq!(value.shape(), &[2, 3]);
        assert_eq!(value.to_i64_vec().unwrap(), vec![1, 2, 3, 4, 5, 6]);

        let mixed = parse_value("[1, 2.5]");
        assert_eq!(mixed.to_f64_vec().unwrap(), vec![1.0, 2.5]);
    }

    #[test]
    fn test_ragged_and_objects_fall_back_to_string() {
        assert_eq!(parse_value("[[1], [2, 3]]").as_string().unwrap(), "[[1], [2, 3]]");
        assert_eq!(parse_value("{\"a\": 1}").as_string().unwrap(), "{\"a\": 1}");
        assert_eq!(parse_value("[]").as_string().unwrap(), "[]");
    }

    #[test]
    fn test_new_set_and_remove() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("run.nxs.yaml");

        let mut nexus = NexusFile::new("run.nxs.yaml").unwrap();
        nexus
            .root_mut()
            .set_entry_named("scan", NxEntry::new())
            .unwrap();
        nexus.save_as(&path).unwrap();

        let mut nexus = NexusFile::open(&path).unwrap();
        set_at(&mut nexus, "/scan/energy", parse_value("[1.0, 2.0]"), Some("keV")).unwrap();
        set_at(&mut nexus, "/scan/energy@long_name", parse_value("Beam energy"), None).unwrap();
        set_at(&mut nexus, "/@default", parse_value("scan"), None).unwrap();
        assert!(set_at(&mut nexus, "/scan", parse_value("1"), None).is_err());

        let energy = nexus.resolve("/scan/energy").unwrap();
        let energy = energy.as_dataset().unwrap();
        assert_eq!(energy.units().as_deref(), Some("keV"));
        assert_eq!(
            nexus
                .resolve_attribute("/scan/energy@long_name")
                .unwrap()
                .as_string()
                .unwrap(),
            "Beam energy"
        );
        let root: NxRoot<&GroupNode> = NxRoot::wrap(nexus.root_node());
        assert_eq!(root.default_attr().unwrap().as_deref(), Some("scan"));
    }

    #[test]
    fn test_links_are_never_overwritten() {
        let mut nexus = NexusFile::new("run.nxs.yaml").unwrap();
        nexus.root_mut().set_entry(NxEntry::new()).unwrap();
        nexus
            .insert_at("/entry/det", LinkNode::new("/entry/instrument/detector").unwrap())
            .unwrap();
        nexus
            .insert_at("/entry/a", LinkNode::new("/entry/b").unwrap())
            .unwrap();
        nexus
            .insert_at("/entry/b", LinkNode::new("/entry/a").unwrap())
            .unwrap();

        let err = make_group(&mut nexus, "/entry/det", "NXsample").unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let err = set_at(&mut nexus, "/entry/a", parse_value("5"), None).unwrap_err();
        assert!(matches!(err.downcast_ref::<NexusError>(), Some(NexusError::Link(_))));

        let err = set_at(&mut nexus, "/entry/det", parse_value("5"), None).unwrap_err();
        assert!(matches!(err.downcast_ref::<NexusError>(), Some(NexusError::NotFound(_))));

        let entry = nexus.root_node().group("entry").unwrap();
        assert_eq!(entry.link("det").unwrap().target(), "/entry/instrument/detector");
        assert_eq!(entry.link("a").unwrap().target(), "/entry/b");
    }

    #[test]
    fn test_make_group() {
        let mut nexus = NexusFile::new("run.nxs.yaml").unwrap();
        nexus.root_mut().set_entry(NxEntry::new()).unwrap();
        make_group(&mut nexus, "/entry/sample", "NXsample").unwrap();
        assert!(make_group(&mut nexus, "/entry/sample", "NXsample").is_err());
        assert!(make_group(&mut nexus, "/missing/sample", "NXsample").is_err());
        let sample = nexus.resolve("/entry/sample").unwrap();
        assert_eq!(sample.as_group().unwrap().nx_class(), "NXsample");
    }

    #[test]
    fn test_collect_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut nexus = NexusFile::new("a.nxs.yaml").unwrap();
        nexus.save_as(tmp.path().join("a.nxs.yaml")).unwrap();
        let single = tmp.path().join("explicit.yaml");

        let files = collect_files(&[tmp.path().to_path_buf(), single.clone()]).unwrap();
        assert_eq!(files, vec![tmp.path().join("a.nxs.yaml"), single]);
    }
}
