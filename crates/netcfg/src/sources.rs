//! Per-type schemas and defaults
//!
//! Both sources are total: whatever goes wrong while loading a type (unknown to the catalog, missing file,
//! corrupt or empty json) the type maps to an empty object and a warning is logged.
use crate::catalog::ResourceTypeCatalog;
use crate::value::{Object, Value};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub type TypeData = IndexMap<String, Value>;

/// Property schemas by resource type
pub trait SchemaSource {
    fn load(&self, catalog: &ResourceTypeCatalog, types: &BTreeSet<String>) -> TypeData;
}

/// Default property values by resource type
pub trait DefaultsSource {
    fn load(&self, catalog: &ResourceTypeCatalog, types: &BTreeSet<String>) -> TypeData;
}

fn empty() -> Value {
    Value::Object(Object::new())
}

/// Reads a json object, `None` when missing, unreadable, corrupt, empty or not an object
fn read_json_object(path: &Path) -> Option<Value> {
    tracing::debug!(path=%path.display(), "loading json file");

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) => {
            tracing::debug!(path=%path.display(), %error, "unable to read file");
            return None;
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(object)) if !object.is_empty() => Some(Value::Object(object)),
        Ok(_) => None,
        Err(error) => {
            tracing::error!(path=%path.display(), %error, "unable to parse json file");
            None
        }
    }
}

/// `<dir>/<schemaFile>` or `<dir>/<type>_schema.json`
#[derive(derive_new::new, Debug, Clone)]
pub struct SchemaDirectory {
    dir: PathBuf,
}

impl SchemaSource for SchemaDirectory {
    #[tracing::instrument(level = "info", skip_all, fields(dir=%self.dir.display()))]
    fn load(&self, catalog: &ResourceTypeCatalog, types: &BTreeSet<String>) -> TypeData {
        tracing::info!(?types, "loading schemas");

        let mut schemas = TypeData::new();
        for resource_type in types {
            let Some(descriptor) = catalog.lookup(resource_type) else {
                tracing::warn!(
                    resource_type,
                    "type is not in the resource type catalog, using empty schema"
                );
                schemas.insert(resource_type.clone(), empty());
                continue;
            };

            let file_name = descriptor
                .schema_file
                .clone()
                .unwrap_or_else(|| format!("{resource_type}_schema.json"));
            let path = self.dir.join(file_name);

            let schema = read_json_object(&path).unwrap_or_else(|| {
                tracing::warn!(
                    resource_type,
                    path=%path.display(),
                    "schema not found or failed to load, using empty schema"
                );
                empty()
            });
            schemas.insert(resource_type.clone(), schema);
        }

        schemas
    }
}

/// `<dir>/<defaultsFile>` or `<dir>/<type>_defaults.json`
#[derive(derive_new::new, Debug, Clone)]
pub struct DefaultsDirectory {
    dir: PathBuf,
}

impl DefaultsSource for DefaultsDirectory {
    #[tracing::instrument(level = "info", skip_all, fields(dir=%self.dir.display()))]
    fn load(&self, catalog: &ResourceTypeCatalog, types: &BTreeSet<String>) -> TypeData {
        tracing::info!(?types, "loading defaults");

        let mut defaults = TypeData::new();
        for resource_type in types {
            let file_name = catalog
                .lookup(resource_type)
                .and_then(|descriptor| descriptor.defaults_file.clone())
                .unwrap_or_else(|| format!("{resource_type}_defaults.json"));
            let path = self.dir.join(file_name);

            let value = read_json_object(&path).unwrap_or_else(|| {
                tracing::warn!(
                    resource_type,
                    path=%path.display(),
                    "defaults not found or failed to load, using empty defaults"
                );
                empty()
            });
            defaults.insert(resource_type.clone(), value);
        }

        defaults
    }
}

/// In-memory schemas or defaults
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: TypeData,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource_type: impl Into<String>, value: Value) -> Self {
        self.entries.insert(resource_type.into(), value);
        self
    }

    fn select(&self, types: &BTreeSet<String>) -> TypeData {
        types
            .iter()
            .map(|t| (t.clone(), self.entries.get(t).cloned().unwrap_or_else(empty)))
            .collect()
    }
}

impl SchemaSource for StaticSource {
    fn load(&self, _catalog: &ResourceTypeCatalog, types: &BTreeSet<String>) -> TypeData {
        self.select(types)
    }
}

impl DefaultsSource for StaticSource {
    fn load(&self, _catalog: &ResourceTypeCatalog, types: &BTreeSet<String>) -> TypeData {
        self.select(types)
    }
}
