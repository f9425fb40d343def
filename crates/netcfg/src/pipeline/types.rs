//! Schema + defaults + user data layering
use crate::catalog::ResourceTypeCatalog;
use crate::sources::{DefaultsSource, SchemaSource, TypeData};
use crate::util::deep_update;
use crate::value::{Object, ObjectExt, Value};
use std::collections::BTreeSet;

/// Schemas and defaults of every type seen during one generation
///
/// Loaded in batches: once for all types discovered in the basic config, and again for any type that first
/// shows up during extraction or derivation.
pub(crate) struct TypeStore<'o> {
    catalog: &'o ResourceTypeCatalog,
    schema_source: &'o dyn SchemaSource,
    defaults_source: &'o dyn DefaultsSource,
    schemas: TypeData,
    defaults: TypeData,
}

impl<'o> TypeStore<'o> {
    pub(crate) fn new(
        catalog: &'o ResourceTypeCatalog,
        schema_source: &'o dyn SchemaSource,
        defaults_source: &'o dyn DefaultsSource,
    ) -> Self {
        Self {
            catalog,
            schema_source,
            defaults_source,
            schemas: Default::default(),
            defaults: Default::default(),
        }
    }

    /// Load every type in `types` that is not loaded yet
    pub(crate) fn load(&mut self, types: &BTreeSet<String>) {
        let missing: BTreeSet<String> = types
            .iter()
            .filter(|t| !self.schemas.contains_key(t.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }

        self.schemas
            .extend(self.schema_source.load(self.catalog, &missing));
        self.defaults
            .extend(self.defaults_source.load(self.catalog, &missing));

        // a source returning fewer types than requested must not trigger a reload for every instance
        for resource_type in missing {
            self.schemas
                .entry(resource_type.clone())
                .or_insert_with(|| Value::Object(Object::new()));
            self.defaults
                .entry(resource_type)
                .or_insert_with(|| Value::Object(Object::new()));
        }
    }

    pub(crate) fn loaded_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Build a complete resource instance
    ///
    /// Layers, lowest precedence first: every writable schema property set to null, the type's defaults, the
    /// instance data itself. An instance without `type` is returned unchanged.
    pub(crate) fn instantiate(&mut self, data: Object) -> Object {
        let Some(resource_type) = data.str_field("type").map(str::to_owned) else {
            tracing::warn!(
                name = data.str_field("name").unwrap_or("Unnamed"),
                "resource is missing 'type', passing it through incomplete"
            );
            return data;
        };

        if !self.schemas.contains_key(&resource_type) {
            tracing::debug!(resource_type, "loading type on demand");
            self.load(&BTreeSet::from([resource_type.clone()]));
        }

        let mut complete = self
            .schemas
            .get(&resource_type)
            .map(skeleton)
            .unwrap_or_default();

        if let Some(defaults) = self.defaults.get(&resource_type).and_then(Value::as_object) {
            deep_update(&mut complete, defaults);
        }
        deep_update(&mut complete, &data);

        complete
    }
}

/// Every writable top-level property of an object schema, set to null
fn skeleton(schema: &Value) -> Object {
    let Some(schema) = schema.as_object() else {
        return Object::new();
    };
    if schema.str_field("type") != Some("object") {
        return Object::new();
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Object::new();
    };

    properties
        .iter()
        .filter(|(_, property)| {
            !property
                .as_object()
                .is_some_and(|property| property.flag("readOnly"))
        })
        .map(|(name, _)| (name.clone(), Value::Null))
        .collect()
}
