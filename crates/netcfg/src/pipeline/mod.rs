//! Basic config -> complete config
//!
//! [Orchestrator::generate] runs the phases below in order. Each phase reads one tree and returns a fresh one,
//! so every intermediate tree stays valid for inspection (see [Pipeline::run_with]).
//!
//! 1. merge duplicate projects, discover resource types, load their schemas and defaults
//! 2. instantiate explicit resources (count expansion, naming, schema/defaults/user layering)
//! 3. extract nested resources into top-level categories
//! 4. populate PSC allow-lists from consumer tags
//! 5. derive implicit resources (NAT routers, firewall rules, PSC endpoints, service connection policies)
//! 6. resolve short-name references to URIs
mod allow_list;
mod derive;
mod explicit;
mod locate;
mod merge;
mod nested;
mod references;
mod types;

pub use merge::{discover_resource_types, merge_duplicate_projects};
pub use references::UriIndex;

use crate::catalog::{CatalogError, ResourceTypeCatalog};
use crate::settings::Settings;
use crate::sources::{DefaultsDirectory, DefaultsSource, SchemaDirectory, SchemaSource};
use crate::value::{Object, ObjectExt, Value};
use types::TypeStore;

/// Turns basic configs into complete configs
pub struct Orchestrator {
    catalog: ResourceTypeCatalog,
    schemas: Box<dyn SchemaSource>,
    defaults: Box<dyn DefaultsSource>,
    default_region: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("Basic config must be an object")]
    NotAnObject,
}

impl Orchestrator {
    pub fn new(
        catalog: ResourceTypeCatalog,
        schemas: impl SchemaSource + 'static,
        defaults: impl DefaultsSource + 'static,
    ) -> Self {
        Self {
            catalog,
            schemas: Box::new(schemas),
            defaults: Box::new(defaults),
            default_region: None,
        }
    }

    /// Region for derived regional resources when the basic config has no `defaultRegion`
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    /// File backed orchestrator. Fails only when the resource type catalog can not be loaded.
    pub fn from_settings(settings: &Settings) -> Result<Self, CatalogError> {
        let catalog = ResourceTypeCatalog::from_path(&settings.catalog_path)?;
        let mut orchestrator = Self::new(
            catalog,
            SchemaDirectory::new(settings.schemas_dir.clone()),
            DefaultsDirectory::new(settings.defaults_dir.clone()),
        );
        orchestrator.default_region = settings.default_region.clone();
        Ok(orchestrator)
    }

    pub fn catalog(&self) -> &ResourceTypeCatalog {
        &self.catalog
    }

    /// A fresh pipeline with nothing loaded yet
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline {
            catalog: &self.catalog,
            types: TypeStore::new(&self.catalog, self.schemas.as_ref(), self.defaults.as_ref()),
            default_region: self.default_region.as_deref(),
        }
    }

    pub fn generate(&self, basic_config: &Value) -> Result<Value, GenerateError> {
        self.pipeline().run_with(basic_config, |_, _| {})
    }
}

/// Phases of one generation, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Merged,
    Explicit,
    Extracted,
    AllowListed,
    Derived,
    Resolved,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Merged => f.write_str("merged"),
            Phase::Explicit => f.write_str("explicit"),
            Phase::Extracted => f.write_str("extracted"),
            Phase::AllowListed => f.write_str("allow-listed"),
            Phase::Derived => f.write_str("derived"),
            Phase::Resolved => f.write_str("resolved"),
        }
    }
}

/// State of a single generation
///
/// Holds the schemas and defaults loaded so far. Phases may be called one by one; each returns a new tree and
/// leaves its input untouched.
pub struct Pipeline<'o> {
    catalog: &'o ResourceTypeCatalog,
    types: TypeStore<'o>,
    default_region: Option<&'o str>,
}

impl<'o> Pipeline<'o> {
    /// Run all phases, handing every intermediate tree to `observer`
    pub fn run_with<F>(
        &mut self,
        basic_config: &Value,
        mut observer: F,
    ) -> Result<Value, GenerateError>
    where
        F: FnMut(Phase, &Object),
    {
        let basic_config = basic_config.as_object().ok_or(GenerateError::NotAnObject)?;
        tracing::info!("starting generation");

        let mut working = basic_config.clone();
        if let Some(projects) = working.get("projects").and_then(Value::as_array) {
            tracing::info!("merging duplicate project definitions");
            let merged = merge_duplicate_projects(projects);
            working.insert("projects".to_string(), Value::Array(merged));
        }
        observer(Phase::Merged, &working);

        self.load_types(&working);

        let explicit = self.instantiate_explicit(&working);
        observer(Phase::Explicit, &explicit);

        let extracted = self.extract_nested(&explicit);
        observer(Phase::Extracted, &extracted);

        let allow_listed = self.populate_psc_allow_lists(&extracted);
        observer(Phase::AllowListed, &allow_listed);

        let derived = self.derive_implicit(&allow_listed);
        observer(Phase::Derived, &derived);

        let resolved = self.resolve_references(&derived);
        observer(Phase::Resolved, &resolved);

        tracing::debug!(
            types = ?self.types.loaded_types().collect::<Vec<_>>(),
            "resource types used"
        );
        tracing::info!("generation complete");
        Ok(Value::Object(resolved))
    }

    /// Batch load schemas and defaults for every type declared in `config`
    pub fn load_types(&mut self, config: &Object) {
        let types = discover_resource_types(config);
        self.types.load(&types);
    }

    /// Single instance layering, also used for extracted and derived resources
    pub fn instantiate(&mut self, data: Object) -> Object {
        self.types.instantiate(data)
    }
}

/// Metadata keys of a project, everything else holding a list is a resource category
pub const PROJECT_METADATA_KEYS: &[&str] = &[
    "projectId",
    "pscSettings",
    "description",
    "name",
    "namePrefix",
    "nameSuffix",
    "defaultRegion",
];

pub(crate) fn projects(config: &Object) -> impl Iterator<Item = &Object> {
    config.objects("projects")
}

/// `pscSettings` of the first project declaring them
pub(crate) fn psc_settings(config: &Object) -> Option<&Object> {
    projects(config)
        .find(|project| project.contains_key("pscSettings"))
        .and_then(|project| project.get("pscSettings"))
        .and_then(Value::as_object)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::catalog::test::catalog;
    use crate::sources::StaticSource;
    use crate::value;
    use pretty_assertions::assert_eq;

    pub(crate) fn object(value: Value) -> Object {
        match value {
            Value::Object(object) => object,
            _ => panic!("not an object"),
        }
    }

    /// Orchestrator over the shared test catalog with a few small schemas and defaults
    pub(crate) fn orchestrator() -> Orchestrator {
        let schemas = StaticSource::new()
            .with(
                "vpc",
                value!({
                    "type": "object",
                    "properties": {
                        "name": {},
                        "autoCreateSubnetworks": {},
                        "selfLink": {"readOnly": true}
                    }
                }),
            )
            .with(
                "router",
                value!({"type": "object", "properties": {"name": {}, "nats": {}}}),
            );
        let defaults = StaticSource::new()
            .with("vpc", value!({"autoCreateSubnetworks": true, "mtu": 1460}))
            .with("router", value!({"nats": [{"name": "nat"}]}));

        Orchestrator::new(catalog(), schemas, defaults).with_default_region("us-central1")
    }

    #[test]
    fn rejects_non_object_config() {
        assert!(matches!(
            orchestrator().generate(&value!(["not", "a", "config"])),
            Err(GenerateError::NotAnObject)
        ));
    }

    #[test]
    fn input_is_not_mutated() {
        let basic = value!({
            "projects": [
                {"projectId": "p1", "vpc": [{"type": "vpc", "name": "vpc-a", "createNat": true}]},
                {"projectId": "p1", "description": "dup"}
            ]
        });
        let before = basic.clone();

        orchestrator().generate(&basic).unwrap();
        assert_eq!(basic, before);
    }

    #[test]
    fn observer_sees_every_phase_in_order() {
        let mut phases = vec![];
        orchestrator()
            .pipeline()
            .run_with(&value!({"projects": []}), |phase, _| phases.push(phase))
            .unwrap();

        assert_eq!(
            phases,
            vec![
                Phase::Merged,
                Phase::Explicit,
                Phase::Extracted,
                Phase::AllowListed,
                Phase::Derived,
                Phase::Resolved
            ]
        );
    }

    #[test]
    fn nat_vpc_end_to_end() {
        let complete = orchestrator()
            .generate(&value!({
                "projects": [{
                    "projectId": "p1",
                    "vpc": [{"type": "vpc", "name": "vpc-a", "createNat": true}]
                }]
            }))
            .unwrap();

        let project = complete.get("projects").unwrap().as_array().unwrap()[0]
            .as_object()
            .unwrap();
        let routers: Vec<_> = project.objects("routers").collect();
        assert_eq!(routers.len(), 1);
        assert_eq!(routers[0].str_field("name"), Some("router-vpc-a-nat"));
        assert_eq!(routers[0].str_field("region"), Some("us-central1"));
        assert_eq!(
            routers[0].str_field("network"),
            Some("projects/p1/global/networks/vpc-a")
        );
        assert_eq!(routers[0]["nats"], value!([{"name": "nat"}]));
        assert_eq!(
            routers[0].str_field("selfLink"),
            Some("projects/p1/regions/us-central1/routers/router-vpc-a-nat")
        );

        let vpc = project.objects("vpc").next().unwrap();
        assert_eq!(vpc["mtu"], value!(1460));
        assert_eq!(
            vpc.str_field("selfLink"),
            Some("projects/p1/global/networks/vpc-a")
        );
    }

    #[test]
    fn psc_settings_come_from_first_declaring_project() {
        let config = object(value!({
            "projects": [
                {"projectId": "p1"},
                {"projectId": "p2", "pscSettings": {"networkForPsc": "vpc-b"}},
                {"projectId": "p3", "pscSettings": {"networkForPsc": "vpc-c"}}
            ]
        }));

        assert_eq!(
            psc_settings(&config).and_then(|s| s.str_field("networkForPsc")),
            Some("vpc-b")
        );
    }
}
