//! Short name -> URI resolution
//!
//! Runs in two passes over the finished tree. The first renders every instance's catalog `uriTemplate`, stamps
//! it as `selfLink` and records it in a [UriIndex]. The second replaces short names in reference fields with the
//! recorded URIs.
use super::{Pipeline, PROJECT_METADATA_KEYS};
use crate::catalog::ResourceTypeCatalog;
use crate::value::{Object, ObjectExt, Value};
use crate::visit::{VisitMut, VisitObjectsMut};
use indexmap::IndexMap;

/// URIs by (resource type, resource name), in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UriIndex {
    uris: IndexMap<(String, String), String>,
}

impl UriIndex {
    /// Render and record the URI of every instance in `config`, stamping `selfLink` on the instance
    ///
    /// `projectId` comes from the owning project, all other template parameters from the instance itself.
    /// Instances missing a parameter are skipped with a warning.
    pub fn build(catalog: &ResourceTypeCatalog, config: &mut Object) -> Self {
        let mut index = Self::default();

        for project in config.objects_mut("projects") {
            let project_id = project.str_field("projectId").map(str::to_owned);

            for (category, resources) in project.iter_mut() {
                if PROJECT_METADATA_KEYS.contains(&category.as_str()) {
                    continue;
                }
                let Some(resources) = resources.as_array_mut() else {
                    continue;
                };

                for resource in resources.iter_mut().filter_map(Value::as_object_mut) {
                    index.record(catalog, project_id.as_deref(), resource);
                }
            }
        }

        tracing::info!(count = index.len(), "built uri index");
        index
    }

    fn record(
        &mut self,
        catalog: &ResourceTypeCatalog,
        project_id: Option<&str>,
        resource: &mut Object,
    ) {
        let (Some(resource_type), Some(name)) =
            (resource.str_field("type"), resource.str_field("name"))
        else {
            return;
        };
        let Some(template) = catalog
            .lookup(resource_type)
            .and_then(|descriptor| descriptor.uri_template())
        else {
            return;
        };

        let template = match template {
            Ok(template) => template,
            Err(error) => {
                tracing::warn!(resource_type, %error, "skipping uri template");
                return;
            }
        };

        let rendered = template.render(|parameter| match (parameter, project_id) {
            ("projectId", Some(project_id)) => Some(project_id.to_owned()),
            _ => resource.get(parameter).and_then(Value::to_scalar_string),
        });

        match rendered {
            Ok(uri) => {
                tracing::trace!(resource_type, name, uri, "recorded uri");
                let key = (resource_type.to_owned(), name.to_owned());
                resource.insert("selfLink".to_string(), uri.clone().into());
                self.uris.insert(key, uri);
            }
            Err(error) => {
                tracing::warn!(resource_type, name, %error, "unable to build uri");
            }
        }
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&str> {
        self.uris
            .get(&(resource_type.to_owned(), name.to_owned()))
            .map(String::as_str)
    }

    /// First URI recorded for `name`, whatever its type
    pub fn find_by_name(&self, name: &str) -> Option<&str> {
        self.uris
            .iter()
            .find(|((_, entry_name), _)| entry_name == name)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.uris.iter().map(|((resource_type, name), uri)| {
            (resource_type.as_str(), name.as_str(), uri.as_str())
        })
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

/// Replaces short names in the reference fields of each visited object's (inherited) type
struct ReferenceResolver<'a> {
    catalog: &'a ResourceTypeCatalog,
    index: &'a UriIndex,
    unresolved: usize,
}

impl VisitMut<Object> for ReferenceResolver<'_> {
    fn visit_mut(&mut self, resource_type: Option<&str>, object: &mut Object) {
        let Some((resource_type, descriptor)) =
            resource_type.and_then(|t| Some((t, self.catalog.lookup(t)?)))
        else {
            return;
        };

        for (field, value) in object.iter_mut() {
            if !descriptor.is_reference_field(field) {
                continue;
            }
            let Value::String(reference) = value else {
                continue;
            };
            if reference.is_empty() || reference.contains('/') {
                continue;
            }

            match self.index.find_by_name(reference) {
                Some(uri) => *reference = uri.to_owned(),
                None => {
                    self.unresolved += 1;
                    tracing::warn!(
                        resource_type,
                        field = %field,
                        reference = %reference,
                        "unresolved reference"
                    );
                }
            }
        }
    }
}

impl Pipeline<'_> {
    #[tracing::instrument(level = "info", skip_all)]
    pub fn resolve_references(&self, config: &Object) -> Object {
        tracing::info!("resolving references");

        let mut resolved = config.clone();
        let index = UriIndex::build(self.catalog, &mut resolved);

        let mut resolver = ReferenceResolver {
            catalog: self.catalog,
            index: &index,
            unresolved: 0,
        };
        resolved.visit_objects_mut(&mut resolver);

        if resolver.unresolved > 0 {
            tracing::warn!(count = resolver.unresolved, "some references were left unresolved");
        }

        resolved
    }
}
