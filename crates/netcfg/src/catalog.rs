//! Resource type catalog (`supported_resources.json`)
//!
//! The catalog is the only input the generator cannot work without. Every other lookup (schemas, defaults,
//! nested resources, reference fields, URI templates) degrades to "nothing known" for an absent type.
use crate::uri_template::{TemplateError, UriTemplate};
use crate::value::{Object, ObjectExt, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata for one resource type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceTypeDescriptor {
    /// Schema file name, relative to the schema directory
    pub schema_file: Option<String>,
    /// Defaults file name, relative to the defaults directory
    pub defaults_file: Option<String>,
    /// list key on the parent -> type of the embedded children
    pub nested_resources: IndexMap<String, String>,
    /// Fields holding short names of other resources
    pub reference_fields: Vec<String>,
    pub uri_template: Option<String>,
    pub connectivity_options: Vec<String>,
}

impl ResourceTypeDescriptor {
    pub fn uri_template(&self) -> Option<Result<UriTemplate, TemplateError>> {
        self.uri_template.as_deref().map(UriTemplate::parse)
    }

    pub fn is_reference_field(&self, field: &str) -> bool {
        self.reference_fields.iter().any(|f| f == field)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceTypeCatalog {
    types: IndexMap<String, ResourceTypeDescriptor>,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Unable to read resource type catalog {}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to parse resource type catalog")]
    Parse(#[from] serde_json::Error),
    #[error("Resource type catalog is empty")]
    Empty,
}

impl ResourceTypeCatalog {
    pub fn new(types: IndexMap<String, ResourceTypeDescriptor>) -> Result<Self, CatalogError> {
        if types.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self { types })
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        tracing::info!(path=%path.display(), "loading resource type catalog");
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_owned(),
            source,
        })?;

        Self::new(serde_json::from_str(&contents)?)
    }

    pub fn from_value(value: &Value) -> Result<Self, CatalogError> {
        let json = serde_json::to_value(value)?;
        Self::new(serde_json::from_value(json)?)
    }

    pub fn lookup(&self, resource_type: &str) -> Option<&ResourceTypeDescriptor> {
        self.types.get(resource_type)
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.types.contains_key(resource_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = (&str, &ResourceTypeDescriptor)> {
        self.types.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Nested list keys of a type, empty for unknown types
    pub fn nested_resources(&self, resource_type: &str) -> impl Iterator<Item = (&str, &str)> {
        self.lookup(resource_type)
            .into_iter()
            .flat_map(|d| d.nested_resources.iter())
            .map(|(key, nested)| (key.as_str(), nested.as_str()))
    }

    /// Connectivity mode of a producer
    ///
    /// An explicit `connectivityType` wins. Otherwise the first of `psc`, `psa` supported by the producer's type.
    pub fn connectivity_mode(&self, producer: &Object) -> Option<ConnectivityMode> {
        if let Some(explicit) = producer.str_field("connectivityType") {
            return Some(ConnectivityMode::from(explicit));
        }

        let options = &self.lookup(producer.str_field("type")?)?.connectivity_options;
        [ConnectivityMode::Psc, ConnectivityMode::Psa]
            .into_iter()
            .find(|mode| options.iter().any(|option| option == mode.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityMode {
    /// Private Service Connect
    Psc,
    /// Private Service Access
    Psa,
    /// Service Connection Policy
    Scp,
    Other(String),
}

impl ConnectivityMode {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectivityMode::Psc => "psc",
            ConnectivityMode::Psa => "psa",
            ConnectivityMode::Scp => "scp",
            ConnectivityMode::Other(other) => other,
        }
    }
}

impl From<&str> for ConnectivityMode {
    fn from(value: &str) -> Self {
        match value {
            "psc" => ConnectivityMode::Psc,
            "psa" => ConnectivityMode::Psa,
            "scp" => ConnectivityMode::Scp,
            other => ConnectivityMode::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ConnectivityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::value;
    use pretty_assertions::assert_eq;

    /// Catalog shared by the pipeline tests
    pub(crate) fn catalog() -> ResourceTypeCatalog {
        ResourceTypeCatalog::from_value(&value!({
            "vpc": {
                "nestedResources": {"subnets": "subnetwork"},
                "referenceFields": [],
                "uriTemplate": "projects/{projectId}/global/networks/{name}"
            },
            "subnetwork": {
                "referenceFields": ["network"],
                "uriTemplate": "projects/{projectId}/regions/{region}/subnetworks/{name}"
            },
            "cloudsql": {
                "referenceFields": ["network", "subnet"],
                "uriTemplate": "projects/{projectId}/instances/{name}",
                "connectivityOptions": ["psa", "psc"]
            },
            "alloydb": {
                "referenceFields": ["network"],
                "connectivityOptions": ["psa"]
            },
            "gce": {
                "referenceFields": ["network", "subnetwork"],
                "uriTemplate": "projects/{projectId}/zones/{zone}/instances/{name}"
            },
            "router": {
                "referenceFields": ["network"],
                "uriTemplate": "projects/{projectId}/regions/{region}/routers/{name}"
            },
            "firewall_rule": {
                "referenceFields": ["network"],
                "uriTemplate": "projects/{projectId}/global/firewalls/{name}"
            },
            "address": {
                "referenceFields": ["subnetwork"],
                "uriTemplate": "projects/{projectId}/regions/{region}/addresses/{name}"
            },
            "forwardingrule": {
                "referenceFields": ["network", "subnetwork", "IPAddress"],
                "uriTemplate": "projects/{projectId}/regions/{region}/forwardingRules/{name}"
            }
        }))
        .expect("test catalog must load")
    }

    #[test]
    fn empty_catalog_is_fatal() {
        assert!(matches!(
            ResourceTypeCatalog::from_value(&value!({})),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn missing_catalog_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ResourceTypeCatalog::from_path(&dir.path().join("supported_resources.json")),
            Err(CatalogError::Io { .. })
        ));
    }

    #[test]
    fn descriptor_fields_default() {
        let catalog = catalog();
        let alloydb = catalog.lookup("alloydb").unwrap();
        assert_eq!(alloydb.uri_template, None);
        assert!(alloydb.nested_resources.is_empty());
        assert!(alloydb.is_reference_field("network"));
        assert!(!alloydb.is_reference_field("subnet"));
        assert_eq!(
            catalog.nested_resources("vpc").collect::<Vec<_>>(),
            vec![("subnets", "subnetwork")]
        );
    }

    #[test]
    fn connectivity_mode_resolution() {
        let catalog = catalog();

        let explicit = value!({"type": "cloudsql", "connectivityType": "scp"});
        assert_eq!(
            catalog.connectivity_mode(explicit.as_object().unwrap()),
            Some(ConnectivityMode::Scp)
        );

        // psc is preferred over psa regardless of option order
        let from_options = value!({"type": "cloudsql", "connectivityType": null});
        assert_eq!(
            catalog.connectivity_mode(from_options.as_object().unwrap()),
            Some(ConnectivityMode::Psc)
        );

        let psa_only = value!({"type": "alloydb"});
        assert_eq!(
            catalog.connectivity_mode(psa_only.as_object().unwrap()),
            Some(ConnectivityMode::Psa)
        );

        let unknown = value!({"type": "gce"});
        assert_eq!(catalog.connectivity_mode(unknown.as_object().unwrap()), None);
    }
}
