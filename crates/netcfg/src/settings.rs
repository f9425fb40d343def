//! Where the generator finds its inputs
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `supported_resources.json`
    pub catalog_path: PathBuf,
    /// Directory of `<type>_schema.json` files
    pub schemas_dir: PathBuf,
    /// Directory of `<type>_defaults.json` files
    pub defaults_dir: PathBuf,
    /// Region for derived regional resources, see [crate::pipeline::Orchestrator::with_default_region]
    pub default_region: Option<String>,
}

impl Settings {
    /// Standard layout below a spec root
    ///
    /// ```text
    /// <root>/.schema/supported_resources.json
    /// <root>/.schema/<type>_schema.json
    /// <root>/.defaults/<type>_defaults.json
    /// ```
    pub fn from_spec_root(root: &Path) -> Self {
        let schemas_dir = root.join(".schema");
        Self {
            catalog_path: schemas_dir.join("supported_resources.json"),
            schemas_dir,
            defaults_dir: root.join(".defaults"),
            default_region: None,
        }
    }
}
