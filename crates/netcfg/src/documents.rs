//! Reading basic configs and writing complete configs
//!
//! Basic configs may be json, yaml or hcl; the format is picked from the file extension. Complete configs are
//! written as pretty json (the default) or yaml next to each other as `<name>-complete.<ext>`.
use crate::pipeline::Orchestrator;
use crate::settings::Settings;
use crate::value::Value;
use anyhow::Context;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Hcl,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "hcl" => Some(DocumentFormat::Hcl),
            _ => None,
        }
    }

    pub fn parse(self, contents: &str) -> Result<Value, LoadError> {
        let value = match self {
            DocumentFormat::Json => serde_json::from_str(contents)?,
            DocumentFormat::Yaml => serde_yaml::from_str(contents)?,
            DocumentFormat::Hcl => hcl::from_str::<hcl::Value>(contents)?.into(),
        };
        Ok(value)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse json document")]
    Json(#[from] serde_json::Error),
    #[error("Unable to parse yaml document")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Unable to parse hcl document")]
    Hcl(#[from] hcl::Error),
    #[error("Unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_owned()))?;
    tracing::info!(path=%path.display(), ?format, "loading document");

    let contents = std::fs::read_to_string(path)?;
    format.parse(&contents)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }

    pub fn to_writer(self, writer: impl std::io::Write, value: &Value) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => serde_json::to_writer_pretty(writer, value)?,
            OutputFormat::Yaml => serde_yaml::to_writer(writer, value)?,
        };
        Ok(())
    }
}

/// Write `<output_dir>/<config_name>-complete.<ext>`, creating `output_dir` if needed
pub fn write_complete_config(
    value: &Value,
    output_dir: &Path,
    config_name: &str,
    format: OutputFormat,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Unable to create output directory {}", output_dir.display()))?;

    let path = output_dir.join(format!("{config_name}-complete.{}", format.extension()));
    tracing::info!(path=%path.display(), "saving complete configuration");

    let file = std::fs::File::create(&path)
        .with_context(|| format!("Unable to create {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    format.to_writer(&mut writer, value)?;
    std::io::Write::flush(&mut writer)?;

    Ok(path)
}

/// Load a basic config, generate and save the complete config as json
///
/// Returns the path of the written file.
pub fn generate_config_from_path(
    settings: &Settings,
    basic_config_path: &Path,
    config_name: &str,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let orchestrator = Orchestrator::from_settings(settings)?;

    let basic_config = load_document(basic_config_path)
        .with_context(|| format!("Unable to load basic config {}", basic_config_path.display()))?;
    anyhow::ensure!(
        basic_config.as_object().is_some_and(|config| !config.is_empty()),
        "Basic config {} is empty",
        basic_config_path.display()
    );

    let complete_config = orchestrator.generate(&basic_config)?;
    write_complete_config(&complete_config, output_dir, config_name, OutputFormat::Json)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let expected = value!({
            "projects": [{"projectId": "p1", "vpc": [{"name": "vpc-a", "mtu": 1460}]}]
        });

        let json = dir.path().join("basic.json");
        std::fs::write(
            &json,
            r#"{"projects": [{"projectId": "p1", "vpc": [{"name": "vpc-a", "mtu": 1460}]}]}"#,
        )
        .unwrap();
        assert_eq!(load_document(&json).unwrap(), expected);

        let yaml = dir.path().join("basic.yml");
        std::fs::write(
            &yaml,
            "projects:\n  - projectId: p1\n    vpc:\n      - name: vpc-a\n        mtu: 1460\n",
        )
        .unwrap();
        assert_eq!(load_document(&yaml).unwrap(), expected);

        let hcl = dir.path().join("basic.hcl");
        std::fs::write(
            &hcl,
            "projects = [{ projectId = \"p1\", vpc = [{ name = \"vpc-a\", mtu = 1460 }] }]\n",
        )
        .unwrap();
        assert_eq!(load_document(&hcl).unwrap(), expected);
    }

    #[test]
    fn unsupported_and_broken_documents() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("basic.txt");
        std::fs::write(&txt, "{}").unwrap();
        assert!(matches!(
            load_document(&txt),
            Err(LoadError::UnsupportedFormat(_))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ nope").unwrap();
        assert!(matches!(load_document(&broken), Err(LoadError::Json(_))));

        assert!(matches!(
            load_document(&dir.path().join("missing.json")),
            Err(LoadError::Io(_))
        ));
    }

    #[test]
    fn writes_named_output() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let value = value!({"projects": []});

        let path =
            write_complete_config(&value, &output_dir, "cloudsql_psc", OutputFormat::Json).unwrap();
        assert_eq!(path, output_dir.join("cloudsql_psc-complete.json"));
        assert_eq!(load_document(&path).unwrap(), value);

        let path =
            write_complete_config(&value, &output_dir, "cloudsql_psc", OutputFormat::Yaml).unwrap();
        assert_eq!(path, output_dir.join("cloudsql_psc-complete.yaml"));
        assert_eq!(load_document(&path).unwrap(), value);
    }

    #[test]
    fn generate_from_spec_root() {
        let root = tempfile::tempdir().unwrap();
        let schema_dir = root.path().join(".schema");
        std::fs::create_dir_all(&schema_dir).unwrap();
        std::fs::write(
            schema_dir.join("supported_resources.json"),
            r#"{"vpc": {"uriTemplate": "projects/{projectId}/global/networks/{name}"}}"#,
        )
        .unwrap();

        let basic = root.path().join("basic.json");
        std::fs::write(
            &basic,
            r#"{"projects": [{"projectId": "p1", "vpc": [{"type": "vpc", "name": "Vpc A"}]}]}"#,
        )
        .unwrap();

        let settings = Settings::from_spec_root(root.path());
        let output =
            generate_config_from_path(&settings, &basic, "demo", &root.path().join("out")).unwrap();

        assert_eq!(
            load_document(&output).unwrap(),
            value!({"projects": [{"projectId": "p1", "vpc": [{
                "type": "vpc",
                "name": "vpc-a",
                "selfLink": "projects/p1/global/networks/vpc-a"
            }]}]})
        );
    }

    #[test]
    fn missing_catalog_and_empty_config_fail() {
        let root = tempfile::tempdir().unwrap();
        let basic = root.path().join("basic.json");
        std::fs::write(&basic, "{}").unwrap();

        let settings = Settings::from_spec_root(root.path());
        assert!(generate_config_from_path(&settings, &basic, "demo", root.path()).is_err());

        std::fs::create_dir_all(root.path().join(".schema")).unwrap();
        std::fs::write(settings.catalog_path.clone(), r#"{"vpc": {}}"#).unwrap();
        let error = generate_config_from_path(&settings, &basic, "demo", root.path()).unwrap_err();
        assert!(error.to_string().contains("is empty"));
    }
}
