//! netcfg cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; netcfg ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a complete config from a basic config
    ///
    /// Writes to stdout unless an output directory is given
    #[command(alias = "gen")]
    Generate(GenerateCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct GenerateCommand {
    /// Basic config (.json, .yaml, .yml or .hcl)
    pub basic_config: PathBuf,

    #[clap(flatten)]
    pub inputs: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Base name of the output file (`<name>-complete.<ext>`)
    ///
    /// Defaults to the basic config's file stem
    #[clap(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Write into this directory instead of stdout
    #[clap(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Directory containing `.schema/` and `.defaults/`
    #[clap(short = 's', long = "spec-root", default_value = ".")]
    pub spec_root: PathBuf,

    /// Resource type catalog [default: <spec-root>/.schema/supported_resources.json]
    #[clap(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Schema directory [default: <spec-root>/.schema]
    #[clap(long = "schemas-dir")]
    pub schemas_dir: Option<PathBuf>,

    /// Defaults directory [default: <spec-root>/.defaults]
    #[clap(long = "defaults-dir")]
    pub defaults_dir: Option<PathBuf>,

    /// Region for derived routers when the basic config has no `defaultRegion`
    #[clap(long = "default-region")]
    pub default_region: Option<String>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

impl From<OutputFormat> for netcfg::documents::OutputFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Json => netcfg::documents::OutputFormat::Json,
            OutputFormat::Yaml => netcfg::documents::OutputFormat::Yaml,
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub inputs: InputArgs,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Print the resource type catalog
    Catalog,
    /// Print the tree after every generation phase
    Phases {
        /// Basic config (.json, .yaml, .yml or .hcl)
        basic_config: PathBuf,
    },
}
