mod cli;

use anyhow::Context;
use netcfg::documents::{load_document, write_complete_config};
use netcfg::pipeline::Orchestrator;
use netcfg::settings::Settings;
use netcfg::value::Value;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("NETCFG_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Generate(generate_cli) => generate(generate_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn settings(inputs: &cli::InputArgs) -> Settings {
    let mut settings = Settings::from_spec_root(&inputs.spec_root);

    if let Some(catalog) = &inputs.catalog {
        settings.catalog_path = catalog.clone();
    }
    if let Some(schemas_dir) = &inputs.schemas_dir {
        settings.schemas_dir = schemas_dir.clone();
    }
    if let Some(defaults_dir) = &inputs.defaults_dir {
        settings.defaults_dir = defaults_dir.clone();
    }
    settings.default_region = inputs.default_region.clone();

    settings
}

fn load_basic_config(path: &std::path::Path) -> anyhow::Result<Value> {
    let basic_config = load_document(path)
        .with_context(|| format!("Unable to load basic config {}", path.display()))?;
    anyhow::ensure!(
        basic_config.as_object().is_some_and(|config| !config.is_empty()),
        "Basic config {} is empty",
        path.display()
    );
    Ok(basic_config)
}

pub fn generate(cli: cli::GenerateCommand) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_settings(&settings(&cli.inputs))?;
    let basic_config = load_basic_config(&cli.basic_config)?;

    let complete_config = orchestrator.generate(&basic_config)?;

    let format = cli.output.format.into();
    match &cli.output_dir {
        None => output(format, &complete_config)?,
        Some(output_dir) => {
            let name = match &cli.name {
                Some(name) => name.clone(),
                None => cli
                    .basic_config
                    .file_stem()
                    .context("Basic config path has no file name")?
                    .to_string_lossy()
                    .into_owned(),
            };
            let path = write_complete_config(&complete_config, output_dir, &name, format)?;
            eprintln!("{}", path.display());
        }
    }

    Ok(())
}

fn output(format: netcfg::documents::OutputFormat, value: &Value) -> anyhow::Result<()> {
    format.to_writer(std::io::stdout(), value)?;
    println!();
    Ok(())
}

/// (netcfg-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let orchestrator = Orchestrator::from_settings(&settings(&cli.inputs))?;

    match cli.command {
        Catalog => println!("{:#?}", orchestrator.catalog()),
        Phases { basic_config } => {
            let basic_config = load_basic_config(&basic_config)?;
            let format = netcfg::documents::OutputFormat::Yaml;

            let mut result = Ok(());
            orchestrator.pipeline().run_with(&basic_config, |phase, tree| {
                if result.is_err() {
                    return;
                }
                println!("# {phase}");
                result = output(format, &Value::Object(tree.clone()));
            })?;
            result?;
        }
    }

    Ok(())
}
