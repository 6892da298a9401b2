//! rsfga-typegen binary
//!
//! Generates TypeScript bindings for an OpenFGA authorization model.
//!
//! # Usage
//!
//! ```bash
//! # With config file (defaults to ./fga-typegen.yaml)
//! rsfga-typegen --config fga-typegen.yaml
//!
//! # With environment variables only
//! FGA_STORE_ID=01HV... FGA_API_URL=http://localhost:8080 rsfga-typegen
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use rsfga_typegen_cli::{
    init_logging, load_model, write_module, LoggingConfig, TypegenConfig, DEFAULT_CONFIG_FILE,
};

/// Generate TypeScript types and helpers from an OpenFGA authorization model
#[derive(Parser, Debug)]
#[command(name = "rsfga-typegen")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML) [default: fga-typegen.yaml]
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Explicit paths must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> anyhow::Result<TypegenConfig> {
    let config = match path {
        Some(path) => TypegenConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            TypegenConfig::load(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("loading configuration from {DEFAULT_CONFIG_FILE}"))?
        }
        None => TypegenConfig::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&LoggingConfig::from(&config.logging));

    info!(version = env!("CARGO_PKG_VERSION"), "Starting rsfga-typegen");

    let model = load_model(&config)
        .await
        .context("loading authorization model")?;
    let module = rsfga_typegen::generate(&model).context("generating TypeScript module")?;

    let output = PathBuf::from(&config.output);
    write_module(&module, &output)?;

    println!("Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_parsing() {
        let args = Args::try_parse_from(["rsfga-typegen"]).unwrap();
        assert!(args.config.is_none());

        let args = Args::try_parse_from(["rsfga-typegen", "--config", "fga.yaml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("fga.yaml")));

        let args = Args::try_parse_from(["rsfga-typegen", "-c", "test.yaml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("test.yaml")));
    }

    #[test]
    fn test_help_is_reported_as_display_help() {
        let err = Args::try_parse_from(["rsfga-typegen", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let err = load_config(Some(Path::new("/nonexistent/fga-typegen.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("configuration file not found"));
    }
}
