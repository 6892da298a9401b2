//! Model loading and module output.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use rsfga_typegen::{parse_dsl, AuthorizationModel, GeneratedModule, TypegenError};

use crate::config::{ModelSource, TypegenConfig};
use crate::fetch::{FetchError, ModelClient};

/// Error type for the load/generate/write pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no model source configured; set store_id and api_url, or model_file")]
    NoSource,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Model(#[from] TypegenError),
}

/// Reads a local model. Content starting with `{` is decoded as an OpenFGA
/// JSON payload, anything else as DSL.
pub fn read_model_file(path: &Path) -> Result<AuthorizationModel, PipelineError> {
    let content = fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let model = if content.trim_start().starts_with('{') {
        debug!(path = %path.display(), "Reading JSON model");
        AuthorizationModel::from_json(&content)?
    } else {
        debug!(path = %path.display(), "Reading DSL model");
        parse_dsl(&content)?
    };
    Ok(model)
}

/// Obtains the model selected by `config`.
pub async fn load_model(config: &TypegenConfig) -> Result<AuthorizationModel, PipelineError> {
    match config.model_source().ok_or(PipelineError::NoSource)? {
        ModelSource::File(path) => read_model_file(Path::new(path)),
        ModelSource::Api {
            api_url,
            store_id,
            authorization_model_id,
        } => {
            let client = ModelClient::new(
                api_url,
                config.api_token.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            Ok(client.fetch_model(store_id, authorization_model_id).await?)
        }
    }
}

/// Writes the module to `output`, creating parent directories.
pub fn write_module(module: &GeneratedModule, output: &Path) -> Result<(), PipelineError> {
    let write_error = |source| PipelineError::Write {
        path: output.to_path_buf(),
        source,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(output, &module.source).map_err(write_error)?;

    info!(
        path = %output.display(),
        bytes = module.source.len(),
        "Wrote generated module"
    );
    Ok(())
}
