//! rsfga-typegen-cli: command-line front end for rsfga-typegen
//!
//! Loads configuration, obtains the authorization model (local file or
//! OpenFGA API), generates the TypeScript module and writes it to disk.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              rsfga-typegen-cli               │
//! ├─────────────────────────────────────────────┤
//! │  config   - YAML file + FGA_ env settings   │
//! │  fetch    - Authorization model API client  │
//! │  logging  - tracing-subscriber setup        │
//! │  pipeline - Model loading & module output   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod fetch;
pub mod logging;
pub mod pipeline;

pub use config::{ConfigLoadError, TypegenConfig, DEFAULT_CONFIG_FILE};
pub use fetch::{FetchError, ModelClient};
pub use logging::{init_logging, LoggingConfig};
pub use pipeline::{load_model, read_model_file, write_module, PipelineError};
