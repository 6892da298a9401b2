//! Authorization model types, decoders and reference resolution.
//!
//! This module contains:
//! - Core type definitions (AuthorizationModel, TypeDefinition, RelationExpression)
//! - JSON payload decoding for models fetched from an OpenFGA server
//! - DSL parser for the OpenFGA model format
//! - Validation that every referenced type, relation and condition exists

mod parser;
mod payload;
mod types;
mod validation;

pub use parser::{parse, parse_dsl, ParserError, ParserResult};
pub use payload::{ModelPayload, TypeDefinitionPayload, TypeMetadataPayload};
pub use types::*;
pub use validation::validate;
