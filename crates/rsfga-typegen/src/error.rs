//! Error types for model compilation and tuple-key construction.

use thiserror::Error;

/// Errors produced while compiling a model or using the tuple-key helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypegenError {
    /// The model could not be parsed or references something that does not exist.
    #[error("malformed authorization model: {message}")]
    MalformedModel { message: String },

    /// Two distinct model names sanitize to the same generated identifier.
    #[error("identifier collision in {scope}: '{first}' and '{second}' both map to '{identifier}'")]
    IdentifierCollision {
        scope: String,
        first: String,
        second: String,
        identifier: String,
    },

    /// A tuple key was built with a relation the object type does not define.
    #[error("relation '{relation}' is not defined on type '{object_type}'")]
    UnknownRelation {
        object_type: String,
        relation: String,
    },

    /// An object id passed to `format` was empty.
    #[error("object id for type '{object_type}' cannot be empty")]
    EmptyIdentifier { object_type: String },

    /// The object type is not part of the model.
    #[error("type not found: {object_type}")]
    UnknownObjectType { object_type: String },
}

impl TypegenError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedModel {
            message: message.into(),
        }
    }
}

/// Result type for compiler operations.
pub type TypegenResult<T> = Result<T, TypegenError>;
