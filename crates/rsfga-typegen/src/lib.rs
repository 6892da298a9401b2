//! rsfga-typegen: TypeScript bindings for OpenFGA authorization models
//!
//! This crate compiles an authorization model into a single TypeScript
//! module including:
//! - Object-type and relation constants with literal types
//! - Per-type tuple-key interfaces and their discriminated union
//! - Relation categories (direct, computed, inherited, indirect)
//! - Helpers to format, parse and build tuple keys
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                rsfga-typegen                 │
//! ├─────────────────────────────────────────────┤
//! │  model/    - Model types, JSON & DSL input  │
//! │  classify  - Relation categories            │
//! │  sanitize  - Identifier escaping            │
//! │  symbols   - Per-run naming table           │
//! │  synth/    - TypeScript synthesis           │
//! │  emit      - Module serialization           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use rsfga_typegen::{generate, parse_dsl};
//!
//! let model = parse_dsl(
//!     r#"
//! model
//!   schema 1.1
//!
//! type user
//!
//! type organization
//!   relations
//!     define owner: [user]
//!     define admin: [user] or owner
//! "#,
//! )
//! .unwrap();
//!
//! let module = generate(&model).unwrap();
//! assert!(module.source.contains("export interface OrganizationTupleKey"));
//! ```

pub mod classify;
pub mod emit;
pub mod error;
pub mod model;
pub mod sanitize;
pub mod symbols;
pub mod synth;

// Re-export commonly used types at the crate root
pub use classify::{classify, RelationCategory};
pub use emit::{generate, generate_at, GeneratedModule, DEFAULT_FILE_NAME};
pub use error::{TypegenError, TypegenResult};
pub use model::{parse_dsl, validate, AuthorizationModel};
pub use symbols::SymbolTable;
pub use synth::TupleKeyHelpers;
