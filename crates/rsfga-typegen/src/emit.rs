//! Module emitter.
//!
//! Serializes the synthesized sections into one TypeScript source file in a
//! fixed order: header, object-type constants, relation groups, tuple keys,
//! helpers, metadata. The generation timestamp is the only varying content
//! and sits alone on the [`GENERATED_AT_PREFIX`] line.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::error::TypegenResult;
use crate::model::{validate, AuthorizationModel};
use crate::symbols::SymbolTable;
use crate::synth::{
    render_helpers, render_object_types, render_relation_groups, render_tuple_keys,
};
use crate::synth::{ts_property_key, ts_string, ts_string_array, CodeWriter};

/// File name used when the caller does not choose one.
pub const DEFAULT_FILE_NAME: &str = "fga-types.generated.ts";

/// Start of the single line holding the generation timestamp.
pub const GENERATED_AT_PREFIX: &str = "export const GENERATED_AT = ";

/// One generated TypeScript module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub file_name: String,
    pub source: String,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedModule {
    /// Source with the timestamp line removed. Two runs over the same model
    /// produce identical output here.
    pub fn source_without_timestamp(&self) -> String {
        self.source
            .lines()
            .filter(|line| !line.starts_with(GENERATED_AT_PREFIX))
            .map(|line| format!("{line}\n"))
            .collect()
    }
}

fn section(w: &mut CodeWriter, title: &str, body: &str) {
    w.line(format!("// ---- {title} ----")).blank();
    for line in body.lines() {
        w.line(line);
    }
    w.blank();
}

fn render_header(w: &mut CodeWriter, table: &SymbolTable) {
    w.line("// Code generated by rsfga-typegen. DO NOT EDIT.");
    let schema = table.schema_version.escape_debug();
    match &table.model_id {
        Some(id) => w.line(format!(
            "// Authorization model {} (schema {schema})",
            id.escape_debug()
        )),
        None => w.line(format!("// Authorization model (schema {schema})")),
    };
    w.line("/* eslint-disable */").blank();
}

fn render_metadata(w: &mut CodeWriter, table: &SymbolTable, generated_at: DateTime<Utc>) {
    w.line(format!(
        "{GENERATED_AT_PREFIX}{};",
        ts_string(&generated_at.to_rfc3339_opts(SecondsFormat::Millis, true))
    ))
    .blank();

    let model_id = table
        .model_id
        .as_deref()
        .map(ts_string)
        .unwrap_or_else(|| "null".to_string());

    w.line("export const MODEL_METADATA = {").indent();
    w.line(format!("modelId: {model_id},"));
    w.line(format!("schemaVersion: {},", ts_string(&table.schema_version)));
    w.line(format!(
        "objectTypes: {},",
        ts_string_array(table.object_type_names())
    ));
    w.line(format!("relations: {},", ts_string_array(table.relation_names())));
    w.line("relationsByObject: RelationsByObject,");
    w.line("relationCategories: {").indent();
    for object_type in &table.object_types {
        w.line(format!(
            "{}: {}RelationCategories,",
            ts_property_key(&ts_string(&object_type.name)),
            object_type.stem
        ));
    }
    w.dedent().line("},");
    w.line("generatedAt: GENERATED_AT,");
    w.dedent().line("} as const;");
}

/// Renders the full module source for a symbol table.
pub fn render_module(table: &SymbolTable, generated_at: DateTime<Utc>) -> String {
    let mut w = CodeWriter::new();
    render_header(&mut w, table);
    section(&mut w, "Object types", &render_object_types(table));
    section(&mut w, "Relations", &render_relation_groups(table));
    section(&mut w, "Tuple keys", &render_tuple_keys(table));
    section(&mut w, "Helpers", render_helpers());
    w.line("// ---- Metadata ----").blank();
    render_metadata(&mut w, table, generated_at);
    w.finish()
}

/// Generates a module stamped with the current time.
///
/// # Errors
///
/// See [`generate_at`].
pub fn generate(model: &AuthorizationModel) -> TypegenResult<GeneratedModule> {
    generate_at(model, Utc::now())
}

/// Generates a module for `model` with an explicit timestamp.
///
/// # Errors
///
/// - `TypegenError::MalformedModel` if the model does not validate
/// - `TypegenError::IdentifierCollision` if sanitized names collide
pub fn generate_at(
    model: &AuthorizationModel,
    generated_at: DateTime<Utc>,
) -> TypegenResult<GeneratedModule> {
    validate(model)?;
    let table = SymbolTable::build(model)?;
    let source = render_module(&table, generated_at);

    debug!(bytes = source.len(), "Rendered module source");
    info!(
        model_id = table.model_id.as_deref().unwrap_or("<none>"),
        object_types = table.object_types.len(),
        "Generated TypeScript module"
    );

    Ok(GeneratedModule {
        file_name: DEFAULT_FILE_NAME.to_string(),
        source,
        generated_at,
    })
}
