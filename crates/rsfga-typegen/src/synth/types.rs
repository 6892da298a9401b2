//! Object-type constants, relation groups and tuple-key declarations.

use crate::classify::RelationCategory;
use crate::symbols::{ObjectTypeSymbol, SymbolTable};

use super::{ts_property_key, ts_string, ts_string_array, ts_template_text, CodeWriter};

/// `<Stem>Type` constants, the `ObjectTypes` map and `ObjectTypeName`.
pub fn render_object_types(table: &SymbolTable) -> String {
    let mut w = CodeWriter::new();

    for object_type in &table.object_types {
        w.line(format!(
            "export const {}Type = {} as const;",
            object_type.stem,
            ts_string(&object_type.name)
        ));
    }
    if !table.object_types.is_empty() {
        w.blank();
    }

    w.line("export const ObjectTypes = {").indent();
    for object_type in &table.object_types {
        w.line(format!(
            "{}: {}Type,",
            ts_property_key(&object_type.identifier),
            object_type.stem
        ));
    }
    w.dedent().line("} as const;").blank();

    if table.object_types.is_empty() {
        w.line("export type ObjectTypeName = never;");
    } else {
        w.line("export type ObjectTypeName = (typeof ObjectTypes)[keyof typeof ObjectTypes];");
    }

    w.finish()
}

fn render_relation_group(w: &mut CodeWriter, object_type: &ObjectTypeSymbol) {
    let stem = &object_type.stem;

    if object_type.relations.is_empty() {
        w.line(format!("export const {stem}Relations = {{}} as const;"));
        w.line(format!("export type {stem}Relation = never;"));
    } else {
        w.line(format!("export const {stem}Relations = {{")).indent();
        for relation in &object_type.relations {
            w.line(format!(
                "{}: {},",
                ts_property_key(&relation.identifier),
                ts_string(&relation.name)
            ));
        }
        w.dedent().line("} as const;");
        w.line(format!(
            "export type {stem}Relation = (typeof {stem}Relations)[keyof typeof {stem}Relations];"
        ));
    }

    w.line(format!("export const {stem}RelationCategories = {{")).indent();
    for category in RelationCategory::ALL {
        let names = object_type.relations_in(category).map(|r| r.name.as_str());
        w.line(format!("{}: {},", category, ts_string_array(names)));
    }
    w.dedent().line("} as const;");
}

/// Per-type relation groups followed by `RelationMap` and `RelationsByObject`.
pub fn render_relation_groups(table: &SymbolTable) -> String {
    let mut w = CodeWriter::new();

    for object_type in &table.object_types {
        render_relation_group(&mut w, object_type);
        w.blank();
    }

    w.line("export interface RelationMap {").indent();
    for object_type in &table.object_types {
        w.line(format!("{}: {}Relation;", ts_string(&object_type.name), object_type.stem));
    }
    w.dedent().line("}").blank();

    w.line("export const RelationsByObject = {").indent();
    for object_type in &table.object_types {
        let names = object_type.relations.iter().map(|r| r.name.as_str());
        w.line(format!(
            "{}: {},",
            ts_property_key(&ts_string(&object_type.name)),
            ts_string_array(names)
        ));
    }
    w.dedent().line("} as const;");

    w.finish()
}

/// Condition names, per-type tuple-key interfaces and the `TupleKey` union.
pub fn render_tuple_keys(table: &SymbolTable) -> String {
    let mut w = CodeWriter::new();

    w.line(format!(
        "export const ConditionNames = {} as const;",
        ts_string_array(table.conditions.iter().map(String::as_str))
    ));
    if table.conditions.is_empty() {
        w.line("export type ConditionName = string;");
    } else {
        w.line("export type ConditionName = (typeof ConditionNames)[number];");
    }
    w.blank();

    w.line("export interface TupleKeyCondition {").indent();
    w.line("name: ConditionName;");
    w.line("context?: Record<string, unknown>;");
    w.dedent().line("}").blank();

    for object_type in &table.object_types {
        let stem = &object_type.stem;
        w.line(format!("export interface {stem}TupleKey {{")).indent();
        w.line(format!("type: typeof {stem}Type;"));
        w.line(format!(
            "object: `{}:${{string}}`;",
            ts_template_text(&object_type.name)
        ));
        w.line(format!("relation: {stem}Relation;"));
        w.line("user: string;");
        w.line("condition?: TupleKeyCondition;");
        w.dedent().line("}").blank();
    }

    w.line("export interface TupleKeyMap {").indent();
    for object_type in &table.object_types {
        w.line(format!("{}: {}TupleKey;", ts_string(&object_type.name), object_type.stem));
    }
    w.dedent().line("}").blank();

    if table.object_types.is_empty() {
        w.line("export type TupleKey = never;");
    } else {
        w.line("export type TupleKey =").indent();
        let last = table.object_types.len() - 1;
        for (i, object_type) in table.object_types.iter().enumerate() {
            let terminator = if i == last { ";" } else { "" };
            w.line(format!("| {}TupleKey{terminator}", object_type.stem));
        }
        w.dedent();
    }

    w.finish()
}
