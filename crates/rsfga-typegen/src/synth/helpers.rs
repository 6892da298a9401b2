//! Tuple-key helpers.
//!
//! [`render_helpers`] emits the TypeScript functions; [`TupleKeyHelpers`]
//! applies the same rules from Rust over a [`SymbolTable`], so callers and
//! tests can check a generated module's behavior without a JS runtime.

use crate::error::{TypegenError, TypegenResult};
use crate::model::{Object, TupleCondition, TupleKey};
use crate::symbols::SymbolTable;

/// Separator between object type and object id.
pub const OBJECT_SEPARATOR: char = ':';

const HELPERS_TS: &str = r#"export class EmptyIdentifierError extends Error {
  readonly objectType: string;

  constructor(objectType: string) {
    super(`object id for type '${objectType}' cannot be empty`);
    this.name = "EmptyIdentifierError";
    this.objectType = objectType;
  }
}

export class UnknownRelationError extends Error {
  readonly objectType: string;
  readonly relation: string;

  constructor(objectType: string, relation: string) {
    super(`relation '${relation}' is not defined on type '${objectType}'`);
    this.name = "UnknownRelationError";
    this.objectType = objectType;
    this.relation = relation;
  }
}

export interface ParsedObject {
  type: ObjectTypeName;
  id: string;
}

export function isObjectType(value: string): value is ObjectTypeName {
  return Object.prototype.hasOwnProperty.call(RelationsByObject, value);
}

export function formatObject<T extends ObjectTypeName>(type: T, id: string): `${T}:${string}` {
  if (id.length === 0) {
    throw new EmptyIdentifierError(type);
  }
  return `${type}:${id}`;
}

export function parseObject(value: string): ParsedObject | null {
  const separator = value.indexOf(":");
  if (separator < 0) {
    return null;
  }
  const type = value.slice(0, separator);
  const id = value.slice(separator + 1);
  if (id.length === 0 || !isObjectType(type)) {
    return null;
  }
  return { type, id };
}

export function isValidRelation(type: string, relation: string): boolean {
  if (!isObjectType(type)) {
    return false;
  }
  const relations: readonly string[] = RelationsByObject[type];
  return relations.includes(relation);
}

export function buildTupleKey<T extends ObjectTypeName>(
  type: T,
  id: string,
  relation: string,
  user: string,
  condition?: TupleKeyCondition,
): TupleKeyMap[T] {
  if (!isValidRelation(type, relation)) {
    throw new UnknownRelationError(type, relation);
  }
  const key = {
    type,
    object: formatObject(type, id),
    relation,
    user,
    ...(condition === undefined ? {} : { condition }),
  };
  return key as unknown as TupleKeyMap[T];
}
"#;

/// The helper functions and error classes of a generated module.
///
/// The text references `RelationsByObject`, `ObjectTypeName`,
/// `TupleKeyCondition` and `TupleKeyMap`, which the type synthesizer declares.
pub fn render_helpers() -> &'static str {
    HELPERS_TS
}

/// Rust counterpart of the generated helpers.
#[derive(Debug, Clone, Copy)]
pub struct TupleKeyHelpers<'a> {
    table: &'a SymbolTable,
}

impl<'a> TupleKeyHelpers<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Formats `<type>:<id>`.
    ///
    /// # Errors
    ///
    /// Returns `TypegenError::EmptyIdentifier` if `id` is empty.
    pub fn format_object(&self, object_type: &str, id: &str) -> TypegenResult<String> {
        if id.is_empty() {
            return Err(TypegenError::EmptyIdentifier {
                object_type: object_type.to_string(),
            });
        }
        Ok(format!("{object_type}{OBJECT_SEPARATOR}{id}"))
    }

    /// Splits on the first separator. Returns `None` if there is no
    /// separator, the id is empty, or the type is not in the model.
    pub fn parse_object(&self, value: &str) -> Option<Object> {
        let (object_type, id) = value.split_once(OBJECT_SEPARATOR)?;
        if id.is_empty() || self.table.object_type(object_type).is_none() {
            return None;
        }
        Some(Object::new(object_type, id))
    }

    pub fn is_valid_relation(&self, object_type: &str, relation: &str) -> bool {
        self.table
            .object_type(object_type)
            .is_some_and(|t| t.has_relation(relation))
    }

    /// Builds a tuple key after checking the relation against the model.
    ///
    /// # Errors
    ///
    /// - `TypegenError::UnknownObjectType` if the type is not in the model
    /// - `TypegenError::UnknownRelation` if the type does not define `relation`
    /// - `TypegenError::EmptyIdentifier` if `id` is empty
    pub fn build_tuple_key(
        &self,
        object_type: &str,
        id: &str,
        relation: &str,
        user: &str,
        condition: Option<TupleCondition>,
    ) -> TypegenResult<TupleKey> {
        let symbol =
            self.table
                .object_type(object_type)
                .ok_or_else(|| TypegenError::UnknownObjectType {
                    object_type: object_type.to_string(),
                })?;
        if !symbol.has_relation(relation) {
            return Err(TypegenError::UnknownRelation {
                object_type: object_type.to_string(),
                relation: relation.to_string(),
            });
        }

        Ok(TupleKey {
            object_type: object_type.to_string(),
            object: self.format_object(object_type, id)?,
            relation: relation.to_string(),
            user: user.to_string(),
            condition,
        })
    }
}
