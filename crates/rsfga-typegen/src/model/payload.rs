//! OpenFGA JSON payload decoding.
//!
//! Accepts the shape returned by `GET /stores/{store_id}/authorization-models/{id}`
//! (optionally wrapped in `authorization_model`) and the `WriteAuthorizationModel`
//! request body. Relation order follows the JSON object order.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{TypegenError, TypegenResult};

use super::validation::validate;
use super::{
    AuthorizationModel, ConditionDefinition, RelationDefinition, RelationExpression,
    SubjectReference, TypeDefinition,
};

const DEFAULT_SCHEMA_VERSION: &str = "1.1";

/// Raw authorization model payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub type_definitions: Vec<TypeDefinitionPayload>,
    #[serde(default, deserialize_with = "deserialize_unique_entries")]
    pub conditions: Option<Vec<(String, Value)>>,
}

fn default_schema_version() -> String {
    DEFAULT_SCHEMA_VERSION.to_string()
}

/// Raw type definition.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDefinitionPayload {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, deserialize_with = "deserialize_unique_entries")]
    pub relations: Option<Vec<(String, Value)>>,
    #[serde(default)]
    pub metadata: Option<TypeMetadataPayload>,
}

/// JSON object members in document order. A repeated key is an error.
struct UniqueEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for UniqueEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = UniqueEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<V>(self, mut map: V) -> Result<UniqueEntries, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut seen = HashSet::new();
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    if !seen.insert(key.clone()) {
                        return Err(de::Error::custom(format!("duplicate key '{key}'")));
                    }
                    entries.push((key, value));
                }
                Ok(UniqueEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn deserialize_unique_entries<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<(String, Value)>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<UniqueEntries>::deserialize(deserializer)?;
    Ok(entries.map(|UniqueEntries(entries)| entries))
}

/// Wire shape of a single-model read response.
#[derive(Debug, Deserialize)]
struct WrappedModelPayload {
    authorization_model: ModelPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeMetadataPayload {
    #[serde(default)]
    pub relations: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RelationMetadataPayload {
    #[serde(default)]
    directly_related_user_types: Vec<RelationReferencePayload>,
}

#[derive(Debug, Clone, Deserialize)]
struct RelationReferencePayload {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    wildcard: Option<Value>,
    #[serde(default)]
    condition: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsersetPayload {
    #[serde(default)]
    this: Option<Value>,
    #[serde(default)]
    computed_userset: Option<ObjectRelationPayload>,
    #[serde(default)]
    tuple_to_userset: Option<TupleToUsersetPayload>,
    #[serde(default)]
    union: Option<UsersetsPayload>,
    #[serde(default)]
    intersection: Option<UsersetsPayload>,
    #[serde(default)]
    difference: Option<Box<DifferencePayload>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ObjectRelationPayload {
    #[serde(default)]
    relation: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TupleToUsersetPayload {
    tupleset: ObjectRelationPayload,
    computed_userset: ObjectRelationPayload,
}

#[derive(Debug, Clone, Deserialize)]
struct UsersetsPayload {
    #[serde(default)]
    child: Vec<UsersetPayload>,
}

#[derive(Debug, Clone, Deserialize)]
struct DifferencePayload {
    #[serde(default)]
    base: Option<UsersetPayload>,
    #[serde(default)]
    subtract: Option<UsersetPayload>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConditionPayload {
    #[serde(default)]
    expression: String,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
}

impl ModelPayload {
    /// Decodes a JSON document, unwrapping `authorization_model` when present.
    ///
    /// A relation or condition name that appears twice in one object is rejected.
    pub fn from_json(input: &str) -> TypegenResult<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| TypegenError::malformed(format!("invalid JSON: {e}")))?;

        let decoded = if value.get("authorization_model").is_some() {
            serde_json::from_str::<WrappedModelPayload>(input).map(|w| w.authorization_model)
        } else {
            serde_json::from_str::<ModelPayload>(input)
        };
        decoded.map_err(|e| TypegenError::malformed(format!("invalid model payload: {e}")))
    }

    /// Normalizes the payload into an [`AuthorizationModel`] without resolving references.
    pub fn into_model(self) -> TypegenResult<AuthorizationModel> {
        let mut type_definitions = Vec::with_capacity(self.type_definitions.len());
        for type_payload in self.type_definitions {
            type_definitions.push(convert_type_definition(type_payload)?);
        }

        let mut conditions = Vec::new();
        for (name, value) in self.conditions.unwrap_or_default() {
            let payload: ConditionPayload = serde_json::from_value(value).map_err(|e| {
                TypegenError::malformed(format!("condition '{name}' is invalid: {e}"))
            })?;
            let parameters = payload
                .parameters
                .unwrap_or_default()
                .into_iter()
                .map(|(param, spec)| {
                    let type_name = spec
                        .get("type_name")
                        .and_then(Value::as_str)
                        .unwrap_or("TYPE_NAME_UNSPECIFIED")
                        .to_string();
                    (param, type_name)
                })
                .collect();
            conditions.push(ConditionDefinition {
                name,
                expression: payload.expression,
                parameters,
            });
        }

        Ok(AuthorizationModel {
            id: self.id.filter(|id| !id.is_empty()),
            schema_version: self.schema_version,
            type_definitions,
            conditions,
        })
    }
}

impl AuthorizationModel {
    /// Parses and validates an OpenFGA JSON model.
    ///
    /// # Errors
    ///
    /// Returns `TypegenError::MalformedModel` if the JSON is not a model, an
    /// expression has an unrecognized shape, or a reference does not resolve.
    pub fn from_json(input: &str) -> TypegenResult<Self> {
        Self::from_payload(ModelPayload::from_json(input)?)
    }

    /// Normalizes and validates an already-decoded payload.
    pub fn from_payload(payload: ModelPayload) -> TypegenResult<Self> {
        let model = payload.into_model()?;
        validate(&model)?;
        debug!(
            types = model.type_definitions.len(),
            schema_version = %model.schema_version,
            "Decoded authorization model payload"
        );
        Ok(model)
    }
}

fn convert_type_definition(payload: TypeDefinitionPayload) -> TypegenResult<TypeDefinition> {
    let type_name = payload.type_name;
    let metadata = payload
        .metadata
        .and_then(|m| m.relations)
        .unwrap_or_default();

    let mut relations = Vec::new();
    for (relation_name, value) in payload.relations.unwrap_or_default() {
        let userset: UsersetPayload = serde_json::from_value(value).map_err(|e| {
            TypegenError::malformed(format!(
                "{type_name}#{relation_name}: unrecognized relation expression: {e}"
            ))
        })?;

        let relation_metadata: RelationMetadataPayload = match metadata.get(&relation_name) {
            Some(meta) => serde_json::from_value(meta.clone()).map_err(|e| {
                TypegenError::malformed(format!(
                    "{type_name}#{relation_name}: invalid relation metadata: {e}"
                ))
            })?,
            None => RelationMetadataPayload::default(),
        };
        let subjects: Vec<SubjectReference> = relation_metadata
            .directly_related_user_types
            .into_iter()
            .map(convert_relation_reference)
            .collect();

        let context = format!("{type_name}#{relation_name}");
        let rewrite = convert_userset(userset, &subjects, &context)?;
        relations.push(RelationDefinition::new(relation_name, rewrite));
    }

    Ok(TypeDefinition::new(type_name, relations))
}

fn convert_relation_reference(payload: RelationReferencePayload) -> SubjectReference {
    let reference = if payload.wildcard.is_some() {
        SubjectReference::wildcard(payload.type_name)
    } else {
        match payload.relation.filter(|r| !r.is_empty()) {
            Some(relation) => SubjectReference::userset(payload.type_name, relation),
            None => SubjectReference::direct(payload.type_name),
        }
    };
    match payload.condition.filter(|c| !c.is_empty()) {
        Some(condition) => reference.with_condition(condition),
        None => reference,
    }
}

/// Converts a userset payload, attaching the relation's direct subjects to `this` nodes.
fn convert_userset(
    payload: UsersetPayload,
    subjects: &[SubjectReference],
    context: &str,
) -> TypegenResult<RelationExpression> {
    let UsersetPayload {
        this,
        computed_userset,
        tuple_to_userset,
        union,
        intersection,
        difference,
    } = payload;

    let present = [
        this.is_some(),
        computed_userset.is_some(),
        tuple_to_userset.is_some(),
        union.is_some(),
        intersection.is_some(),
        difference.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    if present != 1 {
        return Err(TypegenError::malformed(format!(
            "{context}: expression node must have exactly one of this, computedUserset, \
             tupleToUserset, union, intersection, difference (found {present})"
        )));
    }

    if this.is_some() {
        return Ok(RelationExpression::Direct {
            subjects: subjects.to_vec(),
        });
    }

    if let Some(cu) = computed_userset {
        if cu.relation.is_empty() {
            return Err(TypegenError::malformed(format!(
                "{context}: computedUserset is missing a relation"
            )));
        }
        return Ok(RelationExpression::computed(cu.relation));
    }

    if let Some(ttu) = tuple_to_userset {
        if ttu.tupleset.relation.is_empty() || ttu.computed_userset.relation.is_empty() {
            return Err(TypegenError::malformed(format!(
                "{context}: tupleToUserset requires both tupleset and computedUserset relations"
            )));
        }
        return Ok(RelationExpression::tuple_to_userset(
            ttu.tupleset.relation,
            ttu.computed_userset.relation,
        ));
    }

    if let Some(union) = union {
        let children = convert_children(union, subjects, context, "union")?;
        return Ok(RelationExpression::Union { children });
    }

    if let Some(intersection) = intersection {
        let children = convert_children(intersection, subjects, context, "intersection")?;
        return Ok(RelationExpression::Intersection { children });
    }

    match difference.map(|d| *d) {
        Some(DifferencePayload {
            base: Some(base),
            subtract: Some(subtract),
        }) => Ok(RelationExpression::difference(
            convert_userset(base, subjects, context)?,
            convert_userset(subtract, subjects, context)?,
        )),
        _ => Err(TypegenError::malformed(format!(
            "{context}: difference requires both base and subtract"
        ))),
    }
}

fn convert_children(
    payload: UsersetsPayload,
    subjects: &[SubjectReference],
    context: &str,
    operator: &str,
) -> TypegenResult<Vec<RelationExpression>> {
    if payload.child.is_empty() {
        return Err(TypegenError::malformed(format!(
            "{context}: {operator} must have at least one child"
        )));
    }
    payload
        .child
        .into_iter()
        .map(|child| convert_userset(child, subjects, context))
        .collect()
}
