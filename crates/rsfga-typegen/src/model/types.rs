//! Core type definitions for the authorization model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An authorization model defining types and their relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Model ID assigned by the authorization service, if known.
    pub id: Option<String>,
    /// Schema version (e.g., "1.1").
    pub schema_version: String,
    /// Type definitions in declaration order.
    pub type_definitions: Vec<TypeDefinition>,
    /// Conditions declared by the model.
    pub conditions: Vec<ConditionDefinition>,
}

impl AuthorizationModel {
    /// Creates an empty model with the given schema version.
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            id: None,
            schema_version: schema_version.into(),
            type_definitions: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Creates a model from a list of type definitions.
    pub fn with_types(schema_version: impl Into<String>, types: Vec<TypeDefinition>) -> Self {
        Self {
            type_definitions: types,
            ..Self::new(schema_version)
        }
    }

    /// Sets the model id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Looks up a type definition by name.
    pub fn get_type(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.type_definitions
            .iter()
            .find(|td| td.type_name == type_name)
    }

    /// Checks if a relation exists on a type.
    pub fn has_relation(&self, type_name: &str, relation: &str) -> bool {
        self.get_type(type_name)
            .is_some_and(|td| td.get_relation(relation).is_some())
    }
}

/// A type definition within the authorization model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// The type name (e.g., "document", "folder").
    pub type_name: String,
    /// Relations defined on this type, in declaration order.
    pub relations: Vec<RelationDefinition>,
}

impl TypeDefinition {
    /// Creates a type definition.
    pub fn new(type_name: impl Into<String>, relations: Vec<RelationDefinition>) -> Self {
        Self {
            type_name: type_name.into(),
            relations,
        }
    }

    /// Looks up a relation by name.
    pub fn get_relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// A relation definition on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The relation name.
    pub name: String,
    /// The rewrite expression for this relation.
    pub rewrite: RelationExpression,
}

impl RelationDefinition {
    pub fn new(name: impl Into<String>, rewrite: RelationExpression) -> Self {
        Self {
            name: name.into(),
            rewrite,
        }
    }
}

/// A condition declared at model level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    /// Condition name as referenced by `with <name>`.
    pub name: String,
    /// The CEL expression, kept verbatim.
    pub expression: String,
    /// Parameter names with their declared type names.
    pub parameters: Vec<(String, String)>,
}

/// The subject kinds allowed by a direct assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    /// `user`
    Type,
    /// `group#member`
    Userset { relation: String },
    /// `user:*`
    Wildcard,
}

/// An allowed subject reference on a direct assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectReference {
    /// The referenced type.
    pub type_name: String,
    /// Plain type, userset or wildcard.
    pub kind: SubjectKind,
    /// Optional condition name (`with <condition>`).
    pub condition: Option<String>,
}

impl SubjectReference {
    /// `<type>`
    pub fn direct(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kind: SubjectKind::Type,
            condition: None,
        }
    }

    /// `<type>#<relation>`
    pub fn userset(type_name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kind: SubjectKind::Userset {
                relation: relation.into(),
            },
            condition: None,
        }
    }

    /// `<type>:*`
    pub fn wildcard(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kind: SubjectKind::Wildcard,
            condition: None,
        }
    }

    /// Attaches a condition name.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

impl fmt::Display for SubjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SubjectKind::Type => write!(f, "{}", self.type_name)?,
            SubjectKind::Userset { relation } => write!(f, "{}#{}", self.type_name, relation)?,
            SubjectKind::Wildcard => write!(f, "{}:*", self.type_name)?,
        }
        if let Some(condition) = &self.condition {
            write!(f, " with {condition}")?;
        }
        Ok(())
    }
}

/// A relation expression defines how membership in a relation is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationExpression {
    /// Direct assignment restricted to the listed subject references.
    Direct { subjects: Vec<SubjectReference> },
    /// Another relation on the same object.
    ComputedUserset { relation: String },
    /// `computed_userset from tupleset`.
    TupleToUserset {
        tupleset: String,
        computed_userset: String,
    },
    /// Union of multiple expressions.
    Union { children: Vec<RelationExpression> },
    /// Intersection of multiple expressions.
    Intersection { children: Vec<RelationExpression> },
    /// Base but not subtract.
    Difference {
        base: Box<RelationExpression>,
        subtract: Box<RelationExpression>,
    },
}

impl RelationExpression {
    /// Direct assignment from a list of subject references.
    pub fn direct(subjects: impl IntoIterator<Item = SubjectReference>) -> Self {
        Self::Direct {
            subjects: subjects.into_iter().collect(),
        }
    }

    pub fn computed(relation: impl Into<String>) -> Self {
        Self::ComputedUserset {
            relation: relation.into(),
        }
    }

    pub fn tuple_to_userset(
        tupleset: impl Into<String>,
        computed_userset: impl Into<String>,
    ) -> Self {
        Self::TupleToUserset {
            tupleset: tupleset.into(),
            computed_userset: computed_userset.into(),
        }
    }

    pub fn union(children: Vec<RelationExpression>) -> Self {
        Self::Union { children }
    }

    pub fn intersection(children: Vec<RelationExpression>) -> Self {
        Self::Intersection { children }
    }

    pub fn difference(base: RelationExpression, subtract: RelationExpression) -> Self {
        Self::Difference {
            base: Box::new(base),
            subtract: Box::new(subtract),
        }
    }

    /// Returns true if a `TupleToUserset` node appears anywhere in the tree.
    pub fn contains_tuple_to_userset(&self) -> bool {
        match self {
            Self::TupleToUserset { .. } => true,
            Self::Direct { .. } | Self::ComputedUserset { .. } => false,
            Self::Union { children } | Self::Intersection { children } => {
                children.iter().any(Self::contains_tuple_to_userset)
            }
            Self::Difference { base, subtract } => {
                base.contains_tuple_to_userset() || subtract.contains_tuple_to_userset()
            }
        }
    }

    /// Collects the subject references of every `Direct` node in the tree.
    pub fn direct_subjects(&self) -> Vec<&SubjectReference> {
        let mut out = Vec::new();
        self.collect_direct_subjects(&mut out);
        out
    }

    fn collect_direct_subjects<'a>(&'a self, out: &mut Vec<&'a SubjectReference>) {
        match self {
            Self::Direct { subjects } => out.extend(subjects.iter()),
            Self::ComputedUserset { .. } | Self::TupleToUserset { .. } => {}
            Self::Union { children } | Self::Intersection { children } => {
                for child in children {
                    child.collect_direct_subjects(out);
                }
            }
            Self::Difference { base, subtract } => {
                base.collect_direct_subjects(out);
                subtract.collect_direct_subjects(out);
            }
        }
    }
}

/// A parsed object reference (`type:id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Object {
    /// The type portion (e.g., "document").
    pub object_type: String,
    /// The ID portion (e.g., "readme").
    pub object_id: String,
}

impl Object {
    /// Creates a new Object from type and ID.
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

/// Optional condition attached to a tuple key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleCondition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

/// A tuple key representing one relationship assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleKey {
    /// The object type discriminator.
    #[serde(rename = "type")]
    pub object_type: String,
    /// The object in `type:id` form.
    pub object: String,
    /// The relation between user and object.
    pub relation: String,
    /// The subject of the relationship.
    pub user: String,
    /// Optional condition payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<TupleCondition>,
}
