//! Symbol table shared by the synthesizers and the emitter.
//!
//! Built once per run from a resolved model: every object type and relation
//! gets its sanitized identifier and every relation its category. Nothing is
//! cached between runs.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::classify::{classify, RelationCategory};
use crate::error::TypegenResult;
use crate::model::AuthorizationModel;
use crate::sanitize::{pascal_case, IdentifierScope};

/// One relation of an object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSymbol {
    /// Relation name as declared in the model.
    pub name: String,
    /// Sanitized identifier, unique within the object type.
    pub identifier: String,
    pub category: RelationCategory,
}

/// One object type with its relations in model order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTypeSymbol {
    /// Type name as declared in the model.
    pub name: String,
    /// Sanitized identifier, unique within the model.
    pub identifier: String,
    /// PascalCase stem for generated declarations (`<stem>TupleKey`).
    pub stem: String,
    pub relations: Vec<RelationSymbol>,
}

impl ObjectTypeSymbol {
    pub fn relation(&self, name: &str) -> Option<&RelationSymbol> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relation(name).is_some()
    }

    /// Relations of one category, in model order.
    pub fn relations_in(
        &self,
        category: RelationCategory,
    ) -> impl Iterator<Item = &RelationSymbol> + '_ {
        self.relations
            .iter()
            .filter(move |r| r.category == category)
    }
}

/// Per-run naming and classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pub model_id: Option<String>,
    pub schema_version: String,
    /// Object types in model order.
    pub object_types: Vec<ObjectTypeSymbol>,
    /// Declared condition names in model order.
    pub conditions: Vec<String>,
}

impl SymbolTable {
    /// Sanitizes and classifies every type and relation of a resolved model.
    ///
    /// # Errors
    ///
    /// Returns `TypegenError::IdentifierCollision` if two type names (or two
    /// relation names of one type) map to the same generated identifier.
    pub fn build(model: &AuthorizationModel) -> TypegenResult<Self> {
        let mut type_scope = IdentifierScope::new("model type names");
        let mut stem_scope = IdentifierScope::new("model type declarations");
        let mut object_types = Vec::with_capacity(model.type_definitions.len());

        for type_def in &model.type_definitions {
            let identifier = type_scope.assign(&type_def.type_name)?;
            let stem = pascal_case(&identifier);
            stem_scope.claim(&stem, &type_def.type_name)?;

            let mut relation_scope =
                IdentifierScope::new(format!("relations of type '{}'", type_def.type_name));
            let mut relations = Vec::with_capacity(type_def.relations.len());
            for relation_def in &type_def.relations {
                let relation_identifier = relation_scope.assign(&relation_def.name)?;
                let category = classify(&relation_def.rewrite);
                trace!(
                    object_type = %type_def.type_name,
                    relation = %relation_def.name,
                    %category,
                    "Classified relation"
                );
                relations.push(RelationSymbol {
                    name: relation_def.name.clone(),
                    identifier: relation_identifier,
                    category,
                });
            }

            object_types.push(ObjectTypeSymbol {
                name: type_def.type_name.clone(),
                identifier,
                stem,
                relations,
            });
        }

        debug!(
            object_types = object_types.len(),
            relations = object_types.iter().map(|t| t.relations.len()).sum::<usize>(),
            "Built symbol table"
        );

        Ok(Self {
            model_id: model.id.clone(),
            schema_version: model.schema_version.clone(),
            object_types,
            conditions: model.conditions.iter().map(|c| c.name.clone()).collect(),
        })
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectTypeSymbol> {
        self.object_types.iter().find(|t| t.name == name)
    }

    /// Object type names in model order.
    pub fn object_type_names(&self) -> Vec<&str> {
        self.object_types.iter().map(|t| t.name.as_str()).collect()
    }

    /// Every relation name in the model, first occurrence order, without duplicates.
    pub fn relation_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.object_types
            .iter()
            .flat_map(|t| t.relations.iter())
            .map(|r| r.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypegenError;
    use crate::model::{
        RelationDefinition, RelationExpression as Expr, SubjectReference, TypeDefinition,
    };

    fn user() -> Expr {
        Expr::direct([SubjectReference::direct("user")])
    }

    fn org_model() -> AuthorizationModel {
        AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new(
                    "organization",
                    vec![
                        RelationDefinition::new("owner", user()),
                        RelationDefinition::new(
                            "admin",
                            Expr::union(vec![user(), Expr::computed("owner")]),
                        ),
                    ],
                ),
            ],
        )
        .with_id("01ARZ3NDEKTSV4RRFFQ69G5FAV")
    }

    #[test]
    fn test_build_assigns_identifiers_and_categories() {
        let table = SymbolTable::build(&org_model()).unwrap();
        assert_eq!(table.model_id.as_deref(), Some("01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        assert_eq!(table.object_type_names(), vec!["user", "organization"]);

        let org = table.object_type("organization").unwrap();
        assert_eq!(org.stem, "Organization");
        assert_eq!(
            org.relation("owner").map(|r| r.category),
            Some(RelationCategory::Direct)
        );
        assert_eq!(
            org.relation("admin").map(|r| r.category),
            Some(RelationCategory::Computed)
        );
    }

    #[test]
    fn test_type_name_collision_is_reported() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("team-member", vec![]),
                TypeDefinition::new("team_member", vec![]),
            ],
        );
        let err = SymbolTable::build(&model).unwrap_err();
        assert!(matches!(
            err,
            TypegenError::IdentifierCollision { ref identifier, .. } if identifier == "team_member"
        ));
    }

    #[test]
    fn test_declaration_stem_collision_is_reported() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("team_member", vec![]),
                TypeDefinition::new("teamMember", vec![]),
            ],
        );
        let err = SymbolTable::build(&model).unwrap_err();
        assert!(matches!(
            err,
            TypegenError::IdentifierCollision { ref identifier, .. } if identifier == "TeamMember"
        ));
    }

    #[test]
    fn test_relation_collision_is_scoped_per_type() {
        let same_name_other_types = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new("doc", vec![RelationDefinition::new("can-view", user())]),
                TypeDefinition::new("folder", vec![RelationDefinition::new("can_view", user())]),
            ],
        );
        assert!(SymbolTable::build(&same_name_other_types).is_ok());

        let same_type = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new(
                    "doc",
                    vec![
                        RelationDefinition::new("can-view", user()),
                        RelationDefinition::new("can_view", user()),
                    ],
                ),
            ],
        );
        let err = SymbolTable::build(&same_type).unwrap_err();
        assert!(matches!(
            err,
            TypegenError::IdentifierCollision { ref scope, .. } if scope.contains("doc")
        ));
    }

    #[test]
    fn test_relation_names_are_deduplicated_in_order() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new(
                    "doc",
                    vec![
                        RelationDefinition::new("viewer", user()),
                        RelationDefinition::new("owner", user()),
                    ],
                ),
                TypeDefinition::new(
                    "folder",
                    vec![
                        RelationDefinition::new("owner", user()),
                        RelationDefinition::new("parent", user()),
                    ],
                ),
            ],
        );
        let table = SymbolTable::build(&model).unwrap();
        assert_eq!(table.relation_names(), vec!["viewer", "owner", "parent"]);
    }

    #[test]
    fn test_categories_partition_relations() {
        let table = SymbolTable::build(&org_model()).unwrap();
        for object_type in &table.object_types {
            let total: usize = RelationCategory::ALL
                .iter()
                .map(|c| object_type.relations_in(*c).count())
                .sum();
            assert_eq!(total, object_type.relations.len());
        }
    }
}
