//! Reference resolution for authorization models.
//!
//! Checks that a model is internally consistent before any code is generated:
//! - Type and relation names are well formed and unique within their scope
//! - Model id and schema version are single-line
//! - Directly assignable relations declare at least one subject type
//! - Subject references name existing types, relations and conditions
//! - Computed usersets and tuple-to-userset traversals resolve

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::error::{TypegenError, TypegenResult};

use super::{AuthorizationModel, RelationExpression, SubjectKind, SubjectReference};

/// Longest type or relation name OpenFGA accepts.
const MAX_NAME_LENGTH: usize = 254;

/// Why `name` is not a usable type or relation name, if it is not.
///
/// Names are non-empty, at most [`MAX_NAME_LENGTH`] characters, and free of
/// whitespace and the tuple delimiters `:`, `#` and `@`.
fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("is empty");
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Some("is longer than 254 characters");
    }
    if name.chars().any(|c| matches!(c, ':' | '#' | '@')) {
        return Some("contains one of ':', '#' or '@'");
    }
    if name.chars().any(char::is_whitespace) {
        return Some("contains whitespace");
    }
    None
}

/// Resolves names against one model.
struct ModelValidator<'a> {
    model: &'a AuthorizationModel,
    /// Relations defined on each type: type_name -> {relation_names}
    type_relations: HashMap<&'a str, HashSet<&'a str>>,
    defined_conditions: HashSet<&'a str>,
}

impl<'a> ModelValidator<'a> {
    fn new(model: &'a AuthorizationModel) -> Self {
        let type_relations = model
            .type_definitions
            .iter()
            .map(|td| {
                let relations = td.relations.iter().map(|r| r.name.as_str()).collect();
                (td.type_name.as_str(), relations)
            })
            .collect();
        let defined_conditions = model.conditions.iter().map(|c| c.name.as_str()).collect();

        Self {
            model,
            type_relations,
            defined_conditions,
        }
    }

    fn type_exists(&self, type_name: &str) -> bool {
        self.type_relations.contains_key(type_name)
    }

    fn relation_exists(&self, type_name: &str, relation: &str) -> bool {
        self.type_relations
            .get(type_name)
            .is_some_and(|relations| relations.contains(relation))
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(id) = &self.model.id {
            if id.chars().any(char::is_control) {
                errors.push(format!("model id {id:?} contains control characters"));
            }
        }
        if self.model.schema_version.chars().any(char::is_control) {
            errors.push(format!(
                "schema version {:?} contains control characters",
                self.model.schema_version
            ));
        }

        let mut seen_types = HashSet::new();
        for type_def in &self.model.type_definitions {
            if let Some(problem) = name_problem(&type_def.type_name) {
                errors.push(format!("type name {:?} {problem}", type_def.type_name));
            }
            if !seen_types.insert(type_def.type_name.as_str()) {
                errors.push(format!("duplicate type definition '{}'", type_def.type_name));
            }

            let mut seen_relations = HashSet::new();
            for relation_def in &type_def.relations {
                if let Some(problem) = name_problem(&relation_def.name) {
                    errors.push(format!(
                        "relation name {:?} on type '{}' {problem}",
                        relation_def.name, type_def.type_name
                    ));
                }
                if !seen_relations.insert(relation_def.name.as_str()) {
                    errors.push(format!(
                        "duplicate relation '{}' on type '{}'",
                        relation_def.name, type_def.type_name
                    ));
                }
                self.validate_expression(
                    &type_def.type_name,
                    &relation_def.name,
                    &relation_def.rewrite,
                    &mut errors,
                );
            }
        }

        errors
    }

    fn validate_expression(
        &self,
        type_name: &str,
        relation_name: &str,
        expression: &RelationExpression,
        errors: &mut Vec<String>,
    ) {
        match expression {
            RelationExpression::Direct { subjects } => {
                if subjects.is_empty() {
                    errors.push(format!(
                        "{type_name}#{relation_name}: directly assignable relation declares no allowed subject types"
                    ));
                }
                for subject in subjects {
                    self.validate_subject(type_name, relation_name, subject, errors);
                }
            }
            RelationExpression::ComputedUserset { relation } => {
                if !self.relation_exists(type_name, relation) {
                    errors.push(format!(
                        "{type_name}#{relation_name}: computed userset references undefined relation '{relation}'"
                    ));
                }
            }
            RelationExpression::TupleToUserset {
                tupleset,
                computed_userset,
            } => {
                self.validate_tuple_to_userset(
                    type_name,
                    relation_name,
                    tupleset,
                    computed_userset,
                    errors,
                );
            }
            RelationExpression::Union { children }
            | RelationExpression::Intersection { children } => {
                if children.is_empty() {
                    errors.push(format!(
                        "{type_name}#{relation_name}: set operation has no operands"
                    ));
                }
                for child in children {
                    self.validate_expression(type_name, relation_name, child, errors);
                }
            }
            RelationExpression::Difference { base, subtract } => {
                self.validate_expression(type_name, relation_name, base, errors);
                self.validate_expression(type_name, relation_name, subtract, errors);
            }
        }
    }

    fn validate_subject(
        &self,
        type_name: &str,
        relation_name: &str,
        subject: &SubjectReference,
        errors: &mut Vec<String>,
    ) {
        if !self.type_exists(&subject.type_name) {
            errors.push(format!(
                "{type_name}#{relation_name}: subject reference '{subject}' names undefined type '{}'",
                subject.type_name
            ));
            return;
        }

        if let SubjectKind::Userset { relation } = &subject.kind {
            if !self.relation_exists(&subject.type_name, relation) {
                errors.push(format!(
                    "{type_name}#{relation_name}: subject reference '{subject}' names undefined relation '{relation}'"
                ));
            }
        }

        if let Some(condition) = &subject.condition {
            if !self.defined_conditions.contains(condition.as_str()) {
                errors.push(format!(
                    "{type_name}#{relation_name}: subject reference '{subject}' names undefined condition '{condition}'"
                ));
            }
        }
    }

    fn validate_tuple_to_userset(
        &self,
        type_name: &str,
        relation_name: &str,
        tupleset: &str,
        computed_userset: &str,
        errors: &mut Vec<String>,
    ) {
        // The tupleset must be a relation on this type
        let Some(tupleset_def) = self
            .model
            .get_type(type_name)
            .and_then(|td| td.get_relation(tupleset))
        else {
            errors.push(format!(
                "{type_name}#{relation_name}: tupleset references undefined relation '{tupleset}'"
            ));
            return;
        };

        // The computed relation is evaluated on whatever the tupleset points at
        let related_types: Vec<&str> = tupleset_def
            .rewrite
            .direct_subjects()
            .into_iter()
            .map(|s| s.type_name.as_str())
            .collect();

        let resolvable = if related_types.is_empty() {
            self.type_relations
                .values()
                .any(|relations| relations.contains(computed_userset))
        } else {
            related_types
                .iter()
                .any(|related| self.relation_exists(related, computed_userset))
        };

        if !resolvable {
            errors.push(format!(
                "{type_name}#{relation_name}: '{computed_userset} from {tupleset}' does not resolve on any related type"
            ));
        }
    }
}

/// Validates that every name referenced by the model resolves.
///
/// # Errors
///
/// Returns `TypegenError::MalformedModel` listing every problem found, joined by `; `.
pub fn validate(model: &AuthorizationModel) -> TypegenResult<()> {
    let errors = ModelValidator::new(model).validate();
    trace!(errors = errors.len(), "Validated authorization model");

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TypegenError::MalformedModel {
            message: errors.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ConditionDefinition, RelationDefinition, RelationExpression as Expr, SubjectReference,
        TypeDefinition,
    };

    fn user_direct() -> Expr {
        Expr::direct([SubjectReference::direct("user")])
    }

    fn create_valid_model() -> AuthorizationModel {
        AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new(
                    "organization",
                    vec![
                        RelationDefinition::new("member", user_direct()),
                        RelationDefinition::new(
                            "admin",
                            Expr::union(vec![user_direct(), Expr::computed("member")]),
                        ),
                    ],
                ),
                TypeDefinition::new(
                    "team",
                    vec![
                        RelationDefinition::new(
                            "parent_organization",
                            Expr::direct([SubjectReference::direct("organization")]),
                        ),
                        RelationDefinition::new("member", user_direct()),
                        RelationDefinition::new(
                            "can_view_team",
                            Expr::union(vec![
                                Expr::computed("member"),
                                Expr::tuple_to_userset("parent_organization", "member"),
                            ]),
                        ),
                    ],
                ),
            ],
        )
    }

    fn message(result: TypegenResult<()>) -> String {
        match result {
            Err(TypegenError::MalformedModel { message }) => message,
            other => panic!("Expected MalformedModel, got {other:?}"),
        }
    }

    #[test]
    fn test_validator_accepts_valid_model() {
        assert!(validate(&create_valid_model()).is_ok());
    }

    #[test]
    fn test_validator_accepts_empty_model() {
        assert!(validate(&AuthorizationModel::new("1.1")).is_ok());
    }

    #[test]
    fn test_validator_rejects_undefined_computed_relation() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![TypeDefinition::new(
                "document",
                vec![RelationDefinition::new("viewer", Expr::computed("nonexistent"))],
            )],
        );
        assert!(message(validate(&model)).contains("nonexistent"));
    }

    #[test]
    fn test_validator_rejects_undefined_tupleset() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![TypeDefinition::new(
                "document",
                vec![RelationDefinition::new(
                    "viewer",
                    Expr::tuple_to_userset("parent", "viewer"),
                )],
            )],
        );
        assert!(message(validate(&model)).contains("parent"));
    }

    #[test]
    fn test_validator_rejects_ttu_relation_missing_on_related_type() {
        let mut model = create_valid_model();
        model.type_definitions[2].relations[2] = RelationDefinition::new(
            "can_view_team",
            Expr::tuple_to_userset("parent_organization", "owner"),
        );
        assert!(message(validate(&model)).contains("owner from parent_organization"));
    }

    #[test]
    fn test_validator_rejects_undefined_subject_type() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![TypeDefinition::new(
                "document",
                vec![RelationDefinition::new(
                    "viewer",
                    Expr::direct([SubjectReference::direct("ghost")]),
                )],
            )],
        );
        assert!(message(validate(&model)).contains("ghost"));
    }

    #[test]
    fn test_validator_rejects_undefined_userset_subject_relation() {
        let mut model = create_valid_model();
        model.type_definitions[1].relations[0] = RelationDefinition::new(
            "member",
            Expr::direct([SubjectReference::userset("team", "lead")]),
        );
        assert!(message(validate(&model)).contains("team#lead"));
    }

    #[test]
    fn test_validator_rejects_direct_without_subjects() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![TypeDefinition::new(
                "document",
                vec![RelationDefinition::new("viewer", Expr::direct([]))],
            )],
        );
        assert!(message(validate(&model)).contains("no allowed subject types"));
    }

    #[test]
    fn test_validator_rejects_duplicate_types_and_relations() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new(
                    "doc",
                    vec![
                        RelationDefinition::new("viewer", user_direct()),
                        RelationDefinition::new("viewer", user_direct()),
                    ],
                ),
            ],
        );
        let msg = message(validate(&model));
        assert!(msg.contains("duplicate type definition 'user'"));
        assert!(msg.contains("duplicate relation 'viewer'"));
    }

    #[test]
    fn test_validator_rejects_names_with_tuple_delimiters() {
        for bad in ["doc:v2", "doc#1", "doc@x", "two words", "tab\tname"] {
            let model =
                AuthorizationModel::with_types("1.1", vec![TypeDefinition::new(bad, vec![])]);
            let msg = message(validate(&model));
            assert!(msg.contains("type name"), "{bad:?}: {msg}");
        }

        let model = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user", vec![]),
                TypeDefinition::new(
                    "doc",
                    vec![RelationDefinition::new("can view", user_direct())],
                ),
            ],
        );
        let msg = message(validate(&model));
        assert!(msg.contains("relation name \"can view\" on type 'doc'"), "{msg}");
    }

    #[test]
    fn test_validator_enforces_name_length() {
        let longest = "t".repeat(MAX_NAME_LENGTH);
        let model =
            AuthorizationModel::with_types("1.1", vec![TypeDefinition::new(&longest, vec![])]);
        assert!(validate(&model).is_ok());

        let too_long = "t".repeat(MAX_NAME_LENGTH + 1);
        let model =
            AuthorizationModel::with_types("1.1", vec![TypeDefinition::new(&too_long, vec![])]);
        assert!(message(validate(&model)).contains("longer than 254"));
    }

    #[test]
    fn test_validator_rejects_multiline_id_and_schema_version() {
        let model = create_valid_model().with_id("01HV\nexport const x = 1;");
        assert!(message(validate(&model)).contains("model id"));

        let mut model = create_valid_model();
        model.schema_version = "1.1\r\n".to_string();
        assert!(message(validate(&model)).contains("schema version"));
    }

    #[test]
    fn test_validator_checks_conditions() {
        let mut model = create_valid_model();
        model.type_definitions[1].relations[0] = RelationDefinition::new(
            "member",
            Expr::direct([SubjectReference::direct("user").with_condition("in_region")]),
        );
        assert!(message(validate(&model)).contains("in_region"));

        model.conditions.push(ConditionDefinition {
            name: "in_region".to_string(),
            expression: "region == 'eu'".to_string(),
            parameters: vec![],
        });
        assert!(validate(&model).is_ok());
    }
}
