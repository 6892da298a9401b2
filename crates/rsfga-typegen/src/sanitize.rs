//! Identifier sanitization for generated TypeScript.
//!
//! Model names may contain characters that are not valid in identifiers
//! (`team-member`, `doc.v2`) or may be reserved words (`delete`, `class`).
//! Sanitized names replace every character outside `[A-Za-z0-9_$]` with `_`
//! and are prefixed with [`ESCAPE_PREFIX`] when they would start with a digit
//! or collide with a reserved word.
//!
//! Collision tracking is scoped: callers create one [`IdentifierScope`] per
//! model for type names and one per object type for relation names.

use std::collections::HashMap;

use crate::error::{TypegenError, TypegenResult};

/// Prefix added to identifiers that start with a digit or are reserved.
pub const ESCAPE_PREFIX: char = '_';

/// JavaScript/TypeScript reserved and strict-mode words.
const RESERVED_WORDS: &[&str] = &[
    "arguments",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

/// Returns true if `word` cannot be used as a bare identifier.
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Maps an arbitrary model name to a valid identifier.
pub fn sanitize_identifier(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if is_identifier_char(c) { c } else { '_' })
        .collect();

    let needs_escape = replaced.is_empty()
        || replaced.starts_with(|c: char| c.is_ascii_digit())
        || is_reserved_word(&replaced);

    if needs_escape {
        format!("{ESCAPE_PREFIX}{replaced}")
    } else {
        replaced
    }
}

/// Converts a sanitized identifier to a PascalCase declaration stem.
///
/// Leading underscores are kept so escaped identifiers stay escaped.
pub fn pascal_case(identifier: &str) -> String {
    let body = identifier.trim_start_matches('_');
    let mut out = identifier[..identifier.len() - body.len()].to_string();

    for segment in body.split('_').filter(|s| !s.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Tracks the identifiers handed out within one naming scope.
#[derive(Debug, Clone)]
pub struct IdentifierScope {
    label: String,
    /// identifier -> model name that claimed it
    claimed: HashMap<String, String>,
}

impl IdentifierScope {
    /// Creates an empty scope. `label` names the scope in collision errors.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            claimed: HashMap::new(),
        }
    }

    /// Sanitizes `name` and claims the result in this scope.
    ///
    /// # Errors
    ///
    /// Returns `TypegenError::IdentifierCollision` if a different name already
    /// claimed the same identifier.
    pub fn assign(&mut self, name: &str) -> TypegenResult<String> {
        let identifier = sanitize_identifier(name);
        self.claim(&identifier, name)?;
        Ok(identifier)
    }

    /// Claims an already-derived identifier on behalf of `name`.
    ///
    /// Claiming the same identifier twice for the same name is a no-op.
    pub fn claim(&mut self, identifier: &str, name: &str) -> TypegenResult<()> {
        match self.claimed.get(identifier) {
            Some(existing) if existing != name => Err(TypegenError::IdentifierCollision {
                scope: self.label.clone(),
                first: existing.clone(),
                second: name.to_string(),
                identifier: identifier.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed
                    .insert(identifier.to_string(), name.to_string());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names_pass_through() {
        assert_eq!(sanitize_identifier("organization"), "organization");
        assert_eq!(sanitize_identifier("can_view_team"), "can_view_team");
        assert_eq!(sanitize_identifier("$scope"), "$scope");
    }

    #[test]
    fn test_disallowed_characters_become_underscores() {
        assert_eq!(sanitize_identifier("team-member"), "team_member");
        assert_eq!(sanitize_identifier("doc.v2"), "doc_v2");
        assert_eq!(sanitize_identifier("café"), "caf_");
    }

    #[test]
    fn test_leading_digit_is_escaped() {
        assert_eq!(sanitize_identifier("2fa"), "_2fa");
    }

    #[test]
    fn test_reserved_words_are_escaped() {
        assert_eq!(sanitize_identifier("delete"), "_delete");
        assert_eq!(sanitize_identifier("class"), "_class");
        assert_eq!(sanitize_identifier("classes"), "classes");
    }

    #[test]
    fn test_empty_name_is_escaped() {
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("organization"), "Organization");
        assert_eq!(pascal_case("team_member"), "TeamMember");
        assert_eq!(pascal_case("teamMember"), "TeamMember");
        assert_eq!(pascal_case("_delete"), "_Delete");
        assert_eq!(pascal_case("_2fa"), "_2fa");
        assert_eq!(pascal_case("a__b"), "AB");
    }

    #[test]
    fn test_scope_detects_collision() {
        let mut scope = IdentifierScope::new("type 'document'");
        assert_eq!(scope.assign("can-view").unwrap(), "can_view");
        let err = scope.assign("can_view").unwrap_err();
        assert_eq!(
            err,
            TypegenError::IdentifierCollision {
                scope: "type 'document'".to_string(),
                first: "can-view".to_string(),
                second: "can_view".to_string(),
                identifier: "can_view".to_string(),
            }
        );
    }

    #[test]
    fn test_scope_claim_is_idempotent_for_same_name() {
        let mut scope = IdentifierScope::new("model");
        scope.claim("Document", "document").unwrap();
        scope.claim("Document", "document").unwrap();
        assert!(matches!(
            scope.claim("Document", "DOCUMENT"),
            Err(TypegenError::IdentifierCollision { ref first, .. }) if first == "document"
        ));
    }

    #[test]
    fn test_separate_scopes_do_not_interfere() {
        let mut doc = IdentifierScope::new("type 'document'");
        let mut folder = IdentifierScope::new("type 'folder'");
        assert_eq!(doc.assign("viewer").unwrap(), "viewer");
        assert_eq!(folder.assign("viewer").unwrap(), "viewer");
    }
}
