//! DSL parser for OpenFGA authorization models.
//!
//! Parses the OpenFGA DSL format into AuthorizationModel structures.
//!
//! Example DSL:
//! ```text
//! model
//!   schema 1.1
//!
//! type user
//!
//! type organization
//!   relations
//!     define owner: [user]
//!     define admin: [user] or owner
//!     define member: [user, team#member] or admin
//!
//! condition in_region(region: string) {
//!   region == "eu"
//! }
//! ```
//!
//! Operator precedence (highest to lowest): `and`, `or`, `but not`. A trailing
//! `but not` applies to everything before it; parentheses group explicitly.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1, space0, space1},
    combinator::{all_consuming, map, opt, recognize, value},
    error::{context, ContextError, ParseError},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{TypegenError, TypegenResult};

use super::validation::validate;
use super::{
    AuthorizationModel, ConditionDefinition, RelationDefinition, RelationExpression,
    SubjectKind, SubjectReference, TypeDefinition,
};

/// Parser error type with context for better error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
}

impl ParserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn with_position(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "{} at position {}", self.message, pos)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParserError {}

impl From<ParserError> for TypegenError {
    fn from(err: ParserError) -> Self {
        TypegenError::MalformedModel {
            message: err.to_string(),
        }
    }
}

/// Result type for parser operations.
pub type ParserResult<T> = Result<T, ParserError>;

// ============ Helper Parsers ============

/// Parse a comment (# to end of line)
fn comment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), pair(char('#'), take_while(|c| c != '\n' && c != '\r')))(input)
}

/// Parse whitespace including comments
fn ws<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

/// Reserved keywords that cannot be used as identifiers
const RESERVED_KEYWORDS: &[&str] = &[
    "model",
    "schema",
    "type",
    "relations",
    "define",
    "condition",
    "with",
    "or",
    "and",
    "but",
    "not",
    "from",
];

fn is_reserved(s: &str) -> bool {
    RESERVED_KEYWORDS.contains(&s)
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// Parse an identifier (not a reserved keyword)
fn identifier<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (rest, id) = take_while1(is_identifier_char)(input)?;

    if is_reserved(id) {
        return Err(nom::Err::Error(E::from_error_kind(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }

    Ok((rest, id))
}

// ============ Type Restriction Parsers ============

/// Parse one subject reference: `user`, `user:*`, `group#member`, `user with cond`
fn subject_reference<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, SubjectReference, E> {
    let (rest, type_name) = identifier(input)?;
    let (rest, kind) = opt(alt((
        value(SubjectKind::Wildcard, tag(":*")),
        map(preceded(char('#'), identifier), |relation: &str| {
            SubjectKind::Userset {
                relation: relation.to_string(),
            }
        }),
    )))(rest)?;
    let (rest, condition) = opt(preceded(
        tuple((space1, tag("with"), space1)),
        identifier,
    ))(rest)?;

    Ok((
        rest,
        SubjectReference {
            type_name: type_name.to_string(),
            kind: kind.unwrap_or(SubjectKind::Type),
            condition: condition.map(str::to_string),
        },
    ))
}

/// Parse a type restriction like [user] or [user, group#member, user:*]
fn type_restriction<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    context(
        "type restriction",
        map(
            delimited(
                pair(char('['), space0),
                separated_list1(tuple((space0, char(','), space0)), subject_reference),
                pair(space0, char(']')),
            ),
            |subjects| RelationExpression::Direct { subjects },
        ),
    )(input)
}

// ============ Expression Parsers ============

/// Parse a direct relation reference (just a relation name)
fn computed_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    map(identifier, |name: &str| RelationExpression::computed(name))(input)
}

/// Parse "relation from tupleset" (tuple to userset)
fn tuple_to_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    context(
        "tuple to userset",
        map(
            tuple((identifier, space1, tag("from"), space1, identifier)),
            |(computed, _, _, _, tupleset): (&str, _, _, _, &str)| {
                RelationExpression::tuple_to_userset(tupleset, computed)
            },
        ),
    )(input)
}

/// Parse a parenthesized sub-expression
fn parenthesized<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    context(
        "parenthesized expression",
        delimited(
            pair(char('('), space0),
            expression,
            pair(space0, char(')')),
        ),
    )(input)
}

/// Parse an operand
fn operand<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    alt((
        type_restriction,
        parenthesized,
        tuple_to_userset,
        computed_userset,
    ))(input)
}

/// Parse intersection level (and binds tighter than or)
fn intersection_level<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    let (rest, first) = operand(input)?;

    let (rest, and_operands) =
        many0(preceded(tuple((space0, tag("and"), space1)), operand))(rest)?;

    if and_operands.is_empty() {
        Ok((rest, first))
    } else {
        let mut children = vec![first];
        children.extend(and_operands);
        Ok((rest, RelationExpression::Intersection { children }))
    }
}

/// Parse union level
fn union_level<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    let (rest, first) = intersection_level(input)?;

    let (rest, or_operands) = many0(preceded(
        tuple((space0, tag("or"), space1)),
        intersection_level,
    ))(rest)?;

    if or_operands.is_empty() {
        Ok((rest, first))
    } else {
        let mut children = vec![first];
        children.extend(or_operands);
        Ok((rest, RelationExpression::Union { children }))
    }
}

/// Parse a complete expression: a union level optionally followed by `but not`
fn expression<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationExpression, E> {
    let (rest, base) = union_level(input)?;

    let (rest, subtract) = opt(preceded(
        tuple((space1, tag("but"), space1, tag("not"), space1)),
        operand,
    ))(rest)?;

    match subtract {
        Some(subtract) => Ok((rest, RelationExpression::difference(base, subtract))),
        None => Ok((rest, base)),
    }
}

// ============ Relation Definition Parser ============

/// Parse a relation definition like "define viewer: [user] or editor"
fn relation_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationDefinition, E> {
    context(
        "relation definition",
        map(
            tuple((
                space0,
                tag("define"),
                space1,
                identifier,
                space0,
                char(':'),
                space0,
                expression,
            )),
            |(_, _, _, name, _, _, _, rewrite): (_, _, _, &str, _, _, _, RelationExpression)| {
                RelationDefinition::new(name, rewrite)
            },
        ),
    )(input)
}

// ============ Type Definition Parser ============

/// Parse a type definition with optional relations
fn type_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeDefinition, E> {
    context(
        "type definition",
        map(
            tuple((
                tag("type"),
                space1,
                identifier,
                ws,
                opt(preceded(
                    tuple((tag("relations"), ws)),
                    many0(terminated(relation_definition, ws)),
                )),
            )),
            |(_, _, type_name, _, relations): (_, _, &str, _, _)| {
                TypeDefinition::new(type_name, relations.unwrap_or_default())
            },
        ),
    )(input)
}

// ============ Condition Parser ============

/// Parse a condition parameter type such as `string` or `map<string>`
fn parameter_type<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
        opt(delimited(char('<'), take_while1(|c| c != '>'), char('>'))),
    ))(input)
}

fn condition_parameter<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (String, String), E> {
    map(
        tuple((identifier, space0, char(':'), space0, parameter_type)),
        |(name, _, _, _, type_name): (&str, _, _, _, &str)| {
            (name.to_string(), type_name.to_string())
        },
    )(input)
}

/// Take a `{ ... }` block with balanced braces, returning the trimmed body.
fn braced_block<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (body, _) = char('{')(input)?;
    let mut depth = 1usize;
    for (idx, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[idx + 1..], body[..idx].trim()));
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(E::from_error_kind(
        input,
        nom::error::ErrorKind::TakeUntil,
    )))
}

/// Parse `condition name(param: type, ...) { expression }`
fn condition_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, ConditionDefinition, E> {
    context(
        "condition definition",
        map(
            tuple((
                tag("condition"),
                space1,
                identifier,
                space0,
                delimited(
                    pair(char('('), ws),
                    separated_list0(tuple((ws, char(','), ws)), condition_parameter),
                    pair(ws, char(')')),
                ),
                ws,
                braced_block,
            )),
            |(_, _, name, _, parameters, _, body): (
                _,
                _,
                &str,
                _,
                Vec<(String, String)>,
                _,
                &str,
            )| ConditionDefinition {
                name: name.to_string(),
                expression: body.to_string(),
                parameters,
            },
        ),
    )(input)
}

// ============ Model Parser ============

enum Item {
    Type(TypeDefinition),
    Condition(ConditionDefinition),
}

/// Parse the optional `model schema 1.1` header
fn model_header<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    context(
        "model header",
        preceded(
            tuple((tag("model"), ws, tag("schema"), space1)),
            take_while1(|c: char| c.is_ascii_digit() || c == '.'),
        ),
    )(input)
}

/// Parse a complete authorization model
fn model<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, AuthorizationModel, E> {
    context(
        "authorization model",
        map(
            tuple((
                ws,
                opt(terminated(model_header, ws)),
                many0(terminated(
                    alt((
                        map(type_definition, Item::Type),
                        map(condition_definition, Item::Condition),
                    )),
                    ws,
                )),
            )),
            |(_, schema_version, items)| {
                let mut model = AuthorizationModel::new(schema_version.unwrap_or("1.1"));
                for item in items {
                    match item {
                        Item::Type(type_def) => model.type_definitions.push(type_def),
                        Item::Condition(condition) => model.conditions.push(condition),
                    }
                }
                model
            },
        ),
    )(input)
}

// ============ Public API ============

/// Parse a DSL string into an AuthorizationModel without resolving references.
///
/// # Example
///
/// ```
/// let dsl = r#"
/// type user
///
/// type document
///   relations
///     define owner: [user]
///     define viewer: [user] or owner
/// "#;
///
/// let model = rsfga_typegen::model::parse(dsl).unwrap();
/// assert_eq!(model.type_definitions.len(), 2);
/// ```
pub fn parse(input: &str) -> ParserResult<AuthorizationModel> {
    match all_consuming(model::<nom::error::VerboseError<&str>>)(input) {
        Ok((_, model)) => Ok(model),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e
                .errors
                .first()
                .map(|(remaining, _)| input.len() - remaining.len());
            let message = format!("Parse error: {}", nom::error::convert_error(input, e));
            Err(match position {
                Some(pos) => ParserError::with_position(message, pos),
                None => ParserError::new(message),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(ParserError::new("Incomplete input")),
    }
}

/// Parse a DSL string and resolve every reference.
///
/// # Errors
///
/// Returns `TypegenError::MalformedModel` on syntax errors or unresolved references.
pub fn parse_dsl(input: &str) -> TypegenResult<AuthorizationModel> {
    let model = parse(input)?;
    validate(&model)?;
    Ok(model)
}
