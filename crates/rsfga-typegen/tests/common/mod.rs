//! Shared model fixtures for the pipeline tests.

// Each test file compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

/// Organization/team model used across the generation scenarios.
pub const TEAM_MODEL_DSL: &str = r#"
model
  schema 1.1

type user

type organization
  relations
    define owner: [user]
    define admin: [user] or owner
    define member: [user] or admin

type team
  relations
    define parent_organization: [organization]
    define member: [user]
    define admin: [user]
    define can_view_team: member or admin or member from parent_organization
    define can_manage: admin and owner from parent_organization
    define lead: (member and admin) or owner from parent_organization

type build
  relations
    define team: [team]
    define viewer: [user, team#member] or can_view_team from team
"#;

/// The organization part of the model as returned by the OpenFGA API.
pub const ORG_MODEL_JSON: &str = r#"{
  "authorization_model": {
    "id": "01HVMMBCMGZNT3SED4Z17ECXCA",
    "schema_version": "1.1",
    "type_definitions": [
      { "type": "user" },
      {
        "type": "organization",
        "relations": {
          "owner": { "this": {} },
          "admin": {
            "union": {
              "child": [
                { "this": {} },
                { "computedUserset": { "relation": "owner" } }
              ]
            }
          }
        },
        "metadata": {
          "relations": {
            "owner": { "directly_related_user_types": [{ "type": "user" }] },
            "admin": { "directly_related_user_types": [{ "type": "user" }] }
          }
        }
      }
    ]
  }
}"#;

/// Fixed timestamp for reproducible output.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}
