#![forbid(unsafe_code)]

use am_core::model::OrgUnit;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    User,
    OrgUnit,
    Location,
}

impl SuggestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::OrgUnit => "orgunit",
            Self::Location => "location",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserMatch {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub org_unit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathSegment {
    pub id: i64,
    pub name: String,
}

/// A unit matched by tree search, with its ancestor chain from the root down to itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrgUnitPath {
    pub unit: OrgUnit,
    pub path: Vec<PathSegment>,
}
