#![forbid(unsafe_code)]

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub already_present: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeOutcome {
    pub normalized: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub org_units: usize,
    pub activity_types: usize,
    pub clusters: usize,
    pub locations: usize,
    pub users: usize,
}
