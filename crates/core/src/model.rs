#![forbid(unsafe_code)]

use crate::ids::TransactionId;
use serde::{Serialize, Serializer};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub external_token: Option<String>,
    pub org_unit_id: Option<i64>,
    pub is_active: bool,
    pub first_activity_ms: Option<i64>,
    pub last_activity_ms: Option<i64>,
}

/// A node of the organizational hierarchy. `parent_id` of `None` marks a root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrgUnit {
    pub id: i64,
    pub name: String,
    pub level_label: String,
    pub parent_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActivityType {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub province: String,
}

impl Location {
    pub fn region(&self) -> &'static str {
        crate::region::region_for_province(&self.province)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FactStatus {
    Success,
    Failed,
    Other(String),
}

impl FactStatus {
    pub const SUCCESS: &'static str = "SUCCESS";
    pub const FAILED: &'static str = "FAILED";

    /// Statuses are stored uppercase; unknown values are kept verbatim (uppercased).
    pub fn parse(value: &str) -> Result<Self, FactError> {
        let value = value.trim().to_ascii_uppercase();
        match value.as_str() {
            "" => Err(FactError::EmptyStatus),
            Self::SUCCESS => Ok(Self::Success),
            Self::FAILED => Ok(Self::Failed),
            _ => Ok(Self::Other(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => Self::SUCCESS,
            Self::Failed => Self::FAILED,
            Self::Other(value) => value.as_str(),
        }
    }
}

impl Serialize for FactStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An activity event ready for insertion into the fact store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewActivityFact {
    pub transaction_id: TransactionId,
    pub user_id: i64,
    pub org_unit_id: Option<i64>,
    pub activity_type_id: i64,
    pub cluster_id: Option<i64>,
    pub location_id: Option<i64>,
    pub scope: String,
    pub detail: String,
    pub status: FactStatus,
    pub event_ts_ms: i64,
    pub ingested_at_ms: i64,
}

impl NewActivityFact {
    pub fn validate(&self) -> Result<(), FactError> {
        if self.event_ts_ms > self.ingested_at_ms {
            return Err(FactError::EventAfterIngestion);
        }
        if self.status.as_str().trim().is_empty() {
            return Err(FactError::EmptyStatus);
        }
        Ok(())
    }

    /// Fields that identify the event itself; `ingested_at_ms` differs between retries.
    pub fn same_event_as(&self, other: &Self) -> bool {
        self.transaction_id == other.transaction_id
            && self.user_id == other.user_id
            && self.org_unit_id == other.org_unit_id
            && self.activity_type_id == other.activity_type_id
            && self.cluster_id == other.cluster_id
            && self.location_id == other.location_id
            && self.scope == other.scope
            && self.detail == other.detail
            && self.status == other.status
            && self.event_ts_ms == other.event_ts_ms
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactError {
    EmptyStatus,
    EventAfterIngestion,
}

impl std::fmt::Display for FactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStatus => write!(f, "status must not be empty"),
            Self::EventAfterIngestion => write!(f, "event timestamp is after ingestion timestamp"),
        }
    }
}

impl std::error::Error for FactError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(event_ts_ms: i64, ingested_at_ms: i64) -> NewActivityFact {
        NewActivityFact {
            transaction_id: TransactionId::new_random(),
            user_id: 1,
            org_unit_id: None,
            activity_type_id: 1,
            cluster_id: None,
            location_id: None,
            scope: String::new(),
            detail: String::new(),
            status: FactStatus::Success,
            event_ts_ms,
            ingested_at_ms,
        }
    }

    #[test]
    fn status_parse_normalizes_case() {
        assert_eq!(FactStatus::parse("success"), Ok(FactStatus::Success));
        assert_eq!(FactStatus::parse(" Failed "), Ok(FactStatus::Failed));
        assert_eq!(
            FactStatus::parse("pending"),
            Ok(FactStatus::Other("PENDING".to_string()))
        );
        assert_eq!(FactStatus::parse(""), Err(FactError::EmptyStatus));
    }

    #[test]
    fn event_must_not_follow_ingestion() {
        assert!(fact(10, 10).validate().is_ok());
        assert_eq!(fact(11, 10).validate(), Err(FactError::EventAfterIngestion));
    }

    #[test]
    fn retried_event_matches_regardless_of_ingestion_time() {
        let first = fact(10, 20);
        let mut retry = first.clone();
        retry.ingested_at_ms = 99;
        assert!(first.same_event_as(&retry));
        retry.scope = "changed".to_string();
        assert!(!first.same_event_as(&retry));
    }
}
