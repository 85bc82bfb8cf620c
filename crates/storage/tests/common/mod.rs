#![allow(dead_code)]

use am_core::ids::TransactionId;
use am_core::model::{
    ActivityType, Cluster, FactStatus, Location, NewActivityFact, OrgUnit, UserProfile,
};
use am_core::window::{MS_PER_HOUR, day_start_ms, parse_date};
use am_storage::{SeedDimensionsRequest, SqliteStore};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub const LOGIN: i64 = 1;
pub const LOGOUT: i64 = 2;
pub const VIEW_REPORT: i64 = 3;
pub const DOWNLOAD_PDF: i64 = 4;
pub const SEARCH_X: i64 = 5;
pub const EXPORT_CSV: i64 = 6;

pub const ALICE: i64 = 1;
pub const ANDI: i64 = 2;
pub const BUDI: i64 = 3;

pub const ROOT_UNIT: i64 = 1;
pub const DIR_A: i64 = 2;
pub const DIR_B: i64 = 3;
pub const SUBDIT_A1: i64 = 4;
pub const SUBDIT_A2: i64 = 5;
pub const SUBDIT_B1: i64 = 6;

pub const CLUSTER_SEARCH: i64 = 1;
pub const CLUSTER_REPORTS: i64 = 2;

pub const JAKARTA: i64 = 1;
pub const BANDUNG: i64 = 2;
pub const MAKASSAR: i64 = 3;

pub fn temp_db_path(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic enough for tests")
        .as_nanos();
    path.push(format!(
        "am-storage-{label}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&path).expect("temp storage dir must be creatable");
    path.join("activity_monitor.db")
}

/// Midnight UTC of `date` (YYYY-MM-DD) plus `hour` hours.
pub fn at(date: &str, hour: i64) -> i64 {
    day_start_ms(parse_date(date).expect("valid test date")) + hour * MS_PER_HOUR
}

fn unit(id: i64, name: &str, level: &str, parent_id: Option<i64>) -> OrgUnit {
    OrgUnit {
        id,
        name: name.to_string(),
        level_label: level.to_string(),
        parent_id,
    }
}

fn activity_type(id: i64, name: &str, category: &str) -> ActivityType {
    ActivityType {
        id,
        name: name.to_string(),
        category: category.to_string(),
        description: String::new(),
    }
}

fn user(id: i64, name: &str, email: &str, org_unit_id: i64) -> UserProfile {
    UserProfile {
        id,
        name: name.to_string(),
        email: email.to_string(),
        external_token: None,
        org_unit_id: Some(org_unit_id),
        is_active: true,
        first_activity_ms: None,
        last_activity_ms: None,
    }
}

/// Three tiers, six units; users sit on the leaves.
pub fn seed_request() -> SeedDimensionsRequest {
    SeedDimensionsRequest {
        org_units: vec![
            unit(ROOT_UNIT, "Kementerian Perdagangan", "Eselon I", None),
            unit(DIR_A, "Direktorat Analisis", "Eselon II", Some(ROOT_UNIT)),
            unit(DIR_B, "Direktorat Bina Usaha", "Eselon II", Some(ROOT_UNIT)),
            unit(SUBDIT_A1, "Subdit Data", "Eselon III", Some(DIR_A)),
            unit(SUBDIT_A2, "Subdit Evaluasi", "Eselon III", Some(DIR_A)),
            unit(SUBDIT_B1, "Subdit Fasilitasi", "Eselon III", Some(DIR_B)),
        ],
        activity_types: vec![
            activity_type(LOGIN, "LOGIN", "Authentication"),
            activity_type(LOGOUT, "LOGOUT", "Authentication"),
            activity_type(VIEW_REPORT, "View Report", "View"),
            activity_type(DOWNLOAD_PDF, "Download PDF", "Download"),
            activity_type(SEARCH_X, "Search X", "Search"),
            activity_type(EXPORT_CSV, "Export CSV", "Export"),
        ],
        clusters: vec![
            Cluster {
                id: CLUSTER_SEARCH,
                name: "Pencarian".to_string(),
                description: String::new(),
            },
            Cluster {
                id: CLUSTER_REPORTS,
                name: "Laporan".to_string(),
                description: String::new(),
            },
        ],
        locations: vec![
            Location {
                id: JAKARTA,
                name: "Jakarta Pusat".to_string(),
                province: "DKI Jakarta".to_string(),
            },
            Location {
                id: BANDUNG,
                name: "Bandung".to_string(),
                province: "Jawa Barat".to_string(),
            },
            Location {
                id: MAKASSAR,
                name: "Makassar".to_string(),
                province: "Sulawesi Selatan".to_string(),
            },
        ],
        users: vec![
            user(ALICE, "Alice", "alice@example.go.id", SUBDIT_A1),
            user(ANDI, "Andi", "andi@example.go.id", SUBDIT_A2),
            user(BUDI, "Budi", "budi@example.go.id", SUBDIT_B1),
        ],
    }
}

pub fn seeded_store(label: &str) -> SqliteStore {
    let mut store = SqliteStore::open(temp_db_path(label)).expect("fresh storage should open");
    store
        .seed_dimensions(seed_request())
        .expect("fixture dimensions should seed");
    store
}

/// A SUCCESS fact with no optional dimensions, ingested one second after the event.
pub fn fact(user_id: i64, activity_type_id: i64, event_ts_ms: i64) -> NewActivityFact {
    NewActivityFact {
        transaction_id: TransactionId::new_random(),
        user_id,
        org_unit_id: None,
        activity_type_id,
        cluster_id: None,
        location_id: None,
        scope: String::new(),
        detail: String::new(),
        status: FactStatus::Success,
        event_ts_ms,
        ingested_at_ms: event_ts_ms + 1_000,
    }
}

/// Like `fact`, attributed to the user's own unit.
pub fn unit_fact(
    user_id: i64,
    unit_id: i64,
    activity_type_id: i64,
    event_ts_ms: i64,
) -> NewActivityFact {
    NewActivityFact {
        org_unit_id: Some(unit_id),
        ..fact(user_id, activity_type_id, event_ts_ms)
    }
}

pub fn insert(store: &mut SqliteStore, batch: Vec<NewActivityFact>) {
    store.insert_facts(&batch).expect("fixture facts should insert");
}
