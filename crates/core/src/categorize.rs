#![forbid(unsafe_code)]

//! Keyword tables that bucket free-text names. The storage layer exposes these functions to SQL,
//! so a name lands in the same bucket in a query and in Rust.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FeatureCategory {
    View,
    Download,
    Search,
    Authentication,
    Export,
    Other,
}

/// Checked in order; the first category with a matching keyword wins.
const FEATURE_KEYWORDS: &[(FeatureCategory, &[&str])] = &[
    (FeatureCategory::Download, &["download", "unduh"]),
    (FeatureCategory::Export, &["export", "ekspor"]),
    (FeatureCategory::Search, &["search", "cari", "query"]),
    (
        FeatureCategory::Authentication,
        &["login", "logout", "auth", "sign in", "sign out"],
    ),
    (FeatureCategory::View, &["view", "lihat", "open", "read"]),
];

impl FeatureCategory {
    pub fn of(name: &str) -> Self {
        let lowered = name.to_lowercase();
        FEATURE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
            .map(|(category, _)| *category)
            .unwrap_or(Self::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Download => "Download",
            Self::Search => "Search",
            Self::Authentication => "Authentication",
            Self::Export => "Export",
            Self::Other => "Other",
        }
    }
}

/// Markers that identify search-like events by activity-type name or scope.
pub const SEARCH_MARKERS: &[&str] = &["search", "query", "cari"];

pub const VIEW_MARKER: &str = "view";
pub const DOWNLOAD_MARKER: &str = "download";
pub const EXPORT_MARKER: &str = "export";

/// Activity types excluded from operational-intent rankings.
pub const SESSION_ACTIVITY_TYPES: &[&str] = &["LOGIN", "LOGOUT"];

pub const LOGIN_ACTIVITY_TYPE: &str = "LOGIN";

pub const UNCATEGORIZED_CLUSTER: &str = "Uncategorized";

pub const ECONOMICS_OTHER: &str = "Other";

/// Fixed bucket set for the global-economics chart, matched against the event scope.
pub const ECONOMICS_BUCKETS: &[(&str, &[&str])] = &[
    ("Trade", &["trade", "perdagangan", "ekspor", "impor", "export", "import"]),
    ("Finance", &["finance", "keuangan", "fiscal", "fiskal", "bank", "monetary", "moneter"]),
    ("Investment", &["invest"]),
    ("Energy", &["energy", "energi", "oil", "gas", "minyak"]),
    ("Commodity", &["commodity", "komoditas", "pangan", "food"]),
    ("Industry", &["industry", "industri", "manufactur"]),
];

pub fn economics_bucket(scope: &str) -> &'static str {
    let lowered = scope.to_lowercase();
    ECONOMICS_BUCKETS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(bucket, _)| *bucket)
        .unwrap_or(ECONOMICS_OTHER)
}

/// Fixed display order of economics buckets, catch-all last.
pub fn economics_bucket_order() -> impl Iterator<Item = &'static str> {
    ECONOMICS_BUCKETS
        .iter()
        .map(|(bucket, _)| *bucket)
        .chain(std::iter::once(ECONOMICS_OTHER))
}

pub fn is_search_like(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SEARCH_MARKERS.iter().any(|marker| lowered.contains(marker))
}
