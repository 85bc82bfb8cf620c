#![forbid(unsafe_code)]

use crate::categorize::FeatureCategory;
use serde::Serialize;

/// The three canonical aggregate shapes. Renderers dispatch on this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportTemplate {
    OrgPerformance,
    UserActivity,
    FeatureUsage,
}

impl ReportTemplate {
    pub const ALL: [Self; 3] = [Self::OrgPerformance, Self::UserActivity, Self::FeatureUsage];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "org-performance" => Some(Self::OrgPerformance),
            "user-activity" => Some(Self::UserActivity),
            "feature-usage" => Some(Self::FeatureUsage),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::OrgPerformance => "org-performance",
            Self::UserActivity => "user-activity",
            Self::FeatureUsage => "feature-usage",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::OrgPerformance => "Organizational Performance Report",
            Self::UserActivity => "User Activity Report",
            Self::FeatureUsage => "Feature Usage Report",
        }
    }

    /// Header of the name column in the detail table.
    pub fn detail_label(self) -> &'static str {
        match self {
            Self::OrgPerformance => "Organizational Unit",
            Self::UserActivity => "User",
            Self::FeatureUsage => "Feature",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "excel" => Some(Self::Xlsx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub key: String,
    pub label: String,
    pub value: i64,
}

impl SummaryEntry {
    pub fn new(key: &str, label: &str, value: i64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub name: String,
    pub count: i64,
    /// Set on feature-usage rows only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FeatureCategory>,
}

/// Canonical intermediate form shared by every renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub template: ReportTemplate,
    pub title: String,
    pub period: String,
    pub summary: Vec<SummaryEntry>,
    pub details: Vec<DetailRow>,
}

impl ReportDocument {
    pub fn details_total(&self) -> i64 {
        self.details.iter().map(|row| row.count).sum()
    }
}

/// `count / total * 100`, zero when `total` is not positive.
pub fn percentage(count: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}
