#![forbid(unsafe_code)]

use super::*;
use am_core::categorize::{FeatureCategory, LOGIN_ACTIVITY_TYPE};
use am_core::model::FactStatus;
use am_core::report::{DetailRow, ReportDocument, ReportTemplate, SummaryEntry};
use am_core::window::DateWindow;
use rusqlite::types::Value as SqlValue;
use std::collections::HashMap;

const DETAIL_LIMIT: i64 = 10;
const FEATURE_CATEGORY_EXPR: &str = "feature_category(a.name)";

impl SqliteStore {
    /// Aggregates one template over an inclusive day window into the renderer-neutral form.
    /// Empty windows produce zero summaries and no detail rows.
    pub fn build_report(
        &self,
        template: ReportTemplate,
        window: DateWindow,
    ) -> Result<ReportDocument, StoreError> {
        let base = FactQuery::from_filter(&ActivityFilter::in_window(window.to_time_range()));
        let (summary, detail_label) = match template {
            ReportTemplate::OrgPerformance => (self.org_performance_summary(&base)?, "s.name"),
            ReportTemplate::UserActivity => (self.user_activity_summary(&base)?, "u.name"),
            ReportTemplate::FeatureUsage => (self.feature_usage_summary(&base)?, "a.name"),
        };
        let details = base
            .group_counts(&self.conn, detail_label, Some(DETAIL_LIMIT))?
            .into_iter()
            .map(|group| DetailRow {
                category: (template == ReportTemplate::FeatureUsage)
                    .then(|| FeatureCategory::of(&group.label)),
                name: group.label,
                count: group.count,
            })
            .collect();

        Ok(ReportDocument {
            template,
            title: template.title().to_string(),
            period: window.describe(),
            summary,
            details,
        })
    }

    fn org_performance_summary(&self, base: &FactQuery) -> Result<Vec<SummaryEntry>, StoreError> {
        let total_users = base
            .select("COUNT(DISTINCT f.user_id)")
            .query_scalar(&self.conn)?;
        Ok(vec![
            SummaryEntry::new("totalActivities", "Total Activities", base.count(&self.conn)?),
            SummaryEntry::new("totalUsers", "Total Users", total_users),
        ])
    }

    /// LOGIN events are selected by activity-type name.
    fn user_activity_summary(&self, base: &FactQuery) -> Result<Vec<SummaryEntry>, StoreError> {
        let mut logins = base.clone();
        logins.and(
            "upper(COALESCE(a.name, '')) = ?",
            [SqlValue::Text(LOGIN_ACTIVITY_TYPE.to_string())],
        );
        let with_status = |status: &str| -> Result<i64, StoreError> {
            let mut query = logins.clone();
            query.and("f.status = ?", [SqlValue::Text(status.to_string())]);
            query.count(&self.conn)
        };
        Ok(vec![
            SummaryEntry::new("totalLogins", "Total Logins", logins.count(&self.conn)?),
            SummaryEntry::new(
                "successLogins",
                "Successful Logins",
                with_status(FactStatus::SUCCESS)?,
            ),
            SummaryEntry::new("failedLogins", "Failed Logins", with_status(FactStatus::FAILED)?),
        ])
    }

    /// Activity-type names bucketed by [`FeatureCategory`]; other categories are not summarized.
    fn feature_usage_summary(&self, base: &FactQuery) -> Result<Vec<SummaryEntry>, StoreError> {
        let by_category: HashMap<String, i64> = base
            .group_counts(&self.conn, FEATURE_CATEGORY_EXPR, None)?
            .into_iter()
            .map(|group| (group.label, group.count))
            .collect();
        let count = |category: FeatureCategory| {
            by_category.get(category.as_str()).copied().unwrap_or(0)
        };
        Ok(vec![
            SummaryEntry::new("totalViews", "Total Views", count(FeatureCategory::View)),
            SummaryEntry::new(
                "totalDownloads",
                "Total Downloads",
                count(FeatureCategory::Download),
            ),
            SummaryEntry::new("totalSearches", "Total Searches", count(FeatureCategory::Search)),
        ])
    }
}
