mod common;

use am_core::model::FactStatus;
use am_core::categorize::FeatureCategory;
use am_core::report::{DetailRow, ReportDocument, ReportTemplate};
use am_core::window::DateWindow;
use common::*;

fn march_window() -> DateWindow {
    DateWindow::parse(Some("2024-03-10"), Some("2024-03-12")).expect("valid window")
}

fn details(rows: &[DetailRow]) -> Vec<(&str, i64)> {
    rows.iter().map(|row| (row.name.as_str(), row.count)).collect()
}

fn summary(report: &ReportDocument, key: &str) -> Option<i64> {
    report
        .summary
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| entry.value)
}

#[test]
fn user_activity_ranks_users_and_counts_logins_by_type_name() {
    let mut store = seeded_store("report-users");
    let mut batch = Vec::new();
    for (user, count) in [(ALICE, 10), (ANDI, 5), (BUDI, 2)] {
        for i in 0..count {
            batch.push(fact(user, VIEW_REPORT, at("2024-03-11", i)));
        }
    }
    insert(&mut store, batch);

    let report = store
        .build_report(ReportTemplate::UserActivity, march_window())
        .expect("report");
    assert_eq!(report.title, "User Activity Report");
    assert_eq!(report.period, "2024-03-10 to 2024-03-12");
    assert_eq!(summary(&report, "totalLogins"), Some(0));
    assert_eq!(summary(&report, "successLogins"), Some(0));
    assert_eq!(summary(&report, "failedLogins"), Some(0));
    assert_eq!(
        details(&report.details),
        vec![("Alice", 10), ("Andi", 5), ("Budi", 2)]
    );

    let mut failed = fact(BUDI, LOGIN, at("2024-03-12", 8));
    failed.status = FactStatus::Failed;
    insert(&mut store, vec![fact(ALICE, LOGIN, at("2024-03-12", 7)), failed]);
    let report = store
        .build_report(ReportTemplate::UserActivity, march_window())
        .expect("report");
    assert_eq!(summary(&report, "totalLogins"), Some(2));
    assert_eq!(summary(&report, "successLogins"), Some(1));
    assert_eq!(summary(&report, "failedLogins"), Some(1));
}

#[test]
fn feature_usage_buckets_by_activity_name() {
    let mut store = seeded_store("report-features");
    let ts = at("2024-03-10", 12);
    insert(
        &mut store,
        vec![
            fact(ALICE, VIEW_REPORT, ts),
            fact(ALICE, DOWNLOAD_PDF, ts),
            fact(ALICE, SEARCH_X, ts),
            fact(ALICE, EXPORT_CSV, ts),
        ],
    );
    let report = store
        .build_report(ReportTemplate::FeatureUsage, march_window())
        .expect("report");
    assert_eq!(summary(&report, "totalViews"), Some(1));
    assert_eq!(summary(&report, "totalDownloads"), Some(1));
    assert_eq!(summary(&report, "totalSearches"), Some(1));
    assert_eq!(report.details.len(), 4);
    assert_eq!(report.details_total(), 4);
    let export = report
        .details
        .iter()
        .find(|row| row.name == "Export CSV")
        .expect("export row");
    assert_eq!(export.category, Some(FeatureCategory::Export));
    assert!(report.details.iter().all(|row| row.category.is_some()));
}

#[test]
fn feature_usage_counts_each_event_in_one_category() {
    let mut store = seeded_store("report-feature-overlap");
    let ts = at("2024-03-10", 12);
    insert(
        &mut store,
        vec![fact(ALICE, DOWNLOAD_PDF, ts), fact(ANDI, DOWNLOAD_PDF, ts), fact(ANDI, LOGIN, ts)],
    );
    let report = store
        .build_report(ReportTemplate::FeatureUsage, march_window())
        .expect("report");
    assert_eq!(summary(&report, "totalViews"), Some(0));
    assert_eq!(summary(&report, "totalDownloads"), Some(2));
    assert_eq!(summary(&report, "totalSearches"), Some(0));
    let login = report
        .details
        .iter()
        .find(|row| row.name == "LOGIN")
        .expect("login row");
    assert_eq!(login.category, Some(FeatureCategory::Authentication));
}

#[test]
fn other_templates_leave_detail_category_empty() {
    let mut store = seeded_store("report-no-category");
    insert(&mut store, vec![fact(ALICE, VIEW_REPORT, at("2024-03-10", 12))]);
    let report = store
        .build_report(ReportTemplate::UserActivity, march_window())
        .expect("report");
    assert!(report.details.iter().all(|row| row.category.is_none()));
}

#[test]
fn org_performance_ranks_units_and_counts_distinct_users() {
    let mut store = seeded_store("report-units");
    let ts = at("2024-03-11", 12);
    let mut batch = vec![
        unit_fact(ALICE, SUBDIT_A1, LOGIN, ts),
        unit_fact(ALICE, SUBDIT_A1, VIEW_REPORT, ts),
        unit_fact(ANDI, SUBDIT_A2, LOGIN, ts),
        fact(BUDI, LOGIN, ts),
    ];
    batch.push(unit_fact(BUDI, SUBDIT_B1, LOGIN, at("2024-03-20", 0)));
    insert(&mut store, batch);

    let report = store
        .build_report(ReportTemplate::OrgPerformance, march_window())
        .expect("report");
    assert_eq!(summary(&report, "totalActivities"), Some(4));
    assert_eq!(summary(&report, "totalUsers"), Some(3));
    assert_eq!(
        details(&report.details),
        vec![("Subdit Data", 2), ("Subdit Evaluasi", 1)]
    );
}

#[test]
fn empty_window_yields_zero_summary_and_no_details() {
    let store = seeded_store("report-empty");
    for template in ReportTemplate::ALL {
        let report = store
            .build_report(template, DateWindow::ALL_TIME)
            .expect("report never fails on empty data");
        assert!(report.details.is_empty());
        assert!(report.summary.iter().all(|entry| entry.value == 0));
        assert_eq!(report.period, "All time");
    }
}

#[test]
fn identical_inputs_build_identical_documents() {
    let mut store = seeded_store("report-stable");
    let ts = at("2024-03-10", 12);
    insert(
        &mut store,
        vec![
            fact(ALICE, VIEW_REPORT, ts),
            fact(ANDI, VIEW_REPORT, ts),
            fact(BUDI, SEARCH_X, ts),
        ],
    );
    for template in ReportTemplate::ALL {
        let first = store.build_report(template, march_window()).expect("report");
        let second = store.build_report(template, march_window()).expect("report");
        assert_eq!(first, second);
    }
}
