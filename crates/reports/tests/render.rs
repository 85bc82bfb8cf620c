use am_core::categorize::FeatureCategory;
use am_core::report::{DetailRow, ReportDocument, ReportFormat, ReportTemplate, SummaryEntry};
use am_reports::{ReportMeta, file_name, render, render_bytes};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use time::macros::datetime;
use tokio_util::sync::CancellationToken;

fn temp_reports_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic enough for tests")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "am-reports-{label}-{}-{nanos}",
        std::process::id()
    ))
}

fn meta() -> ReportMeta {
    ReportMeta {
        requester_name: "Administrator".to_string(),
        requester_email: "admin@example.go.id".to_string(),
        requested_at: datetime!(2024-03-12 09:30:15 UTC),
    }
}

fn user_activity(details: Vec<(&str, i64)>) -> ReportDocument {
    ReportDocument {
        template: ReportTemplate::UserActivity,
        title: ReportTemplate::UserActivity.title().to_string(),
        period: "2024-03-10 to 2024-03-12".to_string(),
        summary: vec![
            SummaryEntry::new("totalLogins", "Total Logins", 1_250),
            SummaryEntry::new("successLogins", "Successful Logins", 1_200),
            SummaryEntry::new("failedLogins", "Failed Logins", 50),
        ],
        details: details
            .into_iter()
            .map(|(name, count)| DetailRow {
                name: name.to_string(),
                count,
                category: None,
            })
            .collect(),
    }
}

fn feature_usage() -> ReportDocument {
    let row = |name: &str, count| DetailRow {
        name: name.to_string(),
        count,
        category: Some(FeatureCategory::of(name)),
    };
    ReportDocument {
        template: ReportTemplate::FeatureUsage,
        title: ReportTemplate::FeatureUsage.title().to_string(),
        period: "All time".to_string(),
        summary: vec![SummaryEntry::new("totalViews", "Total Views", 3)],
        details: vec![row("View Report", 3), row("Download PDF", 1)],
    }
}

fn many_rows(count: usize) -> ReportDocument {
    let names: Vec<String> = (1..=count).map(|i| format!("Pengguna {i:03}")).collect();
    let mut doc = user_activity(Vec::new());
    doc.details = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| DetailRow {
            name,
            count: 1_000 - i as i64,
            category: None,
        })
        .collect();
    doc
}

#[test]
fn csv_has_header_summary_quoted_details_and_footer() {
    let doc = user_activity(vec![("Alice", 10), ("Andi", 5), ("Budi, S.E.", 2)]);
    let bytes = render_bytes(&doc, &meta(), ReportFormat::Csv, &CancellationToken::new())
        .expect("csv renders");
    let text = String::from_utf8(bytes).expect("utf-8");
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "User Activity Report");
    assert_eq!(lines[1], "Requested by,Administrator <admin@example.go.id>");
    assert_eq!(lines[2], "Generated at,2024-03-12 09:30:15 UTC");
    assert_eq!(lines[3], "Period,2024-03-10 to 2024-03-12");
    assert!(lines.contains(&"Total Logins,\"1,250\""));
    assert!(lines.contains(&"No,User,Count,Percentage"));
    assert!(lines.contains(&"\"1\",\"Alice\",\"10\",\"58.82%\""));
    assert!(lines.contains(&"\"3\",\"Budi, S.E.\",\"2\",\"11.76%\""));
    assert!(lines.contains(&"Total,,17,"));
    assert_eq!(
        lines.last().copied(),
        Some("Generated by Activity Monitor on 2024-03-12 09:30:15 UTC")
    );

    let data_rows = lines.iter().filter(|line| line.starts_with("\"")).count();
    assert_eq!(data_rows, doc.details.len());
}

#[test]
fn feature_usage_tables_add_a_category_column() {
    let doc = feature_usage();
    let cancel = CancellationToken::new();
    let csv = render_bytes(&doc, &meta(), ReportFormat::Csv, &cancel).expect("csv renders");
    let text = String::from_utf8(csv).expect("utf-8");
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.contains(&"No,Feature,Category,Count,Percentage"));
    assert!(lines.contains(&"\"1\",\"View Report\",\"View\",\"3\",\"75.00%\""));
    assert!(lines.contains(&"\"2\",\"Download PDF\",\"Download\",\"1\",\"25.00%\""));
    assert!(lines.contains(&"Total,,,4,"));

    let pdf = render_bytes(&doc, &meta(), ReportFormat::Pdf, &cancel).expect("pdf renders");
    let contains = |needle: &str| pdf.windows(needle.len()).any(|w| w == needle.as_bytes());
    assert!(contains("(Category)"));
    assert!(contains("(Download)"));

    let xlsx = render_bytes(&doc, &meta(), ReportFormat::Xlsx, &cancel).expect("xlsx renders");
    assert!(xlsx.starts_with(b"PK"));
}

#[test]
fn csv_output_is_a_pure_function_of_its_inputs() {
    let doc = user_activity(vec![("Alice", 10)]);
    let cancel = CancellationToken::new();
    let first = render_bytes(&doc, &meta(), ReportFormat::Csv, &cancel).expect("csv");
    let second = render_bytes(&doc, &meta(), ReportFormat::Csv, &cancel).expect("csv");
    assert_eq!(first, second);
}

#[test]
fn empty_details_still_render_in_every_format() {
    let doc = user_activity(Vec::new());
    for format in [ReportFormat::Csv, ReportFormat::Xlsx, ReportFormat::Pdf] {
        let bytes = render_bytes(&doc, &meta(), format, &CancellationToken::new())
            .expect("empty report renders");
        assert!(!bytes.is_empty());
    }
}

#[test]
fn xlsx_is_a_zip_with_summary_and_detail_sheets() {
    let doc = user_activity(vec![("Alice", 10), ("Andi", 5)]);
    let bytes = render_bytes(&doc, &meta(), ReportFormat::Xlsx, &CancellationToken::new())
        .expect("xlsx renders");
    assert!(bytes.starts_with(b"PK"));
    let contains = |needle: &[u8]| bytes.windows(needle.len()).any(|window| window == needle);
    assert!(contains(b"xl/worksheets/sheet1.xml"));
    assert!(contains(b"xl/worksheets/sheet2.xml"));
    assert!(!contains(b"xl/worksheets/sheet3.xml"));
}

#[test]
fn pdf_paginates_long_tables_with_numbered_footers() {
    let doc = many_rows(120);
    let bytes = render_bytes(&doc, &meta(), ReportFormat::Pdf, &CancellationToken::new())
        .expect("pdf renders");
    assert!(bytes.starts_with(b"%PDF-1.5"));

    let parsed = lopdf::Document::load_mem(&bytes).expect("valid pdf");
    let pages = parsed.get_pages().len();
    assert!(pages >= 3, "120 rows need several pages, got {pages}");

    let contains = |needle: &str| {
        bytes
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    };
    assert!(contains(&format!("Page 1 of {pages}")));
    assert!(contains(&format!("Page {pages} of {pages}")));
    assert!(contains("Generated by Activity Monitor | 2024-03-12 09:30:15 UTC"));
    assert!(contains("Pengguna 120"));
}

#[test]
fn single_page_pdf_carries_title_and_summary() {
    let doc = user_activity(vec![("Alice", 10)]);
    let bytes = render_bytes(&doc, &meta(), ReportFormat::Pdf, &CancellationToken::new())
        .expect("pdf renders");
    let parsed = lopdf::Document::load_mem(&bytes).expect("valid pdf");
    assert_eq!(parsed.get_pages().len(), 1);
    let contains = |needle: &str| {
        bytes
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    };
    assert!(contains("User Activity Report"));
    assert!(contains("1,250"));
    assert!(contains("Page 1 of 1"));
}

#[test]
fn render_writes_the_named_file() {
    let dir = temp_reports_dir("write");
    let doc = user_activity(vec![("Alice", 10)]);
    let path = render(&doc, &meta(), ReportFormat::Pdf, &dir, &CancellationToken::new())
        .expect("render to disk");
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("user-activity_20240312_093015.pdf")
    );
    assert_eq!(
        path,
        dir.join(file_name(doc.template, ReportFormat::Pdf, meta().requested_at))
    );
    let on_disk = std::fs::read(&path).expect("file exists");
    assert!(on_disk.starts_with(b"%PDF"));
}

#[test]
fn cancelled_token_stops_every_emitter_before_writing() {
    let dir = temp_reports_dir("cancel");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let doc = many_rows(10);
    for format in [ReportFormat::Csv, ReportFormat::Xlsx, ReportFormat::Pdf] {
        let err = render(&doc, &meta(), format, &dir, &cancel).expect_err("cancelled");
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("user-activity"));
    }
    assert!(!dir.exists());
}
