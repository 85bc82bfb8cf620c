mod common;

use am_core::tree::OrgTreeNode;
use am_core::window::TimeRange;
use am_storage::{OrgTreeRequest, SuggestionKind};
use common::*;
use std::collections::HashSet;

fn all_ids(forest: &[OrgTreeNode]) -> Vec<i64> {
    let mut ids = Vec::new();
    let mut pending: Vec<&OrgTreeNode> = forest.iter().collect();
    while let Some(node) = pending.pop() {
        ids.push(node.id);
        pending.extend(&node.children);
    }
    ids.sort_unstable();
    ids
}

fn find(forest: &[OrgTreeNode], id: i64) -> Option<&OrgTreeNode> {
    forest.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find(&node.children, id)
        }
    })
}

#[test]
fn blank_query_suggests_nothing() {
    let store = seeded_store("suggest-empty");
    assert!(store.suggestions("").expect("suggest").is_empty());
    assert!(store.suggestions("   ").expect("suggest").is_empty());
}

#[test]
fn users_come_first_and_prefix_matches_lead() {
    let store = seeded_store("suggest-users");
    let suggestions = store.suggestions("A").expect("suggest");

    let users: Vec<&str> = suggestions
        .iter()
        .filter(|s| s.kind == SuggestionKind::User)
        .map(|s| s.value.as_str())
        .collect();
    assert_eq!(users, vec!["Alice", "Andi"]);
    assert_eq!(suggestions[0].kind, SuggestionKind::User);

    let kinds: Vec<SuggestionKind> = suggestions.iter().map(|s| s.kind).collect();
    let mut sorted = kinds.clone();
    sorted.sort_by_key(|kind| match kind {
        SuggestionKind::User => 0,
        SuggestionKind::OrgUnit => 1,
        SuggestionKind::Location => 2,
    });
    assert_eq!(kinds, sorted, "sources stay in user, orgunit, location order");

    let per_kind = |kind| suggestions.iter().filter(|s| s.kind == kind).count();
    assert!(per_kind(SuggestionKind::OrgUnit) <= 5);
    assert!(per_kind(SuggestionKind::Location) >= 2);

    let unit = suggestions
        .iter()
        .find(|s| s.value == "Direktorat Analisis")
        .expect("unit suggested");
    assert_eq!(unit.label, "Direktorat Analisis - Eselon II");

    let unique: HashSet<(SuggestionKind, &str)> =
        suggestions.iter().map(|s| (s.kind, s.value.as_str())).collect();
    assert_eq!(unique.len(), suggestions.len());
}

#[test]
fn user_and_unit_search_helpers() {
    let store = seeded_store("search-helpers");
    let users = store.search_users("example.go.id").expect("users");
    assert_eq!(users.len(), 3);
    let andi = store.search_users("and").expect("users");
    assert_eq!(andi.len(), 1);
    assert_eq!(andi[0].org_unit.as_deref(), Some("Subdit Evaluasi"));

    let units = store.search_org_units("subdit").expect("units");
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Subdit Data", "Subdit Evaluasi", "Subdit Fasilitasi"]);
    assert!(store.search_org_units("").expect("units").is_empty());
}

#[test]
fn tree_counts_are_per_exact_unit_without_rollup() {
    let mut store = seeded_store("tree-counts");
    let ts = at("2024-03-10", 9);
    insert(
        &mut store,
        vec![
            unit_fact(ALICE, SUBDIT_A1, LOGIN, ts),
            unit_fact(ALICE, SUBDIT_A1, VIEW_REPORT, ts),
            unit_fact(ANDI, SUBDIT_A2, LOGIN, ts),
            unit_fact(BUDI, SUBDIT_B1, LOGIN, at("2024-04-01", 9)),
        ],
    );

    let forest = store
        .org_tree(OrgTreeRequest {
            level_label: None,
            include_activity_count: true,
            window: TimeRange::UNBOUNDED,
        })
        .expect("tree");
    assert_eq!(forest.len(), 1);
    assert_eq!(all_ids(&forest), vec![1, 2, 3, 4, 5, 6]);
    let root = &forest[0];
    assert_eq!(root.activity_count, Some(0));
    assert_eq!(find(&forest, DIR_A).and_then(|n| n.activity_count), Some(0));
    assert_eq!(find(&forest, SUBDIT_A1).and_then(|n| n.activity_count), Some(2));
    assert_eq!(find(&forest, SUBDIT_B1).and_then(|n| n.activity_count), Some(1));

    let march = am_core::window::DateWindow::parse(Some("2024-03-01"), Some("2024-03-31"))
        .expect("window")
        .to_time_range();
    let windowed = store
        .org_tree(OrgTreeRequest {
            level_label: None,
            include_activity_count: true,
            window: march,
        })
        .expect("tree");
    assert_eq!(find(&windowed, SUBDIT_B1).and_then(|n| n.activity_count), Some(0));

    let plain = store.org_tree(OrgTreeRequest::default()).expect("tree");
    assert_eq!(plain[0].activity_count, None);
    assert_eq!(plain, store.org_tree(OrgTreeRequest::default()).expect("tree"));
}

#[test]
fn level_filter_turns_units_with_filtered_parents_into_roots() {
    let store = seeded_store("tree-level");
    let forest = store
        .org_tree(OrgTreeRequest {
            level_label: Some("Eselon III".to_string()),
            ..OrgTreeRequest::default()
        })
        .expect("tree");
    let roots: Vec<&str> = forest.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(roots, vec!["Subdit Data", "Subdit Evaluasi", "Subdit Fasilitasi"]);
    assert!(forest.iter().all(|n| n.children.is_empty()));
}

#[test]
fn tree_search_returns_root_first_paths() {
    let store = seeded_store("tree-search");
    let matches = store.org_tree_search("evaluasi").expect("search");
    assert_eq!(matches.len(), 1);
    let path: Vec<i64> = matches[0].path.iter().map(|segment| segment.id).collect();
    assert_eq!(path, vec![ROOT_UNIT, DIR_A, SUBDIT_A2]);
    assert_eq!(matches[0].path[0].name, "Kementerian Perdagangan");
    assert!(store.org_tree_search(" ").expect("search").is_empty());
}
