#![forbid(unsafe_code)]

use crate::model::OrgUnit;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrgTreeNode {
    pub id: i64,
    pub name: String,
    pub level_label: String,
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_count: Option<i64>,
    pub children: Vec<OrgTreeNode>,
}

/// Materializes `{id, parent_id}` rows into a forest.
///
/// Units with blank names are dropped. A parent ref that is absent, zero, self-referential or
/// not among `units` makes the unit a root. Any cycle is broken at its smallest id, which becomes
/// a root, so every input unit appears exactly once. Siblings are ordered by `(name, id)`.
///
/// When `counts` is given every node carries `activity_count`, defaulting to zero; counts are
/// per exact unit and never rolled up.
pub fn build_forest(units: Vec<OrgUnit>, counts: Option<&HashMap<i64, i64>>) -> Vec<OrgTreeNode> {
    let units: BTreeMap<i64, OrgUnit> = units
        .into_iter()
        .filter(|unit| !unit.name.trim().is_empty())
        .map(|unit| (unit.id, unit))
        .collect();

    let mut parent_of: BTreeMap<i64, Option<i64>> = units
        .values()
        .map(|unit| {
            let parent = unit
                .parent_id
                .filter(|parent| *parent != 0 && *parent != unit.id && units.contains_key(parent));
            (unit.id, parent)
        })
        .collect();
    break_cycles(&mut parent_of);

    let mut children_of: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut roots = Vec::new();
    for (id, parent) in &parent_of {
        match parent {
            Some(parent) => children_of.entry(*parent).or_default().push(*id),
            None => roots.push(*id),
        }
    }
    let sort_key = |id: &i64| (units[id].name.clone(), *id);
    roots.sort_by_key(sort_key);
    for siblings in children_of.values_mut() {
        siblings.sort_by_key(sort_key);
    }

    roots
        .into_iter()
        .map(|id| materialize(id, &units, &parent_of, &children_of, counts))
        .collect()
}

fn break_cycles(parent_of: &mut BTreeMap<i64, Option<i64>>) {
    let ids: Vec<i64> = parent_of.keys().copied().collect();
    let mut settled: BTreeSet<i64> = BTreeSet::new();
    for start in ids {
        let mut path = Vec::new();
        let mut on_path = BTreeSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if settled.contains(&id) {
                break;
            }
            if !on_path.insert(id) {
                let cycle_start = path.iter().position(|p| *p == id).unwrap_or(0);
                if let Some(min_id) = path[cycle_start..].iter().min().copied() {
                    parent_of.insert(min_id, None);
                }
                break;
            }
            path.push(id);
            current = parent_of.get(&id).copied().flatten();
        }
        settled.extend(path);
    }
}

fn materialize(
    id: i64,
    units: &BTreeMap<i64, OrgUnit>,
    parent_of: &BTreeMap<i64, Option<i64>>,
    children_of: &HashMap<i64, Vec<i64>>,
    counts: Option<&HashMap<i64, i64>>,
) -> OrgTreeNode {
    let unit = &units[&id];
    let children = children_of
        .get(&id)
        .map(|ids| {
            ids.iter()
                .map(|child| materialize(*child, units, parent_of, children_of, counts))
                .collect()
        })
        .unwrap_or_default();
    OrgTreeNode {
        id,
        name: unit.name.clone(),
        level_label: unit.level_label.clone(),
        parent_id: parent_of.get(&id).copied().flatten(),
        activity_count: counts.map(|counts| counts.get(&id).copied().unwrap_or(0)),
        children,
    }
}

/// Ancestor chain of `id`, root first and `id` last. Stops at a missing parent or a repeat.
pub fn ancestor_path(id: i64, parent_of: &HashMap<i64, Option<i64>>) -> Vec<i64> {
    let mut path = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = Some(id);
    while let Some(node) = current {
        if !seen.insert(node) || !parent_of.contains_key(&node) {
            break;
        }
        path.push(node);
        current = parent_of.get(&node).copied().flatten();
    }
    path.reverse();
    path
}
