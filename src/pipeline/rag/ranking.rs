//! Best-survivor merge and non-destructive label boosting.

use std::collections::{BTreeSet, HashMap};

use super::types::{EvidenceItem, SourceKind};

/// Merge hit lists into one deduplicated, score-sorted, capped set.
///
/// Each identifier survives once, at its strictly-highest score; ties keep
/// the first-seen item. Representatives are sorted by score descending with
/// a stable sort, so equal scores keep their first-seen order.
pub fn merge_best_survivors(hit_lists: Vec<Vec<EvidenceItem>>, max_total: usize) -> Vec<EvidenceItem> {
    let mut survivors: Vec<EvidenceItem> = Vec::new();
    let mut index_by_key: HashMap<(SourceKind, String), usize> = HashMap::new();

    for item in hit_lists.into_iter().flatten() {
        let key = (item.source_kind, item.identifier.clone());
        match index_by_key.get(&key) {
            Some(&idx) => {
                if item.score > survivors[idx].score {
                    survivors[idx] = item;
                }
            }
            None => {
                index_by_key.insert(key, survivors.len());
                survivors.push(item);
            }
        }
    }

    sort_by_score(&mut survivors);
    survivors.truncate(max_total);
    survivors
}

/// Stable descending sort by score.
pub fn sort_by_score(items: &mut [EvidenceItem]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Add `bonus` to every item whose label is wanted, then re-sort.
///
/// Never removes items: classifier labels are noisy, so a wanted label only
/// moves an item up. Returns the number of boosted items.
pub fn apply_label_boost(
    items: &mut [EvidenceItem],
    wanted_labels: &BTreeSet<String>,
    bonus: f32,
) -> usize {
    let mut boosted = 0;
    for item in items.iter_mut() {
        let wanted = item
            .label
            .as_ref()
            .is_some_and(|label| wanted_labels.contains(label));
        item.boosted = wanted;
        if wanted {
            item.score += bonus;
            boosted += 1;
        }
    }
    sort_by_score(items);
    boosted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rag::language::Language;

    fn item(id: &str, score: f32, label: Option<&str>) -> EvidenceItem {
        EvidenceItem {
            source_kind: SourceKind::Contract,
            identifier: id.into(),
            text: format!("text of {id}"),
            language: Language::En,
            score,
            origin_query: "q".into(),
            boosted: false,
            label: label.map(str::to_string),
            title: None,
        }
    }

    #[test]
    fn keeps_best_score_per_identifier() {
        let merged = merge_best_survivors(
            vec![
                vec![item("A001", 0.4, None), item("A002", 0.9, None)],
                vec![item("A001", 0.7, None)],
            ],
            10,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].identifier, "A002");
        assert_eq!(merged[1].identifier, "A001");
        assert_eq!(merged[1].score, 0.7);
    }

    #[test]
    fn ties_keep_first_seen() {
        let mut first = item("A001", 0.5, None);
        first.origin_query = "first".into();
        let mut second = item("A001", 0.5, None);
        second.origin_query = "second".into();

        let merged = merge_best_survivors(vec![vec![first], vec![second]], 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin_query, "first");
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let merged = merge_best_survivors(
            vec![vec![item("A003", 0.5, None), item("A001", 0.5, None), item("A002", 0.5, None)]],
            10,
        );
        let ids: Vec<_> = merged.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, vec!["A003", "A001", "A002"]);
    }

    #[test]
    fn truncates_to_max_total() {
        let list = (0..20).map(|i| item(&format!("A{i:03}"), i as f32 / 20.0, None)).collect();
        let merged = merge_best_survivors(vec![list], 5);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged[0].identifier, "A019");
    }

    #[test]
    fn merge_is_idempotent() {
        let list = vec![item("A001", 0.3, None), item("A002", 0.8, None), item("A003", 0.5, None)];
        let once = merge_best_survivors(vec![list.clone()], 10);
        let twice = merge_best_survivors(vec![list.clone(), list], 10);
        assert_eq!(once, twice);
        assert_eq!(twice.iter().find(|i| i.identifier == "A001").unwrap().score, 0.3);
    }

    #[test]
    fn same_identifier_in_different_corpora_both_survive() {
        let mut law = item("A001", 0.2, None);
        law.source_kind = SourceKind::Law;
        let merged = merge_best_survivors(vec![vec![item("A001", 0.9, None), law]], 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn boost_never_filters() {
        let mut items = vec![
            item("A001", 0.80, Some("salary_terms")),
            item("A002", 0.75, Some("probation")),
            item("A003", 0.50, None),
        ];
        let wanted: BTreeSet<String> = ["probation".to_string()].into();
        let before = items.len();

        let boosted = apply_label_boost(&mut items, &wanted, 0.10);

        assert_eq!(items.len(), before);
        assert_eq!(boosted, 1);
        assert_eq!(items[0].identifier, "A002");
        assert!(items[0].boosted);
        assert!((items[0].score - 0.85).abs() < 1e-6);
        assert!(!items[1].boosted);
    }

    #[test]
    fn boost_with_no_matches_keeps_order_and_scores() {
        let mut items = vec![item("A001", 0.9, Some("leave")), item("A002", 0.1, None)];
        let original = items.clone();
        let wanted: BTreeSet<String> = ["non_compete".to_string()].into();
        assert_eq!(apply_label_boost(&mut items, &wanted, 0.10), 0);
        assert_eq!(items, original);
    }
}
