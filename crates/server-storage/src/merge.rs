use std::collections::BTreeMap;

use metrics_core::Metric;

/// Combines duplicate ids within a single batch, preserving first-seen order, using the
/// same merge rule storage applies against a previously-committed value: counters sum,
/// gauges overwrite. Two increments of the same counter in one request are summed before
/// a single merge against storage happens; this is what makes the outcome independent of
/// how a backend chooses to execute the batch.
pub fn reduce_batch(metrics: Vec<Metric>) -> Vec<Metric> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: std::collections::HashMap<String, Metric> = std::collections::HashMap::new();

    for metric in metrics {
        let id = metric.id().to_string();
        match by_id.remove(&id) {
            Some(existing) => {
                by_id.insert(id, existing.merge(metric));
            }
            None => {
                order.push(id.clone());
                by_id.insert(id, metric);
            }
        }
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}

/// Merges a reduced batch against the current store contents, returning what should
/// actually be written.
pub fn merge_against_store(existing: &BTreeMap<String, Metric>, reduced: Vec<Metric>) -> Vec<Metric> {
    reduced
        .into_iter()
        .map(|incoming| match existing.get(incoming.id()) {
            Some(current) => current.merge(incoming),
            None => incoming,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_batch_sums_duplicate_counters() {
        let input = vec![
            Metric::Counter { id: "x".into(), delta: 10 },
            Metric::Counter { id: "x".into(), delta: 2 },
        ];
        let reduced = reduce_batch(input);
        assert_eq!(reduced, vec![Metric::Counter { id: "x".into(), delta: 12 }]);
    }

    #[test]
    fn reduce_batch_keeps_last_gauge_reading() {
        let input = vec![
            Metric::Gauge { id: "g".into(), value: 1.0 },
            Metric::Gauge { id: "g".into(), value: 2.0 },
        ];
        let reduced = reduce_batch(input);
        assert_eq!(reduced, vec![Metric::Gauge { id: "g".into(), value: 2.0 }]);
    }

    #[test]
    fn reduce_batch_preserves_first_seen_order() {
        let input = vec![
            Metric::Gauge { id: "b".into(), value: 1.0 },
            Metric::Gauge { id: "a".into(), value: 1.0 },
            Metric::Gauge { id: "b".into(), value: 2.0 },
        ];
        let reduced = reduce_batch(input);
        assert_eq!(reduced.iter().map(|m| m.id()).collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn merge_against_store_adds_to_existing_counter() {
        let mut existing = BTreeMap::new();
        existing.insert("x".to_string(), Metric::Counter { id: "x".into(), delta: 5 });
        let merged = merge_against_store(&existing, vec![Metric::Counter { id: "x".into(), delta: 3 }]);
        assert_eq!(merged, vec![Metric::Counter { id: "x".into(), delta: 8 }]);
    }
}
