//! Relation-grouped batching for staged verbalization.
//!
//! Large fact lists are consumed in bounded batches, with the constraint
//! that all facts sharing a relation travel together: a relation's group is
//! never split across batches. A single group larger than the budget is
//! emitted as one over-budget batch rather than truncated, so every fact
//! appears exactly once.

use crate::wikidata::{Fact, verbalize};

/// Default batch budget, in facts.
pub const DEFAULT_BATCH_SIZE: usize = 15;

/// Lazy iterator over verbalized fact batches.
///
/// Groups facts by relation in first-seen order, then accumulates whole
/// groups into a running batch while it stays within `max_batch_size`;
/// a group that would overflow flushes the current batch and starts the
/// next one.
pub struct FactBatches {
    groups: std::vec::IntoIter<Vec<Fact>>,
    current: Vec<Fact>,
    max_batch_size: usize,
}

impl FactBatches {
    /// Plan batches over `facts` with the given budget.
    pub fn new(facts: &[Fact], max_batch_size: usize) -> Self {
        let mut groups: Vec<(String, Vec<Fact>)> = Vec::new();
        for fact in facts {
            match groups.iter_mut().find(|(rel, _)| *rel == fact.relation) {
                Some((_, group)) => group.push(fact.clone()),
                None => groups.push((fact.relation.clone(), vec![fact.clone()])),
            }
        }

        Self {
            groups: groups
                .into_iter()
                .map(|(_, group)| group)
                .collect::<Vec<_>>()
                .into_iter(),
            current: Vec::new(),
            max_batch_size,
        }
    }
}

impl Iterator for FactBatches {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Vec<String>> {
        for group in self.groups.by_ref() {
            if self.current.len() + group.len() <= self.max_batch_size {
                self.current.extend(group);
            } else {
                let ready = std::mem::replace(&mut self.current, group);
                if !ready.is_empty() {
                    return Some(verbalize(&ready));
                }
                // The first group alone exceeded the budget; it becomes the
                // running batch and flushes on the next overflow or at the end.
            }
        }

        if self.current.is_empty() {
            None
        } else {
            Some(verbalize(&std::mem::take(&mut self.current)))
        }
    }
}
