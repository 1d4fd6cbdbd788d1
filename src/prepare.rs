//! The preparator: computes each connector's `nearest_word`, prunes disjuncts whose reach
//! extends past the sentence boundary, and marks chain heads `shallow`.

use crate::connector::{ConnectorId, ConnectorPool};
use crate::disjunct::{disjunct_ids, DisjunctId, DisjunctPool, WordForm};
use crate::error::CoreError;

/// Walks a chain from its head, stamping `nearest_word` starting at `start` and moving by `step`
/// each link deeper. Returns the deepest (last) connector's `nearest_word`, or `start` unchanged if
/// the chain is empty (callers only consult this value when the chain is non-empty).
fn stamp_nearest_word(
    connectors: &mut ConnectorPool,
    head: Option<ConnectorId>,
    start: i32,
    step: i32,
) -> i32 {
    let mut cur = head;
    let mut value = start;
    while let Some(id) = cur {
        let conn = connectors.get_mut(id);
        conn.nearest_word = Some(value);
        let next = conn.next;
        value += step;
        cur = next;
    }
    value - step
}

fn mark_shallow(connectors: &mut ConnectorPool, head: Option<ConnectorId>) {
    if let Some(id) = head {
        connectors.get_mut(id).shallow = true;
    }
}

/// Prepares every disjunct of word `w` in a sentence of length `len`: computes reach, drops
/// disjuncts that cannot link within the sentence, marks surviving chain heads shallow, and stamps
/// `originating_gword` from each disjunct's provenance onto every one of its connectors.
///
/// Preparation errors are sentence-fatal: `word` and `len` are caller-checked invariants, not
/// recoverable per-disjunct conditions, so this returns `CoreError::OverBudget` only if `word` is
/// out of range for `len`; otherwise it cannot fail.
pub fn prepare_word(
    connectors: &mut ConnectorPool,
    disjuncts: &mut DisjunctPool,
    head: Option<DisjunctId>,
    word: usize,
    len: usize,
) -> Result<Option<DisjunctId>, CoreError> {
    if word >= len {
        return Err(CoreError::OverBudget);
    }
    let w = word as i32;
    let l = len as i32;

    let ids = disjunct_ids(disjuncts, head);
    let mut survivors = Vec::with_capacity(ids.len());

    for id in ids {
        let (left, right, provenance) = {
            let d = disjuncts.get(id);
            (d.left, d.right, d.provenance)
        };

        let left_ok = match left {
            None => true,
            Some(_) => stamp_nearest_word(connectors, left, w - 1, -1) >= 0,
        };
        let right_ok = match right {
            None => true,
            Some(_) => stamp_nearest_word(connectors, right, w + 1, 1) < l,
        };

        if !left_ok || !right_ok {
            // The category array (if any) is dropped along with the disjunct; there is no
            // separate free path since the pool itself owns the storage.
            continue;
        }

        mark_shallow(connectors, left);
        mark_shallow(connectors, right);

        for chain_head in [left, right] {
            let mut cur = chain_head;
            while let Some(cid) = cur {
                let conn = connectors.get_mut(cid);
                conn.originating_gword = provenance;
                cur = conn.next;
            }
        }

        survivors.push(id);
    }

    Ok(relink(disjuncts, &survivors))
}

fn relink(
    disjuncts: &mut DisjunctPool,
    ids: &[DisjunctId],
) -> Option<DisjunctId> {
    for window in ids.windows(2) {
        disjuncts.get_mut(window[0]).next = Some(window[1]);
    }
    if let Some(&last) = ids.last() {
        disjuncts.get_mut(last).next = None;
    }
    ids.first().copied()
}

/// True iff `word`'s `WordForm` carries category entries. Re-exported here only for callers that
/// want to assert a disjunct's shape without importing `disjunct` directly.
pub fn is_category(word: &WordForm) -> bool {
    word.is_category()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{expand, ClausePools};
    use crate::connector::GwordRef;
    use crate::descriptor::DescriptorTable;
    use crate::disjunct::build_disjuncts;
    use crate::expr::{ConnectorNode, Direction, GroupNode, Node};
    use crate::intern::StringInterner;

    struct Fixture {
        strings: StringInterner,
        descriptors: DescriptorTable,
        connectors: ConnectorPool,
        disjuncts: DisjunctPool,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                strings: StringInterner::new(),
                descriptors: DescriptorTable::new(),
                connectors: ConnectorPool::new(),
                disjuncts: DisjunctPool::new(),
            }
        }

        fn connector(&mut self, name: &str, dir: Direction, cost: f64) -> Node {
            let sym = self.strings.intern(name);
            let descriptor = self.descriptors.intern(sym, name);
            Node::Connector(ConnectorNode {
                direction: dir,
                multi: false,
                descriptor,
                cost,
                farthest_word: 0,
                tag: None,
            })
        }

        fn build(&mut self, node: &Node) -> Option<DisjunctId> {
            let mut pools = ClausePools::new();
            let mut counter = 0;
            let clauses = expand(node, 0, f64::INFINITY, &mut counter, &mut pools).unwrap();
            build_disjuncts(
                &clauses,
                &pools.temp,
                "word",
                f64::INFINITY,
                GwordRef(0),
                0,
                1,
                &mut self.connectors,
                &mut self.disjuncts,
                &mut self.strings,
            )
            .unwrap()
        }
    }

    #[test]
    fn single_right_connector_survives_and_gets_nearest_word() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Plus, 0.5);
        let head = fx.build(&a);
        let survivors = prepare_word(&mut fx.connectors, &mut fx.disjuncts, head, 0, 2).unwrap();
        let ids = disjunct_ids(&fx.disjuncts, survivors);
        assert_eq!(ids.len(), 1);
        let d = fx.disjuncts.get(ids[0]);
        let right = fx.connectors.get(d.right.unwrap());
        assert_eq!(right.nearest_word, Some(1));
        assert!(right.shallow);
    }

    #[test]
    fn and_produces_shallow_heads_on_both_chains() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Minus, 0.0);
        let b = fx.connector("B", Direction::Plus, 0.0);
        let and_node = Node::And(GroupNode { operands: vec![a, b], cost: 0.0, tag: None });
        let head = fx.build(&and_node);
        let survivors = prepare_word(&mut fx.connectors, &mut fx.disjuncts, head, 1, 3).unwrap();
        let ids = disjunct_ids(&fx.disjuncts, survivors);
        assert_eq!(ids.len(), 1);
        let d = fx.disjuncts.get(ids[0]);
        let left = fx.connectors.get(d.left.unwrap());
        let right = fx.connectors.get(d.right.unwrap());
        assert_eq!(left.nearest_word, Some(0));
        assert!(left.shallow);
        assert_eq!(right.nearest_word, Some(2));
        assert!(right.shallow);
    }

    #[test]
    fn reach_past_sentence_start_is_pruned() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Minus, 0.0);
        let b = fx.connector("B", Direction::Minus, 0.0);
        let and_node = Node::And(GroupNode { operands: vec![a, b], cost: 0.0, tag: None });
        let head = fx.build(&and_node);
        let survivors = prepare_word(&mut fx.connectors, &mut fx.disjuncts, head, 0, 3).unwrap();
        assert!(disjunct_ids(&fx.disjuncts, survivors).is_empty());
    }

    #[test]
    fn sentence_length_one_prunes_any_nonempty_chain() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Plus, 0.0);
        let head = fx.build(&a);
        let survivors = prepare_word(&mut fx.connectors, &mut fx.disjuncts, head, 0, 1).unwrap();
        assert!(disjunct_ids(&fx.disjuncts, survivors).is_empty());
    }

    #[test]
    fn out_of_range_word_is_over_budget() {
        let mut fx = Fixture::new();
        let result = prepare_word(&mut fx.connectors, &mut fx.disjuncts, None, 5, 3);
        assert!(matches!(result, Err(CoreError::OverBudget)));
    }

    #[test]
    fn provenance_is_stamped_onto_every_connector() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Minus, 0.0);
        let b = fx.connector("B", Direction::Plus, 0.0);
        let and_node = Node::And(GroupNode { operands: vec![a, b], cost: 0.0, tag: None });
        let mut pools = ClausePools::new();
        let mut counter = 0;
        let clauses = expand(&and_node, 0, f64::INFINITY, &mut counter, &mut pools).unwrap();
        let head = build_disjuncts(
            &clauses,
            &pools.temp,
            "word",
            f64::INFINITY,
            GwordRef(99),
            0,
            1,
            &mut fx.connectors,
            &mut fx.disjuncts,
            &mut fx.strings,
        )
        .unwrap();
        let survivors = prepare_word(&mut fx.connectors, &mut fx.disjuncts, head, 1, 3).unwrap();
        let ids = disjunct_ids(&fx.disjuncts, survivors);
        let d = fx.disjuncts.get(ids[0]);
        assert_eq!(fx.connectors.get(d.left.unwrap()).originating_gword, GwordRef(99));
        assert_eq!(fx.connectors.get(d.right.unwrap()).originating_gword, GwordRef(99));
    }
}
