//! The disjunct builder and the final, pool-allocated [`Disjunct`] type.

use tinyvec::TinyVec;

use crate::clause::{Clause, TempLink};
use crate::connector::{Connector, ConnectorId, ConnectorPool, GwordRef};
use crate::descriptor::DescriptorId;
use crate::error::CoreError;
use crate::expr::Direction;
use crate::intern::{StringInterner, Symbol};
use crate::pool::{IndexedPool, PoolId};
use crate::rng::Rng;

/// One entry of a category-encoded disjunct's category array.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryEntry {
    pub num: u16,
    pub cost: f64,
}

/// The word a disjunct belongs to: either an ordinary spelling, or (during generation) a small
/// set of category indices with per-category cost.
#[derive(Debug, Clone)]
pub enum WordForm {
    Spelling(Symbol),
    /// `Disjunct::cost` is not meaningful for category-encoded disjuncts (see DESIGN.md); only the
    /// per-category costs here are authoritative.
    Category(TinyVec<[CategoryEntry; 4]>),
}

impl WordForm {
    pub fn is_category(&self) -> bool {
        matches!(self, WordForm::Category(_))
    }
}

pub type DisjunctId = PoolId<Disjunct>;

/// The final, pool-allocated disjunct.
#[derive(Debug, Clone)]
pub struct Disjunct {
    pub left: Option<ConnectorId>,
    pub right: Option<ConnectorId>,
    pub word: WordForm,
    pub cost: f64,
    pub next: Option<DisjunctId>,
    pub provenance: GwordRef,
}

pub type DisjunctPool = IndexedPool<Disjunct>;

/// Tracks the chain being built for one direction during the walk in [`build_disjuncts`].
#[derive(Default)]
struct DirState {
    head: Option<ConnectorId>,
    tail: Option<ConnectorId>,
    sealed: bool,
}

impl DirState {
    fn append_existing(&mut self, connectors: &mut ConnectorPool, id: ConnectorId) {
        match self.tail {
            None => self.head = Some(id),
            Some(t) => connectors.get_mut(t).next = Some(id),
        }
        self.sealed = true;
    }

    fn append_fresh(&mut self, connectors: &mut ConnectorPool, id: ConnectorId) {
        match self.tail {
            None => self.head = Some(id),
            Some(t) => connectors.get_mut(t).next = Some(id),
        }
        self.tail = Some(id);
    }
}

/// Parses the category-index convention: a word string whose first byte is ASCII space is a
/// hexadecimal category number in `(0, 65536)`.
fn parse_category(word: &str) -> Result<u16, CoreError> {
    let digits = &word[1..];
    let value = u32::from_str_radix(digits, 16).map_err(|_| CoreError::CorruptDictionary {
        detail: format!("category-encoded word {word:?} is not valid hex"),
    })?;
    if value == 0 || value >= 65536 {
        return Err(CoreError::CorruptDictionary {
            detail: format!("category index {value} out of range (0, 65536)"),
        });
    }
    Ok(value as u16)
}

/// Builds the disjunct for one surviving clause, threading shared suffixes through
/// `TempLink::cache`.
fn materialize_clause(
    clause: &Clause,
    temp: &IndexedPool<TempLink>,
    connectors: &mut ConnectorPool,
) -> (Option<ConnectorId>, Option<ConnectorId>) {
    let mut minus = DirState::default();
    let mut plus = DirState::default();

    let mut cur = clause.links;
    while let Some(id) = cur {
        let entry = temp.get(id);
        let state = match entry.direction {
            Direction::Minus => &mut minus,
            Direction::Plus => &mut plus,
        };
        if !state.sealed {
            if let Some(cached) = entry.cache.get() {
                state.append_existing(connectors, cached);
            } else {
                let new_id = connectors.alloc(Connector::new(
                    entry.descriptor,
                    entry.multi,
                    entry.direction,
                    entry.farthest_word,
                ));
                entry.cache.set(Some(new_id));
                state.append_fresh(connectors, new_id);
            }
        }
        cur = entry.next;
    }

    (minus.head, plus.head)
}

/// Materializes every surviving clause of `clauses` into a disjunct, prepending each onto the
/// per-word list (final order is therefore the reverse of clause order).
///
/// `word` is either an ordinary spelling or a category-encoded string. `max_disjuncts` (0
/// disables) and `rand_state` implement the optional down-sampling; a non-zero
/// `rand_state` makes the down-sampler deterministic.
#[allow(clippy::too_many_arguments)]
pub fn build_disjuncts(
    clauses: &[Clause],
    temp: &IndexedPool<TempLink>,
    word: &str,
    cutoff: f64,
    provenance: GwordRef,
    max_disjuncts: usize,
    rand_state: u64,
    connectors: &mut ConnectorPool,
    disjuncts: &mut DisjunctPool,
    strings: &mut StringInterner,
) -> Result<Option<DisjunctId>, CoreError> {
    let is_category = word.as_bytes().first() == Some(&b' ');
    let mut head: Option<DisjunctId> = None;
    let mut built: Vec<DisjunctId> = Vec::new();

    for clause in clauses {
        if clause.links.is_none() {
            continue;
        }
        if clause.cost > cutoff {
            continue;
        }

        let (left, right) = materialize_clause(clause, temp, connectors);

        let (word_form, cost) = if is_category {
            let num = parse_category(word)?;
            let mut arr = TinyVec::new();
            arr.push(CategoryEntry { num, cost: clause.cost });
            (WordForm::Category(arr), 0.0)
        } else {
            (WordForm::Spelling(strings.intern(word)), clause.cost)
        };

        let id = disjuncts.alloc(Disjunct {
            left,
            right,
            word: word_form,
            cost,
            next: head,
            provenance,
        });
        head = Some(id);
        built.push(id);
    }

    if max_disjuncts == 0 || built.len() <= max_disjuncts {
        return Ok(head);
    }

    let sampled = down_sample(&built, max_disjuncts, rand_state);
    Ok(relink(disjuncts, &sampled))
}

/// Approximate reservoir down-sampling: keep the head; then keep each subsequent entry
/// independently with probability `max/len`. Not a uniform reservoir by design (see DESIGN.md).
fn down_sample(ids: &[DisjunctId], max: usize, rand_state: u64) -> Vec<DisjunctId> {
    let mut rng = Rng::seeded(rand_state);
    let len = ids.len();
    let mut kept = Vec::with_capacity(max.min(len));
    for (i, &id) in ids.iter().enumerate() {
        if i == 0 || rng.below(len as u64) < max as u64 {
            kept.push(id);
        }
    }
    kept
}

/// Re-links a flat list of disjuncts into the `next`-chained form the rest of the pipeline expects,
/// returning the new head.
fn relink(disjuncts: &mut DisjunctPool, ids: &[DisjunctId]) -> Option<DisjunctId> {
    for window in ids.windows(2) {
        disjuncts.get_mut(window[0]).next = Some(window[1]);
    }
    if let Some(&last) = ids.last() {
        disjuncts.get_mut(last).next = None;
    }
    ids.first().copied()
}

/// Walks a disjunct list starting at `head`, collecting ids in list order.
pub fn disjunct_ids(disjuncts: &DisjunctPool, head: Option<DisjunctId>) -> Vec<DisjunctId> {
    let mut ids = Vec::new();
    let mut cur = head;
    while let Some(id) = cur {
        ids.push(id);
        cur = disjuncts.get(id).next;
    }
    ids
}

/// Used by dedup and preparation to identify a descriptor without threading a whole `ConnectorPool`
/// reference everywhere; kept here since it's purely a disjunct/connector concern.
pub fn descriptor_of(connectors: &ConnectorPool, id: ConnectorId) -> DescriptorId {
    connectors.get(id).descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::ClausePools;
    use crate::descriptor::DescriptorTable;
    use crate::expr::{ConnectorNode, GroupNode, Node};

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
    }

    #[test]
    fn single_connector_builds_one_sided_disjunct() {
        let mut fx = Fixture::new();
        let node = fx.connector("A", Direction::Plus, 0.5);
        let mut pools = ClausePools::new();
        let mut counter = 0;
        let clauses = crate::clause::expand(&node, 0, f64::INFINITY, &mut counter, &mut pools).unwrap();
        let head = build_disjuncts(
            &clauses,
            &pools.temp,
            "word",
            f64::INFINITY,
            GwordRef(7),
            0,
            1,
            &mut fx.connectors,
            &mut fx.disjuncts,
            &mut fx.strings,
        )
        .unwrap();
        let ids = disjunct_ids(&fx.disjuncts, head);
        assert_eq!(ids.len(), 1);
        let d = fx.disjuncts.get(ids[0]);
        assert_eq!(d.cost, 0.5);
        assert!(d.left.is_none());
        assert!(d.right.is_some());
        assert_eq!(d.provenance, GwordRef(7));
    }

    #[test]
    fn cost_cutoff_drops_expensive_clauses() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Plus, 1.0);
        let b = fx.connector("B", Direction::Plus, 2.0);
        let or_node = Node::Or(GroupNode { operands: vec![a, b], cost: 0.0, tag: None });
        let mut pools = ClausePools::new();
        let mut counter = 0;
        let clauses = crate::clause::expand(&or_node, 0, f64::INFINITY, &mut counter, &mut pools).unwrap();
        let head = build_disjuncts(
            &clauses,
            &pools.temp,
            "word",
            1.5,
            GwordRef(0),
            0,
            1,
            &mut fx.connectors,
            &mut fx.disjuncts,
            &mut fx.strings,
        )
        .unwrap();
        let ids = disjunct_ids(&fx.disjuncts, head);
        assert_eq!(ids.len(), 1);
        assert_eq!(fx.disjuncts.get(ids[0]).cost, 1.0);
    }

    #[test]
    fn category_word_parses_hex_index() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Plus, 0.3);
        let mut pools = ClausePools::new();
        let mut counter = 0;
        let clauses = crate::clause::expand(&a, 0, f64::INFINITY, &mut counter, &mut pools).unwrap();
        let head = build_disjuncts(
            &clauses,
            &pools.temp,
            " 2a",
            f64::INFINITY,
            GwordRef(0),
            0,
            1,
            &mut fx.connectors,
            &mut fx.disjuncts,
            &mut fx.strings,
        )
        .unwrap();
        let ids = disjunct_ids(&fx.disjuncts, head);
        let d = fx.disjuncts.get(ids[0]);
        assert!(d.word.is_category());
        match &d.word {
            WordForm::Category(arr) => {
                assert_eq!(arr.len(), 1);
                assert_eq!(arr[0].num, 0x2a);
                assert_eq!(arr[0].cost, 0.3);
            }
            _ => panic!("expected category word"),
        }
    }

    #[test]
    fn out_of_range_category_is_corrupt_dictionary() {
        let mut fx = Fixture::new();
        let a = fx.connector("A", Direction::Plus, 0.0);
        let mut pools = ClausePools::new();
        let mut counter = 0;
        let clauses = crate::clause::expand(&a, 0, f64::INFINITY, &mut counter, &mut pools).unwrap();
        let result = build_disjuncts(
            &clauses,
            &pools.temp,
            " 10000",
            f64::INFINITY,
            GwordRef(0),
            0,
            1,
            &mut fx.connectors,
            &mut fx.disjuncts,
            &mut fx.strings,
        );
        assert!(matches!(result, Err(CoreError::CorruptDictionary { .. })));
    }

    #[test]
    fn max_disjuncts_zero_disables_sampling() {
        let mut fx = Fixture::new();
        let mut operands = Vec::new();
        for i in 0..20 {
            operands.push(fx.connector(&format!("A{i}"), Direction::Plus, 0.0));
        }
        let or_node = Node::Or(GroupNode { operands, cost: 0.0, tag: None });
        let mut pools = ClausePools::new();
        let mut counter = 0;
        let clauses = crate::clause::expand(&or_node, 0, f64::INFINITY, &mut counter, &mut pools).unwrap();
        let head = build_disjuncts(
            &clauses,
            &pools.temp,
            "word",
            f64::INFINITY,
            GwordRef(0),
            0,
            1,
            &mut fx.connectors,
            &mut fx.disjuncts,
            &mut fx.strings,
        )
        .unwrap();
        assert_eq!(disjunct_ids(&fx.disjuncts, head).len(), 20);
    }

    #[test]
    fn down_sampling_is_deterministic_for_nonzero_seed() {
        let mut fx1 = Fixture::new();
        let mut operands1 = Vec::new();
        for i in 0..50 {
            operands1.push(fx1.connector(&format!("A{i}"), Direction::Plus, 0.0));
        }
        let or1 = Node::Or(GroupNode { operands: operands1, cost: 0.0, tag: None });
        let mut pools1 = ClausePools::new();
        let mut counter1 = 0;
        let clauses1 = crate::clause::expand(&or1, 0, f64::INFINITY, &mut counter1, &mut pools1).unwrap();
        let head1 = build_disjuncts(
            &clauses1,
            &pools1.temp,
            "word",
            f64::INFINITY,
            GwordRef(0),
            10,
            42,
            &mut fx1.connectors,
            &mut fx1.disjuncts,
            &mut fx1.strings,
        )
        .unwrap();
        let count1 = disjunct_ids(&fx1.disjuncts, head1).len();

        let mut fx2 = Fixture::new();
        let mut operands2 = Vec::new();
        for i in 0..50 {
            operands2.push(fx2.connector(&format!("A{i}"), Direction::Plus, 0.0));
        }
        let or2 = Node::Or(GroupNode { operands: operands2, cost: 0.0, tag: None });
        let mut pools2 = ClausePools::new();
        let mut counter2 = 0;
        let clauses2 = crate::clause::expand(&or2, 0, f64::INFINITY, &mut counter2, &mut pools2).unwrap();
        let head2 = build_disjuncts(
            &clauses2,
            &pools2.temp,
            "word",
            f64::INFINITY,
            GwordRef(0),
            10,
            42,
            &mut fx2.connectors,
            &mut fx2.disjuncts,
            &mut fx2.strings,
        )
        .unwrap();
        let count2 = disjunct_ids(&fx2.disjuncts, head2).len();

        assert_eq!(count1, count2);
    }
}
