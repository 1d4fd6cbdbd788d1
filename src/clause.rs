//! The clause builder: expands one word's expression tree into a list of AND-clauses.
//!
//! Each clause is a singly-linked list of [`TempLink`] scratch records, addressed by
//! [`TempLinkId`] into a per-word [`ClausePools`], plus an accumulated cost. Ids (rather than
//! references) let `catenate` share tails between sibling clauses without the self-referential
//! lifetime that a reference-based arena would force onto every caller (see the module docs on
//! `pool.rs`).

use std::cell::Cell;

use itertools::iproduct;

use crate::connector::ConnectorId;
use crate::descriptor::DescriptorId;
use crate::error::CoreError;
use crate::expr::{Direction, Node};
use crate::pool::{IndexedPool, PoolId};

pub type TempLinkId = PoolId<TempLink>;

/// One temporary half-link: everything the disjunct builder needs to later materialize a
/// real [`crate::connector::Connector`], plus a write-once cache slot.
///
/// `cache` exists because `catenate` never copies its second argument: many sibling clauses
/// produced by the AND fold end up sharing the exact same `TempLink` entries
/// for whatever sub-expression was already fully expanded before this operand. The first clause the
/// disjunct builder processes that reaches one of those shared entries allocates a real connector
/// and writes it here; every other sibling clause that later reaches the same `TempLink` sees the
/// cache populated and reuses the connector (and, transitively, its whole downstream chain) instead
/// of allocating again.
pub struct TempLink {
    pub descriptor: DescriptorId,
    pub direction: Direction,
    pub multi: bool,
    pub farthest_word: u32,
    pub exp_pos: u32,
    pub cache: Cell<Option<ConnectorId>>,
    pub next: Option<TempLinkId>,
}

/// One AND-clause: an ordered half-link list plus its accumulated cost.
#[derive(Clone, Copy)]
pub struct Clause {
    pub links: Option<TempLinkId>,
    pub cost: f64,
}

/// The scratch pool the clause builder allocates from, reset at each word boundary.
#[derive(Default)]
pub struct ClausePools {
    pub temp: IndexedPool<TempLink>,
}

impl ClausePools {
    pub fn new() -> Self {
        ClausePools { temp: IndexedPool::new() }
    }

    pub fn reset(&mut self) {
        self.temp.reset();
    }
}

/// Copies `head1`'s chain into fresh pool entries and links the last copy onto `head2`, which is
/// referenced rather than copied. See the `TempLink::cache` docs above for why this asymmetry is
/// exactly what makes suffix sharing work.
fn catenate(
    pool: &mut IndexedPool<TempLink>,
    head1: Option<TempLinkId>,
    head2: Option<TempLinkId>,
) -> Option<TempLinkId> {
    match head1 {
        None => head2,
        Some(id) => {
            let node = pool.get(id);
            let descriptor = node.descriptor;
            let direction = node.direction;
            let multi = node.multi;
            let farthest_word = node.farthest_word;
            let exp_pos = node.exp_pos;
            let next = node.next;

            let rest = catenate(pool, next, head2);
            Some(pool.alloc(TempLink {
                descriptor,
                direction,
                multi,
                farthest_word,
                exp_pos,
                cache: Cell::new(None),
                next: rest,
            }))
        }
    }
}

/// Expands expression tree `node` into its list of clauses.
///
/// `cutoff` is threaded through for interface parity with the disjunct builder, which does
/// the actual cost-based filtering; the clause builder itself performs no pruning. `counter`
/// assigns each CONNECTOR leaf a fresh monotonic
/// `exp_pos`, scoped to one word's expansion and reset by the caller between words (never stored on
/// the shared, cross-sentence expression tree; see `expr.rs`).
pub fn expand(
    node: &Node,
    word: usize,
    _cutoff: f64,
    counter: &mut u32,
    pools: &mut ClausePools,
) -> Result<Vec<Clause>, CoreError> {
    match node {
        Node::Connector(c) => {
            *counter += 1;
            let link = pools.temp.alloc(TempLink {
                descriptor: c.descriptor,
                direction: c.direction,
                multi: c.multi,
                farthest_word: c.farthest_word,
                exp_pos: *counter,
                cache: Cell::new(None),
                next: None,
            });
            Ok(vec![Clause { links: Some(link), cost: c.cost }])
        }
        Node::And(g) => {
            let mut acc = vec![Clause { links: None, cost: 0.0 }];
            for operand in &g.operands {
                let operand_clauses = expand(operand, word, _cutoff, counter, pools)?;
                acc = iproduct!(acc.iter(), operand_clauses.iter())
                    .map(|(a, b)| Clause {
                        links: catenate(&mut pools.temp, b.links, a.links),
                        cost: a.cost + b.cost,
                    })
                    .collect();
            }
            for clause in &mut acc {
                clause.cost += g.cost;
            }
            Ok(acc)
        }
        Node::Or(g) => {
            let mut result = Vec::new();
            for operand in &g.operands {
                result.extend(expand(operand, word, _cutoff, counter, pools)?);
            }
            for clause in &mut result {
                clause.cost += g.cost;
            }
            Ok(result)
        }
    }
}
