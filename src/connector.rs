//! The final, pool-allocated connector: the unit the matcher (outside this core's scope)
//! actually links words with.

use crate::descriptor::DescriptorId;
use crate::expr::Direction;
use crate::pool::{IndexedPool, PoolId};

/// An opaque handle back to whatever "originating generation word" record the dictionary/generator
/// layer uses. The core never interprets this value: it only copies it from a disjunct's
/// provenance onto every connector of that disjunct during preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GwordRef(pub u32);

pub type ConnectorId = PoolId<Connector>;

/// One half-link in a disjunct's left or right chain.
#[derive(Debug, Clone)]
pub struct Connector {
    pub descriptor: DescriptorId,
    pub multi: bool,
    pub direction: Direction,
    pub farthest_word: u32,
    /// The closest word index this connector could possibly reach. Unset (`None`) until
    /// preparation computes it.
    pub nearest_word: Option<i32>,
    /// True iff this is the first connector of its chain on its disjunct. Unset until preparation
    /// marks chain heads.
    pub shallow: bool,
    pub originating_gword: GwordRef,
    /// The next connector deeper into the chain (farther from the word this disjunct belongs to).
    pub next: Option<ConnectorId>,
}

impl Connector {
    /// A fresh connector as the disjunct builder creates it: everything preparation
    /// is responsible for is left unset.
    pub fn new(descriptor: DescriptorId, multi: bool, direction: Direction, farthest_word: u32) -> Self {
        Connector {
            descriptor,
            multi,
            direction,
            farthest_word,
            nearest_word: None,
            shallow: false,
            originating_gword: GwordRef::default(),
            next: None,
        }
    }
}

/// Per-sentence storage for connectors, addressed by [`ConnectorId`]. Released wholesale at
/// sentence teardown.
pub type ConnectorPool = IndexedPool<Connector>;

/// Walks a connector chain starting at `head`, collecting `(id, &Connector)` pairs in chain order
/// (head first, deepest last). Used by the tracon set, preparation, and tests; not performance
/// sensitive enough to warrant an iterator type of its own beyond a plain `Vec`.
pub fn chain_ids(pool: &ConnectorPool, head: Option<ConnectorId>) -> Vec<ConnectorId> {
    let mut ids = Vec::new();
    let mut cur = head;
    while let Some(id) = cur {
        ids.push(id);
        cur = pool.get(id).next;
    }
    ids
}
