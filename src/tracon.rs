//! The tracon set: a specialized hash set over connector chains, keyed by structural
//! equality along the `next` chain.
//!
//! "Tracon" = the tail of a connector chain starting at some head; interning tracons is what lets
//! the duplicate eliminator and the downstream matcher compare whole connector suffixes by a
//! single pointer/id instead of walking them.

use crate::connector::{ConnectorId, ConnectorPool};
use crate::descriptor::DescriptorTable;

/// The fixed sequence of table sizes the tracon set cycles through as it grows.
const PRIMES: &[usize] = &[
    61, 127, 251, 509, 1021, 2039, 4093, 8191, 16381, 32749, 65521, 131071, 262139, 524287,
    1_048_573, 2_097_143, 4_194_301, 8_388_593, 16_777_213, 33_554_393,
];

#[derive(Clone, Copy)]
struct Slot {
    primary: u64,
    stride: u64,
    head: ConnectorId,
}

/// Either the slot already held a structurally-equal chain, or it was empty and now holds `head`
/// as the canonical chain for this structural shape (the caller must fill an empty slot; folded
/// into one call for the common case).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonical {
    /// A structurally-equal chain was already present; this is its head.
    Existing(ConnectorId),
    /// No equal chain existed; the chain passed in is now the canonical one.
    Inserted(ConnectorId),
}

impl Canonical {
    pub fn head(self) -> ConnectorId {
        match self {
            Canonical::Existing(id) | Canonical::Inserted(id) => id,
        }
    }
}

pub struct TraconSet {
    slots: Vec<Option<Slot>>,
    count: usize,
    prime_index: usize,
    shallow_discriminating: bool,
}

impl TraconSet {
    pub fn new(shallow_discriminating: bool) -> Self {
        TraconSet {
            slots: vec![None; PRIMES[0]],
            count: 0,
            prime_index: 0,
            shallow_discriminating,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Clears slot contents but keeps the allocated table.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.count = 0;
    }

    /// Looks up `head`'s chain, inserting it as canonical if no structurally-equal chain is
    /// present. This is the common-case entry point used by the duplicate eliminator.
    pub fn canonicalize(
        &mut self,
        connectors: &ConnectorPool,
        descriptors: &DescriptorTable,
        head: Option<ConnectorId>,
    ) -> Option<Canonical> {
        let head = head?;
        self.maybe_grow();
        let (primary, stride) = hash_chain(connectors, descriptors, head, self.shallow_discriminating);
        let size = self.slots.len();
        let mut index = (primary as usize) % size;
        let probe_stride = probe_stride_for(stride, size);
        loop {
            match self.slots[index] {
                None => {
                    self.slots[index] = Some(Slot { primary, stride, head });
                    self.count += 1;
                    return Some(Canonical::Inserted(head));
                }
                Some(slot) if slot.primary == primary && slot.stride == stride => {
                    if chains_equal(
                        connectors,
                        descriptors,
                        Some(slot.head),
                        Some(head),
                        self.shallow_discriminating,
                    ) {
                        return Some(Canonical::Existing(slot.head));
                    }
                    index = (index + probe_stride) % size;
                }
                Some(_) => {
                    index = (index + probe_stride) % size;
                }
            }
        }
    }

    fn maybe_grow(&mut self) {
        if 8 * (self.count + 1) <= 3 * self.slots.len() {
            return;
        }
        let Some(&new_size) = PRIMES.get(self.prime_index + 1) else {
            return; // already at the largest size in the sequence
        };
        self.prime_index += 1;
        let old_slots = std::mem::replace(&mut self.slots, vec![None; new_size]);
        self.count = 0;
        for slot in old_slots.into_iter().flatten() {
            self.rehash_in_place(slot);
        }
    }

    fn rehash_in_place(&mut self, slot: Slot) {
        let size = self.slots.len();
        let mut index = (slot.primary as usize) % size;
        let probe_stride = probe_stride_for(slot.stride, size);
        loop {
            if self.slots[index].is_none() {
                self.slots[index] = Some(slot);
                self.count += 1;
                return;
            }
            index = (index + probe_stride) % size;
        }
    }
}

/// Computes `(primary, stride)` for the chain starting at `head`. Primary uses multiplier 7,
/// stride uses multiplier 17 and is forced non-zero so double hashing always makes progress.
fn hash_chain(
    connectors: &ConnectorPool,
    descriptors: &DescriptorTable,
    head: ConnectorId,
    shallow_discriminating: bool,
) -> (u64, u64) {
    let mut primary: u64 = 0;
    let mut stride: u64 = 0;
    let mut cur = Some(head);
    let mut first = true;
    while let Some(id) = cur {
        let conn = connectors.get(id);
        let desc = descriptors.get(conn.descriptor);
        let mut mix = (desc.uc_num as u64) ^ ((desc.lc_mask as u64) << 32) ^ (conn.multi as u64);
        if first && shallow_discriminating {
            mix ^= (conn.shallow as u64) << 63;
        }
        primary = primary.wrapping_mul(7).wrapping_add(mix);
        stride = stride.wrapping_mul(17).wrapping_add(mix);
        cur = conn.next;
        first = false;
    }
    (primary, stride | 1)
}

/// Reduces a raw stride hash into `[1, size-1]` so a double-hashing probe is guaranteed to advance
/// `index` on every step and to eventually visit every slot. `stride | 1` alone is not enough: for
/// an odd prime `size` there exist odd `stride` values with `stride % size == 0` (e.g. `size=61`,
/// `stride=183`), which would otherwise leave `index` unchanged forever.
fn probe_stride_for(stride: u64, size: usize) -> usize {
    1 + (stride % (size as u64 - 1)) as usize
}

/// Structural equality along the chain: same length, corresponding connectors share descriptor
/// identity and `multi`; in shallow-discriminating mode the heads' `shallow` flags must also match.
fn chains_equal(
    connectors: &ConnectorPool,
    _descriptors: &DescriptorTable,
    mut a: Option<ConnectorId>,
    mut b: Option<ConnectorId>,
    shallow_discriminating: bool,
) -> bool {
    let mut first = true;
    loop {
        match (a, b) {
            (None, None) => return true,
            (Some(ai), Some(bi)) => {
                let ca = connectors.get(ai);
                let cb = connectors.get(bi);
                if ca.descriptor != cb.descriptor || ca.multi != cb.multi {
                    return false;
                }
                if first && shallow_discriminating && ca.shallow != cb.shallow {
                    return false;
                }
                a = ca.next;
                b = cb.next;
                first = false;
            }
            _ => return false,
        }
    }
}
