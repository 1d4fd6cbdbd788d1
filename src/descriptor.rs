//! Connector descriptors: the read-only, interned "shape" of a connector name.
//!
//! A connector name such as `Ss*b` is conventionally an upper-case/digit head (the connector's
//! basic type) followed by a lower-case suffix (subtype markers). The tracon set's hash is
//! defined over two derived numeric forms of this name rather than the raw string, so
//! descriptors precompute them once at intern time.
//!
//! Descriptors are themselves interned: two connectors that name the same descriptor compare and
//! hash by `DescriptorId` identity, never by re-deriving `uc_num`/`lc_mask` or comparing strings.

use fnv::FnvHashMap;

use crate::intern::Symbol;
use crate::pool::{IndexedPool, PoolId};

pub type DescriptorId = PoolId<ConnectorDescriptor>;

/// The read-only record a connector points to.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorDescriptor {
    /// The interned spelling, e.g. `Ss*b`.
    pub name: Symbol,
    /// A packed numeric encoding of the upper-case/digit head, used by the tracon hash.
    pub uc_num: u32,
    /// A bitmap over `a..=z` of which lower-case subtype letters appear in the suffix.
    pub lc_mask: u32,
}

/// Derives `(uc_num, lc_mask)` from a connector's spelling.
///
/// The head is every leading character that is an upper-case ASCII letter, an ASCII digit, or `*`
/// (the wildcard marker); the first lower-case letter starts the suffix, which is scanned to the
/// end of the string for lower-case letters contributing to `lc_mask`. This derivation only needs
/// to be a fast, deterministic function suitable for hashing. Equality of connectors is always by
/// descriptor identity, never by comparing `uc_num`/`lc_mask` directly.
fn derive_numeric_forms(name: &str) -> (u32, u32) {
    let mut uc_num: u32 = 0;
    let mut lc_mask: u32 = 0;
    let mut in_suffix = false;
    for ch in name.chars() {
        if !in_suffix && (ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '*') {
            let digit = match ch {
                'A'..='Z' => ch as u32 - 'A' as u32,
                '0'..='9' => 26 + (ch as u32 - '0' as u32),
                _ => 36, // '*'
            };
            uc_num = uc_num.wrapping_mul(37).wrapping_add(digit + 1);
        } else if ch.is_ascii_lowercase() {
            in_suffix = true;
            lc_mask |= 1 << (ch as u32 - 'a' as u32);
        } else {
            in_suffix = true;
        }
    }
    (uc_num, lc_mask)
}

/// Interns [`ConnectorDescriptor`]s by name, so that every connector naming the same spelling
/// shares one descriptor object (and one `DescriptorId`).
#[derive(Debug, Default)]
pub struct DescriptorTable {
    descriptors: IndexedPool<ConnectorDescriptor>,
    by_name: FnvHashMap<Symbol, DescriptorId>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        DescriptorTable { descriptors: IndexedPool::new(), by_name: FnvHashMap::default() }
    }

    /// Interns the descriptor for `name` (already an interned [`Symbol`]), deriving its numeric
    /// hash forms from `spelling` the first time this name is seen.
    pub fn intern(&mut self, name: Symbol, spelling: &str) -> DescriptorId {
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let (uc_num, lc_mask) = derive_numeric_forms(spelling);
        let id = self.descriptors.alloc(ConnectorDescriptor { name, uc_num, lc_mask });
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, id: DescriptorId) -> &ConnectorDescriptor {
        self.descriptors.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::StringInterner;

    #[test]
    fn same_name_interns_to_same_descriptor() {
        let mut strings = StringInterner::new();
        let mut table = DescriptorTable::new();
        let a = strings.intern("Ss*b");
        let b = strings.intern("Ss*b");
        let d1 = table.intern(a, "Ss*b");
        let d2 = table.intern(b, "Ss*b");
        assert_eq!(d1, d2);
    }

    #[test]
    fn lc_mask_tracks_suffix_letters() {
        let (_, mask) = derive_numeric_forms("Xabz");
        assert_eq!(mask, (1 << 0) | (1 << 1) | (1 << 25));
    }

    #[test]
    fn distinct_names_get_distinct_descriptors() {
        let mut strings = StringInterner::new();
        let mut table = DescriptorTable::new();
        let a = strings.intern("Ss");
        let b = strings.intern("Wd");
        assert_ne!(table.intern(a, "Ss"), table.intern(b, "Wd"));
    }
}
