//! A canonical-string interner backing connector names and word spellings.
//!
//! Lookups into the dictionary and the tracon set are by identity after interning: two equal
//! strings intern to the same [`Symbol`], so comparing connector names is a `u32` comparison
//! rather than a byte-wise one. The interner only grows; there is no removal, matching a
//! read-only-after-load sharing model (one interner backs a whole dictionary and may be read from
//! multiple sentence-parsing threads concurrently once loading has finished).

use fnv::FnvHashMap;

/// An interned string's identity. Cheap to copy, compare, and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    fn new(index: usize) -> Self {
        Symbol(index as u32)
    }
}

/// The set of canonical strings. Not `Sync`-free by construction, but intended to be built once
/// (single-threaded, during dictionary load) and then shared read-only; see module docs.
#[derive(Debug, Default)]
pub struct StringInterner {
    strings: Vec<Box<str>>,
    by_text: FnvHashMap<Box<str>, Symbol>,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner { strings: Vec::new(), by_text: FnvHashMap::default() }
    }

    /// Interns `text`, returning its existing symbol if already present or allocating a new one.
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&sym) = self.by_text.get(text) {
            return sym;
        }
        let sym = Symbol::new(self.strings.len());
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.by_text.insert(boxed, sym);
        sym
    }

    /// Resolves a symbol back to its text. Panics if `sym` was not produced by this interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
