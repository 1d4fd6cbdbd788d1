//! The collaborator-facing surface: `Dictionary`, `Sentence`, and `ParseOptions`.
//!
//! None of these are pipeline stages themselves: they are the plain-data and trait boundary the
//! pipeline in `lib.rs` is built against, the analogue of a host application's options struct and
//! its per-run state container.

use crate::clause::ClausePools;
use crate::connector::{ConnectorPool, GwordRef};
use crate::disjunct::DisjunctId;
use crate::disjunct::DisjunctPool;
use crate::expr::Node;

/// An ordered list of `(expression, word_string)` pairs per sentence word, immutable during
/// parsing. The dictionary itself (lookup, loading, morphology) is out of this crate's scope;
/// this trait is only the read-only view the pipeline needs.
pub trait Dictionary {
    /// Number of words the dictionary has entries for.
    fn word_count(&self) -> usize;

    /// The `(expression, word_string, provenance)` triples for word `index`, in dictionary order.
    fn entries(&self, index: usize) -> &[(Node, String, GwordRef)];
}

/// Per-call knobs, constructed by the host application and passed by reference into the pipeline
/// entry points.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Disjunct cost cutoff: clauses/disjuncts costing more than this are dropped.
    pub disjunct_cost: f64,
    /// Per-word disjunct cap; 0 disables down-sampling.
    pub max_disjuncts: usize,
    /// Accepted for interface compatibility with callers that still set it; has no effect here,
    /// since this core provides no SAT-solver allocation path.
    pub use_sat_solver: bool,
    /// Generation mode selects the stricter duplicate-elimination equality that also distinguishes
    /// word strings.
    pub generation_mode: bool,
    /// Shallow-discriminating mode for the tracon set.
    pub shallow_discriminating: bool,
    /// Caller-supplied PRNG seed for down-sampling; 0 selects the system generator.
    pub rand_state: u64,
    pub verbosity: u8,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            disjunct_cost: f64::INFINITY,
            max_disjuncts: 0,
            use_sat_solver: false,
            generation_mode: false,
            shallow_discriminating: false,
            rand_state: 0,
            verbosity: 0,
        }
    }
}

/// Per-sentence state: length, per-word disjunct lists, and the pools the pipeline allocates from.
/// Connector/disjunct pools and the tracon set persist for the sentence's lifetime and are released
/// wholesale at teardown; clause/temp pools are reset at each word boundary by the caller.
pub struct Sentence {
    pub length: usize,
    pub disjuncts_by_word: Vec<Option<DisjunctId>>,
    pub connectors: ConnectorPool,
    pub disjuncts: DisjunctPool,
    pub clause_pools: ClausePools,
    pub tracons: crate::tracon::TraconSet,
}

impl Sentence {
    pub fn new(length: usize, shallow_discriminating: bool) -> Self {
        Sentence {
            length,
            disjuncts_by_word: vec![None; length],
            connectors: ConnectorPool::new(),
            disjuncts: DisjunctPool::new(),
            clause_pools: ClausePools::new(),
            tracons: crate::tracon::TraconSet::new(shallow_discriminating),
        }
    }
}
