//! The duplicate eliminator: collapses disjuncts whose left and right connector chains are
//! structurally identical, keeping the cheapest survivor.
//!
//! Chains are canonicalized through the [`TraconSet`] first, which turns the expensive
//! structural comparison into a cheap pointer/id comparison: two disjuncts are duplicates exactly
//! when their canonicalized `(left, right)` pair (and, in generation mode, their word string) are
//! equal.

use fnv::FnvHashMap;

use crate::connector::{ConnectorId, ConnectorPool};
use crate::descriptor::DescriptorTable;
use crate::disjunct::{disjunct_ids, CategoryEntry, DisjunctId, DisjunctPool, WordForm};
use crate::intern::Symbol;
use crate::tracon::TraconSet;

#[derive(PartialEq, Eq, Hash)]
struct Key {
    left: Option<ConnectorId>,
    right: Option<ConnectorId>,
    /// Category- and spelling-encoded disjuncts never share a key, even with identical chains:
    /// `merge_into` only knows how to union two `Category` word forms or compare two `Spelling`
    /// ones, never mix the two.
    is_category: bool,
    /// `Some` only for spelling disjuncts in generation mode: generation additionally
    /// requires the word string to match. Category-encoded disjuncts always merge on chains alone
    /// so their category arrays get unioned; parsing-mode spelling disjuncts likewise ignore the
    /// word string since it is already implied by which word's expansion produced them.
    word: Option<Symbol>,
}

/// Collapses duplicates in the disjunct list starting at `head`, returning the new head.
///
/// `generation_mode` selects the stricter key used when building disjuncts for text generation
/// rather than parsing.
pub fn eliminate_duplicates(
    disjuncts: &mut DisjunctPool,
    connectors: &ConnectorPool,
    descriptors: &DescriptorTable,
    tracons: &mut TraconSet,
    head: Option<DisjunctId>,
    generation_mode: bool,
) -> Option<DisjunctId> {
    let ids = disjunct_ids(disjuncts, head);
    let mut order: Vec<DisjunctId> = Vec::new();
    let mut index: FnvHashMap<Key, usize> = FnvHashMap::default();

    for id in ids {
        let canon_left = tracons
            .canonicalize(connectors, descriptors, disjuncts.get(id).left)
            .map(|c| c.head());
        let canon_right = tracons
            .canonicalize(connectors, descriptors, disjuncts.get(id).right)
            .map(|c| c.head());

        let is_category = disjuncts.get(id).word.is_category();
        let word = match &disjuncts.get(id).word {
            WordForm::Category(_) => None,
            WordForm::Spelling(sym) if generation_mode => Some(*sym),
            WordForm::Spelling(_) => None,
        };
        let key = Key { left: canon_left, right: canon_right, is_category, word };

        match index.get(&key) {
            None => {
                index.insert(key, order.len());
                order.push(id);
            }
            Some(&slot) => {
                let kept = order[slot];
                merge_into(disjuncts, kept, id);
            }
        }
    }

    relink(disjuncts, &order)
}

/// Folds `loser` into `keeper`: for category-encoded disjuncts, unions the category arrays (keeping
/// the lower cost per category number); otherwise keeps whichever disjunct is cheaper, breaking ties
/// by the lower [`DisjunctId`] so the result is deterministic regardless of input order.
fn merge_into(disjuncts: &mut DisjunctPool, keeper: DisjunctId, loser: DisjunctId) {
    let loser_word = disjuncts.get(loser).word.clone();
    let loser_cost = disjuncts.get(loser).cost;

    let keeper_disjunct = disjuncts.get_mut(keeper);
    match (&mut keeper_disjunct.word, loser_word) {
        (WordForm::Category(keep_arr), WordForm::Category(lose_arr)) => {
            for entry in lose_arr {
                union_category_entry(keep_arr, entry);
            }
        }
        _ => {
            if loser_cost < keeper_disjunct.cost
                || (loser_cost == keeper_disjunct.cost && loser.index() < keeper.index())
            {
                keeper_disjunct.cost = loser_cost;
            }
        }
    }
}

fn union_category_entry(arr: &mut tinyvec::TinyVec<[CategoryEntry; 4]>, entry: CategoryEntry) {
    for existing in arr.iter_mut() {
        if existing.num == entry.num {
            if entry.cost < existing.cost {
                existing.cost = entry.cost;
            }
            return;
        }
    }
    arr.push(entry);
}

fn relink(disjuncts: &mut DisjunctPool, order: &[DisjunctId]) -> Option<DisjunctId> {
    for window in order.windows(2) {
        disjuncts.get_mut(window[0]).next = Some(window[1]);
    }
    if let Some(&last) = order.last() {
        disjuncts.get_mut(last).next = None;
    }
    order.first().copied()
}

/// A disjunct's cost, ignoring category arrays (used only by tests below to keep assertions
/// readable).
#[cfg(test)]
fn cost_of(disjuncts: &DisjunctPool, id: DisjunctId) -> f64 {
    disjuncts.get(id).cost
}
