//! Core expansion pipeline for a Link Grammar-style parser: turns per-word dictionary expressions
//! into the flat, pruned disjunct lists a downstream link-matching engine consumes.
//!
//! The pipeline, per word of a sentence:
//! 1. [`clause`] expands each dictionary expression into a list of AND-clauses.
//! 2. [`disjunct`] materializes each surviving clause into a pool-allocated [`disjunct::Disjunct`].
//! 3. [`dedup`] collapses disjuncts whose connector chains are structurally identical.
//! 4. [`prepare`] computes connector reach, prunes disjuncts that cannot link within the sentence,
//!    and marks chain heads shallow.
//!
//! [`tracon`] underlies both the disjunct builder's suffix sharing and duplicate elimination;
//! [`pool`], [`intern`], and [`descriptor`] are the supporting allocation and interning layers.
//! Dictionary loading, tokenization, morphology, and the link-matching search itself are out of
//! scope; see [`sentence::Dictionary`] for the narrow read-only view this crate needs of them.

pub mod clause;
pub mod connector;
pub mod dedup;
pub mod descriptor;
pub mod disjunct;
pub mod error;
pub mod expr;
pub mod intern;
pub mod pool;
pub mod prepare;
pub mod rng;
pub mod sentence;
pub mod tracon;

use connector::GwordRef;
use descriptor::DescriptorTable;
use disjunct::{disjunct_ids, DisjunctId};
use error::{CoreError, CoreResult};
use intern::StringInterner;
use sentence::{Dictionary, ParseOptions, Sentence};

/// Parses one word of a sentence: expands every dictionary entry for `word`, builds and
/// deduplicates their disjuncts, and prepares the result against the sentence length.
///
/// A [`CoreError::MalformedExpression`] from any one dictionary entry is recorded (logged)
/// and the remaining entries for this word are skipped. It does not fail the sentence.
/// [`CoreError::CorruptDictionary`] and [`CoreError::OutOfMemory`] are sentence-fatal and
/// propagate.
pub fn parse_word(
    dictionary: &dyn Dictionary,
    sentence: &mut Sentence,
    word: usize,
    options: &ParseOptions,
    descriptors: &mut DescriptorTable,
    strings: &mut StringInterner,
) -> CoreResult<Option<CoreError>> {
    sentence.clause_pools.reset();
    let mut head: Option<DisjunctId> = None;
    let mut word_error = None;

    for (node, word_string, provenance) in dictionary.entries(word) {
        let mut counter = 0;
        let clauses = match clause::expand(
            node,
            word,
            options.disjunct_cost,
            &mut counter,
            &mut sentence.clause_pools,
        ) {
            Ok(clauses) => clauses,
            Err(err @ CoreError::MalformedExpression { .. }) => {
                log::warn!("word {word}: {err}");
                word_error = Some(err);
                break;
            }
            Err(err) => return Err(err),
        };
        log::trace!("word {word}: expanded {} clause(s)", clauses.len());

        let new_head = build_entry(
            &clauses,
            &sentence.clause_pools.temp,
            word_string,
            *provenance,
            options,
            &mut sentence.connectors,
            &mut sentence.disjuncts,
            strings,
        )?;
        head = splice(&mut sentence.disjuncts, new_head, head);
    }

    let deduped = dedup::eliminate_duplicates(
        &mut sentence.disjuncts,
        &sentence.connectors,
        descriptors,
        &mut sentence.tracons,
        head,
        options.generation_mode,
    );
    log::debug!(
        "word {word}: {} disjunct(s) after dedup",
        disjunct_ids(&sentence.disjuncts, deduped).len()
    );

    let prepared = prepare::prepare_word(
        &mut sentence.connectors,
        &mut sentence.disjuncts,
        deduped,
        word,
        sentence.length,
    )?;
    log::debug!(
        "word {word}: {} disjunct(s) after preparation",
        disjunct_ids(&sentence.disjuncts, prepared).len()
    );

    sentence.disjuncts_by_word[word] = prepared;
    Ok(word_error)
}

#[allow(clippy::too_many_arguments)]
fn build_entry(
    clauses: &[clause::Clause],
    temp: &pool::IndexedPool<clause::TempLink>,
    word_string: &str,
    provenance: GwordRef,
    options: &ParseOptions,
    connectors: &mut connector::ConnectorPool,
    disjuncts: &mut disjunct::DisjunctPool,
    strings: &mut StringInterner,
) -> CoreResult<Option<DisjunctId>> {
    disjunct::build_disjuncts(
        clauses,
        temp,
        word_string,
        options.disjunct_cost,
        provenance,
        options.max_disjuncts,
        options.rand_state,
        connectors,
        disjuncts,
        strings,
    )
}

/// Links `new_head`'s list onto the front of `existing`, returning the combined head.
fn splice(
    disjuncts: &mut disjunct::DisjunctPool,
    new_head: Option<DisjunctId>,
    existing: Option<DisjunctId>,
) -> Option<DisjunctId> {
    match new_head {
        None => existing,
        Some(head) => {
            let ids = disjunct_ids(disjuncts, Some(head));
            if let Some(&tail) = ids.last() {
                disjuncts.get_mut(tail).next = existing;
            }
            Some(head)
        }
    }
}

/// Parses every word of a sentence in order. Returns the per-word [`CoreError`] recorded for any
/// word whose dictionary entries included a malformed expression, keyed by word index.
pub fn parse_sentence(
    dictionary: &dyn Dictionary,
    sentence: &mut Sentence,
    options: &ParseOptions,
    descriptors: &mut DescriptorTable,
    strings: &mut StringInterner,
) -> CoreResult<Vec<(usize, CoreError)>> {
    let mut word_errors = Vec::new();
    for word in 0..sentence.length {
        if let Some(err) = parse_word(dictionary, sentence, word, options, descriptors, strings)? {
            word_errors.push((word, err));
        }
    }
    Ok(word_errors)
}
