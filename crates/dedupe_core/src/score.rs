//! Fuzzy similarity scoring (§4.4).
//!
//! Token-sort/token-set ratios are built on top of
//! `strsim::normalized_levenshtein`, the edit-distance-normalized "ratio"
//! family conventional fuzzy-matching libraries use. Pair scoring is
//! independent per pair, so `score_pairs` fans out across `rayon`'s global
//! pool, in cancellation-sized chunks.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::model::{CandidatePair, NormalizedRecord, ScoredPair};
use crate::pipeline::CancellationToken;

/// A pre-penalty score below this is dropped without computing penalties
/// (§4.4 "gate cutoff").
const GATE_CUTOFF: f64 = 72.0;

/// Pairs per cancellation poll. Large enough that the `rayon` fan-out inside
/// a chunk dominates the cost, small enough that a cancelled run doesn't
/// have to wait out the rest of a very large batch.
const CANCELLATION_CHUNK: usize = 2_000;

/// Score every candidate pair against the normalized record set.
///
/// Pairs whose base (pre-penalty) score falls below the gate cutoff are
/// dropped, not merely penalized — they would never clear `medium` anyway.
/// `cancellation` is polled once per [`CANCELLATION_CHUNK`]-sized chunk.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `cancellation` fires mid-pass.
pub fn score_pairs(
    pairs: &[CandidatePair],
    records: &[NormalizedRecord],
    config: &Config,
    cancellation: &CancellationToken,
) -> Result<Vec<ScoredPair>> {
    let by_id: HashMap<&str, &NormalizedRecord> =
        records.iter().map(|r| (r.record.account_id.as_str(), r)).collect();

    let mut scored = Vec::with_capacity(pairs.len());
    for chunk in pairs.chunks(CANCELLATION_CHUNK) {
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        scored.par_extend(chunk.par_iter().filter_map(|pair| {
            let a = by_id.get(pair.id_a.as_str())?;
            let b = by_id.get(pair.id_b.as_str())?;
            score_pair(pair, a, b, config)
        }));
    }
    Ok(scored)
}

/// The components the scorer computes for any pair of normalized names,
/// independent of how the pair was generated (candidate pair or alias
/// cross-link).
pub struct ScoreComponents {
    pub ratio_name: f64,
    pub ratio_set: f64,
    pub jaccard: f64,
    pub suffix_match: bool,
    pub num_style_match: bool,
    pub punctuation_match: bool,
    pub score: u8,
}

/// Score two normalized names against each other, or `None` if the
/// pre-penalty base fails the gate cutoff (§4.4). This is the shared core
/// behind both [`score_pair`] and alias cross-link scoring (§4.7).
pub fn score_names(a: &NormalizedRecord, b: &NormalizedRecord, config: &Config) -> Option<ScoreComponents> {
    let tokens_a: Vec<&str> = a.name_core.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.name_core.split_whitespace().collect();

    let ratio_name = token_sort_ratio(&tokens_a, &tokens_b);
    let ratio_set = token_set_ratio(&tokens_a, &tokens_b);
    let jaccard = jaccard_similarity(&a.enhanced_tokens, &b.enhanced_tokens);

    let base = 0.45 * ratio_name + 0.35 * ratio_set + 20.0 * jaccard;
    if base < GATE_CUTOFF {
        return None;
    }

    let penalty = &config.similarity.penalty;
    let suffix_match = a.suffix_class == b.suffix_class;
    let num_style_match = a.numeric_style == b.numeric_style;
    let punctuation_match = punctuation_signature(&a.record.account_name)
        == punctuation_signature(&b.record.account_name);

    let mut penalties = 0.0;
    if !suffix_match {
        penalties += penalty.suffix_mismatch as f64;
    }
    if !num_style_match {
        penalties += penalty.num_style_mismatch as f64;
    }
    if !punctuation_match {
        penalties += penalty.punctuation_mismatch as f64;
    }

    let score = (base - penalties).round().clamp(0.0, 100.0) as u8;

    Some(ScoreComponents {
        ratio_name,
        ratio_set,
        jaccard,
        suffix_match,
        num_style_match,
        punctuation_match,
        score,
    })
}

/// Score a single candidate pair, or `None` if it fails the gate cutoff.
fn score_pair(
    pair: &CandidatePair,
    a: &NormalizedRecord,
    b: &NormalizedRecord,
    config: &Config,
) -> Option<ScoredPair> {
    let c = score_names(a, b, config)?;
    Some(ScoredPair {
        id_a: pair.id_a.clone(),
        id_b: pair.id_b.clone(),
        reason: pair.reason,
        ratio_name: c.ratio_name,
        ratio_set: c.ratio_set,
        jaccard: c.jaccard,
        suffix_match: c.suffix_match,
        num_style_match: c.num_style_match,
        punctuation_match: c.punctuation_match,
        score: c.score,
    })
}

/// `(has_comma, has_period, has_paren)` — compared between raw names for
/// the punctuation-mismatch penalty (§4.4).
fn punctuation_signature(raw: &str) -> (bool, bool, bool) {
    (raw.contains(','), raw.contains('.'), raw.contains('('))
}

/// String similarity on a 0-100 scale, via `strsim::normalized_levenshtein`
/// — edit-distance-normalized, the conventional fuzzy-matching "ratio".
fn simple_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Token-sort ratio: sort each side's tokens, join, compare as plain
/// strings.
fn token_sort_ratio(tokens_a: &[&str], tokens_b: &[&str]) -> f64 {
    let sorted_a = sorted_join(tokens_a);
    let sorted_b = sorted_join(tokens_b);
    simple_ratio(&sorted_a, &sorted_b)
}

fn sorted_join(tokens: &[&str]) -> String {
    let mut sorted: Vec<&str> = tokens.to_vec();
    sorted.sort_unstable();
    sorted.join(" ")
}

/// Token-set ratio: compare the shared-token core against each side's
/// full (shared + private) token string, and take the best of the three
/// pairings.
fn token_set_ratio(tokens_a: &[&str], tokens_b: &[&str]) -> f64 {
    use std::collections::BTreeSet;

    let set_a: BTreeSet<&str> = tokens_a.iter().copied().collect();
    let set_b: BTreeSet<&str> = tokens_b.iter().copied().collect();

    let intersection: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    let core = intersection.join(" ");
    let combined_a = join_with_core(&core, &only_a);
    let combined_b = join_with_core(&core, &only_b);

    let r1 = simple_ratio(&core, &combined_a);
    let r2 = simple_ratio(&core, &combined_b);
    let r3 = simple_ratio(&combined_a, &combined_b);

    r1.max(r2).max(r3)
}

fn join_with_core(core: &str, private: &[&str]) -> String {
    if private.is_empty() {
        return core.to_string();
    }
    let mut sorted = private.to_vec();
    sorted.sort_unstable();
    if core.is_empty() {
        sorted.join(" ")
    } else {
        format!("{core} {}", sorted.join(" "))
    }
}

fn jaccard_similarity(a: &std::collections::BTreeSet<String>, b: &std::collections::BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}
