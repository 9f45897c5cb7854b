//! Candidate-pair generation via soft-ban blocking (§4.3).
//!
//! Mirrors a `ComponentIndex` shape — bucket records by a cheap key, then
//! gate within each bucket — adapted to a first-token / stop-token /
//! allow-deny-list policy. Bucket maps use `rustc_hash::FxHashMap` since
//! this is a pure in-memory hot path with no DoS-relevant input.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::model::{BlockReason, BlockTruncation, CandidatePair, NormalizedRecord};
use crate::pipeline::CancellationToken;

/// Generate the deduplicated set of candidate pairs for a batch of
/// normalized records (§4.3), along with a record of any block whose
/// `block_cap` truncated it before every member pair was considered.
///
/// `cancellation` is polled once per first-token block (§5) — the natural
/// unit of work in this module — so a cancelled run does not have to wait
/// out the rest of a large batch.
///
/// # Errors
///
/// Returns [`Error::PairCapExceeded`] if the number of generated pairs
/// exceeds `config.pipeline.max_pairs`, or [`Error::Cancelled`] if
/// `cancellation` fires mid-pass.
pub fn block(
    records: &[NormalizedRecord],
    config: &Config,
    cancellation: &CancellationToken,
) -> Result<(Vec<CandidatePair>, Vec<BlockTruncation>)> {
    // Stable order everywhere downstream depends on it for deterministic
    // truncation (§4.3 invariants, §5 ordering guarantees).
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| records[a].record.account_id.cmp(&records[b].record.account_id));

    let mut pairs: BTreeMap<(String, String), BlockReason> = BTreeMap::new();
    let mut truncations: Vec<BlockTruncation> = Vec::new();

    exact_name_core_pass(records, &order, &mut pairs);
    allowlist_bigram_prepass(records, &order, config, &mut pairs);
    first_token_blocks(records, &order, config, &mut pairs, &mut truncations, cancellation)?;

    if pairs.len() > config.pipeline.max_pairs {
        return Err(Error::PairCapExceeded {
            generated: pairs.len(),
            limit: config.pipeline.max_pairs,
        });
    }

    let candidate_pairs = pairs
        .into_iter()
        .map(|((id_a, id_b), reason)| CandidatePair { id_a, id_b, reason })
        .collect();
    Ok((candidate_pairs, truncations))
}

fn insert_pair(
    pairs: &mut BTreeMap<(String, String), BlockReason>,
    id_a: &str,
    id_b: &str,
    reason: BlockReason,
) {
    if id_a == id_b {
        return;
    }
    let pair = CandidatePair::new(id_a, id_b, reason);
    pairs.entry((pair.id_a, pair.id_b)).or_insert(reason);
}

/// Pair every record sharing an exact `name_core`, independent of the
/// blocking policy below.
fn exact_name_core_pass(
    records: &[NormalizedRecord],
    order: &[usize],
    pairs: &mut BTreeMap<(String, String), BlockReason>,
) {
    let mut groups: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for &idx in order {
        groups.entry(records[idx].name_core.as_str()).or_default().push(idx);
    }
    for members in groups.values() {
        if members.len() < 2 {
            continue;
        }
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                insert_pair(
                    pairs,
                    &records[members[i]].record.account_id,
                    &records[members[j]].record.account_id,
                    BlockReason::ExactNameCore,
                );
            }
        }
    }
}

/// Pair every record whose `name_core` starts with a configured allowlisted
/// bigram, regardless of the block size that bigram would otherwise fall
/// into.
fn allowlist_bigram_prepass(
    records: &[NormalizedRecord],
    order: &[usize],
    config: &Config,
    pairs: &mut BTreeMap<(String, String), BlockReason>,
) {
    if config.similarity.blocking.allowlist_bigrams.is_empty() {
        return;
    }
    let mut groups: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for &idx in order {
        let Some(bigram) = leading_bigram(&records[idx].name_core) else {
            continue;
        };
        for allowed in &config.similarity.blocking.allowlist_bigrams {
            if bigram == allowed.as_str() {
                groups.entry(allowed.as_str()).or_default().push(idx);
            }
        }
    }
    for members in groups.values() {
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                insert_pair(
                    pairs,
                    &records[members[i]].record.account_id,
                    &records[members[j]].record.account_id,
                    BlockReason::AllowlistBigram,
                );
            }
        }
    }
}

fn leading_bigram(name_core: &str) -> Option<String> {
    let mut tokens = name_core.split_whitespace();
    let first = tokens.next()?;
    let second = tokens.next()?;
    Some(format!("{first} {second}"))
}

/// The main first-token blocking pass (allowlist / denylist / other).
fn first_token_blocks(
    records: &[NormalizedRecord],
    order: &[usize],
    config: &Config,
    pairs: &mut BTreeMap<(String, String), BlockReason>,
    truncations: &mut Vec<BlockTruncation>,
    cancellation: &CancellationToken,
) -> Result<()> {
    let blocking = &config.similarity.blocking;
    // `IndexMap` so block iteration order follows first appearance in the
    // already account_id-sorted `order`, keeping any diagnostic dump of
    // per-block activity reproducible without an extra sort.
    let mut blocks: IndexMap<String, Vec<usize>> = IndexMap::new();
    for &idx in order {
        let key = block_key(&records[idx].name_core, &blocking.stop_tokens);
        blocks.entry(key).or_default().push(idx);
    }

    for (key, members) in &blocks {
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if members.len() < 2 {
            continue;
        }
        if blocking.allowlist_tokens.iter().any(|t| t == key) {
            emit_all_pairs(records, members, BlockReason::Allowlist, pairs);
        } else if blocking.denylist_tokens.iter().any(|t| t == key) {
            shard_and_gate(records, key, members, config, true, pairs, truncations);
        } else if members.len() <= blocking.soft_ban.block_cap {
            emit_all_pairs(records, members, BlockReason::OtherBlock, pairs);
        } else {
            shard_and_gate(records, key, members, config, false, pairs, truncations);
        }
    }
    Ok(())
}

/// The first non-stop-token of `name_core`; if every token is a stop token,
/// the first token is used anyway (§4.3).
fn block_key(name_core: &str, stop_tokens: &[String]) -> String {
    let tokens: Vec<&str> = name_core.split_whitespace().collect();
    if tokens.is_empty() {
        return String::new();
    }
    for tok in &tokens {
        if !stop_tokens.iter().any(|s| s == tok) {
            return tok.to_string();
        }
    }
    tokens[0].to_string()
}

fn emit_all_pairs(
    records: &[NormalizedRecord],
    members: &[usize],
    reason: BlockReason,
    pairs: &mut BTreeMap<(String, String), BlockReason>,
) {
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            insert_pair(
                pairs,
                &records[members[i]].record.account_id,
                &records[members[j]].record.account_id,
                reason,
            );
        }
    }
}

/// Shard an oversized or denylisted block, then apply prefilter gates
/// within each shard before emitting pairs, honoring per-record and
/// per-block caps (§4.3). `block_cap` is enforced across the *whole*
/// block, not per shard — shards only reduce the comparison surface within
/// a block, they do not each get their own budget. If the cap stops
/// emission before every shard has been considered, a [`BlockTruncation`]
/// record is pushed so the drop is auditable rather than silent.
fn shard_and_gate(
    records: &[NormalizedRecord],
    block_key: &str,
    members: &[usize],
    config: &Config,
    apply_gates: bool,
    pairs: &mut BTreeMap<(String, String), BlockReason>,
    truncations: &mut Vec<BlockTruncation>,
) {
    let soft_ban = &config.similarity.blocking.soft_ban;
    let mut shards: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for &idx in members {
        let tokens: Vec<&str> = records[idx].name_core.split_whitespace().collect();
        let shard_key = tokens
            .get(1)
            .map(|t| t.to_string())
            .or_else(|| tokens.first().map(|t| t.chars().take(3).collect()))
            .or_else(|| tokens.get(2).map(|t| t.chars().take(1).collect::<String>()))
            .unwrap_or_default();
        shards.entry(shard_key).or_default().push(idx);
    }

    let mut per_record_count: FxHashMap<usize, usize> = FxHashMap::default();
    let mut block_count = 0usize;
    let mut cap_hit = false;

    'outer: for shard_members in shards.values() {
        for i in 0..shard_members.len() {
            for j in (i + 1)..shard_members.len() {
                if block_count >= soft_ban.block_cap {
                    cap_hit = true;
                    break 'outer;
                }
                let (a, b) = (shard_members[i], shard_members[j]);
                if *per_record_count.get(&a).unwrap_or(&0) >= soft_ban.max_candidates_per_record
                    || *per_record_count.get(&b).unwrap_or(&0) >= soft_ban.max_candidates_per_record
                {
                    continue;
                }
                if apply_gates && !passes_prefilter(records, a, b, config) {
                    continue;
                }
                insert_pair(
                    pairs,
                    &records[a].record.account_id,
                    &records[b].record.account_id,
                    BlockReason::DenylistShard,
                );
                *per_record_count.entry(a).or_insert(0) += 1;
                *per_record_count.entry(b).or_insert(0) += 1;
                block_count += 1;
            }
        }
    }

    if cap_hit {
        truncations.push(BlockTruncation {
            block_key: block_key.to_string(),
            member_count: members.len(),
            pairs_emitted: block_count,
            block_cap: soft_ban.block_cap,
        });
    }
}

fn passes_prefilter(records: &[NormalizedRecord], a: usize, b: usize, config: &Config) -> bool {
    let soft_ban = &config.similarity.blocking.soft_ban;
    let na = &records[a].name_core;
    let nb = &records[b].name_core;

    let len_diff = (na.len() as i64 - nb.len() as i64).unsigned_abs() as usize;
    if len_diff > soft_ban.length_window {
        return false;
    }

    let overlap = records[a]
        .enhanced_tokens
        .intersection(&records[b].enhanced_tokens)
        .filter(|t| !config.similarity.blocking.stop_tokens.iter().any(|s| s == *t))
        .count();
    if overlap < soft_ban.min_token_overlap {
        return false;
    }

    char_bigram_jaccard(na, nb) >= soft_ban.char_bigram_gate
}

fn char_bigrams(s: &str) -> std::collections::HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

fn char_bigram_jaccard(a: &str, b: &str) -> f64 {
    let ba = char_bigrams(a);
    let bb = char_bigrams(b);
    if ba.is_empty() && bb.is_empty() {
        return 1.0;
    }
    let inter = ba.intersection(&bb).count();
    let union = ba.union(&bb).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}
