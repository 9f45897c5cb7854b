//! Run diagnostics: block statistics and a performance summary (§4.9, §6).
//!
//! A [`Diagnostics`] value is purely descriptive — nothing downstream reads
//! it back into the pipeline. It exists so a caller can tune blocking
//! policy and spot canopy-bound thrash without re-running with verbose
//! logging.

use std::collections::HashMap;

use crate::group::RejectedEdge;
use crate::model::{
    AliasCrossLink, BlockTruncation, CandidatePair, Disposition, Group, NormalizedRecord, ScoredPair,
};

/// Aggregate counts produced at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub num_records: usize,
    pub num_candidate_pairs: usize,
    pub num_scored_pairs: usize,
    pub num_groups: usize,
    pub num_multi_record_groups: usize,
    pub num_canopy_rejections: usize,
    pub num_alias_links: usize,
    /// Candidate pairs by [`crate::model::BlockReason`], keyed by
    /// `as_str()`.
    pub block_reason_counts: HashMap<&'static str, usize>,
    /// Final dispositions by [`crate::model::DispositionKind`], keyed by
    /// `as_str()`.
    pub disposition_counts: HashMap<&'static str, usize>,
    /// Blocks whose `block_cap` truncated pair generation (§4.3
    /// auditability — never a silent drop).
    pub block_truncations: Vec<BlockTruncation>,
}

/// Build a [`Diagnostics`] summary from a completed run's intermediate
/// artifacts.
pub fn summarize(
    records: &[NormalizedRecord],
    pairs: &[CandidatePair],
    scored: &[ScoredPair],
    groups: &[Group],
    rejected_edges: &[RejectedEdge],
    alias_links: &[AliasCrossLink],
    dispositions: &[Disposition],
    block_truncations: &[BlockTruncation],
) -> Diagnostics {
    let mut block_reason_counts: HashMap<&'static str, usize> = HashMap::new();
    for pair in pairs {
        *block_reason_counts.entry(pair.reason.as_str()).or_insert(0) += 1;
    }

    let mut disposition_counts: HashMap<&'static str, usize> = HashMap::new();
    for d in dispositions {
        *disposition_counts.entry(d.kind.as_str()).or_insert(0) += 1;
    }

    Diagnostics {
        num_records: records.len(),
        num_candidate_pairs: pairs.len(),
        num_scored_pairs: scored.len(),
        num_groups: groups.len(),
        num_multi_record_groups: groups.iter().filter(|g| g.members.len() > 1).count(),
        num_canopy_rejections: rejected_edges.len(),
        num_alias_links: alias_links.len(),
        block_reason_counts,
        disposition_counts,
        block_truncations: block_truncations.to_vec(),
    }
}
