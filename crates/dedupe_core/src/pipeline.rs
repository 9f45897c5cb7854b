//! The top-level pipeline orchestrator (§5, §9).
//!
//! Exposes the whole engine as one pure function, `run`: no ambient mutable
//! state, no UI/session concept (§9 "monolithic helper modules"). Each
//! phase is a `tracing` span, batch analogs of a request/response trace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::group::RejectedEdge;
use crate::model::{
    AliasCrossLink, BlockTruncation, CandidatePair, Disposition, DispositionKind, Group, MergePreview,
    NormalizedRecord, Record, ScoredPair,
};
use crate::overrides::{ManualBlacklistProvider, ManualOverrideProvider};
use crate::{alias, block, diagnostics, disposition, group as grouping, normalize, score, survivor};

/// A cooperative cancellation handle, polled at phase boundaries and at
/// block granularity within the blocker/scorer (§5).
#[derive(Debug, Default, Clone)]
pub struct CancellationToken(std::sync::Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(std::sync::Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Every artifact a completed run produces.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub records: Vec<NormalizedRecord>,
    pub candidate_pairs: Vec<CandidatePair>,
    pub scored_pairs: Vec<ScoredPair>,
    pub groups: Vec<Group>,
    pub merge_previews: Vec<MergePreview>,
    pub alias_links: Vec<AliasCrossLink>,
    pub rejected_edges: Vec<RejectedEdge>,
    pub dispositions: Vec<Disposition>,
    pub block_truncations: Vec<BlockTruncation>,
    pub diagnostics: diagnostics::Diagnostics,
}

/// Run the full deduplication pipeline over already-ingested records.
///
/// # Errors
///
/// Returns any [`Error`] surfaced by blocking (`PairCapExceeded`) or
/// [`Error::Cancelled`] if `cancellation` is flipped before the run
/// completes. Nothing else in this function panics on malformed input —
/// malformed individual fields were already resolved to `None`/defaults at
/// ingestion (§4.9).
pub fn run(
    records: &[Record],
    config: &Config,
    override_provider: Option<&dyn ManualOverrideProvider>,
    blacklist_provider: Option<&dyn ManualBlacklistProvider>,
    cancellation: &CancellationToken,
) -> Result<RunArtifacts> {
    let normalized = {
        let _span = tracing::info_span!("normalize", count = records.len()).entered();
        check_cancelled(cancellation)?;
        let normalized: Vec<NormalizedRecord> = records.par_iter().map(normalize::normalize).collect();
        info!(count = normalized.len(), "normalized records");
        normalized
    };

    let (candidate_pairs, block_truncations) = {
        let _span = tracing::info_span!("block").entered();
        check_cancelled(cancellation)?;
        let (pairs, truncations) = block::block(&normalized, config, cancellation)?;
        if !truncations.is_empty() {
            warn!(count = truncations.len(), "blocks truncated by block_cap");
        }
        info!(count = pairs.len(), "generated candidate pairs");
        (pairs, truncations)
    };

    let scored_pairs = {
        let _span = tracing::info_span!("score").entered();
        check_cancelled(cancellation)?;
        let scored = score::score_pairs(&candidate_pairs, &normalized, config, cancellation)?;
        debug!(count = scored.len(), "scored candidate pairs");
        scored
    };

    let (groups, rejected_edges) = {
        let _span = tracing::info_span!("group").entered();
        check_cancelled(cancellation)?;
        let result = grouping::group(&scored_pairs, &normalized, config);
        if !result.1.is_empty() {
            warn!(count = result.1.len(), "edges rejected by canopy bound");
        }
        result
    };

    let merge_previews = {
        let _span = tracing::info_span!("survive").entered();
        check_cancelled(cancellation)?;
        let records_by_id: HashMap<&str, &NormalizedRecord> =
            normalized.iter().map(|r| (r.record.account_id.as_str(), r)).collect();
        groups
            .iter()
            .filter(|g| g.members.len() > 1)
            .map(|g| survivor::merge_preview(g, &records_by_id))
            .collect::<Vec<_>>()
    };

    let alias_links = {
        let _span = tracing::info_span!("alias").entered();
        check_cancelled(cancellation)?;
        let links = alias::link_aliases(&normalized, &groups, config);
        debug!(count = links.len(), "alias cross-links");
        links
    };

    let dispositions = {
        let _span = tracing::info_span!("dispose").entered();
        check_cancelled(cancellation)?;
        let manual_blacklist = load_blacklist(blacklist_provider);
        let manual_overrides = load_overrides(override_provider);
        disposition::dispose(
            &normalized,
            &groups,
            &alias_links,
            &rejected_edges,
            config,
            &manual_blacklist,
            &manual_overrides,
        )
    };

    let run_diagnostics = {
        let _span = tracing::info_span!("diagnose").entered();
        diagnostics::summarize(
            &normalized,
            &candidate_pairs,
            &scored_pairs,
            &groups,
            &rejected_edges,
            &alias_links,
            &dispositions,
            &block_truncations,
        )
    };

    Ok(RunArtifacts {
        records: normalized,
        candidate_pairs,
        scored_pairs,
        groups,
        merge_previews,
        alias_links,
        rejected_edges,
        dispositions,
        block_truncations,
        diagnostics: run_diagnostics,
    })
}

fn check_cancelled(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

fn load_overrides(provider: Option<&dyn ManualOverrideProvider>) -> HashMap<String, DispositionKind> {
    match provider {
        Some(p) => p.load_overrides(),
        None => HashMap::new(),
    }
}

fn load_blacklist(provider: Option<&dyn ManualBlacklistProvider>) -> Vec<String> {
    match provider {
        Some(p) => p.load_blacklist(),
        None => Vec::new(),
    }
}
