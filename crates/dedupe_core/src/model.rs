//! Core data model (§3).
//!
//! Records are created at ingestion and immutable thereafter. Every later
//! stage only ever *adds* a new wrapper type around a `Record`'s canonical
//! id; nothing mutates a `Record` in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One input row, after ID canonicalization and typed parsing (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// 18-character canonical identifier. All joins use this field.
    pub account_id: String,
    /// The identifier exactly as it appeared in the source (15 or 18 chars).
    pub account_id_src: String,
    /// Raw, unmodified account name.
    pub account_name: String,
    /// Parsed creation instant. `None` (⊥) if the source value could not be
    /// parsed (§7); survivorship treats `None` as "latest".
    pub created_date: Option<DateTime<Utc>>,
    /// Raw relationship value; ranked via `Config::relationship_rank`.
    pub relationship: String,
}

/// Where an extracted alias candidate came from (§4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AliasSource {
    Semicolon,
    Numbered,
    Parenthesis,
}

impl AliasSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AliasSource::Semicolon => "semicolon",
            AliasSource::Numbered => "numbered",
            AliasSource::Parenthesis => "parenthesis",
        }
    }
}

/// One alias string extracted from a raw account name, tagged with the rule
/// that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasCandidate {
    pub text: String,
    pub source: AliasSource,
}

/// Normalized legal-entity suffix class (§4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuffixClass {
    Inc,
    Llc,
    Ltd,
    Corp,
    Co,
    None,
}

impl SuffixClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuffixClass::Inc => "INC",
            SuffixClass::Llc => "LLC",
            SuffixClass::Ltd => "LTD",
            SuffixClass::Corp => "CORP",
            SuffixClass::Co => "CO",
            SuffixClass::None => "NONE",
        }
    }
}

/// A [`Record`] plus every field the normalizer derives from it (§3, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub record: Record,
    /// Symbol-mapped, lowercased, whitespace-collapsed name.
    pub name_base: String,
    /// `name_base` with any trailing legal suffix removed.
    pub name_core: String,
    pub suffix_class: SuffixClass,
    /// Tokens of `name_core` after plural-folding and weak-token removal,
    /// used for Jaccard similarity.
    pub enhanced_tokens: BTreeSet<String>,
    pub alias_candidates: Vec<AliasCandidate>,
    pub has_semicolon: bool,
    pub has_parentheses: bool,
    pub has_multiple_names: bool,
    /// Separator character found between the first pair of digit runs in
    /// the raw (pre-mapping) name, e.g. `Some('-')` for "7-11". `None` if no
    /// such pattern is present. Used by the scorer's `num_style_match`.
    pub numeric_style: Option<char>,
}

/// An unordered candidate pair before scoring (§3, §4.3).
///
/// `id_a < id_b` always holds; this is enforced at construction so the pair
/// can be used directly as a deterministic sort/dedup key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidatePair {
    pub id_a: String,
    pub id_b: String,
    pub reason: BlockReason,
}

impl CandidatePair {
    /// Build a pair, normalizing `(a, b)` into ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`: a record is never its own candidate pair.
    pub fn new(a: &str, b: &str, reason: BlockReason) -> Self {
        assert_ne!(a, b, "a record cannot be a candidate pair with itself");
        if a < b {
            CandidatePair {
                id_a: a.to_string(),
                id_b: b.to_string(),
                reason,
            }
        } else {
            CandidatePair {
                id_a: b.to_string(),
                id_b: a.to_string(),
                reason,
            }
        }
    }
}

/// Why the blocker emitted a given candidate pair (§4.3, audit trail for
/// §4.5 join reasons).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    ExactNameCore,
    Allowlist,
    AllowlistBigram,
    DenylistShard,
    OtherBlock,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::ExactNameCore => "exact_name_core",
            BlockReason::Allowlist => "allowlist",
            BlockReason::AllowlistBigram => "allowlist_bigram",
            BlockReason::DenylistShard => "denylist_shard",
            BlockReason::OtherBlock => "other_block",
        }
    }
}

/// Record of a block whose per-block pair cap (`soft_ban.block_cap`) was hit
/// before every candidate within it could be considered, so truncation is
/// auditable rather than a silent drop (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockTruncation {
    /// The block's first-token (or shard) key.
    pub block_key: String,
    /// Members in the block that was truncated.
    pub member_count: usize,
    /// Pairs actually emitted before the cap stopped further emission.
    pub pairs_emitted: usize,
    /// The `block_cap` that was hit.
    pub block_cap: usize,
}

/// A [`CandidatePair`] plus its computed similarity (§3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPair {
    pub id_a: String,
    pub id_b: String,
    pub reason: BlockReason,
    pub ratio_name: f64,
    pub ratio_set: f64,
    pub jaccard: f64,
    pub suffix_match: bool,
    pub num_style_match: bool,
    pub punctuation_match: bool,
    /// Integer score in `[0, 100]`.
    pub score: u8,
}

/// A resolved duplicate-record group (§3, §4.5, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub group_id: String,
    /// Ascending `account_id` order (§5 ordering guarantee).
    pub members: Vec<String>,
    pub primary_id: String,
    /// Minimum score along any path from a non-primary member to the
    /// primary; `None` for singleton groups.
    pub weakest_edge_to_primary: Option<u8>,
    pub join_reasons: Vec<BlockReason>,
}

/// An audit-only relation from an extracted alias to another group (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AliasCrossLink {
    pub source_id: String,
    pub target_group_id: String,
    pub matched_alias: String,
    pub alias_source: AliasSource,
    pub score: u8,
}

/// The terminal per-record decision (§3, §4.8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DispositionKind {
    Keep,
    Update,
    Delete,
    Verify,
}

impl DispositionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionKind::Keep => "Keep",
            DispositionKind::Update => "Update",
            DispositionKind::Delete => "Delete",
            DispositionKind::Verify => "Verify",
        }
    }
}

/// A record's disposition plus a stable, human-readable explanation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disposition {
    pub account_id: String,
    pub kind: DispositionKind,
    pub reason: String,
    /// `true` once a manual override has replaced the computed value (§4.8
    /// rule 5).
    pub overridden: bool,
}

/// Per-field recommendation for a non-primary record during survivorship
/// (§4.6). Never applied automatically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldRecommendation {
    RetainPrimaryValue,
    SurfaceNonPrimaryValueForReview,
}

/// A group's merge preview: the primary plus a recommendation per non-primary
/// member (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergePreview {
    pub group_id: String,
    pub primary_id: String,
    pub recommendations: Vec<(String, FieldRecommendation)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_pair_orders_ids() {
        let p = CandidatePair::new("b", "a", BlockReason::OtherBlock);
        assert_eq!(p.id_a, "a");
        assert_eq!(p.id_b, "b");
    }

    #[test]
    #[should_panic]
    fn test_candidate_pair_rejects_self_pair() {
        CandidatePair::new("a", "a", BlockReason::OtherBlock);
    }

    #[test]
    fn test_suffix_class_as_str() {
        assert_eq!(SuffixClass::Inc.as_str(), "INC");
        assert_eq!(SuffixClass::None.as_str(), "NONE");
    }

    #[test]
    fn test_disposition_kind_as_str() {
        assert_eq!(DispositionKind::Keep.as_str(), "Keep");
        assert_eq!(DispositionKind::Verify.as_str(), "Verify");
    }
}
