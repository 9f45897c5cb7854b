//! Run configuration (§6, §4.10).
//!
//! [`Config`] is deserialized from a TOML document with every field
//! defaulted, the same seed-file pattern an employer/issuer fuzzy-matcher
//! would use for its own TOML-driven tables. A [`Config`] is loaded once
//! per run and never mutated afterward.

use std::collections::HashMap;

use serde::Deserialize;

use crate::errors::{Error, Result};

/// Top-level run configuration. Every field has a documented default (§6)
/// and is optional in the source TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub similarity: SimilarityConfig,
    pub grouping: GroupingConfig,
    pub alias: AliasConfig,
    pub pipeline: PipelineConfig,
    /// Relationship value -> rank. Unknown relationships rank as `i32::MAX`.
    #[serde(default)]
    pub relationship_ranks: HashMap<String, i32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            similarity: SimilarityConfig::default(),
            grouping: GroupingConfig::default(),
            alias: AliasConfig::default(),
            pipeline: PipelineConfig::default(),
            relationship_ranks: HashMap::new(),
        }
    }
}

impl Config {
    /// Parse a [`Config`] from a TOML document, applying defaults for any
    /// field the document omits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedConfig`] if the document is not valid TOML,
    /// or if [`Config::validate`] rejects the result.
    pub fn from_toml(source: &str) -> Result<Self> {
        let cfg: Config =
            toml::from_str(source).map_err(|e| Error::MalformedConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject out-of-range values that would silently corrupt the run.
    /// Unknown keys are tolerated (serde ignores them by default); only
    /// semantically invalid numbers are rejected here.
    pub fn validate(&self) -> Result<()> {
        if self.similarity.high > 100 {
            return Err(Error::MalformedConfig(
                "similarity.high must be <= 100".into(),
            ));
        }
        if self.similarity.medium > self.similarity.high {
            return Err(Error::MalformedConfig(
                "similarity.medium must be <= similarity.high".into(),
            ));
        }
        if self.grouping.max_group_size == 0 {
            return Err(Error::MalformedConfig(
                "grouping.max_group_size must be > 0".into(),
            ));
        }
        if self.similarity.blocking.soft_ban.char_bigram_gate < 0.0
            || self.similarity.blocking.soft_ban.char_bigram_gate > 1.0
        {
            return Err(Error::MalformedConfig(
                "similarity.blocking.soft_ban.char_bigram_gate must be in [0,1]".into(),
            ));
        }
        Ok(())
    }

    /// Look up the rank of a relationship value; unknown values rank last.
    pub fn relationship_rank(&self, relationship: &str) -> i32 {
        self.relationship_ranks
            .get(relationship)
            .copied()
            .unwrap_or(i32::MAX)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub high: u8,
    pub medium: u8,
    pub penalty: PenaltyConfig,
    pub blocking: BlockingConfig,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        SimilarityConfig {
            high: 92,
            medium: 84,
            penalty: PenaltyConfig::default(),
            blocking: BlockingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    pub suffix_mismatch: u8,
    pub num_style_mismatch: u8,
    pub punctuation_mismatch: u8,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        PenaltyConfig {
            suffix_mismatch: 25,
            num_style_mismatch: 5,
            punctuation_mismatch: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlockingConfig {
    pub allowlist_tokens: Vec<String>,
    pub allowlist_bigrams: Vec<String>,
    pub denylist_tokens: Vec<String>,
    pub stop_tokens: Vec<String>,
    pub soft_ban: SoftBanConfig,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        BlockingConfig {
            allowlist_tokens: Vec::new(),
            allowlist_bigrams: Vec::new(),
            denylist_tokens: default_denylist_tokens(),
            stop_tokens: vec!["inc".into(), "llc".into(), "ltd".into()],
            soft_ban: SoftBanConfig::default(),
        }
    }
}

fn default_denylist_tokens() -> Vec<String> {
    ["the", "and", "of", "group", "company", "holdings"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SoftBanConfig {
    pub max_shard_size: usize,
    pub block_cap: usize,
    pub max_candidates_per_record: usize,
    pub length_window: usize,
    pub char_bigram_gate: f64,
    pub min_token_overlap: usize,
}

impl Default for SoftBanConfig {
    fn default() -> Self {
        SoftBanConfig {
            max_shard_size: 200,
            block_cap: 800,
            max_candidates_per_record: 50,
            length_window: 10,
            char_bigram_gate: 0.1,
            min_token_overlap: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub max_group_size: usize,
    pub edge_gating: EdgeGatingConfig,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            max_group_size: 50,
            edge_gating: EdgeGatingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeGatingConfig {
    pub allow_medium_plus_shared_token: bool,
}

impl Default for EdgeGatingConfig {
    fn default() -> Self {
        EdgeGatingConfig {
            allow_medium_plus_shared_token: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    pub max_alias_pairs: usize,
}

impl Default for AliasConfig {
    fn default() -> Self {
        AliasConfig {
            max_alias_pairs: 100_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_pairs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_pairs: 2_000_000,
        }
    }
}
