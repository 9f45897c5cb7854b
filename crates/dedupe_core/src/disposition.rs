//! Disposition classification (§4.8).
//!
//! Precedence is strict and first-match-wins: blacklist Delete, then Verify
//! signals, then Keep/Update, then manual overrides applied last. Blacklist
//! phrase matching uses `aho-corasick` for the multi-word terms; single-word
//! terms are matched as whole tokens to honor the word-boundary rule.

use std::collections::HashMap;

use aho_corasick::AhoCorasick;

use crate::config::Config;
use crate::group::RejectedEdge;
use crate::model::{AliasCrossLink, Disposition, DispositionKind, Group, NormalizedRecord};

const BUILTIN_BLACKLIST_SINGLE: &[&str] = &["1099", "test", "sample"];
const BUILTIN_BLACKLIST_PHRASE: &[&str] = &["pnc is not sure"];

/// Classify every record in a run.
///
/// `manual_blacklist` and `manual_overrides` come from the read-only
/// provider traits in [`crate::overrides`]; an absent provider is an empty
/// collection here, not a special case.
pub fn dispose(
    records: &[NormalizedRecord],
    groups: &[Group],
    alias_links: &[AliasCrossLink],
    rejected_edges: &[RejectedEdge],
    config: &Config,
    manual_blacklist: &[String],
    manual_overrides: &HashMap<String, DispositionKind>,
) -> Vec<Disposition> {
    let (single_terms, phrase_matcher) = build_blacklist(manual_blacklist);

    let group_of: HashMap<&str, &Group> = groups
        .iter()
        .flat_map(|g| g.members.iter().map(move |m| (m.as_str(), g)))
        .collect();

    let mut aliases_by_source: HashMap<&str, Vec<&AliasCrossLink>> = HashMap::new();
    for link in alias_links {
        aliases_by_source.entry(link.source_id.as_str()).or_default().push(link);
    }

    let canopy_rejected: std::collections::HashSet<&str> = rejected_edges
        .iter()
        .flat_map(|e| [e.id_a.as_str(), e.id_b.as_str()])
        .collect();

    records
        .iter()
        .map(|record| {
            let id = record.record.account_id.as_str();
            let group = group_of.get(id).copied();

            if let Some(term) = blacklist_match(&record.name_base, &single_terms, &phrase_matcher) {
                return Disposition {
                    account_id: id.to_string(),
                    kind: DispositionKind::Delete,
                    reason: format!("blacklist_term_match: {term}"),
                    overridden: false,
                };
            }

            if let Some(disposition) = verify_signal(record, group, &aliases_by_source, &canopy_rejected, config) {
                return apply_override(disposition, manual_overrides);
            }

            let is_primary = group.is_some_and(|g| g.primary_id == id);
            let disposition = if is_primary {
                Disposition {
                    account_id: id.to_string(),
                    kind: DispositionKind::Keep,
                    reason: "primary_or_singleton".to_string(),
                    overridden: false,
                }
            } else {
                Disposition {
                    account_id: id.to_string(),
                    kind: DispositionKind::Update,
                    reason: "non_primary_member_of_group".to_string(),
                    overridden: false,
                }
            };
            apply_override(disposition, manual_overrides)
        })
        .collect()
}

fn build_blacklist(manual: &[String]) -> (Vec<String>, AhoCorasick) {
    let mut single: Vec<String> = BUILTIN_BLACKLIST_SINGLE.iter().map(|s| s.to_lowercase()).collect();
    let mut phrases: Vec<String> = BUILTIN_BLACKLIST_PHRASE.iter().map(|s| s.to_lowercase()).collect();

    for term in manual {
        let lower = term.to_lowercase();
        if lower.split_whitespace().count() > 1 {
            phrases.push(lower);
        } else {
            single.push(lower);
        }
    }

    let matcher = AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(&phrases)
        .expect("blacklist phrase patterns are valid");
    (single, matcher)
}

fn blacklist_match<'a>(name_base: &str, single_terms: &'a [String], phrase_matcher: &AhoCorasick) -> Option<&'a str> {
    let tokens: Vec<&str> = name_base.split_whitespace().collect();
    for term in single_terms {
        if tokens.iter().any(|t| t == term) {
            return Some(term.as_str());
        }
    }
    if phrase_matcher.find(name_base).is_some() {
        return Some("blacklist_phrase");
    }
    None
}

fn verify_signal(
    record: &NormalizedRecord,
    group: Option<&Group>,
    aliases_by_source: &HashMap<&str, Vec<&AliasCrossLink>>,
    canopy_rejected: &std::collections::HashSet<&str>,
    config: &Config,
) -> Option<Disposition> {
    let id = record.record.account_id.as_str();

    // A suffix_class mismatch within a group cannot occur: every eligible
    // edge already requires suffix_match, so group membership transitively
    // implies a homogeneous suffix_class (§3 invariant 4).

    if record.has_multiple_names {
        return Some(Disposition {
            account_id: id.to_string(),
            kind: DispositionKind::Verify,
            reason: "has_multiple_names".to_string(),
            overridden: false,
        });
    }

    if let Some(links) = aliases_by_source.get(id) {
        if !links.is_empty() {
            let mut groups: Vec<&str> = links.iter().map(|l| l.target_group_id.as_str()).collect();
            groups.sort_unstable();
            groups.dedup();
            let mut sources: Vec<&'static str> = links.iter().map(|l| l.alias_source.as_str()).collect();
            sources.sort_unstable();
            sources.dedup();
            return Some(Disposition {
                account_id: id.to_string(),
                kind: DispositionKind::Verify,
                reason: format!(
                    "alias_matches_{}_groups_via_[{}]",
                    groups.len(),
                    sources.join(",")
                ),
                overridden: false,
            });
        }
    }

    if let Some(g) = group {
        if let Some(weakest) = g.weakest_edge_to_primary {
            if weakest < config.similarity.medium && g.members.iter().any(|m| canopy_rejected.contains(m.as_str())) {
                return Some(Disposition {
                    account_id: id.to_string(),
                    kind: DispositionKind::Verify,
                    reason: "weakest_edge_below_medium_due_to_canopy_bound".to_string(),
                    overridden: false,
                });
            }
        }
    }

    None
}

fn apply_override(disposition: Disposition, manual_overrides: &HashMap<String, DispositionKind>) -> Disposition {
    match manual_overrides.get(&disposition.account_id) {
        Some(&kind) if kind != disposition.kind => Disposition {
            account_id: disposition.account_id,
            kind,
            reason: format!("manual_override (was {})", disposition.kind.as_str()),
            overridden: true,
        },
        _ => disposition,
    }
}
