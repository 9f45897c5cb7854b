//! Alias cross-link overlay (§4.7).
//!
//! Alias links are audit-only: they are recorded for review but never
//! change group membership (§3 invariant 7). Each alias string is run
//! through the same [`crate::normalize`] pipeline as a primary name before
//! scoring, then compared against every record in every *other* group.
//! Per-source scoring is independent, so it fans out across `rayon`'s
//! global pool the same way `score::score_pairs` does; the cap is applied
//! after a deterministic sort rather than by racing threads against an
//! early break.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::Config;
use crate::model::{AliasCrossLink, Group, NormalizedRecord, Record};
use crate::normalize;
use crate::score::score_names;

/// Build the alias cross-link overlay for a resolved set of groups.
///
/// Volume is bounded by `config.alias.max_alias_pairs`; candidates beyond
/// the cap are dropped in a fixed `(source_id, matched_alias,
/// target_group_id)` order so the same input always drops the same tail.
pub fn link_aliases(records: &[NormalizedRecord], groups: &[Group], config: &Config) -> Vec<AliasCrossLink> {
    let group_of: HashMap<&str, &str> = groups
        .iter()
        .flat_map(|g| g.members.iter().map(move |m| (m.as_str(), g.group_id.as_str())))
        .collect();

    let mut links: Vec<AliasCrossLink> = records
        .par_iter()
        .filter(|source| !source.alias_candidates.is_empty())
        .flat_map_iter(|source| {
            let group_of = &group_of;
            let Some(&source_group) = group_of.get(source.record.account_id.as_str()) else {
                return Vec::new().into_iter();
            };

            let mut found = Vec::new();
            for alias in &source.alias_candidates {
                let alias_normalized = normalize::normalize(&Record {
                    account_id: source.record.account_id.clone(),
                    account_id_src: source.record.account_id_src.clone(),
                    account_name: alias.text.clone(),
                    created_date: source.record.created_date,
                    relationship: source.record.relationship.clone(),
                });

                for target in records {
                    let Some(&target_group) = group_of.get(target.record.account_id.as_str()) else {
                        continue;
                    };
                    if target_group == source_group {
                        continue;
                    }
                    let Some(components) = score_names(&alias_normalized, target, config) else {
                        continue;
                    };
                    if components.suffix_match && components.score >= config.similarity.high {
                        found.push(AliasCrossLink {
                            source_id: source.record.account_id.clone(),
                            target_group_id: target_group.to_string(),
                            matched_alias: alias.text.clone(),
                            alias_source: alias.source,
                            score: components.score,
                        });
                    }
                }
            }
            found.into_iter()
        })
        .collect();

    links.sort_by(|a, b| {
        (a.source_id.as_str(), a.matched_alias.as_str(), a.target_group_id.as_str()).cmp(&(
            b.source_id.as_str(),
            b.matched_alias.as_str(),
            b.target_group_id.as_str(),
        ))
    });
    links.truncate(config.alias.max_alias_pairs);
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group as run_grouping;
    use crate::normalize::normalize;
    use chrono::Utc;

    fn record(id: &str, name: &str) -> Record {
        Record {
            account_id: format!("{id:0>18}"),
            account_id_src: id.to_string(),
            account_name: name.to_string(),
            created_date: Some(Utc::now()),
            relationship: "Customer".to_string(),
        }
    }

    #[test]
    fn test_alias_cross_link_emitted_for_matching_other_group() {
        let config = Config::default();
        let records = vec![
            normalize(&record("a", "Foo Corp; Bar Corp")),
            normalize(&record("b", "Bar Corp")),
        ];
        let (groups, _) = run_grouping(&[], &records, &config);
        let links = link_aliases(&records, &groups, &config);
        assert!(links.iter().any(|l| l.matched_alias == "Bar Corp"));
    }

    #[test]
    fn test_no_alias_candidates_produces_no_links() {
        let config = Config::default();
        let records = vec![
            normalize(&record("a", "Foo Corp")),
            normalize(&record("b", "Bar Corp")),
        ];
        let (groups, _) = run_grouping(&[], &records, &config);
        let links = link_aliases(&records, &groups, &config);
        assert!(links.is_empty());
    }

    #[test]
    fn test_alias_pairs_capped() {
        let mut config = Config::default();
        config.alias.max_alias_pairs = 0;
        let records = vec![
            normalize(&record("a", "Foo Corp; Bar Corp")),
            normalize(&record("b", "Bar Corp")),
        ];
        let (groups, _) = run_grouping(&[], &records, &config);
        let links = link_aliases(&records, &groups, &config);
        assert!(links.is_empty());
    }
}
