//! Concrete end-to-end scenarios, mirroring the matching engine's own
//! documented examples.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dedupe_core::config::Config;
use dedupe_core::model::{DispositionKind, Record};
use dedupe_core::pipeline::{self, CancellationToken};

fn record(id: &str, name: &str, relationship: &str, created: Option<DateTime<Utc>>) -> Record {
    Record {
        account_id: format!("{id:0>18}"),
        account_id_src: id.to_string(),
        account_name: name.to_string(),
        created_date: created,
        relationship: relationship.to_string(),
    }
}

fn run(records: Vec<Record>, config: &Config) -> dedupe_core::RunArtifacts {
    pipeline::run(&records, config, None, None, &CancellationToken::new()).unwrap()
}

#[test]
fn scenario_shared_token_names_join_with_one_update() {
    let config = Config::default();
    let earlier = Utc::now() - chrono::Duration::days(10);
    let later = Utc::now() - chrono::Duration::days(1);
    let records = vec![
        record("a", "Acme Stores Inc", "Customer", Some(later)),
        record("b", "Acme Store Inc", "Customer", Some(earlier)),
    ];
    let artifacts = run(records, &config);

    let multi: Vec<_> = artifacts.groups.iter().filter(|g| g.members.len() > 1).collect();
    assert_eq!(multi.len(), 1);
    let group = multi[0];
    assert_eq!(group.primary_id, format!("{:0>18}", "b"));

    let by_id: HashMap<&str, &dedupe_core::model::Disposition> =
        artifacts.dispositions.iter().map(|d| (d.account_id.as_str(), d)).collect();
    assert_eq!(by_id[group.primary_id.as_str()].kind, DispositionKind::Keep);
    let other = group.members.iter().find(|m| *m != &group.primary_id).unwrap();
    assert_eq!(by_id[other.as_str()].kind, DispositionKind::Update);
}

#[test]
fn scenario_suffix_mismatch_never_joins_and_both_verify() {
    let config = Config::default();
    let records = vec![
        record("a", "Acme Inc", "Customer", Some(Utc::now())),
        record("b", "Acme LLC", "Customer", Some(Utc::now())),
    ];
    let artifacts = run(records, &config);

    assert!(artifacts.groups.iter().all(|g| g.members.len() == 1));
    assert!(artifacts
        .dispositions
        .iter()
        .all(|d| d.kind == DispositionKind::Verify || d.kind == DispositionKind::Keep));
}

#[test]
fn scenario_three_way_fuzzy_numeric_style_join() {
    // All three share the INC suffix class (§8 scenario 3); the 123/124
    // store-number tail and the dash/space "7-Eleven"/"7 Eleven" style are
    // what the fuzzy scorer and num_style penalty need to tolerate.
    let config = Config::default();
    let records = vec![
        record("a", "7-Eleven Store 123 Inc", "Customer", Some(Utc::now() - chrono::Duration::days(3))),
        record("b", "7-Eleven Store 124 Inc", "Customer", Some(Utc::now() - chrono::Duration::days(2))),
        record("c", "7 Eleven Store Inc", "Customer", Some(Utc::now() - chrono::Duration::days(1))),
    ];
    let artifacts = run(records, &config);
    let multi: Vec<_> = artifacts.groups.iter().filter(|g| g.members.len() > 1).collect();
    assert_eq!(multi.len(), 1);
    assert_eq!(multi[0].members.len(), 3);
}

#[test]
fn scenario_blacklisted_name_is_deleted() {
    let config = Config::default();
    let records = vec![record("a", "PNC is not sure", "Customer", Some(Utc::now()))];
    let artifacts = run(records, &config);
    assert_eq!(artifacts.dispositions[0].kind, DispositionKind::Delete);
    assert!(artifacts.dispositions[0].reason.contains("blacklist"));
}

#[test]
fn scenario_semicolon_alias_crosses_into_another_group_as_verify() {
    let config = Config::default();
    let records = vec![
        record("a", "Foo Corp; Bar Corp", "Customer", Some(Utc::now())),
        record("b", "Bar Corp", "Customer", Some(Utc::now())),
    ];
    let artifacts = run(records, &config);

    assert!(artifacts.alias_links.iter().any(|l| l.matched_alias == "Bar Corp"));
    let a_disposition = artifacts
        .dispositions
        .iter()
        .find(|d| d.account_id == format!("{:0>18}", "a"))
        .unwrap();
    assert_eq!(a_disposition.kind, DispositionKind::Verify);
    assert!(a_disposition.reason.starts_with("alias_matches_1_groups_via_"));
}

#[test]
fn scenario_15_char_id_canonicalizes_and_is_used_for_joins() {
    let short_id = "001A000000BcDeF";
    let full = dedupe_core::ids::canonicalize(short_id).unwrap();
    assert_eq!(full.len(), 18);

    let config = Config::default();
    let records = vec![Record {
        account_id: full.clone(),
        account_id_src: short_id.to_string(),
        account_name: "Acme Inc".to_string(),
        created_date: Some(Utc::now()),
        relationship: "Customer".to_string(),
    }];
    let artifacts = run(records, &config);
    assert_eq!(artifacts.groups[0].members[0], full);
}

#[test]
fn boundary_empty_input_yields_empty_output() {
    let config = Config::default();
    let artifacts = run(Vec::new(), &config);
    assert!(artifacts.groups.is_empty());
    assert!(artifacts.dispositions.is_empty());
}

#[test]
fn boundary_single_record_is_keep() {
    let config = Config::default();
    let artifacts = run(vec![record("a", "Acme Inc", "Customer", Some(Utc::now()))], &config);
    assert_eq!(artifacts.groups.len(), 1);
    assert_eq!(artifacts.dispositions[0].kind, DispositionKind::Keep);
}

#[test]
fn boundary_exact_name_core_joins_regardless_of_token_policy() {
    let mut config = Config::default();
    config.similarity.blocking.denylist_tokens = vec!["acme".to_string()];
    let records = vec![
        record("a", "Acme Inc", "Customer", Some(Utc::now())),
        record("b", "Acme Inc", "Customer", Some(Utc::now())),
    ];
    let artifacts = run(records, &config);
    assert_eq!(artifacts.groups.iter().filter(|g| g.members.len() > 1).count(), 1);
}
