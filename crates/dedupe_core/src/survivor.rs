//! Survivorship: primary selection and merge preview (§4.6).

use crate::config::Config;
use crate::model::{FieldRecommendation, Group, MergePreview, NormalizedRecord};

/// Choose the primary record for a group by strict lexicographic
/// tie-breaking: lowest relationship rank, then earliest `created_date`
/// (missing dates sort last), then lowest canonical `account_id`.
///
/// # Panics
///
/// Panics if `members` is empty; the grouper never calls this with an
/// empty slice.
pub fn choose_primary(members: &[&NormalizedRecord], config: &Config) -> String {
    members
        .iter()
        .min_by(|a, b| tie_break_key(a, config).cmp(&tie_break_key(b, config)))
        .expect("a group always has at least one member")
        .record
        .account_id
        .clone()
}

/// `(relationship_rank, (is_missing_date, timestamp), account_id)` — a
/// missing `created_date` (⊥) is represented as `(true, 0)`, which always
/// sorts after any real date `(false, _)`.
fn tie_break_key(record: &NormalizedRecord, config: &Config) -> (i32, (bool, i64), String) {
    let rank = config.relationship_rank(&record.record.relationship);
    let date_key = match record.record.created_date {
        Some(dt) => (false, dt.timestamp()),
        None => (true, 0),
    };
    (rank, date_key, record.record.account_id.clone())
}

/// Build a group's merge preview: the chosen primary plus a per-member
/// recommendation for every non-primary record. Never applied automatically
/// (§4.6).
pub fn merge_preview(group: &Group, records_by_id: &std::collections::HashMap<&str, &NormalizedRecord>) -> MergePreview {
    let primary = records_by_id.get(group.primary_id.as_str());
    let recommendations = group
        .members
        .iter()
        .filter(|id| *id != &group.primary_id)
        .map(|id| {
            let recommendation = match (primary, records_by_id.get(id.as_str())) {
                (Some(p), Some(m)) if p.name_base == m.name_base => {
                    FieldRecommendation::RetainPrimaryValue
                }
                _ => FieldRecommendation::SurfaceNonPrimaryValueForReview,
            };
            (id.clone(), recommendation)
        })
        .collect();

    MergePreview {
        group_id: group.group_id.clone(),
        primary_id: group.primary_id.clone(),
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use crate::normalize::normalize;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, rel: &str, days_ago: Option<i64>) -> Record {
        Record {
            account_id: format!("{id:0>18}"),
            account_id_src: id.to_string(),
            account_name: "Acme Inc".to_string(),
            created_date: days_ago.map(|d| Utc.timestamp_opt(1_700_000_000 - d * 86_400, 0).unwrap()),
            relationship: rel.to_string(),
        }
    }

    #[test]
    fn test_lowest_relationship_rank_wins() {
        let mut config = Config::default();
        config.relationship_ranks.insert("Employee".to_string(), 1);
        config.relationship_ranks.insert("Customer".to_string(), 2);
        let a = normalize(&record("a", "Customer", Some(1)));
        let b = normalize(&record("b", "Employee", Some(1)));
        let primary = choose_primary(&[&a, &b], &config);
        assert_eq!(primary, b.record.account_id);
    }

    #[test]
    fn test_earliest_date_wins_when_rank_tied() {
        let config = Config::default();
        let a = normalize(&record("a", "Customer", Some(1)));
        let b = normalize(&record("b", "Customer", Some(5)));
        let primary = choose_primary(&[&a, &b], &config);
        assert_eq!(primary, b.record.account_id);
    }

    #[test]
    fn test_missing_date_never_preferred() {
        let config = Config::default();
        let a = normalize(&record("a", "Customer", None));
        let b = normalize(&record("b", "Customer", Some(100)));
        let primary = choose_primary(&[&a, &b], &config);
        assert_eq!(primary, b.record.account_id);
    }

    #[test]
    fn test_lowest_account_id_breaks_final_tie() {
        let config = Config::default();
        let a = normalize(&record("b", "Customer", Some(1)));
        let b = normalize(&record("a", "Customer", Some(1)));
        let primary = choose_primary(&[&a, &b], &config);
        assert_eq!(primary, b.record.account_id);
    }
}
