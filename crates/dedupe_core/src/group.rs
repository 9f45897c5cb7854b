//! Edge-gated union-find grouping (§4.5).
//!
//! Deliberately single-threaded (§5, §9): edges are processed in a
//! canonical deterministic order, so a concurrent union-find would add risk
//! without measurable benefit at the target scale.

use std::collections::{BinaryHeap, HashMap};

use rustc_hash::FxHashSet;

use crate::config::Config;
use crate::model::{BlockReason, Group, NormalizedRecord, ScoredPair};
use crate::survivor;

/// An eligible edge that was rejected because joining it would push its
/// component over `max_group_size` (§4.5 "canopy bound").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEdge {
    pub id_a: String,
    pub id_b: String,
    pub score: u8,
    pub reason: &'static str,
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
            size: vec![1; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.rank[ra] >= self.rank[rb] { (ra, rb) } else { (rb, ra) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        if self.rank[ra] == self.rank[rb] {
            self.rank[big] += 1;
        }
    }
}

/// Is this scored edge eligible to join two records (§4.5)?
fn is_eligible(pair: &ScoredPair, a: &NormalizedRecord, b: &NormalizedRecord, config: &Config) -> bool {
    if !pair.suffix_match {
        return false;
    }
    let sim = &config.similarity;
    if pair.score >= sim.high {
        return true;
    }
    if pair.score >= sim.medium && config.grouping.edge_gating.allow_medium_plus_shared_token {
        let shared = a
            .enhanced_tokens
            .intersection(&b.enhanced_tokens)
            .filter(|t| !sim.blocking.stop_tokens.iter().any(|s| s == *t))
            .count();
        return shared >= 1;
    }
    false
}

fn edge_join_reason(pair: &ScoredPair, config: &Config) -> BlockReason {
    if pair.reason == BlockReason::ExactNameCore {
        return BlockReason::ExactNameCore;
    }
    if pair.score >= config.similarity.high {
        BlockReason::OtherBlock
    } else {
        pair.reason
    }
}

/// Group scored pairs into resolved duplicate groups.
///
/// Returns the resolved groups (including singletons for every record that
/// appears in no eligible edge) and any edges rejected by the canopy bound.
pub fn group(
    scored: &[ScoredPair],
    records: &[NormalizedRecord],
    config: &Config,
) -> (Vec<Group>, Vec<RejectedEdge>) {
    let idx_of: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.record.account_id.as_str(), i))
        .collect();

    let mut eligible: Vec<&ScoredPair> = scored
        .iter()
        .filter(|p| {
            let (Some(&a), Some(&b)) = (idx_of.get(p.id_a.as_str()), idx_of.get(p.id_b.as_str()))
            else {
                return false;
            };
            is_eligible(p, &records[a], &records[b], config)
        })
        .collect();
    // Score descending, then (id_a, id_b) ascending (§5 ordering guarantee).
    eligible.sort_by(|x, y| {
        y.score.cmp(&x.score).then_with(|| (x.id_a.as_str(), x.id_b.as_str()).cmp(&(y.id_a.as_str(), y.id_b.as_str())))
    });

    let mut uf = UnionFind::new(records.len());
    let mut accepted: Vec<(usize, usize, u8, BlockReason)> = Vec::new();
    let mut rejected = Vec::new();

    for pair in &eligible {
        let a = idx_of[pair.id_a.as_str()];
        let b = idx_of[pair.id_b.as_str()];
        let (ra, rb) = (uf.find(a), uf.find(b));
        if ra == rb {
            accepted.push((a, b, pair.score, edge_join_reason(pair, config)));
            continue;
        }
        let prospective_size = uf.size[ra] + uf.size[rb];
        if prospective_size > config.grouping.max_group_size {
            rejected.push(RejectedEdge {
                id_a: pair.id_a.clone(),
                id_b: pair.id_b.clone(),
                score: pair.score,
                reason: "canopy_bound_exceeded",
            });
            continue;
        }
        uf.union(a, b);
        accepted.push((a, b, pair.score, edge_join_reason(pair, config)));
    }

    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..records.len() {
        let root = uf.find(i);
        components.entry(root).or_default().push(i);
    }

    let mut groups: Vec<Group> = Vec::with_capacity(components.len());
    for (_root, mut members) in components {
        members.sort_by(|&a, &b| records[a].record.account_id.cmp(&records[b].record.account_id));
        let member_ids: Vec<String> = members.iter().map(|&i| records[i].record.account_id.clone()).collect();

        if members.len() == 1 {
            groups.push(Group {
                group_id: group_id(&member_ids),
                members: member_ids.clone(),
                primary_id: member_ids[0].clone(),
                weakest_edge_to_primary: None,
                join_reasons: Vec::new(),
            });
            continue;
        }

        let member_records: Vec<&NormalizedRecord> = members.iter().map(|&i| &records[i]).collect();
        let primary_id = survivor::choose_primary(&member_records, config);
        let primary_idx = members
            .iter()
            .copied()
            .find(|&i| records[i].record.account_id == primary_id)
            .expect("primary must be a group member");

        let member_set: FxHashSet<usize> = members.iter().copied().collect();
        let local_edges: Vec<(usize, usize, u8)> = accepted
            .iter()
            .filter(|(a, b, _, _)| member_set.contains(a) && member_set.contains(b))
            .map(|(a, b, s, _)| (*a, *b, *s))
            .collect();
        let bottlenecks = widest_paths(&members, &local_edges, primary_idx);
        let weakest = members
            .iter()
            .filter(|&&i| i != primary_idx)
            .filter_map(|i| bottlenecks.get(i))
            .copied()
            .min();

        let mut join_reasons: Vec<BlockReason> = accepted
            .iter()
            .filter(|(a, b, _, _)| member_set.contains(a) && member_set.contains(b))
            .map(|(_, _, _, r)| *r)
            .collect();
        join_reasons.sort();
        join_reasons.dedup();

        groups.push(Group {
            group_id: group_id(&member_ids),
            members: member_ids,
            primary_id,
            weakest_edge_to_primary: weakest,
            join_reasons,
        });
    }

    groups.sort_by(|a, b| a.group_id.cmp(&b.group_id));
    (groups, rejected)
}

fn group_id(member_ids: &[String]) -> String {
    member_ids.join(":")
}

/// Widest-path (maximum bottleneck) distances from `source` to every member
/// reachable via `edges`.
fn widest_paths(members: &[usize], edges: &[(usize, usize, u8)], source: usize) -> HashMap<usize, u8> {
    let mut adjacency: HashMap<usize, Vec<(usize, u8)>> = HashMap::new();
    for &m in members {
        adjacency.entry(m).or_default();
    }
    for &(a, b, score) in edges {
        adjacency.entry(a).or_default().push((b, score));
        adjacency.entry(b).or_default().push((a, score));
    }

    let mut best: HashMap<usize, u8> = HashMap::new();
    best.insert(source, u8::MAX);
    // BinaryHeap is a max-heap, so popping (bottleneck, node) naturally
    // visits the widest-known path first.
    let mut heap: BinaryHeap<(u8, usize)> = BinaryHeap::new();
    heap.push((u8::MAX, source));

    while let Some((bottleneck, node)) = heap.pop() {
        if bottleneck < *best.get(&node).unwrap_or(&0) {
            continue;
        }
        if let Some(neighbors) = adjacency.get(&node) {
            for &(next, weight) in neighbors {
                let candidate = bottleneck.min(weight);
                if candidate > *best.get(&next).unwrap_or(&0) {
                    best.insert(next, candidate);
                    heap.push((candidate, next));
                }
            }
        }
    }
    best
}
