//! Deferred-acceptance (Gale-Shapley) stable matching.
//!
//! Requests rank vehicles by benefit descending; vehicles rank requests by
//! reach time ascending; equal scores resolve to the smaller index (indices
//! follow id order, so this is the smaller-id rule). The shorter side
//! proposes, so the matching covers `min(|requests|, |vehicles|)` pairs and
//! admits no blocking pair under the two preference orders.

use std::cmp::Ordering;

use super::types::{MatchResult, PairingTables};
use super::MatchingAlgorithm;

#[derive(Debug, Default)]
pub struct DeferredAcceptance;

impl MatchingAlgorithm for DeferredAcceptance {
    fn find_batch_matches(&self, tables: &PairingTables) -> Vec<MatchResult> {
        let requests = tables.request_count();
        let vehicles = tables.vehicle_count();
        if requests == 0 || vehicles == 0 {
            return Vec::new();
        }

        let mut matches: Vec<MatchResult> = if requests <= vehicles {
            let engagements = propose(&request_preferences(tables), &vehicle_ranks(tables));
            engagements
                .into_iter()
                .enumerate()
                .map(|(request_index, vehicle_index)| MatchResult {
                    request_index,
                    vehicle_index,
                })
                .collect()
        } else {
            let engagements = propose(&vehicle_preferences(tables), &request_ranks(tables));
            engagements
                .into_iter()
                .enumerate()
                .map(|(vehicle_index, request_index)| MatchResult {
                    request_index,
                    vehicle_index,
                })
                .collect()
        };
        matches.sort_by_key(|pair| pair.request_index);
        matches
    }
}

/// Proposer-oriented deferred acceptance. `preferences[p]` lists acceptors
/// in p's order of preference; `rank[a][p]` is a's rank of proposer p (lower
/// is preferred). Requires `preferences.len() <= rank.len()` and complete
/// lists, which guarantees every proposer ends up engaged. Returns the
/// acceptor engaged to each proposer.
fn propose(preferences: &[Vec<usize>], rank: &[Vec<usize>]) -> Vec<usize> {
    let proposer_count = preferences.len();
    let acceptor_count = rank.len();
    debug_assert!(proposer_count <= acceptor_count);

    let mut next_choice = vec![0usize; proposer_count];
    let mut engaged_to: Vec<Option<usize>> = vec![None; acceptor_count];
    // Stack of free proposers; seeded in reverse so the smallest index
    // proposes first (the outcome is order-independent, the trace is not).
    let mut free: Vec<usize> = (0..proposer_count).rev().collect();

    while let Some(proposer) = free.pop() {
        let acceptor = preferences[proposer][next_choice[proposer]];
        next_choice[proposer] += 1;
        match engaged_to[acceptor] {
            None => engaged_to[acceptor] = Some(proposer),
            Some(current) => {
                if rank[acceptor][proposer] < rank[acceptor][current] {
                    engaged_to[acceptor] = Some(proposer);
                    free.push(current);
                } else {
                    free.push(proposer);
                }
            }
        }
    }

    let mut matched = vec![usize::MAX; proposer_count];
    for (acceptor, proposer) in engaged_to.iter().enumerate() {
        if let Some(proposer) = *proposer {
            matched[proposer] = acceptor;
        }
    }
    matched
}

/// Per request: vehicle indices by benefit descending, smaller index first
/// on ties.
fn request_preferences(tables: &PairingTables) -> Vec<Vec<usize>> {
    tables
        .benefit
        .iter()
        .map(|row| {
            let mut order: Vec<usize> = (0..row.len()).collect();
            order.sort_by(|&a, &b| {
                row[b]
                    .partial_cmp(&row[a])
                    .unwrap_or(Ordering::Equal)
                    .then(a.cmp(&b))
            });
            order
        })
        .collect()
}

/// Per vehicle: request indices by reach time ascending, smaller index first
/// on ties.
fn vehicle_preferences(tables: &PairingTables) -> Vec<Vec<usize>> {
    tables
        .reach_time
        .iter()
        .map(|row| {
            let mut order: Vec<usize> = (0..row.len()).collect();
            order.sort_by_key(|&request| (row[request], request));
            order
        })
        .collect()
}

/// `rank[vehicle][request]` derived from [`vehicle_preferences`].
fn vehicle_ranks(tables: &PairingTables) -> Vec<Vec<usize>> {
    vehicle_preferences(tables).into_iter().map(invert).collect()
}

/// `rank[request][vehicle]` derived from [`request_preferences`].
fn request_ranks(tables: &PairingTables) -> Vec<Vec<usize>> {
    request_preferences(tables).into_iter().map(invert).collect()
}

fn invert(order: Vec<usize>) -> Vec<usize> {
    let mut rank = vec![0usize; order.len()];
    for (position, index) in order.into_iter().enumerate() {
        rank[index] = position;
    }
    rank
}
