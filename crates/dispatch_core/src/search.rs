//! Search policies: where an empty vehicle goes next.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::network::RoadMap;

#[derive(Debug, Error)]
pub enum SearchPolicyError {
    #[error("no outgoing road at intersection {0}")]
    DeadEnd(usize),
}

/// Chooses the next road for an empty vehicle that reached an intersection.
///
/// The map reference is read-only, so a policy cannot mutate simulator
/// state. A policy error leaves the vehicle parked in its current phase; the
/// simulation keeps running.
pub trait SearchPolicy: Send + Sync {
    fn next_road(
        &mut self,
        vehicle: u64,
        intersection: usize,
        map: &RoadMap,
    ) -> Result<usize, SearchPolicyError>;
}

/// Resource wrapper for the search policy trait object.
#[derive(Resource)]
pub struct SearchPolicyResource(pub Box<dyn SearchPolicy>);

/// Default policy: a seeded uniform random walk over outgoing roads.
#[derive(Debug)]
pub struct RandomWalk {
    rng: StdRng,
}

impl RandomWalk {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SearchPolicy for RandomWalk {
    fn next_road(
        &mut self,
        _vehicle: u64,
        intersection: usize,
        map: &RoadMap,
    ) -> Result<usize, SearchPolicyError> {
        let outgoing = map.outgoing_roads(intersection);
        if outgoing.is_empty() {
            return Err(SearchPolicyError::DeadEnd(intersection));
        }
        Ok(outgoing[self.rng.gen_range(0..outgoing.len())])
    }
}
