pub mod stable;
pub mod types;

use bevy_ecs::prelude::Resource;

pub use stable::DeferredAcceptance;
pub use types::{MatchResult, PairingTables};

/// Trait for algorithms pairing a pool of requests with empty vehicles.
///
/// Implementations see the pool only through its preference tables; indices
/// in the result refer to the rows and columns of those tables. An
/// implementation must be deterministic for fixed inputs.
pub trait MatchingAlgorithm: Send + Sync {
    fn find_batch_matches(&self, tables: &PairingTables) -> Vec<MatchResult>;
}

/// Resource wrapper for the matching algorithm trait object.
#[derive(Resource)]
pub struct MatchingAlgorithmResource(pub Box<dyn MatchingAlgorithm>);

impl MatchingAlgorithmResource {
    pub fn new(algorithm: Box<dyn MatchingAlgorithm>) -> Self {
        Self(algorithm)
    }
}

impl std::ops::Deref for MatchingAlgorithmResource {
    type Target = dyn MatchingAlgorithm;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
