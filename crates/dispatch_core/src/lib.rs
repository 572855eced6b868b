pub mod clock;
pub mod ecs;
pub mod matching;
pub mod network;
pub mod runner;
pub mod scenario;
pub mod search;
pub mod systems;
pub mod telemetry;
pub mod test_helpers;
