pub mod build;
pub mod params;

pub use build::{build_scenario, RequestRecord};
pub use params::{
    FleetSize, HubRedirectThreshold, PoolWindow, SimulationEndTime, SimulationParams,
};
