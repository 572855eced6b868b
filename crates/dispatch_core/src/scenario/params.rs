use bevy_ecs::prelude::Resource;

/// Seconds of batching per pool window.
const DEFAULT_POOL_WINDOW_SECS: u64 = 30;

/// The first pool window opens this long after simulation start.
const DEFAULT_POOL_OFFSET_SECS: u64 = 30;

/// Redirect a finished trip to a hub reachable within this many seconds of
/// the dropoff.
const DEFAULT_HUB_REDIRECT_SECS: u64 = 60;

/// Default maximum life time of a request.
const DEFAULT_MAX_LIFE_SECS: u64 = 600;

/// The open pool window `[start, end)` over request arrival times.
#[derive(Debug, Clone, Copy, Resource)]
pub struct PoolWindow {
    pub start: u64,
    pub end: u64,
    pub width: u64,
}

impl PoolWindow {
    pub fn new(offset: u64, width: u64) -> Self {
        assert!(width > 0, "pool window width must be positive");
        Self {
            start: offset,
            end: offset + width,
            width,
        }
    }

    pub fn contains(&self, time: u64) -> bool {
        time >= self.start && time < self.end
    }

    /// Slides forward in whole-width steps until `time` falls before the
    /// window's end.
    pub fn slide_past(&mut self, time: u64) {
        while self.end <= time {
            self.start = self.end;
            self.end += self.width;
        }
    }
}

/// Dropoff-to-hub travel-time threshold for the post-trip hub redirect.
#[derive(Debug, Clone, Copy, Resource)]
pub struct HubRedirectThreshold(pub u64);

/// The simulation stops once the next event would fire after this time.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTime(pub u64);

/// Number of vehicles deployed at setup.
#[derive(Debug, Clone, Copy, Resource)]
pub struct FleetSize(pub u64);

/// Parameters for building a simulation world.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub total_vehicles: u64,
    /// Maximum life time of a request, in seconds.
    pub request_max_life_secs: u64,
    /// Seed for random vehicle placement; the search-policy stream is
    /// derived from it.
    pub placement_seed: u64,
    pub pool_window_secs: u64,
    pub pool_offset_secs: u64,
    pub hub_redirect_threshold_secs: u64,
    /// Override for the simulation end time. Defaults to the latest request
    /// expiration.
    pub simulation_end_time: Option<u64>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            total_vehicles: 100,
            request_max_life_secs: DEFAULT_MAX_LIFE_SECS,
            placement_seed: 0,
            pool_window_secs: DEFAULT_POOL_WINDOW_SECS,
            pool_offset_secs: DEFAULT_POOL_OFFSET_SECS,
            hub_redirect_threshold_secs: DEFAULT_HUB_REDIRECT_SECS,
            simulation_end_time: None,
        }
    }
}

impl SimulationParams {
    pub fn with_vehicles(mut self, total_vehicles: u64) -> Self {
        self.total_vehicles = total_vehicles;
        self
    }

    pub fn with_max_life_secs(mut self, seconds: u64) -> Self {
        self.request_max_life_secs = seconds;
        self
    }

    pub fn with_placement_seed(mut self, seed: u64) -> Self {
        self.placement_seed = seed;
        self
    }

    /// Set the pool window geometry: first window opens at `offset_secs`,
    /// every window is `width_secs` wide.
    pub fn with_pool_window(mut self, offset_secs: u64, width_secs: u64) -> Self {
        self.pool_offset_secs = offset_secs;
        self.pool_window_secs = width_secs;
        self
    }

    pub fn with_hub_redirect_threshold_secs(mut self, seconds: u64) -> Self {
        self.hub_redirect_threshold_secs = seconds;
        self
    }

    /// Stop the simulation at an explicit time instead of the latest
    /// request expiration.
    pub fn with_simulation_end_time(mut self, end_time: u64) -> Self {
        self.simulation_end_time = Some(end_time);
        self
    }
}
