//! Matching inputs and outputs.

/// Dense per-pool preference inputs. Allocated when a pool closes and
/// dropped once the pool is resolved, so memory stays bounded by the pool
/// window size.
#[derive(Debug, Clone, Default)]
pub struct PairingTables {
    /// `benefit[request][vehicle]`: trip distance over trip plus approach
    /// distance, in (0, 1]. Higher is better for the request.
    pub benefit: Vec<Vec<f64>>,
    /// `reach_time[vehicle][request]`: road travel time from the vehicle to
    /// the pickup, in seconds. Lower is better for the vehicle.
    pub reach_time: Vec<Vec<u64>>,
}

impl PairingTables {
    pub fn request_count(&self) -> usize {
        self.benefit.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.reach_time.len()
    }
}

/// One matched pair, by pool snapshot indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub request_index: usize,
    pub vehicle_index: usize,
}
