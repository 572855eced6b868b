//! Entity components and the simulator's ordered bookkeeping sets.

use std::collections::BTreeMap;

use bevy_ecs::prelude::{Component, Entity, Resource};

use crate::network::LocationOnRoad;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehiclePhase {
    /// Empty: cruising the network looking for work.
    Cruising,
    /// Assigned: driving toward the pickup location.
    PickingUp,
    /// Carrying the request to its dropoff, or a nearby hub.
    DroppingOff,
}

/// The request a vehicle is currently serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub request: Entity,
    pub pickup: LocationOnRoad,
    pub dropoff: LocationOnRoad,
}

#[derive(Debug, Clone, Copy, Component)]
pub struct Vehicle {
    pub id: u64,
    /// The road of the vehicle's current leg. Together with
    /// `next_event_time` this pins down the exact position at any instant
    /// before that event.
    pub loc: LocationOnRoad,
    /// Time of the vehicle's next scheduled event.
    pub next_event_time: u64,
    /// When the vehicle last became empty.
    pub start_search_time: u64,
    pub phase: VehiclePhase,
    pub assignment: Option<Assignment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Created from the trace; the arrival event has not fired yet.
    Scheduled,
    /// Arrived inside the open pool window; held in the batch buffer.
    Pooled,
    /// Arrived outside a pool window, or left over as pool surplus.
    Waiting,
    /// Matched to a vehicle that is driving to the pickup.
    Assigned,
    /// On board.
    PickedUp,
    /// Ran out its maximum life time unserved.
    Expired,
}

#[derive(Debug, Clone, Copy, Component)]
pub struct TripRequest {
    pub id: u64,
    pub pickup: LocationOnRoad,
    pub dropoff: LocationOnRoad,
    pub available_time: u64,
    /// Trip duration from the trace, not re-derived from the oracle.
    pub trip_time: u64,
    /// `available_time` plus the configured maximum life time.
    pub expiration_time: u64,
    pub state: RequestState,
    pub assigned_vehicle: Option<Entity>,
}

/// Empty vehicles keyed by vehicle id. A vehicle is present iff its phase is
/// [`VehiclePhase::Cruising`] and it has no assignment. Iteration order is
/// the deterministic snapshot order used by the matcher.
#[derive(Debug, Default, Resource)]
pub struct EmptyVehicles(pub BTreeMap<u64, Entity>);

/// Requests that have arrived but are neither pooled nor assigned, keyed by
/// request id. Members leave on assignment or expiration.
#[derive(Debug, Default, Resource)]
pub struct WaitingRequests(pub BTreeMap<u64, Entity>);

/// Arrival-ordered buffer of requests inside the open pool window.
#[derive(Debug, Default, Resource)]
pub struct RequestBatch(pub Vec<Entity>);
