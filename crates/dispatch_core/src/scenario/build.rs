//! World construction: resources, seeded random vehicle placement and
//! request scheduling.

use std::sync::Arc;

use bevy_ecs::prelude::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::ecs::{
    EmptyVehicles, RequestBatch, RequestState, TripRequest, Vehicle, VehiclePhase,
    WaitingRequests,
};
use crate::matching::{DeferredAcceptance, MatchingAlgorithmResource};
use crate::network::{LocationOnRoad, RoadMap, SharedMap};
use crate::search::{RandomWalk, SearchPolicyResource};
use crate::telemetry::DispatchTelemetry;

use super::params::{
    FleetSize, HubRedirectThreshold, PoolWindow, SimulationEndTime, SimulationParams,
};

/// Seed offset separating the search-policy RNG stream from placement.
const SEARCH_SEED_OFFSET: u64 = 0xdead_beef;

/// One pre-map-matched request arrival from the trace.
#[derive(Debug, Clone, Copy)]
pub struct RequestRecord {
    pub available_time: u64,
    pub pickup: LocationOnRoad,
    pub dropoff: LocationOnRoad,
    pub trip_time: u64,
}

/// Populates `world` with every simulator resource, the vehicle fleet and
/// the request trace, ready for the runner.
pub fn build_scenario(
    world: &mut World,
    map: Arc<RoadMap>,
    requests: Vec<RequestRecord>,
    params: SimulationParams,
) {
    let mut clock = SimulationClock::default();
    let mut empty = EmptyVehicles::default();
    let mut telemetry = DispatchTelemetry::default();

    // Vehicles start empty at a random offset of a random road; their first
    // event fires when they reach the end of that road. A vehicle that never
    // becomes empty later keeps searching from simulation start.
    if params.total_vehicles > 0 {
        assert!(!map.roads().is_empty(), "cannot place vehicles on an empty map");
    }
    let mut rng = StdRng::seed_from_u64(params.placement_seed);
    for id in 0..params.total_vehicles {
        let road_index = rng.gen_range(0..map.roads().len());
        let road = map.road(road_index);
        let offset = rng.gen_range(0..=road.travel_time);
        let next_event_time = road.travel_time - offset;
        let entity = world
            .spawn(Vehicle {
                id,
                loc: LocationOnRoad { road: road_index, offset },
                next_event_time,
                start_search_time: 0,
                phase: VehiclePhase::Cruising,
                assignment: None,
            })
            .id();
        empty.0.insert(id, entity);
        clock.schedule_at(
            next_event_time,
            EventKind::IntersectionReached,
            Some(EventSubject::Vehicle(entity)),
        );
    }

    // Requests are spawned up front and introduced by their arrival events.
    telemetry.total_requests = requests.len() as u64;
    let mut latest_expiration = 0u64;
    for (index, record) in requests.iter().enumerate() {
        let expiration_time = record.available_time + params.request_max_life_secs;
        latest_expiration = latest_expiration.max(expiration_time);
        let entity = world
            .spawn(TripRequest {
                id: index as u64,
                pickup: record.pickup,
                dropoff: record.dropoff,
                available_time: record.available_time,
                trip_time: record.trip_time,
                expiration_time,
                state: RequestState::Scheduled,
                assigned_vehicle: None,
            })
            .id();
        clock.schedule_at(
            record.available_time,
            EventKind::RequestInbound,
            Some(EventSubject::Request(entity)),
        );
    }

    // The simulation ends when the last request can no longer be served.
    let end_time = params.simulation_end_time.unwrap_or(latest_expiration);

    world.insert_resource(clock);
    world.insert_resource(empty);
    world.insert_resource(telemetry);
    world.insert_resource(WaitingRequests::default());
    world.insert_resource(RequestBatch::default());
    world.insert_resource(SharedMap(map));
    world.insert_resource(PoolWindow::new(
        params.pool_offset_secs,
        params.pool_window_secs,
    ));
    world.insert_resource(HubRedirectThreshold(params.hub_redirect_threshold_secs));
    world.insert_resource(SimulationEndTime(end_time));
    world.insert_resource(FleetSize(params.total_vehicles));
    world.insert_resource(MatchingAlgorithmResource::new(Box::new(DeferredAcceptance)));
    world.insert_resource(SearchPolicyResource(Box::new(RandomWalk::seeded(
        params.placement_seed.wrapping_add(SEARCH_SEED_OFFSET),
    ))));
}
