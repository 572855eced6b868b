//! Test helpers: synthetic maps and world setup shared across test files.

use std::sync::Arc;

use bevy_ecs::prelude::{Entity, World};

use crate::clock::SimulationClock;
use crate::ecs::{
    EmptyVehicles, RequestBatch, RequestState, TripRequest, Vehicle, VehiclePhase,
    WaitingRequests,
};
use crate::matching::{DeferredAcceptance, MatchingAlgorithmResource};
use crate::network::{Intersection, LocationOnRoad, Road, RoadMap, SharedMap};
use crate::scenario::{FleetSize, HubRedirectThreshold, PoolWindow, SimulationEndTime};
use crate::search::{RandomWalk, SearchPolicyResource};
use crate::telemetry::DispatchTelemetry;

fn intersection(id: u64, latitude: f64, longitude: f64) -> Intersection {
    Intersection {
        id,
        latitude,
        longitude,
    }
}

/// Single intersection with one self-loop road: a cruising vehicle keeps
/// returning to the same spot every `loop_secs`.
pub fn loop_map(loop_secs: u64) -> RoadMap {
    let intersections = vec![intersection(0, 52.52, 13.405)];
    let roads = vec![Road { from: 0, to: 0, travel_time: loop_secs }];
    let mut map = RoadMap::new(intersections, roads);
    map.compute_travel_times();
    map
}

/// Two intersections joined in both directions with the given travel time.
pub fn line_map(travel_secs: u64) -> RoadMap {
    let intersections = vec![
        intersection(0, 52.50, 13.40),
        intersection(1, 52.51, 13.40),
    ];
    let roads = vec![
        Road { from: 0, to: 1, travel_time: travel_secs },
        Road { from: 1, to: 0, travel_time: travel_secs },
    ];
    let mut map = RoadMap::new(intersections, roads);
    map.compute_travel_times();
    map
}

/// An n-by-n grid with bidirectional roads of equal travel time.
pub fn grid_map(n: usize, edge_secs: u64) -> RoadMap {
    let mut intersections = Vec::new();
    for row in 0..n {
        for col in 0..n {
            intersections.push(intersection(
                (row * n + col) as u64,
                52.50 + 0.01 * row as f64,
                13.40 + 0.01 * col as f64,
            ));
        }
    }
    let mut roads = Vec::new();
    let index = |row: usize, col: usize| row * n + col;
    for row in 0..n {
        for col in 0..n {
            if col + 1 < n {
                roads.push(Road { from: index(row, col), to: index(row, col + 1), travel_time: edge_secs });
                roads.push(Road { from: index(row, col + 1), to: index(row, col), travel_time: edge_secs });
            }
            if row + 1 < n {
                roads.push(Road { from: index(row, col), to: index(row + 1, col), travel_time: edge_secs });
                roads.push(Road { from: index(row + 1, col), to: index(row, col), travel_time: edge_secs });
            }
        }
    }
    let mut map = RoadMap::new(intersections, roads);
    map.compute_travel_times();
    map
}

/// A minimal world carrying every resource the systems expect. Pool window
/// is the default [30, 60) geometry; the end time is far enough out for
/// short scenarios.
pub fn create_test_world(map: Arc<RoadMap>) -> World {
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(DispatchTelemetry::default());
    world.insert_resource(EmptyVehicles::default());
    world.insert_resource(WaitingRequests::default());
    world.insert_resource(RequestBatch::default());
    world.insert_resource(SharedMap(map));
    world.insert_resource(PoolWindow::new(30, 30));
    world.insert_resource(HubRedirectThreshold(60));
    world.insert_resource(SimulationEndTime(3_600));
    world.insert_resource(FleetSize(1));
    world.insert_resource(MatchingAlgorithmResource::new(Box::new(DeferredAcceptance)));
    world.insert_resource(SearchPolicyResource(Box::new(RandomWalk::seeded(7))));
    world
}

/// Spawns a cruising vehicle and registers it in the empty set. The caller
/// schedules its first event if the scenario needs one.
pub fn spawn_vehicle(
    world: &mut World,
    id: u64,
    road: usize,
    offset: u64,
    next_event_time: u64,
) -> Entity {
    let entity = world
        .spawn(Vehicle {
            id,
            loc: LocationOnRoad { road, offset },
            next_event_time,
            start_search_time: 0,
            phase: VehiclePhase::Cruising,
            assignment: None,
        })
        .id();
    world.resource_mut::<EmptyVehicles>().0.insert(id, entity);
    entity
}

/// Spawns a request in the pre-arrival state. The caller wires it into the
/// batch, the waiting set or the clock as the scenario needs.
pub fn spawn_request(
    world: &mut World,
    id: u64,
    pickup: LocationOnRoad,
    dropoff: LocationOnRoad,
    available_time: u64,
    trip_time: u64,
    max_life_secs: u64,
) -> Entity {
    world
        .spawn(TripRequest {
            id,
            pickup,
            dropoff,
            available_time,
            trip_time,
            expiration_time: available_time + max_life_secs,
            state: RequestState::Scheduled,
            assigned_vehicle: None,
        })
        .id()
}
