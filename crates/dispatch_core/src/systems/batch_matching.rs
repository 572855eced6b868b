//! Pool close: match the buffered request batch against the empty-vehicle
//! snapshot and dispatch every matched vehicle toward its pickup.
//!
//! The runner synthesizes a [EventKind::BatchMatchRun] event when the first
//! popped event reaches the window end; its time is the pool close time.

use std::time::Instant;

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{
    Assignment, EmptyVehicles, RequestBatch, RequestState, TripRequest, Vehicle, VehiclePhase,
    WaitingRequests,
};
use crate::matching::{MatchingAlgorithmResource, PairingTables};
use crate::network::{great_circle_distance, LocationOnRoad, RoadMap, SharedMap};
use crate::scenario::PoolWindow;
use crate::telemetry::DispatchTelemetry;

#[allow(clippy::too_many_arguments)]
pub fn batch_matching_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    map: Res<SharedMap>,
    algorithm: Res<MatchingAlgorithmResource>,
    mut pool: ResMut<PoolWindow>,
    mut batch: ResMut<RequestBatch>,
    mut empty: ResMut<EmptyVehicles>,
    mut waiting: ResMut<WaitingRequests>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut vehicles: Query<&mut Vehicle>,
    mut requests: Query<&mut TripRequest>,
) {
    if event.0.kind != EventKind::BatchMatchRun {
        return;
    }
    let now = event.0.time;

    if batch.0.is_empty() {
        pool.slide_past(now);
        return;
    }
    let started = Instant::now();
    let map = map.0.as_ref();

    // Snapshots: requests in arrival order, vehicles in id order.
    let pooled: Vec<Entity> = std::mem::take(&mut batch.0);
    let snapshot: Vec<Entity> = empty.0.values().copied().collect();

    let tables = build_pairing_tables(map, &pooled, &snapshot, &vehicles, &requests);
    let matches = algorithm.find_batch_matches(&tables);

    let pool_benefit: f64 = matches
        .iter()
        .map(|pair| tables.benefit[pair.request_index][pair.vehicle_index])
        .sum();

    let mut matched = vec![false; pooled.len()];
    for pair in &matches {
        matched[pair.request_index] = true;
        dispatch(
            map,
            now,
            pooled[pair.request_index],
            snapshot[pair.vehicle_index],
            &mut clock,
            &mut empty,
            &mut waiting,
            &mut telemetry,
            &mut vehicles,
            &mut requests,
        );
    }

    // Pool surplus: more requests than vehicles. Expirations are already
    // armed; the leftovers only move to the waiting set.
    for (index, request_entity) in pooled.iter().enumerate() {
        if matched[index] {
            continue;
        }
        let Ok(mut request) = requests.get_mut(*request_entity) else {
            continue;
        };
        request.state = RequestState::Waiting;
        waiting.0.insert(request.id, *request_entity);
    }

    telemetry.record_pool(pool_benefit, started.elapsed());
    log::debug!(
        "pool closed at {now}: {} requests, {} empty vehicles, {} matches",
        pooled.len(),
        snapshot.len(),
        matches.len()
    );

    pool.slide_past(now);
}

/// Benefit and reach-time tables over the pool snapshot. Preferences use the
/// vehicle's stored leg location; the exact on-road position only matters
/// for the pickup time, computed at dispatch.
fn build_pairing_tables(
    map: &RoadMap,
    pooled: &[Entity],
    snapshot: &[Entity],
    vehicles: &Query<&mut Vehicle>,
    requests: &Query<&mut TripRequest>,
) -> PairingTables {
    let mut benefit = vec![vec![0.0f64; snapshot.len()]; pooled.len()];
    let mut reach_time = vec![vec![0u64; pooled.len()]; snapshot.len()];

    for (request_index, &request_entity) in pooled.iter().enumerate() {
        let request = requests
            .get(request_entity)
            .expect("pooled request refers to a live entity");
        let (pickup_lat, pickup_lon) = map.location_coordinates(request.pickup);
        let (dropoff_lat, dropoff_lon) = map.location_coordinates(request.dropoff);
        let trip_distance =
            great_circle_distance(pickup_lat, pickup_lon, dropoff_lat, dropoff_lon);

        for (vehicle_index, &vehicle_entity) in snapshot.iter().enumerate() {
            let vehicle = vehicles
                .get(vehicle_entity)
                .expect("empty-set entry refers to a live entity");
            let (vehicle_lat, vehicle_lon) = map.location_coordinates(vehicle.loc);
            let approach_distance =
                great_circle_distance(vehicle_lat, vehicle_lon, pickup_lat, pickup_lon);
            let total = trip_distance + approach_distance;
            benefit[request_index][vehicle_index] = if total > 0.0 {
                trip_distance / total
            } else {
                1.0
            };
            reach_time[vehicle_index][request_index] = map.travel_time(vehicle.loc, request.pickup);
        }
    }

    PairingTables { benefit, reach_time }
}

#[allow(clippy::too_many_arguments)]
fn dispatch(
    map: &RoadMap,
    now: u64,
    request_entity: Entity,
    vehicle_entity: Entity,
    clock: &mut SimulationClock,
    empty: &mut EmptyVehicles,
    waiting: &mut WaitingRequests,
    telemetry: &mut DispatchTelemetry,
    vehicles: &mut Query<&mut Vehicle>,
    requests: &mut Query<&mut TripRequest>,
) {
    let mut vehicle = vehicles
        .get_mut(vehicle_entity)
        .expect("matched vehicle refers to a live entity");
    let mut request = requests
        .get_mut(request_entity)
        .expect("matched request refers to a live entity");
    if vehicle.phase != VehiclePhase::Cruising || vehicle.assignment.is_some() {
        panic!(
            "matching selected vehicle {} for request {} but it is not empty (phase {:?})",
            vehicle.id, request.id, vehicle.phase
        );
    }

    // Pin down the vehicle's exact position on its current road. A parked
    // vehicle (its search policy failed) has an event in the past and sits
    // at the end of its road, hence the saturating difference.
    let road = map.road(vehicle.loc.road);
    let travel_to_end = vehicle.next_event_time.saturating_sub(now);
    let exact = LocationOnRoad {
        road: vehicle.loc.road,
        offset: road.travel_time - travel_to_end.min(road.travel_time),
    };
    let arrive_time = now + map.travel_time(exact, request.pickup);

    let cruise_time = now - vehicle.start_search_time;
    let approach_time = arrive_time - now;
    let wait_time = arrive_time - request.available_time;
    telemetry.record_assignment(cruise_time, approach_time, wait_time, request.trip_time);

    empty.0.remove(&vehicle.id);
    waiting.0.remove(&request.id);
    clock.cancel(EventSubject::Vehicle(vehicle_entity));
    clock.cancel(EventSubject::Request(request_entity));

    vehicle.loc = exact;
    vehicle.phase = VehiclePhase::PickingUp;
    vehicle.assignment = Some(Assignment {
        request: request_entity,
        pickup: request.pickup,
        dropoff: request.dropoff,
    });
    vehicle.next_event_time = arrive_time;
    clock.schedule_at(
        arrive_time,
        EventKind::TripStarted,
        Some(EventSubject::Vehicle(vehicle_entity)),
    );

    request.state = RequestState::Assigned;
    request.assigned_vehicle = Some(vehicle_entity);
}
