//! End-to-end dispatch scenarios driven through the runner.

use std::sync::Arc;

use dispatch_core::clock::{EventKind, EventSubject, SimulationClock};
use dispatch_core::ecs::{RequestState, TripRequest, WaitingRequests};
use dispatch_core::network::LocationOnRoad;
use dispatch_core::runner::{run_until_empty, simulation_schedule};
use dispatch_core::scenario::SimulationEndTime;
use dispatch_core::telemetry::DispatchTelemetry;
use dispatch_core::test_helpers::{
    create_test_world, line_map, loop_map, spawn_request, spawn_vehicle,
};

fn schedule_arrival(world: &mut bevy_ecs::prelude::World, request: bevy_ecs::prelude::Entity) {
    let available_time = world
        .entity(request)
        .get::<TripRequest>()
        .expect("request")
        .available_time;
    world.resource_mut::<SimulationClock>().schedule_at(
        available_time,
        EventKind::RequestInbound,
        Some(EventSubject::Request(request)),
    );
}

/// A distant vehicle is still matched when it is the only candidate; the
/// wait is simply long.
#[test]
fn lone_distant_vehicle_is_matched_with_a_long_wait() {
    let mut world = create_test_world(Arc::new(line_map(10_000)));
    world.insert_resource(SimulationEndTime(160));

    let vehicle = spawn_vehicle(&mut world, 0, 0, 0, 10_000);
    world.resource_mut::<SimulationClock>().schedule_at(
        10_000,
        EventKind::IntersectionReached,
        Some(EventSubject::Vehicle(vehicle)),
    );

    let pickup = LocationOnRoad { road: 0, offset: 9_900 };
    let dropoff = LocationOnRoad { road: 1, offset: 5_000 };
    let request = spawn_request(&mut world, 0, pickup, dropoff, 100, 300, 60);
    schedule_arrival(&mut world, request);

    let mut schedule = simulation_schedule();
    run_until_empty(&mut world, &mut schedule, 1_000);

    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.total_assignments, 1);
    assert_eq!(telemetry.expired_requests, 0);
    // Pool closed at the expiration event's time (160); the vehicle was
    // 9 840 s from the end of its road and 9 740 s from the pickup.
    assert_eq!(telemetry.total_approach_time, 9_740);
    assert_eq!(telemetry.total_wait_time, 9_800);

    let state = world.entity(request).get::<TripRequest>().expect("request").state;
    assert_eq!(state, RequestState::Assigned);
}

/// The same request with no fleet at all expires on schedule.
#[test]
fn request_without_any_vehicle_expires() {
    let mut world = create_test_world(Arc::new(line_map(10_000)));
    world.insert_resource(SimulationEndTime(160));

    let pickup = LocationOnRoad { road: 0, offset: 9_900 };
    let dropoff = LocationOnRoad { road: 1, offset: 5_000 };
    let request = spawn_request(&mut world, 0, pickup, dropoff, 100, 300, 60);
    schedule_arrival(&mut world, request);

    let mut schedule = simulation_schedule();
    run_until_empty(&mut world, &mut schedule, 1_000);

    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.total_assignments, 0);
    assert_eq!(telemetry.expired_requests, 1);
    let state = world.entity(request).get::<TripRequest>().expect("request").state;
    assert_eq!(state, RequestState::Expired);
    assert!(world.resource::<WaitingRequests>().0.is_empty());
}

/// Three arrivals inside one window batch together; the pool closes once, at
/// the first event past the window end, and the surplus request expires
/// later.
#[test]
fn one_window_batches_every_arrival_and_overflow_waits() {
    let mut world = create_test_world(Arc::new(loop_map(100)));
    world.insert_resource(SimulationEndTime(700));

    for id in 0..2 {
        let vehicle = spawn_vehicle(&mut world, id, 0, 0, 100);
        world.resource_mut::<SimulationClock>().schedule_at(
            100,
            EventKind::IntersectionReached,
            Some(EventSubject::Vehicle(vehicle)),
        );
    }

    let at_intersection = LocationOnRoad { road: 0, offset: 100 };
    let mut requests = Vec::new();
    for (id, available_time) in [(0u64, 30u64), (1, 45), (2, 59)] {
        let request = spawn_request(
            &mut world,
            id,
            at_intersection,
            at_intersection,
            available_time,
            200,
            600,
        );
        schedule_arrival(&mut world, request);
        requests.push(request);
    }

    let mut schedule = simulation_schedule();
    run_until_empty(&mut world, &mut schedule, 1_000);

    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.total_assignments, 2);
    // One pool carried assignments; later closes had empty batches.
    assert_eq!(telemetry.pools_closed, 1);
    // The surplus request (id 2) expired at 59 + 600.
    assert_eq!(telemetry.expired_requests, 1);

    let matched: Vec<RequestState> = requests
        .iter()
        .map(|request| world.entity(*request).get::<TripRequest>().expect("request").state)
        .collect();
    assert_eq!(matched[0], RequestState::PickedUp);
    assert_eq!(matched[1], RequestState::PickedUp);
    assert_eq!(matched[2], RequestState::Expired);
}
