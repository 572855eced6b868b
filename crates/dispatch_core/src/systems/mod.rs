pub mod batch_matching;
pub mod intersection_reached;
pub mod request_expired;
pub mod request_inbound;
pub mod trip_completed;
pub mod trip_started;

#[cfg(test)]
mod end_to_end_tests {
    use std::sync::Arc;

    use crate::clock::{EventKind, EventSubject, SimulationClock};
    use crate::ecs::{EmptyVehicles, RequestState, TripRequest, Vehicle, VehiclePhase};
    use crate::network::LocationOnRoad;
    use crate::runner::{run_until_empty, simulation_schedule};
    use crate::scenario::SimulationEndTime;
    use crate::telemetry::{build_report, DispatchTelemetry};
    use crate::test_helpers::{create_test_world, loop_map, spawn_request, spawn_vehicle};

    /// One vehicle circling a self-loop road, one request whose pickup is the
    /// loop intersection: the pool containing the arrival closes on the
    /// vehicle's next intersection event and produces a zero-approach match.
    #[test]
    fn simulates_one_dispatch_end_to_end() {
        let mut world = create_test_world(Arc::new(loop_map(60)));
        world.insert_resource(SimulationEndTime(700));

        let at_intersection = LocationOnRoad { road: 0, offset: 60 };
        let mid_road = LocationOnRoad { road: 0, offset: 30 };

        let vehicle = spawn_vehicle(&mut world, 0, 0, 0, 60);
        world.resource_mut::<SimulationClock>().schedule_at(
            60,
            EventKind::IntersectionReached,
            Some(EventSubject::Vehicle(vehicle)),
        );
        let request = spawn_request(&mut world, 0, at_intersection, mid_road, 100, 300, 600);
        world.resource_mut::<SimulationClock>().schedule_at(
            100,
            EventKind::RequestInbound,
            Some(EventSubject::Request(request)),
        );

        let mut schedule = simulation_schedule();
        let steps = run_until_empty(&mut world, &mut schedule, 1_000);
        assert!(steps < 1_000, "runner did not converge");

        // Arrival at 100 lands in the window [90, 120); the vehicle's
        // intersection event at 120 closes that pool.
        let telemetry = world.resource::<DispatchTelemetry>();
        assert_eq!(telemetry.total_assignments, 1);
        assert_eq!(telemetry.expired_requests, 0);
        assert_eq!(telemetry.total_cruise_time, 120);
        assert_eq!(telemetry.total_approach_time, 0);
        assert_eq!(telemetry.total_search_time, 120);
        assert_eq!(telemetry.total_wait_time, 20);
        assert_eq!(telemetry.total_trip_time, 300);

        // Trip ran from 120 to 420; the vehicle has been empty since.
        let vehicle_state = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(vehicle_state.phase, VehiclePhase::Cruising);
        assert!(vehicle_state.assignment.is_none());
        assert_eq!(vehicle_state.start_search_time, 420);
        assert_eq!(world.resource::<EmptyVehicles>().0.len(), 1);

        let request_state = world.entity(request).get::<TripRequest>().expect("request");
        assert_eq!(request_state.state, RequestState::PickedUp);
        assert_eq!(request_state.assigned_vehicle, Some(vehicle));

        // Residual search time (700 - 420) folds into the search average.
        let report = build_report(&world);
        assert_eq!(report.total_assignments, 1);
        assert_eq!(report.average_search_time, (120 + 280) / 2);
        assert_eq!(report.average_wait_time, 20);
        assert_eq!(report.expiration_percentage, 0);
    }
}
