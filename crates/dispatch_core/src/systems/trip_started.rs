//! Pickup: the assigned vehicle arrived at the pickup location and the trip
//! begins. Completion is scheduled here, redirected to a hub when one is
//! close enough to the dropoff.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{RequestState, TripRequest, Vehicle, VehiclePhase};
use crate::network::SharedMap;
use crate::scenario::HubRedirectThreshold;

pub fn trip_started_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    map: Res<SharedMap>,
    threshold: Res<HubRedirectThreshold>,
    mut vehicles: Query<&mut Vehicle>,
    mut requests: Query<&mut TripRequest>,
) {
    if event.0.kind != EventKind::TripStarted {
        return;
    }
    let Some(EventSubject::Vehicle(vehicle_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut vehicle) = vehicles.get_mut(vehicle_entity) else {
        return;
    };
    if vehicle.phase != VehiclePhase::PickingUp {
        return;
    }
    let Some(assignment) = vehicle.assignment else {
        return;
    };

    let now = event.0.time;
    let trip_time = {
        let Ok(mut request) = requests.get_mut(assignment.request) else {
            return;
        };
        request.state = RequestState::PickedUp;
        request.trip_time
    };

    // Finish at a hub when one is within the redirect threshold of the
    // dropoff, otherwise at the dropoff itself.
    let map = map.0.as_ref();
    let (final_loc, completion_time) = match map.nearest_hub(assignment.dropoff) {
        Some((hub_time, hub)) if hub_time < threshold.0 => (hub, now + trip_time + hub_time),
        _ => (assignment.dropoff, now + trip_time),
    };

    vehicle.loc = final_loc;
    vehicle.phase = VehiclePhase::DroppingOff;
    vehicle.next_event_time = completion_time;
    clock.schedule_at(
        completion_time,
        EventKind::TripCompleted,
        Some(EventSubject::Vehicle(vehicle_entity)),
    );
}
