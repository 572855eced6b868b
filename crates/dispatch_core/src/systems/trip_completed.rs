//! Dropoff: the vehicle is empty again and resumes searching from wherever
//! the trip (or the hub redirect) left it.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{EmptyVehicles, Vehicle, VehiclePhase};
use crate::network::SharedMap;

pub fn trip_completed_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    map: Res<SharedMap>,
    mut empty: ResMut<EmptyVehicles>,
    mut vehicles: Query<&mut Vehicle>,
) {
    if event.0.kind != EventKind::TripCompleted {
        return;
    }
    let Some(EventSubject::Vehicle(vehicle_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut vehicle) = vehicles.get_mut(vehicle_entity) else {
        return;
    };
    if vehicle.phase != VehiclePhase::DroppingOff {
        return;
    }

    let now = event.0.time;
    vehicle.phase = VehiclePhase::Cruising;
    vehicle.assignment = None;
    vehicle.start_search_time = now;
    empty.0.insert(vehicle.id, vehicle_entity);

    // Resume cruising: first reach the end of the current road, then the
    // search policy takes over.
    let remaining = map.0.road(vehicle.loc.road).travel_time - vehicle.loc.offset;
    vehicle.next_event_time = now + remaining;
    clock.schedule_at(
        vehicle.next_event_time,
        EventKind::IntersectionReached,
        Some(EventSubject::Vehicle(vehicle_entity)),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy_ecs::prelude::{Entity, Schedule, World};

    use super::*;
    use crate::network::LocationOnRoad;
    use crate::test_helpers::{create_test_world, line_map, spawn_vehicle};

    fn fire_completion(world: &mut World, time: u64, vehicle: Entity) {
        world.resource_mut::<SimulationClock>().schedule_at(
            time,
            EventKind::TripCompleted,
            Some(EventSubject::Vehicle(vehicle)),
        );
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("completion event");
        world.insert_resource(CurrentEvent(event));
        let mut schedule = Schedule::default();
        schedule.add_systems(trip_completed_system);
        schedule.run(world);
    }

    #[test]
    fn completed_vehicle_is_empty_again_and_resumes_cruising() {
        let mut world = create_test_world(Arc::new(line_map(200)));
        let vehicle = spawn_vehicle(&mut world, 4, 0, 0, 0);
        world.resource_mut::<EmptyVehicles>().0.remove(&4);
        {
            let mut entity = world.entity_mut(vehicle);
            let mut state = entity.get_mut::<Vehicle>().expect("vehicle");
            state.phase = VehiclePhase::DroppingOff;
            state.loc = LocationOnRoad { road: 0, offset: 50 };
        }

        fire_completion(&mut world, 470, vehicle);

        let state = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(state.phase, VehiclePhase::Cruising);
        assert_eq!(state.start_search_time, 470);
        assert!(state.assignment.is_none());
        assert_eq!(state.next_event_time, 470 + 150);

        assert_eq!(world.resource::<EmptyVehicles>().0.get(&4), Some(&vehicle));

        let next = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("cruising event");
        assert_eq!(next.kind, EventKind::IntersectionReached);
        assert_eq!(next.time, 620);
    }
}
