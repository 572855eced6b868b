//! Cruise step: an empty vehicle reached the end of its road and asks the
//! search policy where to go next.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Vehicle, VehiclePhase};
use crate::network::{LocationOnRoad, SharedMap};
use crate::search::SearchPolicyResource;

pub fn intersection_reached_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    map: Res<SharedMap>,
    mut policy: ResMut<SearchPolicyResource>,
    mut vehicles: Query<&mut Vehicle>,
) {
    if event.0.kind != EventKind::IntersectionReached {
        return;
    }
    let Some(EventSubject::Vehicle(vehicle_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut vehicle) = vehicles.get_mut(vehicle_entity) else {
        return;
    };
    // A vehicle matched at this very instant already left the empty phase;
    // its popped cruising event is stale and must not move it.
    if vehicle.phase != VehiclePhase::Cruising || vehicle.assignment.is_some() {
        return;
    }

    let map = map.0.as_ref();
    let intersection = map.road(vehicle.loc.road).to;
    match policy.0.next_road(vehicle.id, intersection, map) {
        Ok(next_road) => {
            vehicle.loc = LocationOnRoad { road: next_road, offset: 0 };
            vehicle.next_event_time = event.0.time + map.road(next_road).travel_time;
            clock.schedule_at(
                vehicle.next_event_time,
                EventKind::IntersectionReached,
                Some(EventSubject::Vehicle(vehicle_entity)),
            );
        }
        Err(error) => {
            // The vehicle stays parked at the intersection. It remains in
            // the empty set and can still be matched.
            log::warn!(
                "search policy failed for vehicle {} at intersection {intersection}: {error}",
                vehicle.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy_ecs::prelude::{Schedule, World};

    use super::*;
    use crate::ecs::Assignment;
    use crate::network::{Intersection, Road, RoadMap};
    use crate::test_helpers::{create_test_world, loop_map, spawn_vehicle};

    fn fire_intersection_event(world: &mut World, time: u64, vehicle: bevy_ecs::prelude::Entity) {
        world.resource_mut::<SimulationClock>().schedule_at(
            time,
            EventKind::IntersectionReached,
            Some(EventSubject::Vehicle(vehicle)),
        );
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("intersection event");
        world.insert_resource(CurrentEvent(event));
        let mut schedule = Schedule::default();
        schedule.add_systems(intersection_reached_system);
        schedule.run(world);
    }

    #[test]
    fn cruising_vehicle_moves_onto_the_next_road() {
        let mut world = create_test_world(Arc::new(loop_map(60)));
        let vehicle = spawn_vehicle(&mut world, 0, 0, 0, 60);

        fire_intersection_event(&mut world, 60, vehicle);

        let state = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(state.loc, LocationOnRoad { road: 0, offset: 0 });
        assert_eq!(state.next_event_time, 120);

        let next = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("next cruising event");
        assert_eq!(next.kind, EventKind::IntersectionReached);
        assert_eq!(next.time, 120);
    }

    #[test]
    fn stale_event_for_an_assigned_vehicle_is_ignored() {
        let mut world = create_test_world(Arc::new(loop_map(60)));
        let vehicle = spawn_vehicle(&mut world, 0, 0, 0, 60);
        {
            let mut entity = world.entity_mut(vehicle);
            let mut state = entity.get_mut::<Vehicle>().expect("vehicle");
            state.phase = VehiclePhase::PickingUp;
            state.assignment = Some(Assignment {
                request: vehicle, // placeholder entity; never dereferenced
                pickup: LocationOnRoad { road: 0, offset: 0 },
                dropoff: LocationOnRoad { road: 0, offset: 0 },
            });
        }

        fire_intersection_event(&mut world, 60, vehicle);

        assert!(world.resource::<SimulationClock>().is_empty());
        let state = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(state.next_event_time, 60, "stale event must not reschedule");
    }

    #[test]
    fn dead_end_parks_the_vehicle_without_a_follow_up_event() {
        // One road into a dead-end intersection.
        let intersections = vec![
            Intersection { id: 0, latitude: 52.50, longitude: 13.40 },
            Intersection { id: 1, latitude: 52.51, longitude: 13.40 },
        ];
        let roads = vec![Road { from: 0, to: 1, travel_time: 30 }];
        let mut map = RoadMap::new(intersections, roads);
        map.compute_travel_times();

        let mut world = create_test_world(Arc::new(map));
        let vehicle = spawn_vehicle(&mut world, 0, 0, 0, 30);

        fire_intersection_event(&mut world, 30, vehicle);

        assert!(world.resource::<SimulationClock>().is_empty());
        let state = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(state.phase, VehiclePhase::Cruising, "phase is unchanged");
    }
}
