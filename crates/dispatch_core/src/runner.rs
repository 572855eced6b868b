//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression, the end-of-simulation guard and pool-close detection
//! happen here, outside systems. Each step pops the next event, first closes
//! the pool if that event's time has left the open window, then inserts the
//! event as [CurrentEvent] and runs the schedule. Every system guards on its
//! event kind, so exactly one system acts per event.

use bevy_ecs::prelude::{Schedule, World};

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::scenario::{PoolWindow, SimulationEndTime};
use crate::systems::{
    batch_matching::batch_matching_system, intersection_reached::intersection_reached_system,
    request_expired::request_expired_system, request_inbound::request_inbound_system,
    trip_completed::trip_completed_system, trip_started::trip_started_system,
};

/// Runs one simulation step. Returns `false` when the queue is empty or the
/// next event lies beyond the simulation end time.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let end_time = world.resource::<SimulationEndTime>().0;
    let next_time = match world.resource::<SimulationClock>().peek() {
        Some(event) => event.time,
        None => return false,
    };
    if next_time > end_time {
        return false;
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(event) => event,
        None => return false,
    };

    // The first event at or past the window end closes the pool, stamped
    // with that event's own time. The window catches up before the event
    // itself is routed.
    if event.time >= world.resource::<PoolWindow>().end {
        world.insert_resource(CurrentEvent(Event {
            time: event.time,
            seq: event.seq,
            kind: EventKind::BatchMatchRun,
            subject: None,
        }));
        schedule.run(world);
    }

    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs simulation steps until the queue drains, the end time is reached or
/// `max_steps` is hit. Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the default simulation schedule: every event-reacting system.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        request_inbound_system,
        batch_matching_system,
        intersection_reached_system,
        trip_started_system,
        trip_completed_system,
        request_expired_system,
    ));
    schedule
}
