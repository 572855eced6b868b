//! Simulation clock and event queue.
//!
//! Simulated time is logical: it advances only when an event is popped.
//! Events are ordered by (time, sequence number); the sequence number makes
//! equal-time pops FIFO in scheduling order, which keeps runs reproducible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

/// What an event means when it fires. Systems guard on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A trip request enters the system at its available time.
    RequestInbound,
    /// A request's maximum life time ran out.
    RequestExpired,
    /// An empty vehicle reached the end of its current road.
    IntersectionReached,
    /// An assigned vehicle arrived at the pickup location.
    TripStarted,
    /// A vehicle finished its trip, at the dropoff or a nearby hub.
    TripCompleted,
    /// Pool close: run the batch matcher. Synthesized by the runner.
    BatchMatchRun,
}

/// Logical reference to the entity an event acts on. Cancellation removes
/// events by subject, so there is never a dangling reference into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Vehicle(Entity),
    Request(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: u64,
    /// Tie-breaker: equal-time events fire in scheduling order.
    pub seq: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (time, seq).
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being routed through the schedule.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedules an event at an absolute time and returns it.
    pub fn schedule_at(
        &mut self,
        time: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> Event {
        debug_assert!(time >= self.now, "event time must be >= current time");
        let event = Event {
            time,
            seq: self.next_seq,
            kind,
            subject,
        };
        self.next_seq += 1;
        self.events.push(event);
        event
    }

    /// Schedules an event `delay` seconds from now.
    pub fn schedule_in(
        &mut self,
        delay: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> Event {
        self.schedule_at(self.now + delay, kind, subject)
    }

    pub fn peek(&self) -> Option<&Event> {
        self.events.peek()
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.time;
        Some(event)
    }

    /// Removes every queued event for `subject`. A cancelled event never
    /// fires again; rescheduling after reassignment starts from a clean
    /// queue.
    pub fn cancel(&mut self, subject: EventSubject) {
        self.events.retain(|event| event.subject != Some(subject));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
