//! Request arrival: pool interception or waiting-set entry.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{RequestBatch, RequestState, TripRequest, WaitingRequests};
use crate::scenario::PoolWindow;

/// Routes a request arrival. Inside the open pool window the request joins
/// the batch buffer and its arrival event is not re-enqueued; before the
/// first window it goes straight to the waiting set. Either way the
/// expiration deadline is armed exactly once, here; assignment cancels it.
pub fn request_inbound_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    pool: Res<PoolWindow>,
    mut batch: ResMut<RequestBatch>,
    mut waiting: ResMut<WaitingRequests>,
    mut requests: Query<&mut TripRequest>,
) {
    if event.0.kind != EventKind::RequestInbound {
        return;
    }
    let Some(EventSubject::Request(request_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut request) = requests.get_mut(request_entity) else {
        return;
    };
    let now = event.0.time;

    if pool.contains(now) {
        request.state = RequestState::Pooled;
        batch.0.push(request_entity);
    } else {
        request.state = RequestState::Waiting;
        waiting.0.insert(request.id, request_entity);
    }
    clock.schedule_at(
        request.expiration_time,
        EventKind::RequestExpired,
        Some(EventSubject::Request(request_entity)),
    );
}
