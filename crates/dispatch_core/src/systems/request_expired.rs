//! Expiration: a request ran out its maximum life time unserved.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{RequestBatch, RequestState, TripRequest, WaitingRequests};
use crate::telemetry::DispatchTelemetry;

/// Counts the expiration and removes the request from whichever set still
/// holds it. A request that was assigned before its deadline fired is
/// dropped silently (its expiration event is normally cancelled at match
/// time; this is the belt for the same-instant case).
pub fn request_expired_system(
    event: Res<CurrentEvent>,
    mut batch: ResMut<RequestBatch>,
    mut waiting: ResMut<WaitingRequests>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut requests: Query<&mut TripRequest>,
) {
    if event.0.kind != EventKind::RequestExpired {
        return;
    }
    let Some(EventSubject::Request(request_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut request) = requests.get_mut(request_entity) else {
        return;
    };

    match request.state {
        RequestState::Waiting => {
            waiting.0.remove(&request.id);
        }
        RequestState::Pooled => {
            batch.0.retain(|&entity| entity != request_entity);
        }
        _ => return,
    }
    request.state = RequestState::Expired;
    telemetry.record_expiration();
}
