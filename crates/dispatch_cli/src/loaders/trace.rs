//! Request-trace CSV loader.
//!
//! # CSV format
//!
//! One row per trip request, times in whole seconds:
//!
//! ```csv
//! available_time,pickup_lat,pickup_lon,dropoff_lat,dropoff_lon,trip_time
//! 35,52.505,13.401,52.512,13.408,420
//! 61,52.501,13.399,52.507,13.403,310
//! ```
//!
//! Pickup and dropoff coordinates are map-matched onto the road network.
//! Rows whose coordinates land too far from any road (outside the cropped
//! area) are skipped and logged.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use dispatch_core::network::{great_circle_distance, RoadMap};
use dispatch_core::scenario::RequestRecord;

use super::SetupError;

/// A coordinate matching a road further away than this is considered
/// outside the simulated area.
const MAX_MATCH_DISTANCE_M: f64 = 1_000.0;

#[derive(Deserialize)]
struct TraceRecord {
    available_time: u64,
    pickup_lat: f64,
    pickup_lon: f64,
    dropoff_lat: f64,
    dropoff_lon: f64,
    trip_time: u64,
}

pub fn load_requests(path: &Path, map: &RoadMap) -> Result<Vec<RequestRecord>, SetupError> {
    let file = std::fs::File::open(path)?;
    load_requests_reader(file, map)
}

/// Like [`load_requests`] but accepts any `Read` source (tests pass a
/// `std::io::Cursor`).
pub fn load_requests_reader<R: Read>(
    reader: R,
    map: &RoadMap,
) -> Result<Vec<RequestRecord>, SetupError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut requests = Vec::new();
    let mut skipped = 0usize;

    for result in csv_reader.deserialize::<TraceRecord>() {
        let row = result.map_err(|error| SetupError::Parse(error.to_string()))?;

        let pickup = map.map_match(row.pickup_lat, row.pickup_lon);
        let dropoff = map.map_match(row.dropoff_lat, row.dropoff_lon);
        if match_distance(map, pickup, row.pickup_lat, row.pickup_lon) > MAX_MATCH_DISTANCE_M
            || match_distance(map, dropoff, row.dropoff_lat, row.dropoff_lon)
                > MAX_MATCH_DISTANCE_M
        {
            skipped += 1;
            continue;
        }

        requests.push(RequestRecord {
            available_time: row.available_time,
            pickup,
            dropoff,
            trip_time: row.trip_time,
        });
    }

    if skipped > 0 {
        log::info!("skipped {skipped} trace rows outside the simulated area");
    }
    Ok(requests)
}

fn match_distance(
    map: &RoadMap,
    matched: dispatch_core::network::LocationOnRoad,
    latitude: f64,
    longitude: f64,
) -> f64 {
    let (matched_lat, matched_lon) = map.location_coordinates(matched);
    great_circle_distance(latitude, longitude, matched_lat, matched_lon)
}
