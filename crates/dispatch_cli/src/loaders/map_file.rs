//! Road-network JSON loader.
//!
//! # Format
//!
//! ```json
//! {
//!   "intersections": [
//!     { "id": 1, "latitude": 52.52, "longitude": 13.40 },
//!     { "id": 2, "latitude": 52.53, "longitude": 13.41 }
//!   ],
//!   "roads": [
//!     { "from": 1, "to": 2, "length_meters": 850.0, "speed_limit_kmh": 50.0 }
//!   ],
//!   "hubs": [2]
//! }
//! ```
//!
//! Roads referencing intersections outside the bounding polygon are dropped
//! with their endpoints. Travel times are `length / (speed * speed_reduction)`
//! rounded up to whole seconds.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use dispatch_core::network::{Intersection, Road, RoadMap};

use super::polygon::BoundingPolygon;
use super::SetupError;

#[derive(Deserialize)]
struct MapFile {
    intersections: Vec<IntersectionRecord>,
    roads: Vec<RoadRecord>,
    #[serde(default)]
    hubs: Vec<u64>,
}

#[derive(Deserialize)]
struct IntersectionRecord {
    id: u64,
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RoadRecord {
    from: u64,
    to: u64,
    length_meters: f64,
    speed_limit_kmh: f64,
}

/// Loads the road network, optionally cropped to a bounding polygon, and
/// precomputes the all-pairs travel-time table.
pub fn load_map(
    path: &Path,
    polygon: Option<&BoundingPolygon>,
    speed_reduction: f64,
) -> Result<RoadMap, SetupError> {
    let file = File::open(path)?;
    load_map_reader(BufReader::new(file), polygon, speed_reduction)
}

/// Like [`load_map`] but accepts any `Read` source.
pub fn load_map_reader<R: Read>(
    reader: R,
    polygon: Option<&BoundingPolygon>,
    speed_reduction: f64,
) -> Result<RoadMap, SetupError> {
    let raw: MapFile =
        serde_json::from_reader(reader).map_err(|error| SetupError::Parse(error.to_string()))?;

    let mut index_of = HashMap::new();
    let mut intersections = Vec::new();
    let mut cropped = 0usize;
    for record in &raw.intersections {
        if let Some(polygon) = polygon {
            if !polygon.contains(record.latitude, record.longitude) {
                cropped += 1;
                continue;
            }
        }
        index_of.insert(record.id, intersections.len());
        intersections.push(Intersection {
            id: record.id,
            latitude: record.latitude,
            longitude: record.longitude,
        });
    }
    if cropped > 0 {
        log::info!("cropped {cropped} intersections outside the bounding polygon");
    }
    if intersections.is_empty() {
        return Err(SetupError::Map("no intersections inside the simulated area".into()));
    }

    let mut roads = Vec::new();
    for record in &raw.roads {
        let (Some(&from), Some(&to)) = (index_of.get(&record.from), index_of.get(&record.to))
        else {
            continue;
        };
        if record.speed_limit_kmh <= 0.0 || record.length_meters < 0.0 {
            return Err(SetupError::Map(format!(
                "road {} -> {} has a non-positive speed limit or negative length",
                record.from, record.to
            )));
        }
        let speed_mps = record.speed_limit_kmh / 3.6 * speed_reduction;
        roads.push(Road {
            from,
            to,
            travel_time: (record.length_meters / speed_mps).ceil() as u64,
        });
    }
    if roads.is_empty() {
        return Err(SetupError::Map("no roads inside the simulated area".into()));
    }

    let mut map = RoadMap::new(intersections, roads);
    map.compute_travel_times();

    // Hubs arrive as intersection ids; pin each to the nearest road location.
    let mut hubs = Vec::new();
    for hub_id in &raw.hubs {
        let Some(&index) = index_of.get(hub_id) else {
            log::warn!("hub intersection {hub_id} is outside the simulated area");
            continue;
        };
        let intersection = &map.intersections()[index];
        hubs.push(map.map_match(intersection.latitude, intersection.longitude));
    }
    Ok(map.with_hubs(hubs))
}
