//! Road network and travel-time oracle.
//!
//! The map is immutable after construction and shared read-only with every
//! system (and with search policies) through [`SharedMap`]. Travel-time
//! queries run against an all-pairs table precomputed once at setup, with an
//! on-road offset correction at both endpoints.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use pathfinding::prelude::dijkstra_all;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Sentinel cost for intersection pairs with no connecting path. Kept well
/// below `u64::MAX` so offset corrections cannot wrap.
const UNREACHABLE: u64 = u64::MAX / 4;

#[derive(Debug, Clone)]
pub struct Intersection {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Directed edge between two intersections. `travel_time` is in whole
/// seconds and already includes any speed-reduction scaling.
#[derive(Debug, Clone)]
pub struct Road {
    pub from: usize,
    pub to: usize,
    pub travel_time: u64,
}

/// A point on a directed road, expressed as travel time from the road's
/// start intersection. Invariant: `0 <= offset <= road.travel_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOnRoad {
    pub road: usize,
    pub offset: u64,
}

#[derive(Debug)]
pub struct RoadMap {
    intersections: Vec<Intersection>,
    roads: Vec<Road>,
    outgoing: Vec<Vec<usize>>,
    travel_times: Vec<Vec<u64>>,
    hubs: Vec<LocationOnRoad>,
}

impl RoadMap {
    pub fn new(intersections: Vec<Intersection>, roads: Vec<Road>) -> Self {
        let mut outgoing = vec![Vec::new(); intersections.len()];
        for (index, road) in roads.iter().enumerate() {
            outgoing[road.from].push(index);
        }
        Self {
            intersections,
            roads,
            outgoing,
            travel_times: Vec::new(),
            hubs: Vec::new(),
        }
    }

    pub fn with_hubs(mut self, hubs: Vec<LocationOnRoad>) -> Self {
        self.hubs = hubs;
        self
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn road(&self, index: usize) -> &Road {
        &self.roads[index]
    }

    pub fn hubs(&self) -> &[LocationOnRoad] {
        &self.hubs
    }

    pub fn outgoing_roads(&self, intersection: usize) -> &[usize] {
        &self.outgoing[intersection]
    }

    /// Precomputes shortest travel times between all intersection pairs.
    /// Must run once before any [`RoadMap::travel_time`] query.
    pub fn compute_travel_times(&mut self) {
        let count = self.intersections.len();
        let mut table = vec![vec![UNREACHABLE; count]; count];
        for source in 0..count {
            table[source][source] = 0;
            let reached = dijkstra_all(&source, |&node: &usize| {
                self.outgoing[node]
                    .iter()
                    .map(|&road| (self.roads[road].to, self.roads[road].travel_time))
                    .collect::<Vec<_>>()
            });
            for (node, (_parent, cost)) in reached {
                table[source][node] = cost;
            }
        }
        self.travel_times = table;
    }

    fn intersection_travel_time(&self, from: usize, to: usize) -> u64 {
        self.travel_times[from][to]
    }

    /// Shortest travel time from `a` to `b` in seconds. Same-road forward
    /// pairs return the along-road delta; every other pair goes through
    /// `a`'s end intersection and enters `b`'s road from its start.
    pub fn travel_time(&self, a: LocationOnRoad, b: LocationOnRoad) -> u64 {
        if a.road == b.road && b.offset >= a.offset {
            return b.offset - a.offset;
        }
        let road_a = &self.roads[a.road];
        let road_b = &self.roads[b.road];
        (road_a.travel_time - a.offset)
            .saturating_add(self.intersection_travel_time(road_a.to, road_b.from))
            .saturating_add(b.offset)
    }

    /// Interpolated latitude/longitude of a location along its road.
    pub fn location_coordinates(&self, loc: LocationOnRoad) -> (f64, f64) {
        let road = &self.roads[loc.road];
        let from = &self.intersections[road.from];
        let to = &self.intersections[road.to];
        let fraction = if road.travel_time == 0 {
            0.0
        } else {
            loc.offset as f64 / road.travel_time as f64
        };
        (
            from.latitude + (to.latitude - from.latitude) * fraction,
            from.longitude + (to.longitude - from.longitude) * fraction,
        )
    }

    /// Projects a raw coordinate onto the closest point of the closest road.
    /// The map must contain at least one road.
    pub fn map_match(&self, latitude: f64, longitude: f64) -> LocationOnRoad {
        let mut best = LocationOnRoad { road: 0, offset: 0 };
        let mut best_distance = f64::INFINITY;
        for (index, road) in self.roads.iter().enumerate() {
            let from = &self.intersections[road.from];
            let to = &self.intersections[road.to];
            let (fraction, distance) = project_on_segment(latitude, longitude, from, to);
            if distance < best_distance {
                best_distance = distance;
                best = LocationOnRoad {
                    road: index,
                    offset: (fraction * road.travel_time as f64).round() as u64,
                };
            }
        }
        best
    }

    /// Travel time to the closest hub from `from`, with the hub's location.
    /// Ties resolve to the earliest hub in the map's hub list.
    pub fn nearest_hub(&self, from: LocationOnRoad) -> Option<(u64, LocationOnRoad)> {
        let mut best: Option<(u64, LocationOnRoad)> = None;
        for &hub in &self.hubs {
            let time = self.travel_time(from, hub);
            if best.map_or(true, |(current, _)| time < current) {
                best = Some((time, hub));
            }
        }
        best
    }
}

/// Shared read-only map handed to systems and search policies.
#[derive(Clone, Resource)]
pub struct SharedMap(pub Arc<RoadMap>);

/// Haversine great-circle distance in meters.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Closest point of segment `from`-`to` to the query coordinate, as a
/// (fraction along the segment, distance in meters) pair. An
/// equirectangular projection around the segment's mean latitude is accurate
/// enough at road scale for nearest-road selection.
fn project_on_segment(
    latitude: f64,
    longitude: f64,
    from: &Intersection,
    to: &Intersection,
) -> (f64, f64) {
    let mean_lat = ((from.latitude + to.latitude) * 0.5).to_radians();
    let to_xy = |lat: f64, lon: f64| {
        (
            lon.to_radians() * mean_lat.cos() * EARTH_RADIUS_M,
            lat.to_radians() * EARTH_RADIUS_M,
        )
    };
    let (px, py) = to_xy(latitude, longitude);
    let (ax, ay) = to_xy(from.latitude, from.longitude);
    let (bx, by) = to_xy(to.latitude, to.longitude);

    let (dx, dy) = (bx - ax, by - ay);
    let length_sq = dx * dx + dy * dy;
    let fraction = if length_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + fraction * dx, ay + fraction * dy);
    let distance = ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt();
    (fraction, distance)
}
