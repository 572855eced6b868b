//! Statistics: a single accumulator resource mutated on the simulator's
//! call stack, and the final report derived from it.

use std::fmt;
use std::time::Duration;

use bevy_ecs::prelude::{Entity, Resource, World};

use crate::ecs::{EmptyVehicles, Vehicle};
use crate::scenario::{FleetSize, SimulationEndTime};

#[derive(Debug, Default, Resource)]
pub struct DispatchTelemetry {
    /// Requests introduced to the system from the trace.
    pub total_requests: u64,
    pub total_assignments: u64,
    pub expired_requests: u64,
    pub total_trip_time: u64,
    pub total_wait_time: u64,
    pub total_search_time: u64,
    pub total_cruise_time: u64,
    pub total_approach_time: u64,
    /// Sum of per-pair benefits over every closed pool.
    pub total_pool_benefit: f64,
    pub pools_closed: u64,
    /// Wall-clock time spent inside the matcher. Measured, not simulated,
    /// so it is excluded from reproducibility guarantees.
    pub pool_wall_time: Duration,
}

impl DispatchTelemetry {
    pub fn record_assignment(
        &mut self,
        cruise_time: u64,
        approach_time: u64,
        wait_time: u64,
        trip_time: u64,
    ) {
        self.total_cruise_time += cruise_time;
        self.total_approach_time += approach_time;
        self.total_search_time += cruise_time + approach_time;
        self.total_wait_time += wait_time;
        self.total_trip_time += trip_time;
        self.total_assignments += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expired_requests += 1;
    }

    pub fn record_pool(&mut self, pool_benefit: f64, elapsed: Duration) {
        self.total_pool_benefit += pool_benefit;
        self.pools_closed += 1;
        self.pool_wall_time += elapsed;
    }
}

/// Aggregate results of one finished run. Averages use integer floor
/// division over whole seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub total_requests: u64,
    pub total_assignments: u64,
    pub expired_requests: u64,
    /// Requests neither served nor expired when the simulation ended.
    pub unserved_requests: u64,
    pub average_search_time: u64,
    pub average_wait_time: u64,
    pub average_cruise_time: u64,
    pub average_approach_time: u64,
    pub average_trip_time: u64,
    pub expiration_percentage: u64,
    pub pools_closed: u64,
    pub total_pool_time: Duration,
    pub average_benefit_per_vehicle: f64,
}

/// Derives the report. Vehicles still empty at the end have been searching
/// since they last became empty; that residual time counts toward the search
/// average.
pub fn build_report(world: &World) -> SimulationReport {
    let end_time = world.resource::<SimulationEndTime>().0;
    let fleet_size = world.resource::<FleetSize>().0;

    let empty_entities: Vec<Entity> = world
        .resource::<EmptyVehicles>()
        .0
        .values()
        .copied()
        .collect();
    let mut residual_search_time = 0u64;
    for entity in &empty_entities {
        let vehicle = world
            .entity(*entity)
            .get::<Vehicle>()
            .expect("empty-set entry refers to a live vehicle");
        residual_search_time += end_time.saturating_sub(vehicle.start_search_time);
    }

    let telemetry = world.resource::<DispatchTelemetry>();
    let searchers = telemetry.total_assignments + empty_entities.len() as u64;

    SimulationReport {
        total_requests: telemetry.total_requests,
        total_assignments: telemetry.total_assignments,
        expired_requests: telemetry.expired_requests,
        unserved_requests: telemetry
            .total_requests
            .saturating_sub(telemetry.total_assignments + telemetry.expired_requests),
        average_search_time: floor_avg(
            telemetry.total_search_time + residual_search_time,
            searchers,
        ),
        average_wait_time: floor_avg(telemetry.total_wait_time, telemetry.total_requests),
        average_cruise_time: floor_avg(telemetry.total_cruise_time, telemetry.total_assignments),
        average_approach_time: floor_avg(
            telemetry.total_approach_time,
            telemetry.total_assignments,
        ),
        average_trip_time: floor_avg(telemetry.total_trip_time, telemetry.total_assignments),
        expiration_percentage: floor_avg(
            telemetry.expired_requests * 100,
            telemetry.total_requests,
        ),
        pools_closed: telemetry.pools_closed,
        total_pool_time: telemetry.pool_wall_time,
        average_benefit_per_vehicle: if fleet_size == 0 {
            0.0
        } else {
            telemetry.total_pool_benefit / fleet_size as f64
        },
    }
}

fn floor_avg(total: u64, count: u64) -> u64 {
    if count == 0 {
        0
    } else {
        total / count
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "***Statistics***")?;
        if self.total_requests == 0 {
            return writeln!(f, "No requests.");
        }
        writeln!(f, "average vehicle search time: {} seconds", self.average_search_time)?;
        writeln!(f, "average request wait time: {} seconds", self.average_wait_time)?;
        writeln!(f, "request expiration percentage: {}%", self.expiration_percentage)?;
        writeln!(f)?;
        writeln!(f, "average vehicle cruise time: {} seconds", self.average_cruise_time)?;
        writeln!(f, "average vehicle approach time: {} seconds", self.average_approach_time)?;
        writeln!(f, "average trip time: {} seconds", self.average_trip_time)?;
        writeln!(f, "total number of assignments: {}", self.total_assignments)?;
        writeln!(f, "expired requests: {}", self.expired_requests)?;
        writeln!(f, "unserved requests at end: {}", self.unserved_requests)?;
        writeln!(f, "pools closed: {}", self.pools_closed)?;
        writeln!(f, "total pool time: {:.3?}", self.total_pool_time)?;
        let average_pool_time = if self.pools_closed == 0 {
            Duration::ZERO
        } else {
            self.total_pool_time / self.pools_closed as u32
        };
        writeln!(f, "average pool time: {average_pool_time:.3?}")?;
        write!(f, "average benefit per vehicle: {:.4}", self.average_benefit_per_vehicle)
    }
}
