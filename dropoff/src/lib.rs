//! Synthetic traffic for a school drop-off redesign demo: given real road routes around one
//! school, generate a statistically plausible population of timed vehicle trips for two
//! scenarios (everyone drives to the gate vs. satellite drop-off pods with shuttles), and
//! derive congestion metrics from that population at any simulated instant. Rendering is
//! somebody else's job; this crate just hands over trips and numbers.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use geom::{Duration, Time};

pub use self::generate::{generate_after_trips, generate_before_trips, TripSet};
pub use self::locations::{ExitPoint, MapView, Origin, OriginKind, Pod, School, Site};
pub use self::routes::{Directions, Route, RouteBundle};
pub use self::session::{Clock, Session};
pub use self::stats::{compute_stats, Stats};
pub use self::trips::Trip;

mod generate;
mod locations;
mod routes;
mod session;
mod stats;
mod trips;

// The simulated morning, in seconds since the 7:00 AM epoch.
pub const SIM_START_TIME: Time = Time::const_seconds(0.0);
pub const SIM_END_TIME: Time = Time::const_seconds(5400.0);
pub const PEAK_START: Time = Time::const_seconds(1800.0);
pub const PEAK_END: Time = Time::const_seconds(4500.0);
/// The center of the arrival bell curve, 7:45 AM.
pub const PEAK_TIME: Time = Time::const_seconds(2700.0);

/// One of the two traffic-handling policies being compared. Each gets its own independently
/// generated trip population.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy)]
pub enum Scenario {
    /// Every car drives to the school gate and queues there.
    Before,
    /// Cars divert to their assigned pod; shuttles cover the last leg to school.
    After,
}

impl Scenario {
    /// How many vehicles the relevant road network absorbs before congestion reads 100%.
    pub fn road_capacity(self) -> usize {
        match self {
            Scenario::Before => 100,
            Scenario::After => 300,
        }
    }

    /// How long an uncongested trip would take; excess wait time is measured against this.
    pub fn freeflow_baseline(self) -> Duration {
        match self {
            Scenario::Before => Duration::seconds(180.0),
            Scenario::After => Duration::seconds(150.0),
        }
    }

    /// Cap on the reported average wait, in minutes.
    pub fn max_wait_mins(self) -> usize {
        match self {
            Scenario::Before => 30,
            Scenario::After => 5,
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> anyhow::Result<Scenario> {
        match x {
            "before" => Ok(Scenario::Before),
            "after" => Ok(Scenario::After),
            _ => bail!("Bad scenario {}. Must be before|after", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_parsing() {
        assert_eq!("before".parse::<Scenario>().unwrap(), Scenario::Before);
        assert_eq!("after".parse::<Scenario>().unwrap(), Scenario::After);
        assert!("both".parse::<Scenario>().is_err());
    }

    #[test]
    fn peak_window_sits_inside_the_morning() {
        assert!(SIM_START_TIME < PEAK_START);
        assert!(PEAK_START < PEAK_TIME);
        assert!(PEAK_TIME < PEAK_END);
        assert!(PEAK_END < SIM_END_TIME);
    }
}
