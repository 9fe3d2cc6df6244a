use serde::Serialize;

use geom::{Duration, Time};

use crate::trips::Trip;
use crate::Scenario;

/// Aggregate congestion metrics at one instant, derived from the trip population alone.
/// Every field is well-defined for an empty population or a query time outside all trip
/// windows -- everything reads zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Trips whose window contains the query instant.
    pub vehicles_on_road: usize,
    /// On-road vehicles in the last fifth of their trip -- near the destination, probably
    /// crawling in the drop-off queue.
    pub queue_at_destination: usize,
    /// Minutes beyond the free-flow baseline, averaged over vehicles currently on the
    /// road and capped per scenario.
    pub avg_wait_mins: usize,
    /// On-road vehicles as a share of the scenario's road capacity, capped at 100.
    pub congestion_percent: usize,
    pub completed_trips: usize,
}

impl Stats {
    pub fn zero() -> Stats {
        Stats {
            vehicles_on_road: 0,
            queue_at_destination: 0,
            avg_wait_mins: 0,
            congestion_percent: 0,
            completed_trips: 0,
        }
    }
}

/// Single pass over the population. `now` can be anything non-negative, including values
/// past the end of the simulated morning.
pub fn compute_stats(trips: &[Trip], now: Time, scenario: Scenario) -> Stats {
    let mut vehicles_on_road = 0;
    let mut queue_at_destination = 0;
    let mut completed_trips = 0;
    let mut total_trip_time = Duration::ZERO;
    let mut total_baseline = Duration::ZERO;

    for trip in trips {
        let start = trip.start();
        let end = trip.end();

        if now >= start && now <= end {
            vehicles_on_road += 1;

            // A zero-length window counts as on-road but can't be queuing
            if end > start && (now - start) / (end - start) > 0.8 {
                queue_at_destination += 1;
            }

            total_trip_time += end - start;
            total_baseline += scenario.freeflow_baseline();
        }

        if end < now {
            completed_trips += 1;
        }
    }

    let avg_wait_mins = if vehicles_on_road == 0 {
        0
    } else {
        let n = vehicles_on_road as f64;
        let excess = (total_trip_time - total_baseline) / n;
        excess.round_minutes().min(scenario.max_wait_mins())
    };

    let congestion_percent = (100.0 * (vehicles_on_road as f64)
        / (scenario.road_capacity() as f64))
        .round()
        .min(100.0) as usize;

    Stats {
        vehicles_on_road,
        queue_at_destination,
        avg_wait_mins,
        congestion_percent,
        completed_trips,
    }
}

#[cfg(test)]
mod tests {
    use geom::LonLat;

    use super::*;
    use crate::trips::make_timestamps;

    fn trip(id: &str, start: f64, duration: f64) -> Trip {
        let path = vec![LonLat::new(0.0, 0.0), LonLat::new(0.01, 0.0)];
        Trip {
            id: id.to_string(),
            timestamps: make_timestamps(
                &path,
                Time::seconds_since_epoch(start),
                Duration::seconds(duration),
            ),
            path,
            color: [0, 0, 0],
            is_shuttle: false,
        }
    }

    #[test]
    fn empty_population_is_all_zeros() {
        let stats = compute_stats(&[], Time::seconds_since_epoch(2700.0), Scenario::Before);
        assert_eq!(stats, Stats::zero());
    }

    #[test]
    fn now_outside_all_windows() {
        let trips = vec![trip("a", 1000.0, 300.0), trip("b", 2000.0, 300.0)];

        let before_all = compute_stats(&trips, Time::seconds_since_epoch(500.0), Scenario::Before);
        assert_eq!(before_all.vehicles_on_road, 0);
        assert_eq!(before_all.completed_trips, 0);
        assert_eq!(before_all.avg_wait_mins, 0);
        assert_eq!(before_all.congestion_percent, 0);

        let after_all = compute_stats(&trips, Time::seconds_since_epoch(5000.0), Scenario::Before);
        assert_eq!(after_all.vehicles_on_road, 0);
        assert_eq!(after_all.completed_trips, 2);
    }

    #[test]
    fn on_road_window_is_inclusive_and_completion_strict() {
        let trips = vec![trip("a", 1000.0, 300.0)];

        for t in [1000.0, 1300.0] {
            let stats = compute_stats(&trips, Time::seconds_since_epoch(t), Scenario::Before);
            assert_eq!(stats.vehicles_on_road, 1);
            assert_eq!(stats.completed_trips, 0);
        }
        let stats = compute_stats(&trips, Time::seconds_since_epoch(1300.1), Scenario::Before);
        assert_eq!(stats.vehicles_on_road, 0);
        assert_eq!(stats.completed_trips, 1);
    }

    #[test]
    fn queue_heuristic_is_last_fifth() {
        let trips = vec![trip("a", 0.0, 1000.0)];

        let halfway = compute_stats(&trips, Time::seconds_since_epoch(500.0), Scenario::Before);
        assert_eq!(halfway.queue_at_destination, 0);

        // Progress exactly 0.8 doesn't count; strictly past it does
        let boundary = compute_stats(&trips, Time::seconds_since_epoch(800.0), Scenario::Before);
        assert_eq!(boundary.queue_at_destination, 0);

        let queuing = compute_stats(&trips, Time::seconds_since_epoch(900.0), Scenario::Before);
        assert_eq!(queuing.queue_at_destination, 1);
        assert_eq!(queuing.vehicles_on_road, 1);
    }

    #[test]
    fn wait_time_measured_against_baseline_and_clamped() {
        // 10 minutes on the road vs a 3 minute baseline: 7 minutes of excess
        let trips = vec![trip("a", 0.0, 600.0)];
        let stats = compute_stats(&trips, Time::seconds_since_epoch(100.0), Scenario::Before);
        assert_eq!(stats.avg_wait_mins, 7);

        // Same trip in the after scenario: 600s - 150s baseline = 7.5 min, capped at 5
        let stats = compute_stats(&trips, Time::seconds_since_epoch(100.0), Scenario::After);
        assert_eq!(stats.avg_wait_mins, 5);

        // Faster than baseline clamps to zero, not negative
        let quick = vec![trip("b", 0.0, 60.0)];
        let stats = compute_stats(&quick, Time::seconds_since_epoch(30.0), Scenario::Before);
        assert_eq!(stats.avg_wait_mins, 0);
    }

    #[test]
    fn congestion_relative_to_scenario_capacity() {
        let trips: Vec<Trip> = (0..60)
            .map(|i| trip(&format!("t{}", i), 0.0, 1000.0))
            .collect();
        let now = Time::seconds_since_epoch(500.0);

        // 60 vehicles / 100 capacity before, / 300 capacity after
        assert_eq!(
            compute_stats(&trips, now, Scenario::Before).congestion_percent,
            60
        );
        assert_eq!(
            compute_stats(&trips, now, Scenario::After).congestion_percent,
            20
        );

        // Saturation caps at 100
        let many: Vec<Trip> = (0..250)
            .map(|i| trip(&format!("t{}", i), 0.0, 1000.0))
            .collect();
        assert_eq!(
            compute_stats(&many, now, Scenario::Before).congestion_percent,
            100
        );
    }
}
