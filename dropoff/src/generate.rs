use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rand_xorshift::XorShiftRng;
use serde::Serialize;

use geom::{Duration, Time};

use crate::locations::{Origin, Site};
use crate::routes::{Route, RouteBundle};
use crate::trips::{jitter_path, make_timestamps, Trip};
use crate::{PEAK_END, PEAK_START, PEAK_TIME, SIM_START_TIME};

/// How far interior path points get perturbed, in degrees -- about 11m at the equator.
const JITTER_AMOUNT: f64 = 0.0001;
/// Spread of the arrival bell curve around the peak.
const ARRIVAL_STDDEV: Duration = Duration::const_seconds(720.0);
/// Shuttles leave every pod this often during the peak window.
const SHUTTLE_HEADWAY: Duration = Duration::const_seconds(300.0);

const ARRIVAL_BLUE: [u8; 3] = [77, 166, 255];
const DEPARTURE_PURPLE: [u8; 3] = [150, 120, 255];
const POD_GREEN: [u8; 3] = [0, 212, 170];
const POD_DEPARTURE_GREEN: [u8; 3] = [100, 200, 150];
const DIRECT_BLUE: [u8; 3] = [100, 180, 255];
const SHUTTLE_YELLOW: [u8; 3] = [255, 200, 50];

/// A generated population for one scenario, plus a count of vehicles dropped because some
/// route they needed never resolved. The skips are a diagnostic, not an error; rendering
/// proceeds with whatever was generated.
#[derive(Clone, Debug, Serialize)]
pub struct TripSet {
    pub trips: Vec<Trip>,
    pub skipped: usize,
}

/// Bell curve of arrival times around the peak, clamped so nobody shows up before the
/// morning warms up or long after the peak dies down.
fn arrival_time(rng: &mut XorShiftRng) -> Time {
    let normal = Normal::new(
        PEAK_TIME.inner_seconds(),
        ARRIVAL_STDDEV.inner_seconds(),
    )
    .unwrap();
    let earliest = SIM_START_TIME.inner_seconds() + 120.0;
    let latest = PEAK_END.inner_seconds() + 300.0;
    Time::seconds_since_epoch(normal.sample(rng).max(earliest).min(latest))
}

/// Weighted pick over the origin table: first origin whose cumulative weight reaches the
/// draw. If the weights sum below 1 and the draw lands past the total, the first origin
/// wins -- that keeps the pick total without renormalizing anything.
fn pick_origin<'a>(site: &'a Site, rng: &mut XorShiftRng) -> &'a Origin {
    let draw: f64 = rng.gen_range(0.0..1.0);
    let mut cumulative = 0.0;
    for origin in &site.origins {
        cumulative += origin.weight;
        if draw <= cumulative {
            return origin;
        }
    }
    &site.origins[0]
}

fn is_peak(t: Time) -> bool {
    t >= PEAK_START && t <= PEAK_END
}

fn usable(route: Option<&Route>) -> Option<&Route> {
    route.filter(|r| r.usable())
}

/// The before scenario: every car drives to the school gate, queues, then leaves through a
/// random exit. Peak arrivals pay a heavy congestion multiplier and a long gate queue.
pub fn generate_before_trips(
    site: &Site,
    routes: &RouteBundle,
    num_vehicles: usize,
    rng: &mut XorShiftRng,
) -> TripSet {
    let mut trips = Vec::new();
    let mut skipped = 0;

    let exit_ids: Vec<&String> = routes
        .from_school
        .iter()
        .filter(|(_, r)| r.usable())
        .map(|(id, _)| id)
        .collect();
    if exit_ids.is_empty() {
        warn!("No usable exit routes; before-scenario cars will vanish after drop-off");
    }

    for i in 0..num_vehicles {
        let origin = pick_origin(site, rng);
        let arrival_route = match usable(routes.to_school.get(&origin.id)) {
            Some(r) => r,
            None => {
                warn!("No usable route from {} to school; skipping vehicle {}", origin.id, i);
                skipped += 1;
                continue;
            }
        };

        let start = arrival_time(rng);
        let peak = is_peak(start);

        let congestion = if peak {
            2.5 + rng.gen_range(0.0..1.0)
        } else {
            1.2
        };
        let arrival_duration = arrival_route.duration * congestion;
        let path = jitter_path(&arrival_route.path, JITTER_AMOUNT, rng);
        trips.push(Trip {
            id: format!("b-arr-{}", i),
            timestamps: make_timestamps(&path, start, arrival_duration),
            path,
            color: ARRIVAL_BLUE,
            is_shuttle: false,
        });

        if let Some(exit_id) = exit_ids.choose(rng) {
            let dep_route = &routes.from_school[*exit_id];
            let queue_time = if peak {
                Duration::seconds(600.0 + rng.gen_range(0.0..900.0))
            } else {
                Duration::seconds(60.0)
            };
            let dep_start = start + arrival_duration + queue_time;
            let dep_duration = dep_route.duration * if peak { 1.5 } else { 1.1 };
            let path = jitter_path(&dep_route.path, JITTER_AMOUNT, rng);
            trips.push(Trip {
                id: format!("b-dep-{}", i),
                timestamps: make_timestamps(&path, dep_start, dep_duration),
                path,
                color: DEPARTURE_PURPLE,
                is_shuttle: false,
            });
        }
    }

    info!(
        "Generated {} before-scenario trips ({} vehicles skipped)",
        trips.len(),
        skipped
    );
    TripSet { trips, skipped }
}

/// The after scenario: peak arrivals divert to their assigned pod (quick drop-off, then
/// straight out the pod's paired exit), off-peak cars still drive directly to school, and
/// shuttles run pod-to-school on a fixed headway through the peak.
pub fn generate_after_trips(
    site: &Site,
    routes: &RouteBundle,
    num_vehicles: usize,
    rng: &mut XorShiftRng,
) -> TripSet {
    let mut trips = Vec::new();
    let mut skipped = 0;

    for i in 0..num_vehicles {
        let origin = pick_origin(site, rng);
        let start = arrival_time(rng);

        if is_peak(start) {
            let pod_route = match usable(routes.to_pods.get(&origin.id)) {
                Some(r) => r,
                None => {
                    warn!("No usable route from {} to its pod; skipping vehicle {}", origin.id, i);
                    skipped += 1;
                    continue;
                }
            };

            let duration = pod_route.duration * (1.1 + rng.gen_range(0.0..0.2));
            let path = jitter_path(&pod_route.path, JITTER_AMOUNT, rng);
            trips.push(Trip {
                id: format!("a-pod-{}", i),
                timestamps: make_timestamps(&path, start, duration),
                path,
                color: POD_GREEN,
                is_shuttle: false,
            });

            // Drop-off at a pod is quick; the parent is back out 45s later, at the
            // route's free-flow duration.
            let pod_idx = site.assignments[&origin.id];
            if let Some(dep_route) = usable(routes.from_pods.get(pod_idx)) {
                let dep_start = start + duration + Duration::seconds(45.0);
                let path = jitter_path(&dep_route.path, JITTER_AMOUNT, rng);
                trips.push(Trip {
                    id: format!("a-dep-{}", i),
                    timestamps: make_timestamps(&path, dep_start, dep_route.duration),
                    path,
                    color: POD_DEPARTURE_GREEN,
                    is_shuttle: false,
                });
            }
        } else {
            // Off-peak there's no congestion to dodge; skip the pod.
            let school_route = match usable(routes.to_school.get(&origin.id)) {
                Some(r) => r,
                None => {
                    warn!("No usable route from {} to school; skipping vehicle {}", origin.id, i);
                    skipped += 1;
                    continue;
                }
            };

            let duration = school_route.duration * 1.1;
            let path = jitter_path(&school_route.path, JITTER_AMOUNT, rng);
            trips.push(Trip {
                id: format!("a-direct-{}", i),
                timestamps: make_timestamps(&path, start, duration),
                path,
                color: DIRECT_BLUE,
                is_shuttle: false,
            });
        }
    }

    // Fixed-schedule shuttles, one per pod per headway tick across the peak window. The
    // count never depends on num_vehicles. Shuttle paths aren't jittered; every run uses
    // the same lane.
    for (idx, shuttle) in routes.shuttles.iter().enumerate() {
        if !shuttle.usable() {
            warn!("No usable shuttle route for pod {}", idx);
            continue;
        }
        let mut t = PEAK_START;
        while t < PEAK_END + Duration::seconds(600.0) {
            trips.push(Trip {
                id: format!("shuttle-{}-{}", idx, t.inner_seconds() as usize),
                path: shuttle.path.clone(),
                timestamps: make_timestamps(&shuttle.path, t, shuttle.duration * 1.1),
                color: SHUTTLE_YELLOW,
                is_shuttle: true,
            });
            t = t + SHUTTLE_HEADWAY;
        }
    }

    info!(
        "Generated {} after-scenario trips ({} vehicles skipped)",
        trips.len(),
        skipped
    );
    TripSet { trips, skipped }
}
