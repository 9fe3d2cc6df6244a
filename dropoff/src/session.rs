use anyhow::Result;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use geom::{Duration, Time};

use crate::generate::{generate_after_trips, generate_before_trips, TripSet};
use crate::locations::Site;
use crate::routes::RouteBundle;
use crate::stats::{compute_stats, Stats};
use crate::{Scenario, SIM_END_TIME, SIM_START_TIME};

/// Real seconds are stretched by this much, so the whole morning plays out in minutes.
const DRAMATIZATION: f64 = 10.0;

/// The simulation clock. An external animation driver feeds in real elapsed time; the
/// clock scales it up and wraps back to the start of the morning at the end.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    now: Time,
}

impl Clock {
    pub fn new() -> Clock {
        Clock { now: SIM_START_TIME }
    }

    pub fn now(self) -> Time {
        self.now
    }

    /// Playback progress in [0, 1].
    pub fn percent_done(self) -> f64 {
        self.now.percent_of(SIM_END_TIME)
    }

    pub fn advance(&mut self, elapsed_real: Duration, speed_multiplier: f64) {
        let mut t =
            self.now.inner_seconds() + elapsed_real.inner_seconds() * speed_multiplier * DRAMATIZATION;
        if t >= SIM_END_TIME.inner_seconds() {
            t = 0.0;
        }
        self.now = Time::seconds_since_epoch(t);
    }
}

impl Default for Clock {
    fn default() -> Clock {
        Clock::new()
    }
}

/// One visualization session: the static geography, the resolved routes, both scenario
/// populations, and the clock. Renderers only ever read from this; regeneration swaps a
/// whole population at once, so nothing a renderer is iterating gets edited underneath it.
pub struct Session {
    pub site: Site,
    pub routes: RouteBundle,
    pub scenario: Scenario,
    pub clock: Clock,
    num_vehicles: usize,
    before: TripSet,
    after: TripSet,
}

impl Session {
    /// Validates the site, then generates both populations from the seed. Fails only on a
    /// malformed geography table; missing routes just shrink the populations.
    pub fn new(
        site: Site,
        routes: RouteBundle,
        num_vehicles: usize,
        rng_seed: u8,
    ) -> Result<Session> {
        site.validate()?;
        let mut rng = XorShiftRng::from_seed([rng_seed; 16]);
        let before = generate_before_trips(&site, &routes, num_vehicles, &mut rng);
        let after = generate_after_trips(&site, &routes, num_vehicles, &mut rng);
        Ok(Session {
            site,
            routes,
            scenario: Scenario::Before,
            clock: Clock::new(),
            num_vehicles,
            before,
            after,
        })
    }

    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
    }

    pub fn population(&self, scenario: Scenario) -> &TripSet {
        match scenario {
            Scenario::Before => &self.before,
            Scenario::After => &self.after,
        }
    }

    /// The population being rendered right now.
    pub fn active(&self) -> &TripSet {
        self.population(self.scenario)
    }

    /// Rebuilds one scenario's population from scratch and swaps it in wholesale. The
    /// other scenario is untouched.
    pub fn regenerate(&mut self, scenario: Scenario, rng: &mut XorShiftRng) {
        let fresh = match scenario {
            Scenario::Before => {
                generate_before_trips(&self.site, &self.routes, self.num_vehicles, rng)
            }
            Scenario::After => {
                generate_after_trips(&self.site, &self.routes, self.num_vehicles, rng)
            }
        };
        match scenario {
            Scenario::Before => self.before = fresh,
            Scenario::After => self.after = fresh,
        }
    }

    /// The congestion metrics for the active scenario at the clock's instant.
    pub fn stats_now(&self) -> Stats {
        compute_stats(&self.active().trips, self.clock.now(), self.scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_and_wraps() {
        let mut clock = Clock::new();
        assert_eq!(clock.now(), SIM_START_TIME);

        // 30 real seconds at 1x: 300 simulated seconds
        clock.advance(Duration::seconds(30.0), 1.0);
        assert_eq!(clock.now(), Time::seconds_since_epoch(300.0));

        // 2x speed doubles the jump
        clock.advance(Duration::seconds(30.0), 2.0);
        assert_eq!(clock.now(), Time::seconds_since_epoch(900.0));

        // Reaching the end of the morning wraps to the start
        clock.advance(Duration::seconds(450.0), 1.0);
        assert_eq!(clock.now(), SIM_START_TIME);
        assert_eq!(clock.percent_done(), 0.0);
    }

    #[test]
    fn session_lifecycle() {
        let site = Site::gems_jumeirah();
        let routes = RouteBundle::offline(&site);
        let mut session = Session::new(site, routes, 100, 42).unwrap();

        assert_eq!(session.scenario, Scenario::Before);
        assert!(!session.active().trips.is_empty());
        assert!(!session.population(Scenario::After).trips.is_empty());

        // Swapping scenarios swaps which population is read
        let after_len = session.population(Scenario::After).trips.len();
        session.set_scenario(Scenario::After);
        assert_eq!(session.active().trips.len(), after_len);

        // Regenerating one scenario leaves the other alone
        let before_len = session.population(Scenario::Before).trips.len();
        let mut rng = XorShiftRng::from_seed([7; 16]);
        session.regenerate(Scenario::After, &mut rng);
        assert_eq!(session.population(Scenario::Before).trips.len(), before_len);

        // Stats at the peak should see some traffic
        session.set_scenario(Scenario::Before);
        session.clock.advance(Duration::seconds(270.0), 1.0);
        assert_eq!(session.clock.now(), crate::PEAK_TIME);
        let stats = session.stats_now();
        assert!(stats.vehicles_on_road > 0);
    }

    #[test]
    fn session_rejects_bad_site() {
        let mut site = Site::gems_jumeirah();
        let routes = RouteBundle::offline(&site);
        site.assignments.clear();
        assert!(Session::new(site, routes, 10, 42).is_err());
    }
}
