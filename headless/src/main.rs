//! Runs the whole pipeline without a renderer: resolve routes, generate both scenario
//! populations, print congestion stats over the morning, and optionally dump everything a
//! renderer needs as JSON.

#[macro_use]
extern crate log;

use anyhow::Result;
use structopt::StructOpt;

use dropoff::{
    compute_stats, Directions, RouteBundle, Scenario, Session, Site, TripSet, SIM_END_TIME,
    SIM_START_TIME,
};
use geom::Duration;

#[derive(StructOpt)]
#[structopt(
    name = "headless",
    about = "Generates school drop-off traffic populations and prints congestion stats."
)]
struct Flags {
    /// Mapbox access token. Omit to run offline, with straight-line fallback routes.
    #[structopt(long)]
    access_token: Option<String>,
    /// How many vehicles to simulate per scenario
    #[structopt(long, default_value = "400")]
    num_vehicles: usize,
    /// Seed for the trip generator
    #[structopt(long, default_value = "42")]
    rng_seed: u8,
    /// Write the site and both trip populations as JSON here, for an external renderer
    #[structopt(long)]
    dump: Option<String>,
}

/// Everything the render side consumes, in one file.
#[derive(serde::Serialize)]
struct Dump<'a> {
    site: &'a Site,
    before: &'a TripSet,
    after: &'a TripSet,
}

#[tokio::main]
async fn main() -> Result<()> {
    let flags = Flags::from_args();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let site = Site::gems_jumeirah();
    site.validate()?;

    let routes = if flags.access_token.is_some() {
        let client = Directions::new(flags.access_token.clone());
        RouteBundle::resolve_all(&client, &site).await
    } else {
        info!("No access token; using straight-line fallback routes");
        RouteBundle::offline(&site)
    };

    let session = Session::new(site, routes, flags.num_vehicles, flags.rng_seed)?;

    for scenario in [Scenario::Before, Scenario::After] {
        let population = session.population(scenario);
        info!(
            "{:?}: {} trips, {} vehicles skipped",
            scenario,
            population.trips.len(),
            population.skipped
        );

        let mut now = SIM_START_TIME;
        while now <= SIM_END_TIME {
            let stats = compute_stats(&population.trips, now, scenario);
            println!(
                "{:?} at {}: {} on road, {} queuing, {} min wait, {}% congestion, {} done",
                scenario,
                now.ampm_tostring(),
                stats.vehicles_on_road,
                stats.queue_at_destination,
                stats.avg_wait_mins,
                stats.congestion_percent,
                stats.completed_trips
            );
            now = now + Duration::minutes(15);
        }
    }

    if let Some(path) = flags.dump {
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer(
            file,
            &Dump {
                site: &session.site,
                before: session.population(Scenario::Before),
                after: session.population(Scenario::After),
            },
        )?;
        info!("Wrote {}", path);
    }

    Ok(())
}
