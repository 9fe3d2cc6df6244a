use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use geom::{Distance, Duration, LonLat, Speed};

use crate::locations::Site;

/// If the directions provider can't answer, assume cars crawl along a straight line at
/// about 29 km/h.
const FALLBACK_SPEED: Speed = Speed::const_meters_per_second(8.0);

/// Pause between directions requests, to stay under the provider's rate limit.
const PACING: std::time::Duration = std::time::Duration::from_millis(80);

/// A resolved road route between two points: at least 2 ordered coordinates, following
/// one-way streets and turn restrictions when it came from the provider.
#[derive(Clone, Debug, Serialize)]
pub struct Route {
    pub path: Vec<LonLat>,
    pub duration: Duration,
    pub distance: Distance,
}

impl Route {
    /// A straight line at an assumed speed. Total over any pair of points; this is what
    /// every provider failure degrades to.
    pub fn fallback(from: LonLat, to: LonLat) -> Route {
        let distance = from.approx_dist_meters(to);
        Route {
            path: vec![from, to],
            duration: distance / FALLBACK_SPEED,
            distance,
        }
    }

    /// A route the trip generator can actually use. Anything shorter gets skipped, never
    /// panics.
    pub fn usable(&self) -> bool {
        self.path.len() >= 2
    }
}

/// Client for the Mapbox Directions API. Without an access token every query falls back to
/// a straight-line estimate, which keeps the whole pipeline usable offline.
pub struct Directions {
    client: reqwest::Client,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    geometry: ApiGeometry,
    /// Seconds
    duration: f64,
    /// Meters
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct ApiGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl Directions {
    pub fn new(access_token: Option<String>) -> Directions {
        Directions {
            client: reqwest::Client::new(),
            access_token,
        }
    }

    /// Resolves one route. Never fails -- any provider problem at all is recovered locally
    /// with `Route::fallback`.
    pub async fn route(&self, from: LonLat, to: LonLat) -> Route {
        match self.query(from, to).await {
            Ok(route) => route,
            Err(err) => {
                warn!("Directions from {} to {} failed ({}); using fallback", from, to, err);
                Route::fallback(from, to)
            }
        }
    }

    async fn query(&self, from: LonLat, to: LonLat) -> Result<Route> {
        let token = self
            .access_token
            .as_ref()
            .context("no access token configured")?;
        let url = format!(
            "https://api.mapbox.com/directions/v5/mapbox/driving/{},{};{},{}?geometries=geojson&access_token={}",
            from.longitude, from.latitude, to.longitude, to.latitude, token
        );
        let resp: ApiResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let best = resp.routes.into_iter().next().context("no routes returned")?;
        let path: Vec<LonLat> = best
            .geometry
            .coordinates
            .into_iter()
            .map(|pt| LonLat::new(pt[0], pt[1]))
            .collect();
        if path.len() < 2 {
            bail!("geometry only has {} points", path.len());
        }
        Ok(Route {
            path,
            duration: Duration::seconds(best.duration),
            distance: Distance::meters(best.distance),
        })
    }
}

/// Every route the session needs, resolved once during startup and read-only afterwards.
/// Maps are keyed by endpoint identity; nothing downstream re-fetches per trip.
#[derive(Clone, Debug, Serialize)]
pub struct RouteBundle {
    /// Keyed by origin id.
    pub to_school: BTreeMap<String, Route>,
    /// Keyed by exit id.
    pub from_school: BTreeMap<String, Route>,
    /// Keyed by origin id; the destination is that origin's assigned pod.
    pub to_pods: BTreeMap<String, Route>,
    /// Indexed like `Site::pods`; the destination is the pod's paired exit.
    pub from_pods: Vec<Route>,
    /// Indexed like `Site::pods`; pod to school, driven by the shuttles.
    pub shuttles: Vec<Route>,
}

impl RouteBundle {
    /// Resolves everything from the provider, pacing requests to stay friendly with its
    /// rate limits. Single failures degrade to straight lines; this never aborts, and
    /// abandoning it partway leaves nothing to clean up -- just call it again.
    pub async fn resolve_all(client: &Directions, site: &Site) -> RouteBundle {
        info!("Resolving routes for {}", site.school.name);

        let mut to_school = BTreeMap::new();
        for o in &site.origins {
            to_school.insert(o.id.clone(), client.route(o.pt, site.school.center).await);
            tokio::time::sleep(PACING).await;
        }

        let mut from_school = BTreeMap::new();
        for exit in &site.exits {
            from_school.insert(exit.id.clone(), client.route(site.school.center, exit.pt).await);
            tokio::time::sleep(PACING).await;
        }

        let mut to_pods = BTreeMap::new();
        for o in &site.origins {
            let pod = site.assigned_pod(&o.id);
            to_pods.insert(o.id.clone(), client.route(o.pt, pod.center).await);
            tokio::time::sleep(PACING).await;
        }

        let mut from_pods = Vec::new();
        for pod in &site.pods {
            // Not true nearest-neighbor; the fixed pairing by pod number keeps the demo
            // reproducible.
            let exit = &site.exits[pod.id % site.exits.len()];
            from_pods.push(client.route(pod.center, exit.pt).await);
            tokio::time::sleep(PACING).await;
        }

        let mut shuttles = Vec::new();
        for pod in &site.pods {
            shuttles.push(client.route(pod.center, site.school.center).await);
            tokio::time::sleep(PACING).await;
        }

        info!(
            "Resolved {} routes",
            to_school.len() + from_school.len() + to_pods.len() + from_pods.len() + shuttles.len()
        );
        RouteBundle {
            to_school,
            from_school,
            to_pods,
            from_pods,
            shuttles,
        }
    }

    /// The same bundle `resolve_all` would produce with no provider at all: every route a
    /// straight line. Synchronous, for tests and offline runs.
    pub fn offline(site: &Site) -> RouteBundle {
        RouteBundle {
            to_school: site
                .origins
                .iter()
                .map(|o| (o.id.clone(), Route::fallback(o.pt, site.school.center)))
                .collect(),
            from_school: site
                .exits
                .iter()
                .map(|exit| (exit.id.clone(), Route::fallback(site.school.center, exit.pt)))
                .collect(),
            to_pods: site
                .origins
                .iter()
                .map(|o| {
                    (
                        o.id.clone(),
                        Route::fallback(o.pt, site.assigned_pod(&o.id).center),
                    )
                })
                .collect(),
            from_pods: site
                .pods
                .iter()
                .map(|pod| {
                    Route::fallback(pod.center, site.exits[pod.id % site.exits.len()].pt)
                })
                .collect(),
            shuttles: site
                .pods
                .iter()
                .map(|pod| Route::fallback(pod.center, site.school.center))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_route() {
        let route = Route::fallback(LonLat::new(0.0, 0.0), LonLat::new(1.0, 0.0));
        assert_eq!(route.path.len(), 2);
        // One degree of planar separation at the fixed scale factor
        assert_eq!(route.distance, Distance::meters(111_000.0));
        // 111,000m at 8 m/s
        assert_eq!(route.duration, Duration::seconds(13_875.0));
        assert!(route.usable());
    }

    #[test]
    fn offline_bundle_covers_everything() {
        let site = Site::gems_jumeirah();
        let bundle = RouteBundle::offline(&site);
        for o in &site.origins {
            assert!(bundle.to_school[&o.id].usable());
            assert!(bundle.to_pods[&o.id].usable());
        }
        for exit in &site.exits {
            assert!(bundle.from_school[&exit.id].usable());
        }
        assert_eq!(bundle.from_pods.len(), site.pods.len());
        assert_eq!(bundle.shuttles.len(), site.pods.len());

        // The fixed pod/exit pairing: pod number modulo exit count
        assert_eq!(
            bundle.from_pods[0].path[1],
            site.exits[1].pt
        );
        assert_eq!(
            bundle.from_pods[3].path[1],
            site.exits[0].pt
        );
    }
}
