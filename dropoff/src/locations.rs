use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::Serialize;

use geom::LonLat;

/// Where all the traffic is ultimately headed.
#[derive(Clone, Debug, Serialize)]
pub struct School {
    pub name: String,
    pub center: LonLat,
}

/// A satellite drop-off point a few hundred meters from the school gate, meant to diffuse
/// the queue away from it.
#[derive(Clone, Debug, Serialize)]
pub struct Pod {
    /// 1-based, matching the site plan's numbering. Also picks the pod's paired exit.
    pub id: usize,
    pub name: String,
    pub center: LonLat,
    pub color: [u8; 3],
}

/// Only used for grouping origins in legends; nothing branches on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OriginKind {
    Highway,
    Local,
    Resident,
}

/// A place where school traffic enters the neighborhood. The weight is a relative
/// likelihood; the full table's weights don't have to sum to exactly 1.
#[derive(Clone, Debug, Serialize)]
pub struct Origin {
    pub id: String,
    pub name: String,
    pub pt: LonLat,
    pub weight: f64,
    pub kind: OriginKind,
}

/// Where cars leave the neighborhood after drop-off.
#[derive(Clone, Debug, Serialize)]
pub struct ExitPoint {
    pub id: String,
    pub pt: LonLat,
}

/// Camera hints for the external renderer. Not used by any of the generation code.
#[derive(Clone, Debug, Serialize)]
pub struct MapView {
    pub center: LonLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

/// The static geography for one school: pods, weighted traffic origins, exits, and the
/// fixed origin-to-pod assignment. Defined at startup and never mutated.
#[derive(Clone, Debug, Serialize)]
pub struct Site {
    pub school: School,
    pub pods: Vec<Pod>,
    pub origins: Vec<Origin>,
    pub exits: Vec<ExitPoint>,
    /// Origin id -> index into `pods`. Total over `origins`; `validate` enforces it.
    pub assignments: BTreeMap<String, usize>,
    pub view: MapView,
}

const POD_TEAL: [u8; 3] = [0, 212, 170];

impl Site {
    /// The GEMS Jumeirah Primary School site in Dubai that this demo was built around.
    /// Coordinates are (longitude, latitude).
    pub fn gems_jumeirah() -> Site {
        let school = School {
            name: "GEMS Jumeirah Primary School".to_string(),
            center: LonLat::new(55.238788, 25.175912),
        };

        let pods = vec![
            pod(1, "Pod North", 55.2385, 25.1790),
            pod(2, "Pod East", 55.2420, 25.1760),
            pod(3, "Pod South", 55.2380, 25.1730),
            pod(4, "Pod West", 55.2355, 25.1755),
            pod(5, "Pod Northwest", 55.2360, 25.1780),
        ];

        // Highways carry ~70% of the load, local streets ~25%, residents inside the block
        // the last 5%.
        let origins = vec![
            origin(
                "szr_north",
                "Sheikh Zayed Road (North)",
                55.2550,
                25.1850,
                0.25,
                OriginKind::Highway,
            ),
            origin(
                "szr_south",
                "Sheikh Zayed Road (South)",
                55.2550,
                25.1680,
                0.20,
                OriginKind::Highway,
            ),
            origin(
                "alwasl_north",
                "Al Wasl Road (North)",
                55.2350,
                25.1880,
                0.15,
                OriginKind::Highway,
            ),
            origin(
                "alwasl_south",
                "Al Wasl Road (South)",
                55.2340,
                25.1680,
                0.10,
                OriginKind::Highway,
            ),
            origin(
                "local_east",
                "Local East",
                55.2480,
                25.1760,
                0.10,
                OriginKind::Local,
            ),
            origin(
                "local_west",
                "Local West",
                55.2300,
                25.1760,
                0.08,
                OriginKind::Local,
            ),
            origin(
                "local_north",
                "Local North",
                55.2390,
                25.1830,
                0.07,
                OriginKind::Local,
            ),
            origin(
                "resident",
                "Local Resident",
                55.2400,
                25.1780,
                0.05,
                OriginKind::Resident,
            ),
        ];

        let exits = vec![
            exit("exit_szr_north", 55.2560, 25.1870),
            exit("exit_szr_south", 55.2560, 25.1660),
            exit("exit_alwasl", 55.2330, 25.1700),
            exit("exit_local", 55.2450, 25.1800),
        ];

        // Each origin drops off at the pod matching its approach direction.
        let assignments: BTreeMap<String, usize> = vec![
            ("szr_north", 1),    // Pod East catches SZR north traffic
            ("szr_south", 2),    // Pod South
            ("alwasl_north", 0), // Pod North
            ("alwasl_south", 3), // Pod West
            ("local_east", 1),
            ("local_west", 3),
            ("local_north", 4), // Pod Northwest
            ("resident", 4),    // Pod Northwest is closest
        ]
        .into_iter()
        .map(|(id, pod)| (id.to_string(), pod))
        .collect();

        Site {
            view: MapView {
                center: school.center,
                zoom: 15.5,
                pitch: 45.0,
                bearing: -15.0,
            },
            school,
            pods,
            origins,
            exits,
            assignments,
        }
    }

    /// Catches geography mistakes at startup, not at first use during generation.
    pub fn validate(&self) -> Result<()> {
        if self.origins.is_empty() {
            bail!("Site {} has no traffic origins", self.school.name);
        }
        if self.pods.is_empty() {
            bail!("Site {} has no pods", self.school.name);
        }
        if self.exits.is_empty() {
            bail!("Site {} has no exits", self.school.name);
        }

        let mut seen: BTreeSet<&String> = BTreeSet::new();
        for origin in &self.origins {
            if !seen.insert(&origin.id) {
                bail!("Duplicate origin id {}", origin.id);
            }
            if !origin.weight.is_finite() || origin.weight < 0.0 {
                bail!("Origin {} has bad weight {}", origin.id, origin.weight);
            }
            match self.assignments.get(&origin.id) {
                Some(pod) if *pod >= self.pods.len() => {
                    bail!(
                        "Origin {} is assigned to pod {}, but there are only {} pods",
                        origin.id,
                        pod,
                        self.pods.len()
                    );
                }
                Some(_) => {}
                None => bail!("Origin {} has no pod assignment", origin.id),
            }
        }
        Ok(())
    }

    /// The pod this origin's traffic diverts to in the after scenario. Call `validate`
    /// first; this indexes directly.
    pub fn assigned_pod(&self, origin_id: &str) -> &Pod {
        &self.pods[self.assignments[origin_id]]
    }
}

fn pod(id: usize, name: &str, lon: f64, lat: f64) -> Pod {
    Pod {
        id,
        name: name.to_string(),
        center: LonLat::new(lon, lat),
        color: POD_TEAL,
    }
}

fn origin(id: &str, name: &str, lon: f64, lat: f64, weight: f64, kind: OriginKind) -> Origin {
    Origin {
        id: id.to_string(),
        name: name.to_string(),
        pt: LonLat::new(lon, lat),
        weight,
        kind,
    }
}

fn exit(id: &str, lon: f64, lat: f64) -> ExitPoint {
    ExitPoint {
        id: id.to_string(),
        pt: LonLat::new(lon, lat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gems_jumeirah_is_valid() {
        let site = Site::gems_jumeirah();
        assert!(site.validate().is_ok());
        assert_eq!(site.pods.len(), 5);
        assert_eq!(site.origins.len(), 8);
        assert_eq!(site.exits.len(), 4);

        let total: f64 = site.origins.iter().map(|o| o.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);

        assert_eq!(site.assigned_pod("szr_north").name, "Pod East");
    }

    #[test]
    fn validate_catches_missing_assignment() {
        let mut site = Site::gems_jumeirah();
        site.assignments.remove("resident");
        let err = site.validate().unwrap_err().to_string();
        assert!(err.contains("resident"), "unexpected error: {}", err);
    }

    #[test]
    fn validate_catches_out_of_range_assignment() {
        let mut site = Site::gems_jumeirah();
        site.assignments.insert("resident".to_string(), 99);
        assert!(site.validate().is_err());
    }
}
