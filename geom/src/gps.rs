use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Distance;

/// A fixed degrees-to-meters scale. Exact at the equator, and close enough at the scale of
/// one neighborhood anywhere else; routes that need real distances come from the directions
/// provider.
const METERS_PER_DEGREE: f64 = 111_000.0;

// longitude is x, latitude is y
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    /// A crude planar approximation of the distance to another point, using the fixed
    /// degrees-to-meters scale.
    pub fn approx_dist_meters(self, other: LonLat) -> Distance {
        let dx = other.longitude - self.longitude;
        let dy = other.latitude - self.latitude;
        Distance::meters((dx * dx + dy * dy).sqrt() * METERS_PER_DEGREE)
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}
