//! The bare minimum of typed units for the drop-off traffic demo: GPS points and
//! distance/duration/speed/time wrappers, so callers can't mix up meters and seconds.

mod distance;
mod duration;
mod gps;
mod speed;
mod time;

pub use crate::distance::Distance;
pub use crate::duration::Duration;
pub use crate::gps::LonLat;
pub use crate::speed::Speed;
pub use crate::time::Time;

/// Reduce the precision of an f64. This helps ensure everything is exactly equal before
/// and after serializing, and keeps unit arithmetic free of floating point noise.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

pub(crate) fn serialize_f64<S: serde::Serializer>(x: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(trim_f64(*x))
}

pub(crate) fn deserialize_f64<'de, D: serde::Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    use serde::Deserialize;
    f64::deserialize(d)
}
