use rand::Rng;
use rand_xorshift::XorShiftRng;
use serde::Serialize;

use geom::{Duration, LonLat, Time};

/// One simulated vehicle (or shuttle) movement. Immutable once generated; when the
/// scenario changes, the whole population is regenerated, never patched.
#[derive(Clone, Debug, Serialize)]
pub struct Trip {
    pub id: String,
    pub path: Vec<LonLat>,
    /// Same length as `path`, non-decreasing. `timestamps[0]` is the trip's start.
    pub timestamps: Vec<Time>,
    /// Purely a rendering tag.
    pub color: [u8; 3],
    pub is_shuttle: bool,
}

impl Trip {
    pub fn start(&self) -> Time {
        self.timestamps[0]
    }

    pub fn end(&self) -> Time {
        *self.timestamps.last().unwrap()
    }
}

/// Timestamps for uniform speed along the path: `timestamps[i] = start + duration * i /
/// (N-1)`. Resolved routes guarantee at least 2 points; anything shorter reaching here is a
/// bug upstream, so fail loudly.
pub fn make_timestamps(path: &[LonLat], start: Time, duration: Duration) -> Vec<Time> {
    if path.len() < 2 {
        panic!("make_timestamps needs >= 2 path points, got {}", path.len());
    }
    let n = (path.len() - 1) as f64;
    path.iter()
        .enumerate()
        .map(|(idx, _)| start + duration * ((idx as f64) / n))
        .collect()
}

/// Nudges interior points a little, so identical trips don't render as one overlapping
/// trail. The endpoints stay exactly on the real route. Returns a fresh path; the input is
/// untouched.
pub fn jitter_path(path: &[LonLat], amount: f64, rng: &mut XorShiftRng) -> Vec<LonLat> {
    path.iter()
        .enumerate()
        .map(|(idx, pt)| {
            if idx == 0 || idx == path.len() - 1 {
                *pt
            } else {
                LonLat::new(
                    pt.longitude + rng.gen_range(-amount / 2.0..amount / 2.0),
                    pt.latitude + rng.gen_range(-amount / 2.0..amount / 2.0),
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn uniform_timestamps() {
        let path = vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(0.5, 0.0),
            LonLat::new(1.0, 0.0),
        ];
        let timestamps =
            make_timestamps(&path, Time::seconds_since_epoch(1000.0), Duration::seconds(180.0));
        assert_eq!(
            timestamps,
            vec![
                Time::seconds_since_epoch(1000.0),
                Time::seconds_since_epoch(1090.0),
                Time::seconds_since_epoch(1180.0)
            ]
        );
    }

    #[test]
    #[should_panic(expected = "make_timestamps needs >= 2 path points")]
    fn degenerate_path_panics() {
        make_timestamps(
            &[LonLat::new(0.0, 0.0)],
            Time::START_OF_SIM,
            Duration::seconds(10.0),
        );
    }

    #[test]
    fn jitter_preserves_endpoints_and_length() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        let path: Vec<LonLat> = (0..10).map(|i| LonLat::new(55.0 + (i as f64) * 0.001, 25.0)).collect();
        let jittered = jitter_path(&path, 0.0001, &mut rng);

        assert_eq!(jittered.len(), path.len());
        assert_eq!(jittered[0], path[0]);
        assert_eq!(*jittered.last().unwrap(), *path.last().unwrap());
        for (orig, new) in path.iter().zip(jittered.iter()).skip(1).take(8) {
            assert!((orig.longitude - new.longitude).abs() <= 0.00005);
            assert!((orig.latitude - new.latitude).abs() <= 0.00005);
        }
        // With 16 interior coordinate draws, at least one should actually move
        assert!(path
            .iter()
            .zip(jittered.iter())
            .any(|(orig, new)| orig != new));
    }
}
