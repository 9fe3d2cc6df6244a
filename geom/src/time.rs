use std::{cmp, fmt, ops};

use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64, trim_f64, Duration};

/// When the simulation clock starts, on a 24-hour dial. School mornings begin at 7:00 AM.
const EPOCH_HOUR: usize = 7;

/// In seconds since the simulation epoch (7:00 AM). Can't be negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")] f64,
);

// By construction, Time is a finite f64 with trimmed precision.
impl Eq for Time {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Time {
    fn cmp(&self, other: &Time) -> cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Time {
    pub const START_OF_SIM: Time = Time(0.0);

    pub fn seconds_since_epoch(value: f64) -> Time {
        if !value.is_finite() || value < 0.0 {
            panic!("Bad Time {}", value);
        }

        Time(trim_f64(value))
    }

    // TODO Can't panic inside a const fn, seemingly. Don't pass in anything bad!
    pub const fn const_seconds(value: f64) -> Time {
        Time(value)
    }

    pub fn inner_seconds(self) -> f64 {
        self.0
    }

    // (hour on the 24-hour dial, minutes past that hour)
    fn get_parts(self) -> (usize, usize) {
        let total_minutes = (self.0 / 60.0).floor() as usize;
        (EPOCH_HOUR + total_minutes / 60, total_minutes % 60)
    }

    /// The wall clock as people read it, like "7:45 AM".
    pub fn ampm_tostring(self) -> String {
        let (hours, minutes) = self.get_parts();
        let suffix = if hours % 24 < 12 { "AM" } else { "PM" };
        let display_hours = match hours % 12 {
            0 => 12,
            x => x,
        };
        format!("{}:{:02} {}", display_hours, minutes, suffix)
    }

    /// How far along this time is towards `end`, clamped to [0, 1]. Used for playback
    /// progress bars.
    pub fn percent_of(self, end: Time) -> f64 {
        if end == Time::START_OF_SIM {
            return 0.0;
        }
        (self.0 / end.0).min(1.0)
    }
}

impl ops::Add<Duration> for Time {
    type Output = Time;

    fn add(self, other: Duration) -> Time {
        Time::seconds_since_epoch(self.0 + other.inner_seconds())
    }
}

impl ops::Sub for Time {
    type Output = Duration;

    fn sub(self, other: Time) -> Duration {
        Duration::seconds(self.0 - other.0)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ampm_tostring())
    }
}
