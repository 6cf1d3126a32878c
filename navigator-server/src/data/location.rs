//! Geographic coordinates.

use geo::{Distance, Haversine, Point};
use serde::Serialize;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &Location) -> f64 {
        Haversine.distance(self.to_point(), other.to_point()) / 1000.0
    }

    /// Arithmetic mean of `locations`, or `None` when there are none.
    pub fn mean<'a>(locations: impl IntoIterator<Item = &'a Location>) -> Option<Location> {
        let (count, latitude, longitude) = locations
            .into_iter()
            .fold((0usize, 0.0, 0.0), |(n, lat, lon), loc| {
                (n + 1, lat + loc.latitude, lon + loc.longitude)
            });
        (count > 0).then(|| Location::new(latitude / count as f64, longitude / count as f64))
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Bit-exact key, so identical observations are stored once.
    pub(crate) fn key(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}
