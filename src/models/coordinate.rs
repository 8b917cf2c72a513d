//! Geographic primitives shared by the geocoder and the radius evaluator.

use serde::{Deserialize, Serialize};

/// Meters in one statute mile, as used for circle geometry.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Geographic point (lat/lon) in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and within WGS-84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Convert to a `geo` point. Note that `geo` uses x = lon, y = lat.
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

/// A radius band rendered as a circle around the search origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusCircle {
    pub center: Coordinate,
    pub radius_meters: f64,
    /// Position of the threshold in the query, so the renderer can pick a color.
    pub band: usize,
}

impl RadiusCircle {
    pub fn from_miles(center: Coordinate, miles: f64, band: usize) -> Self {
        Self {
            center,
            radius_meters: miles * METERS_PER_MILE,
            band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(40.0, -75.0).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_point_axis_order() {
        let p = Coordinate::new(40.0, -75.0).to_point();
        assert_eq!(p.x(), -75.0);
        assert_eq!(p.y(), 40.0);
    }

    #[test]
    fn test_circle_from_miles() {
        let c = RadiusCircle::from_miles(Coordinate::new(1.0, 2.0), 5.0, 0);
        assert!((c.radius_meters - 8046.7).abs() < 1e-9);
        assert_eq!(c.band, 0);
    }
}
