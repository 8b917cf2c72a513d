//! Radius evaluator.
//!
//! Computes the geodesic distance from a search origin to every provider once
//! per query, keeps providers inside any of the requested radius bands, and
//! ranks them by distance.

use geo::{Distance, Geodesic};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::models::coordinate::METERS_PER_MILE;
use crate::models::{Coordinate, ProviderRecord, RadiusCircle};

/// Geodesic distance between two coordinates in miles (WGS-84 ellipsoid).
pub fn distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    Geodesic.distance(a.to_point(), b.to_point()) / METERS_PER_MILE
}

/// Round to two decimal places, the precision distances are stored and ranked at.
pub fn round_distance(miles: f64) -> f64 {
    (miles * 100.0).round() / 100.0
}

/// Positive, finite radius thresholds in miles, in query order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds(Vec<f64>);

impl Thresholds {
    /// Keep only usable thresholds; anything non-finite or not positive is dropped.
    pub fn new<I: IntoIterator<Item = f64>>(miles: I) -> Self {
        Self(
            miles
                .into_iter()
                .filter(|r| r.is_finite() && *r > 0.0)
                .collect(),
        )
    }

    /// Parse loosely typed input, dropping entries that are not numbers.
    pub fn parse<'a, I: IntoIterator<Item = &'a str>>(raw: I) -> Self {
        Self::new(raw.into_iter().filter_map(|s| s.trim().parse::<f64>().ok()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Outer band, reported in search logs.
    pub fn max(&self) -> Option<f64> {
        self.0.iter().copied().reduce(f64::max)
    }

    /// True when `distance` falls inside at least one band.
    pub fn contains(&self, distance: f64) -> bool {
        self.0.iter().any(|r| distance <= *r)
    }
}

/// A provider paired with its distance from the origin, if one was computed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RankedProvider<'a> {
    #[serde(flatten)]
    pub record: &'a ProviderRecord,
    #[serde(rename = "Distance")]
    pub distance: Option<f64>,
}

/// Output of one radius evaluation.
#[derive(Debug, Clone, Default)]
pub struct RadiusEvaluation<'a> {
    /// Members sorted by ascending distance (stable for ties)
    pub ranked: Vec<RankedProvider<'a>>,
    /// One circle per threshold, in threshold order
    pub circles: Vec<RadiusCircle>,
}

/// Evaluate radius membership for `records` around `origin`.
///
/// With no origin or no thresholds this is a pass-through: every record is
/// kept in input order without a distance and no circles are produced.
pub fn evaluate<'a>(
    records: &[&'a ProviderRecord],
    origin: Option<Coordinate>,
    thresholds: &Thresholds,
) -> RadiusEvaluation<'a> {
    let origin = match origin {
        Some(origin) if !thresholds.is_empty() => origin,
        _ => {
            return RadiusEvaluation {
                ranked: records
                    .iter()
                    .map(|&record| RankedProvider {
                        record,
                        distance: None,
                    })
                    .collect(),
                circles: Vec::new(),
            };
        }
    };

    // collect() keeps input order, so ties below stay in dataset order.
    let mut ranked: Vec<RankedProvider<'a>> = records
        .par_iter()
        .filter_map(|&record| {
            let miles = distance_miles(origin, record.location());
            // Membership on the exact distance; the rounded one is only stored and ranked
            thresholds.contains(miles).then(|| RankedProvider {
                record,
                distance: Some(round_distance(miles)),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        let a = a.distance.unwrap_or(f64::INFINITY);
        let b = b.distance.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });

    let circles = thresholds
        .as_slice()
        .iter()
        .enumerate()
        .map(|(band, miles)| RadiusCircle::from_miles(origin, *miles, band))
        .collect();

    debug!(
        "Radius evaluation at ({}, {}) with {} bands: {} of {} providers inside",
        origin.lat,
        origin.lon,
        thresholds.len(),
        ranked.len(),
        records.len()
    );

    RadiusEvaluation { ranked, circles }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(id: &str, lat: f64, lon: f64) -> ProviderRecord {
        ProviderRecord {
            provider_id: id.into(),
            vendor_id: String::new(),
            pcn_id: String::new(),
            provider_name: format!("Provider {id}"),
            address: String::new(),
            county: "Dallas".into(),
            market: String::new(),
            specialty: String::new(),
            city: String::new(),
            language: String::new(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn ids(eval: &RadiusEvaluation<'_>) -> Vec<String> {
        eval.ranked
            .iter()
            .map(|r| r.record.provider_id.clone())
            .collect()
    }

    #[test]
    fn test_distance_reference_values() {
        // 0.1 degree of longitude at 40N is about 8.54 km
        let d = distance_miles(Coordinate::new(40.0, -75.0), Coordinate::new(40.0, -75.1));
        assert!((d - 5.306).abs() < 0.01, "got {d}");

        // One degree of latitude at the equator: 110574.4 m
        let d = distance_miles(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d * METERS_PER_MILE - 110_574.4).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_distance_symmetry() {
        let a = Coordinate::new(32.7767, -96.7970);
        let b = Coordinate::new(32.7555, -97.3308);
        let ab = distance_miles(a, b);
        let ba = distance_miles(b, a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(distance_miles(a, a).abs() < 1e-9);
    }

    #[test]
    fn test_single_band_inclusion() {
        let p = provider("P", 40.0, -75.0);
        let records = vec![&p];
        let origin = Some(Coordinate::new(40.0, -75.1));

        let inside = evaluate(&records, origin, &Thresholds::new([10.0]));
        assert_eq!(ids(&inside), vec!["P"]);
        let distance = inside.ranked[0].distance.unwrap();
        assert!((distance - 5.31).abs() < 0.02, "got {distance}");

        let outside = evaluate(&records, origin, &Thresholds::new([5.0]));
        assert!(outside.ranked.is_empty());
        assert_eq!(outside.circles.len(), 1);
    }

    #[test]
    fn test_union_of_bands_and_circles() {
        // About 6.9 miles north of the origin
        let p = provider("P", 40.1, -75.0);
        let records = vec![&p];
        let origin = Coordinate::new(40.0, -75.0);

        let eval = evaluate(&records, Some(origin), &Thresholds::new([5.0, 10.0]));
        assert_eq!(ids(&eval), vec!["P"]);
        let d = eval.ranked[0].distance.unwrap();
        assert!(d > 5.0 && d < 10.0);

        assert_eq!(eval.circles.len(), 2);
        assert_eq!(eval.circles[0].center, origin);
        assert!((eval.circles[0].radius_meters - 5.0 * 1609.34).abs() < 1e-9);
        assert!((eval.circles[1].radius_meters - 10.0 * 1609.34).abs() < 1e-9);
        assert_eq!(eval.circles[1].band, 1);
    }

    #[test]
    fn test_monotonic_in_radius() {
        let data: Vec<ProviderRecord> = (0..40)
            .map(|i| provider(&i.to_string(), 40.0 + i as f64 * 0.02, -75.0))
            .collect();
        let records: Vec<&ProviderRecord> = data.iter().collect();
        let origin = Some(Coordinate::new(40.0, -75.0));

        let mut previous: Vec<String> = Vec::new();
        for r in [1.0, 2.5, 5.0, 10.0, 25.0, 60.0] {
            let members = ids(&evaluate(&records, origin, &Thresholds::new([r])));
            assert!(previous.iter().all(|id| members.contains(id)));
            previous = members;
        }
    }

    #[test]
    fn test_sorted_ascending_with_stable_ties() {
        let far = provider("far", 40.05, -75.0);
        let tie_a = provider("tie_a", 40.01, -75.0);
        let near = provider("near", 40.001, -75.0);
        let tie_b = provider("tie_b", 40.01, -75.0);
        let records = vec![&far, &tie_a, &near, &tie_b];

        let eval = evaluate(
            &records,
            Some(Coordinate::new(40.0, -75.0)),
            &Thresholds::new([50.0]),
        );
        assert_eq!(ids(&eval), vec!["near", "tie_a", "tie_b", "far"]);
        let distances: Vec<f64> = eval.ranked.iter().filter_map(|r| r.distance).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pass_through_without_origin_or_thresholds() {
        let a = provider("a", 10.0, 10.0);
        let b = provider("b", -10.0, -10.0);
        let records = vec![&a, &b];

        let no_bands = evaluate(&records, Some(Coordinate::new(0.0, 0.0)), &Thresholds::default());
        assert_eq!(ids(&no_bands), vec!["a", "b"]);
        assert!(no_bands.ranked.iter().all(|r| r.distance.is_none()));
        assert!(no_bands.circles.is_empty());

        let no_origin = evaluate(&records, None, &Thresholds::new([1.0]));
        assert_eq!(ids(&no_origin), vec!["a", "b"]);
        assert!(no_origin.circles.is_empty());
    }

    #[test]
    fn test_thresholds_drop_invalid_values() {
        let t = Thresholds::parse(["5", " 10 ", "abc", "-3", "0", "NaN", "inf", ""]);
        assert_eq!(t.as_slice(), &[5.0, 10.0]);
        assert_eq!(t.max(), Some(10.0));
        assert!(t.contains(10.0));
        assert!(!t.contains(10.01));
    }

    #[test]
    fn test_membership_uses_exact_distance() {
        let origin = Coordinate::new(40.0, -75.0);
        // Bisect due north for a point 10.003 mi out, which rounds to 10.0
        let (mut lo, mut hi) = (40.0, 40.5);
        for _ in 0..100 {
            let mid = (lo + hi) / 2.0;
            if distance_miles(origin, Coordinate::new(mid, -75.0)) < 10.003 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let p = provider("edge", lo, -75.0);
        let miles = distance_miles(origin, p.location());
        assert!(miles > 10.0 && round_distance(miles) == 10.0, "got {miles}");

        let eval = evaluate(&[&p], Some(origin), &Thresholds::new([10.0]));
        assert!(eval.ranked.is_empty(), "{miles} mi admitted to a 10 mi band");

        let wider = evaluate(&[&p], Some(origin), &Thresholds::new([10.0, 10.01]));
        assert_eq!(ids(&wider), vec!["edge"]);
        assert_eq!(wider.ranked[0].distance, Some(10.0));
    }

    #[test]
    fn test_round_distance() {
        assert_eq!(round_distance(5.306), 5.31);
        assert_eq!(round_distance(5.304), 5.3);
        assert_eq!(round_distance(0.0), 0.0);
    }
}
