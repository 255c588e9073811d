//! Great-circle distance in spherical law of cosines form.
//!
//! The same formula is available in three shapes: a dialect-neutral
//! [`DistanceExpr`] node for query builders, a direct evaluation for
//! in-memory stores, and a SQL fragment for relational backends.

use geo::Point;
use proxima_core::models::{Coordinates, DistanceExpr, Units};

/// Mean earth radius in miles
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Mean earth radius in kilometers
pub const EARTH_RADIUS_KILOMETERS: f64 = 6371.0;

/// Sphere radius for a unit name.
///
/// `km` and `kilometers` give kilometers; any other name gives miles.
pub fn haversine_radius(units: &str) -> f64 {
    radius_for(Units::parse(units))
}

/// Sphere radius for parsed units
pub fn radius_for(units: Units) -> f64 {
    match units {
        Units::Kilometers => EARTH_RADIUS_KILOMETERS,
        Units::Miles => EARTH_RADIUS_MILES,
    }
}

/// Convert coordinates into a `geo` point (x = longitude, y = latitude)
pub fn to_point(coords: Coordinates) -> Point<f64> {
    Point::new(coords.lng, coords.lat)
}

/// Builds and evaluates distance expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineCalculator;

impl HaversineCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Distance expression from `center`, in `units`
    pub fn expression(&self, center: Coordinates, units: Units) -> DistanceExpr {
        DistanceExpr {
            center,
            units,
            radius: radius_for(units),
        }
    }

    /// Distance between two points in `units`
    pub fn distance(&self, center: Coordinates, point: Coordinates, units: Units) -> f64 {
        central_angle(to_point(center), to_point(point)) * radius_for(units)
    }

    /// Evaluate an expression against one record's coordinates
    pub fn evaluate(&self, expr: &DistanceExpr, point: Coordinates) -> f64 {
        central_angle(to_point(expr.center), to_point(point)) * expr.radius
    }

    /// Render an expression as SQL over the given latitude and longitude columns.
    ///
    /// The cosine sum is clamped to [-1, 1] so rounding never pushes `acos`
    /// out of its domain.
    pub fn sql(&self, expr: &DistanceExpr, lat_column: &str, lng_column: &str) -> String {
        let lat = expr.center.lat;
        let lng = expr.center.lng;
        format!(
            "({radius} * acos(LEAST(1, GREATEST(-1, \
             cos(radians({lat})) * cos(radians({lat_column})) * \
             cos(radians({lng_column}) - radians({lng})) + \
             sin(radians({lat})) * sin(radians({lat_column}))))))",
            radius = expr.radius,
        )
    }
}

/// Angle between two points on the unit sphere, in radians
fn central_angle(a: Point<f64>, b: Point<f64>) -> f64 {
    let (lat1, lng1) = (a.y().to_radians(), a.x().to_radians());
    let (lat2, lng2) = (b.y().to_radians(), b.x().to_radians());

    let cosine = lat1.cos() * lat2.cos() * (lng2 - lng1).cos() + lat1.sin() * lat2.sin();
    cosine.clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Haversine};
    use proptest::prelude::*;

    const AUSTIN: Coordinates = Coordinates::new(30.2672, -97.7431);
    const DALLAS: Coordinates = Coordinates::new(32.7767, -96.7970);

    #[test]
    fn test_radius_by_unit_name() {
        assert_eq!(haversine_radius("km"), 6371.0);
        assert_eq!(haversine_radius("kilometers"), 6371.0);
        assert_eq!(haversine_radius("mi"), 3959.0);
        assert_eq!(haversine_radius("miles"), 3959.0);
        assert_eq!(haversine_radius("parsecs"), 3959.0);
        assert_eq!(haversine_radius(""), 3959.0);
    }

    #[test]
    fn test_austin_to_dallas() {
        let calc = HaversineCalculator::new();
        let miles = calc.distance(AUSTIN, DALLAS, Units::Miles);
        let km = calc.distance(AUSTIN, DALLAS, Units::Kilometers);

        assert!((180.0..190.0).contains(&miles), "got {} mi", miles);
        assert!((290.0..305.0).contains(&km), "got {} km", km);
    }

    #[test]
    fn test_agrees_with_geo_haversine() {
        let calc = HaversineCalculator::new();
        let ours = calc.distance(AUSTIN, DALLAS, Units::Kilometers) * 1000.0;
        let reference = Haversine.distance(to_point(AUSTIN), to_point(DALLAS));

        assert!((ours - reference).abs() / reference < 1e-3);
    }

    #[test]
    fn test_evaluate_matches_distance() {
        let calc = HaversineCalculator::new();
        let expr = calc.expression(AUSTIN, Units::Kilometers);

        assert_eq!(expr.radius, 6371.0);
        assert_eq!(calc.evaluate(&expr, DALLAS), calc.distance(AUSTIN, DALLAS, Units::Kilometers));
    }

    #[test]
    fn test_antipodes_do_not_produce_nan() {
        let calc = HaversineCalculator::new();
        let d = calc.distance(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0), Units::Miles);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 1e-6);
    }

    #[test]
    fn test_sql_fragment() {
        let calc = HaversineCalculator::new();
        let expr = calc.expression(Coordinates::new(30.5, -97.25), Units::Miles);
        let sql = calc.sql(&expr, "lat", "lng");

        assert!(sql.starts_with("(3959 * acos(LEAST(1, GREATEST(-1, "));
        assert!(sql.contains("cos(radians(30.5)) * cos(radians(lat))"));
        assert!(sql.contains("cos(radians(lng) - radians(-97.25))"));
        assert!(sql.contains("sin(radians(30.5)) * sin(radians(lat))"));
        assert_eq!(sql.matches('(').count(), sql.matches(')').count());
    }

    proptest! {
        #[test]
        fn prop_self_distance_is_zero(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
            let calc = HaversineCalculator::new();
            let point = Coordinates::new(lat, lng);
            let d = calc.distance(point, point, Units::Kilometers);
            prop_assert!(d.abs() < 1e-3, "self distance {} km", d);
        }

        #[test]
        fn prop_distance_is_symmetric(
            lat1 in -90.0f64..=90.0, lng1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lng2 in -180.0f64..=180.0,
        ) {
            let calc = HaversineCalculator::new();
            let a = Coordinates::new(lat1, lng1);
            let b = Coordinates::new(lat2, lng2);
            let ab = calc.distance(a, b, Units::Miles);
            let ba = calc.distance(b, a, Units::Miles);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab >= 0.0);
        }
    }
}
