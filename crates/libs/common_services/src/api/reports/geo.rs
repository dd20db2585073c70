use crate::database::report::Coordinates;

/// Mean Earth radius (IUGG), in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Great-circle distance between two points in meters.
#[must_use]
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Latitude/longitude window that contains every point within a radius of a center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    /// `None` when the circle touches a pole or crosses the antimeridian.
    pub lng_range: Option<(f64, f64)>,
}

impl BoundingBox {
    #[must_use]
    pub fn around(center: Coordinates, radius_meters: f64) -> Self {
        let angular = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
        let min_lat = center.lat - angular;
        let max_lat = center.lat + angular;

        if min_lat <= -90.0 || max_lat >= 90.0 {
            return Self {
                min_lat: min_lat.max(-90.0),
                max_lat: max_lat.min(90.0),
                lng_range: None,
            };
        }

        let ratio = angular.to_radians().sin() / center.lat.to_radians().cos();
        let lng_delta = ratio.min(1.0).asin().to_degrees();
        let min_lng = center.lng - lng_delta;
        let max_lng = center.lng + lng_delta;
        let lng_range = (min_lng >= -180.0 && max_lng <= 180.0).then_some((min_lng, max_lng));

        Self {
            min_lat,
            max_lat,
            lng_range,
        }
    }

    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        let lat_ok = (self.min_lat..=self.max_lat).contains(&point.lat);
        let lng_ok = self
            .lng_range
            .is_none_or(|(min, max)| (min..=max).contains(&point.lng));
        lat_ok && lng_ok
    }
}
