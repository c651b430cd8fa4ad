pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_RADIUS_KM: f64 = 25.0;

/// Great-circle distance between two coordinates.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("Latitude out of range: {}", latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("Longitude out of range: {}", longitude));
    }
    Ok(())
}

/// Coarse latitude/longitude window around a point, used to narrow the
/// store query before computing exact distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    /// `None` when the window would wrap the antimeridian or cover every longitude.
    pub lon_range: Option<(f64, f64)>,
}

impl BoundingBox {
    pub fn around(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        let angular = radius_km / EARTH_RADIUS_KM;
        let d_lat = angular.to_degrees();
        let (min_lat, max_lat) = (latitude - d_lat, latitude + d_lat);

        // A circle that reaches a pole covers every longitude
        let lon_range = if min_lat <= -90.0 || max_lat >= 90.0 {
            None
        } else {
            let d_lon = (angular.sin() / latitude.to_radians().cos()).asin().to_degrees();
            let (lo, hi) = (longitude - d_lon, longitude + d_lon);
            if lo < -180.0 || hi > 180.0 {
                None
            } else {
                Some((lo, hi))
            }
        };

        Self {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            lon_range,
        }
    }

    pub fn to_query(&self) -> String {
        let mut query = format!("latitude=gte.{}&latitude=lte.{}", self.min_lat, self.max_lat);
        if let Some((lo, hi)) = self.lon_range {
            query.push_str(&format!("&longitude=gte.{}&longitude=lte.{}", lo, hi));
        }
        query
    }
}
