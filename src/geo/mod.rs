use crate::models::coordinate::Coordinate;

/// Equatorial radius, the same sphere the datastore uses for radius queries.
const EARTH_RADIUS_KM: f64 = 6_378.1;

pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * central_angle
}

/// Inclusive point-in-radius test.
pub fn within_radius(center: &Coordinate, point: &Coordinate, radius_km: f64) -> bool {
    haversine_km(center, point) <= radius_km
}

/// Moves `origin` due north by `km`. Handy for placing fixtures at known distances.
pub fn offset_north(origin: &Coordinate, km: f64) -> Coordinate {
    let delta_lat = (km / EARTH_RADIUS_KM).to_degrees();
    Coordinate::new(origin.lng, origin.lat + delta_lat)
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, offset_north, within_radius};
    use crate::models::coordinate::Coordinate;

    #[test]
    fn zero_distance_for_same_point() {
        let p = Coordinate::new(101.6869, 3.1390);
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn kuala_lumpur_to_penang_is_around_290_km() {
        let kuala_lumpur = Coordinate::new(101.6869, 3.1390);
        let george_town = Coordinate::new(100.3327, 5.4141);
        let distance = haversine_km(&kuala_lumpur, &george_town);
        assert!((distance - 293.0).abs() < 10.0);
    }

    #[test]
    fn offset_north_lands_at_requested_distance() {
        let origin = Coordinate::new(101.6869, 3.1390);
        let moved = offset_north(&origin, 0.04);
        assert!((haversine_km(&origin, &moved) - 0.04).abs() < 1e-6);
        assert!(within_radius(&origin, &moved, 0.05));
        assert!(!within_radius(&origin, &moved, 0.03));
    }
}
