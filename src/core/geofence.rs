use crate::model::location::Location;

/// Mean Earth radius in meters (spherical model).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two coordinate pairs, via the
/// Haversine formula. Symmetric; assumes range-validated inputs.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// The location nearest to the given point. Ties keep the first-encountered
/// candidate; `None` when the slice is empty.
pub fn find_nearest<'a>(lat: f64, lon: f64, locations: &'a [Location]) -> Option<&'a Location> {
    let mut best: Option<(&'a Location, f64)> = None;
    for location in locations {
        let distance = distance_meters(lat, lon, location.latitude, location.longitude);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((location, distance)),
        }
    }
    best.map(|(location, _)| location)
}

/// Radius compliance; a point exactly on the boundary counts as inside.
pub fn is_within_radius(lat: f64, lon: f64, location: &Location) -> bool {
    distance_meters(lat, lon, location.latitude, location.longitude) <= location.radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: u64, lat: f64, lon: f64, radius: f64) -> Location {
        Location {
            id,
            name: format!("loc-{id}"),
            address: String::new(),
            latitude: lat,
            longitude: lon,
            radius,
            is_active: true,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        for (lat, lon) in [(0.0, 0.0), (-6.2087634, 106.845599), (89.9, -179.9)] {
            assert_eq!(distance_meters(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let forward = distance_meters(-6.2087634, 106.845599, -6.1751107, 106.8650395);
        let backward = distance_meters(-6.1751107, 106.8650395, -6.2087634, 106.845599);
        assert_eq!(forward, backward);
    }

    #[test]
    fn one_millidegree_of_equator_is_about_111_meters() {
        let distance = distance_meters(0.0, 0.0, 0.0, 0.001);
        assert!((distance - 111.195).abs() < 0.1, "got {distance}");
    }

    #[test]
    fn boundary_distance_is_compliant() {
        let distance = distance_meters(0.0, 0.0005, 0.0, 0.0);
        let exact = location(1, 0.0, 0.0, distance);
        // distance == radius exactly: non-strict comparison keeps it inside
        assert!(is_within_radius(0.0, 0.0005, &exact));
    }

    #[test]
    fn outside_radius_is_not_compliant() {
        let office = location(1, 0.0, 0.0, 100.0);
        assert!(is_within_radius(0.0, 0.0, &office));
        assert!(is_within_radius(0.0, 0.0008, &office));
        assert!(!is_within_radius(0.0, 0.001, &office));
    }

    #[test]
    fn nearest_picks_minimum_distance() {
        let a = location(1, 0.0, 0.0, 100.0);
        let b = location(2, 0.0, 0.001, 100.0);
        let locations = [a, b];
        let nearest = find_nearest(0.0, 0.0, &locations).unwrap();
        assert_eq!(nearest.id, 1);
        assert_eq!(
            distance_meters(0.0, 0.0, nearest.latitude, nearest.longitude),
            0.0
        );
    }

    #[test]
    fn nearest_tie_keeps_first_encountered() {
        let a = location(1, 0.0, 0.001, 100.0);
        let b = location(2, 0.0, -0.001, 100.0);
        let locations = [a, b];
        let nearest = find_nearest(0.0, 0.0, &locations).unwrap();
        assert_eq!(nearest.id, 1);
    }

    #[test]
    fn nearest_of_empty_set_is_none() {
        assert!(find_nearest(0.0, 0.0, &[]).is_none());
    }
}
