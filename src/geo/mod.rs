use rand::Rng;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Nudges a point by up to `max_offset / 2` degrees on each axis.
pub fn jitter<R: Rng + ?Sized>(point: &GeoPoint, max_offset: f64, rng: &mut R) -> GeoPoint {
    GeoPoint {
        lat: point.lat + (rng.gen_range(0.0..1.0) - 0.5) * max_offset,
        lng: point.lng + (rng.gen_range(0.0..1.0) - 0.5) * max_offset,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{haversine_km, jitter, GeoPoint};

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 28.6139,
            lng: 77.2090,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn delhi_to_mumbai_is_around_1150_km() {
        let delhi = GeoPoint {
            lat: 28.6139,
            lng: 77.2090,
        };
        let mumbai = GeoPoint {
            lat: 19.0760,
            lng: 72.8777,
        };
        let distance = haversine_km(&delhi, &mumbai);
        assert!((distance - 1150.0).abs() < 20.0);
    }

    #[test]
    fn jitter_stays_within_half_offset() {
        let origin = GeoPoint {
            lat: 40.7128,
            lng: -74.0060,
        };
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..1_000 {
            let moved = jitter(&origin, 0.001, &mut rng);
            assert!((moved.lat - origin.lat).abs() <= 0.0005);
            assert!((moved.lng - origin.lng).abs() <= 0.0005);
        }
    }
}
