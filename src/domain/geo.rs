use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Minutes added to the kitchen preparation time for every km of delivery.
pub const MINUTES_PER_KM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both parts are required for a usable position.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Some(Self::new(latitude?, longitude?))
    }

    /// Great circle distance in km.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// Whole minutes from order to door, truncated.
pub fn delivery_minutes(distance_km: f64, preparation_minutes: i32) -> i64 {
    (preparation_minutes as f64 + distance_km * MINUTES_PER_KM) as i64
}

/// Keep the entries located within `radius_km` of `origin`, closest first.
pub fn within_radius<T, F>(origin: &Coordinates, radius_km: f64, items: Vec<T>, locate: F) -> Vec<(T, f64)>
where
    F: Fn(&T) -> Option<Coordinates>,
{
    let mut nearby: Vec<(T, f64)> = items
        .into_iter()
        .filter_map(|item| {
            let distance = origin.distance_km(&locate(&item)?);
            (distance <= radius_km).then_some((item, distance))
        })
        .collect();
    nearby.sort_by(|a, b| a.1.total_cmp(&b.1));
    nearby
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const LONDON: Coordinates = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };
    const MANCHESTER: Coordinates = Coordinates {
        latitude: 53.4808,
        longitude: -2.2426,
    };

    #[test]
    fn haversine_distance() {
        let distance = LONDON.distance_km(&MANCHESTER);
        assert!((distance - 262.0).abs() < 2.0, "got {distance}");
        assert_eq!(LONDON.distance_km(&LONDON), 0.0);
    }

    #[test]
    fn coordinates_need_both_parts() {
        assert_eq!(Coordinates::from_parts(Some(0.0), Some(0.0)), Some(Coordinates::new(0.0, 0.0)));
        assert_eq!(Coordinates::from_parts(Some(51.5), None), None);
    }

    #[test]
    fn delivery_time_truncates() {
        assert_eq!(delivery_minutes(2.59, 30), 55);
        assert_eq!(delivery_minutes(0.0, 45), 45);
    }

    #[test]
    fn radius_filter_sorts_by_distance() {
        let near = (1, Some(Coordinates::new(51.5155, -0.1419)));
        let far = (2, Some(MANCHESTER));
        let nearer = (3, Some(Coordinates::new(51.5080, -0.1280)));
        let unknown = (4, None);

        let found = within_radius(&LONDON, 10.0, vec![near, far, nearer, unknown], |item| item.1);
        let ids: Vec<i32> = found.iter().map(|(item, _)| item.0).collect();

        assert_eq!(ids, vec![3, 1]);
    }
}
