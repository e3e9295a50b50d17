/// Static spatial index over monitored locations.
///
/// Coordinates are converted to radians and placed on the unit sphere; an
/// R-tree over those points answers "every location within an angular
/// radius" with one range query per flood event. Chord length is monotonic
/// in central angle, so the Euclidean query in 3-D returns exactly the
/// great-circle neighbourhood.

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::model::Coordinate;

/// Mean Earth radius used to convert surface distances to angles.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Slack added to the query radius so a location exactly on the boundary
/// survives floating-point rounding. About 6 mm on the ground.
const BOUNDARY_TOLERANCE_RAD: f64 = 1e-9;

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Converts a surface distance in kilometers to a central angle in radians.
pub fn radius_to_radians(radius_km: f64) -> f64 {
    radius_km / EARTH_RADIUS_KM
}

fn unit_vector(coord: Coordinate) -> [f64; 3] {
    let (lat, lon) = coord.to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Great-circle central angle between two coordinates, in radians
/// (haversine form).
pub fn angular_distance(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = a.to_radians();
    let (lat2, lon2) = b.to_radians();
    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Great-circle distance in kilometers.
pub fn great_circle_km(a: Coordinate, b: Coordinate) -> f64 {
    angular_distance(a, b) * EARTH_RADIUS_KM
}

/// R-tree over a fixed set of distinct coordinates, built once.
pub struct LocationIndex {
    locations: Vec<Coordinate>,
    tree: RTree<IndexedPoint>,
}

impl LocationIndex {
    /// Builds the index. Duplicate coordinates are indexed once.
    pub fn build<I: IntoIterator<Item = Coordinate>>(coords: I) -> Self {
        let mut locations: Vec<Coordinate> = coords.into_iter().collect();
        locations.sort();
        locations.dedup();

        let points = locations
            .iter()
            .enumerate()
            .map(|(i, c)| GeomWithData::new(unit_vector(*c), i))
            .collect();

        Self {
            locations,
            tree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Every indexed location within `radius_rad` (central angle) of
    /// `center`, boundary inclusive, in `(lat, lon)` order.
    pub fn within_radius(&self, center: Coordinate, radius_rad: f64) -> Vec<Coordinate> {
        let angle = (radius_rad + BOUNDARY_TOLERANCE_RAD).min(std::f64::consts::PI);
        let chord = 2.0 * (angle / 2.0).sin();

        let mut found: Vec<Coordinate> = self
            .tree
            .locate_within_distance(unit_vector(center), chord * chord)
            .map(|p| self.locations[p.data])
            .collect();
        found.sort();
        found
    }

    /// Every indexed location within `radius_km` of `center`.
    pub fn within_km(&self, center: Coordinate, radius_km: f64) -> Vec<Coordinate> {
        self.within_radius(center, radius_to_radians(radius_km))
    }
}
