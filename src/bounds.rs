//! Viewport bounds and containment.
//!
//! A viewport is the south-west / north-east rectangle reported by the map
//! widget. Containment is inclusive on both axes, and a viewport whose west
//! edge sits east of its east edge is treated as crossing the antimeridian
//! and split into two longitude ranges.

use geo::{Coord, Intersects, Rect};
use serde::{Deserialize, Serialize};

use crate::ResolvedProfile;

/// A geographic viewport rectangle, in degrees.
///
/// `west > east` encodes a viewport crossing the antimeridian (±180°).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// The whole world; used to frame the root view.
pub const WORLD_BOUNDS: ViewportBounds = ViewportBounds {
    south: -90.0,
    west: -180.0,
    north: 90.0,
    east: 180.0,
};

impl ViewportBounds {
    /// Create bounds from south-west and north-east corners.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self { south, west, north, east }
    }

    /// Check that the bounds describe a usable rectangle.
    ///
    /// An uninitialized viewport (NaN fields, inverted latitudes,
    /// out-of-range values) fails this check and is treated by the view
    /// resolver as "no viewport". `west > east` is valid: it means the
    /// viewport crosses the antimeridian.
    pub fn is_valid(&self) -> bool {
        self.south.is_finite()
            && self.north.is_finite()
            && self.west.is_finite()
            && self.east.is_finite()
            && self.south <= self.north
            && (-90.0..=90.0).contains(&self.south)
            && (-90.0..=90.0).contains(&self.north)
            && (-180.0..=180.0).contains(&self.west)
            && (-180.0..=180.0).contains(&self.east)
    }

    /// Whether the viewport crosses the ±180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Inclusive containment test for a coordinate.
    ///
    /// A point exactly on an edge is inside. When the viewport crosses the
    /// antimeridian the longitude check splits into `[west, 180]` and
    /// `[-180, east]`.
    ///
    /// # Example
    /// ```
    /// use profile_mapper::ViewportBounds;
    ///
    /// let bounds = ViewportBounds::new(-10.0, -10.0, 10.0, 10.0);
    /// assert!(bounds.contains(0.0, 0.0));
    /// assert!(bounds.contains(10.0, 10.0)); // edge is inside
    /// assert!(!bounds.contains(50.0, 50.0));
    ///
    /// // Fiji-area viewport straddling the antimeridian
    /// let straddling = ViewportBounds::new(-25.0, 170.0, -10.0, -170.0);
    /// assert!(straddling.contains(-17.0, 179.0));
    /// assert!(straddling.contains(-17.0, -175.0));
    /// assert!(!straddling.contains(-17.0, 0.0));
    /// ```
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let point = Coord { x: lon, y: lat };
        if self.crosses_antimeridian() {
            let west_half = Rect::new(
                Coord { x: self.west, y: self.south },
                Coord { x: 180.0, y: self.north },
            );
            let east_half = Rect::new(
                Coord { x: -180.0, y: self.south },
                Coord { x: self.east, y: self.north },
            );
            west_half.intersects(&point) || east_half.intersects(&point)
        } else {
            Rect::new(
                Coord { x: self.west, y: self.south },
                Coord { x: self.east, y: self.north },
            )
            .intersects(&point)
        }
    }

    /// Center of the bounds, wraparound-aware.
    pub fn center(&self) -> (f64, f64) {
        let lat = (self.south + self.north) / 2.0;
        let lon = if self.crosses_antimeridian() {
            let mid = (self.west + self.east + 360.0) / 2.0;
            if mid > 180.0 {
                mid - 360.0
            } else {
                mid
            }
        } else {
            (self.west + self.east) / 2.0
        };
        (lat, lon)
    }
}

/// Select the profiles whose coordinate falls inside `bounds`.
pub fn filter_in_bounds(profiles: &[ResolvedProfile], bounds: &ViewportBounds) -> Vec<ResolvedProfile> {
    profiles
        .iter()
        .filter(|p| bounds.contains(p.lat, p.lon))
        .cloned()
        .collect()
}

/// Compute the bounds enclosing every profile in the slice.
///
/// Returns `None` for empty input. Used to frame the camera over a country's
/// members; no antimeridian handling is attempted here, matching how the
/// map widget's own fit-bounds treats scattered markers.
pub fn bounds_of(profiles: &[ResolvedProfile]) -> Option<ViewportBounds> {
    if profiles.is_empty() {
        return None;
    }

    let mut south = f64::MAX;
    let mut north = f64::MIN;
    let mut west = f64::MAX;
    let mut east = f64::MIN;

    for p in profiles {
        south = south.min(p.lat);
        north = north.max(p.lat);
        west = west.min(p.lon);
        east = east.max(p.lon);
    }

    Some(ViewportBounds { south, west, north, east })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_at(id: i64, lat: f64, lon: f64) -> ResolvedProfile {
        ResolvedProfile {
            id,
            name: format!("user-{id}"),
            lat,
            lon,
            city: "City".to_string(),
            country: "Country".to_string(),
            location_is_real: true,
            profile_url: format!("https://profiles.test/user-{id}"),
            profile_image_url: None,
            verified_links_count: None,
            address_verified: false,
            featured: false,
            referral_rank: None,
            rank_alltime: None,
            rank_weekly: None,
            rank_monthly: None,
            rank_daily: None,
            created_at: None,
        }
    }

    #[test]
    fn test_contains_is_inclusive_on_edges() {
        let bounds = ViewportBounds::new(-10.0, -10.0, 10.0, 10.0);
        assert!(bounds.contains(0.0, 0.0));
        assert!(bounds.contains(-10.0, -10.0));
        assert!(bounds.contains(10.0, 10.0));
        assert!(!bounds.contains(10.0001, 0.0));
    }

    #[test]
    fn test_filter_in_bounds() {
        let bounds = ViewportBounds::new(-10.0, -10.0, 10.0, 10.0);
        let profiles = vec![profile_at(1, 0.0, 0.0), profile_at(2, 50.0, 50.0)];

        let inside = filter_in_bounds(&profiles, &bounds);
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].id, 1);
    }

    #[test]
    fn test_wraparound_containment() {
        let straddling = ViewportBounds::new(-25.0, 170.0, -10.0, -170.0);
        assert!(straddling.crosses_antimeridian());

        // Both sides of the antimeridian are in view
        assert!(straddling.contains(-17.0, 175.0));
        assert!(straddling.contains(-17.0, 180.0));
        assert!(straddling.contains(-17.0, -180.0));
        assert!(straddling.contains(-17.0, -175.0));
        // The gap on the far side of the globe is not
        assert!(!straddling.contains(-17.0, 0.0));
        assert!(!straddling.contains(-17.0, 160.0));
    }

    #[test]
    fn test_wraparound_center() {
        let straddling = ViewportBounds::new(-25.0, 170.0, -10.0, -170.0);
        let (lat, lon) = straddling.center();
        assert!((lat - (-17.5)).abs() < 1e-9);
        assert!((lon - 180.0).abs() < 1e-9);

        let plain = ViewportBounds::new(0.0, 10.0, 10.0, 30.0);
        assert_eq!(plain.center(), (5.0, 20.0));
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(!ViewportBounds::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(!ViewportBounds::new(10.0, 0.0, -10.0, 1.0).is_valid()); // south > north
        assert!(!ViewportBounds::new(-91.0, 0.0, 10.0, 1.0).is_valid());
        assert!(ViewportBounds::new(-25.0, 170.0, -10.0, -170.0).is_valid()); // wraparound ok
        assert!(WORLD_BOUNDS.is_valid());
    }

    #[test]
    fn test_bounds_of_members() {
        let profiles = vec![
            profile_at(1, 6.5, 3.4),
            profile_at(2, -1.29, 36.82),
            profile_at(3, 30.04, 31.24),
        ];

        let bounds = bounds_of(&profiles).unwrap();
        assert_eq!(bounds.south, -1.29);
        assert_eq!(bounds.north, 30.04);
        assert_eq!(bounds.west, 3.4);
        assert_eq!(bounds.east, 36.82);

        assert!(bounds_of(&[]).is_none());
    }
}
