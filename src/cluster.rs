//! City-level clustering of resolved profiles.
//!
//! Groups profiles by their exact (city, country) pair so that two cities
//! sharing a name in different countries stay separate. The cluster
//! coordinate is the first member's coordinate, which keeps marker positions
//! stable as membership grows; counts are always derived from membership.

use serde::Serialize;
use std::collections::HashMap;

use crate::ResolvedProfile;

/// All profiles sharing one (city, country) identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityCluster {
    pub city: String,
    pub country: String,
    /// Coordinate of the first member encountered. All members share the
    /// same place identity, so any member's coordinate marks the city.
    pub lat: f64,
    pub lon: f64,
    pub members: Vec<ResolvedProfile>,
}

impl CityCluster {
    /// Number of profiles in this cluster. Always `members.len()`; there is
    /// no separate counter to fall out of sync.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Whether any member's location came from the curated place table.
    pub fn has_real_members(&self) -> bool {
        self.members.iter().any(|m| m.location_is_real)
    }
}

/// Group resolved profiles into city clusters.
///
/// The grouping key is the exact (city, country) string pair. Output order
/// is unspecified set semantics; callers impose their own sort (see
/// [`sort_clusters_by_city`]). Empty input yields an empty list.
///
/// # Example
/// ```
/// use profile_mapper::{aggregate_clusters, resolve_profiles};
/// use profile_mapper::{LegacyLocation, RawProfileRecord, ResolverConfig};
/// use std::collections::HashMap;
///
/// let rows: Vec<RawProfileRecord> = (1..=3)
///     .map(|id| RawProfileRecord {
///         id,
///         name: format!("user-{id}"),
///         legacy: Some(LegacyLocation {
///             city: Some("Nairobi".to_string()),
///             country: Some("Kenya".to_string()),
///             lat: Some(-1.29),
///             lon: Some(36.82),
///         }),
///         ..Default::default()
///     })
///     .collect();
///
/// let profiles = resolve_profiles(&rows, &HashMap::new(), &ResolverConfig::default());
/// let clusters = aggregate_clusters(profiles);
/// assert_eq!(clusters.len(), 1);
/// assert_eq!(clusters[0].count(), 3);
/// ```
pub fn aggregate_clusters(profiles: Vec<ResolvedProfile>) -> Vec<CityCluster> {
    let mut by_key: HashMap<(String, String), CityCluster> = HashMap::new();

    for profile in profiles {
        let key = (profile.city.clone(), profile.country.clone());
        match by_key.get_mut(&key) {
            Some(cluster) => cluster.members.push(profile),
            None => {
                by_key.insert(
                    key,
                    CityCluster {
                        city: profile.city.clone(),
                        country: profile.country.clone(),
                        lat: profile.lat,
                        lon: profile.lon,
                        members: vec![profile],
                    },
                );
            }
        }
    }

    by_key.into_values().collect()
}

/// Sort clusters alphabetically by city name, case-insensitive.
///
/// The filter dropdown presents clusters this way; the map widget does not
/// care about order.
pub fn sort_clusters_by_city(clusters: &mut [CityCluster]) {
    clusters.sort_by(|a, b| a.city.to_lowercase().cmp(&b.city.to_lowercase()));
}

/// Total number of profiles across all clusters (the "ALL (n)" label).
pub fn total_member_count(clusters: &[CityCluster]) -> usize {
    clusters.iter().map(CityCluster::count).sum()
}
