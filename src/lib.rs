//! # Profile Mapper
//!
//! City-level clustering and map view-state resolution for user profiles.
//!
//! This library provides:
//! - Location resolution reconciling two imperfect per-profile sources
//! - City clustering with derived counts for marker placement
//! - Deterministic view-state resolution (city / country / viewport / featured)
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch resolution with rayon
//! - **`http`** - Enable HTTP client for fetching profile and place rows
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use profile_mapper::{aggregate_clusters, resolve_profiles};
//! use profile_mapper::{LegacyLocation, RawProfileRecord, ResolverConfig};
//! use std::collections::HashMap;
//!
//! let rows = vec![RawProfileRecord {
//!     id: 1,
//!     name: "Amara".to_string(),
//!     legacy: Some(LegacyLocation {
//!         city: Some("Lagos".to_string()),
//!         country: Some("Nigeria".to_string()),
//!         lat: Some(6.5),
//!         lon: Some(3.4),
//!     }),
//!     ..Default::default()
//! }];
//!
//! // No curated place table available: the legacy hint still locates the profile.
//! let profiles = resolve_profiles(&rows, &HashMap::new(), &ResolverConfig::default());
//! let clusters = aggregate_clusters(profiles);
//!
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].city, "Lagos");
//! assert_eq!(clusters[0].count(), 1);
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// HTTP module for row fetching
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{MapSnapshot, ProfileSource};

// City clustering
pub mod cluster;
pub use cluster::{aggregate_clusters, sort_clusters_by_city, total_member_count, CityCluster};

// Viewport bounds and containment
pub mod bounds;
pub use bounds::{filter_in_bounds, ViewportBounds, WORLD_BOUNDS};

// Slug codec for navigation segments
pub mod slug;
pub use slug::{detect_slug_collisions, from_slug, to_slug};

// View-state resolution
pub mod view;
pub use view::{
    camera_for, path_for, resolve_view, CameraCommand, NavigationSlugs, ViewConfig,
    ViewResolution, ViewState,
};

// ============================================================================
// Core Types
// ============================================================================

/// A directly-attached fallback location tuple.
///
/// Predates the curated place table; many profiles still carry one. Any field
/// may be absent, and the tuple only counts as a usable hint when all four
/// are present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyLocation {
    pub city: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A raw profile row as supplied by the data source.
///
/// Carries two independent location hints: a reference into the curated place
/// table (`place_id` + `place_name`) and a directly-attached [`LegacyLocation`].
/// Either or both may be missing or partial; the resolver reconciles them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProfileRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub verified_links_count: Option<u32>,
    #[serde(default)]
    pub address_verified: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub referral_rank: Option<i64>,
    #[serde(default)]
    pub rank_alltime: Option<i64>,
    #[serde(default)]
    pub rank_weekly: Option<i64>,
    #[serde(default)]
    pub rank_monthly: Option<i64>,
    #[serde(default)]
    pub rank_daily: Option<i64>,
    /// Creation timestamp, RFC 3339. Passed through untouched.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Foreign id into the place table. No referential guarantee: the lookup
    /// may miss.
    #[serde(default)]
    pub place_id: Option<i64>,
    /// Denormalized place name attached to the profile. Authoritative for
    /// display even when it differs from the place table's own name.
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub legacy: Option<LegacyLocation>,
}

/// A row from the curated place table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: i64,
    pub city: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// A profile with a single authoritative coordinate and place identity.
///
/// Both coordinates are always present: profiles satisfying neither hint are
/// dropped before this stage, never represented with placeholder coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProfile {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub city: String,
    pub country: String,
    /// True when the location came from the curated place table, false when
    /// it came from the legacy tuple.
    pub location_is_real: bool,
    pub profile_url: String,
    pub profile_image_url: Option<String>,
    pub verified_links_count: Option<u32>,
    pub address_verified: bool,
    pub featured: bool,
    pub referral_rank: Option<i64>,
    pub rank_alltime: Option<i64>,
    pub rank_weekly: Option<i64>,
    pub rank_monthly: Option<i64>,
    pub rank_daily: Option<i64>,
    pub created_at: Option<String>,
}

/// Configuration for location resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base URL for constructed public profile links.
    pub profile_url_base: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            profile_url_base: "https://profiles.example.com".to_string(),
        }
    }
}

// ============================================================================
// Location Resolution
// ============================================================================

/// Resolve one profile to an authoritative location, or `None` if neither
/// hint is usable.
///
/// A *real* location exists iff the profile's `place_id` maps to a
/// [`PlaceRecord`] with both coordinates present and the profile carries a
/// non-empty `place_name`. A *legacy* location exists iff the legacy tuple
/// has both coordinates and non-empty city and country. Real wins over
/// legacy; the real city name is the profile's denormalized `place_name`,
/// not the place table's own name.
///
/// Unlocatable profiles are routine, not an error: the caller filters the
/// `None`s out and they appear in no cluster or view.
///
/// # Example
/// ```
/// use profile_mapper::{resolve_profile, PlaceRecord, RawProfileRecord, ResolverConfig};
/// use std::collections::HashMap;
///
/// let mut places = HashMap::new();
/// places.insert(7, PlaceRecord {
///     id: 7,
///     city: "Koebenhavn".to_string(),
///     country: "Denmark".to_string(),
///     lat: Some(55.676),
///     lng: Some(12.568),
/// });
///
/// let row = RawProfileRecord {
///     id: 1,
///     name: "Freja".to_string(),
///     place_id: Some(7),
///     place_name: Some("Copenhagen".to_string()),
///     ..Default::default()
/// };
///
/// let resolved = resolve_profile(&row, &places, &ResolverConfig::default()).unwrap();
/// // The profile-level name is authoritative for display.
/// assert_eq!(resolved.city, "Copenhagen");
/// assert_eq!(resolved.country, "Denmark");
/// assert!(resolved.location_is_real);
/// ```
pub fn resolve_profile(
    profile: &RawProfileRecord,
    places: &HashMap<i64, PlaceRecord>,
    config: &ResolverConfig,
) -> Option<ResolvedProfile> {
    let display_name = profile
        .place_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let real = profile
        .place_id
        .and_then(|id| places.get(&id))
        .zip(display_name)
        .and_then(|(place, city)| {
            let lat = place.lat?;
            let lng = place.lng?;
            Some((lat, lng, city.to_string(), place.country.clone()))
        });

    let legacy = profile.legacy.as_ref().and_then(|tuple| {
        let lat = tuple.lat?;
        let lon = tuple.lon?;
        let city = tuple.city.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let country = tuple
            .country
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((lat, lon, city.to_string(), country.to_string()))
    });

    let location_is_real = real.is_some();
    let (lat, lon, city, country) = real.or(legacy)?;

    Some(ResolvedProfile {
        id: profile.id,
        name: profile.name.clone(),
        lat,
        lon,
        city,
        country,
        location_is_real,
        profile_url: public_profile_url(config, &profile.name, profile.id, profile.address_verified),
        profile_image_url: profile.profile_image_url.clone(),
        verified_links_count: profile.verified_links_count,
        address_verified: profile.address_verified,
        featured: profile.featured,
        referral_rank: profile.referral_rank,
        rank_alltime: profile.rank_alltime,
        rank_weekly: profile.rank_weekly,
        rank_monthly: profile.rank_monthly,
        rank_daily: profile.rank_daily,
        created_at: profile.created_at.clone(),
    })
}

/// Resolve a whole batch of profiles, dropping the unlocatable ones.
pub fn resolve_profiles(
    profiles: &[RawProfileRecord],
    places: &HashMap<i64, PlaceRecord>,
    config: &ResolverConfig,
) -> Vec<ResolvedProfile> {
    let resolved: Vec<ResolvedProfile> = profiles
        .iter()
        .filter_map(|p| resolve_profile(p, places, config))
        .collect();

    info!(
        "[Resolve] {} of {} profiles located ({} dropped)",
        resolved.len(),
        profiles.len(),
        profiles.len() - resolved.len()
    );

    resolved
}

/// Resolve a batch of profiles using parallel processing.
///
/// Same output as [`resolve_profiles`] but uses rayon. Recommended for large
/// profile sets (10k+ rows).
#[cfg(feature = "parallel")]
pub fn resolve_profiles_parallel(
    profiles: &[RawProfileRecord],
    places: &HashMap<i64, PlaceRecord>,
    config: &ResolverConfig,
) -> Vec<ResolvedProfile> {
    use rayon::prelude::*;

    let resolved: Vec<ResolvedProfile> = profiles
        .par_iter()
        .filter_map(|p| resolve_profile(p, places, config))
        .collect();

    info!(
        "[Resolve] {} of {} profiles located ({} dropped, parallel)",
        resolved.len(),
        profiles.len(),
        profiles.len() - resolved.len()
    );

    resolved
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Build the public profile URL for a profile.
///
/// Verified profiles get `{base}/{name}`, unverified ones `{base}/{name}-{id}`.
/// Whitespace runs in the name collapse to a single underscore.
fn public_profile_url(config: &ResolverConfig, name: &str, id: i64, verified: bool) -> String {
    let safe_name = name.split_whitespace().collect::<Vec<_>>().join("_");
    if verified {
        format!("{}/{}", config.profile_url_base, safe_name)
    } else {
        format!("{}/{}-{}", config.profile_url_base, safe_name, id)
    }
}

// ============================================================================
// Tests
// ============================================================================
