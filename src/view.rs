//! View-state resolution.
//!
//! Derives "what is currently selected" from navigation slugs, the cluster
//! set, the live viewport, and the featured flag, with fixed precedence:
//! city > country > viewport (above a zoom floor) > featured > nothing.
//! Resolution is a pure function of its inputs, recomputed by the caller on
//! every change; nothing here memoizes.
//!
//! The same module derives what the consumers need from the active view:
//! panel title/subtitle text, a camera command for the map widget, and the
//! canonical navigation path.

use log::debug;
use serde::Serialize;
use std::collections::HashSet;

use crate::bounds::{bounds_of, filter_in_bounds, ViewportBounds, WORLD_BOUNDS};
use crate::cluster::CityCluster;
use crate::slug::{from_slug, to_slug};
use crate::ResolvedProfile;

// ============================================================================
// Types
// ============================================================================

/// The two opaque path segments owned by the navigation layer.
///
/// Either may be absent. A single-segment path arrives as `country` only;
/// historically such segments named a city, and resolution still honors
/// that (see [`resolve_view`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationSlugs {
    pub country: Option<String>,
    pub city: Option<String>,
}

impl NavigationSlugs {
    /// The root navigation state: no segments.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(country: Option<&str>, city: Option<&str>) -> Self {
        Self {
            country: country.map(str::to_string),
            city: city.map(str::to_string),
        }
    }
}

/// Configuration for view resolution and camera framing.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Minimum zoom level before the viewport counts as a selection.
    /// Below this, "in view" would approximate the whole world and mean
    /// nothing. Default: 3.0
    pub viewport_zoom_floor: f64,

    /// Camera zoom used when flying to a single city. Default: 8.0
    pub city_zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            viewport_zoom_floor: 3.0,
            city_zoom: 8.0,
        }
    }
}

/// The active selection driving the detail panel and the map camera.
///
/// Exactly one variant is active at a time; the value is a projection of
/// the resolver's inputs and is never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ViewState {
    /// One city cluster is selected; members are exactly its profiles.
    City(CityCluster),
    /// A whole country is selected. Members are computed from the full
    /// resolved-profile set, not from cluster membership, so the view stays
    /// consistent if clustering granularity ever changes.
    Country {
        country: String,
        profiles: Vec<ResolvedProfile>,
    },
    /// No explicit selection; the visible map region acts as one.
    InViewport {
        bounds: ViewportBounds,
        profiles: Vec<ResolvedProfile>,
    },
    /// Fallback highlight of featured profiles.
    Featured(Vec<ResolvedProfile>),
    /// Nothing to show.
    None,
}

impl ViewState {
    /// The profiles this view presents.
    pub fn profiles(&self) -> &[ResolvedProfile] {
        match self {
            ViewState::City(cluster) => &cluster.members,
            ViewState::Country { profiles, .. } => profiles,
            ViewState::InViewport { profiles, .. } => profiles,
            ViewState::Featured(profiles) => profiles,
            ViewState::None => &[],
        }
    }

    /// Panel heading for this view.
    pub fn title(&self) -> String {
        match self {
            ViewState::City(cluster) => cluster.city.clone(),
            ViewState::Country { country, .. } => country.clone(),
            ViewState::InViewport { .. } => "Users in View".to_string(),
            ViewState::Featured(_) => "Featured Users".to_string(),
            ViewState::None => String::new(),
        }
    }

    /// Panel metadata line for this view.
    pub fn subtitle(&self) -> String {
        match self {
            ViewState::City(cluster) => {
                format!("{} • {} users", cluster.country, cluster.count())
            }
            ViewState::Country { profiles, .. } => format!("{} users", profiles.len()),
            ViewState::InViewport { profiles, .. } => {
                format!("{} users in current frame", profiles.len())
            }
            ViewState::Featured(profiles) => format!("{} featured users", profiles.len()),
            ViewState::None => String::new(),
        }
    }
}

/// Outcome of a resolution attempt.
///
/// `NotFound` means a slug was given but matched nothing; the caller is
/// expected to redirect to the root state. It is distinct from a resolved
/// [`ViewState::None`], which means no slug was given and nothing else
/// applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewResolution {
    Resolved(ViewState),
    NotFound { slug: String },
}

impl ViewResolution {
    /// The resolved view, if any.
    pub fn view(&self) -> Option<&ViewState> {
        match self {
            ViewResolution::Resolved(view) => Some(view),
            ViewResolution::NotFound { .. } => None,
        }
    }
}

/// Camera instruction for the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CameraCommand {
    /// Animate to a single coordinate at the given zoom.
    FlyTo { lat: f64, lon: f64, zoom: f64 },
    /// Frame the given bounds.
    FitBounds(ViewportBounds),
    /// Leave the camera where it is.
    Hold,
}

// ============================================================================
// Resolution
// ============================================================================

/// Derive the active view from navigation slugs, clusters, profiles, and
/// the live viewport.
///
/// Precedence, in order:
/// 1. A `country` segment is matched against cluster countries; failing
///    that, it is retried as a city slug (legacy single-segment routes).
/// 2. A `city` segment resolving to a cluster always wins, and its own
///    country supersedes whatever the country segment said; a stale or
///    mismatched country in the URL never leaks into the result.
/// 3. City → [`ViewState::City`]; else country → [`ViewState::Country`].
/// 4. Else, a valid viewport at or above the zoom floor →
///    [`ViewState::InViewport`].
/// 5. Else, featured profiles if any → [`ViewState::Featured`], otherwise
///    [`ViewState::None`].
///
/// A slug that matches neither a city nor a country short-circuits to
/// [`ViewResolution::NotFound`] instead of falling through to a wrong mode.
pub fn resolve_view(
    slugs: &NavigationSlugs,
    clusters: &[CityCluster],
    profiles: &[ResolvedProfile],
    viewport: Option<&ViewportBounds>,
    zoom: f64,
    config: &ViewConfig,
) -> ViewResolution {
    let mut country: Option<String> = None;
    let mut selected: Option<&CityCluster> = None;

    if let Some(country_slug) = present(&slugs.country) {
        let countries = distinct_countries(clusters);
        if let Some(name) = from_slug(country_slug, &countries, |c: &String| c.as_str()) {
            country = Some(name.clone());
        } else if let Some(cluster) = from_slug(country_slug, clusters, |c| c.city.as_str()) {
            // Single-segment city routes predate the country segment and
            // must keep working.
            selected = Some(cluster);
            country = Some(cluster.country.clone());
        } else {
            debug!("[View] unresolvable country segment '{}'", country_slug);
            return ViewResolution::NotFound {
                slug: country_slug.to_string(),
            };
        }
    }

    if let Some(city_slug) = present(&slugs.city) {
        match from_slug(city_slug, clusters, |c| c.city.as_str()) {
            Some(cluster) => {
                selected = Some(cluster);
                country = Some(cluster.country.clone());
            }
            None => {
                debug!("[View] unresolvable city segment '{}'", city_slug);
                return ViewResolution::NotFound {
                    slug: city_slug.to_string(),
                };
            }
        }
    }

    if let Some(cluster) = selected {
        debug!("[View] city '{}', {} members", cluster.city, cluster.count());
        return ViewResolution::Resolved(ViewState::City(cluster.clone()));
    }

    if let Some(country) = country {
        let members: Vec<ResolvedProfile> = profiles
            .iter()
            .filter(|p| p.country == country)
            .cloned()
            .collect();
        debug!("[View] country '{}', {} members", country, members.len());
        return ViewResolution::Resolved(ViewState::Country {
            country,
            profiles: members,
        });
    }

    if let Some(bounds) = viewport.filter(|b| b.is_valid()) {
        if zoom >= config.viewport_zoom_floor {
            let members = filter_in_bounds(profiles, bounds);
            debug!("[View] viewport at zoom {}, {} members", zoom, members.len());
            return ViewResolution::Resolved(ViewState::InViewport {
                bounds: *bounds,
                profiles: members,
            });
        }
    }

    let featured: Vec<ResolvedProfile> = profiles.iter().filter(|p| p.featured).cloned().collect();
    if !featured.is_empty() {
        debug!("[View] featured fallback, {} members", featured.len());
        return ViewResolution::Resolved(ViewState::Featured(featured));
    }

    ViewResolution::Resolved(ViewState::None)
}

/// Camera command for the given view.
///
/// City flies to the cluster marker; country frames its members; the root
/// state frames the world. Viewport and featured views leave the camera
/// alone.
pub fn camera_for(view: &ViewState, config: &ViewConfig) -> CameraCommand {
    match view {
        ViewState::City(cluster) => CameraCommand::FlyTo {
            lat: cluster.lat,
            lon: cluster.lon,
            zoom: config.city_zoom,
        },
        ViewState::Country { profiles, .. } => {
            CameraCommand::FitBounds(bounds_of(profiles).unwrap_or(WORLD_BOUNDS))
        }
        ViewState::InViewport { .. } | ViewState::Featured(_) => CameraCommand::Hold,
        ViewState::None => CameraCommand::FitBounds(WORLD_BOUNDS),
    }
}

/// Canonical navigation path for the given view.
pub fn path_for(view: &ViewState) -> String {
    match view {
        ViewState::City(cluster) => {
            format!("/{}/{}", to_slug(&cluster.country), to_slug(&cluster.city))
        }
        ViewState::Country { country, .. } => format!("/{}", to_slug(country)),
        _ => "/".to_string(),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn present(slug: &Option<String>) -> Option<&str> {
    slug.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Distinct cluster countries in first-encounter order.
fn distinct_countries(clusters: &[CityCluster]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut countries = Vec::new();
    for cluster in clusters {
        if seen.insert(cluster.country.clone()) {
            countries.push(cluster.country.clone());
        }
    }
    countries
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::aggregate_clusters;

    fn profile(id: i64, city: &str, country: &str, lat: f64, lon: f64) -> ResolvedProfile {
        ResolvedProfile {
            id,
            name: format!("user-{id}"),
            lat,
            lon,
            city: city.to_string(),
            country: country.to_string(),
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

    fn sample_world() -> (Vec<ResolvedProfile>, Vec<CityCluster>) {
        let profiles = vec![
            profile(1, "Paris", "France", 48.85, 2.35),
            profile(2, "Paris", "France", 48.85, 2.35),
            profile(3, "Lyon", "France", 45.76, 4.83),
            profile(4, "Berlin", "Germany", 52.52, 13.40),
            profile(5, "Suva", "Fiji", -18.14, 178.44),
        ];
        let clusters = aggregate_clusters(profiles.clone());
        (profiles, clusters)
    }

    fn resolve(
        slugs: NavigationSlugs,
        viewport: Option<ViewportBounds>,
        zoom: f64,
    ) -> ViewResolution {
        let (profiles, clusters) = sample_world();
        resolve_view(
            &slugs,
            &clusters,
            &profiles,
            viewport.as_ref(),
            zoom,
            &ViewConfig::default(),
        )
    }

    #[test]
    fn test_city_slug_resolves_to_city_view() {
        let result = resolve(NavigationSlugs::new(Some("france"), Some("paris")), None, 0.0);
        match result {
            ViewResolution::Resolved(ViewState::City(cluster)) => {
                assert_eq!(cluster.city, "Paris");
                assert_eq!(cluster.count(), 2);
            }
            other => panic!("expected city view, got {:?}", other),
        }
    }

    #[test]
    fn test_city_wins_over_mismatched_country_segment() {
        // URL says /germany/paris; the resolved city's own country must win.
        let result = resolve(NavigationSlugs::new(Some("germany"), Some("paris")), None, 0.0);
        match result {
            ViewResolution::Resolved(ViewState::City(cluster)) => {
                assert_eq!(cluster.country, "France");
            }
            other => panic!("expected city view, got {:?}", other),
        }
    }

    #[test]
    fn test_country_view_uses_full_profile_set() {
        let result = resolve(NavigationSlugs::new(Some("france"), None), None, 0.0);
        match result {
            ViewResolution::Resolved(ViewState::Country { country, profiles }) => {
                assert_eq!(country, "France");
                // Paris (2) + Lyon (1), drawn from all profiles, not one cluster.
                assert_eq!(profiles.len(), 3);
            }
            other => panic!("expected country view, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_single_segment_city_route() {
        // "/paris" with no city segment: the country slot holds a city name.
        let result = resolve(NavigationSlugs::new(Some("paris"), None), None, 0.0);
        match result {
            ViewResolution::Resolved(ViewState::City(cluster)) => {
                assert_eq!(cluster.city, "Paris");
                assert_eq!(cluster.country, "France");
            }
            other => panic!("expected city view, got {:?}", other),
        }
    }

    #[test]
    fn test_unresolvable_city_slug_is_not_found() {
        let result = resolve(NavigationSlugs::new(None, Some("atlantis")), None, 0.0);
        assert_eq!(
            result,
            ViewResolution::NotFound {
                slug: "atlantis".to_string()
            }
        );
    }

    #[test]
    fn test_unresolvable_country_slug_is_not_found() {
        let result = resolve(NavigationSlugs::new(Some("narnia"), Some("paris")), None, 0.0);
        assert_eq!(
            result,
            ViewResolution::NotFound {
                slug: "narnia".to_string()
            }
        );
    }

    #[test]
    fn test_viewport_selection_above_zoom_floor() {
        let bounds = ViewportBounds::new(-10.0, -10.0, 60.0, 10.0);
        let result = resolve(NavigationSlugs::root(), Some(bounds), 5.0);
        match result {
            ViewResolution::Resolved(ViewState::InViewport { profiles, .. }) => {
                // Paris x2, Lyon; Berlin (13.40E) and Suva are outside.
                assert_eq!(profiles.len(), 3);
            }
            other => panic!("expected viewport view, got {:?}", other),
        }
    }

    #[test]
    fn test_viewport_ignored_below_zoom_floor() {
        let bounds = ViewportBounds::new(-10.0, -10.0, 60.0, 10.0);
        let result = resolve(NavigationSlugs::root(), Some(bounds), 2.0);
        // No featured profiles in the sample set, so this falls to None.
        assert_eq!(result, ViewResolution::Resolved(ViewState::None));
    }

    #[test]
    fn test_invalid_viewport_treated_as_absent() {
        let bounds = ViewportBounds::new(f64::NAN, -10.0, 60.0, 10.0);
        let result = resolve(NavigationSlugs::root(), Some(bounds), 5.0);
        assert_eq!(result, ViewResolution::Resolved(ViewState::None));
    }

    #[test]
    fn test_wraparound_viewport_selects_across_antimeridian() {
        let bounds = ViewportBounds::new(-25.0, 170.0, -10.0, -170.0);
        let result = resolve(NavigationSlugs::root(), Some(bounds), 4.0);
        match result {
            ViewResolution::Resolved(ViewState::InViewport { profiles, .. }) => {
                assert_eq!(profiles.len(), 1);
                assert_eq!(profiles[0].city, "Suva");
            }
            other => panic!("expected viewport view, got {:?}", other),
        }
    }

    #[test]
    fn test_featured_fallback() {
        let (mut profiles, clusters) = sample_world();
        profiles[3].featured = true;

        let result = resolve_view(
            &NavigationSlugs::root(),
            &clusters,
            &profiles,
            None,
            0.0,
            &ViewConfig::default(),
        );
        match result {
            ViewResolution::Resolved(ViewState::Featured(featured)) => {
                assert_eq!(featured.len(), 1);
                assert_eq!(featured[0].id, 4);
            }
            other => panic!("expected featured view, got {:?}", other),
        }
    }

    #[test]
    fn test_nothing_selected_is_none() {
        let result = resolve(NavigationSlugs::root(), None, 0.0);
        assert_eq!(result, ViewResolution::Resolved(ViewState::None));
    }

    #[test]
    fn test_titles_and_subtitles() {
        let (profiles, _clusters) = sample_world();

        let city = resolve(NavigationSlugs::new(None, Some("paris")), None, 0.0);
        let city = city.view().unwrap();
        assert_eq!(city.title(), "Paris");
        assert_eq!(city.subtitle(), "France • 2 users");

        let country = resolve(NavigationSlugs::new(Some("france"), None), None, 0.0);
        let country = country.view().unwrap();
        assert_eq!(country.title(), "France");
        assert_eq!(country.subtitle(), "3 users");

        let in_view = ViewState::InViewport {
            bounds: ViewportBounds::new(-10.0, -10.0, 10.0, 10.0),
            profiles: vec![],
        };
        assert_eq!(in_view.title(), "Users in View");
        assert_eq!(in_view.subtitle(), "0 users in current frame");

        let featured = ViewState::Featured(profiles[..1].to_vec());
        assert_eq!(featured.title(), "Featured Users");
        assert_eq!(featured.subtitle(), "1 featured users");

        assert_eq!(ViewState::None.title(), "");
        assert!(ViewState::None.subtitle().is_empty());
    }

    #[test]
    fn test_camera_commands() {
        let config = ViewConfig::default();
        let (_, clusters) = sample_world();
        let paris = clusters.iter().find(|c| c.city == "Paris").unwrap();

        match camera_for(&ViewState::City(paris.clone()), &config) {
            CameraCommand::FlyTo { lat, lon, zoom } => {
                assert_eq!(lat, paris.lat);
                assert_eq!(lon, paris.lon);
                assert_eq!(zoom, 8.0);
            }
            other => panic!("expected fly-to, got {:?}", other),
        }

        let country = ViewState::Country {
            country: "France".to_string(),
            profiles: vec![
                profile(1, "Paris", "France", 48.85, 2.35),
                profile(3, "Lyon", "France", 45.76, 4.83),
            ],
        };
        match camera_for(&country, &config) {
            CameraCommand::FitBounds(bounds) => {
                assert!(bounds.contains(48.85, 2.35));
                assert!(bounds.contains(45.76, 4.83));
            }
            other => panic!("expected fit-bounds, got {:?}", other),
        }

        assert_eq!(camera_for(&ViewState::Featured(vec![]), &config), CameraCommand::Hold);
        assert_eq!(
            camera_for(&ViewState::None, &config),
            CameraCommand::FitBounds(WORLD_BOUNDS)
        );
    }

    #[test]
    fn test_paths() {
        let (_, clusters) = sample_world();
        let paris = clusters.iter().find(|c| c.city == "Paris").unwrap();

        assert_eq!(path_for(&ViewState::City(paris.clone())), "/france/paris");
        assert_eq!(
            path_for(&ViewState::Country {
                country: "France".to_string(),
                profiles: vec![],
            }),
            "/france"
        );
        assert_eq!(path_for(&ViewState::None), "/");
        assert_eq!(path_for(&ViewState::Featured(vec![])), "/");
    }
}
