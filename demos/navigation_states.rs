//! Walks the view-state resolver through each selection mode.
//!
//! Run with: cargo run --example navigation_states

use profile_mapper::{
    aggregate_clusters, camera_for, path_for, resolve_view, LegacyLocation, NavigationSlugs,
    RawProfileRecord, ResolverConfig, ViewConfig, ViewportBounds, ViewResolution,
};
use std::collections::HashMap;

fn legacy_row(id: i64, name: &str, city: &str, country: &str, lat: f64, lon: f64) -> RawProfileRecord {
    RawProfileRecord {
        id,
        name: name.to_string(),
        featured: id == 1,
        legacy: Some(LegacyLocation {
            city: Some(city.to_string()),
            country: Some(country.to_string()),
            lat: Some(lat),
            lon: Some(lon),
        }),
        ..Default::default()
    }
}

fn main() {
    let rows = vec![
        legacy_row(1, "Amara", "Lagos", "Nigeria", 6.52, 3.38),
        legacy_row(2, "Odile", "Paris", "France", 48.86, 2.35),
        legacy_row(3, "Luc", "Lyon", "France", 45.76, 4.83),
    ];

    let profiles =
        profile_mapper::resolve_profiles(&rows, &HashMap::new(), &ResolverConfig::default());
    let clusters = aggregate_clusters(profiles.clone());
    let config = ViewConfig::default();

    let cases = vec![
        ("city route", NavigationSlugs::new(Some("france"), Some("paris")), None, 0.0),
        ("mismatched country", NavigationSlugs::new(Some("nigeria"), Some("paris")), None, 0.0),
        ("country route", NavigationSlugs::new(Some("france"), None), None, 0.0),
        ("legacy city route", NavigationSlugs::new(Some("lagos"), None), None, 0.0),
        (
            "viewport, zoomed in",
            NavigationSlugs::root(),
            Some(ViewportBounds::new(40.0, -5.0, 50.0, 10.0)),
            6.0,
        ),
        (
            "viewport, zoomed out",
            NavigationSlugs::root(),
            Some(ViewportBounds::new(-90.0, -180.0, 90.0, 180.0)),
            2.0,
        ),
        ("bad slug", NavigationSlugs::new(None, Some("atlantis")), None, 0.0),
    ];

    println!("View Resolution Examples\n");

    for (i, (label, slugs, viewport, zoom)) in cases.into_iter().enumerate() {
        println!("{}. {}:", i + 1, label);
        let result = resolve_view(&slugs, &clusters, &profiles, viewport.as_ref(), zoom, &config);
        match result {
            ViewResolution::Resolved(view) => {
                println!("   title:    {:?}", view.title());
                println!("   subtitle: {:?}", view.subtitle());
                println!("   members:  {}", view.profiles().len());
                println!("   path:     {}", path_for(&view));
                println!("   camera:   {:?}\n", camera_for(&view, &config));
            }
            ViewResolution::NotFound { slug } => {
                println!("   not found ({slug}); redirect to /\n");
            }
        }
    }
}
