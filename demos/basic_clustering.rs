//! Basic example of resolving profiles and clustering them by city.
//!
//! Run with: cargo run --example basic_clustering

use profile_mapper::{
    aggregate_clusters, resolve_profiles, sort_clusters_by_city, total_member_count,
    LegacyLocation, PlaceRecord, RawProfileRecord, ResolverConfig,
};
use std::collections::HashMap;

fn main() {
    // Curated place table (the real source of coordinates)
    let mut places = HashMap::new();
    places.insert(
        101,
        PlaceRecord {
            id: 101,
            city: "Lagos".to_string(),
            country: "Nigeria".to_string(),
            lat: Some(6.5244),
            lng: Some(3.3792),
        },
    );
    places.insert(
        102,
        PlaceRecord {
            id: 102,
            city: "Paris".to_string(),
            country: "France".to_string(),
            lat: Some(48.8566),
            lng: Some(2.3522),
        },
    );

    // Profile rows with a mix of hints
    let rows = vec![
        // Real hint: place table reference plus denormalized name
        RawProfileRecord {
            id: 1,
            name: "Amara".to_string(),
            address_verified: true,
            place_id: Some(101),
            place_name: Some("Lagos".to_string()),
            ..Default::default()
        },
        // Legacy hint only
        RawProfileRecord {
            id: 2,
            name: "Bola".to_string(),
            legacy: Some(LegacyLocation {
                city: Some("Lagos".to_string()),
                country: Some("Nigeria".to_string()),
                lat: Some(6.52),
                lon: Some(3.37),
            }),
            ..Default::default()
        },
        RawProfileRecord {
            id: 3,
            name: "Odile".to_string(),
            place_id: Some(102),
            place_name: Some("Paris".to_string()),
            ..Default::default()
        },
        // No usable hint: dropped silently
        RawProfileRecord {
            id: 4,
            name: "Ghost".to_string(),
            place_id: Some(999),
            ..Default::default()
        },
    ];

    let config = ResolverConfig::default();
    let profiles = resolve_profiles(&rows, &places, &config);

    println!("Profile Clustering Example\n");
    println!("1. Resolution: {} of {} rows located", profiles.len(), rows.len());
    for p in &profiles {
        println!(
            "   {} -> {}, {} ({}) [{}]",
            p.name,
            p.city,
            p.country,
            if p.location_is_real { "real" } else { "legacy" },
            p.profile_url
        );
    }

    let mut clusters = aggregate_clusters(profiles);
    sort_clusters_by_city(&mut clusters);

    println!("\n2. Clusters ({} users total):", total_member_count(&clusters));
    for cluster in &clusters {
        println!(
            "   {} ({}) - {} users at ({:.4}, {:.4})",
            cluster.city,
            cluster.country,
            cluster.count(),
            cluster.lat,
            cluster.lon
        );
    }
}
