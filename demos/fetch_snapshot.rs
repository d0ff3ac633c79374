//! Fetches profile and place rows from a live endpoint and clusters them.
//!
//! Run with:
//!   cargo run --example fetch_snapshot --features http -- https://rows.example.org [api-key]

use profile_mapper::{sort_clusters_by_city, total_member_count, ProfileSource, ResolverConfig};
use std::env;

#[tokio::main]
async fn main() {
    let mut args = env::args().skip(1);
    let base_url = match args.next() {
        Some(url) => url,
        None => {
            eprintln!("usage: fetch_snapshot <base-url> [api-key]");
            std::process::exit(2);
        }
    };
    let api_key = args.next();

    let source = match ProfileSource::new(&base_url, api_key.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to create source: {e}");
            std::process::exit(1);
        }
    };

    match source.fetch_snapshot(&ResolverConfig::default()).await {
        Ok(snapshot) => {
            let mut clusters = snapshot.clusters;
            sort_clusters_by_city(&mut clusters);

            println!(
                "{} profiles in {} cities ({} users clustered)",
                snapshot.profiles.len(),
                clusters.len(),
                total_member_count(&clusters)
            );
            for cluster in &clusters {
                println!("  {} ({}) - {}", cluster.city, cluster.country, cluster.count());
            }
        }
        Err(e) => {
            eprintln!("fetch failed: {e}");
            std::process::exit(1);
        }
    }
}
