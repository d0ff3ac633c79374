//! HTTP client for the profile data source.
//!
//! This module provides row fetching with:
//! - Connection pooling
//! - Automatic retry with exponential backoff on transient failures
//! - Phase-timed logging (headers / body / decode)
//!
//! The endpoint is expected to serve `GET {base}/profiles` and
//! `GET {base}/places` as JSON arrays of rows. Failures are recoverable
//! `Err(String)`s; the library never retries beyond the fetch helpers and
//! never caches rows between calls.

use log::{debug, info, warn};
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::{
    aggregate_clusters, resolve_profiles, CityCluster, PlaceRecord, RawProfileRecord,
    ResolvedProfile, ResolverConfig,
};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One fetched-and-processed generation of map data.
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    pub profiles: Vec<ResolvedProfile>,
    pub clusters: Vec<CityCluster>,
}

/// Client for the profile/place row endpoints.
pub struct ProfileSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ProfileSource {
    /// Create a source for the given base URL, optionally authenticated
    /// with an API key header.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, String> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        })
    }

    /// Fetch all profile rows.
    pub async fn fetch_profiles(&self) -> Result<Vec<RawProfileRecord>, String> {
        self.fetch_rows("profiles").await
    }

    /// Fetch all place rows.
    pub async fn fetch_places(&self) -> Result<Vec<PlaceRecord>, String> {
        self.fetch_rows("places").await
    }

    /// Fetch both row sets concurrently, resolve, and cluster.
    ///
    /// This is the whole refresh path in one call: rows in, resolved
    /// profiles and clusters out.
    pub async fn fetch_snapshot(&self, config: &ResolverConfig) -> Result<MapSnapshot, String> {
        let start = Instant::now();

        let (profile_rows, place_rows) =
            futures::try_join!(self.fetch_profiles(), self.fetch_places())?;

        let row_count = profile_rows.len();
        let places: HashMap<i64, PlaceRecord> =
            place_rows.into_iter().map(|p| (p.id, p)).collect();

        let profiles = resolve_profiles(&profile_rows, &places, config);
        let clusters = aggregate_clusters(profiles.clone());

        info!(
            "[ProfileSource] snapshot: {} rows -> {} located profiles, {} clusters in {:?}",
            row_count,
            profiles.len(),
            clusters.len(),
            start.elapsed()
        );

        Ok(MapSnapshot { profiles, clusters })
    }

    async fn fetch_rows<T>(&self, path: &str) -> Result<Vec<T>, String>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut retries = 0;
        let req_start = Instant::now();

        loop {
            let mut req = self.client.get(&url);
            if let Some(key) = &self.api_key {
                req = req.header("x-api-key", key);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers_elapsed = req_start.elapsed();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        retries += 1;
                        if retries > MAX_RETRIES {
                            return Err(format!("Max retries exceeded (429) fetching {}", url));
                        }
                        let wait = Duration::from_millis(500 * (1 << retries.min(3)));
                        warn!(
                            "[Fetch {}] 429 Too Many Requests, retry {} after {:?}",
                            path, retries, wait
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(format!("HTTP {} fetching {}", status, url));
                    }

                    let body_start = Instant::now();
                    let bytes = resp
                        .bytes()
                        .await
                        .map_err(|e| format!("Body download error: {}", e))?;
                    let body_elapsed = body_start.elapsed();

                    let decode_start = Instant::now();
                    let rows: Vec<T> = serde_json::from_slice(&bytes)
                        .map_err(|e| format!("JSON parse error for {}: {}", path, e))?;
                    let decode_elapsed = decode_start.elapsed();

                    debug!(
                        "[Fetch {}] headers={:?} body={:?}({:.1}KB) decode={:?} rows={}",
                        path,
                        headers_elapsed,
                        body_elapsed,
                        bytes.len() as f64 / 1024.0,
                        decode_elapsed,
                        rows.len()
                    );

                    return Ok(rows);
                }
                Err(e) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(format!("Request error fetching {}: {}", url, e));
                    }

                    let wait = Duration::from_millis(200 * (1 << retries));
                    warn!("[Fetch {}] Error: {}, retry {} after {:?}", path, e, retries, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_construction_normalizes_base_url() {
        let source = ProfileSource::new("https://rows.example.org/", Some("secret")).unwrap();
        assert_eq!(source.base_url, "https://rows.example.org");
        assert_eq!(source.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_profile_row_wire_shape() {
        // Rows arrive with absent hint fields; serde defaults must absorb them.
        let json = r#"[
            {
                "id": 1,
                "name": "Amara",
                "featured": true,
                "place_id": 7,
                "place_name": "Lagos"
            },
            {
                "id": 2,
                "name": "Bola",
                "legacy": { "city": "Abuja", "country": "Nigeria", "lat": 9.06, "lon": 7.49 }
            }
        ]"#;

        let rows: Vec<RawProfileRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].featured);
        assert_eq!(rows[0].place_id, Some(7));
        assert!(rows[0].legacy.is_none());
        assert_eq!(rows[1].legacy.as_ref().unwrap().lat, Some(9.06));
        assert!(!rows[1].address_verified);
    }

    #[test]
    fn test_place_row_wire_shape() {
        let json = r#"[
            { "id": 7, "city": "Lagos", "country": "Nigeria", "lat": 6.5, "lng": 3.4 },
            { "id": 8, "city": "Ghost Town", "country": "Nowhere", "lat": null, "lng": null }
        ]"#;

        let rows: Vec<PlaceRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lat, Some(6.5));
        assert!(rows[1].lat.is_none());
    }

    #[test]
    fn test_snapshot_assembly_from_rows() {
        // The same pipeline fetch_snapshot runs after the wire round-trip,
        // without the network.
        let profile_json = r#"[
            { "id": 1, "name": "Amara", "place_id": 7, "place_name": "Lagos" },
            { "id": 2, "name": "Bola", "legacy": { "city": "Lagos", "country": "Nigeria", "lat": 6.5, "lon": 3.4 } },
            { "id": 3, "name": "Ghost" }
        ]"#;
        let place_json = r#"[
            { "id": 7, "city": "Lagos", "country": "Nigeria", "lat": 6.5, "lng": 3.4 }
        ]"#;

        let profile_rows: Vec<RawProfileRecord> = serde_json::from_str(profile_json).unwrap();
        let place_rows: Vec<PlaceRecord> = serde_json::from_str(place_json).unwrap();

        let places: HashMap<i64, PlaceRecord> =
            place_rows.into_iter().map(|p| (p.id, p)).collect();
        let profiles = resolve_profiles(&profile_rows, &places, &ResolverConfig::default());
        let clusters = aggregate_clusters(profiles.clone());

        assert_eq!(profiles.len(), 2); // the hintless row drops out
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 2);
        assert!(clusters[0].has_real_members());
    }
}
