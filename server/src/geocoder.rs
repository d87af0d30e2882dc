use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use crate::config::GeocoderConfig;
use crate::error::LocatorError;
use crate::models::GeoPoint;

pub trait Geocoder: Send + Sync + 'static {
    /// Resolve free text to a coordinate.
    ///
    /// `NotFound` when the provider has no usable match, `Provider` when the
    /// call itself fails. Called once per request, never retried.
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<GeoPoint, LocatorError>> + Send;
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: Option<String>,
    lon: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: String,
}

impl NominatimGeocoder {
    /// TLS goes through rustls with the bundled webpki root store.
    pub fn new(config: &GeocoderConfig) -> Result<Self, LocatorError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(config.geocoder_user_agent.clone())
            .timeout(Duration::from_secs(config.geocoder_timeout_secs))
            .build()
            .map_err(|e| LocatorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(NominatimGeocoder {
            client,
            search_url: format!("{}/search", config.geocoder_url.trim_end_matches('/')),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, LocatorError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LocatorError::Provider(format!(
                "Geocoder responded with status: {}",
                status
            )));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        first_match(hits)
    }
}

fn first_match(hits: Vec<SearchHit>) -> Result<GeoPoint, LocatorError> {
    let hit = hits
        .into_iter()
        .next()
        .ok_or_else(|| LocatorError::NotFound("Geocoding failed: no match".to_string()))?;

    let coordinate = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };

    match (coordinate(&hit.lat), coordinate(&hit.lon)) {
        (Some(latitude), Some(longitude)) => {
            log::debug!(
                "Geocoded to {:?} ({}, {})",
                hit.display_name.as_deref().unwrap_or("?"),
                latitude,
                longitude
            );
            Ok(GeoPoint {
                latitude,
                longitude,
            })
        }
        _ => Err(LocatorError::NotFound(format!(
            "Geocoding failed: incomplete coordinate lat={:?} lon={:?}",
            hit.lat, hit.lon
        ))),
    }
}
