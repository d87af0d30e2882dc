use std::sync::Arc;
use uuid::Uuid;

use crate::dataset::TurbineDataset;
use crate::error::{Failure, LocatorError};
use crate::error_log::ErrorLog;
use crate::geocoder::Geocoder;
use crate::models::{CalculateResponse, TurbineLocation};
use crate::nearest::find_nearest;
use crate::projection::Transformer;

const MSG_NO_ADDRESS: &str = "No address provided.";
const MSG_NOT_LOCATED: &str = "That address could not be located. Please try simplifying it.";
const MSG_GEOCODE_FAILED: &str = "An error occurred while locating your address. Please try again.";
const MSG_TRANSFORM_FAILED: &str = "An error occurred while handling that address. Please try again.";
const MSG_LOAD_FAILED: &str = "An error occurred while loading the turbine data. Please try again.";
const MSG_LOAD_UNEXPECTED: &str =
    "An unexpected error occurred while loading turbine data. Please try again.";
const MSG_NO_TURBINES: &str = "No turbines are available in the turbine data.";
const MSG_TURBINE_DATA: &str = "An error occurred while handling the turbine data.";

/// Progress of a single request. A failure is terminal at the stage it
/// happens in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Received,
    AddressValidated,
    Geocoded,
    PlanarTransformed,
    DatasetLoaded,
    NearestFound,
    TurbineCoordinateResolved,
    Responded,
}

pub struct Locator<G> {
    geocoder: G,
    transformer: Arc<Transformer>,
    dataset: TurbineDataset,
    error_log: ErrorLog,
}

impl<G: Geocoder> Locator<G> {
    pub fn new(
        geocoder: G,
        transformer: Arc<Transformer>,
        dataset: TurbineDataset,
        error_log: ErrorLog,
    ) -> Self {
        Locator {
            geocoder,
            transformer,
            dataset,
            error_log,
        }
    }

    pub fn dataset(&self) -> &TurbineDataset {
        &self.dataset
    }

    /// Run the pipeline for one address, recording any failure.
    pub async fn locate(&self, address: Option<&str>) -> Result<CalculateResponse, Failure> {
        let request_id = Uuid::new_v4();
        match self.run(request_id, address).await {
            Ok(response) => {
                log::info!(
                    "[{}] nearest turbine {} at {} km",
                    request_id,
                    response.turbine_id,
                    response.distance_km
                );
                Ok(response)
            }
            Err((stage, failure)) => {
                log::error!(
                    "[{}] failed after {:?}: {} ({})",
                    request_id,
                    stage,
                    failure.public,
                    failure.detail
                );
                self.error_log
                    .record(&failure.public, &failure.detail)
                    .await;
                Err(failure)
            }
        }
    }

    async fn run(
        &self,
        request_id: Uuid,
        address: Option<&str>,
    ) -> Result<CalculateResponse, (Stage, Failure)> {
        let mut stage = Stage::Received;
        let mut advance = |next: Stage| {
            log::debug!("[{}] {:?} -> {:?}", request_id, stage, next);
            stage = next;
            next
        };

        let address = match address.map(str::trim) {
            Some(a) if !a.is_empty() => a,
            _ => {
                return Err((
                    Stage::Received,
                    Failure::bad_request(
                        MSG_NO_ADDRESS,
                        "User did not provide an address in the request.",
                    ),
                ))
            }
        };
        let at = advance(Stage::AddressValidated);

        let geocoded = self
            .geocoder
            .geocode(address)
            .await
            .map_err(|e| (at, geocode_failure(e)))?;
        let at = advance(Stage::Geocoded);

        let query = self.transformer.to_planar(geocoded);
        if !query.is_finite() {
            let e = LocatorError::Transform(format!(
                "{:?} -> ({}, {}) via {}",
                geocoded,
                query.x,
                query.y,
                self.transformer.describe()
            ));
            return Err((
                at,
                Failure::internal(
                    MSG_TRANSFORM_FAILED,
                    format!("Coordinate transformation error. Error: {}", e),
                ),
            ));
        }
        let at = advance(Stage::PlanarTransformed);

        let records = self
            .dataset
            .load()
            .await
            .map_err(|e| (at, load_failure(e)))?;
        let at = advance(Stage::DatasetLoaded);

        let nearest = find_nearest(query, &records).map_err(|e| {
            (
                at,
                Failure::bad_request(MSG_NO_TURBINES, format!("Nearest turbine search: {}", e)),
            )
        })?;
        let at = advance(Stage::NearestFound);

        let location = nearest.record.location;
        if !location.is_finite() {
            let e = LocatorError::Transform(format!(
                "turbine {} at ({}, {}) has no finite location",
                nearest.record.turbine_id, nearest.record.planar.x, nearest.record.planar.y
            ));
            return Err((
                at,
                Failure::internal(
                    MSG_TURBINE_DATA,
                    format!("Could not get the turbine coordinates. Error: {}", e),
                ),
            ));
        }
        let at = advance(Stage::TurbineCoordinateResolved);

        let distance_km = to_km(nearest.distance).map_err(|e| {
            (
                at,
                Failure::internal(MSG_TURBINE_DATA, format!("Distance conversion error. Error: {}", e)),
            )
        })?;
        let response = CalculateResponse {
            success: true,
            distance_km,
            geocoded_address: geocoded,
            turbine_id: nearest.record.turbine_id.clone(),
            turbine_location: TurbineLocation::from(location),
        };
        advance(Stage::Responded);
        Ok(response)
    }
}

/// Metres to kilometres, one decimal place. Rounds the exact binary value,
/// with exact halves going to the even digit.
pub fn to_km(metres: f64) -> Result<f64, LocatorError> {
    format!("{:.1}", metres / 1000.0)
        .parse()
        .map_err(|e| LocatorError::Transform(format!("{} m: {}", metres, e)))
}

fn geocode_failure(e: LocatorError) -> Failure {
    match e {
        LocatorError::NotFound(detail) => Failure::bad_request(MSG_NOT_LOCATED, detail),
        other => Failure::internal(
            MSG_GEOCODE_FAILED,
            format!("An unexpected error occurred while geocoding address. Error: {}", other),
        ),
    }
}

fn load_failure(e: LocatorError) -> Failure {
    match e {
        LocatorError::Config(_) | LocatorError::NotFound(_) => {
            Failure::bad_request(MSG_LOAD_FAILED, e.to_string())
        }
        other => Failure::bad_request(
            MSG_LOAD_UNEXPECTED,
            format!("Error while reading turbine data file: {}", other),
        ),
    }
}
