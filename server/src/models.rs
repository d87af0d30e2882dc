use serde::{Deserialize, Serialize};
use std::fmt;

/// Latitude/longitude in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Easting/northing on the planar grid, in metres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &PlanarPoint) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Turbine identifier as found in the dataset: integer cells stay numeric.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TurbineId {
    Number(i64),
    Text(String),
}

impl TurbineId {
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        match cell.parse::<i64>() {
            Ok(n) => TurbineId::Number(n),
            Err(_) => TurbineId::Text(cell.to_string()),
        }
    }
}

impl fmt::Display for TurbineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurbineId::Number(n) => write!(f, "{}", n),
            TurbineId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurbineRecord {
    pub turbine_id: TurbineId,
    pub planar: PlanarPoint,
    pub location: GeoPoint,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TurbineLocation {
    pub lat: f64,
    pub lon: f64,
}

impl From<GeoPoint> for TurbineLocation {
    fn from(p: GeoPoint) -> Self {
        TurbineLocation {
            lat: p.latitude,
            lon: p.longitude,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalculateResponse {
    pub success: bool,
    pub distance_km: f64,
    pub geocoded_address: GeoPoint,
    pub turbine_id: TurbineId,
    pub turbine_location: TurbineLocation,
}
