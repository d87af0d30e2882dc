use serde::Deserialize;
use std::path::PathBuf;

use crate::error::LocatorError;

/// Column bindings and location of the turbine dataset.
///
/// All four settings are required, but they are only checked when the
/// dataset is loaded so that a misconfigured server still starts and
/// reports the problem per request.
#[derive(Clone, Debug, Deserialize)]
pub struct DatasetConfig {
    pub turbine_data_filepath: Option<String>,
    pub turbine_id_column: Option<String>,
    pub x_coordinate_column: Option<String>,
    pub y_coordinate_column: Option<String>,
    #[serde(default = "default_true")]
    pub turbine_data_cache: bool,
}

/// Validated dataset settings.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSource {
    pub path: PathBuf,
    pub id_column: String,
    pub x_column: String,
    pub y_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            turbine_data_filepath: None,
            turbine_id_column: None,
            x_coordinate_column: None,
            y_coordinate_column: None,
            turbine_data_cache: default_true(),
        }
    }
}

impl DatasetConfig {
    pub fn source(&self) -> Result<DatasetSource, LocatorError> {
        Ok(DatasetSource {
            path: PathBuf::from(required(
                "TURBINE_DATA_FILEPATH",
                &self.turbine_data_filepath,
            )?),
            id_column: required("TURBINE_ID_COLUMN", &self.turbine_id_column)?,
            x_column: required("X_COORDINATE_COLUMN", &self.x_coordinate_column)?,
            y_column: required("Y_COORDINATE_COLUMN", &self.y_coordinate_column)?,
        })
    }
}

fn required(name: &str, value: &Option<String>) -> Result<String, LocatorError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(LocatorError::Config(format!(
            "Environment variable '{}' is missing or empty.",
            name
        ))),
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,
    #[serde(default = "default_user_agent")]
    pub geocoder_user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub geocoder_timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        GeocoderConfig {
            geocoder_url: default_geocoder_url(),
            geocoder_user_agent: default_user_agent(),
            geocoder_timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_geographic_crs")]
    pub geographic_crs: u16,
    #[serde(default = "default_planar_crs")]
    pub planar_crs: u16,
    #[serde(default = "default_error_log_path")]
    pub error_log_path: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            geographic_crs: default_geographic_crs(),
            planar_crs: default_planar_crs(),
            error_log_path: default_error_log_path(),
            static_dir: default_static_dir(),
        }
    }
}

/// Process configuration, read once at startup and immutable afterwards.
///
/// Each section is read with its own `envy` pass: flattened sections lose
/// envy's typed parsing for non-string fields.
#[derive(Clone, Debug)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub geocoder: GeocoderConfig,
    pub service: ServiceConfig,
}

impl Config {
    pub fn from_env() -> Result<Config, envy::Error> {
        Ok(Config {
            dataset: envy::from_env::<DatasetConfig>()?,
            geocoder: envy::from_env::<GeocoderConfig>()?,
            service: envy::from_env::<ServiceConfig>()?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataset: DatasetConfig::default(),
            geocoder: GeocoderConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "turbine_distance_tool".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_geographic_crs() -> u16 {
    4326
}

// British National Grid, metres
fn default_planar_crs() -> u16 {
    27700
}

fn default_error_log_path() -> PathBuf {
    PathBuf::from("error_log.log")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
