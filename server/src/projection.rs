use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::LocatorError;
use crate::models::{GeoPoint, PlanarPoint};

pub struct Transformer {
    geographic: Proj,
    planar: Proj,
    geographic_epsg: u16,
    planar_epsg: u16,
}

impl Transformer {
    /// Build the transformer pair.
    ///
    /// The planar system must be a projected CRS in metres; distances are
    /// reported in kilometres by dividing by 1000.
    pub fn new(geographic_epsg: u16, planar_epsg: u16) -> Result<Self, LocatorError> {
        let geographic_def = proj_string(geographic_epsg)?;
        let planar_def = proj_string(planar_epsg)?;

        if !is_longlat(geographic_def) {
            return Err(LocatorError::Config(format!(
                "EPSG:{} is not a geographic (longlat) CRS",
                geographic_epsg
            )));
        }
        if is_longlat(planar_def) || !planar_def.contains("+units=m") {
            return Err(LocatorError::Config(format!(
                "EPSG:{} is not a projected CRS in metres",
                planar_epsg
            )));
        }

        Ok(Transformer {
            geographic: parse(geographic_epsg, geographic_def)?,
            planar: parse(planar_epsg, planar_def)?,
            geographic_epsg,
            planar_epsg,
        })
    }

    pub fn to_planar(&self, point: GeoPoint) -> PlanarPoint {
        // proj4rs works in radians for geographic systems
        let mut p = (point.longitude.to_radians(), point.latitude.to_radians(), 0.0);
        match transform(&self.geographic, &self.planar, &mut p) {
            Ok(()) => PlanarPoint { x: p.0, y: p.1 },
            Err(e) => {
                log::debug!(
                    "EPSG:{} -> EPSG:{} failed for {:?}: {:?}",
                    self.geographic_epsg,
                    self.planar_epsg,
                    point,
                    e
                );
                PlanarPoint {
                    x: f64::NAN,
                    y: f64::NAN,
                }
            }
        }
    }

    pub fn to_geographic(&self, point: PlanarPoint) -> GeoPoint {
        let mut p = (point.x, point.y, 0.0);
        match transform(&self.planar, &self.geographic, &mut p) {
            Ok(()) => GeoPoint {
                latitude: p.1.to_degrees(),
                longitude: p.0.to_degrees(),
            },
            Err(e) => {
                log::debug!(
                    "EPSG:{} -> EPSG:{} failed for {:?}: {:?}",
                    self.planar_epsg,
                    self.geographic_epsg,
                    point,
                    e
                );
                GeoPoint {
                    latitude: f64::NAN,
                    longitude: f64::NAN,
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        format!("EPSG:{} <-> EPSG:{}", self.geographic_epsg, self.planar_epsg)
    }
}

fn proj_string(epsg: u16) -> Result<&'static str, LocatorError> {
    crs_definitions::from_code(epsg)
        .map(|def| def.proj4)
        .ok_or_else(|| {
            LocatorError::Config(format!(
                "EPSG:{} is not in the crs-definitions database",
                epsg
            ))
        })
}

fn parse(epsg: u16, def: &str) -> Result<Proj, LocatorError> {
    Proj::from_proj_string(def)
        .map_err(|e| LocatorError::Config(format!("Invalid projection EPSG:{}: {:?}", epsg, e)))
}

fn is_longlat(def: &str) -> bool {
    def.contains("+proj=longlat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bng() -> Transformer {
        Transformer::new(4326, 27700).unwrap()
    }

    #[test]
    fn test_london_to_bng() {
        // Trafalgar Square is roughly E 530000, N 180400
        let p = bng().to_planar(GeoPoint {
            latitude: 51.508,
            longitude: -0.128,
        });
        assert!(p.is_finite());
        assert_abs_diff_eq!(p.x, 530_000.0, epsilon = 1_000.0);
        assert_abs_diff_eq!(p.y, 180_400.0, epsilon = 1_000.0);
    }

    #[test]
    fn test_roundtrip_stability() {
        let t = bng();
        let grid_points = [
            (530_000.0, 180_000.0),
            (100.0, 0.0),
            (0.0, 0.0),
            (326_000.0, 673_000.0),
            (460_000.0, 1_200_000.0),
        ];

        for (x, y) in grid_points {
            let geo = t.to_geographic(PlanarPoint { x, y });
            let again = t.to_geographic(t.to_planar(geo));
            assert!(geo.is_finite(), "({}, {}) not finite", x, y);
            assert_abs_diff_eq!(geo.latitude, again.latitude, epsilon = 1e-6);
            assert_abs_diff_eq!(geo.longitude, again.longitude, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_non_finite_input_yields_non_finite_output() {
        let t = bng();
        let p = t.to_planar(GeoPoint {
            latitude: f64::NAN,
            longitude: 0.0,
        });
        assert!(!p.is_finite());

        let g = t.to_geographic(PlanarPoint {
            x: f64::NAN,
            y: 180_000.0,
        });
        assert!(!g.is_finite());
    }

    #[test]
    fn test_rejects_geographic_planar_crs() {
        let err = Transformer::new(4326, 4326).err().unwrap();
        assert!(matches!(err, LocatorError::Config(_)));
    }

    #[test]
    fn test_rejects_projected_geographic_crs() {
        assert!(Transformer::new(27700, 27700).is_err());
    }

    #[test]
    fn test_unknown_epsg() {
        let err = Transformer::new(4326, 1).err().unwrap();
        assert!(err.to_string().contains("EPSG:1"));
    }
}
