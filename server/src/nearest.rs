use std::cmp::Ordering;

use crate::error::LocatorError;
use crate::models::{PlanarPoint, TurbineRecord};

#[derive(Debug, PartialEq)]
pub struct Nearest<'a> {
    pub record: &'a TurbineRecord,
    /// Planar distance in grid units (metres).
    pub distance: f64,
}

/// Linear scan for the record closest to `query`.
///
/// Only a strictly smaller distance replaces the current best, so on an
/// exact tie the record that comes first in the dataset wins.
pub fn find_nearest(
    query: PlanarPoint,
    records: &[TurbineRecord],
) -> Result<Nearest<'_>, LocatorError> {
    let mut best: Option<Nearest> = None;

    for record in records {
        let distance = query.distance(&record.planar);
        let closer = match &best {
            None => true,
            Some(b) => distance.total_cmp(&b.distance) == Ordering::Less,
        };
        if closer {
            best = Some(Nearest { record, distance });
        }
    }

    best.ok_or(LocatorError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, TurbineId};

    fn turbine(id: &str, x: f64, y: f64) -> TurbineRecord {
        TurbineRecord {
            turbine_id: TurbineId::parse(id),
            planar: PlanarPoint { x, y },
            location: GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
        }
    }

    #[test]
    fn test_three_turbines() {
        let records = vec![
            turbine("T1", 0.0, 0.0),
            turbine("T2", 1000.0, 0.0),
            turbine("T3", 0.0, 2000.0),
        ];
        let nearest = find_nearest(PlanarPoint { x: 100.0, y: 0.0 }, &records).unwrap();
        assert_eq!(nearest.record.turbine_id, TurbineId::Text("T1".to_string()));
        assert!((nearest.distance - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty() {
        let err = find_nearest(PlanarPoint { x: 0.0, y: 0.0 }, &[]).unwrap_err();
        assert!(matches!(err, LocatorError::Empty));
    }

    #[test]
    fn test_tie_keeps_earliest() {
        let records = vec![
            turbine("far", 50.0, 50.0),
            turbine("east", 10.0, 0.0),
            turbine("west", -10.0, 0.0),
            turbine("north", 0.0, 10.0),
        ];
        let nearest = find_nearest(PlanarPoint { x: 0.0, y: 0.0 }, &records).unwrap();
        assert_eq!(nearest.record.turbine_id, TurbineId::Text("east".to_string()));
        assert_eq!(nearest.distance, 10.0);
    }

    #[test]
    fn test_duplicate_records_keep_first() {
        let records = vec![turbine("1", 5.0, 5.0), turbine("2", 5.0, 5.0)];
        let nearest = find_nearest(PlanarPoint { x: 0.0, y: 0.0 }, &records).unwrap();
        assert_eq!(nearest.record.turbine_id, TurbineId::Number(1));
    }

    #[test]
    fn test_result_is_minimum() {
        let records: Vec<TurbineRecord> = (0..200)
            .map(|i| {
                let f = i as f64;
                turbine(
                    &i.to_string(),
                    (f * 7919.0) % 1013.0 - 500.0,
                    (f * 104_729.0) % 997.0 - 500.0,
                )
            })
            .collect();
        let query = PlanarPoint { x: 12.5, y: -40.0 };

        let nearest = find_nearest(query, &records).unwrap();
        for record in &records {
            assert!(nearest.distance <= query.distance(&record.planar));
        }
    }

    #[test]
    fn test_single_record() {
        let records = vec![turbine("only", 3.0, 4.0)];
        let nearest = find_nearest(PlanarPoint { x: 0.0, y: 0.0 }, &records).unwrap();
        assert_eq!(nearest.distance, 5.0);
    }
}
