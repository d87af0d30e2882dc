use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

use crate::config::{DatasetConfig, DatasetSource};
use crate::error::LocatorError;
use crate::models::{PlanarPoint, TurbineId, TurbineRecord};
use crate::projection::Transformer;

/// Read and normalize the whole dataset. Any bad row fails the load.
pub fn read_records(
    source: &DatasetSource,
    transformer: &Transformer,
) -> Result<Vec<TurbineRecord>, LocatorError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&source.path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            LocatorError::Parse(format!(
                "Column '{}' not found in {}",
                name,
                source.path.display()
            ))
        })
    };
    let id_idx = column(&source.id_column)?;
    let x_idx = column(&source.x_column)?;
    let y_idx = column(&source.y_column)?;

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        // header is line 1
        let line = i + 2;

        let id_cell = row.get(id_idx).unwrap_or_default();
        if id_cell.is_empty() {
            return Err(LocatorError::Parse(format!(
                "Line {}: empty '{}' value",
                line, source.id_column
            )));
        }

        let planar = PlanarPoint {
            x: number(row.get(x_idx), &source.x_column, line)?,
            y: number(row.get(y_idx), &source.y_column, line)?,
        };
        let location = transformer.to_geographic(planar);
        if !location.is_finite() {
            return Err(LocatorError::Parse(format!(
                "Line {}: ({}, {}) does not reproject to a finite coordinate",
                line, planar.x, planar.y
            )));
        }

        records.push(TurbineRecord {
            turbine_id: TurbineId::parse(id_cell),
            planar,
            location,
        });
    }

    Ok(records)
}

fn number(cell: Option<&str>, column: &str, line: usize) -> Result<f64, LocatorError> {
    let cell = cell.unwrap_or_default();
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LocatorError::Parse(format!(
            "Line {}: '{}' value {:?} is not a finite number",
            line, column, cell
        ))),
    }
}

struct Cached {
    source: DatasetSource,
    stamp: FileStamp,
    records: Arc<Vec<TurbineRecord>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

/// Read-through access to the dataset.
///
/// Configuration and file existence are checked on every call. With caching
/// enabled the parsed records are reused until the file's modification time
/// or size changes; otherwise the file is re-read each time.
pub struct TurbineDataset {
    config: DatasetConfig,
    transformer: Arc<Transformer>,
    cached: RwLock<Option<Cached>>,
}

impl TurbineDataset {
    pub fn new(config: DatasetConfig, transformer: Arc<Transformer>) -> Self {
        TurbineDataset {
            config,
            transformer,
            cached: RwLock::new(None),
        }
    }

    pub async fn load(&self) -> Result<Arc<Vec<TurbineRecord>>, LocatorError> {
        let source = self.config.source()?;
        let stamp = file_stamp(&source.path).await?;

        if self.config.turbine_data_cache {
            if let (Some(cached), Some(stamp)) = (self.cached.read().await.as_ref(), stamp) {
                if cached.stamp == stamp && cached.source == source {
                    return Ok(cached.records.clone());
                }
            }
        }

        let transformer = self.transformer.clone();
        let read_source = source.clone();
        let records = tokio::task::spawn_blocking(move || read_records(&read_source, &transformer))
            .await
            .map_err(|e| LocatorError::Parse(format!("Dataset load task failed: {}", e)))??;
        let records = Arc::new(records);

        log::info!(
            "Loaded {} turbines from {}",
            records.len(),
            source.path.display()
        );

        if self.config.turbine_data_cache {
            if let Some(stamp) = stamp {
                *self.cached.write().await = Some(Cached {
                    source,
                    stamp,
                    records: records.clone(),
                });
            }
        }

        Ok(records)
    }
}

/// `None` when the platform has no modification times, which disables caching.
async fn file_stamp(path: &Path) -> Result<Option<FileStamp>, LocatorError> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        LocatorError::NotFound(format!(
            "File does not exist at the provided path: {} ({})",
            path.display(),
            e
        ))
    })?;
    if !meta.is_file() {
        return Err(LocatorError::NotFound(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }
    Ok(meta.modified().ok().map(|modified| FileStamp {
        modified,
        len: meta.len(),
    }))
}
