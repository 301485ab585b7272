//! Region-mean reduction into chart series.
//!
//! The external charting surface consumes a flat list of
//! (timestamp, value) samples; this module reduces each tagged raster to
//! its region mean and orders the samples for plotting.

use serde::{Deserialize, Serialize};

use crate::error::TrendError;
use crate::raster::Raster;

/// Geographic bounding box used as the chart reduction region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Region {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Region {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// One chart sample: the region-mean value of a tagged raster.
/// `value` is None when every pixel inside the region is masked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub month: u32,
    pub millis: i64,
    pub value: Option<f32>,
}

/// Mean of the unmasked pixels whose centres fall inside `region`
/// (whole raster when `region` is None).
pub fn region_mean(raster: &Raster, region: Option<&Region>) -> Option<f32> {
    let mut sum = 0f64;
    let mut count = 0u64;
    for row in 0..raster.height {
        for col in 0..raster.width {
            if let Some(reg) = region {
                let (lon, lat) = raster.pixel_center(row, col);
                if !reg.contains(lon, lat) {
                    continue;
                }
            }
            let v = raster.get(row, col);
            if v.is_finite() {
                sum += v as f64;
                count += 1;
            }
        }
    }
    if count > 0 {
        Some((sum / count as f64) as f32)
    } else {
        None
    }
}

/// Reduce a raster collection to chart samples, ascending (year, month).
pub fn series_by_region(rasters: &[Raster], region: Option<&Region>) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = rasters
        .iter()
        .map(|r| SeriesPoint {
            year: r.stamp.year,
            month: r.stamp.month,
            millis: r.stamp.millis,
            value: region_mean(r, region),
        })
        .collect();
    points.sort_by_key(|p| (p.year, p.month));
    points
}

/// Chart rendering boundary. Implementations own the artifact format
/// (JSON file, PNG, terminal table); the core only supplies ordered
/// samples and a title.
pub trait SeriesSink {
    fn render(&mut self, title: &str, points: &[SeriesPoint]) -> Result<(), TrendError>;
}
