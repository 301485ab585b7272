use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrendError;

/// Acquisition tag carried by every raster. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStamp {
    pub year: i32,
    /// Calendar month, 1–12.
    pub month: u32,
    /// Milliseconds since the Unix epoch, UTC.
    pub millis: i64,
}

impl TimeStamp {
    /// Canonical composite timestamp: midnight UTC on the first day of
    /// the given month.
    pub fn first_of_month(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        let millis = Utc
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .map_or(0, |dt| dt.timestamp_millis());
        Self { year, month, millis }
    }

    /// Partition key used by the aggregator.
    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

/// JSON stacks encode masked pixels as `null`; map them to NaN on read.
fn null_as_nan_vec<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<f32>, D::Error> {
    let v: Vec<Option<f32>> = Vec::deserialize(d)?;
    Ok(v.into_iter().map(|x| x.unwrap_or(f32::NAN)).collect())
}

/// A 2D raster of per-pixel f32 values over a geographic bounding box,
/// row-major, row 0 at the northern edge. `f32::NAN` marks a missing
/// (cloud-masked) pixel. Values are Kelvin×100 as retrieved, °C after
/// [`crate::convert::to_celsius`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raster {
    /// Row-major pixel values; NaN = masked.
    #[serde(deserialize_with = "null_as_nan_vec")]
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub stamp: TimeStamp,
}

impl Raster {
    /// Create a raster filled with the given value.
    #[allow(clippy::too_many_arguments)]
    pub fn filled(
        width: usize,
        height: usize,
        min_lon: f64,
        max_lon: f64,
        min_lat: f64,
        max_lat: f64,
        stamp: TimeStamp,
        fill: f32,
    ) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
            min_lon,
            max_lon,
            min_lat,
            max_lat,
            stamp,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    /// Longitude/latitude of a pixel centre.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let lon = self.min_lon
            + (col as f64 + 0.5) / self.width as f64 * (self.max_lon - self.min_lon);
        let lat = self.max_lat
            - (row as f64 + 0.5) / self.height as f64 * (self.max_lat - self.min_lat);
        (lon, lat)
    }

    /// True if `other` covers the same grid and bounds (bounds compared
    /// to ~1e-9°, well below any pixel size in use).
    pub fn same_shape(&self, other: &Raster) -> bool {
        self.width == other.width
            && self.height == other.height
            && (self.min_lon - other.min_lon).abs() < 1e-9
            && (self.max_lon - other.max_lon).abs() < 1e-9
            && (self.min_lat - other.min_lat).abs() < 1e-9
            && (self.max_lat - other.max_lat).abs() < 1e-9
    }

    pub fn ensure_same_shape(&self, other: &Raster) -> Result<(), TrendError> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(TrendError::ShapeMismatch {
                expected: self.shape_desc(),
                found: other.shape_desc(),
            })
        }
    }

    fn shape_desc(&self) -> String {
        format!(
            "{}×{} [{:.4}..{:.4}°E, {:.4}..{:.4}°N]",
            self.width, self.height, self.min_lon, self.max_lon, self.min_lat, self.max_lat
        )
    }

    /// Count of non-masked pixels.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_of_month_epoch_millis() {
        // 2020-01-01T00:00:00Z
        let t = TimeStamp::first_of_month(2020, 1);
        assert_eq!(t.millis, 1_577_836_800_000);
        assert_eq!(t.key(), (2020, 1));
    }

    #[test]
    fn first_of_month_is_monotone_within_year() {
        let mut prev = TimeStamp::first_of_month(2001, 1).millis;
        for m in 2..=12 {
            let cur = TimeStamp::first_of_month(2001, m).millis;
            assert!(cur > prev, "month {m} not after month {}", m - 1);
            prev = cur;
        }
    }

    #[test]
    fn shape_check_catches_grid_and_bounds() {
        let stamp = TimeStamp::first_of_month(2001, 1);
        let a = Raster::filled(4, 4, 76.0, 77.0, 12.0, 13.0, stamp, 0.0);
        let b = Raster::filled(4, 4, 76.0, 77.0, 12.0, 13.0, stamp, 1.0);
        let c = Raster::filled(5, 4, 76.0, 77.0, 12.0, 13.0, stamp, 0.0);
        let d = Raster::filled(4, 4, 75.0, 77.0, 12.0, 13.0, stamp, 0.0);
        assert!(a.ensure_same_shape(&b).is_ok());
        assert!(matches!(
            a.ensure_same_shape(&c),
            Err(TrendError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            a.ensure_same_shape(&d),
            Err(TrendError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn masked_pixels_roundtrip_as_null() {
        let stamp = TimeStamp::first_of_month(2001, 1);
        let mut r = Raster::filled(2, 2, 0.0, 1.0, 0.0, 1.0, stamp, 20.0);
        r.set(0, 1, f32::NAN);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("null"));
        let back: Raster = serde_json::from_str(&json).unwrap();
        assert!(back.get(0, 1).is_nan());
        assert_eq!(back.get(0, 0), 20.0);
        assert_eq!(back.valid_count(), 3);
    }
}
