//! Per-month linear trend fitting.
//!
//! For each calendar month, the monthly means of that month across years
//! are regressed per pixel against the year offset from a fixed reference
//! year (ordinary least squares). Only the slope is retained; the
//! intercept plays no role downstream.

use serde::{Deserialize, Serialize};

use crate::error::TrendError;
use crate::raster::Raster;

/// Per-pixel rate of change (units per year) for one calendar month,
/// independent of year. NaN where a pixel had fewer than 2 valid samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSlope {
    /// Calendar month, 1–12.
    pub month: u32,
    /// Anchor year of the regression's independent variable.
    pub ref_year: i32,
    /// Row-major slope values; NaN = undetermined.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

/// Fit the OLS slope for one calendar month.
///
/// `means` is the full monthly-mean set; rasters of other months are
/// ignored. Fails with [`TrendError::InsufficientHistory`] when fewer
/// than 2 distinct years carry a mean for this month — a silent zero
/// slope would be indistinguishable from a real flat trend.
pub fn fit_month(means: &[Raster], month: u32, ref_year: i32) -> Result<TrendSlope, TrendError> {
    let group: Vec<&Raster> = means.iter().filter(|r| r.stamp.month == month).collect();

    let mut years: Vec<i32> = group.iter().map(|r| r.stamp.year).collect();
    years.sort_unstable();
    years.dedup();
    if years.len() < 2 {
        return Err(TrendError::InsufficientHistory {
            month,
            years_observed: years.len(),
        });
    }

    let first = group[0];
    for g in &group[1..] {
        first.ensure_same_shape(g)?;
    }

    // Per-pixel accumulators for slope = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²).
    let n = first.data.len();
    let mut sx = vec![0f64; n];
    let mut sy = vec![0f64; n];
    let mut sxx = vec![0f64; n];
    let mut sxy = vec![0f64; n];
    let mut cnt = vec![0u32; n];

    for g in &group {
        let x = (g.stamp.year - ref_year) as f64;
        for (i, &v) in g.data.iter().enumerate() {
            if v.is_finite() {
                let y = v as f64;
                sx[i] += x;
                sy[i] += y;
                sxx[i] += x * x;
                sxy[i] += x * y;
                cnt[i] += 1;
            }
        }
    }

    let data = (0..n)
        .map(|i| {
            let c = cnt[i] as f64;
            if cnt[i] < 2 {
                return f32::NAN;
            }
            let denom = c * sxx[i] - sx[i] * sx[i];
            if denom.abs() < 1e-12 {
                f32::NAN
            } else {
                ((c * sxy[i] - sx[i] * sy[i]) / denom) as f32
            }
        })
        .collect();

    Ok(TrendSlope {
        month,
        ref_year,
        data,
        width: first.width,
        height: first.height,
    })
}

/// Fit slopes for every calendar month present in `means`, ascending by
/// month. Fails on the first month with insufficient history.
pub fn fit_monthly_trends(means: &[Raster], ref_year: i32) -> Result<Vec<TrendSlope>, TrendError> {
    let mut months: Vec<u32> = means.iter().map(|r| r.stamp.month).collect();
    months.sort_unstable();
    months.dedup();

    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        return months
            .par_iter()
            .map(|&m| fit_month(means, m, ref_year))
            .collect();
    }

    #[cfg(not(feature = "threading"))]
    months
        .iter()
        .map(|&m| fit_month(means, m, ref_year))
        .collect()
}
