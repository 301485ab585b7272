//! Linear extrapolation of monthly means to future years.

use crate::error::TrendError;
use crate::raster::{Raster, TimeStamp};
use crate::trend::TrendSlope;

/// Extrapolate one month to a target year:
/// `projected = base + slope × (target_year − base_year)` per pixel.
///
/// NaN in either the base mean or the slope yields NaN at that pixel.
/// The slope and base must be for the same calendar month and grid.
pub fn project(base: &Raster, slope: &TrendSlope, target_year: i32) -> Result<Raster, TrendError> {
    if slope.month != base.stamp.month {
        return Err(TrendError::MonthMismatch {
            slope_month: slope.month,
            base_month: base.stamp.month,
        });
    }
    if slope.width != base.width || slope.height != base.height {
        return Err(TrendError::ShapeMismatch {
            expected: format!("{}×{}", base.width, base.height),
            found: format!("{}×{}", slope.width, slope.height),
        });
    }

    let dy = (target_year - base.stamp.year) as f32;
    let data = base
        .data
        .iter()
        .zip(slope.data.iter())
        .map(|(&b, &s)| b + s * dy)
        .collect();

    Ok(Raster {
        data,
        width: base.width,
        height: base.height,
        min_lon: base.min_lon,
        max_lon: base.max_lon,
        min_lat: base.min_lat,
        max_lat: base.max_lat,
        stamp: TimeStamp::first_of_month(target_year, slope.month),
    })
}

/// Project all 12 months of every target year from the base year's
/// monthly means, ascending (year, month).
///
/// Fails with [`TrendError::MissingReferenceData`] when the base year
/// lacks a monthly mean for some month, or no slope was fit for it.
pub fn project_years(
    means: &[Raster],
    slopes: &[TrendSlope],
    base_year: i32,
    target_years: &[i32],
) -> Result<Vec<Raster>, TrendError> {
    let mut years = target_years.to_vec();
    years.sort_unstable();
    years.dedup();

    let mut out = Vec::with_capacity(years.len() * 12);
    for &year in &years {
        for month in 1..=12u32 {
            let base = means
                .iter()
                .find(|r| r.stamp.year == base_year && r.stamp.month == month)
                .ok_or(TrendError::MissingReferenceData {
                    year: base_year,
                    month,
                    kind: "base monthly mean",
                })?;
            let slope = slopes.iter().find(|s| s.month == month).ok_or(
                TrendError::MissingReferenceData {
                    year: base_year,
                    month,
                    kind: "trend slope",
                },
            )?;
            out.push(project(base, slope, year)?);
        }
    }
    Ok(out)
}
