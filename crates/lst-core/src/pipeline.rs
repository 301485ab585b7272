//! Pipeline orchestrators: runs the stages in order for the two modes.
//!
//! Climatology mode: fetch → Celsius → monthly means per year window →
//! region-mean series. No trend fitting.
//!
//! Projection mode: fetch training window → Celsius → monthly means →
//! per-month OLS slopes → extrapolation for each (target year × month) →
//! region-mean series over the projections.
//!
//! Both are stateless read-compute-emit runs over immutable collections.

use std::ops::RangeInclusive;

use crate::aggregate::{filter_years, monthly_means};
use crate::convert::to_celsius_all;
use crate::error::TrendError;
use crate::project::project_years;
use crate::raster::Raster;
use crate::series::{series_by_region, Region, SeriesPoint};
use crate::source::{ImageQuery, ImageSource};
use crate::trend::{fit_monthly_trends, TrendSlope};

/// MOD11A1 daily LST collection.
pub const DEFAULT_COLLECTION: &str = "MODIS/061/MOD11A1";
/// Daytime 1 km LST band.
pub const DEFAULT_BAND: &str = "LST_Day_1km";

/// Parameters for aggregation-only runs. Defaults mirror the operational
/// setup: two decadal windows charted side by side.
#[derive(Debug, Clone)]
pub struct ClimatologyParams {
    pub collection: String,
    pub band: String,
    pub windows: Vec<RangeInclusive<i32>>,
    pub region: Option<Region>,
}

impl Default for ClimatologyParams {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            band: DEFAULT_BAND.to_string(),
            windows: vec![2001..=2010, 2011..=2020],
            region: None,
        }
    }
}

/// One aggregated year window with its chart series.
pub struct ClimatologyWindow {
    pub years: RangeInclusive<i32>,
    pub means: Vec<Raster>,
    pub series: Vec<SeriesPoint>,
}

pub struct ClimatologyResult {
    pub windows: Vec<ClimatologyWindow>,
}

/// Run the aggregation-only pipeline over each configured year window.
pub fn run_climatology(
    source: &dyn ImageSource,
    params: &ClimatologyParams,
) -> Result<ClimatologyResult, TrendError> {
    let mut windows = Vec::with_capacity(params.windows.len());
    for years in &params.windows {
        let query = ImageQuery::new(&params.collection, &params.band, *years.start(), *years.end());
        let raw = source.fetch_images(&query)?;
        let celsius = to_celsius_all(&raw);
        let means = monthly_means(&filter_years(&celsius, years.clone()))?;
        let series = series_by_region(&means, params.region.as_ref());
        windows.push(ClimatologyWindow {
            years: years.clone(),
            means,
            series,
        });
    }
    Ok(ClimatologyResult { windows })
}

/// Parameters for aggregation + projection runs. Defaults mirror the
/// operational setup: 20 training years, projections anchored on the
/// last training year.
#[derive(Debug, Clone)]
pub struct ProjectionParams {
    pub collection: String,
    pub band: String,
    pub training_years: RangeInclusive<i32>,
    /// Reference year whose monthly means anchor the extrapolation.
    pub base_year: i32,
    pub target_years: Vec<i32>,
    pub region: Option<Region>,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            band: DEFAULT_BAND.to_string(),
            training_years: 2001..=2020,
            base_year: 2020,
            target_years: vec![2028, 2029, 2030],
            region: None,
        }
    }
}

pub struct ProjectionResult {
    /// Monthly means over the training window, ascending (year, month).
    pub means: Vec<Raster>,
    /// One slope per calendar month, ascending by month.
    pub slopes: Vec<TrendSlope>,
    /// One projection per (target year × month), ascending (year, month).
    pub projections: Vec<Raster>,
    /// Region-mean series over the projections.
    pub series: Vec<SeriesPoint>,
}

/// Run the aggregation + projection pipeline.
pub fn run_projection(
    source: &dyn ImageSource,
    params: &ProjectionParams,
) -> Result<ProjectionResult, TrendError> {
    if !params.training_years.contains(&params.base_year) {
        return Err(TrendError::InvalidParams(format!(
            "base year {} outside training window {}-{}",
            params.base_year,
            params.training_years.start(),
            params.training_years.end()
        )));
    }
    if let Some(&y) = params
        .target_years
        .iter()
        .find(|y| params.training_years.contains(*y))
    {
        return Err(TrendError::InvalidParams(format!(
            "target year {y} lies inside the training window"
        )));
    }

    let query = ImageQuery::new(
        &params.collection,
        &params.band,
        *params.training_years.start(),
        *params.training_years.end(),
    );
    let raw = source.fetch_images(&query)?;
    let celsius = to_celsius_all(&raw);
    let means = monthly_means(&filter_years(&celsius, params.training_years.clone()))?;

    let slopes = fit_monthly_trends(&means, *params.training_years.start())?;
    let projections = project_years(&means, &slopes, params.base_year, &params.target_years)?;
    let series = series_by_region(&projections, params.region.as_ref());

    Ok(ProjectionResult {
        means,
        slopes,
        projections,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::TimeStamp;
    use crate::source::StackSource;
    use approx::assert_abs_diff_eq;

    /// Raw raster encoding the given Celsius value in scaled Kelvin.
    fn raw(year: i32, month: u32, celsius: f32) -> Raster {
        let raw_value = (celsius + 273.15) / 0.02;
        Raster::filled(
            4,
            3,
            76.4,
            76.8,
            12.2,
            12.4,
            TimeStamp::first_of_month(year, month),
            raw_value,
        )
    }

    fn constant_stack(years: RangeInclusive<i32>, celsius: f32) -> Vec<Raster> {
        let mut stack = Vec::new();
        for year in years {
            for month in 1..=12u32 {
                // two acquisitions per month, same value
                stack.push(raw(year, month, celsius));
                stack.push(raw(year, month, celsius));
            }
        }
        stack
    }

    #[test]
    fn climatology_windows_stay_separate() {
        let mut stack = constant_stack(2001..=2010, 24.0);
        stack.extend(constant_stack(2011..=2020, 26.0));
        let source = StackSource::new(stack);
        let result = run_climatology(&source, &ClimatologyParams::default()).unwrap();

        assert_eq!(result.windows.len(), 2);
        let first = &result.windows[0];
        let second = &result.windows[1];
        assert_eq!(first.means.len(), 10 * 12);
        assert_eq!(second.means.len(), 10 * 12);
        for p in &first.series {
            assert_abs_diff_eq!(p.value.unwrap(), 24.0, epsilon = 1e-3);
        }
        for p in &second.series {
            assert_abs_diff_eq!(p.value.unwrap(), 26.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn climatology_series_is_chronological() {
        let source = StackSource::new(constant_stack(2001..=2010, 24.0));
        let params = ClimatologyParams {
            windows: vec![2001..=2010],
            ..ClimatologyParams::default()
        };
        let result = run_climatology(&source, &params).unwrap();
        let series = &result.windows[0].series;
        for pair in series.windows(2) {
            assert!((pair[0].year, pair[0].month) < (pair[1].year, pair[1].month));
        }
    }

    #[test]
    fn constant_field_projects_unchanged() {
        // 3 training years of constant 20 °C: all slopes 0, every
        // projection equals the base mean.
        let source = StackSource::new(constant_stack(2018..=2020, 20.0));
        let params = ProjectionParams {
            training_years: 2018..=2020,
            base_year: 2020,
            target_years: vec![2028, 2029, 2030],
            ..ProjectionParams::default()
        };
        let result = run_projection(&source, &params).unwrap();

        assert_eq!(result.slopes.len(), 12);
        for s in &result.slopes {
            for &v in &s.data {
                assert_abs_diff_eq!(v, 0.0, epsilon = 1e-3);
            }
        }
        assert_eq!(result.projections.len(), 36);
        for p in &result.projections {
            for &v in &p.data {
                assert_abs_diff_eq!(v, 20.0, epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn warming_trend_extrapolates_forward() {
        // +0.1 °C per year everywhere, anchored at 20 °C in 2001.
        let mut stack = Vec::new();
        for year in 2001..=2020 {
            for month in 1..=12u32 {
                stack.push(raw(year, month, 20.0 + 0.1 * (year - 2001) as f32));
            }
        }
        let source = StackSource::new(stack);
        let result = run_projection(&source, &ProjectionParams::default()).unwrap();

        // 2028 = base 2020 (21.9 °C) + 8 × 0.1
        let jan_2028 = result
            .projections
            .iter()
            .find(|r| r.stamp.key() == (2028, 1))
            .unwrap();
        assert_abs_diff_eq!(jan_2028.get(0, 0), 22.7, epsilon = 2e-2);
    }

    #[test]
    fn single_training_year_fails_before_projecting() {
        let source = StackSource::new(constant_stack(2020..=2020, 20.0));
        let params = ProjectionParams {
            training_years: 2020..=2020,
            base_year: 2020,
            ..ProjectionParams::default()
        };
        assert!(matches!(
            run_projection(&source, &params),
            Err(TrendError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn base_year_outside_training_is_rejected() {
        let source = StackSource::new(constant_stack(2001..=2020, 20.0));
        let params = ProjectionParams {
            base_year: 2021,
            ..ProjectionParams::default()
        };
        assert!(matches!(
            run_projection(&source, &params),
            Err(TrendError::InvalidParams(_))
        ));
    }

    #[test]
    fn target_year_inside_training_is_rejected() {
        let source = StackSource::new(constant_stack(2001..=2020, 20.0));
        let params = ProjectionParams {
            target_years: vec![2015],
            ..ProjectionParams::default()
        };
        assert!(matches!(
            run_projection(&source, &params),
            Err(TrendError::InvalidParams(_))
        ));
    }
}
