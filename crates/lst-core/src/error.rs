use thiserror::Error;

/// Failure conditions of the trend pipeline.
///
/// Pixel-level missing data (cloud masking) is never an error: masked
/// pixels are excluded from means and regressions locally. Errors are
/// reserved for whole-month coverage gaps and incompatible inputs.
#[derive(Debug, Error)]
pub enum TrendError {
    /// A calendar month has fewer than 2 distinct years of monthly means,
    /// so no trend can be fit for it.
    #[error("insufficient history for month {month}: {years_observed} year(s) of monthly means, need at least 2")]
    InsufficientHistory { month: u32, years_observed: usize },

    /// A projection was requested for a month that has no base monthly
    /// mean or no fitted trend slope.
    #[error("missing {kind} for {year}-{month:02}")]
    MissingReferenceData {
        year: i32,
        month: u32,
        kind: &'static str,
    },

    /// Rasters combined in one operation must share grid size and
    /// geographic bounds.
    #[error("raster shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    /// A trend slope was applied to a base mean of a different calendar month.
    #[error("calendar month mismatch: slope is for month {slope_month}, base mean is for month {base_month}")]
    MonthMismatch { slope_month: u32, base_month: u32 },

    /// Pipeline parameters are inconsistent (e.g. base year outside the
    /// training window).
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Image retrieval failed. Surfaced unchanged; the core does not retry.
    #[error("image source failure: {0}")]
    Source(String),

    /// Chart rendering or storage export failed.
    #[error("sink failure: {0}")]
    Sink(String),
}
