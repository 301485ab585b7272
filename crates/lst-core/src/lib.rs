//! Monthly land-surface-temperature climatology, trend, and projection.
//!
//! The pipeline has two modes:
//!   - Climatology: raw LST rasters → Celsius → per-(year, month) mean
//!     composites → region-mean chart series.
//!   - Projection: monthly means over a training window → per-month OLS
//!     trend slopes → linear extrapolation to future years.
//!
//! Every stage is an eager transformation over immutable [`raster::Raster`]
//! collections; image retrieval, chart rendering, and storage export sit
//! behind the traits in [`source`] and [`series`].

pub mod aggregate;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod project;
pub mod raster;
pub mod series;
pub mod source;
pub mod trend;

pub use error::TrendError;
pub use raster::{Raster, TimeStamp};
pub use trend::TrendSlope;
