//! External collaborator boundaries: image retrieval and raster export.

use serde::{Deserialize, Serialize};

use crate::error::TrendError;
use crate::raster::Raster;

/// Retrieval parameters for one fetch. Spatial and cloud-cover filtering
/// happen behind the source, before rasters reach the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageQuery {
    /// Collection identifier, e.g. "MODIS/061/MOD11A1".
    pub collection: String,
    /// Band name, e.g. "LST_Day_1km".
    pub band: String,
    pub start_year: i32,
    pub end_year: i32,
}

impl ImageQuery {
    pub fn new(collection: &str, band: &str, start_year: i32, end_year: i32) -> Self {
        Self {
            collection: collection.to_string(),
            band: band.to_string(),
            start_year,
            end_year,
        }
    }
}

/// Satellite image retrieval boundary. Failures surface unchanged as
/// [`TrendError::Source`]; the pipeline does not retry.
pub trait ImageSource {
    fn fetch_images(&self, query: &ImageQuery) -> Result<Vec<Raster>, TrendError>;
}

/// Storage export boundary (fire-and-forget from the pipeline's view).
pub trait RasterSink {
    fn export(&mut self, raster: &Raster, description: &str) -> Result<(), TrendError>;
}

/// In-memory source over a pre-loaded stack; also the test double.
/// Filters by the query's year window only — collection and band are
/// assumed to match whatever the stack was loaded from.
pub struct StackSource {
    pub rasters: Vec<Raster>,
}

impl StackSource {
    pub fn new(rasters: Vec<Raster>) -> Self {
        Self { rasters }
    }
}

impl ImageSource for StackSource {
    fn fetch_images(&self, query: &ImageQuery) -> Result<Vec<Raster>, TrendError> {
        Ok(self
            .rasters
            .iter()
            .filter(|r| r.stamp.year >= query.start_year && r.stamp.year <= query.end_year)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::TimeStamp;

    #[test]
    fn stack_source_filters_by_year_window() {
        let mk = |y: i32| {
            Raster::filled(1, 1, 0.0, 1.0, 0.0, 1.0, TimeStamp::first_of_month(y, 6), 1.0)
        };
        let source = StackSource::new(vec![mk(2000), mk(2005), mk(2010), mk(2021)]);
        let q = ImageQuery::new("MODIS/061/MOD11A1", "LST_Day_1km", 2001, 2020);
        let got = source.fetch_images(&q).unwrap();
        let years: Vec<i32> = got.iter().map(|r| r.stamp.year).collect();
        assert_eq!(years, vec![2005, 2010]);
    }
}
