//! MODIS LST unit decoding.
//!
//! MOD11A1 stores land-surface temperature as Kelvin scaled by 50
//! (i.e. raw × 0.02 gives Kelvin). Decoding to Celsius is
//! `raw × 0.02 − 273.15`, applied per pixel.

use crate::raster::Raster;

/// MOD11A1 LST scale factor.
pub const LST_SCALE: f32 = 0.02;
/// 0 °C in Kelvin.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Decode a raw scaled-Kelvin raster to Celsius.
///
/// Total over all inputs: masked (NaN) pixels pass through unchanged,
/// and the acquisition stamp and bounds are preserved.
pub fn to_celsius(raw: &Raster) -> Raster {
    let data = raw
        .data
        .iter()
        .map(|&v| v * LST_SCALE - KELVIN_OFFSET)
        .collect();
    Raster {
        data,
        width: raw.width,
        height: raw.height,
        min_lon: raw.min_lon,
        max_lon: raw.max_lon,
        min_lat: raw.min_lat,
        max_lat: raw.max_lat,
        stamp: raw.stamp,
    }
}

/// Decode a whole stack.
pub fn to_celsius_all(rasters: &[Raster]) -> Vec<Raster> {
    rasters.iter().map(to_celsius).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::TimeStamp;
    use approx::assert_abs_diff_eq;

    #[test]
    fn scaled_kelvin_decodes_exactly() {
        let stamp = TimeStamp::first_of_month(2001, 7);
        // 15000 × 0.02 = 300 K = 26.85 °C
        let raw = Raster::filled(2, 2, 76.0, 77.0, 12.0, 13.0, stamp, 15000.0);
        let cel = to_celsius(&raw);
        for &v in &cel.data {
            assert_abs_diff_eq!(v, 26.85, epsilon = 1e-4);
        }
        assert_eq!(cel.stamp, stamp);
        assert!(cel.same_shape(&raw));
    }

    #[test]
    fn masked_pixels_stay_masked() {
        let stamp = TimeStamp::first_of_month(2001, 7);
        let mut raw = Raster::filled(2, 2, 76.0, 77.0, 12.0, 13.0, stamp, 14800.0);
        raw.set(1, 1, f32::NAN);
        let cel = to_celsius(&raw);
        assert!(cel.get(1, 1).is_nan());
        assert_abs_diff_eq!(cel.get(0, 0), 14800.0 * 0.02 - 273.15, epsilon = 1e-4);
    }
}
