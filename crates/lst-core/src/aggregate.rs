//! Monthly composite aggregation.
//!
//! Partitions a raster stack by (year, month) and reduces each partition
//! to a per-pixel mean composite. The mean at a pixel counts only the
//! rasters contributing valid (non-masked) data there, so a pixel clouded
//! out in some acquisitions is still averaged over the rest.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::error::TrendError;
use crate::raster::{Raster, TimeStamp};

/// Restrict a stack to acquisitions within a year window.
pub fn filter_years(rasters: &[Raster], years: RangeInclusive<i32>) -> Vec<Raster> {
    rasters
        .iter()
        .filter(|r| years.contains(&r.stamp.year))
        .cloned()
        .collect()
}

/// Reduce a stack to one mean composite per (year, month) key present in
/// the input, tagged with the first-of-month timestamp and sorted
/// ascending by (year, month).
///
/// Keys with no contributing rasters produce no output. A pixel with no
/// valid contribution in any raster of its partition stays NaN. The
/// result is invariant under permutation of the input stack.
pub fn monthly_means(rasters: &[Raster]) -> Result<Vec<Raster>, TrendError> {
    let mut groups: BTreeMap<(i32, u32), Vec<&Raster>> = BTreeMap::new();
    for r in rasters {
        groups.entry(r.stamp.key()).or_default().push(r);
    }

    let mut out = Vec::with_capacity(groups.len());
    for ((year, month), members) in groups {
        let first = members[0];
        for m in &members[1..] {
            first.ensure_same_shape(m)?;
        }

        let n = first.data.len();
        let mut sum = vec![0f64; n];
        let mut count = vec![0u32; n];
        for m in &members {
            for (i, &v) in m.data.iter().enumerate() {
                if v.is_finite() {
                    sum[i] += v as f64;
                    count[i] += 1;
                }
            }
        }

        let data = sum
            .iter()
            .zip(count.iter())
            .map(|(&s, &c)| if c > 0 { (s / c as f64) as f32 } else { f32::NAN })
            .collect();

        out.push(Raster {
            data,
            width: first.width,
            height: first.height,
            min_lon: first.min_lon,
            max_lon: first.max_lon,
            min_lat: first.min_lat,
            max_lat: first.max_lat,
            stamp: TimeStamp::first_of_month(year, month),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn raster(year: i32, month: u32, fill: f32) -> Raster {
        Raster::filled(
            3,
            2,
            76.0,
            77.0,
            12.0,
            13.0,
            TimeStamp::first_of_month(year, month),
            fill,
        )
    }

    #[test]
    fn one_composite_per_present_key_and_none_for_absent() {
        let stack = vec![
            raster(2001, 1, 10.0),
            raster(2001, 1, 20.0),
            raster(2001, 3, 5.0),
            raster(2002, 1, 7.0),
        ];
        let means = monthly_means(&stack).unwrap();
        let keys: Vec<(i32, u32)> = means.iter().map(|r| r.stamp.key()).collect();
        assert_eq!(keys, vec![(2001, 1), (2001, 3), (2002, 1)]);
        assert_abs_diff_eq!(means[0].get(0, 0), 15.0, epsilon = 1e-6);
        assert_abs_diff_eq!(means[1].get(0, 0), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn mean_is_order_invariant() {
        let stack = vec![
            raster(2001, 6, 22.0),
            raster(2001, 6, 26.0),
            raster(2001, 6, 30.0),
            raster(2002, 6, 18.0),
        ];
        let mut reversed = stack.clone();
        reversed.reverse();

        let a = monthly_means(&stack).unwrap();
        let b = monthly_means(&reversed).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.stamp, y.stamp);
            for (p, q) in x.data.iter().zip(y.data.iter()) {
                assert_abs_diff_eq!(p, q, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn masked_pixels_do_not_count_toward_denominator() {
        let mut a = raster(2001, 1, 10.0);
        let b = raster(2001, 1, 30.0);
        a.set(0, 0, f32::NAN); // masked in one acquisition
        a.set(1, 2, f32::NAN);

        let mut c = raster(2001, 1, 50.0);
        c.set(1, 2, f32::NAN); // masked in all but b

        let means = monthly_means(&[a, b, c]).unwrap();
        assert_eq!(means.len(), 1);
        let m = &means[0];
        // (30 + 50) / 2, not (0 + 30 + 50) / 3
        assert_abs_diff_eq!(m.get(0, 0), 40.0, epsilon = 1e-6);
        // only b contributes
        assert_abs_diff_eq!(m.get(1, 2), 30.0, epsilon = 1e-6);
        // all three contribute elsewhere
        assert_abs_diff_eq!(m.get(0, 1), 30.0, epsilon = 1e-6);
    }

    #[test]
    fn fully_masked_pixel_stays_masked() {
        let mut a = raster(2001, 1, 10.0);
        let mut b = raster(2001, 1, 20.0);
        a.set(0, 2, f32::NAN);
        b.set(0, 2, f32::NAN);
        let means = monthly_means(&[a, b]).unwrap();
        assert!(means[0].get(0, 2).is_nan());
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let a = raster(2001, 1, 10.0);
        let b = Raster::filled(
            4,
            2,
            76.0,
            77.0,
            12.0,
            13.0,
            TimeStamp::first_of_month(2001, 1),
            10.0,
        );
        assert!(matches!(
            monthly_means(&[a, b]),
            Err(TrendError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn filter_years_keeps_window_only() {
        let stack = vec![raster(2000, 1, 1.0), raster(2001, 1, 1.0), raster(2011, 1, 1.0)];
        let kept = filter_years(&stack, 2001..=2010);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].stamp.year, 2001);
    }
}
