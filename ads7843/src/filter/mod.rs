use crate::{errors::Result, Error, RawPoint};

/// Number of raw readings folded into one filtered sample.
pub const SAMPLE_COUNT: usize = 9;

/// Largest spread (ADC units) tolerated between group averages.
pub const DEFAULT_THRESHOLD: i32 = 2;

/// Reduces nine consecutive raw readings to a single point.
///
/// Each axis is split into three groups of three, the groups are averaged and
/// the two group averages closest to each other are averaged again. If every
/// pair of group averages is further apart than `threshold` the whole burst is
/// rejected as noise.
pub fn filter(samples: &[RawPoint; SAMPLE_COUNT], threshold: i32) -> Result<RawPoint> {
    let xs = samples.map(|p| p.x);
    let ys = samples.map(|p| p.y);

    let x = filter_axis(&xs, threshold).ok_or(Error::NoiseRejected)?;
    let y = filter_axis(&ys, threshold).ok_or(Error::NoiseRejected)?;

    Ok(RawPoint { x, y })
}

/// Single-axis version of [`filter`]. `None` means the axis is too noisy.
pub fn filter_axis(values: &[i32; SAMPLE_COUNT], threshold: i32) -> Option<i32> {
    // Sums of three readings and spreads between averages need more than 32 bits.
    let group = |i: usize| values[i..i + 3].iter().map(|&v| i64::from(v)).sum::<i64>() / 3;
    let (t0, t1, t2) = (group(0), group(3), group(6));

    let m0 = (t0 - t1).abs();
    let m1 = (t1 - t2).abs();
    let m2 = (t2 - t0).abs();

    let threshold = i64::from(threshold);
    if m0 > threshold && m1 > threshold && m2 > threshold {
        return None;
    }

    // Keep the two groups that agree best, drop the odd one out.
    let value = if m0 < m1 {
        if m2 < m0 {
            (t0 + t2) / 2
        } else {
            (t0 + t1) / 2
        }
    } else if m2 < m1 {
        (t0 + t2) / 2
    } else {
        (t1 + t2) / 2
    };

    // An average of i32 readings is always back in range.
    i32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(groups: [(i32, i32); 3]) -> [RawPoint; SAMPLE_COUNT] {
        let mut out = [RawPoint::default(); SAMPLE_COUNT];
        for (index, point) in out.iter_mut().enumerate() {
            let (x, y) = groups[index / 3];
            *point = RawPoint::new(x, y);
        }
        out
    }

    #[test]
    fn steady_contact_passes_through() {
        let samples = burst([(1200, 800), (1200, 800), (1200, 800)]);
        assert_eq!(filter(&samples, DEFAULT_THRESHOLD), Ok(RawPoint::new(1200, 800)));
    }

    #[test]
    fn divergent_group_is_dropped_wherever_it_sits() {
        // Last group bursts away.
        let samples = burst([(1000, 500), (1002, 501), (1900, 40)]);
        assert_eq!(filter(&samples, DEFAULT_THRESHOLD), Ok(RawPoint::new(1001, 500)));

        // First group bursts away.
        let samples = burst([(3000, 3000), (1000, 500), (1001, 502)]);
        assert_eq!(filter(&samples, DEFAULT_THRESHOLD), Ok(RawPoint::new(1000, 501)));

        // Middle group bursts away.
        let samples = burst([(1000, 500), (10, 4000), (1002, 500)]);
        assert_eq!(filter(&samples, DEFAULT_THRESHOLD), Ok(RawPoint::new(1001, 500)));
    }

    #[test]
    fn closest_pair_wins_even_when_all_are_close() {
        // m0 = 2, m1 = 1, m2 = 1 -> (t1, t2)
        assert_eq!(filter_axis(&[10, 10, 10, 12, 12, 12, 11, 11, 11], 2), Some(11));
        // m0 = 1, m1 = 2, m2 = 3 -> (t0, t1)
        assert_eq!(filter_axis(&[10, 10, 10, 11, 11, 11, 13, 13, 13], 2), Some(10));
        // m0 = 1, m1 = 1, m2 = 2 -> ties fall through to (t1, t2)
        assert_eq!(filter_axis(&[10, 10, 10, 11, 11, 11, 12, 12, 12], 2), Some(11));
    }

    #[test]
    fn group_averages_truncate() {
        // Groups average to 10 (31 / 3), 10, 10.
        assert_eq!(filter_axis(&[10, 10, 11, 10, 10, 10, 10, 10, 10], 2), Some(10));
    }

    #[test]
    fn all_groups_apart_is_noise() {
        let samples = burst([(100, 500), (200, 500), (300, 500)]);
        assert_eq!(filter(&samples, DEFAULT_THRESHOLD), Err(Error::NoiseRejected));
    }

    #[test]
    fn one_noisy_axis_rejects_the_sample() {
        let samples = burst([(100, 10), (100, 20), (100, 30)]);
        assert_eq!(filter(&samples, DEFAULT_THRESHOLD), Err(Error::NoiseRejected));
    }

    #[test]
    fn threshold_is_exclusive() {
        // Two spreads sit exactly on the threshold, which is still accepted.
        assert_eq!(filter_axis(&[0, 0, 0, 2, 2, 2, 4, 4, 4], 2), Some(3));
        assert_eq!(filter_axis(&[0, 0, 0, 3, 3, 3, 6, 6, 6], 2), None);
    }

    #[test]
    fn extreme_readings_do_not_overflow() {
        assert_eq!(filter_axis(&[800_000_000; SAMPLE_COUNT], 2), Some(800_000_000));
        assert_eq!(filter_axis(&[i32::MAX; SAMPLE_COUNT], 2), Some(i32::MAX));
        assert_eq!(filter_axis(&[i32::MIN; SAMPLE_COUNT], 2), Some(i32::MIN));

        let (hi, lo) = (i32::MAX, i32::MIN);
        assert_eq!(filter_axis(&[hi, hi, hi, hi, hi, hi, lo, lo, lo], 2), Some(hi));
        assert_eq!(filter_axis(&[lo, lo, lo, lo, lo, lo, hi, hi, hi], 2), Some(lo));
        assert_eq!(filter_axis(&[lo, lo, lo, 0, 0, 0, hi, hi, hi], 2), None);

        let samples = [RawPoint::new(i32::MAX, i32::MIN); SAMPLE_COUNT];
        assert_eq!(
            filter(&samples, DEFAULT_THRESHOLD),
            Ok(RawPoint::new(i32::MAX, i32::MIN))
        );
    }
}
