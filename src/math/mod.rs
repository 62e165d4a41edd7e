// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.
//!
//! Reductions here skip NaNs, because NaN is how a day matrix marks a
//! (frequency, time) cell without a reading. An input with no non-NaN values
//! reduces to NaN.


use std::f64::consts::PI;

/// Convert a power in milliwatts to dBm. 0 mW is -inf dBm.
#[inline]
pub fn mw_to_dbm(mw: f64) -> f64 {
    10.0 * mw.log10()
}

/// Convert a power in dBm to milliwatts.
#[inline]
pub fn dbm_to_mw(dbm: f64) -> f64 {
    10.0_f64.powf(dbm / 10.0)
}

/// Round to a number of decimal places (halves are rounded away from zero).
///
/// # Examples
///
/// `assert_abs_diff_eq!(round_to(0.43527, 4), 0.4353);`
#[inline]
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10.0_f64.powi(decimals);
    (x * scale).round() / scale
}

/// Turn a float into an integer key by rounding it at a number of decimal
/// places. Frequencies are matched on these keys, as floats can't be hashed or
/// reliably compared for equality.
#[inline]
pub(crate) fn quantise(x: f64, decimals: i32) -> i64 {
    (x * 10.0_f64.powi(decimals)).round() as i64
}

/// The inverse of [`quantise`].
#[inline]
pub(crate) fn dequantise(key: i64, decimals: i32) -> f64 {
    key as f64 / 10.0_f64.powi(decimals)
}

fn non_nan(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| !v.is_nan())
}

pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = non_nan(values).fold((0.0, 0_usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// The median. For an even number of values, the mean of the two middle
/// values.
pub fn nan_median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = non_nan(values).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_unstable_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn nan_min(values: &[f64]) -> f64 {
    // `f64::min` returns the non-NaN argument.
    values.iter().copied().fold(f64::NAN, f64::min)
}

pub fn nan_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NAN, f64::max)
}

/// The standard deviation with `ddof` "delta degrees of freedom"; 0 is the
/// population standard deviation, 1 the sample standard deviation.
pub fn nan_std(values: &[f64], ddof: usize) -> f64 {
    let mean = nan_mean(values);
    let (sum_sq, count) = non_nan(values).fold((0.0, 0_usize), |(s, c), v| {
        (s + (v - mean).powi(2), c + 1)
    });
    if count <= ddof {
        f64::NAN
    } else {
        (sum_sq / (count - ddof) as f64).sqrt()
    }
}

/// Central moments of the values: the mean, then the second, third and
/// fourth moments. `None` if there are no values or any of them is NaN.
fn central_moments(values: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mean = nan_mean(values);
    if mean.is_nan() {
        return None;
    }
    let mut count = 0;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in non_nan(values) {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
        count += 1;
    }
    let n = count as f64;
    Some((mean, m2 / n, m3 / n, m4 / n))
}

/// Is the variance indistinguishable from 0 at the precision of the mean?
fn degenerate_variance(mean: f64, m2: f64) -> bool {
    m2 <= (f64::EPSILON * mean).powi(2)
}

/// The (biased) Fisher-Pearson coefficient of skewness, `m3 / m2^1.5`. Unlike
/// the other reductions, a single NaN makes the result NaN.
pub fn skewness(values: &[f64]) -> f64 {
    match central_moments(values) {
        Some((mean, m2, m3, _)) if !degenerate_variance(mean, m2) => m3 / m2.powf(1.5),
        _ => f64::NAN,
    }
}

/// The (biased) excess kurtosis, `m4 / m2^2 - 3`; a normal distribution has a
/// kurtosis of 0. A single NaN makes the result NaN.
pub fn kurtosis(values: &[f64]) -> f64 {
    match central_moments(values) {
        Some((mean, m2, _, m4)) if !degenerate_variance(mean, m2) => m4 / (m2 * m2) - 3.0,
        _ => f64::NAN,
    }
}

/// The result of a two-sample t-test.
#[derive(Debug, Clone, Copy)]
pub struct TTest {
    pub t: f64,
    /// The two-sided p-value.
    pub p: f64,
}

/// Welch's t-test for samples with unequal variances. NaNs are dropped; if
/// either sample then has fewer than two values, both the statistic and the
/// p-value are NaN.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTest {
    let na = non_nan(a).count();
    let nb = non_nan(b).count();
    if na < 2 || nb < 2 {
        return TTest {
            t: f64::NAN,
            p: f64::NAN,
        };
    }

    let (na, nb) = (na as f64, nb as f64);
    let sa = nan_std(a, 1).powi(2) / na;
    let sb = nan_std(b, 1).powi(2) / nb;
    let t = (nan_mean(a) - nan_mean(b)) / (sa + sb).sqrt();
    let df = (sa + sb).powi(2) / (sa * sa / (na - 1.0) + sb * sb / (nb - 1.0));
    TTest {
        t,
        p: 2.0 * student_t_sf(t.abs(), df),
    }
}

/// The survival function (1 - CDF) of Student's t distribution.
pub fn student_t_sf(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    let tail = 0.5 * regularised_incomplete_beta(df / 2.0, 0.5, df / (df + t * t));
    if t >= 0.0 {
        tail
    } else {
        1.0 - tail
    }
}

/// The natural log of the gamma function (Lanczos approximation, g = 7).
pub(crate) fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula.
        (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let t = x + G + 0.5;
        let series = COEFFS[1..]
            .iter()
            .enumerate()
            .fold(COEFFS[0], |acc, (i, c)| acc + c / (x + i as f64 + 1.0));
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
    }
}

/// The regularised incomplete beta function I_x(a, b).
pub(crate) fn regularised_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    // The continued fraction converges quickly only on one side of the mean.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Lentz's method for the continued fraction of the incomplete beta function.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let not_tiny = |v: f64| if v.abs() < TINY { TINY } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / not_tiny(1.0 - qab * x / qap);
    let mut h = d;
    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step.
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / not_tiny(1.0 + aa * d);
        c = not_tiny(1.0 + aa / c);
        h *= d * c;

        // Odd step.
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / not_tiny(1.0 + aa * d);
        c = not_tiny(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}
