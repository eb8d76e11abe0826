//! Descriptive statistics and interpolation helpers.
//!
//! All helpers follow the NaN-propagating conventions of the numeric code
//! that produced the reference results: population standard deviation
//! (`ddof = 0`), linear-interpolated percentiles and clamped piecewise-linear
//! interpolation. Empty input yields NaN rather than an error.

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. NaN for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Pearson correlation coefficient.
///
/// NaN when fewer than two pairs are given or either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x * var_y).sqrt();
    // Rounding can push a perfect fit just past the valid range.
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        r
    }
}

/// Returns a sorted copy, NaN values last.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Piecewise-linear interpolation of `x` on the increasing grid `xp`.
///
/// Values left of the grid map to `fp[0]`, values at or right of the last
/// knot map to the last `fp`. With repeated knots the right-most bracketing
/// interval is used.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    if n == 1 || x < xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // a NaN knot breaks the ordering the search relies on
    let j = match xp[..n].partition_point(|&knot| knot <= x) {
        0 => return f64::NAN,
        p if p >= n => return fp[n - 1],
        p => p - 1,
    };
    let slope = (fp[j + 1] - fp[j]) / (xp[j + 1] - xp[j]);
    let y = slope * (x - xp[j]) + fp[j];
    if !y.is_nan() {
        return y;
    }

    let y = slope * (x - xp[j + 1]) + fp[j + 1];
    if y.is_nan() && fp[j] == fp[j + 1] {
        fp[j]
    } else {
        y
    }
}

/// `n` evenly spaced values over `[start, stop]`, endpoint included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            out[n - 1] = stop;
            out
        }
    }
}

/// Percentile `q` (0..=100) of already sorted data, linear interpolation
/// between the closest ranks.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 || q.is_nan() {
        return f64::NAN;
    }
    let position = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = position.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    lerp(sorted[lo], sorted[hi], position - lo as f64)
}

/// Percentiles of unsorted data for each `q` in `qs`.
pub fn percentiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
    let sorted = sorted(values);
    qs.iter().map(|&q| percentile_sorted(&sorted, q)).collect()
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if t == 0.0 {
        return a;
    }
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}
