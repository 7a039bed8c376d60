/// Five-number summary plus moments of one distribution, as drawn by the box
/// and violin charts.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within 1.5 IQR below `q1`.
    pub lower_whisker: f64,
    /// Highest value within 1.5 IQR above `q3`.
    pub upper_whisker: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl Distribution {
    /// Compute the summary from raw values, filtering out NaN.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut vals: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return None;
        }
        vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = vals.len();
        let min = vals[0];
        let max = vals[count - 1];
        let q1 = quantile(&vals, 0.25);
        let median = quantile(&vals, 0.5);
        let q3 = quantile(&vals, 0.75);
        let iqr = q3 - q1;
        let lower_whisker = vals
            .iter()
            .copied()
            .find(|v| *v >= q1 - 1.5 * iqr)
            .unwrap_or(min);
        let upper_whisker = vals
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= q3 + 1.5 * iqr)
            .unwrap_or(max);

        let mean = vals.iter().sum::<f64>() / count as f64;
        let variance = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Distribution {
            count,
            min,
            max,
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Silverman's rule-of-thumb bandwidth for a Gaussian kernel. Falls back
    /// to a small positive width when the data has no spread.
    pub fn bandwidth(&self) -> f64 {
        let spread = self.std_dev.min((self.q3 - self.q1) / 1.34);
        let spread = if spread > 0.0 { spread } else { self.std_dev };
        let h = 0.9 * spread * (self.count as f64).powf(-0.2);
        if h > 0.0 {
            h
        } else {
            1e-3 * self.median.abs().max(1.0)
        }
    }
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Gaussian kernel density estimate sampled at `samples` evenly spaced points
/// spanning two bandwidths beyond the data. Returns `(value, density)` pairs.
pub fn kernel_density(values: &[f64], samples: usize) -> Vec<(f64, f64)> {
    let Some(dist) = Distribution::compute(values) else {
        return Vec::new();
    };
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let h = dist.bandwidth();
    let lo = dist.min - 2.0 * h;
    let hi = dist.max + 2.0 * h;
    let samples = samples.max(2);
    let step = (hi - lo) / (samples - 1) as f64;
    let norm = 1.0 / (finite.len() as f64 * h * (2.0 * std::f64::consts::PI).sqrt());

    (0..samples)
        .map(|i| {
            let at = lo + step * i as f64;
            let density: f64 = finite
                .iter()
                .map(|v| {
                    let u = (at - v) / h;
                    (-0.5 * u * u).exp()
                })
                .sum();
            (at, density * norm)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quartiles_interpolate_linearly() {
        let d = Distribution::compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(d.median, 2.5);
        assert_eq!(d.q1, 1.75);
        assert_eq!(d.q3, 3.25);
        assert_eq!(d.mean, 2.5);
    }

    #[test]
    fn whiskers_stop_at_outliers() {
        let d = Distribution::compute(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(d.upper_whisker, 4.0);
        assert_eq!(d.lower_whisker, 1.0);
        assert_eq!(d.max, 100.0);
    }

    #[test]
    fn nan_is_ignored_and_empty_is_none() {
        assert!(Distribution::compute(&[f64::NAN]).is_none());
        assert_eq!(Distribution::compute(&[f64::NAN, 7.0]).unwrap().count, 1);
    }

    #[test]
    fn density_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.5, 3.0, 4.0, 4.5, 6.0];
        let curve = kernel_density(&values, 400);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 0.05, "area was {area}");
    }

    #[test]
    fn constant_values_still_get_a_curve() {
        let curve = kernel_density(&[5.0, 5.0, 5.0], 50);
        assert_eq!(curve.len(), 50);
        assert!(curve.iter().all(|(_, d)| d.is_finite()));
    }
}
