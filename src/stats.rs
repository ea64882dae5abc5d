//! Descriptive statistics, correlations, and the two Wilcoxon tests used to
//! compare code-switchers against monolingual users.
//!
//! Both significance tests use the normal approximation of the rank
//! statistic; the paired signed-rank test additionally applies the standard
//! tie correction to the variance. Good behaviour needs sample sizes in the
//! dozens, which the per-author analyses comfortably exceed.

use statrs::distribution::{ContinuousCDF, Normal};

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; NaN for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Standard error of the mean (sample standard deviation over sqrt(n)).
pub fn sem(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    (var / n as f64).sqrt()
}

/// Pearson product-moment correlation between two paired samples.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, String> {
    if x.len() != y.len() {
        return Err(format!("paired samples differ in length: {} vs {}", x.len(), y.len()));
    }
    if x.len() < 2 {
        return Err("need at least two pairs for a correlation".to_string());
    }
    let mx = mean(x);
    let my = mean(y);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return Err("constant sample has no defined correlation".to_string());
    }
    Ok(cov / (vx.sqrt() * vy.sqrt()))
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64, String> {
    if x.len() != y.len() {
        return Err(format!("paired samples differ in length: {} vs {}", x.len(), y.len()));
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Paired Wilcoxon signed-rank test (two-sided). Zero differences are
/// dropped; ties share average ranks and correct the variance. Returns the
/// test statistic (smaller of the signed rank sums) and the p-value.
pub fn wilcoxon_signed_rank(x: &[f64], y: &[f64]) -> Result<(f64, f64), String> {
    if x.len() != y.len() {
        return Err(format!("paired samples differ in length: {} vs {}", x.len(), y.len()));
    }
    let diffs: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(a, b)| a - b)
        .filter(|d| *d != 0.0)
        .collect();
    let n = diffs.len();
    if n == 0 {
        return Err("all paired differences are zero".to_string());
    }

    let magnitudes: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);

    let r_plus: f64 = diffs
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let nf = n as f64;
    let r_minus = nf * (nf + 1.0) / 2.0 - r_plus;
    let statistic = r_plus.min(r_minus);

    let mn = nf * (nf + 1.0) / 4.0;
    let mut variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0;
    for t in tie_sizes(&magnitudes) {
        let tf = t as f64;
        variance -= (tf.powi(3) - tf) / 48.0;
    }
    if variance <= 0.0 {
        return Err("degenerate variance in signed-rank test".to_string());
    }

    let z = (statistic - mn) / variance.sqrt();
    Ok((statistic, two_sided_p(z)?))
}

/// Wilcoxon rank-sum test (two-sided, normal approximation) between two
/// independent samples. Returns the z statistic and the p-value.
pub fn rank_sum(x: &[f64], y: &[f64]) -> Result<(f64, f64), String> {
    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    if n1 == 0.0 || n2 == 0.0 {
        return Err("rank-sum test needs non-empty samples".to_string());
    }
    let mut combined: Vec<f64> = Vec::with_capacity(x.len() + y.len());
    combined.extend_from_slice(x);
    combined.extend_from_slice(y);
    let ranks = average_ranks(&combined);
    let s: f64 = ranks[..x.len()].iter().sum();

    let expected = n1 * (n1 + n2 + 1.0) / 2.0;
    let variance = n1 * n2 * (n1 + n2 + 1.0) / 12.0;
    let z = (s - expected) / variance.sqrt();
    Ok((z, two_sided_p(z)?))
}

/// Ranks with ties sharing the average of their positions (1-based).
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &index in &order[i..=j] {
            ranks[index] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Sizes of tie groups (groups of equal values) of size > 1.
fn tie_sizes(values: &[f64]) -> Vec<usize> {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut sizes = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        if j > i {
            sizes.push(j - i + 1);
        }
        i = j + 1;
    }
    sizes
}

fn two_sided_p(z: f64) -> Result<f64, String> {
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| format!("standard normal unavailable: {e}"))?;
    Ok((2.0 * (1.0 - normal.cdf(z.abs()))).min(1.0))
}
