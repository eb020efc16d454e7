//! Noisy X-over-X-plus-1 (NXX1) rate-code activation function
//!
//! `x/(x+1)` is a sharp threshold-linear rate code; convolving it with a
//! Gaussian of the unit's intrinsic noise standard deviation gives the
//! smoothed curve actually used per cycle. The convolution is expensive to
//! evaluate per-neuron-per-cycle, so it is precomputed once into a lookup
//! table by [`NXX1Table::build`] and shared read-only by all workers
//! thereafter (see `spec.md` §9, "Precomputed tables").

use std::sync::Arc;

/// Table half-width in units of noise standard deviations
const TABLE_SIGMA_RANGE: f32 = 3.0;
/// Number of knots across the table's domain
const TABLE_RESOLUTION: usize = 2000;
/// Samples used per knot to numerically integrate the Gaussian convolution
const CONVOLVE_SAMPLES: usize = 200;

/// `x / (x + 1)` for `x > 0`, else `0` — the sharp (noiseless) rate code
#[inline]
fn x_over_x_plus_1(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else {
        x / (x + 1.0)
    }
}

fn gaussian_pdf(x: f32, sigma: f32) -> f32 {
    let z = x / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * std::f32::consts::PI).sqrt())
}

/// Precomputed Gaussian convolution of `Gain*x/(Gain*x+1)` over
/// `x ∈ [-3·NVar, 3·NVar]`, built once per `Update()` and read-only after that.
#[derive(Debug, Clone)]
pub struct NXX1Table {
    x_min: f32,
    x_max: f32,
    step: f32,
    gain: f32,
    n_var: f32,
    values: Vec<f32>,
}

impl NXX1Table {
    /// Build (or rebuild) the table for the given `gain`/`n_var`
    pub fn build(gain: f32, n_var: f32) -> Self {
        let n_var = n_var.max(1e-6);
        let x_min = -TABLE_SIGMA_RANGE * n_var;
        let x_max = TABLE_SIGMA_RANGE * n_var;
        let step = (x_max - x_min) / (TABLE_RESOLUTION as f32 - 1.0);

        let mut values = Vec::with_capacity(TABLE_RESOLUTION);
        // Integrate the Gaussian-weighted sharp function over a wider window
        // than the table's own domain so the convolution near the edges
        // still sees mass from outside [x_min, x_max].
        let conv_half_width = TABLE_SIGMA_RANGE * n_var * 2.0;
        let conv_step = (2.0 * conv_half_width) / (CONVOLVE_SAMPLES as f32 - 1.0);

        for i in 0..TABLE_RESOLUTION {
            let x = x_min + step * i as f32;
            let mut acc = 0.0f32;
            let mut weight_sum = 0.0f32;
            for j in 0..CONVOLVE_SAMPLES {
                let noise = -conv_half_width + conv_step * j as f32;
                let w = gaussian_pdf(noise, n_var);
                acc += w * x_over_x_plus_1(gain * (x + noise));
                weight_sum += w;
            }
            values.push(if weight_sum > 0.0 { acc / weight_sum } else { 0.0 });
        }

        Self { x_min, x_max, step, gain, n_var, values }
    }

    /// Linear-interpolated lookup; `x` outside the table's domain is handled
    /// by the caller (see [`nxx1`]), which only consults the table within
    /// `[-3·NVar, 3·NVar]`.
    fn lookup(&self, x: f32) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let t = (x - self.x_min) / self.step;
        if t <= 0.0 {
            return self.values[0];
        }
        let last = self.values.len() - 1;
        if t >= last as f32 {
            return self.values[last];
        }
        let i0 = t.floor() as usize;
        let frac = t - i0 as f32;
        self.values[i0] * (1.0 - frac) + self.values[i0 + 1] * frac
    }

    /// Parameters this table was built for
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Noise standard deviation this table was built for
    pub fn n_var(&self) -> f32 {
        self.n_var
    }
}

/// Evaluate NXX1 at threshold-relative input `x = g - gθ` using a shared table
pub fn nxx1(table: &Arc<NXX1Table>, x: f32) -> f32 {
    let n_var = table.n_var();
    let gain = table.gain();
    if x < -3.0 * n_var {
        0.0
    } else if x > 3.0 * n_var {
        let gx = gain * x;
        gx / (gx + 1.0)
    } else {
        table.lookup(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_monotonic_nondecreasing() {
        let table = Arc::new(NXX1Table::build(100.0, 0.005));
        let mut prev = -1.0f32;
        let mut x = -0.02;
        while x <= 0.02 {
            let v = nxx1(&table, x);
            assert!(v >= prev - 1e-4, "NXX1 should be non-decreasing in x");
            prev = v;
            x += 0.0005;
        }
    }

    #[test]
    fn test_far_above_threshold_matches_sharp_curve() {
        let table = Arc::new(NXX1Table::build(100.0, 0.005));
        let x = 0.05; // well above 3*NVar
        let v = nxx1(&table, x);
        let gx = 100.0 * x;
        let expected = gx / (gx + 1.0);
        assert!((v - expected).abs() < 1e-6);
    }

    #[test]
    fn test_far_below_threshold_is_zero() {
        let table = Arc::new(NXX1Table::build(100.0, 0.005));
        assert_eq!(nxx1(&table, -0.05), 0.0);
    }

    #[test]
    fn test_output_bounded_zero_one() {
        let table = Arc::new(NXX1Table::build(100.0, 0.005));
        let mut x = -0.1;
        while x <= 1.0 {
            let v = nxx1(&table, x);
            assert!((0.0..=1.0).contains(&v));
            x += 0.01;
        }
    }
}
