//! Natural cubic spline interpolation
//!
//! Segment `i` covers `[x_i, x_{i+1}]` and evaluates
//! `a_i + b_i dx + c_i dx^2 + d_i dx^3` where `dx = x - x_i`. Outside the knots the spline is
//! extended linearly using the end slopes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A natural cubic spline through a set of knots with strictly increasing x.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SplineError {
    #[error("Expected the same number of x and y values, found {0} and {1}")]
    LengthMismatch(usize, usize),

    #[error("At least 2 knots are required, found {0}")]
    TooFewKnots(usize),

    #[error("Knot x values must be finite and strictly increasing, knot {0} is not")]
    NotStrictlyIncreasing(usize),

    #[error("Could not solve for the spline coefficients")]
    SingularSystem,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit the spline through the given knots.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch(x.len(), y.len()));
        }

        let nx = x.len();
        if nx < 2 {
            return Err(SplineError::TooFewKnots(nx));
        }

        for i in 0..nx {
            if !x[i].is_finite() || !y[i].is_finite() || (i > 0 && x[i] <= x[i - 1]) {
                return Err(SplineError::NotStrictlyIncreasing(i));
            }
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Solve for the second derivative terms, natural boundaries pin the end ones to zero
        let c_vec = Self::calc_a(&h)
            .lu()
            .solve(&Self::calc_b(&h, y))
            .ok_or(SplineError::SingularSystem)?;
        let c: Vec<f64> = c_vec.iter().copied().collect();

        let mut b = Vec::with_capacity(nx - 1);
        let mut d = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((y[i + 1] - y[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(Self {
            x: x.to_vec(),
            a: y.to_vec(),
            b,
            c,
            d,
        })
    }

    /// Evaluate the spline at `t`.
    pub fn eval(&self, t: f64) -> f64 {
        let n = self.x.len();

        if t < self.x[0] {
            return self.a[0] + self.b[0] * (t - self.x[0]);
        }
        if t > self.x[n - 1] {
            return self.a[n - 1] + self.end_slope() * (t - self.x[n - 1]);
        }

        let i = self.search_index(t);
        let dx = t - self.x[i];

        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// Evaluate the first derivative of the spline at `t`.
    pub fn eval_deriv(&self, t: f64) -> f64 {
        let n = self.x.len();

        if t < self.x[0] {
            return self.b[0];
        }
        if t > self.x[n - 1] {
            return self.end_slope();
        }

        let i = self.search_index(t);
        let dx = t - self.x[i];

        self.b[i] + 2.0 * self.c[i] * dx + 3.0 * self.d[i] * dx.powi(2)
    }

    /// Slope at the last knot.
    fn end_slope(&self) -> f64 {
        let i = self.x.len() - 2;
        let h = self.x[i + 1] - self.x[i];

        self.b[i] + 2.0 * self.c[i] * h + 3.0 * self.d[i] * h.powi(2)
    }

    /// Index of the segment containing `t`, which must lie within the knots.
    fn search_index(&self, t: f64) -> usize {
        let num_segs = self.x.len() - 1;

        self.x
            .partition_point(|&xi| xi <= t)
            .saturating_sub(1)
            .min(num_segs - 1)
    }

    fn calc_a(h: &[f64]) -> DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = DMatrix::zeros(nx, nx);

        a[(0, 0)] = 1.0;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.0;
        a[(nx - 1, nx - 2)] = 0.0;
        a[(nx - 1, nx - 1)] = 1.0;

        a
    }

    fn calc_b(h: &[f64], y: &[f64]) -> DVector<f64> {
        let nx = h.len() + 1;
        let mut b = DVector::zeros(nx);

        for i in 0..nx.saturating_sub(2) {
            b[i + 1] = 3.0 * (y[i + 2] - y[i + 1]) / h[i + 1] - 3.0 * (y[i + 1] - y[i]) / h[i];
        }

        b
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_passes_through_knots() {
        let x = [-1.0, 0.0, 30.0, 60.0, 90.0];
        let y = [0.1, 0.0, 2.0, 4.0, 4.0];
        let sp = CubicSpline::new(&x, &y).unwrap();

        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((sp.eval(*xi) - yi).abs() < 1e-9);
        }
    }

    #[test]
    fn test_straight_line() {
        let sp = CubicSpline::new(&[0.0, 1.0, 2.0, 5.0], &[1.0, 3.0, 5.0, 11.0]).unwrap();

        assert!((sp.eval(0.5) - 2.0).abs() < 1e-9);
        assert!((sp.eval(3.5) - 8.0).abs() < 1e-9);
        assert!((sp.eval_deriv(4.0) - 2.0).abs() < 1e-9);

        // Linear extrapolation either side
        assert!((sp.eval(-1.0) - (-1.0)).abs() < 1e-9);
        assert!((sp.eval(7.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_knots_is_linear() {
        let sp = CubicSpline::new(&[0.0, 10.0], &[0.0, 5.0]).unwrap();
        assert!((sp.eval(4.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_smooth_at_knots() {
        let x = [0.0, 1.0, 3.0, 4.0];
        let y = [0.0, 2.0, -1.0, 0.5];
        let sp = CubicSpline::new(&x, &y).unwrap();

        let eps = 1e-7;
        for &xi in x[1..3].iter() {
            let left = sp.eval_deriv(xi - eps);
            let right = sp.eval_deriv(xi + eps);
            assert!((left - right).abs() < 1e-4);
        }

        // Extrapolation continues the end slopes
        assert!((sp.eval_deriv(-1.0) - sp.eval_deriv(0.0)).abs() < 1e-9);
        assert!((sp.eval_deriv(5.0) - sp.eval_deriv(4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_knots() {
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0], &[0.0]).unwrap_err(),
            SplineError::LengthMismatch(2, 1)
        );
        assert_eq!(
            CubicSpline::new(&[0.0], &[0.0]).unwrap_err(),
            SplineError::TooFewKnots(1)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err(),
            SplineError::NotStrictlyIncreasing(2)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err(),
            SplineError::NotStrictlyIncreasing(2)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, std::f64::NAN], &[0.0, 1.0]).unwrap_err(),
            SplineError::NotStrictlyIncreasing(1)
        );
    }
}
