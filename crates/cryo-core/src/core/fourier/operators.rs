use super::grid::FrequencyGrid;
use nalgebra::Vector2;
use ndarray::Array2;
use std::fmt;

/// A real-valued function of spatial frequency, evaluated pointwise on a Fourier grid.
///
/// Used for envelope functions in transfer theories and for noise variances.
pub trait FourierOperator: Send + Sync + fmt::Debug {
    /// Value at `frequency = (qx, qy)` in cycles per Ångström.
    fn evaluate(&self, frequency: &Vector2<f64>) -> f64;

    fn on_grid(&self, grid: &FrequencyGrid) -> Array2<f64> {
        grid.map(|q| self.evaluate(&q))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    pub value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl FourierOperator for Constant {
    fn evaluate(&self, _frequency: &Vector2<f64>) -> f64 {
        self.value
    }
}

/// `amplitude * exp(-b_factor * |q|^2 / 4)`, the conventional B-factor envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub amplitude: f64,
    pub b_factor: f64,
}

impl Gaussian {
    pub fn new(amplitude: f64, b_factor: f64) -> Self {
        Self {
            amplitude,
            b_factor,
        }
    }
}

impl FourierOperator for Gaussian {
    fn evaluate(&self, frequency: &Vector2<f64>) -> f64 {
        self.amplitude * (-0.25 * self.b_factor * frequency.norm_squared()).exp()
    }
}

/// Wraps an arbitrary closure so callers can supply their own radial profiles.
pub struct FnOperator<F> {
    name: &'static str,
    function: F,
}

impl<F> FnOperator<F>
where
    F: Fn(&Vector2<f64>) -> f64 + Send + Sync,
{
    pub fn new(name: &'static str, function: F) -> Self {
        Self { name, function }
    }
}

impl<F> fmt::Debug for FnOperator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperator").field("name", &self.name).finish()
    }
}

impl<F> FourierOperator for FnOperator<F>
where
    F: Fn(&Vector2<f64>) -> f64 + Send + Sync,
{
    fn evaluate(&self, frequency: &Vector2<f64>) -> f64 {
        (self.function)(frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn constant_operator_fills_grid() {
        let grid = FrequencyGrid::new((4, 6), 1.0);
        let values = Constant::new(2.5).on_grid(&grid);
        assert_eq!(values.dim(), (4, 4));
        assert!(values.iter().all(|&v| v == 2.5));
    }

    #[test]
    fn gaussian_envelope_decays_with_b_factor() {
        let envelope = Gaussian::new(1.0, 100.0);
        assert!((envelope.evaluate(&Vector2::zeros()) - 1.0).abs() < TOLERANCE);
        let q = Vector2::new(0.1, 0.0);
        assert!((envelope.evaluate(&q) - (-0.25_f64).exp()).abs() < TOLERANCE);
    }

    #[test]
    fn closure_operator_evaluates_user_function() {
        let radial = FnOperator::new("radial", |q: &Vector2<f64>| q.norm());
        let value = radial.evaluate(&Vector2::new(3.0, 4.0));
        assert!((value - 5.0).abs() < TOLERANCE);
        assert!(format!("{radial:?}").contains("radial"));
    }
}
