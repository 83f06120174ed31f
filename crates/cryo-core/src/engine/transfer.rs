use crate::core::error::{ConfigError, require_in_range};
use crate::core::fourier::grid::FrequencyGrid;
use crate::core::fourier::operators::{Constant, FourierOperator, Gaussian};
use crate::core::optics::ctf::ContrastTransferFunction;
use ndarray::{Array2, Zip};
use std::sync::Arc;
use tracing::trace;

/// Produces the per-mode transfer applied to a projection before it becomes image contrast.
pub trait TransferTheory: Send + Sync {
    fn transfer_function(&self, grid: &FrequencyGrid, voltage_in_kilovolts: f64) -> Array2<f64>;
}

/// The weak-phase CTF multiplied by an envelope.
#[derive(Debug, Clone)]
pub struct ContrastTransferTheory {
    ctf: ContrastTransferFunction,
    envelope: Arc<dyn FourierOperator>,
}

impl ContrastTransferTheory {
    pub fn new(ctf: ContrastTransferFunction) -> Self {
        Self {
            ctf,
            envelope: Arc::new(Constant::new(1.0)),
        }
    }

    pub fn with_envelope(mut self, envelope: Arc<dyn FourierOperator>) -> Self {
        self.envelope = envelope;
        self
    }

    /// Installs the envelope `exp(-b |q|^2 / 4)`. The B-factor must be finite and non-negative.
    pub fn with_b_factor(self, b_factor: f64) -> Result<Self, ConfigError> {
        let b_factor = require_in_range("b_factor", b_factor, 0.0, f64::MAX)?;
        Ok(self.with_envelope(Arc::new(Gaussian::new(1.0, b_factor))))
    }

    pub fn ctf(&self) -> &ContrastTransferFunction {
        &self.ctf
    }

    pub fn envelope(&self) -> &dyn FourierOperator {
        self.envelope.as_ref()
    }
}

impl TransferTheory for ContrastTransferTheory {
    fn transfer_function(&self, grid: &FrequencyGrid, voltage_in_kilovolts: f64) -> Array2<f64> {
        trace!(
            defocus_u = self.ctf.defocus_u_in_angstroms(),
            defocus_v = self.ctf.defocus_v_in_angstroms(),
            "Evaluating contrast transfer"
        );
        let mut transfer = self.ctf.on_grid(grid, voltage_in_kilovolts);
        let envelope = self.envelope.on_grid(grid);
        Zip::from(&mut transfer)
            .and(&envelope)
            .for_each(|value, &damping| *value *= damping);
        transfer
    }
}

/// Unit transfer at every mode, for looking at raw projections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdealTransferTheory;

impl TransferTheory for IdealTransferTheory {
    fn transfer_function(&self, grid: &FrequencyGrid, _voltage_in_kilovolts: f64) -> Array2<f64> {
        Array2::ones(grid.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn stigmatic_ctf() -> ContrastTransferFunction {
        ContrastTransferFunction::builder()
            .defocus_in_angstroms(15_000.0)
            .spherical_aberration_in_mm(2.7)
            .build()
            .unwrap()
    }

    #[test]
    fn stigmatic_transfer_depends_only_on_frequency_magnitude() {
        let theory = ContrastTransferTheory::new(stigmatic_ctf())
            .with_b_factor(50.0)
            .unwrap();
        let grid = FrequencyGrid::new((16, 16), 1.5);
        let transfer = theory.transfer_function(&grid, 300.0);
        // (qx, qy) = (3, 4) / (16 * 1.5) and (4, 3) / (16 * 1.5) and (0, 5) / (16 * 1.5).
        let a = transfer[[4, 3]];
        let b = transfer[[3, 4]];
        let c = transfer[[5, 0]];
        let d = transfer[[16 - 5, 0]];
        assert!((a - b).abs() < TOLERANCE);
        assert!((a - c).abs() < TOLERANCE);
        assert!((a - d).abs() < TOLERANCE);
    }

    #[test]
    fn envelope_multiplies_the_ctf() {
        let ctf = stigmatic_ctf();
        let grid = FrequencyGrid::new((8, 8), 2.0);
        let bare = ContrastTransferTheory::new(ctf).transfer_function(&grid, 300.0);
        let damped = ContrastTransferTheory::new(ctf)
            .with_b_factor(100.0)
            .unwrap()
            .transfer_function(&grid, 300.0);
        for ((iy, ix), &value) in damped.indexed_iter() {
            let q = grid.frequency(iy, ix);
            let envelope = (-25.0 * q.norm_squared()).exp();
            assert!((value - bare[[iy, ix]] * envelope).abs() < TOLERANCE);
        }
    }

    #[test]
    fn negative_or_non_finite_b_factor_is_rejected() {
        for b_factor in [-1.0e6, -0.5, f64::NAN, f64::INFINITY] {
            let result = ContrastTransferTheory::new(stigmatic_ctf()).with_b_factor(b_factor);
            assert!(matches!(
                result,
                Err(ConfigError::OutOfRange {
                    parameter: "b_factor",
                    ..
                })
            ));
        }
        let flat = ContrastTransferTheory::new(stigmatic_ctf())
            .with_b_factor(0.0)
            .unwrap();
        let grid = FrequencyGrid::new((6, 6), 1.0);
        assert!(flat.transfer_function(&grid, 300.0).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn default_envelope_leaves_ctf_unchanged() {
        let ctf = stigmatic_ctf();
        let grid = FrequencyGrid::new((6, 7), 1.0);
        let theory = ContrastTransferTheory::new(ctf);
        assert_eq!(
            theory.transfer_function(&grid, 200.0),
            ctf.on_grid(&grid, 200.0)
        );
    }

    #[test]
    fn ideal_transfer_is_unity() {
        let grid = FrequencyGrid::new((4, 5), 1.0);
        let transfer = IdealTransferTheory.transfer_function(&grid, 300.0);
        assert_eq!(transfer.dim(), (4, 3));
        assert!(transfer.iter().all(|&v| v == 1.0));
    }
}
