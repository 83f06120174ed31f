use super::error::EngineError;
use super::integrators::PotentialIntegrator;
use super::transfer::TransferTheory;
use crate::core::models::ensemble::StructuralEnsemble;
use crate::core::models::instrument::InstrumentConfig;
use ndarray::{Array2, Zip};
use rustfft::num_complex::Complex64;
use tracing::{debug, instrument};

/// Produces the Fourier-space image contrast on the instrument's padded frequency grid.
pub trait ScatteringTheory: Send + Sync {
    fn compute_fourier_contrast(
        &self,
        instrument: &InstrumentConfig,
    ) -> Result<Array2<Complex64>, EngineError>;
}

/// Weak-phase scattering: the projected potential of the ensemble times the transfer.
#[derive(Debug, Clone)]
pub struct LinearScatteringTheory<P, I, T> {
    ensemble: StructuralEnsemble<P>,
    integrator: I,
    transfer_theory: T,
}

impl<P, I, T> LinearScatteringTheory<P, I, T>
where
    I: PotentialIntegrator<P>,
    T: TransferTheory,
{
    pub fn new(ensemble: StructuralEnsemble<P>, integrator: I, transfer_theory: T) -> Self {
        Self {
            ensemble,
            integrator,
            transfer_theory,
        }
    }

    pub fn ensemble(&self) -> &StructuralEnsemble<P> {
        &self.ensemble
    }

    pub fn integrator(&self) -> &I {
        &self.integrator
    }

    pub fn transfer_theory(&self) -> &T {
        &self.transfer_theory
    }

    pub fn with_ensemble(mut self, ensemble: StructuralEnsemble<P>) -> Self {
        self.ensemble = ensemble;
        self
    }

    /// Weighted sum of the projections of every selected conformation.
    pub fn project(&self, instrument: &InstrumentConfig) -> Result<Array2<Complex64>, EngineError> {
        let grid = instrument.padded_frequency_grid();
        let pose = self.ensemble.pose();
        let mut projection = Array2::<Complex64>::zeros(grid.shape());
        for (potential, weight) in self.ensemble.selected_members() {
            let member = self.integrator.integrate(potential, pose, instrument)?;
            projection.scaled_add(Complex64::new(weight, 0.0), &member);
        }
        Ok(projection)
    }
}

impl<P, I, T> ScatteringTheory for LinearScatteringTheory<P, I, T>
where
    P: Send + Sync,
    I: PotentialIntegrator<P>,
    T: TransferTheory,
{
    #[instrument(skip_all, name = "linear_scattering")]
    fn compute_fourier_contrast(
        &self,
        instrument: &InstrumentConfig,
    ) -> Result<Array2<Complex64>, EngineError> {
        let mut contrast = self.project(instrument)?;
        let grid = instrument.padded_frequency_grid();
        let transfer = self
            .transfer_theory
            .transfer_function(&grid, instrument.voltage_in_kilovolts());
        Zip::from(&mut contrast)
            .and(&transfer)
            .for_each(|value, &factor| *value *= factor);
        debug!(
            members = self.ensemble.selected_members().len(),
            shape = ?grid.shape(),
            "Computed Fourier contrast"
        );
        Ok(contrast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ensemble::ConformationSelector;
    use crate::core::models::pose::{EulerAnglePose, PoseModel};
    use crate::core::optics::ctf::ContrastTransferFunction;
    use crate::core::potential::voxel::VoxelGridPotential;
    use crate::engine::integrators::FourierSliceExtraction;
    use crate::engine::transfer::{ContrastTransferTheory, IdealTransferTheory};
    use ndarray::Array3;

    const TOLERANCE: f64 = 1e-9;

    fn blob(n: usize, center: (usize, usize, usize), height: f64) -> VoxelGridPotential {
        let mut volume = Array3::zeros((n, n, n));
        volume[[center.2, center.1, center.0]] = height;
        VoxelGridPotential::from_real_grid(volume, 1.0).unwrap()
    }

    #[test]
    fn ideal_transfer_returns_the_projection() {
        let n = 7;
        let ensemble =
            StructuralEnsemble::single(blob(n, (3, 3, 3), 2.0), EulerAnglePose::identity());
        let theory = LinearScatteringTheory::new(
            ensemble,
            FourierSliceExtraction::default(),
            IdealTransferTheory,
        );
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let contrast = theory.compute_fourier_contrast(&instrument).unwrap();
        assert_eq!(contrast.dim(), (7, 4));
        assert!(
            contrast
                .iter()
                .all(|v| (v - Complex64::new(2.0, 0.0)).norm() < TOLERANCE)
        );
    }

    #[test]
    fn contrast_is_projection_times_ctf() {
        let n = 8;
        let ensemble =
            StructuralEnsemble::single(blob(n, (4, 4, 4), 1.0), EulerAnglePose::identity());
        let ctf = ContrastTransferFunction::builder()
            .defocus_in_angstroms(10_000.0)
            .build()
            .unwrap();
        let theory = LinearScatteringTheory::new(
            ensemble,
            FourierSliceExtraction::default(),
            ContrastTransferTheory::new(ctf),
        );
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let contrast = theory.compute_fourier_contrast(&instrument).unwrap();
        let projection = theory.project(&instrument).unwrap();
        let transfer = ctf.on_grid(&instrument.frequency_grid(), 300.0);
        for ((iy, ix), value) in contrast.indexed_iter() {
            assert!((value - projection[[iy, ix]] * transfer[[iy, ix]]).norm() < TOLERANCE);
        }
    }

    #[test]
    fn weighted_ensemble_superposes_members() {
        let n = 7;
        let members = vec![blob(n, (3, 3, 3), 1.0), blob(n, (3, 3, 3), 3.0)];
        let ensemble = StructuralEnsemble::new(
            members,
            EulerAnglePose::identity(),
            ConformationSelector::Weights(vec![1.0, 3.0]),
        )
        .unwrap();
        let theory = LinearScatteringTheory::new(
            ensemble,
            FourierSliceExtraction::default(),
            IdealTransferTheory,
        );
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let contrast = theory.compute_fourier_contrast(&instrument).unwrap();
        // 0.25 * 1 + 0.75 * 3
        assert!((contrast[[0, 0]] - Complex64::new(2.5, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn replacing_the_ensemble_changes_the_pose() {
        let n = 7;
        let ensemble =
            StructuralEnsemble::single(blob(n, (3, 3, 3), 1.0), EulerAnglePose::identity());
        let theory = LinearScatteringTheory::new(
            ensemble.clone(),
            FourierSliceExtraction::default(),
            IdealTransferTheory,
        );
        let shifted_pose = EulerAnglePose::new(1.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        let shifted = theory.clone().with_ensemble(ensemble.with_pose(shifted_pose));
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let still = theory.project(&instrument).unwrap();
        let moved = shifted.project(&instrument).unwrap();
        // qx = 1 / 7 picks up a phase of -2 pi / 7.
        let ramp = Complex64::from_polar(1.0, -2.0 * std::f64::consts::PI / 7.0);
        assert!((moved[[0, 1]] - still[[0, 1]] * ramp).norm() < TOLERANCE);
        assert_eq!(shifted.ensemble().pose().offset().x, 1.0);
    }

    #[test]
    fn index_selector_images_only_the_chosen_member() {
        let n = 7;
        let members = vec![blob(n, (3, 3, 3), 1.0), blob(n, (3, 3, 3), 5.0)];
        let ensemble = StructuralEnsemble::new(
            members,
            EulerAnglePose::identity(),
            ConformationSelector::Index(1),
        )
        .unwrap();
        let theory = LinearScatteringTheory::new(
            ensemble,
            FourierSliceExtraction::default(),
            IdealTransferTheory,
        );
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let contrast = theory.compute_fourier_contrast(&instrument).unwrap();
        assert!((contrast[[0, 0]] - Complex64::new(5.0, 0.0)).norm() < TOLERANCE);
    }
}
