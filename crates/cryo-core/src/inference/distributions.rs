use super::DistributionError;
use crate::core::error::{ConfigError, require_positive};
use crate::core::fourier::fft::{centered_irfft2, centered_rfft2};
use crate::core::fourier::grid::{FrequencyGrid, ModeKind};
use crate::core::fourier::operators::{Constant, FourierOperator};
use crate::engine::error::EngineError;
use crate::engine::pipeline::{Image, ImagingPipeline};
use crate::engine::scattering::ScatteringTheory;
use ndarray::{Array2, Zip};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A statistical model of observed images around a rendered prediction.
pub trait Distribution: Send + Sync {
    /// The noise-free prediction.
    fn render(&self, real_output: bool) -> Result<Image, DistributionError>;

    /// One noisy realization, fully determined by `seed`.
    fn sample(&self, seed: u64, real_output: bool) -> Result<Image, DistributionError>;

    fn log_likelihood(&self, observed: &Image) -> Result<f64, DistributionError>;
}

/// Independent complex Gaussian noise on every retained Fourier mode of the prediction.
///
/// A complex mode with variance `s` has real and imaginary parts of variance `s / 2` each;
/// the self-conjugate modes (zero frequency and the even-size Nyquist edges) carry a single
/// real part of variance `s`. Modes duplicated by Hermitian symmetry are never counted.
#[derive(Debug, Clone)]
pub struct IndependentGaussianFourierModes<S> {
    pipeline: ImagingPipeline<S>,
    variance: Arc<dyn FourierOperator>,
    contrast_scale: f64,
    normalize: bool,
}

impl<S: ScatteringTheory> IndependentGaussianFourierModes<S> {
    pub fn new(pipeline: ImagingPipeline<S>) -> Self {
        Self {
            pipeline,
            variance: Arc::new(Constant::new(1.0)),
            contrast_scale: 1.0,
            normalize: false,
        }
    }

    /// Replaces the per-mode variance. It must be finite and positive on every retained mode
    /// of the output grid.
    pub fn with_variance(
        mut self,
        variance: Arc<dyn FourierOperator>,
    ) -> Result<Self, DistributionError> {
        self.variance = variance;
        self.variance_on_grid(&self.output_grid())?;
        Ok(self)
    }

    pub fn with_constant_variance(self, variance: f64) -> Result<Self, DistributionError> {
        let variance = require_positive("variance", variance)?;
        self.with_variance(Arc::new(Constant::new(variance)))
    }

    /// Scales the prediction before noise is added.
    pub fn with_contrast_scale(mut self, contrast_scale: f64) -> Result<Self, ConfigError> {
        self.contrast_scale = require_positive("contrast_scale", contrast_scale)?;
        Ok(self)
    }

    /// Normalizes the rendered prediction before it is scaled.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn pipeline(&self) -> &ImagingPipeline<S> {
        &self.pipeline
    }

    pub fn variance(&self) -> &dyn FourierOperator {
        self.variance.as_ref()
    }

    pub fn contrast_scale(&self) -> f64 {
        self.contrast_scale
    }

    pub fn normalize(&self) -> bool {
        self.normalize
    }

    fn output_grid(&self) -> FrequencyGrid {
        self.pipeline.instrument().frequency_grid()
    }

    fn predicted_spectrum(&self) -> Result<Array2<Complex64>, DistributionError> {
        let mut spectrum = self.pipeline.render_fourier(self.normalize)?;
        spectrum.mapv_inplace(|value| value * self.contrast_scale);
        Ok(spectrum)
    }

    fn variance_on_grid(&self, grid: &FrequencyGrid) -> Result<Array2<f64>, DistributionError> {
        let variance = self.variance.on_grid(grid);
        for ((iy, ix), &value) in variance.indexed_iter() {
            let retained = grid.mode_kind(iy, ix) != ModeKind::Redundant;
            if retained && !(value.is_finite() && value > 0.0) {
                return Err(DistributionError::NonPositiveVariance { value, iy, ix });
            }
        }
        Ok(variance)
    }

    fn to_output(
        &self,
        spectrum: Array2<Complex64>,
        real_output: bool,
    ) -> Result<Image, DistributionError> {
        if real_output {
            let (_, width) = self.pipeline.instrument().shape();
            let image = centered_irfft2(&spectrum, width).map_err(EngineError::from)?;
            Ok(Image::Real(image))
        } else {
            Ok(Image::Fourier(spectrum))
        }
    }

    /// Draws Hermitian-consistent noise on the output half-plane.
    fn draw_noise(
        &self,
        grid: &FrequencyGrid,
        variance: &Array2<f64>,
        seed: u64,
    ) -> Array2<Complex64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut noise = Array2::<Complex64>::zeros(grid.shape());
        for ((iy, ix), value) in noise.indexed_iter_mut() {
            match grid.mode_kind(iy, ix) {
                ModeKind::Complex => {
                    let scale = (0.5 * variance[[iy, ix]]).sqrt();
                    let re: f64 = rng.sample(StandardNormal);
                    let im: f64 = rng.sample(StandardNormal);
                    *value = Complex64::new(re * scale, im * scale);
                }
                ModeKind::Real => {
                    let re: f64 = rng.sample(StandardNormal);
                    *value = Complex64::new(re * variance[[iy, ix]].sqrt(), 0.0);
                }
                ModeKind::Redundant => {}
            }
        }
        let (ny, nxh) = grid.shape();
        for iy in 0..ny {
            for ix in 0..nxh {
                if grid.mode_kind(iy, ix) == ModeKind::Redundant {
                    let (py, px) = grid.conjugate_partner(iy, ix);
                    noise[[iy, ix]] = noise[[py, px]].conj();
                }
            }
        }
        noise
    }

    fn observed_spectrum(&self, observed: &Image) -> Result<Array2<Complex64>, DistributionError> {
        let check = |expected: (usize, usize), actual: (usize, usize)| {
            if expected == actual {
                Ok(())
            } else {
                Err(DistributionError::ShapeMismatch {
                    expected: vec![expected.0, expected.1],
                    actual: vec![actual.0, actual.1],
                })
            }
        };
        match observed {
            Image::Real(image) => {
                check(self.pipeline.instrument().shape(), image.dim())?;
                Ok(centered_rfft2(image))
            }
            Image::Fourier(spectrum) => {
                check(self.output_grid().shape(), spectrum.dim())?;
                Ok(spectrum.clone())
            }
        }
    }
}

impl<S: ScatteringTheory> Distribution for IndependentGaussianFourierModes<S> {
    fn render(&self, real_output: bool) -> Result<Image, DistributionError> {
        self.to_output(self.predicted_spectrum()?, real_output)
    }

    #[instrument(skip(self), name = "gaussian_sample")]
    fn sample(&self, seed: u64, real_output: bool) -> Result<Image, DistributionError> {
        let grid = self.output_grid();
        let variance = self.variance_on_grid(&grid)?;
        let mut spectrum = self.predicted_spectrum()?;
        let noise = self.draw_noise(&grid, &variance, seed);
        spectrum += &noise;
        self.to_output(spectrum, real_output)
    }

    #[instrument(skip_all, name = "gaussian_log_likelihood")]
    fn log_likelihood(&self, observed: &Image) -> Result<f64, DistributionError> {
        let observed = self.observed_spectrum(observed)?;
        let grid = self.output_grid();
        let variance = self.variance_on_grid(&grid)?;
        let predicted = self.predicted_spectrum()?;

        let mut total = 0.0;
        let mut retained = 0usize;
        Zip::indexed(&observed)
            .and(&predicted)
            .and(&variance)
            .for_each(|(iy, ix), &data, &model, &sigma2| {
                let residual = data - model;
                match grid.mode_kind(iy, ix) {
                    ModeKind::Complex => {
                        total += -(PI * sigma2).ln() - residual.norm_sqr() / sigma2;
                        retained += 1;
                    }
                    ModeKind::Real => {
                        total += -0.5 * (2.0 * PI * sigma2).ln()
                            - residual.re * residual.re / (2.0 * sigma2);
                        retained += 1;
                    }
                    ModeKind::Redundant => {}
                }
            });
        debug!(retained, log_likelihood = total, "Evaluated Gaussian log-likelihood");
        Ok(total)
    }
}
