use super::error::EngineError;
use super::scattering::ScatteringTheory;
use crate::core::fourier::fft::{centered_irfft2, centered_rfft2};
use crate::core::fourier::operators::FourierOperator;
use crate::core::image::masks::Mask;
use crate::core::image::normalize::normalize_image;
use crate::core::models::instrument::InstrumentConfig;
use ndarray::{Array2, Zip};
use rustfft::num_complex::Complex64;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A rendered image in either real space or as a half-plane Fourier spectrum.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    Real(Array2<f64>),
    Fourier(Array2<Complex64>),
}

impl Image {
    pub fn is_real(&self) -> bool {
        matches!(self, Image::Real(_))
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            Image::Real(image) => image.dim(),
            Image::Fourier(spectrum) => spectrum.dim(),
        }
    }

    pub fn as_real(&self) -> Option<&Array2<f64>> {
        match self {
            Image::Real(image) => Some(image),
            Image::Fourier(_) => None,
        }
    }

    pub fn as_fourier(&self) -> Option<&Array2<Complex64>> {
        match self {
            Image::Real(_) => None,
            Image::Fourier(spectrum) => Some(spectrum),
        }
    }

    pub fn into_real(self) -> Option<Array2<f64>> {
        match self {
            Image::Real(image) => Some(image),
            Image::Fourier(_) => None,
        }
    }

    pub fn into_fourier(self) -> Option<Array2<Complex64>> {
        match self {
            Image::Real(_) => None,
            Image::Fourier(spectrum) => Some(spectrum),
        }
    }
}

/// Turns the Fourier contrast of a scattering theory into an image on the detector.
///
/// The contrast is computed on the padded grid, multiplied by any Fourier filters, brought to
/// real space, cropped to the output shape, masked, and optionally normalized. Fourier output
/// is the half-plane spectrum of that real-space result.
#[derive(Debug, Clone)]
pub struct ImagingPipeline<S> {
    instrument: InstrumentConfig,
    scattering_theory: S,
    filters: Vec<Arc<dyn FourierOperator>>,
    masks: Vec<Mask>,
}

impl<S: ScatteringTheory> ImagingPipeline<S> {
    pub fn new(instrument: InstrumentConfig, scattering_theory: S) -> Self {
        Self {
            instrument,
            scattering_theory,
            filters: Vec::new(),
            masks: Vec::new(),
        }
    }

    /// Adds a filter, evaluated on the padded frequency grid before cropping.
    pub fn with_filter(mut self, filter: Arc<dyn FourierOperator>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a real-space mask. Masks must match the output shape.
    pub fn with_mask(mut self, mask: Mask) -> Result<Self, EngineError> {
        let shape = self.instrument.shape();
        if mask.shape() != shape {
            return Err(EngineError::ShapeMismatch {
                context: "mask",
                expected: vec![shape.0, shape.1],
                actual: vec![mask.shape().0, mask.shape().1],
            });
        }
        self.masks.push(mask);
        Ok(self)
    }

    pub fn instrument(&self) -> &InstrumentConfig {
        &self.instrument
    }

    pub fn scattering_theory(&self) -> &S {
        &self.scattering_theory
    }

    pub fn filters(&self) -> &[Arc<dyn FourierOperator>] {
        &self.filters
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    #[instrument(skip(self), name = "render")]
    pub fn render(&self, real_output: bool, normalize: bool) -> Result<Image, EngineError> {
        if real_output {
            self.render_real(normalize).map(Image::Real)
        } else {
            self.render_fourier(normalize).map(Image::Fourier)
        }
    }

    pub fn render_real(&self, normalize: bool) -> Result<Array2<f64>, EngineError> {
        let contrast = self.filtered_contrast()?;
        self.finish_real(&contrast, normalize)
    }

    pub fn render_fourier(&self, normalize: bool) -> Result<Array2<Complex64>, EngineError> {
        let contrast = self.filtered_contrast()?;
        if !self.instrument.is_padded() && self.masks.is_empty() && !normalize {
            return Ok(contrast);
        }
        Ok(centered_rfft2(&self.finish_real(&contrast, normalize)?))
    }

    fn filtered_contrast(&self) -> Result<Array2<Complex64>, EngineError> {
        let mut contrast = self
            .scattering_theory
            .compute_fourier_contrast(&self.instrument)?;
        if !self.filters.is_empty() {
            let grid = self.instrument.padded_frequency_grid();
            for filter in &self.filters {
                let response = filter.on_grid(&grid);
                Zip::from(&mut contrast)
                    .and(&response)
                    .for_each(|value, &gain| *value *= gain);
            }
        }
        Ok(contrast)
    }

    fn finish_real(
        &self,
        contrast: &Array2<Complex64>,
        normalize: bool,
    ) -> Result<Array2<f64>, EngineError> {
        let (_, padded_width) = self.instrument.padded_shape();
        let padded = centered_irfft2(contrast, padded_width)?;
        let mut image = self.instrument.crop_to_shape(&padded)?;
        for mask in &self.masks {
            image = mask.apply(&image)?;
        }
        debug!(
            shape = ?image.dim(),
            masks = self.masks.len(),
            normalize,
            "Rendered real-space image"
        );
        if normalize {
            image = normalize_image(&image)?;
        }
        Ok(image)
    }
}

/// Renders every pipeline with the same output options.
pub fn render_batch<S: ScatteringTheory>(
    pipelines: &[ImagingPipeline<S>],
    real_output: bool,
    normalize: bool,
) -> Result<Vec<Image>, EngineError> {
    info!(count = pipelines.len(), real_output, "Rendering batch");

    #[cfg(not(feature = "parallel"))]
    let iterator = pipelines.iter();

    #[cfg(feature = "parallel")]
    let iterator = pipelines.par_iter();

    iterator
        .map(|pipeline| pipeline.render(real_output, normalize))
        .collect()
}
