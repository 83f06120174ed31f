use super::DistributionError;
use super::distributions::Distribution;
use crate::engine::pipeline::Image;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A batch of images, each paired with the distribution it is modeled by.
#[derive(Debug, Clone)]
pub struct ParticleStack<D> {
    images: Vec<Image>,
    distributions: Vec<D>,
}

impl<D: Distribution> ParticleStack<D> {
    pub fn new(images: Vec<Image>, distributions: Vec<D>) -> Result<Self, DistributionError> {
        if images.len() != distributions.len() {
            return Err(DistributionError::StackLengthMismatch {
                images: images.len(),
                distributions: distributions.len(),
            });
        }
        Ok(Self {
            images,
            distributions,
        })
    }

    /// Draws one synthetic image per distribution, using `seeds[i]` for image `i`.
    pub fn simulate(
        distributions: Vec<D>,
        seeds: &[u64],
        real_output: bool,
        reporter: &ProgressReporter,
    ) -> Result<Self, DistributionError> {
        if seeds.len() != distributions.len() {
            return Err(DistributionError::StackLengthMismatch {
                images: seeds.len(),
                distributions: distributions.len(),
            });
        }
        info!(count = seeds.len(), real_output, "Simulating particle stack.");
        reporter.report(Progress::BatchStart {
            total: seeds.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = distributions.iter().zip(seeds.iter());

        #[cfg(feature = "parallel")]
        let iterator = distributions.par_iter().zip(seeds.par_iter());

        let images = iterator
            .map(|(distribution, &seed)| {
                let image = distribution.sample(seed, real_output);
                reporter.report(Progress::ItemFinished);
                image
            })
            .collect::<Result<Vec<_>, _>>()?;

        reporter.report(Progress::BatchFinish);
        Ok(Self {
            images,
            distributions,
        })
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn distributions(&self) -> &[D] {
        &self.distributions
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Log-likelihood of each image under its own distribution.
    pub fn log_likelihoods(&self) -> Result<Vec<f64>, DistributionError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = self.images.iter().zip(self.distributions.iter());

        #[cfg(feature = "parallel")]
        let iterator = self.images.par_iter().zip(self.distributions.par_iter());

        iterator
            .map(|(image, distribution)| distribution.log_likelihood(image))
            .collect()
    }

    pub fn total_log_likelihood(&self) -> Result<f64, DistributionError> {
        Ok(self.log_likelihoods()?.into_iter().sum())
    }
}
