use super::pose::Pose;
use crate::core::error::ConfigError;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ConformationSelector {
    /// Images a single member.
    Index(usize),
    /// Images the weighted superposition of every member. Weights are normalized to sum
    /// to one when the ensemble is built.
    Weights(Vec<f64>),
}

/// One or more candidate structures sharing a pose.
#[derive(Debug, Clone)]
pub struct StructuralEnsemble<P> {
    conformations: Vec<P>,
    pose: Pose,
    selector: ConformationSelector,
}

impl<P> StructuralEnsemble<P> {
    pub fn single(potential: P, pose: impl Into<Pose>) -> Self {
        Self {
            conformations: vec![potential],
            pose: pose.into(),
            selector: ConformationSelector::Index(0),
        }
    }

    pub fn new(
        conformations: Vec<P>,
        pose: impl Into<Pose>,
        selector: ConformationSelector,
    ) -> Result<Self, ConfigError> {
        if conformations.is_empty() {
            return Err(ConfigError::Invalid {
                parameter: "conformations",
                reason: "an ensemble needs at least one conformation".to_string(),
            });
        }
        let selector = match selector {
            ConformationSelector::Index(index) if index >= conformations.len() => {
                return Err(ConfigError::OutOfRange {
                    parameter: "conformation_index",
                    value: index as f64,
                    min: 0.0,
                    max: (conformations.len() - 1) as f64,
                });
            }
            ConformationSelector::Weights(weights) => {
                ConformationSelector::Weights(normalize_weights(weights, conformations.len())?)
            }
            index => index,
        };
        Ok(Self {
            conformations,
            pose: pose.into(),
            selector,
        })
    }

    pub fn conformations(&self) -> &[P] {
        &self.conformations
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn selector(&self) -> &ConformationSelector {
        &self.selector
    }

    /// The same ensemble viewed under a different pose.
    pub fn with_pose(mut self, pose: impl Into<Pose>) -> Self {
        self.pose = pose.into();
        self
    }

    /// Members that contribute to the image, with their weights. Zero-weight members are
    /// skipped.
    pub fn selected_members(&self) -> Vec<(&P, f64)> {
        match &self.selector {
            ConformationSelector::Index(index) => vec![(&self.conformations[*index], 1.0)],
            ConformationSelector::Weights(weights) => self
                .conformations
                .iter()
                .zip(weights.iter().copied())
                .filter(|(_, weight)| *weight > 0.0)
                .collect(),
        }
    }
}

fn normalize_weights(weights: Vec<f64>, member_count: usize) -> Result<Vec<f64>, ConfigError> {
    if weights.len() != member_count {
        return Err(ConfigError::InvalidShape {
            parameter: "weights",
            shape: vec![weights.len()],
            reason: "there must be exactly one weight per conformation",
        });
    }
    if let Some(&weight) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(ConfigError::OutOfRange {
            parameter: "weights",
            value: weight,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(ConfigError::NonPositive {
            parameter: "weights_sum",
            value: total,
        });
    }
    if weights.iter().filter(|&&w| w > 0.0).count() == 1 {
        warn!("Weighted ensemble has a single non-zero member; prefer an index selector");
    }
    Ok(weights.into_iter().map(|w| w / total).collect())
}
