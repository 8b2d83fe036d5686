use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::num::Vector;

/// A differentiable loss function comparing a network output against a label.
///
/// `forward` returns the per-element losses unsummed so callers can inspect
/// the contribution of each class; `numeric_loss` collapses them.
#[enum_dispatch]
pub trait LossFunc {
    /// The loss of each element of `output` against `label`.
    fn forward(&self, output: &Vector, label: &Vector) -> Result<Vector>;

    /// The derivative of the loss with respect to each element of `output`.
    fn backward(&self, output: &Vector, label: &Vector) -> Result<Vector>;

    /// The total loss over all elements.
    fn numeric_loss(&self, output: &Vector, label: &Vector) -> Result<f32> {
        Ok(self.forward(output, label)?.sum())
    }
}

fn check_len(output: &Vector, label: &Vector) -> Result<()> {
    if output.len() == label.len() {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: (output.len(), 1),
            received: (label.len(), 1),
        })
    }
}

/// The closed set of loss functions a network can be built with.
#[enum_dispatch(LossFunc)]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Loss {
    MeanSquared(MeanSquared),
    Logistic(Logistic),
    CrossEntropy(CrossEntropy),
}

/// Squared error halved and averaged over the output length, so the
/// gradient comes out as a plain scaled difference.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeanSquared;

impl LossFunc for MeanSquared {
    fn forward(&self, output: &Vector, label: &Vector) -> Result<Vector> {
        check_len(output, label)?;
        let n = output.len() as f32;
        Ok(output
            .iter()
            .zip(label.iter())
            .map(|(o, l)| (o - l) * (o - l) / (2. * n))
            .collect())
    }

    fn backward(&self, output: &Vector, label: &Vector) -> Result<Vector> {
        check_len(output, label)?;
        let n = output.len() as f32;
        Ok(output
            .iter()
            .zip(label.iter())
            .map(|(o, l)| (o - l) / n)
            .collect())
    }
}

/// The log-likelihood loss for logistic regression.
///
/// Both forms blow up as outputs approach 0 or 1; callers are expected to
/// keep outputs off the boundary, for example with [SigmoidClamped]
/// (crate::a_funcs::SigmoidClamped) on the final layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Logistic;

impl LossFunc for Logistic {
    fn forward(&self, output: &Vector, label: &Vector) -> Result<Vector> {
        check_len(output, label)?;
        Ok(output
            .iter()
            .zip(label.iter())
            .map(|(o, l)| l * o.ln() + (1. - l) * (1. - o).ln())
            .collect())
    }

    fn backward(&self, output: &Vector, label: &Vector) -> Result<Vector> {
        check_len(output, label)?;
        Ok(output
            .iter()
            .zip(label.iter())
            .map(|(o, l)| -(o - l) / (o * (1. - o)))
            .collect())
    }
}

/// Cross-entropy with a small stabilizer added to the output before the
/// logarithm so exact zeros stay finite. The gradient is the true
/// derivative of the stabilized loss.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CrossEntropy;

impl CrossEntropy {
    pub const EPSILON: f32 = 1e-5;
}

impl LossFunc for CrossEntropy {
    fn forward(&self, output: &Vector, label: &Vector) -> Result<Vector> {
        check_len(output, label)?;
        Ok(output
            .iter()
            .zip(label.iter())
            .map(|(o, l)| -(l * (o + Self::EPSILON).ln()))
            .collect())
    }

    fn backward(&self, output: &Vector, label: &Vector) -> Result<Vector> {
        check_len(output, label)?;
        Ok(output
            .iter()
            .zip(label.iter())
            .map(|(o, l)| -(l / (o + Self::EPSILON)))
            .collect())
    }
}
