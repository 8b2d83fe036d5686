use serde::{Deserialize, Serialize};

use super::Optimizable;
use crate::a_funcs::{ActivFunc, Activation};
use crate::error::{Error, Result};
use crate::initializer::Initializer;
use crate::num::{Matrix, Vector};

/// Your run of the mill fully connected layer: a weight matrix, an optional
/// bias vector and an activation function.
///
/// The layer holds its parameters and the gradient accumulators, but not the
/// per-pass caches. `forward` hands the pre-activation sums and the outputs
/// back to the caller, and `backward` receives them again together with the
/// previous layer's outputs. That keeps evaluation free of `&mut`, so one
/// layer value can serve any number of concurrent passes as long as each
/// pass owns its caches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Linear {
    in_size: usize,
    out_size: usize,

    weights: Matrix,
    biases: Option<Vector>,
    activation: Activation,
    initialized: bool,

    #[serde(skip)]
    weights_grad_sum: Matrix,
    #[serde(skip)]
    biases_grad_sum: Option<Vector>,
    #[serde(skip)]
    batch_size: usize,
}

impl Linear {
    /// Constructs the layer with zeroed weights. The layer refuses to
    /// evaluate until an [Initializer](crate::initializer::Initializer)
    /// has been applied through [init_weights](Self::init_weights).
    pub fn new<A: Into<Activation>>(
        in_size: usize,
        out_size: usize,
        activation: A,
        use_biases: bool,
    ) -> Self {
        Self {
            in_size,
            out_size,
            weights: Matrix::zeros(out_size, in_size),
            biases: if use_biases {
                Some(Vector::zeros(out_size))
            } else {
                None
            },
            activation: activation.into(),
            initialized: false,
            weights_grad_sum: Matrix::zeros(out_size, in_size),
            biases_grad_sum: if use_biases {
                Some(Vector::zeros(out_size))
            } else {
                None
            },
            batch_size: 0,
        }
    }

    /// Fills the weight matrix from the given strategy. Biases start at zero.
    pub fn init_weights<I: Initializer>(&mut self, mut init: I) {
        self.weights = init.init(self.out_size, self.in_size);
        self.initialized = true;
    }

    /// Computes the layer's pre-activation sums and outputs.
    /// Both are returned so the caller can cache them for the backward pass.
    pub fn forward(&self, input: &Vector) -> Result<(Vector, Vector)> {
        if !self.initialized {
            return Err(Error::UninitializedParameter);
        }
        let mut sums = self.weights.mul_vec(input)?;
        if let Some(biases) = &self.biases {
            sums.add_in_place(biases)?;
        }
        let outs = self.activation.forward_vec(&sums)?;
        Ok((sums, outs))
    }

    /// Accumulates the parameter gradients for one sample and returns the
    /// gradient with respect to the previous layer's outputs.
    ///
    /// `sums` and `prev_outs` are the caches from the matching `forward`
    /// call; `out_grad` is the gradient flowing in from downstream. The
    /// gradient through the activation has to come first since both the
    /// weight gradient and the propagated gradient are built from it.
    pub fn backward(
        &mut self,
        sums: &Vector,
        prev_outs: &Vector,
        out_grad: &Vector,
    ) -> Result<Vector> {
        if !self.initialized {
            return Err(Error::UninitializedParameter);
        }
        let sum_grad = self.activation.backward_vec(sums, out_grad)?;

        // d(sums)/d(weights) is the previous layer's output, so the weight
        // gradient is the outer product of the two.
        let weights_grad = sum_grad.outer(prev_outs);
        self.weights_grad_sum.add_in_place(&weights_grad)?;

        // d(sums)/d(biases) = 1
        if let Some(grad_sum) = &mut self.biases_grad_sum {
            grad_sum.add_in_place(&sum_grad)?;
        }
        self.batch_size += 1;

        self.weights.transposed().mul_vec(&sum_grad)
    }

    pub fn in_size(&self) -> usize {
        self.in_size
    }

    pub fn out_size(&self) -> usize {
        self.out_size
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    pub fn biases(&self) -> Option<&Vector> {
        self.biases.as_ref()
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn weights_grad_sum(&self) -> &Matrix {
        &self.weights_grad_sum
    }

    pub fn biases_grad_sum(&self) -> Option<&Vector> {
        self.biases_grad_sum.as_ref()
    }

    /// The number of samples accumulated since the last `zero_grad`.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reallocates the gradient accumulators.
    /// Used after deserialization as this memory doesn't need to be serialized.
    pub fn rebuild(&mut self) {
        self.weights_grad_sum = Matrix::zeros(self.out_size, self.in_size);
        self.biases_grad_sum = self.biases.as_ref().map(|b| Vector::zeros(b.len()));
        self.batch_size = 0;
    }
}

impl Optimizable for Linear {
    fn update(&mut self, lr: f32) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::EmptyBatchUpdate);
        }
        // the step size should be independent of how many samples were
        // accumulated, so the sum is averaged before scaling
        let scale = lr / self.batch_size as f32;
        let step = self.weights_grad_sum.scale(scale);
        self.weights.sub_in_place(&step)?;

        if let (Some(biases), Some(grad_sum)) = (&mut self.biases, &self.biases_grad_sum) {
            biases.sub_in_place(&grad_sum.scale(scale))?;
        }
        Ok(())
    }

    fn zero_grad(&mut self) {
        self.weights_grad_sum.fill(0.);
        if let Some(grad_sum) = &mut self.biases_grad_sum {
            grad_sum.fill(0.);
        }
        self.batch_size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a_funcs::Identity;
    use crate::initializer::WeightInit;
    use crate::layers::tests::check;

    const TOLERANCE: f32 = 0.0001;

    fn identity_layer() -> Linear {
        let mut layer = Linear::new(2, 1, Identity, false);
        layer.init_weights(WeightInit::new(vec![1., 2.]));
        layer
    }

    #[test]
    fn forward_is_the_weighted_sum() {
        let layer = identity_layer();
        let (sums, outs) = layer.forward(&Vector::new(vec![3., 4.])).unwrap();
        check(&[11.], sums.as_slice(), TOLERANCE, "sums");
        check(&[11.], outs.as_slice(), TOLERANCE, "output");
    }

    #[test]
    fn backward_accumulates_the_outer_product() {
        let mut layer = identity_layer();
        let input = Vector::new(vec![3., 4.]);
        let (sums, _) = layer.forward(&input).unwrap();

        let prev_grad = layer
            .backward(&sums, &input, &Vector::new(vec![1.]))
            .unwrap();

        check(
            &[3., 4.],
            layer.weights_grad_sum().as_slice(),
            TOLERANCE,
            "weight gradients",
        );
        assert_eq!(layer.batch_size(), 1);
        // gradient handed to the previous layer is weights^T * sum_grad
        check(&[1., 2.], prev_grad.as_slice(), TOLERANCE, "propagated gradients");
    }

    #[test]
    fn update_steps_against_the_average_gradient() {
        let mut layer = identity_layer();
        let input = Vector::new(vec![3., 4.]);
        let (sums, _) = layer.forward(&input).unwrap();
        layer
            .backward(&sums, &input, &Vector::new(vec![1.]))
            .unwrap();

        layer.update(0.1).unwrap();
        check(
            &[0.7, 1.6],
            layer.weights().as_slice(),
            TOLERANCE,
            "weights",
        );
    }

    #[test]
    fn zero_grad_resets_the_accumulators() {
        let mut layer = identity_layer();
        let input = Vector::new(vec![3., 4.]);
        let (sums, _) = layer.forward(&input).unwrap();
        layer
            .backward(&sums, &input, &Vector::new(vec![1.]))
            .unwrap();

        layer.zero_grad();
        check(
            &[0., 0.],
            layer.weights_grad_sum().as_slice(),
            TOLERANCE,
            "weight gradients",
        );
        assert_eq!(layer.batch_size(), 0);
        assert_eq!(layer.update(0.1), Err(Error::EmptyBatchUpdate));
    }

    #[test]
    fn biases_follow_the_sum_gradient() {
        let mut layer = Linear::new(2, 2, Identity, true);
        layer.init_weights(WeightInit::new(vec![1., 0., 0., 1.]));

        let input = Vector::new(vec![1., 2.]);
        let (sums, outs) = layer.forward(&input).unwrap();
        check(&[1., 2.], outs.as_slice(), TOLERANCE, "output");

        layer
            .backward(&sums, &input, &Vector::new(vec![0.5, -0.5]))
            .unwrap();
        check(
            &[0.5, -0.5],
            layer.biases_grad_sum().unwrap().as_slice(),
            TOLERANCE,
            "bias gradients",
        );

        layer.update(1.).unwrap();
        check(
            &[-0.5, 0.5],
            layer.biases().unwrap().as_slice(),
            TOLERANCE,
            "biases",
        );
    }

    #[test]
    fn gradients_accumulate_across_samples() {
        let mut layer = identity_layer();
        for _ in 0..3 {
            let input = Vector::new(vec![1., 1.]);
            let (sums, _) = layer.forward(&input).unwrap();
            layer
                .backward(&sums, &input, &Vector::new(vec![2.]))
                .unwrap();
        }
        assert_eq!(layer.batch_size(), 3);
        check(
            &[6., 6.],
            layer.weights_grad_sum().as_slice(),
            TOLERANCE,
            "weight gradients",
        );

        // update divides by the batch size
        layer.update(1.).unwrap();
        check(&[-1., 0.], layer.weights().as_slice(), TOLERANCE, "weights");
    }

    #[test]
    fn uninitialized_layer_refuses_to_evaluate() {
        let mut layer = Linear::new(2, 1, Identity, false);
        let input = Vector::new(vec![3., 4.]);
        assert_eq!(layer.forward(&input), Err(Error::UninitializedParameter));
        assert_eq!(
            layer.backward(&Vector::zeros(1), &input, &Vector::zeros(1)),
            Err(Error::UninitializedParameter)
        );
    }

    #[test]
    fn mismatched_input_fails() {
        let layer = identity_layer();
        assert!(layer.forward(&Vector::zeros(3)).is_err());
    }
}
