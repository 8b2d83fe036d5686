use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::num::Vector;

/// A differentiable activation function.
///
/// Implementors provide the scalar `forward` and `gradient` forms; the
/// vectorized forms apply those elementwise unless a variant has no
/// per-element form and overrides them.
#[enum_dispatch]
pub trait ActivFunc {
    /// The value of the function at `x`.
    fn forward(&self, x: f32) -> Result<f32>;

    /// The derivative of `forward` at `x`.
    fn gradient(&self, x: f32) -> Result<f32>;

    /// The derivative at `x` multiplied by an upstream factor `y` (chain rule).
    fn backward(&self, x: f32, y: f32) -> Result<f32> {
        Ok(self.gradient(x)? * y)
    }

    fn forward_vec(&self, vec: &Vector) -> Result<Vector> {
        vec.iter().map(|&x| self.forward(x)).collect()
    }

    fn backward_vec(&self, vec: &Vector, grad: &Vector) -> Result<Vector> {
        check_len(vec, grad)?;
        vec.iter()
            .zip(grad.iter())
            .map(|(&x, &y)| self.backward(x, y))
            .collect()
    }
}

fn check_len(a: &Vector, b: &Vector) -> Result<()> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: (a.len(), 1),
            received: (b.len(), 1),
        })
    }
}

/// The closed set of activation functions a layer can be built with.
#[enum_dispatch(ActivFunc)]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Activation {
    Identity(Identity),
    ReLU(ReLU),
    LeakyReLU(LeakyReLU),
    Sigmoid(Sigmoid),
    SigmoidClamped(SigmoidClamped),
    SoftMax(SoftMax),
    Sine(Sine),
    Exponential(Exponential),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Identity;

impl ActivFunc for Identity {
    fn forward(&self, x: f32) -> Result<f32> {
        Ok(x)
    }

    fn gradient(&self, _: f32) -> Result<f32> {
        Ok(1.)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReLU;

impl ActivFunc for ReLU {
    fn forward(&self, x: f32) -> Result<f32> {
        Ok(f32::max(x, 0.))
    }

    fn gradient(&self, x: f32) -> Result<f32> {
        Ok(if x >= 0. { 1. } else { 0. })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeakyReLU {
    pub leak: f32,
}

impl LeakyReLU {
    pub fn new(leak: f32) -> Self {
        Self { leak }
    }
}

impl Default for LeakyReLU {
    fn default() -> Self {
        Self { leak: 0.01 }
    }
}

impl ActivFunc for LeakyReLU {
    fn forward(&self, x: f32) -> Result<f32> {
        Ok(if x > 0. { x } else { self.leak * x })
    }

    fn gradient(&self, x: f32) -> Result<f32> {
        Ok(if x >= 0. { 1. } else { self.leak })
    }
}

/// The logistic function with its input divided by `squeeze` before the
/// exponential, which keeps large pre-activation sums from overflowing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sigmoid {
    pub squeeze: f32,
}

impl Sigmoid {
    pub fn new(squeeze: f32) -> Self {
        Self { squeeze }
    }
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self { squeeze: 50. }
    }
}

impl ActivFunc for Sigmoid {
    fn forward(&self, x: f32) -> Result<f32> {
        let x = x / self.squeeze;
        Ok(1. / (1. + (-x).exp()))
    }

    fn gradient(&self, x: f32) -> Result<f32> {
        let x = x / self.squeeze;
        let ex = x.exp();
        Ok(ex / ((ex + 1.) * (ex + 1.)) / self.squeeze)
    }
}

/// A squeezed logistic function treated as saturated past five squeeze
/// units from zero. Saturated outputs are exactly 0 or 1 and the gradient
/// there is a small nonzero constant so learning never fully stalls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SigmoidClamped {
    pub squeeze: f32,
}

impl SigmoidClamped {
    pub fn new(squeeze: f32) -> Self {
        Self { squeeze }
    }
}

impl Default for SigmoidClamped {
    fn default() -> Self {
        Self { squeeze: 100. }
    }
}

impl ActivFunc for SigmoidClamped {
    fn forward(&self, x: f32) -> Result<f32> {
        let x = x / self.squeeze;
        Ok(if x > 5. {
            1.
        } else if x > -5. {
            1. / (1. + (-x).exp())
        } else {
            0.
        })
    }

    fn gradient(&self, x: f32) -> Result<f32> {
        let x = x / self.squeeze;
        Ok(if x > 5. {
            0.0001
        } else if x > -5. {
            let ex = x.exp();
            ex / ((ex + 1.) * (ex + 1.)) / self.squeeze
        } else {
            -0.0001
        })
    }
}

/// The normalized exponential. This is the one activation without a
/// per-element form: its output couples every element of the input, so the
/// scalar contract refuses and the whole-vector forms do the real work.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SoftMax;

impl ActivFunc for SoftMax {
    fn forward(&self, _: f32) -> Result<f32> {
        Err(Error::UnimplementedFunction { name: "softmax" })
    }

    fn gradient(&self, _: f32) -> Result<f32> {
        Err(Error::UnimplementedFunction { name: "softmax" })
    }

    fn forward_vec(&self, vec: &Vector) -> Result<Vector> {
        let mut exps = Vec::with_capacity(vec.len());
        let mut sum = 0.;
        for &x in vec.iter() {
            let e = x.exp();
            exps.push(e);
            sum += e;
        }
        Ok(exps.into_iter().map(|e| e / sum).collect())
    }

    /// Contracts the full softmax Jacobian with the upstream gradient:
    /// `out[i] = s[i] * (grad[i] - sum_j s[j] * grad[j])`.
    fn backward_vec(&self, vec: &Vector, grad: &Vector) -> Result<Vector> {
        check_len(vec, grad)?;
        let s = self.forward_vec(vec)?;
        let weighted: f32 = s.iter().zip(grad.iter()).map(|(a, b)| a * b).sum();
        Ok(s
            .iter()
            .zip(grad.iter())
            .map(|(&si, &gi)| si * (gi - weighted))
            .collect())
    }
}

/// Sine rescaled into the unit interval, `(1 + sin x) / 2`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Sine;

impl ActivFunc for Sine {
    fn forward(&self, x: f32) -> Result<f32> {
        Ok((1. + x.sin()) / 2.)
    }

    fn gradient(&self, x: f32) -> Result<f32> {
        Ok(x.cos() / 2.)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Exponential;

impl ActivFunc for Exponential {
    fn forward(&self, x: f32) -> Result<f32> {
        Ok(x.exp())
    }

    fn gradient(&self, x: f32) -> Result<f32> {
        Ok(x.exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::tests::check;

    const TOLERANCE: f32 = 0.0001;

    /// Central difference approximation of the derivative of `forward`.
    fn numeric_gradient<F: ActivFunc>(f: &F, x: f32) -> f32 {
        let eps = 1e-2;
        (f.forward(x + eps).unwrap() - f.forward(x - eps).unwrap()) / (2. * eps)
    }

    #[test]
    fn gradients_match_finite_differences() {
        let funcs: Vec<Activation> = vec![
            Identity.into(),
            ReLU.into(),
            LeakyReLU::default().into(),
            Sigmoid::new(1.).into(),
            Sigmoid::default().into(),
            SigmoidClamped::new(1.).into(),
            Sine.into(),
            Exponential.into(),
        ];
        // stays clear of the relu kink at zero and the clamp boundaries
        for f in &funcs {
            for &x in &[-2.3, -0.7, 0.4, 1.9] {
                let expected = numeric_gradient(f, x);
                let received = f.gradient(x).unwrap();
                assert!(
                    (expected - received).abs() < 1e-3,
                    "gradient of {:?} at {} was {} but finite differences gave {}",
                    f,
                    x,
                    received,
                    expected
                );
            }
        }
    }

    #[test]
    fn backward_composes_with_upstream_factor() {
        let f = Sigmoid::new(1.);
        let g = f.gradient(0.3).unwrap();
        assert_eq!(f.backward(0.3, 2.5).unwrap(), g * 2.5);
    }

    #[test]
    fn clamped_sigmoid_saturates() {
        let f = SigmoidClamped::new(1.);
        assert_eq!(f.forward(6.).unwrap(), 1.);
        assert_eq!(f.forward(-6.).unwrap(), 0.);
        assert_eq!(f.gradient(6.).unwrap(), 0.0001);
        assert_eq!(f.gradient(-6.).unwrap(), -0.0001);

        // the default squeeze of 100 moves the boundary to x = 500
        let f = SigmoidClamped::default();
        assert_eq!(f.forward(501.).unwrap(), 1.);
        assert!(f.forward(499.).unwrap() < 1.);
    }

    #[test]
    fn softmax_normalizes() {
        let f = SoftMax;
        let out = f.forward_vec(&Vector::new(vec![1., 2., 3., 4.])).unwrap();
        assert!((out.sum() - 1.).abs() < TOLERANCE);
        assert!(out.iter().all(|&x| x > 0.));
        // larger inputs map to larger probabilities
        assert!(out[3] > out[2] && out[2] > out[1] && out[1] > out[0]);
    }

    #[test]
    fn softmax_has_no_scalar_form() {
        assert_eq!(
            SoftMax.forward(1.),
            Err(Error::UnimplementedFunction { name: "softmax" })
        );
        assert_eq!(
            SoftMax.gradient(1.),
            Err(Error::UnimplementedFunction { name: "softmax" })
        );
        assert!(SoftMax.backward(1., 1.).is_err());
    }

    #[test]
    fn softmax_jacobian_matches_finite_differences() {
        let f = SoftMax;
        let x = Vector::new(vec![0.3, -1.2, 0.8]);
        let grad = Vector::new(vec![1., -0.5, 0.25]);
        let received = f.backward_vec(&x, &grad).unwrap();

        let eps = 1e-2;
        for i in 0..x.len() {
            let mut hi = x.clone();
            hi[i] += eps;
            let mut lo = x.clone();
            lo[i] -= eps;
            // directional derivative of sum_j grad[j] * softmax(x)[j]
            let expected = (f.forward_vec(&hi).unwrap().dot(&grad).unwrap()
                - f.forward_vec(&lo).unwrap().dot(&grad).unwrap())
                / (2. * eps);
            assert!(
                (expected - received[i]).abs() < 1e-3,
                "entry {}: expected {} received {}",
                i,
                expected,
                received[i]
            );
        }
    }

    #[test]
    fn vectorized_forms_apply_elementwise() {
        let f = ReLU;
        let out = f.forward_vec(&Vector::new(vec![-1., 2., -3., 4.])).unwrap();
        check(&[0., 2., 0., 4.], out.as_slice(), TOLERANCE, "output");

        let grads = f
            .backward_vec(
                &Vector::new(vec![-1., 2., -3., 4.]),
                &Vector::new(vec![10., 10., 10., 10.]),
            )
            .unwrap();
        check(&[0., 10., 0., 10.], grads.as_slice(), TOLERANCE, "gradients");

        assert!(f
            .backward_vec(&Vector::zeros(3), &Vector::zeros(4))
            .is_err());
    }
}
