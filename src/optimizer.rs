use crate::error::Result;
use crate::layers::Optimizable;

/// Stochastic gradient descent over a set of layers, with an optional
/// time-decayed learning rate.
///
/// The optimizer doesn't own the layers it updates; it borrows them per call
/// and drives each one through the [Optimizable](crate::layers::Optimizable)
/// capability. The expected rhythm per minibatch is one `zero_grad`, any
/// number of backward passes and then exactly one `step`.
#[derive(Clone, Debug)]
pub struct Sgd {
    /// The current step size. Public so a training loop can retune it live;
    /// overwritten on every step when decay is configured.
    pub learning_rate: f32,
    initial_learning_rate: f32,
    decay_speed: f32,
    step_count: u32,
}

impl Sgd {
    /// Constructs a new instance. A `decay_speed` of zero leaves the
    /// learning rate alone.
    pub fn new(learning_rate: f32, decay_speed: f32) -> Self {
        Self {
            learning_rate,
            initial_learning_rate: learning_rate,
            decay_speed,
            step_count: 0,
        }
    }

    /// Resets the gradient accumulators of every layer. Must run once per
    /// minibatch before any backward pass of that minibatch.
    pub fn zero_grad<O: Optimizable>(&self, layers: &mut [O]) {
        for layer in layers.iter_mut() {
            layer.zero_grad();
        }
    }

    /// Applies the accumulated gradients to every layer. This is the only
    /// place parameters change. With decay configured, the rate after t
    /// steps is `initial / (1 + sqrt(t * decay_speed))`.
    pub fn step<O: Optimizable>(&mut self, layers: &mut [O]) -> Result<()> {
        if self.decay_speed != 0. {
            self.step_count += 1;
            self.learning_rate = self.initial_learning_rate
                / (1. + (self.step_count as f32 * self.decay_speed).sqrt());
        }
        for layer in layers.iter_mut() {
            layer.update(self.learning_rate)?;
        }
        Ok(())
    }

    pub fn initial_learning_rate(&self) -> f32 {
        self.initial_learning_rate
    }

    pub fn decay_speed(&self) -> f32 {
        self.decay_speed
    }

    /// How many steps have been taken since construction.
    pub fn step_count(&self) -> u32 {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a_funcs::Identity;
    use crate::initializer::WeightInit;
    use crate::layers::tests::check;
    use crate::layers::Linear;
    use crate::num::Vector;

    const TOLERANCE: f32 = 0.0001;

    fn accumulated_layer() -> Linear {
        let mut layer = Linear::new(2, 1, Identity, false);
        layer.init_weights(WeightInit::new(vec![1., 2.]));
        let input = Vector::new(vec![3., 4.]);
        let (sums, _) = layer.forward(&input).unwrap();
        layer
            .backward(&sums, &input, &Vector::new(vec![1.]))
            .unwrap();
        layer
    }

    #[test]
    fn step_updates_every_layer() {
        let mut layers = vec![accumulated_layer()];
        let mut sgd = Sgd::new(0.1, 0.);

        sgd.step(&mut layers).unwrap();
        check(
            &[0.7, 1.6],
            layers[0].weights().as_slice(),
            TOLERANCE,
            "weights",
        );
        // no decay configured, the rate stays put
        assert_eq!(sgd.learning_rate, 0.1);
    }

    #[test]
    fn zero_grad_resets_every_layer() {
        let mut layers = vec![accumulated_layer(), accumulated_layer()];
        let sgd = Sgd::new(0.1, 0.);

        sgd.zero_grad(&mut layers);
        for layer in &layers {
            assert_eq!(layer.batch_size(), 0);
            assert_eq!(layer.weights_grad_sum().sum(), 0.);
        }
    }

    #[test]
    fn learning_rate_decays_with_the_step_count() {
        let lr0 = 0.5;
        let decay = 0.04;
        let mut sgd = Sgd::new(lr0, decay);

        let mut layers: Vec<Linear> = Vec::new();
        for t in 1..=20u32 {
            sgd.step(&mut layers).unwrap();
            let expected = lr0 / (1. + (t as f32 * decay).sqrt());
            assert!(
                (sgd.learning_rate - expected).abs() < TOLERANCE,
                "after {} steps expected {} but the rate was {}",
                t,
                expected,
                sgd.learning_rate
            );
        }
        assert_eq!(sgd.step_count(), 20);
    }

    #[test]
    fn step_fails_on_an_empty_batch() {
        let mut layer = Linear::new(2, 1, Identity, false);
        layer.init_weights(WeightInit::new(vec![1., 2.]));
        let mut layers = vec![layer];

        let mut sgd = Sgd::new(0.1, 0.);
        assert!(sgd.step(&mut layers).is_err());
    }
}
