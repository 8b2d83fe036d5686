pub mod linear;

pub use linear::Linear;

use crate::error::Result;

/// The capability the optimizer drives every layer through: apply the
/// accumulated gradients and reset the accumulators.
pub trait Optimizable {
    /// Steps the parameters against the accumulated gradients, scaled by the
    /// learning rate and averaged over the batch. Must not be called again
    /// before a `zero_grad`.
    fn update(&mut self, lr: f32) -> Result<()>;

    /// Resets the gradient accumulators and the batch counter to zero.
    fn zero_grad(&mut self);
}
