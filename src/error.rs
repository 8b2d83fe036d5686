use std::error;
use std::fmt;

/// The errors which can arise inside the core math and training machinery.
/// None of these are caught internally, they always propagate to whoever
/// drives the network so it can decide whether to abort or skip.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An operation was attempted on arrays of incompatible shapes.
    /// Vectors are reported as n x 1.
    DimensionMismatch {
        expected: (usize, usize),
        received: (usize, usize),
    },
    /// The requested function variant has no implementation in this form,
    /// for example the scalar contract of softmax.
    UnimplementedFunction { name: &'static str },
    /// An update was requested while the gradient accumulators were empty,
    /// which would divide by a batch size of zero.
    EmptyBatchUpdate,
    /// A forward or backward pass was attempted before the layer's weights
    /// were initialized.
    UninitializedParameter,
    /// A layer is incompatible with the previous one.
    IncompatibleLayers {
        index: usize,
        expected_input: usize,
        received_input: usize,
    },
    /// The network must have at least a single layer, but it was empty.
    EmptyNetwork,
}

pub type Result<T> = std::result::Result<T, Error>;

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DimensionMismatch { expected, received } => f.write_fmt(format_args!(
                "Dimension mismatch: expected {}x{} but received {}x{}.",
                expected.0, expected.1, received.0, received.1,
            )),
            Error::UnimplementedFunction { name } => f.write_fmt(format_args!(
                "The function '{}' is not implemented in this form.",
                name,
            )),
            Error::EmptyBatchUpdate => {
                f.write_str("Attempted an update without processing any gradients.")
            }
            Error::UninitializedParameter => {
                f.write_str("Attempted to evaluate a layer whose weights were never initialized.")
            }
            Error::IncompatibleLayers {
                index,
                expected_input,
                received_input,
            } => f.write_fmt(format_args!(
                "Layer {} is incompatible with layer {}:\n\tExpected input length of {} but received {}.",
                index,
                index - 1,
                expected_input,
                received_input,
            )),
            Error::EmptyNetwork => {
                f.write_str("The network must have at least a single layer, but it was empty.")
            }
        }
    }
}
