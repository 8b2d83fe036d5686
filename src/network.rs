use std::convert::TryFrom;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::initializer::Initializer;
use crate::layers::Linear;
use crate::loss_funcs::{Loss, LossFunc};
use crate::num::Vector;

/// An ordered stack of fully connected layers together with a loss function.
///
/// The network owns the per-pass caches: each layer's pre-activation sums
/// and outputs are stored at the layer's index, and `backward` looks a
/// predecessor's outputs up by index instead of the layers holding standing
/// references to each other. It can be both saved to and loaded from a file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "NetworkUnvalidated", try_from = "NetworkUnvalidated")]
pub struct Network {
    layers: Vec<Linear>,
    loss: Loss,
    cache: PassCache,
}

/// The caches of a single forward pass, addressed by layer index.
#[derive(Clone, Debug, Default)]
struct PassCache {
    input: Vector,
    sums: Vec<Vector>,
    outs: Vec<Vector>,
}

impl PassCache {
    fn new(layer_count: usize) -> Self {
        Self {
            input: Vector::default(),
            sums: vec![Vector::default(); layer_count],
            outs: vec![Vector::default(); layer_count],
        }
    }
}

impl Network {
    /// Wires the layers together, checks that each layer accepts its
    /// predecessor's output and initializes every weight matrix with the
    /// given strategy.
    pub fn new<I: Initializer>(mut layers: Vec<Linear>, loss: Loss, mut init: I) -> Result<Self> {
        validate(&layers)?;
        for layer in &mut layers {
            layer.init_weights(&mut init);
        }
        let cache = PassCache::new(layers.len());
        Ok(Self {
            layers,
            loss,
            cache,
        })
    }

    /// Threads `input` through every layer in index order, caching each
    /// layer's sums and outputs along the way.
    pub fn forward(&mut self, input: &Vector) -> Result<&Vector> {
        self.cache.input = input.clone();
        for i in 0..self.layers.len() {
            let prev = if i == 0 {
                &self.cache.input
            } else {
                &self.cache.outs[i - 1]
            };
            let (sums, outs) = self.layers[i].forward(prev)?;
            self.cache.sums[i] = sums;
            self.cache.outs[i] = outs;
        }
        Ok(self.output())
    }

    /// Computes the loss gradient against `label` and threads it through
    /// every layer in reverse index order. Each layer accumulates its own
    /// parameter gradient as a side effect; the order is mandatory since a
    /// layer's propagated gradient is the next earlier layer's input.
    pub fn backward(&mut self, label: &Vector) -> Result<()> {
        let mut out_grad = self.loss.backward(self.output(), label)?;
        for i in (0..self.layers.len()).rev() {
            let prev = if i == 0 {
                &self.cache.input
            } else {
                &self.cache.outs[i - 1]
            };
            out_grad = self.layers[i].backward(&self.cache.sums[i], prev, &out_grad)?;
        }
        Ok(())
    }

    /// The output of the last layer. Empty until the first forward pass.
    pub fn output(&self) -> &Vector {
        self.cache.outs.last().unwrap()
    }

    /// The total loss of the current output against `label`.
    pub fn numeric_loss(&self, label: &Vector) -> Result<f32> {
        self.loss.numeric_loss(self.output(), label)
    }

    pub fn in_size(&self) -> usize {
        self.layers.first().unwrap().in_size()
    }

    pub fn out_size(&self) -> usize {
        self.layers.last().unwrap().out_size()
    }

    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Linear] {
        &mut self.layers
    }

    pub fn loss(&self) -> &Loss {
        &self.loss
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)?;
        let network: Self = serde_json::from_str(&s)?;
        Ok(network)
    }
}

fn validate(layers: &[Linear]) -> Result<()> {
    if layers.is_empty() {
        return Err(Error::EmptyNetwork);
    }
    for i in 1..layers.len() {
        if layers[i].in_size() != layers[i - 1].out_size() {
            return Err(Error::IncompatibleLayers {
                index: i,
                expected_input: layers[i].in_size(),
                received_input: layers[i - 1].out_size(),
            });
        }
    }
    Ok(())
}

/// When deserializing, we first construct this object, validate that its
/// structure is correct and convert to Network.
#[derive(Serialize, Deserialize)]
struct NetworkUnvalidated {
    layers: Vec<Linear>,
    loss: Loss,
}

impl From<Network> for NetworkUnvalidated {
    fn from(net: Network) -> Self {
        Self {
            layers: net.layers,
            loss: net.loss,
        }
    }
}

impl TryFrom<NetworkUnvalidated> for Network {
    type Error = Error;

    fn try_from(mut value: NetworkUnvalidated) -> Result<Self> {
        validate(&value.layers)?;
        for layer in &mut value.layers {
            layer.rebuild();
        }
        let cache = PassCache::new(value.layers.len());
        Ok(Network {
            layers: value.layers,
            loss: value.loss,
            cache,
        })
    }
}
