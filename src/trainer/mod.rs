pub mod logger;

pub use logger::{ConsoleLogger, LogFile, Logger, MockLogger};

use crate::data::{DataLoader, Dataset};
use crate::error::Result;
use crate::helpers::argmax;
use crate::network::Network;
use crate::optimizer::Sgd;

/// This struct contains the configuration information for stochastic
/// training.
#[derive(Clone, Debug)]
pub struct Config {
    pub batch_size: usize,
    pub epochs: usize,
}

impl Config {
    /// Constructs a new instance
    pub fn new(batch_size: usize, epochs: usize) -> Self {
        Self { batch_size, epochs }
    }
}

/// Average loss and argmax accuracy over a stretch of samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct Report {
    pub avg_loss: f32,
    pub accuracy: f32,
}

/// Drives a network and optimizer over a dataset in shuffled minibatches.
///
/// Per batch the trainer resets the gradient accumulators, runs every
/// sample forward and backward, and takes exactly one optimizer step, so
/// the accumulate and apply phases never interleave.
pub struct Trainer<D: Dataset, L: Logger> {
    loader: DataLoader<D>,
    logger: L,
    epochs: usize,
    epoch: u32,
}

impl<D: Dataset, L: Logger> Trainer<D, L> {
    pub fn new(config: Config, dataset: D, logger: L) -> Self {
        Self {
            loader: DataLoader::new(dataset, config.batch_size, true, true),
            logger,
            epochs: config.epochs,
            epoch: 0,
        }
    }

    /// Processes the whole dataset once and reports the average loss and
    /// accuracy over it.
    pub fn do_epoch(&mut self, net: &mut Network, sgd: &mut Sgd) -> Result<Report> {
        self.loader.reset();
        let mut total_loss = 0.;
        let mut total_right = 0;
        let mut count = 0;
        let mut batch = 0u32;

        loop {
            sgd.zero_grad(net.layers_mut());

            let (size, batch_loss, batch_right) = {
                let samples = self.loader.next_batch();
                let mut loss = 0.;
                let mut right = 0;
                for sample in &samples {
                    net.forward(&sample.input)?;
                    loss += net.numeric_loss(&sample.label)?;
                    if argmax(net.output()) == argmax(&sample.label) {
                        right += 1;
                    }
                    net.backward(&sample.label)?;
                }
                (samples.len(), loss, right)
            };

            sgd.step(net.layers_mut())?;

            total_loss += batch_loss;
            total_right += batch_right;
            count += size;
            self.logger.batch_loss(
                self.epoch,
                batch,
                batch_loss / size as f32,
                batch_right as f32 / size as f32,
            );
            batch += 1;

            if self.loader.end_reached() {
                break;
            }
        }

        let report = Report {
            avg_loss: total_loss / count as f32,
            accuracy: total_right as f32 / count as f32,
        };
        self.logger.epoch_loss(self.epoch, report.avg_loss, report.accuracy);
        self.epoch += 1;
        Ok(report)
    }

    /// Runs the configured number of epochs and returns the last report.
    pub fn train(&mut self, net: &mut Network, sgd: &mut Sgd) -> Result<Report> {
        let mut report = Report::default();
        for _ in 0..self.epochs {
            report = self.do_epoch(net, sgd)?;
        }
        Ok(report)
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }
}

/// A forward-only pass over a dataset; no gradients are touched.
pub fn test<D: Dataset>(net: &mut Network, dataset: &D) -> Result<Report> {
    let mut loss = 0.;
    let mut right = 0;
    for i in 0..dataset.len() {
        let sample = dataset.item(i);
        net.forward(&sample.input)?;
        loss += net.numeric_loss(&sample.label)?;
        if argmax(net.output()) == argmax(&sample.label) {
            right += 1;
        }
    }
    Ok(Report {
        avg_loss: loss / dataset.len() as f32,
        accuracy: right as f32 / dataset.len() as f32,
    })
}
