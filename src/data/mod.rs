pub mod mnist;

pub use mnist::Mnist;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::num::Vector;

/// One training example: an input vector and its one-hot label.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub input: Vector,
    pub label: Vector,
}

impl Sample {
    pub fn new(input: Vector, label: Vector) -> Self {
        Self { input, label }
    }
}

/// A source of labeled samples. The network itself never touches this; the
/// training loop pulls samples out and feeds them through.
pub trait Dataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn input_size(&self) -> usize;

    fn label_size(&self) -> usize;

    fn item(&self, idx: usize) -> &Sample;

    /// Reorders the samples randomly.
    fn shuffle(&mut self);
}

/// A dataset built from samples already in memory.
pub struct InMemoryDataset {
    samples: Vec<Sample>,
    input_size: usize,
    label_size: usize,
    rng: Pcg64Mcg,
}

impl InMemoryDataset {
    /// Panics if the samples are empty or disagree on their sizes.
    pub fn new(samples: Vec<Sample>) -> Self {
        assert!(!samples.is_empty(), "A dataset cannot be empty.");
        let input_size = samples[0].input.len();
        let label_size = samples[0].label.len();
        for sample in &samples {
            assert_eq!(sample.input.len(), input_size);
            assert_eq!(sample.label.len(), label_size);
        }
        Self {
            samples,
            input_size,
            label_size,
            rng: Pcg64Mcg::from_entropy(),
        }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Vec<f32>, Vec<f32>)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(input, label)| Sample::new(input.into(), label.into()))
                .collect(),
        )
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn label_size(&self) -> usize {
        self.label_size
    }

    fn item(&self, idx: usize) -> &Sample {
        &self.samples[idx]
    }

    fn shuffle(&mut self) {
        self.samples.shuffle(&mut self.rng);
    }
}

/// Pulls fixed-size batches out of a dataset in order.
///
/// The last batch of an epoch may be short; it flips `end_reached` so the
/// caller can spot the epoch boundary. With `wrap` the loader then starts
/// over from the beginning, reshuffling first when `shuffle` was requested.
pub struct DataLoader<D: Dataset> {
    dataset: D,
    batch_size: usize,
    pos: usize,
    end_reached: bool,
    reshuffle: bool,
    pending_shuffle: bool,
    wrap: bool,
}

impl<D: Dataset> DataLoader<D> {
    pub fn new(mut dataset: D, batch_size: usize, shuffle: bool, wrap: bool) -> Self {
        assert!(batch_size > 0, "The batch size must be at least one.");
        if shuffle {
            dataset.shuffle();
        }
        Self {
            dataset,
            batch_size,
            pos: 0,
            end_reached: false,
            reshuffle: shuffle,
            pending_shuffle: false,
            wrap,
        }
    }

    /// The next batch of samples. Clears a previous `end_reached` signal,
    /// so calling past the epoch boundary keeps producing batches as long
    /// as the loader wraps.
    pub fn next_batch(&mut self) -> Vec<&Sample> {
        if self.pending_shuffle {
            self.dataset.shuffle();
            self.pending_shuffle = false;
        }

        self.end_reached = false;
        let mut size = self.batch_size;
        if self.pos + size >= self.dataset.len() {
            size = self.dataset.len() - self.pos;
            self.end_reached = true;
        }

        let start = self.pos;
        self.pos += size;
        if self.end_reached && self.wrap {
            self.pos = 0;
            self.pending_shuffle = self.reshuffle;
        }

        let mut batch = Vec::with_capacity(size);
        for i in start..start + size {
            batch.push(self.dataset.item(i));
        }
        batch
    }

    /// True right after the batch that finished the epoch.
    pub fn end_reached(&self) -> bool {
        self.end_reached
    }

    /// Rewinds to the start of the data.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.end_reached = false;
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut D {
        &mut self.dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_dataset(len: usize) -> InMemoryDataset {
        InMemoryDataset::from_pairs((0..len).map(|i| (vec![i as f32], vec![1.])))
    }

    #[test]
    fn batches_cover_an_epoch() {
        let mut loader = DataLoader::new(numbered_dataset(5), 2, false, false);

        assert_eq!(loader.next_batch().len(), 2);
        assert!(!loader.end_reached());
        assert_eq!(loader.next_batch().len(), 2);
        assert!(!loader.end_reached());
        // the final batch is short and signals the epoch boundary
        let last = loader.next_batch();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].input[0], 4.);
        assert!(loader.end_reached());
    }

    #[test]
    fn exact_fit_still_signals_the_boundary() {
        let mut loader = DataLoader::new(numbered_dataset(4), 2, false, false);
        assert_eq!(loader.next_batch().len(), 2);
        assert!(!loader.end_reached());
        assert_eq!(loader.next_batch().len(), 2);
        assert!(loader.end_reached());
    }

    #[test]
    fn wrapping_restarts_from_the_beginning() {
        let mut loader = DataLoader::new(numbered_dataset(3), 2, false, true);

        loader.next_batch();
        loader.next_batch();
        assert!(loader.end_reached());

        let batch = loader.next_batch();
        assert!(!loader.end_reached());
        assert_eq!(batch[0].input[0], 0.);
    }

    #[test]
    fn shuffle_preserves_the_samples() {
        let mut dataset = numbered_dataset(20);
        dataset.shuffle();
        let mut seen: Vec<f32> = (0..20).map(|i| dataset.item(i).input[0]).collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f32> = (0..20).map(|i| i as f32).collect();
        assert_eq!(seen, expected);
    }
}
