use anyhow::{bail, ensure};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use std::fs;
use std::path::Path;

use super::{Dataset, Sample};
use crate::num::Vector;

const IMAGE_MAGIC: u32 = 0x0000_0803;
const LABEL_MAGIC: u32 = 0x0000_0801;
const CLASSES: usize = 10;

/// A labeled digit dataset read from a pair of idx-ubyte files.
///
/// Pixels are kept as their raw 0 to 255 values and labels become one-hot
/// vectors over the ten digit classes.
pub struct Mnist {
    samples: Vec<Sample>,
    input_size: usize,
    rng: Pcg64Mcg,
}

impl Mnist {
    /// Reads an image file and its matching label file.
    pub fn load<P: AsRef<Path>>(images: P, labels: P) -> anyhow::Result<Self> {
        let images = fs::read(&images)?;
        let labels = fs::read(&labels)?;
        Self::from_bytes(&images, &labels)
    }

    /// Parses the idx-ubyte pair from memory.
    ///
    /// The image file starts with four big-endian words: the magic number
    /// 0x803, the item count, the row count and the column count, followed
    /// by one byte per pixel. The label file starts with the magic number
    /// 0x801 and the item count, followed by one byte per label.
    pub fn from_bytes(images: &[u8], labels: &[u8]) -> anyhow::Result<Self> {
        ensure!(images.len() >= 16, "The image file is too short for a header.");
        ensure!(labels.len() >= 8, "The label file is too short for a header.");

        let magic = read_be(images, 0);
        if magic != IMAGE_MAGIC {
            bail!("Bad magic number in the image file: {:#x}.", magic);
        }
        let count = read_be(images, 4) as usize;
        let rows = read_be(images, 8) as usize;
        let cols = read_be(images, 12) as usize;
        let input_size = rows * cols;

        let magic = read_be(labels, 0);
        if magic != LABEL_MAGIC {
            bail!("Bad magic number in the label file: {:#x}.", magic);
        }
        let label_count = read_be(labels, 4) as usize;
        ensure!(
            label_count == count,
            "The image file holds {} items but the label file holds {}.",
            count,
            label_count
        );
        ensure!(
            images.len() - 16 >= count * input_size,
            "The image file ends before item {}.",
            count
        );
        ensure!(
            labels.len() - 8 >= count,
            "The label file ends before item {}.",
            count
        );

        let mut samples = Vec::with_capacity(count);
        for i in 0..count {
            let pixels = &images[16 + i * input_size..16 + (i + 1) * input_size];
            let input: Vector = pixels.iter().map(|&p| p as f32).collect();

            let digit = labels[8 + i] as usize;
            ensure!(digit < CLASSES, "Label {} is not a digit.", digit);
            let mut label = Vector::zeros(CLASSES);
            label[digit] = 1.;

            samples.push(Sample::new(input, label));
        }

        Ok(Self {
            samples,
            input_size,
            rng: Pcg64Mcg::from_entropy(),
        })
    }
}

fn read_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

impl Dataset for Mnist {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn label_size(&self) -> usize {
        CLASSES
    }

    fn item(&self, idx: usize) -> &Sample {
        &self.samples[idx]
    }

    fn shuffle(&mut self) {
        self.samples.shuffle(&mut self.rng);
    }
}
