use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use std::iter::FromIterator;
use std::ops::{Index, IndexMut};

use super::rng;
use super::Matrix;
use crate::error::{Error, Result};

/// A dense one dimensional array of floats. Used for layer inputs and
/// outputs, gradients, biases and one-hot labels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self { data: vec![0.; len] }
    }

    pub fn ones(len: usize) -> Self {
        Self { data: vec![1.; len] }
    }

    pub fn constant(len: usize, val: f32) -> Self {
        Self {
            data: vec![val; len],
        }
    }

    /// Every element drawn from a uniform distribution between `min` and `max`.
    pub fn uniform(len: usize, min: f32, max: f32) -> Self {
        rng::with_rng(|rng| (0..len).map(|_| rng.gen_range(min..max)).collect())
    }

    /// Every element drawn from a normal distribution with the given mean
    /// and standard deviation.
    pub fn normal(len: usize, mean: f32, stddev: f32) -> Self {
        rng::with_rng(|rng| {
            (0..len)
                .map(|_| mean + stddev * rng.sample::<f32, _>(StandardNormal))
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, f32> {
        self.data.iter_mut()
    }

    /// Overwrites every element with `val`.
    pub fn fill(&mut self, val: f32) {
        self.data.iter_mut().for_each(|x| *x = val);
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn dot(&self, other: &Self) -> Result<f32> {
        self.check_len(other)?;
        Ok(self.iter().zip(other.iter()).map(|(a, b)| a * b).sum())
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_len(other)?;
        Ok(self
            .iter()
            .zip(other.iter())
            .map(|(a, b)| a + b)
            .collect())
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_len(other)?;
        Ok(self
            .iter()
            .zip(other.iter())
            .map(|(a, b)| a - b)
            .collect())
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.check_len(other)?;
        Ok(self
            .iter()
            .zip(other.iter())
            .map(|(a, b)| a * b)
            .collect())
    }

    pub fn add_in_place(&mut self, other: &Self) -> Result<()> {
        self.check_len(other)?;
        for (a, b) in self.data.iter_mut().zip(other.iter()) {
            *a += b;
        }
        Ok(())
    }

    pub fn sub_in_place(&mut self, other: &Self) -> Result<()> {
        self.check_len(other)?;
        for (a, b) in self.data.iter_mut().zip(other.iter()) {
            *a -= b;
        }
        Ok(())
    }

    pub fn add_scalar(&self, val: f32) -> Self {
        self.iter().map(|a| a + val).collect()
    }

    pub fn scale(&self, val: f32) -> Self {
        self.iter().map(|a| a * val).collect()
    }

    pub fn scale_in_place(&mut self, val: f32) {
        self.data.iter_mut().for_each(|a| *a *= val);
    }

    /// The outer product of two vectors, `out[i][j] = self[i] * other[j]`.
    pub fn outer(&self, other: &Self) -> Matrix {
        let mut data = Vec::with_capacity(self.len() * other.len());
        for &a in self.iter() {
            for &b in other.iter() {
                data.push(a * b);
            }
        }
        Matrix::from_vec(self.len(), other.len(), data)
    }

    /// Reshape into a 1 x n matrix. The elements are copied.
    pub fn as_row(&self) -> Matrix {
        Matrix::from_vec(1, self.len(), self.data.clone())
    }

    /// Reshape into an n x 1 matrix. The elements are copied.
    pub fn as_col(&self) -> Matrix {
        Matrix::from_vec(self.len(), 1, self.data.clone())
    }

    fn check_len(&self, other: &Self) -> Result<()> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: (self.len(), 1),
                received: (other.len(), 1),
            })
        }
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self { data }
    }
}

impl FromIterator<f32> for Vector {
    fn from_iter<T: IntoIterator<Item = f32>>(iter: T) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl Index<usize> for Vector {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.data[i]
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}
