use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use std::ops::{Index, IndexMut};

use super::rng;
use super::Vector;
use crate::error::{Error, Result};

/// A dense two dimensional array of floats in row-major order.
/// Weight matrices are stored as `out_size x in_size`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Constructs a matrix from a flat row-major buffer.
    /// Panics if the buffer length doesn't equal `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "A {}x{} matrix needs {} elements but {} were provided.",
            rows,
            cols,
            rows * cols,
            data.len()
        );
        Self { rows, cols, data }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.; rows * cols],
        }
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![1.; rows * cols],
        }
    }

    pub fn constant(rows: usize, cols: usize, val: f32) -> Self {
        Self {
            rows,
            cols,
            data: vec![val; rows * cols],
        }
    }

    /// The n x n matrix with ones on the main diagonal and zeros elsewhere.
    pub fn identity(n: usize) -> Self {
        let mut mat = Self::zeros(n, n);
        for i in (0..n * n).step_by(n + 1) {
            mat.data[i] = 1.;
        }
        mat
    }

    /// Every element drawn from a uniform distribution between `min` and `max`.
    pub fn uniform(rows: usize, cols: usize, min: f32, max: f32) -> Self {
        let data = rng::with_rng(|rng| {
            (0..rows * cols).map(|_| rng.gen_range(min..max)).collect()
        });
        Self { rows, cols, data }
    }

    /// Every element drawn from a normal distribution with the given mean
    /// and standard deviation.
    pub fn normal(rows: usize, cols: usize, mean: f32, stddev: f32) -> Self {
        let data = rng::with_rng(|rng| {
            (0..rows * cols)
                .map(|_| mean + stddev * rng.sample::<f32, _>(StandardNormal))
                .collect()
        });
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// A single row as a slice.
    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Overwrites every element with `val`.
    pub fn fill(&mut self, val: f32) {
        self.data.iter_mut().for_each(|x| *x = val);
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();
        Ok(Self::from_vec(self.rows, self.cols, data))
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Ok(Self::from_vec(self.rows, self.cols, data))
    }

    pub fn add_in_place(&mut self, other: &Self) -> Result<()> {
        self.check_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(())
    }

    pub fn sub_in_place(&mut self, other: &Self) -> Result<()> {
        self.check_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a -= b;
        }
        Ok(())
    }

    pub fn add_scalar(&self, val: f32) -> Self {
        let data = self.data.iter().map(|a| a + val).collect();
        Self::from_vec(self.rows, self.cols, data)
    }

    pub fn scale(&self, val: f32) -> Self {
        let data = self.data.iter().map(|a| a * val).collect();
        Self::from_vec(self.rows, self.cols, data)
    }

    pub fn scale_in_place(&mut self, val: f32) {
        self.data.iter_mut().for_each(|a| *a *= val);
    }

    /// Returns the transpose. A single row or column transposes without
    /// touching the element order, the general case swaps indices.
    pub fn transposed(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        if self.rows == 1 || self.cols == 1 {
            out.data.copy_from_slice(&self.data);
        } else {
            for r in 0..self.rows {
                for c in 0..self.cols {
                    out.data[c * self.rows + r] = self.data[r * self.cols + c];
                }
            }
        }
        out
    }

    /// Standard matrix multiplication. The loop bodies are plain scalar
    /// arithmetic so a vectorized backend can replace them without touching
    /// the interface.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(Error::DimensionMismatch {
                expected: (self.cols, other.cols),
                received: (other.rows, other.cols),
            });
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for j in 0..other.cols {
                    out.data[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }
        Ok(out)
    }

    /// Matrix times column vector.
    pub fn mul_vec(&self, vec: &Vector) -> Result<Vector> {
        if self.cols != vec.len() {
            return Err(Error::DimensionMismatch {
                expected: (self.cols, 1),
                received: (vec.len(), 1),
            });
        }
        let mut out = Vector::zeros(self.rows);
        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            out[i] = row.iter().zip(vec.iter()).map(|(w, x)| w * x).sum();
        }
        Ok(out)
    }

    /// The elements flattened into a vector in row-major order.
    pub fn into_vector(self) -> Vector {
        Vector::from(self.data)
    }

    fn check_shape(&self, other: &Self) -> Result<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.shape(),
                received: other.shape(),
            })
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    fn index(&self, (r, c): (usize, usize)) -> &f32 {
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f32 {
        &mut self.data[r * self.cols + c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::tests::check;

    #[test]
    fn transpose_round_trip() {
        let m = Matrix::uniform(4, 7, -1., 1.);
        assert_eq!(m.transposed().transposed(), m);
    }

    #[test]
    fn transpose_swaps_indices() {
        let m = Matrix::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]);
        let t = m.transposed();
        assert_eq!(t.shape(), (3, 2));
        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(m[(r, c)], t[(c, r)]);
            }
        }
    }

    #[test]
    fn matmul() {
        let a = Matrix::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]);
        let b = Matrix::from_vec(3, 2, vec![7., 8., 9., 10., 11., 12.]);
        let c = a.mul(&b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.as_slice(), &[58., 64., 139., 154.]);
    }

    #[test]
    fn matmul_associativity() {
        let a = Matrix::uniform(3, 4, -1., 1.);
        let b = Matrix::uniform(4, 5, -1., 1.);
        let c = Matrix::uniform(5, 2, -1., 1.);

        let left = a.mul(&b).unwrap().mul(&c).unwrap();
        let right = a.mul(&b.mul(&c).unwrap()).unwrap();
        check(left.as_slice(), right.as_slice(), 1e-4, "product");
    }

    #[test]
    fn matmul_incompatible_shapes_fail() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(4, 5);
        assert_eq!(
            a.mul(&b),
            Err(Error::DimensionMismatch {
                expected: (3, 5),
                received: (4, 5),
            })
        );
    }

    #[test]
    fn matvec() {
        let m = Matrix::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]);
        let v = Vector::new(vec![7., 8., 9.]);
        assert_eq!(m.mul_vec(&v).unwrap().as_slice(), &[50., 122.]);
        assert!(m.mul_vec(&Vector::zeros(4)).is_err());
    }

    #[test]
    fn identity_is_multiplicative_unit() {
        let m = Matrix::uniform(3, 3, -1., 1.);
        let id = Matrix::identity(3);
        assert_eq!(m.mul(&id).unwrap(), m);
        assert_eq!(id.mul(&m).unwrap(), m);
        assert_eq!(id[(0, 0)], 1.);
        assert_eq!(id[(0, 1)], 0.);
    }

    #[test]
    fn elementwise_shape_check() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(3, 2);
        assert!(a.add(&b).is_err());
        assert!(a.clone().add_in_place(&b).is_err());
        assert!(a.sub(&b).is_err());
    }
}
