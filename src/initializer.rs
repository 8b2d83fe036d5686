use crate::num::Matrix;

//I used this blog post as reference to the initialization methods ->
//https://towardsdatascience.com/weight-initialization-in-neural-networks-a-journey-from-the-basics-to-kaiming-954fb9b47c79

/// A strategy for filling a freshly constructed weight matrix.
/// Weight matrices are `rows x cols` where `cols` is the layer input size.
pub trait Initializer {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix;
}

impl<T: Initializer> Initializer for &mut T {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        <T as Initializer>::init(self, rows, cols)
    }
}

/// Uniform initialization between -1 and 1.
#[derive(Clone, Debug, Default)]
pub struct UniformInit;

impl Initializer for UniformInit {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        Matrix::uniform(rows, cols, -1., 1.)
    }
}

///He initialization should be used for layers with asymetric activation
///functions such as ReLU: normal distribution with stddev = sqrt(2/cols)
#[derive(Clone, Debug, Default)]
pub struct HeInit;

impl Initializer for HeInit {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        let stddev = (2. / cols as f32).sqrt();
        Matrix::normal(rows, cols, 0., stddev)
    }
}

/// He initialization with the standard deviation halved. Smaller first
/// steps help when the inputs themselves are large.
#[derive(Clone, Debug, Default)]
pub struct HeHalfInit;

impl Initializer for HeHalfInit {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        let stddev = (2. / cols as f32).sqrt() * 0.5;
        Matrix::normal(rows, cols, 0., stddev)
    }
}

///Xavier initialization should be used for layers with symetric activation
///functions such as sigmoid: normal distribution with stddev = sqrt(2/(cols+rows))
#[derive(Clone, Debug, Default)]
pub struct XavierInit;

impl Initializer for XavierInit {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        let stddev = (2. / (cols as f32 + rows as f32)).sqrt();
        Matrix::normal(rows, cols, 0., stddev)
    }
}

/// Initializes every weight to the same constant.
#[derive(Clone, Debug)]
pub struct ConstInit(pub f32);

impl Initializer for ConstInit {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        Matrix::constant(rows, cols, self.0)
    }
}

/// Scaled-down He noise plus a unit diagonal, so the layer starts out close
/// to passing its input through.
#[derive(Clone, Debug, Default)]
pub struct IdentityInit;

impl Initializer for IdentityInit {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        let mut mat = HeInit.init(rows, cols).scale(0.01);
        for i in 0..rows.min(cols) {
            mat[(i, i)] += 1.;
        }
        mat
    }
}

#[derive(Clone, Debug, Default)]
pub struct ZeroInit;

impl Initializer for ZeroInit {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        Matrix::zeros(rows, cols)
    }
}

/// Takes weights from an iterator in row-major order.
/// Panics if a weight is requested but the iterator returns None.
pub struct WeightInit<T: Iterator<Item = f32>> {
    iter: T,
}

impl<I: Iterator<Item = f32>> WeightInit<I> {
    pub fn new<T: IntoIterator<Item = f32, IntoIter = I>>(weights: T) -> Self {
        Self {
            iter: weights.into_iter(),
        }
    }
}

impl<I: Iterator<Item = f32>> Initializer for WeightInit<I> {
    fn init(&mut self, rows: usize, cols: usize) -> Matrix {
        let data = (&mut self.iter)
            .take(rows * cols)
            .collect::<Vec<_>>();
        assert_eq!(data.len(), rows * cols, "Ran out of weights");
        Matrix::from_vec(rows, cols, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_and_values() {
        assert_eq!(ZeroInit.init(2, 3).shape(), (2, 3));
        assert_eq!(ZeroInit.init(2, 3).sum(), 0.);
        assert_eq!(ConstInit(0.5).init(2, 2).as_slice(), &[0.5; 4]);

        let mat = WeightInit::new(vec![1., 2., 3., 4., 5., 6.]).init(2, 3);
        assert_eq!(mat.as_slice(), &[1., 2., 3., 4., 5., 6.]);
    }

    #[test]
    fn identity_init_is_near_diagonal() {
        crate::num::rng::reseed(3);
        let mat = IdentityInit.init(3, 4);
        for i in 0..3 {
            assert!((mat[(i, i)] - 1.).abs() < 0.1);
            assert!(mat[(i, (i + 1) % 4)].abs() < 0.1);
        }
    }

    #[test]
    #[should_panic(expected = "Ran out of weights")]
    fn weight_init_panics_when_exhausted() {
        WeightInit::new(vec![1., 2.]).init(2, 3);
    }
}
