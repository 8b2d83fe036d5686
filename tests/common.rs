use rusty_ann::a_funcs::{ActivFunc, Sigmoid};
use rusty_ann::data::InMemoryDataset;

/// Samples of the unsqueezed logistic curve over -5 to 5.
pub fn sigmoid_fit_data() -> InMemoryDataset {
    let sigmoid = Sigmoid::new(1.);
    InMemoryDataset::from_pairs((0..100).map(|i| {
        let x = i as f32 / 10. - 5.;
        (vec![x], vec![sigmoid.forward(x).unwrap()])
    }))
}

/// Samples of the line y = 3x over the unit interval.
pub fn linear_fit_data() -> InMemoryDataset {
    InMemoryDataset::from_pairs((0..100).map(|i| {
        let x = i as f32 / 100.;
        (vec![x], vec![3. * x])
    }))
}
