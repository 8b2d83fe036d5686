//! Fits a small network to a one dimensional curve from an in-memory
//! dataset and prints the loss as it converges.

use rusty_ann::a_funcs::{ActivFunc, Identity, Sigmoid};
use rusty_ann::data::InMemoryDataset;
use rusty_ann::initializer::XavierInit;
use rusty_ann::layers::Linear;
use rusty_ann::loss_funcs::MeanSquared;
use rusty_ann::network::Network;
use rusty_ann::optimizer::Sgd;
use rusty_ann::trainer::{test, Config, MockLogger, Trainer};

fn data() -> InMemoryDataset {
    let curve = Sigmoid::new(1.);
    InMemoryDataset::from_pairs((0..200).map(|i| {
        let x = i as f32 / 20. - 5.;
        (vec![x], vec![curve.forward(x).unwrap()])
    }))
}

fn main() -> anyhow::Result<()> {
    let epochs = 500;

    let mut net = Network::new(
        vec![
            Linear::new(1, 8, Sigmoid::new(1.), true),
            Linear::new(8, 1, Identity, true),
        ],
        MeanSquared.into(),
        XavierInit,
    )?;
    let mut sgd = Sgd::new(0.1, 0.);
    let mut trainer = Trainer::new(Config::new(10, epochs), data(), MockLogger);

    println!("Beginning fitting");
    for epoch in 0..epochs {
        let report = trainer.do_epoch(&mut net, &mut sgd)?;
        if (epoch + 1) % 50 == 0 {
            println!("Epoch {}: loss {:.6}", epoch + 1, report.avg_loss);
        }
    }

    let report = test(&mut net, &data())?;
    println!("Finished fitting with loss {:.6}", report.avg_loss);
    Ok(())
}
