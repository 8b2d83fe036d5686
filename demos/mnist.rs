//! Interactive digit classifier training. Feed it a directory holding the
//! four idx-ubyte files; between epochs it takes commands to evaluate the
//! test set, inspect single images or retune the learning rate.

use std::io;
use std::path::PathBuf;

use rusty_ann::a_funcs::{ReLU, SigmoidClamped};
use rusty_ann::data::{DataLoader, Dataset, Mnist};
use rusty_ann::helpers::{argmax, render_digit, Timer};
use rusty_ann::initializer::HeHalfInit;
use rusty_ann::layers::Linear;
use rusty_ann::loss_funcs::MeanSquared;
use rusty_ann::network::Network;
use rusty_ann::optimizer::Sgd;
use rusty_ann::trainer::{test, Config, ConsoleLogger, Trainer};

fn main() -> anyhow::Result<()> {
    let data_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "data_mnist".into()),
    );

    let train_set = Mnist::load(
        data_dir.join("train-images.idx3-ubyte"),
        data_dir.join("train-labels.idx1-ubyte"),
    )?;
    let test_set = Mnist::load(
        data_dir.join("t10k-images.idx3-ubyte"),
        data_dir.join("t10k-labels.idx1-ubyte"),
    )?;
    println!(
        "{} training and {} test items loaded from '{}'.",
        train_set.len(),
        test_set.len(),
        data_dir.display()
    );

    let mut net = Network::new(
        vec![
            Linear::new(784, 16, ReLU, false),
            Linear::new(16, 16, ReLU, false),
            Linear::new(16, 16, ReLU, false),
            Linear::new(16, 16, ReLU, false),
            Linear::new(16, 10, SigmoidClamped::default(), false),
        ],
        MeanSquared.into(),
        HeHalfInit,
    )?;
    let mut sgd = Sgd::new(0.1, 0.001);
    let mut trainer = Trainer::new(Config::new(64, 1), train_set, ConsoleLogger::new(50));
    let mut test_loader = DataLoader::new(test_set, 1, true, true);

    println!("Start train");
    let mut epoch = 0;
    loop {
        epoch += 1;
        let timer = Timer::new();
        trainer.do_epoch(&mut net, &mut sgd)?;
        println!("Epoch {} complete in {:.2} seconds.", epoch, timer.seconds());

        loop {
            println!();
            println!("Enter: train again");
            println!("0:     test the model on the test set");
            println!("000:   inspect single images");
            println!(
                "Current learning rate: {}, enter a number to change it.",
                sgd.learning_rate
            );

            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            let line = line.trim();

            if line == "0" {
                let report = test(&mut net, test_loader.dataset())?;
                println!(
                    "Average loss over {} items: {:.5}",
                    test_loader.dataset().len(),
                    report.avg_loss
                );
                println!("Correctly predicted {:.2}%", report.accuracy * 100.);
            } else if line == "000" {
                inspect_images(&mut net, &mut test_loader)?;
            } else if line.is_empty() {
                break;
            } else if let Ok(rate) = line.parse::<f32>() {
                sgd.learning_rate = rate;
                break;
            }
        }
    }
}

fn inspect_images(net: &mut Network, loader: &mut DataLoader<Mnist>) -> anyhow::Result<()> {
    loop {
        let guess = {
            let batch = loader.next_batch();
            let sample = batch[0];
            let output = net.forward(&sample.input)?;
            println!("{:.3?}", output.as_slice());
            print!("{}", render_digit(&sample.input));
            argmax(output)
        };
        println!("Looks like a {}", guess);
        println!("Enter for the next image, q to go back.");

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        if line.trim() == "q" {
            return Ok(());
        }
    }
}
