use std::{
    fmt::Debug,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// A sink for training progress. The trainer reports every batch and every
/// epoch; what happens with the numbers is up to the implementor.
pub trait Logger: Debug {
    fn batch_loss(&mut self, epoch: u32, batch: u32, loss: f32, accuracy: f32);

    fn epoch_loss(&mut self, epoch: u32, loss: f32, accuracy: f32);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockLogger;

impl Logger for MockLogger {
    fn batch_loss(&mut self, _epoch: u32, _batch: u32, _loss: f32, _accuracy: f32) {}

    fn epoch_loss(&mut self, _epoch: u32, _loss: f32, _accuracy: f32) {}
}

/// Prints a running average to stdout every `period` batches and a summary
/// line at the end of each epoch.
#[derive(Debug)]
pub struct ConsoleLogger {
    period: u32,
    acc_loss: f32,
    acc_accuracy: f32,
    count: u32,
}

impl ConsoleLogger {
    pub fn new(period: u32) -> Self {
        assert!(period > 0, "The reporting period must be at least one.");
        Self {
            period,
            acc_loss: 0.,
            acc_accuracy: 0.,
            count: 0,
        }
    }
}

impl Logger for ConsoleLogger {
    fn batch_loss(&mut self, _epoch: u32, _batch: u32, loss: f32, accuracy: f32) {
        self.acc_loss += loss;
        self.acc_accuracy += accuracy;
        self.count += 1;
        if self.count == self.period {
            println!(
                "Average loss over {} batches: {:.5}, correctly predicted {:.2}%",
                self.count,
                self.acc_loss / self.count as f32,
                self.acc_accuracy * 100. / self.count as f32,
            );
            self.acc_loss = 0.;
            self.acc_accuracy = 0.;
            self.count = 0;
        }
    }

    fn epoch_loss(&mut self, epoch: u32, loss: f32, accuracy: f32) {
        println!(
            "Epoch {}: average loss {:.5}, correctly predicted {:.2}%",
            epoch + 1,
            loss,
            accuracy * 100.,
        );
        self.acc_loss = 0.;
        self.acc_accuracy = 0.;
        self.count = 0;
    }
}

/// Appends the loss of every epoch to a file, one value per line.
#[derive(Debug)]
pub struct LogFile {
    file: PathBuf,
    writer: BufWriter<File>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self {
            file: path.as_ref().to_owned(),
            writer: BufWriter::new(File::create(path)?),
        })
    }
}

impl Logger for LogFile {
    fn batch_loss(&mut self, _epoch: u32, _batch: u32, _loss: f32, _accuracy: f32) {}

    fn epoch_loss(&mut self, _epoch: u32, loss: f32, _accuracy: f32) {
        if let Err(e) = writeln!(self.writer, "{}", loss) {
            eprintln!(
                "Error while logging loss to file: {}\nError: {}",
                self.file.display(),
                e
            );
        }
    }
}
