use std::fs::File;
use std::io::{BufWriter, Write};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{error, info};

use mnist::DataSet;
use net::{arg_max, MovingMean, Network, SplitMix64};

use crate::args::ClassifierConfig;

/// The output layer holds one node per digit.
const DIGITS: usize = 10;

/// Batches averaged into the smoothed cost report.
const COST_WINDOW: usize = 100;

/// Batches between progress reports.
const REPORT_INTERVAL: usize = 100;

pub fn run_classifier(config: ClassifierConfig) {
    let mut train_set = match DataSet::open(&config.train_images, &config.train_labels) {
        Ok(set) => set,
        Err(error) => {
            error!(%error, "Could not open the training set.");
            return;
        }
    };

    let mut test_set = match DataSet::open(&config.test_images, &config.test_labels) {
        Ok(set) => set,
        Err(error) => {
            error!(%error, "Could not open the test set.");
            return;
        }
    };

    let mut network = match config.network.build_network() {
        Ok(network) => network,
        Err(error) => {
            error!(%error, "Could not build the network.");
            return;
        }
    };

    if train_set.is_empty() || test_set.is_empty() {
        error!("The data sets must not be empty.");
        return;
    }
    if test_set.image_len() != train_set.image_len() {
        error!("The training and test sets disagree on the image size.");
        return;
    }
    if network.input_len() != train_set.image_len() {
        error!(
            input = network.input_len(),
            image = train_set.image_len(),
            "The input layer must match the image size."
        );
        return;
    }
    if network.output_len() != DIGITS {
        error!(
            output = network.output_len(),
            "The output layer must hold one node per digit."
        );
        return;
    }
    if config.batch_size == 0 {
        error!("The batch size must be at least 1.");
        return;
    }

    let mut cost_log = match config.cost_log.as_deref().map(File::create).transpose() {
        Ok(file) => file.map(BufWriter::new),
        Err(error) => {
            error!(%error, "Could not create the cost log.");
            return;
        }
    };

    let mut rng = SplitMix64::seed_from_u64(config.seed);
    network.randomize(&mut rng);

    info!(
        samples = train_set.len(),
        epochs = config.epochs,
        batch_size = config.batch_size,
        "Training the classifier."
    );

    let mut indices: Vec<usize> = (0..train_set.len()).collect();
    let mut smoothed = MovingMean::new(COST_WINDOW);
    let mut batch = 0usize;

    for epoch in 1..=config.epochs {
        indices.shuffle(&mut rng);

        for chunk in indices.chunks_exact(config.batch_size) {
            let mut batch_cost = 0.0;
            for &index in chunk {
                let image = train_set
                    .image(index)
                    .expect("the training set is readable");
                let label = train_set
                    .label(index)
                    .expect("the training set is readable");
                batch_cost += network
                    .train(&image, &one_hot(label), config.batch_size, true, None)
                    .expect("sample shapes are validated up front");
            }
            network.apply_deltas();
            batch += 1;

            let cost = batch_cost / config.batch_size as f32;
            let mean = smoothed.update(cost);
            if let Some(log) = &mut cost_log {
                writeln!(log, "{cost}").expect("the cost log is writable");
            }
            if batch % REPORT_INTERVAL == 0 {
                info!(epoch, batch, cost = mean, "Progress.");
            }
        }

        let accuracy = evaluate(&mut network, &mut test_set);
        info!(epoch, accuracy, "Finished epoch.");
    }
}

/// Fraction of test samples whose strongest output matches the label.
fn evaluate(network: &mut Network, test_set: &mut DataSet) -> f32 {
    let mut correct = 0usize;
    for index in 0..test_set.len() {
        let image = test_set.image(index).expect("the test set is readable");
        let label = test_set.label(index).expect("the test set is readable");
        let output = network
            .generate(&image)
            .expect("sample shapes are validated up front");
        if arg_max(&output) == label as usize {
            correct += 1;
        }
    }
    correct as f32 / test_set.len() as f32
}

fn one_hot(label: u8) -> [f32; DIGITS] {
    let mut target = [0.0; DIGITS];
    if (label as usize) < DIGITS {
        target[label as usize] = 1.0;
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hot_marks_the_label() {
        assert_eq!(
            one_hot(3),
            [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(one_hot(0)[0], 1.0);
        assert_eq!(one_hot(9)[9], 1.0);

        // Corrupt labels mark nothing rather than panicking.
        assert_eq!(one_hot(200), [0.0; DIGITS]);
    }
}
