use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{error, info};

use mnist::ImageFile;
use net::{MovingMean, SplitMix64};

use crate::args::GanConfig;

/// Batches averaged into the smoothed cost reports.
const COST_WINDOW: usize = 100;

/// Batches between progress reports.
const REPORT_INTERVAL: usize = 100;

/// Rounds between generator sample dumps.
const SAMPLE_INTERVAL: usize = 1000;

pub fn run_gan(config: GanConfig) {
    let mut images = match ImageFile::open(&config.train_images) {
        Ok(images) => images,
        Err(error) => {
            error!(%error, "Could not open the training images.");
            return;
        }
    };

    let mut generator = match config.generator.build_network() {
        Ok(network) => network,
        Err(error) => {
            error!(%error, "Could not build the generator.");
            return;
        }
    };

    let mut discriminator = match config.discriminator.build_network() {
        Ok(network) => network,
        Err(error) => {
            error!(%error, "Could not build the discriminator.");
            return;
        }
    };

    if images.is_empty() {
        error!("The training images must not be empty.");
        return;
    }
    if generator.output_len() != images.image_len() {
        error!(
            output = generator.output_len(),
            image = images.image_len(),
            "The generator's output layer must match the image size."
        );
        return;
    }
    if discriminator.input_len() != images.image_len() {
        error!(
            input = discriminator.input_len(),
            image = images.image_len(),
            "The discriminator's input layer must match the image size."
        );
        return;
    }
    if discriminator.output_len() != 1 {
        error!(
            output = discriminator.output_len(),
            "The discriminator's output layer must hold a single verdict node."
        );
        return;
    }
    if config.batch_size == 0 {
        error!("The batch size must be at least 1.");
        return;
    }

    if let Some(directory) = &config.samples {
        if let Err(error) = fs::create_dir_all(directory) {
            error!(%error, "Could not create the samples directory.");
            return;
        }
    }

    let mut cost_log = match config.cost_log.as_deref().map(File::create).transpose() {
        Ok(file) => file.map(BufWriter::new),
        Err(error) => {
            error!(%error, "Could not create the cost log.");
            return;
        }
    };

    let mut rng = SplitMix64::seed_from_u64(config.seed);
    discriminator.randomize(&mut rng);
    generator.randomize(&mut rng);

    let normal = Normal::new(0.0f32, 1.0).unwrap();
    let latent = generator.input_len();

    // The discriminator accumulates a real and a generated sample each
    // round, so its batch divisor doubles.
    let d_batch = 2 * config.batch_size;

    let rounds = whole_batch_rounds(config.rounds, config.batch_size);

    info!(
        samples = images.len(),
        rounds,
        batch_size = config.batch_size,
        latent,
        "Training the adversarial pair."
    );

    let mut d_smoothed = MovingMean::new(COST_WINDOW);
    let mut g_smoothed = MovingMean::new(COST_WINDOW);
    let mut d_batch_cost = 0.0;
    let mut g_batch_cost = 0.0;
    let mut batch = 0usize;

    for round in 1..=rounds {
        let index = rng.gen_range(0..images.len());
        let real = images
            .image(index)
            .expect("the training images are readable");
        let d_real = discriminator
            .train(&real, &[1.0], d_batch, true, None)
            .expect("sample shapes are validated up front");

        let noise: Vec<f32> = (0..latent).map(|_| normal.sample(&mut rng)).collect();
        let fake = generator
            .generate(&noise)
            .expect("sample shapes are validated up front");
        let d_fake = discriminator
            .train(&fake, &[0.0], d_batch, false, None)
            .expect("sample shapes are validated up front");

        // The discriminator's verdict on the fake rides in the generator's
        // target vector, and the coupling row routes the gradient back into
        // the generator's output layer.
        let verdict = discriminator
            .generate(&fake)
            .expect("sample shapes are validated up front")[0];
        let target = vec![verdict; generator.output_len()];
        let g_cost = generator
            .train(
                &noise,
                &target,
                config.batch_size,
                false,
                discriminator.coupling_weights(),
            )
            .expect("sample shapes are validated up front");

        d_batch_cost += (d_real + d_fake) / 2.0;
        g_batch_cost += g_cost;

        if round % config.batch_size == 0 {
            discriminator.apply_deltas();
            generator.apply_deltas();
            batch += 1;

            let d_cost = d_batch_cost / config.batch_size as f32;
            let g_cost = g_batch_cost / config.batch_size as f32;
            d_batch_cost = 0.0;
            g_batch_cost = 0.0;

            let d_mean = d_smoothed.update(d_cost);
            let g_mean = g_smoothed.update(g_cost);
            if let Some(log) = &mut cost_log {
                writeln!(log, "{round} {d_cost} {g_cost}").expect("the cost log is writable");
            }
            if batch % REPORT_INTERVAL == 0 {
                info!(
                    round,
                    discriminator = d_mean,
                    generator = g_mean,
                    "Progress."
                );
            }
        }

        if let Some(directory) = &config.samples {
            if round % SAMPLE_INTERVAL == 0 {
                let path = Path::new(directory).join(format!("sample_{round:06}.pgm"));
                if let Err(error) = write_pgm(&path, &fake, images.columns(), images.rows()) {
                    error!(%error, "Could not write a generator sample.");
                    return;
                }
                info!(path = %path.display(), "Wrote a generator sample.");
            }
        }
    }
}

/// Trailing rounds short of a full batch would accumulate deltas that
/// never reach an update, so the training loop drops them up front.
fn whole_batch_rounds(rounds: usize, batch_size: usize) -> usize {
    rounds - rounds % batch_size
}

/// Plain-text PGM: one row of gray values per line, pixels clamped into
/// [0, 1] and scaled to 255.
fn write_pgm(path: &Path, pixels: &[f32], columns: usize, rows: usize) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "P2")?;
    writeln!(out, "{columns} {rows}")?;
    writeln!(out, "255")?;
    for row in pixels.chunks(columns) {
        let line = row
            .iter()
            .map(|&pixel| ((pixel.clamp(0.0, 1.0) * 255.0) as u8).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{line}")?;
    }
    Ok(())
}
