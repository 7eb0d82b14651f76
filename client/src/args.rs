use std::collections::HashMap;
use std::str::FromStr;

use clap::{Args as ArgsTrait, Parser, Subcommand};

use net::{Activation, CostFn, Network, NetworkError};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Trains a digit classifier on the MNIST byte files.
    Classifier(ClassifierConfig),
    /// Trains an adversarial generator and discriminator pair on the MNIST
    /// byte files.
    Gan(GanConfig),
}

#[derive(ArgsTrait, Clone, Debug)]
pub struct ClassifierConfig {
    /// The training images, in idx3-ubyte format.
    #[arg(long)]
    pub train_images: String,

    /// The training labels, in idx1-ubyte format.
    #[arg(long)]
    pub train_labels: String,

    /// The test images, used for the per-epoch accuracy report.
    #[arg(long)]
    pub test_images: String,

    /// The test labels.
    #[arg(long)]
    pub test_labels: String,

    /// Network options.
    ///
    /// Parameters:
    ///   sizes=AxBxC...    - Node counts per layer, input to output.
    ///   activation=string - The activation function. (sigmoid or relu)
    ///   cost=string       - The cost function. (mse, log-dz, or log-gdz)
    ///   rate=decimal      - The learning rate.
    #[arg(
        long,
        default_value = "sizes=784x128x10,activation=sigmoid,cost=mse,rate=0.01",
        verbatim_doc_comment
    )]
    pub network: NetworkOptions,

    /// The number of passes over the full training set.
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// The number of samples accumulated into each weight update.
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// The seed for weight initialization and sample shuffling.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// A file to append the per-batch cost to, one value per line.
    #[arg(long)]
    pub cost_log: Option<String>,
}

#[derive(ArgsTrait, Clone, Debug)]
pub struct GanConfig {
    /// The training images, in idx3-ubyte format.
    #[arg(long)]
    pub train_images: String,

    /// Generator options.
    ///
    /// Parameters:
    ///   sizes=AxBxC...    - Node counts per layer, input to output. The
    ///                       input layer sets the noise size; the output
    ///                       layer must match the image size.
    ///   activation=string - The activation function. (sigmoid or relu)
    ///   cost=string       - The cost function. (mse, log-dz, or log-gdz)
    ///   rate=decimal      - The learning rate.
    #[arg(
        long,
        default_value = "sizes=16x128x784,activation=sigmoid,cost=log-gdz,rate=0.01",
        verbatim_doc_comment
    )]
    pub generator: NetworkOptions,

    /// Discriminator options. These are the same as the generator options,
    /// except that the input layer must match the image size and the output
    /// layer must hold one node.
    #[arg(
        long,
        default_value = "sizes=784x128x1,activation=sigmoid,cost=log-dz,rate=0.01",
        verbatim_doc_comment
    )]
    pub discriminator: NetworkOptions,

    /// The number of adversarial rounds, truncated to a whole number of
    /// batches. Each round trains the discriminator on one real and one
    /// generated sample, then the generator on the discriminator's
    /// verdict.
    #[arg(long, default_value_t = 20000)]
    pub rounds: usize,

    /// The number of rounds accumulated into each weight update.
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// The seed for weight initialization, sample draws, and noise.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// A file to append the per-batch costs to, one "round discriminator
    /// generator" line per batch.
    #[arg(long)]
    pub cost_log: Option<String>,

    /// A directory to write periodic generator samples to, as PGM images.
    #[arg(long)]
    pub samples: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NetworkOptions {
    pub sizes: Vec<usize>,
    pub activation: Activation,
    pub cost: CostFn,
    pub rate: f32,
}

impl NetworkOptions {
    /// Stands up a built, unrandomized network from the parsed options.
    pub fn build_network(&self) -> Result<Network, NetworkError> {
        let mut network = Network::new();
        for &size in &self.sizes {
            network.add_layer(size);
        }
        network.set_activation(self.activation);
        network.set_cost_fn(self.cost);
        network.learn_rate = self.rate;
        network.build()?;
        Ok(network)
    }
}

impl FromStr for NetworkOptions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = parse_map(s)?;

        let sizes = fields
            .get("sizes")
            .ok_or_else(|| "no sizes field".to_owned())?
            .split('x')
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| format!("invalid layer size: {part}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if sizes.len() < 2 {
            return Err("sizes must list at least an input and an output layer".to_owned());
        }

        let activation = fields
            .get("activation")
            .map(|&f| f.parse::<Activation>())
            .transpose()?
            .unwrap_or(Activation::Sigmoid);

        let cost = fields
            .get("cost")
            .map(|&f| f.parse::<CostFn>())
            .transpose()?
            .unwrap_or(CostFn::Mse);

        let rate = fields
            .get("rate")
            .map(|&f| {
                f.parse::<f32>()
                    .map_err(|_| format!("invalid value for rate: {f}"))
            })
            .transpose()?
            .unwrap_or(0.01);
        if rate <= 0.0 {
            return Err(format!("invalid value for rate (must be positive): {rate}"));
        }

        Ok(Self {
            sizes,
            activation,
            cost,
            rate,
        })
    }
}

fn parse_map(string: &str) -> Result<HashMap<&str, &str>, String> {
    string
        .split(',')
        .map(|field| {
            let mut parts = field.trim().splitn(2, '=').map(str::trim);
            let key = parts
                .next()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| "no key for field".to_owned())?;
            let value = parts
                .next()
                .ok_or_else(|| format!("no value for key: {key}"))?;
            Ok((key, value))
        })
        .collect()
}
