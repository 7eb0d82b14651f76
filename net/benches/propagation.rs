use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;

use net::{Activation, CostFn, Network, SplitMix64};

criterion_main!(benches);
criterion_group!(benches, generate_mnist_shape, train_mnist_shape);

fn mnist_shape() -> Network {
    let mut network = Network::new();
    network.add_layer(784);
    network.add_layer(128);
    network.add_layer(10);
    network.set_activation(Activation::Sigmoid);
    network.set_cost_fn(CostFn::Mse);
    network.build().unwrap();
    network.randomize(&mut SplitMix64::seed_from_u64(1));
    network
}

pub fn generate_mnist_shape(c: &mut Criterion) {
    let mut network = mnist_shape();
    let inputs = vec![0.5; 784];

    c.bench_function("generate_784_128_10", |b| {
        b.iter(|| network.generate(black_box(&inputs)).unwrap())
    });
}

pub fn train_mnist_shape(c: &mut Criterion) {
    let mut network = mnist_shape();
    let inputs = vec![0.5; 784];
    let mut target = vec![0.0; 10];
    target[3] = 1.0;

    c.bench_function("train_784_128_10", |b| {
        b.iter(|| {
            network
                .train(black_box(&inputs), black_box(&target), 1, true, None)
                .unwrap()
        })
    });
}
