pub use self::activation::{d_relu, d_sigmoid, relu, sigmoid, Activation};
pub use self::cost::CostFn;
pub use self::layer::Layer;
pub use self::math::{arg_max, normalize, weighted_sum, MovingMean};
pub use self::network::{Network, NetworkError};
pub use self::rng::SplitMix64;

mod activation;
mod cost;
mod layer;
mod math;
mod network;
mod rng;
