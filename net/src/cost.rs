use std::str::FromStr;

/// The log losses saturate their derivatives to this magnitude at or beyond
/// the [0, 1] probability boundary instead of going infinite.
const DERIVATIVE_CLAMP: f32 = 9999.0;

/// The cost strategy a network trains against. `value` scores a whole output
/// vector; `derivative` feeds one component's error term during
/// backpropagation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CostFn {
    /// Mean squared error. Ignores the real/fake flag.
    Mse,
    /// Discriminator log loss: penalizes low probabilities on real samples
    /// and high probabilities on generated ones.
    LogDz,
    /// Generator log loss: always scores as if the sample should read real.
    LogGdz,
}

impl CostFn {
    pub fn value(self, predicted: &[f32], observed: &[f32], is_real: bool) -> f32 {
        debug_assert_eq!(predicted.len(), observed.len());
        let sum: f32 = match self {
            Self::Mse => predicted
                .iter()
                .zip(observed)
                .map(|(p, o)| (o - p) * (o - p))
                .sum(),
            Self::LogDz if is_real => predicted.iter().map(|&p| -ln_floored(p)).sum(),
            Self::LogDz => predicted.iter().map(|&p| -ln_floored(1.0 - p)).sum(),
            Self::LogGdz => predicted.iter().map(|&p| -ln_floored(p)).sum(),
        };
        sum / predicted.len() as f32
    }

    pub fn derivative(self, predicted: f32, observed: f32, is_real: bool) -> f32 {
        match self {
            Self::Mse => 2.0 * (observed - predicted),
            Self::LogDz if is_real => {
                if predicted < 1.0 / DERIVATIVE_CLAMP {
                    -DERIVATIVE_CLAMP
                } else {
                    -1.0 / predicted
                }
            }
            Self::LogDz => {
                if 1.0 - predicted < 1.0 / DERIVATIVE_CLAMP {
                    DERIVATIVE_CLAMP
                } else {
                    1.0 / (1.0 - predicted)
                }
            }
            Self::LogGdz => predicted - 1.0,
        }
    }
}

impl FromStr for CostFn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mse" => Ok(Self::Mse),
            "log-dz" => Ok(Self::LogDz),
            "log-gdz" => Ok(Self::LogGdz),
            unknown => Err(format!("unknown cost function: {unknown}")),
        }
    }
}

/// ln with its argument floored to the smallest positive f32, so costs stay
/// finite at probability 0.
fn ln_floored(x: f32) -> f32 {
    x.max(f32::MIN_POSITIVE).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_derivative_points_from_target_to_output() {
        assert_eq!(CostFn::Mse.derivative(1.0, 0.25, true), -1.5);
        assert_eq!(CostFn::Mse.derivative(1.0, 0.25, false), -1.5);
        assert_eq!(CostFn::Mse.derivative(0.0, 0.75, true), 1.5);
    }

    #[test]
    fn mse_value_averages_squared_differences() {
        let value = CostFn::Mse.value(&[0.0, 1.0], &[1.0, 1.0], true);
        assert_eq!(value, 0.5);
        assert_eq!(CostFn::Mse.value(&[0.5], &[0.5], false), 0.0);
    }

    #[test]
    fn log_dz_derivative_saturates_at_the_boundary() {
        assert_eq!(CostFn::LogDz.derivative(0.0001, 0.0, true), -9999.0);
        assert_eq!(CostFn::LogDz.derivative(0.0, 0.0, true), -9999.0);
        assert_eq!(CostFn::LogDz.derivative(1.0, 0.0, false), 9999.0);
        assert_eq!(CostFn::LogDz.derivative(0.99999, 0.0, false), 9999.0);
    }

    #[test]
    fn log_dz_derivative_in_the_open_interval() {
        assert_eq!(CostFn::LogDz.derivative(0.5, 0.0, true), -2.0);
        assert_eq!(CostFn::LogDz.derivative(0.5, 0.0, false), 2.0);
        assert_eq!(CostFn::LogDz.derivative(0.25, 0.0, false), 1.0 / 0.75);
    }

    #[test]
    fn log_gdz_derivative_ignores_the_flag() {
        assert_eq!(CostFn::LogGdz.derivative(0.25, 0.0, true), -0.75);
        assert_eq!(CostFn::LogGdz.derivative(0.25, 0.0, false), -0.75);
        assert_eq!(CostFn::LogGdz.derivative(1.0, 0.5, false), 0.0);
    }

    #[test]
    fn log_values_stay_finite_at_zero_probability() {
        assert!(CostFn::LogDz.value(&[0.0], &[1.0], true).is_finite());
        assert!(CostFn::LogDz.value(&[1.0], &[0.0], false).is_finite());
        assert!(CostFn::LogGdz.value(&[0.0], &[1.0], false).is_finite());
    }

    #[test]
    fn parses_known_names() {
        assert_eq!("mse".parse(), Ok(CostFn::Mse));
        assert_eq!("log-dz".parse(), Ok(CostFn::LogDz));
        assert_eq!("log-gdz".parse(), Ok(CostFn::LogGdz));
        assert!("cross-entropy".parse::<CostFn>().is_err());
    }
}
