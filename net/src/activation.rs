use std::str::FromStr;

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub fn d_sigmoid(x: f32) -> f32 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

pub fn d_relu(x: f32) -> f32 {
    match x > 0.0 {
        true => 1.0,
        false => 0.0,
    }
}

/// The nonlinearity applied to every weighted sum during a forward pass.
/// Each variant also fixes the output range that targets are rescaled into
/// and outputs are rescaled out of.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Activation {
    Sigmoid,
    Relu,
}

impl Activation {
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Sigmoid => sigmoid(x),
            Self::Relu => relu(x),
        }
    }

    pub fn derivative(self, x: f32) -> f32 {
        match self {
            Self::Sigmoid => d_sigmoid(x),
            Self::Relu => d_relu(x),
        }
    }

    /// The `(min, max)` interval target values are mapped into.
    pub fn range(self) -> (f32, f32) {
        match self {
            Self::Sigmoid => (0.0, 1.0),
            Self::Relu => (0.0, 1.0),
        }
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sigmoid" => Ok(Self::Sigmoid),
            "relu" => Ok(Self::Relu),
            unknown => Err(format!("unknown activation function: {unknown}")),
        }
    }
}
