use serde::{Deserialize, Serialize};

/// Continuous one-dimensional function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Function {
    Constant { value: f64 },
    /// `c0 + c1 x + c2 x^2 + ...`
    Polynomial { coefficients: Vec<f64> },
    Gaussian { norm: f64, mean: f64, sigma: f64 },
    /// `norm * exp(slope * x)`
    Exponential { norm: f64, slope: f64 },
}

impl Function {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Function::Constant { value } => *value,
            Function::Polynomial { coefficients } => coefficients
                .iter()
                .rev()
                .fold(0.0, |acc, c| acc * x + c),
            Function::Gaussian { norm, mean, sigma } => {
                if *sigma == 0.0 {
                    return 0.0;
                }
                let z = (x - mean) / sigma;
                norm * (-0.5 * z * z).exp()
            }
            Function::Exponential { norm, slope } => norm * (slope * x).exp(),
        }
    }
}

impl Default for Function {
    fn default() -> Self {
        Function::Constant { value: 1.0 }
    }
}
