use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub ex_low: f64,
    #[serde(default)]
    pub ex_high: f64,
    #[serde(default)]
    pub ey_low: f64,
    #[serde(default)]
    pub ey_high: f64,
}

impl GraphPoint {
    pub fn symmetric(x: f64, y: f64, ex: f64, ey: f64) -> Self {
        Self {
            x,
            y,
            ex_low: ex,
            ex_high: ex,
            ey_low: ey,
            ey_high: ey,
        }
    }

    /// Single y error: the low/high errors combined in quadrature average.
    pub fn error_y(&self) -> f64 {
        if self.ey_low == self.ey_high {
            return self.ey_low;
        }
        (0.5 * (self.ey_low * self.ey_low + self.ey_high * self.ey_high)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub points: Vec<GraphPoint>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn push(&mut self, point: GraphPoint) {
        self.points.push(point);
    }
}
