//! Evaluation results.
//!
//! Metrics are diagnostic only; they never feed back into training.

/// Prediction and expectation for one training sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEval {
    pub predicted: Vec<f32>,
    pub expected: Vec<f32>,
}

impl SampleEval {
    /// True if every predicted value has the same sign as its expected value.
    ///
    /// Zero counts as positive.
    pub fn signs_match(&self) -> bool {
        self.predicted
            .iter()
            .zip(&self.expected)
            .all(|(&p, &e)| (p >= 0.0) == (e >= 0.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub samples: Vec<SampleEval>,
    /// Mean squared error over every output value of every sample.
    pub mse: f32,
    /// Mean absolute error over every output value of every sample.
    pub mae: f32,
}

impl EvalReport {
    /// Fraction of samples whose predictions all have the expected sign.
    pub fn sign_accuracy(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let hits = self.samples.iter().filter(|s| s.signs_match()).count();
        hits as f32 / self.samples.len() as f32
    }
}
