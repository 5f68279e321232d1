use log::{debug, trace, warn};

use crate::metrics::{EvalReport, SampleEval};
use crate::{Error, Network, Result, TrainingData, loss};

impl Network {
    /// Train for exactly `num_epochs` passes over `data`.
    ///
    /// Samples are visited in set order. There is no early stopping: every
    /// requested epoch runs. Only this handle's parameters change.
    pub fn train(&mut self, data: &TrainingData, num_epochs: usize) -> Result<()> {
        self.check_compatible(data)?;

        let mut epoch_mse = f32::NAN;
        for epoch in 0..num_epochs {
            epoch_mse = self.state.train_epoch(data, self.learning_rate)?;
            trace!("epoch {}/{num_epochs}: mse={epoch_mse}", epoch + 1);
        }

        if num_epochs > 0 {
            if !epoch_mse.is_finite() {
                warn!(
                    "{} network training diverged (mse={epoch_mse}); consider a lower learning rate than {}",
                    self.kind(),
                    self.learning_rate
                );
            }
            debug!(
                "trained {} network for {num_epochs} epochs on {} samples: final mse={epoch_mse}",
                self.kind(),
                data.num_samples()
            );
        }
        Ok(())
    }

    /// Run every sample of `data` and compare against its expected output.
    pub fn evaluate(&mut self, data: &TrainingData) -> Result<EvalReport> {
        self.check_dimensions(data)?;

        let mut samples = Vec::with_capacity(data.num_samples());
        let mut sum_sq = 0.0_f32;
        let mut sum_abs = 0.0_f32;
        for idx in 0..data.num_samples() {
            let expected = data.output(idx)?;
            let predicted = self.run(data.input(idx)?)?;

            sum_sq += loss::sum_squared_error(predicted, expected);
            sum_abs += loss::sum_absolute_error(predicted, expected);
            samples.push(SampleEval {
                predicted: predicted.to_vec(),
                expected: expected.to_vec(),
            });
        }

        let count = (data.num_samples() * data.num_output()) as f32;
        let report = EvalReport {
            samples,
            mse: sum_sq / count,
            mae: sum_abs / count,
        };
        if !report.mse.is_finite() {
            warn!("{} network produced non-finite outputs during evaluation", self.kind());
        }
        Ok(report)
    }

    fn check_dimensions(&self, data: &TrainingData) -> Result<()> {
        let topology = self.topology();
        if data.num_input() != topology.num_input {
            return Err(Error::dimension(
                "training set num_input",
                data.num_input(),
                topology.num_input,
            ));
        }
        if data.num_output() != topology.num_output {
            return Err(Error::dimension(
                "training set num_output",
                data.num_output(),
                topology.num_output,
            ));
        }
        Ok(())
    }

    fn check_compatible(&self, data: &TrainingData) -> Result<()> {
        self.check_dimensions(data)?;
        if data.kind() != self.kind() {
            return Err(Error::BackendMismatch {
                expected: self.kind(),
                found: data.kind(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{BackendKind, Error, Network, TrainingData};

    fn line_data() -> TrainingData {
        let xs: Vec<Vec<f32>> = (0..8).map(|i| vec![i as f32 / 8.0 - 0.5]).collect();
        let ys: Vec<Vec<f32>> = xs.iter().map(|x| vec![0.8 * x[0] + 0.1]).collect();
        TrainingData::from_rows(BackendKind::Native, &xs, &ys).unwrap()
    }

    #[test]
    fn train_rejects_mismatched_sets() {
        let mut net = Network::create(BackendKind::Native, 2, 3, 1, 0.1).unwrap();

        let wrong_input = TrainingData::create(BackendKind::Native, 4, 3, 1).unwrap();
        let err = net.train(&wrong_input, 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));

        let wrong_output = TrainingData::create(BackendKind::Native, 4, 2, 2).unwrap();
        let err = net.train(&wrong_output, 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));

        let err = net.evaluate(&wrong_output).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn zero_epochs_leave_weights_alone() {
        let mut net = Network::create(BackendKind::Native, 1, 3, 1, 0.1).unwrap();
        let before = net.run_to_vec(&[0.25]).unwrap();
        net.train(&line_data(), 0).unwrap();
        assert_eq!(net.run_to_vec(&[0.25]).unwrap(), before);
    }

    #[test]
    fn training_reduces_evaluation_error() {
        let data = line_data();
        let mut net = Network::create(BackendKind::Native, 1, 4, 1, 0.2).unwrap();

        let before = net.evaluate(&data).unwrap();
        net.train(&data, 300).unwrap();
        let after = net.evaluate(&data).unwrap();

        assert!(after.mse < before.mse, "before={} after={}", before.mse, after.mse);
        assert!(after.mse < 0.02, "after={}", after.mse);
    }

    #[test]
    fn evaluate_reports_real_error() {
        let data = line_data();
        let mut net = Network::create(BackendKind::Native, 1, 2, 1, 0.1).unwrap();
        let report = net.evaluate(&data).unwrap();

        assert_eq!(report.samples.len(), data.num_samples());
        let manual: f32 = report
            .samples
            .iter()
            .map(|s| (s.predicted[0] - s.expected[0]).powi(2))
            .sum::<f32>()
            / data.num_samples() as f32;
        assert!(report.mse > 0.0);
        assert!((report.mse - manual).abs() < 1e-6);
        assert!(report.mae > 0.0);
    }
}
