//! Training sets.
//!
//! A [`TrainingData`] holds `num_samples` paired rows: an input row of
//! `num_input` values and an expected-output row of `num_output` values. The
//! matrices live in backend-owned storage ([`TrainingState`]) and are laid out
//! row-major, so cell `(sample, neuron)` sits at `sample * width + neuron`.
//!
//! Every accessor validates its indices; there is no unchecked offset arithmetic.

use log::debug;

use crate::backend::TrainingState;
use crate::error::MatrixKind;
use crate::{BackendKind, Error, Result};

#[derive(Debug)]
pub struct TrainingData {
    num_samples: usize,
    num_input: usize,
    num_output: usize,
    state: Box<dyn TrainingState>,
}

impl TrainingData {
    /// Allocate a zero-filled training set for the given backend.
    pub fn create(
        kind: BackendKind,
        num_samples: usize,
        num_input: usize,
        num_output: usize,
    ) -> Result<Self> {
        if num_samples == 0 || num_input == 0 || num_output == 0 {
            return Err(Error::InvalidSize(format!(
                "training set dims must be > 0, got num_samples={num_samples} num_input={num_input} num_output={num_output}"
            )));
        }

        let state = kind
            .backend()?
            .create_training(num_samples, num_input, num_output)?;
        debug_assert_eq!(state.inputs().len(), num_samples * num_input);
        debug_assert_eq!(state.outputs().len(), num_samples * num_output);

        debug!(
            "created {kind} training set: samples={num_samples} inputs={num_input} outputs={num_output}"
        );
        Ok(Self {
            num_samples,
            num_input,
            num_output,
            state,
        })
    }

    /// Build a training set from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into backend storage).
    pub fn from_rows(kind: BackendKind, inputs: &[Vec<f32>], outputs: &[Vec<f32>]) -> Result<Self> {
        if inputs.len() != outputs.len() {
            return Err(Error::dimension(
                "output rows",
                outputs.len(),
                inputs.len(),
            ));
        }
        let num_input = inputs.first().map(|r| r.len()).unwrap_or(0);
        let num_output = outputs.first().map(|r| r.len()).unwrap_or(0);

        let mut data = Self::create(kind, inputs.len(), num_input, num_output)?;
        for (idx, (input, output)) in inputs.iter().zip(outputs).enumerate() {
            data.set_sample(idx, input, output)?;
        }
        Ok(data)
    }

    #[inline]
    pub fn kind(&self) -> BackendKind {
        self.state.kind()
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn num_input(&self) -> usize {
        self.num_input
    }

    #[inline]
    pub fn num_output(&self) -> usize {
        self.num_output
    }

    /// Backend storage, for backends that need their concrete type.
    #[inline]
    pub fn state(&self) -> &dyn TrainingState {
        self.state.as_ref()
    }

    /// The whole input matrix, row-major `(num_samples, num_input)`.
    #[inline]
    pub fn inputs(&self) -> &[f32] {
        self.state.inputs()
    }

    /// The whole output matrix, row-major `(num_samples, num_output)`.
    #[inline]
    pub fn outputs(&self) -> &[f32] {
        self.state.outputs()
    }

    pub fn set_input(&mut self, sample_index: usize, neuron_index: usize, value: f32) -> Result<()> {
        let offset = self.offset(MatrixKind::Input, sample_index, neuron_index)?;
        self.state.inputs_mut()[offset] = value;
        Ok(())
    }

    pub fn set_output(
        &mut self,
        sample_index: usize,
        neuron_index: usize,
        value: f32,
    ) -> Result<()> {
        let offset = self.offset(MatrixKind::Output, sample_index, neuron_index)?;
        self.state.outputs_mut()[offset] = value;
        Ok(())
    }

    /// Overwrite one sample's input and output rows.
    pub fn set_sample(&mut self, sample_index: usize, input: &[f32], output: &[f32]) -> Result<()> {
        if input.len() != self.num_input {
            return Err(Error::dimension("input row", input.len(), self.num_input));
        }
        if output.len() != self.num_output {
            return Err(Error::dimension("output row", output.len(), self.num_output));
        }
        let in_start = self.offset(MatrixKind::Input, sample_index, 0)?;
        let out_start = self.offset(MatrixKind::Output, sample_index, 0)?;

        self.state.inputs_mut()[in_start..in_start + self.num_input].copy_from_slice(input);
        self.state.outputs_mut()[out_start..out_start + self.num_output].copy_from_slice(output);
        Ok(())
    }

    /// The input row of `sample_index`.
    pub fn input(&self, sample_index: usize) -> Result<&[f32]> {
        let start = self.offset(MatrixKind::Input, sample_index, 0)?;
        Ok(&self.state.inputs()[start..start + self.num_input])
    }

    /// The expected-output row of `sample_index`.
    pub fn output(&self, sample_index: usize) -> Result<&[f32]> {
        let start = self.offset(MatrixKind::Output, sample_index, 0)?;
        Ok(&self.state.outputs()[start..start + self.num_output])
    }

    /// Release the backend storage.
    pub fn destroy(self) {
        debug!(
            "destroying {} training set with {} samples",
            self.kind(),
            self.num_samples
        );
    }

    fn offset(&self, matrix: MatrixKind, sample_index: usize, neuron_index: usize) -> Result<usize> {
        let width = match matrix {
            MatrixKind::Input => self.num_input,
            MatrixKind::Output => self.num_output,
        };
        if sample_index >= self.num_samples || neuron_index >= width {
            return Err(Error::IndexOutOfRange {
                matrix,
                sample_index,
                neuron_index,
                num_samples: self.num_samples,
                width,
            });
        }
        Ok(sample_index * width + neuron_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_empty_dimensions() {
        for (n, i, o) in [(0, 2, 1), (4, 0, 1), (4, 2, 0)] {
            let err = TrainingData::create(BackendKind::Native, n, i, o).unwrap_err();
            assert!(matches!(err, Error::InvalidSize(_)), "{n}x{i}x{o}: {err}");
        }
    }

    #[test]
    fn new_sets_are_zero_filled() {
        let data = TrainingData::create(BackendKind::Native, 3, 2, 1).unwrap();
        assert_eq!(data.inputs(), &[0.0; 6]);
        assert_eq!(data.outputs(), &[0.0; 3]);
    }

    #[test]
    fn cell_writes_land_at_row_major_offsets() {
        let mut data = TrainingData::create(BackendKind::Native, 3, 2, 2).unwrap();
        data.set_input(1, 1, 5.0).unwrap();
        data.set_output(2, 0, -1.0).unwrap();

        assert_eq!(data.inputs()[3], 5.0);
        assert_eq!(data.outputs()[4], -1.0);
        assert_eq!(data.input(1).unwrap(), &[0.0, 5.0]);
        assert_eq!(data.output(2).unwrap(), &[-1.0, 0.0]);
    }

    #[test]
    fn out_of_range_writes_fail_without_touching_storage() {
        let mut data = TrainingData::create(BackendKind::Native, 2, 2, 1).unwrap();

        let err = data.set_input(2, 0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange {
                matrix: MatrixKind::Input,
                sample_index: 2,
                neuron_index: 0,
                num_samples: 2,
                width: 2,
            }
        ));
        // (0, 2) would alias (1, 0) with unchecked arithmetic.
        assert!(data.set_input(0, 2, 1.0).is_err());
        assert!(data.set_output(0, 1, 1.0).is_err());
        assert!(data.set_output(5, 0, 1.0).is_err());

        assert!(data.inputs().iter().all(|&v| v == 0.0));
        assert!(data.outputs().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn row_accessors_are_checked() {
        let data = TrainingData::create(BackendKind::Native, 2, 2, 1).unwrap();
        assert!(data.input(2).is_err());
        assert!(data.output(2).is_err());
    }

    #[test]
    fn from_rows_copies_samples() {
        let xs = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let ys = vec![vec![1.0], vec![-1.0]];
        let data = TrainingData::from_rows(BackendKind::Native, &xs, &ys).unwrap();
        assert_eq!(data.num_samples(), 2);
        assert_eq!(data.inputs(), &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(data.outputs(), &[1.0, -1.0]);
    }

    #[test]
    fn from_rows_validates_row_lengths() {
        let xs = vec![vec![0.0, 1.0], vec![1.0]];
        let ys = vec![vec![1.0], vec![-1.0]];
        let err = TrainingData::from_rows(BackendKind::Native, &xs, &ys).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));

        let err = TrainingData::from_rows(BackendKind::Native, &xs[..1], &ys).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));

        let err = TrainingData::from_rows(BackendKind::Native, &[], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidSize(_)));
    }
}
