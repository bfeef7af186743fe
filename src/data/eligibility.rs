use burn::tensor::{backend::Backend, Tensor};

use crate::data::tensor::SeriesTensor;
use crate::error::DataError;

/// Mask requirements a window (or a whole series) must meet to be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub windows_size: usize,
    pub output_size: usize,
    pub complete_inputs: bool,
    pub available_mask: usize,
    pub sample_mask: usize,
}

impl Eligibility {
    /// Minimum number of sampleable steps a series needs, exclusive.
    pub fn series_threshold(&self) -> usize {
        if self.complete_inputs {
            self.windows_size
        } else {
            self.output_size
        }
    }

    /// Store indices of series whose `sample_mask` sums above the threshold.
    pub fn sampleable_series(&self, tensor: &SeriesTensor) -> Vec<usize> {
        let threshold = self.series_threshold() as f32;
        (0..tensor.n_series())
            .filter(|&series| {
                tensor.channel(series, self.sample_mask).iter().sum::<f32>() > threshold
            })
            .collect()
    }

    /// Indices of the windows in `windows` (`[n_windows, n_channels, windows_size]`)
    /// whose whole output horizon is sampleable. With `complete_inputs` the
    /// whole input region must also be available.
    pub fn eligible_windows<B: Backend>(
        &self,
        windows: Tensor<B, 3>,
    ) -> Result<Vec<usize>, DataError> {
        let [n_windows, _, windows_size] = windows.dims();
        if n_windows == 0 {
            return Err(DataError::NoSampleableWindows);
        }
        let split = windows_size - self.output_size;

        let sample_sums = mask_sums(windows.clone(), self.sample_mask, split..windows_size);
        let available_sums = if self.complete_inputs && split > 0 {
            Some(mask_sums(windows, self.available_mask, 0..split))
        } else {
            None
        };

        let eligible: Vec<usize> = (0..n_windows)
            .filter(|&window| sample_sums[window] == self.output_size as f32)
            .filter(|&window| match &available_sums {
                Some(sums) => sums[window] == split as f32,
                None => true,
            })
            .collect();

        if eligible.is_empty() {
            return Err(DataError::NoSampleableWindows);
        }

        Ok(eligible)
    }
}

/// Per-window sum of one mask channel over `steps`.
fn mask_sums<B: Backend>(
    windows: Tensor<B, 3>,
    channel: usize,
    steps: std::ops::Range<usize>,
) -> Vec<f32> {
    let [n_windows, _, _] = windows.dims();
    let width = steps.len();
    windows
        .slice([0..n_windows, channel..channel + 1, steps])
        .reshape([n_windows, width])
        .sum_dim(1)
        .reshape([n_windows])
        .into_data()
        .convert::<f32>()
        .value
}
