use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use burn::tensor::{backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

use crate::data::store::{AVAILABLE_MASK_CHANNEL, SAMPLE_MASK_CHANNEL, Y_CHANNEL};
use crate::data::tensor::{SeriesTensor, StaticMatrix};
use crate::error::{ConfigError, DataError};
use crate::utils::float_tensor;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ModelFamily {
    NBeats,
    EsRnn,
}

impl FromStr for ModelFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nbeats" => Ok(ModelFamily::NBeats),
            "esrnn" => Ok(ModelFamily::EsRnn),
            other => Err(ConfigError::UnknownModel(other.to_string())),
        }
    }
}

impl TryFrom<String> for ModelFamily {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::NBeats => write!(f, "nbeats"),
            ModelFamily::EsRnn => write!(f, "esrnn"),
        }
    }
}

/// How windows are cut for a model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// `input_size + output_size` windows over a series padded with
    /// `input_size` zeros on the left and `output_size` on the right.
    Padded {
        input_size: usize,
        output_size: usize,
    },
    /// Unpadded windows of a fixed chunk length.
    Chunked { len_sample_chunks: usize },
}

impl WindowPolicy {
    pub fn resolve(
        model: ModelFamily,
        input_size: usize,
        output_size: usize,
        len_sample_chunks: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let required = input_size + output_size;
        let len_sample_chunks = match len_sample_chunks {
            Some(len) if len < required => {
                return Err(ConfigError::InsufficientChunkLength { len, required })
            }
            Some(len) => len,
            None => required,
        };

        Ok(match model {
            ModelFamily::NBeats => WindowPolicy::Padded {
                input_size,
                output_size,
            },
            ModelFamily::EsRnn => WindowPolicy::Chunked { len_sample_chunks },
        })
    }

    pub fn windows_size(&self) -> usize {
        match *self {
            WindowPolicy::Padded {
                input_size,
                output_size,
            } => input_size + output_size,
            WindowPolicy::Chunked { len_sample_chunks } => len_sample_chunks,
        }
    }

    /// Left and right zero padding applied before windowing.
    pub fn padding(&self) -> (usize, usize) {
        match *self {
            WindowPolicy::Padded {
                input_size,
                output_size,
            } => (input_size, output_size),
            WindowPolicy::Chunked { .. } => (0, 0),
        }
    }
}

/// Channel offsets resolved once from the store's channel names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    pub y: usize,
    pub exogenous: Range<usize>,
    pub available_mask: usize,
    pub sample_mask: usize,
}

impl ChannelLayout {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let position = |name: &str| {
            names
                .iter()
                .position(|n| n.as_ref() == name)
                .ok_or_else(|| ConfigError::MissingChannel(name.to_string()))
        };

        let y = position(Y_CHANNEL)?;
        let available_mask = position(AVAILABLE_MASK_CHANNEL)?;
        let sample_mask = position(SAMPLE_MASK_CHANNEL)?;

        Ok(Self {
            y,
            exogenous: (y + 1)..available_mask.max(y + 1),
            available_mask,
            sample_mask,
        })
    }

    pub fn n_exogenous(&self) -> usize {
        self.exogenous.len()
    }
}

/// Windows of every selected series flattened as `[n_windows, n_channels, windows_size]`,
/// series-major. `static_rows` and `series_idxs` are aligned with the windows.
#[derive(Debug, Clone)]
pub struct WindowSet {
    values: Vec<f32>,
    n_channels: usize,
    windows_size: usize,
    windows_per_series: usize,
    n_static: usize,
    static_rows: Vec<f32>,
    series_idxs: Vec<usize>,
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.series_idxs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series_idxs.is_empty()
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn windows_size(&self) -> usize {
        self.windows_size
    }

    pub fn windows_per_series(&self) -> usize {
        self.windows_per_series
    }

    pub fn n_static(&self) -> usize {
        self.n_static
    }

    /// One channel of one window.
    pub fn channel(&self, window: usize, channel: usize) -> &[f32] {
        let start = (window * self.n_channels + channel) * self.windows_size;
        &self.values[start..start + self.windows_size]
    }

    pub fn static_row(&self, window: usize) -> &[f32] {
        &self.static_rows[window * self.n_static..(window + 1) * self.n_static]
    }

    pub fn series_idxs(&self) -> &[usize] {
        &self.series_idxs
    }

    /// Static rows of every window, `[n_windows, n_static]` row-major.
    pub fn static_rows(&self) -> &[f32] {
        &self.static_rows
    }

    /// All windows as one `[n_windows, n_channels, windows_size]` tensor.
    pub fn values_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 3> {
        float_tensor(
            self.values.clone(),
            [self.len(), self.n_channels, self.windows_size],
            device,
        )
    }
}

/// Slides a `windows_size` frame with step `stride` over every series of
/// `tensor` after zero padding. `series_idxs[i]` is the store index of
/// `tensor`'s i-th series, used to pick its static row.
pub fn create_windows(
    tensor: &SeriesTensor,
    policy: &WindowPolicy,
    stride: usize,
    series_idxs: &[usize],
    s_matrix: &StaticMatrix,
) -> Result<WindowSet, DataError> {
    let [n_series, n_channels, len] = tensor.dims();
    debug_assert_eq!(n_series, series_idxs.len());

    let windows_size = policy.windows_size();
    let (padding_left, padding_right) = policy.padding();
    let padded_len = padding_left + len + padding_right;
    if padded_len < windows_size {
        return Err(DataError::WindowExceedsSeries {
            len: padded_len,
            windows_size,
        });
    }

    let stride = stride.max(1);
    let windows_per_series = (padded_len - windows_size) / stride + 1;
    let n_windows = n_series * windows_per_series;
    let n_static = s_matrix.n_static();

    let mut values = vec![0.0; n_windows * n_channels * windows_size];
    let mut static_rows = Vec::with_capacity(n_windows * n_static);
    let mut window_series_idxs = Vec::with_capacity(n_windows);

    for (series, &series_idx) in series_idxs.iter().enumerate() {
        for position in 0..windows_per_series {
            let window = series * windows_per_series + position;
            // Window covers padded steps [start, start + windows_size).
            let start = position * stride;
            let first = start.max(padding_left);
            let last = (start + windows_size).min(padding_left + len);

            if first < last {
                for channel in 0..n_channels {
                    let source = &tensor.channel(series, channel)[first - padding_left..last - padding_left];
                    let offset = (window * n_channels + channel) * windows_size + (first - start);
                    values[offset..offset + source.len()].copy_from_slice(source);
                }
            }

            static_rows.extend_from_slice(s_matrix.row(series_idx));
            window_series_idxs.push(series_idx);
        }
    }

    Ok(WindowSet {
        values,
        n_channels,
        windows_size,
        windows_per_series,
        n_static,
        static_rows,
        series_idxs: window_series_idxs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // One series, channels [y, available_mask, sample_mask], 5 steps.
    fn single_series() -> (SeriesTensor, StaticMatrix) {
        let mut values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        values.extend([1.0; 5]);
        values.extend([1.0; 5]);
        (
            SeriesTensor::new(values, 1, 3, 5).unwrap(),
            StaticMatrix::new(vec![7.0], 1, 1).unwrap(),
        )
    }

    #[test]
    fn model_family_parses_known_names_only() {
        assert_eq!("nbeats".parse::<ModelFamily>(), Ok(ModelFamily::NBeats));
        assert_eq!("esrnn".parse::<ModelFamily>(), Ok(ModelFamily::EsRnn));
        assert_eq!(
            "tft".parse::<ModelFamily>(),
            Err(ConfigError::UnknownModel("tft".to_string()))
        );
    }

    #[test]
    fn model_family_deserializes_through_from_str() {
        assert_eq!(
            ModelFamily::try_from("esrnn".to_string()),
            Ok(ModelFamily::EsRnn)
        );
        assert_eq!(
            ModelFamily::try_from("tft".to_string()),
            Err(ConfigError::UnknownModel("tft".to_string()))
        );
    }

    #[test]
    fn padded_policy_pads_input_and_output() {
        let policy = WindowPolicy::resolve(ModelFamily::NBeats, 3, 2, None).unwrap();
        assert_eq!(policy.windows_size(), 5);
        assert_eq!(policy.padding(), (3, 2));
    }

    #[test]
    fn chunked_policy_uses_chunk_length() {
        let policy = WindowPolicy::resolve(ModelFamily::EsRnn, 3, 2, Some(7)).unwrap();
        assert_eq!(policy.windows_size(), 7);
        assert_eq!(policy.padding(), (0, 0));

        let default = WindowPolicy::resolve(ModelFamily::EsRnn, 3, 2, None).unwrap();
        assert_eq!(default.windows_size(), 5);
    }

    #[test]
    fn short_chunks_are_rejected() {
        let result = WindowPolicy::resolve(ModelFamily::EsRnn, 10, 5, Some(10));
        assert_eq!(
            result,
            Err(ConfigError::InsufficientChunkLength {
                len: 10,
                required: 15
            })
        );
    }

    #[test]
    fn layout_resolves_offsets() {
        let layout =
            ChannelLayout::from_names(&["y", "a", "b", "available_mask", "sample_mask"]).unwrap();
        assert_eq!(layout.y, 0);
        assert_eq!(layout.exogenous, 1..3);
        assert_eq!(layout.available_mask, 3);
        assert_eq!(layout.sample_mask, 4);

        let missing = ChannelLayout::from_names(&["y", "available_mask"]);
        assert_eq!(
            missing,
            Err(ConfigError::MissingChannel("sample_mask".to_string()))
        );
    }

    #[test]
    fn chunked_windows_slide_with_stride() {
        let (tensor, s_matrix) = single_series();
        let policy = WindowPolicy::Chunked {
            len_sample_chunks: 3,
        };
        let windows = create_windows(&tensor, &policy, 2, &[0], &s_matrix).unwrap();

        assert_eq!(windows.len(), 2);
        assert_eq!(windows.channel(0, 0), &[1.0, 2.0, 3.0]);
        assert_eq!(windows.channel(1, 0), &[3.0, 4.0, 5.0]);
        assert_eq!(windows.series_idxs(), &[0, 0]);
        assert_eq!(windows.static_row(1), &[7.0]);
    }

    #[test]
    fn padded_windows_zero_fill_masks_outside_series() {
        let (tensor, s_matrix) = single_series();
        let policy = WindowPolicy::Padded {
            input_size: 2,
            output_size: 1,
        };
        let windows = create_windows(&tensor, &policy, 1, &[0], &s_matrix).unwrap();

        // padded length 2 + 5 + 1 = 8, windows of 3 -> 6 positions
        assert_eq!(windows.len(), 6);
        assert_eq!(windows.channel(0, 0), &[0.0, 0.0, 1.0]);
        assert_eq!(windows.channel(0, 2), &[0.0, 0.0, 1.0]);
        assert_eq!(windows.channel(5, 0), &[4.0, 5.0, 0.0]);
        assert_eq!(windows.channel(5, 1), &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn windows_are_series_major() {
        let mut values = Vec::new();
        for series in 0..2 {
            values.extend([series as f32; 4]);
            values.extend([1.0; 8]);
        }
        let tensor = SeriesTensor::new(values, 2, 3, 4).unwrap();
        let s_matrix = StaticMatrix::new(vec![0.0, 1.0, 2.0], 3, 1).unwrap();
        let policy = WindowPolicy::Chunked {
            len_sample_chunks: 2,
        };

        let windows = create_windows(&tensor, &policy, 1, &[2, 0], &s_matrix).unwrap();
        assert_eq!(windows.windows_per_series(), 3);
        assert_eq!(windows.series_idxs(), &[2, 2, 2, 0, 0, 0]);
        assert_eq!(windows.static_row(0), &[2.0]);
        assert_eq!(windows.static_row(3), &[0.0]);
        assert_eq!(windows.channel(4, 0), &[1.0, 1.0]);
    }

    #[test]
    fn series_shorter_than_chunk_fails() {
        let (tensor, s_matrix) = single_series();
        let policy = WindowPolicy::Chunked {
            len_sample_chunks: 6,
        };
        let result = create_windows(&tensor, &policy, 1, &[0], &s_matrix);
        assert!(matches!(
            result,
            Err(DataError::WindowExceedsSeries {
                len: 5,
                windows_size: 6
            })
        ));
    }
}
