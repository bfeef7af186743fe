use crate::data::seriesitem::SeriesItem;
use crate::data::tensor::{SeriesTensor, StaticMatrix};
use crate::error::DataError;

pub const Y_CHANNEL: &str = "y";
pub const AVAILABLE_MASK_CHANNEL: &str = "available_mask";
pub const SAMPLE_MASK_CHANNEL: &str = "sample_mask";

/// Series tensor restricted for windowing, with the store's right padding.
#[derive(Clone, Debug)]
pub struct FilteredTensor {
    pub tensor: SeriesTensor,
    pub right_padding: usize,
}

/// Read-only source of the padded multi-series tensor consumed by the loader.
pub trait SeriesStore {
    /// Ordered channel names: `y`, exogenous, `available_mask`, `sample_mask`.
    fn channel_names(&self) -> &[String];
    fn n_series(&self) -> usize;
    fn n_exogenous(&self) -> usize;
    fn n_static(&self) -> usize;
    fn max_len(&self) -> usize;
    fn frequency(&self) -> &str;
    fn static_matrix(&self) -> &StaticMatrix;
    fn series_tensor(&self) -> &SeriesTensor;

    fn n_channels(&self) -> usize {
        self.channel_names().len()
    }

    /// Tensor of the requested series (all when `None`), limited to the last
    /// `window_sampling_limit` observations plus an `output_size` margin.
    fn filtered_tensor(
        &self,
        output_size: usize,
        window_sampling_limit: usize,
        series_idxs: Option<&[usize]>,
    ) -> Result<FilteredTensor, DataError>;
}

impl<T: SeriesStore + ?Sized> SeriesStore for &T {
    fn channel_names(&self) -> &[String] {
        (**self).channel_names()
    }

    fn n_series(&self) -> usize {
        (**self).n_series()
    }

    fn n_exogenous(&self) -> usize {
        (**self).n_exogenous()
    }

    fn n_static(&self) -> usize {
        (**self).n_static()
    }

    fn max_len(&self) -> usize {
        (**self).max_len()
    }

    fn frequency(&self) -> &str {
        (**self).frequency()
    }

    fn static_matrix(&self) -> &StaticMatrix {
        (**self).static_matrix()
    }

    fn series_tensor(&self) -> &SeriesTensor {
        (**self).series_tensor()
    }

    fn n_channels(&self) -> usize {
        (**self).n_channels()
    }

    fn filtered_tensor(
        &self,
        output_size: usize,
        window_sampling_limit: usize,
        series_idxs: Option<&[usize]>,
    ) -> Result<FilteredTensor, DataError> {
        (**self).filtered_tensor(output_size, window_sampling_limit, series_idxs)
    }
}

/// In-memory store built from [`SeriesItem`]s. Series are right aligned and
/// left padded with zeros up to the longest one.
#[derive(Clone, Debug)]
pub struct SeriesDataset {
    item_ids: Vec<String>,
    channel_names: Vec<String>,
    lengths: Vec<usize>,
    ts_tensor: SeriesTensor,
    s_matrix: StaticMatrix,
    frequency: String,
}

impl SeriesDataset {
    pub fn from_items(items: Vec<SeriesItem>) -> Result<Self, DataError> {
        let first = items.first().ok_or(DataError::EmptyDataset)?;
        let n_static = first.n_static();
        let n_x = first.n_exogenous();
        let frequency = items.iter().find_map(|item| item.freq.clone());

        for item in &items {
            item.validate()?;
            if item.n_static() != n_static {
                return Err(DataError::InconsistentItems(format!(
                    "item '{}' has {} static features, expected {n_static}",
                    item.item_id,
                    item.n_static()
                )));
            }
            if item.n_exogenous() != n_x {
                return Err(DataError::InconsistentItems(format!(
                    "item '{}' has {} exogenous features, expected {n_x}",
                    item.item_id,
                    item.n_exogenous()
                )));
            }
            if item.freq.is_some() && frequency.is_some() && item.freq != frequency {
                return Err(DataError::InconsistentItems(format!(
                    "item '{}' has frequency {:?}, expected {:?}",
                    item.item_id, item.freq, frequency
                )));
            }
        }

        let n_series = items.len();
        let n_channels = n_x + 3;
        let max_len = items.iter().map(SeriesItem::len).max().unwrap_or(0);
        let available_channel = n_x + 1;
        let sample_channel = n_x + 2;

        let mut ts_tensor = SeriesTensor::zeros(n_series, n_channels, max_len);
        let mut static_values = Vec::with_capacity(n_series * n_static);
        let mut lengths = Vec::with_capacity(n_series);

        for (series, item) in items.iter().enumerate() {
            let len = item.len();
            let start = max_len - len;
            lengths.push(len);

            ts_tensor.channel_mut(series, 0)[start..].copy_from_slice(&item.target);
            if let Some(features) = &item.feat_dynamic_real {
                for (x, feature) in features.iter().enumerate() {
                    ts_tensor.channel_mut(series, x + 1)[start..].copy_from_slice(feature);
                }
            }

            let available = &mut ts_tensor.channel_mut(series, available_channel)[start..];
            match &item.observed_values {
                Some(values) => available.copy_from_slice(values),
                None => available.fill(1.0),
            }

            let sample = &mut ts_tensor.channel_mut(series, sample_channel)[start..];
            match &item.sample_mask {
                Some(values) => sample.copy_from_slice(values),
                None => sample.fill(1.0),
            }

            if let Some(features) = &item.feat_static_real {
                static_values.extend_from_slice(features);
            }
        }

        let mut channel_names = Vec::with_capacity(n_channels);
        channel_names.push(Y_CHANNEL.to_string());
        channel_names.extend((0..n_x).map(|x| format!("x_{x}")));
        channel_names.push(AVAILABLE_MASK_CHANNEL.to_string());
        channel_names.push(SAMPLE_MASK_CHANNEL.to_string());

        Ok(Self {
            item_ids: items.into_iter().map(|item| item.item_id).collect(),
            channel_names,
            lengths,
            ts_tensor,
            s_matrix: StaticMatrix::new(static_values, n_series, n_static)?,
            frequency: frequency.unwrap_or_default(),
        })
    }

    /// Renames the exogenous channels.
    pub fn with_exogenous_names<I, S>(mut self, names: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let n_x = self.n_exogenous();
        if names.len() != n_x {
            return Err(DataError::InconsistentItems(format!(
                "got {} exogenous names for {n_x} exogenous channels",
                names.len()
            )));
        }

        for (x, name) in names.into_iter().enumerate() {
            self.channel_names[x + 1] = name;
        }
        Ok(self)
    }

    /// Rewrites `sample_mask` around the last `ds_in_test` observed steps of
    /// every series: in test mode only those steps stay sampleable, otherwise
    /// they are held out.
    pub fn with_holdout(mut self, ds_in_test: usize, is_test: bool) -> Self {
        let n_x = self.n_exogenous();
        let max_len = self.max_len();
        for series in 0..self.n_series() {
            let start = max_len - self.lengths[series];
            let split = max_len.saturating_sub(ds_in_test).max(start);
            let sample = self.ts_tensor.channel_mut(series, n_x + 2);
            for (t, value) in sample.iter_mut().enumerate().skip(start) {
                *value = if (t >= split) == is_test { 1.0 } else { 0.0 };
            }
        }
        self
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    /// Unpadded length of every series.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }
}

impl SeriesStore for SeriesDataset {
    fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    fn n_series(&self) -> usize {
        self.ts_tensor.n_series()
    }

    fn n_exogenous(&self) -> usize {
        self.channel_names.len() - 3
    }

    fn n_static(&self) -> usize {
        self.s_matrix.n_static()
    }

    fn max_len(&self) -> usize {
        self.ts_tensor.len()
    }

    fn frequency(&self) -> &str {
        &self.frequency
    }

    fn static_matrix(&self) -> &StaticMatrix {
        &self.s_matrix
    }

    fn series_tensor(&self) -> &SeriesTensor {
        &self.ts_tensor
    }

    fn filtered_tensor(
        &self,
        output_size: usize,
        window_sampling_limit: usize,
        series_idxs: Option<&[usize]>,
    ) -> Result<FilteredTensor, DataError> {
        let n_series = self.n_series();
        if let Some(idx) = series_idxs
            .into_iter()
            .flatten()
            .copied()
            .find(|&idx| idx >= n_series)
        {
            return Err(DataError::SeriesIndexOutOfRange { idx, n_series });
        }

        let max_len = self.max_len();
        let last = max_len + output_size;
        let first = last
            .saturating_sub(window_sampling_limit + output_size)
            .min(max_len);

        let tensor = match series_idxs {
            Some(idxs) => self.ts_tensor.select_series(idxs),
            None => self.ts_tensor.clone(),
        };

        Ok(FilteredTensor {
            tensor: tensor.trailing(first),
            right_padding: last - max_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> SeriesDataset {
        SeriesDataset::from_items(vec![
            SeriesItem::new("long", vec![1.0, 2.0, 3.0, 4.0])
                .with_static(vec![10.0])
                .with_dynamic(vec![vec![0.1, 0.2, 0.3, 0.4]])
                .with_freq("D"),
            SeriesItem::new("short", vec![5.0, 6.0])
                .with_observed_values(vec![1.0, 0.0])
                .with_static(vec![20.0])
                .with_dynamic(vec![vec![0.5, 0.6]]),
        ])
        .unwrap()
    }

    #[test]
    fn pads_shorter_series_on_the_left() {
        let dataset = dataset();
        let tensor = dataset.series_tensor();
        assert_eq!(tensor.dims(), [2, 4, 4]);
        assert_eq!(tensor.channel(1, 0), &[0.0, 0.0, 5.0, 6.0]);
        assert_eq!(tensor.channel(1, 1), &[0.0, 0.0, 0.5, 0.6]);
        assert_eq!(tensor.channel(1, 2), &[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(tensor.channel(1, 3), &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(dataset.lengths(), &[4, 2]);
    }

    #[test]
    fn exposes_store_metadata() {
        let dataset = dataset();
        assert_eq!(
            dataset.channel_names(),
            &["y", "x_0", "available_mask", "sample_mask"]
        );
        assert_eq!(dataset.n_channels(), 4);
        assert_eq!(dataset.n_exogenous(), 1);
        assert_eq!(dataset.n_static(), 1);
        assert_eq!(dataset.max_len(), 4);
        assert_eq!(dataset.frequency(), "D");
        assert_eq!(dataset.static_matrix().row(1), &[20.0]);
    }

    #[test]
    fn renames_exogenous_channels() {
        let dataset = dataset().with_exogenous_names(["price"]).unwrap();
        assert_eq!(dataset.channel_names()[1], "price");
        assert!(dataset.with_exogenous_names(["a", "b"]).is_err());
    }

    #[test]
    fn rejects_inconsistent_items() {
        let empty = SeriesDataset::from_items(Vec::new());
        assert!(matches!(empty, Err(DataError::EmptyDataset)));

        let mixed_static = SeriesDataset::from_items(vec![
            SeriesItem::new("a", vec![1.0]).with_static(vec![1.0]),
            SeriesItem::new("b", vec![1.0]),
        ]);
        assert!(matches!(mixed_static, Err(DataError::InconsistentItems(_))));

        let mixed_freq = SeriesDataset::from_items(vec![
            SeriesItem::new("a", vec![1.0]).with_freq("D"),
            SeriesItem::new("b", vec![1.0]).with_freq("H"),
        ]);
        assert!(matches!(mixed_freq, Err(DataError::InconsistentItems(_))));
    }

    #[test]
    fn holdout_masks_trailing_steps() {
        let train = dataset().with_holdout(1, false);
        assert_eq!(train.series_tensor().channel(0, 3), &[1.0, 1.0, 1.0, 0.0]);
        assert_eq!(train.series_tensor().channel(1, 3), &[0.0, 0.0, 1.0, 0.0]);

        let test = dataset().with_holdout(1, true);
        assert_eq!(test.series_tensor().channel(0, 3), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(test.series_tensor().channel(1, 3), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn filtered_tensor_keeps_trailing_limit() {
        let dataset = dataset();
        let filtered = dataset.filtered_tensor(1, 2, Some(&[1][..])).unwrap();
        assert_eq!(filtered.right_padding, 1);
        assert_eq!(filtered.tensor.dims(), [1, 4, 2]);
        assert_eq!(filtered.tensor.channel(0, 0), &[5.0, 6.0]);

        // the horizon margin does not eat into the limit
        let filtered = dataset.filtered_tensor(2, 3, Some(&[0][..])).unwrap();
        assert_eq!(filtered.right_padding, 2);
        assert_eq!(filtered.tensor.channel(0, 0), &[2.0, 3.0, 4.0]);

        let all = dataset.filtered_tensor(1, 100, None).unwrap();
        assert_eq!(all.tensor.dims(), [2, 4, 4]);
    }

    #[test]
    fn filtered_tensor_rejects_unknown_series() {
        let result = dataset().filtered_tensor(1, 3, Some(&[0, 7][..]));
        assert!(matches!(
            result,
            Err(DataError::SeriesIndexOutOfRange { idx: 7, n_series: 2 })
        ));
    }
}
