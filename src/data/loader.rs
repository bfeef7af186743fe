use burn::config::Config;
use burn::tensor::backend::Backend;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::data::batch::Batch;
use crate::data::eligibility::Eligibility;
use crate::data::sampler::{gather, select_windows};
use crate::data::store::SeriesStore;
use crate::data::windows::{create_windows, ChannelLayout, ModelFamily, WindowPolicy};
use crate::error::{self, ConfigError, DataError};

#[derive(Config, Debug)]
pub struct TimeSeriesLoaderConfig {
    /// Model the windows are cut for.
    pub model: ModelFamily,
    /// Max number of trailing observations considered.
    pub window_sampling_limit: usize,
    pub input_size: usize,
    /// Forecast horizon.
    pub output_size: usize,
    /// Windows per batch. Ignored when `shuffle` is false.
    pub batch_size: usize,

    /// Step between consecutive windows of a series.
    #[config(default = 1)]
    pub idx_to_sample_freq: usize,

    /// Also require a fully available input region.
    #[config(default = false)]
    pub complete_inputs: bool,

    #[config(default = true)]
    pub shuffle: bool,

    /// Window length for `esrnn`, at least `input_size + output_size`.
    #[config(default = "None")]
    pub len_sample_chunks: Option<usize>,

    /// Defaults to `min(batch_size, n_series)`.
    #[config(default = "None")]
    pub n_series_per_batch: Option<usize>,
}

impl TimeSeriesLoaderConfig {
    pub fn init<B: Backend, S: SeriesStore>(
        &self,
        store: S,
        device: B::Device,
    ) -> error::Result<TimeSeriesLoader<B, S>> {
        let policy = WindowPolicy::resolve(
            self.model,
            self.input_size,
            self.output_size,
            self.len_sample_chunks,
        )?;

        if self.output_size == 0 {
            return Err(ConfigError::ZeroOutputSize.into());
        }
        if self.idx_to_sample_freq == 0 {
            return Err(ConfigError::ZeroStride.into());
        }

        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize.into());
        }

        let n_series = store.n_series();
        let n_series_per_batch = self
            .n_series_per_batch
            .unwrap_or_else(|| self.batch_size.min(n_series));
        if n_series_per_batch == 0 {
            return Err(ConfigError::ZeroSeriesPerBatch.into());
        }
        if self.batch_size % n_series_per_batch != 0 {
            return Err(ConfigError::BatchSizeNotMultiple {
                batch_size: self.batch_size,
                n_series_per_batch,
            }
            .into());
        }
        if n_series_per_batch > n_series {
            return Err(ConfigError::TooManySeriesPerBatch {
                n_series_per_batch,
                n_series,
            }
            .into());
        }

        let layout = ChannelLayout::from_names(store.channel_names())?;

        if !self.shuffle {
            warn!(
                "Batch size will be ignored (shuffle=false). \
                 All constructed windows will be used to train."
            );
        }

        let eligibility = Eligibility {
            windows_size: policy.windows_size(),
            output_size: self.output_size,
            complete_inputs: self.complete_inputs,
            available_mask: layout.available_mask,
            sample_mask: layout.sample_mask,
        };
        let sampleable_ts_idxs = eligibility.sampleable_series(store.series_tensor());
        let n_batches = (sampleable_ts_idxs.len() + n_series_per_batch - 1) / n_series_per_batch;

        debug!(
            model = %self.model,
            windows_size = policy.windows_size(),
            padding = ?policy.padding(),
            n_sampleable_ts = sampleable_ts_idxs.len(),
            n_series,
            n_series_per_batch,
            n_batches,
            "time series loader ready"
        );

        Ok(TimeSeriesLoader {
            store,
            device,
            config: self.clone(),
            policy,
            layout,
            eligibility,
            n_series_per_batch,
            sampleable_ts_idxs,
            n_batches,
        })
    }
}

/// Hierarchical sampler over a [`SeriesStore`]: series first, then windows.
#[derive(Debug)]
pub struct TimeSeriesLoader<B: Backend, S: SeriesStore> {
    store: S,
    device: B::Device,
    config: TimeSeriesLoaderConfig,
    policy: WindowPolicy,
    layout: ChannelLayout,
    eligibility: Eligibility,
    n_series_per_batch: usize,
    sampleable_ts_idxs: Vec<usize>,
    n_batches: usize,
}

impl<B: Backend, S: SeriesStore> TimeSeriesLoader<B, S> {
    /// Batch built from the windows of exactly `series_idxs`.
    pub fn get<R: Rng>(&self, series_idxs: &[usize], rng: &mut R) -> error::Result<Batch<B>> {
        let n_series = self.store.n_series();
        if let Some(&idx) = series_idxs.iter().find(|&&idx| idx >= n_series) {
            return Err(DataError::SeriesIndexOutOfRange { idx, n_series }.into());
        }

        let filtered = self.store.filtered_tensor(
            self.config.output_size,
            self.config.window_sampling_limit,
            Some(series_idxs),
        )?;
        if filtered.tensor.n_series() != series_idxs.len() {
            return Err(DataError::InconsistentItems(format!(
                "store returned {} series for {} requested",
                filtered.tensor.n_series(),
                series_idxs.len()
            ))
            .into());
        }

        let windows = create_windows(
            &filtered.tensor,
            &self.policy,
            self.config.idx_to_sample_freq,
            series_idxs,
            self.store.static_matrix(),
        )?;
        let values = windows.values_tensor::<B>(&self.device);
        let eligible = self.eligibility.eligible_windows(values.clone())?;
        let chosen = select_windows(&eligible, self.config.batch_size, self.config.shuffle, rng);

        trace!(
            n_series = series_idxs.len(),
            n_windows = windows.len(),
            n_eligible = eligible.len(),
            n_chosen = chosen.len(),
            "windows batch"
        );

        Ok(gather(&windows, values, &chosen, &self.layout, &self.device))
    }

    /// One epoch of batches. Every call reorders the sampleable series anew.
    pub fn iter<'a, R: Rng>(&'a self, rng: &'a mut R) -> Epoch<'a, B, S, R> {
        let mut sample_idxs = self.sampleable_ts_idxs.clone();
        if self.config.shuffle {
            sample_idxs.shuffle(&mut *rng);
        }

        Epoch {
            loader: self,
            rng,
            sample_idxs,
            batch: 0,
        }
    }

    pub fn config(&self) -> &TimeSeriesLoaderConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    pub fn windows_size(&self) -> usize {
        self.policy.windows_size()
    }

    pub fn padding(&self) -> (usize, usize) {
        self.policy.padding()
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    pub fn n_series_per_batch(&self) -> usize {
        self.n_series_per_batch
    }

    pub fn sampleable_ts_idxs(&self) -> &[usize] {
        &self.sampleable_ts_idxs
    }

    pub fn n_sampleable_ts(&self) -> usize {
        self.sampleable_ts_idxs.len()
    }

    pub fn n_batches(&self) -> usize {
        self.n_batches
    }

    /// Number of exogenous and static variables.
    pub fn n_variables(&self) -> (usize, usize) {
        (self.store.n_exogenous(), self.store.n_static())
    }

    pub fn n_series(&self) -> usize {
        self.store.n_series()
    }

    pub fn max_len(&self) -> usize {
        self.store.max_len()
    }

    pub fn n_channels(&self) -> usize {
        self.store.n_channels()
    }

    pub fn frequency(&self) -> &str {
        self.store.frequency()
    }
}

/// Batches of one pass over the sampleable series, `n_series_per_batch` at a time.
pub struct Epoch<'a, B: Backend, S: SeriesStore, R: Rng> {
    loader: &'a TimeSeriesLoader<B, S>,
    rng: &'a mut R,
    sample_idxs: Vec<usize>,
    batch: usize,
}

impl<'a, B: Backend, S: SeriesStore, R: Rng> Epoch<'a, B, S, R> {
    /// Series order of this epoch.
    pub fn series_order(&self) -> &[usize] {
        &self.sample_idxs
    }
}

impl<'a, B: Backend, S: SeriesStore, R: Rng> Iterator for Epoch<'a, B, S, R> {
    type Item = error::Result<Batch<B>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.batch >= self.loader.n_batches {
            return None;
        }

        let n = self.loader.n_series_per_batch;
        let start = self.batch * n;
        let end = (start + n).min(self.sample_idxs.len());
        self.batch += 1;

        Some(self.loader.get(&self.sample_idxs[start..end], &mut *self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.loader.n_batches - self.batch;
        (remaining, Some(remaining))
    }
}

impl<'a, B: Backend, S: SeriesStore, R: Rng> ExactSizeIterator for Epoch<'a, B, S, R> {}
