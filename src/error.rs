use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Invalid static configuration, detected while building a loader.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("There is no batch strategy for model '{0}'")]
    UnknownModel(String),

    #[error("Insufficient len of sample chunks {len}, needs at least input_size + output_size = {required}")]
    InsufficientChunkLength { len: usize, required: usize },

    #[error("batch_size {batch_size} must be multiple of n_series_per_batch {n_series_per_batch}")]
    BatchSizeNotMultiple {
        batch_size: usize,
        n_series_per_batch: usize,
    },

    #[error("n_series_per_batch {n_series_per_batch} needs to be smaller than n_series {n_series}")]
    TooManySeriesPerBatch {
        n_series_per_batch: usize,
        n_series: usize,
    },

    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("n_series_per_batch must be at least 1")]
    ZeroSeriesPerBatch,

    #[error("idx_to_sample_freq must be at least 1")]
    ZeroStride,

    #[error("output_size must be at least 1")]
    ZeroOutputSize,

    #[error("Channel '{0}' not found in series store")]
    MissingChannel(String),
}

/// Mismatch between the data and what the loader asks of it.
#[derive(Error, Debug)]
pub enum DataError {
    #[error(
        "Check the data and masks as sample_idxs are empty, \
         check window_sampling_limit, input_size, output_size, masks"
    )]
    NoSampleableWindows,

    #[error("Series length {len} (after padding) is shorter than windows_size {windows_size}")]
    WindowExceedsSeries { len: usize, windows_size: usize },

    #[error("Series index {idx} out of range for {n_series} series")]
    SeriesIndexOutOfRange { idx: usize, n_series: usize },

    #[error("Inconsistent series items: {0}")]
    InconsistentItems(String),

    #[error("Item '{item_id}': field '{field}' has length {actual}, expected {expected}")]
    LengthMismatch {
        item_id: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Dataset has no series")]
    EmptyDataset,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),
}

impl LoaderError {
    pub fn is_config(&self) -> bool {
        matches!(self, LoaderError::Config(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, LoaderError::Data(_))
    }
}
