//! Windowed batch sampling of multi-series time series for forecasting models.
//!
//! A [`SeriesStore`](data::store::SeriesStore) holds series as a
//! `[n_series, n_channels, len]` tensor whose channels are the target `y`,
//! exogenous regressors and the `available_mask`/`sample_mask` pair. The
//! [`TimeSeriesLoader`](data::loader::TimeSeriesLoader) cuts it into fixed size
//! windows and samples them into burn tensor batches.

pub mod data;
pub mod error;
pub mod utils;

pub use data::batch::Batch;
pub use data::loader::{Epoch, TimeSeriesLoader, TimeSeriesLoaderConfig};
pub use data::seriesitem::{load_from_file, SeriesItem};
pub use data::store::{FilteredTensor, SeriesDataset, SeriesStore};
pub use data::tensor::{SeriesTensor, StaticMatrix};
pub use data::windows::{ModelFamily, WindowPolicy};
pub use error::{ConfigError, DataError, LoaderError, Result};
