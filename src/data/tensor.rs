use burn::tensor::{Data, Shape};

use crate::error::DataError;

/// Multi-channel series tensor laid out as `[n_series, n_channels, len]`.
#[derive(Clone, Debug)]
pub struct SeriesTensor {
    data: Data<f32, 3>,
}

impl SeriesTensor {
    pub fn new(
        values: Vec<f32>,
        n_series: usize,
        n_channels: usize,
        len: usize,
    ) -> Result<Self, DataError> {
        let expected = n_series * n_channels * len;
        if values.len() != expected {
            return Err(DataError::InconsistentItems(format!(
                "tensor buffer has {} values, shape [{n_series}, {n_channels}, {len}] needs {expected}",
                values.len()
            )));
        }

        Ok(Self {
            data: Data::new(values, Shape::new([n_series, n_channels, len])),
        })
    }

    pub fn zeros(n_series: usize, n_channels: usize, len: usize) -> Self {
        Self {
            data: Data::new(
                vec![0.0; n_series * n_channels * len],
                Shape::new([n_series, n_channels, len]),
            ),
        }
    }

    pub fn dims(&self) -> [usize; 3] {
        self.data.shape.dims
    }

    pub fn n_series(&self) -> usize {
        self.data.shape.dims[0]
    }

    pub fn n_channels(&self) -> usize {
        self.data.shape.dims[1]
    }

    pub fn len(&self) -> usize {
        self.data.shape.dims[2]
    }

    pub fn is_empty(&self) -> bool {
        self.data.value.is_empty()
    }

    fn offset(&self, series: usize, channel: usize) -> usize {
        let [_, n_channels, len] = self.dims();
        (series * n_channels + channel) * len
    }

    /// Time slice of one channel of one series.
    pub fn channel(&self, series: usize, channel: usize) -> &[f32] {
        let start = self.offset(series, channel);
        &self.data.value[start..start + self.len()]
    }

    pub fn channel_mut(&mut self, series: usize, channel: usize) -> &mut [f32] {
        let start = self.offset(series, channel);
        let len = self.len();
        &mut self.data.value[start..start + len]
    }

    /// Copies the given series, in the given order.
    pub fn select_series(&self, idxs: &[usize]) -> Self {
        let [_, n_channels, len] = self.dims();
        let stride = n_channels * len;
        let mut values = Vec::with_capacity(idxs.len() * stride);
        for &idx in idxs {
            values.extend_from_slice(&self.data.value[idx * stride..(idx + 1) * stride]);
        }

        Self {
            data: Data::new(values, Shape::new([idxs.len(), n_channels, len])),
        }
    }

    /// Keeps the time steps `start..len` of every series and channel.
    pub fn trailing(&self, start: usize) -> Self {
        let [n_series, n_channels, len] = self.dims();
        let start = start.min(len);
        let mut values = Vec::with_capacity(n_series * n_channels * (len - start));
        for series in 0..n_series {
            for channel in 0..n_channels {
                values.extend_from_slice(&self.channel(series, channel)[start..]);
            }
        }

        Self {
            data: Data::new(values, Shape::new([n_series, n_channels, len - start])),
        }
    }
}

/// One row of static features per series, `[n_series, n_static]`.
#[derive(Clone, Debug)]
pub struct StaticMatrix {
    data: Data<f32, 2>,
}

impl StaticMatrix {
    pub fn new(values: Vec<f32>, n_series: usize, n_static: usize) -> Result<Self, DataError> {
        if values.len() != n_series * n_static {
            return Err(DataError::InconsistentItems(format!(
                "static matrix has {} values, shape [{n_series}, {n_static}] needs {}",
                values.len(),
                n_series * n_static
            )));
        }

        Ok(Self {
            data: Data::new(values, Shape::new([n_series, n_static])),
        })
    }

    pub fn n_series(&self) -> usize {
        self.data.shape.dims[0]
    }

    pub fn n_static(&self) -> usize {
        self.data.shape.dims[1]
    }

    pub fn row(&self, series: usize) -> &[f32] {
        let n_static = self.n_static();
        &self.data.value[series * n_static..(series + 1) * n_static]
    }
}
